// Library surface for the CLI and integration tests.
pub mod app_dirs;
pub mod backup;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod elapsed;
pub mod error;
pub mod model;
pub mod rest_timer;
pub mod routine;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod storage;
pub mod util;
