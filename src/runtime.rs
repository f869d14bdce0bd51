use std::io::BufRead;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::rest_timer::{CompletionSignal, RestTimer, TimerPhase};

/// Controls a user can send to a running rest countdown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Adjust(i32),
    Restart,
    Dismiss,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "p" | "pause" => Ok(Command::Pause),
            "r" | "resume" => Ok(Command::Resume),
            "s" | "restart" => Ok(Command::Restart),
            "x" | "d" | "dismiss" => Ok(Command::Dismiss),
            "q" | "quit" => Ok(Command::Quit),
            _ if s.starts_with('+') || s.starts_with('-') => s
                .parse::<i32>()
                .map(Command::Adjust)
                .map_err(|_| format!("bad adjustment: {s}")),
            _ => Err(format!("unknown command: {s}")),
        }
    }
}

/// Unified event type consumed by the timer runner
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    Command(Command),
    Tick,
}

/// Source of user commands
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<TimerEvent, RecvTimeoutError>;
}

/// Event source fed by a channel; stdin and tests both push into one.
pub struct ChannelEventSource {
    rx: Receiver<TimerEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<TimerEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TimerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Reads one command per line from stdin on a background thread.
/// Unparseable lines are logged and skipped; EOF ends the thread.
pub fn spawn_stdin_commands(tx: Sender<TimerEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(cmd) => {
                    if tx.send(TimerEvent::Command(cmd)).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!("{e}"),
            }
        }
    })
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Background thread posting `Tick` at a fixed cadence.
///
/// `cancel` returns only after the thread has exited, so no tick is sent
/// once it returns. Dropping the loop cancels it.
pub struct TickLoop {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TickLoop {
    pub fn spawn<T: Ticker>(ticker: T, tx: Sender<TimerEvent>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            let interval = ticker.interval();
            let mut next = Instant::now() + interval;
            loop {
                std::thread::sleep(next.saturating_duration_since(Instant::now()));
                if flag.load(Ordering::SeqCst) || tx.send(TimerEvent::Tick).is_err() {
                    break;
                }
                next += interval;
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn cancel(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("tick thread panicked");
            }
        }
    }
}

impl Drop for TickLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Runner that advances the timer one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on
    /// timeout. `None` once every sender is gone.
    pub fn step(&self) -> Option<TimerEvent> {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) => Some(TimerEvent::Tick),
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Applies a user command. Returns `false` for `Quit`.
pub fn apply_command<S: CompletionSignal>(
    timer: &mut RestTimer<S>,
    command: Command,
    now: Instant,
) -> bool {
    match command {
        Command::Pause => timer.pause(now),
        Command::Resume => timer.resume(now),
        Command::Adjust(delta) => timer.adjust(delta, now),
        Command::Restart => timer.restart(now),
        Command::Dismiss => timer.dismiss(),
        Command::Quit => return false,
    }
    true
}

/// How a driven countdown ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Finished,
    Dismissed,
    Quit,
    Disconnected,
}

/// Drives `timer` from `runner` until it finishes, is dismissed or the user
/// quits. `render` sees the timer after every event.
pub fn run_rest_timer<S, E, T, F>(
    timer: &mut RestTimer<S>,
    runner: &Runner<E, T>,
    mut render: F,
) -> RunOutcome
where
    S: CompletionSignal,
    E: EventSource,
    T: Ticker,
    F: FnMut(&RestTimer<S>),
{
    render(timer);
    loop {
        let Some(event) = runner.step() else {
            return RunOutcome::Disconnected;
        };
        let now = Instant::now();
        match event {
            TimerEvent::Tick => {
                timer.tick(now);
            }
            TimerEvent::Command(cmd) => {
                if !apply_command(timer, cmd, now) {
                    return RunOutcome::Quit;
                }
            }
        }
        render(timer);
        match timer.phase() {
            TimerPhase::Finished => return RunOutcome::Finished,
            TimerPhase::Idle => return RunOutcome::Dismissed,
            TimerPhase::Running | TimerPhase::Paused => {}
        }
    }
}
