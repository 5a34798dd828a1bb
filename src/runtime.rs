use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent};

use crate::overseer::Key;

/// What one poll-loop iteration yields: a terminal event, or `Tick` when
/// the interval passed without input.
#[derive(Clone, Debug)]
pub enum TrainerEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Maps a terminal key event onto the core's key alphabet. Backspace and
/// Delete both erase; anything that is not a printable character is noise
/// the overseer ignores.
pub fn map_key(event: &KeyEvent) -> Key {
    match event.code {
        KeyCode::Backspace | KeyCode::Delete => Key::Erase,
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    }
}

/// Where poll events come from. Production reads the terminal; tests feed
/// a channel directly.
pub trait EventSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrainerEvent, RecvTimeoutError>;
}

/// Forwards crossterm events from a dedicated reader thread over a
/// channel, so the poll loop can wait with a timeout instead of blocking
/// on the terminal read.
pub struct CrosstermEventSource {
    rx: Receiver<TrainerEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => tx.send(TrainerEvent::Key(key)),
                Ok(CtEvent::Resize(..)) => tx.send(TrainerEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            // The receiver going away means the loop is done with us
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrainerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed source for driving the poll loop in tests.
pub struct TestEventSource {
    rx: Receiver<TrainerEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<TrainerEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrainerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Single-threaded poll loop driver. Each `step` hands back the next
/// event, or `Tick` once the interval elapses; a vanished source also
/// degrades to ticks so the countdown keeps running.
pub struct Runner<E: EventSource> {
    source: E,
    tick_interval: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(source: E, tick_interval: Duration) -> Self {
        Self {
            source,
            tick_interval,
        }
    }

    pub fn step(&self) -> TrainerEvent {
        match self.source.recv_timeout(self.tick_interval) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                TrainerEvent::Tick
            }
        }
    }
}
