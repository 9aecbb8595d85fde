//! Timed line input.
//!
//! Two threads feed one event channel: an input pump that reads a line each
//! time it is asked to, and a per-prompt countdown that ticks once per
//! interval and finally reports expiry. The caller's thread takes whichever
//! event comes first and cancels the other side:
//!
//! - input first: the countdown is signalled and joined before returning, so
//!   no tick from it is rendered afterwards;
//! - expiry first: the pump keeps its pending read, and the line it
//!   eventually produces is discarded when the next prompt starts instead of
//!   being handed to that prompt.
//!
//! Every tick and expiry carries the id of the prompt it belongs to, and
//! events from earlier prompts are ignored.

use crate::debug_log;
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimedRead {
    /// Trimmed, lowercased, non-empty input.
    Input(String),
    Timeout,
    /// The input stream is finished.
    Closed,
}

#[derive(Debug)]
enum Event {
    Line(String),
    Closed,
    Tick { prompt: u64, remaining: u64 },
    Expired { prompt: u64 },
}

/// Line source with an optional per-read countdown.
pub struct TimedInput {
    requests: Sender<()>,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
    tick: Duration,
    prompt: u64,
    /// A line has been requested from the pump and not yet received.
    outstanding: bool,
    closed: bool,
}

/// Stands in for the input pump in tests: sees each line request and answers
/// it explicitly.
#[cfg(test)]
pub struct LineFeeder {
    requests: Receiver<()>,
    events: Sender<Event>,
}

#[cfg(test)]
impl LineFeeder {
    /// Block until the reader asks for a line, then supply `line`.
    pub fn answer(&self, line: &str) -> bool {
        if self.requests.recv().is_err() {
            return false;
        }
        self.events.send(Event::Line(line.to_string())).is_ok()
    }

    /// Block until the reader asks for a line without answering it.
    pub fn await_request(&self) -> bool {
        self.requests.recv().is_ok()
    }

    /// Deliver a line for a request that was already taken.
    pub fn deliver(&self, line: &str) -> bool {
        self.events.send(Event::Line(line.to_string())).is_ok()
    }

    pub fn close(&self) {
        let _ = self.events.send(Event::Closed);
    }
}

fn pump_lines<R: BufRead>(mut reader: R, requests: Receiver<()>, events: Sender<Event>) {
    for () in requests {
        let mut line = String::new();
        let event = match reader.read_line(&mut line) {
            Ok(0) => Event::Closed,
            Ok(_) => Event::Line(line),
            Err(e) => {
                log::warn!("input read failed: {e}");
                Event::Closed
            }
        };
        let finished = matches!(event, Event::Closed);
        if events.send(event).is_err() || finished {
            return;
        }
    }
}

fn run_countdown(
    prompt: u64,
    seconds: u64,
    tick: Duration,
    cancel: Receiver<()>,
    events: Sender<Event>,
) {
    for remaining in (1..=seconds).rev() {
        if events.send(Event::Tick { prompt, remaining }).is_err() {
            return;
        }
        match cancel.recv_timeout(tick) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
    let _ = events.send(Event::Expired { prompt });
}

struct Countdown {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

impl Countdown {
    fn start(prompt: u64, seconds: u64, tick: Duration, events: Sender<Event>) -> Self {
        let (cancel, cancel_rx) = mpsc::channel();
        let handle = thread::spawn(move || run_countdown(prompt, seconds, tick, cancel_rx, events));
        Self { cancel, handle }
    }

    /// Stop ticking and wait for the thread, so nothing more is sent.
    fn stop(self) {
        let _ = self.cancel.send(());
        if self.handle.join().is_err() {
            log::warn!("countdown thread panicked");
        }
    }
}

pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

impl TimedInput {
    /// Read lines from `reader` on a background thread.
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (requests, requests_rx) = mpsc::channel();
        let (events_tx, events_rx) = mpsc::channel();
        let pump_events = events_tx.clone();
        thread::spawn(move || pump_lines(reader, requests_rx, pump_events));
        Self::from_parts(requests, events_tx, events_rx)
    }

    /// A reader whose lines are supplied through the returned feeder.
    #[cfg(test)]
    pub fn with_feeder() -> (Self, LineFeeder) {
        let (requests, requests_rx) = mpsc::channel();
        let (events_tx, events_rx) = mpsc::channel();
        let feeder = LineFeeder {
            requests: requests_rx,
            events: events_tx.clone(),
        };
        (Self::from_parts(requests, events_tx, events_rx), feeder)
    }

    fn from_parts(requests: Sender<()>, events_tx: Sender<Event>, events_rx: Receiver<Event>) -> Self {
        Self {
            requests,
            events_tx,
            events_rx,
            tick: DEFAULT_TICK,
            prompt: 0,
            outstanding: false,
            closed: false,
        }
    }

    /// Length of one countdown step. One second unless overridden.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Drop whatever arrived while no prompt was active and make sure a line
    /// is on its way.
    fn begin_prompt(&mut self) {
        self.prompt += 1;
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                Event::Line(line) => {
                    self.outstanding = false;
                    log::debug!("discarding stale input {:?}", line.trim_end());
                }
                Event::Closed => {
                    self.outstanding = false;
                    self.closed = true;
                }
                Event::Tick { .. } | Event::Expired { .. } => {}
            }
        }
        if !self.outstanding && !self.closed {
            if self.requests.send(()).is_err() {
                self.closed = true;
            } else {
                self.outstanding = true;
            }
        }
    }

    /// Read one line without a time limit. The line is trimmed but keeps its
    /// case.
    pub fn read_line(&mut self) -> Option<String> {
        self.begin_prompt();
        while !self.closed {
            match self.events_rx.recv() {
                Ok(Event::Line(line)) => {
                    self.outstanding = false;
                    return Some(line.trim().to_string());
                }
                Ok(Event::Closed) | Err(_) => {
                    self.outstanding = false;
                    self.closed = true;
                }
                Ok(Event::Tick { .. } | Event::Expired { .. }) => {}
            }
        }
        None
    }

    /// Race one line of input against a `seconds`-long countdown. `on_tick`
    /// is called on this thread with the seconds left, once per tick, and
    /// never after this returns.
    pub fn read_with_timeout(&mut self, seconds: u64, mut on_tick: impl FnMut(u64)) -> TimedRead {
        self.begin_prompt();
        if self.closed {
            return TimedRead::Closed;
        }

        let prompt = self.prompt;
        let countdown = Countdown::start(prompt, seconds, self.tick, self.events_tx.clone());
        debug_log!("read_with_timeout() - prompt {} started, {}s", prompt, seconds);

        let outcome = loop {
            match self.events_rx.recv() {
                Ok(Event::Line(line)) => {
                    self.outstanding = false;
                    let input = normalize(&line);
                    break if input.is_empty() {
                        TimedRead::Timeout
                    } else {
                        TimedRead::Input(input)
                    };
                }
                Ok(Event::Closed) | Err(_) => {
                    self.outstanding = false;
                    self.closed = true;
                    break TimedRead::Closed;
                }
                Ok(Event::Tick { prompt: p, remaining }) if p == prompt => on_tick(remaining),
                Ok(Event::Expired { prompt: p }) if p == prompt => break TimedRead::Timeout,
                Ok(Event::Tick { .. } | Event::Expired { .. }) => {}
            }
        };

        countdown.stop();
        debug_log!("read_with_timeout() - prompt {} finished: {:?}", prompt, outcome);
        outcome
    }
}
