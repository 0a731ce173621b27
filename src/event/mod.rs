// Terminal event source
//
// One OS thread multiplexes crossterm input with a fixed-interval tick.
// The tick is the only redraw trigger: however many packets arrive between
// two ticks, the render loop sees one `Tick` and performs at most one
// draw. A deadline keeps ticks flowing even under sustained key input.
// Poll or read failures are forwarded over the channel and surface as an
// error from `next()` instead of degrading into a silent tick spin.

use std::io;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent};

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
}

enum Message {
    Event(AppEvent),
    Error(io::Error),
}

pub struct EventHandler {
    rx: Receiver<Message>,
}

impl EventHandler {
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::channel();
        let tick_rate = Duration::from_millis(tick_rate_ms);

        thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate.saturating_sub(last_tick.elapsed());
                match event::poll(timeout) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key)) => {
                            if tx.send(Message::Event(AppEvent::Key(key))).is_err() {
                                return;
                            }
                        }
                        Ok(_) => {}
                        Err(err) => {
                            let _ = tx.send(Message::Error(err));
                            return;
                        }
                    },
                    Ok(false) => {}
                    Err(err) => {
                        let _ = tx.send(Message::Error(err));
                        return;
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    last_tick = Instant::now();
                    if tx.send(Message::Event(AppEvent::Tick)).is_err() {
                        return;
                    }
                }
            }
        });

        Self { rx }
    }

    /// Block until the next key event or tick. An input-source failure
    /// reported by the poll thread comes back as an error.
    pub fn next(&self) -> Result<AppEvent> {
        match self.rx.recv() {
            Ok(Message::Event(event)) => Ok(event),
            Ok(Message::Error(err)) => {
                Err(anyhow::Error::new(err).context("terminal input failed"))
            }
            Err(_) => Err(anyhow::anyhow!("event channel closed")),
        }
    }
}
