//! Terminal event pump.
//!
//! Crossterm reads block, so they run on a dedicated blocking task and
//! cross into the async world over a channel. When no input arrives
//! within [`TICK_INTERVAL`] a `Tick` is emitted instead; ticks drive
//! query polling, timer reconciliation and the running-clock render,
//! so the cadence is owned here rather than by any one consumer.

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

/// Tick cadence. Short enough that the elapsed-timer display never
/// lags a full second behind the wall clock.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub enum Event {
  /// Key press (releases and repeats are filtered at the source)
  Key(KeyEvent),
  /// No input for one interval; poll queries and redraw
  Tick,
}

pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::task::spawn_blocking(move || loop {
      let forwarded = match event::poll(TICK_INTERVAL) {
        Ok(true) => match event::read() {
          Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
            tx.send(Event::Key(key))
          }
          // A resize repaints on the next pass of the draw loop.
          Ok(CrosstermEvent::Resize(..)) => tx.send(Event::Tick),
          _ => Ok(()),
        },
        Ok(false) => tx.send(Event::Tick),
        // A terminal we cannot poll returns instantly; pace the ticks
        // by hand so the loop does not spin.
        Err(_) => {
          std::thread::sleep(TICK_INTERVAL);
          tx.send(Event::Tick)
        }
      };
      if forwarded.is_err() {
        // The app dropped its receiver; stop reading stdin.
        break;
      }
    });

    Self { rx }
  }

  /// Next key or tick; `None` once the pump has shut down.
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

impl Default for EventHandler {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn ticks_flow_without_terminal_input() {
    // Under test there is no tty to poll; the pump must still produce
    // ticks so queries get polled.
    let mut events = EventHandler::new();
    assert!(matches!(events.next().await, Some(Event::Tick)));
  }
}
