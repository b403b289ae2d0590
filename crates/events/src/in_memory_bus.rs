//! Process-local bus carrying display-board snapshots from the sales side to
//! whatever renders the storefront's "top sellers" panel.

use std::sync::{Mutex, mpsc};

use thiserror::Error;

use crate::bus::{EventBus, Subscription};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InMemoryBusError {
    #[error("event bus lock poisoned")]
    Poisoned,
}

/// Fan-out of ranking snapshots to every open display board.
///
/// Each published message is a complete board, so a board that attaches late
/// only needs the next snapshot to be current. Boards whose receiver is gone
/// are forgotten on the next publish.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    boards: Mutex<Vec<mpsc::Sender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boards still attached after the most recent publish.
    pub fn subscriber_count(&self) -> usize {
        self.boards.lock().map(|b| b.len()).unwrap_or(0)
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            boards: Mutex::new(Vec::new()),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, snapshot: M) -> Result<(), Self::Error> {
        let mut boards = self.boards.lock().map_err(|_| InMemoryBusError::Poisoned)?;
        boards.retain(|board| board.send(snapshot.clone()).is_ok());
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (board, feed) = mpsc::channel();
        // Poisoned: the board stays blank.
        if let Ok(mut boards) = self.boards.lock() {
            boards.push(board);
        }
        Subscription::new(feed)
    }
}
