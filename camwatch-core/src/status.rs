//! User-visible status line
//!
//! One message slot shared by the whole session. Every write replaces the
//! previous message; there is no ordering between writers beyond that.
//! Readers that only care about the latest message [`subscribe`](StatusBoard::subscribe);
//! readers that must see every message use [`updates`](StatusBoard::updates).

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::info;

pub const NO_TOKEN_MESSAGE: &str = "Unauthorized: No token found";
pub const DIRECTORY_ERROR_MESSAGE: &str = "Error fetching camera details.";
pub const NO_CAMERAS_MESSAGE: &str = "No cameras found.";

const UPDATE_CAPACITY: usize = 64;

/// Last-writer-wins status message, observable through [`watch`] receivers
#[derive(Debug, Clone)]
pub struct StatusBoard {
    tx: Arc<watch::Sender<String>>,
    updates: broadcast::Sender<String>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(String::new());
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            tx: Arc::new(tx),
            updates,
        }
    }

    /// Replace the current message
    pub fn set(&self, message: impl Into<String>) {
        let message = message.into();
        info!(status = %message, "Status updated");
        // No listeners is fine
        let _ = self.updates.send(message.clone());
        self.tx.send_replace(message);
    }

    /// Current message; empty until something is reported
    pub fn current(&self) -> String {
        self.tx.borrow().clone()
    }

    /// Watch the latest message. Changes in quick succession are merged.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }

    /// Receive every message set from now on, in order.
    ///
    /// A receiver that falls more than 64 messages behind gets
    /// [`broadcast::error::RecvError::Lagged`] and skips ahead.
    pub fn updates(&self) -> broadcast::Receiver<String> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        assert_eq!(StatusBoard::new().current(), "");
    }

    #[test]
    fn last_writer_wins_across_clones() {
        let board = StatusBoard::new();
        let other = board.clone();

        board.set("first");
        other.set("second");

        assert_eq!(board.current(), "second");
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let board = StatusBoard::new();
        let mut rx = board.subscribe();

        board.set(NO_CAMERAS_MESSAGE);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), "No cameras found.");
    }

    #[tokio::test]
    async fn back_to_back_messages_are_all_delivered() {
        let board = StatusBoard::new();
        let mut updates = board.updates();
        let writer = board.clone();

        board.set("Error: Camera 0 not found or inaccessible.");
        writer.set("Error: Camera 1 not found or inaccessible.");
        drop(board);
        drop(writer);

        assert_eq!(
            updates.recv().await.unwrap(),
            "Error: Camera 0 not found or inaccessible."
        );
        assert_eq!(
            updates.recv().await.unwrap(),
            "Error: Camera 1 not found or inaccessible."
        );
        assert!(matches!(
            updates.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
