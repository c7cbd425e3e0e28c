//! Auto-save of the current board to local storage.
//!
//! The board is saved in its payload-free encoding; image payloads already
//! live in the image vault and are resolved again on restore.

use crate::board::Board;
use crate::codec;
use crate::storage::{BlobStore, ImageVault, StorageResult};
use std::cell::Cell;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Key for the last saved board. Lies outside the image namespace so image
/// pruning never touches it.
pub const LAST_BOARD_KEY: &str = "tierlist-board:last";

/// Manages automatic board persistence.
///
/// State lives in `Cell`s so a shared handle can be saved from event
/// callbacks without exclusive borrows.
pub struct BoardAutosave<S: BlobStore> {
    vault: ImageVault<S>,
    interval: Cell<Duration>,
    last_save: Cell<Option<Instant>>,
    dirty: Cell<bool>,
}

impl<S: BlobStore> BoardAutosave<S> {
    /// Create a new auto-save manager saving through the vault's store.
    pub fn new(vault: ImageVault<S>) -> Self {
        Self {
            vault,
            interval: Cell::new(Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS)),
            last_save: Cell::new(None),
            dirty: Cell::new(false),
        }
    }

    /// Set the auto-save interval.
    pub fn set_interval(&self, interval: Duration) {
        self.interval.set(interval);
    }

    /// Get the auto-save interval.
    pub fn interval(&self) -> Duration {
        self.interval.get()
    }

    /// Mark the board as having unsaved changes.
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    /// Check if the board has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Check if enough time has passed for an auto-save.
    pub fn should_save(&self) -> bool {
        if !self.dirty.get() {
            return false;
        }

        match self.last_save.get() {
            Some(last) => last.elapsed() >= self.interval.get(),
            None => true,
        }
    }

    /// Time left until a pending save is due.
    ///
    /// `None` when there is nothing to save, zero when a save is due now.
    pub fn time_until_due(&self) -> Option<Duration> {
        if !self.dirty.get() {
            return None;
        }

        match self.last_save.get() {
            Some(last) => Some(self.interval.get().saturating_sub(last.elapsed())),
            None => Some(Duration::ZERO),
        }
    }

    /// Save the board if needed (dirty + interval elapsed).
    /// Returns true if save was performed.
    pub async fn maybe_save(&self, board: &Board) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }

        self.save(board).await?;
        Ok(true)
    }

    /// Force save the board immediately.
    pub async fn save(&self, board: &Board) -> StorageResult<()> {
        let encoded = codec::encode(board, false);
        self.vault.store().set(LAST_BOARD_KEY, &encoded).await?;

        self.last_save.set(Some(Instant::now()));
        self.dirty.set(false);
        log::debug!("Auto-saved board ({} items)", board.len());
        Ok(())
    }

    /// Try to load the last saved board.
    /// Returns None if nothing was saved or the snapshot no longer decodes.
    pub async fn load_last(&self) -> Option<Board> {
        let encoded = self.vault.store().get(LAST_BOARD_KEY).await.ok()?;
        match codec::decode(&encoded, &self.vault).await {
            Ok(board) => {
                self.dirty.set(false);
                self.last_save.set(Some(Instant::now()));
                Some(board)
            }
            Err(e) => {
                log::warn!("Discarding unreadable saved board: {}", e);
                None
            }
        }
    }

    /// Forget the saved board.
    pub async fn clear(&self) -> StorageResult<()> {
        self.vault.store().delete(LAST_BOARD_KEY).await
    }
}
