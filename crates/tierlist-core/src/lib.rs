//! Tier List Core Library
//!
//! Platform-agnostic board state, drag-and-drop reconciliation, image
//! intake, storage and share-link serialization for the tier list builder.

pub mod board;
pub mod codec;
pub mod config;
pub mod editor;
pub mod imaging;
pub mod moves;
pub mod resolver;
pub mod storage;

pub use board::{Board, BoardError, ContainerId, DEFAULT_COLOR_TAG, Item, ItemKind};
pub use codec::{DecodeError, board_param, decode, encode, share_url};
pub use config::{ImageConfig, TierListConfig};
pub use editor::{
    BoardSource, EditorError, ItemContent, ItemEdit, PendingContent, TierListEditor, initial_board,
};
pub use imaging::{IMAGE_PLACEHOLDER, ImageError, ImageFormat, ImageInput, normalize_image};
pub use moves::{DragSession, KeyDirection, apply_move, complete_drag, keyboard_target, start_drag};
pub use resolver::{DropTarget, resolve};
pub use storage::{BlobStore, BoardAutosave, ImageVault, MemoryStorage, StorageError};
