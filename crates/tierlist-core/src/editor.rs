//! The editor: the only mutation entry point for the board.
//!
//! UI callbacks (`on_add_item`, `on_edit_item`, `on_remove_item`,
//! `on_clear_all` and the drag callbacks) map one-to-one onto methods here.
//! Image intake is split into [`PendingContent::prepare`] (async: normalize
//! and persist) and a synchronous commit, so a board mutation only happens
//! once its image has resolved.

use crate::board::{Board, BoardError, ContainerId, Item, ItemKind};
use crate::codec::{self, DecodeError};
use crate::config::TierListConfig;
use crate::imaging::{ImageError, ImageInput, normalize_image};
use crate::moves::{DragSession, KeyDirection, complete_drag, keyboard_target, start_drag};
use crate::resolver::DropTarget;
use crate::storage::{BlobStore, BoardAutosave, ImageVault};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced to the UI by add/edit operations.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    #[error("Item text is empty")]
    EmptyText,
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Content for a new or edited item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemContent {
    Text(String),
    Image(ImageInput),
}

/// An add or edit request from the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemEdit {
    /// New content, or `None` to keep the current content.
    pub content: Option<ItemContent>,
    /// New color tag, or `None` to keep the current one.
    pub color_tag: Option<String>,
}

/// Content that is ready to be committed to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingContent {
    Text(String),
    Image {
        /// Normalized payload (data URL).
        payload: String,
        /// Where the payload was persisted; `None` if storage failed.
        image_ref: Option<String>,
    },
}

impl PendingContent {
    /// Normalize and persist content ahead of a board mutation.
    ///
    /// Only touches the vault, never the board. A storage failure still
    /// yields an image, just without a persisted reference.
    pub async fn prepare<S: BlobStore>(
        content: ItemContent,
        vault: &ImageVault<S>,
        config: &TierListConfig,
    ) -> Result<Self, EditorError> {
        match content {
            ItemContent::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(EditorError::EmptyText);
                }
                Ok(PendingContent::Text(text.to_string()))
            }
            ItemContent::Image(input) => {
                let payload = normalize_image(input, &config.image)?;
                let image_ref = vault.store_payload(&payload).await;
                if image_ref.is_none() {
                    log::warn!("Image kept in memory only; it will not survive a reload");
                }
                Ok(PendingContent::Image { payload, image_ref })
            }
        }
    }

    /// Reference persisted for this content, if any.
    pub fn image_ref(&self) -> Option<&str> {
        match self {
            PendingContent::Text(_) => None,
            PendingContent::Image { image_ref, .. } => image_ref.as_deref(),
        }
    }

    /// Release storage held by content that will not be committed.
    pub async fn discard<S: BlobStore>(self, vault: &ImageVault<S>) {
        if let Some(reference) = self.image_ref() {
            vault.remove(reference).await;
        }
    }
}

/// Where the board shown at start-up came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardSource {
    SharedLink,
    Autosave,
    Empty,
}

/// Pick the board to start with.
///
/// A share link in `url` wins. A malformed link yields an empty board
/// without falling back to the auto-saved one. Without a link the last
/// auto-saved board is restored, if any.
pub async fn initial_board<S: BlobStore>(
    url: Option<&str>,
    config: &TierListConfig,
    vault: &ImageVault<S>,
    autosave: &BoardAutosave<S>,
) -> (Board, BoardSource) {
    if let Some(encoded) = url.and_then(|url| codec::board_param(url, &config.share_param)) {
        return match codec::decode(&encoded, vault).await {
            Ok(board) => {
                log::info!("Loaded shared board ({} items)", board.len());
                (board, BoardSource::SharedLink)
            }
            Err(e) => {
                log::warn!("Ignoring malformed share link: {}", e);
                (Board::new(), BoardSource::Empty)
            }
        };
    }

    match autosave.load_last().await {
        Some(board) => {
            log::info!("Restored saved board ({} items)", board.len());
            (board, BoardSource::Autosave)
        }
        None => (Board::new(), BoardSource::Empty),
    }
}

/// Owns the current board and routes every UI event through the resolver,
/// move engine and codec.
pub struct TierListEditor<S: BlobStore> {
    board: Board,
    vault: ImageVault<S>,
    config: TierListConfig,
    drag: Option<DragSession>,
}

impl<S: BlobStore> TierListEditor<S> {
    /// Create an editor with an empty board.
    pub fn new(store: Arc<S>, config: TierListConfig) -> Self {
        let vault = ImageVault::new(store, config.storage_namespace.clone());
        Self {
            board: Board::new(),
            vault,
            config,
            drag: None,
        }
    }

    /// The current board snapshot.
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn vault(&self) -> &ImageVault<S> {
        &self.vault
    }

    pub fn config(&self) -> &TierListConfig {
        &self.config
    }

    /// The drag in progress, if any.
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Replace the whole board, e.g. after a restore. Cancels any drag.
    pub fn replace_board(&mut self, board: Board) {
        self.board = board;
        self.drag = None;
    }

    fn color_or_default(&self, color_tag: Option<String>) -> String {
        color_tag.unwrap_or_else(|| self.config.default_color.clone())
    }

    /// Add an item to the end of the storage pool. Returns its id.
    pub async fn on_add_item(
        &mut self,
        content: ItemContent,
        color_tag: Option<String>,
    ) -> Result<String, EditorError> {
        let pending = PendingContent::prepare(content, &self.vault, &self.config).await?;
        match self.commit_add(pending.clone(), color_tag) {
            Ok(id) => Ok(id),
            Err(e) => {
                pending.discard(&self.vault).await;
                Err(e)
            }
        }
    }

    /// Commit prepared content as a new storage item. Returns its id.
    ///
    /// On success the image reference, if any, is released in the vault; on
    /// error the caller still owns `pending` and should discard it.
    pub fn commit_add(
        &mut self,
        pending: PendingContent,
        color_tag: Option<String>,
    ) -> Result<String, EditorError> {
        let color_tag = self.color_or_default(color_tag);
        let item = match pending {
            PendingContent::Text(text) => Item::text(text, color_tag),
            PendingContent::Image { payload, image_ref } => {
                Item::image(payload, image_ref, color_tag)
            }
        };
        let id = item.id.clone();
        let kind = item.kind;
        let image_ref = item.image_ref.clone();
        self.board.push(ContainerId::Storage, item)?;
        if let Some(reference) = &image_ref {
            self.vault.release(reference);
        }
        log::info!("Added {:?} item {}", kind, id);
        Ok(id)
    }

    /// Edit an item's content and/or color in place.
    pub async fn on_edit_item(&mut self, id: &str, edit: ItemEdit) -> Result<(), EditorError> {
        if !self.board.contains(id) {
            return Err(EditorError::ItemNotFound(id.to_string()));
        }

        let pending = match edit.content {
            Some(content) => {
                Some(PendingContent::prepare(content, &self.vault, &self.config).await?)
            }
            None => None,
        };

        match self.commit_edit(id, pending.clone(), edit.color_tag) {
            Ok(Some(stale)) => {
                self.vault.remove(&stale).await;
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                if let Some(pending) = pending {
                    pending.discard(&self.vault).await;
                }
                Err(e)
            }
        }
    }

    /// Commit prepared content to an existing item.
    ///
    /// Returns the image reference the item no longer uses, which the caller
    /// should delete from the vault.
    pub fn commit_edit(
        &mut self,
        id: &str,
        pending: Option<PendingContent>,
        color_tag: Option<String>,
    ) -> Result<Option<String>, EditorError> {
        let item = self
            .board
            .get_mut(id)
            .ok_or_else(|| EditorError::ItemNotFound(id.to_string()))?;

        let mut stale = None;
        let mut fresh = None;
        if let Some(pending) = pending {
            stale = item.image_ref.take();
            match pending {
                PendingContent::Text(text) => {
                    item.content = text;
                    item.kind = ItemKind::Text;
                }
                PendingContent::Image { payload, image_ref } => {
                    item.content = payload;
                    item.kind = ItemKind::Image;
                    item.image_ref = image_ref.clone();
                    fresh = image_ref;
                }
            }
        }
        if let Some(color_tag) = color_tag {
            item.color_tag = color_tag;
        }
        if let Some(reference) = &fresh {
            self.vault.release(reference);
        }
        log::info!("Edited item {}", id);
        Ok(stale)
    }

    /// Remove an item from the board without touching storage.
    ///
    /// Callers must release the removed item's image reference, as
    /// [`Self::on_remove_item`] does.
    pub fn remove_item(&mut self, id: &str) -> Option<Item> {
        let (container, item) = self.board.remove(id)?;
        if self.drag.as_ref().is_some_and(|d| d.dragged_item_id == id) {
            self.drag = None;
        }
        log::info!("Removed item {} from {}", id, container);
        Some(item)
    }

    /// Remove an item and delete its stored image.
    pub async fn on_remove_item(&mut self, id: &str) -> Option<Item> {
        let item = self.remove_item(id)?;
        if let Some(reference) = &item.image_ref {
            self.vault.remove(reference).await;
        }
        Some(item)
    }

    /// Empty the board without touching storage. Returns the removed items.
    pub fn clear_board(&mut self) -> Vec<Item> {
        self.drag = None;
        let removed = self.board.clear();
        log::info!("Cleared {} items", removed.len());
        removed
    }

    /// Empty the board and delete every stored image.
    pub async fn on_clear_all(&mut self) {
        self.clear_board();
        self.vault.prune_except(&Default::default()).await;
    }

    /// Begin dragging an item. Returns false if the item is not on the board.
    pub fn on_drag_start(&mut self, item_id: &str) -> bool {
        self.drag = start_drag(&self.board, item_id);
        self.drag.is_some()
    }

    /// Finish the current drag on the reported targets.
    ///
    /// Returns true if the board changed. Without a drag in progress, or
    /// without a resolvable target, nothing happens.
    pub fn on_drag_end(&mut self, over: &[DropTarget]) -> bool {
        let Some(session) = self.drag.take() else {
            log::debug!("Drag end without a drag in progress");
            return false;
        };
        let next = complete_drag(&self.board, &session, over);
        let changed = next != self.board;
        self.board = next;
        changed
    }

    /// Abandon the current drag; the board is untouched.
    pub fn on_drag_cancel(&mut self) {
        if let Some(session) = self.drag.take() {
            log::debug!("Drag cancelled: {}", session.dragged_item_id);
        }
    }

    /// Move the dragged item one keyboard step. The drag stays active so
    /// further steps can follow; returns true if the board changed.
    pub fn on_keyboard_move(&mut self, direction: KeyDirection) -> bool {
        let Some(session) = self.drag.clone() else {
            return false;
        };
        let Some(target) = keyboard_target(&self.board, &session, direction) else {
            return false;
        };

        let next = complete_drag(&self.board, &session, &[target]);
        let changed = next != self.board;
        self.board = next;
        self.drag = start_drag(&self.board, &session.dragged_item_id);
        changed
    }

    /// Serialize the current board.
    pub fn share(&self, include_image_payloads: bool) -> String {
        codec::encode(&self.board, include_image_payloads)
    }

    /// Build a share link for the current board on top of `base`.
    pub fn share_url(&self, base: &str, include_image_payloads: bool) -> Option<String> {
        let encoded = self.share(include_image_payloads);
        match codec::share_url(base, &self.config.share_param, &encoded) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Cannot build share link from {}: {}", base, e);
                None
            }
        }
    }

    /// Load a serialized board. On error the current board is kept.
    pub async fn load_shared(&mut self, serialized: &str) -> Result<(), DecodeError> {
        match codec::decode(serialized, &self.vault).await {
            Ok(board) => {
                self.replace_board(board);
                Ok(())
            }
            Err(e) => {
                log::warn!("Rejected shared board: {}", e);
                Err(e)
            }
        }
    }

    /// Load the board carried by a share link. Returns true if one was loaded.
    pub async fn load_from_url(&mut self, url: &str) -> bool {
        let Some(encoded) = codec::board_param(url, &self.config.share_param) else {
            return false;
        };
        self.load_shared(&encoded).await.is_ok()
    }

    /// Replace the board with the start-up board; see [`initial_board`].
    pub async fn load_initial(
        &mut self,
        url: Option<&str>,
        autosave: &BoardAutosave<S>,
    ) -> BoardSource {
        let (board, source) = initial_board(url, &self.config, &self.vault, autosave).await;
        self.replace_board(board);
        source
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl TierListEditor<crate::storage::FileStorage> {
    /// Create an editor backed by files in the platform data directory.
    pub fn open_default(config: TierListConfig) -> crate::storage::StorageResult<Self> {
        let store = crate::storage::FileStorage::default_location()?;
        Ok(Self::new(Arc::new(store), config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::IMAGE_PLACEHOLDER;
    use crate::imaging::tests::banded_png;
    use crate::storage::MemoryStorage;
    use pollster::block_on;

    fn new_editor() -> TierListEditor<MemoryStorage> {
        let _ = env_logger::builder().is_test(true).try_init();
        TierListEditor::new(Arc::new(MemoryStorage::new()), TierListConfig::default())
    }

    fn add_text(editor: &mut TierListEditor<MemoryStorage>, text: &str) -> String {
        block_on(editor.on_add_item(ItemContent::Text(text.into()), None)).unwrap()
    }

    fn add_image(editor: &mut TierListEditor<MemoryStorage>) -> String {
        let input = ImageInput::Bytes(banded_png(30, 30));
        block_on(editor.on_add_item(ItemContent::Image(input), None)).unwrap()
    }

    #[test]
    fn test_add_text_item() {
        let mut editor = new_editor();
        let id = block_on(editor.on_add_item(
            ItemContent::Text("Foo".into()),
            Some("#ff0000".into()),
        ))
        .unwrap();

        let storage = editor.board().items(ContainerId::Storage);
        assert_eq!(storage.len(), 1);
        assert_eq!(storage[0].id, id);
        assert_eq!(storage[0].content, "Foo");
        assert_eq!(storage[0].color_tag, "#ff0000");
        assert_eq!(storage[0].kind, ItemKind::Text);
    }

    #[test]
    fn test_add_uses_default_color_and_trims() {
        let mut editor = new_editor();
        let id = add_text(&mut editor, "  Bar ");
        let item = editor.board().get(&id).unwrap();
        assert_eq!(item.content, "Bar");
        assert_eq!(item.color_tag, "#ff8a8a");
    }

    #[test]
    fn test_add_empty_text_rejected() {
        let mut editor = new_editor();
        let result = block_on(editor.on_add_item(ItemContent::Text("   ".into()), None));
        assert!(matches!(result, Err(EditorError::EmptyText)));
        assert!(editor.board().is_empty());
    }

    #[test]
    fn test_add_image_normalizes_and_persists() {
        let mut editor = new_editor();
        let id = add_image(&mut editor);

        let item = editor.board().get(&id).unwrap().clone();
        assert_eq!(item.kind, ItemKind::Image);
        assert!(item.content.starts_with("data:image/jpeg;base64,"));
        let reference = item.image_ref.clone().unwrap();
        assert_eq!(block_on(editor.vault().resolve(&reference)), Some(item.content));
    }

    #[test]
    fn test_add_invalid_image_leaves_board_unchanged() {
        let mut editor = new_editor();
        let input = ImageInput::Bytes(b"garbage".to_vec());
        let result = block_on(editor.on_add_item(ItemContent::Image(input), None));
        assert!(matches!(result, Err(EditorError::Image(_))));
        assert!(editor.board().is_empty());
    }

    #[test]
    fn test_add_image_with_full_storage_keeps_unpersisted_image() {
        let _ = env_logger::builder().is_test(true).try_init();
        let store = Arc::new(MemoryStorage::with_capacity(16));
        let mut editor = TierListEditor::new(store, TierListConfig::default());
        let id = add_image(&mut editor);

        let item = editor.board().get(&id).unwrap();
        assert!(item.content.starts_with("data:image/jpeg"));
        assert_eq!(item.image_ref, None);
    }

    #[test]
    fn test_edit_text_and_color() {
        let mut editor = new_editor();
        let id = add_text(&mut editor, "Foo");

        let edit = ItemEdit {
            content: Some(ItemContent::Text("Baz".into())),
            color_tag: Some("#00ff00".into()),
        };
        block_on(editor.on_edit_item(&id, edit)).unwrap();

        let item = editor.board().get(&id).unwrap();
        assert_eq!(item.content, "Baz");
        assert_eq!(item.color_tag, "#00ff00");
    }

    #[test]
    fn test_edit_image_to_text_releases_reference() {
        let mut editor = new_editor();
        let id = add_image(&mut editor);

        let edit = ItemEdit {
            content: Some(ItemContent::Text("now text".into())),
            color_tag: None,
        };
        block_on(editor.on_edit_item(&id, edit)).unwrap();

        let item = editor.board().get(&id).unwrap();
        assert_eq!(item.kind, ItemKind::Text);
        assert_eq!(item.image_ref, None);
        assert!(block_on(editor.vault().references()).unwrap().is_empty());
    }

    #[test]
    fn test_edit_missing_item() {
        let mut editor = new_editor();
        let result = block_on(editor.on_edit_item("nope", ItemEdit::default()));
        assert!(matches!(result, Err(EditorError::ItemNotFound(_))));
    }

    #[test]
    fn test_commit_edit_after_removal_discards_pending_image() {
        let mut editor = new_editor();
        let id = add_text(&mut editor, "Foo");
        let pending = block_on(PendingContent::prepare(
            ItemContent::Image(ImageInput::Bytes(banded_png(10, 10))),
            editor.vault(),
            editor.config(),
        ))
        .unwrap();

        editor.remove_item(&id);
        let result = editor.commit_edit(&id, Some(pending.clone()), None);
        assert!(matches!(result, Err(EditorError::ItemNotFound(_))));

        block_on(pending.discard(editor.vault()));
        assert!(block_on(editor.vault().references()).unwrap().is_empty());
    }

    #[test]
    fn test_remove_deletes_image() {
        let mut editor = new_editor();
        let id = add_image(&mut editor);

        let removed = block_on(editor.on_remove_item(&id)).unwrap();
        assert_eq!(removed.id, id);
        assert!(editor.board().is_empty());
        assert!(block_on(editor.vault().references()).unwrap().is_empty());
        assert!(block_on(editor.on_remove_item(&id)).is_none());
    }

    #[test]
    fn test_clear_all() {
        let mut editor = new_editor();
        add_text(&mut editor, "a");
        add_image(&mut editor);

        block_on(editor.on_clear_all());
        assert!(editor.board().is_empty());
        assert!(block_on(editor.vault().references()).unwrap().is_empty());
    }

    #[test]
    fn test_drag_between_containers() {
        let mut editor = new_editor();
        let id = add_text(&mut editor, "X");

        assert!(editor.on_drag_start(&id));
        assert!(editor.drag_session().unwrap().is_source_storage);
        assert!(editor.on_drag_end(&[DropTarget::ContainerSurface(ContainerId::TierS)]));

        assert!(editor.drag_session().is_none());
        assert!(editor.board().items(ContainerId::Storage).is_empty());
        assert_eq!(editor.board().item_ids(ContainerId::TierS), vec![id.as_str()]);
    }

    #[test]
    fn test_drag_end_without_target_is_noop() {
        let mut editor = new_editor();
        let id = add_text(&mut editor, "X");
        let before = editor.board().clone();

        editor.on_drag_start(&id);
        assert!(!editor.on_drag_end(&[]));
        assert_eq!(editor.board(), &before);
        assert!(!editor.on_drag_end(&[DropTarget::ContainerSurface(ContainerId::TierS)]));
    }

    #[test]
    fn test_drag_cancel() {
        let mut editor = new_editor();
        let id = add_text(&mut editor, "X");
        editor.on_drag_start(&id);
        editor.on_drag_cancel();
        assert!(editor.drag_session().is_none());
        assert!(!editor.on_drag_start("missing"));
    }

    #[test]
    fn test_keyboard_drag() {
        let mut editor = new_editor();
        let a = add_text(&mut editor, "a");
        let b = add_text(&mut editor, "b");

        editor.on_drag_start(&a);
        assert!(editor.on_keyboard_move(KeyDirection::Right));
        assert_eq!(editor.board().item_ids(ContainerId::Storage), vec![b.as_str(), a.as_str()]);

        assert!(editor.on_keyboard_move(KeyDirection::Up));
        assert_eq!(editor.board().item_ids(ContainerId::TierD), vec![a.as_str()]);
        assert_eq!(editor.drag_session().unwrap().source_container, ContainerId::TierD);

        editor.on_drag_cancel();
        assert!(!editor.on_keyboard_move(KeyDirection::Up));
    }

    #[test]
    fn test_uniqueness_across_operation_sequence() {
        let mut editor = new_editor();
        let ids: Vec<String> = (0..5)
            .map(|i| add_text(&mut editor, &format!("item {i}")))
            .collect();
        let targets = [
            DropTarget::ContainerSurface(ContainerId::TierS),
            DropTarget::ItemSurface(ids[0].clone()),
            DropTarget::ContainerSurface(ContainerId::TierC),
            DropTarget::ItemSurface(ids[3].clone()),
            DropTarget::ContainerSurface(ContainerId::Storage),
        ];
        for (i, id) in ids.iter().enumerate() {
            editor.on_drag_start(id);
            editor.on_drag_end(&targets[i..i + 1]);
            assert!(editor.board().has_unique_ids());
        }
        block_on(editor.on_remove_item(&ids[2]));
        assert!(editor.board().has_unique_ids());
        assert_eq!(editor.board().len(), 4);
    }

    #[test]
    fn test_share_and_load_round_trip() {
        let mut editor = new_editor();
        let id = add_text(&mut editor, "X");
        add_image(&mut editor);
        editor.on_drag_start(&id);
        editor.on_drag_end(&[DropTarget::ContainerSurface(ContainerId::TierA)]);

        let link = editor.share_url("https://example.com/", false).unwrap();

        let mut other = new_editor();
        // Same storage: the reference in the link resolves.
        other.vault = editor.vault().clone();
        assert!(block_on(other.load_from_url(&link)));
        assert_eq!(other.board(), editor.board());
    }

    #[test]
    fn test_load_from_url_with_foreign_storage_uses_placeholder() {
        let mut editor = new_editor();
        add_image(&mut editor);
        let link = editor.share_url("https://example.com/", false).unwrap();

        let mut other = new_editor();
        assert!(block_on(other.load_from_url(&link)));
        let item = other.board().items(ContainerId::Storage)[0].clone();
        assert_eq!(item.content, IMAGE_PLACEHOLDER);
    }

    #[test]
    fn test_rejected_share_keeps_board() {
        let mut editor = new_editor();
        add_text(&mut editor, "keep me");
        let before = editor.board().clone();

        let result = block_on(editor.load_shared(r#"{"storage":[],"tier-S":[]}"#));
        assert!(matches!(result, Err(DecodeError::MissingContainer(_))));
        assert_eq!(editor.board(), &before);

        assert!(!block_on(editor.load_from_url("https://example.com/?board=%7B")));
        assert!(!block_on(editor.load_from_url("https://example.com/")));
        assert_eq!(editor.board(), &before);
    }

    fn prepare_image(editor: &TierListEditor<MemoryStorage>) -> PendingContent {
        let content = ItemContent::Image(ImageInput::Bytes(banded_png(12, 12)));
        block_on(PendingContent::prepare(content, editor.vault(), editor.config())).unwrap()
    }

    #[test]
    fn test_pending_image_survives_clear_all() {
        let mut editor = new_editor();
        let pending = prepare_image(&editor);

        block_on(editor.on_clear_all());
        let id = editor.commit_add(pending, None).unwrap();

        let reference = editor.board().get(&id).unwrap().image_ref.clone().unwrap();
        assert!(block_on(editor.vault().resolve(&reference)).is_some());
        assert!(!editor.vault().is_held(&reference));
    }

    #[test]
    fn test_pending_image_survives_load_shared() {
        let mut editor = new_editor();
        let pending = prepare_image(&editor);

        let empty = codec::encode(&Board::new(), false);
        block_on(editor.load_shared(&empty)).unwrap();
        let id = editor.commit_add(pending, None).unwrap();

        let reference = editor.board().get(&id).unwrap().image_ref.clone().unwrap();
        assert!(block_on(editor.vault().resolve(&reference)).is_some());
    }

    #[test]
    fn test_pending_edit_image_survives_prune() {
        let mut editor = new_editor();
        let id = add_text(&mut editor, "Foo");
        let pending = prepare_image(&editor);

        let other = add_image(&mut editor);
        block_on(editor.on_remove_item(&other));
        block_on(editor.vault().prune_except(&editor.board().image_refs()));

        editor.commit_edit(&id, Some(pending), None).unwrap();
        let reference = editor.board().get(&id).unwrap().image_ref.clone().unwrap();
        assert!(block_on(editor.vault().resolve(&reference)).is_some());
        assert!(!editor.vault().is_held(&reference));
    }

    #[test]
    fn test_load_initial_prefers_share_link() {
        let mut source = new_editor();
        add_text(&mut source, "shared");
        let link = source.share_url("https://example.com/", false).unwrap();

        let mut editor = new_editor();
        let autosave = BoardAutosave::new(editor.vault().clone());
        add_text(&mut editor, "saved");
        block_on(autosave.save(editor.board())).unwrap();

        let loaded = block_on(editor.load_initial(Some(link.as_str()), &autosave));
        assert_eq!(loaded, BoardSource::SharedLink);
        assert_eq!(editor.board(), source.board());
    }

    #[test]
    fn test_load_initial_malformed_link_starts_empty() {
        let mut editor = new_editor();
        let autosave = BoardAutosave::new(editor.vault().clone());
        add_text(&mut editor, "saved");
        block_on(autosave.save(editor.board())).unwrap();

        let url = "https://example.com/?board=%7B%22storage%22%3A%5B%5D%7D";
        let loaded = block_on(editor.load_initial(Some(url), &autosave));
        assert_eq!(loaded, BoardSource::Empty);
        assert!(editor.board().is_empty());
    }

    #[test]
    fn test_load_initial_without_link_restores_autosave() {
        let mut editor = new_editor();
        let autosave = BoardAutosave::new(editor.vault().clone());
        add_text(&mut editor, "saved");
        add_image(&mut editor);
        let saved = editor.board().clone();
        block_on(autosave.save(&saved)).unwrap();
        editor.replace_board(Board::new());

        let loaded = block_on(editor.load_initial(Some("https://example.com/"), &autosave));
        assert_eq!(loaded, BoardSource::Autosave);
        assert_eq!(editor.board(), &saved);
    }

    #[test]
    fn test_load_initial_with_nothing_saved() {
        let mut editor = new_editor();
        let autosave = BoardAutosave::new(editor.vault().clone());
        add_text(&mut editor, "unsaved");

        assert_eq!(block_on(editor.load_initial(None, &autosave)), BoardSource::Empty);
        assert!(editor.board().is_empty());
    }
}
