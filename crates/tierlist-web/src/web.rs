//! WebAssembly entry point and JS-facing editor handle.

use crate::{drop_targets, parse_config};
use js_sys::Promise;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tierlist_core::storage::{BoardAutosave, IndexedDbStorage};
use tierlist_core::{
    BoardSource, ImageInput, ItemContent, KeyDirection, PendingContent, TierListEditor,
    initial_board,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

type Editor = TierListEditor<IndexedDbStorage>;

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Current page URL, if there is a window.
fn page_href() -> Option<String> {
    web_sys::window()?.location().href().ok()
}

/// State shared between the JS handle and its spawned tasks.
///
/// The editor is never borrowed across an `.await`.
struct Session {
    editor: RefCell<Editor>,
    autosave: BoardAutosave<IndexedDbStorage>,
    save_scheduled: Cell<bool>,
}

impl Session {
    /// Write the current board, logging failures.
    async fn save_now(&self) {
        let board = self.editor.borrow().board().clone();
        if let Err(e) = self.autosave.save(&board).await {
            log::warn!("Auto-save failed: {}", e);
        }
    }
}

/// Record a change and save it, now if the interval allows, otherwise once
/// the interval has elapsed.
async fn persist_change(session: &Rc<Session>) {
    session.autosave.mark_dirty();
    match session.autosave.time_until_due() {
        Some(delay) if delay.is_zero() => session.save_now().await,
        Some(delay) => schedule_save(session, delay),
        None => {}
    }
}

fn schedule_save(session: &Rc<Session>, delay: Duration) {
    if session.save_scheduled.replace(true) {
        return;
    }
    log::debug!("Auto-save deferred by {:?}", delay);

    let session = Rc::clone(session);
    spawn_local(async move {
        gloo_timers::future::sleep(delay).await;
        session.save_scheduled.set(false);
        if session.autosave.is_dirty() {
            session.save_now().await;
        }
    });
}

/// Editor handle owned by the JavaScript UI.
///
/// Mutating methods that involve storage return promises; the board is
/// changed only once the promise's work has resolved.
#[wasm_bindgen]
pub struct TierListApp {
    session: Rc<Session>,
}

#[wasm_bindgen]
impl TierListApp {
    /// Create the app with an optional JSON config.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> TierListApp {
        let config = parse_config(config_json.as_deref());
        let interval = Duration::from_secs(config.autosave_interval_secs);
        let editor = TierListEditor::new(Arc::new(IndexedDbStorage::new()), config);
        let autosave = BoardAutosave::new(editor.vault().clone());
        autosave.set_interval(interval);

        TierListApp {
            session: Rc::new(Session {
                editor: RefCell::new(editor),
                autosave,
                save_scheduled: Cell::new(false),
            }),
        }
    }

    /// Load the start-up board: the page's share link if present (a
    /// malformed link gives an empty board), else the last auto-saved board.
    /// Resolves to `"shared"`, `"saved"` or `"empty"`.
    pub fn load(&self) -> Promise {
        let session = Rc::clone(&self.session);

        future_to_promise(async move {
            let (vault, config) = {
                let editor = session.editor.borrow();
                (editor.vault().clone(), editor.config().clone())
            };
            let href = page_href();
            let (board, source) =
                initial_board(href.as_deref(), &config, &vault, &session.autosave).await;
            session.editor.borrow_mut().replace_board(board);

            let source = match source {
                BoardSource::SharedLink => "shared",
                BoardSource::Autosave => "saved",
                BoardSource::Empty => "empty",
            };
            Ok(JsValue::from_str(source))
        })
    }

    /// The board as JSON, with image payloads inline for rendering.
    pub fn board_json(&self) -> String {
        self.session.editor.borrow().share(true)
    }

    /// Add a text item to storage. Resolves to the new item id.
    pub fn add_text(&self, text: String, color: Option<String>) -> Promise {
        self.add(ItemContent::Text(text), color)
    }

    /// Add an image item from file bytes. Resolves to the new item id.
    pub fn add_image(&self, bytes: Vec<u8>, color: Option<String>) -> Promise {
        self.add(ItemContent::Image(ImageInput::Bytes(bytes)), color)
    }

    /// Add an image item from a `data:` URL. Resolves to the new item id.
    pub fn add_image_data_url(&self, data_url: String, color: Option<String>) -> Promise {
        self.add(ItemContent::Image(ImageInput::DataUrl(data_url)), color)
    }

    /// Change an item's text and/or color.
    pub fn edit_text(&self, id: String, text: Option<String>, color: Option<String>) -> Promise {
        self.edit(id, text.map(ItemContent::Text), color)
    }

    /// Replace an item's image and optionally its color.
    pub fn edit_image(&self, id: String, bytes: Vec<u8>, color: Option<String>) -> Promise {
        self.edit(id, Some(ItemContent::Image(ImageInput::Bytes(bytes))), color)
    }

    /// Remove an item. Resolves to `true` if it existed.
    pub fn remove_item(&self, id: String) -> Promise {
        let session = Rc::clone(&self.session);

        future_to_promise(async move {
            let vault = session.editor.borrow().vault().clone();
            let removed = session.editor.borrow_mut().remove_item(&id);
            let Some(item) = removed else {
                return Ok(JsValue::FALSE);
            };
            if let Some(reference) = &item.image_ref {
                vault.remove(reference).await;
            }
            persist_change(&session).await;
            Ok(JsValue::TRUE)
        })
    }

    /// Remove every item and every stored image not awaiting a commit.
    pub fn clear_all(&self) -> Promise {
        let session = Rc::clone(&self.session);

        future_to_promise(async move {
            let vault = session.editor.borrow().vault().clone();
            session.editor.borrow_mut().clear_board();
            vault.prune_except(&Default::default()).await;
            session.autosave.mark_dirty();
            session.save_now().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Begin dragging an item.
    pub fn drag_start(&self, item_id: &str) -> bool {
        self.session.editor.borrow_mut().on_drag_start(item_id)
    }

    /// Finish the current drag over the given DOM drop ids (container ids or
    /// item ids). Returns `true` if the board changed.
    pub fn drag_end(&self, over_ids: Vec<String>) -> bool {
        let targets = drop_targets(&over_ids);
        let changed = self.session.editor.borrow_mut().on_drag_end(&targets);
        if changed {
            self.spawn_persist();
        }
        changed
    }

    pub fn drag_cancel(&self) {
        self.session.editor.borrow_mut().on_drag_cancel();
    }

    /// Move the dragged item one step for an arrow key (`KeyboardEvent.key`).
    pub fn keyboard_move(&self, key: &str) -> bool {
        let Some(direction) = KeyDirection::from_key(key) else {
            return false;
        };
        let changed = self.session.editor.borrow_mut().on_keyboard_move(direction);
        if changed {
            self.spawn_persist();
        }
        changed
    }

    /// Share link for the current page carrying the board.
    pub fn share_url(&self, include_images: bool) -> Option<String> {
        let href = page_href()?;
        self.session.editor.borrow().share_url(&href, include_images)
    }

    /// Save unsaved changes immediately.
    pub fn flush(&self) -> Promise {
        let session = Rc::clone(&self.session);
        future_to_promise(async move {
            if session.autosave.is_dirty() {
                session.save_now().await;
            }
            Ok(JsValue::UNDEFINED)
        })
    }
}

impl TierListApp {
    fn add(&self, content: ItemContent, color: Option<String>) -> Promise {
        let session = Rc::clone(&self.session);

        future_to_promise(async move {
            let (vault, config) = {
                let editor = session.editor.borrow();
                (editor.vault().clone(), editor.config().clone())
            };
            let pending = PendingContent::prepare(content, &vault, &config)
                .await
                .map_err(to_js)?;

            let committed = session.editor.borrow_mut().commit_add(pending.clone(), color);
            match committed {
                Ok(id) => {
                    persist_change(&session).await;
                    Ok(JsValue::from_str(&id))
                }
                Err(e) => {
                    pending.discard(&vault).await;
                    Err(to_js(e))
                }
            }
        })
    }

    fn edit(&self, id: String, content: Option<ItemContent>, color: Option<String>) -> Promise {
        let session = Rc::clone(&self.session);

        future_to_promise(async move {
            let (vault, config) = {
                let editor = session.editor.borrow();
                (editor.vault().clone(), editor.config().clone())
            };
            let pending = match content {
                Some(content) => Some(
                    PendingContent::prepare(content, &vault, &config)
                        .await
                        .map_err(to_js)?,
                ),
                None => None,
            };

            let committed = session
                .editor
                .borrow_mut()
                .commit_edit(&id, pending.clone(), color);
            match committed {
                Ok(stale) => {
                    if let Some(stale) = stale {
                        vault.remove(&stale).await;
                    }
                    persist_change(&session).await;
                    Ok(JsValue::UNDEFINED)
                }
                Err(e) => {
                    if let Some(pending) = pending {
                        pending.discard(&vault).await;
                    }
                    Err(to_js(e))
                }
            }
        })
    }

    fn spawn_persist(&self) {
        let session = Rc::clone(&self.session);
        spawn_local(async move {
            persist_change(&session).await;
        });
    }
}

/// Initialize logging and panic reporting.
#[wasm_bindgen(start)]
pub fn run_wasm() {
    console_error_panic_hook::set_once();

    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("Logger already set: {}", e)));
    }

    log::info!("Tier list core loaded (WASM)");
}
