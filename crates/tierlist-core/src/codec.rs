//! Board serialization for share links and snapshots.
//!
//! The wire format is a JSON object with exactly the six container keys,
//! each holding an array of `{ id, content, kind, colorTag }` records.

use crate::board::{Board, ContainerId, DEFAULT_COLOR_TAG, Item, ItemKind};
use crate::imaging::{IMAGE_PLACEHOLDER, is_image_data_url};
use crate::storage::{BlobStore, ImageVault};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Errors rejecting a serialized board. The caller's board stays as it was.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid board JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Board JSON is not an object")]
    NotAnObject,
    #[error("Missing container: {0}")]
    MissingContainer(&'static str),
    #[error("Unknown container: {0}")]
    UnknownContainer(String),
    #[error("Duplicate item id: {0}")]
    DuplicateItem(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireItem {
    id: String,
    content: String,
    #[serde(default)]
    kind: ItemKind,
    #[serde(default = "default_color_tag")]
    color_tag: String,
}

fn default_color_tag() -> String {
    DEFAULT_COLOR_TAG.to_string()
}

/// Serialize a board.
///
/// With `include_image_payloads` image items carry their payload inline
/// (self-contained, large). Without it they carry their storage reference
/// instead, which keeps the string small enough for URL transport; images
/// that were never persisted still carry their payload.
pub fn encode(board: &Board, include_image_payloads: bool) -> String {
    let mut root = Map::new();
    for (container, items) in board.iter() {
        let items: Vec<Value> = items
            .iter()
            .map(|item| {
                let content = match (&item.kind, &item.image_ref) {
                    (ItemKind::Image, Some(reference)) if !include_image_payloads => reference,
                    _ => &item.content,
                };
                json!({
                    "id": item.id,
                    "content": content,
                    "kind": item.kind,
                    "colorTag": item.color_tag,
                })
            })
            .collect();
        root.insert(container.as_str().to_string(), Value::Array(items));
    }
    Value::Object(root).to_string()
}

/// Validate a serialized board without touching storage.
fn parse(serialized: &str) -> Result<Vec<(ContainerId, Vec<WireItem>)>, DecodeError> {
    let Value::Object(mut root) = serde_json::from_str::<Value>(serialized)? else {
        return Err(DecodeError::NotAnObject);
    };

    if let Some(unknown) = root
        .keys()
        .find(|key| key.parse::<ContainerId>().is_err())
    {
        return Err(DecodeError::UnknownContainer(unknown.clone()));
    }

    let mut seen = HashSet::new();
    let mut containers = Vec::with_capacity(ContainerId::ALL.len());
    for container in ContainerId::ALL {
        let value = root
            .remove(container.as_str())
            .ok_or(DecodeError::MissingContainer(container.as_str()))?;
        let items: Vec<WireItem> = serde_json::from_value(value)?;
        for item in &items {
            if !seen.insert(item.id.clone()) {
                return Err(DecodeError::DuplicateItem(item.id.clone()));
            }
        }
        containers.push((container, items));
    }
    Ok(containers)
}

/// Turn a wire image record into an in-memory item holding its payload.
///
/// References the item ends up using are held in the vault and recorded in
/// `held`, so later items of the same decode cannot evict them.
async fn hydrate_image<S: BlobStore>(
    item: WireItem,
    vault: &ImageVault<S>,
    held: &mut Vec<String>,
) -> Item {
    let (content, image_ref) = if vault.is_reference(&item.content) {
        match vault.resolve(&item.content).await {
            Some(payload) => {
                vault.hold(&item.content);
                held.push(item.content.clone());
                (payload, Some(item.content))
            }
            None => {
                log::warn!("Image {} for item {} is missing", item.content, item.id);
                (IMAGE_PLACEHOLDER.to_string(), None)
            }
        }
    } else if is_image_data_url(&item.content) {
        let reference = vault.store_payload(&item.content).await;
        held.extend(reference.iter().cloned());
        (item.content, reference)
    } else {
        (item.content, None)
    };

    Item {
        id: item.id,
        content,
        color_tag: item.color_tag,
        kind: ItemKind::Image,
        image_ref,
    }
}

/// Deserialize a board.
///
/// Image references are resolved through the vault (unresolvable ones
/// become [`IMAGE_PLACEHOLDER`]); inline payloads are persisted under fresh
/// references. Afterwards, stored images the new board does not use are
/// pruned.
pub async fn decode<S: BlobStore>(
    serialized: &str,
    vault: &ImageVault<S>,
) -> Result<Board, DecodeError> {
    let containers = parse(serialized)?;

    let mut board = Board::new();
    let mut held = Vec::new();
    for (container, items) in containers {
        let target = board.items_mut(container);
        for item in items {
            let item = match item.kind {
                ItemKind::Image => hydrate_image(item, vault, &mut held).await,
                ItemKind::Text => Item {
                    id: item.id,
                    content: item.content,
                    color_tag: item.color_tag,
                    kind: ItemKind::Text,
                    image_ref: None,
                },
            };
            target.push(item);
        }
    }

    vault.prune_except(&board.image_refs()).await;
    for reference in &held {
        vault.release(reference);
    }
    log::info!("Decoded board with {} items", board.len());
    Ok(board)
}

/// Build a share link: `base` with the encoded board in query parameter
/// `param` (percent-encoded).
pub fn share_url(base: &str, param: &str, encoded: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.set_fragment(None);
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.extend_pairs(retained);
        query.append_pair(param, encoded);
    }
    Ok(url.into())
}

/// Extract the encoded board from a share link, if present.
pub fn board_param(url: &str, param: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
