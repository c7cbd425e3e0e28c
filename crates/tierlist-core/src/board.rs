//! Board state: the six fixed containers and the items they hold.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Color tag given to items added without one.
pub const DEFAULT_COLOR_TAG: &str = "#ff8a8a";

/// One of the fixed, named item containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContainerId {
    /// Unranked intake pool.
    #[serde(rename = "storage")]
    Storage,
    #[serde(rename = "tier-S")]
    TierS,
    #[serde(rename = "tier-A")]
    TierA,
    #[serde(rename = "tier-B")]
    TierB,
    #[serde(rename = "tier-C")]
    TierC,
    #[serde(rename = "tier-D")]
    TierD,
}

impl ContainerId {
    /// All containers in wire order.
    pub const ALL: [ContainerId; 6] = [
        ContainerId::Storage,
        ContainerId::TierS,
        ContainerId::TierA,
        ContainerId::TierB,
        ContainerId::TierC,
        ContainerId::TierD,
    ];

    /// Containers in on-screen order, top to bottom.
    pub const DISPLAY_ORDER: [ContainerId; 6] = [
        ContainerId::TierS,
        ContainerId::TierA,
        ContainerId::TierB,
        ContainerId::TierC,
        ContainerId::TierD,
        ContainerId::Storage,
    ];

    /// String form used on the wire and by the rendering layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerId::Storage => "storage",
            ContainerId::TierS => "tier-S",
            ContainerId::TierA => "tier-A",
            ContainerId::TierB => "tier-B",
            ContainerId::TierC => "tier-C",
            ContainerId::TierD => "tier-D",
        }
    }

    /// Whether this is the unranked storage pool.
    pub fn is_storage(&self) -> bool {
        matches!(self, ContainerId::Storage)
    }

    fn index(self) -> usize {
        match self {
            ContainerId::Storage => 0,
            ContainerId::TierS => 1,
            ContainerId::TierA => 2,
            ContainerId::TierB => 3,
            ContainerId::TierC => 4,
            ContainerId::TierD => 5,
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the six container ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown container id: {0}")]
pub struct UnknownContainer(pub String);

impl FromStr for ContainerId {
    type Err = UnknownContainer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContainerId::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownContainer(s.to_string()))
    }
}

/// What an item displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Text,
    Image,
}

/// A labeled entry on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Stable identifier, unique within a board.
    pub id: String,
    /// Text label, or the resolved image payload for image items.
    pub content: String,
    pub color_tag: String,
    pub kind: ItemKind,
    /// External-storage reference backing an image payload.
    #[serde(skip)]
    pub image_ref: Option<String>,
}

impl Item {
    /// Create a text item with a freshly generated id.
    pub fn text(content: impl Into<String>, color_tag: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            color_tag: color_tag.into(),
            kind: ItemKind::Text,
            image_ref: None,
        }
    }

    /// Create an image item with a freshly generated id.
    ///
    /// `payload` is the displayable image (a data URL); `image_ref` is where
    /// that payload is persisted, if it was.
    pub fn image(
        payload: impl Into<String>,
        image_ref: Option<String>,
        color_tag: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: payload.into(),
            color_tag: color_tag.into(),
            kind: ItemKind::Image,
            image_ref,
        }
    }

    /// Replace the generated id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn is_image(&self) -> bool {
        self.kind == ItemKind::Image
    }
}

/// Board mutation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("Item id already on the board: {0}")]
    DuplicateItem(String),
}

/// The full normalized state: every container and its ordered items.
///
/// All six containers always exist. An item id appears in at most one
/// container at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    containers: [Vec<Item>; 6],
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Items held by a container, in display order.
    pub fn items(&self, container: ContainerId) -> &[Item] {
        &self.containers[container.index()]
    }

    pub(crate) fn items_mut(&mut self, container: ContainerId) -> &mut Vec<Item> {
        &mut self.containers[container.index()]
    }

    /// Iterate containers in wire order with their items.
    pub fn iter(&self) -> impl Iterator<Item = (ContainerId, &[Item])> {
        ContainerId::ALL
            .into_iter()
            .map(move |c| (c, self.items(c)))
    }

    /// Iterate every item on the board.
    pub fn all_items(&self) -> impl Iterator<Item = &Item> {
        self.containers.iter().flatten()
    }

    /// Locate an item: its container and index.
    pub fn find(&self, id: &str) -> Option<(ContainerId, usize)> {
        ContainerId::ALL.into_iter().find_map(|c| {
            self.items(c)
                .iter()
                .position(|item| item.id == id)
                .map(|index| (c, index))
        })
    }

    /// Container currently holding an item.
    pub fn container_of(&self, id: &str) -> Option<ContainerId> {
        self.find(id).map(|(c, _)| c)
    }

    /// Index of an item within a specific container.
    pub fn position_in(&self, container: ContainerId, id: &str) -> Option<usize> {
        self.items(container).iter().position(|item| item.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.find(id).map(|(c, i)| &self.items(c)[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Item> {
        let (c, i) = self.find(id)?;
        Some(&mut self.items_mut(c)[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Append an item to the end of a container.
    pub fn push(&mut self, container: ContainerId, item: Item) -> Result<(), BoardError> {
        if self.contains(&item.id) {
            return Err(BoardError::DuplicateItem(item.id));
        }
        self.items_mut(container).push(item);
        Ok(())
    }

    /// Remove an item wherever it is.
    pub fn remove(&mut self, id: &str) -> Option<(ContainerId, Item)> {
        let (c, i) = self.find(id)?;
        Some((c, self.items_mut(c).remove(i)))
    }

    /// Empty every container, returning what was removed.
    pub fn clear(&mut self) -> Vec<Item> {
        self.containers
            .iter_mut()
            .flat_map(std::mem::take)
            .collect()
    }

    /// Total number of items.
    pub fn len(&self) -> usize {
        self.containers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.iter().all(Vec::is_empty)
    }

    /// External-storage references held by image items.
    pub fn image_refs(&self) -> HashSet<&str> {
        self.all_items()
            .filter_map(|item| item.image_ref.as_deref())
            .collect()
    }

    /// Ids of a container's items, in order.
    pub fn item_ids(&self, container: ContainerId) -> Vec<&str> {
        self.items(container).iter().map(|i| i.id.as_str()).collect()
    }

    /// Check that no item id appears twice anywhere on the board.
    pub fn has_unique_ids(&self) -> bool {
        let mut seen = HashSet::new();
        self.all_items().all(|item| seen.insert(item.id.as_str()))
    }
}
