//! Drop-target resolution.
//!
//! The rendering layer reports what the pointer (or keyboard cursor) is over
//! when a drag ends. Whole-row drops are the common case, so a container
//! surface always beats an item surface reported for the same drop.

use crate::board::{Board, ContainerId};
use serde::{Deserialize, Serialize};

/// Something an item can be dropped on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum DropTarget {
    /// A tier row's empty area or the storage area.
    ContainerSurface(ContainerId),
    /// Another item on the board.
    ItemSurface(String),
}

impl DropTarget {
    /// Interpret an untyped drop id: container ids name container surfaces,
    /// anything else is taken to be an item id.
    pub fn from_raw_id(id: &str) -> Self {
        match id.parse::<ContainerId>() {
            Ok(container) => DropTarget::ContainerSurface(container),
            Err(_) => DropTarget::ItemSurface(id.to_string()),
        }
    }
}

/// Resolve a single target to the container it designates.
pub fn resolve_target(target: &DropTarget, board: &Board) -> Option<ContainerId> {
    match target {
        DropTarget::ContainerSurface(container) => Some(*container),
        DropTarget::ItemSurface(id) => board.container_of(id),
    }
}

/// Resolve the destination container for a drop.
///
/// Returns `None` when nothing resolves (empty, detached or stale targets);
/// the move is then aborted.
pub fn resolve(over: &[DropTarget], board: &Board) -> Option<ContainerId> {
    let surface = over.iter().find_map(|target| match target {
        DropTarget::ContainerSurface(container) => Some(*container),
        DropTarget::ItemSurface(_) => None,
    });

    surface.or_else(|| over.iter().find_map(|target| resolve_target(target, board)))
}

/// The item the drop landed on, used as the reorder anchor.
pub fn destination_item(over: &[DropTarget]) -> Option<&str> {
    over.iter().find_map(|target| match target {
        DropTarget::ItemSurface(id) => Some(id.as_str()),
        DropTarget::ContainerSurface(_) => None,
    })
}
