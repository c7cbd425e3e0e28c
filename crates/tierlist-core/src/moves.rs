//! Move engine: drag sessions and applying resolved drops to a board.

use crate::board::{Board, ContainerId};
use crate::resolver::{DropTarget, destination_item, resolve};
use serde::{Deserialize, Serialize};

/// An in-progress drag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragSession {
    pub dragged_item_id: String,
    pub source_container: ContainerId,
    pub is_source_storage: bool,
}

/// Begin dragging an item. Returns `None` if the item is not on the board.
pub fn start_drag(board: &Board, item_id: &str) -> Option<DragSession> {
    let source_container = board.container_of(item_id)?;
    log::debug!("Drag start: {} from {}", item_id, source_container);
    Some(DragSession {
        dragged_item_id: item_id.to_string(),
        source_container,
        is_source_storage: source_container.is_storage(),
    })
}

/// Apply a resolved move, returning the new board.
///
/// Within one container the dragged item takes the index of `dest_item`
/// (or the end when there is none); across containers it is removed from the
/// source and appended to the destination. If the dragged item is not in its
/// claimed source container the board is returned unchanged.
pub fn apply_move(
    board: &Board,
    session: &DragSession,
    dest_container: ContainerId,
    dest_item: Option<&str>,
) -> Board {
    let source = session.source_container;
    let Some(old_index) = board.position_in(source, &session.dragged_item_id) else {
        log::debug!(
            "Item {} not found in source container {}",
            session.dragged_item_id,
            source
        );
        return board.clone();
    };

    let mut next = board.clone();

    if dest_container == source {
        let items = next.items_mut(source);
        let new_index = dest_item
            .and_then(|id| items.iter().position(|item| item.id == id))
            .unwrap_or(items.len());
        if new_index != old_index {
            let item = items.remove(old_index);
            let new_index = new_index.min(items.len());
            items.insert(new_index, item);
        }
        log::debug!("Reorder in {}: {} -> {}", source, old_index, new_index);
    } else {
        let item = next.items_mut(source).remove(old_index);
        log::debug!("Move {} from {} to {}", item.id, source, dest_container);
        next.items_mut(dest_container).push(item);
    }

    next
}

/// Finish a drag: resolve the drop targets and apply the move.
///
/// An unresolvable drop leaves the board unchanged.
pub fn complete_drag(board: &Board, session: &DragSession, over: &[DropTarget]) -> Board {
    match resolve(over, board) {
        Some(dest) => apply_move(board, session, dest, destination_item(over)),
        None => {
            log::debug!("No drop target for {}, cancelling", session.dragged_item_id);
            board.clone()
        }
    }
}

/// Arrow-key direction for keyboard dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyDirection {
    Left,
    Right,
    Up,
    Down,
}

impl KeyDirection {
    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(KeyDirection::Left),
            "ArrowRight" => Some(KeyDirection::Right),
            "ArrowUp" => Some(KeyDirection::Up),
            "ArrowDown" => Some(KeyDirection::Down),
            _ => None,
        }
    }
}

/// Drop target reached by one keyboard step from the dragged item.
///
/// Left/Right step onto the neighbouring item in the same container;
/// Up/Down step to the adjacent container in display order.
pub fn keyboard_target(
    board: &Board,
    session: &DragSession,
    direction: KeyDirection,
) -> Option<DropTarget> {
    let (container, index) = board.find(&session.dragged_item_id)?;
    let items = board.items(container);

    match direction {
        KeyDirection::Left => index
            .checked_sub(1)
            .map(|i| DropTarget::ItemSurface(items[i].id.clone())),
        KeyDirection::Right => items
            .get(index + 1)
            .map(|item| DropTarget::ItemSurface(item.id.clone())),
        KeyDirection::Up | KeyDirection::Down => {
            let order = ContainerId::DISPLAY_ORDER;
            let pos = order.iter().position(|c| *c == container)?;
            let next = match direction {
                KeyDirection::Up => pos.checked_sub(1)?,
                _ => pos + 1,
            };
            order.get(next).map(|c| DropTarget::ContainerSurface(*c))
        }
    }
}
