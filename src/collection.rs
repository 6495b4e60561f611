use crate::models::Item;
use crate::persistence::Persistence;
use std::collections::HashSet;
use tracing::{debug, info};

/// A request to relocate `active_id` to the slot currently held by `target_id`.
///
/// Every reorder gesture (pointer drop, keyboard drop, move-up/down command)
/// ends up as one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub active_id: String,
    pub target_id: String,
}

impl MoveRequest {
    pub fn new(active_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        MoveRequest {
            active_id: active_id.into(),
            target_id: target_id.into(),
        }
    }
}

/// Remove the element at `from` and reinsert it at `to`.
/// Out-of-range indices leave the vector untouched.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= items.len() || to >= items.len() {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Pure single-element relocation.
///
/// Returns a copy of `items` with `active_id` moved into `target_id`'s
/// position; everything else keeps its relative order. Identical or unknown
/// ids return the input unchanged.
pub fn relocate<T: Item>(items: &[T], active_id: &str, target_id: &str) -> Vec<T> {
    let mut next = items.to_vec();
    relocate_in_place(&mut next, active_id, target_id);
    next
}

/// In-place form of [`relocate`]. Returns whether anything moved.
pub fn relocate_in_place<T: Item>(items: &mut Vec<T>, active_id: &str, target_id: &str) -> bool {
    if active_id == target_id {
        return false;
    }
    let from = items.iter().position(|i| i.id() == active_id);
    let to = items.iter().position(|i| i.id() == target_id);
    match (from, to) {
        (Some(from), Some(to)) => {
            array_move(items, from, to);
            true
        }
        _ => false,
    }
}

/// True when no two items share an id
pub fn has_unique_ids<T: Item>(items: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().all(|i| seen.insert(i.id()))
}

/// Structural predicate applied to a whole loaded snapshot
pub fn is_valid_snapshot<T: Item>(items: &[T]) -> bool {
    items.iter().all(Item::is_well_formed) && has_unique_ids(items)
}

/// User-ordered sequence of items mirrored into a storage key.
///
/// The vector is the single source of truth for the session: order is the
/// vector order and each item carries its own id, so there are no dangling
/// ids and no orphan payloads. Persistence only mirrors it.
#[derive(Debug, Clone)]
pub struct OrderedCollection<T: Item> {
    key: &'static str,
    items: Vec<T>,
    persistence: Persistence,
}

impl<T: Item> OrderedCollection<T> {
    /// Load the snapshot stored under `key`, or fall back to `defaults`.
    ///
    /// A snapshot with any malformed or duplicate record is discarded whole.
    /// The fallback is not written back.
    pub async fn load(persistence: Persistence, key: &'static str, defaults: Vec<T>) -> Self {
        let items = match persistence
            .load(key, |items: &Vec<T>| is_valid_snapshot(items))
            .await
        {
            Some(items) => {
                info!(key, count = items.len(), "Restored ordered collection");
                items
            }
            None => {
                debug!(key, count = defaults.len(), "Using default collection");
                defaults
            }
        };

        OrderedCollection {
            key,
            items,
            persistence,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.id().to_string()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Apply a move to the in-memory sequence only
    pub fn apply_move(&mut self, request: &MoveRequest) -> bool {
        let moved = relocate_in_place(&mut self.items, &request.active_id, &request.target_id);
        if moved {
            debug!(
                key = self.key,
                active = %request.active_id,
                target = %request.target_id,
                "Relocated item"
            );
        }
        moved
    }

    /// Apply a move and mirror the result to storage when something changed
    pub async fn move_item(&mut self, request: &MoveRequest) -> bool {
        let moved = self.apply_move(request);
        if moved {
            self.save().await;
        }
        moved
    }

    pub async fn save(&self) {
        self.persistence.save(self.key, &self.items).await;
    }

    /// Swap in a whole new sequence. Callers keep ids unique.
    pub(crate) fn replace(&mut self, items: Vec<T>) {
        debug_assert!(has_unique_ids(&items));
        self.items = items;
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|i| i.id() == id)
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.position(id)?;
        Some(self.items.remove(index))
    }
}
