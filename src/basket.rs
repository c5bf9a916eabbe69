//! Per-visitor shopping basket.
//!
//! Basket state never touches the database: it is an in-process key-value
//! store keyed by the visitor's session id, living exactly as long as the
//! process (and the visitor's cookie). Each basket is an ordered mapping
//! product id -> quantity; lines keep their first-added position.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BasketLine {
    pub product_id: i32,
    pub quantity: u32,
}

#[derive(Default)]
pub struct BasketStore {
    baskets: Mutex<HashMap<Uuid, Vec<BasketLine>>>,
}

impl BasketStore {
    pub fn new() -> Self {
        BasketStore::default()
    }

    /// Adds `quantity` to the session's line, appending one if none exists.
    pub fn add(&self, session: Uuid, product_id: i32, quantity: u32) {
        let mut baskets = self.lock();
        let lines = baskets.entry(session).or_default();
        match lines.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => lines.push(BasketLine {
                product_id,
                quantity,
            }),
        }
    }

    /// Sets the quantity; 0 removes the line. False when there is no line.
    pub fn update(&self, session: Uuid, product_id: i32, quantity: u32) -> bool {
        let mut baskets = self.lock();
        let Some(lines) = baskets.get_mut(&session) else {
            return false;
        };
        if quantity == 0 {
            let before = lines.len();
            lines.retain(|line| line.product_id != product_id);
            return lines.len() != before;
        }
        match lines.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Removes the line. Returns false when there was none.
    pub fn remove(&self, session: Uuid, product_id: i32) -> bool {
        let mut baskets = self.lock();
        let Some(lines) = baskets.get_mut(&session) else {
            return false;
        };
        let before = lines.len();
        lines.retain(|line| line.product_id != product_id);
        lines.len() != before
    }

    /// The session's lines in insertion order.
    pub fn lines(&self, session: Uuid) -> Vec<BasketLine> {
        self.lock().get(&session).cloned().unwrap_or_default()
    }

    /// Drops lines whose product id is not in `live`.
    pub fn prune(&self, session: Uuid, live: &[i32]) {
        let mut baskets = self.lock();
        if let Some(lines) = baskets.get_mut(&session) {
            lines.retain(|line| live.contains(&line.product_id));
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Vec<BasketLine>>> {
        self.baskets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
