//! Order arithmetic for an opportunity's question list.
//!
//! Every function takes the current layout and returns the complete next layout,
//! always numbered `1..=N` with no gaps or duplicates. The store persists only the
//! rows whose order changed (see [`changed_slots`]).

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::questions::models::OrderAssignment;

/// A question's position within its opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub id: Uuid,
    pub order: i32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderingError {
    #[error("order {order} is out of range (expected 1..={max})")]
    OutOfRange { order: i32, max: i32 },

    #[error("question {0} does not belong to this opportunity")]
    UnknownQuestion(Uuid),

    #[error("question {0} appears more than once")]
    DuplicateQuestion(Uuid),

    #[error("orders must form the sequence 1..={count} without gaps or duplicates")]
    NotContiguous { count: usize },
}

impl From<OrderingError> for AppError {
    fn from(err: OrderingError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Ids sorted by current order. Ties (only possible with legacy data) break on id.
fn ids_in_order(current: &[Slot]) -> Vec<Uuid> {
    let mut sorted = current.to_vec();
    sorted.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
    sorted.into_iter().map(|s| s.id).collect()
}

fn number(ids: Vec<Uuid>) -> Vec<Slot> {
    ids.into_iter()
        .enumerate()
        .map(|(i, id)| Slot {
            id,
            order: i as i32 + 1,
        })
        .collect()
}

fn position_of(ids: &[Uuid], id: Uuid) -> Result<usize, OrderingError> {
    ids.iter()
        .position(|candidate| *candidate == id)
        .ok_or(OrderingError::UnknownQuestion(id))
}

/// True when the orders are exactly `{1..=len}`.
pub fn is_contiguous(slots: &[Slot]) -> bool {
    let mut orders: Vec<i32> = slots.iter().map(|s| s.order).collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(i, order)| *order == i as i32 + 1)
}

/// Places `new_id` at `at` (1-based), shifting that slot and everything after it
/// down by one. `None` appends.
pub fn plan_insert(
    current: &[Slot],
    new_id: Uuid,
    at: Option<i32>,
) -> Result<Vec<Slot>, OrderingError> {
    let mut ids = ids_in_order(current);
    let max = ids.len() as i32 + 1;
    let at = at.unwrap_or(max);
    if !(1..=max).contains(&at) {
        return Err(OrderingError::OutOfRange { order: at, max });
    }
    ids.insert((at - 1) as usize, new_id);
    Ok(number(ids))
}

/// Drops `id` and closes the gap it leaves.
pub fn plan_remove(current: &[Slot], id: Uuid) -> Result<Vec<Slot>, OrderingError> {
    let mut ids = ids_in_order(current);
    let index = position_of(&ids, id)?;
    ids.remove(index);
    Ok(number(ids))
}

/// Moves `id` to position `to`; the questions in between slide by one.
pub fn plan_move(current: &[Slot], id: Uuid, to: i32) -> Result<Vec<Slot>, OrderingError> {
    let mut ids = ids_in_order(current);
    let max = ids.len() as i32;
    if !(1..=max).contains(&to) {
        return Err(OrderingError::OutOfRange { order: to, max });
    }
    let from = position_of(&ids, id)?;
    let moved = ids.remove(from);
    ids.insert((to - 1) as usize, moved);
    Ok(number(ids))
}

/// Applies explicit `{id, order}` pairs over the current layout.
///
/// Questions not named keep their current order. The result must still be
/// exactly `1..=N`, so a partial mapping is only accepted when it does not
/// collide with the untouched questions.
pub fn plan_reorder(
    current: &[Slot],
    assignments: &[OrderAssignment],
) -> Result<Vec<Slot>, OrderingError> {
    let mut orders: HashMap<Uuid, i32> = current.iter().map(|s| (s.id, s.order)).collect();
    let max = current.len() as i32;
    let mut seen = HashSet::new();

    for assignment in assignments {
        if !seen.insert(assignment.id) {
            return Err(OrderingError::DuplicateQuestion(assignment.id));
        }
        let slot = orders
            .get_mut(&assignment.id)
            .ok_or(OrderingError::UnknownQuestion(assignment.id))?;
        if !(1..=max).contains(&assignment.order) {
            return Err(OrderingError::OutOfRange {
                order: assignment.order,
                max,
            });
        }
        *slot = assignment.order;
    }

    let mut next: Vec<Slot> = current
        .iter()
        .map(|s| Slot {
            id: s.id,
            order: orders[&s.id],
        })
        .collect();
    if !is_contiguous(&next) {
        return Err(OrderingError::NotContiguous {
            count: current.len(),
        });
    }

    next.sort_by_key(|s| s.order);
    Ok(next)
}

/// Slots of `next` whose order differs from `current`. Ids absent from
/// `current` are not included.
pub fn changed_slots(current: &[Slot], next: &[Slot]) -> Vec<Slot> {
    let before: HashMap<Uuid, i32> = current.iter().map(|s| (s.id, s.order)).collect();
    next.iter()
        .filter(|slot| matches!(before.get(&slot.id), Some(order) if *order != slot.order))
        .copied()
        .collect()
}
