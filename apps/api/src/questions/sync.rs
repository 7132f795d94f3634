//! Planning for the "apply the whole desired list" edit.
//!
//! The editor sends the full ordered question list it wants to end up with; the
//! plan splits it into creates, updates and deletes, with every order taken from
//! the position in the list.

use std::collections::HashSet;

use uuid::Uuid;

use crate::questions::models::{QuestionFields, SyncEntry};
use crate::questions::ordering::OrderingError;

#[derive(Debug, Clone)]
pub struct PlannedQuestion {
    pub id: Uuid,
    pub order: i32,
    pub fields: QuestionFields,
}

#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub creates: Vec<PlannedQuestion>,
    pub updates: Vec<PlannedQuestion>,
    pub deletes: Vec<Uuid>,
}

pub fn plan_sync(existing: &[Uuid], desired: Vec<SyncEntry>) -> Result<SyncPlan, OrderingError> {
    let known: HashSet<Uuid> = existing.iter().copied().collect();
    let mut kept = HashSet::new();
    let mut plan = SyncPlan::default();

    for (index, entry) in desired.into_iter().enumerate() {
        let order = index as i32 + 1;
        let fields = entry.fields.normalized();
        match entry.id {
            Some(id) => {
                if !known.contains(&id) {
                    return Err(OrderingError::UnknownQuestion(id));
                }
                if !kept.insert(id) {
                    return Err(OrderingError::DuplicateQuestion(id));
                }
                plan.updates.push(PlannedQuestion { id, order, fields });
            }
            None => plan.creates.push(PlannedQuestion {
                id: Uuid::new_v4(),
                order,
                fields,
            }),
        }
    }

    plan.deletes = existing
        .iter()
        .filter(|id| !kept.contains(*id))
        .copied()
        .collect();

    Ok(plan)
}
