//! Regeneration confirmation for the UI thread
//!
//! The UI cannot block inside a resolution pass waiting for a click, so
//! [`ConfirmGate`] declines unapproved regenerations and remembers them.
//! The confirmation bar lists the remembered requests; approving one
//! grants a single regeneration and the app re-runs the connection.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::connectivity::{GeneratorKind, RegenerationGate};
use crate::model::EntityId;

/// A regeneration waiting for the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRegeneration {
    pub connection: EntityId,
    pub kind: GeneratorKind,
}

#[derive(Debug, Default)]
pub struct ConfirmGate {
    ask: bool,
    approved: RefCell<HashSet<EntityId>>,
    pending: RefCell<Vec<PendingRegeneration>>,
}

impl ConfirmGate {
    /// With `ask` false every regeneration is allowed
    pub fn new(ask: bool) -> Self {
        Self {
            ask,
            ..Default::default()
        }
    }

    pub fn set_ask(&mut self, ask: bool) {
        self.ask = ask;
        if !ask {
            self.pending.get_mut().clear();
        }
    }

    /// Allow the next regeneration of `connection`
    pub fn approve(&self, connection: EntityId) {
        self.pending.borrow_mut().retain(|p| p.connection != connection);
        self.approved.borrow_mut().insert(connection);
    }

    pub fn dismiss(&self, connection: EntityId) {
        self.pending.borrow_mut().retain(|p| p.connection != connection);
    }

    pub fn pending(&self) -> Vec<PendingRegeneration> {
        self.pending.borrow().clone()
    }
}

impl RegenerationGate for ConfirmGate {
    fn confirm(&self, connection: EntityId, kind: GeneratorKind) -> bool {
        if !self.ask || self.approved.borrow_mut().remove(&connection) {
            return true;
        }
        let mut pending = self.pending.borrow_mut();
        if !pending.iter().any(|p| p.connection == connection) {
            tracing::debug!("Regeneration of {} waits for confirmation", connection);
            pending.push(PendingRegeneration { connection, kind });
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NetworkModel;
    use glam::Vec2;

    fn some_id() -> EntityId {
        NetworkModel::new().add_population("p", 1, Vec2::ZERO)
    }

    #[test]
    fn test_gate_without_asking_allows() {
        let gate = ConfirmGate::new(false);
        assert!(gate.confirm(some_id(), GeneratorKind::Kernel));
        assert!(gate.pending().is_empty());
    }

    #[test]
    fn test_decline_then_approve_once() {
        let gate = ConfirmGate::new(true);
        let id = some_id();
        assert!(!gate.confirm(id, GeneratorKind::Script));
        assert!(!gate.confirm(id, GeneratorKind::Script));
        assert_eq!(gate.pending().len(), 1);

        gate.approve(id);
        assert!(gate.pending().is_empty());
        assert!(gate.confirm(id, GeneratorKind::Script));
        assert!(!gate.confirm(id, GeneratorKind::Script));
    }

    #[test]
    fn test_dismiss_forgets_request() {
        let gate = ConfirmGate::new(true);
        let id = some_id();
        gate.confirm(id, GeneratorKind::Kernel);
        gate.dismiss(id);
        assert!(gate.pending().is_empty());
    }
}
