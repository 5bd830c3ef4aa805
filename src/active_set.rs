//! Primal-dual active set for frictionless unilateral contact.
use crate::dual::Dual;
use crate::normals::NodalFrame;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactState {
    /// In contact: normal gap and tangential multiplier vanish.
    Active,
    /// Separated: the multiplier vanishes.
    Inactive,
    /// Configured as always inactive: the multiplier is held at its current value.
    Frozen,
}

/// Contact state of every slave node, keyed by node id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSet {
    states: BTreeMap<usize, ContactState>,
}

impl ActiveSet {
    pub fn state(&self, node_id: usize) -> Option<ContactState> {
        self.states.get(&node_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, ContactState)> + '_ {
        self.states.iter().map(|(id, state)| (*id, *state))
    }

    pub fn active_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes_in(ContactState::Active)
    }

    pub fn inactive_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes_in(ContactState::Inactive)
    }

    fn nodes_in(&self, state: ContactState) -> impl Iterator<Item = usize> + '_ {
        self.iter().filter(move |(_, s)| *s == state).map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub(crate) fn insert(&mut self, node_id: usize, state: ContactState) {
        self.states.insert(node_id, state);
    }
}

/// The KKT sign test: a node is active iff `lambda_n - g_n > 0`.
pub fn classify(normal_multiplier: f64, normal_gap: f64) -> ContactState {
    if normal_multiplier - normal_gap > 0.0 {
        ContactState::Active
    } else {
        ContactState::Inactive
    }
}

/// Constraint residual rows of one slave node that took part in contact integration.
///
/// Returns the two rows for the node's multiplier dofs together with the chosen state.
pub(crate) fn contact_rows(
    frozen: bool,
    normal_gap: &Dual,
    multiplier: &Vector2<Dual>,
    frame: &NodalFrame<Dual>,
) -> ([Dual; 2], ContactState) {
    if frozen {
        let rows = [
            &multiplier[0] - multiplier[0].value(),
            &multiplier[1] - multiplier[1].value(),
        ];
        return (rows, ContactState::Frozen);
    }

    let normal_multiplier = frame.normal.dot(multiplier);
    match classify(normal_multiplier.value(), normal_gap.value()) {
        ContactState::Active => {
            let tangential_multiplier = frame.tangent.dot(multiplier);
            ([normal_gap.clone(), tangential_multiplier], ContactState::Active)
        }
        _ => ([multiplier[0].clone(), multiplier[1].clone()], ContactState::Inactive),
    }
}
