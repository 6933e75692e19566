//! Ordered registry of participating chains and their latest roots.

use std::collections::HashMap;
use teleport_core::merkle::MAX_LEAVES;
use teleport_core::types::{EndpointId, Field, TokenInfo};

/// Append-only list of registered chains plus their aggregation slots.
///
/// `positions` maps an endpoint id to its **1-based** position in `infos`;
/// a missing entry (position 0) means "unregistered". Positions are assigned
/// once and never change, so slot `position - 1` of `transfer_roots` and
/// `transfer_tree_indices` always belongs to the same chain.
#[derive(Clone, Debug, Default)]
pub struct ChainRegistry {
    /// Registrations in registration order
    infos: Vec<TokenInfo>,
    /// Endpoint id -> 1-based position
    positions: HashMap<EndpointId, usize>,
    /// Latest transfer root per slot
    transfer_roots: Vec<Field>,
    /// Transfer index of the latest root per slot
    transfer_tree_indices: Vec<u64>,
}

impl ChainRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered chains.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Returns `true` if no chain is registered.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Returns `true` once `MAX_LEAVES` chains are registered.
    pub fn is_full(&self) -> bool {
        self.infos.len() >= MAX_LEAVES
    }

    /// Returns the 1-based position of `eid`, or 0 if it is not registered.
    pub fn position(&self, eid: EndpointId) -> usize {
        self.positions.get(&eid).copied().unwrap_or(0)
    }

    /// Returns `true` if `eid` is registered.
    pub fn contains(&self, eid: EndpointId) -> bool {
        self.position(eid) != 0
    }

    /// Appends a registration with a zeroed slot and returns its 1-based position.
    ///
    /// Callers check capacity and uniqueness first.
    pub(crate) fn push(&mut self, info: TokenInfo) -> usize {
        self.infos.push(info.clone());
        self.transfer_roots.push(Field::ZERO);
        self.transfer_tree_indices.push(0);

        let position = self.infos.len();
        self.positions.insert(info.eid, position);
        position
    }

    /// Replaces a registration in place, keeping its slot.
    pub(crate) fn replace(&mut self, info: TokenInfo) -> Option<usize> {
        let position = self.position(info.eid);
        if position == 0 {
            return None;
        }
        self.infos[position - 1] = info;
        Some(position)
    }

    /// Writes a root into the slot of `eid`. Returns `Some(changed)` if registered.
    pub(crate) fn set_root(&mut self, eid: EndpointId, root: Field, index: u64) -> Option<bool> {
        let position = self.position(eid);
        if position == 0 {
            return None;
        }

        let slot = position - 1;
        let changed = self.transfer_roots[slot] != root;
        self.transfer_roots[slot] = root;
        self.transfer_tree_indices[slot] = index;
        Some(changed)
    }

    /// Returns the registration of `eid`.
    pub fn info(&self, eid: EndpointId) -> Option<&TokenInfo> {
        match self.position(eid) {
            0 => None,
            position => self.infos.get(position - 1),
        }
    }

    /// Returns every registration in registration order.
    pub fn infos(&self) -> &[TokenInfo] {
        &self.infos
    }

    /// Returns the latest root of every slot, in registration order.
    pub fn transfer_roots(&self) -> &[Field] {
        &self.transfer_roots
    }

    /// Returns the latest root and index reported by `eid`.
    pub fn slot(&self, eid: EndpointId) -> Option<(Field, u64)> {
        match self.position(eid) {
            0 => None,
            position => Some((
                self.transfer_roots[position - 1],
                self.transfer_tree_indices[position - 1],
            )),
        }
    }
}
