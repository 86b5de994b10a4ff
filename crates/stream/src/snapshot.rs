use std::sync::Arc;

use factoring_core::ContractId;

/// A live contract: its ledger contract id plus the immutable payload.
///
/// Payloads are shared (`Arc`) between snapshots and every derived view, so re-joining an
/// unchanged snapshot hands out the same allocations.
#[derive(Debug, PartialEq, Eq)]
pub struct Contract<T> {
    contract_id: ContractId,
    payload: Arc<T>,
}

impl<T> Contract<T> {
    pub fn new(contract_id: ContractId, payload: T) -> Self {
        Self {
            contract_id,
            payload: Arc::new(payload),
        }
    }

    pub fn contract_id(&self) -> &ContractId {
        &self.contract_id
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Shared handle to the payload (pointer-stable across re-reads of one snapshot).
    pub fn payload_arc(&self) -> Arc<T> {
        Arc::clone(&self.payload)
    }
}

impl<T> Clone for Contract<T> {
    fn clone(&self) -> Self {
        Self {
            contract_id: self.contract_id.clone(),
            payload: Arc::clone(&self.payload),
        }
    }
}

/// The complete live set of one contract type at one instant.
///
/// Snapshots are never deltas: each emission replaces the previous one wholesale.
/// - `revision` increases by one per emission of the source stream (0 = nothing delivered yet)
/// - contract order is the ledger's arrival order and is preserved by every consumer
#[derive(Debug)]
pub struct Snapshot<T> {
    revision: u64,
    contracts: Arc<Vec<Contract<T>>>,
}

impl<T> Snapshot<T> {
    pub fn new(revision: u64, contracts: Vec<Contract<T>>) -> Self {
        Self {
            revision,
            contracts: Arc::new(contracts),
        }
    }

    /// Nothing delivered yet (partial load).
    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn contracts(&self) -> &[Contract<T>] {
        &self.contracts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contract<T>> {
        self.contracts.iter()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn find(&self, contract_id: &ContractId) -> Option<&Contract<T>> {
        self.contracts.iter().find(|c| c.contract_id() == contract_id)
    }

    /// Narrow the snapshot to the contracts matching `keep`, sharing payloads.
    pub fn retain(&self, mut keep: impl FnMut(&T) -> bool) -> Self {
        let contracts = self
            .contracts
            .iter()
            .filter(|c| keep(c.payload()))
            .cloned()
            .collect();
        Self::new(self.revision, contracts)
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            revision: self.revision,
            contracts: Arc::clone(&self.contracts),
        }
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::empty()
    }
}
