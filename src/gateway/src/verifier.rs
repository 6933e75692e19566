//! Proof oracles and the five verifier slots of a gateway.

use crate::errors::GatewayError;
use std::fmt;
use std::sync::Arc;
use teleport_core::hash::hash_pair;
use teleport_core::proofs::{
    BatchTeleportProof, RootTransitionProof, SingleTeleportProof, BATCH_TELEPORT_PROOF_LEN,
    ROOT_TRANSITION_PROOF_LEN, SINGLE_TELEPORT_ORACLE_INPUT_LEN,
};
use teleport_core::types::{Address, Field, ZERO_ADDRESS};

/// An external proof oracle. It sees the flattened proof and answers yes or no.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, elements: &[Field]) -> bool;
}

/// Which oracle a proof is checked by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VerifierKind {
    TransferRoot,
    BatchTeleportLocal,
    BatchTeleportGlobal,
    SingleTeleportLocal,
    SingleTeleportGlobal,
}

impl VerifierKind {
    /// The batch teleport oracle for the given root source.
    pub fn batch(is_global: bool) -> Self {
        if is_global {
            VerifierKind::BatchTeleportGlobal
        } else {
            VerifierKind::BatchTeleportLocal
        }
    }

    /// The single teleport oracle for the given root source.
    pub fn single(is_global: bool) -> Self {
        if is_global {
            VerifierKind::SingleTeleportGlobal
        } else {
            VerifierKind::SingleTeleportLocal
        }
    }
}

/// An oracle together with the address it is deployed at.
#[derive(Clone)]
pub struct VerifierSlot {
    pub address: Address,
    pub oracle: Arc<dyn ProofVerifier>,
}

impl VerifierSlot {
    pub fn new(address: Address, oracle: Arc<dyn ProofVerifier>) -> Self {
        Self { address, oracle }
    }
}

impl fmt::Debug for VerifierSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifierSlot(0x{})", hex::encode(self.address))
    }
}

/// The five oracles of a gateway, rotated together.
#[derive(Clone, Debug)]
pub struct VerifierSet {
    pub transfer_root: VerifierSlot,
    pub batch_teleport_local: VerifierSlot,
    pub batch_teleport_global: VerifierSlot,
    pub single_teleport_local: VerifierSlot,
    pub single_teleport_global: VerifierSlot,
}

impl VerifierSet {
    /// Fails if any slot has a zero address.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let slots = [
            (&self.transfer_root, "transfer root verifier"),
            (&self.batch_teleport_local, "local batch teleport verifier"),
            (&self.batch_teleport_global, "global batch teleport verifier"),
            (&self.single_teleport_local, "local single teleport verifier"),
            (&self.single_teleport_global, "global single teleport verifier"),
        ];
        for (slot, name) in slots {
            if slot.address == ZERO_ADDRESS {
                return Err(GatewayError::ZeroAddress(name));
            }
        }
        Ok(())
    }

    pub fn slot(&self, kind: VerifierKind) -> &VerifierSlot {
        match kind {
            VerifierKind::TransferRoot => &self.transfer_root,
            VerifierKind::BatchTeleportLocal => &self.batch_teleport_local,
            VerifierKind::BatchTeleportGlobal => &self.batch_teleport_global,
            VerifierKind::SingleTeleportLocal => &self.single_teleport_local,
            VerifierKind::SingleTeleportGlobal => &self.single_teleport_global,
        }
    }

    /// Asks the oracle of `kind` about `elements`.
    pub fn verify(&self, kind: VerifierKind, elements: &[Field]) -> bool {
        self.slot(kind).oracle.verify(elements)
    }

    /// Builds a set of seal oracles at deterministic addresses derived from `seed`.
    ///
    /// The seed occupies bytes 27..31 and the slot number plus one the last
    /// byte, so distinct seeds never share an address.
    pub fn sealed(seed: u32) -> Self {
        let slot = |n: u8, oracle: SealVerifier| {
            let mut address = [0x5e; 32];
            address[27..31].copy_from_slice(&seed.to_be_bytes());
            address[31] = n + 1;
            VerifierSlot::new(address, Arc::new(oracle))
        };

        Self {
            transfer_root: slot(0, SealVerifier::RootTransition),
            batch_teleport_local: slot(1, SealVerifier::BatchTeleport),
            batch_teleport_global: slot(2, SealVerifier::BatchTeleport),
            single_teleport_local: slot(3, SealVerifier::SingleTeleport),
            single_teleport_global: slot(4, SealVerifier::SingleTeleport),
        }
    }
}

/// An oracle that always gives the same answer.
#[derive(Clone, Copy, Debug)]
pub struct StaticVerifier(pub bool);

impl ProofVerifier for StaticVerifier {
    fn verify(&self, _elements: &[Field]) -> bool {
        self.0
    }
}

/// Development oracle: a proof is valid when its first oracle word equals the
/// hash fold of its public words.
///
/// This binds every public word of the proof without any real proving system
/// and is what the devnet and the test suites prove against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SealVerifier {
    /// Public words 0..7, seal at 7
    RootTransition,
    /// Public words 0..9, seal at 9
    BatchTeleport,
    /// Public inputs at 8..11, seal in `a[0]`
    SingleTeleport,
}

/// Folds `words` into one seal.
pub fn seal(words: &[Field]) -> Field {
    words.iter().fold(Field::ZERO, |acc, word| hash_pair(&acc, word))
}

impl SealVerifier {
    /// Input width, seal position and sealed public words.
    fn layout(&self) -> (usize, usize, std::ops::Range<usize>) {
        match self {
            SealVerifier::RootTransition => (ROOT_TRANSITION_PROOF_LEN, 7, 0..7),
            SealVerifier::BatchTeleport => (BATCH_TELEPORT_PROOF_LEN, 9, 0..9),
            SealVerifier::SingleTeleport => (SINGLE_TELEPORT_ORACLE_INPUT_LEN, 0, 8..11),
        }
    }

    /// Seals a root transition proof in place.
    pub fn seal_root_transition(proof: &mut RootTransitionProof) {
        let elements = proof.to_elements();
        proof.oracle_data[0] = seal(&elements[..7]);
    }

    /// Seals a batch teleport proof in place.
    pub fn seal_batch_teleport(proof: &mut BatchTeleportProof) {
        let elements = proof.to_elements();
        proof.oracle_data[0] = seal(&elements[..9]);
    }

    /// Seals a single teleport proof in place.
    pub fn seal_single_teleport(proof: &mut SingleTeleportProof) {
        proof.a[0] = seal(&proof.public_inputs());
    }
}

impl ProofVerifier for SealVerifier {
    fn verify(&self, elements: &[Field]) -> bool {
        let (width, at, public) = self.layout();
        elements.len() == width && elements[at] == seal(&elements[public])
    }
}
