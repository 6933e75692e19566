//! Fixed-shape proofs accepted by the teleport gateways.
//!
//! Each proof arrives from the prover as a flat array of field words whose
//! positions are fixed by the circuit. The structs here give every position a
//! name so that callers never index the raw array directly; `from_elements`
//! and `to_elements` are the only places the layout is spelled out.

use crate::errors::CoreError;
use crate::types::{Balance, Field};
use std::fmt;

/// Number of field words in a root transition proof.
pub const ROOT_TRANSITION_PROOF_LEN: usize = 32;

/// Number of field words in a batch (folding-scheme) teleport proof.
pub const BATCH_TELEPORT_PROOF_LEN: usize = 34;

/// Number of public inputs of a single (pairing-based) teleport proof.
pub const SINGLE_TELEPORT_PUBLIC_INPUTS: usize = 3;

/// Number of field words handed to the single teleport oracle.
pub const SINGLE_TELEPORT_ORACLE_INPUT_LEN: usize = 11;

/// Trailing oracle-internal words of a root transition proof.
pub const ROOT_TRANSITION_ORACLE_WORDS: usize = ROOT_TRANSITION_PROOF_LEN - 7;

/// Trailing oracle-internal words of a batch teleport proof.
pub const BATCH_TELEPORT_ORACLE_WORDS: usize = BATCH_TELEPORT_PROOF_LEN - 9;

fn check_len(what: &'static str, elements: &[Field], expected: usize) -> Result<(), CoreError> {
    if elements.len() != expected {
        return Err(CoreError::InvalidLength {
            what,
            expected,
            actual: elements.len(),
        });
    }
    Ok(())
}

fn copy_words<const N: usize>(elements: &[Field]) -> [Field; N] {
    let mut words = [Field::ZERO; N];
    words.copy_from_slice(&elements[..N]);
    words
}

/// The values a teleport proof attests to, shared by both teleport shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeleportClaim {
    /// The transfer root (local or global) the proof was built against
    pub transfer_root: Field,
    /// The recipient commitment
    pub recipient: Field,
    /// The total value ever sent to the recipient under that root
    pub cumulative_value: Balance,
}

/// Proof advancing a gateway's transfer root from one hash-chain snapshot to another.
///
/// Layout: `[header, old_index, old_hash_chain, old_root, new_index,
/// new_hash_chain, new_root, oracle_data..]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootTransitionProof {
    /// Position 0, not interpreted by the gateway
    pub header: Field,
    /// Transfer index of the already proved state
    pub old_index: u64,
    /// Hash chain of the already proved state (not checked)
    pub old_hash_chain: Field,
    /// Transfer root of the already proved state
    pub old_root: Field,
    /// Transfer index of the new state
    pub new_index: u64,
    /// Hash chain the new state commits to
    pub new_hash_chain: Field,
    /// Transfer root of the new state
    pub new_root: Field,
    /// Oracle-internal words
    pub oracle_data: [Field; ROOT_TRANSITION_ORACLE_WORDS],
}

impl RootTransitionProof {
    /// Decodes a proof from its flat field-word array.
    pub fn from_elements(elements: &[Field]) -> Result<Self, CoreError> {
        check_len("root transition proof", elements, ROOT_TRANSITION_PROOF_LEN)?;

        Ok(Self {
            header: elements[0],
            old_index: elements[1].to_u64()?,
            old_hash_chain: elements[2],
            old_root: elements[3],
            new_index: elements[4].to_u64()?,
            new_hash_chain: elements[5],
            new_root: elements[6],
            oracle_data: copy_words(&elements[7..]),
        })
    }

    /// Encodes the proof back into the flat array handed to the oracle.
    pub fn to_elements(&self) -> Vec<Field> {
        let mut elements = Vec::with_capacity(ROOT_TRANSITION_PROOF_LEN);
        elements.push(self.header);
        elements.push(Field::from_u64(self.old_index));
        elements.push(self.old_hash_chain);
        elements.push(self.old_root);
        elements.push(Field::from_u64(self.new_index));
        elements.push(self.new_hash_chain);
        elements.push(self.new_root);
        elements.extend_from_slice(&self.oracle_data);
        elements
    }
}

impl fmt::Display for RootTransitionProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RootTransition {{ {} @ {} -> {} @ {} }}",
            self.old_root, self.old_index, self.new_root, self.new_index
        )
    }
}

/// One folding step's state vector inside a batch teleport proof.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IvcState {
    /// Index of the next transfer-tree leaf to fold
    pub leaf_index: Field,
    /// Transfer root all folded leaves are proven against
    pub transfer_root: Field,
    /// Recipient commitment all folded leaves pay to
    pub recipient: Field,
    /// Running sum of folded transfer values
    pub cumulative_value: Field,
}

impl IvcState {
    fn from_words(words: &[Field]) -> Self {
        Self {
            leaf_index: words[0],
            transfer_root: words[1],
            recipient: words[2],
            cumulative_value: words[3],
        }
    }

    fn push_words(&self, out: &mut Vec<Field>) {
        out.push(self.leaf_index);
        out.push(self.transfer_root);
        out.push(self.recipient);
        out.push(self.cumulative_value);
    }
}

/// Folding-scheme (IVC decider) proof covering many transfers to one recipient.
///
/// Layout: `[steps, initial (4 words), final (4 words), oracle_data..]` where a
/// state is `[leaf_index, transfer_root, recipient, cumulative_value]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchTeleportProof {
    /// Number of folded steps
    pub steps: Field,
    /// State before the first step
    pub initial: IvcState,
    /// State after the last step
    pub final_state: IvcState,
    /// Oracle-internal words
    pub oracle_data: [Field; BATCH_TELEPORT_ORACLE_WORDS],
}

impl BatchTeleportProof {
    /// Decodes a proof from its flat field-word array.
    pub fn from_elements(elements: &[Field]) -> Result<Self, CoreError> {
        check_len("batch teleport proof", elements, BATCH_TELEPORT_PROOF_LEN)?;

        Ok(Self {
            steps: elements[0],
            initial: IvcState::from_words(&elements[1..5]),
            final_state: IvcState::from_words(&elements[5..9]),
            oracle_data: copy_words(&elements[9..]),
        })
    }

    /// Encodes the proof back into the flat array handed to the oracle.
    pub fn to_elements(&self) -> Vec<Field> {
        let mut elements = Vec::with_capacity(BATCH_TELEPORT_PROOF_LEN);
        elements.push(self.steps);
        self.initial.push_words(&mut elements);
        self.final_state.push_words(&mut elements);
        elements.extend_from_slice(&self.oracle_data);
        elements
    }

    /// Extracts the claim made by the final state.
    pub fn claim(&self) -> Result<TeleportClaim, CoreError> {
        Ok(TeleportClaim {
            transfer_root: self.final_state.transfer_root,
            recipient: self.final_state.recipient,
            cumulative_value: self.final_state.cumulative_value.to_u128()?,
        })
    }
}

/// Pairing-based proof for a single transfer-sum claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleTeleportProof {
    /// First proof point
    pub a: [Field; 2],
    /// Second proof point (G2, two coordinates of two limbs)
    pub b: [[Field; 2]; 2],
    /// Third proof point
    pub c: [Field; 2],
    /// Public input 0
    pub transfer_root: Field,
    /// Public input 1
    pub recipient: Field,
    /// Public input 2
    pub cumulative_value: Field,
}

impl SingleTeleportProof {
    /// Returns the public input vector `[transfer_root, recipient, cumulative_value]`.
    pub fn public_inputs(&self) -> [Field; SINGLE_TELEPORT_PUBLIC_INPUTS] {
        [self.transfer_root, self.recipient, self.cumulative_value]
    }

    /// Flattens the proof as `a || b || c || public inputs` for the oracle.
    pub fn to_elements(&self) -> Vec<Field> {
        let mut elements = Vec::with_capacity(SINGLE_TELEPORT_ORACLE_INPUT_LEN);
        elements.extend_from_slice(&self.a);
        elements.extend_from_slice(&self.b[0]);
        elements.extend_from_slice(&self.b[1]);
        elements.extend_from_slice(&self.c);
        elements.extend_from_slice(&self.public_inputs());
        elements
    }

    /// Extracts the claim made by the public inputs.
    pub fn claim(&self) -> Result<TeleportClaim, CoreError> {
        Ok(TeleportClaim {
            transfer_root: self.transfer_root,
            recipient: self.recipient,
            cumulative_value: self.cumulative_value.to_u128()?,
        })
    }
}
