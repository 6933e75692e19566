//! The token ledger a gateway sits next to.

use crate::errors::LedgerError;
use std::collections::HashMap;
use teleport_core::hash::hash_chain_step;
use teleport_core::types::{Address, Balance, Field};
use tracing::debug;

/// What a gateway needs from its chain's token ledger.
pub trait SourceLedger {
    /// Number of outbound transfers recorded so far.
    fn transfer_index(&self) -> u64;

    /// Running accumulator over every outbound transfer.
    fn hash_chain(&self) -> Field;

    /// Credits `amount` to `to`. Only the configured minter may call this.
    fn mint(&mut self, minter: &Address, to: &Address, amount: Balance) -> Result<(), LedgerError>;
}

/// A token ledger held in memory.
///
/// Outbound transfers burn the sender's balance and extend the hash chain with
/// `h' = H(h, H(destination, value))`.
#[derive(Clone, Debug)]
pub struct MemoryLedger {
    minter: Address,
    balances: HashMap<Address, Balance>,
    total_supply: Balance,
    transfer_index: u64,
    hash_chain: Field,
}

impl MemoryLedger {
    /// Creates an empty ledger whose only minter is `minter`.
    pub fn new(minter: Address) -> Self {
        Self {
            minter,
            balances: HashMap::new(),
            total_supply: 0,
            transfer_index: 0,
            hash_chain: Field::ZERO,
        }
    }

    pub fn minter(&self) -> Address {
        self.minter
    }

    /// Replaces the minter.
    pub fn set_minter(&mut self, minter: Address) {
        self.minter = minter;
    }

    /// Credits `amount` to `account` outside the teleport flow.
    pub fn credit(&mut self, account: &Address, amount: Balance) -> Result<(), LedgerError> {
        let balance = self.balances.get(account).copied().unwrap_or(0);
        let balance = balance.checked_add(amount).ok_or(LedgerError::Overflow("balance"))?;
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow("total supply"))?;

        self.balances.insert(*account, balance);
        self.total_supply = supply;
        Ok(())
    }

    /// Burns `amount` from `from` and records an outbound transfer to
    /// `destination`. Returns the new transfer index and hash chain.
    pub fn transfer(&mut self, from: &Address, destination: Field, amount: Balance) -> Result<(u64, Field), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        let index = self
            .transfer_index
            .checked_add(1)
            .ok_or(LedgerError::Overflow("transfer index"))?;

        self.balances.insert(*from, available - amount);
        self.total_supply -= amount;
        self.transfer_index = index;
        self.hash_chain = hash_chain_step(&self.hash_chain, &destination, &Field::from_u128(amount));

        debug!(
            "Transfer #{} of {} to {} (hash chain {})",
            index, amount, destination, self.hash_chain
        );
        Ok((index, self.hash_chain))
    }

    pub fn balance_of(&self, account: &Address) -> Balance {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Balance {
        self.total_supply
    }
}

impl SourceLedger for MemoryLedger {
    fn transfer_index(&self) -> u64 {
        self.transfer_index
    }

    fn hash_chain(&self) -> Field {
        self.hash_chain
    }

    fn mint(&mut self, minter: &Address, to: &Address, amount: Balance) -> Result<(), LedgerError> {
        if *minter != self.minter {
            return Err(LedgerError::UnauthorizedMinter(*minter));
        }
        self.credit(to, amount)
    }
}
