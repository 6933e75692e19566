//! Integration tests for the cross-chain teleport.

#[cfg(test)]
mod harness;

#[cfg(test)]
mod aggregation_tests;
#[cfg(test)]
mod delivery_tests;
#[cfg(test)]
mod devnet_tests;
#[cfg(test)]
mod scenario_tests;
