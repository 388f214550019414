#![warn(
    unused_extern_crates,
    missing_debug_implementations,
    missing_copy_implementations,
    rust_2018_idioms,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::fallible_impl_from,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::print_stdout,
    clippy::dbg_macro
)]
#![cfg_attr(not(test), warn(clippy::unwrap_used))]
#![forbid(unsafe_code)]

pub mod abi;
pub mod ethereum;
pub mod leg;
mod secret;
mod serde_hex;
mod timestamp;
pub mod transaction;

pub use self::{
    leg::{ContractId, CreatedLeg, LegState, SwapLeg},
    secret::{Error as SecretError, Secret, SecretHash, SecretHashPair},
    timestamp::Timestamp,
};

/// A module for exporting dependencies that appear in the public API of our
/// crate.
///
/// Consumers that need to construct a signing key use the re-exported crate
/// instead of declaring a dependency whose version must be kept in sync.
pub mod export {
    pub use ::secp256k1;
}
