//! Common types used across the workspace.

pub mod amount;
pub mod id;

pub use amount::{Amount, AmountOverflow, Balance, Commodity};
pub use id::EntryId;
