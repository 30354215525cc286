//! XDAG ledger application.
//!
//! Settling a block means executing the value movements its links describe,
//! together with everything it transitively references that has not been
//! settled yet. Only main blocks trigger settlement; everything they pull in
//! is settled exactly once, guarded by the `MAIN_REF` flag. Unapply undoes a
//! settlement exactly when a reorganization demotes a main block.

pub mod apply;
pub mod error;
pub mod ledger;
pub mod reward;
pub mod transfer;
pub mod unapply;

#[cfg(test)]
pub(crate) mod test_support;

pub use apply::{apply, ApplyOutcome, ApplyStatus};
pub use error::LedgerError;
pub use ledger::LedgerView;
pub use reward::{reward, supply};
pub use transfer::Transfer;
pub use unapply::unapply;
