//! Typed references inside a block's link list.
//!
//! A link either points at another block (`In`/`Out`, the legacy form) or at
//! a plain account in the address index (`Input`/`Output`/`Coinbase`).

use crate::amount::XAmount;
use crate::hash::{hex, HashLow};
use crate::error::ParseHashError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 20-byte account identifier in the address index.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId([u8; 20]);

impl AccountId {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Extract the account carried in a 32-byte link field (bytes 8..28).
    pub fn from_link_field(field: &[u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&field[8..28]);
        Self(bytes)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl FromStr for AccountId {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode_fixed::<20>(s).map(Self)
    }
}

/// Direction of a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    /// Spend from a referenced block's balance.
    In,
    /// Pay into a referenced block, or a plain zero-amount DAG reference.
    Out,
    /// Spend from an account balance.
    Input,
    /// Pay into an account balance.
    Output,
    /// Reward address of a mined block.
    Coinbase,
}

impl LinkKind {
    /// Whether funds flow into the linking block through this link.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::In | Self::Input)
    }

    pub fn is_output(&self) -> bool {
        matches!(self, Self::Out | Self::Output)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::Input => "input",
            Self::Output => "output",
            Self::Coinbase => "coinbase",
        }
    }
}

/// What a link points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkTarget {
    Block(HashLow),
    Account(AccountId),
}

/// One entry of a block's ordered link list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub target: LinkTarget,
    pub kind: LinkKind,
    pub amount: XAmount,
}

impl Address {
    pub fn block_in(block: HashLow, amount: XAmount) -> Self {
        Self {
            target: LinkTarget::Block(block),
            kind: LinkKind::In,
            amount,
        }
    }

    pub fn block_out(block: HashLow, amount: XAmount) -> Self {
        Self {
            target: LinkTarget::Block(block),
            kind: LinkKind::Out,
            amount,
        }
    }

    /// A plain DAG reference carrying no value.
    pub fn reference(block: HashLow) -> Self {
        Self::block_out(block, XAmount::ZERO)
    }

    pub fn account_input(account: AccountId, amount: XAmount) -> Self {
        Self {
            target: LinkTarget::Account(account),
            kind: LinkKind::Input,
            amount,
        }
    }

    pub fn account_output(account: AccountId, amount: XAmount) -> Self {
        Self {
            target: LinkTarget::Account(account),
            kind: LinkKind::Output,
            amount,
        }
    }

    pub fn coinbase(account: AccountId) -> Self {
        Self {
            target: LinkTarget::Account(account),
            kind: LinkKind::Coinbase,
            amount: XAmount::ZERO,
        }
    }

    /// The referenced block, if this is a block-to-block link.
    pub fn block(&self) -> Option<HashLow> {
        match self.target {
            LinkTarget::Block(h) => Some(h),
            LinkTarget::Account(_) => None,
        }
    }

    /// The referenced account, if this is an address-form link.
    pub fn account(&self) -> Option<AccountId> {
        match self.target {
            LinkTarget::Account(a) => Some(a),
            LinkTarget::Block(_) => None,
        }
    }

    pub fn is_address_form(&self) -> bool {
        matches!(self.target, LinkTarget::Account(_))
    }

    /// Block links must be `In`/`Out`; account links `Input`/`Output`/`Coinbase`.
    pub fn is_well_formed(&self) -> bool {
        match self.target {
            LinkTarget::Block(_) => matches!(self.kind, LinkKind::In | LinkKind::Out),
            LinkTarget::Account(_) => matches!(
                self.kind,
                LinkKind::Input | LinkKind::Output | LinkKind::Coinbase
            ),
        }
    }
}
