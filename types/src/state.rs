//! Block state flags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single block state bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockFlag {
    /// Permanently part of the canonical ledger.
    Main,
    /// On the current canonical path, not yet buried deep enough.
    MainChain,
    /// Balance effects executed.
    Applied,
    /// Visited by an apply pass.
    MainRef,
    /// Referenced by another block; no longer an orphan.
    Ref,
    /// Signed by a local key.
    Ours,
    /// Minted this round and held in memory only.
    Extra,
    /// Carries a memo.
    Remark,
}

impl BlockFlag {
    pub const ALL: [Self; 8] = [
        Self::Main,
        Self::MainChain,
        Self::Applied,
        Self::MainRef,
        Self::Ref,
        Self::Ours,
        Self::Extra,
        Self::Remark,
    ];

    /// Position in the on-disk bit layout.
    pub const fn bit(self) -> u8 {
        match self {
            Self::Main => 0x01,
            Self::MainChain => 0x02,
            Self::Applied => 0x04,
            Self::MainRef => 0x08,
            Self::Ref => 0x10,
            Self::Ours => 0x20,
            Self::Extra => 0x40,
            Self::Remark => 0x80,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "MAIN",
            Self::MainChain => "MAIN_CHAIN",
            Self::Applied => "APPLIED",
            Self::MainRef => "MAIN_REF",
            Self::Ref => "REF",
            Self::Ours => "OURS",
            Self::Extra => "EXTRA",
            Self::Remark => "REMARK",
        }
    }
}

/// Set of [`BlockFlag`]s, serialized as the historical single-byte layout.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockFlags(u8);

impl BlockFlags {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, flag: BlockFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn set(&mut self, flag: BlockFlag, on: bool) {
        if on {
            self.0 |= flag.bit();
        } else {
            self.0 &= !flag.bit();
        }
    }

    pub fn with(mut self, flag: BlockFlag) -> Self {
        self.set(flag, true);
        self
    }

    pub fn is_main(&self) -> bool {
        self.contains(BlockFlag::Main)
    }

    pub fn is_main_chain(&self) -> bool {
        self.contains(BlockFlag::MainChain)
    }

    pub fn is_applied(&self) -> bool {
        self.contains(BlockFlag::Applied)
    }

    pub fn is_main_ref(&self) -> bool {
        self.contains(BlockFlag::MainRef)
    }

    pub fn is_ref(&self) -> bool {
        self.contains(BlockFlag::Ref)
    }

    pub fn is_ours(&self) -> bool {
        self.contains(BlockFlag::Ours)
    }

    pub fn is_extra(&self) -> bool {
        self.contains(BlockFlag::Extra)
    }

    pub fn has_remark(&self) -> bool {
        self.contains(BlockFlag::Remark)
    }
}

impl fmt::Debug for BlockFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = BlockFlag::ALL
            .iter()
            .filter(|flag| self.contains(**flag))
            .map(|flag| flag.as_str())
            .collect();
        write!(f, "BlockFlags({})", names.join("|"))
    }
}
