//! Blocks of the DAG and their mutable metadata.
//!
//! A [`Block`] payload is immutable once admitted. Everything consensus
//! mutates afterwards (flags, balance, difficulty, height, back-pointers)
//! lives in its [`BlockInfo`].

use crate::address::Address;
use crate::amount::XAmount;
use crate::hash::{BlockHash, HashLow};
use crate::keys::{PublicKey, Signature};
use crate::state::{BlockFlag, BlockFlags};
use crate::time::XdagTime;
use crate::Difficulty;
use serde::{Deserialize, Serialize};

/// Mutable per-block metadata, persisted separately from the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub hashlow: HashLow,
    pub hash: BlockHash,
    pub timestamp: XdagTime,
    pub flags: BlockFlags,
    /// Balance currently held by the block.
    pub amount: XAmount,
    /// Fees collected by the block (gas folded in when it settles as main).
    pub fee: XAmount,
    /// Cumulative difficulty along the max-difficulty path.
    pub difficulty: Difficulty,
    /// Highest-weight predecessor.
    pub max_diff_link: Option<HashLow>,
    /// Block that consumed this one during an apply pass.
    pub reference: Option<HashLow>,
    /// Main-chain height; zero unless the block is main.
    pub height: u64,
    pub remark: Option<String>,
}

impl BlockInfo {
    pub fn new(hash: BlockHash, timestamp: XdagTime) -> Self {
        Self {
            hashlow: hash.hash_low(),
            hash,
            timestamp,
            flags: BlockFlags::empty(),
            amount: XAmount::ZERO,
            fee: XAmount::ZERO,
            difficulty: Difficulty::zero(),
            max_diff_link: None,
            reference: None,
            height: 0,
            remark: None,
        }
    }

    pub fn round(&self) -> u64 {
        self.timestamp.round()
    }
}

/// A parsed block as handed to the consensus core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Network/type tag from the block header.
    pub type_tag: u8,
    pub timestamp: XdagTime,
    /// Ordered link list.
    pub links: Vec<Address>,
    /// Fee declared by a transaction block, charged once per output.
    pub fee: XAmount,
    /// Proof-of-work nonce, present on mined blocks.
    pub nonce: Option<[u8; 32]>,
    /// Keys the block declares; candidates for input authorization.
    pub public_keys: Vec<PublicKey>,
    pub signatures: Vec<Signature>,
    /// Serialized block bytes: PoW hash input and signed message.
    pub payload: Vec<u8>,
    pub info: BlockInfo,
}

impl Block {
    pub fn new(type_tag: u8, hash: BlockHash, timestamp: XdagTime, links: Vec<Address>) -> Self {
        Self {
            type_tag,
            timestamp,
            links,
            fee: XAmount::ZERO,
            nonce: None,
            public_keys: Vec::new(),
            signatures: Vec::new(),
            payload: Vec::new(),
            info: BlockInfo::new(hash, timestamp),
        }
    }

    pub fn with_fee(mut self, fee: XAmount) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.info.remark = Some(remark.into());
        self.info.flags.set(BlockFlag::Remark, true);
        self
    }

    pub fn with_nonce(mut self, nonce: [u8; 32]) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_public_keys(mut self, keys: Vec<PublicKey>) -> Self {
        self.public_keys = keys;
        self
    }

    pub fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn hash(&self) -> BlockHash {
        self.info.hash
    }

    pub fn hashlow(&self) -> HashLow {
        self.info.hashlow
    }

    pub fn round(&self) -> u64 {
        self.timestamp.round()
    }

    /// Whether the block moves value out of blocks or accounts.
    pub fn is_transaction(&self) -> bool {
        self.links.iter().any(|l| l.kind.is_input())
    }

    /// A mined block closing its round, a candidate for the extra pool.
    pub fn is_round_closing(&self) -> bool {
        self.timestamp.is_end_of_round() && self.nonce.is_some()
    }

    /// Block-to-block links with their targets, in link order.
    pub fn block_links(&self) -> impl DoubleEndedIterator<Item = (HashLow, &Address)> + '_ {
        self.links
            .iter()
            .filter_map(|link| link.block().map(|target| (target, link)))
    }

    pub fn flags(&self) -> BlockFlags {
        self.info.flags
    }
}
