//! Shared fixtures for consensus unit tests.

use std::sync::Arc;

use xdag_nullables::{
    NullAddressStore, NullBlockStore, NullClock, NullOrphanStore, NullPow, NullTxHistory,
    NullVerifier,
};
use xdag_types::{Address, Block, BlockHash, ChainParams, HashLow, PublicKey, XdagTime};

use crate::{Blockchain, ChainCollaborators};

/// Round the test clock starts in.
pub(crate) const NOW_ROUND: u64 = 1_000;

/// A block hash whose weight is exactly `2^(64 - k) - 1`, distinct per `id`.
pub(crate) fn weighted_hash(id: u32, k: u32) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[8..12].copy_from_slice(&id.to_le_bytes());
    bytes[24..32].copy_from_slice(&(1u64 << k).to_le_bytes());
    BlockHash::new(bytes)
}

pub(crate) fn hl(id: u32, k: u32) -> HashLow {
    weighted_hash(id, k).hash_low()
}

/// A plain (non-extra) block in the middle of `round`.
pub(crate) fn block(id: u32, k: u32, round: u64, links: Vec<Address>) -> Block {
    let ts = XdagTime::new(XdagTime::start_of_round(round).ticks() + 0x100);
    Block::new(ChainParams::devnet().network.block_type_tag(), weighted_hash(id, k), ts, links)
        .with_payload(id.to_le_bytes().to_vec())
}

/// A mined block closing `round`, destined for the extra pool.
pub(crate) fn mined(id: u32, k: u32, round: u64, links: Vec<Address>) -> Block {
    let mut b = block(id, k, round, links).with_nonce([id as u8; 32]);
    b.timestamp = XdagTime::end_of_round(round);
    b.info.timestamp = b.timestamp;
    b
}

pub(crate) fn refs(targets: &[HashLow]) -> Vec<Address> {
    targets.iter().map(|h| Address::reference(*h)).collect()
}

pub(crate) struct TestChain {
    pub(crate) chain: Blockchain,
    pub(crate) store: Arc<NullBlockStore>,
    pub(crate) addresses: Arc<NullAddressStore>,
    pub(crate) orphans: Arc<NullOrphanStore>,
    pub(crate) history: Arc<NullTxHistory>,
    pub(crate) pow: Arc<NullPow>,
    pub(crate) verifier: Arc<NullVerifier>,
    pub(crate) clock: Arc<NullClock>,
}

impl TestChain {
    pub(crate) fn new() -> Self {
        Self::with_params(ChainParams::devnet(), Vec::new())
    }

    pub(crate) fn with_params(params: ChainParams, local_keys: Vec<PublicKey>) -> Self {
        let store = Arc::new(NullBlockStore::new());
        let addresses = Arc::new(NullAddressStore::new());
        let orphans = Arc::new(NullOrphanStore::new());
        let history = Arc::new(NullTxHistory::new());
        let pow = Arc::new(NullPow::new());
        let verifier = Arc::new(NullVerifier::new());
        let clock = Arc::new(NullClock::new(XdagTime::start_of_round(NOW_ROUND)));

        let collaborators = ChainCollaborators {
            store: store.clone(),
            addresses: addresses.clone(),
            orphans: orphans.clone(),
            history: history.clone(),
            pow: pow.clone(),
            verifier: verifier.clone(),
            clock: clock.clone(),
        };
        let chain = Blockchain::new(params, collaborators, local_keys).unwrap();

        Self {
            chain,
            store,
            addresses,
            orphans,
            history,
            pow,
            verifier,
            clock,
        }
    }

    /// Open a second chain over the same collaborators.
    pub(crate) fn reopen(&self, params: ChainParams) -> Blockchain {
        let collaborators = ChainCollaborators {
            store: self.store.clone(),
            addresses: self.addresses.clone(),
            orphans: self.orphans.clone(),
            history: self.history.clone(),
            pow: self.pow.clone(),
            verifier: self.verifier.clone(),
            clock: self.clock.clone(),
        };
        Blockchain::new(params, collaborators, Vec::new()).unwrap()
    }

    pub(crate) fn info(&self, hashlow: &HashLow) -> xdag_types::BlockInfo {
        self.chain.get_block_by_hash(hashlow).unwrap().unwrap().info
    }

    pub(crate) fn top(&self) -> Option<HashLow> {
        self.chain.top_status().top
    }

    /// Move past the promotion delay of every block imported so far.
    pub(crate) fn age(&self) {
        self.clock.advance_rounds(self.chain.params().main_confirm_delay_rounds + 1);
    }
}
