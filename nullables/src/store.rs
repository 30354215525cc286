//! Nullable stores: thread-safe in-memory storage for testing.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use xdag_store::{AddressStore, BlockStore, OrphanStore, StoreError, TxHistory, TxHistoryStore};
use xdag_types::{
    AccountId, Address, Block, BlockInfo, HashLow, XAmount, XdagStats, XdagTime, XdagTopStatus,
};

/// An in-memory block repository.
///
/// Payloads are kept bincode-encoded, the way an on-disk store would hold
/// them; infos are kept decoded so tests can inspect them cheaply.
///
/// Writes can be made to fail on purpose, per block or for the status
/// records, to exercise error paths.
pub struct NullBlockStore {
    payloads: Mutex<HashMap<HashLow, Vec<u8>>>,
    infos: Mutex<HashMap<HashLow, BlockInfo>>,
    heights: Mutex<BTreeMap<u64, HashLow>>,
    top_status: Mutex<Option<XdagTopStatus>>,
    stats: Mutex<Option<XdagStats>>,
    snapshot: bool,
    failing_blocks: Mutex<HashSet<HashLow>>,
    failing_status: AtomicBool,
}

impl NullBlockStore {
    pub fn new() -> Self {
        Self {
            payloads: Mutex::new(HashMap::new()),
            infos: Mutex::new(HashMap::new()),
            heights: Mutex::new(BTreeMap::new()),
            top_status: Mutex::new(None),
            stats: Mutex::new(None),
            snapshot: false,
            failing_blocks: Mutex::new(HashSet::new()),
            failing_status: AtomicBool::new(false),
        }
    }

    /// A store that reports being loaded from a snapshot.
    pub fn snapshot() -> Self {
        Self {
            snapshot: true,
            ..Self::new()
        }
    }

    /// Fail every later payload or info write for `hashlow`.
    pub fn fail_writes_to(&self, hashlow: HashLow) {
        self.failing_blocks.lock().unwrap().insert(hashlow);
    }

    /// Fail every later stats or top-status write.
    pub fn fail_status_writes(&self) {
        self.failing_status.store(true, Ordering::SeqCst);
    }

    pub fn clear_faults(&self) {
        self.failing_blocks.lock().unwrap().clear();
        self.failing_status.store(false, Ordering::SeqCst);
    }

    fn check_block_write(&self, hashlow: &HashLow) -> Result<(), StoreError> {
        if self.failing_blocks.lock().unwrap().contains(hashlow) {
            return Err(StoreError::Backend(format!("injected write failure for {hashlow}")));
        }
        Ok(())
    }

    fn check_status_write(&self) -> Result<(), StoreError> {
        if self.failing_status.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected status write failure".into()));
        }
        Ok(())
    }

    pub fn block_count(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    /// Highest indexed main height.
    pub fn max_height(&self) -> u64 {
        self.heights
            .lock()
            .unwrap()
            .keys()
            .next_back()
            .copied()
            .unwrap_or(0)
    }
}

impl Default for NullBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(block: &Block) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(block).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Block, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl BlockStore for NullBlockStore {
    fn put_block(&self, block: &Block) -> Result<(), StoreError> {
        self.check_block_write(&block.hashlow())?;
        let bytes = encode(block)?;
        self.payloads.lock().unwrap().insert(block.hashlow(), bytes);
        self.save_block_info(&block.info)
    }

    fn get_block(&self, hashlow: &HashLow) -> Result<Option<Block>, StoreError> {
        let Some(bytes) = self.payloads.lock().unwrap().get(hashlow).cloned() else {
            return Ok(None);
        };
        let mut block = decode(&bytes)?;
        if let Some(info) = self.infos.lock().unwrap().get(hashlow) {
            block.info = info.clone();
        }
        Ok(Some(block))
    }

    fn get_block_info(&self, hashlow: &HashLow) -> Result<Option<BlockInfo>, StoreError> {
        Ok(self.infos.lock().unwrap().get(hashlow).cloned())
    }

    fn has_block(&self, hashlow: &HashLow) -> Result<bool, StoreError> {
        Ok(self.payloads.lock().unwrap().contains_key(hashlow))
    }

    fn remove_block(&self, hashlow: &HashLow) -> Result<(), StoreError> {
        self.check_block_write(hashlow)?;
        self.payloads.lock().unwrap().remove(hashlow);
        if let Some(info) = self.infos.lock().unwrap().remove(hashlow) {
            let mut heights = self.heights.lock().unwrap();
            if heights.get(&info.height) == Some(hashlow) {
                heights.remove(&info.height);
            }
        }
        Ok(())
    }

    fn get_block_by_height(&self, height: u64) -> Result<Option<Block>, StoreError> {
        let Some(hashlow) = self.heights.lock().unwrap().get(&height).copied() else {
            return Ok(None);
        };
        self.get_block(&hashlow)
    }

    fn save_block_info(&self, info: &BlockInfo) -> Result<(), StoreError> {
        self.check_block_write(&info.hashlow)?;
        if !self.payloads.lock().unwrap().contains_key(&info.hashlow) {
            return Err(StoreError::MissingBlock(info.hashlow));
        }
        let previous = self
            .infos
            .lock()
            .unwrap()
            .insert(info.hashlow, info.clone());

        let mut heights = self.heights.lock().unwrap();
        if let Some(prev) = previous {
            if prev.height > 0 && heights.get(&prev.height) == Some(&info.hashlow) {
                heights.remove(&prev.height);
            }
        }
        if info.flags.is_main() && info.height > 0 {
            heights.insert(info.height, info.hashlow);
        }
        Ok(())
    }

    fn save_top_status(&self, status: &XdagTopStatus) -> Result<(), StoreError> {
        self.check_status_write()?;
        *self.top_status.lock().unwrap() = Some(status.clone());
        Ok(())
    }

    fn load_top_status(&self) -> Result<Option<XdagTopStatus>, StoreError> {
        Ok(self.top_status.lock().unwrap().clone())
    }

    fn save_stats(&self, stats: &XdagStats) -> Result<(), StoreError> {
        self.check_status_write()?;
        *self.stats.lock().unwrap() = Some(stats.clone());
        Ok(())
    }

    fn load_stats(&self) -> Result<Option<XdagStats>, StoreError> {
        Ok(self.stats.lock().unwrap().clone())
    }

    fn is_snapshot(&self) -> bool {
        self.snapshot
    }
}

/// An in-memory account balance index.
#[derive(Default)]
pub struct NullAddressStore {
    balances: Mutex<HashMap<AccountId, XAmount>>,
    total: Mutex<XAmount>,
}

impl NullAddressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account balance and add it to the total.
    pub fn fund(&self, account: AccountId, amount: XAmount) {
        let mut balances = self.balances.lock().unwrap();
        let entry = balances.entry(account).or_insert(XAmount::ZERO);
        *entry = entry.checked_add(amount).unwrap();
        let mut total = self.total.lock().unwrap();
        *total = total.checked_add(amount).unwrap();
    }
}

impl AddressStore for NullAddressStore {
    fn balance_of(&self, account: &AccountId) -> Result<XAmount, StoreError> {
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(account)
            .copied()
            .unwrap_or(XAmount::ZERO))
    }

    fn update_balance(&self, account: &AccountId, balance: XAmount) -> Result<(), StoreError> {
        self.balances.lock().unwrap().insert(*account, balance);
        Ok(())
    }

    fn address_exists(&self, account: &AccountId) -> Result<bool, StoreError> {
        Ok(self.balances.lock().unwrap().contains_key(account))
    }

    fn total_balance(&self) -> Result<XAmount, StoreError> {
        Ok(*self.total.lock().unwrap())
    }

    fn set_total_balance(&self, total: XAmount) -> Result<(), StoreError> {
        *self.total.lock().unwrap() = total;
        Ok(())
    }
}

/// An in-memory orphan store.
#[derive(Default)]
pub struct NullOrphanStore {
    orphans: Mutex<HashMap<HashLow, XdagTime>>,
}

impl NullOrphanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, hashlow: &HashLow) -> bool {
        self.orphans.lock().unwrap().contains_key(hashlow)
    }
}

impl OrphanStore for NullOrphanStore {
    fn add(&self, hashlow: &HashLow, timestamp: XdagTime) -> Result<(), StoreError> {
        self.orphans.lock().unwrap().insert(*hashlow, timestamp);
        Ok(())
    }

    fn delete(&self, hashlow: &HashLow) -> Result<bool, StoreError> {
        Ok(self.orphans.lock().unwrap().remove(hashlow).is_some())
    }

    fn take(&self, count: usize, before: XdagTime) -> Result<Vec<Address>, StoreError> {
        let orphans = self.orphans.lock().unwrap();
        let mut eligible: Vec<(XdagTime, HashLow)> = orphans
            .iter()
            .filter(|(_, ts)| **ts < before)
            .map(|(h, ts)| (*ts, *h))
            .collect();
        eligible.sort();
        Ok(eligible
            .into_iter()
            .take(count)
            .map(|(_, h)| Address::reference(h))
            .collect())
    }

    fn len(&self) -> Result<u64, StoreError> {
        Ok(self.orphans.lock().unwrap().len() as u64)
    }
}

/// Collects history records in memory.
#[derive(Default)]
pub struct NullTxHistory {
    entries: Mutex<Vec<TxHistory>>,
}

impl NullTxHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<TxHistory> {
        self.entries.lock().unwrap().clone()
    }
}

impl TxHistoryStore for NullTxHistory {
    fn record(&self, entry: &TxHistory) -> Result<(), StoreError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xdag_types::{BlockFlag, BlockHash};

    fn block(n: u8) -> Block {
        let mut bytes = [0u8; 32];
        bytes[8] = n;
        Block::new(0x0c, BlockHash::new(bytes), XdagTime::new(n as u64), vec![])
    }

    #[test]
    fn put_and_get_round_trip() {
        let store = NullBlockStore::new();
        let b = block(1);
        store.put_block(&b).unwrap();
        assert!(store.has_block(&b.hashlow()).unwrap());
        assert_eq!(store.get_block(&b.hashlow()).unwrap(), Some(b));
    }

    #[test]
    fn info_update_is_visible_on_full_get() {
        let store = NullBlockStore::new();
        let b = block(1);
        store.put_block(&b).unwrap();
        let mut info = b.info.clone();
        info.amount = XAmount::from_nano(77);
        store.save_block_info(&info).unwrap();
        let loaded = store.get_block(&b.hashlow()).unwrap().unwrap();
        assert_eq!(loaded.info.amount, XAmount::from_nano(77));
    }

    #[test]
    fn save_info_for_unknown_block_fails() {
        let store = NullBlockStore::new();
        let b = block(1);
        assert!(matches!(
            store.save_block_info(&b.info),
            Err(StoreError::MissingBlock(_))
        ));
    }

    #[test]
    fn height_index_follows_main_flag() {
        let store = NullBlockStore::new();
        let b = block(1);
        store.put_block(&b).unwrap();
        let mut info = b.info.clone();
        info.height = 1;
        info.flags.set(BlockFlag::Main, true);
        store.save_block_info(&info).unwrap();
        assert_eq!(
            store.get_block_by_height(1).unwrap().map(|b| b.hashlow()),
            Some(b.hashlow())
        );
        assert_eq!(store.max_height(), 1);

        info.height = 0;
        info.flags.set(BlockFlag::Main, false);
        store.save_block_info(&info).unwrap();
        assert!(store.get_block_by_height(1).unwrap().is_none());
    }

    #[test]
    fn remove_block_drops_payload_info_and_height() {
        let store = NullBlockStore::new();
        let b = block(1);
        store.put_block(&b).unwrap();
        let mut info = b.info.clone();
        info.height = 4;
        info.flags.set(BlockFlag::Main, true);
        store.save_block_info(&info).unwrap();

        store.remove_block(&b.hashlow()).unwrap();
        assert!(!store.has_block(&b.hashlow()).unwrap());
        assert!(store.get_block_info(&b.hashlow()).unwrap().is_none());
        assert!(store.get_block_by_height(4).unwrap().is_none());
    }

    #[test]
    fn injected_faults_fail_writes_until_cleared() {
        let store = NullBlockStore::new();
        let (a, b) = (block(1), block(2));
        store.put_block(&a).unwrap();
        store.fail_writes_to(a.hashlow());
        store.fail_status_writes();

        assert!(matches!(store.save_block_info(&a.info), Err(StoreError::Backend(_))));
        assert!(store.put_block(&b).is_ok());
        assert!(store.save_stats(&XdagStats::default()).is_err());
        assert!(store.save_top_status(&XdagTopStatus::default()).is_err());
        assert!(store.load_stats().unwrap().is_none());

        store.clear_faults();
        assert!(store.save_block_info(&a.info).is_ok());
        assert!(store.save_stats(&XdagStats::default()).is_ok());
    }

    #[test]
    fn orphans_taken_oldest_first_before_cutoff() {
        let orphans = NullOrphanStore::new();
        let (a, b, c) = (block(1), block(2), block(3));
        orphans.add(&c.hashlow(), XdagTime::new(30)).unwrap();
        orphans.add(&a.hashlow(), XdagTime::new(10)).unwrap();
        orphans.add(&b.hashlow(), XdagTime::new(20)).unwrap();
        let taken = orphans.take(5, XdagTime::new(25)).unwrap();
        assert_eq!(
            taken,
            vec![Address::reference(a.hashlow()), Address::reference(b.hashlow())]
        );
        assert!(orphans.delete(&a.hashlow()).unwrap());
        assert!(!orphans.delete(&a.hashlow()).unwrap());
        assert_eq!(orphans.len().unwrap(), 2);
    }

    #[test]
    fn address_store_tracks_total() {
        let accounts = NullAddressStore::new();
        let id = AccountId::new([3; 20]);
        assert!(!accounts.address_exists(&id).unwrap());
        accounts.fund(id, XAmount::from_nano(500));
        assert_eq!(accounts.balance_of(&id).unwrap(), XAmount::from_nano(500));
        assert_eq!(accounts.total_balance().unwrap(), XAmount::from_nano(500));
    }
}
