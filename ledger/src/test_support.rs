//! In-memory ledger view for engine tests.

use std::collections::{BTreeMap, HashMap};

use crate::{LedgerError, LedgerView};
use xdag_types::{
    AccountId, Address, Block, BlockFlags, BlockHash, BlockInfo, HashLow, XAmount, XdagTime,
};

pub fn hn(n: u32) -> HashLow {
    let mut bytes = [0u8; 32];
    bytes[8..12].copy_from_slice(&n.to_le_bytes());
    HashLow::new(bytes)
}

pub fn h(n: u8) -> HashLow {
    hn(n as u32)
}

pub fn acct(n: u8) -> AccountId {
    AccountId::new([n; 20])
}

/// Everything apply/unapply can touch, in comparable form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// amount, flags, reference, fee
    pub blocks: BTreeMap<HashLow, (XAmount, BlockFlags, Option<HashLow>, XAmount)>,
    pub accounts: BTreeMap<AccountId, XAmount>,
    pub total: XAmount,
}

#[derive(Default)]
pub struct MemoryLedger {
    blocks: HashMap<HashLow, Block>,
    accounts: HashMap<AccountId, XAmount>,
    total: XAmount,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, hashlow: HashLow, ticks: u64, links: Vec<Address>, fee: i64) {
        let block = Block::new(
            0x0c,
            BlockHash::new(*hashlow.as_bytes()),
            XdagTime::new(ticks),
            links,
        )
        .with_fee(XAmount::from_nano(fee));
        self.blocks.insert(hashlow, block);
    }

    pub fn fund(&mut self, account: AccountId, nano: i64) {
        let amount = XAmount::from_nano(nano);
        let entry = self.accounts.entry(account).or_default();
        *entry = entry.checked_add(amount).unwrap();
        self.total = self.total.checked_add(amount).unwrap();
    }

    pub fn set_amount(&mut self, hashlow: &HashLow, nano: i64) {
        self.blocks.get_mut(hashlow).unwrap().info.amount = XAmount::from_nano(nano);
    }

    pub fn flags(&self, hashlow: &HashLow) -> BlockFlags {
        self.blocks[hashlow].info.flags
    }

    pub fn info_of(&self, hashlow: &HashLow) -> BlockInfo {
        self.blocks[hashlow].info.clone()
    }

    pub fn balance(&self, account: &AccountId) -> XAmount {
        self.accounts.get(account).copied().unwrap_or_default()
    }

    pub fn total(&self) -> XAmount {
        self.total
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            blocks: self
                .blocks
                .iter()
                .map(|(h, b)| (*h, (b.info.amount, b.info.flags, b.info.reference, b.info.fee)))
                .collect(),
            accounts: self
                .accounts
                .iter()
                .filter(|(_, v)| !v.is_zero())
                .map(|(a, v)| (*a, *v))
                .collect(),
            total: self.total,
        }
    }
}

impl LedgerView for MemoryLedger {
    fn block(&self, hashlow: &HashLow) -> Result<Block, LedgerError> {
        self.blocks
            .get(hashlow)
            .cloned()
            .ok_or(LedgerError::MissingBlock(*hashlow))
    }

    fn info(&self, hashlow: &HashLow) -> Result<BlockInfo, LedgerError> {
        self.blocks
            .get(hashlow)
            .map(|b| b.info.clone())
            .ok_or(LedgerError::MissingBlock(*hashlow))
    }

    fn save_info(&mut self, info: BlockInfo) -> Result<(), LedgerError> {
        let block = self
            .blocks
            .get_mut(&info.hashlow)
            .ok_or(LedgerError::MissingBlock(info.hashlow))?;
        block.info = info;
        Ok(())
    }

    fn account_balance(&self, account: &AccountId) -> Result<XAmount, LedgerError> {
        Ok(self.balance(account))
    }

    fn set_account_balance(
        &mut self,
        account: &AccountId,
        balance: XAmount,
    ) -> Result<(), LedgerError> {
        self.accounts.insert(*account, balance);
        Ok(())
    }

    fn total_balance(&self) -> Result<XAmount, LedgerError> {
        Ok(self.total)
    }

    fn set_total_balance(&mut self, total: XAmount) -> Result<(), LedgerError> {
        self.total = total;
        Ok(())
    }
}
