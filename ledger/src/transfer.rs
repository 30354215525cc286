//! Value movements described by block links.
//!
//! Links come in two transfer modes with different fee rules:
//!
//! | link     | source / sink | effect on apply                                      |
//! |----------|---------------|------------------------------------------------------|
//! | `In`     | linked block  | debit `amount`; pool total += `amount - fee`         |
//! | `Input`  | account       | debit `amount`; pool total -= `amount`               |
//! | `Out`    | linked block  | credit `amount - fee`, `fee` becomes gas (not in main context) |
//! | `Output` | account       | credit `amount - fee`, pool total likewise, `fee` becomes gas |
//!
//! `fee` is the per-output fee the applying block declares. Zero-amount
//! outputs are plain references and move nothing.

use std::collections::HashMap;

use crate::{LedgerError, LedgerView};
use xdag_types::{AccountId, Block, HashLow, LinkKind, LinkTarget, XAmount};

/// One balance movement caused by applying a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transfer {
    FromBlock { block: HashLow, amount: XAmount, fee: XAmount },
    FromAccount { account: AccountId, amount: XAmount },
    ToBlock { block: HashLow, amount: XAmount, fee: XAmount },
    ToAccount { account: AccountId, amount: XAmount, fee: XAmount },
}

impl Transfer {
    /// Transfers of `block` in link order. `Out` links only move value when
    /// the block is settled as a dependency, not as the main block itself.
    pub fn of_block(block: &Block, main_ctx: bool) -> Vec<Transfer> {
        let fee = block.fee;
        block
            .links
            .iter()
            .filter_map(|link| match (link.kind, link.target) {
                (LinkKind::In, LinkTarget::Block(b)) if !link.amount.is_zero() => {
                    Some(Transfer::FromBlock { block: b, amount: link.amount, fee })
                }
                (LinkKind::Input, LinkTarget::Account(a)) => {
                    Some(Transfer::FromAccount { account: a, amount: link.amount })
                }
                (LinkKind::Out, LinkTarget::Block(b)) if !main_ctx && !link.amount.is_zero() => {
                    Some(Transfer::ToBlock { block: b, amount: link.amount, fee })
                }
                (LinkKind::Output, LinkTarget::Account(a)) if !link.amount.is_zero() => {
                    Some(Transfer::ToAccount { account: a, amount: link.amount, fee })
                }
                _ => None,
            })
            .collect()
    }

    /// Gas this transfer yields to the settling main block.
    pub fn gas(&self) -> XAmount {
        match self {
            Transfer::ToBlock { fee, .. } | Transfer::ToAccount { fee, .. } => *fee,
            _ => XAmount::ZERO,
        }
    }
}

/// Why a settlement was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Refusal(pub String);

/// Balances touched by one settlement, staged before anything is written.
pub(crate) struct Staged {
    blocks: HashMap<HashLow, XAmount>,
    accounts: HashMap<AccountId, XAmount>,
    total: Option<XAmount>,
    gas: XAmount,
}

impl Staged {
    pub(crate) fn new() -> Self {
        Self {
            blocks: HashMap::new(),
            accounts: HashMap::new(),
            total: None,
            gas: XAmount::ZERO,
        }
    }

    pub(crate) fn gas(&self) -> XAmount {
        self.gas
    }

    fn block<V: LedgerView>(&mut self, view: &V, h: HashLow) -> Result<&mut XAmount, LedgerError> {
        if !self.blocks.contains_key(&h) {
            let amount = view.info(&h)?.amount;
            self.blocks.insert(h, amount);
        }
        self.blocks.get_mut(&h).ok_or(LedgerError::MissingBlock(h))
    }

    fn account<V: LedgerView>(&mut self, view: &V, a: AccountId) -> Result<&mut XAmount, LedgerError> {
        if !self.accounts.contains_key(&a) {
            let balance = view.account_balance(&a)?;
            self.accounts.insert(a, balance);
        }
        Ok(self.accounts.entry(a).or_insert(XAmount::ZERO))
    }

    fn total<V: LedgerView>(&mut self, view: &V) -> Result<&mut XAmount, LedgerError> {
        if self.total.is_none() {
            self.total = Some(view.total_balance()?);
        }
        Ok(self.total.get_or_insert(XAmount::ZERO))
    }

    /// Stage the forward effect of `t`. Insufficient funds and arithmetic
    /// overflow refuse the whole settlement.
    pub(crate) fn forward<V: LedgerView>(
        &mut self,
        view: &V,
        t: &Transfer,
    ) -> Result<Result<(), Refusal>, LedgerError> {
        let refuse = |reason: &str| Ok(Err(Refusal(reason.to_string())));
        match *t {
            Transfer::FromBlock { block, amount, fee } => {
                let balance = self.block(view, block)?;
                if *balance < amount {
                    return refuse("linked block balance below input amount");
                }
                let Ok(next) = balance.checked_sub(amount) else {
                    return refuse("input debit overflows");
                };
                *balance = next;
                let Ok(net) = amount.checked_sub(fee) else {
                    return refuse("input fee overflows");
                };
                let total = self.total(view)?;
                let Ok(next) = total.checked_add(net) else {
                    return refuse("pool total overflows");
                };
                *total = next;
            }
            Transfer::FromAccount { account, amount } => {
                let balance = self.account(view, account)?;
                if *balance < amount {
                    return refuse("account balance below input amount");
                }
                let Ok(next) = balance.checked_sub(amount) else {
                    return refuse("input debit overflows");
                };
                *balance = next;
                let total = self.total(view)?;
                let Ok(next) = total.checked_sub(amount) else {
                    return refuse("pool total overflows");
                };
                *total = next;
            }
            Transfer::ToBlock { block, amount, fee } => {
                let Ok(credit) = amount.checked_sub(fee) else {
                    return refuse("output fee overflows");
                };
                if credit.is_negative() {
                    return refuse("output amount below fee");
                }
                let balance = self.block(view, block)?;
                let Ok(next) = balance.checked_add(credit) else {
                    return refuse("output credit overflows");
                };
                *balance = next;
                let Ok(gas) = self.gas.checked_add(fee) else {
                    return refuse("gas overflows");
                };
                self.gas = gas;
            }
            Transfer::ToAccount { account, amount, fee } => {
                let Ok(credit) = amount.checked_sub(fee) else {
                    return refuse("output fee overflows");
                };
                if credit.is_negative() {
                    return refuse("output amount below fee");
                }
                let balance = self.account(view, account)?;
                let Ok(next) = balance.checked_add(credit) else {
                    return refuse("output credit overflows");
                };
                *balance = next;
                let total = self.total(view)?;
                let Ok(next) = total.checked_add(credit) else {
                    return refuse("pool total overflows");
                };
                *total = next;
                let Ok(gas) = self.gas.checked_add(fee) else {
                    return refuse("gas overflows");
                };
                self.gas = gas;
            }
        }
        Ok(Ok(()))
    }

    /// Stage the exact inverse of [`forward`](Self::forward).
    pub(crate) fn reverse<V: LedgerView>(&mut self, view: &V, t: &Transfer) -> Result<(), LedgerError> {
        match *t {
            Transfer::FromBlock { block, amount, fee } => {
                let balance = self.block(view, block)?;
                *balance = balance.checked_add(amount)?;
                let net = amount.checked_sub(fee)?;
                let total = self.total(view)?;
                *total = total.checked_sub(net)?;
            }
            Transfer::FromAccount { account, amount } => {
                let balance = self.account(view, account)?;
                *balance = balance.checked_add(amount)?;
                let total = self.total(view)?;
                *total = total.checked_add(amount)?;
            }
            Transfer::ToBlock { block, amount, fee } => {
                let credit = amount.checked_sub(fee)?;
                let balance = self.block(view, block)?;
                *balance = balance.checked_sub(credit)?;
                self.gas = self.gas.checked_add(fee)?;
            }
            Transfer::ToAccount { account, amount, fee } => {
                let credit = amount.checked_sub(fee)?;
                let balance = self.account(view, account)?;
                *balance = balance.checked_sub(credit)?;
                let total = self.total(view)?;
                *total = total.checked_sub(credit)?;
                self.gas = self.gas.checked_add(fee)?;
            }
        }
        Ok(())
    }

    /// Write every staged balance back.
    pub(crate) fn commit<V: LedgerView>(self, view: &mut V) -> Result<(), LedgerError> {
        for (h, amount) in self.blocks {
            view.update_info(&h, |info| {
                info.amount = amount;
                Ok(())
            })?;
        }
        for (a, balance) in self.accounts {
            view.set_account_balance(&a, balance)?;
        }
        if let Some(total) = self.total {
            view.set_total_balance(total)?;
        }
        Ok(())
    }
}

/// Conservation check: the block must be able to cover its outputs from its
/// own balance plus what flows in, and must not hold a negative balance.
pub(crate) fn check_conservation(block: &Block, balance: XAmount) -> Result<(), Refusal> {
    let mut sum_in = XAmount::ZERO;
    let mut sum_out = XAmount::ZERO;
    for link in &block.links {
        let slot = match link.kind {
            LinkKind::In | LinkKind::Input => &mut sum_in,
            LinkKind::Out | LinkKind::Output => &mut sum_out,
            LinkKind::Coinbase => continue,
        };
        *slot = slot
            .checked_add(link.amount)
            .map_err(|_| Refusal("link amounts overflow".to_string()))?;
    }
    let available = balance
        .checked_add(sum_in)
        .map_err(|_| Refusal("available amount overflows".to_string()))?;
    if available < sum_out {
        return Err(Refusal(format!(
            "outputs {sum_out} exceed available {available}"
        )));
    }
    if available < sum_in {
        return Err(Refusal("block balance is negative".to_string()));
    }
    Ok(())
}
