//! Forward settlement.

use tracing::{debug, warn};

use crate::transfer::{check_conservation, Staged, Transfer};
use crate::{LedgerError, LedgerView};
use xdag_types::{Block, BlockFlag, HashLow, XAmount};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyStatus {
    /// `MAIN_REF` was already set; nothing was touched.
    AlreadyProcessed,
    /// Conservation failed; the block's own transfers were skipped.
    Rejected,
    /// Transfers executed and `APPLIED` set.
    Applied,
}

/// Result of settling one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub status: ApplyStatus,
    /// Gas handed to the caller. For a main-context settlement this is the
    /// block's own output fees; otherwise it also carries the gas of every
    /// dependency settled on the way.
    pub gas: XAmount,
}

impl ApplyOutcome {
    const ALREADY_PROCESSED: Self = Self {
        status: ApplyStatus::AlreadyProcessed,
        gas: XAmount::ZERO,
    };

    pub fn is_applied(&self) -> bool {
        self.status == ApplyStatus::Applied
    }
}

struct Frame {
    block: Block,
    main_ctx: bool,
    next_link: usize,
    /// Dependency currently being settled.
    child: Option<HashLow>,
    /// Gas returned by dependencies, not yet folded or passed up.
    pending: XAmount,
}

enum Entered {
    Done(ApplyOutcome),
    Frame(Frame),
}

/// Settle `hashlow` and every not-yet-settled block it references.
///
/// Dependencies are settled depth-first in link order with an explicit
/// stack. Each block is visited once: `MAIN_REF` is set on entry and makes
/// any later visit a no-op. In main context, dependency gas is folded into
/// the block's fee and balance as soon as it arrives.
pub fn apply<V: LedgerView>(
    view: &mut V,
    hashlow: &HashLow,
    main_ctx: bool,
) -> Result<ApplyOutcome, LedgerError> {
    let mut stack = match enter(view, hashlow, main_ctx)? {
        Entered::Done(outcome) => return Ok(outcome),
        Entered::Frame(frame) => vec![frame],
    };
    let mut returned: Option<ApplyOutcome> = None;

    while let Some(frame) = stack.last_mut() {
        if let Some(outcome) = returned.take() {
            fold_child(view, frame, outcome)?;
        }

        if let Some(child) = next_dependency(view, frame)? {
            frame.child = Some(child);
            match enter(view, &child, false)? {
                Entered::Done(outcome) => returned = Some(outcome),
                Entered::Frame(child_frame) => stack.push(child_frame),
            }
            continue;
        }

        let Some(done) = stack.pop() else { break };
        let outcome = settle(view, done)?;
        if stack.is_empty() {
            return Ok(outcome);
        }
        returned = Some(outcome);
    }

    // The loop only exits through the return above.
    Ok(ApplyOutcome::ALREADY_PROCESSED)
}

fn enter<V: LedgerView>(
    view: &mut V,
    hashlow: &HashLow,
    main_ctx: bool,
) -> Result<Entered, LedgerError> {
    let block = view.block(hashlow)?;
    if block.info.flags.is_main_ref() {
        return Ok(Entered::Done(ApplyOutcome::ALREADY_PROCESSED));
    }
    let no_links = block.links.is_empty();
    let info = view.update_info(hashlow, |info| {
        info.flags.set(BlockFlag::MainRef, true);
        if no_links {
            info.flags.set(BlockFlag::Applied, true);
        }
        Ok(())
    })?;
    if no_links {
        return Ok(Entered::Done(ApplyOutcome {
            status: ApplyStatus::Applied,
            gas: XAmount::ZERO,
        }));
    }
    Ok(Entered::Frame(Frame {
        block: Block { info, ..block },
        main_ctx,
        next_link: 0,
        child: None,
        pending: XAmount::ZERO,
    }))
}

/// Next block link whose target still needs settling.
fn next_dependency<V: LedgerView>(
    view: &V,
    frame: &mut Frame,
) -> Result<Option<HashLow>, LedgerError> {
    while let Some(link) = frame.block.links.get(frame.next_link) {
        frame.next_link += 1;
        let Some(target) = link.block() else { continue };
        let info = view.info(&target)?;
        if !info.flags.is_main_ref() {
            return Ok(Some(target));
        }
    }
    Ok(None)
}

fn fold_child<V: LedgerView>(
    view: &mut V,
    frame: &mut Frame,
    outcome: ApplyOutcome,
) -> Result<(), LedgerError> {
    let Some(child) = frame.child.take() else {
        return Ok(());
    };
    if outcome.status == ApplyStatus::AlreadyProcessed {
        return Ok(());
    }
    frame.pending = frame.pending.checked_add(outcome.gas)?;
    let consumer = frame.block.hashlow();
    view.update_info(&child, |info| {
        info.reference = Some(consumer);
        Ok(())
    })?;
    if frame.main_ctx && !frame.pending.is_zero() {
        let gas = frame.pending;
        view.update_info(&consumer, |info| {
            info.fee = info.fee.checked_add(gas)?;
            info.amount = info.amount.checked_add(gas)?;
            Ok(())
        })?;
        frame.pending = XAmount::ZERO;
    }
    Ok(())
}

/// Validate and execute the block's own transfers once its dependencies
/// are settled.
fn settle<V: LedgerView>(view: &mut V, frame: Frame) -> Result<ApplyOutcome, LedgerError> {
    let hashlow = frame.block.hashlow();
    let balance = view.info(&hashlow)?.amount;

    let rejected = |reason: String| {
        warn!(hash = %hashlow, %reason, "settlement rejected");
        Ok(ApplyOutcome {
            status: ApplyStatus::Rejected,
            gas: frame.pending,
        })
    };

    if let Err(refusal) = check_conservation(&frame.block, balance) {
        return rejected(refusal.0);
    }

    let mut staged = Staged::new();
    for transfer in Transfer::of_block(&frame.block, frame.main_ctx) {
        if let Err(refusal) = staged.forward(view, &transfer)? {
            return rejected(refusal.0);
        }
    }

    let own_gas = staged.gas();
    staged.commit(view)?;
    view.update_info(&hashlow, |info| {
        info.flags.set(BlockFlag::Applied, true);
        Ok(())
    })?;

    let gas = if frame.main_ctx {
        own_gas
    } else {
        own_gas.checked_add(frame.pending)?
    };
    debug!(hash = %hashlow, main = frame.main_ctx, gas = %gas, "block applied");
    Ok(ApplyOutcome {
        status: ApplyStatus::Applied,
        gas,
    })
}
