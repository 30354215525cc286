//! Reverse settlement.

use tracing::debug;

use crate::transfer::{Staged, Transfer};
use crate::{LedgerError, LedgerView};
use xdag_types::{BlockFlag, HashLow, XAmount};

struct Frame {
    hashlow: HashLow,
    main_ctx: bool,
    /// Block link targets, last link first.
    targets: Vec<HashLow>,
    next: usize,
    own_gas: XAmount,
    /// Gas returned by unwound dependencies (non-main frames only).
    acc: XAmount,
}

/// Undo the settlement of `hashlow` and of every dependency it consumed.
///
/// Links are processed last to first. If the block was applied, every
/// transfer is reversed and `APPLIED` cleared; `MAIN_REF` and the reference
/// pointer are cleared unconditionally. Dependencies whose reference still
/// points at this block are then unwound as well. Returns the gas the caller
/// must take back: own output fees, plus dependency gas outside main context.
pub fn unapply<V: LedgerView>(
    view: &mut V,
    hashlow: &HashLow,
    main_ctx: bool,
) -> Result<XAmount, LedgerError> {
    let mut stack = vec![enter(view, hashlow, main_ctx)?];
    let mut returned: Option<XAmount> = None;

    while let Some(frame) = stack.last_mut() {
        if let Some(gas) = returned.take() {
            if frame.main_ctx {
                if !gas.is_zero() {
                    view.update_info(&frame.hashlow, |info| {
                        info.fee = info.fee.checked_sub(gas)?;
                        info.amount = info.amount.checked_sub(gas)?;
                        Ok(())
                    })?;
                }
            } else {
                frame.acc = frame.acc.checked_add(gas)?;
            }
        }

        if let Some(child) = next_consumed(view, frame)? {
            let child_frame = enter(view, &child, false)?;
            stack.push(child_frame);
            continue;
        }

        let Some(done) = stack.pop() else { break };
        let gas = if done.main_ctx {
            done.own_gas
        } else {
            done.own_gas.checked_add(done.acc)?
        };
        debug!(hash = %done.hashlow, main = done.main_ctx, gas = %gas, "block unapplied");
        if stack.is_empty() {
            return Ok(gas);
        }
        returned = Some(gas);
    }

    Ok(XAmount::ZERO)
}

fn enter<V: LedgerView>(
    view: &mut V,
    hashlow: &HashLow,
    main_ctx: bool,
) -> Result<Frame, LedgerError> {
    let block = view.block(hashlow)?;

    let mut own_gas = XAmount::ZERO;
    if block.info.flags.is_applied() {
        let mut staged = Staged::new();
        for transfer in Transfer::of_block(&block, main_ctx).iter().rev() {
            staged.reverse(view, transfer)?;
        }
        own_gas = staged.gas();
        staged.commit(view)?;
    }

    view.update_info(hashlow, |info| {
        info.flags.set(BlockFlag::Applied, false);
        info.flags.set(BlockFlag::MainRef, false);
        info.reference = None;
        Ok(())
    })?;

    Ok(Frame {
        hashlow: *hashlow,
        main_ctx,
        targets: block.block_links().rev().map(|(target, _)| target).collect(),
        next: 0,
        own_gas,
        acc: XAmount::ZERO,
    })
}

/// Next dependency this block consumed that is still marked as consumed.
fn next_consumed<V: LedgerView>(
    view: &V,
    frame: &mut Frame,
) -> Result<Option<HashLow>, LedgerError> {
    while let Some(target) = frame.targets.get(frame.next).copied() {
        frame.next += 1;
        let info = view.info(&target)?;
        if info.reference == Some(frame.hashlow) && info.flags.is_main_ref() {
            return Ok(Some(target));
        }
    }
    Ok(None)
}
