//! Block reward and coin supply schedule.
//!
//! The reward starts at `main_start_amount` and drops to `apollo_fork_amount`
//! from the Apollo fork height on. Either way it halves every 2^21 main
//! blocks.

use xdag_types::params::MAIN_BIG_PERIOD_LOG;
use xdag_types::{AmountError, ChainParams, XAmount};

fn start_amount(params: &ChainParams, height: u64) -> XAmount {
    if height >= params.apollo_fork_height {
        params.apollo_fork_amount
    } else {
        params.main_start_amount
    }
}

fn halve(amount: XAmount, times: u64) -> XAmount {
    let nano = u32::try_from(times)
        .ok()
        .and_then(|shift| amount.nano().checked_shr(shift))
        .unwrap_or(0);
    XAmount::from_nano(nano)
}

/// Reward minted into the main block at `height`.
pub fn reward(params: &ChainParams, height: u64) -> XAmount {
    halve(start_amount(params, height), height >> MAIN_BIG_PERIOD_LOG)
}

/// Total coins minted by the first `height` main blocks.
///
/// Sums whole halving periods at the start amount for `height`, then the
/// partial period, then adds back what the blocks before the Apollo fork
/// minted above the post-fork amount.
pub fn supply(params: &ChainParams, height: u64) -> Result<XAmount, AmountError> {
    let period = 1u64 << MAIN_BIG_PERIOD_LOG;
    let mut amount = start_amount(params, height);
    let mut remaining = height;
    let mut total = XAmount::ZERO;

    while remaining >> MAIN_BIG_PERIOD_LOG > 0 {
        total = total.checked_add(amount.checked_mul(period as i64)?)?;
        remaining -= period;
        amount = halve(amount, 1);
    }
    let partial = i64::try_from(remaining).map_err(|_| AmountError::Overflow)?;
    total = total.checked_add(amount.checked_mul(partial)?)?;

    if height >= params.apollo_fork_height {
        let diff = params
            .main_start_amount
            .checked_sub(params.apollo_fork_amount)?;
        let before_fork = params.apollo_fork_height.saturating_sub(1);
        let before_fork = i64::try_from(before_fork).map_err(|_| AmountError::Overflow)?;
        total = total.checked_add(diff.checked_mul(before_fork)?)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xdag_types::amount::NANO_PER_XDAG;

    fn xdag(n: i64) -> XAmount {
        XAmount::from_nano(n * NANO_PER_XDAG)
    }

    #[test]
    fn reward_switches_at_apollo_fork() {
        let p = ChainParams::mainnet();
        assert_eq!(reward(&p, 1), xdag(1024));
        assert_eq!(reward(&p, p.apollo_fork_height - 1), xdag(1024));
        assert_eq!(reward(&p, p.apollo_fork_height), xdag(128));
    }

    #[test]
    fn reward_halves_each_period() {
        let p = ChainParams::mainnet();
        let period = 1u64 << MAIN_BIG_PERIOD_LOG;
        assert_eq!(reward(&p, 2 * period), xdag(64));
        assert_eq!(reward(&p, 3 * period), xdag(32));
    }

    #[test]
    fn reward_vanishes_eventually() {
        let p = ChainParams::mainnet();
        assert!(reward(&p, u64::MAX).is_zero());
    }

    #[test]
    fn supply_before_fork_is_linear() {
        let p = ChainParams::mainnet();
        assert_eq!(supply(&p, 10).unwrap(), xdag(10 * 1024));
    }

    #[test]
    fn supply_at_fork_adds_pre_fork_surplus() {
        let p = ChainParams::devnet();
        let h = p.apollo_fork_height;
        let expected = h as i64 * 128 + (h as i64 - 1) * (1024 - 128);
        assert_eq!(supply(&p, h).unwrap(), xdag(expected));
    }

    #[test]
    fn supply_counts_whole_periods() {
        let p = ChainParams::devnet();
        let period = 1i64 << MAIN_BIG_PERIOD_LOG;
        let h = (period + 5) as u64;
        let fork = p.apollo_fork_height as i64;
        let expected = period * 128 + 5 * 64 + (fork - 1) * (1024 - 128);
        assert_eq!(supply(&p, h).unwrap(), xdag(expected));
    }
}
