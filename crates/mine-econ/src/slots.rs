//! Paid rig slot unlocking.

use mine_core::{EconomyError, PlayerState};
use rust_decimal::Decimal;

use crate::policy::SlotPolicy;

/// Cost of the next paid slot after `unlocked` have been bought.
pub fn unlock_cost(policy: &SlotPolicy, unlocked: u32) -> Result<Decimal, EconomyError> {
    if policy.free_slots.saturating_add(unlocked) >= policy.max_slots {
        return Err(EconomyError::MaxLevelReached {
            max: u8::try_from(policy.max_slots).unwrap_or(u8::MAX),
        });
    }
    Ok(policy.unlock_curve.cost(unlocked + 1))
}

/// Next slot cost, checked against the player's balance.
pub fn check_unlock(policy: &SlotPolicy, player: &PlayerState) -> Result<Decimal, EconomyError> {
    let cost = unlock_cost(policy, player.unlocked_slots)?;
    player.require_funds(cost)?;
    Ok(cost)
}
