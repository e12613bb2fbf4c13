#![deny(warnings)]

//! Economy rules: pricing, upgrades, rigs and refinement for Mine Tycoon.
//!
//! Every function here is pure and synchronous. Inputs are the static
//! catalog, a live market quote and the player's balances; outputs are a
//! value or a typed [`mine_core::EconomyError`]. Mutation is left to the
//! ledger, which receives an [`intent::Intent`] built from a passed check.
//!
//! - Trade evaluation with mastery spread, sell tax and safety advisor
//! - Upgrade quotes, seeded rolls and the NONE/DROP/BREAK failure policy
//! - Rig shop listing, acquisition, renewal and merging
//! - Batch refinement and rig slot unlocking

pub mod intent;
pub mod policy;
pub mod refine;
pub mod rigs;
pub mod slots;
pub mod trade;
pub mod upgrade;

use rust_decimal::{Decimal, RoundingStrategy};

pub use intent::{Intent, IntentAction};
pub use policy::{SlotPolicy, TradePolicy};
pub use trade::{evaluate, TradeAction, TradeEvaluation, TradeRequest};

/// Round a currency amount to cents, halves away from zero.
///
/// ```
/// use mine_econ::round_currency;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_currency(Decimal::new(11_505, 3)), Decimal::new(1151, 2));
/// ```
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_currency(Decimal::new(11_505, 3)), Decimal::new(1151, 2));
        assert_eq!(round_currency(Decimal::new(-11_505, 3)), Decimal::new(-1151, 2));
        assert_eq!(round_currency(Decimal::new(11_504, 3)), Decimal::new(1150, 2));
    }
}
