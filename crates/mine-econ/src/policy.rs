//! Tunable economy levers, loaded from configuration.

use mine_core::CostCurve;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market spread, tax and safety-advisor thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradePolicy {
    /// Buy-side markup below the mastery threshold (0.15).
    pub base_spread: Decimal,
    /// Buy-side markup at or above the mastery threshold (0.12).
    pub mastery_spread: Decimal,
    pub mastery_threshold: u32,
    /// Flat tax on sell proceeds (0.15). Not affected by mastery.
    pub sell_tax: Decimal,
    /// `|deviation|` above which the quote is flagged bot-active.
    pub intervention_threshold: Decimal,
    /// Sells below this deviation need confirmation when a trade bot is held.
    pub safe_sell_threshold: Decimal,
}

impl Default for TradePolicy {
    fn default() -> Self {
        Self {
            base_spread: Decimal::new(15, 2),
            mastery_spread: Decimal::new(12, 2),
            mastery_threshold: 1000,
            sell_tax: Decimal::new(15, 2),
            intervention_threshold: Decimal::new(25, 2),
            safe_sell_threshold: Decimal::new(-10, 2),
        }
    }
}

/// Rig slot ladder: free slots plus geometric unlock cost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotPolicy {
    pub free_slots: u32,
    pub max_slots: u32,
    /// Cost of the n-th paid slot is `unlock_curve.cost(n)`.
    pub unlock_curve: CostCurve,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            free_slots: 3,
            max_slots: 12,
            unlock_curve: CostCurve {
                base_cost: Decimal::new(500, 0),
                multiplier: Decimal::new(2, 0),
            },
        }
    }
}

impl SlotPolicy {
    /// Rig slots available to a player with `unlocked` paid slots.
    pub fn capacity(&self, unlocked: u32) -> u32 {
        self.free_slots.saturating_add(unlocked).min(self.max_slots)
    }
}
