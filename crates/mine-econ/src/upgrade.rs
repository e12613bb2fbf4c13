//! Upgrade quoting and outcome resolution.
//!
//! `quote` is what the player sees before an attempt; `resolve` is the pure
//! outcome rule the ledger applies once it has drawn a roll. Cost never
//! depends on randomness.

use mine_core::{
    Catalog, EconomyError, FailureRisk, ItemKind, PlayerState, TierId, UpgradeFamily,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolution of a roll: six decimal places in `[0, 1)`.
const ROLL_SCALE: u32 = 6;
const ROLL_BUCKETS: i64 = 1_000_000;

/// Everything needed to attempt leaving `level`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeRule {
    pub family: UpgradeFamily,
    pub level: u8,
    pub material_tier: TierId,
    pub material_amount: u64,
    pub chip_amount: u32,
    pub success_chance: Decimal,
    pub currency_fee: Decimal,
    pub risk: FailureRisk,
    /// Percent bonus held after a successful attempt.
    pub bonus_on_success: Decimal,
}

/// Result of an attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpgradeOutcome {
    Upgraded { level: u8, bonus: Decimal },
    /// Failure under `FailureRisk::None`.
    Unchanged { level: u8 },
    /// Failure under `FailureRisk::Drop`.
    Dropped { level: u8 },
    /// Failure under `FailureRisk::Break`; the item is gone.
    Broken,
}

/// Quote the attempt from `level` to `level + 1`.
pub fn quote(
    catalog: &Catalog,
    family: UpgradeFamily,
    level: u8,
) -> Result<UpgradeRule, EconomyError> {
    let track = catalog.track(family)?;
    if level == 0 {
        return Err(EconomyError::NotFound(format!("{family:?} level 0")));
    }
    if level >= track.max_level {
        return Err(EconomyError::MaxLevelReached {
            max: track.max_level,
        });
    }
    let step = track
        .step(level)
        .ok_or_else(|| EconomyError::NotFound(format!("{family:?} step for level {level}")))?;
    Ok(UpgradeRule {
        family,
        level,
        material_tier: step.material_tier,
        material_amount: step.material_amount,
        chip_amount: step.chip_amount,
        success_chance: step.success_chance,
        currency_fee: track.cost_curve.cost(u32::from(level)),
        risk: step.risk,
        bonus_on_success: track.bonus_at(level + 1),
    })
}

/// Checks materials, chips and fee against the player's balances.
pub fn check_affordable(rule: &UpgradeRule, player: &PlayerState) -> Result<(), EconomyError> {
    player.require_materials(&BTreeMap::from([(rule.material_tier, rule.material_amount)]))?;
    player.require_items(&BTreeMap::from([(ItemKind::UpgradeChip, rule.chip_amount)]))?;
    player.require_funds(rule.currency_fee)
}

/// Apply the success chance and failure policy for a roll in `[0, 1)`.
pub fn resolve(rule: &UpgradeRule, roll: Decimal) -> UpgradeOutcome {
    if roll < rule.success_chance {
        return UpgradeOutcome::Upgraded {
            level: rule.level + 1,
            bonus: rule.bonus_on_success,
        };
    }
    match rule.risk {
        FailureRisk::None => UpgradeOutcome::Unchanged { level: rule.level },
        FailureRisk::Drop => UpgradeOutcome::Dropped {
            level: rule.level.saturating_sub(1).max(1),
        },
        FailureRisk::Break => UpgradeOutcome::Broken,
    }
}

/// Draw a roll from an existing generator.
pub fn roll_with<R: Rng>(rng: &mut R) -> Decimal {
    Decimal::new(rng.gen_range(0..ROLL_BUCKETS), ROLL_SCALE)
}

/// Seeded roll for deterministic replay.
pub fn roll(seed: u64) -> Decimal {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    roll_with(&mut rng)
}
