//! Upgrade tables for rigs and equipment slot families.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::resource::TierId;

/// Which kind of thing an upgrade track applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeFamily {
    Rig,
    Pickaxe,
    Helmet,
    Lamp,
}

impl UpgradeFamily {
    /// True for equipment slots, false for rigs.
    pub fn is_equipment(self) -> bool {
        !matches!(self, UpgradeFamily::Rig)
    }
}

/// Penalty applied when an upgrade attempt fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureRisk {
    /// Nothing happens beyond losing the inputs.
    None,
    /// Item reverts to the previous level.
    Drop,
    /// Item is destroyed.
    Break,
}

/// Geometric currency cost: `floor(base_cost * multiplier^(level-1))`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostCurve {
    pub base_cost: Decimal,
    pub multiplier: Decimal,
}

impl CostCurve {
    /// Cost at `level` (1-based), or `None` if it does not fit a `Decimal`.
    /// Level 0 is treated as level 1.
    pub fn checked_cost(&self, level: u32) -> Option<Decimal> {
        let factor = checked_pow(self.multiplier, level.saturating_sub(1))?;
        self.base_cost.checked_mul(factor).map(|c| c.floor())
    }

    /// Cost at `level`, saturating at `Decimal::MAX`.
    pub fn cost(&self, level: u32) -> Decimal {
        self.checked_cost(level).unwrap_or(Decimal::MAX)
    }
}

/// `base^exp` by repeated multiplication, `None` on overflow.
pub fn checked_pow(base: Decimal, exp: u32) -> Option<Decimal> {
    let mut acc = Decimal::ONE;
    for _ in 0..exp {
        acc = acc.checked_mul(base)?;
    }
    Some(acc)
}

/// Requirements for leaving one level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeStep {
    pub material_tier: TierId,
    pub material_amount: u64,
    #[serde(default)]
    pub chip_amount: u32,
    /// Probability in (0, 1].
    pub success_chance: Decimal,
    pub risk: FailureRisk,
    /// Stat bonus (percent) granted at the next level, if fixed.
    #[serde(default)]
    pub target_bonus: Option<Decimal>,
}

/// Full table for one family. `steps[i]` applies to current level `i + 1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeTrack {
    pub family: UpgradeFamily,
    pub max_level: u8,
    pub cost_curve: CostCurve,
    /// Growth factor for efficiency-style stats without a fixed bonus.
    #[serde(default)]
    pub efficiency_growth: Option<Decimal>,
    pub steps: Vec<UpgradeStep>,
}

impl UpgradeTrack {
    /// Step leaving `level`, or `None` at or past the cap (and for level 0).
    pub fn step(&self, level: u8) -> Option<&UpgradeStep> {
        if level == 0 || level >= self.max_level {
            return None;
        }
        self.steps.get(usize::from(level - 1))
    }

    /// Percent bonus held at `level`.
    pub fn bonus_at(&self, level: u8) -> Decimal {
        if level >= 2 {
            if let Some(b) = self
                .steps
                .get(usize::from(level - 2))
                .and_then(|s| s.target_bonus)
            {
                return b;
            }
        }
        self.checked_growth_bonus(level).unwrap_or(Decimal::MAX)
    }

    fn checked_growth_bonus(&self, level: u8) -> Option<Decimal> {
        match self.efficiency_growth {
            Some(g) => checked_pow(g, u32::from(level.saturating_sub(1)))?
                .checked_sub(Decimal::ONE)?
                .checked_mul(Decimal::ONE_HUNDRED),
            None => Some(Decimal::ZERO),
        }
    }

    /// Enforces table shape and the difficulty curve.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = format!("{:?}", self.family);
        if self.max_level < 2 {
            return Err(ValidationError::Invalid(format!("{name}: max level below 2")));
        }
        if self.steps.len() != usize::from(self.max_level - 1) {
            return Err(ValidationError::Invalid(format!(
                "{name}: expected {} steps, found {}",
                self.max_level - 1,
                self.steps.len()
            )));
        }
        if self.cost_curve.base_cost <= Decimal::ZERO {
            return Err(ValidationError::InvalidMoney(format!("{name}: base cost")));
        }
        if self.cost_curve.multiplier <= Decimal::ONE {
            return Err(ValidationError::NonMonotonic(format!(
                "{name}: cost multiplier must exceed 1"
            )));
        }
        if let Some(g) = self.efficiency_growth {
            if g < Decimal::ONE {
                return Err(ValidationError::NonMonotonic(format!("{name}: growth below 1")));
            }
        }
        if self.cost_curve.checked_cost(u32::from(self.max_level)).is_none()
            || self.checked_growth_bonus(self.max_level).is_none()
        {
            return Err(ValidationError::Invalid(format!(
                "{name}: cost or bonus overflows before level {}",
                self.max_level
            )));
        }
        for s in &self.steps {
            if s.success_chance <= Decimal::ZERO || s.success_chance > Decimal::ONE {
                return Err(ValidationError::InvalidChance(s.success_chance));
            }
        }
        for (i, pair) in self.steps.windows(2).enumerate() {
            let (a, b) = (&pair[0], &pair[1]);
            let level = i + 2;
            if b.success_chance > a.success_chance {
                return Err(ValidationError::NonMonotonic(format!(
                    "{name}: chance rises at level {level}"
                )));
            }
            if b.material_amount < a.material_amount || b.chip_amount < a.chip_amount {
                return Err(ValidationError::NonMonotonic(format!(
                    "{name}: material cost falls at level {level}"
                )));
            }
        }
        Ok(())
    }
}
