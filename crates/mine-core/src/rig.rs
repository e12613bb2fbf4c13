//! Rig presets: acquisition, yield, upkeep, and contract terms.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ValidationError;
use crate::player::ItemKind;
use crate::resource::TierId;

/// Days per contract month when normalizing month-denominated presets.
pub const DAYS_PER_MONTH: u32 = 30;

/// Stable numeric rig preset id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RigId(pub u16);

impl fmt::Display for RigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Materials, items and fee consumed when crafting a rig.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingCost {
    #[serde(default)]
    pub materials: BTreeMap<TierId, u64>,
    #[serde(default)]
    pub items: BTreeMap<ItemKind, u32>,
    #[serde(default)]
    pub fee: Decimal,
}

/// How a rig is obtained. Exactly one method per preset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acquisition {
    Price(Decimal),
    Craft(CraftingCost),
}

/// Special constraints on a preset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialProperties {
    /// Maximum number of rigs of this preset one player may own.
    pub max_allowed: Option<u32>,
    pub cannot_renew: bool,
    pub cannot_merge: bool,
    pub infinite_durability: bool,
    pub zero_energy: bool,
}

/// A purchasable or craftable rig with its contract terms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigPreset {
    pub id: RigId,
    pub name: String,
    pub acquisition: Acquisition,
    /// Currency yield per day.
    pub daily_profit: Decimal,
    pub energy_per_day: Decimal,
    pub repair_cost: Decimal,
    /// Contract length, always in days.
    pub duration_days: u32,
    /// Precomputed net profit for presets on a different accounting basis.
    #[serde(default)]
    pub bonus_profit: Option<Decimal>,
    #[serde(default)]
    pub special: SpecialProperties,
}

impl RigPreset {
    /// Flat purchase price; zero for crafted presets.
    pub fn price(&self) -> Decimal {
        match &self.acquisition {
            Acquisition::Price(p) => *p,
            Acquisition::Craft(_) => Decimal::ZERO,
        }
    }

    pub fn crafting(&self) -> Option<&CraftingCost> {
        match &self.acquisition {
            Acquisition::Craft(c) => Some(c),
            Acquisition::Price(_) => None,
        }
    }

    /// Informational projection over the whole contract.
    pub fn net_profit(&self) -> Decimal {
        if let Some(bonus) = self.bonus_profit {
            return bonus;
        }
        self.daily_profit * Decimal::from(self.duration_days) - self.price()
    }

    /// Energy cost per day, zero for `zero_energy` presets.
    pub fn daily_upkeep(&self) -> Decimal {
        if self.special.zero_energy {
            Decimal::ZERO
        } else {
            self.energy_per_day
        }
    }

    /// Repair cost, zero for `infinite_durability` presets.
    pub fn effective_repair_cost(&self) -> Decimal {
        if self.special.infinite_durability {
            Decimal::ZERO
        } else {
            self.repair_cost
        }
    }
}

/// Contract length as written in configuration: exactly one of `days` or
/// `months`, e.g. `duration: { months: 2 }`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDuration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months: Option<u32>,
}

impl ContractDuration {
    pub fn days(days: u32) -> Self {
        Self {
            days: Some(days),
            months: None,
        }
    }

    pub fn months(months: u32) -> Self {
        Self {
            days: None,
            months: Some(months),
        }
    }

    /// Length in days; errors unless exactly one unit is given.
    pub fn in_days(self, rig: &str) -> Result<u32, ValidationError> {
        match (self.days, self.months) {
            (Some(d), None) => Ok(d),
            (None, Some(m)) => m.checked_mul(DAYS_PER_MONTH).ok_or_else(|| {
                ValidationError::Invalid(format!("rig {rig} contract of {m} months is too long"))
            }),
            _ => Err(ValidationError::Invalid(format!(
                "rig {rig} needs exactly one of duration.days or duration.months"
            ))),
        }
    }
}

/// Configuration-file shape of a preset, converted once by
/// [`RigPresetConfig::into_preset`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigPresetConfig {
    pub id: RigId,
    pub name: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub crafting: Option<CraftingCost>,
    pub daily_profit: Decimal,
    #[serde(default)]
    pub energy_per_day: Decimal,
    #[serde(default)]
    pub repair_cost: Decimal,
    pub duration: ContractDuration,
    #[serde(default)]
    pub bonus_profit: Option<Decimal>,
    #[serde(default)]
    pub special: SpecialProperties,
}

impl RigPresetConfig {
    pub fn into_preset(self) -> Result<RigPreset, ValidationError> {
        let acquisition = match (self.price, self.crafting) {
            (Some(p), None) => Acquisition::Price(p),
            (None, Some(c)) => Acquisition::Craft(c),
            _ => return Err(ValidationError::AcquisitionAmbiguous(self.name)),
        };
        let duration_days = self.duration.in_days(&self.name)?;
        let preset = RigPreset {
            id: self.id,
            name: self.name,
            acquisition,
            daily_profit: self.daily_profit,
            energy_per_day: self.energy_per_day,
            repair_cost: self.repair_cost,
            duration_days,
            bonus_profit: self.bonus_profit,
            special: self.special,
        };
        validate_preset(&preset)?;
        Ok(preset)
    }
}

/// Checks money fields, duration, and limit of a single preset.
pub fn validate_preset(p: &RigPreset) -> Result<(), ValidationError> {
    if p.name.trim().is_empty() {
        return Err(ValidationError::Invalid(format!("rig {} has no name", p.id)));
    }
    let money = [p.daily_profit, p.energy_per_day, p.repair_cost];
    if money.iter().any(|m| *m < Decimal::ZERO) {
        return Err(ValidationError::InvalidMoney(format!("rig {}", p.name)));
    }
    match &p.acquisition {
        Acquisition::Price(price) if *price <= Decimal::ZERO => {
            return Err(ValidationError::InvalidMoney(format!("price of rig {}", p.name)));
        }
        Acquisition::Craft(c) if c.fee < Decimal::ZERO => {
            return Err(ValidationError::InvalidMoney(format!("crafting fee of rig {}", p.name)));
        }
        _ => {}
    }
    if p.duration_days == 0 {
        return Err(ValidationError::Invalid(format!("rig {} has zero duration", p.name)));
    }
    if p.special.max_allowed == Some(0) {
        return Err(ValidationError::Invalid(format!("rig {} allows zero copies", p.name)));
    }
    Ok(())
}
