//! Rig shop listing, acquisition, renewal and merging.

use mine_core::{Acquisition, Catalog, CraftingCost, EconomyError, PlayerState, RigId, RigPreset};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::policy::SlotPolicy;

/// A preset as shown in the shop for one player.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RigOffer<'a> {
    pub preset: &'a RigPreset,
    pub affordable: bool,
    pub owned_count: u32,
    pub limit_reached: bool,
    pub net_profit: Decimal,
}

/// Price or crafting inputs of an acquisition that passed every check.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AcquireCost {
    pub rig: RigId,
    pub acquisition: Acquisition,
    pub duration_days: u32,
}

/// Renewal of an owned rig's contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenewQuote {
    pub instance: u64,
    pub price: Decimal,
    pub extra_days: u32,
}

/// Two owned rigs folded into one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MergePlan {
    pub keep: u64,
    pub absorb: u64,
    pub level: u8,
    pub days_remaining: u32,
}

/// Crafted presets need materials, items (by kind) and the crafting fee;
/// priced presets need `balance >= price`.
pub fn check_affordable(preset: &RigPreset, player: &PlayerState) -> Result<(), EconomyError> {
    match &preset.acquisition {
        Acquisition::Craft(CraftingCost {
            materials,
            items,
            fee,
        }) => {
            player.require_materials(materials)?;
            player.require_items(items)?;
            player.require_funds(*fee)
        }
        Acquisition::Price(price) => player.require_funds(*price),
    }
}

fn limit_reached(preset: &RigPreset, owned: u32) -> bool {
    preset.special.max_allowed.is_some_and(|max| owned >= max)
}

/// Every preset annotated for `player`, in id order.
pub fn list_available<'a>(catalog: &'a Catalog, player: &PlayerState) -> Vec<RigOffer<'a>> {
    catalog
        .rigs()
        .map(|preset| {
            let owned_count = player.owned_count(preset.id);
            RigOffer {
                preset,
                affordable: check_affordable(preset, player).is_ok(),
                owned_count,
                limit_reached: limit_reached(preset, owned_count),
                net_profit: preset.net_profit(),
            }
        })
        .collect()
}

/// Full acquisition check: per-preset limit, free slot, then affordability.
pub fn check_acquire(
    catalog: &Catalog,
    player: &PlayerState,
    slots: &SlotPolicy,
    rig: RigId,
) -> Result<AcquireCost, EconomyError> {
    let preset = catalog.rig(rig)?;
    let owned = player.owned_count(rig);
    if let Some(max) = preset.special.max_allowed {
        if owned >= max {
            return Err(EconomyError::MaxOwnedReached { rig, limit: max });
        }
    }
    let capacity = slots.capacity(player.unlocked_slots);
    if player.rigs.len() as u32 >= capacity {
        return Err(EconomyError::MaxOwnedReached {
            rig,
            limit: capacity,
        });
    }
    check_affordable(preset, player)?;
    Ok(AcquireCost {
        rig,
        acquisition: preset.acquisition.clone(),
        duration_days: preset.duration_days,
    })
}

/// Renew an owned contract at the preset's flat price.
pub fn check_renew(
    catalog: &Catalog,
    player: &PlayerState,
    instance: u64,
) -> Result<RenewQuote, EconomyError> {
    let owned = player.rig(instance)?;
    let preset = catalog.rig(owned.preset)?;
    let price = match preset.acquisition {
        Acquisition::Price(p) if !preset.special.cannot_renew => p,
        _ => return Err(EconomyError::RenewalNotAllowed(preset.id)),
    };
    player.require_funds(price)?;
    Ok(RenewQuote {
        instance,
        price,
        extra_days: preset.duration_days,
    })
}

/// Merge `absorb` into `keep`: same preset only, higher level survives,
/// remaining days add up.
pub fn check_merge(
    catalog: &Catalog,
    player: &PlayerState,
    keep: u64,
    absorb: u64,
) -> Result<MergePlan, EconomyError> {
    if keep == absorb {
        return Err(EconomyError::MergeNotAllowed(format!("rig {keep} with itself")));
    }
    let a = player.rig(keep)?;
    let b = player.rig(absorb)?;
    if a.preset != b.preset {
        return Err(EconomyError::MergeNotAllowed(format!(
            "presets {} and {} differ",
            a.preset, b.preset
        )));
    }
    let preset = catalog.rig(a.preset)?;
    if preset.special.cannot_merge {
        return Err(EconomyError::MergeNotAllowed(format!("{} is not mergeable", preset.name)));
    }
    Ok(MergePlan {
        keep,
        absorb,
        level: a.level.max(b.level),
        days_remaining: a.days_remaining.saturating_add(b.days_remaining),
    })
}
