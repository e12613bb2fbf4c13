//! Re-validation and mutation of a single intent against a locked state.

use mine_core::{
    Acquisition, Catalog, EconomyError, ItemKind, MarketSnapshot, OwnedRig, PlayerState, RigId,
    TierId, UpgradeFamily,
};
use mine_econ::trade::{evaluate, TradeAction, TradeRequest};
use mine_econ::upgrade::{self, UpgradeOutcome};
use mine_econ::{refine, rigs, slots, IntentAction, SlotPolicy, TradePolicy};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::LedgerError;

pub(crate) struct Rules<'a> {
    pub catalog: &'a Catalog,
    pub trade: &'a TradePolicy,
    pub slots: &'a SlotPolicy,
    pub market: &'a MarketSnapshot,
}

#[derive(Debug, Default)]
pub(crate) struct Applied {
    pub outcome: Option<UpgradeOutcome>,
    pub rig_instance: Option<u64>,
}

fn stale(what: &str, intent: impl Display, now: impl Display) -> LedgerError {
    LedgerError::Stale(format!("{what}: intent has {intent}, ledger computes {now}"))
}

fn debit(state: &mut PlayerState, amount: Decimal) -> Result<(), EconomyError> {
    state.require_funds(amount)?;
    state.balance -= amount;
    Ok(())
}

fn take_materials(
    state: &mut PlayerState,
    needs: &BTreeMap<TierId, u64>,
) -> Result<(), EconomyError> {
    state.require_materials(needs)?;
    for (tier, &qty) in needs {
        if let Some(have) = state.materials.get_mut(tier) {
            *have -= qty;
        }
    }
    Ok(())
}

fn take_items(state: &mut PlayerState, needs: &BTreeMap<ItemKind, u32>) -> Result<(), EconomyError> {
    state.require_items(needs)?;
    for (kind, &qty) in needs {
        if let Some(have) = state.items.get_mut(kind) {
            *have -= qty;
        }
    }
    Ok(())
}

fn add_material(state: &mut PlayerState, tier: TierId, qty: u64) {
    let slot = state.materials.entry(tier).or_insert(0);
    *slot = slot.saturating_add(qty);
}

fn rig_mut(state: &mut PlayerState, instance: u64) -> Result<&mut OwnedRig, EconomyError> {
    state
        .rigs
        .iter_mut()
        .find(|r| r.instance == instance)
        .ok_or_else(|| EconomyError::NotFound(format!("rig instance {instance}")))
}

fn current_level(
    state: &PlayerState,
    family: UpgradeFamily,
    rig_instance: Option<u64>,
) -> Result<u8, EconomyError> {
    match (family, rig_instance) {
        (UpgradeFamily::Rig, Some(i)) => Ok(state.rig(i)?.level),
        (UpgradeFamily::Rig, None) => Err(EconomyError::NotFound(
            "rig instance for rig upgrade".into(),
        )),
        (family, _) => state
            .equipment
            .get(&family)
            .copied()
            .ok_or_else(|| EconomyError::NotFound(format!("{family:?} not owned"))),
    }
}

fn settle_upgrade(
    state: &mut PlayerState,
    family: UpgradeFamily,
    rig_instance: Option<u64>,
    outcome: &UpgradeOutcome,
) -> Result<(), EconomyError> {
    let level = match outcome {
        UpgradeOutcome::Upgraded { level, .. }
        | UpgradeOutcome::Unchanged { level }
        | UpgradeOutcome::Dropped { level } => Some(*level),
        UpgradeOutcome::Broken => None,
    };
    match (family, rig_instance, level) {
        (UpgradeFamily::Rig, Some(i), Some(level)) => rig_mut(state, i)?.level = level,
        (UpgradeFamily::Rig, Some(i), None) => state.rigs.retain(|r| r.instance != i),
        (UpgradeFamily::Rig, None, _) => {
            return Err(EconomyError::NotFound("rig instance for rig upgrade".into()))
        }
        (family, _, Some(level)) => {
            state.equipment.insert(family, level);
        }
        (family, _, None) => {
            state.equipment.remove(&family);
        }
    }
    Ok(())
}

/// Re-run the engine check behind `action` on `state` and apply it.
///
/// `state` and `next_instance` are staging copies; the caller swaps them in
/// only on success. `draw` is called at most once, after every check passed.
pub(crate) fn apply<F>(
    rules: &Rules<'_>,
    state: &mut PlayerState,
    next_instance: &mut u64,
    action: &IntentAction,
    draw: F,
) -> Result<Applied, LedgerError>
where
    F: FnOnce() -> Result<Decimal, LedgerError>,
{
    let mut applied = Applied::default();
    match action {
        IntentAction::BuyMaterial {
            tier,
            quantity,
            total,
            ..
        } => {
            let request = TradeRequest {
                tier: *tier,
                action: TradeAction::Buy,
                quantity: *quantity,
                override_safety: false,
            };
            let quote = rules.market.quote(*tier)?;
            let now = evaluate(rules.catalog, &request, quote, state, rules.trade)?;
            if now.total != *total {
                return Err(stale("buy total", total, now.total));
            }
            debit(state, now.total)?;
            add_material(state, *tier, *quantity);
        }
        IntentAction::SellMaterial {
            tier,
            quantity,
            total,
            confirmed,
            ..
        } => {
            let request = TradeRequest {
                tier: *tier,
                action: TradeAction::Sell,
                quantity: *quantity,
                override_safety: *confirmed,
            };
            let quote = rules.market.quote(*tier)?;
            let now = evaluate(rules.catalog, &request, quote, state, rules.trade)?;
            if now.total != *total {
                return Err(stale("sell total", total, now.total));
            }
            take_materials(state, &BTreeMap::from([(*tier, *quantity)]))?;
            state.balance += now.total;
        }
        IntentAction::RefineMaterial {
            target,
            consumed,
            fee,
            produced,
        } => {
            let per_batch = rules.catalog.recipes.get_recipe(*target)?.output_quantity;
            if *produced == 0 || produced % per_batch != 0 {
                return Err(stale("refine output", produced, per_batch));
            }
            let now = refine::prepare_refine(rules.catalog, state, *target, produced / per_batch)?;
            if now.consumed != *consumed {
                return Err(LedgerError::Stale(format!("refine inputs for tier {target}")));
            }
            if now.fee != *fee {
                return Err(stale("refine fee", fee, now.fee));
            }
            take_materials(state, &now.consumed)?;
            debit(state, now.fee)?;
            add_material(state, *target, now.produced);
        }
        IntentAction::UpgradeItem { rule, rig_instance } => {
            let level = current_level(state, rule.family, *rig_instance)?;
            let now = upgrade::quote(rules.catalog, rule.family, level)?;
            if now != *rule {
                return Err(stale("upgrade level", rule.level, now.level));
            }
            upgrade::check_affordable(&now, state)?;
            take_materials(state, &BTreeMap::from([(now.material_tier, now.material_amount)]))?;
            take_items(state, &BTreeMap::from([(ItemKind::UpgradeChip, now.chip_amount)]))?;
            debit(state, now.currency_fee)?;
            let outcome = upgrade::resolve(&now, draw()?);
            settle_upgrade(state, now.family, *rig_instance, &outcome)?;
            applied.outcome = Some(outcome);
        }
        IntentAction::PurchaseRig {
            rig,
            price,
            duration_days,
        } => {
            let now = rigs::check_acquire(rules.catalog, state, rules.slots, *rig)?;
            match now.acquisition {
                Acquisition::Price(p) if p == *price => debit(state, p)?,
                Acquisition::Price(p) => return Err(stale("rig price", price, p)),
                Acquisition::Craft(_) => {
                    return Err(LedgerError::Stale(format!("rig {rig} is crafted, not sold")))
                }
            }
            if now.duration_days != *duration_days {
                return Err(stale("rig duration", duration_days, now.duration_days));
            }
            applied.rig_instance = Some(install(state, next_instance, *rig, now.duration_days));
        }
        IntentAction::CraftRig {
            rig,
            cost,
            duration_days,
        } => {
            let now = rigs::check_acquire(rules.catalog, state, rules.slots, *rig)?;
            match &now.acquisition {
                Acquisition::Craft(c) if c == cost => {
                    take_materials(state, &c.materials)?;
                    take_items(state, &c.items)?;
                    debit(state, c.fee)?;
                }
                _ => return Err(LedgerError::Stale(format!("crafting cost of rig {rig}"))),
            }
            if now.duration_days != *duration_days {
                return Err(stale("rig duration", duration_days, now.duration_days));
            }
            applied.rig_instance = Some(install(state, next_instance, *rig, now.duration_days));
        }
        IntentAction::RenewRig {
            instance,
            price,
            extra_days,
        } => {
            let now = rigs::check_renew(rules.catalog, state, *instance)?;
            if now.price != *price {
                return Err(stale("renewal price", price, now.price));
            }
            if now.extra_days != *extra_days {
                return Err(stale("renewal days", extra_days, now.extra_days));
            }
            debit(state, now.price)?;
            let owned = rig_mut(state, *instance)?;
            owned.days_remaining = owned.days_remaining.saturating_add(now.extra_days);
        }
        IntentAction::MergeRigs {
            keep,
            absorb,
            level,
            days_remaining,
        } => {
            let now = rigs::check_merge(rules.catalog, state, *keep, *absorb)?;
            if now.level != *level || now.days_remaining != *days_remaining {
                return Err(LedgerError::Stale(format!("merge of rigs {keep} and {absorb}")));
            }
            let kept = rig_mut(state, *keep)?;
            kept.level = now.level;
            kept.days_remaining = now.days_remaining;
            state.rigs.retain(|r| r.instance != *absorb);
        }
        IntentAction::UnlockSlot { slot, cost } => {
            let expected = state.unlocked_slots + 1;
            if *slot != expected {
                return Err(stale("slot index", slot, expected));
            }
            let now = slots::check_unlock(rules.slots, state)?;
            if now != *cost {
                return Err(stale("slot cost", cost, now));
            }
            debit(state, now)?;
            state.unlocked_slots = expected;
        }
    }
    Ok(applied)
}

fn install(state: &mut PlayerState, next_instance: &mut u64, rig: RigId, days: u32) -> u64 {
    let instance = *next_instance;
    *next_instance += 1;
    state.rigs.push(OwnedRig {
        instance,
        preset: rig,
        level: 1,
        days_remaining: days,
    });
    instance
}
