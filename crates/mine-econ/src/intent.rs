//! Pre-validated commit requests handed to the external ledger.
//!
//! The engine never mutates balances. Every builder here takes the output of
//! a successful check and packages it with the `(user, nonce)` idempotency
//! key the ledger deduplicates on.

use mine_core::{
    Acquisition, CraftingCost, FailureRisk, RigId, TierId, UpgradeFamily, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::refine::RefineQuote;
use crate::rigs::{AcquireCost, MergePlan, RenewQuote};
use crate::trade::{TradeAction, TradeEvaluation};
use crate::upgrade::UpgradeRule;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    BuyMaterial {
        tier: TierId,
        quantity: u64,
        unit_price: Decimal,
        total: Decimal,
    },
    SellMaterial {
        tier: TierId,
        quantity: u64,
        unit_price: Decimal,
        tax: Decimal,
        total: Decimal,
        /// Player confirmed an adverse sell flagged by the trade bot.
        #[serde(default)]
        confirmed: bool,
    },
    RefineMaterial {
        target: TierId,
        consumed: BTreeMap<TierId, u64>,
        fee: Decimal,
        produced: u64,
    },
    UpgradeItem {
        rule: UpgradeRule,
        /// Owned rig instance for the rig family; `None` for equipment.
        rig_instance: Option<u64>,
    },
    PurchaseRig {
        rig: RigId,
        price: Decimal,
        duration_days: u32,
    },
    CraftRig {
        rig: RigId,
        cost: CraftingCost,
        duration_days: u32,
    },
    RenewRig {
        instance: u64,
        price: Decimal,
        extra_days: u32,
    },
    MergeRigs {
        keep: u64,
        absorb: u64,
        level: u8,
        days_remaining: u32,
    },
    UnlockSlot {
        slot: u32,
        cost: Decimal,
    },
}

impl IntentAction {
    pub fn from_trade(e: &TradeEvaluation) -> Self {
        match e.action {
            TradeAction::Buy => IntentAction::BuyMaterial {
                tier: e.tier,
                quantity: e.quantity,
                unit_price: e.unit_price,
                total: e.total,
            },
            TradeAction::Sell => IntentAction::SellMaterial {
                tier: e.tier,
                quantity: e.quantity,
                unit_price: e.unit_price,
                tax: e.fee,
                total: e.total,
                confirmed: e.advisory.override_applied,
            },
        }
    }

    pub fn from_refine(q: &RefineQuote) -> Self {
        IntentAction::RefineMaterial {
            target: q.target,
            consumed: q.consumed.clone(),
            fee: q.fee,
            produced: q.produced,
        }
    }

    pub fn from_upgrade(rule: &UpgradeRule, rig_instance: Option<u64>) -> Self {
        IntentAction::UpgradeItem {
            rule: rule.clone(),
            rig_instance,
        }
    }

    pub fn from_acquire(c: &AcquireCost) -> Self {
        match &c.acquisition {
            Acquisition::Price(price) => IntentAction::PurchaseRig {
                rig: c.rig,
                price: *price,
                duration_days: c.duration_days,
            },
            Acquisition::Craft(cost) => IntentAction::CraftRig {
                rig: c.rig,
                cost: cost.clone(),
                duration_days: c.duration_days,
            },
        }
    }

    pub fn from_renew(q: &RenewQuote) -> Self {
        IntentAction::RenewRig {
            instance: q.instance,
            price: q.price,
            extra_days: q.extra_days,
        }
    }

    pub fn from_merge(p: &MergePlan) -> Self {
        IntentAction::MergeRigs {
            keep: p.keep,
            absorb: p.absorb,
            level: p.level,
            days_remaining: p.days_remaining,
        }
    }

    /// `slot` is the 1-based index of the paid slot being bought.
    pub fn unlock_slot(slot: u32, cost: Decimal) -> Self {
        IntentAction::UnlockSlot { slot, cost }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IntentAction::BuyMaterial { .. } => "buy_material",
            IntentAction::SellMaterial { .. } => "sell_material",
            IntentAction::RefineMaterial { .. } => "refine_material",
            IntentAction::UpgradeItem { .. } => "upgrade_item",
            IntentAction::PurchaseRig { .. } => "purchase_rig",
            IntentAction::CraftRig { .. } => "craft_rig",
            IntentAction::RenewRig { .. } => "renew_rig",
            IntentAction::MergeRigs { .. } => "merge_rigs",
            IntentAction::UnlockSlot { .. } => "unlock_slot",
        }
    }

    /// Upgrade family touched by the intent, if any.
    pub fn upgrade_family(&self) -> Option<UpgradeFamily> {
        match self {
            IntentAction::UpgradeItem { rule, .. } => Some(rule.family),
            _ => None,
        }
    }

    /// Failure policy at stake, for upgrade intents.
    pub fn risk(&self) -> Option<FailureRisk> {
        match self {
            IntentAction::UpgradeItem { rule, .. } => Some(rule.risk),
            _ => None,
        }
    }
}

/// A commit request keyed by `(user, nonce)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub user: UserId,
    pub nonce: u64,
    pub action: IntentAction,
}

impl Intent {
    pub fn new(user: UserId, nonce: u64, action: IntentAction) -> Self {
        Self {
            user,
            nonce,
            action,
        }
    }

    /// Committed total of a buy or sell.
    pub fn trade_total(&self) -> Option<Decimal> {
        match &self.action {
            IntentAction::BuyMaterial { total, .. } | IntentAction::SellMaterial { total, .. } => {
                Some(*total)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::SafetyAdvisory;

    fn eval(action: TradeAction) -> TradeEvaluation {
        TradeEvaluation {
            tier: TierId::new(1).unwrap(),
            action,
            unit_price: Decimal::new(1000, 2),
            quantity: 5,
            spread_pct: Decimal::ZERO,
            fee: Decimal::new(750, 2),
            total: Decimal::new(4250, 2),
            advisory: SafetyAdvisory {
                deviation: Decimal::ZERO,
                bot_active: false,
                override_applied: false,
            },
        }
    }

    #[test]
    fn sell_intent_carries_tax() {
        match IntentAction::from_trade(&eval(TradeAction::Sell)) {
            IntentAction::SellMaterial {
                tax,
                total,
                confirmed,
                ..
            } => {
                assert_eq!(tax, Decimal::new(750, 2));
                assert_eq!(total, Decimal::new(4250, 2));
                assert!(!confirmed);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn override_marks_sell_confirmed() {
        let mut e = eval(TradeAction::Sell);
        e.advisory.override_applied = true;
        assert!(matches!(
            IntentAction::from_trade(&e),
            IntentAction::SellMaterial { confirmed: true, .. }
        ));
    }

    #[test]
    fn acquisition_maps_to_purchase_or_craft() {
        let priced = AcquireCost {
            rig: RigId(1),
            acquisition: Acquisition::Price(Decimal::new(150, 0)),
            duration_days: 30,
        };
        assert_eq!(IntentAction::from_acquire(&priced).kind(), "purchase_rig");
        let crafted = AcquireCost {
            rig: RigId(4),
            acquisition: Acquisition::Craft(CraftingCost::default()),
            duration_days: 60,
        };
        assert_eq!(IntentAction::from_acquire(&crafted).kind(), "craft_rig");
    }

    #[test]
    fn intent_json_roundtrip() {
        let intent = Intent::new(
            UserId("u1".into()),
            7,
            IntentAction::from_trade(&eval(TradeAction::Buy)),
        );
        let s = serde_json::to_string(&intent).unwrap();
        assert!(s.contains("\"buy_material\""), "{s}");
        let back: Intent = serde_json::from_str(&s).unwrap();
        assert_eq!(back, intent);
        assert_eq!(back.trade_total(), Some(Decimal::new(4250, 2)));
    }
}
