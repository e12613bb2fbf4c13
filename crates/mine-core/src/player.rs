//! Player balances and inventory as read from the external ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::EconomyError;
use crate::resource::TierId;
use crate::rig::RigId;
use crate::upgrade::UpgradeFamily;

/// Stable ids for countable inventory items. Counted by kind, never by instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Catalyst consumed by upgrade attempts.
    UpgradeChip,
    /// Tool gating the multi-mix refinement.
    Mixer,
    /// Automation item granting the sell-side safety advisor.
    TradeBot,
    DrillHead,
    PowerCell,
    CoolingFan,
}

/// Opaque user identifier issued by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rig instance owned by a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedRig {
    /// Ledger-assigned instance id, unique per player.
    pub instance: u64,
    pub preset: RigId,
    /// Current upgrade level, starting at 1.
    pub level: u8,
    pub days_remaining: u32,
}

/// Snapshot of a player's balances, fetched before every evaluation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub balance: Decimal,
    pub mastery_points: u32,
    #[serde(default)]
    pub materials: BTreeMap<TierId, u64>,
    #[serde(default)]
    pub items: BTreeMap<ItemKind, u32>,
    #[serde(default)]
    pub rigs: Vec<OwnedRig>,
    /// Equipped items by slot family and their level. Absent means not owned.
    #[serde(default)]
    pub equipment: BTreeMap<UpgradeFamily, u8>,
    /// Rig slots unlocked beyond the free ones.
    #[serde(default)]
    pub unlocked_slots: u32,
}

impl PlayerState {
    pub fn material(&self, tier: TierId) -> u64 {
        self.materials.get(&tier).copied().unwrap_or(0)
    }

    pub fn item(&self, kind: ItemKind) -> u32 {
        self.items.get(&kind).copied().unwrap_or(0)
    }

    pub fn has_item(&self, kind: ItemKind) -> bool {
        self.item(kind) > 0
    }

    /// Item kinds held at least once; used as the crafting tool set.
    pub fn tool_set(&self) -> BTreeSet<ItemKind> {
        self.items
            .iter()
            .filter(|&(_, &n)| n > 0)
            .map(|(&k, _)| k)
            .collect()
    }

    /// Number of owned rigs built from `preset`.
    pub fn owned_count(&self, preset: RigId) -> u32 {
        self.rigs.iter().filter(|r| r.preset == preset).count() as u32
    }

    pub fn rig(&self, instance: u64) -> Result<&OwnedRig, EconomyError> {
        self.rigs
            .iter()
            .find(|r| r.instance == instance)
            .ok_or_else(|| EconomyError::NotFound(format!("owned rig {instance}")))
    }

    /// Fails with `InsufficientFunds` unless `balance >= amount`.
    pub fn require_funds(&self, amount: Decimal) -> Result<(), EconomyError> {
        if self.balance < amount {
            return Err(EconomyError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        Ok(())
    }

    /// Checks every listed material requirement, in tier order.
    pub fn require_materials(&self, needs: &BTreeMap<TierId, u64>) -> Result<(), EconomyError> {
        for (&tier, &required) in needs {
            let available = self.material(tier);
            if available < required {
                return Err(EconomyError::InsufficientMaterials {
                    tier,
                    required,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Checks every listed item requirement, counting by kind.
    pub fn require_items(&self, needs: &BTreeMap<ItemKind, u32>) -> Result<(), EconomyError> {
        for (&item, &required) in needs {
            let available = self.item(item);
            if available < required {
                return Err(EconomyError::InsufficientItems {
                    item,
                    required,
                    available,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entries_count_as_zero() {
        let p = PlayerState::default();
        assert_eq!(p.material(TierId::new(3).unwrap()), 0);
        assert_eq!(p.item(ItemKind::Mixer), 0);
        assert!(!p.has_item(ItemKind::TradeBot));
    }

    #[test]
    fn require_materials_reports_first_shortfall() {
        let mut p = PlayerState::default();
        p.materials.insert(TierId::new(0).unwrap(), 10);
        let mut needs = BTreeMap::new();
        needs.insert(TierId::new(0).unwrap(), 5);
        needs.insert(TierId::new(2).unwrap(), 1);
        assert_eq!(
            p.require_materials(&needs),
            Err(EconomyError::InsufficientMaterials {
                tier: TierId::new(2).unwrap(),
                required: 1,
                available: 0,
            })
        );
    }

    #[test]
    fn player_state_json_roundtrip() {
        let mut p = PlayerState {
            balance: Decimal::new(123_45, 2),
            mastery_points: 1000,
            ..Default::default()
        };
        p.materials.insert(TierId::new(9).unwrap(), 2);
        p.items.insert(ItemKind::UpgradeChip, 3);
        p.items.insert(ItemKind::Mixer, 0);
        p.equipment.insert(UpgradeFamily::Pickaxe, 2);
        p.rigs.push(OwnedRig {
            instance: 1,
            preset: RigId(2),
            level: 1,
            days_remaining: 30,
        });
        let s = serde_json::to_string(&p).unwrap();
        let back: PlayerState = serde_json::from_str(&s).unwrap();
        assert_eq!(back, p);
        assert_eq!(back.balance.to_string(), "123.45");
        assert_eq!(back.tool_set().len(), 1);
    }
}
