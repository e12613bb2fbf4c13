//! Built-in catalog shipped with the game. Used when configuration does not
//! override it.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::catalog::{Catalog, CatalogConfig};
use crate::error::ValidationError;
use crate::player::ItemKind;
use crate::recipe::Recipe;
use crate::resource::{LocalizedName, MaterialGroup, MaterialTier, TierId};
use crate::rig::{ContractDuration, CraftingCost, RigId, RigPresetConfig, SpecialProperties};
use crate::upgrade::{CostCurve, FailureRisk, UpgradeFamily, UpgradeStep, UpgradeTrack};

const fn t(n: u8) -> TierId {
    TierId::of(n)
}

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn pct(p: i64) -> Decimal {
    Decimal::new(p, 2)
}

fn materials() -> Vec<MaterialTier> {
    let rows: [(u8, &str, &str, i64, &str, MaterialGroup); 10] = [
        (0, "Stone", "Камень", 500, "#8a8a8a", MaterialGroup::Raw),
        (1, "Coal", "Уголь", 1000, "#2f2f2f", MaterialGroup::Raw),
        (2, "Copper", "Медь", 2500, "#b87333", MaterialGroup::Industrial),
        (3, "Iron", "Железо", 6000, "#6e7b8b", MaterialGroup::Industrial),
        (4, "Silver", "Серебро", 15000, "#c0c0c0", MaterialGroup::Precious),
        (5, "Gold", "Золото", 40000, "#ffd700", MaterialGroup::Precious),
        (6, "Platinum", "Платина", 100000, "#e5e4e2", MaterialGroup::Precious),
        (7, "Emerald", "Изумруд", 250000, "#50c878", MaterialGroup::Precious),
        (8, "Diamond", "Алмаз", 600000, "#b9f2ff", MaterialGroup::Precious),
        (9, "Star Crystal", "Звёздный кристалл", 1500000, "#9b5de5", MaterialGroup::Legendary),
    ];
    rows.into_iter()
        .map(|(tier, en, ru, price, color, group)| MaterialTier {
            tier: t(tier),
            name: LocalizedName::new(en, ru),
            base_price: money(price),
            color: color.to_string(),
            group,
        })
        .collect()
}

fn recipes() -> Vec<Recipe> {
    let fees = [100, 250, 500, 1200, 3000, 7500, 18000, 45000];
    let mut out = Vec::with_capacity(9);
    // Coal is pressed from stone.
    out.push(Recipe {
        target: t(1),
        ingredients: BTreeMap::from([(t(0), 4)]),
        fee: money(fees[0]),
        required_tool: None,
        output_quantity: 1,
        multi_mix: false,
    });
    for target in 2u8..=8 {
        out.push(Recipe {
            target: t(target),
            ingredients: BTreeMap::from([(t(target - 1), 3), (t(target - 2), 1)]),
            fee: money(fees[usize::from(target - 1)]),
            required_tool: None,
            output_quantity: 1,
            multi_mix: false,
        });
    }
    // One of every lower tier plus a seed crystal yields two crystals.
    let mut mix: BTreeMap<TierId, u64> = (0u8..=8).map(|n| (t(n), 1)).collect();
    mix.insert(t(9), 1);
    out.push(Recipe {
        target: t(9),
        ingredients: mix,
        fee: money(120000),
        required_tool: Some(ItemKind::Mixer),
        output_quantity: 2,
        multi_mix: true,
    });
    out
}

fn rigs() -> Vec<RigPresetConfig> {
    let priced = |id: u16, name: &str, price: i64, daily: i64, energy: i64, repair: i64, duration| {
        RigPresetConfig {
            id: RigId(id),
            name: name.to_string(),
            price: Some(money(price)),
            crafting: None,
            daily_profit: money(daily),
            energy_per_day: money(energy),
            repair_cost: money(repair),
            duration,
            bonus_profit: None,
            special: SpecialProperties::default(),
        }
    };

    let hand_drill = priced(1, "Hand Drill", 15000, 600, 50, 1000, ContractDuration::months(1));
    let excavator = priced(2, "Steam Excavator", 90000, 3800, 400, 6000, ContractDuration::months(3));
    let platform = priced(6, "Deep Core Platform", 500000, 21000, 2500, 30000, ContractDuration::months(6));

    let mut starter = priced(3, "Starter Rig", 2000, 300, 0, 0, ContractDuration::days(14));
    starter.bonus_profit = Some(money(2200));
    starter.special = SpecialProperties {
        max_allowed: Some(1),
        cannot_renew: true,
        cannot_merge: true,
        ..Default::default()
    };

    let solar = RigPresetConfig {
        id: RigId(4),
        name: "Solar Miner".to_string(),
        price: None,
        crafting: Some(CraftingCost {
            materials: BTreeMap::from([(t(3), 20), (t(4), 5)]),
            items: BTreeMap::from([(ItemKind::PowerCell, 2), (ItemKind::DrillHead, 1)]),
            fee: money(10000),
        }),
        daily_profit: money(2500),
        energy_per_day: money(300),
        repair_cost: money(4000),
        duration: ContractDuration::months(2),
        bonus_profit: None,
        special: SpecialProperties {
            cannot_merge: true,
            zero_energy: true,
            ..Default::default()
        },
    };

    let borer = RigPresetConfig {
        id: RigId(5),
        name: "Quantum Borer".to_string(),
        price: None,
        crafting: Some(CraftingCost {
            materials: BTreeMap::from([(t(7), 3), (t(8), 1)]),
            items: BTreeMap::from([(ItemKind::CoolingFan, 4), (ItemKind::PowerCell, 4)]),
            fee: money(200000),
        }),
        daily_profit: money(40000),
        energy_per_day: money(2000),
        repair_cost: money(0),
        duration: ContractDuration::days(45),
        bonus_profit: Some(money(1500000)),
        special: SpecialProperties {
            max_allowed: Some(2),
            cannot_renew: true,
            infinite_durability: true,
            ..Default::default()
        },
    };

    vec![hand_drill, excavator, starter, solar, borer, platform]
}

struct Row(u8, u64, u32, i64, FailureRisk, Option<i64>);

fn steps(rows: &[Row]) -> Vec<UpgradeStep> {
    rows.iter()
        .map(|r| UpgradeStep {
            material_tier: t(r.0),
            material_amount: r.1,
            chip_amount: r.2,
            success_chance: pct(r.3),
            risk: r.4,
            target_bonus: r.5.map(|b| Decimal::new(b, 0)),
        })
        .collect()
}

fn upgrades() -> Vec<UpgradeTrack> {
    use FailureRisk::{Break, Drop, None as Safe};

    let rig = UpgradeTrack {
        family: UpgradeFamily::Rig,
        max_level: 10,
        cost_curve: CostCurve {
            base_cost: money(10000),
            multiplier: Decimal::new(16, 1),
        },
        efficiency_growth: Some(Decimal::new(108, 2)),
        steps: steps(&[
            Row(2, 5, 0, 100, Safe, None),
            Row(2, 10, 0, 90, Safe, None),
            Row(2, 15, 1, 80, Safe, None),
            Row(4, 15, 1, 70, Drop, None),
            Row(4, 20, 2, 60, Drop, None),
            Row(4, 30, 2, 50, Drop, None),
            Row(6, 30, 3, 40, Break, None),
            Row(6, 40, 4, 30, Break, None),
            Row(6, 50, 5, 20, Break, None),
        ]),
    };
    let pickaxe = UpgradeTrack {
        family: UpgradeFamily::Pickaxe,
        max_level: 6,
        cost_curve: CostCurve {
            base_cost: money(5000),
            multiplier: Decimal::new(15, 1),
        },
        efficiency_growth: None,
        steps: steps(&[
            Row(1, 10, 1, 95, Safe, Some(5)),
            Row(1, 20, 1, 85, Safe, Some(10)),
            Row(3, 20, 2, 70, Drop, Some(15)),
            Row(3, 30, 2, 55, Drop, Some(25)),
            Row(5, 30, 3, 40, Break, Some(40)),
        ]),
    };
    let helmet = UpgradeTrack {
        family: UpgradeFamily::Helmet,
        max_level: 5,
        cost_curve: CostCurve {
            base_cost: money(8000),
            multiplier: Decimal::new(17, 1),
        },
        efficiency_growth: Some(Decimal::new(105, 2)),
        steps: steps(&[
            Row(3, 5, 1, 90, Safe, None),
            Row(3, 8, 1, 75, Drop, None),
            Row(3, 12, 2, 60, Drop, None),
            Row(3, 20, 3, 45, Break, None),
        ]),
    };
    let lamp = UpgradeTrack {
        family: UpgradeFamily::Lamp,
        max_level: 4,
        cost_curve: CostCurve {
            base_cost: money(4000),
            multiplier: Decimal::new(14, 1),
        },
        efficiency_growth: None,
        steps: steps(&[
            Row(0, 20, 0, 100, Safe, Some(10)),
            Row(0, 40, 1, 80, Safe, Some(20)),
            Row(0, 80, 1, 60, Drop, Some(35)),
        ]),
    };
    vec![rig, pickaxe, helmet, lamp]
}

/// The shipped catalog in configuration form.
pub fn builtin_config() -> CatalogConfig {
    CatalogConfig {
        materials: materials(),
        recipes: recipes(),
        rigs: rigs(),
        upgrades: upgrades(),
    }
}

/// The shipped catalog, validated.
pub fn builtin_catalog() -> Result<Catalog, ValidationError> {
    Catalog::from_config(builtin_config())
}
