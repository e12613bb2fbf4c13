//! Refinement: turning lower tiers into a higher one, in batches.

use mine_core::{Catalog, EconomyError, PlayerState, Recipe, TierId};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inputs consumed and output produced by a validated refinement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineQuote {
    pub target: TierId,
    pub batches: u64,
    pub consumed: BTreeMap<TierId, u64>,
    pub fee: Decimal,
    pub produced: u64,
}

/// Check `batches` runs of the recipe for `target` against the player's
/// materials, tools and balance.
pub fn prepare_refine(
    catalog: &Catalog,
    player: &PlayerState,
    target: TierId,
    batches: u64,
) -> Result<RefineQuote, EconomyError> {
    let recipe = catalog.recipes.get_recipe(target)?;
    if batches == 0 {
        return Err(EconomyError::QuantityOutOfRange {
            quantity: 0,
            max: max_batches(catalog, player, target)?,
        });
    }
    let consumed = recipe.scaled(batches);
    let scaled = Recipe {
        ingredients: consumed.clone(),
        ..recipe.clone()
    };
    scaled.check(&player.materials, &player.tool_set())?;
    let fee = recipe.fee * Decimal::from(batches);
    player.require_funds(fee)?;
    Ok(RefineQuote {
        target,
        batches,
        consumed,
        fee,
        produced: recipe.output_quantity.saturating_mul(batches),
    })
}

/// How many batches materials and balance allow; zero when a tool is missing.
pub fn max_batches(
    catalog: &Catalog,
    player: &PlayerState,
    target: TierId,
) -> Result<u64, EconomyError> {
    let recipe = catalog.recipes.get_recipe(target)?;
    if let Some(tool) = recipe.required_tool {
        if !player.has_item(tool) {
            return Ok(0);
        }
    }
    let mut max = u64::MAX;
    for (&tier, &need) in &recipe.ingredients {
        if need > 0 {
            max = max.min(player.material(tier) / need);
        }
    }
    if recipe.fee > Decimal::ZERO {
        let by_fee = (player.balance.max(Decimal::ZERO) / recipe.fee).floor();
        max = max.min(by_fee.to_u64().unwrap_or(u64::MAX));
    }
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mine_core::defaults::builtin_catalog;
    use mine_core::ItemKind;

    fn t(n: u8) -> TierId {
        TierId::new(n).unwrap()
    }

    #[test]
    fn refine_copper_in_batches() {
        let cat = builtin_catalog().unwrap();
        let mut p = PlayerState {
            balance: Decimal::new(100, 0),
            ..Default::default()
        };
        p.materials.insert(t(1), 7);
        p.materials.insert(t(0), 2);
        let q = prepare_refine(&cat, &p, t(2), 2).unwrap();
        assert_eq!(q.consumed[&t(1)], 6);
        assert_eq!(q.consumed[&t(0)], 2);
        assert_eq!(q.fee, Decimal::new(500, 2));
        assert_eq!(q.produced, 2);
        assert!(matches!(
            prepare_refine(&cat, &p, t(2), 3),
            Err(EconomyError::InsufficientMaterials { .. })
        ));
        assert_eq!(max_batches(&cat, &p, t(2)).unwrap(), 2);
    }

    #[test]
    fn multi_mix_needs_mixer() {
        let cat = builtin_catalog().unwrap();
        let mut p = PlayerState {
            balance: Decimal::new(10_000, 0),
            ..Default::default()
        };
        for n in 0..=9 {
            p.materials.insert(t(n), 1);
        }
        assert_eq!(
            prepare_refine(&cat, &p, TierId::MAX, 1),
            Err(EconomyError::ToolMissing(ItemKind::Mixer))
        );
        p.items.insert(ItemKind::Mixer, 1);
        let q = prepare_refine(&cat, &p, TierId::MAX, 1).unwrap();
        assert_eq!(q.produced, 2);
        assert_eq!(q.consumed.len(), 10);
    }

    #[test]
    fn zero_batches_out_of_range() {
        let cat = builtin_catalog().unwrap();
        assert!(matches!(
            prepare_refine(&cat, &PlayerState::default(), t(1), 0),
            Err(EconomyError::QuantityOutOfRange { quantity: 0, .. })
        ));
    }

    #[test]
    fn fee_gates_refinement() {
        let cat = builtin_catalog().unwrap();
        let mut p = PlayerState::default();
        p.materials.insert(t(0), 40);
        assert!(matches!(
            prepare_refine(&cat, &p, t(1), 1),
            Err(EconomyError::InsufficientFunds { .. })
        ));
        assert_eq!(max_batches(&cat, &p, t(1)).unwrap(), 0);
    }
}
