//! Refinement recipes: which lower tiers combine into a higher one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{EconomyError, ValidationError};
use crate::player::ItemKind;
use crate::resource::TierId;

fn one() -> u64 {
    1
}

/// Inputs and fee required to produce one batch of `target`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub target: TierId,
    /// Tier → quantity per batch. May span any number of tiers.
    #[serde(default)]
    pub ingredients: BTreeMap<TierId, u64>,
    pub fee: Decimal,
    #[serde(default)]
    pub required_tool: Option<ItemKind>,
    /// Units of `target` produced per batch.
    #[serde(default = "one")]
    pub output_quantity: u64,
    /// Terminal top-tier recipe exempt from the strictly-lower rule.
    #[serde(default)]
    pub multi_mix: bool,
}

impl Recipe {
    /// Checks materials then tool. The fee is not part of this check.
    pub fn check(
        &self,
        materials: &BTreeMap<TierId, u64>,
        tools: &BTreeSet<ItemKind>,
    ) -> Result<(), EconomyError> {
        for (&tier, &required) in &self.ingredients {
            let available = materials.get(&tier).copied().unwrap_or(0);
            if available < required {
                return Err(EconomyError::InsufficientMaterials {
                    tier,
                    required,
                    available,
                });
            }
        }
        if let Some(tool) = self.required_tool {
            if !tools.contains(&tool) {
                return Err(EconomyError::ToolMissing(tool));
            }
        }
        Ok(())
    }

    /// Ingredients for `batches` runs of the recipe.
    pub fn scaled(&self, batches: u64) -> BTreeMap<TierId, u64> {
        self.ingredients
            .iter()
            .map(|(&t, &q)| (t, q.saturating_mul(batches)))
            .collect()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.fee < Decimal::ZERO {
            return Err(ValidationError::InvalidMoney(format!(
                "fee of recipe for tier {}",
                self.target
            )));
        }
        if self.output_quantity == 0 {
            return Err(ValidationError::Invalid(format!(
                "recipe for tier {} produces nothing",
                self.target
            )));
        }
        if self.multi_mix {
            if self.target != TierId::MAX {
                return Err(ValidationError::InvalidMultiMix(self.target));
            }
            return Ok(());
        }
        for &ingredient in self.ingredients.keys() {
            if ingredient >= self.target {
                return Err(ValidationError::RecipeOrder {
                    target: self.target,
                    ingredient,
                });
            }
        }
        Ok(())
    }
}

/// Recipes keyed by target tier.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(into = "Vec<Recipe>")]
pub struct RecipeGraph {
    recipes: BTreeMap<TierId, Recipe>,
}

impl RecipeGraph {
    /// Build from a list, enforcing one recipe per target, the tier ordering,
    /// and at most one multi-mix recipe.
    pub fn new(list: Vec<Recipe>) -> Result<Self, ValidationError> {
        let mut recipes = BTreeMap::new();
        let mut multi_mix_seen = false;
        for r in list {
            r.validate()?;
            if r.multi_mix {
                if multi_mix_seen {
                    return Err(ValidationError::InvalidMultiMix(r.target));
                }
                multi_mix_seen = true;
            }
            let target = r.target;
            if recipes.insert(target, r).is_some() {
                return Err(ValidationError::DuplicateId(format!("recipe for tier {target}")));
            }
        }
        Ok(Self { recipes })
    }

    pub fn get_recipe(&self, target: TierId) -> Result<&Recipe, EconomyError> {
        self.recipes
            .get(&target)
            .ok_or_else(|| EconomyError::not_found(format!("recipe for tier {target}")))
    }

    /// True iff a recipe for `target` exists and every requirement is met.
    pub fn can_craft(
        &self,
        target: TierId,
        materials: &BTreeMap<TierId, u64>,
        tools: &BTreeSet<ItemKind>,
    ) -> bool {
        self.get_recipe(target)
            .and_then(|r| r.check(materials, tools))
            .is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }
}

impl From<RecipeGraph> for Vec<Recipe> {
    fn from(g: RecipeGraph) -> Self {
        g.recipes.into_values().collect()
    }
}
