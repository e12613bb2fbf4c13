//! The full static catalog and its load-time cross-reference validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{EconomyError, ValidationError};
use crate::recipe::{Recipe, RecipeGraph};
use crate::resource::{MaterialTier, ResourceCatalog, TierId};
use crate::rig::{validate_preset, RigId, RigPreset, RigPresetConfig};
use crate::upgrade::{UpgradeFamily, UpgradeTrack};

/// Configuration-file shape of the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub materials: Vec<MaterialTier>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub rigs: Vec<RigPresetConfig>,
    #[serde(default)]
    pub upgrades: Vec<UpgradeTrack>,
}

/// Read-only catalog, loaded once per process.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Catalog {
    pub resources: ResourceCatalog,
    pub recipes: RecipeGraph,
    rigs: BTreeMap<RigId, RigPreset>,
    upgrades: BTreeMap<UpgradeFamily, UpgradeTrack>,
}

impl Catalog {
    /// Convert configuration into a validated catalog.
    pub fn from_config(cfg: CatalogConfig) -> Result<Self, ValidationError> {
        let resources = ResourceCatalog::new(cfg.materials)?;
        let recipes = RecipeGraph::new(cfg.recipes)?;
        let mut rigs = BTreeMap::new();
        for rc in cfg.rigs {
            let preset = rc.into_preset()?;
            let id = preset.id;
            if rigs.insert(id, preset).is_some() {
                return Err(ValidationError::DuplicateId(format!("rig {id}")));
            }
        }
        let mut upgrades = BTreeMap::new();
        for track in cfg.upgrades {
            let family = track.family;
            if upgrades.insert(family, track).is_some() {
                return Err(ValidationError::DuplicateId(format!("upgrade track {family:?}")));
            }
        }
        let catalog = Catalog {
            resources,
            recipes,
            rigs,
            upgrades,
        };
        catalog.validate()?;
        info!(
            materials = catalog.resources.len(),
            rigs = catalog.rigs.len(),
            tracks = catalog.upgrades.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Checks every entity and that every cross-reference resolves.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let tier_known = |t: &TierId, ctx: &str| {
            if self.resources.contains(*t) {
                Ok(())
            } else {
                Err(ValidationError::DanglingReference(format!("{ctx} -> tier {t}")))
            }
        };

        for r in self.recipes.iter() {
            let ctx = format!("recipe {}", r.target);
            tier_known(&r.target, &ctx)?;
            for t in r.ingredients.keys() {
                tier_known(t, &ctx)?;
            }
        }
        for (id, p) in &self.rigs {
            if *id != p.id {
                return Err(ValidationError::Invalid(format!("rig key {id} != {}", p.id)));
            }
            validate_preset(p)?;
            if let Some(c) = p.crafting() {
                for t in c.materials.keys() {
                    tier_known(t, &format!("rig {}", p.name))?;
                }
            }
        }
        for track in self.upgrades.values() {
            track.validate()?;
            for s in &track.steps {
                tier_known(&s.material_tier, &format!("upgrade {:?}", track.family))?;
            }
        }
        debug!("catalog cross-references resolved");
        Ok(())
    }

    pub fn rig(&self, id: RigId) -> Result<&RigPreset, EconomyError> {
        self.rigs
            .get(&id)
            .ok_or_else(|| EconomyError::NotFound(format!("rig preset {id}")))
    }

    pub fn rigs(&self) -> impl Iterator<Item = &RigPreset> {
        self.rigs.values()
    }

    pub fn track(&self, family: UpgradeFamily) -> Result<&UpgradeTrack, EconomyError> {
        self.upgrades
            .get(&family)
            .ok_or_else(|| EconomyError::NotFound(format!("upgrade track {family:?}")))
    }

    pub fn tracks(&self) -> impl Iterator<Item = &UpgradeTrack> {
        self.upgrades.values()
    }
}
