#![deny(warnings)]

//! Core domain models and invariants for the Mine Tycoon economy.
//!
//! This crate defines the serializable catalog (material tiers, refinement
//! recipes, rig presets, upgrade tables), the live market and player state
//! read from the ledger, and validation that runs once at catalog load.

pub mod catalog;
pub mod defaults;
pub mod error;
pub mod market;
pub mod player;
pub mod recipe;
pub mod resource;
pub mod rig;
pub mod upgrade;

pub use catalog::{Catalog, CatalogConfig};
pub use error::{EconomyError, ValidationError};
pub use market::{MarketQuote, MarketSnapshot, PriceHistory, Trend, PRICE_HISTORY_LEN};
pub use player::{ItemKind, OwnedRig, PlayerState, UserId};
pub use recipe::{Recipe, RecipeGraph};
pub use resource::{LocalizedName, MaterialGroup, MaterialTier, ResourceCatalog, TierId};
pub use rig::{
    Acquisition, ContractDuration, CraftingCost, RigId, RigPreset, RigPresetConfig,
    SpecialProperties, DAYS_PER_MONTH,
};
pub use upgrade::{CostCurve, FailureRisk, UpgradeFamily, UpgradeStep, UpgradeTrack};
