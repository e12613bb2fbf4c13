//! Error types shared by every crate in the workspace.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::player::ItemKind;
use crate::resource::TierId;
use crate::rig::RigId;

/// Outcome of a rule check that did not pass.
///
/// Every public operation returns one of these instead of panicking. Only
/// [`EconomyError::ConfirmationRequired`] is expected to be resubmitted by the
/// caller, with an explicit override.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EconomyError {
    /// Unknown tier, recipe, rig, upgrade family or level.
    #[error("not found: {0}")]
    NotFound(String),
    /// Balance does not cover the required amount.
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },
    /// A material stock does not cover the requirement.
    #[error("insufficient materials of tier {tier}: need {required}, have {available}")]
    InsufficientMaterials {
        tier: TierId,
        required: u64,
        available: u64,
    },
    /// A countable item stock does not cover the requirement.
    #[error("insufficient items {item:?}: need {required}, have {available}")]
    InsufficientItems {
        item: ItemKind,
        required: u32,
        available: u32,
    },
    /// Upgrade track or slot ladder is exhausted.
    #[error("max level {max} reached")]
    MaxLevelReached { max: u8 },
    /// Ownership limit for a rig preset (or free slots) is exhausted.
    #[error("max owned reached for rig {rig}: limit {limit}")]
    MaxOwnedReached { rig: RigId, limit: u32 },
    /// Trading on the tier is administratively closed.
    #[error("trading suspended for tier {0}")]
    TierSuspended(TierId),
    /// Requested quantity is outside `[1, max]`.
    #[error("quantity {quantity} outside [1, {max}]")]
    QuantityOutOfRange { quantity: u64, max: u64 },
    /// Safety advisor escalation; resubmit with an override to proceed.
    #[error("confirmation required: price deviation {deviation}")]
    ConfirmationRequired { deviation: Decimal },
    /// Crafting gate not satisfied.
    #[error("required tool missing: {0:?}")]
    ToolMissing(ItemKind),
    /// Contract renewal blocked for the preset.
    #[error("rig {0} cannot be renewed")]
    RenewalNotAllowed(RigId),
    /// Merge blocked for the pair.
    #[error("rigs cannot be merged: {0}")]
    MergeNotAllowed(String),
    /// Operation gated off by product rollout state.
    #[error("feature disabled: {0}")]
    FeatureDisabled(String),
}

impl EconomyError {
    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        EconomyError::NotFound(what.to_string())
    }
}

/// Catalog defects detected while loading configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Same id declared twice.
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    /// A cross-reference does not resolve.
    #[error("dangling reference: {0}")]
    DanglingReference(String),
    /// Recipe ingredient is not strictly below its target.
    #[error("recipe for tier {target} uses non-lower tier {ingredient}")]
    RecipeOrder { target: TierId, ingredient: TierId },
    /// Multi-mix recipe declared for a non-top tier, or more than once.
    #[error("invalid multi-mix recipe for tier {0}")]
    InvalidMultiMix(TierId),
    /// Rig preset declares both or neither acquisition method.
    #[error("rig {0}: exactly one of price or crafting must be set")]
    AcquisitionAmbiguous(String),
    /// Price, fee or cost must be non-negative (or positive where stated).
    #[error("invalid monetary value: {0}")]
    InvalidMoney(String),
    /// Probability outside (0, 1].
    #[error("success chance outside (0,1]: {0}")]
    InvalidChance(Decimal),
    /// Upgrade difficulty curve is not monotonic.
    #[error("non-monotonic upgrade curve: {0}")]
    NonMonotonic(String),
    /// Structural problem not covered above.
    #[error("invalid catalog: {0}")]
    Invalid(String),
}
