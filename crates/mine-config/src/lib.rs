#![deny(warnings)]

//! YAML configuration: catalog override, economy policies and feature flags.
//!
//! Configuration is read once at startup. A missing `catalog` section falls
//! back to the built-in catalog; whichever catalog is used is validated
//! before it is returned, so a bad deployment fails loudly at boot.

use mine_core::defaults::builtin_config;
use mine_core::{Catalog, CatalogConfig, EconomyError, ValidationError};
use mine_econ::{IntentAction, SlotPolicy, TradePolicy};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Product rollout switches. The rules engine ignores these; they are
/// enforced where intents are committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Pickaxe/helmet/lamp upgrades. Rig upgrades are always on.
    pub equipment_upgrades: bool,
    pub rig_merging: bool,
    pub slot_unlocks: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            equipment_upgrades: false,
            rig_merging: true,
            slot_unlocks: true,
        }
    }
}

impl FeatureFlags {
    /// Rejects intents whose feature is switched off.
    pub fn check(&self, action: &IntentAction) -> Result<(), EconomyError> {
        let disabled = match action {
            IntentAction::UpgradeItem { rule, .. } if rule.family.is_equipment() => {
                !self.equipment_upgrades
            }
            IntentAction::MergeRigs { .. } => !self.rig_merging,
            IntentAction::UnlockSlot { .. } => !self.slot_unlocks,
            _ => false,
        };
        if disabled {
            return Err(EconomyError::FeatureDisabled(action.kind().to_string()));
        }
        Ok(())
    }
}

/// On-disk shape of the configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub features: FeatureFlags,
    pub trade_policy: TradePolicy,
    pub slot_policy: SlotPolicy,
    /// Seconds between market-state refreshes by the owning service.
    pub market_refresh_secs: Option<u64>,
    pub catalog: Option<CatalogConfig>,
}

/// Validated configuration ready for use.
#[derive(Clone, Debug)]
pub struct LoadedConfig {
    pub catalog: Catalog,
    pub features: FeatureFlags,
    pub trade_policy: TradePolicy,
    pub slot_policy: SlotPolicy,
    pub market_refresh_secs: u64,
    pub source: Option<PathBuf>,
}

/// Default market refresh cadence.
pub const DEFAULT_MARKET_REFRESH_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {message}")]
    Io { path: String, message: String },
    #[error("yaml error: {0}")]
    Yaml(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e.to_string())
    }
}

fn fraction_in_unit(v: Decimal) -> bool {
    v >= Decimal::ZERO && v < Decimal::ONE
}

/// Range checks for the trade levers.
pub fn validate_trade_policy(p: &TradePolicy) -> Result<(), ValidationError> {
    if !fraction_in_unit(p.base_spread) || !fraction_in_unit(p.mastery_spread) {
        return Err(ValidationError::Invalid("spread must be in [0,1)".into()));
    }
    if p.mastery_spread > p.base_spread {
        return Err(ValidationError::Invalid(
            "mastery spread must not exceed base spread".into(),
        ));
    }
    if !fraction_in_unit(p.sell_tax) {
        return Err(ValidationError::Invalid("sell tax must be in [0,1)".into()));
    }
    if p.intervention_threshold <= Decimal::ZERO {
        return Err(ValidationError::Invalid(
            "intervention threshold must be positive".into(),
        ));
    }
    if p.safe_sell_threshold >= Decimal::ZERO {
        return Err(ValidationError::Invalid(
            "safe sell threshold must be negative".into(),
        ));
    }
    Ok(())
}

pub fn validate_slot_policy(p: &SlotPolicy) -> Result<(), ValidationError> {
    if p.free_slots > p.max_slots {
        return Err(ValidationError::Invalid("free slots exceed max slots".into()));
    }
    if p.unlock_curve.base_cost <= Decimal::ZERO || p.unlock_curve.multiplier <= Decimal::ONE {
        return Err(ValidationError::NonMonotonic("slot unlock curve".into()));
    }
    let paid = p.max_slots - p.free_slots;
    if p.unlock_curve.checked_cost(paid).is_none() {
        return Err(ValidationError::Invalid(format!(
            "slot unlock cost overflows before {paid} paid slots"
        )));
    }
    Ok(())
}

impl EconomyConfig {
    /// Validate policies and build the catalog.
    pub fn resolve(self, source: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
        validate_trade_policy(&self.trade_policy)?;
        validate_slot_policy(&self.slot_policy)?;
        let catalog_cfg = match self.catalog {
            Some(c) => {
                info!("using catalog from configuration");
                c
            }
            None => builtin_config(),
        };
        let catalog = Catalog::from_config(catalog_cfg)?;
        if !self.features.equipment_upgrades {
            info!("equipment upgrades disabled");
        }
        Ok(LoadedConfig {
            catalog,
            features: self.features,
            trade_policy: self.trade_policy,
            slot_policy: self.slot_policy,
            market_refresh_secs: self
                .market_refresh_secs
                .unwrap_or(DEFAULT_MARKET_REFRESH_SECS),
            source,
        })
    }
}

/// Parse and validate configuration text.
pub fn from_yaml_str(text: &str) -> Result<LoadedConfig, ConfigError> {
    let cfg: EconomyConfig = serde_yaml::from_str(text)?;
    cfg.resolve(None)
}

/// Read, parse and validate a configuration file.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<LoadedConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let cfg: EconomyConfig = serde_yaml::from_str(&text)?;
    info!(path = %path.display(), "loaded economy config");
    cfg.resolve(Some(path.to_path_buf()))
}

/// Defaults plus the built-in catalog.
pub fn builtin() -> Result<LoadedConfig, ConfigError> {
    EconomyConfig::default().resolve(None)
}

/// Load `path` when given, otherwise fall back to [`builtin`].
pub fn load_or_builtin(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    match path {
        Some(p) => load_from_path(p),
        None => {
            warn!("no config file given, using built-in economy");
            builtin()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mine_core::{RigId, TierId, UpgradeFamily};
    use mine_econ::upgrade::quote;

    #[test]
    fn builtin_config_loads() {
        let cfg = builtin().unwrap();
        assert_eq!(cfg.market_refresh_secs, 60);
        assert_eq!(cfg.trade_policy, TradePolicy::default());
        assert!(!cfg.features.equipment_upgrades);
    }

    #[test]
    fn partial_yaml_overrides_policy() {
        let cfg = from_yaml_str(
            r#"
features:
  equipment_upgrades: true
trade_policy:
  mastery_threshold: 500
market_refresh_secs: 30
"#,
        )
        .unwrap();
        assert!(cfg.features.equipment_upgrades);
        assert_eq!(cfg.trade_policy.mastery_threshold, 500);
        assert_eq!(cfg.trade_policy.base_spread, Decimal::new(15, 2));
        assert_eq!(cfg.market_refresh_secs, 30);
    }

    #[test]
    fn bad_policy_rejected() {
        let err = from_yaml_str("trade_policy:\n  sell_tax: \"1.5\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        let err = from_yaml_str("trade_policy:\n  safe_sell_threshold: \"0.1\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn slot_ladder_must_stay_representable() {
        let err = from_yaml_str("slot_policy:\n  max_slots: 200\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ValidationError::Invalid(_))));
        assert!(from_yaml_str("slot_policy:\n  max_slots: 40\n").is_ok());
    }

    #[test]
    fn malformed_yaml_is_reported() {
        assert!(matches!(from_yaml_str("features: [oops"), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_from_path("/definitely/not/here.yaml"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn sample_config_file_loads() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/economy.yaml");
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.source.as_deref(), Some(path.as_path()));
        let stone = cfg.catalog.resources.get_material(TierId::new(0).unwrap()).unwrap();
        assert_eq!(stone.name.en, "Stone");
        let rig = cfg.catalog.rig(RigId(2)).unwrap();
        assert_eq!(rig.duration_days, 60);
        assert!(quote(&cfg.catalog, UpgradeFamily::Rig, 1).is_ok());
    }

    #[test]
    fn ambiguous_rig_in_yaml_rejected() {
        let text = r##"
catalog:
  materials:
    - tier: 0
      name: { en: Stone, ru: Камень }
      base_price: "5.00"
      color: "#8a8a8a"
      group: raw
  rigs:
    - id: 1
      name: Broken
      daily_profit: "1.00"
      duration: { days: 10 }
"##;
        assert!(matches!(
            from_yaml_str(text),
            Err(ConfigError::Validation(ValidationError::AcquisitionAmbiguous(_)))
        ));
    }

    #[test]
    fn rig_durations_in_days_or_months() {
        let text = r##"
catalog:
  materials:
    - tier: 0
      name: { en: Stone, ru: Камень }
      base_price: "5.00"
      color: "#8a8a8a"
      group: raw
  rigs:
    - id: 1
      name: Monthly
      price: "10.00"
      daily_profit: "1.00"
      duration: { months: 3 }
    - id: 2
      name: Daily
      price: "10.00"
      daily_profit: "1.00"
      duration: { days: 12 }
"##;
        let cfg = from_yaml_str(text).unwrap();
        assert_eq!(cfg.catalog.rig(RigId(1)).unwrap().duration_days, 90);
        assert_eq!(cfg.catalog.rig(RigId(2)).unwrap().duration_days, 12);

        let both = text.replace("{ days: 12 }", "{ days: 12, months: 1 }");
        assert!(matches!(
            from_yaml_str(&both),
            Err(ConfigError::Validation(ValidationError::Invalid(_)))
        ));
    }

    #[test]
    fn equipment_upgrades_gate() {
        let cfg = builtin().unwrap();
        let pickaxe = quote(&cfg.catalog, UpgradeFamily::Pickaxe, 1).unwrap();
        let rig = quote(&cfg.catalog, UpgradeFamily::Rig, 1).unwrap();
        assert!(matches!(
            cfg.features.check(&IntentAction::from_upgrade(&pickaxe, None)),
            Err(EconomyError::FeatureDisabled(_))
        ));
        assert!(cfg.features.check(&IntentAction::from_upgrade(&rig, Some(1))).is_ok());
        let on = FeatureFlags {
            equipment_upgrades: true,
            ..Default::default()
        };
        assert!(on.check(&IntentAction::from_upgrade(&pickaxe, None)).is_ok());
    }
}
