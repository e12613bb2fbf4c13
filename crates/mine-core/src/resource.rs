//! Material tiers and the resource catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{EconomyError, ValidationError};

/// Rank of a material in the refinement chain, 0 (raw) through 9 (legendary).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TierId(u8);

impl TierId {
    /// Lowest defined tier.
    pub const MIN: TierId = TierId(0);
    /// Highest defined tier; the only valid multi-mix target.
    pub const MAX: TierId = TierId(9);

    /// Build a tier id, failing with `NotFound` outside 0–9.
    pub fn new(raw: u8) -> Result<Self, EconomyError> {
        if raw > Self::MAX.0 {
            return Err(EconomyError::not_found(format!("tier {raw}")));
        }
        Ok(TierId(raw))
    }

    /// Const constructor for literal tiers in built-in tables.
    pub(crate) const fn of(raw: u8) -> Self {
        assert!(raw <= 9, "tier out of range");
        TierId(raw)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// All tiers in ascending order.
    pub fn all() -> impl Iterator<Item = TierId> {
        (Self::MIN.0..=Self::MAX.0).map(TierId)
    }
}

impl TryFrom<u8> for TierId {
    type Error = EconomyError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        TierId::new(raw)
    }
}

impl From<TierId> for u8 {
    fn from(t: TierId) -> u8 {
        t.0
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display names in both shipped locales.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub en: String,
    pub ru: String,
}

impl LocalizedName {
    pub fn new(en: &str, ru: &str) -> Self {
        Self {
            en: en.to_string(),
            ru: ru.to_string(),
        }
    }
}

/// Display grouping of a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialGroup {
    Raw,
    Industrial,
    Precious,
    Legendary,
}

/// A material tier definition. Immutable after load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialTier {
    pub tier: TierId,
    pub name: LocalizedName,
    /// Reference unit price in currency units (> 0).
    pub base_price: Decimal,
    /// Hex display color, e.g. "#3b3b3b".
    pub color: String,
    pub group: MaterialGroup,
}

/// Lookup table over all defined material tiers.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(into = "Vec<MaterialTier>")]
pub struct ResourceCatalog {
    tiers: BTreeMap<TierId, MaterialTier>,
}

impl ResourceCatalog {
    /// Build from a list, rejecting duplicates and non-positive prices.
    pub fn new(materials: Vec<MaterialTier>) -> Result<Self, ValidationError> {
        let mut tiers = BTreeMap::new();
        for m in materials {
            if m.base_price <= Decimal::ZERO {
                return Err(ValidationError::InvalidMoney(format!(
                    "base price of tier {}",
                    m.tier
                )));
            }
            if m.name.en.trim().is_empty() {
                return Err(ValidationError::Invalid(format!("tier {} has no name", m.tier)));
            }
            let tier = m.tier;
            if tiers.insert(tier, m).is_some() {
                return Err(ValidationError::DuplicateId(format!("tier {tier}")));
            }
        }
        Ok(Self { tiers })
    }

    /// Pure lookup; `NotFound` for tiers absent from the catalog.
    pub fn get_material(&self, tier: TierId) -> Result<&MaterialTier, EconomyError> {
        self.tiers
            .get(&tier)
            .ok_or_else(|| EconomyError::not_found(format!("material tier {tier}")))
    }

    pub fn base_price(&self, tier: TierId) -> Result<Decimal, EconomyError> {
        self.get_material(tier).map(|m| m.base_price)
    }

    pub fn contains(&self, tier: TierId) -> bool {
        self.tiers.contains_key(&tier)
    }

    /// Materials in ascending tier order.
    pub fn iter(&self) -> impl Iterator<Item = &MaterialTier> {
        self.tiers.values()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl From<ResourceCatalog> for Vec<MaterialTier> {
    fn from(c: ResourceCatalog) -> Self {
        c.tiers.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coal() -> MaterialTier {
        MaterialTier {
            tier: TierId::new(1).unwrap(),
            name: LocalizedName::new("Coal", "Уголь"),
            base_price: Decimal::new(1000, 2),
            color: "#2f2f2f".to_string(),
            group: MaterialGroup::Raw,
        }
    }

    #[test]
    fn tier_range_is_enforced() {
        assert!(TierId::new(0).is_ok());
        assert!(TierId::new(9).is_ok());
        assert!(matches!(TierId::new(10), Err(EconomyError::NotFound(_))));
        assert_eq!(TierId::all().count(), 10);
    }

    #[test]
    fn tier_serializes_as_integer() {
        let t = TierId::new(7).unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "7");
        assert!(serde_json::from_str::<TierId>("12").is_err());
    }

    #[test]
    fn lookup_and_not_found() {
        let cat = ResourceCatalog::new(vec![coal()]).unwrap();
        let m = cat.get_material(TierId::new(1).unwrap()).unwrap();
        assert_eq!(m.name.en, "Coal");
        assert!(matches!(
            cat.get_material(TierId::new(2).unwrap()),
            Err(EconomyError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_and_bad_price_rejected() {
        assert!(matches!(
            ResourceCatalog::new(vec![coal(), coal()]),
            Err(ValidationError::DuplicateId(_))
        ));
        let mut free = coal();
        free.base_price = Decimal::ZERO;
        assert!(matches!(
            ResourceCatalog::new(vec![free]),
            Err(ValidationError::InvalidMoney(_))
        ));
    }
}
