//! Market quotes as published by the external price simulator.

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::error::EconomyError;
use crate::resource::TierId;

/// Number of past prices kept per tier.
pub const PRICE_HISTORY_LEN: usize = 24;

/// Relative move under which the trend reads as flat (1%).
const FLAT_BAND: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Direction of recent price movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Fixed-length rolling window of past prices, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceHistory(VecDeque<Decimal>);

impl PriceHistory {
    pub fn from_prices(prices: impl IntoIterator<Item = Decimal>) -> Self {
        let mut h = PriceHistory::default();
        for p in prices {
            h.push(p);
        }
        h
    }

    /// Append a price, evicting the oldest once full.
    pub fn push(&mut self, price: Decimal) {
        if self.0.len() == PRICE_HISTORY_LEN {
            self.0.pop_front();
        }
        self.0.push_back(price);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decimal> {
        self.0.iter()
    }

    /// Compares newest against oldest entry.
    pub fn trend(&self) -> Trend {
        let (Some(first), Some(last)) = (self.0.front(), self.0.back()) else {
            return Trend::Flat;
        };
        if first.is_zero() {
            return Trend::Flat;
        }
        let change = (*last - *first) / *first;
        if change > FLAT_BAND {
            Trend::Up
        } else if change < -FLAT_BAND {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

/// Live quote for one tier. `current_price` is owned by the simulator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub tier: TierId,
    pub base_price: Decimal,
    pub current_price: Decimal,
    #[serde(default)]
    pub history: PriceHistory,
    pub trend: Trend,
    /// Trading administratively closed for the tier.
    #[serde(default)]
    pub suspended: bool,
}

impl MarketQuote {
    /// A quote with the trend derived from `history`.
    pub fn new(
        tier: TierId,
        base_price: Decimal,
        current_price: Decimal,
        history: PriceHistory,
    ) -> Self {
        let trend = history.trend();
        Self {
            tier,
            base_price,
            current_price,
            history,
            trend,
            suspended: false,
        }
    }

    /// Record a new simulator price and refresh the trend.
    pub fn observe(&mut self, price: Decimal) {
        self.current_price = price;
        self.history.push(price);
        self.trend = self.history.trend();
    }

    /// `(current - base) / base`; zero when the base is not positive.
    pub fn deviation(&self) -> Decimal {
        if self.base_price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.current_price - self.base_price) / self.base_price
    }
}

/// All quotes fetched in one market-state query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub as_of: NaiveDateTime,
    pub quotes: BTreeMap<TierId, MarketQuote>,
}

impl MarketSnapshot {
    pub fn quote(&self, tier: TierId) -> Result<&MarketQuote, EconomyError> {
        self.quotes
            .get(&tier)
            .ok_or_else(|| EconomyError::NotFound(format!("market quote for tier {tier}")))
    }

    /// True when the snapshot is older than `max_age` at `now`.
    pub fn is_stale(&self, now: NaiveDateTime, max_age: Duration) -> bool {
        now - self.as_of > max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn history_is_bounded() {
        let h = PriceHistory::from_prices((0..40).map(|i| d(1000 + i)));
        assert_eq!(h.len(), PRICE_HISTORY_LEN);
        assert_eq!(*h.iter().next().unwrap(), d(1016));
    }

    #[test]
    fn trend_detection() {
        assert_eq!(PriceHistory::from_prices([d(1000), d(1100)]).trend(), Trend::Up);
        assert_eq!(PriceHistory::from_prices([d(1000), d(900)]).trend(), Trend::Down);
        assert_eq!(PriceHistory::from_prices([d(1000), d(1005)]).trend(), Trend::Flat);
        assert_eq!(PriceHistory::default().trend(), Trend::Flat);
    }

    #[test]
    fn observe_updates_price_and_trend() {
        let tier = TierId::new(1).unwrap();
        let mut q = MarketQuote::new(tier, d(1000), d(1000), PriceHistory::from_prices([d(1000)]));
        q.observe(d(1200));
        assert_eq!(q.current_price, d(1200));
        assert_eq!(q.trend, Trend::Up);
        assert_eq!(q.deviation(), Decimal::new(2, 1));
    }

    #[test]
    fn staleness() {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let snap = MarketSnapshot {
            as_of: t0,
            quotes: BTreeMap::new(),
        };
        assert!(!snap.is_stale(t0 + Duration::seconds(60), Duration::seconds(60)));
        assert!(snap.is_stale(t0 + Duration::seconds(61), Duration::seconds(60)));
        assert!(matches!(
            snap.quote(TierId::new(0).unwrap()),
            Err(EconomyError::NotFound(_))
        ));
    }

    #[test]
    fn quote_json_roundtrip() {
        let q = MarketQuote::new(
            TierId::new(3).unwrap(),
            d(2500),
            d(2612),
            PriceHistory::from_prices([d(2500), d(2612)]),
        );
        let s = serde_json::to_string(&q).unwrap();
        assert!(s.contains("\"tier\":3"));
        let back: MarketQuote = serde_json::from_str(&s).unwrap();
        assert_eq!(back, q);
    }
}
