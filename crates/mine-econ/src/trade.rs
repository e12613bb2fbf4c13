//! Market pricing and trade evaluation.
//!
//! Buy prices carry a spread that shrinks once the player reaches the
//! mastery threshold; sell proceeds carry a flat tax. A bot-safety advisor
//! flags large deviations from the base price and, for players holding a
//! trade bot, escalates adverse sells into a one-shot confirmation.

use mine_core::{Catalog, EconomyError, ItemKind, MarketQuote, PlayerState, TierId};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::policy::TradePolicy;
use crate::round_currency;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
}

/// A player's trade intent before evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub tier: TierId,
    pub action: TradeAction,
    pub quantity: u64,
    /// Set on resubmission after a `ConfirmationRequired` response.
    #[serde(default)]
    pub override_safety: bool,
}

/// Safety advisor readout attached to every evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyAdvisory {
    /// `(current - base) / base`, four decimals.
    pub deviation: Decimal,
    pub bot_active: bool,
    /// The player forced a sell past a confirmation prompt.
    pub override_applied: bool,
}

/// Derived price breakdown for one trade attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvaluation {
    pub tier: TierId,
    pub action: TradeAction,
    pub unit_price: Decimal,
    pub quantity: u64,
    pub spread_pct: Decimal,
    /// Spread paid on a buy, or tax withheld on a sell.
    pub fee: Decimal,
    pub total: Decimal,
    pub advisory: SafetyAdvisory,
}

/// Two-bucket loyalty step: the mastery spread applies at or above the
/// threshold, the base spread below it.
pub fn spread_percent(mastery_points: u32, policy: &TradePolicy) -> Decimal {
    if mastery_points >= policy.mastery_threshold {
        policy.mastery_spread
    } else {
        policy.base_spread
    }
}

/// `current * (1 + spread)`, rounded to cents.
pub fn buy_unit_price(current_price: Decimal, spread: Decimal) -> Decimal {
    round_currency(current_price * (Decimal::ONE + spread))
}

/// Largest quantity the player may trade: owned units for a sell,
/// `floor(balance / buy_unit_price)` for a buy.
pub fn max_quantity(
    action: TradeAction,
    quote: &MarketQuote,
    player: &PlayerState,
    policy: &TradePolicy,
) -> u64 {
    match action {
        TradeAction::Sell => player.material(quote.tier),
        TradeAction::Buy => {
            let unit = buy_unit_price(
                quote.current_price,
                spread_percent(player.mastery_points, policy),
            );
            if unit <= Decimal::ZERO || player.balance <= Decimal::ZERO {
                return 0;
            }
            (player.balance / unit).floor().to_u64().unwrap_or(u64::MAX)
        }
    }
}

fn advisory(quote: &MarketQuote, policy: &TradePolicy) -> SafetyAdvisory {
    let deviation = quote.deviation();
    SafetyAdvisory {
        deviation: deviation.round_dp(4),
        bot_active: deviation.abs() > policy.intervention_threshold,
        override_applied: false,
    }
}

/// Evaluate a trade against the live quote and the player's balances.
///
/// Checks run in order: known tier, suspension, quantity bounds, safety
/// advisor; totals are only computed once all of them pass.
pub fn evaluate(
    catalog: &Catalog,
    request: &TradeRequest,
    quote: &MarketQuote,
    player: &PlayerState,
    policy: &TradePolicy,
) -> Result<TradeEvaluation, EconomyError> {
    catalog.resources.get_material(request.tier)?;
    if quote.tier != request.tier {
        return Err(EconomyError::NotFound(format!(
            "quote for tier {} (got tier {})",
            request.tier, quote.tier
        )));
    }
    // A quote without a positive price is not tradable.
    if quote.suspended || quote.current_price <= Decimal::ZERO {
        return Err(EconomyError::TierSuspended(request.tier));
    }

    let max = max_quantity(request.action, quote, player, policy);
    if request.quantity == 0 || request.quantity > max {
        return Err(EconomyError::QuantityOutOfRange {
            quantity: request.quantity,
            max,
        });
    }

    let mut advisory = advisory(quote, policy);
    if request.action == TradeAction::Sell
        && player.has_item(ItemKind::TradeBot)
        && quote.deviation() < policy.safe_sell_threshold
    {
        if !request.override_safety {
            debug!(tier = %request.tier, deviation = %advisory.deviation, "sell needs confirmation");
            return Err(EconomyError::ConfirmationRequired {
                deviation: advisory.deviation,
            });
        }
        advisory.override_applied = true;
    }

    let qty = Decimal::from(request.quantity);
    let spread = spread_percent(player.mastery_points, policy);
    let evaluation = match request.action {
        TradeAction::Buy => {
            let unit_price = buy_unit_price(quote.current_price, spread);
            let total = round_currency(unit_price * qty);
            TradeEvaluation {
                tier: request.tier,
                action: TradeAction::Buy,
                unit_price,
                quantity: request.quantity,
                spread_pct: spread,
                fee: round_currency(total - quote.current_price * qty),
                total,
                advisory,
            }
        }
        TradeAction::Sell => {
            let unit_price = quote.current_price;
            let gross = unit_price * qty;
            let tax = round_currency(gross * policy.sell_tax);
            TradeEvaluation {
                tier: request.tier,
                action: TradeAction::Sell,
                unit_price,
                quantity: request.quantity,
                spread_pct: Decimal::ZERO,
                fee: tax,
                total: round_currency(gross) - tax,
                advisory,
            }
        }
    };
    debug!(
        tier = %evaluation.tier,
        action = ?evaluation.action,
        quantity = evaluation.quantity,
        total = %evaluation.total,
        "trade evaluated"
    );
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mine_core::defaults::builtin_catalog;
    use mine_core::PriceHistory;
    use proptest::prelude::*;

    fn coal() -> TierId {
        TierId::new(1).unwrap()
    }

    fn d(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn quote(current: i64, base: i64) -> MarketQuote {
        MarketQuote::new(coal(), d(base), d(current), PriceHistory::from_prices([d(base), d(current)]))
    }

    fn player(balance: i64, mastery: u32, coal_owned: u64) -> PlayerState {
        let mut p = PlayerState {
            balance: d(balance),
            mastery_points: mastery,
            ..Default::default()
        };
        p.materials.insert(coal(), coal_owned);
        p
    }

    fn req(action: TradeAction, quantity: u64) -> TradeRequest {
        TradeRequest {
            tier: coal(),
            action,
            quantity,
            override_safety: false,
        }
    }

    #[test]
    fn buy_five_coal_at_base_spread() {
        let cat = builtin_catalog().unwrap();
        let e = evaluate(&cat, &req(TradeAction::Buy, 5), &quote(1000, 1000), &player(100_000, 0, 0), &TradePolicy::default()).unwrap();
        assert_eq!(e.unit_price, d(1150));
        assert_eq!(e.total, d(5750));
        assert_eq!(e.fee, d(750));
        assert!(!e.advisory.bot_active);
    }

    #[test]
    fn sell_five_coal_pays_tax() {
        let cat = builtin_catalog().unwrap();
        let e = evaluate(&cat, &req(TradeAction::Sell, 5), &quote(1000, 1000), &player(0, 0, 5), &TradePolicy::default()).unwrap();
        assert_eq!(e.unit_price, d(1000));
        assert_eq!(e.fee, d(750));
        assert_eq!(e.total, d(4250));
    }

    #[test]
    fn mastery_buyer_gets_reduced_spread() {
        let cat = builtin_catalog().unwrap();
        let e = evaluate(&cat, &req(TradeAction::Buy, 1), &quote(1000, 1000), &player(100_000, 1500, 0), &TradePolicy::default()).unwrap();
        assert_eq!(e.unit_price, d(1120));
        assert_eq!(e.spread_pct, d(12));
    }

    #[test]
    fn spread_step_boundary() {
        let p = TradePolicy::default();
        assert_eq!(spread_percent(1000, &p), d(12));
        assert_eq!(spread_percent(999, &p), d(15));
    }

    #[test]
    fn sell_tax_ignores_mastery() {
        let cat = builtin_catalog().unwrap();
        let e = evaluate(&cat, &req(TradeAction::Sell, 5), &quote(1000, 1000), &player(0, 5000, 5), &TradePolicy::default()).unwrap();
        assert_eq!(e.fee, d(750));
    }

    #[test]
    fn quantity_out_of_range() {
        let cat = builtin_catalog().unwrap();
        let pol = TradePolicy::default();
        let p = player(100_000, 0, 5);
        assert_eq!(
            evaluate(&cat, &req(TradeAction::Sell, 0), &quote(1000, 1000), &p, &pol),
            Err(EconomyError::QuantityOutOfRange { quantity: 0, max: 5 })
        );
        assert_eq!(
            evaluate(&cat, &req(TradeAction::Sell, 6), &quote(1000, 1000), &p, &pol),
            Err(EconomyError::QuantityOutOfRange { quantity: 6, max: 5 })
        );
        // 1000.00 / 11.50 = 86.9
        assert_eq!(
            evaluate(&cat, &req(TradeAction::Buy, 87), &quote(1000, 1000), &p, &pol),
            Err(EconomyError::QuantityOutOfRange { quantity: 87, max: 86 })
        );
    }

    #[test]
    fn nothing_to_trade_is_out_of_range() {
        let cat = builtin_catalog().unwrap();
        let pol = TradePolicy::default();
        assert_eq!(
            evaluate(&cat, &req(TradeAction::Sell, 1), &quote(1000, 1000), &player(0, 0, 0), &pol),
            Err(EconomyError::QuantityOutOfRange { quantity: 1, max: 0 })
        );
        assert_eq!(
            evaluate(&cat, &req(TradeAction::Buy, 1), &quote(1000, 1000), &player(1000, 0, 0), &pol),
            Err(EconomyError::QuantityOutOfRange { quantity: 1, max: 0 })
        );
    }

    #[test]
    fn suspended_tier_fails_fast() {
        let cat = builtin_catalog().unwrap();
        let mut q = quote(1000, 1000);
        q.suspended = true;
        let p = player(100_000, 0, 5);
        for action in [TradeAction::Buy, TradeAction::Sell] {
            for quantity in [0, 1, 1_000_000] {
                assert_eq!(
                    evaluate(&cat, &req(action, quantity), &q, &p, &TradePolicy::default()),
                    Err(EconomyError::TierSuspended(coal()))
                );
            }
        }
    }

    #[test]
    fn mismatched_quote_is_not_found() {
        let cat = builtin_catalog().unwrap();
        let mut q = quote(1000, 1000);
        q.tier = TierId::new(2).unwrap();
        assert!(matches!(
            evaluate(&cat, &req(TradeAction::Buy, 1), &q, &player(100_000, 0, 0), &TradePolicy::default()),
            Err(EconomyError::NotFound(_))
        ));
    }

    #[test]
    fn bot_active_flag_on_large_deviation() {
        let cat = builtin_catalog().unwrap();
        let e = evaluate(&cat, &req(TradeAction::Buy, 1), &quote(1300, 1000), &player(100_000, 0, 0), &TradePolicy::default()).unwrap();
        assert!(e.advisory.bot_active);
        assert_eq!(e.advisory.deviation, Decimal::new(3000, 4));
    }

    #[test]
    fn adverse_sell_with_trade_bot_needs_confirmation_once() {
        let cat = builtin_catalog().unwrap();
        let pol = TradePolicy::default();
        let mut p = player(0, 0, 10);
        p.items.insert(ItemKind::TradeBot, 1);
        let q = quote(850, 1000);
        let first = evaluate(&cat, &req(TradeAction::Sell, 2), &q, &p, &pol);
        assert_eq!(
            first,
            Err(EconomyError::ConfirmationRequired {
                deviation: Decimal::new(-1500, 4)
            })
        );
        let mut forced = req(TradeAction::Sell, 2);
        forced.override_safety = true;
        let e = evaluate(&cat, &forced, &q, &p, &pol).unwrap();
        assert!(e.advisory.override_applied);
        assert_eq!(e.total, d(1445));
    }

    #[test]
    fn adverse_sell_without_bot_proceeds() {
        let cat = builtin_catalog().unwrap();
        let e = evaluate(&cat, &req(TradeAction::Sell, 2), &quote(850, 1000), &player(0, 0, 10), &TradePolicy::default()).unwrap();
        assert!(!e.advisory.override_applied);
    }

    #[test]
    fn evaluation_json_keeps_two_decimals() {
        let cat = builtin_catalog().unwrap();
        let e = evaluate(&cat, &req(TradeAction::Buy, 5), &quote(1000, 1000), &player(100_000, 0, 0), &TradePolicy::default()).unwrap();
        let s = serde_json::to_string(&e).unwrap();
        assert!(s.contains("\"total\":\"57.50\""), "{s}");
        let back: TradeEvaluation = serde_json::from_str(&s).unwrap();
        assert_eq!(back, e);
    }

    proptest! {
        #[test]
        fn sell_total_identity(price_cents in 1i64..1_000_000, owned in 1u64..10_000, pick_max in any::<bool>()) {
            let cat = builtin_catalog().unwrap();
            let qty = if pick_max { owned } else { 1 };
            let q = quote(price_cents, price_cents);
            let e = evaluate(&cat, &req(TradeAction::Sell, qty), &q, &player(0, 0, owned), &TradePolicy::default()).unwrap();
            let gross = d(price_cents) * Decimal::from(qty);
            let expected = (gross - gross * Decimal::new(15, 2)).round_dp(2);
            let diff = (e.total - expected).abs();
            prop_assert!(diff <= Decimal::new(1, 2));
        }

        #[test]
        fn max_buy_is_affordable(balance_cents in 0i64..10_000_000, price_cents in 1i64..100_000, mastery in 0u32..3000) {
            let pol = TradePolicy::default();
            let p = player(balance_cents, mastery, 0);
            let q = quote(price_cents, price_cents);
            let max = max_quantity(TradeAction::Buy, &q, &p, &pol);
            let unit = buy_unit_price(q.current_price, spread_percent(mastery, &pol));
            prop_assert!(unit * Decimal::from(max) <= p.balance);
            prop_assert!(unit * Decimal::from(max + 1) > p.balance);
        }
    }
}
