use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mine_core::defaults::builtin_catalog;
use mine_core::{MarketQuote, PlayerState, PriceHistory, TierId, UpgradeFamily};
use mine_econ::{evaluate, TradeAction, TradePolicy, TradeRequest};
use rust_decimal::Decimal;

fn bench_evaluate(c: &mut Criterion) {
    let catalog = builtin_catalog().expect("builtin catalog");
    let tier = TierId::new(4).expect("tier");
    let history = PriceHistory::from_prices((0..24).map(|i| Decimal::new(15_000 + i * 10, 2)));
    let quote = MarketQuote::new(tier, Decimal::new(15_000, 2), Decimal::new(15_230, 2), history);
    let mut player = PlayerState {
        balance: Decimal::new(5_000_000, 2),
        mastery_points: 1200,
        ..Default::default()
    };
    player.materials.insert(tier, 500);
    let policy = TradePolicy::default();
    let buy = TradeRequest {
        tier,
        action: TradeAction::Buy,
        quantity: 100,
        override_safety: false,
    };
    let sell = TradeRequest {
        action: TradeAction::Sell,
        ..buy.clone()
    };
    c.bench_function("evaluate buy+sell", |b| {
        b.iter(|| {
            let _ = black_box(evaluate(&catalog, &buy, &quote, &player, &policy));
            let _ = black_box(evaluate(&catalog, &sell, &quote, &player, &policy));
        })
    });
    c.bench_function("upgrade quote rig track", |b| {
        b.iter(|| {
            for level in 1..10 {
                let _ = black_box(mine_econ::upgrade::quote(&catalog, UpgradeFamily::Rig, level));
            }
        })
    });
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
