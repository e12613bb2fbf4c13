#![deny(warnings)]

//! Headless CLI for inspecting the economy: catalog dump, trade and upgrade
//! quotes, the rig shop, and a scripted ledger session.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDateTime};
use mine_config::LoadedConfig;
use mine_core::{ItemKind, PlayerState, RigId, TierId, UpgradeFamily, UserId};
use mine_econ::trade::{evaluate, TradeAction, TradeRequest};
use mine_econ::upgrade::{quote, resolve, roll};
use mine_econ::{refine, rigs, Intent, IntentAction};
use mine_ledger::{base_market, Ledger, MemoryLedger};
use rust_decimal::Decimal;
use serde_json::json;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: mine-cli [--config FILE] <catalog|trade|upgrade|rigs|session> [options]
  trade   --tier N --action buy|sell --qty Q [--price P] [--balance B] [--holdings H]
          [--mastery M] [--trade-bot] [--confirm]
  upgrade --family rig|pickaxe|helmet|lamp --level L [--seed S]
  rigs    [--balance B]
  session [--seed S] [--save FILE]";

#[derive(Debug, Default)]
struct Args {
    command: Option<String>,
    config: Option<PathBuf>,
    tier: Option<u8>,
    action: Option<String>,
    qty: Option<u64>,
    price: Option<Decimal>,
    balance: Option<Decimal>,
    holdings: Option<u64>,
    mastery: Option<u32>,
    family: Option<String>,
    level: Option<u8>,
    seed: Option<u64>,
    save: Option<PathBuf>,
    trade_bot: bool,
    confirm: bool,
    version: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--tier" => args.tier = it.next().and_then(|s| s.parse().ok()),
            "--action" => args.action = it.next(),
            "--qty" => args.qty = it.next().and_then(|s| s.parse().ok()),
            "--price" => args.price = it.next().and_then(|s| Decimal::from_str(&s).ok()),
            "--balance" => args.balance = it.next().and_then(|s| Decimal::from_str(&s).ok()),
            "--holdings" => args.holdings = it.next().and_then(|s| s.parse().ok()),
            "--mastery" => args.mastery = it.next().and_then(|s| s.parse().ok()),
            "--family" => args.family = it.next(),
            "--level" => args.level = it.next().and_then(|s| s.parse().ok()),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--save" => args.save = it.next().map(PathBuf::from),
            "--trade-bot" => args.trade_bot = true,
            "--confirm" => args.confirm = true,
            "--version" | "-V" => args.version = true,
            other if !other.starts_with('-') && args.command.is_none() => {
                args.command = Some(other.to_string())
            }
            _ => {}
        }
    }
    args
}

fn now() -> NaiveDateTime {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    DateTime::from_timestamp(secs, 0)
        .map(|d| d.naive_utc())
        .unwrap_or_default()
}

fn print(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_family(name: &str) -> Result<UpgradeFamily> {
    serde_json::from_value(json!(name)).map_err(|_| anyhow!("unknown upgrade family {name:?}"))
}

fn cmd_trade(cfg: &LoadedConfig, args: &Args) -> Result<()> {
    let tier = TierId::new(args.tier.context("--tier is required")?)?;
    let action = match args.action.as_deref() {
        Some("buy") => TradeAction::Buy,
        Some("sell") => TradeAction::Sell,
        _ => bail!("--action must be buy or sell"),
    };
    let mut market = base_market(&cfg.catalog, now());
    let quote = market
        .quotes
        .get_mut(&tier)
        .ok_or_else(|| anyhow!("no market quote for tier {tier}"))?;
    if let Some(price) = args.price {
        quote.observe(price);
    }
    let mut player = PlayerState {
        balance: args.balance.unwrap_or_default(),
        mastery_points: args.mastery.unwrap_or(0),
        ..Default::default()
    };
    player.materials.insert(tier, args.holdings.unwrap_or(0));
    if args.trade_bot {
        player.items.insert(ItemKind::TradeBot, 1);
    }
    let request = TradeRequest {
        tier,
        action,
        quantity: args.qty.unwrap_or(0),
        override_safety: args.confirm,
    };
    let evaluation = evaluate(&cfg.catalog, &request, quote, &player, &cfg.trade_policy)?;
    print(&json!({ "quote": quote, "evaluation": evaluation }))
}

fn cmd_upgrade(cfg: &LoadedConfig, args: &Args) -> Result<()> {
    let family = parse_family(args.family.as_deref().context("--family is required")?)?;
    let rule = quote(&cfg.catalog, family, args.level.unwrap_or(1))?;
    let outcome = args.seed.map(|seed| {
        let r = roll(seed);
        json!({ "seed": seed, "roll": r, "outcome": resolve(&rule, r) })
    });
    print(&json!({ "rule": rule, "attempt": outcome }))
}

fn cmd_rigs(cfg: &LoadedConfig, args: &Args) -> Result<()> {
    let player = PlayerState {
        balance: args.balance.unwrap_or_default(),
        ..Default::default()
    };
    print(&json!(rigs::list_available(&cfg.catalog, &player)))
}

/// Scripted session against an in-memory ledger: buy, refine, buy a rig and
/// upgrade it.
fn cmd_session(cfg: LoadedConfig, args: &Args) -> Result<()> {
    let seed = args.seed.unwrap_or(42);
    let market = base_market(&cfg.catalog, now());
    let ledger = MemoryLedger::new(cfg, market, seed);
    let user = UserId("demo".into());
    ledger.open_account(
        user.clone(),
        PlayerState {
            balance: Decimal::new(2_000, 0),
            ..Default::default()
        },
    )?;
    let stone = TierId::new(0)?;
    let copper = TierId::new(2)?;
    let mut receipts = Vec::new();
    let mut nonce = 0;
    let mut commit = |action: IntentAction| -> Result<()> {
        nonce += 1;
        let receipt = ledger.commit(&Intent::new(user.clone(), nonce, action))?;
        receipts.push(receipt);
        Ok(())
    };

    for (tier, qty) in [(stone, 40), (copper, 5)] {
        let state = ledger.player_state(&user)?;
        let market = ledger.market_state()?;
        let request = TradeRequest {
            tier,
            action: TradeAction::Buy,
            quantity: qty,
            override_safety: false,
        };
        let e = evaluate(
            ledger.catalog(),
            &request,
            market.quote(tier)?,
            &state,
            ledger.trade_policy(),
        )?;
        commit(IntentAction::from_trade(&e))?;
    }

    let state = ledger.player_state(&user)?;
    let refined = refine::prepare_refine(ledger.catalog(), &state, TierId::new(1)?, 10)?;
    commit(IntentAction::from_refine(&refined))?;

    let state = ledger.player_state(&user)?;
    let cost = rigs::check_acquire(ledger.catalog(), &state, ledger.slot_policy(), RigId(1))?;
    commit(IntentAction::from_acquire(&cost))?;

    let state = ledger.player_state(&user)?;
    let instance = state
        .rigs
        .first()
        .map(|r| r.instance)
        .context("rig purchase left no rig")?;
    let rule = quote(ledger.catalog(), UpgradeFamily::Rig, 1)?;
    commit(IntentAction::from_upgrade(&rule, Some(instance)))?;

    info!(commits = receipts.len(), "session finished");
    if let Some(path) = &args.save {
        ledger.save_json(path)?;
    }
    print(&json!({
        "receipts": receipts,
        "player": ledger.player_state(&user)?,
    }))
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    if args.version {
        println!(
            "mine-cli {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(command = ?args.command, config = ?args.config, "starting CLI");

    let cfg = mine_config::load_or_builtin(args.config.as_deref())?;
    match args.command.as_deref() {
        Some("catalog") => print(&json!(cfg.catalog)),
        Some("trade") => cmd_trade(&cfg, &args),
        Some("upgrade") => cmd_upgrade(&cfg, &args),
        Some("rigs") => cmd_rigs(&cfg, &args),
        Some("session") => cmd_session(cfg, &args),
        _ => {
            eprintln!("{USAGE}");
            bail!("missing or unknown command")
        }
    }
}
