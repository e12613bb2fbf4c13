//! In-process ledger with one lock per user.

use chrono::NaiveDateTime;
use mine_config::{FeatureFlags, LoadedConfig};
use mine_core::{
    Catalog, EconomyError, MarketQuote, MarketSnapshot, PlayerState, PriceHistory, TierId, UserId,
};
use mine_econ::upgrade::roll_with;
use mine_econ::{Intent, SlotPolicy, TradePolicy};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::apply::{apply, Rules};
use crate::{Ledger, LedgerError, Receipt};

/// Market at catalog base prices with a one-point history.
pub fn base_market(catalog: &Catalog, as_of: NaiveDateTime) -> MarketSnapshot {
    let quotes = catalog
        .resources
        .iter()
        .map(|m| {
            let history = PriceHistory::from_prices([m.base_price]);
            (m.tier, MarketQuote::new(m.tier, m.base_price, m.base_price, history))
        })
        .collect();
    MarketSnapshot { as_of, quotes }
}

/// Balances plus the receipts already issued to one user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub state: PlayerState,
    #[serde(default)]
    pub receipts: BTreeMap<u64, Receipt>,
    pub next_instance: u64,
}

impl Account {
    pub fn new(state: PlayerState) -> Self {
        let next_instance = state.rigs.iter().map(|r| r.instance + 1).max().unwrap_or(1);
        Self {
            state,
            receipts: BTreeMap::new(),
            next_instance,
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, LedgerError> {
    m.lock().map_err(|_| LedgerError::Poisoned)
}

pub struct MemoryLedger {
    catalog: Catalog,
    trade_policy: TradePolicy,
    slot_policy: SlotPolicy,
    features: FeatureFlags,
    market: RwLock<MarketSnapshot>,
    accounts: RwLock<BTreeMap<UserId, Arc<Mutex<Account>>>>,
    rng: Mutex<ChaCha8Rng>,
    seq: AtomicU64,
}

impl MemoryLedger {
    /// Empty ledger. `seed` fixes the upgrade roll sequence.
    pub fn new(config: LoadedConfig, market: MarketSnapshot, seed: u64) -> Self {
        Self {
            catalog: config.catalog,
            trade_policy: config.trade_policy,
            slot_policy: config.slot_policy,
            features: config.features,
            market: RwLock::new(market),
            accounts: RwLock::new(BTreeMap::new()),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            seq: AtomicU64::new(1),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn trade_policy(&self) -> &TradePolicy {
        &self.trade_policy
    }

    pub fn slot_policy(&self) -> &SlotPolicy {
        &self.slot_policy
    }

    pub fn open_account(&self, user: UserId, state: PlayerState) -> Result<(), LedgerError> {
        self.insert_account(user, Account::new(state))
    }

    pub(crate) fn insert_account(&self, user: UserId, account: Account) -> Result<(), LedgerError> {
        let mut accounts = self.accounts.write().map_err(|_| LedgerError::Poisoned)?;
        if accounts.contains_key(&user) {
            return Err(LedgerError::DuplicateUser(user));
        }
        info!(user = %user, "account opened");
        accounts.insert(user, Arc::new(Mutex::new(account)));
        Ok(())
    }

    pub(crate) fn set_next_seq(&self, seq: u64) {
        self.seq.store(seq, Ordering::SeqCst);
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Replace the whole market, as a simulator refresh would.
    pub fn replace_market(&self, snapshot: MarketSnapshot) -> Result<(), LedgerError> {
        let mut market = self.market.write().map_err(|_| LedgerError::Poisoned)?;
        *market = snapshot;
        Ok(())
    }

    /// Feed one simulator price for `tier`.
    pub fn observe_price(&self, tier: TierId, price: Decimal) -> Result<(), LedgerError> {
        let mut market = self.market.write().map_err(|_| LedgerError::Poisoned)?;
        let quote = market
            .quotes
            .get_mut(&tier)
            .ok_or_else(|| EconomyError::NotFound(format!("market quote for tier {tier}")))?;
        quote.observe(price);
        debug!(tier = %tier, price = %price, trend = ?quote.trend, "price observed");
        Ok(())
    }

    /// Open or close trading for `tier`.
    pub fn set_suspended(&self, tier: TierId, suspended: bool) -> Result<(), LedgerError> {
        let mut market = self.market.write().map_err(|_| LedgerError::Poisoned)?;
        let quote = market
            .quotes
            .get_mut(&tier)
            .ok_or_else(|| EconomyError::NotFound(format!("market quote for tier {tier}")))?;
        quote.suspended = suspended;
        warn!(tier = %tier, suspended, "trading status changed");
        Ok(())
    }

    fn account(&self, user: &UserId) -> Result<Arc<Mutex<Account>>, LedgerError> {
        let accounts = self.accounts.read().map_err(|_| LedgerError::Poisoned)?;
        accounts
            .get(user)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownUser(user.clone()))
    }

    pub(crate) fn accounts(&self) -> Result<BTreeMap<UserId, Account>, LedgerError> {
        let accounts = self.accounts.read().map_err(|_| LedgerError::Poisoned)?;
        let mut out = BTreeMap::new();
        for (user, acc) in accounts.iter() {
            out.insert(user.clone(), lock(acc)?.clone());
        }
        Ok(out)
    }

    fn draw(&self) -> Result<Decimal, LedgerError> {
        let mut rng = lock(&self.rng)?;
        Ok(roll_with(&mut *rng))
    }
}

impl Ledger for MemoryLedger {
    fn player_state(&self, user: &UserId) -> Result<PlayerState, LedgerError> {
        let acc = self.account(user)?;
        let guard = lock(&acc)?;
        Ok(guard.state.clone())
    }

    fn market_state(&self) -> Result<MarketSnapshot, LedgerError> {
        let market = self.market.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(market.clone())
    }

    fn commit(&self, intent: &Intent) -> Result<Receipt, LedgerError> {
        self.features.check(&intent.action)?;
        let acc = self.account(&intent.user)?;
        let mut account = lock(&acc)?;
        if let Some(receipt) = account.receipts.get(&intent.nonce) {
            debug!(user = %intent.user, nonce = intent.nonce, "duplicate nonce, replaying receipt");
            return Ok(receipt.clone());
        }

        let market = self.market.read().map_err(|_| LedgerError::Poisoned)?;
        let rules = Rules {
            catalog: &self.catalog,
            trade: &self.trade_policy,
            slots: &self.slot_policy,
            market: &market,
        };
        let mut state = account.state.clone();
        let mut next_instance = account.next_instance;
        let applied = match apply(&rules, &mut state, &mut next_instance, &intent.action, || {
            self.draw()
        }) {
            Ok(a) => a,
            Err(e) => {
                debug!(user = %intent.user, kind = intent.action.kind(), error = %e, "intent rejected");
                return Err(e);
            }
        };
        drop(market);

        let receipt = Receipt {
            user: intent.user.clone(),
            nonce: intent.nonce,
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
            kind: intent.action.kind().to_string(),
            balance_after: state.balance,
            outcome: applied.outcome,
            rig_instance: applied.rig_instance,
        };
        account.state = state;
        account.next_instance = next_instance;
        account.receipts.insert(intent.nonce, receipt.clone());
        info!(
            user = %intent.user,
            nonce = intent.nonce,
            seq = receipt.seq,
            kind = %receipt.kind,
            balance = %receipt.balance_after,
            "intent committed"
        );
        Ok(receipt)
    }
}
