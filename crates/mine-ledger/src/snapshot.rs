//! JSON save/load of a [`MemoryLedger`].
//!
//! The snapshot carries balances, issued receipts and the market, so nonces
//! stay deduplicated across a restart. Catalog and policies are not saved;
//! they come from configuration on load.

use mine_config::LoadedConfig;
use mine_core::{MarketSnapshot, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::memory::{Account, MemoryLedger};
use crate::{Ledger, LedgerError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub market: MarketSnapshot,
    pub accounts: BTreeMap<UserId, Account>,
    pub next_seq: u64,
}

impl MemoryLedger {
    pub fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        Ok(LedgerSnapshot {
            market: self.market_state()?,
            accounts: self.accounts()?,
            next_seq: self.next_seq(),
        })
    }

    pub fn restore(
        config: LoadedConfig,
        snapshot: LedgerSnapshot,
        seed: u64,
    ) -> Result<Self, LedgerError> {
        let ledger = MemoryLedger::new(config, snapshot.market, seed);
        for (user, account) in snapshot.accounts {
            ledger.insert_account(user, account)?;
        }
        ledger.set_next_seq(snapshot.next_seq);
        Ok(ledger)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), LedgerError> {
        let path = path.as_ref();
        let snap = self.snapshot()?;
        let text = serde_json::to_string_pretty(&snap)?;
        fs::write(path, text).map_err(|e| LedgerError::Io(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), accounts = snap.accounts.len(), "ledger saved");
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(
        path: P,
        config: LoadedConfig,
        seed: u64,
    ) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| LedgerError::Io(format!("{}: {e}", path.display())))?;
        let snap: LedgerSnapshot = serde_json::from_str(&text)?;
        info!(path = %path.display(), accounts = snap.accounts.len(), "ledger loaded");
        Self::restore(config, snap, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::base_market;
    use chrono::NaiveDate;
    use mine_core::{PlayerState, TierId};
    use mine_econ::trade::{evaluate, TradeAction, TradeRequest};
    use mine_econ::{Intent, IntentAction};
    use rust_decimal::Decimal;

    #[test]
    fn snapshot_preserves_receipts_and_balances() {
        let cfg = mine_config::builtin().unwrap();
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let market = base_market(&cfg.catalog, as_of);
        let ledger = MemoryLedger::new(cfg.clone(), market, 1);
        let u = UserId("jo".into());
        let mut state = PlayerState {
            balance: Decimal::new(50, 0),
            ..Default::default()
        };
        let coal = TierId::new(1).unwrap();
        state.materials.insert(coal, 5);
        ledger.open_account(u.clone(), state.clone()).unwrap();

        let req = TradeRequest {
            tier: coal,
            action: TradeAction::Sell,
            quantity: 5,
            override_safety: false,
        };
        let market = ledger.market_state().unwrap();
        let e = evaluate(&cfg.catalog, &req, market.quote(coal).unwrap(), &state, &cfg.trade_policy)
            .unwrap();
        let intent = Intent::new(u.clone(), 9, IntentAction::from_trade(&e));
        let receipt = ledger.commit(&intent).unwrap();
        assert_eq!(receipt.balance_after, Decimal::new(9250, 2));

        let text = serde_json::to_string(&ledger.snapshot().unwrap()).unwrap();
        let snap: LedgerSnapshot = serde_json::from_str(&text).unwrap();
        let restored = MemoryLedger::restore(cfg, snap, 1).unwrap();
        assert_eq!(restored.player_state(&u).unwrap().balance, Decimal::new(9250, 2));
        // Replay after restart still deduplicates.
        assert_eq!(restored.commit(&intent).unwrap(), receipt);
        assert_eq!(restored.next_seq(), ledger.next_seq());
    }

    #[test]
    fn save_and_load_file() {
        let cfg = mine_config::builtin().unwrap();
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let ledger = MemoryLedger::new(cfg.clone(), base_market(&cfg.catalog, as_of), 3);
        ledger
            .open_account(UserId("kay".into()), PlayerState::default())
            .unwrap();
        let path = std::env::temp_dir().join(format!("mine-ledger-{}.json", std::process::id()));
        ledger.save_json(&path).unwrap();
        let loaded = MemoryLedger::load_json(&path, cfg, 3).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.snapshot().unwrap(), ledger.snapshot().unwrap());
    }

    #[test]
    fn missing_file_is_io_error() {
        let cfg = mine_config::builtin().unwrap();
        assert!(matches!(
            MemoryLedger::load_json("/no/such/ledger.json", cfg, 0),
            Err(LedgerError::Io(_))
        ));
    }
}
