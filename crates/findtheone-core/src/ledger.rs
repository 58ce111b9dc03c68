//! Locally cached coin balance.
//!
//! The server owns the balance. The ledger holds a best-effort mirror that is
//! replaced by server responses only; it never does arithmetic of its own.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::backend::Backend;
use crate::lock;
use crate::sequence::{Reload, RequestSequencer};
use crate::Result;

/// Last known coin balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Balance {
    /// No successful fetch yet. Distinct from a true zero balance.
    #[default]
    Unknown,
    /// Balance reported by the server.
    Known(u32),
}

impl Balance {
    /// Returns the coin count, if known.
    #[must_use]
    pub const fn coins(self) -> Option<u32> {
        match self {
            Self::Unknown => None,
            Self::Known(coins) => Some(coins),
        }
    }

    /// Whether the balance is known to cover `cost`.
    #[must_use]
    pub const fn covers(self, cost: u32) -> bool {
        match self {
            Self::Unknown => false,
            Self::Known(coins) => coins >= cost,
        }
    }
}

impl std::fmt::Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Known(coins) => write!(f, "{coins}"),
        }
    }
}

/// Client-side mirror of the viewer's coin balance.
#[derive(Debug)]
pub struct CoinLedger<B> {
    backend: Arc<B>,
    balance: Mutex<Balance>,
    refreshes: RequestSequencer,
}

impl<B: Backend> CoinLedger<B> {
    /// Creates a ledger with an unknown balance.
    #[must_use]
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            balance: Mutex::new(Balance::Unknown),
            refreshes: RequestSequencer::new(),
        }
    }

    /// Returns the last known balance. Never touches the network.
    #[must_use]
    pub fn balance(&self) -> Balance {
        *lock(&self.balance)
    }

    /// Whether the cached balance covers `cost`.
    ///
    /// For UI affordances only; the cache may be stale.
    #[must_use]
    pub fn can_afford(&self, cost: u32) -> bool {
        self.balance().covers(cost)
    }

    /// Fetches the authoritative balance and replaces the cached value.
    ///
    /// On failure the cached value is left untouched, so a balance that was
    /// never fetched stays [`Balance::Unknown`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn refresh_balance(&self) -> Result<Reload> {
        let token = self.refreshes.issue();
        let coins = self.backend.coins().await?;

        let mut balance = lock(&self.balance);
        if !self.refreshes.is_current(token) {
            debug!("Discarding stale balance response ({coins} coins)");
            return Ok(Reload::Superseded);
        }
        *balance = Balance::Known(coins);
        debug!("Coin balance is now {coins}");
        Ok(Reload::Applied { items: 1 })
    }

    /// Applies a balance confirmed by a purchase response.
    ///
    /// Refreshes started earlier may carry a pre-purchase value and are
    /// discarded.
    pub fn record_purchase(&self, new_balance: u32) {
        let mut balance = lock(&self.balance);
        if self.refreshes.is_closed() {
            return;
        }
        self.refreshes.invalidate();
        *balance = Balance::Known(new_balance);
        debug!("Coin balance is now {new_balance} after purchase");
    }

    /// Stops applying responses. Outstanding refreshes are discarded.
    pub fn close(&self) {
        self.refreshes.close();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_balance_helpers() {
        assert_eq!(Balance::Unknown.coins(), None);
        assert!(!Balance::Unknown.covers(0));
        assert!(Balance::Known(1).covers(1));
        assert!(!Balance::Known(0).covers(1));
        assert_eq!(Balance::Known(7).to_string(), "7");
        assert_eq!(Balance::Unknown.to_string(), "unknown");
    }

    #[tokio::test]
    async fn test_refresh_replaces_balance() {
        let backend = Arc::new(MockBackend::new().with_coins(10));
        let ledger = CoinLedger::new(backend.clone());
        assert_eq!(ledger.balance(), Balance::Unknown);
        assert!(!ledger.can_afford(1));

        let reload = ledger.refresh_balance().await.unwrap();
        assert!(reload.is_applied());
        assert_eq!(ledger.balance(), Balance::Known(10));
        assert!(ledger.can_afford(1));
    }

    #[tokio::test]
    async fn test_first_failure_stays_unknown() {
        let backend = Arc::new(MockBackend::new().with_coins(10));
        backend.fail_coins(true);
        let ledger = CoinLedger::new(backend.clone());

        assert!(ledger.refresh_balance().await.is_err());
        assert_eq!(ledger.balance(), Balance::Unknown);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_value() {
        let backend = Arc::new(MockBackend::new().with_coins(4));
        let ledger = CoinLedger::new(backend.clone());
        ledger.refresh_balance().await.unwrap();

        backend.fail_coins(true);
        assert!(ledger.refresh_balance().await.is_err());
        assert_eq!(ledger.balance(), Balance::Known(4));
    }

    #[test]
    fn test_purchase_discards_older_refresh() {
        let backend = Arc::new(MockBackend::new().with_coins(2));
        let gate = backend.gate_coins();
        let ledger = CoinLedger::new(backend.clone());

        let mut refresh = task::spawn(ledger.refresh_balance());
        assert_pending!(refresh.poll());

        ledger.record_purchase(62);
        gate.send(()).unwrap();

        let reload = assert_ready!(refresh.poll()).unwrap();
        assert_eq!(reload, Reload::Superseded);
        assert_eq!(ledger.balance(), Balance::Known(62));
    }

    #[test]
    fn test_purchase_on_another_thread_wins_over_settling_refresh() {
        for _ in 0..200 {
            let backend = Arc::new(MockBackend::new().with_coins(2));
            let gate = backend.gate_coins();
            let ledger = CoinLedger::new(backend.clone());

            let mut refresh = task::spawn(ledger.refresh_balance());
            assert_pending!(refresh.poll());

            std::thread::scope(|s| {
                let purchase = s.spawn(|| ledger.record_purchase(62));
                gate.send(()).unwrap();
                assert_ready!(refresh.poll()).unwrap();
                purchase.join().unwrap();
            });
            assert_eq!(ledger.balance(), Balance::Known(62));
        }
    }

    #[tokio::test]
    async fn test_close_discards_responses() {
        let backend = Arc::new(MockBackend::new().with_coins(3));
        let ledger = CoinLedger::new(backend);
        ledger.close();

        assert_eq!(ledger.refresh_balance().await.unwrap(), Reload::Superseded);
        ledger.record_purchase(9);
        assert_eq!(ledger.balance(), Balance::Unknown);
    }
}
