//! Coin package catalogue and purchases.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use findtheone_api::{CoinPackage, PurchaseReceipt};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::Error;
use crate::ledger::CoinLedger;
use crate::lock;
use crate::Result;

/// Clears the in-progress flag when a purchase ends.
struct PurchaseGuard<'a>(&'a AtomicBool);

impl Drop for PurchaseGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The "buy coins" screen.
#[derive(Debug)]
pub struct CoinStore<B> {
    backend: Arc<B>,
    packages: Mutex<Vec<CoinPackage>>,
    purchasing: AtomicBool,
}

impl<B: Backend> CoinStore<B> {
    /// Creates a store with an empty catalogue.
    #[must_use]
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            packages: Mutex::new(Vec::new()),
            purchasing: AtomicBool::new(false),
        }
    }

    /// Fetches the catalogue, smallest package first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn load_packages(&self) -> Result<Vec<CoinPackage>> {
        let mut packages = self.backend.packages().await?;
        packages.sort_by(|a, b| a.coins.cmp(&b.coins).then_with(|| a.id.cmp(&b.id)));
        debug!("Loaded {} coin packages", packages.len());
        lock(&self.packages).clone_from(&packages);
        Ok(packages)
    }

    /// The last loaded catalogue.
    #[must_use]
    pub fn packages(&self) -> Vec<CoinPackage> {
        lock(&self.packages).clone()
    }

    /// Looks up a loaded package by id.
    #[must_use]
    pub fn package(&self, id: &str) -> Option<CoinPackage> {
        lock(&self.packages).iter().find(|p| p.id == id).cloned()
    }

    /// Whether a purchase is in flight.
    #[must_use]
    pub fn is_purchasing(&self) -> bool {
        self.purchasing.load(Ordering::Acquire)
    }

    /// Buys a package and applies the resulting balance to `ledger`.
    ///
    /// The receipt's balance is applied as is. If the server omits it, the
    /// ledger is refreshed instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PurchaseInProgress`] if another purchase is pending,
    /// [`Error::PurchaseDeclined`] if the server reports no success, or an
    /// error if the request fails.
    pub async fn purchase(&self, package_id: &str, ledger: &CoinLedger<B>) -> Result<PurchaseReceipt> {
        if self.purchasing.swap(true, Ordering::AcqRel) {
            return Err(Error::PurchaseInProgress);
        }
        let _guard = PurchaseGuard(&self.purchasing);

        let receipt = self.backend.purchase(package_id).await?;
        if !receipt.success {
            return Err(Error::PurchaseDeclined(receipt.message));
        }

        match receipt.new_coin_balance {
            Some(balance) => ledger.record_purchase(balance),
            None => {
                if let Err(e) = ledger.refresh_balance().await {
                    warn!("Failed to refresh coin balance after purchase: {e}");
                }
            }
        }
        info!("Purchased package {package_id}, balance {}", ledger.balance());
        Ok(receipt)
    }
}
