use crate::config::{ReservationPolicy, ShopConfig};
use crate::domain::money::Money;
use crate::domain::product::{Product, ProductId};
use crate::error::{Result, ShopError};
use crate::infrastructure::repositories::ProductRepository;
use crate::infrastructure::store::PendingWrite;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, oneshot};

/// Receiving half of the decision channel: `true` commits, `false` aborts.
pub type DecisionReceiver = oneshot::Receiver<bool>;
/// Sending half of the completion channel, carrying the finalize outcome.
pub type CompletionSender = oneshot::Sender<Result<()>>;

/// Stock and price queries plus the stock reservation protocol.
///
/// A reservation checks availability and writes the decremented stock under
/// an exclusive lock, but leaves the write uncommitted. The slow part (the
/// payment that decides whether the stock is really sold) happens after the
/// lock is released.
pub struct StockLedger {
    products: ProductRepository,
    config: ShopConfig,
    reserve_lock: Mutex<()>,
    product_locks: Mutex<HashMap<ProductId, Arc<Mutex<()>>>>,
}

impl StockLedger {
    pub fn new(products: ProductRepository, config: ShopConfig) -> Self {
        Self {
            products,
            config,
            reserve_lock: Mutex::new(()),
            product_locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_stock(&self, id: ProductId) -> Result<u32> {
        Ok(self.products.get(id).await?.stock)
    }

    pub async fn has_stock(&self, id: ProductId, quantity: u32) -> Result<bool> {
        Ok(self.products.get(id).await?.has_stock(quantity))
    }

    pub async fn get_price(&self, id: ProductId) -> Result<Money> {
        Ok(self.products.get(id).await?.price)
    }

    /// Reserves stock for every item and leaves the decrement uncommitted.
    ///
    /// Fails without writing anything if a product is unknown or short of
    /// stock. The returned [`Reservation`] must be committed or aborted.
    pub async fn begin_reservation(&self, items: &BTreeMap<ProductId, u32>) -> Result<Reservation> {
        if items.is_empty() {
            return Err(ShopError::ValidationError(
                "nothing to reserve".to_string(),
            ));
        }
        if let Some(id) = items.iter().find(|(_, q)| **q == 0).map(|(id, _)| id) {
            return Err(ShopError::ValidationError(format!(
                "cannot reserve zero units of product {id}"
            )));
        }

        let product_guards = match self.config.reservation_policy {
            ReservationPolicy::Optimistic => Vec::new(),
            ReservationPolicy::SerializedPerProduct => self.lock_products(items).await,
        };

        let exclusive = self.reserve_lock.lock().await;
        let mut previous = Vec::with_capacity(items.len());
        let mut reserved = Vec::with_capacity(items.len());
        for (id, quantity) in items {
            let product = self.products.get(*id).await?;
            let mut updated = product.clone();
            updated.decrease_stock(*quantity)?;
            previous.push(product);
            reserved.push(updated);
        }
        let pending = self.products.put_pending(&reserved).await?;
        drop(exclusive);

        tracing::debug!(?items, "stock reserved, awaiting decision");
        Ok(Reservation {
            items: items.clone(),
            previous,
            pending,
            products: self.products.clone(),
            _product_guards: product_guards,
        })
    }

    /// Reserves stock and hands finalization to a background task.
    ///
    /// The task waits for one value on `decision`, commits or aborts the
    /// reservation accordingly and reports the outcome on `completion`. No
    /// decision within the configured timeout, or a dropped decision sender,
    /// aborts the reservation.
    ///
    /// Errors returned here happen before anything is written; the channels
    /// are left unused in that case.
    pub async fn reserve(
        &self,
        items: &BTreeMap<ProductId, u32>,
        decision: DecisionReceiver,
        completion: CompletionSender,
    ) -> Result<()> {
        let reservation = self.begin_reservation(items).await?;
        let timeout = self.config.decision_timeout;
        tokio::spawn(async move {
            let outcome = reservation.finish(decision, timeout).await;
            if completion.send(outcome).is_err() {
                tracing::warn!("reservation outcome dropped, nobody is waiting for it");
            }
        });
        Ok(())
    }

    /// Locks every product in ascending id order.
    async fn lock_products(&self, items: &BTreeMap<ProductId, u32>) -> Vec<OwnedMutexGuard<()>> {
        let locks: Vec<Arc<Mutex<()>>> = {
            let mut registry = self.product_locks.lock().await;
            items
                .keys()
                .map(|id| registry.entry(*id).or_default().clone())
                .collect()
        };
        let mut guards = Vec::with_capacity(locks.len());
        for lock in locks {
            guards.push(lock.lock_owned().await);
        }
        guards
    }
}

/// Stock written but not yet committed.
///
/// Under [`ReservationPolicy::SerializedPerProduct`] it also holds the locks of
/// the reserved products until it is committed or aborted.
pub struct Reservation {
    items: BTreeMap<ProductId, u32>,
    /// Products as they were before the decrement.
    previous: Vec<Product>,
    pending: PendingWrite,
    products: ProductRepository,
    _product_guards: Vec<OwnedMutexGuard<()>>,
}

impl Reservation {
    pub fn items(&self) -> &BTreeMap<ProductId, u32> {
        &self.items
    }

    pub async fn commit(self) -> Result<()> {
        self.pending.commit().await.map_err(|err| {
            ShopError::FinalizeFailure(format!("could not commit reserved stock: {err}"))
        })?;
        tracing::debug!(items = ?self.items, "reservation committed");
        Ok(())
    }

    /// Writes the pre-reservation stock back as a new batch, then aborts the
    /// open write. The abort happens even when the compensating write fails.
    pub async fn abort(self) -> Result<()> {
        let restored = self.products.put(&self.previous).await;
        self.pending.abort();
        match restored {
            Ok(()) => {
                tracing::debug!(items = ?self.items, "reservation aborted, stock restored");
                Ok(())
            }
            Err(err) => Err(ShopError::FinalizeFailure(format!(
                "could not restore reserved stock: {err}"
            ))),
        }
    }

    async fn finish(self, decision: DecisionReceiver, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, decision).await {
            Ok(Ok(true)) => self.commit().await,
            Ok(Ok(false)) => self.abort().await,
            Ok(Err(_)) => {
                tracing::warn!(items = ?self.items, "decision sender dropped, aborting reservation");
                self.abort().await?;
                Err(ShopError::DecisionAbandoned)
            }
            Err(_) => {
                tracing::warn!(items = ?self.items, ?timeout, "no decision in time, aborting reservation");
                self.abort().await?;
                Err(ShopError::DecisionTimeout(timeout))
            }
        }
    }
}
