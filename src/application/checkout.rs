use crate::application::inventory::StockLedger;
use crate::domain::cart::{CartEntry, Contents};
use crate::domain::money::Money;
use crate::domain::ports::PaymentGatewayRef;
use crate::domain::product::ProductId;
use crate::error::{AggregateError, Result, ShopError};
use crate::infrastructure::repositories::CartRepository;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Cart operations and the checkout flow.
///
/// Checkout prices the cart, reserves the stock, charges the owner and then
/// tells the reservation whether to commit. The payment call runs with no
/// store or ledger lock held.
pub struct CheckoutCoordinator {
    ledger: Arc<StockLedger>,
    payments: PaymentGatewayRef,
    carts: CartRepository,
}

impl CheckoutCoordinator {
    pub fn new(ledger: Arc<StockLedger>, payments: PaymentGatewayRef, carts: CartRepository) -> Self {
        Self {
            ledger,
            payments,
            carts,
        }
    }

    pub fn ledger(&self) -> &StockLedger {
        &self.ledger
    }

    /// Current contents of the owner's cart.
    pub async fn contents(&self, owner: &str) -> Result<Contents> {
        Ok(self.carts.get(owner).await?.contents())
    }

    /// Adds `quantity` units of a product to the owner's cart.
    ///
    /// Rejected without touching the cart when the product does not have
    /// enough stock for the quantity the cart would end up holding. Adding to
    /// a cart does not take anything out of stock.
    pub async fn add_item(&self, owner: &str, product: ProductId, quantity: u32) -> Result<Contents> {
        if quantity == 0 {
            return Err(ShopError::ValidationError(
                "quantity must be positive".to_string(),
            ));
        }
        let mut cart = match self.carts.get(owner).await {
            Ok(cart) => cart,
            Err(err) if err.is_not_found() => CartEntry::new(owner),
            Err(err) => return Err(err),
        };

        let prospective = cart.prospective_quantity(product, quantity)?;
        if !self.ledger.has_stock(product, prospective).await? {
            return Err(ShopError::InsufficientStock {
                product,
                requested: prospective,
            });
        }

        cart.add(product, quantity)?;
        self.carts.save(&cart).await?;
        Ok(cart.contents())
    }

    /// Checks out the owner's cart.
    ///
    /// On success the cart is cleared and its former contents returned. A
    /// failed payment or a failed reservation finalize leaves the cart as it
    /// was and returns every error that occurred.
    pub async fn checkout(&self, owner: &str) -> Result<Contents> {
        let cart = match self.carts.get(owner).await {
            Ok(cart) if !cart.is_empty() => cart,
            Ok(_) => return Err(ShopError::EmptyCart(owner.to_string())),
            Err(err) if err.is_not_found() => return Err(ShopError::EmptyCart(owner.to_string())),
            Err(err) => return Err(err),
        };

        let cost = self.total_cost(&cart).await?;

        let (decision_tx, decision_rx) = oneshot::channel();
        let (completion_tx, completion_rx) = oneshot::channel();
        self.ledger
            .reserve(&cart.products, decision_rx, completion_tx)
            .await?;

        let mut errors = Vec::new();
        let commit = match self.payments.make_payment(owner, cost).await {
            Ok(()) => true,
            Err(err) => {
                errors.push(err);
                false
            }
        };
        if decision_tx.send(commit).is_err() {
            tracing::warn!(owner, "reservation stopped waiting before the decision was sent");
        }

        match completion_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => errors.push(err),
            Err(_) => errors.push(ShopError::FinalizeFailure(
                "reservation finisher exited without reporting".to_string(),
            )),
        }

        if !errors.is_empty() {
            let err = AggregateError::new(errors);
            tracing::info!(owner, %cost, error = %err, "checkout failed");
            return Err(err.into());
        }

        self.carts.clear(owner).await?;
        tracing::info!(owner, %cost, "checkout completed");
        Ok(cart.contents())
    }

    async fn total_cost(&self, cart: &CartEntry) -> Result<Money> {
        let mut cost = Money::ZERO;
        for (product, quantity) in &cart.products {
            let line = self.ledger.get_price(*product).await?.checked_mul(*quantity)?;
            cost = cost.checked_add(line)?;
        }
        Ok(cost)
    }
}
