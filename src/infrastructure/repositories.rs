use crate::domain::cart::{CARTS_TABLE, CartEntry, OWNER_INDEX, PRODUCTS_INDEX};
use crate::domain::product::{ID_INDEX, PRODUCTS_TABLE, Product, ProductId};
use crate::error::Result;
use crate::infrastructure::store::{PendingWrite, TransactionalStore};

/// Typed access to the products table.
///
/// Every product is validated before it is written.
#[derive(Clone)]
pub struct ProductRepository {
    store: TransactionalStore,
}

impl ProductRepository {
    pub fn new(store: TransactionalStore) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: ProductId) -> Result<Product> {
        let result: Result<Product> = self.store.read(PRODUCTS_TABLE, ID_INDEX, id).await;
        match &result {
            Ok(product) => tracing::debug!(id, ?product, "retrieved product"),
            Err(err) => tracing::debug!(id, error = %err, "could not retrieve product"),
        }
        result
    }

    pub async fn all(&self) -> Result<Vec<Product>> {
        self.store.scan(PRODUCTS_TABLE).await
    }

    /// Writes and commits the given products as one batch.
    pub async fn put(&self, products: &[Product]) -> Result<()> {
        products.iter().try_for_each(Product::validate)?;
        let result = self.store.write(PRODUCTS_TABLE, products).await;
        if let Err(err) = &result {
            tracing::debug!(error = %err, "error occurred when setting products");
        }
        result
    }

    /// Writes the given products without committing them.
    pub async fn put_pending(&self, products: &[Product]) -> Result<PendingWrite> {
        products.iter().try_for_each(Product::validate)?;
        let result = self
            .store
            .write_after_external_condition(PRODUCTS_TABLE, products)
            .await;
        if let Err(err) = &result {
            tracing::debug!(error = %err, "error occurred when opening product write");
        }
        result
    }
}

/// Typed access to the carts table.
#[derive(Clone)]
pub struct CartRepository {
    store: TransactionalStore,
}

impl CartRepository {
    pub fn new(store: TransactionalStore) -> Self {
        Self { store }
    }

    pub async fn get(&self, owner: &str) -> Result<CartEntry> {
        let result: Result<CartEntry> = self.store.read(CARTS_TABLE, OWNER_INDEX, owner).await;
        match &result {
            Ok(cart) => tracing::debug!(owner, ?cart, "retrieved cart"),
            Err(err) => tracing::debug!(owner, error = %err, "could not retrieve cart"),
        }
        result
    }

    /// Every cart that currently holds `product`, in owner order.
    pub async fn holding(&self, product: ProductId) -> Result<Vec<CartEntry>> {
        self.store.read_all(CARTS_TABLE, PRODUCTS_INDEX, product).await
    }

    pub async fn save(&self, cart: &CartEntry) -> Result<()> {
        cart.validate()?;
        self.store
            .write(CARTS_TABLE, std::slice::from_ref(cart))
            .await?;
        tracing::debug!(owner = %cart.owner, products = ?cart.products, "updated cart");
        Ok(())
    }

    pub async fn clear(&self, owner: &str) -> Result<()> {
        let removed = self.store.remove(CARTS_TABLE, OWNER_INDEX, owner).await?;
        tracing::debug!(owner, removed, "cleared cart");
        Ok(())
    }
}
