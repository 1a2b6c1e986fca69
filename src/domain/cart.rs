use super::product::ProductId;
use super::table::TableSchema;
use crate::error::ShopError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CARTS_TABLE: &str = "carts";
pub const OWNER_INDEX: &str = "id";
pub const PRODUCTS_INDEX: &str = "products";

/// The shopping cart of one owner.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct CartEntry {
    pub owner: String,
    /// Quantity per product, every quantity above zero.
    pub products: BTreeMap<ProductId, u32>,
}

impl CartEntry {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            products: BTreeMap::new(),
        }
    }

    pub fn quantity_of(&self, product: ProductId) -> u32 {
        self.products.get(&product).copied().unwrap_or_default()
    }

    /// Quantity the cart would hold for `product` after adding `quantity`.
    pub fn prospective_quantity(&self, product: ProductId, quantity: u32) -> Result<u32, ShopError> {
        self.quantity_of(product).checked_add(quantity).ok_or_else(|| {
            ShopError::ValidationError(format!("quantity overflow for product {product}"))
        })
    }

    pub fn add(&mut self, product: ProductId, quantity: u32) -> Result<u32, ShopError> {
        if quantity == 0 {
            return Err(ShopError::ValidationError(
                "quantity must be positive".to_string(),
            ));
        }
        let total = self.prospective_quantity(product, quantity)?;
        self.products.insert(product, total);
        Ok(total)
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn validate(&self) -> Result<(), ShopError> {
        if self.owner.trim().is_empty() {
            return Err(ShopError::ValidationError(
                "cart owner cannot be empty".to_string(),
            ));
        }
        if let Some(id) = self.products.iter().find(|(_, q)| **q == 0).map(|(id, _)| id) {
            return Err(ShopError::ValidationError(format!(
                "cart of {} holds zero units of product {id}",
                self.owner
            )));
        }
        Ok(())
    }

    pub fn contents(&self) -> Contents {
        Contents {
            products: self
                .products
                .iter()
                .map(|(id, quantity)| LineItem {
                    id: *id,
                    quantity: *quantity,
                })
                .collect(),
        }
    }
}

/// One product in a cart view.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct LineItem {
    pub id: ProductId,
    pub quantity: u32,
}

/// Caller-facing view of a cart, line items ordered by product id.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct Contents {
    pub products: Vec<LineItem>,
}

impl Contents {
    pub fn quantity_of(&self, product: ProductId) -> Option<u32> {
        self.products
            .iter()
            .find(|item| item.id == product)
            .map(|item| item.quantity)
    }
}

/// Schema of the carts table. The products index is keyed by product id so
/// carts holding a given product can be looked up.
pub fn carts_table() -> TableSchema {
    TableSchema::new(CARTS_TABLE, OWNER_INDEX, "owner").with_index(PRODUCTS_INDEX, "products", false)
}
