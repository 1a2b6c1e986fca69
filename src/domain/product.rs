use super::money::Money;
use super::table::TableSchema;
use crate::error::ShopError;
use serde::{Deserialize, Serialize};

pub type ProductId = u64;

pub const PRODUCTS_TABLE: &str = "products";
pub const ID_INDEX: &str = "id";
pub const NAME_INDEX: &str = "name";
pub const STOCK_INDEX: &str = "stock";

/// A product on sale and the quantity of it left in stock.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    /// Units left. Unsigned, so a reservation can never push it below zero.
    pub stock: u32,
}

impl Product {
    pub fn new(id: ProductId, name: &str, price: Money, stock: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            price,
            stock,
        }
    }

    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }

    /// Removes `quantity` units if enough are left.
    pub fn decrease_stock(&mut self, quantity: u32) -> Result<(), ShopError> {
        if self.has_stock(quantity) {
            self.stock -= quantity;
            Ok(())
        } else {
            Err(ShopError::InsufficientStock {
                product: self.id,
                requested: quantity,
            })
        }
    }

    pub fn validate(&self) -> Result<(), ShopError> {
        let mut problems = Vec::new();
        if self.id == 0 {
            problems.push("product ID cannot be 0");
        }
        if self.name.trim().is_empty() {
            problems.push("name is mandatory");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ShopError::ValidationError(problems.join(", ")))
        }
    }
}

/// Schema of the products table.
pub fn products_table() -> TableSchema {
    TableSchema::new(PRODUCTS_TABLE, ID_INDEX, "id")
        .with_index(NAME_INDEX, "name", false)
        .with_index(STOCK_INDEX, "stock", false)
}
