use crate::error::ShopError;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A non-negative monetary value.
///
/// Wraps `rust_decimal::Decimal` so prices and checkout totals can never go
/// below zero and never pick up floating point rounding. Arithmetic is checked
/// and reports overflow as a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, ShopError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ShopError::ValidationError(
                "Amount cannot be negative".to_string(),
            ))
        }
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, ShopError> {
        self.0.checked_add(rhs.0).map(Self).ok_or_else(|| {
            ShopError::ValidationError(format!("amount overflow adding {rhs} to {self}"))
        })
    }

    /// Price of `quantity` units at this unit price.
    pub fn checked_mul(self, quantity: u32) -> Result<Self, ShopError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .ok_or_else(|| {
                ShopError::ValidationError(format!("amount overflow multiplying {self} by {quantity}"))
            })
    }
}

impl From<Money> for Decimal {
    fn from(amount: Money) -> Self {
        amount.0
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::new(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
