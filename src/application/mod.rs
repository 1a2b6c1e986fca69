//! Application layer orchestrating the shop's use cases.
//!
//! `StockLedger` owns the stock reservation protocol and `CheckoutCoordinator`
//! drives carts through it, talking to the payment provider in between.

pub mod checkout;
pub mod inventory;
