use super::money::Money;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The external payment provider.
///
/// Calls may be slow and may fail for reasons the shop cannot see; a failure
/// is reported as an error and never retried by the caller.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn make_payment(&self, payer: &str, amount: Money) -> Result<()>;
}

pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
