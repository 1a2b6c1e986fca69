use crate::config::PaymentConfig;
use crate::domain::money::Money;
use crate::domain::ports::PaymentGateway;
use crate::error::{Result, ShopError};
use async_trait::async_trait;
use rand::Rng;

/// Stand-in for a remote payment provider.
///
/// Every call waits `latency` and is then declined with probability
/// `failure_rate`.
#[derive(Debug, Clone)]
pub struct SimulatedPaymentGateway {
    config: PaymentConfig,
}

impl SimulatedPaymentGateway {
    pub fn new(config: PaymentConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.failure_rate) {
            return Err(ShopError::ValidationError(format!(
                "payment failure rate must be within [0, 1], got {}",
                config.failure_rate
            )));
        }
        Ok(Self { config })
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn make_payment(&self, payer: &str, amount: Money) -> Result<()> {
        tokio::time::sleep(self.config.latency).await;
        let declined = rand::thread_rng().gen_bool(self.config.failure_rate);
        if declined {
            tracing::info!(payer, %amount, "payment declined");
            Err(ShopError::PaymentFailure(format!(
                "payment of {amount} by {payer} was declined"
            )))
        } else {
            tracing::info!(payer, %amount, "payment accepted");
            Ok(())
        }
    }
}
