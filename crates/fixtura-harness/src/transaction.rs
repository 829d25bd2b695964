use std::ops::{Deref, DerefMut};

use tracing::warn;

use fixtura_core::{Gateway, GatewayError};

/// Owns a gateway with an open transaction.
///
/// Dropping the scope rolls the transaction back and closes the gateway,
/// whichever way the owning test exits.
pub struct TransactionScope<G: Gateway> {
    gateway: G,
}

impl<G: Gateway> TransactionScope<G> {
    pub fn begin(mut gateway: G) -> Result<Self, GatewayError> {
        if let Err(err) = gateway.begin_transaction() {
            if let Err(close_err) = gateway.close() {
                warn!(error = %close_err, "closing gateway failed");
            }
            return Err(err);
        }
        Ok(Self { gateway })
    }
}

impl<G: Gateway> Deref for TransactionScope<G> {
    type Target = G;

    fn deref(&self) -> &G {
        &self.gateway
    }
}

impl<G: Gateway> DerefMut for TransactionScope<G> {
    fn deref_mut(&mut self) -> &mut G {
        &mut self.gateway
    }
}

impl<G: Gateway> Drop for TransactionScope<G> {
    fn drop(&mut self) {
        if self.gateway.is_transaction_open()
            && let Err(err) = self.gateway.rollback_transaction()
        {
            warn!(error = %err, "rollback failed");
        }
        if let Err(err) = self.gateway.close() {
            warn!(error = %err, "closing gateway failed");
        }
    }
}
