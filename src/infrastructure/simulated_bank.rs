use crate::domain::gateway::{AuthorizationRequest, DeclineReason, GatewayError, OperationId};
use crate::domain::ports::BankGateway;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const BANK_TX_FAILED: &str = "bank transaction failed";

/// What the simulated bank does with every authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BankBehavior {
    #[default]
    Approve,
    Decline(DeclineReason),
    /// The bank accepts the request but fails to record it.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Authorized,
    Reversed,
    Refunded,
}

/// An in-process bank with the same contract as the HTTP one.
///
/// Operations are remembered so a reversal or refund of an unknown operation
/// answers 404, and of an already settled one answers 409.
#[derive(Clone, Default)]
pub struct SimulatedBank {
    behavior: BankBehavior,
    operations: Arc<RwLock<HashMap<OperationId, OperationState>>>,
}

impl SimulatedBank {
    pub fn new(behavior: BankBehavior) -> Self {
        Self {
            behavior,
            operations: Arc::default(),
        }
    }

    pub async fn state_of(&self, operation_id: &OperationId) -> Option<OperationState> {
        self.operations.read().await.get(operation_id).copied()
    }

    async fn settle(
        &self,
        operation_id: &OperationId,
        next: OperationState,
    ) -> Result<(), GatewayError> {
        let mut operations = self.operations.write().await;
        match operations.get_mut(operation_id) {
            None => Err(GatewayError::rejected(404, "operation not found")),
            Some(state) if *state == OperationState::Authorized => {
                *state = next;
                Ok(())
            }
            Some(state) => Err(GatewayError::rejected(
                409,
                format!("operation already {state:?}").to_lowercase(),
            )),
        }
    }
}

#[async_trait]
impl BankGateway for SimulatedBank {
    async fn authorize(
        &self,
        _request: &AuthorizationRequest,
    ) -> Result<OperationId, GatewayError> {
        match self.behavior {
            BankBehavior::Decline(reason) => Err(GatewayError::rejected(400, reason.message())),
            BankBehavior::Fail => Err(GatewayError::rejected(500, BANK_TX_FAILED)),
            BankBehavior::Approve => {
                let operation_id = OperationId::new(Uuid::new_v4().to_string());
                self.operations
                    .write()
                    .await
                    .insert(operation_id.clone(), OperationState::Authorized);
                Ok(operation_id)
            }
        }
    }

    async fn reverse(&self, operation_id: &OperationId) -> Result<(), GatewayError> {
        self.settle(operation_id, OperationState::Reversed).await
    }

    async fn refund(&self, operation_id: &OperationId) -> Result<(), GatewayError> {
        self.settle(operation_id, OperationState::Refunded).await
    }
}
