use async_trait::async_trait;

use crate::BoxError;

/// Outbound event bus (Kafka in production).
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), BoxError>;
}
