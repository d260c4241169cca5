use super::models::PushPayload;
use crate::documents::PushSubscription;
use async_trait::async_trait;
use tracing::debug;

/// Push-delivery collaborator.
///
/// The transport (web-push, APNs, ...) lives outside this crate; the
/// scheduler only needs a way to hand a payload to one subscription.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait PushDelivery: Send + Sync {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> anyhow::Result<()>;
}

/// Delivery stub that logs and succeeds, for deployments without a push
/// transport configured.
pub struct NoopPushDelivery;

#[async_trait]
impl PushDelivery for NoopPushDelivery {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> anyhow::Result<()> {
        debug!(
            "push delivery disabled, dropping \"{}\" for {}",
            payload.title, subscription.endpoint
        );
        Ok(())
    }
}
