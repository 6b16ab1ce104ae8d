use async_trait::async_trait;
use tracing::info;

/// Outbound notification collaborator. Delivery (SMTP or otherwise) lives
/// behind this trait and is best-effort: the event dispatcher logs and
/// swallows failures, they never roll back a lifecycle mutation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_stocking_created_or_updated(
        &self,
        recipients: &[String],
        event_id: i64,
        reservoir_name: &str,
        is_update: bool,
    ) -> anyhow::Result<()>;

    async fn notify_inspector_assigned(
        &self,
        recipient: &str,
        event_id: i64,
        reservoir_name: &str,
    ) -> anyhow::Result<()>;
}

/// Default notifier used when no mail transport is configured: writes the
/// would-be notification to the log and succeeds.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_stocking_created_or_updated(
        &self,
        recipients: &[String],
        event_id: i64,
        reservoir_name: &str,
        is_update: bool,
    ) -> anyhow::Result<()> {
        info!(
            event_id,
            reservoir = reservoir_name,
            recipients = recipients.len(),
            is_update,
            "Stocking notification (log only)"
        );
        Ok(())
    }

    async fn notify_inspector_assigned(
        &self,
        recipient: &str,
        event_id: i64,
        reservoir_name: &str,
    ) -> anyhow::Result<()> {
        info!(
            event_id,
            reservoir = reservoir_name,
            recipient,
            "Inspector assignment notification (log only)"
        );
        Ok(())
    }
}
