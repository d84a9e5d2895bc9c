use async_trait::async_trait;

use discord_api::MessagePayload;

/// Delivery boundary for rendered announcements.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message to one destination (channel or thread),
    /// prepending the mention preamble when one is given.
    ///
    /// Never errors past this boundary: transport failures are logged
    /// and reported as `false`. There is no retry here: a recorded
    /// identity whose delivery failed stays undelivered.
    async fn deliver(
        &self,
        destination: &str,
        message: &MessagePayload,
        mention: Option<&str>,
    ) -> bool;
}
