use async_trait::async_trait;

use discord_api::MessagePayload;

use super::backend::Notifier;

/// Always-successful notifier for tests and dry runs.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn deliver(
        &self,
        _destination: &str,
        _message: &MessagePayload,
        _mention: Option<&str>,
    ) -> bool {
        true
    }
}
