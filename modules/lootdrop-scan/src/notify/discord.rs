use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use discord_api::{DiscordApi, MessagePayload};

use super::backend::Notifier;

/// Delivers announcements through the Discord REST API. Threads and
/// channels share the same message endpoint, so the destination id is
/// all the routing this needs.
pub struct DiscordNotifier {
    api: Arc<DiscordApi>,
}

impl DiscordNotifier {
    pub fn new(api: Arc<DiscordApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn deliver(
        &self,
        destination: &str,
        message: &MessagePayload,
        mention: Option<&str>,
    ) -> bool {
        let mut payload = message.clone();
        if let Some(mention) = mention {
            payload.content = Some(mention.to_string());
        }

        match self.api.create_message(destination, &payload).await {
            Ok(_) => true,
            Err(e) => {
                warn!(destination, error = %e, "Announcement delivery failed");
                false
            }
        }
    }
}
