pub mod error;
pub mod types;

pub use error::{DiscordError, Result};
pub use types::{
    CommandChoice, CommandOptionSpec, CommandSpec, CreatedMessage, Embed, EmbedField, EmbedFooter,
    EmbedImage, Interaction, InteractionData, InteractionOption, InteractionResponse,
    MessagePayload,
};

const BASE_URL: &str = "https://discord.com/api/v10";

pub struct DiscordApi {
    client: reqwest::Client,
    bot_token: String,
    application_id: String,
}

impl DiscordApi {
    pub fn new(bot_token: String, application_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token,
            application_id,
        }
    }

    /// Post a message to a channel or thread. Threads share the channel
    /// message endpoint; the destination id decides where it lands.
    pub async fn create_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<CreatedMessage> {
        let url = format!("{BASE_URL}/channels/{channel_id}/messages");
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiscordError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }

    /// Edit the original response of an acknowledged interaction.
    /// Valid for 15 minutes after the interaction token was issued.
    pub async fn edit_original_response(
        &self,
        interaction_token: &str,
        payload: &MessagePayload,
    ) -> Result<()> {
        let url = format!(
            "{BASE_URL}/webhooks/{}/{interaction_token}/messages/@original",
            self.application_id
        );
        let resp = self.client.patch(&url).json(payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiscordError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(())
    }

    /// Bulk-overwrite the application's global command set. Idempotent:
    /// the supplied list fully replaces whatever was registered before.
    pub async fn overwrite_global_commands(&self, commands: &[CommandSpec]) -> Result<()> {
        let url = format!("{BASE_URL}/applications/{}/commands", self.application_id);
        let resp = self
            .client
            .put(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(commands)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiscordError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        tracing::info!(count = commands.len(), "Global commands registered");
        Ok(())
    }
}
