use anyhow::{bail, Result};

use discord_api::InteractionData;
use lootdrop_common::{GuildConfig, Locale, Storefront};
use lootdrop_store::ConfigStore;

/// A decoded `/freegames` subcommand. Everything except `Check` is a
/// whole-record read-modify-write of the guild's configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Setup { channel_id: String },
    Channel { channel_id: String },
    Thread { thread_id: Option<String> },
    StoreThread {
        storefront: Storefront,
        thread_id: Option<String>,
    },
    Watch { storefront: Storefront },
    Unwatch { storefront: Storefront },
    Mention { role_id: String },
    Unmention { role_id: String },
    SetLocale { locale: Locale },
    Pause,
    Resume,
    Status,
    Check,
}

impl Command {
    /// Decode an application command payload. Unknown names and
    /// missing options are decode errors; the caller turns them into
    /// an ephemeral reply.
    pub fn parse(data: &InteractionData) -> Result<Command> {
        if data.name != "freegames" {
            bail!("unknown command: {}", data.name);
        }
        let Some(sub) = data.options.first() else {
            bail!("missing subcommand");
        };

        let string_option = |name: &str| -> Result<String> {
            sub.options
                .iter()
                .find(|opt| opt.name == name)
                .and_then(|opt| opt.value_str())
                .map(str::to_owned)
                .ok_or_else(|| anyhow::anyhow!("missing option: {name}"))
        };
        let optional_option = |name: &str| -> Option<String> {
            sub.options
                .iter()
                .find(|opt| opt.name == name)
                .and_then(|opt| opt.value_str())
                .map(str::to_owned)
        };

        let command = match sub.name.as_str() {
            "setup" => Command::Setup {
                channel_id: string_option("channel")?,
            },
            "channel" => Command::Channel {
                channel_id: string_option("channel")?,
            },
            "thread" => Command::Thread {
                thread_id: optional_option("thread"),
            },
            "storethread" => Command::StoreThread {
                storefront: string_option("storefront")?.parse()?,
                thread_id: optional_option("thread"),
            },
            "watch" => Command::Watch {
                storefront: string_option("storefront")?.parse()?,
            },
            "unwatch" => Command::Unwatch {
                storefront: string_option("storefront")?.parse()?,
            },
            "mention" => Command::Mention {
                role_id: string_option("role")?,
            },
            "unmention" => Command::Unmention {
                role_id: string_option("role")?,
            },
            "locale" => Command::SetLocale {
                locale: string_option("locale")?.parse()?,
            },
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "status" => Command::Status,
            "check" => Command::Check,
            other => bail!("unknown subcommand: {other}"),
        };
        Ok(command)
    }
}

/// Apply a configuration command for one guild and produce the reply
/// text. `Check` never reaches this; the interaction layer owns it.
pub async fn apply(
    store: &dyn ConfigStore,
    guild_id: &str,
    command: Command,
) -> Result<String> {
    if let Command::Setup { channel_id } = command {
        let config = match store.get(guild_id).await? {
            Some(mut existing) => {
                existing.channel_id = channel_id;
                existing.enabled = true;
                existing
            }
            None => GuildConfig::new(guild_id, channel_id),
        };
        store.put(&config).await?;
        return Ok(format!(
            "Free game announcements will be posted to <#{}>.",
            config.channel_id
        ));
    }

    // Every other mutation needs an existing subscription.
    let Some(mut config) = store.get(guild_id).await? else {
        return Ok("This server is not set up yet. Run `/freegames setup` first.".to_string());
    };

    let reply = match command {
        // Setup early-returned; Check is owned by the interaction
        // layer (deferred ack + background scan).
        Command::Setup { .. } => unreachable!(),
        Command::Check => return Ok("Scan dispatched.".to_string()),
        Command::Channel { channel_id } => {
            config.channel_id = channel_id;
            format!("Announcement channel changed to <#{}>.", config.channel_id)
        }
        Command::Thread { thread_id: Some(thread_id) } => {
            let reply = format!("Announcements will go to the shared thread <#{thread_id}>.");
            config.thread_id = Some(thread_id);
            reply
        }
        Command::Thread { thread_id: None } => {
            config.thread_id = None;
            "Shared thread cleared; announcements go to the channel.".to_string()
        }
        Command::StoreThread {
            storefront,
            thread_id: Some(thread_id),
        } => {
            let reply = format!(
                "{} announcements will go to <#{thread_id}>.",
                storefront.display_name()
            );
            config.storefront_threads.insert(storefront, thread_id);
            config.per_storefront_threads = true;
            reply
        }
        Command::StoreThread {
            storefront,
            thread_id: None,
        } => {
            config.storefront_threads.remove(&storefront);
            if config.storefront_threads.is_empty() {
                config.per_storefront_threads = false;
            }
            format!(
                "Per-storefront thread for {} cleared.",
                storefront.display_name()
            )
        }
        Command::Watch { storefront } => {
            config.watched.insert(storefront);
            format!("Now watching {}.", storefront.display_name())
        }
        Command::Unwatch { storefront } => {
            config.watched.remove(&storefront);
            format!("No longer watching {}.", storefront.display_name())
        }
        Command::Mention { role_id } => {
            if !config.mention_roles.contains(&role_id) {
                config.mention_roles.push(role_id.clone());
            }
            format!("<@&{role_id}> will be mentioned on announcements.")
        }
        Command::Unmention { role_id } => {
            config.mention_roles.retain(|role| role != &role_id);
            format!("<@&{role_id}> will no longer be mentioned.")
        }
        Command::SetLocale { locale } => {
            config.locale = locale;
            format!("Announcement language set to `{locale}`.")
        }
        Command::Pause => {
            config.enabled = false;
            "Announcements paused.".to_string()
        }
        Command::Resume => {
            config.enabled = true;
            "Announcements resumed.".to_string()
        }
        Command::Status => return Ok(status_text(&config)),
    };

    store.put(&config).await?;
    Ok(reply)
}

fn status_text(config: &GuildConfig) -> String {
    let watched = config
        .watched
        .iter()
        .map(|sf| sf.display_name())
        .collect::<Vec<_>>()
        .join(", ");
    let thread = match &config.thread_id {
        Some(id) => format!("<#{id}>"),
        None => "none".to_string(),
    };
    let store_threads = if config.per_storefront_threads {
        config
            .storefront_threads
            .iter()
            .map(|(sf, id)| format!("{} → <#{id}>", sf.display_name()))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        "off".to_string()
    };
    let mentions = if config.mention_roles.is_empty() {
        "none".to_string()
    } else {
        config
            .mention_roles
            .iter()
            .map(|role| format!("<@&{role}>"))
            .collect::<Vec<_>>()
            .join(" ")
    };

    format!(
        "**Free game announcements**\n\
         Enabled: {}\n\
         Channel: <#{}>\n\
         Shared thread: {}\n\
         Per-storefront threads: {}\n\
         Watching: {}\n\
         Mentions: {}\n\
         Language: `{}`",
        if config.enabled { "yes" } else { "no" },
        config.channel_id,
        thread,
        store_threads,
        watched,
        mentions,
        config.locale
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lootdrop_store::MemoryConfigStore;

    fn subcommand_payload(json: &str) -> InteractionData {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_watch_subcommand() {
        let data = subcommand_payload(
            r#"{
                "name": "freegames",
                "options": [{
                    "name": "watch",
                    "type": 1,
                    "options": [{"name": "storefront", "type": 3, "value": "gog"}]
                }]
            }"#,
        );
        assert_eq!(
            Command::parse(&data).unwrap(),
            Command::Watch {
                storefront: Storefront::Gog
            }
        );
    }

    #[test]
    fn parses_optional_thread_argument() {
        let with = subcommand_payload(
            r#"{
                "name": "freegames",
                "options": [{
                    "name": "thread",
                    "type": 1,
                    "options": [{"name": "thread", "type": 7, "value": "200"}]
                }]
            }"#,
        );
        assert_eq!(
            Command::parse(&with).unwrap(),
            Command::Thread {
                thread_id: Some("200".to_string())
            }
        );

        let without = subcommand_payload(
            r#"{"name": "freegames", "options": [{"name": "thread", "type": 1}]}"#,
        );
        assert_eq!(
            Command::parse(&without).unwrap(),
            Command::Thread { thread_id: None }
        );
    }

    #[test]
    fn rejects_unknown_subcommands_and_storefronts() {
        let unknown = subcommand_payload(
            r#"{"name": "freegames", "options": [{"name": "frobnicate", "type": 1}]}"#,
        );
        assert!(Command::parse(&unknown).is_err());

        let bad_storefront = subcommand_payload(
            r#"{
                "name": "freegames",
                "options": [{
                    "name": "watch",
                    "type": 1,
                    "options": [{"name": "storefront", "type": 3, "value": "itch"}]
                }]
            }"#,
        );
        assert!(Command::parse(&bad_storefront).is_err());
    }

    #[tokio::test]
    async fn setup_creates_and_later_updates_the_record() {
        let store = MemoryConfigStore::new();

        apply(&store, "42", Command::Setup { channel_id: "100".to_string() })
            .await
            .unwrap();
        let config = store.get("42").await.unwrap().unwrap();
        assert_eq!(config.channel_id, "100");
        assert!(config.enabled);

        // Re-running setup moves the channel but keeps the rest.
        apply(&store, "42", Command::Watch { storefront: Storefront::Epic })
            .await
            .unwrap();
        apply(&store, "42", Command::Setup { channel_id: "101".to_string() })
            .await
            .unwrap();
        let config = store.get("42").await.unwrap().unwrap();
        assert_eq!(config.channel_id, "101");
        assert!(config.watched.contains(&Storefront::Epic));
    }

    #[tokio::test]
    async fn mutations_without_setup_are_refused() {
        let store = MemoryConfigStore::new();
        let reply = apply(&store, "42", Command::Pause).await.unwrap();
        assert!(reply.contains("setup"));
        assert!(store.get("42").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn storethread_toggles_the_per_storefront_flag() {
        let store = MemoryConfigStore::new();
        apply(&store, "42", Command::Setup { channel_id: "100".to_string() })
            .await
            .unwrap();

        apply(
            &store,
            "42",
            Command::StoreThread {
                storefront: Storefront::Epic,
                thread_id: Some("300".to_string()),
            },
        )
        .await
        .unwrap();
        let config = store.get("42").await.unwrap().unwrap();
        assert!(config.per_storefront_threads);
        assert_eq!(
            config.storefront_threads.get(&Storefront::Epic),
            Some(&"300".to_string())
        );

        // Clearing the last mapping turns the mode off again.
        apply(
            &store,
            "42",
            Command::StoreThread {
                storefront: Storefront::Epic,
                thread_id: None,
            },
        )
        .await
        .unwrap();
        let config = store.get("42").await.unwrap().unwrap();
        assert!(!config.per_storefront_threads);
        assert!(config.storefront_threads.is_empty());
    }

    #[tokio::test]
    async fn mention_appends_once_and_unmention_removes() {
        let store = MemoryConfigStore::new();
        apply(&store, "42", Command::Setup { channel_id: "100".to_string() })
            .await
            .unwrap();

        for _ in 0..2 {
            apply(&store, "42", Command::Mention { role_id: "111".to_string() })
                .await
                .unwrap();
        }
        apply(&store, "42", Command::Mention { role_id: "222".to_string() })
            .await
            .unwrap();
        let config = store.get("42").await.unwrap().unwrap();
        assert_eq!(config.mention_roles, vec!["111", "222"]);

        apply(&store, "42", Command::Unmention { role_id: "111".to_string() })
            .await
            .unwrap();
        let config = store.get("42").await.unwrap().unwrap();
        assert_eq!(config.mention_roles, vec!["222"]);
    }

    #[tokio::test]
    async fn pause_and_resume_flip_enabled() {
        let store = MemoryConfigStore::new();
        apply(&store, "42", Command::Setup { channel_id: "100".to_string() })
            .await
            .unwrap();

        apply(&store, "42", Command::Pause).await.unwrap();
        assert!(!store.get("42").await.unwrap().unwrap().enabled);

        apply(&store, "42", Command::Resume).await.unwrap();
        assert!(store.get("42").await.unwrap().unwrap().enabled);
    }

    #[tokio::test]
    async fn status_reflects_the_stored_record() {
        let store = MemoryConfigStore::new();
        apply(&store, "42", Command::Setup { channel_id: "100".to_string() })
            .await
            .unwrap();
        apply(&store, "42", Command::SetLocale { locale: Locale::De })
            .await
            .unwrap();

        let status = apply(&store, "42", Command::Status).await.unwrap();
        assert!(status.contains("<#100>"));
        assert!(status.contains("`de`"));
    }
}
