// Registers the /freegames command tree against the Discord API.
// Bulk overwrite, so re-running after a change is always safe.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use discord_api::{
    types::{OPTION_CHANNEL, OPTION_ROLE, OPTION_STRING, OPTION_SUB_COMMAND},
    CommandChoice, CommandOptionSpec, CommandSpec, DiscordApi,
};
use lootdrop_common::{Config, Locale, Storefront};

#[derive(Parser)]
#[command(about = "Register lootdrop's application commands")]
struct Args {
    /// Print the command payload instead of registering it.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let commands = vec![freegames_command()];

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&commands)?);
        return Ok(());
    }

    let config = Config::from_env();
    let api = DiscordApi::new(
        config.discord_bot_token.clone(),
        config.discord_application_id.clone(),
    );
    api.overwrite_global_commands(&commands).await?;
    Ok(())
}

fn freegames_command() -> CommandSpec {
    let storefront_choices: Vec<CommandChoice> = Storefront::ALL
        .into_iter()
        .map(|sf| CommandChoice {
            name: sf.display_name().to_string(),
            value: sf.as_str().to_string(),
        })
        .collect();
    let locale_choices: Vec<CommandChoice> = Locale::ALL
        .into_iter()
        .map(|locale| CommandChoice {
            name: locale.as_str().to_string(),
            value: locale.as_str().to_string(),
        })
        .collect();

    let storefront_option = |required: bool| CommandOptionSpec {
        kind: OPTION_STRING,
        name: "storefront".to_string(),
        description: "Which storefront".to_string(),
        required,
        choices: storefront_choices.clone(),
        options: Vec::new(),
    };
    let channel_option = |name: &str, description: &str, required: bool| CommandOptionSpec {
        kind: OPTION_CHANNEL,
        name: name.to_string(),
        description: description.to_string(),
        required,
        choices: Vec::new(),
        options: Vec::new(),
    };
    let role_option = CommandOptionSpec {
        kind: OPTION_ROLE,
        name: "role".to_string(),
        description: "Role to mention".to_string(),
        required: true,
        choices: Vec::new(),
        options: Vec::new(),
    };
    let sub = |name: &str, description: &str, options: Vec<CommandOptionSpec>| CommandOptionSpec {
        kind: OPTION_SUB_COMMAND,
        name: name.to_string(),
        description: description.to_string(),
        required: false,
        choices: Vec::new(),
        options,
    };

    CommandSpec {
        name: "freegames".to_string(),
        description: "Free game announcements".to_string(),
        options: vec![
            sub(
                "setup",
                "Start announcing free games in a channel",
                vec![channel_option("channel", "Announcement channel", true)],
            ),
            sub(
                "channel",
                "Change the announcement channel",
                vec![channel_option("channel", "Announcement channel", true)],
            ),
            sub(
                "thread",
                "Set or clear a shared announcement thread",
                vec![channel_option("thread", "Thread to post in", false)],
            ),
            sub(
                "storethread",
                "Set or clear a per-storefront thread",
                vec![
                    storefront_option(true),
                    channel_option("thread", "Thread to post in", false),
                ],
            ),
            sub("watch", "Watch a storefront", vec![storefront_option(true)]),
            sub(
                "unwatch",
                "Stop watching a storefront",
                vec![storefront_option(true)],
            ),
            sub(
                "mention",
                "Mention a role on announcements",
                vec![role_option.clone()],
            ),
            sub(
                "unmention",
                "Stop mentioning a role",
                vec![role_option],
            ),
            sub(
                "locale",
                "Set the announcement language",
                vec![CommandOptionSpec {
                    kind: OPTION_STRING,
                    name: "locale".to_string(),
                    description: "Language".to_string(),
                    required: true,
                    choices: locale_choices,
                    options: Vec::new(),
                }],
            ),
            sub("pause", "Pause announcements", Vec::new()),
            sub("resume", "Resume announcements", Vec::new()),
            sub("status", "Show the current configuration", Vec::new()),
            sub("check", "Check for free games right now", Vec::new()),
        ],
    }
}
