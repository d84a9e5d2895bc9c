use lootdrop_common::{GuildConfig, Storefront};

/// Resolve the destination a storefront's announcements go to for one
/// guild. Pure precedence, first match wins:
///
/// 1. the storefront's own thread, when per-storefront threading is on
///    and one is configured for this storefront;
/// 2. the shared thread, when set;
/// 3. the primary channel.
///
/// `channel_id` is mandatory on every config, so a promotion can never
/// be dropped for lack of a destination.
pub fn route(config: &GuildConfig, storefront: Storefront) -> &str {
    if config.per_storefront_threads {
        if let Some(thread) = config.storefront_threads.get(&storefront) {
            return thread;
        }
    }
    if let Some(thread) = config.thread_id.as_deref() {
        return thread;
    }
    &config.channel_id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> GuildConfig {
        let mut config = GuildConfig::new("42", "chan-primary");
        config.thread_id = Some("thread-shared".to_string());
        config.per_storefront_threads = true;
        config
            .storefront_threads
            .insert(Storefront::Epic, "thread-epic".to_string());
        config
    }

    #[test]
    fn per_storefront_thread_wins() {
        let config = full_config();
        assert_eq!(route(&config, Storefront::Epic), "thread-epic");
    }

    #[test]
    fn unconfigured_storefront_falls_back_to_shared_thread() {
        let config = full_config();
        assert_eq!(route(&config, Storefront::Steam), "thread-shared");
    }

    #[test]
    fn per_storefront_mapping_is_ignored_while_disabled() {
        let mut config = full_config();
        config.per_storefront_threads = false;
        assert_eq!(route(&config, Storefront::Epic), "thread-shared");
    }

    #[test]
    fn shared_thread_falls_back_to_primary() {
        let mut config = full_config();
        config.thread_id = None;
        assert_eq!(route(&config, Storefront::Steam), "chan-primary");
    }

    #[test]
    fn primary_only_config_routes_everything_there() {
        let config = GuildConfig::new("42", "chan-primary");
        for sf in Storefront::ALL {
            assert_eq!(route(&config, sf), "chan-primary");
        }
    }

    #[test]
    fn route_is_deterministic() {
        let config = full_config();
        assert_eq!(
            route(&config, Storefront::Gog),
            route(&config, Storefront::Gog)
        );
    }
}
