pub mod bridge;
pub mod config;
pub mod core;
mod download;
pub mod enforcer;
pub mod error;
pub mod navigation;
pub mod notify;
pub mod player;
pub mod store;
pub mod youtube;

pub use bridge::{ExtensionEnd, ExtensionMessage, PageEnd, PageMessage, bridge};
pub use config::{Config, EnforcerConfig};
pub use crate::core::{Quality, resolve_best_quality};
pub use enforcer::{Enforcer, Session, SessionState};
use error::Result;
pub use navigation::{NavigationSources, NavigationWatcher};
pub use notify::{LogNotifier, Notifier};
pub use player::{PageAgent, Player, PlayerController, PlayerHost, PlayerState};
pub use store::{FileStore, MemoryStore, PreferenceStore, Preferences, StorageArea};
pub use youtube::{ChannelResolver, HttpChannelResolver};

/// Quality that would be enforced on `page_url` right now
pub async fn target_quality<S, C>(store: &S, channels: &C, page_url: &str) -> Result<String>
where
    S: PreferenceStore + ?Sized,
    C: ChannelResolver + ?Sized,
{
    let prefs = store.get().await?;
    let channel = channels.resolve_channel(page_url).await;
    Ok(prefs.target_for(channel.as_deref()).to_string())
}

/// Wire both sides together and run until the navigation sources are dropped
pub async fn run<S, C, N, H>(
    store: std::sync::Arc<S>,
    channels: C,
    notifier: N,
    host: H,
    watcher: NavigationWatcher,
    config: EnforcerConfig,
) where
    S: PreferenceStore + 'static,
    C: ChannelResolver + 'static,
    N: Notifier + 'static,
    H: PlayerHost + 'static,
{
    let (ext, page) = bridge();
    let agent = tokio::spawn(PageAgent::new(host, page).run());
    Enforcer::new(store, channels, notifier, ext, config)
        .run(watcher)
        .await;
    // enforcer dropped its end, so the agent winds down
    if let Err(e) = agent.await {
        tracing::warn!("Page agent ended abnormally: {}", e);
    }
}
