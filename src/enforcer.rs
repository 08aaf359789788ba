//! Extension-side enforcement loop.
//!
//! Every navigation opens a new [`Session`] with a fresh id. Timers, channel
//! lookups and page replies carry the id they were issued for and are dropped
//! when it no longer matches the live session, so nothing has to be cancelled.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Duration, Instant};

use crate::bridge::{ExtensionEnd, ExtensionMessage, PageMessage, SessionId};
use crate::config::EnforcerConfig;
use crate::navigation::{Navigation, NavigationWatcher, Trigger};
use crate::notify::{Cooldown, Notifier};
use crate::store::{PreferenceKey, PreferenceStore, Preferences, StorageArea, StorageChange};
use crate::youtube::{ChannelResolver, is_watch_page};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the debounce to elapse
    Idle,
    Attempting,
    Applied,
    /// Out of attempts without a success; silent
    Exhausted,
}

/// One page view's attempt to apply a quality
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub url: String,
    pub attempts_used: u32,
    pub state: SessionState,
}

/// Deferred work posted back into the loop
#[derive(Debug, Clone, PartialEq, Eq)]
enum Tick {
    Start(SessionId),
    Retry(SessionId),
    /// Channel lookup finished for a session's attempt
    Resolved {
        session: SessionId,
        channel: Option<String>,
        target: String,
    },
}

pub struct Enforcer<S, C, N> {
    store: Arc<S>,
    channels: Arc<C>,
    notifier: N,
    config: EnforcerConfig,
    outbox: mpsc::Sender<ExtensionMessage>,
    inbox: Option<mpsc::Receiver<PageMessage>>,
    changes: Option<broadcast::Receiver<StorageChange>>,
    ticks_tx: mpsc::UnboundedSender<Tick>,
    ticks_rx: Option<mpsc::UnboundedReceiver<Tick>>,
    session: Option<Session>,
    next_id: SessionId,
    current_url: String,
    cooldown: Cooldown,
}

impl<S, C, N> Enforcer<S, C, N>
where
    S: PreferenceStore + 'static,
    C: ChannelResolver + 'static,
    N: Notifier,
{
    pub fn new(
        store: Arc<S>,
        channels: C,
        notifier: N,
        bridge: ExtensionEnd,
        config: EnforcerConfig,
    ) -> Self {
        let (outbox, inbox) = bridge.split();
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();
        let changes = store.subscribe();
        let cooldown = Cooldown::new(config.notification_cooldown());
        Self {
            store,
            channels: Arc::new(channels),
            notifier,
            config,
            outbox,
            inbox: Some(inbox),
            changes: Some(changes),
            ticks_tx,
            ticks_rx: Some(ticks_rx),
            session: None,
            next_id: 0,
            current_url: String::new(),
            cooldown,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Drop whatever session is live and start over on `url`.
    pub fn navigate(&mut self, url: &str, trigger: Trigger) {
        self.next_id += 1;
        self.current_url = url.to_string();
        self.session = Some(Session {
            id: self.next_id,
            url: url.to_string(),
            attempts_used: 0,
            state: SessionState::Idle,
        });

        let delay = match trigger {
            Trigger::Load | Trigger::PreferencesChanged => Duration::ZERO,
            _ => self.config.navigation_debounce(),
        };
        tracing::debug!(
            "Session {} for {} ({:?}), first attempt in {:?}",
            self.next_id,
            url,
            trigger,
            delay
        );
        self.schedule(Tick::Start(self.next_id), delay);
    }

    fn schedule(&self, tick: Tick, delay: Duration) {
        let tx = self.ticks_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // receiver gone means the loop has ended
            let _ = tx.send(tick);
        });
    }

    fn live_session(&mut self, id: SessionId) -> Option<&mut Session> {
        self.session.as_mut().filter(|s| s.id == id)
    }

    async fn on_tick(&mut self, tick: Tick) {
        let max_attempts = self.config.max_attempts;
        match tick {
            Tick::Start(id) => {
                let Some(session) = self.live_session(id) else {
                    return;
                };
                if session.state != SessionState::Idle {
                    return;
                }
                if !is_watch_page(&session.url) {
                    tracing::trace!("{} is not a video page", session.url);
                    return;
                }
                session.state = SessionState::Attempting;
                self.attempt();
            }
            Tick::Retry(id) => {
                let Some(session) = self.live_session(id) else {
                    return;
                };
                if session.state != SessionState::Attempting {
                    return;
                }
                if session.attempts_used < max_attempts {
                    self.attempt();
                } else {
                    session.state = SessionState::Exhausted;
                    tracing::debug!(
                        "Session {} gave up after {} attempts",
                        session.id,
                        session.attempts_used
                    );
                }
            }
            Tick::Resolved {
                session,
                channel,
                target,
            } => self.send_init(session, channel, target).await,
        }
    }

    /// Look up preferences and channel off the loop; the result comes back as
    /// [`Tick::Resolved`].
    fn attempt(&self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let id = session.id;
        let url = session.url.clone();
        let store = Arc::clone(&self.store);
        let channels = Arc::clone(&self.channels);
        let tx = self.ticks_tx.clone();

        tokio::spawn(async move {
            let prefs = match store.get().await {
                Ok(prefs) => prefs,
                Err(e) => {
                    tracing::warn!("Failed to read preferences, using defaults: {}", e);
                    Preferences::default()
                }
            };
            let channel = channels.resolve_channel(&url).await;
            let target = prefs.target_for(channel.as_deref()).to_string();
            let _ = tx.send(Tick::Resolved {
                session: id,
                channel,
                target,
            });
        });
    }

    async fn send_init(&mut self, id: SessionId, channel: Option<String>, target: String) {
        let Some(session) = self.live_session(id) else {
            tracing::debug!("Dropping channel lookup of stale session {}", id);
            return;
        };
        if session.state != SessionState::Attempting {
            return;
        }
        session.attempts_used += 1;
        let attempt = session.attempts_used;
        tracing::debug!(
            "Session {} attempt {}/{}: channel {:?}, target {}",
            id,
            attempt,
            self.config.max_attempts,
            channel,
            target
        );

        let init = ExtensionMessage::Init {
            session: id,
            channel,
            target,
        };
        if self.outbox.send(init).await.is_err() {
            tracing::debug!("Page bridge closed");
        }
        self.schedule(Tick::Retry(id), self.config.retry_interval());
    }

    fn on_page_message(&mut self, msg: PageMessage, now: Instant) {
        let PageMessage::QualitySetSuccess { session, quality } = msg;

        let Some(live) = self.live_session(session) else {
            tracing::debug!("Ignoring success from stale session {}", session);
            return;
        };
        if live.state != SessionState::Attempting {
            return;
        }
        live.state = SessionState::Applied;

        if self.cooldown.try_fire(now) {
            self.notifier.notify(&quality);
        }
    }

    fn on_storage_change(&mut self, change: StorageChange) {
        if change.area != StorageArea::Sync {
            return;
        }
        if change.touches(PreferenceKey::DefaultQuality)
            || change.touches(PreferenceKey::ChannelQualities)
        {
            let url = self.current_url.clone();
            self.navigate(&url, Trigger::PreferencesChanged);
        }
    }

    /// Drive the loop until the navigation sources are gone.
    pub async fn run(mut self, mut watcher: NavigationWatcher) {
        let (Some(mut inbox), Some(mut changes), Some(mut ticks)) =
            (self.inbox.take(), self.changes.take(), self.ticks_rx.take())
        else {
            return;
        };

        let initial = watcher.current_url().to_string();
        self.navigate(&initial, Trigger::Load);
        let mut changes_open = true;

        loop {
            tokio::select! {
                nav = watcher.next() => match nav {
                    Some(Navigation { url, trigger }) => self.navigate(&url, trigger),
                    None => break,
                },
                Some(msg) = inbox.recv() => self.on_page_message(msg, Instant::now()),
                Some(tick) = ticks.recv() => self.on_tick(tick).await,
                change = changes.recv(), if changes_open => match change {
                    Ok(change) => self.on_storage_change(change),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Missed {} preference changes", n);
                        let url = self.current_url.clone();
                        self.navigate(&url, Trigger::PreferencesChanged);
                    }
                    Err(broadcast::error::RecvError::Closed) => changes_open = false,
                },
            }
        }
        tracing::debug!("Navigation sources closed, enforcer stopped");
    }
}
