//! Page-context side: the host player and the agent that drives it.

use std::sync::Arc;

use crate::bridge::{ExtensionMessage, PageEnd, PageMessage, SessionId};
use crate::core::resolve_best_quality;

/// Player states reported by the host, see `getPlayerState()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
    Other(i32),
}

impl From<i32> for PlayerState {
    fn from(code: i32) -> Self {
        match code {
            -1 => PlayerState::Unstarted,
            0 => PlayerState::Ended,
            1 => PlayerState::Playing,
            2 => PlayerState::Paused,
            3 => PlayerState::Buffering,
            5 => PlayerState::Cued,
            other => PlayerState::Other(other),
        }
    }
}

/// The host page's native player object
pub trait Player: Send + Sync {
    fn available_quality_levels(&self) -> Vec<String>;

    fn set_playback_quality_range(&self, min: &str, max: &str);

    fn player_state(&self) -> PlayerState;

    fn play_video(&self);
}

/// Looks the player up in the page, like `document.querySelector('#movie_player')`
pub trait PlayerHost: Send + Sync {
    fn find_player(&self) -> Option<Arc<dyn Player>>;
}

pub struct PlayerController<H> {
    host: H,
}

impl<H: PlayerHost> PlayerController<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// Apply the best quality the player offers for `target`.
    ///
    /// `None` means the player is not ready yet and nothing was touched;
    /// otherwise the quality actually applied is returned.
    pub fn apply_quality(&self, target: &str) -> Option<String> {
        let player = self.host.find_player()?;
        let available = player.available_quality_levels();
        let best = resolve_best_quality(target, &available).ok()?;

        player.set_playback_quality_range(&best, &best);

        if player.player_state() == PlayerState::Paused {
            player.play_video();
        }

        tracing::debug!("Applied quality {} (wanted {})", best, target);
        Some(best)
    }
}

/// Answers quality requests coming over the bridge
pub struct PageAgent<H> {
    controller: PlayerController<H>,
    bridge: PageEnd,
    applied: Option<SessionId>,
}

impl<H: PlayerHost> PageAgent<H> {
    pub fn new(host: H, bridge: PageEnd) -> Self {
        Self {
            controller: PlayerController::new(host),
            bridge,
            applied: None,
        }
    }

    /// Handle one request; returns the reply sent, if any
    pub async fn handle(&mut self, msg: ExtensionMessage) -> Option<PageMessage> {
        let ExtensionMessage::Init {
            session,
            channel,
            target,
        } = msg;

        if self.applied == Some(session) {
            return None;
        }

        tracing::trace!(
            "Init for session {} channel {:?} target {}",
            session,
            channel,
            target
        );
        let quality = self.controller.apply_quality(&target)?;
        self.applied = Some(session);

        let reply = PageMessage::QualitySetSuccess { session, quality };
        self.bridge.send(reply.clone()).await;
        Some(reply)
    }

    /// Serve requests until the extension side goes away
    pub async fn run(mut self) {
        while let Some(msg) = self.bridge.recv().await {
            self.handle(msg).await;
        }
        tracing::debug!("Page bridge closed");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Scriptable player that records what was done to it
    #[derive(Default)]
    pub struct FakePlayer {
        pub levels: Vec<String>,
        pub state: i32,
        pub ranges: Mutex<Vec<(String, String)>>,
        pub plays: Mutex<u32>,
    }

    impl FakePlayer {
        pub fn new(levels: &[&str], state: i32) -> Self {
            Self {
                levels: levels.iter().map(|s| s.to_string()).collect(),
                state,
                ..Default::default()
            }
        }
    }

    impl Player for FakePlayer {
        fn available_quality_levels(&self) -> Vec<String> {
            self.levels.clone()
        }

        fn set_playback_quality_range(&self, min: &str, max: &str) {
            self.ranges
                .lock()
                .unwrap()
                .push((min.to_string(), max.to_string()));
        }

        fn player_state(&self) -> PlayerState {
            self.state.into()
        }

        fn play_video(&self) {
            *self.plays.lock().unwrap() += 1;
        }
    }

    /// Host whose player can be mounted later
    #[derive(Default, Clone)]
    pub struct FakeHost {
        pub player: Arc<Mutex<Option<Arc<FakePlayer>>>>,
    }

    impl FakeHost {
        pub fn with_player(player: FakePlayer) -> Self {
            let host = Self::default();
            host.mount(player);
            host
        }

        pub fn mount(&self, player: FakePlayer) -> Arc<FakePlayer> {
            let player = Arc::new(player);
            *self.player.lock().unwrap() = Some(player.clone());
            player
        }

        pub fn current(&self) -> Option<Arc<FakePlayer>> {
            self.player.lock().unwrap().clone()
        }
    }

    impl PlayerHost for FakeHost {
        fn find_player(&self) -> Option<Arc<dyn Player>> {
            self.current().map(|p| p as Arc<dyn Player>)
        }
    }
}
