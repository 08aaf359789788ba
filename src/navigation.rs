//! Soft-navigation detection for a single-page site.
//!
//! Three independent sources feed one stream: the host's custom navigation
//! events, history mutations, and a DOM-mutation catch-all that reports the
//! current location. Host glue owns the source handles and calls them from its
//! own listeners.

use tokio::sync::mpsc;

/// What caused a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Initial document load
    Load,
    /// `yt-navigate-start`
    NavigateStart,
    /// `yt-navigate-finish`
    NavigateFinish,
    PushState,
    ReplaceState,
    DomMutation,
    PreferencesChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub url: String,
    pub trigger: Trigger,
}

#[derive(Debug)]
enum Signal {
    Custom(Trigger),
    History(Trigger, String),
    Location(String),
}

/// Source for the host's custom navigation events, which carry no URL
#[derive(Debug, Clone)]
pub struct CustomEventSource {
    tx: mpsc::UnboundedSender<Signal>,
}

impl CustomEventSource {
    pub fn navigate_start(&self) {
        let _ = self.tx.send(Signal::Custom(Trigger::NavigateStart));
    }

    pub fn navigate_finish(&self) {
        let _ = self.tx.send(Signal::Custom(Trigger::NavigateFinish));
    }
}

/// Source for `pushState` / `replaceState` calls made by the host app
#[derive(Debug, Clone)]
pub struct HistorySource {
    tx: mpsc::UnboundedSender<Signal>,
}

impl HistorySource {
    pub fn push_state(&self, url: impl Into<String>) {
        let _ = self.tx.send(Signal::History(Trigger::PushState, url.into()));
    }

    pub fn replace_state(&self, url: impl Into<String>) {
        let _ = self.tx.send(Signal::History(Trigger::ReplaceState, url.into()));
    }
}

/// Catch-all fed from a subtree mutation observer with the current location
#[derive(Debug, Clone)]
pub struct DomMutationSource {
    tx: mpsc::UnboundedSender<Signal>,
}

impl DomMutationSource {
    pub fn mutated(&self, location: impl Into<String>) {
        let _ = self.tx.send(Signal::Location(location.into()));
    }
}

/// The three source handles handed to host glue
#[derive(Debug, Clone)]
pub struct NavigationSources {
    pub custom: CustomEventSource,
    pub history: HistorySource,
    pub dom: DomMutationSource,
}

/// Merges the sources into a stream of [`Navigation`]s
#[derive(Debug)]
pub struct NavigationWatcher {
    rx: mpsc::UnboundedReceiver<Signal>,
    current_url: String,
}

impl NavigationWatcher {
    pub fn new(initial_url: impl Into<String>) -> (Self, NavigationSources) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sources = NavigationSources {
            custom: CustomEventSource { tx: tx.clone() },
            history: HistorySource { tx: tx.clone() },
            dom: DomMutationSource { tx },
        };
        (
            Self {
                rx,
                current_url: initial_url.into(),
            },
            sources,
        )
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// Next navigation; `None` once every source handle has been dropped.
    ///
    /// DOM mutations only count when the location actually moved.
    pub async fn next(&mut self) -> Option<Navigation> {
        loop {
            let signal = self.rx.recv().await?;
            let (url, trigger) = match signal {
                Signal::Custom(trigger) => (self.current_url.clone(), trigger),
                Signal::History(trigger, url) => (url, trigger),
                Signal::Location(url) if url != self.current_url => (url, Trigger::DomMutation),
                Signal::Location(_) => continue,
            };
            self.current_url.clone_from(&url);
            return Some(Navigation { url, trigger });
        }
    }
}
