//! Message channel between the privileged extension side and the page context.
//!
//! The page context owns the player; the extension side owns preferences and
//! network access. They only talk through these two message types.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

const BRIDGE_CAPACITY: usize = 32;

/// Identifies one enforcement session; replies echo it back
pub type SessionId = u64;

/// Extension -> page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ExtensionMessage {
    #[serde(rename = "YOUTUBE_QUALITY_INIT")]
    Init {
        session: SessionId,
        channel: Option<String>,
        target: String,
    },
}

/// Page -> extension
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum PageMessage {
    #[serde(rename = "QUALITY_SET_SUCCESS")]
    QualitySetSuccess { session: SessionId, quality: String },
}

/// Extension side of the bridge
#[derive(Debug)]
pub struct ExtensionEnd {
    tx: mpsc::Sender<ExtensionMessage>,
    rx: mpsc::Receiver<PageMessage>,
}

/// Page side of the bridge
#[derive(Debug)]
pub struct PageEnd {
    tx: mpsc::Sender<PageMessage>,
    rx: mpsc::Receiver<ExtensionMessage>,
}

/// Create a connected pair of bridge ends
pub fn bridge() -> (ExtensionEnd, PageEnd) {
    let (ext_tx, page_rx) = mpsc::channel(BRIDGE_CAPACITY);
    let (page_tx, ext_rx) = mpsc::channel(BRIDGE_CAPACITY);
    (
        ExtensionEnd {
            tx: ext_tx,
            rx: ext_rx,
        },
        PageEnd {
            tx: page_tx,
            rx: page_rx,
        },
    )
}

impl ExtensionEnd {
    /// Returns false once the page side is gone
    pub async fn send(&self, msg: ExtensionMessage) -> bool {
        self.tx.send(msg).await.is_ok()
    }

    pub async fn recv(&mut self) -> Option<PageMessage> {
        self.rx.recv().await
    }

    /// Separate the outgoing and incoming halves
    pub fn split(self) -> (mpsc::Sender<ExtensionMessage>, mpsc::Receiver<PageMessage>) {
        (self.tx, self.rx)
    }
}

impl PageEnd {
    pub async fn send(&self, msg: PageMessage) -> bool {
        self.tx.send(msg).await.is_ok()
    }

    pub async fn recv(&mut self) -> Option<ExtensionMessage> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ExtensionMessage> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let init = ExtensionMessage::Init {
            session: 3,
            channel: Some("chA".to_string()),
            target: "hd720".to_string(),
        };
        let value = serde_json::to_value(&init).unwrap();
        assert_eq!(value["type"], "YOUTUBE_QUALITY_INIT");
        assert_eq!(value["target"], "hd720");

        let success: PageMessage = serde_json::from_str(
            r#"{"type":"QUALITY_SET_SUCCESS","session":3,"quality":"hd720"}"#,
        )
        .unwrap();
        assert_eq!(
            success,
            PageMessage::QualitySetSuccess {
                session: 3,
                quality: "hd720".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_request_response() {
        let (mut ext, mut page) = bridge();
        assert!(
            ext.send(ExtensionMessage::Init {
                session: 1,
                channel: None,
                target: "auto".to_string(),
            })
            .await
        );

        let Some(ExtensionMessage::Init { session, .. }) = page.recv().await else {
            panic!("expected init");
        };
        page.send(PageMessage::QualitySetSuccess {
            session,
            quality: "auto".to_string(),
        })
        .await;

        assert!(matches!(
            ext.recv().await,
            Some(PageMessage::QualitySetSuccess { session: 1, .. })
        ));

        drop(page);
        assert!(ext.recv().await.is_none());
    }
}
