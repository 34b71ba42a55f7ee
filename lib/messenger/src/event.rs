//! Inbound update shapes.
//!
//! The network client delivers loosely-typed updates; this module defines
//! the closed set of shapes the rest of the worker operates on. Resolution
//! happens exactly once, at the client boundary, so downstream logic never
//! inspects raw payloads.

use copper_relay_core::RemoteUserId;
use serde::{Deserialize, Serialize};

/// Profile fields of the remote user who sent an update.
///
/// Captured from the update itself at the client boundary; the network is
/// never queried separately for profile data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderProfile {
    /// The network's numeric id for the sender.
    pub user_id: RemoteUserId,
    /// Sender's username, if set.
    pub username: Option<String>,
    /// Sender's first name, if set.
    pub first_name: Option<String>,
    /// Sender's last name, if set.
    pub last_name: Option<String>,
}

impl SenderProfile {
    /// Creates a profile with only the numeric id set.
    #[must_use]
    pub fn bare(user_id: RemoteUserId) -> Self {
        Self {
            user_id,
            username: None,
            first_name: None,
            last_name: None,
        }
    }
}

/// An inbound update, resolved to one of the shapes the router handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundUpdate {
    /// A plain text message from a private one-to-one chat.
    Text {
        /// Who sent it.
        sender: SenderProfile,
        /// The message text.
        text: String,
    },
    /// A message carrying image media from a private one-to-one chat.
    Image {
        /// Who sent it.
        sender: SenderProfile,
        /// Optional caption attached to the image.
        caption: Option<String>,
    },
    /// Anything else: group/channel traffic, service messages, media the
    /// worker does not handle. Produces no state change downstream.
    Ignored,
}

impl InboundUpdate {
    /// Returns the sender profile, if this update carries one.
    #[must_use]
    pub fn sender(&self) -> Option<&SenderProfile> {
        match self {
            Self::Text { sender, .. } | Self::Image { sender, .. } => Some(sender),
            Self::Ignored => None,
        }
    }

    /// Returns true if this update carries image media.
    #[must_use]
    pub fn has_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }

    /// Returns the textual content of the update: the message text, or the
    /// image caption, or the empty string.
    #[must_use]
    pub fn text_content(&self) -> &str {
        match self {
            Self::Text { text, .. } => text,
            Self::Image { caption, .. } => caption.as_deref().unwrap_or(""),
            Self::Ignored => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> SenderProfile {
        SenderProfile {
            user_id: RemoteUserId::new(42),
            username: Some("alice".to_string()),
            first_name: Some("Alice".to_string()),
            last_name: None,
        }
    }

    #[test]
    fn text_update_content() {
        let update = InboundUpdate::Text {
            sender: sender(),
            text: "hello".to_string(),
        };
        assert_eq!(update.text_content(), "hello");
        assert!(!update.has_image());
        assert_eq!(update.sender().unwrap().user_id, RemoteUserId::new(42));
    }

    #[test]
    fn image_update_caption_fallback() {
        let with_caption = InboundUpdate::Image {
            sender: sender(),
            caption: Some("receipt".to_string()),
        };
        assert_eq!(with_caption.text_content(), "receipt");
        assert!(with_caption.has_image());

        let without_caption = InboundUpdate::Image {
            sender: sender(),
            caption: None,
        };
        assert_eq!(without_caption.text_content(), "");
    }

    #[test]
    fn ignored_update_has_no_sender() {
        assert!(InboundUpdate::Ignored.sender().is_none());
        assert_eq!(InboundUpdate::Ignored.text_content(), "");
    }

    #[test]
    fn update_serde_roundtrip() {
        let update = InboundUpdate::Image {
            sender: sender(),
            caption: Some("receipt".to_string()),
        };
        let json = serde_json::to_string(&update).expect("serialize");
        let parsed: InboundUpdate = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(update, parsed);
    }
}
