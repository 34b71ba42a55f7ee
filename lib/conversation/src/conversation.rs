//! Conversation state records.

use chrono::{DateTime, Utc};
use copper_relay_core::{AccountId, ConversationId, PaymentNotificationId, RemoteUserId, UserId};
use copper_relay_messenger::SenderProfile;
use serde::{Deserialize, Serialize};

/// The status of a conversation.
///
/// The transition into `PendingPayment` is set externally (by an operator
/// workflow); this worker only reads it as a precondition for routing a
/// payment screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// Normal back-and-forth; regular messages get generated replies.
    Active,
    /// An operator has asked the user to pay; the next image is treated as
    /// a payment screenshot.
    PendingPayment,
    /// A screenshot was received and awaits operator verification.
    PaymentVerification,
}

impl ConversationStatus {
    /// Returns the stored string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PendingPayment => "pending_payment",
            Self::PaymentVerification => "payment_verification",
        }
    }

    /// Parses the stored string form, defaulting to active.
    #[must_use]
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "pending_payment" => Self::PendingPayment,
            "payment_verification" => Self::PaymentVerification,
            _ => Self::Active,
        }
    }

    /// Returns true if an inbound image should be routed as a payment
    /// screenshot.
    #[must_use]
    pub fn awaits_payment(&self) -> bool {
        matches!(self, Self::PendingPayment)
    }
}

/// Per-(account, remote user) conversation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier.
    pub id: ConversationId,
    /// The account this conversation belongs to.
    pub account_id: AccountId,
    /// The remote user on the other side.
    pub remote_user: RemoteUserId,
    /// Current status.
    pub status: ConversationStatus,
    /// Number of inbound messages recorded.
    pub message_count: i64,
    /// Number of generated replies sent.
    pub total_ai_responses: i64,
    /// Whether a payment screenshot has been received.
    pub has_payment_screenshot: bool,
    /// Remote user's username, captured at creation.
    pub username: Option<String>,
    /// Remote user's first name, captured at creation.
    pub first_name: Option<String>,
    /// Remote user's last name, captured at creation.
    pub last_name: Option<String>,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
    /// When the last inbound message arrived.
    pub last_message_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates the record for a first-ever inbound message: status active,
    /// message count 1, profile fields captured from the sender.
    #[must_use]
    pub fn new(account_id: AccountId, sender: &SenderProfile) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            account_id,
            remote_user: sender.user_id,
            status: ConversationStatus::Active,
            message_count: 1,
            total_ai_responses: 0,
            has_payment_screenshot: false,
            username: sender.username.clone(),
            first_name: sender.first_name.clone(),
            last_name: sender.last_name.clone(),
            created_at: now,
            last_message_at: now,
        }
    }
}

/// Status of a payment notification.
///
/// This worker only ever creates `Pending` rows; the other states are
/// written by the operator workflow that consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentNotificationStatus {
    /// Awaiting operator review.
    Pending,
    /// Operator confirmed the payment.
    Approved,
    /// Operator rejected the payment.
    Rejected,
}

impl PaymentNotificationStatus {
    /// Returns the stored string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// A payment-verification request for the operator workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    /// Unique identifier.
    pub id: PaymentNotificationId,
    /// The conversation the screenshot arrived in.
    pub conversation_id: ConversationId,
    /// The account that received it.
    pub account_id: AccountId,
    /// The platform user who owns the account.
    pub user_id: UserId,
    /// Current status.
    pub status: PaymentNotificationStatus,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl PaymentNotification {
    /// Creates a pending notification for a received screenshot.
    #[must_use]
    pub fn new(conversation_id: ConversationId, account_id: AccountId, user_id: UserId) -> Self {
        Self {
            id: PaymentNotificationId::new(),
            conversation_id,
            account_id,
            user_id,
            status: PaymentNotificationStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> SenderProfile {
        SenderProfile {
            user_id: RemoteUserId::new(7),
            username: Some("bob".to_string()),
            first_name: Some("Bob".to_string()),
            last_name: Some("Example".to_string()),
        }
    }

    #[test]
    fn new_conversation_captures_sender() {
        let account_id = AccountId::new();
        let conversation = Conversation::new(account_id, &sender());

        assert_eq!(conversation.account_id, account_id);
        assert_eq!(conversation.remote_user, RemoteUserId::new(7));
        assert_eq!(conversation.status, ConversationStatus::Active);
        assert_eq!(conversation.message_count, 1);
        assert_eq!(conversation.total_ai_responses, 0);
        assert!(!conversation.has_payment_screenshot);
        assert_eq!(conversation.username.as_deref(), Some("bob"));
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            ConversationStatus::Active,
            ConversationStatus::PendingPayment,
            ConversationStatus::PaymentVerification,
        ] {
            assert_eq!(ConversationStatus::from_str_value(status.as_str()), status);
        }
        assert_eq!(
            ConversationStatus::from_str_value("unexpected"),
            ConversationStatus::Active
        );
    }

    #[test]
    fn only_pending_payment_awaits_payment() {
        assert!(ConversationStatus::PendingPayment.awaits_payment());
        assert!(!ConversationStatus::Active.awaits_payment());
        assert!(!ConversationStatus::PaymentVerification.awaits_payment());
    }

    #[test]
    fn payment_notification_starts_pending() {
        let notification =
            PaymentNotification::new(ConversationId::new(), AccountId::new(), UserId::new());
        assert_eq!(notification.status, PaymentNotificationStatus::Pending);
    }

    #[test]
    fn conversation_serde_roundtrip() {
        let conversation = Conversation::new(AccountId::new(), &sender());
        let json = serde_json::to_string(&conversation).expect("serialize");
        let parsed: Conversation = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(conversation, parsed);
    }
}
