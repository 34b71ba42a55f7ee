//! Conversation persistence seam.

use crate::conversation::{Conversation, PaymentNotification};
use crate::error::StoreError;
use async_trait::async_trait;
use copper_relay_core::{AccountId, ConversationId, RemoteUserId};

/// Trait for conversation storage.
///
/// Counter updates are expressed as operations rather than whole-record
/// writes so implementations can increment in place; two racing updates
/// then cannot lose a count, even though the router itself takes no lock
/// per conversation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Finds the conversation for an (account, remote user) pair.
    async fn find(
        &self,
        account_id: AccountId,
        remote_user: RemoteUserId,
    ) -> Result<Option<Conversation>, StoreError>;

    /// Inserts a new conversation row.
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Increments the message count and refreshes the last-message
    /// timestamp.
    async fn record_message(&self, id: ConversationId) -> Result<(), StoreError>;

    /// Increments the generated-reply count.
    async fn record_ai_response(&self, id: ConversationId) -> Result<(), StoreError>;

    /// Moves the conversation to payment-verification status and sets the
    /// screenshot flag.
    async fn mark_payment_verification(&self, id: ConversationId) -> Result<(), StoreError>;

    /// Inserts a payment notification row.
    async fn create_payment_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: ConversationStore + ?Sized> ConversationStore for std::sync::Arc<T> {
    async fn find(
        &self,
        account_id: AccountId,
        remote_user: RemoteUserId,
    ) -> Result<Option<Conversation>, StoreError> {
        (**self).find(account_id, remote_user).await
    }

    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        (**self).create(conversation).await
    }

    async fn record_message(&self, id: ConversationId) -> Result<(), StoreError> {
        (**self).record_message(id).await
    }

    async fn record_ai_response(&self, id: ConversationId) -> Result<(), StoreError> {
        (**self).record_ai_response(id).await
    }

    async fn mark_payment_verification(&self, id: ConversationId) -> Result<(), StoreError> {
        (**self).mark_payment_verification(id).await
    }

    async fn create_payment_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<(), StoreError> {
        (**self).create_payment_notification(notification).await
    }
}
