//! Conversation and payment-notification repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use copper_relay_conversation::{
    Conversation, ConversationStatus, ConversationStore, PaymentNotification, StoreError,
};
use copper_relay_core::{AccountId, ConversationId, RemoteUserId};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

fn query_error(e: sqlx::Error) -> StoreError {
    StoreError::QueryFailed {
        reason: e.to_string(),
    }
}

fn record_error(reason: impl Into<String>) -> StoreError {
    StoreError::InvalidRecord {
        reason: reason.into(),
    }
}

/// Row type for conversation queries.
#[derive(FromRow)]
struct ConversationRow {
    id: String,
    account_id: String,
    remote_user_id: i64,
    status: String,
    message_count: i64,
    total_ai_responses: i64,
    has_payment_screenshot: bool,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: DateTime<Utc>,
    last_message_at: DateTime<Utc>,
}

impl ConversationRow {
    fn try_into_conversation(self) -> Result<Conversation, StoreError> {
        let id = ConversationId::from_str(&self.id)
            .map_err(|e| record_error(format!("invalid conversation id '{}': {}", self.id, e)))?;
        let account_id = AccountId::from_str(&self.account_id).map_err(|e| {
            record_error(format!("invalid account id '{}': {}", self.account_id, e))
        })?;

        Ok(Conversation {
            id,
            account_id,
            remote_user: RemoteUserId::new(self.remote_user_id),
            status: ConversationStatus::from_str_value(&self.status),
            message_count: self.message_count,
            total_ai_responses: self.total_ai_responses,
            has_payment_screenshot: self.has_payment_screenshot,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: self.created_at,
            last_message_at: self.last_message_at,
        })
    }
}

/// Postgres-backed conversation store.
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    /// Creates a store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn find(
        &self,
        account_id: AccountId,
        remote_user: RemoteUserId,
    ) -> Result<Option<Conversation>, StoreError> {
        // No uniqueness constraint guards the (account, remote user) pair;
        // two racing first messages can insert duplicates. The oldest row
        // wins here, keeping the pair's history on one record.
        let row: Option<ConversationRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, remote_user_id, status, message_count,
                   total_ai_responses, has_payment_screenshot,
                   username, first_name, last_name, created_at, last_message_at
            FROM conversations
            WHERE account_id = $1 AND remote_user_id = $2
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(account_id.to_string())
        .bind(remote_user.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_conversation()?)),
            None => Ok(None),
        }
    }

    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO conversations
                (id, account_id, remote_user_id, status, message_count,
                 total_ai_responses, has_payment_screenshot,
                 username, first_name, last_name, created_at, last_message_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.account_id.to_string())
        .bind(conversation.remote_user.as_i64())
        .bind(conversation.status.as_str())
        .bind(conversation.message_count)
        .bind(conversation.total_ai_responses)
        .bind(conversation.has_payment_screenshot)
        .bind(&conversation.username)
        .bind(&conversation.first_name)
        .bind(&conversation.last_name)
        .bind(conversation.created_at)
        .bind(conversation.last_message_at)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn record_message(&self, id: ConversationId) -> Result<(), StoreError> {
        // In-place increment; racing updates serialize in the store instead
        // of losing a count to read-modify-write.
        sqlx::query(
            r#"
            UPDATE conversations
            SET message_count = message_count + 1, last_message_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn record_ai_response(&self, id: ConversationId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE conversations
            SET total_ai_responses = total_ai_responses + 1
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn mark_payment_verification(&self, id: ConversationId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE conversations
            SET status = 'payment_verification', has_payment_screenshot = TRUE,
                last_message_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn create_payment_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO payment_notifications
                (id, conversation_id, account_id, user_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(notification.id.to_string())
        .bind(notification.conversation_id.to_string())
        .bind(notification.account_id.to_string())
        .bind(notification.user_id.to_string())
        .bind(notification.status.as_str())
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_row_conversion() {
        let row = ConversationRow {
            id: ConversationId::new().to_string(),
            account_id: AccountId::new().to_string(),
            remote_user_id: 99,
            status: "pending_payment".to_string(),
            message_count: 4,
            total_ai_responses: 2,
            has_payment_screenshot: false,
            username: Some("alice".to_string()),
            first_name: None,
            last_name: None,
            created_at: Utc::now(),
            last_message_at: Utc::now(),
        };

        let conversation = row.try_into_conversation().expect("should convert");
        assert_eq!(conversation.remote_user, RemoteUserId::new(99));
        assert_eq!(conversation.status, ConversationStatus::PendingPayment);
        assert_eq!(conversation.message_count, 4);
    }

    #[test]
    fn conversation_row_rejects_bad_id() {
        let row = ConversationRow {
            id: "garbage".to_string(),
            account_id: AccountId::new().to_string(),
            remote_user_id: 1,
            status: "active".to_string(),
            message_count: 1,
            total_ai_responses: 0,
            has_payment_screenshot: false,
            username: None,
            first_name: None,
            last_name: None,
            created_at: Utc::now(),
            last_message_at: Utc::now(),
        };

        assert!(matches!(
            row.try_into_conversation(),
            Err(StoreError::InvalidRecord { .. })
        ));
    }
}
