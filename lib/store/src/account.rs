//! Account and persona repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use copper_relay_accounts::{Account, AccountDirectory, ConnectionStatus, DirectoryError};
use copper_relay_ai::{KnowledgeEntry, Persona};
use copper_relay_core::{AccountId, PersonaId, UserId};
use copper_relay_messenger::SessionCredentials;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

fn query_error(e: sqlx::Error) -> DirectoryError {
    DirectoryError::QueryFailed {
        reason: e.to_string(),
    }
}

fn record_error(reason: impl Into<String>) -> DirectoryError {
    DirectoryError::InvalidRecord {
        reason: reason.into(),
    }
}

/// Row type for account queries.
#[derive(FromRow)]
struct AccountRow {
    id: String,
    user_id: String,
    api_id: i32,
    api_hash: String,
    session_token: String,
    is_active: bool,
    connection_status: String,
    last_error: Option<String>,
    connected_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn try_into_account(self) -> Result<Account, DirectoryError> {
        let id = AccountId::from_str(&self.id)
            .map_err(|e| record_error(format!("invalid account id '{}': {}", self.id, e)))?;
        let user_id = UserId::from_str(&self.user_id)
            .map_err(|e| record_error(format!("invalid user id '{}': {}", self.user_id, e)))?;

        Ok(Account {
            id,
            user_id,
            credentials: SessionCredentials {
                api_id: self.api_id,
                api_hash: self.api_hash,
                session_token: self.session_token,
            },
            is_active: self.is_active,
            connection_status: ConnectionStatus::from_str_value(&self.connection_status),
            last_error: self.last_error,
            connected_at: self.connected_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row type for persona queries.
#[derive(FromRow)]
struct PersonaRow {
    id: String,
    account_id: String,
    base_prompt: String,
    welcome_message: String,
    payment_info_message: String,
    knowledge: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl PersonaRow {
    fn try_into_persona(self) -> Result<Persona, DirectoryError> {
        let id = PersonaId::from_str(&self.id)
            .map_err(|e| record_error(format!("invalid persona id '{}': {}", self.id, e)))?;
        let account_id = AccountId::from_str(&self.account_id).map_err(|e| {
            record_error(format!("invalid account id '{}': {}", self.account_id, e))
        })?;
        let knowledge: Vec<KnowledgeEntry> = match self.knowledge {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| record_error(format!("invalid knowledge entries: {e}")))?,
            None => Vec::new(),
        };

        Ok(Persona {
            id,
            account_id,
            base_prompt: self.base_prompt,
            welcome_message: self.welcome_message,
            payment_info_message: self.payment_info_message,
            knowledge,
            created_at: self.created_at,
        })
    }
}

/// Row type for the active-accounts query: account columns joined with the
/// account's first persona (all persona columns nullable).
#[derive(FromRow)]
struct ActiveAccountRow {
    id: String,
    user_id: String,
    api_id: i32,
    api_hash: String,
    session_token: String,
    is_active: bool,
    connection_status: String,
    last_error: Option<String>,
    connected_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    persona_id: Option<String>,
    persona_base_prompt: Option<String>,
    persona_welcome_message: Option<String>,
    persona_payment_info_message: Option<String>,
    persona_knowledge: Option<serde_json::Value>,
    persona_created_at: Option<DateTime<Utc>>,
}

impl ActiveAccountRow {
    fn try_into_pair(self) -> Result<(Account, Option<Persona>), DirectoryError> {
        let persona = match (
            self.persona_id,
            self.persona_base_prompt,
            self.persona_welcome_message,
            self.persona_payment_info_message,
            self.persona_created_at,
        ) {
            (
                Some(id),
                Some(base_prompt),
                Some(welcome_message),
                Some(payment_info_message),
                Some(created_at),
            ) => Some(
                PersonaRow {
                    id,
                    account_id: self.id.clone(),
                    base_prompt,
                    welcome_message,
                    payment_info_message,
                    knowledge: self.persona_knowledge,
                    created_at,
                }
                .try_into_persona()?,
            ),
            _ => None,
        };

        let account = AccountRow {
            id: self.id,
            user_id: self.user_id,
            api_id: self.api_id,
            api_hash: self.api_hash,
            session_token: self.session_token,
            is_active: self.is_active,
            connection_status: self.connection_status,
            last_error: self.last_error,
            connected_at: self.connected_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .try_into_account()?;

        Ok((account, persona))
    }
}

/// Postgres-backed account directory.
pub struct PgAccountDirectory {
    pool: PgPool,
}

impl PgAccountDirectory {
    /// Creates a directory over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountDirectory for PgAccountDirectory {
    async fn list_active(&self) -> Result<Vec<(Account, Option<Persona>)>, DirectoryError> {
        // One lateral join picks each account's first persona by creation
        // order, matching the first-result-wins rule for duplicates.
        let rows: Vec<ActiveAccountRow> = sqlx::query_as(
            r#"
            SELECT a.id, a.user_id, a.api_id, a.api_hash, a.session_token,
                   a.is_active, a.connection_status, a.last_error,
                   a.connected_at, a.created_at, a.updated_at,
                   p.id AS persona_id,
                   p.base_prompt AS persona_base_prompt,
                   p.welcome_message AS persona_welcome_message,
                   p.payment_info_message AS persona_payment_info_message,
                   p.knowledge AS persona_knowledge,
                   p.created_at AS persona_created_at
            FROM telegram_accounts a
            LEFT JOIN LATERAL (
                SELECT id, base_prompt, welcome_message, payment_info_message,
                       knowledge, created_at
                FROM ai_personas
                WHERE account_id = a.id
                ORDER BY created_at ASC
                LIMIT 1
            ) p ON TRUE
            WHERE a.is_active = TRUE
            ORDER BY a.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.into_iter().map(ActiveAccountRow::try_into_pair).collect()
    }

    async fn find(&self, id: AccountId) -> Result<Option<Account>, DirectoryError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, api_id, api_hash, session_token,
                   is_active, connection_status, last_error,
                   connected_at, created_at, updated_at
            FROM telegram_accounts
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_account()?)),
            None => Ok(None),
        }
    }

    async fn find_persona(&self, id: AccountId) -> Result<Option<Persona>, DirectoryError> {
        let row: Option<PersonaRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, base_prompt, welcome_message,
                   payment_info_message, knowledge, created_at
            FROM ai_personas
            WHERE account_id = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_persona()?)),
            None => Ok(None),
        }
    }

    async fn mark_connected(&self, id: AccountId) -> Result<(), DirectoryError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE telegram_accounts
            SET connection_status = 'connected', last_error = NULL,
                connected_at = $2, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn mark_error(&self, id: AccountId, message: &str) -> Result<(), DirectoryError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE telegram_accounts
            SET connection_status = 'error', last_error = $2,
                is_active = FALSE, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .bind(message)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }
}
