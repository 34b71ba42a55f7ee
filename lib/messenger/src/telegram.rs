//! Telegram-backed messenger implementation.
//!
//! One dispatcher task per account session. Raw updates are resolved into
//! [`InboundUpdate`] here, at the client boundary, so nothing downstream
//! ever touches the network library's types.

use crate::error::SessionError;
use crate::event::{InboundUpdate, SenderProfile};
use crate::session::{Messenger, MessengerSession, SessionCredentials, UpdateHandler};
use async_trait::async_trait;
use copper_relay_core::{AccountId, RemoteUserId};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Me};
use tokio::sync::oneshot;

/// Delay between connection attempts.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Messenger backed by the Telegram client library.
#[derive(Debug, Clone)]
pub struct TelegramMessenger {
    connection_retries: u32,
}

impl TelegramMessenger {
    /// Creates a messenger that opens sessions with the given retry count.
    #[must_use]
    pub fn new(connection_retries: u32) -> Self {
        Self {
            connection_retries: connection_retries.max(1),
        }
    }

    /// Validates the session token against the network, retrying transient
    /// failures up to the configured count. A credential rejection is not
    /// retried.
    async fn validate(&self, bot: &Bot) -> Result<Me, SessionError> {
        let mut last_error = String::new();
        for attempt in 1..=self.connection_retries {
            match bot.get_me().await {
                Ok(me) => return Ok(me),
                Err(teloxide::RequestError::Api(e)) => {
                    return Err(SessionError::InvalidCredentials {
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::debug!(attempt, error = %last_error, "session open attempt failed");
                    if attempt < self.connection_retries {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
        Err(SessionError::ConnectFailed {
            attempts: self.connection_retries,
            reason: last_error,
        })
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn open_session(
        &self,
        account_id: AccountId,
        credentials: &SessionCredentials,
        handler: UpdateHandler,
    ) -> Result<Arc<dyn MessengerSession>, SessionError> {
        let bot = Bot::new(credentials.session_token.clone());
        let me = self.validate(&bot).await?;
        tracing::info!(
            account_id = %account_id,
            network_username = me.username(),
            "session opened"
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let message_handler = Update::filter_message().endpoint(
            move |msg: Message| {
                let handler = handler.clone();
                async move {
                    handler(account_id, resolve_update(&msg)).await;
                    respond(())
                }
            },
        );

        let dispatch_bot = bot.clone();
        tokio::spawn(async move {
            let mut dispatcher = Dispatcher::builder(dispatch_bot, message_handler)
                .default_handler(|_| async {})
                .build();
            tokio::select! {
                _ = shutdown_rx => {
                    tracing::debug!(account_id = %account_id, "session closed");
                }
                () = dispatcher.dispatch() => {
                    tracing::warn!(account_id = %account_id, "session update stream ended");
                }
            }
        });

        Ok(Arc::new(TelegramSession {
            bot,
            shutdown: Mutex::new(Some(shutdown_tx)),
        }))
    }
}

/// An open Telegram session for one account.
pub struct TelegramSession {
    bot: Bot,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

#[async_trait]
impl MessengerSession for TelegramSession {
    async fn send_text(&self, user: RemoteUserId, text: &str) -> Result<(), SessionError> {
        self.bot
            .send_message(ChatId(user.as_i64()), text)
            .await
            .map(|_| ())
            .map_err(|e| SessionError::SendFailed {
                reason: e.to_string(),
            })
    }

    async fn close(&self) {
        if let Ok(mut guard) = self.shutdown.lock()
            && let Some(tx) = guard.take()
        {
            let _ = tx.send(());
        }
    }
}

/// Resolves a raw message into the closed inbound-update set.
///
/// Only private one-to-one chats are handled; everything else maps to
/// `Ignored`.
fn resolve_update(msg: &Message) -> InboundUpdate {
    if !msg.chat.is_private() {
        return InboundUpdate::Ignored;
    }
    let Some(from) = msg.from() else {
        return InboundUpdate::Ignored;
    };
    let sender = SenderProfile {
        user_id: RemoteUserId::new(from.id.0 as i64),
        username: from.username.clone(),
        first_name: Some(from.first_name.clone()),
        last_name: from.last_name.clone(),
    };

    if msg.photo().is_some() {
        InboundUpdate::Image {
            sender,
            caption: msg.caption().map(str::to_string),
        }
    } else if let Some(text) = msg.text() {
        InboundUpdate::Text {
            sender,
            text: text.to_string(),
        }
    } else {
        InboundUpdate::Ignored
    }
}
