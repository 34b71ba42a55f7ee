//! Per-message routing.
//!
//! Classifies each inbound update against the conversation's stored state
//! and dispatches to one of three paths: welcome a new user, record a
//! payment screenshot, or generate a regular reply. Errors are returned to
//! the session handler, which logs and drops the event; one failed message
//! never halts the others.

use crate::conversation::{Conversation, PaymentNotification};
use crate::error::RouterError;
use crate::store::ConversationStore;
use copper_relay_accounts::{AccountRegistry, RegisteredAccount};
use copper_relay_ai::ReplyGenerator;
use copper_relay_core::AccountId;
use copper_relay_messenger::{InboundUpdate, SenderProfile};
use std::sync::Arc;

/// Confirmation sent after a payment screenshot is recorded.
const PAYMENT_RECEIVED_TEXT: &str =
    "Got it! I've received your payment screenshot and it's being verified. \
     I'll get back to you shortly.";

/// What a successfully routed update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The update was not addressable (group traffic, service message).
    Ignored,
    /// A conversation row was created for a first-time user.
    NewUser {
        /// Whether the welcome message was sent (false when the persona
        /// has no welcome template).
        welcomed: bool,
    },
    /// A payment screenshot was recorded and confirmed.
    ScreenshotRecorded,
    /// A regular message was recorded.
    Replied {
        /// Whether a generated reply went out (false when generation
        /// failed; the user gets silence for that turn).
        replied: bool,
    },
}

/// Routes inbound updates for all registered accounts.
pub struct ConversationRouter<S, G> {
    registry: Arc<AccountRegistry>,
    store: S,
    generator: G,
}

impl<S: ConversationStore, G: ReplyGenerator> ConversationRouter<S, G> {
    /// Creates a router over the given registry, store, and generator.
    pub fn new(registry: Arc<AccountRegistry>, store: S, generator: G) -> Self {
        Self {
            registry,
            store,
            generator,
        }
    }

    /// Routes one inbound update for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is not registered or a store or
    /// send operation fails. The caller logs and drops; nothing is
    /// retried.
    pub async fn handle_update(
        &self,
        account_id: AccountId,
        update: InboundUpdate,
    ) -> Result<RouteOutcome, RouterError> {
        let Some(sender) = update.sender() else {
            tracing::trace!(account_id = %account_id, "discarding non-private update");
            return Ok(RouteOutcome::Ignored);
        };

        let Some(entry) = self.registry.get(account_id) else {
            return Err(RouterError::AccountNotRegistered { account_id });
        };

        match self.store.find(account_id, sender.user_id).await? {
            None => self.welcome_new_user(account_id, &entry, sender).await,
            Some(conversation) if update.has_image() && conversation.status.awaits_payment() => {
                self.record_payment_screenshot(&entry, &conversation).await
            }
            Some(conversation) => self.reply_regular(&entry, &conversation, &update).await,
        }
    }

    /// New-user path: create the row, send the welcome if configured.
    async fn welcome_new_user(
        &self,
        account_id: AccountId,
        entry: &RegisteredAccount,
        sender: &SenderProfile,
    ) -> Result<RouteOutcome, RouterError> {
        let conversation = Conversation::new(account_id, sender);
        self.store.create(&conversation).await?;
        tracing::info!(
            account_id = %account_id,
            remote_user = %sender.user_id,
            conversation_id = %conversation.id,
            "conversation created"
        );

        if !entry.persona.has_welcome_message() {
            return Ok(RouteOutcome::NewUser { welcomed: false });
        }

        // A failed welcome leaves the user created but never welcomed; the
        // caller logs the error and nothing is retried.
        entry
            .session
            .send_text(sender.user_id, &entry.persona.welcome_message)
            .await?;
        Ok(RouteOutcome::NewUser { welcomed: true })
    }

    /// Payment-screenshot path: flip status, notify the operator, confirm
    /// to the user. The image content is never inspected.
    async fn record_payment_screenshot(
        &self,
        entry: &RegisteredAccount,
        conversation: &Conversation,
    ) -> Result<RouteOutcome, RouterError> {
        self.store.mark_payment_verification(conversation.id).await?;

        let notification =
            PaymentNotification::new(conversation.id, conversation.account_id, entry.owner);
        self.store.create_payment_notification(&notification).await?;
        tracing::info!(
            account_id = %conversation.account_id,
            conversation_id = %conversation.id,
            notification_id = %notification.id,
            "payment screenshot recorded"
        );

        entry
            .session
            .send_text(conversation.remote_user, PAYMENT_RECEIVED_TEXT)
            .await?;
        Ok(RouteOutcome::ScreenshotRecorded)
    }

    /// Regular-message path: count the message, generate, send if anything
    /// came back.
    async fn reply_regular(
        &self,
        entry: &RegisteredAccount,
        conversation: &Conversation,
        update: &InboundUpdate,
    ) -> Result<RouteOutcome, RouterError> {
        self.store.record_message(conversation.id).await?;

        let reply = match self
            .generator
            .generate(&entry.persona, update.text_content())
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!(
                    conversation_id = %conversation.id,
                    error = %e,
                    "no reply generated this turn"
                );
                return Ok(RouteOutcome::Replied { replied: false });
            }
        };

        entry
            .session
            .send_text(conversation.remote_user, &reply)
            .await?;
        self.store.record_ai_response(conversation.id).await?;
        Ok(RouteOutcome::Replied { replied: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationStatus;
    use crate::error::StoreError;
    use async_trait::async_trait;
    use copper_relay_ai::{GenerationError, Persona};
    use copper_relay_core::{ConversationId, RemoteUserId, UserId};
    use copper_relay_messenger::{MessengerSession, SessionError};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory conversation store for testing.
    #[derive(Default)]
    struct InMemoryStore {
        conversations: Mutex<HashMap<(AccountId, RemoteUserId), Conversation>>,
        notifications: Mutex<Vec<PaymentNotification>>,
    }

    impl InMemoryStore {
        fn conversation(&self, account_id: AccountId, remote: RemoteUserId) -> Conversation {
            self.conversations.lock().unwrap()[&(account_id, remote)].clone()
        }

        fn with_mut(&self, id: ConversationId, f: impl FnOnce(&mut Conversation)) {
            let mut conversations = self.conversations.lock().unwrap();
            let conversation = conversations
                .values_mut()
                .find(|c| c.id == id)
                .expect("conversation exists");
            f(conversation);
        }
    }

    #[async_trait]
    impl ConversationStore for InMemoryStore {
        async fn find(
            &self,
            account_id: AccountId,
            remote_user: RemoteUserId,
        ) -> Result<Option<Conversation>, StoreError> {
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .get(&(account_id, remote_user))
                .cloned())
        }

        async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
            self.conversations.lock().unwrap().insert(
                (conversation.account_id, conversation.remote_user),
                conversation.clone(),
            );
            Ok(())
        }

        async fn record_message(&self, id: ConversationId) -> Result<(), StoreError> {
            self.with_mut(id, |c| {
                c.message_count += 1;
                c.last_message_at = chrono::Utc::now();
            });
            Ok(())
        }

        async fn record_ai_response(&self, id: ConversationId) -> Result<(), StoreError> {
            self.with_mut(id, |c| c.total_ai_responses += 1);
            Ok(())
        }

        async fn mark_payment_verification(&self, id: ConversationId) -> Result<(), StoreError> {
            self.with_mut(id, |c| {
                c.status = ConversationStatus::PaymentVerification;
                c.has_payment_screenshot = true;
            });
            Ok(())
        }

        async fn create_payment_notification(
            &self,
            notification: &PaymentNotification,
        ) -> Result<(), StoreError> {
            self.notifications.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    /// Session that records outbound sends and can be made to fail.
    #[derive(Default)]
    struct RecordingSession {
        sent: Mutex<Vec<(RemoteUserId, String)>>,
        fail_sends: bool,
    }

    #[async_trait]
    impl MessengerSession for RecordingSession {
        async fn send_text(&self, user: RemoteUserId, text: &str) -> Result<(), SessionError> {
            if self.fail_sends {
                return Err(SessionError::SendFailed {
                    reason: "flood wait".to_string(),
                });
            }
            self.sent.lock().unwrap().push((user, text.to_string()));
            Ok(())
        }

        async fn close(&self) {}
    }

    /// Generator that returns a fixed reply or a fixed failure.
    struct FixedGenerator {
        reply: Result<String, GenerationError>,
    }

    impl FixedGenerator {
        fn replying(reply: impl Into<String>) -> Self {
            Self {
                reply: Ok(reply.into()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(GenerationError::BadStatus { status: 500 }),
            }
        }
    }

    #[async_trait]
    impl ReplyGenerator for FixedGenerator {
        async fn generate(
            &self,
            _persona: &Persona,
            _inbound_text: &str,
        ) -> Result<String, GenerationError> {
            self.reply.clone()
        }
    }

    struct Fixture {
        account_id: AccountId,
        owner: UserId,
        session: Arc<RecordingSession>,
        router: ConversationRouter<Arc<InMemoryStore>, FixedGenerator>,
        store: Arc<InMemoryStore>,
    }

    fn fixture_with(generator: FixedGenerator, welcome: &str, fail_sends: bool) -> Fixture {
        let account_id = AccountId::new();
        let owner = UserId::new();
        let persona = Persona::new(account_id, "You are Mia.", welcome, "Pay at @mia_pays");
        let session = Arc::new(RecordingSession {
            sent: Mutex::new(Vec::new()),
            fail_sends,
        });
        let registry = Arc::new(AccountRegistry::new());
        registry.register(account_id, session.clone(), persona, owner);

        let store = Arc::new(InMemoryStore::default());
        let router = ConversationRouter::new(registry, store.clone(), generator);

        Fixture {
            account_id,
            owner,
            session,
            router,
            store,
        }
    }

    fn fixture(generator: FixedGenerator) -> Fixture {
        fixture_with(generator, "hey! thanks for writing me", false)
    }

    fn sender(id: i64) -> SenderProfile {
        SenderProfile {
            user_id: RemoteUserId::new(id),
            username: Some("alice".to_string()),
            first_name: Some("Alice".to_string()),
            last_name: None,
        }
    }

    fn text(id: i64, text: &str) -> InboundUpdate {
        InboundUpdate::Text {
            sender: sender(id),
            text: text.to_string(),
        }
    }

    fn image(id: i64) -> InboundUpdate {
        InboundUpdate::Image {
            sender: sender(id),
            caption: None,
        }
    }

    #[tokio::test]
    async fn ignored_update_touches_nothing() {
        let fx = fixture(FixedGenerator::replying("hi"));

        let outcome = fx
            .router
            .handle_update(fx.account_id, InboundUpdate::Ignored)
            .await
            .expect("route");

        assert_eq!(outcome, RouteOutcome::Ignored);
        assert!(fx.store.conversations.lock().unwrap().is_empty());
        assert!(fx.session.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unregistered_account_is_an_error() {
        let fx = fixture(FixedGenerator::replying("hi"));
        let other_account = AccountId::new();

        let result = fx.router.handle_update(other_account, text(1, "hello")).await;
        assert_eq!(
            result,
            Err(RouterError::AccountNotRegistered {
                account_id: other_account
            })
        );
    }

    #[tokio::test]
    async fn first_message_creates_conversation_and_welcomes_once() {
        let fx = fixture(FixedGenerator::replying("hi"));

        let outcome = fx
            .router
            .handle_update(fx.account_id, text(7, "hello there"))
            .await
            .expect("route");
        assert_eq!(outcome, RouteOutcome::NewUser { welcomed: true });

        let conversation = fx.store.conversation(fx.account_id, RemoteUserId::new(7));
        assert_eq!(conversation.status, ConversationStatus::Active);
        assert_eq!(conversation.message_count, 1);
        assert_eq!(conversation.username.as_deref(), Some("alice"));

        let sent = fx.session.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, RemoteUserId::new(7));
        assert_eq!(sent[0].1, "hey! thanks for writing me");
    }

    #[tokio::test]
    async fn empty_welcome_template_skips_send() {
        let fx = fixture_with(FixedGenerator::replying("hi"), "", false);

        let outcome = fx
            .router
            .handle_update(fx.account_id, text(7, "hello"))
            .await
            .expect("route");

        assert_eq!(outcome, RouteOutcome::NewUser { welcomed: false });
        assert!(fx.session.sent.lock().unwrap().is_empty());
        // The row still exists.
        let conversation = fx.store.conversation(fx.account_id, RemoteUserId::new(7));
        assert_eq!(conversation.message_count, 1);
    }

    #[tokio::test]
    async fn failed_welcome_leaves_conversation_created() {
        let fx = fixture_with(FixedGenerator::replying("hi"), "welcome!", true);

        let result = fx.router.handle_update(fx.account_id, text(7, "hello")).await;
        assert!(matches!(result, Err(RouterError::Send(_))));

        // User created but never welcomed; not retried.
        let conversation = fx.store.conversation(fx.account_id, RemoteUserId::new(7));
        assert_eq!(conversation.message_count, 1);
    }

    #[tokio::test]
    async fn second_message_gets_generated_reply() {
        let fx = fixture(FixedGenerator::replying("lovely to hear from you"));

        fx.router
            .handle_update(fx.account_id, text(7, "hello"))
            .await
            .expect("first message");
        let outcome = fx
            .router
            .handle_update(fx.account_id, text(7, "how are you?"))
            .await
            .expect("second message");
        assert_eq!(outcome, RouteOutcome::Replied { replied: true });

        let conversation = fx.store.conversation(fx.account_id, RemoteUserId::new(7));
        assert_eq!(conversation.message_count, 2);
        assert_eq!(conversation.total_ai_responses, 1);

        let sent = fx.session.sent.lock().unwrap();
        // Welcome plus the generated reply, both to the same remote user.
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].0, RemoteUserId::new(7));
        assert_eq!(sent[1].1, "lovely to hear from you");
    }

    #[tokio::test]
    async fn generation_failure_counts_message_but_sends_nothing() {
        let fx = fixture(FixedGenerator::failing());

        fx.router
            .handle_update(fx.account_id, text(7, "hello"))
            .await
            .expect("first message");
        let outcome = fx
            .router
            .handle_update(fx.account_id, text(7, "anyone home?"))
            .await
            .expect("second message");
        assert_eq!(outcome, RouteOutcome::Replied { replied: false });

        let conversation = fx.store.conversation(fx.account_id, RemoteUserId::new(7));
        assert_eq!(conversation.message_count, 2);
        assert_eq!(conversation.total_ai_responses, 0);
        // Only the welcome went out.
        assert_eq!(fx.session.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn screenshot_during_pending_payment_is_recorded() {
        let fx = fixture(FixedGenerator::replying("hi"));

        fx.router
            .handle_update(fx.account_id, text(7, "hello"))
            .await
            .expect("first message");
        let conversation = fx.store.conversation(fx.account_id, RemoteUserId::new(7));
        // Operator flips the conversation to pending payment out of band.
        fx.store
            .with_mut(conversation.id, |c| c.status = ConversationStatus::PendingPayment);

        let outcome = fx
            .router
            .handle_update(fx.account_id, image(7))
            .await
            .expect("screenshot");
        assert_eq!(outcome, RouteOutcome::ScreenshotRecorded);

        let conversation = fx.store.conversation(fx.account_id, RemoteUserId::new(7));
        assert_eq!(conversation.status, ConversationStatus::PaymentVerification);
        assert!(conversation.has_payment_screenshot);

        let notifications = fx.store.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].conversation_id, conversation.id);
        assert_eq!(notifications[0].account_id, fx.account_id);
        assert_eq!(notifications[0].user_id, fx.owner);

        let sent = fx.session.sent.lock().unwrap();
        assert_eq!(sent.last().unwrap().1, PAYMENT_RECEIVED_TEXT);
    }

    #[tokio::test]
    async fn image_outside_pending_payment_takes_regular_path() {
        let fx = fixture(FixedGenerator::replying("nice picture!"));

        fx.router
            .handle_update(fx.account_id, text(7, "hello"))
            .await
            .expect("first message");
        let outcome = fx
            .router
            .handle_update(fx.account_id, image(7))
            .await
            .expect("image while active");
        assert_eq!(outcome, RouteOutcome::Replied { replied: true });

        let conversation = fx.store.conversation(fx.account_id, RemoteUserId::new(7));
        assert_eq!(conversation.status, ConversationStatus::Active);
        assert!(!conversation.has_payment_screenshot);
        assert!(fx.store.notifications.lock().unwrap().is_empty());
        assert_eq!(conversation.message_count, 2);
    }
}
