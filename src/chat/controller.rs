use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{info, warn};

use super::backend::{BackendError, ChatBackend, ChatRequest, Provider};
use super::message::{Author, ChatMessage};

/// Shown in place of a reply whenever the backend call fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Keeps the conversation and mediates between user input and the backend.
///
/// Safe to share between tasks. Messages are kept in append order; replies to
/// overlapping sends land in the order the backend answers them.
pub struct ConversationController {
    backend: Arc<dyn ChatBackend>,
    provider: Mutex<Provider>,
    messages: Mutex<Vec<ChatMessage>>,
    next_id: AtomicU64,
    in_flight: AtomicUsize,
}

/// Marks one request in flight for as long as it lives.
struct Loading<'a>(&'a AtomicUsize);

impl<'a> Loading<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConversationController {
    pub fn new(backend: Arc<dyn ChatBackend>, provider: Provider) -> Self {
        Self {
            backend,
            provider: Mutex::new(provider),
            messages: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn provider(&self) -> Provider {
        *self.provider.lock()
    }

    /// Applies to sends started after this call.
    pub fn set_provider(&self, provider: Provider) {
        *self.provider.lock() = provider;
        info!(%provider, "Chat provider changed");
    }

    /// True while at least one backend call has not settled.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Copy of the conversation so far, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().clone()
    }

    /// Append the user's text, ask the backend, append its reply.
    ///
    /// Never fails: a backend error becomes [`FALLBACK_REPLY`]. Returns the
    /// assistant message that was appended.
    pub async fn send_user_message(&self, text: impl Into<String>) -> ChatMessage {
        let text = text.into();
        self.append(text.clone(), Author::user());

        let _loading = Loading::start(&self.in_flight);
        let request = ChatRequest {
            message: text,
            provider: self.provider(),
        };

        let reply = match self.backend.complete(request).await {
            Ok(response) => match response.first_text() {
                Some(text) => text.to_owned(),
                None => self.fallback(BackendError::EmptyChoices),
            },
            Err(e) => self.fallback(e),
        };

        self.append(reply, Author::assistant())
    }

    fn fallback(&self, error: BackendError) -> String {
        warn!(error = %error, provider = %self.provider(), "Chat backend failed, showing fallback");
        FALLBACK_REPLY.to_owned()
    }

    fn append(&self, text: String, author: Author) -> ChatMessage {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let message = ChatMessage::new(id, text, author);
        self.messages.lock().push(message.clone());
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::backend::{ChatResponse, Choice};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    struct Rejecting;

    #[async_trait]
    impl ChatBackend for Rejecting {
        async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, BackendError> {
            Err(BackendError::Status {
                status: 503,
                body: "down".to_owned(),
            })
        }
    }

    /// Echoes the request back and records the provider it saw.
    #[derive(Default)]
    struct Echo {
        seen: Mutex<Vec<Provider>>,
    }

    #[async_trait]
    impl ChatBackend for Echo {
        async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BackendError> {
            self.seen.lock().push(request.provider);
            Ok(ChatResponse {
                choices: vec![Choice {
                    text: format!("echo: {}", request.message),
                }],
            })
        }
    }

    /// Holds every request until released.
    #[derive(Default)]
    struct Gated {
        gate: Notify,
    }

    #[async_trait]
    impl ChatBackend for Gated {
        async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, BackendError> {
            self.gate.notified().await;
            Ok(ChatResponse {
                choices: vec![Choice {
                    text: "late".to_owned(),
                }],
            })
        }
    }

    /// Holds "first" and "second" behind separate gates and replies "re <message>".
    #[derive(Default)]
    struct TwoGates {
        first: Notify,
        second: Notify,
    }

    #[async_trait]
    impl ChatBackend for TwoGates {
        async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BackendError> {
            let gate = if request.message == "first" {
                &self.first
            } else {
                &self.second
            };
            gate.notified().await;
            Ok(ChatResponse {
                choices: vec![Choice {
                    text: format!("re {}", request.message),
                }],
            })
        }
    }

    #[tokio::test]
    async fn rejected_sends_each_get_one_fallback() {
        let controller = ConversationController::new(Arc::new(Rejecting), Provider::Deepseek);

        for (i, text) in ["one", "two", "three"].into_iter().enumerate() {
            let reply = controller.send_user_message(text).await;
            assert_eq!(reply.text, FALLBACK_REPLY);
            assert!(reply.author.is_assistant());
            assert!(!controller.is_loading());
            assert_eq!(controller.messages().len(), (i + 1) * 2);
        }

        let messages = controller.messages();
        let fallbacks = messages.iter().filter(|m| m.text == FALLBACK_REPLY).count();
        assert_eq!(fallbacks, 3);
    }

    #[tokio::test]
    async fn messages_alternate_and_ids_are_unique() {
        let controller = ConversationController::new(Arc::new(Echo::default()), Provider::Openai);
        controller.send_user_message("a").await;
        controller.send_user_message("b").await;

        let messages = controller.messages();
        let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["a", "echo: a", "b", "echo: b"]);
        assert_eq!(messages[0].author, Author::user());
        assert_eq!(messages[1].author, Author::assistant());

        let mut ids: Vec<_> = messages.iter().map(|m| m.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn provider_change_applies_to_next_send() {
        let backend = Arc::new(Echo::default());
        let controller = ConversationController::new(backend.clone(), Provider::Deepseek);
        controller.send_user_message("x").await;
        controller.set_provider(Provider::Gemini);
        controller.send_user_message("y").await;
        assert_eq!(*backend.seen.lock(), vec![Provider::Deepseek, Provider::Gemini]);
    }

    #[tokio::test]
    async fn loading_is_visible_while_suspended() {
        let backend = Arc::new(Gated::default());
        let controller = Arc::new(ConversationController::new(
            backend.clone(),
            Provider::Deepseek,
        ));
        assert!(!controller.is_loading());

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.send_user_message("hello?").await })
        };

        while !controller.is_loading() {
            tokio::task::yield_now().await;
        }
        // The user message is shown before the reply arrives.
        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.messages()[0].text, "hello?");

        backend.gate.notify_one();
        let reply = task.await.expect("send task");
        assert_eq!(reply.text, "late");
        assert!(!controller.is_loading());
        assert_eq!(controller.messages().len(), 2);
    }

    #[tokio::test]
    async fn overlapping_sends_keep_loading_until_the_last_reply() {
        let backend = Arc::new(TwoGates::default());
        let controller = Arc::new(ConversationController::new(
            backend.clone(),
            Provider::Deepseek,
        ));

        let send = |text: &'static str| {
            let controller = controller.clone();
            tokio::spawn(async move { controller.send_user_message(text).await })
        };

        let first = send("first");
        while controller.messages().is_empty() {
            tokio::task::yield_now().await;
        }
        let second = send("second");
        while controller.messages().len() < 2 {
            tokio::task::yield_now().await;
        }
        assert!(controller.is_loading());

        // Replies arrive in reverse order.
        backend.second.notify_one();
        assert_eq!(second.await.expect("second send").text, "re second");
        assert!(controller.is_loading(), "first request is still pending");

        backend.first.notify_one();
        assert_eq!(first.await.expect("first send").text, "re first");
        assert!(!controller.is_loading());

        let messages = controller.messages();
        let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "re second", "re first"]);
    }
}
