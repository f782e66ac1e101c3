//! Conversation state and the single-flight request cycle.
//!
//! A send moves the conversation `Idle -> Pending -> Idle`. While pending,
//! further sends are ignored rather than queued. The cycle is split into
//! [`Conversation::begin_send`] and [`Conversation::finish_send`] so a shell
//! can run the network call on a background task; [`Conversation::send`]
//! does all three steps inline.

use std::sync::Arc;

use crate::ai::{GenerateError, GenerationClient};
use crate::ids::IdGenerator;
use crate::preferences::Preferences;
use crate::speech::{self, SpeechEngine, Voice};
use crate::state::{Message, Role, Turn};

/// Shown in place of an empty model reply.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("Please set your Gemini API key in Settings.")]
    MissingCredential,
}

/// What a completed [`Conversation::send`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank input, or a request was already in flight.
    Ignored,
    Replied(Message),
    Failed(Message),
}

/// The network half of a send, detached from the conversation so it can
/// run on another task.
pub struct PendingTurn {
    client: Arc<dyn GenerationClient>,
    credential: String,
    history: Vec<Turn>,
}

impl PendingTurn {
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub async fn run(self) -> Result<String, GenerateError> {
        self.client.generate(&self.credential, &self.history).await
    }
}

pub struct Conversation {
    messages: Vec<Message>,
    pending: bool,
    client: Arc<dyn GenerationClient>,
    speech: Box<dyn SpeechEngine>,
    ids: Box<dyn IdGenerator>,
}

impl Conversation {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        speech: Box<dyn SpeechEngine>,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        Self {
            messages: Vec::new(),
            pending: false,
            client,
            speech,
            ids,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn voices(&self) -> Vec<Voice> {
        self.speech.voices()
    }

    pub fn refresh_voices(&mut self) {
        self.speech.refresh_voices();
    }

    pub fn speech_available(&self) -> bool {
        self.speech.is_available()
    }

    /// Start a send: append the user message and mark the conversation busy.
    ///
    /// Returns `Ok(None)` without touching anything when the trimmed input is
    /// empty or a request is already pending. A missing credential is an
    /// error and also leaves the conversation untouched.
    pub fn begin_send(
        &mut self,
        raw_input: &str,
        prefs: &Preferences,
    ) -> Result<Option<PendingTurn>, SendError> {
        let text = raw_input.trim();
        if text.is_empty() || self.pending {
            return Ok(None);
        }
        if !prefs.has_credential() {
            return Err(SendError::MissingCredential);
        }

        let id = self.ids.next_id();
        self.messages.push(Message::new(id, Role::User, text));
        self.pending = true;
        log::debug!("sending turn {} ({} chars)", self.messages.len(), text.len());

        Ok(Some(PendingTurn {
            client: Arc::clone(&self.client),
            credential: prefs.credential.clone(),
            history: self.messages.iter().map(Message::turn).collect(),
        }))
    }

    /// Record the result of a pending request and return to idle.
    ///
    /// Successful replies are spoken; errors are only recorded. Returns
    /// `None` if nothing was pending.
    pub fn finish_send(
        &mut self,
        result: Result<String, GenerateError>,
        prefs: &Preferences,
    ) -> Option<&Message> {
        if !self.pending {
            log::warn!("discarding generation result with no request in flight");
            return None;
        }

        let id = self.ids.next_id();
        match result {
            Ok(text) => {
                let text = if text.is_empty() {
                    EMPTY_REPLY_PLACEHOLDER.to_string()
                } else {
                    text
                };
                self.messages.push(Message::new(id, Role::Model, text));
                if let Some(reply) = self.messages.last() {
                    speech::speak(
                        self.speech.as_mut(),
                        &reply.text,
                        prefs.pitch,
                        prefs.voice_selector.as_deref(),
                    );
                }
            }
            Err(e) => {
                log::warn!("generation failed: {}", e);
                self.messages
                    .push(Message::new(id, Role::Model, format!("Error: {}", e)));
            }
        }

        self.pending = false;
        self.messages.last()
    }

    /// Run a whole send cycle inline.
    pub async fn send(
        &mut self,
        raw_input: &str,
        prefs: &Preferences,
    ) -> Result<SendOutcome, SendError> {
        let Some(turn) = self.begin_send(raw_input, prefs)? else {
            return Ok(SendOutcome::Ignored);
        };

        let result = turn.run().await;
        let failed = result.is_err();
        let outcome = match self.finish_send(result, prefs) {
            Some(msg) if failed => SendOutcome::Failed(msg.clone()),
            Some(msg) => SendOutcome::Replied(msg.clone()),
            None => SendOutcome::Ignored,
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::speech::testing::RecordingSpeech;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned results and records every request.
    #[derive(Default)]
    struct FakeClient {
        replies: Mutex<Vec<Result<String, GenerateError>>>,
        requests: Mutex<Vec<(String, Vec<Turn>)>>,
    }

    impl FakeClient {
        fn replying(reply: Result<String, GenerateError>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(vec![reply]),
                requests: Mutex::default(),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerationClient for FakeClient {
        async fn generate(&self, credential: &str, history: &[Turn]) -> Result<String, GenerateError> {
            self.requests
                .lock()
                .unwrap()
                .push((credential.to_string(), history.to_vec()));
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn prefs_with_key() -> Preferences {
        Preferences {
            credential: "test-key".to_string(),
            pitch: 1.4,
            voice_selector: Some("en-us".to_string()),
            ..Preferences::default()
        }
    }

    fn conversation(client: Arc<FakeClient>, speech: RecordingSpeech) -> Conversation {
        Conversation::new(client, Box::new(speech), Box::new(SequentialIds::default()))
    }

    fn roles_and_text(conv: &Conversation) -> Vec<(Role, String)> {
        conv.messages()
            .iter()
            .map(|m| (m.role, m.text.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_successful_send_appends_reply_and_speaks_once() {
        let client = FakeClient::replying(Ok("Hi there".to_string()));
        let speech = RecordingSpeech::available();
        let mut conv = conversation(client.clone(), speech.clone());

        let outcome = conv.send("Hello", &prefs_with_key()).await.unwrap();

        assert!(matches!(outcome, SendOutcome::Replied(ref m) if m.text == "Hi there"));
        assert_eq!(
            roles_and_text(&conv),
            vec![
                (Role::User, "Hello".to_string()),
                (Role::Model, "Hi there".to_string()),
            ]
        );
        assert!(!conv.is_pending());
        let spoken = speech.spoken();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].text, "Hi there");
        assert_eq!(spoken[0].pitch, 1.4);
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_records_error_without_speech() {
        let client = FakeClient::replying(Err(GenerateError::Transport {
            status: 500,
            body: "server error".to_string(),
        }));
        let speech = RecordingSpeech::available();
        let mut conv = conversation(client, speech.clone());

        let outcome = conv.send("Hello", &prefs_with_key()).await.unwrap();

        assert!(matches!(outcome, SendOutcome::Failed(_)));
        let last = conv.messages().last().unwrap();
        assert_eq!(last.role, Role::Model);
        assert_eq!(last.text, "Error: Gemini API error: 500 server error");
        assert_eq!(conv.messages().len(), 2);
        assert!(!conv.is_pending());
        assert!(speech.calls().is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_input_is_a_no_op() {
        let client = FakeClient::replying(Ok("unused".to_string()));
        let mut conv = conversation(client.clone(), RecordingSpeech::available());

        let outcome = conv.send("   ", &prefs_with_key()).await.unwrap();

        assert_eq!(outcome, SendOutcome::Ignored);
        assert!(conv.messages().is_empty());
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_rejected_without_mutation() {
        let client = FakeClient::replying(Ok("unused".to_string()));
        let mut conv = conversation(client.clone(), RecordingSpeech::available());

        let result = conv.send("Hello", &Preferences::default()).await;

        assert_eq!(result, Err(SendError::MissingCredential));
        assert!(conv.messages().is_empty());
        assert!(!conv.is_pending());
        assert_eq!(client.request_count(), 0);
    }

    #[test]
    fn test_user_message_is_appended_before_the_request_runs() {
        let client = FakeClient::replying(Ok("later".to_string()));
        let mut conv = conversation(client.clone(), RecordingSpeech::available());

        let turn = conv
            .begin_send("  Hello  ", &prefs_with_key())
            .unwrap()
            .expect("send should start");

        assert_eq!(roles_and_text(&conv), vec![(Role::User, "Hello".to_string())]);
        assert!(conv.is_pending());
        assert_eq!(turn.history(), &[Turn::user("Hello")]);
        assert_eq!(client.request_count(), 0);
    }

    #[test]
    fn test_send_while_pending_changes_nothing() {
        let client = FakeClient::replying(Ok("later".to_string()));
        let mut conv = conversation(client, RecordingSpeech::available());
        let _turn = conv.begin_send("first", &prefs_with_key()).unwrap();

        let before = conv.messages().to_vec();
        let second = conv.begin_send("second", &prefs_with_key()).unwrap();

        assert!(second.is_none());
        assert_eq!(conv.messages(), before.as_slice());
        assert!(conv.is_pending());
    }

    #[test]
    fn test_empty_reply_becomes_placeholder_and_is_spoken() {
        let client = FakeClient::replying(Ok(String::new()));
        let speech = RecordingSpeech::available();
        let mut conv = conversation(client, speech.clone());
        let prefs = prefs_with_key();

        let _turn = conv.begin_send("Hello", &prefs).unwrap();
        let reply = conv.finish_send(Ok(String::new()), &prefs).unwrap();

        assert_eq!(reply.text, EMPTY_REPLY_PLACEHOLDER);
        assert_eq!(speech.spoken()[0].text, EMPTY_REPLY_PLACEHOLDER);
    }

    #[test]
    fn test_finish_without_pending_is_ignored() {
        let client = FakeClient::replying(Ok(String::new()));
        let speech = RecordingSpeech::available();
        let mut conv = conversation(client, speech.clone());

        assert!(conv.finish_send(Ok("stray".to_string()), &prefs_with_key()).is_none());
        assert!(conv.messages().is_empty());
        assert!(speech.calls().is_empty());
    }

    #[tokio::test]
    async fn test_history_includes_previous_turns_in_order() {
        let client = Arc::new(FakeClient {
            replies: Mutex::new(vec![Ok("second reply".to_string()), Ok("first reply".to_string())]),
            requests: Mutex::default(),
        });
        let mut conv = conversation(client.clone(), RecordingSpeech::available());
        let prefs = prefs_with_key();

        conv.send("one", &prefs).await.unwrap();
        conv.send("two", &prefs).await.unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].0, "test-key");
        assert_eq!(
            requests[1].1,
            vec![
                Turn::user("one"),
                Turn::model("first reply"),
                Turn::user("two"),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_send_can_be_retried_manually() {
        let client = Arc::new(FakeClient {
            replies: Mutex::new(vec![
                Ok("recovered".to_string()),
                Err(GenerateError::Transport {
                    status: 503,
                    body: "busy".to_string(),
                }),
            ]),
            requests: Mutex::default(),
        });
        let mut conv = conversation(client.clone(), RecordingSpeech::available());
        let prefs = prefs_with_key();

        let first = conv.send("Hello", &prefs).await.unwrap();
        assert!(matches!(first, SendOutcome::Failed(_)));
        assert_eq!(client.request_count(), 1);

        let second = conv.send("Hello", &prefs).await.unwrap();
        assert!(matches!(second, SendOutcome::Replied(ref m) if m.text == "recovered"));
        assert_eq!(conv.messages().len(), 4);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let client = FakeClient::replying(Ok("x".to_string()));
        let mut conv = conversation(client, RecordingSpeech::available());
        let prefs = prefs_with_key();

        let _turn = conv.begin_send("a", &prefs).unwrap();
        conv.finish_send(Ok("b".to_string()), &prefs);

        let ids: Vec<&str> = conv.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["msg-1", "msg-2"]);
    }
}
