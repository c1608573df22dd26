//! Chat session use case.
//!
//! [`ChatSession`] owns the transcript of one conversation and mediates at
//! most one model call at a time:
//!
//! ```text
//! Idle ──submit──▶ Pending ──completed / failed / cancel──▶ Idle
//!   ▲                                                        │
//!   └──────────────── reset (from any state) ◀───────────────┘
//! ```
//!
//! Every mutation of the transcript and the pending flag is published as a
//! single [`SessionSnapshot`] on a `watch` channel, so observers never see a
//! torn state such as "idle but the final chunk is missing".

use crate::config::SessionConfig;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway};
use multiturn_domain::{
    ChatMessage, MessageId, MessageIdGenerator, Model, StreamEvent, validate_user_text,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors returned by [`ChatSession::submit`].
///
/// All of them are recoverable; the session stays usable afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Message text is empty")]
    EmptyInput,

    #[error("A response is already pending")]
    Busy,

    #[error("Transport error: {0}")]
    Transport(#[from] GatewayError),

    #[error("Request cancelled")]
    Cancelled,
}

/// Consistent view of a session at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Completed turns, oldest first.
    pub transcript: Arc<Vec<ChatMessage>>,
    /// True exactly while a model response is outstanding.
    pub pending: bool,
    /// The model reply being streamed while a request is pending. Grown in
    /// place as deltas arrive.
    pub streaming: Option<ChatMessage>,
}

impl SessionSnapshot {
    /// Text streamed so far for the outstanding reply ("" when idle).
    pub fn streaming_text(&self) -> &str {
        self.streaming.as_ref().map_or("", |m| m.text.as_str())
    }
}

/// Identifies one submitted request so late deliveries can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequestId(u64);

struct InFlight {
    request: RequestId,
    token: CancellationToken,
    reply_id: MessageId,
}

#[derive(Default)]
struct SessionState {
    transcript: Arc<Vec<ChatMessage>>,
    ids: MessageIdGenerator,
    next_request: u64,
    in_flight: Option<InFlight>,
}

impl SessionState {
    fn current(&mut self, request: RequestId) -> Option<&mut InFlight> {
        self.in_flight
            .as_mut()
            .filter(|f| f.request == request && !f.token.is_cancelled())
    }

    fn take_current(&mut self, request: RequestId) -> Option<InFlight> {
        self.current(request)?;
        self.in_flight.take()
    }
}

/// A multi-turn conversation with one model.
///
/// Explicitly constructed and shared through `Arc` by whoever orchestrates
/// it; `submit` takes `&self` so `cancel` and `reset` can be called from
/// another task while a reply is streaming.
pub struct ChatSession {
    gateway: Arc<dyn LlmGateway>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl ChatSession {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: SessionConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());
        Self {
            gateway,
            config,
            state: Mutex::new(SessionState::default()),
            snapshot_tx,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Subscribe to state changes. The receiver always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.snapshot_tx.borrow().pending
    }

    pub fn transcript(&self) -> Arc<Vec<ChatMessage>> {
        Arc::clone(&self.snapshot_tx.borrow().transcript)
    }

    /// Models the gateway can talk to.
    pub async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
        self.gateway.available_models().await
    }

    /// Submit a user turn and wait for the model's reply.
    ///
    /// The user message is appended before the model is called and stays in
    /// the transcript whatever happens to the reply. On success the reply is
    /// appended and returned.
    pub async fn submit(&self, text: &str) -> Result<ChatMessage, SessionError> {
        let text = validate_user_text(text).map_err(|_| SessionError::EmptyInput)?;
        let (request, token, chat_request) = self.begin(text)?;

        let mut guard = InFlightGuard {
            session: self,
            request,
            armed: true,
        };
        let outcome = self.drive(request, &token, &chat_request).await;
        guard.armed = false;

        match outcome {
            Ok(completed) => self.finish(request, completed),
            Err(e) => Err(self.abort(request, e)),
        }
    }

    /// Cancel the outstanding request, if any.
    ///
    /// Partial model output is discarded and the session returns to idle.
    /// Returns `false` when nothing was pending.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock_state();
        let Some(in_flight) = state.in_flight.take() else {
            return false;
        };
        in_flight.token.cancel();
        let discarded_bytes = self.snapshot_tx.borrow().streaming_text().len();
        self.publish(&state);
        drop(state);

        info!("Cancelled pending request");
        self.conversation_logger
            .log(ConversationEvent::RequestCancelled { discarded_bytes });
        true
    }

    /// Start a new conversation: cancel any outstanding call and clear the
    /// transcript. Message ids keep increasing across resets.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        if let Some(in_flight) = state.in_flight.take() {
            in_flight.token.cancel();
        }
        let cleared = state.transcript.len();
        state.transcript = Arc::new(Vec::new());
        self.publish(&state);
        drop(state);

        info!("Session reset ({} messages cleared)", cleared);
        self.conversation_logger
            .log(ConversationEvent::SessionReset { cleared });
    }

    /// Apply a streaming increment to the reply of `request`.
    ///
    /// Deliveries for a request that is no longer current (cancelled, reset,
    /// or already finished) are dropped. Never touches `pending`.
    fn stream_chunk(&self, request: RequestId, partial: &str) -> bool {
        let mut state = self.lock_state();
        if state.current(request).is_none() {
            debug!("Discarding {} byte chunk from stale request", partial.len());
            return false;
        }
        // Appended in place; the state lock keeps this ordered with publish
        self.snapshot_tx.send_modify(|snapshot| {
            if let Some(reply) = snapshot.streaming.as_mut() {
                reply.text.push_str(partial);
            }
        });
        true
    }

    fn begin(&self, text: &str) -> Result<(RequestId, CancellationToken, ChatRequest), SessionError> {
        let mut state = self.lock_state();
        if state.in_flight.is_some() {
            debug!("Rejecting submission while a response is pending");
            return Err(SessionError::Busy);
        }

        let user = ChatMessage::user(state.ids.next_id(), text);
        let reply_id = state.ids.next_id();
        Arc::make_mut(&mut state.transcript).push(user.clone());

        state.next_request += 1;
        let request = RequestId(state.next_request);
        let token = CancellationToken::new();
        state.in_flight = Some(InFlight {
            request,
            token: token.clone(),
            reply_id,
        });

        let chat_request = ChatRequest {
            model: self.config.model.clone(),
            system_instruction: self.config.system_instruction.clone(),
            messages: state.transcript.to_vec(),
        };
        self.publish(&state);
        drop(state);

        info!(
            "Submitting turn {} to {}: {}",
            user.id,
            self.config.model,
            preview(text)
        );
        self.conversation_logger.log(ConversationEvent::UserMessage {
            id: user.id,
            model: self.config.model.clone(),
            text: user.text,
        });

        Ok((request, token, chat_request))
    }

    /// Run the model call until a terminal event. Returns the text carried by
    /// `Completed`.
    async fn drive(
        &self,
        request: RequestId,
        token: &CancellationToken,
        chat_request: &ChatRequest,
    ) -> Result<String, SessionError> {
        let handle = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(SessionError::Cancelled),
            result = self.gateway.send_streaming(chat_request) => result?,
        };
        let mut receiver = handle.receiver;

        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(SessionError::Cancelled),
                event = receiver.recv() => event,
            };

            match event {
                Some(StreamEvent::Delta(chunk)) => {
                    self.stream_chunk(request, &chunk);
                }
                Some(StreamEvent::Completed(text)) => return Ok(text),
                Some(StreamEvent::Error(e)) => {
                    return Err(GatewayError::RequestFailed(e).into());
                }
                None => return Err(GatewayError::TransportClosed.into()),
            }
        }
    }

    fn finish(&self, request: RequestId, completed: String) -> Result<ChatMessage, SessionError> {
        let mut state = self.lock_state();
        let Some(in_flight) = state.take_current(request) else {
            return Err(SessionError::Cancelled);
        };

        let mut reply = ChatMessage::model(in_flight.reply_id, String::new());
        let transcript = &mut state.transcript;
        self.snapshot_tx.send_modify(|snapshot| {
            if let Some(streamed) = snapshot.streaming.take()
                && streamed.id == reply.id
            {
                reply.text = streamed.text;
            }
            // Non-streaming adapters deliver everything in the terminal event
            if reply.text.is_empty() {
                reply.text = completed;
            }
            Arc::make_mut(transcript).push(reply.clone());
            snapshot.transcript = Arc::clone(transcript);
            snapshot.pending = false;
        });
        drop(state);

        info!("Model reply {} complete ({} bytes)", reply.id, reply.text.len());
        self.conversation_logger.log(ConversationEvent::ModelResponse {
            id: reply.id,
            model: self.config.model.clone(),
            text: reply.text.clone(),
        });
        Ok(reply)
    }

    /// Return to idle after a failed request. A request that is no longer
    /// current was cancelled, so its caller gets `Cancelled`.
    fn abort(&self, request: RequestId, error: SessionError) -> SessionError {
        let mut state = self.lock_state();
        if state.take_current(request).is_none() {
            return SessionError::Cancelled;
        }
        self.publish(&state);
        drop(state);

        warn!("Model request failed: {}", error);
        self.conversation_logger.log(ConversationEvent::RequestFailed {
            error: error.to_string(),
        });
        error
    }

    /// Clear the in-flight slot of a `submit` future dropped mid-call.
    fn abandon(&self, request: RequestId) {
        let mut state = self.lock_state();
        if let Some(in_flight) = state.take_current(request) {
            in_flight.token.cancel();
            self.publish(&state);
            debug!("Submit future dropped; request abandoned");
        }
    }

    /// Publish `state` as one snapshot. Streamed text of the current reply
    /// lives only in the snapshot and is carried over, never copied.
    fn publish(&self, state: &SessionState) {
        let reply_id = state.in_flight.as_ref().map(|f| f.reply_id);
        self.snapshot_tx.send_modify(|snapshot| {
            snapshot.transcript = Arc::clone(&state.transcript);
            snapshot.pending = reply_id.is_some();
            match reply_id {
                Some(id) if snapshot.streaming.as_ref().is_some_and(|m| m.id == id) => {}
                Some(id) => snapshot.streaming = Some(ChatMessage::model(id, String::new())),
                None => snapshot.streaming = None,
            }
        });
    }

    // State is only mutated in short critical sections that leave it
    // consistent, so a poisoned lock is still safe to use.
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// First line of a message, shortened for logs.
fn preview(text: &str) -> &str {
    const MAX_BYTES: usize = 100;
    let line = text.lines().next().unwrap_or_default();
    if line.len() <= MAX_BYTES {
        return line;
    }
    let mut end = MAX_BYTES;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

struct InFlightGuard<'a> {
    session: &'a ChatSession,
    request: RequestId,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.abandon(self.request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::StreamHandle;
    use async_trait::async_trait;
    use multiturn_domain::{Model, Role};
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::mpsc;

    // ==================== Test Mocks ====================

    /// Replays one pre-recorded event list per call and records requests.
    struct ScriptedGateway {
        scripts: Mutex<VecDeque<Result<Vec<StreamEvent>, GatewayError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedGateway {
        fn new(scripts: Vec<Result<Vec<StreamEvent>, GatewayError>>) -> Self {
            Self {
                scripts: Mutex::new(VecDeque::from(scripts)),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn replies(texts: &[&str]) -> Self {
            Self::new(
                texts
                    .iter()
                    .map(|t| Ok(vec![StreamEvent::Completed(t.to_string())]))
                    .collect(),
            )
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn send(&self, _request: &ChatRequest) -> Result<String, GatewayError> {
            Err(GatewayError::Other("streaming only".to_string()))
        }

        async fn send_streaming(
            &self,
            request: &ChatRequest,
        ) -> Result<StreamHandle, GatewayError> {
            self.requests.lock().unwrap().push(request.clone());
            let events = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| GatewayError::Other("No more responses".to_string()))??;
            let (tx, rx) = mpsc::channel(events.len().max(1));
            for event in events {
                tx.try_send(event).unwrap();
            }
            Ok(StreamHandle::new(rx))
        }
    }

    /// Hands the sending half of every stream to the test.
    struct ManualGateway {
        streams: mpsc::UnboundedSender<mpsc::Sender<StreamEvent>>,
    }

    impl ManualGateway {
        fn new() -> (Self, mpsc::UnboundedReceiver<mpsc::Sender<StreamEvent>>) {
            let (streams, rx) = mpsc::unbounded_channel();
            (Self { streams }, rx)
        }
    }

    #[async_trait]
    impl LlmGateway for ManualGateway {
        async fn send(&self, _request: &ChatRequest) -> Result<String, GatewayError> {
            Err(GatewayError::Other("streaming only".to_string()))
        }

        async fn send_streaming(
            &self,
            _request: &ChatRequest,
        ) -> Result<StreamHandle, GatewayError> {
            let (tx, rx) = mpsc::channel(16);
            self.streams
                .send(tx)
                .map_err(|_| GatewayError::TransportClosed)?;
            Ok(StreamHandle::new(rx))
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<&'static str>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events.lock().unwrap().push(event.kind());
        }
    }

    fn session_with(gateway: impl LlmGateway + 'static) -> Arc<ChatSession> {
        Arc::new(ChatSession::new(Arc::new(gateway), SessionConfig::default()))
    }

    fn texts(session: &ChatSession) -> Vec<(Role, String)> {
        session
            .transcript()
            .iter()
            .map(|m| (m.role, m.text.clone()))
            .collect()
    }

    // ==================== Round trips ====================

    #[tokio::test]
    async fn streamed_reply_is_aggregated() {
        let session = session_with(ScriptedGateway::new(vec![Ok(vec![
            StreamEvent::Delta("Hi".to_string()),
            StreamEvent::Delta(" there".to_string()),
            StreamEvent::Completed("Hi there".to_string()),
        ])]));

        let reply = session.submit("Hello").await.unwrap();

        assert_eq!(reply.role, Role::Model);
        assert_eq!(reply.text, "Hi there");
        assert_eq!(
            texts(&session),
            vec![
                (Role::User, "Hello".to_string()),
                (Role::Model, "Hi there".to_string()),
            ]
        );
        assert!(!session.is_pending());
        assert!(session.snapshot().streaming.is_none());
    }

    #[tokio::test]
    async fn completed_text_is_used_when_no_deltas_arrive() {
        let session = session_with(ScriptedGateway::replies(&["whole answer"]));
        let reply = session.submit("q").await.unwrap();
        assert_eq!(reply.text, "whole answer");
    }

    #[tokio::test]
    async fn deltas_win_over_completed_text() {
        let session = session_with(ScriptedGateway::new(vec![Ok(vec![
            StreamEvent::Delta("streamed".to_string()),
            StreamEvent::Completed("ignored".to_string()),
        ])]));
        assert_eq!(session.submit("q").await.unwrap().text, "streamed");
    }

    #[tokio::test]
    async fn rounds_alternate_user_and_model() {
        let session = session_with(ScriptedGateway::replies(&["one", "two", "three"]));

        for question in ["a", "b", "c"] {
            session.submit(question).await.unwrap();
        }

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 6);
        for (i, message) in transcript.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Model };
            assert_eq!(message.role, expected);
        }
        assert!(transcript.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn gateway_receives_full_transcript_and_settings() {
        let gateway = Arc::new(ScriptedGateway::replies(&["first", "second"]));
        let config = SessionConfig::new(Model::Gemini15Pro).with_system_instruction("Be terse.");
        let session = ChatSession::new(gateway.clone(), config);

        session.submit("q1").await.unwrap();
        session.submit("q2").await.unwrap();

        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].model, Model::Gemini15Pro);
        assert_eq!(requests[0].system_instruction.as_deref(), Some("Be terse."));

        let second: Vec<&str> = requests[1].messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(second, vec!["q1", "first", "q2"]);
    }

    // ==================== Validation ====================

    #[tokio::test]
    async fn blank_input_is_rejected_without_effects() {
        let gateway = Arc::new(ScriptedGateway::replies(&[]));
        let session = ChatSession::new(gateway.clone(), SessionConfig::default());
        let mut rx = session.subscribe();

        assert_eq!(session.submit("").await, Err(SessionError::EmptyInput));
        assert_eq!(session.submit("   ").await, Err(SessionError::EmptyInput));

        assert!(session.transcript().is_empty());
        assert!(!session.is_pending());
        assert!(!rx.has_changed().unwrap());
        assert!(gateway.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_while_pending_is_busy() {
        let (gateway, mut streams) = ManualGateway::new();
        let session = session_with(gateway);

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("A").await }
        });
        let stream = streams.recv().await.unwrap();
        assert!(session.is_pending());

        assert_eq!(session.submit("B").await, Err(SessionError::Busy));
        assert_eq!(texts(&session), vec![(Role::User, "A".to_string())]);

        stream
            .send(StreamEvent::Completed("reply to A".to_string()))
            .await
            .unwrap();
        assert_eq!(first.await.unwrap().unwrap().text, "reply to A");

        assert!(session.transcript().iter().all(|m| m.text != "B"));
        assert_eq!(session.transcript().len(), 2);
    }

    // ==================== Failures ====================

    #[tokio::test]
    async fn stream_error_keeps_user_message_and_allows_resubmit() {
        let session = session_with(ScriptedGateway::new(vec![
            Ok(vec![
                StreamEvent::Delta("par".to_string()),
                StreamEvent::Error("quota exceeded".to_string()),
            ]),
            Ok(vec![StreamEvent::Completed("ok".to_string())]),
        ]));

        let err = session.submit("first").await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Transport(GatewayError::RequestFailed("quota exceeded".to_string()))
        );
        assert!(!session.is_pending());
        assert_eq!(texts(&session), vec![(Role::User, "first".to_string())]);

        session.submit("again").await.unwrap();
        assert_eq!(session.transcript().len(), 3);
    }

    #[tokio::test]
    async fn gateway_error_is_surfaced_verbatim() {
        let session = session_with(ScriptedGateway::new(vec![Err(GatewayError::RateLimited)]));
        assert_eq!(
            session.submit("q").await,
            Err(SessionError::Transport(GatewayError::RateLimited))
        );
        assert!(!session.is_pending());
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn stream_closed_without_terminal_event_is_transport_error() {
        let session = session_with(ScriptedGateway::new(vec![Ok(vec![StreamEvent::Delta(
            "cut".to_string(),
        )])]));
        assert_eq!(
            session.submit("q").await,
            Err(SessionError::Transport(GatewayError::TransportClosed))
        );
        assert!(session.snapshot().streaming.is_none());
    }

    // ==================== Cancellation ====================

    #[tokio::test]
    async fn cancel_discards_partial_reply_and_late_chunks() {
        let (gateway, mut streams) = ManualGateway::new();
        let session = session_with(gateway);
        let mut rx = session.subscribe();

        let pending = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("Hello").await }
        });
        let stream = streams.recv().await.unwrap();
        stream.send(StreamEvent::Delta("Hi".to_string())).await.unwrap();
        rx.wait_for(|s| s.streaming_text() == "Hi").await.unwrap();

        let request = session.lock_state().in_flight.as_ref().map(|f| f.request).unwrap();
        assert!(session.cancel());

        assert_eq!(pending.await.unwrap(), Err(SessionError::Cancelled));
        assert!(!session.is_pending());
        assert_eq!(texts(&session), vec![(Role::User, "Hello".to_string())]);

        // Late deliveries from the cancelled call change nothing
        assert!(!session.stream_chunk(request, " there"));
        let _ = stream.send(StreamEvent::Delta(" there".to_string())).await;
        assert_eq!(session.transcript().len(), 1);
        assert!(session.snapshot().streaming.is_none());
    }

    #[tokio::test]
    async fn cancel_when_idle_is_a_no_op() {
        let session = session_with(ScriptedGateway::replies(&["x"]));
        assert!(!session.cancel());
        assert!(!session.cancel());
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn dropped_submit_future_releases_pending() {
        let (gateway, _streams) = ManualGateway::new();
        let session = session_with(gateway);

        let result = tokio::time::timeout(Duration::from_millis(20), session.submit("slow")).await;
        assert!(result.is_err());

        assert!(!session.is_pending());
        assert_eq!(texts(&session), vec![(Role::User, "slow".to_string())]);
    }

    // ==================== Reset ====================

    #[tokio::test]
    async fn reset_clears_everything_from_idle() {
        let session = session_with(ScriptedGateway::replies(&["r1", "r2"]));
        session.submit("q").await.unwrap();
        let last_id = session.transcript()[1].id;

        session.reset();
        assert!(session.transcript().is_empty());
        assert!(!session.is_pending());

        session.submit("after reset").await.unwrap();
        assert!(session.transcript()[0].id > last_id);
    }

    #[tokio::test]
    async fn reset_while_pending_cancels_the_call() {
        let (gateway, mut streams) = ManualGateway::new();
        let session = session_with(gateway);

        let pending = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("Hello").await }
        });
        let stream = streams.recv().await.unwrap();

        session.reset();

        assert_eq!(pending.await.unwrap(), Err(SessionError::Cancelled));
        let _ = stream.send(StreamEvent::Completed("late".to_string())).await;
        let snapshot = session.snapshot();
        assert!(snapshot.transcript.is_empty());
        assert!(!snapshot.pending);
        assert!(snapshot.streaming.is_none());
    }

    #[tokio::test]
    async fn reset_after_failed_request_clears_everything() {
        let session = session_with(ScriptedGateway::new(vec![
            Err(GatewayError::Timeout),
            Ok(vec![StreamEvent::Completed("fresh".to_string())]),
        ]));

        assert!(session.submit("doomed").await.is_err());
        assert_eq!(session.transcript().len(), 1);

        session.reset();
        let snapshot = session.snapshot();
        assert!(snapshot.transcript.is_empty());
        assert!(!snapshot.pending);
        assert!(snapshot.streaming.is_none());

        session.submit("again").await.unwrap();
        assert_eq!(
            texts(&session),
            vec![
                (Role::User, "again".to_string()),
                (Role::Model, "fresh".to_string()),
            ]
        );
    }

    // ==================== Observation ====================

    #[tokio::test]
    async fn observers_see_pending_then_complete_transcript() {
        let (gateway, mut streams) = ManualGateway::new();
        let session = session_with(gateway);
        let mut rx = session.subscribe();

        let task = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("Hello").await }
        });

        let pending = rx.wait_for(|s| s.pending).await.unwrap().clone();
        assert_eq!(pending.transcript.len(), 1);
        assert_eq!(pending.streaming_text(), "");

        let stream = streams.recv().await.unwrap();
        stream.send(StreamEvent::Delta("Hi".to_string())).await.unwrap();
        stream.send(StreamEvent::Delta(" there".to_string())).await.unwrap();
        stream
            .send(StreamEvent::Completed("Hi there".to_string()))
            .await
            .unwrap();
        task.await.unwrap().unwrap();

        let done = rx.wait_for(|s| !s.pending).await.unwrap().clone();
        assert_eq!(done.transcript.len(), 2);
        assert_eq!(done.transcript[1].text, "Hi there");
        assert!(done.streaming.is_none());
    }

    #[tokio::test]
    async fn streaming_reply_grows_under_its_final_id() {
        let (gateway, mut streams) = ManualGateway::new();
        let session = session_with(gateway);
        let mut rx = session.subscribe();

        let task = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("count").await }
        });
        let stream = streams.recv().await.unwrap();

        let mut expected = String::new();
        for n in 0..50 {
            let chunk = format!("{} ", n);
            expected.push_str(&chunk);
            stream.send(StreamEvent::Delta(chunk)).await.unwrap();
        }
        let streaming = rx
            .wait_for(|s| s.streaming_text() == expected)
            .await
            .unwrap()
            .streaming
            .clone()
            .unwrap();

        stream
            .send(StreamEvent::Completed(expected.clone()))
            .await
            .unwrap();
        let reply = task.await.unwrap().unwrap();

        assert_eq!(reply.id, streaming.id);
        assert_eq!(reply.text, expected);
        assert!(session.snapshot().streaming.is_none());
    }

    #[tokio::test]
    async fn available_models_come_from_the_gateway() {
        let session = session_with(ScriptedGateway::replies(&[]));
        assert_eq!(
            session.available_models().await.unwrap(),
            Model::known_models()
        );
    }

    #[test]
    fn preview_keeps_first_line_within_limit() {
        assert_eq!(preview("short\nsecond line"), "short");
        assert_eq!(preview(""), "");
        let long = "é".repeat(80);
        let cut = preview(&long);
        assert!(cut.len() <= 100);
        assert!(long.starts_with(cut));
    }

    #[tokio::test]
    async fn conversation_events_are_logged() {
        let logger = Arc::new(RecordingLogger::default());
        let session = ChatSession::new(
            Arc::new(ScriptedGateway::new(vec![
                Ok(vec![StreamEvent::Completed("ok".to_string())]),
                Err(GatewayError::Timeout),
            ])),
            SessionConfig::default(),
        )
        .with_conversation_logger(logger.clone());

        session.submit("one").await.unwrap();
        let _ = session.submit("two").await;
        session.reset();

        assert_eq!(
            *logger.events.lock().unwrap(),
            vec![
                "user_message",
                "model_response",
                "user_message",
                "request_failed",
                "session_reset",
            ]
        );
    }
}
