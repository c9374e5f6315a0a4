use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cdchat::compose::{GENERAL_GUIDANCE_LABEL, TURN_ERROR_REPLY};
use cdchat::prelude::*;
use cdchat::{RespondedWith, redact};
use cdprovider::{
    ProviderError, ProviderFuture, ReasoningProvider, ReasoningRequest, ReasoningResponse, Role,
    ToolCall, ToolDefinition, ToolOutcome, ToolResult,
};
use cdtooling::{
    InMemoryRecordStore, LocalToolRuntime, ToolExecutionContext, ToolFuture, ToolRuntime,
    ToolServer,
};
use serde_json::json;

struct CountingTools {
    inner: Box<dyn ToolRuntime>,
    calls: AtomicUsize,
}

impl CountingTools {
    fn records() -> Arc<Self> {
        let store = InMemoryRecordStore::from_json_value(json!({
            "aadhaar": {"EN-2024-0001": {"status": "Aadhaar generated", "name": "R. Sharma"}},
            "pan": {"ACK-PAN-7781": {"status": "Under processing"}},
            "passport": {"PSK-DL-0042": {"status": "Dispatched", "speed_post": "EK123456789IN"}},
            "grievances": {"GRV-2024-001": {"status": "resolved", "closed_on": "2024-03-01"}}
        }))
        .expect("records");
        let server = ToolServer::with_builtin_operations("records", Arc::new(store)).expect("server");
        Self::wrap(Box::new(LocalToolRuntime::new(Arc::new(server))))
    }

    fn wrap(inner: Box<dyn ToolRuntime>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ToolRuntime for CountingTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.inner.definitions()
    }

    fn invoke<'a>(
        &'a self,
        tool_call: ToolCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, ToolResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.invoke(tool_call, context)
    }
}

/// Behaves like a server that never answers: every call is unavailable.
struct SilentTools {
    definitions: Vec<ToolDefinition>,
}

impl ToolRuntime for SilentTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.clone()
    }

    fn invoke<'a>(
        &'a self,
        tool_call: ToolCall,
        _context: ToolExecutionContext,
    ) -> ToolFuture<'a, ToolResult> {
        Box::pin(async move {
            ToolResult::from_call(
                &tool_call,
                ToolOutcome::Unavailable {
                    message: "no response after 2 attempts".to_string(),
                },
            )
        })
    }
}

/// Answers confidently without ever asking for an operation.
struct OverconfidentProvider;

impl ReasoningProvider for OverconfidentProvider {
    fn name(&self) -> &str {
        "overconfident"
    }

    fn complete<'a>(
        &'a self,
        _request: ReasoningRequest,
    ) -> ProviderFuture<'a, Result<ReasoningResponse, ProviderError>> {
        Box::pin(async move {
            Ok(ReasoningResponse::message(
                "overconfident",
                "Your passport has been dispatched.",
            ))
        })
    }
}

/// Asks for more lookups than a turn allows, none of them the one the user wants.
struct CrowdingProvider;

impl ReasoningProvider for CrowdingProvider {
    fn name(&self) -> &str {
        "crowding"
    }

    fn complete<'a>(
        &'a self,
        request: ReasoningRequest,
    ) -> ProviderFuture<'a, Result<ReasoningResponse, ProviderError>> {
        Box::pin(async move {
            if !request.tool_results.is_empty() {
                return Ok(ReasoningResponse::message(
                    "crowding",
                    "Every application was approved yesterday.",
                ));
            }

            let calls = (1..=5)
                .map(|index| {
                    ToolCall::new(format!("call_{index}"), "tax_id-status")
                        .with_argument("tax_id_number", format!("ACK-PAN-000{index}"))
                })
                .collect();
            Ok(ReasoningResponse::tool_calls("crowding", calls))
        })
    }
}

struct FailingProvider;

impl ReasoningProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn complete<'a>(
        &'a self,
        _request: ReasoningRequest,
    ) -> ProviderFuture<'a, Result<ReasoningResponse, ProviderError>> {
        Box::pin(async move { Err(ProviderError::unavailable("reasoning backend is down")) })
    }
}

fn policy_service(tools: Arc<CountingTools>, store: Arc<InMemoryConversationStore>) -> ConversationService {
    let policy: Arc<dyn DispatchPolicy> =
        Arc::new(KeywordDispatchPolicy::new().expect("policy"));
    ConversationService::builder(Arc::new(PolicyReasoner::new(Arc::clone(&policy))), tools)
        .policy(policy)
        .store(store)
        .build()
        .expect("service")
}

fn ask(session: &str, text: &str) -> ChatTurnRequest {
    ChatTurnRequest::new(ChatSession::new(session), text)
}

#[tokio::test]
async fn resolved_grievance_is_reported_with_its_closing_date() {
    let tools = CountingTools::records();
    let service = policy_service(Arc::clone(&tools), Arc::new(InMemoryConversationStore::new()));

    let result = service
        .run_turn(ask("grv", "What is the status of my grievance GRV-2024-001?"))
        .await
        .expect("turn");

    assert_eq!(tools.calls(), 1);
    assert!(result.reply.contains("resolved, closed 2024-03-01"));
    assert!(result.reply.contains("No further action"));
    assert_eq!(result.classified_as(), Some(ClassifiedAs::Matched));
    assert!(
        result
            .states
            .contains(&TurnState::Responded(RespondedWith::Record))
    );
}

#[tokio::test]
async fn unknown_identity_reference_is_not_found_and_redirected() {
    let tools = CountingTools::records();
    let service = policy_service(Arc::clone(&tools), Arc::new(InMemoryConversationStore::new()));

    let result = service
        .run_turn(ask("id", "Check my aadhaar status for ABCD1234EFGH"))
        .await
        .expect("turn");

    assert_eq!(tools.calls(), 1);
    assert!(result.reply.contains("could not find"));
    assert!(result.reply.contains("ABCD1234EFGH"));
    assert!(result.reply.contains("https://uidai.gov.in"));
    assert!(!result.reply.to_lowercase().contains("generated"));
}

#[tokio::test]
async fn identity_number_is_intercepted_before_any_invocation() {
    let tools = CountingTools::records();
    let store = Arc::new(InMemoryConversationStore::new());
    let service = policy_service(Arc::clone(&tools), Arc::clone(&store));

    let result = service
        .run_turn(ask(
            "sensitive",
            "My aadhaar number is 1234 5678 9012, what is my status?",
        ))
        .await
        .expect("turn");

    assert_eq!(tools.calls(), 0);
    assert_eq!(result.invocation_count(), 0);
    assert_eq!(
        result.states,
        vec![
            TurnState::Received,
            TurnState::Classified(ClassifiedAs::Sensitive),
            TurnState::Composed,
        ]
    );
    assert!(result.reply.contains("privacy"));
    assert!(!result.reply.contains("1234 5678 9012"));
    assert!(!result.reply.contains("9012"));

    let saved = store.load_messages("sensitive").await.expect("saved");
    assert_eq!(saved.len(), 2);
    assert!(!saved[0].content.contains("9012"));
    assert!(saved[0].content.contains("[redacted]"));
}

#[tokio::test]
async fn document_question_gets_labelled_general_guidance() {
    let tools = CountingTools::records();
    let service = policy_service(Arc::clone(&tools), Arc::new(InMemoryConversationStore::new()));

    let result = service
        .run_turn(ask("docs", "What documents do I need for a new passport?"))
        .await
        .expect("turn");

    assert_eq!(tools.calls(), 0);
    assert_eq!(result.classified_as(), Some(ClassifiedAs::Unmatched));
    assert!(result.reply.starts_with(GENERAL_GUIDANCE_LABEL));
    assert!(result.reply.contains("https://www.passportindia.gov.in"));
}

#[tokio::test]
async fn skipped_lookup_is_still_invoked() {
    let tools = CountingTools::records();
    let service = ConversationService::builder(Arc::new(OverconfidentProvider), tools.clone())
        .build()
        .expect("service");

    let result = service
        .run_turn(ask("enforced", "passport application status PSK-DL-0042"))
        .await
        .expect("turn");

    assert_eq!(tools.calls(), 1);
    assert_eq!(result.invocation_count(), 1);
    assert!(result.invocations[0].outcome.is_record());
}

#[tokio::test]
async fn requested_lookup_is_kept_when_the_provider_exceeds_the_limit() {
    let tools = CountingTools::records();
    let service = ConversationService::builder(Arc::new(CrowdingProvider), tools.clone())
        .max_invocations_per_turn(3)
        .build()
        .expect("service");

    let result = service
        .run_turn(ask("crowded", "passport application status PSK-DL-0042"))
        .await
        .expect("turn");

    assert_eq!(tools.calls(), 3);
    assert_eq!(result.invocations[0].name, "travel_document-status");
    assert!(result.invocations[0].outcome.is_record());
    assert!(result.reply.contains("EK123456789IN"));
    assert!(result.reply.contains("ACK-PAN-0001"));
    assert!(result.reply.contains("ACK-PAN-0002"));
    assert!(!result.reply.contains("ACK-PAN-0003"));
    assert!(!result.reply.contains("approved yesterday"));
}

#[tokio::test]
async fn provider_status_is_not_repeated_after_a_missing_record() {
    let tools = CountingTools::records();
    let service = ConversationService::builder(Arc::new(OverconfidentProvider), tools.clone())
        .build()
        .expect("service");

    let result = service
        .run_turn(ask("missing", "passport status PSK-XX-0000"))
        .await
        .expect("turn");

    assert_eq!(tools.calls(), 1);
    assert!(result.reply.contains("could not find"));
    assert!(result.reply.contains("PSK-XX-0000"));
    assert!(result.reply.contains("https://www.passportindia.gov.in"));
    assert!(!result.reply.contains("has been dispatched"));
}

#[tokio::test]
async fn silent_server_yields_an_unavailable_reply_with_portal() {
    let definitions = CountingTools::records().definitions();
    let tools = CountingTools::wrap(Box::new(SilentTools { definitions }));
    let service = ConversationService::builder(Arc::new(OverconfidentProvider), tools.clone())
        .build()
        .expect("service");

    let result = service
        .run_turn(ask("silent", "track my passport PSK-DL-0042"))
        .await
        .expect("turn");

    assert_eq!(tools.calls(), 1);
    assert!(
        result
            .states
            .contains(&TurnState::Responded(RespondedWith::TransportError))
    );
    assert!(result.reply.contains("did not respond"));
    assert!(result.reply.contains("https://www.passportindia.gov.in"));
    assert!(!result.reply.contains("has been dispatched"));
}

#[tokio::test]
async fn failed_turn_leaves_conversation_state_untouched() {
    let store = Arc::new(InMemoryConversationStore::new());
    store
        .append_messages(
            "fail",
            vec![cdprovider::Message::new(Role::User, "earlier question")],
        )
        .await
        .expect("seed");

    let service = ConversationService::builder(Arc::new(FailingProvider), CountingTools::records())
        .store(store.clone())
        .build()
        .expect("service");

    let error = service
        .run_turn(ask("fail", "pan status ACK-PAN-7781"))
        .await
        .expect_err("reasoning failure");
    assert_eq!(error.kind, ChatErrorKind::Reasoning);

    let saved = store.load_messages("fail").await.expect("saved");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].content, "earlier question");
}

#[tokio::test]
async fn loop_survives_a_failed_turn_and_stops_on_exit() {
    let service = ConversationService::builder(Arc::new(FailingProvider), CountingTools::records())
        .build()
        .expect("service");
    let conversation = ConversationLoop::new(service, ChatSession::new("loop"));

    let input: &[u8] = b"pan status ACK-PAN-7781\nEXIT\ngrievance GRV-2024-001\n";
    let mut output = Vec::new();
    let turns = conversation.run(input, &mut output).await.expect("loop");

    let transcript = String::from_utf8(output).expect("utf8");
    assert_eq!(turns, 1);
    assert!(transcript.starts_with("Loaded 4 tools successfully."));
    assert!(transcript.contains(&format!("Agent: {TURN_ERROR_REPLY}")));
    assert!(transcript.contains("Goodbye"));
    assert!(!transcript.contains("GRV-2024-001"));
}

#[tokio::test]
async fn undecodable_input_is_answered_and_the_loop_continues() {
    let tools = CountingTools::records();
    let service = policy_service(tools.clone(), Arc::new(InMemoryConversationStore::new()));
    let conversation = ConversationLoop::new(service, ChatSession::new("bytes"));

    let input: &[u8] = b"\xff\xfe status?\ngrievance status GRV-2024-001\n";
    let mut output = Vec::new();
    let turns = conversation.run(input, &mut output).await.expect("loop");

    let transcript = String::from_utf8(output).expect("utf8");
    assert_eq!(turns, 2);
    assert_eq!(tools.calls(), 1);
    assert!(transcript.contains(TURN_ERROR_REPLY));
    assert!(transcript.contains("resolved, closed 2024-03-01"));
}

#[tokio::test]
async fn loop_ends_at_end_of_input() {
    let tools = CountingTools::records();
    let service = policy_service(Arc::clone(&tools), Arc::new(InMemoryConversationStore::new()));
    let conversation = ConversationLoop::new(service, ChatSession::new("eof"));

    let input: &[u8] = b"grievance status GRV-2024-001\n\n";
    let mut output = Vec::new();
    let turns = conversation.run(input, &mut output).await.expect("loop");

    let transcript = String::from_utf8(output).expect("utf8");
    assert_eq!(turns, 1);
    assert!(transcript.contains("Agent: I checked CPGRAMS"));
}

#[test]
fn redaction_hides_every_finding() {
    let policy = KeywordDispatchPolicy::new().expect("policy");
    let text = "otp 482913 and pan ABCDE1234F";
    let redacted = redact(text, &policy.screen(text));

    assert!(!redacted.contains("482913"));
    assert!(!redacted.contains("ABCDE1234F"));
}
