//! Deterministic reasoning component driven by the dispatch policy.
//!
//! It plays the part a language model would: on the first pass it asks for
//! the operations the policy selects, and once results are fed back it
//! summarises them.

use std::sync::Arc;

use cdprovider::{
    ProviderError, ProviderFuture, ReasoningProvider, ReasoningRequest, ReasoningResponse,
    ToolCall, ToolDefinition, ToolResult,
};

use crate::{Classification, DispatchPolicy, compose};

pub const POLICY_REASONER_NAME: &str = "policy";

#[derive(Clone)]
pub struct PolicyReasoner {
    policy: Arc<dyn DispatchPolicy>,
}

impl PolicyReasoner {
    pub fn new(policy: Arc<dyn DispatchPolicy>) -> Self {
        Self { policy }
    }

    fn plan(&self, request: &ReasoningRequest) -> Result<ReasoningResponse, ProviderError> {
        let utterance = request
            .latest_user_message()
            .ok_or_else(|| ProviderError::invalid_request("no user message to reason about"))?;

        let response = match self.policy.classify(utterance, &request.tools) {
            Classification::Matched(targets) => {
                let calls = targets
                    .into_iter()
                    .enumerate()
                    .map(|(index, target)| {
                        ToolCall::new(format!("call_{}", index + 1), target.operation)
                            .with_argument(target.input_key, target.reference)
                    })
                    .collect();
                ReasoningResponse::tool_calls(POLICY_REASONER_NAME, calls)
            }
            Classification::Incomplete(domain) => ReasoningResponse::clarification(
                POLICY_REASONER_NAME,
                compose::clarify_reference(domain),
            ),
            Classification::Ambiguous(domains) => ReasoningResponse::clarification(
                POLICY_REASONER_NAME,
                compose::clarify_domains(&domains),
            ),
            Classification::Unmatched { topic } => {
                ReasoningResponse::message(POLICY_REASONER_NAME, compose::general_guidance(topic))
            }
        };

        Ok(response)
    }
}

impl ReasoningProvider for PolicyReasoner {
    fn name(&self) -> &str {
        POLICY_REASONER_NAME
    }

    fn complete<'a>(
        &'a self,
        request: ReasoningRequest,
    ) -> ProviderFuture<'a, Result<ReasoningResponse, ProviderError>> {
        Box::pin(async move {
            if request.tool_results.is_empty() {
                return self.plan(&request);
            }

            let summary = summarise(&request.tools, &request.tool_results);
            Ok(ReasoningResponse::message(POLICY_REASONER_NAME, summary))
        })
    }
}

/// One paragraph per result, in invocation order.
pub fn summarise(tools: &[ToolDefinition], results: &[ToolResult]) -> String {
    results
        .iter()
        .map(|result| {
            let definition = tools.iter().find(|definition| definition.name == result.name);
            let reference = definition
                .and_then(|definition| result.arguments.get(&definition.input_key))
                .or_else(|| result.arguments.values().next())
                .map(String::as_str)
                .unwrap_or("your reference");
            compose::outcome_summary(
                definition.map(|definition| definition.domain),
                reference,
                &result.outcome,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use cdcommon::Domain;
    use cdprovider::{Message, OutputItem, Role, StopReason, ToolOutcome};
    use cdtooling::builtin_operations;
    use serde_json::json;

    use super::*;
    use crate::KeywordDispatchPolicy;

    fn reasoner() -> PolicyReasoner {
        PolicyReasoner::new(Arc::new(KeywordDispatchPolicy::new().expect("policy")))
    }

    fn request(text: &str) -> ReasoningRequest {
        ReasoningRequest::new(vec![Message::new(Role::User, text)]).with_tools(
            builtin_operations()
                .iter()
                .map(|operation| operation.definition())
                .collect(),
        )
    }

    #[tokio::test]
    async fn first_pass_requests_the_selected_operation() {
        let response = reasoner()
            .complete(request("grievance status GRV-2024-001"))
            .await
            .expect("response");

        assert_eq!(response.stop_reason, StopReason::ToolUse);
        match &response.output[..] {
            [OutputItem::ToolCall(call)] => {
                assert_eq!(call.name, "grievance-status");
                assert_eq!(
                    call.arguments.get("grievance_id").map(String::as_str),
                    Some("GRV-2024-001")
                );
            }
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_pass_summarises_results() {
        let call = ToolCall::new("call_1", "identity-status")
            .with_argument("identity_number", "ABCD1234EFGH");
        let result = ToolResult::from_call(
            &call,
            ToolOutcome::NotFound {
                domain: Domain::Identity,
                key: "ABCD1234EFGH".to_string(),
            },
        );

        let response = reasoner()
            .complete(request("aadhaar status ABCD1234EFGH").with_tool_results(vec![result]))
            .await
            .expect("response");

        match &response.output[..] {
            [OutputItem::Message(message)] => {
                assert!(message.content.contains("could not find"));
                assert!(message.content.contains("https://uidai.gov.in"));
            }
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[tokio::test]
    async fn ambiguous_question_gets_a_clarification() {
        let response = reasoner()
            .complete(request("status of my passport and aadhaar"))
            .await
            .expect("response");
        assert_eq!(response.stop_reason, StopReason::Clarification);
    }

    #[test]
    fn summary_falls_back_to_any_argument() {
        let call = ToolCall::new("call_1", "vehicle-status").with_argument("plate", "DL01AB1234");
        let result = ToolResult::from_call(
            &call,
            ToolOutcome::Record {
                payload: json!({"status": "active"})
                    .as_object()
                    .cloned()
                    .expect("object"),
            },
        );

        let summary = summarise(&[], &[result]);
        assert!(summary.contains("DL01AB1234"));
        assert!(summary.contains("Current status: active."));
    }
}
