//! Builds an Intent Event from one intercepted tool call, using the
//! canonical vocabulary's keyword tables to infer the action and resource
//! type from the tool's name.

use chrono::Utc;
use gateway_core::{Action, Actor, ActorType, Authn, Data, IntentEvent, RateLimitContext, Resource, Risk, SchemaVersion, Sensitivity, Volume};
use gateway_vocab::VOCABULARY;
use uuid::Uuid;

use crate::tool_call::ToolCall;

const INTERCEPTION_LAYER: &str = "L4";

pub fn build_intent_event(
    tenant_id: &str,
    agent_id: &str,
    call: &impl ToolCall,
    rate_limit: Option<RateLimitContext>,
) -> IntentEvent {
    let action = VOCABULARY.infer_action_from_tool_name(call.tool_name());
    let resource_type = VOCABULARY.infer_resource_type_from_tool_name(call.tool_name());
    let pii = matches!(action, Action::Delete | Action::Export);

    IntentEvent {
        id: Uuid::now_v7(),
        tenant_id: tenant_id.to_string(),
        schema_version: SchemaVersion::V1_3,
        timestamp: Utc::now(),
        actor: Actor { id: agent_id.to_string(), actor_type: ActorType::Agent },
        action,
        resource: Resource { resource_type, name: Some(call.tool_name().to_string()), location: None },
        data: Data { sensitivity: vec![Sensitivity::Internal], pii, volume: Volume::Single },
        risk: Risk { authn: Authn::NotRequired },
        layer: Some(INTERCEPTION_LAYER.to_string()),
        tool_name: Some(call.tool_name().to_string()),
        tool_method: None,
        tool_params: Some(call.tool_args().clone()),
        rate_limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FakeCall {
        id: String,
        tool_name: String,
        args: serde_json::Value,
    }

    impl ToolCall for FakeCall {
        fn id(&self) -> &str {
            &self.id
        }
        fn tool_name(&self) -> &str {
            &self.tool_name
        }
        fn tool_args(&self) -> &serde_json::Value {
            &self.args
        }
    }

    #[test]
    fn delete_tool_names_are_flagged_pii() {
        let call = FakeCall { id: "1".into(), tool_name: "delete_record".into(), args: json!({}) };
        let event = build_intent_event("tenant-a", "agent-1", &call, None);
        assert_eq!(event.action, Action::Delete);
        assert!(event.data.pii);
    }

    #[test]
    fn read_tool_names_are_not_pii() {
        let call = FakeCall { id: "1".into(), tool_name: "read_file".into(), args: json!({}) };
        let event = build_intent_event("tenant-a", "agent-1", &call, None);
        assert_eq!(event.action, Action::Read);
        assert!(!event.data.pii);
    }

    #[test]
    fn tool_params_carries_call_args() {
        let call = FakeCall { id: "1".into(), tool_name: "query_db".into(), args: json!({"table": "accounts"}) };
        let event = build_intent_event("tenant-a", "agent-1", &call, None);
        assert_eq!(event.tool_params, Some(json!({"table": "accounts"})));
    }
}
