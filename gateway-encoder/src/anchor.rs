//! Builds the per-slot field maps `gateway_vocab::assemble_anchor` needs
//! from a structured `IntentEvent`, mirroring the four `build_*_slot`
//! helpers of the reference encoding pipeline.

use std::collections::BTreeMap;

use gateway_core::{IntentEvent, Slice};
use serde::Serialize;

use crate::params::canonicalize_dict;

fn enum_str<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value).expect("enum serialization is infallible") {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn tool_call(event: &IntentEvent) -> Option<String> {
    let tool_name = event.tool_name.as_ref()?;
    let method = event.tool_method.clone().unwrap_or_else(|| "unspecified_method".to_string());
    Some(format!("{tool_name}.{method}"))
}

pub fn action_fields(event: &IntentEvent) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    fields.insert("action".to_string(), enum_str(&event.action));
    fields.insert("actor_type".to_string(), enum_str(&event.actor.actor_type));
    if let Some(call) = tool_call(event) {
        fields.insert("tool_call".to_string(), call);
    }
    fields
}

pub fn resource_fields(event: &IntentEvent) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    fields.insert("resource_type".to_string(), enum_str(&event.resource.resource_type));
    if let Some(location) = &event.resource.location {
        fields.insert("resource_location".to_string(), location.clone());
    }
    if let Some(name) = &event.resource.name {
        fields.insert("resource_name".to_string(), name.clone());
    }
    if let Some(tool_name) = &event.tool_name {
        fields.insert("tool_name".to_string(), tool_name.clone());
        fields.insert("tool_method".to_string(), event.tool_method.clone().unwrap_or_else(|| enum_str(&event.action)));
    }
    fields
}

pub fn data_fields(event: &IntentEvent) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let sensitivity = event.data.sensitivity.first().map(enum_str).unwrap_or_else(|| "public".to_string());
    fields.insert("sensitivity".to_string(), sensitivity);
    fields.insert("pii".to_string(), event.data.pii.to_string());
    fields.insert("volume".to_string(), enum_str(&event.data.volume));

    if let (Some(params), Some(_)) = (&event.tool_params, &event.tool_name) {
        let canonical = canonicalize_dict(params);
        if !canonical.is_empty() {
            let bucket = if canonical.len() <= 120 { "short" } else { "long" };
            fields.insert("params_length".to_string(), bucket.to_string());
        }
    }
    fields
}

pub fn risk_fields(event: &IntentEvent) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    fields.insert("authn".to_string(), enum_str(&event.risk.authn));
    if let Some(rate_limit) = &event.rate_limit {
        fields.insert("rate_limit".to_string(), format!("{} calls in {}s", rate_limit.calls_in_window, rate_limit.window_seconds));
    }
    fields
}

pub fn fields_for(slice: Slice, event: &IntentEvent) -> BTreeMap<String, String> {
    match slice {
        Slice::Action => action_fields(event),
        Slice::Resource => resource_fields(event),
        Slice::Data => data_fields(event),
        Slice::Risk => risk_fields(event),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gateway_core::{Action, Actor, ActorType, Authn, Data, IntentEvent, Resource, ResourceType, Risk, SchemaVersion, Sensitivity, Volume};
    use uuid::Uuid;

    fn base_event() -> IntentEvent {
        IntentEvent {
            id: Uuid::nil(),
            tenant_id: "tenant-a".to_string(),
            schema_version: SchemaVersion::V1_3,
            timestamp: Utc::now(),
            actor: Actor { id: "agent-1".to_string(), actor_type: ActorType::Agent },
            action: Action::Read,
            resource: Resource { resource_type: ResourceType::Database, name: None, location: None },
            data: Data { sensitivity: vec![Sensitivity::Internal], pii: false, volume: Volume::Single },
            risk: Risk { authn: Authn::Required },
            layer: None,
            tool_name: None,
            tool_method: None,
            tool_params: None,
            rate_limit: None,
        }
    }

    #[test]
    fn action_fields_omit_tool_call_when_absent() {
        let event = base_event();
        let fields = action_fields(&event);
        assert_eq!(fields.get("action").unwrap(), "read");
        assert!(!fields.contains_key("tool_call"));
    }

    #[test]
    fn resource_fields_backfill_tool_method_from_action() {
        let mut event = base_event();
        event.tool_name = Some("query_db".to_string());
        let fields = resource_fields(&event);
        assert_eq!(fields.get("tool_method").unwrap(), "read");
    }

    #[test]
    fn data_fields_bucket_short_params() {
        let mut event = base_event();
        event.tool_name = Some("query_db".to_string());
        event.tool_params = Some(serde_json::json!({"limit": 10}));
        let fields = data_fields(&event);
        assert_eq!(fields.get("params_length").unwrap(), "short");
    }

    #[test]
    fn risk_fields_include_rate_limit_when_present() {
        let mut event = base_event();
        event.rate_limit = Some(gateway_core::RateLimitContext { calls_in_window: 5, window_seconds: 60 });
        let fields = risk_fields(&event);
        assert!(fields.get("rate_limit").unwrap().contains("5 calls"));
    }
}
