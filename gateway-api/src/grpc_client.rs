//! [`gateway_proxy::EnforcementClient`] implementation backed by the
//! generated `EnforcementServiceClient`. This is the "remote deployment"
//! half of the transport seam gateway-proxy defines; `LocalEnforcementClient`
//! there covers the in-process half.

use async_trait::async_trait;
use gateway_core::{BlockReason, ComparisonResult, Decision, Effect, ErrorEffect, EvidenceEntry, IntentEvent, OperationalError, PolicyEffect};
use gateway_proxy::{transport_error_effect, EnforcementClient, EnforcementTransportError};
use tonic::transport::Channel;
use uuid::Uuid;

use crate::proto::{enforcement_service_client::EnforcementServiceClient, EnforceRequest};

/// Enforces over gRPC against a remote enforcement service. The generated
/// client isn't `Sync` to call concurrently without serialization, so
/// calls are queued through a mutex rather than cloned per-call — cloning
/// `EnforcementServiceClient<Channel>` is cheap (it's a thin handle over a
/// shared `Channel`), but keeping one owned client avoids an extra clone
/// on the hot path.
pub struct GrpcEnforcementClient {
    client: tokio::sync::Mutex<EnforcementServiceClient<Channel>>,
}

impl GrpcEnforcementClient {
    pub async fn connect(endpoint: String) -> Result<Self, tonic::transport::Error> {
        let client = EnforcementServiceClient::connect(endpoint).await?;
        Ok(Self { client: tokio::sync::Mutex::new(client) })
    }

    pub fn from_channel(channel: Channel) -> Self {
        Self { client: tokio::sync::Mutex::new(EnforcementServiceClient::new(channel)) }
    }
}

#[async_trait]
impl EnforcementClient for GrpcEnforcementClient {
    async fn enforce(&self, intent: &IntentEvent) -> Effect<ComparisonResult> {
        let intent_event_json = match serde_json::to_string(intent) {
            Ok(json) => json,
            Err(e) => {
                return Effect::Err(ErrorEffect::Operational(OperationalError::SerializationError {
                    message: format!("failed to encode intent event: {e}"),
                }));
            }
        };

        let request = tonic::Request::new(EnforceRequest { intent_event_json, intent_vector: Vec::new() });

        let response = {
            let mut client = self.client.lock().await;
            match client.enforce(request).await {
                Ok(response) => response,
                Err(status) => return Effect::Err(transport_error_effect(map_status(status))),
            }
        }
        .into_inner();

        Effect::Ok(into_comparison_result(response))
    }
}

fn into_comparison_result(response: crate::proto::EnforceResponse) -> ComparisonResult {
    let mut slice_similarities = [0.0f32; 4];
    for (slot, value) in slice_similarities.iter_mut().zip(response.slice_similarities.iter()) {
        *slot = *value;
    }

    let evidence = response
        .evidence
        .into_iter()
        .map(|entry| EvidenceEntry {
            policy_id: Uuid::parse_str(&entry.policy_id).unwrap_or_else(|_| Uuid::nil()),
            policy_name: entry.policy_name,
            effect: if entry.effect == "deny" { PolicyEffect::Deny } else { PolicyEffect::Allow },
            local_decision: entry.local_decision as u8,
            slice_similarities: {
                let mut arr = [0.0f32; 4];
                for (slot, value) in arr.iter_mut().zip(entry.slice_similarities.iter()) {
                    *slot = *value;
                }
                arr
            },
            modification: entry.modification_json.as_deref().and_then(|json| serde_json::from_str(json).ok()),
        })
        .collect();

    let modified_params = response.modified_params_json.as_deref().and_then(|json| serde_json::from_str(json).ok());

    ComparisonResult {
        decision: if response.decision == 1 { Decision::Allow } else { Decision::Block },
        slice_similarities,
        policies_evaluated: response.policies_evaluated as usize,
        timestamp: chrono::Utc::now(),
        evidence,
        reason: response.block_reason.as_deref().and_then(parse_block_reason),
        drift: response.drift,
        modified_params,
        trace: None,
    }
}

fn parse_block_reason(reason: &str) -> Option<BlockReason> {
    match reason {
        "deny_matched" => Some(BlockReason::DenyMatched),
        "no_applicable_policy" => Some(BlockReason::NoApplicablePolicy),
        "encoding_failed" => Some(BlockReason::EncodingFailed),
        "transport_unavailable" => Some(BlockReason::TransportUnavailable),
        "mandatory_allow_unmet" => Some(BlockReason::MandatoryAllowUnmet),
        _ => None,
    }
}

/// `DEADLINE_EXCEEDED` and `UNAVAILABLE` both fail closed per the wire
/// RPC status mapping; `INVALID_ARGUMENT` is caller misuse but still
/// fails closed rather than risk an unintended ALLOW.
fn map_status(status: tonic::Status) -> EnforcementTransportError {
    match status.code() {
        tonic::Code::DeadlineExceeded => EnforcementTransportError::DeadlineExceeded,
        tonic::Code::InvalidArgument => {
            tracing::error!(message = status.message(), "enforcement RPC rejected as invalid argument");
            EnforcementTransportError::Unavailable(format!("invalid argument: {}", status.message()))
        }
        _ => EnforcementTransportError::Unavailable(status.message().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_exceeded_status_maps_to_deadline_exceeded() {
        let status = tonic::Status::deadline_exceeded("too slow");
        assert!(matches!(map_status(status), EnforcementTransportError::DeadlineExceeded));
    }

    #[test]
    fn unavailable_status_maps_to_unavailable() {
        let status = tonic::Status::unavailable("down");
        assert!(matches!(map_status(status), EnforcementTransportError::Unavailable(_)));
    }

    #[test]
    fn invalid_argument_status_fails_closed_as_unavailable() {
        let status = tonic::Status::invalid_argument("bad payload");
        assert!(matches!(map_status(status), EnforcementTransportError::Unavailable(_)));
    }

    #[test]
    fn block_reason_round_trips_known_codes() {
        assert_eq!(parse_block_reason("deny_matched"), Some(BlockReason::DenyMatched));
        assert_eq!(parse_block_reason("mandatory_allow_unmet"), Some(BlockReason::MandatoryAllowUnmet));
        assert_eq!(parse_block_reason("something_unknown"), None);
    }

    #[test]
    fn empty_response_decodes_to_block_with_zeroed_similarities() {
        let response = crate::proto::EnforceResponse {
            decision: 0,
            slice_similarities: vec![],
            policies_evaluated: 0,
            evidence: vec![],
            block_reason: Some("no_applicable_policy".to_string()),
            drift: None,
            modified_params_json: None,
        };
        let result = into_comparison_result(response);
        assert_eq!(result.decision, Decision::Block);
        assert_eq!(result.slice_similarities, [0.0; 4]);
        assert_eq!(result.reason, Some(BlockReason::NoApplicablePolicy));
        assert_eq!(result.drift, None);
    }

    #[test]
    fn response_carries_drift_and_modification_through() {
        let response = crate::proto::EnforceResponse {
            decision: 1,
            slice_similarities: vec![0.9, 0.9, 0.9, 0.9],
            policies_evaluated: 1,
            evidence: vec![crate::proto::EvidenceEntry {
                policy_id: Uuid::nil().to_string(),
                policy_name: "allow-reads".to_string(),
                effect: "allow".to_string(),
                local_decision: 1,
                slice_similarities: vec![0.9, 0.9, 0.9, 0.9],
                modification_json: Some(r#"{"kind":"require_approval"}"#.to_string()),
            }],
            block_reason: None,
            drift: Some(0.42),
            modified_params_json: Some(r#"{"kind":"require_approval"}"#.to_string()),
        };
        let result = into_comparison_result(response);
        assert_eq!(result.drift, Some(0.42));
        assert!(result.modified_params.is_some());
        assert!(result.evidence[0].modification.is_some());
    }
}
