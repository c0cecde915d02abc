//! OpenAPI schema types for the policy management surface.
//!
//! These are wire DTOs and a schema aggregator only — there is no handler
//! wiring and no `axum::Router` here. A deployer assembles its own
//! service around `gateway-store`'s `PolicyStore` and `gateway-encoder`'s
//! `SemanticEncoder`; this module exists so that service can publish
//! (and a client can consume) a stable OpenAPI document for the
//! install/list/remove surface without hand-writing the schema twice.

use gateway_core::Policy;
use serde::{Deserialize, Serialize};

/// Anchor texts for each of the four slices, submitted alongside a policy
/// on install so the server can encode them into a Rule Vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnchorTextsDto {
    pub action: Vec<String>,
    pub resource: Vec<String>,
    pub data: Vec<String>,
    pub risk: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PolicyInstallRequest {
    pub policy: Policy,
    pub anchors: AnchorTextsDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PolicyListResponse {
    pub policies: Vec<Policy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PolicyRemoveResponse {
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: &'static str,
}

#[cfg(feature = "openapi")]
pub mod routes {
    use super::HealthResponse;
    use axum::{response::IntoResponse, Json};

    #[utoipa::path(get, path = "/health/ping", tag = "Health", responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    ))]
    pub async fn ping() -> impl IntoResponse {
        Json(HealthResponse { status: "ok" })
    }
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(
    info(title = "Gateway Policy API", description = "Policy install/list/remove surface and enforcement wire types"),
    paths(routes::ping),
    components(schemas(
        AnchorTextsDto,
        PolicyInstallRequest,
        PolicyListResponse,
        PolicyRemoveResponse,
        HealthResponse,
        gateway_core::Policy,
        gateway_core::PolicyEffect,
        gateway_core::PolicyType,
        gateway_core::PolicyStatus,
        gateway_core::Constraints,
        gateway_core::Scope,
        gateway_core::Thresholds,
        gateway_core::Weights,
        gateway_core::Modification,
        gateway_core::AggregationMode,
        gateway_core::IntentEvent,
        gateway_core::Actor,
        gateway_core::ActorType,
        gateway_core::Resource,
        gateway_core::ResourceType,
        gateway_core::Data,
        gateway_core::Sensitivity,
        gateway_core::Volume,
        gateway_core::Risk,
        gateway_core::Authn,
        gateway_core::SchemaVersion,
        gateway_core::Action,
        gateway_core::RateLimitContext,
        gateway_core::ComparisonResult,
        gateway_core::EvidenceEntry,
        gateway_core::BlockReason,
        gateway_core::Decision,
    )),
    tags((name = "Health", description = "Liveness"))
)]
pub struct ApiDoc;

/// Merges a Swagger UI serving this crate's OpenAPI document onto a
/// deployer-provided router, at `/swagger-ui` backed by `/openapi.json`.
#[cfg(feature = "swagger-ui")]
pub fn merge_swagger_ui(router: axum::Router) -> axum::Router {
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()))
}

#[cfg(all(test, feature = "openapi"))]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn api_doc_serializes_to_json() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string(&spec).expect("openapi spec serializes");
        assert!(json.contains("Gateway Policy API"));
    }
}
