//! Intent Event: a structured description of one tool-call or reasoning
//! step an agent intends to perform, plus the six closed vocabulary sets
//! its fields are drawn from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical action vocabulary. Closed set, loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Write,
    Delete,
    Export,
    Execute,
    Update,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Read,
        Action::Write,
        Action::Delete,
        Action::Export,
        Action::Execute,
        Action::Update,
    ];
}

/// Canonical actor-type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    User,
    Service,
    Llm,
    Agent,
}

impl ActorType {
    pub const ALL: [ActorType; 4] = [ActorType::User, ActorType::Service, ActorType::Llm, ActorType::Agent];
}

/// Canonical resource-type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Database,
    File,
    Api,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [ResourceType::Database, ResourceType::File, ResourceType::Api];
}

/// Canonical data-sensitivity vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    Internal,
    Public,
}

impl Sensitivity {
    pub const ALL: [Sensitivity; 2] = [Sensitivity::Internal, Sensitivity::Public];
}

/// Canonical volume vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Volume {
    Single,
    Bulk,
}

impl Volume {
    pub const ALL: [Volume; 2] = [Volume::Single, Volume::Bulk];
}

/// Canonical authentication-requirement vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Authn {
    Required,
    NotRequired,
}

impl Authn {
    pub const ALL: [Authn; 2] = [Authn::Required, Authn::NotRequired];
}

/// Wire schema version tag carried on every Intent Event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum SchemaVersion {
    #[serde(rename = "v1.1")]
    V1_1,
    #[serde(rename = "v1.2")]
    V1_2,
    #[serde(rename = "v1.3")]
    V1_3,
}

/// The acting party of an Intent Event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Actor {
    pub id: String,
    pub actor_type: ActorType,
}

/// The resource an Intent Event's action targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Resource {
    pub resource_type: ResourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Data-handling characteristics of an Intent Event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Data {
    pub sensitivity: Vec<Sensitivity>,
    pub pii: bool,
    pub volume: Volume,
}

/// Risk characteristics of an Intent Event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Risk {
    pub authn: Authn,
}

/// Per-agent sliding-window rate-limit context attached by the streaming
/// proxy (C6) when it constructs an Intent Event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RateLimitContext {
    pub calls_in_window: u32,
    pub window_seconds: u32,
}

/// Structured description of one tool-call or reasoning step an agent
/// intends to perform. Constructed once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IntentEvent {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: Uuid,
    pub tenant_id: String,
    pub schema_version: SchemaVersion,
    pub timestamp: DateTime<Utc>,
    pub actor: Actor,
    pub action: Action,
    pub resource: Resource,
    pub data: Data,
    pub risk: Risk,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub tool_params: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitContext>,
}
