//! Wire contracts for the gateway: the generated gRPC `Enforce` client and
//! service stubs, OpenAPI schema types for the policy management surface,
//! and telemetry initialization matching the rest of the workspace.
//!
//! This crate ships the contracts a deployer wires up, not a running
//! server. There is no `main.rs`, no `axum::Router`, no implementation of
//! the generated `EnforcementServiceServer`/`ManagementServiceServer`
//! traits — assembling those into a deployed service is out of scope here.

pub mod grpc_client;
pub mod rest;
pub mod telemetry;

/// Generated gRPC types and client/server traits for `gatewayapi`.
pub mod proto {
    tonic::include_proto!("gatewayapi");
}

pub use grpc_client::GrpcEnforcementClient;
