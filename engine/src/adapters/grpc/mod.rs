//! gRPC Driving Adapter
//!
//! Exposes the supervisor and stats collector through the NodeService
//! protobuf contract.

pub mod mappers;
pub mod service;

pub use service::NodeAgentService;
