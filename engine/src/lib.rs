pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CORE_TYPE: &str = "proxy-core";

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod transport;

pub mod proto {
    tonic::include_proto!("node_service");

    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("node_descriptor");
}
