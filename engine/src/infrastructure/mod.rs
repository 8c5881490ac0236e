//! Infrastructure Layer
//!
//! Driven adapters implementing the domain ports: the real core process
//! runner, the host liveness probes, the `/proc` stats reader, and the
//! environment-driven agent configuration.

pub mod config;
pub mod probes;
pub mod proc_stats;
pub mod tokio_runner;

pub use config::AgentConfig;
pub use probes::{default_probe_chain, PgrepProbe, PidofProbe, ServiceActiveProbe};
pub use proc_stats::ProcSystemReader;
pub use tokio_runner::TokioCoreRunner;
