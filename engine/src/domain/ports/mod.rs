pub mod core_runner;
pub mod liveness;
pub mod mock_runner;
pub mod system_stats;

pub use core_runner::CoreRunner;
pub use liveness::LivenessProbe;
pub use mock_runner::{MockCoreRunner, StaticProbe};
pub use system_stats::SystemStatsReader;
