pub mod stats_collector;
pub mod supervisor;
pub mod user_directory;

pub use stats_collector::StatsCollector;
pub use supervisor::CoreSupervisor;
pub use user_directory::UserDirectory;
