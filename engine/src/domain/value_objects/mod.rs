pub mod core_status;
pub mod proxy;
pub mod stats;

pub use core_status::CoreStatus;
pub use proxy::Proxy;
pub use stats::{SystemSnapshot, TrafficStats};
