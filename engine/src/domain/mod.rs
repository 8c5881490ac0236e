pub mod entities;
pub mod error;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{BackendSpec, User};
pub use error::{DomainError, Result};
pub use services::{CoreSupervisor, StatsCollector, UserDirectory};
pub use value_objects::{CoreStatus, Proxy, SystemSnapshot, TrafficStats};
