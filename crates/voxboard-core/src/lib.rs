pub mod config;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod types;

pub use config::VoxboardConfig;
pub use error::{Result, VoxboardError};
pub use scheduler::{ManualScheduler, Scheduler, TimerHandle, TokioScheduler};
pub use types::*;
