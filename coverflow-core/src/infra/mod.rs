//! Infrastructure shared by the carousel domains: tuning constants, runtime
//! overrides and the timer abstraction.

pub mod constants;
pub mod runtime_config;
pub mod scheduler;

pub use runtime_config::RuntimeConfig;
pub use scheduler::{ManualScheduler, Scheduler, TimerKind, TokioScheduler};
