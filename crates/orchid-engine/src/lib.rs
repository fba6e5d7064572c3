//! Orchid execution engine.
//!
//! Hosts the collaborators that turn a plan into a finished task: the
//! environment sensor, the execution monitor, and the task orchestrator
//! that drives the whole lifecycle.

pub mod environment;
pub mod monitor;
pub mod orchestrator;

pub use environment::{ChainEnvironmentSensor, EnvironmentData, EnvironmentSensor};
pub use monitor::{DefaultMonitor, ExecutionMonitor, MonitorConfig};
pub use orchestrator::TaskOrchestrator;
