//! Watch runtime: source polling, stabilization, export and git publishing.

pub mod activity_log;
mod error;
pub mod export;
pub mod gate;
pub mod launcher;
pub mod log_rotation;
pub mod pipeline;
pub mod publish;
mod runtime;
pub mod signature;

pub use activity_log::{ActivityLog, Severity};
pub use error::{format_code, WatchError};
pub use gate::{Observation, StabilizationGate};
pub use launcher::{CommandSpec, ProcessLauncher, ProcessOutput, SystemLauncher};
pub use pipeline::{CycleSummary, ExportStatus, Pipeline, PublishStatus};
pub use publish::PublishOutcome;
pub use runtime::{init_tracing, start_blocking, TickReport, Watcher};
pub use signature::Signature;
