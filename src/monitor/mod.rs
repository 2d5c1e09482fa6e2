pub mod actor;
pub mod errors;
pub mod pipeline;

pub use actor::{MonitorActor, MonitorAsk, MonitorReply, MonitorStatistics, MonitorTell};
pub use errors::EvaluationError;
pub use pipeline::{evaluate, request_size, EvaluationReport};
