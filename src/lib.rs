pub mod config;
pub mod error;
pub mod imaging;
pub mod janitor;
pub mod log;
pub mod orchestrator;
pub mod project;
pub mod registry;
pub mod request;
pub mod storage;
pub mod task;

pub use error::{Error, Result};
pub use orchestrator::TaskOrchestrator;
pub use registry::TaskRegistry;
pub use request::{ProcessingOptions, ProcessingRequest, ProcessingType};
pub use task::{ProcessingTask, TaskId, TaskStatus};
