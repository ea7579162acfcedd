pub mod config;
pub mod context;
pub mod error;
pub mod expr;
pub mod journal;
pub mod store;
pub mod workflow;

pub use context::Context;
pub use error::{Result, SagaError};
pub use journal::{Journal, MemoryJournal};
pub use store::{MemoryWorkflowStore, WorkflowStore};
pub use workflow::{
    execute, Adapters, ApiStep, BusAck, BusPublisher, BusStep, Compensation, CompensationApi,
    CompensationBus, Execution, ExecutionStatus, HttpClient, HttpResponse, StepDefinition,
    StepRecord, StepStatus, WorkflowDefinition,
};
