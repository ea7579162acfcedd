mod adapters;
mod definition;
mod execution;
mod orchestrator;

pub use adapters::{BusAck, BusPublisher, HttpClient, HttpResponse};
pub use definition::{
    ApiStep, BusStep, Compensation, CompensationApi, CompensationBus, StepDefinition,
    WorkflowDefinition,
};
pub use execution::{Execution, ExecutionStatus, StepRecord, StepStatus};
pub use orchestrator::{execute, Adapters};
