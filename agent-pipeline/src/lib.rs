pub mod envelope;
pub mod messages;
pub mod orchestrator;
pub mod processors;
pub mod simulator;
pub mod tools;

pub use envelope::{CaseCard, QueryResponse, SimulationEntry};
pub use messages::{AgentMessage, ToolCallRecord};
pub use orchestrator::AgentOrchestrator;
pub use simulator::{DisputeSimulator, SimulationOutcome};
pub use tools::{AgentTool, ToolContext, ToolRegistry};
