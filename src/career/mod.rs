pub mod catalog;
pub mod host;
pub mod prompt;
pub mod service;

pub use catalog::{AttributeBonus, CareerCatalog, CareerDefinition, StartingResource};
pub use host::{AttributeError, AttributeModifiers, CareerHost, Notice, ResourceHolder, ResourceRegistry};
pub use prompt::PromptScheduler;
pub use service::{CareerAssignmentService, ChoiceOutcome, SelectionRejected};
