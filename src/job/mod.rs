pub mod edit;
mod executor;
pub mod service;

pub use edit::{EditError, EditState, EditStep, EditWorkflow};
pub use executor::{JobExecutor, Mode, Options, Outcome, RecordError, Summary};
