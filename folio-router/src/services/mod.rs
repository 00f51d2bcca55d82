//! Request execution services.

mod execution;

pub use execution::ExecutionService;
