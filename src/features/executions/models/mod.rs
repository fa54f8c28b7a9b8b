pub mod execution;

pub use execution::PromptExecution;
