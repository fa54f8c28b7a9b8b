pub mod execution_dto;

pub use execution_dto::{ExecutionResponseDto, RecordExecutionDto, TokenUsage};
