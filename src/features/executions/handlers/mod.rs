pub mod execution_handler;

pub use execution_handler::*;
