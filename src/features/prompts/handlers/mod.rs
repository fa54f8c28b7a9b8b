pub mod prompt_handler;
pub mod prompt_version_handler;

pub use prompt_handler::*;
pub use prompt_version_handler::*;
