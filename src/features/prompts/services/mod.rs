pub mod prompt_service;
pub mod prompt_version_service;

pub use prompt_service::PromptService;
pub use prompt_version_service::PromptVersionService;
