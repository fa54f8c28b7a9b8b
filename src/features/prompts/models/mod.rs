pub mod prompt;
pub mod prompt_version;

pub use prompt::Prompt;
pub use prompt_version::PromptVersion;
