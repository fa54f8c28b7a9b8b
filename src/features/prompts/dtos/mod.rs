pub mod prompt_dto;
pub mod prompt_version_dto;

pub use prompt_dto::{
    CreatePromptDto, PromptQueryParams, PromptResponseDto, PromptVisibility, SortDirection,
    UpdatePromptDto,
};
pub use prompt_version_dto::{
    CreatePromptVersionDto, PromptVersionMetadata, PromptVersionResponseDto,
};
