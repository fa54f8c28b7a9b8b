use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::prompts::models::Prompt;
use crate::features::tenancy::TenantContext;
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// Sort direction
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Desc,
    Asc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Which of the prompts visible to the caller to list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PromptVisibility {
    /// Own prompts plus every public prompt
    #[default]
    All,
    /// Only prompts owned by the caller's tenant
    Own,
    /// Only public prompts, including the caller's own public ones
    Public,
}

impl PromptVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptVisibility::All => "all",
            PromptVisibility::Own => "own",
            PromptVisibility::Public => "public",
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

// Query params for listing prompts
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct PromptQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,

    /// Search in name or description
    pub search: Option<String>,

    /// Restrict to own or public prompts (default: all visible)
    #[serde(default)]
    pub visibility: PromptVisibility,

    /// Sort direction (default: desc by created_at)
    #[serde(default)]
    pub sort: SortDirection,
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl PromptQueryParams {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// `ILIKE ... ESCAPE '\'` pattern for the search term, `None` when blank.
    /// Wildcards typed by the user match literally.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePromptDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    /// Share read-only with every tenant
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePromptDto {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PromptResponseDto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    /// Whether the caller's tenant owns (and may modify) this prompt
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromptResponseDto {
    pub fn from_prompt(p: Prompt, ctx: &TenantContext) -> Self {
        Self {
            is_owner: ctx.owns(Some(p.tenant_id)),
            id: p.id,
            tenant_id: p.tenant_id,
            name: p.name,
            description: p.description,
            is_public: p.is_public,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: i64, page_size: i64, search: Option<&str>) -> PromptQueryParams {
        PromptQueryParams {
            page,
            page_size,
            search: search.map(str::to_string),
            visibility: PromptVisibility::All,
            sort: SortDirection::Desc,
        }
    }

    #[test]
    fn test_pagination_is_clamped() {
        assert_eq!(params(0, 10, None).offset(), 0);
        assert_eq!(params(3, 10, None).offset(), 20);
        assert_eq!(params(1, 1000, None).limit(), MAX_PAGE_SIZE);
        assert_eq!(params(1, 0, None).limit(), 1);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        assert_eq!(params(1, 10, Some("   ")).search_pattern(), None);
        assert_eq!(
            params(1, 10, Some(" summary ")).search_pattern(),
            Some("%summary%".to_string())
        );
    }

    #[test]
    fn test_search_wildcards_match_literally() {
        assert_eq!(
            params(1, 10, Some("_")).search_pattern(),
            Some(r"%\_%".to_string())
        );
        assert_eq!(
            params(1, 10, Some("50% off")).search_pattern(),
            Some(r"%50\% off%".to_string())
        );
        assert_eq!(
            params(1, 10, Some(r"a\b")).search_pattern(),
            Some(r"%a\\b%".to_string())
        );
    }

    #[test]
    fn test_is_owner_reflects_context() {
        let tenant = Uuid::new_v4();
        let prompt = Prompt {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            name: "Summarizer".to_string(),
            description: None,
            is_public: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let own = PromptResponseDto::from_prompt(prompt.clone(), &TenantContext::for_tenant(tenant));
        let foreign = PromptResponseDto::from_prompt(prompt, &TenantContext::Unset);

        assert!(own.is_owner);
        assert!(!foreign.is_owner);
    }
}
