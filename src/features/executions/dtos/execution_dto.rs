use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::features::executions::models::PromptExecution;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct TokenUsage {
    #[validate(range(min = 0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<i64>,

    #[validate(range(min = 0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<i64>,

    #[validate(range(min = 0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<i64>,
}

fn non_negative_cost(cost: &Decimal) -> Result<(), ValidationError> {
    if cost.is_sign_negative() && !cost.is_zero() {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

/// Record an execution of `version_id`. Values are stored as supplied.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordExecutionDto {
    pub prompt_id: Uuid,
    pub version_id: Uuid,
    pub llm_provider_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200))]
    pub model: String,

    /// Values the template was rendered with
    pub input_variables: Option<serde_json::Value>,

    pub response_text: String,

    pub response_metadata: Option<serde_json::Value>,

    #[validate(nested)]
    pub token_usage: Option<TokenUsage>,

    #[validate(custom(function = "non_negative_cost"))]
    #[schema(value_type = Option<String>, example = "0.001250")]
    pub cost_usd: Option<Decimal>,

    #[validate(range(min = 0))]
    pub latency_ms: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExecutionResponseDto {
    pub id: Uuid,
    pub prompt_id: Uuid,
    pub version_id: Uuid,
    pub llm_provider_id: Option<Uuid>,
    pub model: String,
    pub input_variables: Option<serde_json::Value>,
    pub response_text: String,
    pub response_metadata: Option<serde_json::Value>,
    pub token_usage: Option<serde_json::Value>,
    #[schema(value_type = Option<String>)]
    pub cost_usd: Option<Decimal>,
    pub latency_ms: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<PromptExecution> for ExecutionResponseDto {
    fn from(e: PromptExecution) -> Self {
        Self {
            id: e.id,
            prompt_id: e.prompt_id,
            version_id: e.version_id,
            llm_provider_id: e.llm_provider_id,
            model: e.model,
            input_variables: e.input_variables_jsonb,
            response_text: e.response_text,
            response_metadata: e.response_metadata_jsonb,
            token_usage: e.token_usage_jsonb,
            cost_usd: e.cost_usd,
            latency_ms: e.latency_ms,
            created_at: e.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dto(body: serde_json::Value) -> RecordExecutionDto {
        serde_json::from_value(body).unwrap()
    }

    fn base() -> serde_json::Value {
        json!({
            "prompt_id": Uuid::new_v4(),
            "version_id": Uuid::new_v4(),
            "model": "gpt-4o-mini",
            "response_text": "ok",
        })
    }

    #[test]
    fn test_minimal_execution_is_valid() {
        assert!(dto(base()).validate().is_ok());
    }

    #[test]
    fn test_negative_token_counts_rejected() {
        let mut body = base();
        body["token_usage"] = json!({ "prompt_tokens": 10, "completion_tokens": -1 });
        assert!(dto(body).validate().is_err());
    }

    #[test]
    fn test_negative_latency_and_cost_rejected() {
        let mut body = base();
        body["latency_ms"] = json!(-5);
        assert!(dto(body).validate().is_err());

        let mut body = base();
        body["cost_usd"] = json!("-0.01");
        assert!(dto(body).validate().is_err());
    }

    #[test]
    fn test_cost_accepts_string_precision() {
        let mut body = base();
        body["cost_usd"] = json!("0.001250");
        let parsed = dto(body);
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.cost_usd.unwrap().to_string(), "0.001250");
    }

    #[test]
    fn test_blank_model_rejected() {
        let mut body = base();
        body["model"] = json!("");
        assert!(dto(body).validate().is_err());
    }
}
