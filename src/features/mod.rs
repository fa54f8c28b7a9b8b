pub mod auth;
pub mod executions;
pub mod feedback;
pub mod health;
pub mod prompts;
pub mod tenancy;
pub mod tenants;
