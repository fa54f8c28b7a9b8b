pub mod health_service;

pub use health_service::{DatabasePing, HealthService};
