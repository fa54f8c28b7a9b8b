pub mod tenant_dto;

pub use tenant_dto::{CreateTenantDto, TenantResponseDto, UpdateTenantDto};
