pub mod tenant_handler;

pub use tenant_handler::*;
