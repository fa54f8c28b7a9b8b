pub mod context;
pub mod extractor;
pub mod policy;
pub mod scope;
pub mod storage;

pub use context::TenantContext;
pub use extractor::CurrentTenant;
pub use policy::{
    Decision, Guarded, NoParents, Operation, Ownership, ParentPrompt, PromptLookup, RowKind,
    TenantPolicy,
};
pub use scope::{TenantDatabase, TenantScope};
