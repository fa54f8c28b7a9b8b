//! Ambient tenant context for one unit of work.
//!
//! The context is a plain value carried through the call chain: request
//! extensions, service arguments and the [`TenantScope`](super::TenantScope)
//! that mirrors it into the database session. There is no process-wide
//! "current tenant", so two concurrent requests can never observe each
//! other's binding.

use std::fmt;

use uuid::Uuid;

/// Either no tenant is bound (`Unset`) or exactly one tenant key is.
///
/// The key is kept in its textual form because every ownership predicate
/// compares `row.tenant_id::text` against it, exactly as the storage policies do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum TenantContext {
    #[default]
    Unset,
    Bound(String),
}

impl TenantContext {
    /// Bind a tenant. An empty key is treated as no binding at all.
    pub fn bound(tenant_id: impl Into<String>) -> Self {
        let tenant_id = tenant_id.into();
        if tenant_id.is_empty() {
            TenantContext::Unset
        } else {
            TenantContext::Bound(tenant_id)
        }
    }

    #[allow(dead_code)]
    pub fn for_tenant(tenant_id: Uuid) -> Self {
        TenantContext::Bound(tenant_id.to_string())
    }

    /// Transition to `Bound(tenant_id)` or, with `None`, back to `Unset`.
    pub fn set_current_tenant(&mut self, tenant_id: Option<&str>) {
        *self = match tenant_id {
            Some(id) => TenantContext::bound(id),
            None => TenantContext::Unset,
        };
    }

    /// Tear the binding down at the end of a unit of work, returning what was bound.
    pub fn clear(&mut self) -> Option<String> {
        match std::mem::take(self) {
            TenantContext::Bound(id) => Some(id),
            TenantContext::Unset => None,
        }
    }

    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            TenantContext::Bound(id) => Some(id),
            TenantContext::Unset => None,
        }
    }

    #[allow(dead_code)]
    pub fn is_bound(&self) -> bool {
        matches!(self, TenantContext::Bound(_))
    }

    /// The bound key parsed as a tenant row id, for writes that stamp ownership.
    /// `None` when unset or when the key is not a valid uuid.
    pub fn tenant_uuid(&self) -> Option<Uuid> {
        self.tenant_id().and_then(|id| Uuid::parse_str(id).ok())
    }

    /// Tenant-equality predicate: `owner::text = ctx`.
    ///
    /// Never true for an unset context or a missing owner.
    pub fn owns(&self, owner: Option<Uuid>) -> bool {
        match (self.tenant_id(), owner) {
            (Some(ctx), Some(owner)) => owner.hyphenated().to_string() == ctx,
            _ => false,
        }
    }

    /// Value written into the per-transaction storage setting.
    /// Unset maps to the empty string, which no `uuid::text` can equal.
    pub fn as_setting(&self) -> &str {
        self.tenant_id().unwrap_or("")
    }
}

impl fmt::Display for TenantContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantContext::Unset => write!(f, "unset"),
            TenantContext::Bound(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unset() {
        let ctx = TenantContext::default();
        assert!(!ctx.is_bound());
        assert_eq!(ctx.tenant_id(), None);
        assert_eq!(ctx.as_setting(), "");
    }

    #[test]
    fn test_set_and_clear_transitions() {
        let mut ctx = TenantContext::Unset;
        ctx.set_current_tenant(Some("tenant-a"));
        assert_eq!(ctx, TenantContext::Bound("tenant-a".to_string()));

        ctx.set_current_tenant(Some("tenant-b"));
        assert_eq!(ctx.tenant_id(), Some("tenant-b"));

        assert_eq!(ctx.clear(), Some("tenant-b".to_string()));
        assert_eq!(ctx, TenantContext::Unset);
        assert_eq!(ctx.clear(), None);

        ctx.set_current_tenant(Some("tenant-c"));
        ctx.set_current_tenant(None);
        assert!(!ctx.is_bound());
    }

    #[test]
    fn test_empty_key_is_unset() {
        assert_eq!(TenantContext::bound(""), TenantContext::Unset);
    }

    #[test]
    fn test_owns_compares_textual_uuid() {
        let tenant = Uuid::new_v4();
        let ctx = TenantContext::for_tenant(tenant);

        assert!(ctx.owns(Some(tenant)));
        assert!(!ctx.owns(Some(Uuid::new_v4())));
        assert!(!ctx.owns(None));
        assert!(!TenantContext::Unset.owns(Some(tenant)));
    }

    #[test]
    fn test_owns_is_exact_string_match() {
        let tenant = Uuid::new_v4();
        let upper = TenantContext::bound(tenant.to_string().to_uppercase());
        let simple = TenantContext::bound(tenant.simple().to_string());

        // Postgres renders uuid::text lowercase and hyphenated; other spellings never match
        assert!(!upper.owns(Some(tenant)));
        assert!(!simple.owns(Some(tenant)));
    }

    #[test]
    fn test_tenant_uuid_rejects_malformed_keys() {
        assert_eq!(TenantContext::bound("not-a-uuid").tenant_uuid(), None);

        let tenant = Uuid::new_v4();
        assert_eq!(TenantContext::for_tenant(tenant).tenant_uuid(), Some(tenant));
    }
}
