//! Tenant access-control evaluator.
//!
//! Every `{RowKind × Operation}` cell maps to one [`Predicate`]. A predicate is
//! evaluated against the ambient [`TenantContext`], the row's [`Ownership`] and,
//! for prompt versions, the parent prompt found through a [`PromptLookup`].
//! Evaluation is total and pure: it never fails and has no side effects.
//!
//! The same table is rendered into the storage policies by
//! [`storage`](super::storage); both layers must stay identical.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::context::TenantContext;
use crate::core::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Tenant,
    Prompt,
    PromptVersion,
    Execution,
    Feedback,
}

impl RowKind {
    pub const ALL: [RowKind; 5] = [
        RowKind::Tenant,
        RowKind::Prompt,
        RowKind::PromptVersion,
        RowKind::Execution,
        RowKind::Feedback,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            RowKind::Tenant => "tenants",
            RowKind::Prompt => "prompts",
            RowKind::PromptVersion => "prompt_versions",
            RowKind::Execution => "prompt_executions",
            RowKind::Feedback => "feedback",
        }
    }

    /// Row kind guarded by `table`, if any
    pub fn from_table(table: &str) -> Option<RowKind> {
        RowKind::ALL.into_iter().find(|kind| kind.table() == table)
    }

    /// Human readable name used in client-facing messages
    pub fn label(&self) -> &'static str {
        match self {
            RowKind::Tenant => "Tenant",
            RowKind::Prompt => "Prompt",
            RowKind::PromptVersion => "Prompt version",
            RowKind::Execution => "Execution",
            RowKind::Feedback => "Feedback",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Select,
        Operation::Insert,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Row-level predicate attached to one cell of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// `owner::text = ctx`
    Owner,
    /// `owner::text = ctx OR is_public`
    OwnerOrPublic,
    /// `EXISTS parent prompt WHERE prompt.tenant_id::text = ctx`
    ParentOwner,
    /// `EXISTS parent prompt WHERE (prompt.tenant_id::text = ctx OR prompt.is_public)`
    ParentOwnerOrPublic,
}

use Predicate::{Owner, OwnerOrPublic, ParentOwner, ParentOwnerOrPublic};

/// Indexed by `[RowKind][Operation]`; columns are select, insert, update, delete.
const RULES: [[Predicate; 4]; 5] = [
    /* tenant         */ [Owner, Owner, Owner, Owner],
    /* prompt         */ [OwnerOrPublic, Owner, Owner, Owner],
    /* prompt_version */ [ParentOwnerOrPublic, ParentOwner, ParentOwner, ParentOwner],
    /* execution      */ [Owner, Owner, Owner, Owner],
    /* feedback       */ [Owner, Owner, Owner, Owner],
];

pub fn predicate_for(kind: RowKind, op: Operation) -> Predicate {
    RULES[kind.index()][op.index()]
}

/// Ownership facts a row exposes to the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Owner stored on the row itself (`id` for tenants, `tenant_id` for the rest).
    Direct {
        tenant_id: Option<Uuid>,
        is_public: bool,
    },
    /// Ownership inherited through the parent prompt.
    ViaPrompt { prompt_id: Option<Uuid> },
}

impl Ownership {
    pub fn private(tenant_id: Uuid) -> Self {
        Ownership::Direct {
            tenant_id: Some(tenant_id),
            is_public: false,
        }
    }
}

/// A row the tenant policy can be evaluated against.
pub trait Guarded {
    const KIND: RowKind;

    fn ownership(&self) -> Ownership;
}

/// The slice of a prompt the version rules need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentPrompt {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub is_public: bool,
}

/// Resolves the parent prompt of a version (`EXISTS (SELECT 1 FROM prompts ...)`).
pub trait PromptLookup {
    fn find_prompt(&self, prompt_id: Uuid) -> Option<ParentPrompt>;
}

/// Lookup for row kinds that never consult a parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParents;

impl PromptLookup for NoParents {
    fn find_prompt(&self, _prompt_id: Uuid) -> Option<ParentPrompt> {
        None
    }
}

impl PromptLookup for ParentPrompt {
    fn find_prompt(&self, prompt_id: Uuid) -> Option<ParentPrompt> {
        (self.id == prompt_id).then_some(*self)
    }
}

impl PromptLookup for [ParentPrompt] {
    fn find_prompt(&self, prompt_id: Uuid) -> Option<ParentPrompt> {
        self.iter().find(|p| p.id == prompt_id).copied()
    }
}

impl PromptLookup for HashMap<Uuid, ParentPrompt> {
    fn find_prompt(&self, prompt_id: Uuid) -> Option<ParentPrompt> {
        self.get(&prompt_id).copied()
    }
}

impl<L: PromptLookup + ?Sized> PromptLookup for &L {
    fn find_prompt(&self, prompt_id: Uuid) -> Option<ParentPrompt> {
        (**self).find_prompt(prompt_id)
    }
}

/// Evaluator bound to one unit of work's context and parent lookup.
#[derive(Debug, Clone, Copy)]
pub struct TenantPolicy<'a, L = NoParents> {
    context: &'a TenantContext,
    prompts: L,
}

impl<'a> TenantPolicy<'a, NoParents> {
    pub fn new(context: &'a TenantContext) -> Self {
        Self {
            context,
            prompts: NoParents,
        }
    }
}

impl<'a, L: PromptLookup> TenantPolicy<'a, L> {
    pub fn with_prompts<M: PromptLookup>(self, prompts: M) -> TenantPolicy<'a, M> {
        TenantPolicy {
            context: self.context,
            prompts,
        }
    }

    /// `authorize(row_kind, operation, row)` over raw ownership facts.
    pub fn evaluate(&self, kind: RowKind, op: Operation, ownership: Ownership) -> Decision {
        Decision::from_bool(self.holds(predicate_for(kind, op), ownership))
    }

    pub fn authorize<R: Guarded + ?Sized>(&self, op: Operation, row: &R) -> Decision {
        self.evaluate(R::KIND, op, row.ownership())
    }

    #[allow(dead_code)]
    pub fn authorize_batch<R: Guarded>(&self, op: Operation, rows: &[R]) -> Vec<Decision> {
        rows.iter().map(|row| self.authorize(op, row)).collect()
    }

    /// Keep only the rows the context may see (or write, for write operations).
    pub fn filter<R: Guarded>(&self, op: Operation, rows: Vec<R>) -> Vec<R> {
        let before = rows.len();
        let kept: Vec<R> = rows
            .into_iter()
            .filter(|row| self.authorize(op, row).is_allowed())
            .collect();

        if kept.len() != before {
            let kind = R::KIND;
            // Storage should already have filtered these; a difference means the layers disagree
            tracing::warn!(
                row_kind = %kind,
                operation = %op,
                dropped = before - kept.len(),
                "Application policy dropped rows returned by storage"
            );
        }

        kept
    }

    /// Deny becomes [`AppError::PolicyDenied`], which callers render as "not found".
    pub fn require<R: Guarded + ?Sized>(&self, op: Operation, row: &R) -> Result<()> {
        match self.authorize(op, row) {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(AppError::PolicyDenied(R::KIND)),
        }
    }

    /// Like [`require`](Self::require) for a row that only exists as ownership facts,
    /// e.g. a candidate row before it is inserted.
    pub fn check(&self, kind: RowKind, op: Operation, ownership: Ownership) -> Result<()> {
        match self.evaluate(kind, op, ownership) {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(AppError::PolicyDenied(kind)),
        }
    }

    fn holds(&self, predicate: Predicate, ownership: Ownership) -> bool {
        let ctx = self.context;
        match (predicate, ownership) {
            (Owner, Ownership::Direct { tenant_id, .. }) => ctx.owns(tenant_id),
            (OwnerOrPublic, Ownership::Direct {
                tenant_id,
                is_public,
            }) => is_public || ctx.owns(tenant_id),
            (ParentOwner, Ownership::ViaPrompt { prompt_id }) => self
                .parent(prompt_id)
                .is_some_and(|p| ctx.owns(p.tenant_id)),
            (ParentOwnerOrPublic, Ownership::ViaPrompt { prompt_id }) => self
                .parent(prompt_id)
                .is_some_and(|p| p.is_public || ctx.owns(p.tenant_id)),
            // Row shape does not fit the rule: malformed, never a wildcard
            _ => false,
        }
    }

    fn parent(&self, prompt_id: Option<Uuid>) -> Option<ParentPrompt> {
        let prompt_id = prompt_id?;
        self.prompts
            .find_prompt(prompt_id)
            .filter(|p| p.id == prompt_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        kind_ownership: Ownership,
    }

    macro_rules! guarded_row {
        ($name:ident, $kind:expr) => {
            struct $name(Row);
            impl Guarded for $name {
                const KIND: RowKind = $kind;
                fn ownership(&self) -> Ownership {
                    self.0.kind_ownership
                }
            }
        };
    }

    guarded_row!(TenantRow, RowKind::Tenant);
    guarded_row!(PromptRow, RowKind::Prompt);
    guarded_row!(VersionRow, RowKind::PromptVersion);
    guarded_row!(ExecutionRow, RowKind::Execution);
    guarded_row!(FeedbackRow, RowKind::Feedback);

    fn prompt(tenant: Uuid, is_public: bool) -> PromptRow {
        PromptRow(Row {
            kind_ownership: Ownership::Direct {
                tenant_id: Some(tenant),
                is_public,
            },
        })
    }

    fn version_of(prompt_id: Uuid) -> VersionRow {
        VersionRow(Row {
            kind_ownership: Ownership::ViaPrompt {
                prompt_id: Some(prompt_id),
            },
        })
    }

    fn decisions<R: Guarded, L: PromptLookup>(
        policy: &TenantPolicy<'_, L>,
        row: &R,
    ) -> [Decision; 4] {
        Operation::ALL.map(|op| policy.authorize(op, row))
    }

    const ALLOW_ALL: [Decision; 4] = [Decision::Allow; 4];
    const DENY_ALL: [Decision; 4] = [Decision::Deny; 4];
    const READ_ONLY: [Decision; 4] = [Decision::Allow, Decision::Deny, Decision::Deny, Decision::Deny];

    #[test]
    fn test_rule_table_shape() {
        for kind in RowKind::ALL {
            for op in Operation::ALL {
                let expected = match (kind, op) {
                    (RowKind::Prompt, Operation::Select) => OwnerOrPublic,
                    (RowKind::PromptVersion, Operation::Select) => ParentOwnerOrPublic,
                    (RowKind::PromptVersion, _) => ParentOwner,
                    _ => Owner,
                };
                assert_eq!(predicate_for(kind, op), expected, "{} {}", kind, op);
            }
        }
    }

    #[test]
    fn test_owner_prompt_allows_everything() {
        let t1 = Uuid::new_v4();
        let ctx = TenantContext::for_tenant(t1);
        let policy = TenantPolicy::new(&ctx);

        assert_eq!(decisions(&policy, &prompt(t1, false)), ALLOW_ALL);
    }

    #[test]
    fn test_public_prompt_is_read_only_for_other_tenants() {
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        let ctx = TenantContext::for_tenant(t2);
        let policy = TenantPolicy::new(&ctx);

        assert_eq!(decisions(&policy, &prompt(t1, true)), READ_ONLY);
    }

    #[test]
    fn test_private_prompt_hidden_from_other_tenants() {
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        let ctx = TenantContext::for_tenant(t2);

        assert_eq!(decisions(&TenantPolicy::new(&ctx), &prompt(t1, false)), DENY_ALL);
    }

    #[test]
    fn test_unset_context_sees_only_public_prompts() {
        let t1 = Uuid::new_v4();
        let ctx = TenantContext::Unset;
        let policy = TenantPolicy::new(&ctx);

        assert_eq!(decisions(&policy, &prompt(t1, true)), READ_ONLY);
        assert_eq!(decisions(&policy, &prompt(t1, false)), DENY_ALL);
    }

    #[test]
    fn test_unset_context_version_of_public_prompt() {
        let parent = ParentPrompt {
            id: Uuid::new_v4(),
            tenant_id: Some(Uuid::new_v4()),
            is_public: true,
        };
        let ctx = TenantContext::Unset;
        let policy = TenantPolicy::new(&ctx).with_prompts(parent);
        let version = version_of(parent.id);

        assert_eq!(policy.authorize(Operation::Select, &version), Decision::Allow);
        assert_eq!(policy.authorize(Operation::Update, &version), Decision::Deny);
    }

    #[test]
    fn test_version_mirrors_parent_prompt() {
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        let contexts = [
            TenantContext::Unset,
            TenantContext::for_tenant(t1),
            TenantContext::for_tenant(t2),
            TenantContext::bound("garbage"),
        ];

        for is_public in [false, true] {
            let parent = ParentPrompt {
                id: Uuid::new_v4(),
                tenant_id: Some(t1),
                is_public,
            };
            let prompt_row = prompt(t1, is_public);
            let version = version_of(parent.id);

            for ctx in &contexts {
                let policy = TenantPolicy::new(ctx).with_prompts(parent);
                // Reads inherit the parent's full visibility
                assert_eq!(
                    policy.authorize(Operation::Select, &version),
                    policy.authorize(Operation::Select, &prompt_row),
                );
                // Writes inherit only strict ownership
                let private_parent = prompt(t1, false);
                for op in [Operation::Insert, Operation::Update, Operation::Delete] {
                    assert_eq!(
                        policy.authorize(op, &version),
                        policy.authorize(op, &private_parent),
                        "{} under {}",
                        op,
                        ctx
                    );
                }
            }
        }
    }

    #[test]
    fn test_version_without_resolvable_parent_is_denied() {
        let t1 = Uuid::new_v4();
        let ctx = TenantContext::for_tenant(t1);
        let policy = TenantPolicy::new(&ctx);

        assert_eq!(decisions(&policy, &version_of(Uuid::new_v4())), DENY_ALL);

        let orphan = VersionRow(Row {
            kind_ownership: Ownership::ViaPrompt { prompt_id: None },
        });
        assert_eq!(decisions(&policy, &orphan), DENY_ALL);
    }

    #[test]
    fn test_lookup_returning_wrong_prompt_is_ignored() {
        struct Liar(ParentPrompt);
        impl PromptLookup for Liar {
            fn find_prompt(&self, _prompt_id: Uuid) -> Option<ParentPrompt> {
                Some(self.0)
            }
        }

        let t1 = Uuid::new_v4();
        let ctx = TenantContext::for_tenant(t1);
        let policy = TenantPolicy::new(&ctx).with_prompts(Liar(ParentPrompt {
            id: Uuid::new_v4(),
            tenant_id: Some(t1),
            is_public: true,
        }));

        assert_eq!(decisions(&policy, &version_of(Uuid::new_v4())), DENY_ALL);
    }

    #[test]
    fn test_foreign_feedback_denied() {
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        let ctx = TenantContext::for_tenant(t1);
        let feedback = FeedbackRow(Row {
            kind_ownership: Ownership::private(t2),
        });

        assert_eq!(decisions(&TenantPolicy::new(&ctx), &feedback), DENY_ALL);
    }

    #[test]
    fn test_direct_rows_follow_owner() {
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        let owner = TenantContext::for_tenant(t1);
        let other = TenantContext::for_tenant(t2);
        let unset = TenantContext::Unset;

        let tenant = TenantRow(Row {
            kind_ownership: Ownership::private(t1),
        });
        let execution = ExecutionRow(Row {
            kind_ownership: Ownership::private(t1),
        });

        assert_eq!(decisions(&TenantPolicy::new(&owner), &tenant), ALLOW_ALL);
        assert_eq!(decisions(&TenantPolicy::new(&owner), &execution), ALLOW_ALL);
        for ctx in [&other, &unset] {
            assert_eq!(decisions(&TenantPolicy::new(ctx), &tenant), DENY_ALL);
            assert_eq!(decisions(&TenantPolicy::new(ctx), &execution), DENY_ALL);
        }
    }

    #[test]
    fn test_public_flag_never_leaks_to_private_telemetry() {
        let t1 = Uuid::new_v4();
        let ctx = TenantContext::Unset;
        let policy = TenantPolicy::new(&ctx);

        // Only prompts consult is_public; a flagged execution is still private
        let execution = ExecutionRow(Row {
            kind_ownership: Ownership::Direct {
                tenant_id: Some(t1),
                is_public: true,
            },
        });
        assert_eq!(decisions(&policy, &execution), DENY_ALL);
    }

    #[test]
    fn test_missing_owner_is_denied() {
        let ctx = TenantContext::for_tenant(Uuid::new_v4());
        let missing = ExecutionRow(Row {
            kind_ownership: Ownership::Direct {
                tenant_id: None,
                is_public: false,
            },
        });
        assert_eq!(decisions(&TenantPolicy::new(&ctx), &missing), DENY_ALL);
    }

    #[test]
    fn test_shape_mismatch_is_denied() {
        let t1 = Uuid::new_v4();
        let ctx = TenantContext::for_tenant(t1);
        let policy = TenantPolicy::new(&ctx);

        assert_eq!(
            policy.evaluate(
                RowKind::Prompt,
                Operation::Select,
                Ownership::ViaPrompt { prompt_id: Some(t1) }
            ),
            Decision::Deny
        );
        assert_eq!(
            policy.evaluate(RowKind::PromptVersion, Operation::Select, Ownership::private(t1)),
            Decision::Deny
        );
    }

    #[test]
    fn test_authorize_is_idempotent() {
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        let ctx = TenantContext::for_tenant(t2);
        let policy = TenantPolicy::new(&ctx);
        let row = prompt(t1, true);

        let first = decisions(&policy, &row);
        for _ in 0..10 {
            assert_eq!(decisions(&policy, &row), first);
        }
    }

    #[test]
    fn test_batch_and_filter() {
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        let ctx = TenantContext::for_tenant(t1);
        let policy = TenantPolicy::new(&ctx);

        let rows = vec![prompt(t1, false), prompt(t2, true), prompt(t2, false)];
        assert_eq!(
            policy.authorize_batch(Operation::Select, &rows),
            vec![Decision::Allow, Decision::Allow, Decision::Deny]
        );
        assert_eq!(
            policy.authorize_batch(Operation::Update, &rows),
            vec![Decision::Allow, Decision::Deny, Decision::Deny]
        );

        let visible = policy.filter(Operation::Select, rows);
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_require_maps_deny_to_policy_denied() {
        let ctx = TenantContext::Unset;
        let policy = TenantPolicy::new(&ctx);
        let err = policy
            .require(Operation::Delete, &prompt(Uuid::new_v4(), true))
            .unwrap_err();
        assert!(matches!(err, AppError::PolicyDenied(RowKind::Prompt)));
    }

    #[test]
    fn test_lookup_by_map_and_slice() {
        let t1 = Uuid::new_v4();
        let parents = [
            ParentPrompt {
                id: Uuid::new_v4(),
                tenant_id: Some(t1),
                is_public: false,
            },
            ParentPrompt {
                id: Uuid::new_v4(),
                tenant_id: Some(Uuid::new_v4()),
                is_public: false,
            },
        ];
        let by_id: HashMap<Uuid, ParentPrompt> = parents.iter().map(|p| (p.id, *p)).collect();
        let ctx = TenantContext::for_tenant(t1);

        let from_slice = TenantPolicy::new(&ctx).with_prompts(&parents[..]);
        let from_map = TenantPolicy::new(&ctx).with_prompts(&by_id);

        for (own, foreign) in [
            (
                from_slice.authorize(Operation::Update, &version_of(parents[0].id)),
                from_slice.authorize(Operation::Select, &version_of(parents[1].id)),
            ),
            (
                from_map.authorize(Operation::Update, &version_of(parents[0].id)),
                from_map.authorize(Operation::Select, &version_of(parents[1].id)),
            ),
        ] {
            assert_eq!(own, Decision::Allow);
            assert_eq!(foreign, Decision::Deny);
        }
    }

    #[tokio::test]
    async fn test_concurrent_contexts_do_not_interfere() {
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        let owned_by_t1 = Ownership::private(t1);

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let tenant = if i % 2 == 0 { t1 } else { t2 };
                tokio::spawn(async move {
                    let ctx = TenantContext::for_tenant(tenant);
                    tokio::task::yield_now().await;
                    let decision = TenantPolicy::new(&ctx).evaluate(
                        RowKind::Execution,
                        Operation::Select,
                        owned_by_t1,
                    );
                    (tenant, decision)
                })
            })
            .collect();

        for handle in handles {
            let (tenant, decision) = handle.await.unwrap();
            assert_eq!(decision.is_allowed(), tenant == t1);
        }
    }
}
