//! Storage-side mirror of the rule table.
//!
//! Renders each `{RowKind × Operation}` predicate as the Postgres row security
//! policy the migrations install, and checks at startup that the database
//! actually carries them.

use sqlx::PgPool;

use super::policy::{predicate_for, Operation, Predicate, RowKind};
use crate::core::error::{AppError, Result};

/// Per-transaction setting the bound tenant is written into.
pub const CURRENT_TENANT_SETTING: &str = "app.current_tenant_id";

/// Role every policy applies to. Defined once and shared by all tables.
pub const AUTHENTICATED_ROLE: &str = "authenticated";

fn tenant_matches(column: &str) -> String {
    format!(
        "{}::text = current_setting('{}', true)",
        column, CURRENT_TENANT_SETTING
    )
}

fn owner_column(kind: RowKind) -> &'static str {
    match kind {
        // tenants.id IS the tenant key
        RowKind::Tenant => "id",
        _ => "tenant_id",
    }
}

/// SQL boolean expression for one cell of the rule table.
pub fn predicate_sql(kind: RowKind, op: Operation) -> String {
    match predicate_for(kind, op) {
        Predicate::Owner => tenant_matches(owner_column(kind)),
        Predicate::OwnerOrPublic => format!(
            "{} OR is_public = true",
            tenant_matches(owner_column(kind))
        ),
        Predicate::ParentOwner => format!(
            "EXISTS (SELECT 1 FROM prompts WHERE prompts.id = {}.prompt_id AND {})",
            kind.table(),
            tenant_matches("prompts.tenant_id")
        ),
        Predicate::ParentOwnerOrPublic => format!(
            "EXISTS (SELECT 1 FROM prompts WHERE prompts.id = {}.prompt_id AND ({} OR prompts.is_public = true))",
            kind.table(),
            tenant_matches("prompts.tenant_id")
        ),
    }
}

pub fn policy_name(kind: RowKind, op: Operation) -> String {
    format!("{}_{}", kind.table(), op.as_str())
}

/// `CREATE POLICY` statement for one cell, in the exact form the migrations use.
pub fn create_policy_sql(kind: RowKind, op: Operation) -> String {
    let predicate = predicate_sql(kind, op);
    let clauses = match op {
        Operation::Select | Operation::Delete => format!("USING ({})", predicate),
        Operation::Insert => format!("WITH CHECK ({})", predicate),
        Operation::Update => format!("USING ({0}) WITH CHECK ({0})", predicate),
    };

    format!(
        "CREATE POLICY {} ON {} FOR {} TO {} {};",
        policy_name(kind, op),
        kind.table(),
        op.as_str().to_uppercase(),
        AUTHENTICATED_ROLE,
        clauses
    )
}

/// Every statement that makes storage enforce the rule table.
#[allow(dead_code)]
pub fn policy_statements() -> Vec<String> {
    RowKind::ALL
        .iter()
        .flat_map(|&kind| {
            [
                format!("ALTER TABLE {} ENABLE ROW LEVEL SECURITY;", kind.table()),
                format!("ALTER TABLE {} FORCE ROW LEVEL SECURITY;", kind.table()),
            ]
            .into_iter()
            .chain(Operation::ALL.iter().map(move |&op| create_policy_sql(kind, op)))
        })
        .collect()
}

/// Privileges of the connecting user that decide whether policies bind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct SessionSecurity {
    /// Superuser or `BYPASSRLS`: policies never apply, even when forced
    pub bypasses_rls: bool,
    /// Member of the configured scope role (false when no role is configured)
    pub member_of_role: bool,
}

/// Reject sessions under which storage would not enforce the tenant policies.
///
/// Without a scope role every query runs as the connecting user, so that user
/// must not bypass row security. With a role, the user must be able to switch into it.
pub fn check_session(rls_role: Option<&str>, session: SessionSecurity) -> Result<()> {
    match rls_role {
        None if session.bypasses_rls => Err(AppError::Internal(
            "Connecting user bypasses row level security and DB_RLS_ROLE is empty; \
             set DB_RLS_ROLE or connect as a role without SUPERUSER/BYPASSRLS"
                .to_string(),
        )),
        None => Ok(()),
        Some(role) if !session.member_of_role => Err(AppError::Internal(format!(
            "Connecting user cannot switch into row security role '{}'",
            role
        ))),
        Some(_) => Ok(()),
    }
}

/// Fail fast when the connected database lacks forced row security on a guarded
/// table, is missing one of the expected policies, or would let this session
/// bypass them.
pub async fn verify_storage_policies(pool: &PgPool, rls_role: Option<&str>) -> Result<()> {
    let tables: Vec<&str> = RowKind::ALL.iter().map(|k| k.table()).collect();

    let session = sqlx::query_as::<_, SessionSecurity>(
        r#"
        SELECT (r.rolsuper OR r.rolbypassrls) AS bypasses_rls,
               COALESCE(pg_has_role(current_user, $1::text, 'MEMBER'), false) AS member_of_role
        FROM pg_roles r
        WHERE r.rolname = current_user
        "#,
    )
    .bind(rls_role)
    .fetch_one(pool)
    .await?;

    check_session(rls_role, session)?;

    let secured: Vec<(String, bool)> = sqlx::query_as(
        r#"
        SELECT c.relname::text, c.relforcerowsecurity
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname = current_schema()
          AND c.relrowsecurity
          AND c.relname = ANY($1)
        "#,
    )
    .bind(&tables)
    .fetch_all(pool)
    .await?;

    let installed: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT policyname::text
        FROM pg_policies
        WHERE schemaname = current_schema()
          AND tablename = ANY($1)
        "#,
    )
    .bind(&tables)
    .fetch_all(pool)
    .await?;

    let mut missing = Vec::new();
    for kind in RowKind::ALL {
        match secured.iter().find(|(t, _)| t == kind.table()) {
            None => missing.push(format!("{} (row level security disabled)", kind.table())),
            // Without FORCE the table owner skips every policy
            Some((_, false)) => {
                missing.push(format!("{} (row level security not forced)", kind.table()))
            }
            Some((_, true)) => {}
        }
        for op in Operation::ALL {
            let name = policy_name(kind, op);
            if !installed.contains(&name) {
                tracing::error!(expected = %create_policy_sql(kind, op), "Tenant policy missing");
                missing.push(name);
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Internal(format!(
            "Storage is missing tenant policies: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA_MIGRATION: &str =
        include_str!("../../../migrations/20250101000000_create_tenant_schema.sql");

    fn normalize(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_migration_installs_every_policy_verbatim() {
        let migration = normalize(SCHEMA_MIGRATION);
        for statement in policy_statements() {
            assert!(
                migration.contains(&normalize(&statement)),
                "migration is missing: {}",
                statement
            );
        }
    }

    #[test]
    fn test_migration_has_no_extra_policies() {
        let created = SCHEMA_MIGRATION.matches("CREATE POLICY").count();
        assert_eq!(created, RowKind::ALL.len() * Operation::ALL.len());
    }

    #[test]
    fn test_tenant_rows_compare_their_own_id() {
        assert_eq!(
            predicate_sql(RowKind::Tenant, Operation::Select),
            "id::text = current_setting('app.current_tenant_id', true)"
        );
    }

    #[test]
    fn test_prompt_select_includes_public_disjunct() {
        assert!(predicate_sql(RowKind::Prompt, Operation::Select).ends_with("OR is_public = true"));
        assert!(!predicate_sql(RowKind::Prompt, Operation::Update).contains("is_public"));
    }

    #[test]
    fn test_version_rules_join_through_prompts() {
        let select = predicate_sql(RowKind::PromptVersion, Operation::Select);
        let insert = predicate_sql(RowKind::PromptVersion, Operation::Insert);

        assert!(select.starts_with("EXISTS (SELECT 1 FROM prompts"));
        assert!(select.contains("prompts.is_public = true"));
        assert!(insert.contains("prompts.id = prompt_versions.prompt_id"));
        assert!(!insert.contains("is_public"));
    }

    #[test]
    fn test_update_checks_both_old_and_new_row() {
        let update = create_policy_sql(RowKind::Feedback, Operation::Update);
        assert!(update.contains("USING ("));
        assert!(update.contains("WITH CHECK ("));

        let insert = create_policy_sql(RowKind::Feedback, Operation::Insert);
        assert!(!insert.contains("USING"));
    }

    #[test]
    fn test_every_table_forces_row_security() {
        let migration = normalize(SCHEMA_MIGRATION);
        for kind in RowKind::ALL {
            let forced = format!("ALTER TABLE {} FORCE ROW LEVEL SECURITY;", kind.table());
            assert!(migration.contains(&forced), "not forced: {}", kind.table());
        }
    }

    #[test]
    fn test_session_without_role_must_not_bypass_rls() {
        let owner = SessionSecurity {
            bypasses_rls: false,
            member_of_role: false,
        };
        let superuser = SessionSecurity {
            bypasses_rls: true,
            member_of_role: false,
        };

        assert!(check_session(None, owner).is_ok());
        assert!(matches!(
            check_session(None, superuser),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_session_with_role_must_be_member() {
        let member = SessionSecurity {
            bypasses_rls: true,
            member_of_role: true,
        };
        let outsider = SessionSecurity {
            bypasses_rls: false,
            member_of_role: false,
        };

        // Switching into a plain role drops the superuser's bypass
        assert!(check_session(Some(AUTHENTICATED_ROLE), member).is_ok());
        assert!(check_session(Some(AUTHENTICATED_ROLE), outsider).is_err());
    }
}
