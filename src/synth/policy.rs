//! Row-level access policies synthesized from table shape.
//!
//! | table shape                         | policy                               |
//! |-------------------------------------|--------------------------------------|
//! | identity table                      | view / update own row                |
//! | organization table                  | view organizations you belong to     |
//! | membership table                    | view own memberships                 |
//! | owner and tenant columns            | own rows within your organizations   |
//! | tenant column only                  | rows of your organizations           |
//! | owner column only                   | own rows                             |
//! | anything else                       | read-only for authenticated callers  |

use crate::sql::{CreatePolicy, PolicyCommand};
use crate::schema::Table;

/// Names the policy templates depend on.
#[derive(Debug, Clone)]
pub struct PolicyNames<'a> {
    pub identity_table: &'a str,
    pub organization_table: &'a str,
    pub membership_table: &'a str,
    pub tenant_column: &'a str,
    pub owner_column: &'a str,
}

impl PolicyNames<'_> {
    fn member_organizations(&self) -> String {
        format!(
            "SELECT {tenant} FROM {membership} WHERE {owner} = auth.uid()",
            tenant = self.tenant_column,
            membership = self.membership_table,
            owner = self.owner_column,
        )
    }
}

/// Policies for one table, in emission order.
pub fn policies_for(table: &Table, names: &PolicyNames<'_>) -> Vec<CreatePolicy> {
    let t = table.name.as_str();
    let policy = |name: &str, command, using: String| CreatePolicy::new(name, t, command, using);

    if t == names.identity_table {
        return vec![
            policy(
                "Users can view own profile",
                PolicyCommand::Select,
                "id = auth.uid()".to_string(),
            ),
            policy(
                "Users can update own profile",
                PolicyCommand::Update,
                "id = auth.uid()".to_string(),
            ),
        ];
    }

    if t == names.organization_table {
        return vec![policy(
            "Users can view their organizations",
            PolicyCommand::Select,
            format!("id IN ({})", names.member_organizations()),
        )];
    }

    if t == names.membership_table {
        return vec![policy(
            "Users can view own memberships",
            PolicyCommand::Select,
            format!("{} = auth.uid()", names.owner_column),
        )];
    }

    let owned = table.has_column(names.owner_column);
    let tenant_scoped = table.has_column(names.tenant_column);
    let own_rows = format!("{} = auth.uid()", names.owner_column);
    let org_rows = format!("{} IN ({})", names.tenant_column, names.member_organizations());

    let single = match (owned, tenant_scoped) {
        (true, true) => policy(
            "Users can access own data in organization",
            PolicyCommand::All,
            format!("{} AND {}", own_rows, org_rows),
        ),
        (false, true) => policy("Users can access organization data", PolicyCommand::All, org_rows),
        (true, false) => policy("Users can access own data", PolicyCommand::All, own_rows),
        (false, false) => policy(
            "Authenticated users can access",
            PolicyCommand::Select,
            "auth.role() = 'authenticated'".to_string(),
        ),
    };
    vec![single]
}
