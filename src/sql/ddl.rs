//! DDL (Data Definition Language) support.
//!
//! This module provides types and builders for the Postgres DDL statements
//! quarry emits: tables, columns, constraints, indexes, comments, row-level
//! security, policies, and triggers.
//!
//! # Examples
//!
//! ```
//! use quarry::sql::{ColumnDef, CreateTable, SqlType};
//!
//! let table = CreateTable::new("payments")
//!     .if_not_exists()
//!     .column(
//!         ColumnDef::new("id", SqlType::Uuid)
//!             .not_null()
//!             .default_expr("uuid_generate_v4()"),
//!     )
//!     .column(ColumnDef::new("amount", SqlType::Integer));
//!
//! assert!(table.to_sql().starts_with("CREATE TABLE IF NOT EXISTS payments ("));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::SqlType;
use super::{quote_ident, quote_literal};

/// DDL statement types.
#[derive(Debug, Clone, PartialEq)]
pub enum DdlStatement {
    CreateExtension(CreateExtension),
    CreateTable(CreateTable),
    AlterTable(AlterTable),
    DropTable(DropTable),
    CreateIndex(CreateIndex),
    Comment(Comment),
    CreatePolicy(CreatePolicy),
    CreateFunction(CreateFunction),
    CreateTrigger(CreateTrigger),
}

impl DdlStatement {
    /// Convert to SQL, terminated with a semicolon.
    pub fn to_sql(&self) -> String {
        match self {
            DdlStatement::CreateExtension(s) => s.to_sql(),
            DdlStatement::CreateTable(s) => s.to_sql(),
            DdlStatement::AlterTable(s) => s.to_sql(),
            DdlStatement::DropTable(s) => s.to_sql(),
            DdlStatement::CreateIndex(s) => s.to_sql(),
            DdlStatement::Comment(s) => s.to_sql(),
            DdlStatement::CreatePolicy(s) => s.to_sql(),
            DdlStatement::CreateFunction(s) => s.to_sql(),
            DdlStatement::CreateTrigger(s) => s.to_sql(),
        }
    }
}

macro_rules! impl_from_statement {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for DdlStatement {
                fn from(s: $variant) -> Self {
                    DdlStatement::$variant(s)
                }
            }
        )*
    };
}

impl_from_statement!(
    CreateExtension,
    CreateTable,
    AlterTable,
    DropTable,
    CreateIndex,
    Comment,
    CreatePolicy,
    CreateFunction,
    CreateTrigger,
);

// ============================================================================
// CREATE EXTENSION
// ============================================================================

/// CREATE EXTENSION statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateExtension {
    pub name: String,
    pub if_not_exists: bool,
}

impl CreateExtension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            if_not_exists: false,
        }
    }

    /// Add IF NOT EXISTS clause.
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn to_sql(&self) -> String {
        // Extension names are always quoted; several contain dashes.
        format!(
            "CREATE EXTENSION {}\"{}\";",
            if self.if_not_exists { "IF NOT EXISTS " } else { "" },
            self.name.replace('"', "\"\"")
        )
    }
}

// ============================================================================
// CREATE TABLE
// ============================================================================

/// CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateTable {
    pub if_not_exists: bool,
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl CreateTable {
    /// Create a new CREATE TABLE statement.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            if_not_exists: false,
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Add IF NOT EXISTS clause.
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Add a column definition.
    pub fn column(mut self, col: ColumnDef) -> Self {
        self.columns.push(col);
        self
    }

    /// Add multiple column definitions.
    pub fn columns(mut self, cols: impl IntoIterator<Item = ColumnDef>) -> Self {
        self.columns.extend(cols);
        self
    }

    /// Convert to SQL. One column per line.
    pub fn to_sql(&self) -> String {
        let mut sql = String::from("CREATE TABLE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&quote_ident(&self.name));
        sql.push_str(" (\n");

        let defs: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("  {}", c.to_sql()))
            .collect();
        sql.push_str(&defs.join(",\n"));
        sql.push_str("\n);");
        sql
    }
}

// ============================================================================
// Column definition
// ============================================================================

/// Column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: SqlType,
    pub not_null: bool,
    /// Raw SQL default expression.
    pub default: Option<String>,
    pub unique: bool,
}

impl ColumnDef {
    /// Create a new nullable column definition.
    pub fn new(name: impl Into<String>, data_type: SqlType) -> Self {
        Self {
            name: name.into(),
            data_type,
            not_null: false,
            default: None,
            unique: false,
        }
    }

    /// Add NOT NULL constraint.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Add a DEFAULT clause. The expression is emitted verbatim.
    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// Add UNIQUE constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Render `name TYPE [NOT NULL] [DEFAULT expr] [UNIQUE]`.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", quote_ident(&self.name), self.data_type);
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        sql
    }
}

// ============================================================================
// Table constraints
// ============================================================================

/// Table-level constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    PrimaryKey {
        columns: Vec<String>,
    },
    ForeignKey {
        name: String,
        columns: Vec<String>,
        ref_table: String,
        ref_columns: Vec<String>,
        on_delete: ReferentialAction,
    },
}

impl TableConstraint {
    /// Create a PRIMARY KEY constraint.
    pub fn primary_key(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        TableConstraint::PrimaryKey {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a named FOREIGN KEY constraint.
    pub fn foreign_key(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
        ref_table: impl Into<String>,
        ref_columns: impl IntoIterator<Item = impl Into<String>>,
        on_delete: ReferentialAction,
    ) -> Self {
        TableConstraint::ForeignKey {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            ref_table: ref_table.into(),
            ref_columns: ref_columns.into_iter().map(Into::into).collect(),
            on_delete,
        }
    }

    pub fn to_sql(&self) -> String {
        match self {
            TableConstraint::PrimaryKey { columns } => {
                format!("PRIMARY KEY ({})", ident_list(columns))
            }
            TableConstraint::ForeignKey {
                name,
                columns,
                ref_table,
                ref_columns,
                on_delete,
            } => format!(
                "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
                quote_ident(name),
                ident_list(columns),
                quote_ident(ref_table),
                ident_list(ref_columns),
                on_delete
            ),
        }
    }
}

/// Referential action for foreign key constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    Restrict,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferentialAction::Cascade => write!(f, "CASCADE"),
            ReferentialAction::SetNull => write!(f, "SET NULL"),
            ReferentialAction::Restrict => write!(f, "RESTRICT"),
        }
    }
}

// ============================================================================
// ALTER TABLE
// ============================================================================

/// ALTER TABLE statement with a single action.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct AlterTable {
    pub name: String,
    pub action: AlterAction,
}

impl AlterTable {
    /// ALTER TABLE ... ADD COLUMN.
    pub fn add_column(name: impl Into<String>, column: ColumnDef) -> Self {
        Self {
            name: name.into(),
            action: AlterAction::AddColumn(column),
        }
    }

    /// ALTER TABLE ... DROP COLUMN IF EXISTS.
    pub fn drop_column(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: AlterAction::DropColumn {
                name: column.into(),
                if_exists: true,
            },
        }
    }

    /// ALTER TABLE ... ADD [CONSTRAINT ...].
    pub fn add_constraint(name: impl Into<String>, constraint: TableConstraint) -> Self {
        Self {
            name: name.into(),
            action: AlterAction::AddConstraint(constraint),
        }
    }

    /// ALTER TABLE ... ENABLE ROW LEVEL SECURITY.
    pub fn enable_row_level_security(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: AlterAction::EnableRowLevelSecurity,
        }
    }

    pub fn to_sql(&self) -> String {
        format!("ALTER TABLE {} {};", quote_ident(&self.name), self.action.to_sql())
    }
}

/// ALTER TABLE action.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    AddColumn(ColumnDef),
    DropColumn { name: String, if_exists: bool },
    AddConstraint(TableConstraint),
    EnableRowLevelSecurity,
}

impl AlterAction {
    pub fn to_sql(&self) -> String {
        match self {
            AlterAction::AddColumn(col) => format!("ADD COLUMN {}", col.to_sql()),
            AlterAction::DropColumn { name, if_exists } => format!(
                "DROP COLUMN {}{}",
                if *if_exists { "IF EXISTS " } else { "" },
                quote_ident(name)
            ),
            AlterAction::AddConstraint(c) => format!("ADD {}", c.to_sql()),
            AlterAction::EnableRowLevelSecurity => "ENABLE ROW LEVEL SECURITY".to_string(),
        }
    }
}

// ============================================================================
// DROP TABLE
// ============================================================================

/// DROP TABLE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct DropTable {
    pub name: String,
    pub if_exists: bool,
    pub cascade: bool,
}

impl DropTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            if_exists: false,
            cascade: false,
        }
    }

    /// Add IF EXISTS clause.
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// Add CASCADE.
    pub fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    pub fn to_sql(&self) -> String {
        format!(
            "DROP TABLE {}{}{};",
            if self.if_exists { "IF EXISTS " } else { "" },
            quote_ident(&self.name),
            if self.cascade { " CASCADE" } else { "" }
        )
    }
}

// ============================================================================
// CREATE INDEX
// ============================================================================

/// CREATE INDEX statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateIndex {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub if_not_exists: bool,
}

impl CreateIndex {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns: Vec::new(),
            unique: false,
            if_not_exists: false,
        }
    }

    /// Conventional `idx_<table>_<column>` index on one column.
    pub fn on_column(table: &str, column: &str) -> Self {
        Self::new(format!("idx_{}_{}", table, column.to_lowercase()), table).column(column)
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn column(mut self, col: impl Into<String>) -> Self {
        self.columns.push(col.into());
        self
    }

    pub fn to_sql(&self) -> String {
        format!(
            "CREATE {}INDEX {}{} ON {} ({});",
            if self.unique { "UNIQUE " } else { "" },
            if self.if_not_exists { "IF NOT EXISTS " } else { "" },
            quote_ident(&self.name),
            quote_ident(&self.table),
            ident_list(&self.columns)
        )
    }
}

// ============================================================================
// COMMENT ON
// ============================================================================

/// Object a comment is attached to.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentTarget {
    Table(String),
    Column { table: String, column: String },
}

/// COMMENT ON statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct Comment {
    pub target: CommentTarget,
    pub text: String,
}

impl Comment {
    pub fn on_table(table: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            target: CommentTarget::Table(table.into()),
            text: text.into(),
        }
    }

    pub fn on_column(
        table: impl Into<String>,
        column: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            target: CommentTarget::Column {
                table: table.into(),
                column: column.into(),
            },
            text: text.into(),
        }
    }

    pub fn to_sql(&self) -> String {
        let target = match &self.target {
            CommentTarget::Table(t) => format!("TABLE {}", quote_ident(t)),
            CommentTarget::Column { table, column } => {
                format!("COLUMN {}.{}", quote_ident(table), quote_ident(column))
            }
        };
        format!("COMMENT ON {} IS {};", target, quote_literal(&self.text))
    }
}

// ============================================================================
// CREATE POLICY
// ============================================================================

/// Command a row-level policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyCommand {
    All,
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for PolicyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyCommand::All => write!(f, "ALL"),
            PolicyCommand::Select => write!(f, "SELECT"),
            PolicyCommand::Insert => write!(f, "INSERT"),
            PolicyCommand::Update => write!(f, "UPDATE"),
            PolicyCommand::Delete => write!(f, "DELETE"),
        }
    }
}

/// CREATE POLICY statement.
///
/// The USING expression is raw SQL; policies are synthesized from fixed
/// templates, never from user input.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreatePolicy {
    pub name: String,
    pub table: String,
    pub command: PolicyCommand,
    pub using: String,
}

impl CreatePolicy {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        command: PolicyCommand,
        using: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            command,
            using: using.into(),
        }
    }

    pub fn to_sql(&self) -> String {
        // Policy names are human sentences, so always quoted.
        format!(
            "CREATE POLICY \"{}\" ON {}\n  FOR {} USING ({});",
            self.name.replace('"', "\"\""),
            quote_ident(&self.table),
            self.command,
            self.using
        )
    }
}

// ============================================================================
// CREATE FUNCTION / CREATE TRIGGER
// ============================================================================

/// CREATE OR REPLACE FUNCTION for a plpgsql trigger function.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateFunction {
    pub name: String,
    /// Function body between the dollar quotes.
    pub body: String,
}

impl CreateFunction {
    pub fn trigger(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    pub fn to_sql(&self) -> String {
        format!(
            "CREATE OR REPLACE FUNCTION {}()\nRETURNS TRIGGER AS $$\n{}\n$$ LANGUAGE plpgsql;",
            quote_ident(&self.name),
            self.body.trim_end()
        )
    }
}

/// CREATE TRIGGER ... BEFORE UPDATE ... FOR EACH ROW.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateTrigger {
    pub name: String,
    pub table: String,
    pub function: String,
}

impl CreateTrigger {
    pub fn before_update(
        name: impl Into<String>,
        table: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            function: function.into(),
        }
    }

    pub fn to_sql(&self) -> String {
        format!(
            "CREATE TRIGGER {}\n  BEFORE UPDATE ON {}\n  FOR EACH ROW EXECUTE FUNCTION {}();",
            quote_ident(&self.name),
            quote_ident(&self.table),
            quote_ident(&self.function)
        )
    }
}

fn ident_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quote_ident(n))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_basic() {
        let table = CreateTable::new("payments")
            .if_not_exists()
            .column(ColumnDef::new("id", SqlType::Uuid).not_null())
            .column(ColumnDef::new("amount", SqlType::Unknown));

        let sql = table.to_sql();
        assert!(sql.contains("IF NOT EXISTS"));
        assert!(sql.contains("id UUID NOT NULL"));
        assert!(sql.contains("amount TEXT"));
        assert!(sql.ends_with(");"));
    }

    #[test]
    fn test_column_def_quotes_camel_case() {
        let col = ColumnDef::new("firstName", SqlType::Text).not_null();
        assert_eq!(col.to_sql(), "\"firstName\" TEXT NOT NULL");
    }

    #[test]
    fn test_column_def_full() {
        let col = ColumnDef::new("created_at", SqlType::Timestamp)
            .not_null()
            .default_expr("now()")
            .unique();
        assert_eq!(col.to_sql(), "created_at TIMESTAMPTZ NOT NULL DEFAULT now() UNIQUE");
    }

    #[test]
    fn test_drop_table() {
        let sql = DropTable::new("legacy").if_exists().cascade().to_sql();
        assert_eq!(sql, "DROP TABLE IF EXISTS legacy CASCADE;");
    }

    #[test]
    fn test_alter_table_drop_column() {
        let sql = AlterTable::drop_column("users", "nickname").to_sql();
        assert_eq!(sql, "ALTER TABLE users DROP COLUMN IF EXISTS nickname;");
    }

    #[test]
    fn test_reserved_table_name_is_quoted() {
        let sql = AlterTable::enable_row_level_security("order").to_sql();
        assert_eq!(sql, "ALTER TABLE \"order\" ENABLE ROW LEVEL SECURITY;");
    }

    #[test]
    fn test_comment_escapes_quotes() {
        let sql = Comment::on_table("prayers", "Sources: it's.ts").to_sql();
        assert_eq!(sql, "COMMENT ON TABLE prayers IS 'Sources: it''s.ts';");
    }

    #[test]
    fn test_index_on_column_name() {
        let idx = CreateIndex::on_column("payments", "userId");
        assert_eq!(idx.name, "idx_payments_userid");
        assert_eq!(
            idx.to_sql(),
            "CREATE INDEX idx_payments_userid ON payments (\"userId\");"
        );
    }

    #[test]
    fn test_statement_from() {
        let stmt: DdlStatement = CreateExtension::new("uuid-ossp").if_not_exists().into();
        assert_eq!(stmt.to_sql(), "CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\";");
    }

    // ========================================================================
    // Snapshot tests with roundtrip validation
    // ========================================================================

    mod snapshot_tests {
        use super::*;
        use crate::sql::test_utils::validate_sql;
        use insta::assert_snapshot;

        #[test]
        fn create_table_postgres() {
            let sql = CreateTable::new("payments")
                .if_not_exists()
                .column(
                    ColumnDef::new("id", SqlType::Uuid)
                        .not_null()
                        .default_expr("uuid_generate_v4()"),
                )
                .column(ColumnDef::new("amount", SqlType::Integer))
                .column(ColumnDef::new("tags", SqlType::Array(Box::new(SqlType::Text))))
                .to_sql();
            assert_snapshot!(sql, @r"
            CREATE TABLE IF NOT EXISTS payments (
              id UUID NOT NULL DEFAULT uuid_generate_v4(),
              amount INTEGER,
              tags TEXT[]
            );
            ");
            validate_sql(&sql).unwrap();
        }

        #[test]
        fn foreign_key_postgres() {
            let sql = AlterTable::add_constraint(
                "payments",
                TableConstraint::foreign_key(
                    "fk_payments_user_id",
                    ["user_id"],
                    "users",
                    ["id"],
                    ReferentialAction::Cascade,
                ),
            )
            .to_sql();
            assert_snapshot!(sql, @"ALTER TABLE payments ADD CONSTRAINT fk_payments_user_id FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE;");
            validate_sql(&sql).unwrap();
        }

        #[test]
        fn add_column_postgres() {
            let sql = AlterTable::add_column(
                "payments",
                ColumnDef::new("currency", SqlType::Text).not_null(),
            )
            .to_sql();
            assert_snapshot!(sql, @"ALTER TABLE payments ADD COLUMN currency TEXT NOT NULL;");
            validate_sql(&sql).unwrap();
        }

        #[test]
        fn create_index_postgres() {
            let sql = CreateIndex::on_column("payments", "created_at")
                .if_not_exists()
                .to_sql();
            assert_snapshot!(sql, @"CREATE INDEX IF NOT EXISTS idx_payments_created_at ON payments (created_at);");
            validate_sql(&sql).unwrap();
        }

        #[test]
        fn primary_key_postgres() {
            let sql =
                AlterTable::add_constraint("payments", TableConstraint::primary_key(["id"])).to_sql();
            assert_snapshot!(sql, @"ALTER TABLE payments ADD PRIMARY KEY (id);");
            validate_sql(&sql).unwrap();
        }

        #[test]
        fn create_policy_postgres() {
            let sql = CreatePolicy::new(
                "Users can access own data",
                "payments",
                PolicyCommand::All,
                "user_id = auth.uid()",
            )
            .to_sql();
            assert_snapshot!(sql, @r#"
            CREATE POLICY "Users can access own data" ON payments
              FOR ALL USING (user_id = auth.uid());
            "#);
        }

        #[test]
        fn create_trigger_postgres() {
            let sql = CreateTrigger::before_update(
                "set_timestamp_payments",
                "payments",
                "trigger_set_timestamp",
            )
            .to_sql();
            assert_snapshot!(sql, @r"
            CREATE TRIGGER set_timestamp_payments
              BEFORE UPDATE ON payments
              FOR EACH ROW EXECUTE FUNCTION trigger_set_timestamp();
            ");
        }

        #[test]
        fn drop_table_postgres() {
            let sql = DropTable::new("legacy_items").if_exists().cascade().to_sql();
            validate_sql(&sql).unwrap();
        }
    }
}
