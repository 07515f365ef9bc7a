//! SQL text construction.
//!
//! A `QueryBuilder` is scoped to one table and produces the SQL strings the
//! schema layer executes: table-creation DDL, CRUD statements, `COUNT(*)`
//! queries, and `DROP TABLE`. Values are rendered as escaped SQL literals;
//! identifiers are double-quoted. The output is kept dialect-neutral so the
//! same text runs on every supported engine.

use crate::row::Value;

/// Column type for a field definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Real,
    Text,
    Blob,
    Numeric,
}

impl FieldType {
    /// SQL type keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
            Self::Numeric => "NUMERIC",
        }
    }
}

/// One column definition for table creation.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub primary_key: bool,
    pub not_null: bool,
    pub unique: bool,
    pub default_value: Option<Value>,
}

impl Field {
    /// Create a field with no constraints.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            primary_key: false,
            not_null: false,
            unique: false,
            default_value: None,
        }
    }

    /// Mark this field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Add a NOT NULL constraint.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Add a UNIQUE constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set a default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    fn definition(&self) -> String {
        let mut def = format!("{} {}", quote_ident(&self.name), self.field_type.as_sql());
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            def.push_str(" NOT NULL");
        }
        if self.unique {
            def.push_str(" UNIQUE");
        }
        if let Some(value) = &self.default_value {
            def.push_str(" DEFAULT ");
            def.push_str(&literal(value));
        }
        def
    }
}

/// Conflict resolution policy for INSERT and UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,
}

impl Conflict {
    /// SQL keyword for the `OR <policy>` clause.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Rollback => "ROLLBACK",
            Self::Abort => "ABORT",
            Self::Fail => "FAIL",
            Self::Ignore => "IGNORE",
            Self::Replace => "REPLACE",
        }
    }
}

/// Comparison operator for a WHERE condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl Comparison {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
        }
    }
}

/// A WHERE clause: either a single comparison or an AND/OR list of clauses.
#[derive(Debug, Clone)]
pub enum WhereClause {
    Cond {
        column: String,
        op: Comparison,
        value: Value,
    },
    All(Vec<WhereClause>),
    Any(Vec<WhereClause>),
}

impl WhereClause {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cond(column, Comparison::Eq, value)
    }

    /// `column <> value`
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cond(column, Comparison::Ne, value)
    }

    /// `column < value`
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cond(column, Comparison::Lt, value)
    }

    /// `column > value`
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cond(column, Comparison::Gt, value)
    }

    /// `column LIKE value`
    pub fn like(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cond(column, Comparison::Like, value)
    }

    /// A single comparison condition.
    pub fn cond(column: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        Self::Cond {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// All clauses must hold (AND).
    pub fn all(clauses: Vec<WhereClause>) -> Self {
        Self::All(clauses)
    }

    /// Any clause may hold (OR).
    pub fn any(clauses: Vec<WhereClause>) -> Self {
        Self::Any(clauses)
    }

    fn render(&self) -> String {
        match self {
            Self::Cond { column, op, value } => {
                if value.is_null() && *op == Comparison::Eq {
                    format!("{} IS NULL", quote_ident(column))
                } else if value.is_null() && *op == Comparison::Ne {
                    format!("{} IS NOT NULL", quote_ident(column))
                } else {
                    format!("{} {} {}", quote_ident(column), op.as_sql(), literal(value))
                }
            }
            Self::All(clauses) => Self::render_list(clauses, " AND "),
            Self::Any(clauses) => Self::render_list(clauses, " OR "),
        }
    }

    fn render_list(clauses: &[WhereClause], joiner: &str) -> String {
        let parts: Vec<String> = clauses.iter().map(|c| format!("({})", c.render())).collect();
        parts.join(joiner)
    }
}

/// ORDER BY specification.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl OrderBy {
    /// Ascending order on a column.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// Descending order on a column.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    fn render(&self) -> String {
        format!(
            "{} {}",
            quote_ident(&self.column),
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

/// Column name/value pairs for INSERT and UPDATE, in statement order.
pub type RowData = Vec<(String, Value)>;

/// Builder for the SQL statements of one table.
///
/// Each schema operation constructs a fresh builder scoped to the call; the
/// builder holds no state beyond the table name.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
}

impl QueryBuilder {
    /// Create a builder for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// CREATE TABLE statement for the given fields.
    pub fn create_table(&self, fields: &[Field], if_not_exists: bool, temp: bool) -> String {
        let defs: Vec<String> = fields.iter().map(Field::definition).collect();
        format!(
            "CREATE {}TABLE {}{} ({})",
            if temp { "TEMPORARY " } else { "" },
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            quote_ident(&self.table),
            defs.join(", ")
        )
    }

    /// SELECT statement; an empty column list selects `*`.
    pub fn select(
        &self,
        columns: &[&str],
        filter: Option<&WhereClause>,
        limit: Option<u64>,
        order: Option<&OrderBy>,
    ) -> String {
        let cols = if columns.is_empty() {
            "*".to_string()
        } else {
            columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!("SELECT {} FROM {}", cols, quote_ident(&self.table));
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.render());
        }
        if let Some(order) = order {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.render());
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        sql
    }

    /// INSERT statement with an optional conflict policy.
    pub fn insert(&self, data: &RowData, on_conflict: Option<Conflict>) -> String {
        let columns: Vec<String> = data.iter().map(|(name, _)| quote_ident(name)).collect();
        let values: Vec<String> = data.iter().map(|(_, value)| literal(value)).collect();
        format!(
            "INSERT {}INTO {} ({}) VALUES ({})",
            conflict_clause(on_conflict),
            quote_ident(&self.table),
            columns.join(", "),
            values.join(", ")
        )
    }

    /// UPDATE statement with an optional conflict policy.
    pub fn update(
        &self,
        data: &RowData,
        filter: Option<&WhereClause>,
        on_conflict: Option<Conflict>,
    ) -> String {
        let assignments: Vec<String> = data
            .iter()
            .map(|(name, value)| format!("{} = {}", quote_ident(name), literal(value)))
            .collect();

        let mut sql = format!(
            "UPDATE {}{} SET {}",
            conflict_clause(on_conflict),
            quote_ident(&self.table),
            assignments.join(", ")
        );
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.render());
        }
        sql
    }

    /// DELETE statement.
    pub fn remove(&self, filter: Option<&WhereClause>) -> String {
        let mut sql = format!("DELETE FROM {}", quote_ident(&self.table));
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.render());
        }
        sql
    }

    /// COUNT query over a column (`*` counts rows).
    pub fn count(&self, column: &str, filter: Option<&WhereClause>) -> String {
        let target = if column == "*" {
            "*".to_string()
        } else {
            quote_ident(column)
        };
        let mut sql = format!(
            "SELECT COUNT({}) FROM {}",
            target,
            quote_ident(&self.table)
        );
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.render());
        }
        sql
    }

    /// DROP TABLE statement.
    pub fn drop_table(&self, if_exists: bool) -> String {
        format!(
            "DROP TABLE {}{}",
            if if_exists { "IF EXISTS " } else { "" },
            quote_ident(&self.table)
        )
    }
}

fn conflict_clause(on_conflict: Option<Conflict>) -> String {
    match on_conflict {
        Some(policy) => format!("OR {} ", policy.as_sql()),
        None => String::new(),
    }
}

/// Render a value as a SQL literal.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Float64(v) => v.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Bytes(b) => format!("X'{}'", hex::encode(b)),
    }
}

/// Quote an identifier, escaping embedded double quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
