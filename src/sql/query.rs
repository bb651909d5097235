use std::fs;
use std::ops::ControlFlow;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sqlparser::{
    ast::{Expr, Statement, Value, Visit, Visitor},
    dialect::SQLiteDialect,
    parser::Parser,
};

use crate::error::{Result, SimStatsError};

/// Statement classification, by leading keyword
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// CREATE, DROP, ALTER and friends
    DDL,
    Other,
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryType::Select => write!(f, "SELECT"),
            QueryType::Insert => write!(f, "INSERT"),
            QueryType::Update => write!(f, "UPDATE"),
            QueryType::Delete => write!(f, "DELETE"),
            QueryType::DDL => write!(f, "DDL"),
            QueryType::Other => write!(f, "OTHER"),
        }
    }
}

/// A validated, read-only query and the named parameters it expects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlQuery {
    pub sql: String,
    /// Placeholder names as written, e.g. `:min_size`
    pub placeholders: Vec<String>,
}

impl SqlQuery {
    /// Parse `sql` and accept it only if it is a single SELECT statement
    /// using named placeholders.
    pub fn from_sql(sql: &str) -> Result<SqlQuery> {
        let dialect = SQLiteDialect {};
        let ast = Parser::parse_sql(&dialect, sql).map_err(|e| SimStatsError::Parse {
            message: format!("Failed to parse SQL: {}", e),
            line_content: Some(sql.to_string()),
        })?;

        let stmt = match ast.as_slice() {
            [stmt] => stmt,
            [] => {
                return Err(SimStatsError::Parse {
                    message: "query file contains no statement".to_string(),
                    line_content: None,
                })
            }
            many => {
                return Err(SimStatsError::Parse {
                    message: format!("expected a single statement, found {}", many.len()),
                    line_content: Some(sql.to_string()),
                })
            }
        };

        let query_type = query_type_from_statement(stmt);
        if query_type != QueryType::Select {
            return Err(SimStatsError::Parse {
                message: format!("only SELECT queries can be evaluated, got {}", query_type),
                line_content: Some(sql.to_string()),
            });
        }

        let mut collector = PlaceholderCollector::default();
        if stmt.visit(&mut collector).is_break() {
            return Err(SimStatsError::Parse {
                message: "positional placeholders are not supported, use :name".to_string(),
                line_content: Some(sql.to_string()),
            });
        }

        Ok(SqlQuery {
            sql: sql.trim().to_string(),
            placeholders: collector.names,
        })
    }

    /// Read and validate a query from a `.sql` file
    pub fn from_file(path: &Path) -> Result<SqlQuery> {
        let sql = fs::read_to_string(path)?;
        SqlQuery::from_sql(&sql)
    }
}

fn query_type_from_statement(stmt: &Statement) -> QueryType {
    use sqlparser::ast::Statement::*;
    match stmt {
        Query(_) => QueryType::Select,
        Insert { .. } => QueryType::Insert,
        Update { .. } => QueryType::Update,
        Delete { .. } => QueryType::Delete,
        CreateTable { .. }
        | CreateView { .. }
        | CreateIndex { .. }
        | CreateSchema { .. }
        | CreateDatabase { .. }
        | Drop { .. }
        | AlterTable { .. }
        | Truncate { .. } => QueryType::DDL,
        _ => QueryType::Other,
    }
}

/// Visitor that records every named placeholder in order of appearance and
/// stops at the first positional one
#[derive(Default)]
struct PlaceholderCollector {
    names: Vec<String>,
}

impl Visitor for PlaceholderCollector {
    type Break = ();

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        if let Expr::Value(Value::Placeholder(name)) = expr {
            if name.starts_with('?') || name.starts_with('$') {
                return ControlFlow::Break(());
            }
            if !self.names.contains(name) {
                self.names.push(name.clone());
            }
        }
        ControlFlow::Continue(())
    }
}
