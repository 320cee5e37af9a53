//! SQL Abstract Syntax Tree (AST)
//!
//! This module defines the AST nodes for the statements Tabula understands.

use std::fmt;

use crate::catalog::{Column, DataType, JoinKind};
use crate::storage::Value;

/// A SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// CREATE TABLE statement
    CreateTable(CreateTableStatement),
    /// DROP TABLE name
    DropTable(String),
    /// INSERT statement
    Insert(InsertStatement),
    /// SELECT statement, with or without a join
    Select(SelectStatement),
    /// UPDATE statement
    Update(UpdateStatement),
    /// DELETE statement
    Delete(DeleteStatement),
    /// CREATE [UNIQUE] INDEX statement
    CreateIndex(CreateIndexStatement),
}

impl Statement {
    /// Does executing this statement change the database?
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Statement::Select(_))
    }

    /// Short statement kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::CreateTable(_) => "CREATE TABLE",
            Statement::DropTable(_) => "DROP TABLE",
            Statement::Insert(_) => "INSERT",
            Statement::Select(_) => "SELECT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::CreateIndex(_) => "CREATE INDEX",
        }
    }
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

/// Column definition in CREATE TABLE
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub primary_key: bool,
    pub unique: bool,
    pub not_null: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            unique: false,
            not_null: false,
        }
    }

    /// Convert into a catalog column
    pub fn to_column(&self) -> Column {
        Column::new(&self.name, self.data_type)
            .primary_key(self.primary_key)
            .unique(self.unique)
            .nullable(!self.not_null)
    }
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table_name: String,
    /// Explicit column list; `None` binds values in declaration order
    pub columns: Option<Vec<String>>,
    pub values: Vec<Literal>,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub columns: Vec<SelectItem>,
    pub from: String,
    pub join: Option<JoinClause>,
    pub where_clause: Option<Condition>,
}

/// A single item in the SELECT list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// All columns (*)
    Wildcard,
    /// A plain or table-qualified column
    Column(ColumnRef),
}

/// `[table.]column`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// `[INNER | LEFT [OUTER]] JOIN table ON left = right`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    /// ON-clause column of the FROM table
    pub left: ColumnRef,
    /// ON-clause column of the JOIN table
    pub right: ColumnRef,
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table_name: String,
    pub assignments: Vec<(String, Literal)>,
    pub where_clause: Option<Condition>,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table_name: String,
    pub where_clause: Option<Condition>,
}

/// CREATE INDEX statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStatement {
    /// Parsed but not stored: indexes are addressed by column
    pub index_name: String,
    pub table_name: String,
    pub column: String,
    pub unique: bool,
}

/// WHERE clause: exactly one `column op literal`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub value: Literal,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::LtEq => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::GtEq => write!(f, ">="),
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// Quoted string, or unquoted text kept verbatim
    String(String),
}

impl Literal {
    /// Resolve the source text of an unquoted value.
    ///
    /// Tried in order: `NULL`, a fully quoted string, `TRUE`/`FALSE`, an
    /// integer, then a float (digits required, so `inf` stays text). Text
    /// matching none of these is kept as a raw string, so `2024-01-15` or
    /// `a@x.io` reach the column cast unchanged.
    pub fn from_raw(text: &str) -> Self {
        let text = text.trim();

        if text.eq_ignore_ascii_case("NULL") {
            return Literal::Null;
        }
        for quote in ['\'', '"'] {
            if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
                return Literal::String(text[1..text.len() - 1].to_string());
            }
        }
        if text.eq_ignore_ascii_case("TRUE") {
            return Literal::Boolean(true);
        }
        if text.eq_ignore_ascii_case("FALSE") {
            return Literal::Boolean(false);
        }

        if let Ok(n) = text.parse() {
            return Literal::Integer(n);
        }
        if text.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(n) = text.parse() {
                return Literal::Float(n);
            }
        }
        Literal::String(text.to_string())
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Boolean(b),
            Literal::Integer(i) => Value::Integer(i),
            Literal::Float(f) => Value::Float(f),
            Literal::String(s) => Value::String(s),
        }
    }
}
