//! SQL Parser
//!
//! This module parses SQL tokens into an AST.

use super::ast::*;
use super::lexer::{Lexer, Spanned};
use super::token::Token;
use crate::catalog::{DataType, JoinKind};
use crate::error::{Error, Result};

/// SQL Parser
pub struct Parser {
    tokens: Vec<Spanned>,
    /// Source characters, for the raw text of unquoted values
    source: Vec<char>,
    position: usize,
}

impl Parser {
    /// Create a new parser from a SQL string
    pub fn new(sql: &str) -> Result<Self> {
        let mut lexer = Lexer::new(sql);
        let tokens = lexer.tokenize_spanned()?;

        Ok(Self {
            tokens,
            source: sql.chars().collect(),
            position: 0,
        })
    }

    /// Parse exactly one statement, optionally terminated by `;`
    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = self.parse_statement()?;

        if self.check(&Token::Semicolon) {
            self.advance();
        }
        if !self.is_at_end() {
            return Err(self.unexpected("end of statement"));
        }

        Ok(stmt)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.current() {
            Token::Create => self.parse_create(),
            Token::Drop => self.parse_drop(),
            Token::Insert => self.parse_insert().map(Statement::Insert),
            Token::Select => self.parse_select().map(Statement::Select),
            Token::Update => self.parse_update().map(Statement::Update),
            Token::Delete => self.parse_delete().map(Statement::Delete),
            Token::Eof => Err(Error::UnexpectedEof("a statement".to_string())),
            other => Err(Error::Unsupported(other.to_string())),
        }
    }

    // ========== CREATE ==========

    fn parse_create(&mut self) -> Result<Statement> {
        self.expect(&Token::Create)?;

        match self.current() {
            Token::Table => self.parse_create_table().map(Statement::CreateTable),
            Token::Index | Token::Unique => self.parse_create_index().map(Statement::CreateIndex),
            _ => Err(self.unexpected("TABLE or INDEX")),
        }
    }

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.expect(&Token::Table)?;
        let table_name = self.expect_identifier()?;
        self.expect(&Token::LParen)?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_def()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(&Token::RParen)?;

        Ok(CreateTableStatement {
            table_name,
            columns,
        })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_data_type()?;
        let mut column = ColumnDef::new(name, data_type);

        // Constraints, in any order; other clauses such as DEFAULT are skipped
        let mut depth = 0usize;
        loop {
            match self.current() {
                Token::Comma | Token::RParen if depth == 0 => break,
                Token::Eof => return Err(self.unexpected("',' or ')'")),
                Token::Primary if self.next_is_word("KEY") => {
                    self.advance();
                    column.primary_key = true;
                    column.not_null = true;
                }
                Token::Not if self.next_is(&Token::Null) => {
                    self.advance();
                    column.not_null = true;
                }
                Token::Unique => column.unique = true,
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                _ => {}
            }
            self.advance();
        }

        Ok(column)
    }

    fn parse_data_type(&mut self) -> Result<DataType> {
        let name = match self.current() {
            Token::Identifier(name) => name.clone(),
            _ => return Err(self.unexpected("a data type")),
        };
        self.advance();

        if name.eq_ignore_ascii_case("VARCHAR") && self.check(&Token::LParen) {
            self.advance();
            let length = self.expect_integer()?;
            self.expect(&Token::RParen)?;
            return usize::try_from(length)
                .ok()
                .filter(|&n| n > 0)
                .map(DataType::Varchar)
                .ok_or_else(|| Error::UnknownType(format!("VARCHAR({})", length)));
        }

        name.parse()
    }

    fn parse_create_index(&mut self) -> Result<CreateIndexStatement> {
        let unique = if self.check(&Token::Unique) {
            self.advance();
            true
        } else {
            false
        };

        self.expect(&Token::Index)?;
        let index_name = self.expect_identifier()?;
        self.expect(&Token::On)?;
        let table_name = self.expect_identifier()?;
        self.expect(&Token::LParen)?;
        let column = self.expect_identifier()?;
        self.expect(&Token::RParen)?;

        Ok(CreateIndexStatement {
            index_name,
            table_name,
            column,
            unique,
        })
    }

    // ========== DROP ==========

    fn parse_drop(&mut self) -> Result<Statement> {
        self.expect(&Token::Drop)?;
        self.expect(&Token::Table)?;
        let name = self.expect_identifier()?;
        Ok(Statement::DropTable(name))
    }

    // ========== INSERT ==========

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect(&Token::Insert)?;
        self.expect(&Token::Into)?;

        let table_name = self.expect_identifier()?;

        let columns = if self.check(&Token::LParen) {
            self.advance();
            let cols = self.parse_identifier_list()?;
            self.expect(&Token::RParen)?;
            Some(cols)
        } else {
            None
        };

        self.expect(&Token::Values)?;
        self.expect(&Token::LParen)?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_value(&[Token::Comma, Token::RParen])?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&Token::RParen)?;

        if let Some(cols) = &columns {
            if cols.len() != values.len() {
                return Err(Error::ColumnCountMismatch {
                    columns: cols.len(),
                    values: values.len(),
                });
            }
        }

        Ok(InsertStatement {
            table_name,
            columns,
            values,
        })
    }

    // ========== SELECT ==========

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect(&Token::Select)?;

        let columns = if self.check(&Token::Asterisk) {
            self.advance();
            vec![SelectItem::Wildcard]
        } else {
            let mut items = Vec::new();
            loop {
                items.push(SelectItem::Column(self.parse_column_ref()?));

                if !self.check(&Token::Comma) {
                    break;
                }
                self.advance();
            }
            items
        };

        self.expect(&Token::From)?;
        let from = self.expect_identifier()?;

        let join = self.parse_join(&from)?;

        // A join query carries no WHERE clause
        let where_clause = if join.is_none() && self.check(&Token::Where) {
            self.advance();
            Some(self.parse_condition()?)
        } else {
            None
        };

        Ok(SelectStatement {
            columns,
            from,
            join,
            where_clause,
        })
    }

    fn parse_join(&mut self, from: &str) -> Result<Option<JoinClause>> {
        let kind = match self.current() {
            Token::Join => JoinKind::Inner,
            Token::Inner => {
                self.advance();
                JoinKind::Inner
            }
            Token::Left => {
                self.advance();
                if self.check(&Token::Outer) {
                    self.advance();
                }
                JoinKind::Left
            }
            _ => return Ok(None),
        };
        self.expect(&Token::Join)?;

        let table = self.expect_identifier()?;
        self.expect(&Token::On)?;
        let left = self.parse_qualified_column()?;
        self.expect(&Token::Eq)?;
        let right = self.parse_qualified_column()?;

        if left.table.as_deref() != Some(from) || right.table.as_deref() != Some(table.as_str()) {
            return Err(Error::JoinTableMismatch(format!(
                "ON {} = {} for FROM {} JOIN {}",
                left, right, from, table
            )));
        }

        Ok(Some(JoinClause {
            kind,
            table,
            left,
            right,
        }))
    }

    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let first = self.expect_identifier()?;
        if self.check(&Token::Dot) {
            self.advance();
            let column = self.expect_identifier()?;
            return Ok(ColumnRef::qualified(first, column));
        }
        Ok(ColumnRef::new(first))
    }

    fn parse_qualified_column(&mut self) -> Result<ColumnRef> {
        let table = self.expect_identifier()?;
        self.expect(&Token::Dot)?;
        let column = self.expect_identifier()?;
        Ok(ColumnRef::qualified(table, column))
    }

    // ========== UPDATE / DELETE ==========

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        self.expect(&Token::Update)?;
        let table_name = self.expect_identifier()?;
        self.expect(&Token::Set)?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier()?;
            self.expect(&Token::Eq)?;
            let value = self.parse_value(&[Token::Comma, Token::Where, Token::Semicolon])?;
            assignments.push((column, value));

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        let where_clause = self.parse_where()?;

        Ok(UpdateStatement {
            table_name,
            assignments,
            where_clause,
        })
    }

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        self.expect(&Token::Delete)?;
        self.expect(&Token::From)?;
        let table_name = self.expect_identifier()?;
        let where_clause = self.parse_where()?;

        Ok(DeleteStatement {
            table_name,
            where_clause,
        })
    }

    // ========== WHERE ==========

    fn parse_where(&mut self) -> Result<Option<Condition>> {
        if !self.check(&Token::Where) {
            return Ok(None);
        }
        self.advance();
        self.parse_condition().map(Some)
    }

    fn parse_condition(&mut self) -> Result<Condition> {
        let column = self.expect_identifier()?;

        let op = match self.current() {
            Token::Eq => CompareOp::Eq,
            Token::Neq => CompareOp::NotEq,
            Token::Lt => CompareOp::Lt,
            Token::Lte => CompareOp::LtEq,
            Token::Gt => CompareOp::Gt,
            Token::Gte => CompareOp::GtEq,
            _ => return Err(self.unexpected("a comparison operator")),
        };
        self.advance();

        let value = self.parse_adjacent_value()?;

        Ok(Condition { column, op, value })
    }

    // ========== Literals ==========

    /// A value running up to the next `stops` token outside parentheses
    fn parse_value(&mut self, stops: &[Token]) -> Result<Literal> {
        let first = self.position;
        let mut depth = 0usize;

        loop {
            match self.current() {
                Token::Eof => break,
                Token::LParen => depth += 1,
                Token::RParen if depth > 0 => depth -= 1,
                token if depth == 0 && stops.contains(token) => break,
                _ => {}
            }
            self.advance();
        }

        self.resolve_value(first)
    }

    /// A WHERE value: tokens written without whitespace between them
    fn parse_adjacent_value(&mut self) -> Result<Literal> {
        let first = self.position;

        if !self.is_at_end() && !self.check(&Token::Semicolon) {
            self.advance();
            while !self.is_at_end() && !self.check(&Token::Semicolon) && self.touches_previous() {
                self.advance();
            }
        }

        self.resolve_value(first)
    }

    /// Turn the tokens from `first` up to the current one into a literal.
    ///
    /// A single literal token keeps its lexed meaning (escapes included);
    /// anything else is resolved from its source text.
    fn resolve_value(&self, first: usize) -> Result<Literal> {
        match &self.tokens[first..self.position] {
            [] => Err(self.unexpected("a value")),
            [single] => Ok(literal_token(&single.token)
                .unwrap_or_else(|| Literal::from_raw(&self.text(single.start, single.end)))),
            [head, .., tail] => Ok(Literal::from_raw(&self.text(head.start, tail.end))),
        }
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.source[start..end].iter().collect()
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        let mut identifiers = Vec::new();

        loop {
            identifiers.push(self.expect_identifier()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(identifiers)
    }

    // ========== Helper Methods ==========

    fn current(&self) -> &Token {
        self.tokens
            .get(self.position)
            .map_or(&Token::Eof, |spanned| &spanned.token)
    }

    fn next_is(&self, token: &Token) -> bool {
        self.tokens
            .get(self.position + 1)
            .is_some_and(|spanned| &spanned.token == token)
    }

    fn next_is_word(&self, word: &str) -> bool {
        matches!(
            self.tokens.get(self.position + 1).map(|spanned| &spanned.token),
            Some(Token::Identifier(name)) if name.eq_ignore_ascii_case(word)
        )
    }

    /// Whether the current token starts right where the previous one ended
    fn touches_previous(&self) -> bool {
        match (self.position.checked_sub(1), self.tokens.get(self.position)) {
            (Some(prev), Some(current)) => self.tokens[prev].end == current.start,
            _ => false,
        }
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    /// Error for the current token, or for running out of input
    fn unexpected(&self, expected: &str) -> Error {
        match self.current() {
            Token::Eof => Error::UnexpectedEof(expected.to_string()),
            Token::Unknown(c) => {
                let position = self.tokens.get(self.position).map_or(0, |t| t.start);
                Error::UnexpectedCharacter(*c, position)
            }
            found => Error::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
            },
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn expect_integer(&mut self) -> Result<i64> {
        match self.current() {
            Token::IntegerLiteral(n) => {
                let n = *n;
                self.advance();
                Ok(n)
            }
            _ => Err(self.unexpected("integer")),
        }
    }
}

/// The literal a single token stands for, if it is one
fn literal_token(token: &Token) -> Option<Literal> {
    match token {
        Token::Null => Some(Literal::Null),
        Token::True => Some(Literal::Boolean(true)),
        Token::False => Some(Literal::Boolean(false)),
        Token::IntegerLiteral(n) => Some(Literal::Integer(*n)),
        Token::FloatLiteral(n) => Some(Literal::Float(*n)),
        Token::StringLiteral(s) => Some(Literal::String(s.clone())),
        // Unquoted words are kept as raw strings
        Token::Identifier(word) => Some(Literal::String(word.clone())),
        _ => None,
    }
}
