//! Recursive descent parser for ignore files
//!
//! ```text
//! IgnoreFile  := Filter*
//! Filter      := Name [Newline] [Indent Expression+ Dedent]
//! Expression  := Literal Operator Literal [Newline | lookahead-Dedent]
//! Literal     := Name | String | Integer
//! ```

use super::ast::{ComparisonOperator, Expression, Filter, IgnoreFile, LiteralValue, Operand};
use super::lexer::{Lexer, LexingError};
use super::tokens::{Token, TokenKind};
use super::IgnoreError;
use crate::position::Location;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParsingError {
    pub message: String,
    pub location: Location,
}

impl ParsingError {
    fn unexpected(token: &Token) -> Self {
        Self {
            message: format!(
                "got an unexpected token {} {:?} at {}",
                token.kind, token.lexeme, token.start
            ),
            location: token.start,
        }
    }

    fn end_of_input(location: Location) -> Self {
        Self {
            message: format!("unexpected end of input at {location}"),
            location,
        }
    }
}

struct Parser<'s> {
    lexer: Lexer<'s>,
    last_end: Location,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            lexer: Lexer::new(source),
            last_end: Location::new(1, 0),
        }
    }

    fn peek_kind(&mut self) -> Result<Option<TokenKind>, LexingError> {
        Ok(self.lexer.peek()?.map(|token| token.kind))
    }

    fn advance(&mut self) -> Result<Option<Token>, LexingError> {
        let token = self.lexer.next_token()?;
        if let Some(token) = &token {
            self.last_end = token.end;
        }
        Ok(token)
    }

    fn expect(&mut self, kinds: &[TokenKind]) -> Result<Token, IgnoreError> {
        match self.advance()? {
            Some(token) if kinds.contains(&token.kind) => Ok(token),
            Some(token) => Err(ParsingError::unexpected(&token).into()),
            None => Err(ParsingError::end_of_input(self.last_end).into()),
        }
    }

    fn unexpected_next(&mut self) -> IgnoreError {
        match self.advance() {
            Ok(Some(token)) => ParsingError::unexpected(&token).into(),
            Ok(None) => ParsingError::end_of_input(self.last_end).into(),
            Err(error) => error.into(),
        }
    }

    fn parse_file(&mut self) -> Result<Vec<Filter>, IgnoreError> {
        let mut filters = Vec::new();
        while self.lexer.peek()?.is_some() {
            filters.push(self.parse_filter()?);
        }
        Ok(filters)
    }

    fn parse_filter(&mut self) -> Result<Filter, IgnoreError> {
        let name = self.expect(&[TokenKind::Name])?;
        let mut end = name.end;

        match self.peek_kind()? {
            None => {}
            Some(TokenKind::Newline) => {
                if let Some(newline) = self.advance()? {
                    end = newline.start;
                }
            }
            Some(_) => return Err(self.unexpected_next()),
        }

        let mut expressions = Vec::new();
        if self.peek_kind()? == Some(TokenKind::Indent) {
            self.advance()?;
            loop {
                match self.peek_kind()? {
                    Some(TokenKind::Dedent) => break,
                    None => return Err(ParsingError::end_of_input(self.last_end).into()),
                    Some(_) => expressions.push(self.parse_expression()?),
                }
            }
            let dedent = self.expect(&[TokenKind::Dedent])?;
            end = dedent.end;
        }

        Ok(Filter {
            name: name.lexeme,
            expressions,
            start: name.start,
            end,
        })
    }

    fn parse_expression(&mut self) -> Result<Expression, IgnoreError> {
        let left = self.parse_literal()?;
        let operator_token = self.expect(&[TokenKind::Operator])?;
        let operator = ComparisonOperator::from_symbol(&operator_token.lexeme)
            .ok_or_else(|| ParsingError::unexpected(&operator_token))?;
        let right = self.parse_literal()?;

        match self.peek_kind()? {
            None | Some(TokenKind::Dedent) => {}
            Some(TokenKind::Newline) => {
                self.advance()?;
            }
            Some(_) => return Err(self.unexpected_next()),
        }

        Ok(Expression {
            operator,
            start: left.start,
            end: right.end,
            left,
            right,
        })
    }

    fn parse_literal(&mut self) -> Result<Operand, IgnoreError> {
        let token = self.expect(&[TokenKind::Name, TokenKind::String, TokenKind::Integer])?;
        let operand = match token.kind {
            TokenKind::Name => Operand::name(token.lexeme, token.start, token.end),
            TokenKind::String => {
                let value = token.lexeme.trim_matches('"').to_string();
                Operand::literal(LiteralValue::String(value), token.start, token.end)
            }
            _ => {
                let value = token.lexeme.parse::<u64>().map_err(|_| ParsingError {
                    message: format!("integer {} is out of range at {}", token.lexeme, token.start),
                    location: token.start,
                })?;
                Operand::literal(LiteralValue::Integer(value), token.start, token.end)
            }
        };
        Ok(operand)
    }
}

/// Parses the ignore file `source`, named `filename` in diagnostics.
pub fn parse(source: &str, filename: &str) -> Result<IgnoreFile, IgnoreError> {
    let filters = Parser::new(source).parse_file()?;
    Ok(IgnoreFile {
        filename: filename.to_string(),
        filters,
    })
}
