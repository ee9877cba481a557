use chrono::{NaiveDate, NaiveDateTime};

use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{QueryError, QueryResult};

/// Accepted timestamp formats for `datetime'...'` literals.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Recursive-descent parser for the flat filter grammar:
///
/// ```text
/// expr       := term ( ("and"|"or") term )*
/// term       := "(" expr ")" | comparison
/// comparison := member "~" opcode "~" literal
/// member     := identifier ("." identifier)*
/// literal    := string | number | "true" | "false" | "null"
///             | "datetime" string | "{" literal ("," literal)* "}"
/// ```
///
/// Connectors may be separated by whitespace (`a~eq~1 and b~eq~2`) or run
/// into the tilde stream (`a~eq~1~and~b~eq~2`); both spellings produce the
/// same tree. Folding is left-to-right, so an unparenthesized chain builds a
/// left-leaning tree.
pub struct FilterParser {
    tokens: Vec<Token>,
    position: usize,
}

impl FilterParser {
    pub fn new(input: &str) -> QueryResult<Self> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize()?;

        Ok(Self {
            tokens,
            position: 0,
        })
    }

    fn current(&self) -> &Token {
        // The stream always ends with an Eof token, so clamp to it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn unexpected(&self) -> QueryError {
        QueryError::UnexpectedToken {
            position: self.current().position,
            found: format!("{:?}", self.current().kind),
        }
    }

    pub fn parse(&mut self) -> QueryResult<Option<FilterNode>> {
        if self.current().kind == TokenKind::Eof {
            return Ok(None);
        }

        let node = self.parse_expr()?;

        if self.current().kind != TokenKind::Eof {
            return Err(self.unexpected());
        }

        Ok(Some(node))
    }

    fn parse_expr(&mut self) -> QueryResult<FilterNode> {
        let mut left = self.parse_term()?;

        while let Some(connector) = self.take_connector() {
            let right = self.parse_term()?;
            left = FilterNode::Composite {
                left: Box::new(left),
                right: Box::new(right),
                connector,
                parenthesized: false,
            };
        }

        Ok(left)
    }

    /// Consume an `and`/`or` connector, tolerating a tilde on either side
    /// for the tilde-separated spelling. Leaves the stream untouched when
    /// the next tokens are not a connector.
    fn take_connector(&mut self) -> Option<LogicalConnector> {
        let mut index = self.position;
        if matches!(self.tokens.get(index).map(|t| &t.kind), Some(TokenKind::Tilde)) {
            index += 1;
        }

        let connector = match self.tokens.get(index).map(|t| &t.kind) {
            Some(TokenKind::And) => LogicalConnector::And,
            Some(TokenKind::Or) => LogicalConnector::Or,
            _ => return None,
        };

        self.position = index + 1;
        if self.current().kind == TokenKind::Tilde {
            self.advance();
        }

        Some(connector)
    }

    fn parse_term(&mut self) -> QueryResult<FilterNode> {
        if self.current().kind == TokenKind::LeftParen {
            let open = self.current().position;
            self.advance();

            let mut node = self.parse_expr()?;

            match self.current().kind {
                TokenKind::RightParen => self.advance(),
                TokenKind::Eof => return Err(QueryError::UnterminatedGroup { position: open }),
                _ => return Err(self.unexpected()),
            }

            // Grouping around a single comparison carries no semantics; only
            // composites record it for the renderers.
            if let FilterNode::Composite { parenthesized, .. } = &mut node {
                *parenthesized = true;
            }

            Ok(node)
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> QueryResult<FilterNode> {
        let member = self.parse_member()?;
        self.expect_tilde()?;

        let (opcode, opcode_position) = match &self.current().kind {
            TokenKind::Identifier(name) => (name.clone(), self.current().position),
            _ => return Err(self.unexpected()),
        };
        self.advance();

        let operator = FilterOperator::from_opcode(&opcode).ok_or(QueryError::UnknownOperator {
            opcode,
            position: opcode_position,
        })?;

        self.expect_tilde()?;
        let value = self.parse_literal()?;

        Ok(FilterNode::Condition(FilterCondition {
            member,
            operator,
            value,
        }))
    }

    fn expect_tilde(&mut self) -> QueryResult<()> {
        if self.current().kind == TokenKind::Tilde {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_member(&mut self) -> QueryResult<String> {
        let mut path = String::new();

        match &self.current().kind {
            TokenKind::Identifier(name) => {
                path.push_str(name);
                self.advance();
            }
            TokenKind::Dot => {
                return Err(QueryError::EmptyMemberSegment {
                    position: self.current().position,
                })
            }
            _ => return Err(self.unexpected()),
        }

        while self.current().kind == TokenKind::Dot {
            let dot_position = self.current().position;
            self.advance();

            match &self.current().kind {
                TokenKind::Identifier(name) => {
                    path.push('.');
                    path.push_str(name);
                    self.advance();
                }
                _ => return Err(QueryError::EmptyMemberSegment { position: dot_position }),
            }
        }

        Ok(path)
    }

    fn parse_literal(&mut self) -> QueryResult<FilterValue> {
        let position = self.current().position;

        match self.current().kind.clone() {
            TokenKind::String(s) => {
                self.advance();
                Ok(FilterValue::String(s))
            }
            TokenKind::Int(n) => {
                self.advance();
                Ok(FilterValue::Int(n))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(FilterValue::Float(f))
            }
            TokenKind::Minus => {
                self.advance();
                match self.current().kind.clone() {
                    TokenKind::Int(n) => {
                        self.advance();
                        Ok(FilterValue::Int(-n))
                    }
                    TokenKind::Float(f) => {
                        self.advance();
                        Ok(FilterValue::Float(-f))
                    }
                    _ => Err(QueryError::InvalidLiteral {
                        position,
                        message: "expected a number after '-'".to_string(),
                    }),
                }
            }
            TokenKind::True => {
                self.advance();
                Ok(FilterValue::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(FilterValue::Bool(false))
            }
            TokenKind::Null => {
                self.advance();
                Ok(FilterValue::Null)
            }
            TokenKind::DateTime => {
                self.advance();
                match self.current().kind.clone() {
                    TokenKind::String(s) => {
                        self.advance();
                        parse_datetime(&s).map(FilterValue::DateTime).ok_or_else(|| {
                            QueryError::InvalidLiteral {
                                position,
                                message: format!("invalid timestamp '{}'", s),
                            }
                        })
                    }
                    _ => Err(QueryError::InvalidLiteral {
                        position,
                        message: "expected a quoted timestamp after 'datetime'".to_string(),
                    }),
                }
            }
            TokenKind::LeftBrace => {
                self.advance();
                let mut items = Vec::new();

                while !matches!(self.current().kind, TokenKind::RightBrace | TokenKind::Eof) {
                    items.push(self.parse_literal()?);

                    if self.current().kind == TokenKind::Comma {
                        self.advance();
                    } else {
                        break;
                    }
                }

                match self.current().kind {
                    TokenKind::RightBrace => {
                        self.advance();
                        Ok(FilterValue::List(items))
                    }
                    TokenKind::Eof => Err(QueryError::InvalidLiteral {
                        position,
                        message: "unterminated collection literal".to_string(),
                    }),
                    _ => Err(self.unexpected()),
                }
            }
            kind => Err(QueryError::InvalidLiteral {
                position,
                message: format!("unexpected token {:?}", kind),
            }),
        }
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a filter expression into an AST.
///
/// Empty or whitespace-only input yields `None` (match-all).
pub fn parse(input: &str) -> QueryResult<Option<FilterNode>> {
    let mut parser = FilterParser::new(input)?;
    parser.parse()
}
