//! Parser for `OpenQASM` 2.0.

mod expression;
mod lowering;
mod statement;

use qbridge_ir::Circuit;

use crate::ast::Program;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{LineIndex, SpannedToken, Token, tokenize};

/// Default cap on qubits, and separately on classical bits, per circuit.
pub const DEFAULT_MAX_WIRES: u32 = 1024;

/// Parse a QASM2 source string into a Circuit.
pub fn parse(source: &str) -> ParseResult<Circuit> {
    parse_with_limit(source, DEFAULT_MAX_WIRES)
}

/// Parse with an explicit cap on the total size of `qreg` (and of `creg`)
/// declarations. Oversized declarations fail before any wire is allocated.
pub fn parse_with_limit(source: &str, max_wires: u32) -> ParseResult<Circuit> {
    let program = parse_ast(source)?;
    lowering::lower_to_circuit(&program, max_wires)
}

/// Parse a QASM2 source string into an AST Program.
pub fn parse_ast(source: &str) -> ParseResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

/// Parser state.
pub(super) struct Parser {
    pub(super) tokens: Vec<SpannedToken>,
    pub(super) pos: usize,
    lines: LineIndex,
}

impl Parser {
    /// Create a new parser from source.
    fn new(source: &str) -> ParseResult<Self> {
        let lines = LineIndex::new(source);
        let mut tokens = Vec::new();

        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err((span, message)) => {
                    return Err(ParseError::Syntax {
                        line: lines.line(span.start),
                        message,
                    });
                }
            }
        }

        Ok(Self {
            tokens,
            pos: 0,
            lines,
        })
    }

    /// Check if we've reached the end.
    pub(super) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Peek at the current token.
    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Line of the current token, or of the last token at end of input.
    pub(super) fn line(&self) -> usize {
        match self.tokens.get(self.pos).or_else(|| self.tokens.last()) {
            Some(t) => self.lines.line(t.span.start),
            None => self.lines.last_line(),
        }
    }

    /// Syntax error at the current position.
    pub(super) fn syntax(&self, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            line: self.line(),
            message: message.into(),
        }
    }

    /// Error for an unexpected token (or end of input) where `expected` was wanted.
    pub(super) fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(found) => self.syntax(format!("expected {expected}, found '{found}'")),
            None => self.syntax(format!("unexpected end of input, expected {expected}")),
        }
    }

    /// Expect a specific token.
    #[allow(clippy::needless_pass_by_value)]
    pub(super) fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if self.check(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{expected}'")))
        }
    }

    /// Check if current token matches.
    pub(super) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume token if it matches.
    pub(super) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> ParseResult<Program> {
        let version = if self.consume(&Token::OpenQasm) {
            let version = self.parse_version()?;
            self.expect(Token::Semicolon)?;
            Some(version)
        } else {
            None
        };

        let mut statements = Vec::new();
        while !self.is_eof() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program {
            version,
            statements,
        })
    }

    /// Parse version number; only 2.x is accepted.
    fn parse_version(&mut self) -> ParseResult<String> {
        let version = match self.peek() {
            Some(Token::Real(v)) => format!("{v:.1}"),
            Some(Token::Integer(v)) => format!("{v}.0"),
            _ => return Err(self.unexpected("version number")),
        };
        if !version.starts_with("2.") {
            return Err(ParseError::Unsupported(format!("OPENQASM version {version}")));
        }
        self.pos += 1;
        Ok(version)
    }

    /// Parse an identifier.
    pub(super) fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::Identifier(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Parse a comma-separated identifier list.
    pub(super) fn parse_identifier_list(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![self.parse_identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.parse_identifier()?);
        }
        Ok(ids)
    }

    /// Parse a non-negative integer literal.
    pub(super) fn parse_integer(&mut self) -> ParseResult<u64> {
        match self.peek() {
            Some(Token::Integer(v)) => {
                let v = *v;
                self.pos += 1;
                Ok(v)
            }
            _ => Err(self.unexpected("integer")),
        }
    }

    /// Parse an integer that must fit a register size or index.
    pub(super) fn parse_u32(&mut self) -> ParseResult<u32> {
        let line = self.line();
        let value = self.parse_integer()?;
        u32::try_from(value).map_err(|_| ParseError::Syntax {
            line,
            message: format!("integer {value} is too large"),
        })
    }
}
