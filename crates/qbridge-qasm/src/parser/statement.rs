//! Statement parsing for QASM2.

use super::Parser;
use crate::ast::{Argument, GateBodyOp, GateCall, GateDef, Statement};
use crate::error::ParseResult;
use crate::lexer::Token;

impl Parser {
    /// Parse a statement.
    pub(super) fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.peek() {
            Some(Token::Include) => self.parse_include(),
            Some(Token::QReg) => {
                let (name, size) = self.parse_register_decl(Token::QReg)?;
                Ok(Statement::QReg { name, size })
            }
            Some(Token::CReg) => {
                let (name, size) = self.parse_register_decl(Token::CReg)?;
                Ok(Statement::CReg { name, size })
            }
            Some(Token::Gate) => self.parse_gate_def(),
            Some(Token::Opaque) => self.parse_opaque(),
            Some(Token::If) => self.parse_if(),
            Some(Token::OpenQasm) => Err(self.syntax("OPENQASM must be the first statement")),
            _ => self.parse_quantum_op(),
        }
    }

    /// Parse a quantum operation: gate call, measure, reset or barrier.
    fn parse_quantum_op(&mut self) -> ParseResult<Statement> {
        match self.peek() {
            Some(Token::Measure) => self.parse_measure(),
            Some(Token::Reset) => {
                self.pos += 1;
                let arg = self.parse_argument()?;
                self.expect(Token::Semicolon)?;
                Ok(Statement::Reset(arg))
            }
            Some(Token::Barrier) => {
                self.pos += 1;
                let args = self.parse_argument_list()?;
                self.expect(Token::Semicolon)?;
                Ok(Statement::Barrier(args))
            }
            Some(Token::Identifier(_)) => {
                let call = self.parse_gate_call(Self::parse_argument)?;
                Ok(Statement::Gate(call))
            }
            _ => Err(self.unexpected("statement")),
        }
    }

    /// Parse include statement.
    fn parse_include(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Include)?;
        let path = match self.peek() {
            Some(Token::StringLiteral(s)) => s.clone(),
            _ => return Err(self.unexpected("file name")),
        };
        self.pos += 1;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Include(path))
    }

    /// Parse `qreg name[size];` or `creg name[size];`.
    fn parse_register_decl(&mut self, keyword: Token) -> ParseResult<(String, u32)> {
        self.expect(keyword)?;
        let name = self.parse_identifier()?;
        self.expect(Token::LBracket)?;
        let size = self.parse_u32()?;
        self.expect(Token::RBracket)?;
        self.expect(Token::Semicolon)?;
        Ok((name, size))
    }

    /// Parse `measure a -> b;`.
    fn parse_measure(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Measure)?;
        let qubit = self.parse_argument()?;
        self.expect(Token::Arrow)?;
        let bit = self.parse_argument()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Measure { qubit, bit })
    }

    /// Parse `gate name(params) args { body }`.
    fn parse_gate_def(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Gate)?;
        let name = self.parse_identifier()?;
        let params = self.parse_formal_params()?;
        let qubits = self.parse_identifier_list()?;
        self.expect(Token::LBrace)?;

        let mut body = Vec::new();
        while !self.consume(&Token::RBrace) {
            if self.consume(&Token::Barrier) {
                let args = self
                    .parse_identifier_list()?
                    .into_iter()
                    .map(Argument::register)
                    .collect();
                self.expect(Token::Semicolon)?;
                body.push(GateBodyOp::Barrier(args));
            } else if matches!(self.peek(), Some(Token::Identifier(_))) {
                let call = self.parse_gate_call(|p| p.parse_identifier().map(Argument::register))?;
                body.push(GateBodyOp::Call(call));
            } else {
                return Err(self.unexpected("gate call or '}'"));
            }
        }

        Ok(Statement::GateDef(GateDef {
            name,
            params,
            qubits,
            body,
        }))
    }

    /// Parse `opaque name(params) args;`.
    fn parse_opaque(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Opaque)?;
        let name = self.parse_identifier()?;
        let params = self.parse_formal_params()?;
        let qubits = self.parse_identifier_list()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Opaque {
            name,
            params,
            qubits,
        })
    }

    /// Parse `if (creg == n) op`.
    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.expect(Token::If)?;
        self.expect(Token::LParen)?;
        let register = self.parse_identifier()?;
        self.expect(Token::EqEq)?;
        let value = self.parse_integer()?;
        self.expect(Token::RParen)?;
        let body = Box::new(self.parse_quantum_op()?);
        Ok(Statement::If {
            register,
            value,
            body,
        })
    }

    /// Optional `( a, b )` formal parameter list.
    fn parse_formal_params(&mut self) -> ParseResult<Vec<String>> {
        if !self.consume(&Token::LParen) {
            return Ok(vec![]);
        }
        if self.consume(&Token::RParen) {
            return Ok(vec![]);
        }
        let params = self.parse_identifier_list()?;
        self.expect(Token::RParen)?;
        Ok(params)
    }

    /// Parse `name(exprs) arg, arg;` with a caller-chosen argument parser.
    fn parse_gate_call(
        &mut self,
        mut parse_arg: impl FnMut(&mut Self) -> ParseResult<Argument>,
    ) -> ParseResult<GateCall> {
        let name = self.parse_identifier()?;
        let params = if self.consume(&Token::LParen) {
            let params = self.parse_expression_list()?;
            self.expect(Token::RParen)?;
            params
        } else {
            vec![]
        };
        let mut args = vec![parse_arg(self)?];
        while self.consume(&Token::Comma) {
            args.push(parse_arg(self)?);
        }
        self.expect(Token::Semicolon)?;
        Ok(GateCall { name, params, args })
    }

    /// Parse `name` or `name[index]`.
    pub(super) fn parse_argument(&mut self) -> ParseResult<Argument> {
        let register = self.parse_identifier()?;
        if self.consume(&Token::LBracket) {
            let index = self.parse_u32()?;
            self.expect(Token::RBracket)?;
            Ok(Argument::indexed(register, index))
        } else {
            Ok(Argument::register(register))
        }
    }

    fn parse_argument_list(&mut self) -> ParseResult<Vec<Argument>> {
        let mut args = vec![self.parse_argument()?];
        while self.consume(&Token::Comma) {
            args.push(self.parse_argument()?);
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Argument, GateBodyOp, Statement};
    use crate::error::ParseError;
    use crate::parser::parse_ast;

    #[test]
    fn test_gate_definition() {
        let program = parse_ast(
            "gate bell(theta) a, b { U(theta, 0, pi) a; CX a, b; barrier a, b; }",
        )
        .unwrap();
        let Statement::GateDef(def) = &program.statements[0] else {
            panic!("expected gate definition");
        };
        assert_eq!(def.name, "bell");
        assert_eq!(def.params, vec!["theta"]);
        assert_eq!(def.qubits, vec!["a", "b"]);
        assert_eq!(def.body.len(), 3);
        assert!(matches!(def.body[2], GateBodyOp::Barrier(ref args) if args.len() == 2));
    }

    #[test]
    fn test_indexed_argument_in_gate_body_rejected() {
        let err = parse_ast("gate g a { CX a[0], a; }").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_measure_statement() {
        let program = parse_ast("measure q[1] -> c[0];").unwrap();
        match &program.statements[0] {
            Statement::Measure { qubit, bit } => {
                assert_eq!(*qubit, Argument::indexed("q", 1));
                assert_eq!(*bit, Argument::indexed("c", 0));
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn test_if_statement() {
        let program = parse_ast("if (c == 1) x q[0];").unwrap();
        assert!(matches!(
            &program.statements[0],
            Statement::If { register, value: 1, .. } if register == "c"
        ));
    }

    #[test]
    fn test_opaque_statement() {
        let program = parse_ast("opaque magic(a, b) q;").unwrap();
        assert!(matches!(
            &program.statements[0],
            Statement::Opaque { params, qubits, .. } if params.len() == 2 && qubits.len() == 1
        ));
    }

    #[test]
    fn test_measure_requires_arrow() {
        let err = parse_ast("measure q c;").unwrap_err();
        assert!(err.to_string().contains("expected '->'"), "{err}");
    }
}
