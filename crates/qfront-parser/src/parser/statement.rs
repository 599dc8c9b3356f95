//! Statement parsing.

use qfront_ast::{AssignOp, BinaryOp, IoDirection, ModifierKind, NodeId, NodeKind, RegisterKind, ScalarKind};
use qfront_diag::{ErrorCode, Span};

use super::types::starts_type;
use super::{PResult, Parser};
use crate::lexer::TokenKind;

/// What a statement starting with an identifier turns out to be.
enum IdentifierStatement {
    GateCall,
    Assignment,
    Expression,
}

impl Parser<'_> {
    /// Parse a statement.
    pub(super) fn parse_statement(&mut self) -> PResult<NodeId> {
        let Some(kind) = self.peek() else {
            return Err(self.unexpected("statement"));
        };

        match kind {
            TokenKind::OpenQasm => self.parse_version(),
            TokenKind::Include => self.parse_include(),
            TokenKind::DefcalGrammar => self.parse_defcal_grammar(),
            TokenKind::Pragma => Ok(self.parse_pragma()),
            TokenKind::Annotation => Ok(self.parse_annotation()),
            TokenKind::Qubit => self.parse_qubit_decl(),
            TokenKind::QReg | TokenKind::CReg => self.parse_register_decl(),
            TokenKind::Const => self.parse_const_decl(),
            TokenKind::Input | TokenKind::Output => self.parse_io_decl(),
            TokenKind::Let => self.parse_alias(),
            TokenKind::Gate => self.parse_gate_def(),
            TokenKind::Opaque => self.parse_opaque(),
            TokenKind::Def => self.parse_subroutine(),
            TokenKind::Extern => self.parse_extern(),
            TokenKind::Cal => self.parse_cal(),
            TokenKind::Defcal => self.parse_defcal(),
            TokenKind::Box => self.parse_box(),
            TokenKind::Break | TokenKind::Continue | TokenKind::End => self.parse_jump(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Delay => self.parse_delay(),
            TokenKind::Reset => self.parse_reset(),
            TokenKind::Barrier | TokenKind::Nop => self.parse_operand_statement(),
            TokenKind::Measure => self.parse_measure_statement(),
            TokenKind::Inv
            | TokenKind::Pow
            | TokenKind::Ctrl
            | TokenKind::NegCtrl
            | TokenKind::Gphase => self.parse_gate_call(),
            TokenKind::Identifier => match self.classify_identifier_statement() {
                IdentifierStatement::GateCall => self.parse_gate_call(),
                IdentifierStatement::Assignment => self.parse_assignment(),
                IdentifierStatement::Expression => self.parse_expression_statement(),
            },
            kind if starts_type(kind) => {
                if self.type_starts_cast() {
                    self.parse_expression_statement()
                } else {
                    self.parse_classical_decl()
                }
            }
            kind if starts_expression(kind) => self.parse_expression_statement(),
            _ => Err(self.unexpected("statement")),
        }
    }

    /// `OPENQASM 3.0;`
    fn parse_version(&mut self) -> PResult<NodeId> {
        let first = self.pos == 0;
        let start = self.expect(TokenKind::OpenQasm)?.span;
        if !first {
            self.diagnostics.report(
                ErrorCode::SyntaxError,
                start,
                "the version pragma must be the first statement",
            );
        }

        let number = match self.current() {
            Some(token)
                if matches!(token.kind, TokenKind::IntegerLiteral | TokenKind::FloatLiteral) =>
            {
                token
            }
            _ => return Err(self.unexpected("version number")),
        };
        let Some((major, minor)) = parse_version_number(number.text) else {
            return Err(self.syntax_error(format!("invalid version number `{}`", number.text)));
        };
        self.advance();
        self.expect(TokenKind::Semicolon)?;

        if first {
            self.version = Some((major, minor));
        }
        Ok(self.push(NodeKind::VersionPragma { major, minor }, self.span_from(start)))
    }

    /// `include "file";`
    fn parse_include(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Include)?.span;
        if self.open_blocks > 0 {
            self.diagnostics.report(
                ErrorCode::SyntaxError,
                start,
                "`include` is only allowed at the top level",
            );
        }
        let path = self.parse_string("file path")?;
        self.expect(TokenKind::Semicolon)?;
        Ok(self.push(
            NodeKind::Include {
                path,
                items: Vec::new(),
            },
            self.span_from(start),
        ))
    }

    fn parse_defcal_grammar(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::DefcalGrammar)?.span;
        let name = self.parse_string("grammar name")?;
        self.expect(TokenKind::Semicolon)?;
        let span = self.span_from(start);
        self.require_v3(span, "`defcalgrammar`");
        Ok(self.push(NodeKind::CalibrationGrammar { name }, span))
    }

    /// Contents of a string literal without its quotes.
    fn parse_string(&mut self, what: &str) -> PResult<String> {
        match self.current() {
            Some(token) if matches!(token.kind, TokenKind::StringLiteral | TokenKind::Bitstring) => {
                self.advance();
                Ok(token.text[1..token.text.len() - 1].to_string())
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn parse_pragma(&mut self) -> NodeId {
        let Some(token) = self.advance() else {
            return self.push(NodeKind::Error, self.current_span());
        };
        let content = token
            .text
            .strip_prefix("#pragma")
            .or_else(|| token.text.strip_prefix("pragma"))
            .unwrap_or(token.text)
            .trim()
            .to_string();
        self.push(NodeKind::Pragma { content }, token.span)
    }

    /// `@keyword rest of line`
    fn parse_annotation(&mut self) -> NodeId {
        let Some(token) = self.advance() else {
            return self.push(NodeKind::Error, self.current_span());
        };
        let body = token.text.trim_start_matches('@');
        let (keyword, content) = match body.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, Some(rest.trim()).filter(|r| !r.is_empty())),
            None => (body.trim(), None),
        };
        self.push(
            NodeKind::Annotation {
                keyword: keyword.to_string(),
                content: content.map(str::to_string),
            },
            token.span,
        )
    }

    /// `qubit[n] q;`
    fn parse_qubit_decl(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Qubit)?.span;
        let size = self.parse_designator()?;
        let name = self.parse_identifier()?;
        self.expect(TokenKind::Semicolon)?;
        self.declare(name);
        Ok(self.push(NodeKind::QubitDecl { name, size }, self.span_from(start)))
    }

    /// `qreg q[n];` / `creg c[n];`
    fn parse_register_decl(&mut self) -> PResult<NodeId> {
        let Some(keyword) = self.advance() else {
            return Err(self.unexpected("register declaration"));
        };
        let register = if keyword.kind == TokenKind::QReg {
            RegisterKind::QReg
        } else {
            RegisterKind::CReg
        };
        let name = self.parse_identifier()?;
        let size = self.parse_designator()?;
        let decl_end = self.prev_end;
        self.expect(TokenKind::Semicolon)?;
        self.declare(name);

        let replacement = {
            let ty = match register {
                RegisterKind::QReg => "qubit",
                RegisterKind::CReg => "bit",
            };
            let name_text = &self.source[self.builder.span(name).range()];
            match size {
                Some(size) => {
                    let size_text = &self.source[self.builder.span(size).range()];
                    format!("{ty}[{size_text}] {name_text}")
                }
                None => format!("{ty} {name_text}"),
            }
        };
        let fix_span = Span::new(self.source_id, keyword.span.start, decl_end);
        self.deprecated(
            keyword.span,
            &format!("`{}`", keyword.text),
            Some((fix_span, replacement)),
        );
        Ok(self.push(
            NodeKind::RegisterDecl {
                register,
                name,
                size,
            },
            self.span_from(keyword.span),
        ))
    }

    /// `int[32] x = 5;`
    fn parse_classical_decl(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        let ty = self.parse_type()?;
        self.require_v3(self.builder.span(ty), "classical type declarations");
        let name = self.parse_identifier()?;
        let init = if self.consume(TokenKind::Eq) {
            Some(self.parse_initializer(ty)?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        self.declare(name);
        Ok(self.push(NodeKind::ClassicalDecl { ty, name, init }, self.span_from(start)))
    }

    /// `const float x = 1.5;`
    fn parse_const_decl(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Const)?.span;
        let ty = self.parse_type()?;
        let name = self.parse_identifier()?;
        self.expect(TokenKind::Eq)?;
        let init = self.parse_initializer(ty)?;
        self.expect(TokenKind::Semicolon)?;
        let span = self.span_from(start);
        self.require_v3(span, "`const`");
        self.declare(name);
        Ok(self.push(NodeKind::ConstDecl { ty, name, init }, span))
    }

    /// Value after `=` in a declaration. Literals assigned to an `angle`
    /// keep their exact value but are retagged as angles.
    fn parse_initializer(&mut self, ty: NodeId) -> PResult<NodeId> {
        let value = if self.check(TokenKind::LBrace) {
            self.parse_array_literal()?
        } else {
            self.parse_value()?
        };
        let is_angle = matches!(
            self.builder.kind(ty),
            NodeKind::ScalarType {
                scalar: ScalarKind::Angle,
                ..
            }
        );
        if is_angle {
            if let NodeKind::Literal(literal) = self.builder.kind_mut(value) {
                *literal = literal.clone().into_angle();
            }
        }
        Ok(value)
    }

    /// `input float theta;` / `output bit c;`
    fn parse_io_decl(&mut self) -> PResult<NodeId> {
        let Some(keyword) = self.advance() else {
            return Err(self.unexpected("`input` or `output`"));
        };
        let direction = if keyword.kind == TokenKind::Input {
            IoDirection::Input
        } else {
            IoDirection::Output
        };
        let ty = self.parse_type()?;
        let name = self.parse_identifier()?;
        self.expect(TokenKind::Semicolon)?;
        let span = self.span_from(keyword.span);
        self.require_v3(span, &format!("`{}`", keyword.text));
        self.declare(name);
        Ok(self.push(NodeKind::IoDecl { direction, ty, name }, span))
    }

    /// `let a = q[0:1] ++ r;`
    fn parse_alias(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Let)?.span;
        let name = self.parse_identifier()?;
        self.expect(TokenKind::Eq)?;
        let mut parts = vec![self.parse_expression()?];
        while self.consume(TokenKind::PlusPlus) {
            parts.push(self.parse_expression()?);
        }
        self.expect(TokenKind::Semicolon)?;
        let span = self.span_from(start);
        self.require_v3(span, "`let`");
        self.declare(name);
        Ok(self.push(NodeKind::AliasDecl { name, parts }, span))
    }

    /// `gate name(params) qubits { body }`
    fn parse_gate_def(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Gate)?.span;
        let name = self.parse_identifier()?;
        let (params, qubits, body) = self.scoped(|p| {
            let params = p.parse_gate_params()?;
            let qubits = p.parse_identifier_list(TokenKind::LBrace)?;
            if qubits.is_empty() {
                return Err(p.unexpected("qubit argument"));
            }
            for &id in params.iter().chain(&qubits) {
                p.declare(id);
            }
            let body = p.parse_block()?;
            Ok((params, qubits, body))
        })?;
        self.declare(name);
        Ok(self.push(
            NodeKind::GateDef {
                name,
                params,
                qubits,
                body,
            },
            self.span_from(start),
        ))
    }

    /// `opaque name(params) qubits;`
    fn parse_opaque(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Opaque)?.span;
        let name = self.parse_identifier()?;
        let params = self.parse_gate_params()?;
        let qubits = self.parse_identifier_list(TokenKind::Semicolon)?;
        self.expect(TokenKind::Semicolon)?;
        self.deprecated(start, "`opaque`", None);
        self.declare(name);
        Ok(self.push(
            NodeKind::OpaqueDecl {
                name,
                params,
                qubits,
            },
            self.span_from(start),
        ))
    }

    fn parse_gate_params(&mut self) -> PResult<Vec<NodeId>> {
        if !self.consume(TokenKind::LParen) {
            return Ok(Vec::new());
        }
        let params = self.parse_identifier_list(TokenKind::RParen)?;
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    /// Comma-separated identifiers up to (not including) `close`.
    fn parse_identifier_list(&mut self, close: TokenKind) -> PResult<Vec<NodeId>> {
        let mut ids = Vec::new();
        while !self.check(close) {
            ids.push(self.parse_identifier()?);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(ids)
    }

    /// `def name(params) -> type { body }`
    fn parse_subroutine(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Def)?.span;
        let name = self.parse_identifier()?;
        let (params, return_ty, body) = self.scoped(|p| {
            p.expect(TokenKind::LParen)?;
            let mut params = Vec::new();
            while !p.check(TokenKind::RParen) {
                params.push(p.parse_subroutine_param()?);
                if !p.consume(TokenKind::Comma) {
                    break;
                }
            }
            p.expect(TokenKind::RParen)?;
            let return_ty = p.parse_return_type()?;
            let body = p.parse_block()?;
            Ok((params, return_ty, body))
        })?;
        self.require_v3(start, "`def`");
        self.declare(name);
        Ok(self.push(
            NodeKind::SubroutineDef {
                name,
                params,
                return_ty,
                body,
            },
            self.span_from(start),
        ))
    }

    fn parse_subroutine_param(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        let ty = match self.peek() {
            Some(TokenKind::QReg | TokenKind::CReg) => {
                let register = if self.check(TokenKind::QReg) {
                    RegisterKind::QReg
                } else {
                    RegisterKind::CReg
                };
                self.advance();
                let name = self.parse_identifier()?;
                let size = self.parse_designator()?;
                self.declare(name);
                return Ok(self.push(
                    NodeKind::RegisterDecl {
                        register,
                        name,
                        size,
                    },
                    self.span_from(start),
                ));
            }
            Some(TokenKind::Readonly | TokenKind::Mutable) => self.parse_array_ref_type()?,
            _ => self.parse_type()?,
        };
        let name = self.parse_identifier()?;
        self.declare(name);
        Ok(self.push(NodeKind::Param { ty, name }, self.span_from(start)))
    }

    fn parse_return_type(&mut self) -> PResult<Option<NodeId>> {
        if self.consume(TokenKind::Arrow) {
            self.parse_type().map(Some)
        } else {
            Ok(None)
        }
    }

    /// `extern name(types) -> type;`
    fn parse_extern(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Extern)?.span;
        let name = self.parse_identifier()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) {
            let param = match self.peek() {
                Some(TokenKind::Readonly | TokenKind::Mutable) => self.parse_array_ref_type()?,
                Some(TokenKind::CReg) => {
                    let creg = self.current_span();
                    self.advance();
                    let size = self.parse_designator()?;
                    self.push(
                        NodeKind::RegisterType {
                            register: RegisterKind::CReg,
                            size,
                        },
                        self.span_from(creg),
                    )
                }
                _ => self.parse_type()?,
            };
            params.push(param);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        let return_ty = self.parse_return_type()?;
        self.expect(TokenKind::Semicolon)?;
        let span = self.span_from(start);
        self.require_v3(span, "`extern`");
        self.declare(name);
        Ok(self.push(
            NodeKind::ExternDecl {
                name,
                params,
                return_ty,
            },
            span,
        ))
    }

    /// `cal { ... }` with the body kept verbatim.
    fn parse_cal(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Cal)?.span;
        let body = self.parse_calibration_body()?;
        let span = self.span_from(start);
        self.require_v3(span, "`cal`");
        Ok(self.push(NodeKind::Cal { body }, span))
    }

    /// `defcal target(params) operands -> type { ... }`; everything between
    /// the keyword and the body is kept as raw text.
    fn parse_defcal(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Defcal)?.span;
        let Some(first) = self.current() else {
            return Err(self.unexpected("calibration target"));
        };
        if matches!(first.kind, TokenKind::CalibrationBody | TokenKind::Semicolon) {
            return Err(self.unexpected("calibration target"));
        }
        while !matches!(
            self.peek(),
            None | Some(TokenKind::CalibrationBody | TokenKind::Semicolon)
        ) {
            self.advance();
        }
        let signature = self.source[first.span.start as usize..self.prev_end as usize]
            .trim()
            .to_string();
        let body = self.parse_calibration_body()?;
        let span = self.span_from(start);
        self.require_v3(span, "`defcal`");
        Ok(self.push(
            NodeKind::Defcal {
                target: first.text.to_string(),
                signature,
                body,
            },
            span,
        ))
    }

    fn parse_calibration_body(&mut self) -> PResult<String> {
        let token = self.expect(TokenKind::CalibrationBody)?;
        let inner = token
            .text
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .unwrap_or(token.text);
        Ok(inner.to_string())
    }

    /// `box[duration] { ... }`
    fn parse_box(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Box)?.span;
        let duration = self.parse_designator()?;
        let body = self.parse_block()?;
        let span = self.span_from(start);
        self.require_v3(start, "`box`");
        Ok(self.push(NodeKind::Box { duration, body }, span))
    }

    /// `break;`, `continue;` or `end;`
    fn parse_jump(&mut self) -> PResult<NodeId> {
        let Some(token) = self.advance() else {
            return Err(self.unexpected("statement"));
        };
        self.expect(TokenKind::Semicolon)?;
        let kind = match token.kind {
            TokenKind::Break => NodeKind::Break,
            TokenKind::Continue => NodeKind::Continue,
            _ => NodeKind::End,
        };
        Ok(self.push(kind, self.span_from(token.span)))
    }

    fn parse_return(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Return)?.span;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_value()?)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(self.push(NodeKind::Return { value }, self.span_from(start)))
    }

    /// `if (cond) stmt else stmt`
    fn parse_if(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::If)?.span;
        let condition = self.parse_condition()?;
        let then_branch = self.parse_body()?;
        let else_branch = if self.consume(TokenKind::Else) {
            Some(self.parse_body()?)
        } else {
            None
        };
        Ok(self.push(
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            },
            self.span_from(start),
        ))
    }

    /// `for type var in iterable stmt`; the type is optional in 3.0.
    fn parse_for(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::For)?.span;
        self.require_v3(start, "`for`");
        let ty = if self.peek_at(1) == Some(TokenKind::In) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let (var, iterable, body) = self.scoped(|p| {
            let var = p.parse_identifier()?;
            p.expect(TokenKind::In)?;
            let iterable = match p.peek() {
                Some(TokenKind::LBracket) => {
                    p.advance();
                    let range = p.parse_range_or_expression()?;
                    p.expect(TokenKind::RBracket)?;
                    range
                }
                Some(TokenKind::LBrace) => p.parse_set()?,
                _ => p.parse_expression()?,
            };
            p.declare(var);
            let body = p.parse_body()?;
            Ok((var, iterable, body))
        })?;
        Ok(self.push(
            NodeKind::For {
                ty,
                var,
                iterable,
                body,
            },
            self.span_from(start),
        ))
    }

    fn parse_while(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::While)?.span;
        self.require_v3(start, "`while`");
        let condition = self.parse_condition()?;
        let body = self.parse_body()?;
        Ok(self.push(NodeKind::While { condition, body }, self.span_from(start)))
    }

    /// `switch (x) { case 0, 1 { ... } default { ... } }`
    fn parse_switch(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Switch)?.span;
        self.require_v3(start, "`switch`");
        let subject = self.parse_condition()?;
        self.expect(TokenKind::LBrace)?;
        self.open_blocks += 1;
        let cases = self.nested(Self::parse_cases);
        self.open_blocks -= 1;
        let cases = cases?;
        self.expect(TokenKind::RBrace)?;
        Ok(self.push(NodeKind::Switch { subject, cases }, self.span_from(start)))
    }

    fn parse_cases(&mut self) -> PResult<Vec<NodeId>> {
        let mut cases = Vec::new();
        loop {
            let start = self.current_span();
            match self.peek() {
                Some(TokenKind::Case) => {
                    self.advance();
                    let values = self.parse_expression_list(TokenKind::LBrace)?;
                    if values.is_empty() {
                        return Err(self.unexpected("case value"));
                    }
                    let body = self.parse_block()?;
                    cases.push(self.push(NodeKind::Case { values, body }, self.span_from(start)));
                }
                Some(TokenKind::Default) => {
                    self.advance();
                    let body = self.parse_block()?;
                    cases.push(self.push(NodeKind::Default { body }, self.span_from(start)));
                }
                Some(TokenKind::RBrace) => return Ok(cases),
                _ => return Err(self.unexpected("`case`, `default` or `}`")),
            }
        }
    }

    /// `( expr )`
    fn parse_condition(&mut self) -> PResult<NodeId> {
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        Ok(condition)
    }

    /// Body of a control-flow statement: a block or a single statement.
    fn parse_body(&mut self) -> PResult<NodeId> {
        if self.check(TokenKind::LBrace) {
            self.parse_block()
        } else {
            self.scoped(|p| p.nested(Self::parse_statement))
        }
    }

    /// `{ statements }` in a fresh scope.
    pub(super) fn parse_block(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::LBrace)?.span;
        self.open_blocks += 1;
        let items = self.nested(|p| p.scoped(Self::parse_block_items));
        self.open_blocks -= 1;
        let items = items?;
        self.expect(TokenKind::RBrace)?;
        Ok(self.push(NodeKind::Scope { items }, self.span_from(start)))
    }

    fn parse_block_items(&mut self) -> PResult<Vec<NodeId>> {
        let mut items = Vec::new();
        while !self.is_eof() && !self.check(TokenKind::RBrace) {
            items.push(self.statement_or_recover()?);
        }
        Ok(items)
    }

    /// `delay[duration] operands;`
    fn parse_delay(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Delay)?.span;
        self.expect(TokenKind::LBracket)?;
        let duration = self.parse_expression()?;
        self.expect(TokenKind::RBracket)?;
        let operands = self.parse_operand_list()?;
        self.expect(TokenKind::Semicolon)?;
        let span = self.span_from(start);
        self.require_v3(span, "`delay`");
        Ok(self.push(NodeKind::Delay { duration, operands }, span))
    }

    fn parse_reset(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Reset)?.span;
        let operand = self.parse_operand()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(self.push(NodeKind::Reset { operand }, self.span_from(start)))
    }

    /// `barrier q, r;` or `nop q;`
    fn parse_operand_statement(&mut self) -> PResult<NodeId> {
        let Some(keyword) = self.advance() else {
            return Err(self.unexpected("statement"));
        };
        let operands = self.parse_operand_list()?;
        self.expect(TokenKind::Semicolon)?;
        let span = self.span_from(keyword.span);
        if keyword.kind == TokenKind::Nop {
            self.require_v3(span, "`nop`");
            Ok(self.push(NodeKind::Nop { operands }, span))
        } else {
            Ok(self.push(NodeKind::Barrier { operands }, span))
        }
    }

    /// `measure q -> c;`
    fn parse_measure_statement(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        let measure = self.parse_measure()?;
        let target = if self.consume(TokenKind::Arrow) {
            Some(self.parse_operand()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(self.push(NodeKind::MeasureArrow { measure, target }, self.span_from(start)))
    }

    fn parse_operand_list(&mut self) -> PResult<Vec<NodeId>> {
        let mut operands = Vec::new();
        if self.check(TokenKind::Semicolon) {
            return Ok(operands);
        }
        loop {
            operands.push(self.parse_operand()?);
            if !self.consume(TokenKind::Comma) {
                return Ok(operands);
            }
        }
    }

    /// `ctrl @ rx(theta)[100ns] q, r;`
    fn parse_gate_call(&mut self) -> PResult<NodeId> {
        let start = self.current_span();

        let mut modifiers = Vec::new();
        while let Some(modifier) = self.peek().and_then(modifier_kind) {
            let modifier_start = self.current_span();
            self.advance();
            let arg = if self.consume(TokenKind::LParen) {
                let arg = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Some(arg)
            } else {
                None
            };
            self.expect(TokenKind::At)?;
            modifiers.push(self.push(
                NodeKind::GateModifier { modifier, arg },
                self.span_from(modifier_start),
            ));
        }

        let callee = match self.current() {
            Some(token) if matches!(token.kind, TokenKind::Identifier | TokenKind::Gphase) => {
                self.advance();
                self.push(
                    NodeKind::Identifier {
                        name: token.text.to_string(),
                    },
                    token.span,
                )
            }
            _ => return Err(self.unexpected("gate name")),
        };

        let args = if self.consume(TokenKind::LParen) {
            let args = self.parse_expression_list(TokenKind::RParen)?;
            self.expect(TokenKind::RParen)?;
            args
        } else {
            Vec::new()
        };
        let duration = self.parse_designator()?;
        let operands = self.parse_operand_list()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(self.push(
            NodeKind::GateCall {
                modifiers,
                callee,
                args,
                duration,
                operands,
            },
            self.span_from(start),
        ))
    }

    /// `c[0] = measure q[0];`, `x += 1;`
    fn parse_assignment(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        let target = self.parse_operand()?;
        let Some(op) = self.peek().and_then(assign_op) else {
            return Err(self.unexpected("assignment operator"));
        };
        self.advance();
        let value = self.parse_value()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(self.push(NodeKind::Assignment { target, op, value }, self.span_from(start)))
    }

    fn parse_expression_statement(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(self.push(NodeKind::ExprStmt { expr }, self.span_from(start)))
    }

    /// Look past the leading identifier and any `(...)` or `[...]` groups to
    /// tell gate calls, assignments and expressions apart.
    fn classify_identifier_statement(&self) -> IdentifierStatement {
        let next = self.pos + 1;
        match self.kind_at(next) {
            Some(TokenKind::Identifier | TokenKind::HardwareQubit) => IdentifierStatement::GateCall,
            Some(kind) if assign_op(kind).is_some() => IdentifierStatement::Assignment,
            Some(TokenKind::LParen) => {
                let mut i = self.skip_group(next);
                if self.kind_at(i) == Some(TokenKind::LBracket) {
                    i = self.skip_group(i);
                }
                match self.kind_at(i) {
                    Some(TokenKind::Identifier | TokenKind::HardwareQubit) => {
                        IdentifierStatement::GateCall
                    }
                    _ => IdentifierStatement::Expression,
                }
            }
            Some(TokenKind::LBracket) => {
                let mut i = next;
                while self.kind_at(i) == Some(TokenKind::LBracket) {
                    i = self.skip_group(i);
                }
                match self.kind_at(i) {
                    Some(kind) if assign_op(kind).is_some() => IdentifierStatement::Assignment,
                    Some(TokenKind::Identifier | TokenKind::HardwareQubit) => {
                        IdentifierStatement::GateCall
                    }
                    _ => IdentifierStatement::Expression,
                }
            }
            _ => IdentifierStatement::Expression,
        }
    }
}

fn parse_version_number(text: &str) -> Option<(u32, Option<u32>)> {
    match text.split_once('.') {
        Some((major, "")) => Some((major.parse().ok()?, None)),
        Some((major, minor)) => Some((major.parse().ok()?, Some(minor.parse().ok()?))),
        None => Some((text.parse().ok()?, None)),
    }
}

fn modifier_kind(kind: TokenKind) -> Option<ModifierKind> {
    Some(match kind {
        TokenKind::Inv => ModifierKind::Inv,
        TokenKind::Pow => ModifierKind::Pow,
        TokenKind::Ctrl => ModifierKind::Ctrl,
        TokenKind::NegCtrl => ModifierKind::NegCtrl,
        _ => return None,
    })
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Eq => return Some(AssignOp::Assign),
        TokenKind::PlusEq => BinaryOp::Add,
        TokenKind::MinusEq => BinaryOp::Sub,
        TokenKind::StarEq => BinaryOp::Mul,
        TokenKind::SlashEq => BinaryOp::Div,
        TokenKind::PercentEq => BinaryOp::Mod,
        TokenKind::StarStarEq => BinaryOp::Pow,
        TokenKind::AmpEq => BinaryOp::BitAnd,
        TokenKind::PipeEq => BinaryOp::BitOr,
        TokenKind::CaretEq => BinaryOp::BitXor,
        TokenKind::ShlEq => BinaryOp::Shl,
        TokenKind::ShrEq => BinaryOp::Shr,
        _ => return None,
    };
    Some(AssignOp::Compound(op))
}

/// Tokens that can only begin an expression statement.
fn starts_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::IntegerLiteral
            | TokenKind::FloatLiteral
            | TokenKind::NumberWithSuffix
            | TokenKind::Bitstring
            | TokenKind::HardwareQubit
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Pi
            | TokenKind::Tau
            | TokenKind::Euler
            | TokenKind::LParen
            | TokenKind::Minus
            | TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::DurationOf
    )
}
