//! Expression parsing for `OpenQASM` 3.

use qfront_ast::{BinaryOp, Constant, LiteralKind, NodeId, NodeKind, UnaryOp, parse_literal, suffix_kind};
use qfront_diag::{ErrorCode, Span};

use super::types::starts_type;
use super::{PResult, Parser};
use crate::lexer::TokenKind;

impl Parser<'_> {
    /// Parse an expression.
    pub(super) fn parse_expression(&mut self) -> PResult<NodeId> {
        self.nested(|p| p.parse_binary_expr(1))
    }

    /// Parse binary expression with precedence climbing.
    fn parse_binary_expr(&mut self, min_prec: u8) -> PResult<NodeId> {
        let mut lhs = self.parse_unary_expr()?;

        while let Some(op) = self.peek().and_then(binary_op) {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance();

            let rhs = self.parse_binary_expr(prec + 1)?;
            let span = self.builder.span(lhs).to(self.builder.span(rhs));
            lhs = self.push(NodeKind::Binary { op, lhs, rhs }, span);
        }

        Ok(lhs)
    }

    /// Parse unary expression.
    fn parse_unary_expr(&mut self) -> PResult<NodeId> {
        let op = match self.peek() {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Bang) => UnaryOp::Not,
            Some(TokenKind::Tilde) => UnaryOp::BitNot,
            _ => return self.parse_power_expr(),
        };
        let start = self.current_span();
        self.advance();
        let operand = self.nested(Self::parse_unary_expr)?;
        Ok(self.push(NodeKind::Unary { op, operand }, self.span_from(start)))
    }

    /// `**` is right-associative and binds tighter than a unary operator on
    /// its left: `-a ** b` is `-(a ** b)`.
    fn parse_power_expr(&mut self) -> PResult<NodeId> {
        let base = self.parse_postfix_expr()?;
        if !self.consume(TokenKind::StarStar) {
            return Ok(base);
        }
        let exponent = self.nested(Self::parse_unary_expr)?;
        let span = self.builder.span(base).to(self.builder.span(exponent));
        Ok(self.push(
            NodeKind::Binary {
                op: BinaryOp::Pow,
                lhs: base,
                rhs: exponent,
            },
            span,
        ))
    }

    fn parse_postfix_expr(&mut self) -> PResult<NodeId> {
        let mut expr = self.parse_primary_expr()?;
        while self.check(TokenKind::LBracket) {
            expr = self.parse_index(expr)?;
        }
        Ok(expr)
    }

    /// Parse primary expression.
    fn parse_primary_expr(&mut self) -> PResult<NodeId> {
        let Some(token) = self.current() else {
            return Err(self.unexpected("expression"));
        };

        match token.kind {
            TokenKind::IntegerLiteral | TokenKind::FloatLiteral | TokenKind::NumberWithSuffix => {
                Ok(self.parse_number())
            }
            TokenKind::Pi | TokenKind::Tau | TokenKind::Euler => {
                self.advance();
                let constant = match token.kind {
                    TokenKind::Pi => Constant::Pi,
                    TokenKind::Tau => Constant::Tau,
                    _ => Constant::Euler,
                };
                Ok(self.push(NodeKind::Constant { constant }, token.span))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                let value = token.kind == TokenKind::True;
                Ok(self.push(NodeKind::Bool { value }, token.span))
            }
            TokenKind::Bitstring => {
                self.advance();
                let bits = token.text[1..token.text.len() - 1].to_string();
                Ok(self.push(NodeKind::Bitstring { bits }, token.span))
            }
            TokenKind::HardwareQubit => Ok(self.parse_hardware_qubit()),
            TokenKind::Identifier => {
                let callee = self.parse_identifier()?;
                if !self.check(TokenKind::LParen) {
                    return Ok(callee);
                }
                self.advance();
                let args = self.parse_expression_list(TokenKind::RParen)?;
                self.expect(TokenKind::RParen)?;
                let span = self.span_from(token.span);
                Ok(self.push(NodeKind::Call { callee, args }, span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(self.push(NodeKind::Paren { inner }, self.span_from(token.span)))
            }
            TokenKind::DurationOf => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let scope = self.parse_block()?;
                self.expect(TokenKind::RParen)?;
                Ok(self.push(NodeKind::DurationOf { scope }, self.span_from(token.span)))
            }
            kind if starts_type(kind) => {
                let ty = self.parse_type()?;
                self.expect(TokenKind::LParen)?;
                let operand = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(self.push(NodeKind::Cast { ty, operand }, self.span_from(token.span)))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parse a numeric literal token, merging a following `im`.
    ///
    /// A malformed literal is reported as a literal error and stands in the
    /// tree as an `Error` node; parsing carries on.
    fn parse_number(&mut self) -> NodeId {
        let Some(token) = self.advance() else {
            return self.push(NodeKind::Error, self.current_span());
        };
        let (kind, end) = match token.kind {
            TokenKind::IntegerLiteral | TokenKind::FloatLiteral if self.check(TokenKind::Im) => {
                let im = self.advance().map_or(token.span.end, |t| t.span.end);
                (LiteralKind::Imaginary, im)
            }
            TokenKind::IntegerLiteral => (LiteralKind::Integer, token.span.end),
            TokenKind::FloatLiteral => (LiteralKind::Float, token.span.end),
            _ => (suffix_kind(token.text), token.span.end),
        };
        let span = Span::new(self.source_id, token.span.start, end);
        self.literal(span, kind)
    }

    fn literal(&mut self, span: Span, kind: LiteralKind) -> NodeId {
        let text = &self.source[span.range()];
        match parse_literal(text, kind) {
            Ok(literal) => self.push(NodeKind::Literal(literal), span),
            Err(err) => {
                self.diagnostics
                    .report(ErrorCode::LiteralError, span, format!("{err}"));
                self.push(NodeKind::Error, span)
            }
        }
    }

    fn parse_hardware_qubit(&mut self) -> NodeId {
        let Some(token) = self.advance() else {
            return self.push(NodeKind::Error, self.current_span());
        };
        match token.text[1..].parse::<u32>() {
            Ok(index) => self.push(NodeKind::HardwareQubit { index }, token.span),
            Err(_) => {
                self.diagnostics.report(
                    ErrorCode::LiteralError,
                    token.span,
                    format!("hardware qubit index `{}` is out of range", token.text),
                );
                self.push(NodeKind::Error, token.span)
            }
        }
    }

    pub(super) fn parse_identifier(&mut self) -> PResult<NodeId> {
        let token = self.expect(TokenKind::Identifier)?;
        Ok(self.push(
            NodeKind::Identifier {
                name: token.text.to_string(),
            },
            token.span,
        ))
    }

    /// `base[items]`.
    pub(super) fn parse_index(&mut self, base: NodeId) -> PResult<NodeId> {
        let start = self.builder.span(base);
        self.expect(TokenKind::LBracket)?;
        let mut items = vec![self.parse_index_item()?];
        while self.consume(TokenKind::Comma) {
            items.push(self.parse_index_item()?);
        }
        self.expect(TokenKind::RBracket)?;
        Ok(self.push(NodeKind::Index { base, items }, self.span_from(start)))
    }

    fn parse_index_item(&mut self) -> PResult<NodeId> {
        if self.check(TokenKind::LBrace) {
            self.parse_set()
        } else {
            self.parse_range_or_expression()
        }
    }

    /// An expression, or a range `start:end` / `start:step:end` with any
    /// part optional.
    pub(super) fn parse_range_or_expression(&mut self) -> PResult<NodeId> {
        let start_span = self.current_span();
        let start = if self.check(TokenKind::Colon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        match start {
            Some(expr) if !self.check(TokenKind::Colon) => return Ok(expr),
            _ => {}
        }
        self.expect(TokenKind::Colon)?;

        let second = self.parse_range_part()?;
        let (step, end) = if self.consume(TokenKind::Colon) {
            (second, self.parse_range_part()?)
        } else {
            (None, second)
        };
        Ok(self.push(NodeKind::Range { start, step, end }, self.span_from(start_span)))
    }

    fn parse_range_part(&mut self) -> PResult<Option<NodeId>> {
        match self.peek() {
            None | Some(TokenKind::RBracket | TokenKind::Comma | TokenKind::Colon) => Ok(None),
            Some(_) => self.parse_expression().map(Some),
        }
    }

    /// `{a, b, c}` in a `for` loop or an index.
    pub(super) fn parse_set(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let elements = self.parse_expression_list(TokenKind::RBrace)?;
        self.expect(TokenKind::RBrace)?;
        Ok(self.push(NodeKind::Set { elements }, self.span_from(start)))
    }

    /// `{...}` initialiser of an array declaration; elements may nest.
    pub(super) fn parse_array_literal(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut elements = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let element = if self.check(TokenKind::LBrace) {
                self.nested(Self::parse_array_literal)?
            } else {
                self.parse_expression()?
            };
            elements.push(element);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(self.push(NodeKind::ArrayLiteral { elements }, self.span_from(start)))
    }

    /// Comma-separated expressions up to (not including) `close`. A trailing
    /// comma is allowed.
    pub(super) fn parse_expression_list(&mut self, close: TokenKind) -> PResult<Vec<NodeId>> {
        let mut exprs = Vec::new();
        while !self.check(close) {
            exprs.push(self.parse_expression()?);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(exprs)
    }

    /// `measure operand`.
    pub(super) fn parse_measure(&mut self) -> PResult<NodeId> {
        let start = self.expect(TokenKind::Measure)?.span;
        let operand = self.parse_operand()?;
        Ok(self.push(NodeKind::Measure { operand }, self.span_from(start)))
    }

    /// Right-hand side of an assignment, initialiser or `return`.
    pub(super) fn parse_value(&mut self) -> PResult<NodeId> {
        if self.check(TokenKind::Measure) {
            self.parse_measure()
        } else {
            self.parse_expression()
        }
    }

    /// Gate operand: `q`, `q[0]`, `q[0:2][1]` or `$3`.
    pub(super) fn parse_operand(&mut self) -> PResult<NodeId> {
        match self.peek() {
            Some(TokenKind::HardwareQubit) => Ok(self.parse_hardware_qubit()),
            Some(TokenKind::Identifier) => {
                let mut operand = self.parse_identifier()?;
                while self.check(TokenKind::LBracket) {
                    operand = self.parse_index(operand)?;
                }
                Ok(operand)
            }
            _ => Err(self.unexpected("qubit operand")),
        }
    }
}

/// Peek at binary operator. `**` is handled separately.
fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::AndAnd => BinaryOp::And,
        TokenKind::OrOr => BinaryOp::Or,
        TokenKind::Amp => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Shl => BinaryOp::Shl,
        TokenKind::Shr => BinaryOp::Shr,
        _ => return None,
    })
}

/// Get operator precedence.
fn op_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 1,
        BinaryOp::And => 2,
        BinaryOp::BitOr => 3,
        BinaryOp::BitXor => 4,
        BinaryOp::BitAnd => 5,
        BinaryOp::Eq | BinaryOp::NotEq => 6,
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => 7,
        BinaryOp::Shl | BinaryOp::Shr => 8,
        BinaryOp::Add | BinaryOp::Sub => 9,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 10,
        BinaryOp::Pow => 11,
    }
}

#[cfg(test)]
mod tests {
    use qfront_ast::{Ast, LiteralValue};
    use qfront_diag::SourceId;

    use crate::{ParseOptions, parse};

    /// Parse `x = <expr>;` and render the value as an s-expression.
    fn sexpr(expr: &str) -> String {
        let out = parse(&format!("x = {expr};"), SourceId(0), &ParseOptions::default());
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let ast = &out.ast;
        let qfront_ast::NodeKind::Assignment { value, .. } = ast.kind(ast.program_items()[0]) else {
            panic!("expected assignment");
        };
        render(ast, *value)
    }

    fn render(ast: &Ast, id: qfront_ast::NodeId) -> String {
        use qfront_ast::NodeKind as K;
        match ast.kind(id) {
            K::Identifier { name } => name.clone(),
            K::Literal(lit) => lit.to_string(),
            K::Constant { constant } => format!("{constant:?}").to_lowercase(),
            K::Paren { inner } => render(ast, *inner),
            K::Unary { op, operand } => format!("({}{})", op.symbol(), render(ast, *operand)),
            K::Binary { op, lhs, rhs } => {
                format!("({} {} {})", render(ast, *lhs), op.symbol(), render(ast, *rhs))
            }
            K::Call { callee, args } => format!(
                "{}({})",
                render(ast, *callee),
                args.iter().map(|&a| render(ast, a)).collect::<Vec<_>>().join(", ")
            ),
            K::Index { base, items } => format!(
                "{}[{}]",
                render(ast, *base),
                items.iter().map(|&a| render(ast, a)).collect::<Vec<_>>().join(", ")
            ),
            K::Range { start, step, end } => {
                let part = |p: &Option<qfront_ast::NodeId>| p.map(|p| render(ast, p)).unwrap_or_default();
                match step {
                    Some(_) => format!("{}:{}:{}", part(start), part(step), part(end)),
                    None => format!("{}:{}", part(start), part(end)),
                }
            }
            K::Cast { ty, operand } => format!("{}({})", ast.kind(*ty).tag(), render(ast, *operand)),
            other => other.tag().to_string(),
        }
    }

    #[test]
    fn test_precedence_table() {
        assert_eq!(sexpr("a + b * c"), "(a + (b * c))");
        assert_eq!(sexpr("a * b + c"), "((a * b) + c)");
        assert_eq!(sexpr("a - b - c"), "((a - b) - c)");
        assert_eq!(sexpr("a || b && c"), "(a || (b && c))");
        assert_eq!(sexpr("a | b ^ c & d"), "(a | (b ^ (c & d)))");
        assert_eq!(sexpr("a == b < c"), "(a == (b < c))");
        assert_eq!(sexpr("a < b << c"), "(a < (b << c))");
        assert_eq!(sexpr("a << b + c"), "(a << (b + c))");
    }

    #[test]
    fn test_power_is_right_associative_and_beats_unary() {
        assert_eq!(sexpr("a ** b ** c"), "(a ** (b ** c))");
        assert_eq!(sexpr("-a ** b"), "(-(a ** b))");
        assert_eq!(sexpr("a ** -b"), "(a ** (-b))");
        assert_eq!(sexpr("2 * a ** 2"), "(2 * (a ** 2))");
    }

    #[test]
    fn test_postfix_and_calls() {
        assert_eq!(sexpr("sin(pi / 2) + a[1]"), "(sin((pi / 2)) + a[1])");
        assert_eq!(sexpr("a[0:2:10]"), "a[0:2:10]");
        assert_eq!(sexpr("a[:3]"), "a[:3]");
        assert_eq!(sexpr("float[64](b)"), "ScalarType(b)");
    }

    #[test]
    fn test_imaginary_with_space() {
        let out = parse("x = 1.5 im;", SourceId(0), &ParseOptions::default());
        assert!(out.diagnostics.is_empty());
        let lit = out
            .ast
            .descendants()
            .find_map(|id| match out.ast.kind(id) {
                qfront_ast::NodeKind::Literal(lit) => Some(lit.clone()),
                _ => None,
            })
            .unwrap();
        assert!(matches!(lit.value, LiteralValue::Imaginary(_)));
        assert_eq!(lit.to_string(), "1.5im");
    }

    #[test]
    fn test_bad_unit_is_literal_error() {
        let out = parse("delay[10xs] q;", SourceId(0), &ParseOptions::default());
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].code, qfront_diag::ErrorCode::LiteralError);
        assert_eq!(out.diagnostics[0].span.range(), 6..10);
    }
}
