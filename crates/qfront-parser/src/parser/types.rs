//! Type syntax: scalar types with designators, `complex`, `array` and
//! array references in subroutine signatures.

use qfront_ast::{NodeId, NodeKind, ScalarKind};

use super::{PResult, Parser};
use crate::lexer::TokenKind;

pub(super) fn scalar_kind(kind: TokenKind) -> Option<ScalarKind> {
    Some(match kind {
        TokenKind::Bit => ScalarKind::Bit,
        TokenKind::Int => ScalarKind::Int,
        TokenKind::Uint => ScalarKind::Uint,
        TokenKind::Float => ScalarKind::Float,
        TokenKind::Angle => ScalarKind::Angle,
        TokenKind::Bool => ScalarKind::Bool,
        TokenKind::Duration => ScalarKind::Duration,
        TokenKind::Stretch => ScalarKind::Stretch,
        _ => return None,
    })
}

/// Classical types that may begin a declaration or a cast.
pub(super) fn starts_type(kind: TokenKind) -> bool {
    scalar_kind(kind).is_some() || matches!(kind, TokenKind::Complex | TokenKind::Array)
}

impl Parser<'_> {
    /// Parse a type, including `qubit[n]` for subroutine parameters.
    pub(super) fn parse_type(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        match self.peek() {
            Some(TokenKind::Complex) => {
                self.advance();
                let component = if self.consume(TokenKind::LBracket) {
                    let component = self.nested(Self::parse_scalar_type)?;
                    self.expect(TokenKind::RBracket)?;
                    Some(component)
                } else {
                    None
                };
                Ok(self.push(NodeKind::ComplexType { component }, self.span_from(start)))
            }
            Some(TokenKind::Array) => {
                self.advance();
                self.expect(TokenKind::LBracket)?;
                let element = self.parse_scalar_type()?;
                self.expect(TokenKind::Comma)?;
                let dims = self.parse_expression_list(TokenKind::RBracket)?;
                if dims.is_empty() {
                    return Err(self.unexpected("array dimension"));
                }
                self.expect(TokenKind::RBracket)?;
                Ok(self.push(NodeKind::ArrayType { element, dims }, self.span_from(start)))
            }
            Some(TokenKind::Qubit) => {
                self.advance();
                let size = self.parse_designator()?;
                Ok(self.push(NodeKind::QubitType { size }, self.span_from(start)))
            }
            _ => self.parse_scalar_type(),
        }
    }

    /// Scalar type with optional designator. `complex` is accepted too, as
    /// the element of an array.
    fn parse_scalar_type(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        let Some(scalar) = self.peek().and_then(scalar_kind) else {
            if self.check(TokenKind::Complex) {
                return self.parse_type();
            }
            return Err(self.unexpected("type"));
        };
        self.advance();
        let designator = self.parse_designator()?;
        Ok(self.push(NodeKind::ScalarType { scalar, designator }, self.span_from(start)))
    }

    /// `[expr]` after a type or a gate name.
    pub(super) fn parse_designator(&mut self) -> PResult<Option<NodeId>> {
        if !self.consume(TokenKind::LBracket) {
            return Ok(None);
        }
        let expr = self.parse_expression()?;
        self.expect(TokenKind::RBracket)?;
        Ok(Some(expr))
    }

    /// `readonly array[T, n, m]` or `mutable array[T, #dim = 2]`.
    pub(super) fn parse_array_ref_type(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        let mutable = match self.peek() {
            Some(TokenKind::Mutable) => true,
            Some(TokenKind::Readonly) => false,
            _ => return Err(self.unexpected("`readonly` or `mutable`")),
        };
        self.advance();
        self.expect(TokenKind::Array)?;
        self.expect(TokenKind::LBracket)?;
        let element = self.parse_scalar_type()?;
        self.expect(TokenKind::Comma)?;
        let (dims, rank) = if self.consume(TokenKind::Dim) {
            self.expect(TokenKind::Eq)?;
            (Vec::new(), Some(self.parse_expression()?))
        } else {
            (self.parse_expression_list(TokenKind::RBracket)?, None)
        };
        self.expect(TokenKind::RBracket)?;
        Ok(self.push(
            NodeKind::ArrayRefType {
                mutable,
                element,
                dims,
                rank,
            },
            self.span_from(start),
        ))
    }

    /// A type keyword followed by `(`, possibly after a designator, starts a
    /// cast rather than a declaration.
    pub(super) fn type_starts_cast(&self) -> bool {
        let mut i = self.pos + 1;
        if self.kind_at(i) == Some(TokenKind::LBracket) {
            i = self.skip_group(i);
        }
        self.kind_at(i) == Some(TokenKind::LParen)
    }
}

#[cfg(test)]
mod tests {
    use qfront_ast::{NodeKind, ScalarKind};
    use qfront_diag::SourceId;

    use crate::{ParseOptions, parse};

    fn first_decl_type(source: &str) -> (qfront_ast::Ast, qfront_ast::NodeId) {
        let out = parse(source, SourceId(0), &ParseOptions::default());
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let item = out.ast.program_items()[0];
        let ty = match out.ast.kind(item) {
            NodeKind::ClassicalDecl { ty, .. } | NodeKind::ConstDecl { ty, .. } => *ty,
            other => panic!("unexpected {}", other.tag()),
        };
        (out.ast, ty)
    }

    #[test]
    fn test_scalar_with_designator() {
        let (ast, ty) = first_decl_type("int[32] x = 5;");
        let NodeKind::ScalarType { scalar, designator } = ast.kind(ty) else {
            panic!("expected scalar type");
        };
        assert_eq!(*scalar, ScalarKind::Int);
        assert!(designator.is_some());
    }

    #[test]
    fn test_complex_and_array() {
        let (ast, ty) = first_decl_type("complex[float[64]] z;");
        assert!(matches!(ast.kind(ty), NodeKind::ComplexType { component: Some(_) }));

        let (ast, ty) = first_decl_type("array[int[8], 2, 3] a;");
        let NodeKind::ArrayType { dims, .. } = ast.kind(ty) else {
            panic!("expected array type");
        };
        assert_eq!(dims.len(), 2);
    }

    #[test]
    fn test_array_ref_parameters() {
        let source = "def f(readonly array[int[8], #dim = 2] a, mutable array[bit, 4] b) {}";
        let out = parse(source, SourceId(0), &ParseOptions::default());
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let refs: Vec<_> = out
            .ast
            .descendants()
            .filter_map(|id| match out.ast.kind(id) {
                NodeKind::ArrayRefType { mutable, rank, .. } => Some((*mutable, rank.is_some())),
                _ => None,
            })
            .collect();
        assert_eq!(refs, vec![(false, true), (true, false)]);
    }

    #[test]
    fn test_cast_statement_is_not_a_declaration() {
        let out = parse("int[8](x);", SourceId(0), &ParseOptions::default());
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let item = out.ast.program_items()[0];
        assert_eq!(out.ast.kind(item).tag(), "ExprStmt");
    }
}
