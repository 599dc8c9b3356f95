//! Lexer for `OpenQASM` 3.
//!
//! [`tokenize`] returns a lazy iterator of [`Token`]s. Comments come out as
//! trivia tokens; malformed input comes out as [`TokenKind::Error`] tokens
//! with a matching diagnostic, collected with [`Lexer::take_diagnostics`].

use std::fmt;
use std::ops::Range;

use logos::Logos;
use qfront_diag::{Diagnostics, ErrorCode, SourceId, Span};

/// Why logos rejected a piece of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    #[default]
    InvalidCharacter,
    UnterminatedString,
    UnterminatedComment,
}

/// Token kinds for `OpenQASM` 3.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    // Trivia
    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("defcalgrammar")]
    DefcalGrammar,

    #[token("def")]
    Def,

    #[token("cal")]
    Cal,

    #[token("defcal")]
    Defcal,

    #[token("gate")]
    Gate,

    #[token("opaque")]
    Opaque,

    #[token("extern")]
    Extern,

    #[token("box")]
    Box,

    #[token("let")]
    Let,

    #[token("break")]
    Break,

    #[token("continue")]
    Continue,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("end")]
    End,

    #[token("return")]
    Return,

    #[token("for")]
    For,

    #[token("while")]
    While,

    #[token("in")]
    In,

    #[token("switch")]
    Switch,

    #[token("case")]
    Case,

    #[token("default")]
    Default,

    #[token("nop")]
    Nop,

    #[token("input")]
    Input,

    #[token("output")]
    Output,

    #[token("const")]
    Const,

    #[token("readonly")]
    Readonly,

    #[token("mutable")]
    Mutable,

    #[token("qreg")]
    QReg,

    #[token("qubit")]
    Qubit,

    #[token("creg")]
    CReg,

    #[token("bool")]
    Bool,

    #[token("bit")]
    Bit,

    #[token("int")]
    Int,

    #[token("uint")]
    Uint,

    #[token("float")]
    Float,

    #[token("angle")]
    Angle,

    #[token("complex")]
    Complex,

    #[token("array")]
    Array,

    #[token("void")]
    Void,

    #[token("duration")]
    Duration,

    #[token("stretch")]
    Stretch,

    #[token("gphase")]
    Gphase,

    #[token("inv")]
    Inv,

    #[token("pow")]
    Pow,

    #[token("ctrl")]
    Ctrl,

    #[token("negctrl")]
    NegCtrl,

    #[token("#dim")]
    Dim,

    #[token("durationof")]
    DurationOf,

    #[token("delay")]
    Delay,

    #[token("reset")]
    Reset,

    #[token("measure")]
    Measure,

    #[token("barrier")]
    Barrier,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("im")]
    Im,

    // Constants
    #[token("pi")]
    #[token("π", priority = 10)]
    Pi,

    #[token("tau")]
    #[token("τ", priority = 10)]
    Tau,

    #[token("euler")]
    #[token("ℇ", priority = 10)]
    Euler,

    // Whole-line constructs
    #[regex(r"#pragma[^\n]*")]
    #[regex(r"pragma[ \t][^\n]*")]
    Pragma,

    #[regex(r"@[\p{L}_][\p{L}0-9_.]*([ \t][^\n]*)?")]
    Annotation,

    // Literals
    #[regex(r"[0-9][0-9_]*")]
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    #[regex(r"0[oO][0-7_]+")]
    #[regex(r"0[bB][01_]+")]
    IntegerLiteral,

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+")]
    FloatLiteral,

    /// A number immediately followed by letters: an imaginary (`im`) or
    /// duration literal. The suffix is validated by the parser.
    #[regex(r"([0-9][0-9_]*(\.[0-9_]*)?|\.[0-9][0-9_]*)([eE][+-]?[0-9]+)?[a-zA-Zµμ]+")]
    NumberWithSuffix,

    #[token("\"", |lex| string_literal(lex, '"'))]
    #[token("'", |lex| string_literal(lex, '\''))]
    StringLiteral,

    /// A string made only of `0`, `1` and `_`. Produced by [`Lexer`], never
    /// by logos directly.
    Bitstring,

    #[regex(r"\$[0-9]+")]
    HardwareQubit,

    #[regex(r"[\p{L}_][\p{L}\p{N}_]*")]
    Identifier,

    /// Raw `{ ... }` body of a `cal` or `defcal`. Produced by [`Lexer`].
    CalibrationBody,

    // Operators
    #[token("+")]
    Plus,

    #[token("++")]
    PlusPlus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("**")]
    StarStar,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    LtEq,

    #[token(">")]
    Gt,

    #[token(">=")]
    GtEq,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,

    #[token("!")]
    Bang,

    #[token("~")]
    Tilde,

    #[token("&")]
    Amp,

    #[token("|")]
    Pipe,

    #[token("^")]
    Caret,

    #[token("<<")]
    Shl,

    #[token(">>")]
    Shr,

    #[token("=")]
    Eq,

    #[token("+=")]
    PlusEq,

    #[token("-=")]
    MinusEq,

    #[token("*=")]
    StarEq,

    #[token("/=")]
    SlashEq,

    #[token("%=")]
    PercentEq,

    #[token("**=")]
    StarStarEq,

    #[token("&=")]
    AmpEq,

    #[token("|=")]
    PipeEq,

    #[token("^=")]
    CaretEq,

    #[token("<<=")]
    ShlEq,

    #[token(">>=")]
    ShrEq,

    #[token("->")]
    Arrow,

    #[token("@")]
    At,

    // Punctuation
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    /// Placeholder for input that could not be tokenized.
    Error,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// Keywords that can only begin a statement. Used to resynchronise after
    /// a syntax error.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenKind::OpenQasm
                | TokenKind::Include
                | TokenKind::DefcalGrammar
                | TokenKind::Def
                | TokenKind::Cal
                | TokenKind::Defcal
                | TokenKind::Gate
                | TokenKind::Opaque
                | TokenKind::Extern
                | TokenKind::Box
                | TokenKind::Let
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::If
                | TokenKind::End
                | TokenKind::Return
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Switch
                | TokenKind::Nop
                | TokenKind::Input
                | TokenKind::Output
                | TokenKind::Const
                | TokenKind::QReg
                | TokenKind::Qubit
                | TokenKind::CReg
                | TokenKind::Delay
                | TokenKind::Reset
                | TokenKind::Barrier
                | TokenKind::Pragma
                | TokenKind::Annotation
        )
    }

    /// Human-readable name used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::LineComment | TokenKind::BlockComment => "comment",
            TokenKind::OpenQasm => "`OPENQASM`",
            TokenKind::Include => "`include`",
            TokenKind::DefcalGrammar => "`defcalgrammar`",
            TokenKind::Def => "`def`",
            TokenKind::Cal => "`cal`",
            TokenKind::Defcal => "`defcal`",
            TokenKind::Gate => "`gate`",
            TokenKind::Opaque => "`opaque`",
            TokenKind::Extern => "`extern`",
            TokenKind::Box => "`box`",
            TokenKind::Let => "`let`",
            TokenKind::Break => "`break`",
            TokenKind::Continue => "`continue`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::End => "`end`",
            TokenKind::Return => "`return`",
            TokenKind::For => "`for`",
            TokenKind::While => "`while`",
            TokenKind::In => "`in`",
            TokenKind::Switch => "`switch`",
            TokenKind::Case => "`case`",
            TokenKind::Default => "`default`",
            TokenKind::Nop => "`nop`",
            TokenKind::Input => "`input`",
            TokenKind::Output => "`output`",
            TokenKind::Const => "`const`",
            TokenKind::Readonly => "`readonly`",
            TokenKind::Mutable => "`mutable`",
            TokenKind::QReg => "`qreg`",
            TokenKind::Qubit => "`qubit`",
            TokenKind::CReg => "`creg`",
            TokenKind::Bool => "`bool`",
            TokenKind::Bit => "`bit`",
            TokenKind::Int => "`int`",
            TokenKind::Uint => "`uint`",
            TokenKind::Float => "`float`",
            TokenKind::Angle => "`angle`",
            TokenKind::Complex => "`complex`",
            TokenKind::Array => "`array`",
            TokenKind::Void => "`void`",
            TokenKind::Duration => "`duration`",
            TokenKind::Stretch => "`stretch`",
            TokenKind::Gphase => "`gphase`",
            TokenKind::Inv => "`inv`",
            TokenKind::Pow => "`pow`",
            TokenKind::Ctrl => "`ctrl`",
            TokenKind::NegCtrl => "`negctrl`",
            TokenKind::Dim => "`#dim`",
            TokenKind::DurationOf => "`durationof`",
            TokenKind::Delay => "`delay`",
            TokenKind::Reset => "`reset`",
            TokenKind::Measure => "`measure`",
            TokenKind::Barrier => "`barrier`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Im => "`im`",
            TokenKind::Pi => "`pi`",
            TokenKind::Tau => "`tau`",
            TokenKind::Euler => "`euler`",
            TokenKind::Pragma => "pragma",
            TokenKind::Annotation => "annotation",
            TokenKind::IntegerLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::NumberWithSuffix => "number with suffix",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Bitstring => "bitstring",
            TokenKind::HardwareQubit => "hardware qubit",
            TokenKind::Identifier => "identifier",
            TokenKind::CalibrationBody => "calibration block",
            TokenKind::Plus => "`+`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::StarStar => "`**`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::LtEq => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::GtEq => "`>=`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::Bang => "`!`",
            TokenKind::Tilde => "`~`",
            TokenKind::Amp => "`&`",
            TokenKind::Pipe => "`|`",
            TokenKind::Caret => "`^`",
            TokenKind::Shl => "`<<`",
            TokenKind::Shr => "`>>`",
            TokenKind::Eq => "`=`",
            TokenKind::PlusEq => "`+=`",
            TokenKind::MinusEq => "`-=`",
            TokenKind::StarEq => "`*=`",
            TokenKind::SlashEq => "`/=`",
            TokenKind::PercentEq => "`%=`",
            TokenKind::StarStarEq => "`**=`",
            TokenKind::AmpEq => "`&=`",
            TokenKind::PipeEq => "`|=`",
            TokenKind::CaretEq => "`^=`",
            TokenKind::ShlEq => "`<<=`",
            TokenKind::ShrEq => "`>>=`",
            TokenKind::Arrow => "`->`",
            TokenKind::At => "`@`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::Error => "invalid input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token: its kind, the exact source text and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
}

fn block_comment(lex: &mut logos::Lexer<'_, TokenKind>) -> Result<(), LexErrorKind> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            Ok(())
        }
        None => {
            lex.bump(lex.remainder().len());
            Err(LexErrorKind::UnterminatedComment)
        }
    }
}

// An unterminated string stops at the end of its line.
fn string_literal(lex: &mut logos::Lexer<'_, TokenKind>, quote: char) -> Result<(), LexErrorKind> {
    let rest = lex.remainder();
    let line_end = rest.find('\n').unwrap_or(rest.len());
    match rest[..line_end].find(quote) {
        Some(end) => {
            lex.bump(end + quote.len_utf8());
            Ok(())
        }
        None => {
            lex.bump(line_end);
            Err(LexErrorKind::UnterminatedString)
        }
    }
}

/// Lazy token stream over one source file.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source_id: SourceId,
    diagnostics: Diagnostics,
    /// A result read ahead while merging a run of invalid characters.
    stashed: Option<(Result<TokenKind, LexErrorKind>, Range<usize>)>,
    /// Set after `cal`/`defcal`: the next `{` opens a raw body.
    calibration_pending: bool,
}

/// Start tokenizing `source`. Every call starts from scratch.
pub fn tokenize(source: &str, source_id: SourceId) -> Lexer<'_> {
    Lexer {
        inner: TokenKind::lexer(source),
        source_id,
        diagnostics: Diagnostics::new(),
        stashed: None,
        calibration_pending: false,
    }
}

impl<'src> Lexer<'src> {
    /// Diagnostics reported so far. Draining is explicit: nothing is
    /// reported anywhere else.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    fn source(&self) -> &'src str {
        self.inner.source()
    }

    fn token(&self, kind: TokenKind, range: Range<usize>) -> Token<'src> {
        let source = self.source();
        Token {
            kind,
            text: &source[range.clone()],
            span: Span::from_range(self.source_id, range),
        }
    }

    fn raw_next(&mut self) -> Option<(Result<TokenKind, LexErrorKind>, Range<usize>)> {
        if let Some(stashed) = self.stashed.take() {
            return Some(stashed);
        }
        let result = self.inner.next()?;
        Some((result, self.inner.span()))
    }

    fn error(&mut self, range: Range<usize>, message: String) -> Token<'src> {
        let token = self.token(TokenKind::Error, range);
        self.diagnostics
            .report(ErrorCode::LexicalError, token.span, message);
        token
    }

    /// Merge adjacent invalid characters into one error token.
    fn invalid_run(&mut self, mut range: Range<usize>) -> Token<'src> {
        while let Some((result, next)) = self.raw_next() {
            if result == Err(LexErrorKind::InvalidCharacter) && next.start == range.end {
                range.end = next.end;
            } else {
                self.stashed = Some((result, next));
                break;
            }
        }
        let text = &self.source()[range.clone()];
        let message = if text.chars().count() == 1 {
            format!("invalid character `{text}`")
        } else {
            format!("invalid characters `{text}`")
        };
        self.error(range, message)
    }

    /// Read a raw calibration body starting at the `{` in `open`.
    fn calibration_body(&mut self, open: Range<usize>) -> Token<'src> {
        let mut depth = 1usize;
        let mut end = None;
        for (i, c) in self.inner.remainder().char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i + 1);
                        break;
                    }
                }
                _ => {}
            }
        }
        match end {
            Some(len) => {
                self.inner.bump(len);
                self.token(TokenKind::CalibrationBody, open.start..open.end + len)
            }
            None => {
                let len = self.inner.remainder().len();
                self.inner.bump(len);
                self.error(
                    open.start..open.end + len,
                    "unterminated calibration block".to_string(),
                )
            }
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Token<'src>> {
        let (result, range) = self.raw_next()?;
        let token = match result {
            Ok(TokenKind::LBrace) if self.calibration_pending => {
                self.calibration_pending = false;
                return Some(self.calibration_body(range));
            }
            Ok(kind @ (TokenKind::Cal | TokenKind::Defcal)) => {
                self.calibration_pending = true;
                self.token(kind, range)
            }
            Ok(TokenKind::StringLiteral) => {
                let token = self.token(TokenKind::StringLiteral, range);
                let inner = &token.text[1..token.text.len() - 1];
                if !inner.is_empty() && inner.bytes().all(|b| matches!(b, b'0' | b'1' | b'_')) {
                    Token {
                        kind: TokenKind::Bitstring,
                        ..token
                    }
                } else {
                    token
                }
            }
            Ok(kind) => {
                if matches!(kind, TokenKind::Semicolon | TokenKind::RBrace) {
                    self.calibration_pending = false;
                }
                self.token(kind, range)
            }
            Err(LexErrorKind::InvalidCharacter) => self.invalid_run(range),
            Err(LexErrorKind::UnterminatedString) => {
                self.error(range, "unterminated string literal".to_string())
            }
            Err(LexErrorKind::UnterminatedComment) => {
                self.error(range, "unterminated block comment".to_string())
            }
        };
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source, SourceId(0)).map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_tokens() {
        let tokens: Vec<_> = tokenize("OPENQASM 3.0;", SourceId(0)).collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::OpenQasm);
        assert_eq!(tokens[1].kind, TokenKind::FloatLiteral);
        assert_eq!(tokens[1].text, "3.0");
        assert_eq!(tokens[2].kind, TokenKind::Semicolon);
        assert_eq!(tokens[2].span, Span::new(SourceId(0), 12, 13));
    }

    #[test]
    fn test_qubit_declaration() {
        assert_eq!(
            kinds("qubit[2] q;"),
            vec![
                TokenKind::Qubit,
                TokenKind::LBracket,
                TokenKind::IntegerLiteral,
                TokenKind::RBracket,
                TokenKind::Identifier,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("0x1F 0b1_0 0o17 1_000 1.5 .5 1. 1e10 2.5E-3"),
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
            ]
        );
    }

    #[test]
    fn test_suffixed_numbers() {
        let tokens: Vec<_> = tokenize("100ns 2.5us 4dt 1.5im 3 im 7xyz", SourceId(0)).collect();
        let texts: Vec<_> = tokens.iter().map(|t| (t.kind, t.text)).collect();
        assert_eq!(
            texts,
            vec![
                (TokenKind::NumberWithSuffix, "100ns"),
                (TokenKind::NumberWithSuffix, "2.5us"),
                (TokenKind::NumberWithSuffix, "4dt"),
                (TokenKind::NumberWithSuffix, "1.5im"),
                (TokenKind::IntegerLiteral, "3"),
                (TokenKind::Im, "im"),
                (TokenKind::NumberWithSuffix, "7xyz"),
            ]
        );
    }

    #[test]
    fn test_micro_sign_units() {
        assert_eq!(kinds("5µs 5μs"), vec![TokenKind::NumberWithSuffix; 2]);
    }

    #[test]
    fn test_comments_are_trivia() {
        let source = "// line\nqubit q; /* block\n comment */ bit c;";
        let tokens: Vec<_> = tokenize(source, SourceId(0)).collect();
        assert_eq!(tokens[0].kind, TokenKind::LineComment);
        assert_eq!(tokens[4].kind, TokenKind::BlockComment);
        assert_eq!(tokens[4].text, "/* block\n comment */");
        assert_eq!(tokens.iter().filter(|t| !t.kind.is_trivia()).count(), 6);
    }

    #[test]
    fn test_unicode_identifiers_and_constants() {
        let tokens: Vec<_> = tokenize("θ = π / 2;", SourceId(0)).collect();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "θ");
        assert_eq!(tokens[2].kind, TokenKind::Pi);
    }

    #[test]
    fn test_strings_and_bitstrings() {
        assert_eq!(
            kinds(r#"include "stdgates.inc"; b = "0110"; 'x'"#),
            vec![
                TokenKind::Include,
                TokenKind::StringLiteral,
                TokenKind::Semicolon,
                TokenKind::Identifier,
                TokenKind::Eq,
                TokenKind::Bitstring,
                TokenKind::Semicolon,
                TokenKind::StringLiteral,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_resumes_next_line() {
        let mut lexer = tokenize("include \"abc\nqubit q;", SourceId(0));
        let tokens: Vec<_> = lexer.by_ref().collect();
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].text, "\"abc");
        assert_eq!(tokens[2].kind, TokenKind::Qubit);
        let diags: Vec<_> = lexer.take_diagnostics().into_iter().collect();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, ErrorCode::LexicalError);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut lexer = tokenize("qubit q; /* never closed", SourceId(0));
        let tokens: Vec<_> = lexer.by_ref().collect();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Error));
        assert_eq!(lexer.take_diagnostics().len(), 1);
    }

    #[test]
    fn test_invalid_run_is_one_diagnostic() {
        let mut lexer = tokenize("qubit q; ??? h q;", SourceId(0));
        let tokens: Vec<_> = lexer.by_ref().collect();
        let errors: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Error).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "???");
        assert_eq!(lexer.take_diagnostics().len(), 1);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Semicolon));
    }

    #[test]
    fn test_calibration_body_is_raw() {
        let source = "defcal x $0 { play(d0, gaussian(1, 2)); { nested } } cal { ` }";
        let tokens: Vec<_> = tokenize(source, SourceId(0)).collect();
        assert_eq!(tokens[3].kind, TokenKind::CalibrationBody);
        assert_eq!(tokens[3].text, "{ play(d0, gaussian(1, 2)); { nested } }");
        assert_eq!(tokens[5].kind, TokenKind::CalibrationBody);
        assert_eq!(tokens[5].text, "{ ` }");
    }

    #[test]
    fn test_annotation_and_pragma() {
        let tokens: Vec<_> = tokenize("@bind q[0] \n#pragma foo bar\nctrl @ x q;", SourceId(0)).collect();
        assert_eq!(tokens[0].kind, TokenKind::Annotation);
        assert_eq!(tokens[0].text, "@bind q[0] ");
        assert_eq!(tokens[1].kind, TokenKind::Pragma);
        assert_eq!(tokens[1].text, "#pragma foo bar");
        assert_eq!(tokens[3].kind, TokenKind::At);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("** **= <<= ++ -> #dim"),
            vec![
                TokenKind::StarStar,
                TokenKind::StarStarEq,
                TokenKind::ShlEq,
                TokenKind::PlusPlus,
                TokenKind::Arrow,
                TokenKind::Dim,
            ]
        );
    }

    #[test]
    fn test_tokenize_is_restartable() {
        let source = "qubit[2] q; h q[0];";
        let a: Vec<_> = tokenize(source, SourceId(3)).collect();
        let b: Vec<_> = tokenize(source, SourceId(3)).collect();
        assert_eq!(a, b);
    }
}
