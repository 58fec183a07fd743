// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Token definitions for the script lexer.

/// A span in the source code, representing a range of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the text covered by this span.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the source code
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The different kinds of tokens in the script subset.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal
    Number(f64),
    /// String literal (escapes already decoded)
    String(String),
    /// Template literal.
    ///
    /// `quasis` always has one more element than `substitutions`; each
    /// substitution is the span of the raw expression text between `${`
    /// and the matching `}`.
    Template {
        quasis: Vec<String>,
        substitutions: Vec<Span>,
    },
    /// Boolean true
    True,
    /// Boolean false
    False,
    /// null
    Null,

    /// Identifier (includes contextual words such as `from`, `as`, `of`)
    Identifier(String),

    // Keywords
    Async,
    Await,
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Default,
    Delete,
    Do,
    Else,
    Export,
    Extends,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    Let,
    New,
    Return,
    Super,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    Yield,

    // Punctuation
    /// {
    LeftBrace,
    /// }
    RightBrace,
    /// (
    LeftParen,
    /// )
    RightParen,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
    /// .
    Dot,
    /// ...
    Ellipsis,
    /// ;
    Semicolon,
    /// ,
    Comma,
    /// <
    LessThan,
    /// >
    GreaterThan,
    /// <=
    LessThanEqual,
    /// >=
    GreaterThanEqual,
    /// ==
    EqualEqual,
    /// !=
    NotEqual,
    /// ===
    StrictEqual,
    /// !==
    StrictNotEqual,
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// **
    StarStar,
    /// ++
    PlusPlus,
    /// --
    MinusMinus,
    /// &
    Ampersand,
    /// |
    Pipe,
    /// ^
    Caret,
    /// !
    Bang,
    /// ~
    Tilde,
    /// &&
    AmpersandAmpersand,
    /// ||
    PipePipe,
    /// ??
    QuestionQuestion,
    /// ?
    Question,
    /// ?.
    QuestionDot,
    /// :
    Colon,
    /// =
    Equal,
    /// +=
    PlusEqual,
    /// -=
    MinusEqual,
    /// *=
    StarEqual,
    /// /=
    SlashEqual,
    /// %=
    PercentEqual,
    /// &&=
    AmpersandAmpersandEqual,
    /// ||=
    PipePipeEqual,
    /// ??=
    QuestionQuestionEqual,
    /// =>
    Arrow,

    // Special
    /// End of file
    Eof,
    /// Invalid token (unterminated literal, unsupported character)
    Invalid,
}

impl TokenKind {
    /// Returns the source spelling of a keyword or literal keyword.
    ///
    /// Keywords are valid property names (`obj.default`, `{ new: 1 }`), so the
    /// parser uses this to turn them back into names.
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Async => "async",
            TokenKind::Await => "await",
            TokenKind::Break => "break",
            TokenKind::Case => "case",
            TokenKind::Catch => "catch",
            TokenKind::Class => "class",
            TokenKind::Const => "const",
            TokenKind::Continue => "continue",
            TokenKind::Default => "default",
            TokenKind::Delete => "delete",
            TokenKind::Do => "do",
            TokenKind::Else => "else",
            TokenKind::Export => "export",
            TokenKind::Extends => "extends",
            TokenKind::Finally => "finally",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::In => "in",
            TokenKind::Instanceof => "instanceof",
            TokenKind::Let => "let",
            TokenKind::New => "new",
            TokenKind::Return => "return",
            TokenKind::Super => "super",
            TokenKind::Switch => "switch",
            TokenKind::This => "this",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Typeof => "typeof",
            TokenKind::Var => "var",
            TokenKind::Void => "void",
            TokenKind::While => "while",
            TokenKind::Yield => "yield",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            _ => return None,
        };
        Some(text)
    }

    /// Returns true if this token is a keyword.
    pub fn is_keyword(&self) -> bool {
        !matches!(self, TokenKind::True | TokenKind::False | TokenKind::Null)
            && self.keyword_text().is_some()
    }

    /// Returns true if this token is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::Template { .. }
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    /// Returns true if this is the identifier `name` (contextual keywords).
    pub fn is_word(&self, name: &str) -> bool {
        matches!(self, TokenKind::Identifier(s) if s == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len_and_slice() {
        let span = Span::new(4, 9);
        assert_eq!(span.len(), 5);
        assert_eq!(span.slice("let value = 1;"), "value");
        assert!(Span::new(3, 3).is_empty());
    }

    #[test]
    fn test_keyword_text_round_trips_for_property_names() {
        assert_eq!(TokenKind::Default.keyword_text(), Some("default"));
        assert_eq!(TokenKind::New.keyword_text(), Some("new"));
        assert_eq!(TokenKind::Null.keyword_text(), Some("null"));
        assert_eq!(TokenKind::Plus.keyword_text(), None);
    }

    #[test]
    fn test_is_keyword() {
        assert!(TokenKind::Import.is_keyword());
        assert!(TokenKind::Export.is_keyword());
        assert!(!TokenKind::True.is_keyword());
        assert!(!TokenKind::Identifier("from".into()).is_keyword());
    }

    #[test]
    fn test_is_literal() {
        assert!(TokenKind::Number(1.0).is_literal());
        assert!(TokenKind::String("x".into()).is_literal());
        assert!(
            TokenKind::Template {
                quasis: vec!["a".into()],
                substitutions: vec![]
            }
            .is_literal()
        );
        assert!(!TokenKind::Comma.is_literal());
    }

    #[test]
    fn test_is_word() {
        assert!(TokenKind::Identifier("from".into()).is_word("from"));
        assert!(!TokenKind::Identifier("from".into()).is_word("as"));
        assert!(!TokenKind::Import.is_word("import"));
    }
}
