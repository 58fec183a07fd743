// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The scanner that produces tokens from source text.

use super::{Span, Token, TokenKind};

/// A scanner that tokenizes script source code.
#[derive(Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
        }
    }

    /// Creates a scanner over `span` of `source`. Token spans stay relative
    /// to the whole source.
    pub fn new_range(source: &'a str, span: Span) -> Self {
        let mut chars = source[..span.end].char_indices().peekable();
        while chars.next_if(|(pos, _)| *pos < span.start).is_some() {}
        Self {
            source,
            chars,
            current_pos: span.start,
        }
    }

    /// Returns the source being scanned.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start = self.current_pos;

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match ch {
            // Single-character tokens
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,
            '^' => TokenKind::Caret,

            // Multi-character tokens
            '.' => self.scan_dot(),
            '+' => self.scan_with_equal_or_double('+', TokenKind::Plus, TokenKind::PlusEqual, TokenKind::PlusPlus),
            '-' => self.scan_with_equal_or_double('-', TokenKind::Minus, TokenKind::MinusEqual, TokenKind::MinusMinus),
            '*' => self.scan_with_equal_or_double('*', TokenKind::Star, TokenKind::StarEqual, TokenKind::StarStar),
            '/' => self.scan_slash(),
            '%' => self.scan_percent(),
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),
            '=' => self.scan_equal(),
            '!' => self.scan_bang(),
            '&' => self.scan_logical('&', TokenKind::Ampersand, TokenKind::AmpersandAmpersand, TokenKind::AmpersandAmpersandEqual),
            '|' => self.scan_logical('|', TokenKind::Pipe, TokenKind::PipePipe, TokenKind::PipePipeEqual),
            '?' => self.scan_question(),

            // String literals
            '"' | '\'' => self.scan_string(ch),

            // Template literals
            '`' => self.scan_template(),

            // Numbers
            '0'..='9' => self.scan_number(ch),

            // Identifiers and keywords
            _ if is_id_start(ch) => self.scan_identifier(ch),

            _ => TokenKind::Invalid,
        };

        Token::new(kind, Span::new(start, self.current_pos))
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, ch)| ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() || ch == '\u{feff}' => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        self.advance();
                        self.advance();
                        while let Some(ch) = self.peek() {
                            if ch == '\n' || ch == '\r' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        let mut prev = ' ';
                        while let Some((_, ch)) = self.advance() {
                            if prev == '*' && ch == '/' {
                                break;
                            }
                            prev = ch;
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
    }

    fn scan_dot(&mut self) -> TokenKind {
        if self.peek() == Some('.') && self.peek_next() == Some('.') {
            self.advance();
            self.advance();
            TokenKind::Ellipsis
        } else if matches!(self.peek(), Some('0'..='9')) {
            self.scan_number('.')
        } else {
            TokenKind::Dot
        }
    }

    /// Scans `x`, `x=` and `xx` (`+ += ++`, `- -= --`, `* *= **`).
    fn scan_with_equal_or_double(
        &mut self,
        ch: char,
        single: TokenKind,
        with_equal: TokenKind,
        double: TokenKind,
    ) -> TokenKind {
        if self.eat('=') {
            with_equal
        } else if self.eat(ch) {
            double
        } else {
            single
        }
    }

    /// Scans `x`, `xx` and `xx=` (`& && &&=`, `| || ||=`).
    fn scan_logical(
        &mut self,
        ch: char,
        single: TokenKind,
        double: TokenKind,
        double_equal: TokenKind,
    ) -> TokenKind {
        if self.eat(ch) {
            if self.eat('=') { double_equal } else { double }
        } else {
            single
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        if self.eat('=') {
            TokenKind::SlashEqual
        } else {
            TokenKind::Slash
        }
    }

    fn scan_percent(&mut self) -> TokenKind {
        if self.eat('=') {
            TokenKind::PercentEqual
        } else {
            TokenKind::Percent
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        if self.eat('=') {
            TokenKind::LessThanEqual
        } else {
            TokenKind::LessThan
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        if self.eat('=') {
            TokenKind::GreaterThanEqual
        } else {
            TokenKind::GreaterThan
        }
    }

    fn scan_equal(&mut self) -> TokenKind {
        match self.peek() {
            Some('=') => {
                self.advance();
                if self.eat('=') {
                    TokenKind::StrictEqual
                } else {
                    TokenKind::EqualEqual
                }
            }
            Some('>') => {
                self.advance();
                TokenKind::Arrow
            }
            _ => TokenKind::Equal,
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.eat('=') {
            if self.eat('=') {
                TokenKind::StrictNotEqual
            } else {
                TokenKind::NotEqual
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_question(&mut self) -> TokenKind {
        match self.peek() {
            Some('?') => {
                self.advance();
                if self.eat('=') {
                    TokenKind::QuestionQuestionEqual
                } else {
                    TokenKind::QuestionQuestion
                }
            }
            // `a?.5:1` is a conditional, not optional chaining
            Some('.') if !matches!(self.peek_next(), Some('0'..='9')) => {
                self.advance();
                TokenKind::QuestionDot
            }
            _ => TokenKind::Question,
        }
    }

    fn scan_escape(&mut self, value: &mut String) {
        let Some((_, escaped)) = self.advance() else {
            return;
        };
        match escaped {
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' => value.push('\0'),
            'x' => {
                let hex: String = (0..2).filter_map(|_| self.advance().map(|(_, c)| c)).collect();
                if let Some(c) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    value.push(c);
                }
            }
            'u' => {
                let hex: String = if self.eat('{') {
                    let mut digits = String::new();
                    while let Some((_, c)) = self.advance() {
                        if c == '}' {
                            break;
                        }
                        digits.push(c);
                    }
                    digits
                } else {
                    (0..4).filter_map(|_| self.advance().map(|(_, c)| c)).collect()
                };
                if let Some(c) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    value.push(c);
                }
            }
            // Line continuation
            '\n' => {}
            '\r' => {
                self.eat('\n');
            }
            other => value.push(other),
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                None | Some((_, '\n')) => return TokenKind::Invalid,
                Some((_, ch)) if ch == quote => break,
                Some((_, '\\')) => self.scan_escape(&mut value),
                Some((_, ch)) => value.push(ch),
            }
        }

        TokenKind::String(value)
    }

    fn scan_template(&mut self) -> TokenKind {
        let mut quasis = Vec::new();
        let mut substitutions = Vec::new();
        let mut current = String::new();

        loop {
            match self.advance() {
                None => return TokenKind::Invalid,
                Some((_, '`')) => break,
                Some((_, '$')) if self.peek() == Some('{') => {
                    self.advance();
                    quasis.push(std::mem::take(&mut current));
                    match self.scan_substitution() {
                        Some(span) => substitutions.push(span),
                        None => return TokenKind::Invalid,
                    }
                }
                Some((_, '\\')) => self.scan_escape(&mut current),
                Some((_, ch)) => current.push(ch),
            }
        }

        quasis.push(current);
        TokenKind::Template {
            quasis,
            substitutions,
        }
    }

    /// Consumes tokens up to the `}` closing a `${` substitution and returns
    /// the span of the expression text in between.
    fn scan_substitution(&mut self) -> Option<Span> {
        let start = self.current_pos;
        let mut depth = 0usize;

        loop {
            let token = self.next_token();
            match token.kind {
                TokenKind::Eof | TokenKind::Invalid => return None,
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace if depth == 0 => {
                    return Some(Span::new(start, token.span.start));
                }
                TokenKind::RightBrace => depth -= 1,
                _ => {}
            }
        }
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let mut value = String::from(first);

        if first == '0' {
            match self.peek() {
                Some('x' | 'X') => return self.scan_radix_number(16),
                Some('o' | 'O') => return self.scan_radix_number(8),
                Some('b' | 'B') => return self.scan_radix_number(2),
                _ => {}
            }
        }

        self.scan_digits(&mut value);

        if first != '.' && self.peek() == Some('.') {
            value.push('.');
            self.advance();
            self.scan_digits(&mut value);
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            value.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                value.push(sign);
                self.advance();
            }
            self.scan_digits(&mut value);
        }

        match value.parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Invalid,
        }
    }

    fn scan_digits(&mut self, value: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                value.push(ch);
            } else if ch != '_' {
                break;
            }
            self.advance();
        }
    }

    fn scan_radix_number(&mut self, radix: u32) -> TokenKind {
        self.advance(); // consume the radix marker
        let mut value = String::new();

        while let Some(ch) = self.peek() {
            if ch.is_digit(radix) {
                value.push(ch);
            } else if ch != '_' {
                break;
            }
            self.advance();
        }

        match u64::from_str_radix(&value, radix) {
            Ok(n) => TokenKind::Number(n as f64),
            Err(_) => TokenKind::Invalid,
        }
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::from(first);

        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match name.as_str() {
            "async" => TokenKind::Async,
            "await" => TokenKind::Await,
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "catch" => TokenKind::Catch,
            "class" => TokenKind::Class,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "default" => TokenKind::Default,
            "delete" => TokenKind::Delete,
            "do" => TokenKind::Do,
            "else" => TokenKind::Else,
            "export" => TokenKind::Export,
            "extends" => TokenKind::Extends,
            "false" => TokenKind::False,
            "finally" => TokenKind::Finally,
            "for" => TokenKind::For,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "in" => TokenKind::In,
            "instanceof" => TokenKind::Instanceof,
            "let" => TokenKind::Let,
            "new" => TokenKind::New,
            "null" => TokenKind::Null,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "switch" => TokenKind::Switch,
            "this" => TokenKind::This,
            "throw" => TokenKind::Throw,
            "true" => TokenKind::True,
            "try" => TokenKind::Try,
            "typeof" => TokenKind::Typeof,
            "var" => TokenKind::Var,
            "void" => TokenKind::Void,
            "while" => TokenKind::While,
            "yield" => TokenKind::Yield,
            _ => TokenKind::Identifier(name),
        }
    }
}

/// Checks if a character can start an identifier.
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Checks if a character can continue an identifier.
fn is_id_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_continue(ch)
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_tokens() {
        assert_eq!(
            kinds("{ } ( ) => ..."),
            vec![
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Arrow,
                TokenKind::Ellipsis,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let mut scanner = Scanner::new("42 3.14 0xff 0b1010 1_000 .5");
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 42.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 3.14));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 255.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 10.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 1000.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 0.5));
    }

    #[test]
    fn test_strings_and_escapes() {
        let mut scanner = Scanner::new(r#""hello\n" 'it\'s' 'A\x42'"#);
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "hello\n"));
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "it's"));
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "AB"));
    }

    #[test]
    fn test_unterminated_string_is_invalid() {
        assert_eq!(kinds("'abc"), vec![TokenKind::Invalid]);
    }

    #[test]
    fn test_template_with_substitutions() {
        let source = "`a${x + 1}b${ {k: 1}.k }c`";
        let token = Scanner::new(source).next_token();
        let TokenKind::Template {
            quasis,
            substitutions,
        } = token.kind
        else {
            panic!("expected template");
        };
        assert_eq!(quasis, vec!["a", "b", "c"]);
        assert_eq!(substitutions[0].slice(source), "x + 1");
        assert_eq!(substitutions[1].slice(source).trim(), "{k: 1}.k");
        assert_eq!(token.span, Span::new(0, source.len()));
    }

    #[test]
    fn test_keywords_and_contextual_words() {
        assert_eq!(
            kinds("import x from 'y'"),
            vec![
                TokenKind::Import,
                TokenKind::Identifier("x".into()),
                TokenKind::Identifier("from".into()),
                TokenKind::String("y".into()),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("1 // export default\n2 /* import x from 'y'; */ 3"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Number(2.0),
                TokenKind::Number(3.0),
            ]
        );
    }

    #[test]
    fn test_optional_chaining_vs_conditional() {
        assert_eq!(
            kinds("a?.b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::QuestionDot,
                TokenKind::Identifier("b".into()),
            ]
        );
        assert_eq!(
            kinds("a?.5:1"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Question,
                TokenKind::Number(0.5),
                TokenKind::Colon,
                TokenKind::Number(1.0),
            ]
        );
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let tokens: Vec<Token> = Scanner::new("let é = 'ü';").collect();
        assert_eq!(tokens[1].span, Span::new(4, 6));
        assert_eq!(tokens[3].span.slice("let é = 'ü';"), "'ü'");
    }
}
