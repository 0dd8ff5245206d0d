// This module implements the lexer for Bulan source text. It walks an immutable byte buffer
// with a small copyable cursor (ParsePoint) so the parser can save and restore positions for
// one-token lookahead. Whitespace plus `//` and `/* */` comments are skipped before each
// token. Punctuation is recognised by trying the ordered PUNCTS table, identifiers are
// reclassified through the KEYWORDS table, integers are decimal or `0x` hexadecimal, and
// string/character literals support the escapes \0 \n \t \\ and an escaped delimiter.
// Lexical errors never abort the lexer itself: they are returned as a ParseError token
// carrying the CompileError, which the parser turns into its own failure.

//! Lexical analysis.

use std::rc::Rc;

use super::token::{Token, TokenKind, TokenValue, KEYWORDS, PUNCTS};
use crate::core::{CompileError, Loc};

/// Saved lexer cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsePoint {
    current: usize,
    line_start: usize,
    line: usize,
}

/// Converts an input buffer into a stream of tokens.
pub struct Lexer<'src> {
    path: Rc<str>,
    input: &'src [u8],
    point: ParsePoint,
    storage: Vec<u8>,
}

impl<'src> Lexer<'src> {
    /// A NUL byte ends the input; anything after it is never lexed.
    pub fn new(path: impl Into<Rc<str>>, input: &'src [u8]) -> Self {
        let end = input.iter().position(|&ch| ch == 0).unwrap_or(input.len());
        Self {
            path: path.into(),
            input: &input[..end],
            point: ParsePoint {
                current: 0,
                line_start: 0,
                line: 1,
            },
            storage: Vec::new(),
        }
    }

    pub fn save(&self) -> ParsePoint {
        self.point
    }

    pub fn restore(&mut self, point: ParsePoint) {
        self.point = point;
    }

    /// Location of the cursor.
    pub fn loc(&self) -> Loc {
        Loc::new(
            self.path.clone(),
            self.point.line,
            self.point.current - self.point.line_start + 1,
        )
    }

    fn is_eof(&self) -> bool {
        self.point.current >= self.input.len()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.point.current).copied()
    }

    fn skip_byte(&mut self) {
        debug_assert!(!self.is_eof());
        let ch = self.input[self.point.current];
        self.point.current += 1;
        if ch == b'\n' {
            self.point.line_start = self.point.current;
            self.point.line += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_byte() {
            if is_space(ch) {
                self.skip_byte();
            } else {
                break;
            }
        }
    }

    fn skip_prefix(&mut self, prefix: &[u8]) -> bool {
        if !self.input[self.point.current..].starts_with(prefix) {
            return false;
        }
        for _ in 0..prefix.len() {
            self.skip_byte();
        }
        true
    }

    fn skip_until(&mut self, prefix: &[u8]) {
        while !self.is_eof() && !self.skip_prefix(prefix) {
            self.skip_byte();
        }
    }

    fn error(&self, loc: Loc, message: impl Into<String>, literal_start: Option<Loc>) -> Token {
        let err = CompileError::Lex {
            loc: loc.clone(),
            message: message.into(),
            literal_start,
        };
        Token::new(TokenKind::ParseError, TokenValue::Error(Box::new(err)), loc)
    }

    /// Collect literal bytes up to (not including) `delim`, processing escapes.
    fn parse_literal_into_storage(&mut self, delim: u8, start: &Loc) -> Result<(), Token> {
        self.storage.clear();
        while let Some(ch) = self.peek_byte() {
            if ch == b'\\' {
                self.skip_byte();
                let Some(esc) = self.peek_byte() else {
                    return Err(self.error(
                        self.loc(),
                        "unfinished escape sequence",
                        Some(start.clone()),
                    ));
                };
                let byte = match esc {
                    b'0' => b'\0',
                    b'n' => b'\n',
                    b't' => b'\t',
                    b'\\' => b'\\',
                    _ if esc == delim => delim,
                    _ => {
                        return Err(self.error(
                            self.loc(),
                            format!("unknown escape sequence `\\{}`", esc.escape_ascii()),
                            Some(start.clone()),
                        ));
                    }
                };
                self.storage.push(byte);
                self.skip_byte();
            } else if ch == delim {
                break;
            } else {
                self.storage.push(ch);
                self.skip_byte();
            }
        }
        Ok(())
    }

    /// Lex the next token. Once the input is exhausted every call returns
    /// [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            if self.skip_prefix(b"//") {
                self.skip_until(b"\n");
                continue;
            }
            if self.skip_prefix(b"/*") {
                self.skip_until(b"*/");
                continue;
            }
            break;
        }

        let loc = self.loc();
        let Some(ch) = self.peek_byte() else {
            return Token::new(TokenKind::Eof, TokenValue::None, loc);
        };

        for &(literal, kind) in PUNCTS {
            if self.skip_prefix(literal.as_bytes()) {
                return Token::new(kind, TokenValue::None, loc);
            }
        }

        if is_identifier_start(ch) {
            let start = self.point.current;
            while self.peek_byte().is_some_and(is_identifier) {
                self.skip_byte();
            }
            // Identifier bytes are ASCII only.
            let name = String::from_utf8_lossy(&self.input[start..self.point.current]).into_owned();
            if let Some(&(_, kind)) = KEYWORDS.iter().find(|(literal, _)| *literal == name) {
                return Token::new(kind, TokenValue::None, loc);
            }
            return Token::new(TokenKind::Id, TokenValue::Ident(name), loc);
        }

        // No overflow checking: literals wrap around.
        if self.skip_prefix(b"0x") {
            let mut value: i64 = 0;
            while let Some(digit) = self.peek_byte().and_then(|c| (c as char).to_digit(16)) {
                value = value.wrapping_mul(16).wrapping_add(digit as i64);
                self.skip_byte();
            }
            return Token::new(TokenKind::Int, TokenValue::Int(value), loc);
        }

        if ch.is_ascii_digit() {
            let mut value: i64 = 0;
            while let Some(digit) = self.peek_byte().filter(u8::is_ascii_digit) {
                value = value.wrapping_mul(10).wrapping_add((digit - b'0') as i64);
                self.skip_byte();
            }
            return Token::new(TokenKind::Int, TokenValue::Int(value), loc);
        }

        if ch == b'"' {
            self.skip_byte();
            if let Err(token) = self.parse_literal_into_storage(b'"', &loc) {
                return token;
            }
            if self.is_eof() {
                return self.error(self.loc(), "unfinished string literal", Some(loc));
            }
            self.skip_byte();
            return Token::new(TokenKind::Str, TokenValue::Bytes(self.storage.clone()), loc);
        }

        if ch == b'\'' {
            self.skip_byte();
            if let Err(token) = self.parse_literal_into_storage(b'\'', &loc) {
                return token;
            }
            if self.is_eof() {
                return self.error(self.loc(), "unfinished character literal", Some(loc));
            }
            self.skip_byte();
            match self.storage.len() {
                0 => return self.error(loc, "empty character literal", None),
                1 | 2 => {}
                _ => {
                    return self.error(
                        loc,
                        "character literal contains more than two characters",
                        None,
                    )
                }
            }
            let value = self
                .storage
                .iter()
                .fold(0i64, |acc, &byte| (acc << 8) | byte as i64);
            return Token::new(TokenKind::Char, TokenValue::Int(value), loc);
        }

        self.error(
            loc.clone(),
            format!("invalid character '{}' for any token", ch.escape_ascii()),
            None,
        )
    }
}

fn is_space(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn is_identifier_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_identifier(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new("test.bn", src.as_bytes());
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = matches!(token.kind, TokenKind::Eof | TokenKind::ParseError);
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex_all(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_every_punct_and_keyword_lexes_to_one_token() {
        for &(literal, kind) in PUNCTS.iter().chain(KEYWORDS) {
            assert_eq!(kinds(literal), [kind, TokenKind::Eof], "literal {literal:?}");
        }
    }

    #[test]
    fn test_longest_match() {
        assert_eq!(kinds("<<="), [TokenKind::ShlEq, TokenKind::Eof]);
        assert_eq!(
            kinds("< <= <<"),
            [TokenKind::Less, TokenKind::LessEq, TokenKind::Shl, TokenKind::Eof]
        );
        assert_eq!(kinds("a==b"), [TokenKind::Id, TokenKind::EqEq, TokenKind::Id, TokenKind::Eof]);
    }

    #[test]
    fn test_identifiers_and_keywords() {
        let tokens = lex_all("function _main2 whilex");
        assert_eq!(tokens[0].kind, TokenKind::Function);
        assert_eq!(tokens[1].ident(), Some("_main2"));
        assert_eq!(tokens[2].ident(), Some("whilex"));
    }

    #[test]
    fn test_integer_literals() {
        let tokens = lex_all("42 0x1F 0xff 0");
        let values: Vec<_> = tokens.iter().filter_map(Token::int).collect();
        assert_eq!(values, [42, 31, 255, 0]);
    }

    #[test]
    fn test_integer_overflow_wraps() {
        let tokens = lex_all("0x10000000000000000");
        assert_eq!(tokens[0].int(), Some(0));
    }

    #[test]
    fn test_string_escapes() {
        let tokens = lex_all(r#""a\nb" "q\"\t\\\0""#);
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].bytes(), Some(&b"a\nb"[..]));
        assert_eq!(tokens[1].bytes(), Some(&b"q\"\t\\\0"[..]));
    }

    #[test]
    fn test_char_literals() {
        let tokens = lex_all(r"'\0' 'ab' 'x' '\''");
        assert!(tokens[..4].iter().all(|t| t.kind == TokenKind::Char));
        assert_eq!(tokens[0].int(), Some(0));
        assert_eq!(tokens[1].int(), Some(((b'a' as i64) << 8) | b'b' as i64));
        assert_eq!(tokens[2].int(), Some(b'x' as i64));
        assert_eq!(tokens[3].int(), Some(b'\'' as i64));
    }

    #[test]
    fn test_char_literal_length_errors() {
        assert_eq!(kinds("''"), [TokenKind::ParseError]);
        assert_eq!(kinds("'abc'"), [TokenKind::ParseError]);
    }

    #[test]
    fn test_comments_are_skipped() {
        let src = "// line comment\nextern /* block\n comment */ foo;";
        assert_eq!(
            kinds(src),
            [TokenKind::Extern, TokenKind::Id, TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    #[test]
    fn test_locations() {
        let tokens = lex_all("function\n  main");
        assert_eq!((tokens[0].loc.line, tokens[0].loc.col), (1, 1));
        assert_eq!((tokens[1].loc.line, tokens[1].loc.col), (2, 3));
        assert_eq!(tokens[1].loc.to_string(), "test.bn:2:3");
    }

    #[test]
    fn test_unterminated_string_reports_both_locations() {
        let token = lex_all("x = \"abc").pop().unwrap();
        assert_eq!(token.kind, TokenKind::ParseError);
        let err = token.into_error().unwrap();
        assert_eq!(err.to_string(), "test.bn:1:9: LEXER ERROR: unfinished string literal");
        assert_eq!(err.notes(), ["test.bn:1:5: LEXER INFO: literal starts here"]);
    }

    #[test]
    fn test_invalid_escape() {
        let token = lex_all(r#""a\qb""#).pop().unwrap();
        let err = token.into_error().unwrap();
        assert!(err.to_string().contains("unknown escape sequence `\\q`"));
        assert_eq!(err.notes().len(), 1);
    }

    #[test]
    fn test_invalid_character() {
        let token = lex_all("a @").pop().unwrap();
        assert_eq!(token.kind, TokenKind::ParseError);
        assert_eq!((token.loc.line, token.loc.col), (1, 3));
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut lexer = Lexer::new("test.bn", b"  ");
        for _ in 0..3 {
            assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        }
    }

    #[test]
    fn test_nul_byte_ends_input() {
        assert_eq!(
            kinds("f ( ) \0garbage @"),
            [TokenKind::Id, TokenKind::OParen, TokenKind::CParen, TokenKind::Eof]
        );
        let err = lex_all("\"ab\0cd\"").pop().unwrap().into_error().unwrap();
        assert!(err.to_string().contains("unfinished string literal"), "{err}");
    }

    #[test]
    fn test_save_and_restore() {
        let mut lexer = Lexer::new("test.bn", b"a + b");
        lexer.next_token();
        let saved = lexer.save();
        assert_eq!(lexer.next_token().kind, TokenKind::Plus);
        lexer.restore(saved);
        assert_eq!(lexer.next_token().kind, TokenKind::Plus);
    }
}
