//! Token kinds and their literal spellings.
//!
//! Punctuation is matched by trying [`PUNCTS`] in order, so every literal must
//! come before any of its own prefixes (`<<=` before `<<` before `<`).

use std::fmt;

use crate::core::{CompileError, Loc};

macro_rules! token_kinds {
    (
        puncts { $($punct:ident => $plit:literal,)* }
        keywords { $($keyword:ident => $klit:literal,)* }
    ) => {
        /// Classification of a token.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum TokenKind {
            Eof,
            ParseError,
            Id,
            Str,
            Char,
            Int,
            Float,
            $($punct,)*
            $($keyword,)*
        }

        /// Punctuation literals, longest spelling of a shared prefix first.
        pub const PUNCTS: &[(&str, TokenKind)] = &[$(($plit, TokenKind::$punct),)*];

        /// Reserved words.
        pub const KEYWORDS: &[(&str, TokenKind)] = &[$(($klit, TokenKind::$keyword),)*];

        impl TokenKind {
            /// Human readable name used in diagnostics.
            pub fn display(self) -> &'static str {
                match self {
                    TokenKind::Eof => "end of file",
                    TokenKind::ParseError => "parsing error",
                    TokenKind::Id => "identifier",
                    TokenKind::Str => "string",
                    TokenKind::Char => "character",
                    TokenKind::Int => "integer literal",
                    TokenKind::Float => "float literal",
                    $(TokenKind::$punct => concat!("`", $plit, "`"),)*
                    $(TokenKind::$keyword => concat!("keyword `", $klit, "`"),)*
                }
            }
        }
    };
}

token_kinds! {
    puncts {
        Question => "?",
        OCurly => "{",
        CCurly => "}",
        OParen => "(",
        CParen => ")",
        OBracket => "[",
        CBracket => "]",
        Semicolon => ";",
        Colon => ":",
        Comma => ",",
        MinusMinus => "--",
        MinusEq => "-=",
        Minus => "-",
        PlusPlus => "++",
        PlusEq => "+=",
        Plus => "+",
        MulEq => "*=",
        Mul => "*",
        ModEq => "%=",
        Mod => "%",
        DivEq => "/=",
        Div => "/",
        OrEq => "|=",
        Or => "|",
        AndEq => "&=",
        And => "&",
        EqEq => "==",
        Eq => "=",
        NotEq => "!=",
        Not => "!",
        ShlEq => "<<=",
        Shl => "<<",
        LessEq => "<=",
        Less => "<",
        ShrEq => ">>=",
        Shr => ">>",
        GreaterEq => ">=",
        Greater => ">",
    }
    keywords {
        Var => "var",
        Extern => "extern",
        Case => "case",
        If => "if",
        Else => "else",
        While => "while",
        Switch => "switch",
        Goto => "goto",
        Return => "return",
        Function => "function",
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// Payload carried by value-bearing tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    /// Identifier text.
    Ident(String),
    /// String literal bytes after escape processing, without terminator.
    Bytes(Vec<u8>),
    /// Integer and character literal value.
    Int(i64),
    /// The lexical error behind a [`TokenKind::ParseError`] token.
    Error(Box<CompileError>),
}

/// A classified token with its payload and the location it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    pub loc: Loc,
}

impl Token {
    pub fn new(kind: TokenKind, value: TokenValue, loc: Loc) -> Self {
        Self { kind, value, loc }
    }

    pub fn ident(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.value {
            TokenValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Take the lexical error out of a parse-error token.
    pub fn into_error(self) -> Option<CompileError> {
        match self.value {
            TokenValue::Error(err) => Some(*err),
            _ => None,
        }
    }

    pub fn int(&self) -> Option<i64> {
        match self.value {
            TokenValue::Int(value) => Some(value),
            _ => None,
        }
    }
}
