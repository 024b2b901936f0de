use std::fmt;

use smol_str::SmolStr;

/// Token of the signature grammar.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Ident(SmolStr),
    Integer(i64),
    Float(SmolStr),
    Str(SmolStr),

    True,
    False,
    Null,

    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Colon,
    ColonColon,
    Eq,
    Question,

    Eof,
}

/// Look up the literal keywords, case-insensitive.
pub fn lookup_keyword(ident: &str) -> Option<Token> {
    match ident.to_lowercase().as_str() {
        "true" => Some(Token::True),
        "false" => Some(Token::False),
        "null" => Some(Token::Null),
        _ => None,
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "{name}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Null => write!(f, "null"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBracket => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::Comma => write!(f, ","),
            Self::Dot => write!(f, "."),
            Self::Colon => write!(f, ":"),
            Self::ColonColon => write!(f, "::"),
            Self::Eq => write!(f, "="),
            Self::Question => write!(f, "?"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}
