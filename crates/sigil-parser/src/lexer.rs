use smol_str::SmolStr;

use crate::span::{Span, Spanned};
use crate::token::{lookup_keyword, Token};

/// Lexical analysis error.
#[derive(Debug, Clone)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

/// Hand-written lexer for signature text.
///
/// Separating lex from parse gives precise byte positions for every
/// error span; all errors are collected rather than failing fast.
pub struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
    tokens: Vec<Spanned<Token>>,
    errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn lex(mut self) -> (Vec<Spanned<Token>>, Vec<LexError>) {
        while !self.is_at_end() {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }

            let start = self.pos;
            let ch = self.advance();

            match ch {
                b'(' => self.push(Token::LeftParen, start),
                b')' => self.push(Token::RightParen, start),
                b'[' => self.push(Token::LeftBracket, start),
                b']' => self.push(Token::RightBracket, start),
                b'{' => self.push(Token::LeftBrace, start),
                b'}' => self.push(Token::RightBrace, start),
                b',' => self.push(Token::Comma, start),
                b'.' => self.push(Token::Dot, start),
                b'=' => self.push(Token::Eq, start),
                b'?' => self.push(Token::Question, start),

                b':' => {
                    if self.peek() == Some(b':') {
                        self.advance();
                        self.push(Token::ColonColon, start);
                    } else {
                        self.push(Token::Colon, start);
                    }
                }

                b'-' => {
                    // Minus only occurs as the sign of a default value.
                    if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        self.lex_number(start);
                    } else {
                        self.errors.push(LexError {
                            span: start..self.pos,
                            message: "unexpected character '-'".to_string(),
                        });
                    }
                }

                b'\'' | b'"' => self.lex_string(ch, start),

                b'`' => self.lex_escaped_ident(start),

                b'0'..=b'9' => self.lex_number(start),

                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_ident(start),

                _ => {
                    self.errors.push(LexError {
                        span: start..self.pos,
                        message: format!("unexpected character '{}'", ch as char),
                    });
                }
            }
        }

        self.tokens.push((Token::Eof, self.pos..self.pos));
        (self.tokens, self.errors)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        ch
    }

    fn push(&mut self, token: Token, start: usize) {
        self.tokens.push((token, start..self.pos));
    }

    fn skip_whitespace(&mut self) {
        while self
            .peek()
            .is_some_and(|c| matches!(c, b' ' | b'\t' | b'\n' | b'\r'))
        {
            self.pos += 1;
        }
    }

    fn lex_string(&mut self, quote: u8, start: usize) {
        // Accumulate raw bytes; multi-byte sequences pass through whole
        // and are decoded once at the end.
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                None => {
                    self.errors.push(LexError {
                        span: start..self.pos,
                        message: "unterminated string literal".to_string(),
                    });
                    return;
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    match self.peek() {
                        Some(b'n') => bytes.push(b'\n'),
                        Some(b't') => bytes.push(b'\t'),
                        Some(b'r') => bytes.push(b'\r'),
                        Some(c) => bytes.push(c),
                        None => continue,
                    }
                    self.advance();
                }
                Some(c) => {
                    bytes.push(c);
                    self.advance();
                }
            }
        }
        let value = std::str::from_utf8(&bytes).unwrap_or_default();
        self.push(Token::Str(SmolStr::new(value)), start);
    }

    fn lex_escaped_ident(&mut self, start: usize) {
        let content_start = self.pos;
        while self.peek().is_some_and(|c| c != b'`') {
            self.advance();
        }
        if self.is_at_end() {
            self.errors.push(LexError {
                span: start..self.pos,
                message: "unterminated escaped identifier".to_string(),
            });
            return;
        }
        let name = std::str::from_utf8(&self.source[content_start..self.pos])
            .unwrap_or_default()
            .to_string();
        self.advance();
        self.push(Token::Ident(SmolStr::new(&name)), start);
    }

    fn lex_number(&mut self, start: usize) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let mut is_float = false;
        if self.peek() == Some(b'.')
            && self
                .source
                .get(self.pos + 1)
                .is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if self.peek().is_some_and(|c| c == b'e' || c == b'E') {
            let mut lookahead = self.pos + 1;
            if self
                .source
                .get(lookahead)
                .is_some_and(|c| *c == b'+' || *c == b'-')
            {
                lookahead += 1;
            }
            if self.source.get(lookahead).is_some_and(u8::is_ascii_digit) {
                is_float = true;
                self.pos = lookahead;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or_default();
        if is_float {
            self.push(Token::Float(SmolStr::new(text)), start);
        } else {
            match text.parse::<i64>() {
                Ok(value) => self.push(Token::Integer(value), start),
                Err(_) => {
                    self.errors.push(LexError {
                        span: start..self.pos,
                        message: format!("integer literal out of range: {text}"),
                    });
                }
            }
        }
    }

    fn lex_ident(&mut self, start: usize) {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.advance();
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or_default();
        match lookup_keyword(text) {
            Some(token) => self.push(token, start),
            None => self.push(Token::Ident(SmolStr::new(text)), start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_ok(src: &str) -> Vec<Token> {
        let (tokens, errors) = Lexer::new(src).lex();
        assert!(errors.is_empty(), "lex errors: {errors:?}");
        tokens.into_iter().map(|(tok, _)| tok).collect()
    }

    #[test]
    fn signature_tokens() {
        let tokens = lex_ok("answer(xx :: INTEGER) :: (value :: INTEGER)");
        assert_eq!(tokens[0], Token::Ident(SmolStr::new("answer")));
        assert_eq!(tokens[1], Token::LeftParen);
        assert_eq!(tokens[3], Token::ColonColon);
        assert_eq!(*tokens.last().unwrap(), Token::Eof);
    }

    #[test]
    fn single_and_double_colon() {
        let tokens = lex_ok("xx:STRING :: yy");
        assert_eq!(tokens[1], Token::Colon);
        assert_eq!(tokens[3], Token::ColonColon);
    }

    #[test]
    fn default_literals() {
        let tokens = lex_ok("= [1.1, -2, 'text', true, null]");
        assert!(tokens.contains(&Token::Float(SmolStr::new("1.1"))));
        assert!(tokens.contains(&Token::Integer(-2)));
        assert!(tokens.contains(&Token::Str(SmolStr::new("text"))));
        assert!(tokens.contains(&Token::True));
        assert!(tokens.contains(&Token::Null));
    }

    #[test]
    fn non_ascii_string_survives() {
        let tokens = lex_ok("= 'café'");
        assert!(tokens.contains(&Token::Str(SmolStr::new("café"))));

        let tokens = lex_ok("= \"naïve \\n über\"");
        assert!(tokens.contains(&Token::Str(SmolStr::new("naïve \n über"))));
    }

    #[test]
    fn escaped_identifier() {
        let tokens = lex_ok("`some name`");
        assert_eq!(tokens[0], Token::Ident(SmolStr::new("some name")));
    }

    #[test]
    fn dotted_name() {
        let tokens = lex_ok("foo.bar");
        assert_eq!(tokens[1], Token::Dot);
    }

    #[test]
    fn unexpected_character_collected() {
        let (tokens, errors) = Lexer::new("answer(@) :: (xx :: ANY)").lex();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains('@'));
        // Lexing continues past the bad character.
        assert!(tokens.len() > 4);
    }

    #[test]
    fn unterminated_string() {
        let (_, errors) = Lexer::new("= 'oops").lex();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unterminated"));
    }
}
