//! sigil-parser: the signature grammar for custom procedures and
//! functions. Hand-written lexer plus chumsky combinators; every error
//! in a definition is collected and reported as one combined
//! diagnostic.

pub mod error;
pub mod lexer;
pub mod signature;
pub mod span;
pub mod token;

pub use error::{combined_diagnostic, SignatureError};
pub use lexer::{LexError, Lexer};
pub use signature::Signatures;
pub use span::{Span, Spanned};
pub use token::Token;
