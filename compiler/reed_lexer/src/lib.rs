//! Lexical scanner for Reed component templates.
//!
//! A Reed source mixes three sub-languages: HTML markup, `{...}` expression
//! blocks in text position, and `{...}` interpolations inside quoted
//! attribute values. The [`Scanner`] is a context-sensitive state machine
//! that alternates between them while tracking precise source locations in
//! a [`reed_token::File`] and reporting lexical errors to a caller-supplied
//! sink — it never aborts, recovering at well-defined synchronization
//! points instead.
//!
//! # Usage
//!
//! ```
//! use reed_lexer::{Scanner, SourceBuffer};
//! use reed_token::{File, Token};
//!
//! let src = "<div>hi</div>";
//! let buf = SourceBuffer::new(src);
//! let mut file = File::new("hello.reed", buf.len());
//! let mut scanner = Scanner::new(&mut file, &buf, None);
//!
//! let (_, tok, _) = Scanner::scan(&mut scanner);
//! assert_eq!(tok, Token::StartTagOpen);
//! let (_, tok, lit) = Scanner::scan(&mut scanner);
//! assert_eq!((tok, lit), (Token::TagName, "div"));
//! ```
//!
//! Token literals are `&str` slices borrowed from the [`SourceBuffer`],
//! never owned copies; structural tokens carry an empty literal and their
//! fixed spelling is available via [`reed_token::Token::lexeme`].

mod classify;
mod scanner;
mod source_buffer;

pub use classify::{is_deprecated_tag, is_raw_tag, is_void_tag};
pub use scanner::{ErrorHandler, Scanner};
pub use source_buffer::SourceBuffer;

use reed_token::{File, Loc, Token};

/// Convenience function: scan a whole buffer and collect all tokens.
///
/// Returns every `(Loc, Token, literal)` triple before `Eof`. For
/// streaming access, construct a [`Scanner`] directly.
#[tracing::instrument(level = "trace", skip_all, fields(file = %file.name(), bytes = buf.len()))]
pub fn tokenize<'s, 'a>(
    file: &'s mut File,
    buf: &'a SourceBuffer,
    handler: Option<ErrorHandler<'s>>,
) -> Vec<(Loc, Token, &'a str)> {
    let mut scanner = Scanner::new(file, buf, handler);
    let mut tokens = Vec::new();
    loop {
        let (loc, tok, lit) = Scanner::scan(&mut scanner);
        if tok == Token::Eof {
            break;
        }
        tokens.push((loc, tok, lit));
    }
    tokens
}
