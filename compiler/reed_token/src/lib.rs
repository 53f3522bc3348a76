//! Token taxonomy and source positions for the Reed template language.
//!
//! This crate is the shared vocabulary between the scanner and the parser:
//! the closed set of lexical [`Token`] kinds, and the [`File`] handle that
//! translates byte offsets into human-readable line/column [`Position`]s.
//!
//! It has **zero dependencies** so that external tools (formatter, LSP,
//! syntax highlighter) can consume token streams without pulling in the
//! rest of the compiler.

mod file;
mod token;

pub use file::{File, Loc, Position};
pub use token::{is_identifier, is_keyword_name, Token};
