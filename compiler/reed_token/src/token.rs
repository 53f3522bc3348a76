//! The set of lexical tokens of the Reed template language.
//!
//! # Discriminant Layout
//!
//! Variants are organized into semantic ranges with gaps for future
//! expansion, so the classifier predicates compile to range checks:
//!
//! | Range | Category        |
//! |-------|-----------------|
//! | 0-6   | Specials        |
//! | 16-24 | Markup structure|
//! | 32-39 | Keywords        |
//! | 48-68 | Operators       |
//! | 80-86 | Literals        |

use std::fmt;

/// Lexical token kind produced by the scanner.
///
/// # Representation
///
/// `#[repr(u8)]` keeps each tag a single byte, enabling compact token
/// streams and cheap tag-based dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Token {
    // === Specials (0-6) ===
    /// Syntax error; the literal carries the offending span.
    Illegal = 0,
    /// End of file.
    Eof = 1,
    /// `<!--x-->`
    Comment = 2,
    /// `<!DOCTYPE x>` — recognized but rejected by the language.
    Doctype = 3,
    /// `<![CDATA[x]]>` — recognized but rejected by the language.
    CData = 4,
    /// Markup text or raw-text element content.
    Text = 5,
    /// Reserved; never emitted by the scanner.
    Space = 6,

    // === Markup structure (16-24) ===
    /// `<`
    StartTagOpen = 16,
    /// `</`
    EndTagOpen = 17,
    /// `>`
    TagClose = 18,
    /// `/>`
    TagSelfClose = 19,
    /// `div`
    TagName = 20,
    /// `class`
    AttrName = 21,
    /// `=`
    AttrValSep = 22,
    /// `'` or `"`
    AttrValDelim = 23,
    /// Text fragment of an attribute value.
    AttrValText = 24,

    // === Keywords (32-39) ===
    /// `if`
    If = 32,
    /// `else`
    Else = 33,
    /// `for`
    For = 34,
    /// `in`
    In = 35,
    /// `true`
    True = 36,
    /// `false`
    False = 37,
    /// `defer` — reserved, not yet part of the grammar.
    Defer = 38,
    /// `context` — reserved, not yet part of the grammar.
    Context = 39,

    // === Operators (48-68) ===
    /// `<` inside a code block.
    ///
    /// The language prefers `42 > var1` over `var1 < 42` in conditions to
    /// avoid colliding with start-tag detection in editors, but `<` is
    /// still scanned as an operator.
    Lt = 48,
    /// `<=`
    Le = 49,
    /// `>`
    Gt = 50,
    /// `>=`
    Ge = 51,
    /// `==`
    Eq = 52,
    /// `!=`
    Ne = 53,
    /// `!`
    Not = 54,
    /// `.`
    Dot = 55,
    /// `..`
    DotDot = 56,
    /// `&&`
    And = 57,
    /// `||`
    Or = 58,
    /// `(`
    LParen = 59,
    /// `)`
    RParen = 60,
    /// `[`
    LBracket = 61,
    /// `]`
    RBracket = 62,
    /// `,`
    Comma = 63,
    /// `{`
    LBrace = 64,
    /// `}`
    RBrace = 65,
    /// `/`
    Slash = 66,
    /// `-`
    Sub = 67,
    /// `+` — reserved; never emitted by the scanner.
    Add = 68,

    // === Literals (80-86) ===
    /// Scoped variable name or component property name.
    Ident = 80,
    /// `123`, `0x7F`, `0o17`, `0b101`
    Int = 81,
    /// `123.45`, `1e9`, `0x1.8p3`
    Float = 82,
    /// `"abc"`
    String = 83,
    /// `'c'`
    Char = 84,
    /// Format specifier body: `%YY-MM-DD` or `%.2f`.
    Fmt = 85,
    /// Conditional-text body: `:dark` in `{cond:dark}`.
    CondText = 86,
}

/// Size assertion: `Token` must stay a single byte.
const _: () = assert!(std::mem::size_of::<Token>() == 1);

impl Token {
    /// Returns the fixed lexeme for this token, if it has one.
    ///
    /// Markup structure and operators have fixed spellings; text, names,
    /// and literals return `None` (their text varies).
    #[must_use]
    pub fn lexeme(self) -> Option<&'static str> {
        match self {
            Self::StartTagOpen => Some("<"),
            Self::EndTagOpen => Some("</"),
            Self::TagClose => Some(">"),
            Self::TagSelfClose => Some("/>"),
            Self::AttrValSep => Some("="),
            Self::If => Some("if"),
            Self::Else => Some("else"),
            Self::For => Some("for"),
            Self::In => Some("in"),
            Self::True => Some("true"),
            Self::False => Some("false"),
            Self::Defer => Some("defer"),
            Self::Context => Some("context"),
            Self::Lt => Some("<"),
            Self::Le => Some("<="),
            Self::Gt => Some(">"),
            Self::Ge => Some(">="),
            Self::Eq => Some("=="),
            Self::Ne => Some("!="),
            Self::Not => Some("!"),
            Self::Dot => Some("."),
            Self::DotDot => Some(".."),
            Self::And => Some("&&"),
            Self::Or => Some("||"),
            Self::LParen => Some("("),
            Self::RParen => Some(")"),
            Self::LBracket => Some("["),
            Self::RBracket => Some("]"),
            Self::Comma => Some(","),
            Self::LBrace => Some("{"),
            Self::RBrace => Some("}"),
            Self::Slash => Some("/"),
            Self::Sub => Some("-"),
            Self::Add => Some("+"),
            _ => None,
        }
    }

    /// Returns a human-readable name for this token kind.
    ///
    /// Used in diagnostic messages and debugging output.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Illegal => "error",
            Self::Eof => "eof",
            Self::Comment => "comment",
            Self::Doctype => "doctype",
            Self::CData => "cdata",
            Self::Text => "text",
            Self::Space => "space",
            Self::StartTagOpen => "`<`",
            Self::EndTagOpen => "`</`",
            Self::TagClose => "`>`",
            Self::TagSelfClose => "`/>`",
            Self::TagName => "tag name",
            Self::AttrName => "attribute name",
            Self::AttrValSep => "`=`",
            Self::AttrValDelim => "attribute value delimiter",
            Self::AttrValText => "attribute value text",
            Self::If => "`if`",
            Self::Else => "`else`",
            Self::For => "`for`",
            Self::In => "`in`",
            Self::True => "`true`",
            Self::False => "`false`",
            Self::Defer => "`defer`",
            Self::Context => "`context`",
            Self::Lt => "`<`",
            Self::Le => "`<=`",
            Self::Gt => "`>`",
            Self::Ge => "`>=`",
            Self::Eq => "`==`",
            Self::Ne => "`!=`",
            Self::Not => "`!`",
            Self::Dot => "`.`",
            Self::DotDot => "`..`",
            Self::And => "`&&`",
            Self::Or => "`||`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::Comma => "`,`",
            Self::LBrace => "`{`",
            Self::RBrace => "`}`",
            Self::Slash => "`/`",
            Self::Sub => "`-`",
            Self::Add => "`+`",
            Self::Ident => "identifier",
            Self::Int => "integer literal",
            Self::Float => "float literal",
            Self::String => "string literal",
            Self::Char => "character literal",
            Self::Fmt => "format specifier",
            Self::CondText => "conditional text",
        }
    }

    /// Returns `true` for keyword tokens, including the reserved ones.
    #[must_use]
    pub fn is_keyword(self) -> bool {
        (self as u8) >= Self::If as u8 && (self as u8) <= Self::Context as u8
    }

    /// Returns `true` for expression operators and punctuators.
    #[must_use]
    pub fn is_operator(self) -> bool {
        (self as u8) >= Self::Lt as u8 && (self as u8) <= Self::Add as u8
    }

    /// Returns `true` for literal-carrying tokens.
    #[must_use]
    pub fn is_literal(self) -> bool {
        (self as u8) >= Self::Ident as u8 && (self as u8) <= Self::CondText as u8
    }

    /// Maps an identifier to its keyword token, or [`Token::Ident`].
    ///
    /// Uses length-bucketing for fast rejection: all keywords are 2-7
    /// characters, so most identifiers never reach a string comparison.
    #[must_use]
    pub fn lookup(ident: &str) -> Token {
        match ident.len() {
            2 => match ident {
                "if" => Self::If,
                "in" => Self::In,
                _ => Self::Ident,
            },
            3 => match ident {
                "for" => Self::For,
                _ => Self::Ident,
            },
            4 => match ident {
                "else" => Self::Else,
                "true" => Self::True,
                _ => Self::Ident,
            },
            5 => match ident {
                "false" => Self::False,
                "defer" => Self::Defer,
                _ => Self::Ident,
            },
            7 => match ident {
                "context" => Self::Context,
                _ => Self::Ident,
            },
            _ => Self::Ident,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lexeme() {
            Some(lexeme) => f.write_str(lexeme),
            None => f.write_str(self.name()),
        }
    }
}

/// Reports whether `name` is a Reed keyword, such as `if` or `for`.
#[must_use]
pub fn is_keyword_name(name: &str) -> bool {
    Token::lookup(name) != Token::Ident && !name.is_empty()
}

/// Reports whether `name` is a Reed identifier: a non-empty string of
/// letters, digits, and underscores that does not start with a digit.
/// Keywords are not identifiers.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    if name.is_empty() || is_keyword_name(name) {
        return false;
    }
    name.chars().enumerate().all(|(i, c)| {
        c.is_alphabetic() || c == '_' || (i > 0 && c.is_numeric())
    })
}
