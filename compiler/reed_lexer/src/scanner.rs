//! The hybrid scanner state machine.
//!
//! One scanner instance alternates between three sub-languages — HTML
//! markup, quoted-attribute interpolations, and brace-delimited expression
//! code — driven by an explicit [`State`] value. All state transitions
//! happen either in the [`Scanner::scan`] dispatch or at the exit of a
//! sub-scanner; sub-scanners communicate the follow-up state by assigning
//! `self.state` before returning.
//!
//! Errors never abort a scan. Each malformed construct produces one
//! diagnostic and the scanner advances to the nearest synchronization
//! point (`{`, `}`, `<`, `>`, `/>`, the active attribute-value delimiter,
//! or EOF), so a finite source always ends in [`Token::Eof`].
//!
//! Bulk content (raw-text elements, comment bodies, mis-opened markup) is
//! skipped with `memchr`, while still reporting NUL bytes and recording a
//! line start for every `\n` crossed.

use crate::classify::{
    digit_val, is_attr_name_char, is_decimal, is_digit, is_hex, is_ident_continue_byte, is_letter,
    is_tag_name_char, is_unicode_letter, is_whitespace, lower,
};
use crate::classify::{is_deprecated_tag, is_raw_tag};
use crate::source_buffer::SourceBuffer;
use reed_token::{File, Loc, Position, Token};

/// Sentinel character reported at end of input.
///
/// An interior NUL in the source also decodes to `'\0'`; the two are
/// distinguished by offset, see [`Scanner::is_eof`].
const EOF_CHAR: char = '\0';

/// Byte order mark; permitted (and skipped) only as the first character.
const BOM: char = '\u{FEFF}';

/// Diagnostic sink: receives a resolved position and a message.
///
/// The scanner itself never stores diagnostics; ownership of
/// accumulation, deduplication across files, and synchronization belongs
/// to the sink.
pub type ErrorHandler<'e> = &'e mut dyn FnMut(Position, &str);

/// Lexical sub-state of the scanner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Between tags and outside braces.
    Text,
    /// Inside a top-level `{...}` in text position.
    CodeBlock,
    /// `<` seen; peeking to classify `<div`, `</div`, or plain text.
    TagOpen,
    /// Inside a start-tag name.
    StartTag,
    /// Inside an end-tag name.
    EndTag,
    /// Between or at an attribute name.
    AttrName,
    /// At the `=` separating an attribute name from its value.
    AttrValSep,
    /// Inside `{...}` replacing an attribute value (no quotes).
    AttrExpr,
    /// Unquoted attribute value body.
    UnquotedAttrVal,
    /// Inside quoted attribute text.
    QuotedAttrVal,
    /// At the opening `'` or `"` of an attribute value.
    AttrValDelimOpen,
    /// Inside `{...}` within a quoted attribute value.
    AttrValInterp,
    /// At the closing `'` or `"` of an attribute value.
    AttrValDelimClose,
    /// At `>`.
    TagClose,
    /// At `/>`.
    TagSelfClose,
}

/// Context-sensitive tokenizer for one Reed source.
///
/// Construct with [`Scanner::new`], then call [`scan`](Self::scan) until
/// it returns [`Token::Eof`]; after that every further call returns `Eof`
/// at the same location. Line starts are appended to the [`File`] handle
/// as newlines are encountered, and diagnostics go to the optional sink.
pub struct Scanner<'s, 'a> {
    file: &'s mut File,
    buf: &'a SourceBuffer,
    handler: Option<ErrorHandler<'s>>,

    /// Current decoded character; [`EOF_CHAR`] when exhausted.
    ch: char,
    /// Byte offset of `ch`.
    offset: u32,
    /// Byte offset immediately after `ch`.
    rd_offset: u32,
    /// Offset of the most recent line start.
    lb_offset: u32,

    state: State,
    /// Span of the open raw-text element's name, while inside one.
    raw_tag: Option<(u32, u32)>,
    /// Opening quote of the current quoted attribute value, or 0.
    attr_delim: u8,

    error_count: u32,
}

impl<'s, 'a> Scanner<'s, 'a> {
    /// Create a scanner over `buf` for the source described by `file`.
    ///
    /// A leading byte order mark is skipped. The header rule — component
    /// source must begin, after optional whitespace, with `<` and a
    /// letter — is checked here, once.
    ///
    /// # Panics
    ///
    /// Panics when `buf.len() != file.size()`; mismatched handles are a
    /// caller bug.
    pub fn new(
        file: &'s mut File,
        buf: &'a SourceBuffer,
        handler: Option<ErrorHandler<'s>>,
    ) -> Self {
        assert!(
            file.size() == buf.len(),
            "file size ({}) does not match source length ({})",
            file.size(),
            buf.len()
        );
        let mut s = Scanner {
            file,
            buf,
            handler,
            ch: ' ',
            offset: 0,
            rd_offset: 0,
            lb_offset: 0,
            state: State::Text,
            raw_tag: None,
            attr_delim: 0,
            error_count: 0,
        };
        s.next_char();
        if s.ch == BOM {
            s.next_char();
        }
        tracing::trace!(file = %s.file.name(), bytes = s.buf.len(), "scanner created");
        s.check_header();
        s
    }

    /// Number of diagnostics reported so far.
    #[must_use]
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Byte offset of the start of the line holding the current
    /// character.
    #[must_use]
    pub fn line_offset(&self) -> u32 {
        self.lb_offset
    }

    /// Scan the next token: its start location, kind, and literal.
    ///
    /// The literal is a slice of the source when the token has variable
    /// text; structural tokens carry an empty literal (their spelling is
    /// [`Token::lexeme`]). Tokens are emitted in source order and any
    /// diagnostics a scan produces are reported before it returns.
    pub fn scan(&mut self) -> (Loc, Token, &'a str) {
        // Quoted attribute text is verbatim, and whitespace inside an
        // attribute expression is itself an error; everywhere else,
        // inter-token whitespace is skipped up front.
        if self.state != State::QuotedAttrVal && self.state != State::AttrExpr {
            self.skip_whitespace();
        }

        loop {
            if self.is_eof() {
                if self.attr_delim != 0
                    && matches!(self.state, State::QuotedAttrVal | State::AttrValInterp)
                {
                    self.error(self.offset, "attribute value not terminated");
                    self.attr_delim = 0;
                    self.state = State::Text;
                }
                return (self.file.pos(self.offset), Token::Eof, "");
            }
            let loc = self.file.pos(self.offset);

            let (tok, lit) = match self.state {
                State::TagClose => {
                    self.next_char();
                    self.state = State::Text;
                    (Token::TagClose, "")
                }
                State::TagSelfClose => {
                    self.next_char();
                    self.next_char();
                    self.state = State::Text;
                    // A self-closed raw element has no content to treat verbatim.
                    self.raw_tag = None;
                    (Token::TagSelfClose, "")
                }
                State::TagOpen => {
                    if self.peek_byte() == b'/' {
                        self.next_char();
                        self.next_char();
                        self.state = State::EndTag;
                        if self.is_eof() {
                            self.state = State::Text;
                            self.error(self.offset, "end tag name not terminated");
                        } else if !is_unicode_letter(self.ch) {
                            self.state = State::Text;
                            let bad = self.ch;
                            self.error(
                                self.offset,
                                &format!("invalid character {bad:?} in end tag name"),
                            );
                        }
                        (Token::EndTagOpen, "")
                    } else if is_unicode_letter(self.peek_char()) {
                        self.next_char();
                        self.state = State::StartTag;
                        (Token::StartTagOpen, "")
                    } else {
                        // `<` opening nothing, e.g. `<3`: ordinary text.
                        self.state = State::Text;
                        self.scan_text()
                    }
                }
                State::StartTag => {
                    let lit = self.scan_start_tag();
                    self.state = State::AttrName;
                    (Token::TagName, lit)
                }
                State::EndTag => (Token::TagName, self.scan_end_tag()),
                State::AttrName => {
                    if self.advance_markup(false) {
                        continue;
                    }
                    (Token::AttrName, self.scan_attr_name())
                }
                State::AttrValSep => {
                    self.next_char();
                    self.switch_attr_val_state();
                    (Token::AttrValSep, "")
                }
                State::AttrExpr => self.scan_attr_expr(),
                State::UnquotedAttrVal => self.scan_unquoted_attr_val(),
                State::AttrValDelimOpen => {
                    let lit = self.slice(self.offset, self.rd_offset);
                    self.attr_delim = self.ch as u8;
                    self.next_char();
                    // `class=""`: nothing between the delimiters.
                    self.state = if self.at_attr_delim() {
                        State::AttrValDelimClose
                    } else {
                        State::QuotedAttrVal
                    };
                    (Token::AttrValDelim, lit)
                }
                State::QuotedAttrVal => {
                    if self.ch == '{' || self.ch == '}' {
                        self.state = State::AttrValInterp;
                        continue;
                    }
                    if self.at_attr_delim() {
                        self.state = State::AttrValDelimClose;
                        continue;
                    }
                    self.scan_quoted_attr_val()
                }
                State::AttrValInterp => {
                    if self.at_attr_delim() {
                        self.state = State::AttrValDelimClose;
                        continue;
                    }
                    self.scan_attr_val_interp()
                }
                State::AttrValDelimClose => {
                    let lit = self.slice(self.offset, self.rd_offset);
                    self.attr_delim = 0;
                    self.state = State::AttrName;
                    self.next_char();
                    if !self.advance_markup(false) && !is_whitespace(self.ch) {
                        let next = self.ch;
                        self.error(
                            self.offset,
                            &format!(
                                "missing whitespace between attribute name {next:?} and the previous attribute"
                            ),
                        );
                    }
                    (Token::AttrValDelim, lit)
                }
                State::CodeBlock => self.scan_code_block(),
                State::Text => {
                    if let Some((tag_start, tag_end)) = self.raw_tag {
                        let (tok, lit) = self.scan_raw_text(tag_start, tag_end);
                        if lit.is_empty() {
                            continue;
                        }
                        (tok, lit)
                    } else {
                        match self.ch {
                            '<' => match self.peek_byte() {
                                b'!' => self.scan_comment(),
                                b'?' => self.scan_xml_instruction(),
                                _ => {
                                    self.state = State::TagOpen;
                                    continue;
                                }
                            },
                            '{' | '}' => {
                                self.state = State::CodeBlock;
                                continue;
                            }
                            _ => self.scan_text(),
                        }
                    }
                }
            };
            return (loc, tok, lit);
        }
    }

    // ─── Character reading ────────────────────────────────────────────

    /// Read the next character into `self.ch`.
    ///
    /// Appends a line start to the file handle when moving past a
    /// newline, and reports NUL bytes and misplaced byte order marks.
    fn next_char(&mut self) {
        if self.rd_offset < self.buf.len() {
            self.offset = self.rd_offset;
            if self.ch == '\n' {
                self.lb_offset = self.offset;
                self.file.add_line(self.offset);
            }
            let b = self.buf.byte(self.rd_offset);
            let ch = if b < 0x80 {
                if b == 0 {
                    self.error(self.offset, "illegal character NUL");
                }
                b as char
            } else {
                // rd_offset < len, so a full character is present.
                let ch = self.buf.char_at(self.rd_offset).unwrap_or(EOF_CHAR);
                if ch == BOM && self.offset > 0 {
                    self.error(self.offset, "illegal byte order mark");
                }
                ch
            };
            self.rd_offset += ch.len_utf8() as u32;
            self.ch = ch;
        } else {
            self.offset = self.buf.len();
            if self.ch == '\n' {
                self.lb_offset = self.offset;
                self.file.add_line(self.offset);
            }
            self.ch = EOF_CHAR;
        }
    }

    /// `true` once every source byte has been consumed.
    #[inline]
    fn is_eof(&self) -> bool {
        self.offset >= self.buf.len()
    }

    /// Byte following the current character; 0 at EOF.
    #[inline]
    fn peek_byte(&self) -> u8 {
        self.buf.byte(self.rd_offset)
    }

    /// Character following the current one; [`EOF_CHAR`] at EOF.
    #[inline]
    fn peek_char(&self) -> char {
        self.buf.char_at(self.rd_offset).unwrap_or(EOF_CHAR)
    }

    /// Source slice between two byte offsets.
    #[inline]
    fn slice(&self, start: u32, end: u32) -> &'a str {
        self.buf.slice(start, end)
    }

    fn skip_whitespace(&mut self) {
        while is_whitespace(self.ch) {
            self.next_char();
        }
    }

    /// Reposition the scanner at `target` without re-reading the bytes
    /// in between. The caller is responsible for any line starts and NUL
    /// reports in the skipped span; see [`advance_to`](Self::advance_to).
    fn reposition(&mut self, target: u32) {
        if target >= self.buf.len() {
            self.offset = self.buf.len();
            self.rd_offset = self.buf.len();
            self.ch = EOF_CHAR;
            return;
        }
        let ch = self.buf.char_at(target).unwrap_or(EOF_CHAR);
        self.offset = target;
        self.rd_offset = target + ch.len_utf8() as u32;
        self.ch = ch;
    }

    /// Advance to the next occurrence of `needle` at or after the
    /// current character, using `memchr` for the bulk skip. Line starts
    /// are recorded and NUL bytes reported for everything crossed.
    ///
    /// Returns `true` with the cursor on `needle`, or `false` at EOF.
    fn advance_to(&mut self, needle: u8) -> bool {
        debug_assert!(needle != b'\n' && needle != 0);
        let len = self.buf.len();
        let mut from = self.offset;
        loop {
            if from >= len {
                self.reposition(len);
                return false;
            }
            let hay = &self.buf.as_bytes()[from as usize..];
            let Some(i) = memchr::memchr3(needle, b'\n', 0, hay) else {
                self.reposition(len);
                return false;
            };
            let at = from + i as u32;
            match self.buf.byte(at) {
                b'\n' => {
                    self.lb_offset = at + 1;
                    self.file.add_line(at + 1);
                }
                0 => self.error(at, "illegal character NUL"),
                _ => {
                    self.reposition(at);
                    return true;
                }
            }
            from = at + 1;
        }
    }

    /// Report a diagnostic at `offset` through the sink, if any.
    fn error(&mut self, offset: u32, msg: &str) {
        if let Some(handler) = self.handler.as_mut() {
            let loc = self.file.pos(offset);
            handler(self.file.position(loc), msg);
        }
        self.error_count += 1;
    }

    // ─── Markup frame ─────────────────────────────────────────────────

    /// Enforce the header rule once, at construction: the first
    /// non-whitespace character must open an HTML tag.
    fn check_header(&mut self) {
        self.skip_whitespace();
        if self.ch == '<' && is_unicode_letter(self.peek_char()) {
            self.state = State::TagOpen;
            return;
        }
        self.error(
            self.offset,
            "component source code must begin with a valid HTML tag",
        );
    }

    /// Advance to a markup synchronization point if the current
    /// character is one: `>`, `<`, `/>`, or EOF. Sets the corresponding
    /// state and returns `true` when it is.
    fn advance_markup(&mut self, skip_ws: bool) -> bool {
        if skip_ws {
            self.skip_whitespace();
        }
        if self.is_eof() {
            return true;
        }
        match self.ch {
            '>' => {
                self.state = State::TagClose;
                true
            }
            '<' => {
                self.state = State::TagOpen;
                true
            }
            '/' if self.peek_byte() == b'>' => {
                self.state = State::TagSelfClose;
                true
            }
            _ => false,
        }
    }

    /// `true` when `<` at the current position opens markup rather than
    /// being ordinary text: `</`, `<!`, `<?`, or `<` + letter.
    fn at_markup_boundary(&self) -> bool {
        match self.peek_byte() {
            b'/' | b'!' | b'?' => true,
            b if b < 0x80 => is_letter(b as char),
            _ => is_unicode_letter(self.peek_char()),
        }
    }

    /// Scan markup text up to the next `<` that opens markup, a brace,
    /// or EOF. `\{` and `\}` are the only escapes; a stray `}` is
    /// reported but kept as text.
    fn scan_text(&mut self) -> (Token, &'a str) {
        let off = self.offset;
        loop {
            // The character that brought us here is consumed
            // unconditionally; stop conditions apply from the next one.
            if self.ch == '\\' && matches!(self.peek_byte(), b'{' | b'}') {
                self.next_char();
                self.next_char();
            } else {
                self.next_char();
            }
            if self.is_eof() || self.ch == '{' {
                break;
            }
            if self.ch == '}' {
                self.error(
                    self.offset,
                    "code block closing character '}' is missing opening character '{'",
                );
                continue;
            }
            if self.ch == '<' && self.at_markup_boundary() {
                break;
            }
        }
        (Token::Text, self.slice(off, self.offset))
    }

    /// Scan raw-text element content: everything up to `</` followed by
    /// the exact (case-sensitive) opening tag name.
    fn scan_raw_text(&mut self, tag_start: u32, tag_end: u32) -> (Token, &'a str) {
        let off = self.offset;
        let tag_len = (tag_end - tag_start) as usize;
        let mut terminated = false;
        while self.advance_to(b'<') {
            if self.peek_byte() == b'/'
                && self.buf.bytes(self.rd_offset + 1, tag_len) == self.buf.bytes(tag_start, tag_len)
            {
                terminated = true;
                break;
            }
            self.next_char();
        }
        if !terminated {
            self.error(off, "raw text element not terminated");
        }
        self.raw_tag = None;
        (Token::Text, self.slice(off, self.offset))
    }

    /// Scan a start-tag name; the current character is its first letter.
    ///
    /// Invalid name characters are recorded at the first offending
    /// offset and reported once the name is delimited. Raw-text tags arm
    /// raw-text mode; deprecated tags are reported.
    fn scan_start_tag(&mut self) -> &'a str {
        let off = self.offset;
        let mut err_off: Option<u32> = None;
        loop {
            self.next_char();
            if self.is_eof() || self.ch == '>' || is_whitespace(self.ch) {
                break;
            }
            if self.ch == '/' && self.peek_byte() == b'>' {
                break;
            }
            if !is_tag_name_char(self.ch) && err_off.is_none() {
                err_off = Some(self.offset);
            }
        }
        let lit = self.slice(off, self.offset);
        if is_raw_tag(lit) {
            self.raw_tag = Some((off, self.offset));
        }
        if let Some(at) = err_off {
            let bad = self.buf.char_at(at).unwrap_or(EOF_CHAR);
            self.error(at, &format!("invalid character {bad:?} in start tag name"));
        } else if is_deprecated_tag(lit) {
            self.error(off, &format!("{lit:?} is deprecated"));
        }
        lit
    }

    /// Scan an end-tag name; stops at whitespace (consuming the rest of
    /// the tag), `>`, or EOF.
    fn scan_end_tag(&mut self) -> &'a str {
        let off = self.offset;
        let mut err_off: Option<u32> = None;
        let lit;
        loop {
            self.next_char();
            if self.is_eof() {
                lit = self.slice(off, self.offset);
                break;
            }
            if is_tag_name_char(self.ch) {
                continue;
            }
            if is_whitespace(self.ch) {
                // `</div  >` — the name ends here, drop the rest.
                lit = self.slice(off, self.offset);
                loop {
                    self.next_char();
                    if self.is_eof() {
                        break;
                    }
                    if self.ch == '>' {
                        self.state = State::TagClose;
                        break;
                    }
                }
                break;
            }
            if self.ch == '>' {
                lit = self.slice(off, self.offset);
                self.state = State::TagClose;
                break;
            }
            if err_off.is_none() {
                err_off = Some(self.offset);
            }
        }
        if let Some(at) = err_off {
            let bad = self.buf.char_at(at).unwrap_or(EOF_CHAR);
            self.error(at, &format!("invalid character {bad:?} in end tag name"));
        }
        lit
    }

    /// Scan an attribute name. Ends at whitespace, `=`, `>`, `/>`, or
    /// EOF; `=` as the first character is an invalid name character.
    fn scan_attr_name(&mut self) -> &'a str {
        let off = self.offset;
        let mut err_off: Option<u32> = None;
        loop {
            if self.is_eof() || self.ch == '>' || is_whitespace(self.ch) {
                break;
            }
            if self.ch == '/' && self.peek_byte() == b'>' {
                break;
            }
            if self.ch == '=' && self.offset != off {
                self.state = State::AttrValSep;
                break;
            }
            if !is_attr_name_char(self.ch) && err_off.is_none() {
                err_off = Some(self.offset);
            }
            self.next_char();
        }
        if let Some(at) = err_off {
            let bad = self.buf.char_at(at).unwrap_or(EOF_CHAR);
            self.error(at, &format!("invalid character {bad:?} in attribute name"));
        }
        self.slice(off, self.offset)
    }

    /// Decide the state after `=`: quoted value, attribute expression,
    /// unquoted value, or a missing value at the tag close.
    fn switch_attr_val_state(&mut self) {
        // `<div class=  "x">` is tolerated.
        self.skip_whitespace();
        match self.ch {
            '"' | '\'' => self.state = State::AttrValDelimOpen,
            '{' => self.state = State::AttrExpr,
            '>' => {
                self.state = State::TagClose;
                self.error(self.offset, "missing attribute value");
            }
            '/' if self.peek_byte() == b'>' => {
                self.state = State::TagSelfClose;
                self.error(self.offset, "missing attribute value");
            }
            _ => self.state = State::UnquotedAttrVal,
        }
    }

    /// Scan an unquoted attribute value up to whitespace or a markup
    /// sync point. Stray `"` `'` `=` `}` are kept in the value but
    /// reported once, at the first offense.
    fn scan_unquoted_attr_val(&mut self) -> (Token, &'a str) {
        let off = self.offset;
        let mut err_off: Option<u32> = None;
        loop {
            match self.ch {
                '"' | '\'' | '=' | '}' => {
                    if err_off.is_none() {
                        err_off = Some(self.offset);
                    }
                    self.next_char();
                }
                ' ' | '\t' | '\n' | '\r' => {
                    self.state = State::AttrName;
                    break;
                }
                _ => {
                    if self.advance_markup(false) {
                        break;
                    }
                    self.next_char();
                }
            }
        }
        if let Some(at) = err_off {
            let bad = self.buf.char_at(at).unwrap_or(EOF_CHAR);
            self.error(
                at,
                &format!("invalid character {bad:?} in unquoted attribute value"),
            );
        }
        (Token::AttrValText, self.slice(off, self.offset))
    }

    /// `true` when the current character closes the active quoted value.
    #[inline]
    fn at_attr_delim(&self) -> bool {
        self.attr_delim != 0 && self.ch == self.attr_delim as char
    }

    /// Scan quoted attribute text up to an interpolation brace or the
    /// closing delimiter. `\{` and `\}` are the only escapes.
    fn scan_quoted_attr_val(&mut self) -> (Token, &'a str) {
        let off = self.offset;
        loop {
            if self.ch == '\\' && matches!(self.peek_byte(), b'{' | b'}') {
                self.next_char();
                self.next_char();
            } else {
                self.next_char();
            }
            if self.is_eof() {
                self.error(self.offset, "attribute value not terminated");
                self.attr_delim = 0;
                self.state = State::Text;
                return (Token::Illegal, self.slice(off, self.offset));
            }
            if self.at_attr_delim() {
                self.state = State::AttrValDelimClose;
                break;
            }
            if self.ch == '{' || self.ch == '}' {
                self.state = State::AttrValInterp;
                break;
            }
        }
        (Token::AttrValText, self.slice(off, self.offset))
    }

    // ─── Expression frame ─────────────────────────────────────────────

    /// Scan one token of the restricted expression grammar shared by
    /// attribute interpolations and attribute expressions. Returns
    /// [`Token::Illegal`] without consuming when the character fits
    /// nothing; the caller reports and recovers.
    fn scan_basic_expr(&mut self) -> (Token, &'a str) {
        match self.ch {
            '-' => {
                self.next_char();
                (Token::Sub, "")
            }
            c if is_decimal(c) => self.scan_number(),
            '.' if self.peek_byte().is_ascii_digit() => self.scan_number(),
            c if is_unicode_letter(c) => {
                let lit = self.scan_identifier();
                // Keywords are longer than one letter; avoid the lookup otherwise.
                let tok = if lit.len() > 1 {
                    Token::lookup(lit)
                } else {
                    Token::Ident
                };
                (tok, lit)
            }
            '!' => {
                self.next_char();
                (Token::Not, "")
            }
            '.' => {
                self.next_char();
                (Token::Dot, "")
            }
            '[' => {
                self.next_char();
                (Token::LBracket, "")
            }
            ']' => {
                self.next_char();
                (Token::RBracket, "")
            }
            '(' => {
                self.next_char();
                (Token::LParen, "")
            }
            ')' => {
                self.next_char();
                (Token::RParen, "")
            }
            _ => (Token::Illegal, ""),
        }
    }

    /// Scan one token inside `{...}` replacing an attribute value, e.g.
    /// `disabled={!user.active}`.
    fn scan_attr_expr(&mut self) -> (Token, &'a str) {
        let off = self.offset;
        match self.ch {
            c if is_whitespace(c) => {
                self.error(self.offset, "whitespace is not allowed in attribute expression");
                let lit = self.slice(self.offset, self.rd_offset);
                self.next_char();
                self.state = State::AttrName;
                (Token::Illegal, lit)
            }
            '{' => {
                self.next_char();
                (Token::LBrace, "")
            }
            '}' => {
                self.next_char();
                self.state = State::AttrName;
                if !self.is_eof()
                    && self.ch != '>'
                    && self.ch != '/'
                    && !is_whitespace(self.ch)
                {
                    self.error(
                        self.offset,
                        "missing whitespace between attribute name and the previous attribute expression",
                    );
                }
                (Token::RBrace, "")
            }
            _ => {
                let (tok, lit) = self.scan_basic_expr();
                if tok != Token::Illegal {
                    return (tok, lit);
                }
                let bad = self.ch;
                self.error(
                    self.offset,
                    &format!("invalid character {bad:?} in attribute expression"),
                );
                loop {
                    self.next_char();
                    if self.is_eof() || self.ch == '}' {
                        break;
                    }
                    if is_whitespace(self.ch) {
                        self.state = State::AttrName;
                        break;
                    }
                    if self.advance_markup(false) {
                        break;
                    }
                }
                (Token::Illegal, self.slice(off, self.offset))
            }
        }
    }

    /// Scan one token inside `{...}` within a quoted attribute value.
    fn scan_attr_val_interp(&mut self) -> (Token, &'a str) {
        let off = self.offset;
        match self.ch {
            '{' => {
                self.next_char();
                (Token::LBrace, "")
            }
            '}' => {
                self.next_char();
                self.state = State::QuotedAttrVal;
                (Token::RBrace, "")
            }
            '%' => self.scan_specifier(Token::Fmt),
            ':' => self.scan_specifier(Token::CondText),
            _ => {
                let (tok, lit) = self.scan_basic_expr();
                if tok != Token::Illegal {
                    return (tok, lit);
                }
                let bad = self.ch;
                self.error(
                    self.offset,
                    &format!("invalid character {bad:?} in attribute interpolation expression"),
                );
                loop {
                    self.next_char();
                    if self.at_attr_delim() {
                        self.state = State::AttrValDelimClose;
                        break;
                    }
                    if self.is_eof() || self.ch == '}' {
                        break;
                    }
                }
                (Token::Illegal, self.slice(off, self.offset))
            }
        }
    }

    /// Scan a specifier body up to the closing `}`: a format specifier
    /// (`{value %.2f}`) or conditional text (`{cond:dark}`). The literal
    /// includes the introducing `%` or `:`.
    fn scan_specifier(&mut self, spec_tok: Token) -> (Token, &'a str) {
        let off = self.offset;
        let mut tok = Token::Illegal;
        let mut err_off: Option<u32> = None;
        loop {
            self.next_char();
            if self.is_eof() {
                err_off = Some(self.offset);
                break;
            }
            if self.ch == '}' {
                tok = spec_tok;
                break;
            }
            if self.state == State::AttrValInterp && self.at_attr_delim() {
                self.state = State::AttrValDelimClose;
                err_off = Some(self.offset);
                break;
            }
            if self.state == State::CodeBlock && self.ch == '<' {
                self.state = State::TagOpen;
                err_off = Some(self.offset);
                break;
            }
        }
        let lit = self.slice(off, self.offset);
        if let Some(at) = err_off {
            let msg = if spec_tok == Token::Fmt {
                "format expression not terminated"
            } else {
                "conditional text expression not terminated"
            };
            self.error(at, msg);
        }
        (tok, lit)
    }

    /// Scan one token of the full expression grammar inside a top-level
    /// `{...}` code block.
    fn scan_code_block(&mut self) -> (Token, &'a str) {
        let off = self.offset;
        let (tok, lit) = match self.ch {
            '{' => {
                self.next_char();
                (Token::LBrace, "")
            }
            '}' => {
                self.next_char();
                self.state = State::Text;
                (Token::RBrace, "")
            }
            '/' => {
                self.next_char();
                if is_whitespace(self.ch) {
                    // `{/ if}` is not a flow-control end token.
                    loop {
                        self.next_char();
                        if self.is_eof() || self.ch == '}' {
                            break;
                        }
                        if self.ch == '<' {
                            self.state = State::TagOpen;
                            break;
                        }
                    }
                    self.error(off, "invalid flow control end token");
                    (Token::Illegal, self.slice(off, self.offset))
                } else {
                    (Token::Slash, "")
                }
            }
            '-' => {
                self.next_char();
                (Token::Sub, "")
            }
            c if is_decimal(c) => self.scan_number(),
            '.' if self.peek_byte().is_ascii_digit() => self.scan_number(),
            c if is_unicode_letter(c) => {
                let lit = self.scan_identifier();
                let tok = if lit.len() > 1 {
                    Token::lookup(lit)
                } else {
                    Token::Ident
                };
                (tok, lit)
            }
            '.' => {
                self.next_char();
                if self.ch == '.' {
                    self.next_char();
                    (Token::DotDot, "")
                } else {
                    (Token::Dot, "")
                }
            }
            '=' => {
                self.next_char();
                if self.ch == '=' {
                    self.next_char();
                    (Token::Eq, "")
                } else {
                    self.recover_code_block(off, '=')
                }
            }
            '>' => {
                self.next_char();
                if self.ch == '=' {
                    self.next_char();
                    (Token::Ge, "")
                } else {
                    (Token::Gt, "")
                }
            }
            '<' => {
                self.next_char();
                if self.ch == '=' {
                    self.next_char();
                    (Token::Le, "")
                } else {
                    (Token::Lt, "")
                }
            }
            '!' => {
                self.next_char();
                if self.ch == '=' {
                    self.next_char();
                    (Token::Ne, "")
                } else {
                    (Token::Not, "")
                }
            }
            '&' => {
                self.next_char();
                if self.ch == '&' {
                    self.next_char();
                    (Token::And, "")
                } else {
                    self.recover_code_block(off, '&')
                }
            }
            '|' => {
                self.next_char();
                if self.ch == '|' {
                    self.next_char();
                    (Token::Or, "")
                } else {
                    self.recover_code_block(off, '|')
                }
            }
            '%' => self.scan_specifier(Token::Fmt),
            ':' => self.scan_specifier(Token::CondText),
            '[' => {
                self.next_char();
                (Token::LBracket, "")
            }
            ']' => {
                self.next_char();
                (Token::RBracket, "")
            }
            '(' => {
                self.next_char();
                (Token::LParen, "")
            }
            ')' => {
                self.next_char();
                (Token::RParen, "")
            }
            ',' => {
                self.next_char();
                (Token::Comma, "")
            }
            '"' => {
                self.next_char();
                self.scan_string()
            }
            '\'' => {
                self.next_char();
                self.scan_char()
            }
            '`' => {
                self.next_char();
                self.scan_raw_string()
            }
            c => {
                self.next_char();
                self.recover_code_block(off, c)
            }
        };

        if operator_needs_space(tok) && !is_whitespace(self.ch) && !self.is_eof() {
            self.error(self.offset, "operator must be surrounded by space");
        }
        (tok, lit)
    }

    /// Report an invalid character in a code block and advance to the
    /// nearest sync point (`}`, `<`, or EOF).
    fn recover_code_block(&mut self, off: u32, bad: char) -> (Token, &'a str) {
        self.error(off, &format!("invalid character {bad:?} in code block"));
        loop {
            if self.is_eof() || self.ch == '}' {
                break;
            }
            if self.ch == '<' {
                self.state = State::TagOpen;
                break;
            }
            self.next_char();
        }
        (Token::Illegal, self.slice(off, self.offset))
    }

    // ─── Identifiers, numbers, literals ───────────────────────────────

    /// Read the identifier starting at the current character, which the
    /// caller has verified is a letter.
    ///
    /// The common all-ASCII case runs on raw bytes without decoding;
    /// the first non-ASCII byte falls back to full character reading.
    fn scan_identifier(&mut self) -> &'a str {
        let off = self.offset;
        loop {
            let b = self.buf.byte(self.rd_offset);
            if is_ident_continue_byte(b) {
                self.rd_offset += 1;
                continue;
            }
            if b != 0 && b < 0x80 {
                // ASCII terminator: reload without a full next_char.
                // The preceding character is never '\n' here, so no
                // line accounting is skipped.
                self.offset = self.rd_offset;
                self.rd_offset += 1;
                self.ch = b as char;
                break;
            }
            if b == 0 && self.rd_offset >= self.buf.len() {
                self.offset = self.buf.len();
                self.rd_offset = self.buf.len();
                self.ch = EOF_CHAR;
                break;
            }
            // Interior NUL or non-ASCII: decode it properly.
            self.next_char();
            while is_unicode_letter(self.ch) || is_digit(self.ch) || self.ch == '_' {
                self.next_char();
            }
            break;
        }
        self.slice(off, self.offset)
    }

    /// Accept `{ digit | '_' }`, recording the offset of the first digit
    /// outside `base` in `invalid`. Bit 0 of the result reports digits
    /// seen, bit 1 reports separators.
    fn digits(&mut self, base: u32, invalid: &mut Option<u32>) -> u8 {
        let mut digsep = 0u8;
        if base <= 10 {
            let max = '0' as u32 + base;
            while is_decimal(self.ch) || self.ch == '_' {
                if self.ch == '_' {
                    digsep |= 2;
                } else {
                    if self.ch as u32 >= max && invalid.is_none() {
                        *invalid = Some(self.offset);
                    }
                    digsep |= 1;
                }
                self.next_char();
            }
        } else {
            while is_hex(self.ch) || self.ch == '_' {
                digsep |= if self.ch == '_' { 2 } else { 1 };
                self.next_char();
            }
        }
        digsep
    }

    /// Scan a numeric literal: integer or float in bases 2, 8, 10, 16,
    /// with `_` digit separators and `e`/`p` exponents.
    fn scan_number(&mut self) -> (Token, &'a str) {
        let off = self.offset;
        let mut tok = Token::Illegal;
        let mut base = 10u32;
        // One of '\0' (decimal), '0' (legacy octal), 'x', 'o', 'b'.
        let mut prefix = '\0';
        let mut digsep = 0u8;
        let mut invalid: Option<u32> = None;

        // integer part
        if self.ch != '.' {
            tok = Token::Int;
            if self.ch == '0' {
                self.next_char();
                match lower(self.ch) {
                    'x' => {
                        self.next_char();
                        base = 16;
                        prefix = 'x';
                    }
                    'o' => {
                        self.next_char();
                        base = 8;
                        prefix = 'o';
                    }
                    'b' => {
                        self.next_char();
                        base = 2;
                        prefix = 'b';
                    }
                    _ => {
                        base = 8;
                        prefix = '0';
                        digsep = 1; // leading 0
                    }
                }
            }
            digsep |= self.digits(base, &mut invalid);
        }

        // fractional part
        if self.ch == '.' {
            if self.peek_byte() == b'.' {
                // `..` is the range operator, not a radix point.
                return (tok, self.slice(off, self.offset));
            }
            tok = Token::Float;
            if prefix == 'o' || prefix == 'b' {
                self.error(
                    self.offset,
                    &format!("invalid radix point in {}", litname(prefix)),
                );
            }
            self.next_char();
            digsep |= self.digits(base, &mut invalid);
        }

        if digsep & 1 == 0 {
            self.error(self.offset, &format!("{} has no digits", litname(prefix)));
        }

        // exponent
        let e = lower(self.ch);
        if e == 'e' || e == 'p' {
            let exp = self.ch;
            if e == 'e' && prefix != '\0' && prefix != '0' {
                self.error(
                    self.offset,
                    &format!("{exp:?} exponent requires decimal mantissa"),
                );
            } else if e == 'p' && prefix != 'x' {
                self.error(
                    self.offset,
                    &format!("{exp:?} exponent requires hexadecimal mantissa"),
                );
            }
            self.next_char();
            tok = Token::Float;
            if self.ch == '+' || self.ch == '-' {
                self.next_char();
            }
            let ds = self.digits(10, &mut None);
            digsep |= ds;
            if ds & 1 == 0 {
                self.error(self.offset, "exponent has no digits");
            }
        } else if prefix == 'x' && tok == Token::Float {
            self.error(self.offset, "hexadecimal mantissa requires a 'p' exponent");
        }

        // suffix 'i'
        if self.ch == 'i' {
            tok = Token::Illegal;
            self.error(self.offset, "imaginary numbers are not allowed");
            self.next_char();
        }

        let lit = self.slice(off, self.offset);
        if tok == Token::Int {
            if let Some(at) = invalid {
                let bad = self.buf.byte(at) as char;
                self.error(at, &format!("invalid digit {bad:?} in {}", litname(prefix)));
            }
        }
        if digsep & 2 != 0 {
            if let Some(i) = invalid_sep(lit) {
                self.error(off + i as u32, "'_' must separate successive digits");
            }
        }
        (tok, lit)
    }

    /// Validate one escape sequence after the backslash; `quote` is the
    /// additionally accepted quote character. Stops at the offending
    /// character (without consuming it) and returns `false` on error.
    fn scan_escape(&mut self, quote: char) -> bool {
        let off = self.offset;

        let (n, base, max): (u32, u32, u32) = match self.ch {
            'a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\' => {
                self.next_char();
                return true;
            }
            c if c == quote => {
                self.next_char();
                return true;
            }
            '0'..='7' => (3, 8, 255),
            'x' => {
                self.next_char();
                (2, 16, 255)
            }
            'u' => {
                self.next_char();
                (4, 16, char::MAX as u32)
            }
            'U' => {
                self.next_char();
                (8, 16, char::MAX as u32)
            }
            _ => {
                let msg = if self.is_eof() {
                    "escape sequence not terminated"
                } else {
                    "unknown escape sequence"
                };
                self.error(off, msg);
                return false;
            }
        };

        let mut x: u32 = 0;
        for _ in 0..n {
            let d = digit_val(self.ch);
            if d >= base {
                if self.is_eof() {
                    self.error(self.offset, "escape sequence not terminated");
                } else {
                    let bad = self.ch;
                    self.error(
                        self.offset,
                        &format!("illegal character {bad:?} in escape sequence"),
                    );
                }
                return false;
            }
            x = x * base + d;
            self.next_char();
        }

        if x > max || (0xD800..0xE000).contains(&x) {
            self.error(off, "escape sequence is invalid Unicode code point");
            return false;
        }
        true
    }

    /// Scan a string literal; the opening `"` is already consumed.
    fn scan_string(&mut self) -> (Token, &'a str) {
        let off = self.offset - 1;
        loop {
            let ch = self.ch;
            if ch == '\n' || self.is_eof() {
                self.error(off, "string literal not terminated");
                return (Token::Illegal, self.slice(off, self.offset));
            }
            self.next_char();
            if ch == '"' {
                return (Token::String, self.slice(off, self.offset));
            }
            if ch == '\\' {
                self.scan_escape('"');
            }
        }
    }

    /// Scan a character literal; the opening `'` is already consumed.
    fn scan_char(&mut self) -> (Token, &'a str) {
        let off = self.offset - 1;
        let mut valid = true;
        let mut n = 0;
        loop {
            let ch = self.ch;
            if ch == '\n' || self.is_eof() {
                // only report once per literal
                if valid {
                    self.error(off, "character literal not terminated");
                    valid = false;
                }
                break;
            }
            self.next_char();
            if ch == '\'' {
                break;
            }
            n += 1;
            if ch == '\\' && !self.scan_escape('\'') {
                valid = false;
            }
        }
        if valid && n != 1 {
            self.error(off, "illegal character literal");
        }
        (Token::Char, self.slice(off, self.offset))
    }

    /// Scan a raw string literal; the opening `` ` `` is already
    /// consumed. Raw strings may span lines and contain no escapes.
    fn scan_raw_string(&mut self) -> (Token, &'a str) {
        let off = self.offset - 1;
        loop {
            if self.is_eof() {
                self.error(off, "raw string literal not terminated");
                break;
            }
            let ch = self.ch;
            self.next_char();
            if ch == '`' {
                break;
            }
        }
        (Token::String, self.slice(off, self.offset))
    }

    // ─── Comments and mis-opened markup ───────────────────────────────

    /// Scan `<!` forms: a proper comment, or the rejected doctype,
    /// CDATA, and malformed-comment shapes (all consumed through `>`).
    fn scan_comment(&mut self) -> (Token, &'a str) {
        let off = self.offset;
        self.next_char(); // consume '<'; now at '!'
        let mut tok = Token::Comment;
        let mut err = "incorrectly opened comment";

        match self.peek_byte() {
            b'-' => {
                self.next_char(); // consume '!'
                if self.peek_byte() == b'-' {
                    self.next_char(); // second '-'
                    self.next_char(); // first content character
                    return self.scan_comment_body(off);
                }
            }
            b'[' => {
                // <![CDATA[section]]>
                tok = Token::CData;
                err = "component source code cannot contain XML CDATA";
            }
            b'd' | b'D' => {
                if self
                    .buf
                    .bytes(self.rd_offset, 7)
                    .eq_ignore_ascii_case(b"DOCTYPE")
                {
                    tok = Token::Doctype;
                    err = "component source code cannot contain HTML Doctype";
                }
            }
            _ => {}
        }

        if self.advance_to(b'>') {
            self.next_char();
        }
        let lit = self.slice(off, self.offset);
        self.error(off, err);
        (tok, lit)
    }

    /// Consume a comment body through the closing `-->`; `off` is the
    /// offset of the opening `<`.
    fn scan_comment_body(&mut self, off: u32) -> (Token, &'a str) {
        loop {
            if !self.advance_to(b'-') {
                self.error(off, "comment not terminated");
                break;
            }
            if self.peek_byte() == b'-' && self.buf.byte(self.rd_offset + 1) == b'>' {
                self.next_char();
                self.next_char();
                self.next_char();
                break;
            }
            self.next_char();
        }
        (Token::Comment, self.slice(off, self.offset))
    }

    /// Scan `<?...>` and reject it.
    fn scan_xml_instruction(&mut self) -> (Token, &'a str) {
        let off = self.offset;
        self.next_char(); // consume '<'; now at '?'
        if self.advance_to(b'>') {
            self.next_char();
        }
        let lit = self.slice(off, self.offset);
        self.error(
            off,
            "component source code cannot contain XML processing instructions",
        );
        (Token::Comment, lit)
    }
}

impl<'s, 'a> Iterator for Scanner<'s, 'a> {
    type Item = (Loc, Token, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let (loc, tok, lit) = self.scan();
        if tok == Token::Eof {
            None
        } else {
            Some((loc, tok, lit))
        }
    }
}

/// Binary operators that must be followed by whitespace inside a code
/// block. Structural tokens (braces, slash, punctuation) and the unary
/// forms are exempt.
fn operator_needs_space(tok: Token) -> bool {
    matches!(
        tok,
        Token::Lt
            | Token::Le
            | Token::Gt
            | Token::Ge
            | Token::Eq
            | Token::Ne
            | Token::And
            | Token::Or
            | Token::Sub
    )
}

/// Diagnostic name for a numeric literal with the given base prefix.
fn litname(prefix: char) -> &'static str {
    match prefix {
        'x' => "hexadecimal literal",
        'o' | '0' => "octal literal",
        'b' => "binary literal",
        _ => "decimal literal",
    }
}

/// Index of the first misplaced `_` separator in a numeric literal, or
/// `None`. A separator must sit between successive digits (the base
/// prefix counts as a digit).
fn invalid_sep(lit: &str) -> Option<usize> {
    let x = lit.as_bytes();
    let mut x1 = ' '; // prefix char; only 'x' matters
    let mut d = '.'; // previous class: '_', '0' (digit), or '.' (other)
    let mut i = 0;

    if x.len() >= 2 && x[0] == b'0' {
        x1 = lower(x[1] as char);
        if x1 == 'x' || x1 == 'o' || x1 == 'b' {
            d = '0';
            i = 2;
        }
    }

    while i < x.len() {
        let p = d;
        d = x[i] as char;
        if d == '_' {
            if p != '0' {
                return Some(i);
            }
        } else if is_decimal(d) || (x1 == 'x' && is_hex(d)) {
            d = '0';
        } else {
            if p == '_' {
                return Some(i - 1);
            }
            d = '.';
        }
        i += 1;
    }
    if d == '_' {
        return Some(x.len() - 1);
    }
    None
}
