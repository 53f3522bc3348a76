//! End-to-end scan of a realistic component template through the public
//! crate surface.

use reed_lexer::{is_raw_tag, is_void_tag, tokenize, Scanner, SourceBuffer};
use reed_token::{File, Position, Token};

const TEMPLATE: &str = r#"<article class="card {theme:dark}" data-count={items.count}>
  <h1 title="{user.name}">Hello \{world\}</h1>
  {if items.count > 0}
    <ul>
      {for item in items}
        <li data-id={item.id}>{item.title % YY-MM-DD}</li>
      {/for}
    </ul>
  {else}
    <p>nothing yet</p>
  {/if}
  <script>if (a < b) { render(); }</script>
  <input type="checkbox" checked={!user.muted}/>
</article>"#;

#[test]
fn template_scans_without_diagnostics() {
    let buf = SourceBuffer::new(TEMPLATE);
    let mut file = File::new("card.reed", buf.len());
    let mut errors: Vec<String> = Vec::new();
    let tokens = {
        let mut sink = |pos: Position, msg: &str| errors.push(format!("{pos}: {msg}"));
        tokenize(&mut file, &buf, Some(&mut sink))
    };
    assert!(errors.is_empty(), "diagnostics: {errors:?}");
    assert!(!tokens.is_empty());

    // Every literal is a borrowed slice of the source at its location.
    for (loc, _, lit) in &tokens {
        if !lit.is_empty() {
            let start = loc.offset() as usize;
            assert_eq!(&TEMPLATE[start..start + lit.len()], *lit);
        }
    }

    // The script body came through verbatim, angle bracket and all.
    assert!(tokens
        .iter()
        .any(|(_, tok, lit)| *tok == Token::Text && *lit == "if (a < b) { render(); }"));

    // Specifier tokens survived the trip.
    assert!(tokens
        .iter()
        .any(|(_, tok, lit)| *tok == Token::CondText && *lit == ":dark"));
    assert!(tokens
        .iter()
        .any(|(_, tok, lit)| *tok == Token::Fmt && *lit == "% YY-MM-DD"));

    // The line table covers the whole template.
    let newline_count = TEMPLATE.bytes().filter(|&b| b == b'\n').count();
    assert_eq!(file.line_count(), newline_count + 1);
    let last = tokens.last().unwrap();
    let pos = file.position(last.0);
    assert_eq!(pos.line as usize, newline_count + 1);
}

#[test]
fn void_and_raw_tag_queries_agree_with_the_template() {
    // `input` may self-close without content; `script` hides its body.
    assert!(is_void_tag("input"));
    assert!(!is_void_tag("article"));
    assert!(is_raw_tag("script"));
    assert!(!is_raw_tag("input"));
}

#[test]
fn streaming_and_collecting_agree() {
    let buf = SourceBuffer::new(TEMPLATE);

    let mut file_a = File::new("card.reed", buf.len());
    let collected = tokenize(&mut file_a, &buf, None);

    let mut file_b = File::new("card.reed", buf.len());
    let streamed: Vec<_> = Scanner::new(&mut file_b, &buf, None).collect();

    assert_eq!(collected, streamed);
}

#[test]
fn error_count_matches_sink_calls_on_broken_input() {
    let src = "<b class=\"x\"\"y\"><font>{1__0}{a ==b}</font>";
    let buf = SourceBuffer::new(src);
    let mut file = File::new("broken.reed", buf.len());
    let mut calls = 0usize;
    let reported;
    {
        let mut sink = |_: Position, _: &str| calls += 1;
        let mut scanner = Scanner::new(&mut file, &buf, Some(&mut sink));
        while Scanner::scan(&mut scanner).1 != Token::Eof {}
        reported = scanner.error_count();
    }
    assert_eq!(reported as usize, calls);
    assert!(reported >= 4);
}
