use super::*;

const RESPONSE: &str = "Here is your page:\n```html\n<div class=\"p-4\">\n  <p>Hi `there`</p>\n</div>\n```\nEnjoy!";
const ARTIFACT: &str = "\n<div class=\"p-4\">\n  <p>Hi `there`</p>\n</div>\n";

fn feed_in_chunks(text: &str, size: usize) -> (CodeParser, String) {
    let mut parser = CodeParser::new();
    let mut code = String::new();
    let chars: Vec<char> = text.chars().collect();
    for chunk in chars.chunks(size) {
        let delta: String = chunk.iter().collect();
        let feed = parser.feed(&delta);
        if feed.mode == Mode::Code {
            code.push_str(&feed.emitted);
        }
    }
    (parser, code)
}

// =============================================================
// Fence detection
// =============================================================

#[test]
fn emitted_code_matches_artifact_for_every_chunk_size() {
    for size in 1..=RESPONSE.len() {
        let (parser, code) = feed_in_chunks(RESPONSE, size);
        assert_eq!(code, ARTIFACT, "chunk size {size}");
        assert_eq!(parser.finish(), Extraction::Code(ARTIFACT.to_owned()), "chunk size {size}");
    }
}

#[test]
fn flip_includes_code_that_arrived_with_the_marker() {
    let mut parser = CodeParser::new();
    assert_eq!(parser.feed("Sure. ").mode, Mode::Prose);
    let feed = parser.feed("```html<main>");
    assert_eq!(feed, Feed { mode: Mode::Code, emitted: "<main>".into() });
    assert_eq!(parser.code(), "<main>");
}

#[test]
fn split_opening_marker_is_found() {
    let mut parser = CodeParser::new();
    assert_eq!(parser.feed("``").mode, Mode::Prose);
    assert_eq!(parser.feed("`ht").mode, Mode::Prose);
    let feed = parser.feed("ml<p>");
    assert_eq!(feed.mode, Mode::Code);
    assert_eq!(feed.emitted, "<p>");
}

#[test]
fn trailing_backticks_are_held_until_disambiguated() {
    let mut parser = CodeParser::new();
    parser.feed("```html<p>a");
    assert_eq!(parser.feed("``").emitted, "");
    assert_eq!(parser.feed("b</p>").emitted, "``b</p>");
    assert_eq!(parser.code(), "<p>a``b</p>");
}

#[test]
fn text_after_closing_marker_is_ignored() {
    let mut parser = CodeParser::new();
    parser.feed("```html<p></p>```");
    assert!(parser.is_closed());
    let feed = parser.feed(" more ```html<div></div>```");
    assert_eq!(feed, Feed { mode: Mode::Code, emitted: String::new() });
    assert_eq!(parser.finish(), Extraction::Code("<p></p>".into()));
}

// =============================================================
// Prose and unterminated blocks
// =============================================================

#[test]
fn prose_deltas_pass_through() {
    let mut parser = CodeParser::new();
    assert_eq!(parser.feed("Hello"), Feed { mode: Mode::Prose, emitted: "Hello".into() });
    assert_eq!(parser.feed(", world"), Feed { mode: Mode::Prose, emitted: ", world".into() });
    assert_eq!(parser.code(), "");
    assert_eq!(parser.response(), "Hello, world");
    assert_eq!(parser.finish(), Extraction::Conversation("Hello, world".into()));
}

#[test]
fn other_fence_languages_stay_prose() {
    let (parser, code) = feed_in_chunks("Try:\n```css\nbody {}\n```", 3);
    assert!(code.is_empty());
    assert_eq!(parser.mode(), Mode::Prose);
}

#[test]
fn unterminated_block_keeps_held_backticks() {
    let mut parser = CodeParser::new();
    parser.feed("```html<p>x</p>`");
    assert_eq!(parser.code(), "<p>x</p>");
    assert_eq!(parser.finish(), Extraction::Code("<p>x</p>`".into()));
}

#[test]
fn multibyte_text_splits_cleanly() {
    let text = "Voilà ✨\n```html<p>café ☕</p>```";
    let (parser, code) = feed_in_chunks(text, 1);
    assert_eq!(code, "<p>café ☕</p>");
    assert_eq!(parser.finish(), Extraction::Code("<p>café ☕</p>".into()));
}
