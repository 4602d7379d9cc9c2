//! Markdown to HTML rendering.

use pulldown_cmark::{html, Options, Parser};

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Render a note body to HTML.
///
/// Output is not sanitized; notes are trusted content.
pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options());

    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, parser);

    html_output
}
