//! Best-effort syntax highlighting for fenced code bodies.

use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

const THEME: &str = "base16-ocean.dark";

/// Highlight `code` for a terminal, keyed by the fence's language tag.
///
/// Falls back from the tag to a first-line guess; returns `None` when no
/// syntax claims the code, in which case the caller emits the body
/// unmodified.
pub fn highlight(language: Option<&str>, code: &str) -> Option<String> {
    let syntax = find_syntax(language, code)?;
    let theme = &THEME_SET.themes[THEME];
    let mut highlighter = HighlightLines::new(syntax, theme);

    let mut out = String::with_capacity(code.len() * 2);
    for line in LinesWithEndings::from(code) {
        let ranges = highlighter.highlight_line(line, &SYNTAX_SET).ok()?;
        out.push_str(&as_24_bit_terminal_escaped(&ranges, false));
    }
    // syntect leaves the last color running; close it out.
    out.push_str("\x1b[0m");
    Some(out)
}

fn find_syntax(language: Option<&str>, code: &str) -> Option<&'static SyntaxReference> {
    if let Some(lang) = language {
        if let Some(syntax) = SYNTAX_SET.find_syntax_by_token(lang.trim()) {
            return Some(syntax);
        }
    }
    SYNTAX_SET.find_syntax_by_first_line(code.lines().next().unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_language_is_highlighted() {
        let out = highlight(Some("rust"), "fn main() {}\n").unwrap();
        assert!(out.contains("\x1b[38;2;"));
        assert!(out.ends_with("\x1b[0m"));
    }

    #[test]
    fn shebang_guesses_the_language() {
        let out = highlight(None, "#!/bin/bash\necho hi\n");
        assert!(out.is_some());
    }

    #[test]
    fn unknown_language_without_guess_returns_none() {
        assert!(highlight(Some("nosuchlanguage"), "zq zq zq\n").is_none());
    }

    #[test]
    fn highlighted_output_keeps_the_source_lines() {
        let out = highlight(Some("py"), "x = 1\ny = 2\n").unwrap();
        // Escapes interleave, but both lines survive in order.
        let stripped = console::strip_ansi_codes(&out);
        assert_eq!(stripped, "x = 1\ny = 2\n");
    }
}
