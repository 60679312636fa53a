//! Terminal rendering of conversations.
//!
//! Rendering maps each message to styled text: a role marker line, then the
//! content. User and system content is emitted whole; assistant content is
//! segmented by the [`scanner`] into prose and fenced code, prose gets
//! inline `keyword` restyling, and code bodies go through the best-effort
//! highlighter. Every styled piece closes its own escape state, so styles
//! never bleed between segments or messages.

pub mod palette;
pub mod scanner;

mod highlight;

pub use palette::Palette;
pub use scanner::{scan, Segment};

use crate::conversation::{Conversation, Message, Role};
use console::Style;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

/// Inline back-tick-quoted tokens in prose, shortest match, single line.
static KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`\n]+)`").expect("keyword regex is valid"));

/// Render a whole conversation in message order.
pub fn render_conversation(conversation: &Conversation, palette: &Palette) -> String {
    if conversation.is_empty() {
        return "<empty conversation>".to_string();
    }
    let mut out = String::new();
    for message in &conversation.messages {
        out.push_str(&render_message(message, palette));
    }
    out
}

/// Render a single message, role marker included.
pub fn render_message(message: &Message, palette: &Palette) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{} ",
        palette.marker_style.apply_to(palette.role_marker)
    );

    match message.role {
        Role::User => {
            let _ = writeln!(out, "{}", palette.user_role.apply_to("user"));
            let _ = writeln!(
                out,
                "{}",
                palette.user_content.apply_to(message.content.trim())
            );
        }
        Role::System => {
            let _ = writeln!(out, "{}", palette.system_role.apply_to("system"));
            let _ = writeln!(
                out,
                "{}",
                palette.system_content.apply_to(message.content.trim())
            );
        }
        Role::Assistant => {
            let _ = writeln!(out, "{}", palette.assistant_role.apply_to("assistant"));
            for segment in scan(&message.content) {
                match segment {
                    Segment::Plain(text) => {
                        push_prose(&mut out, text, palette);
                    }
                    Segment::Code { language, body } => {
                        push_code(&mut out, language, body, palette);
                    }
                }
            }
            out.push('\n');
        }
    }
    out
}

/// Emit prose with inline `keyword` tokens restyled. The backticks stay
/// literal; only the text between them gets the keyword style, and the
/// surrounding content style resumes right after.
fn push_prose(out: &mut String, text: &str, palette: &Palette) {
    let mut last = 0;
    for matched in KEYWORD_RE.find_iter(text) {
        // The match is `token` including both backticks.
        let token = &text[matched.start() + 1..matched.end() - 1];
        push_styled(out, &palette.assistant_content, &text[last..matched.start()]);
        push_styled(out, &palette.assistant_content, "`");
        push_styled(out, &palette.keyword_style, token);
        push_styled(out, &palette.assistant_content, "`");
        last = matched.end();
    }
    push_styled(out, &palette.assistant_content, &text[last..]);
}

/// Emit one fenced code section: start fence with optional language tag,
/// highlighted body, end fence.
fn push_code(out: &mut String, language: Option<&str>, body: &str, palette: &Palette) {
    if let Some(lang) = language {
        let _ = writeln!(
            out,
            "{}{}{}",
            palette.fence_style.apply_to(format!("{}(", palette.fence)),
            palette.language_style.apply_to(lang),
            palette.fence_style.apply_to(")"),
        );
    } else {
        let _ = writeln!(out, "{}", palette.fence_style.apply_to(palette.fence));
    }

    let highlighted = if palette.highlight_code {
        highlight::highlight(language, body)
    } else {
        None
    };
    match highlighted {
        Some(code) => out.push_str(&code),
        None => push_styled(out, &palette.code_style, body),
    }

    let _ = writeln!(out, "{}", palette.fence_style.apply_to(palette.fence));
}

fn push_styled(out: &mut String, style: &Style, text: &str) {
    if !text.is_empty() {
        let _ = write!(out, "{}", style.apply_to(text));
    }
}

impl Conversation {
    /// Render the whole conversation with the given palette.
    pub fn render(&self, palette: &Palette) -> String {
        render_conversation(self, palette)
    }

    /// Render only the message at `index`, if present. Handy for showing
    /// just the latest exchange.
    pub fn render_message(&self, index: usize, palette: &Palette) -> Option<String> {
        self.messages
            .get(index)
            .map(|message| render_message(message, palette))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant(content: &str) -> Message {
        Message::new(Role::Assistant, content)
    }

    #[test]
    fn empty_conversation_renders_placeholder() {
        let conversation = Conversation::new();
        assert_eq!(
            render_conversation(&conversation, &Palette::plain()),
            "<empty conversation>"
        );
    }

    #[test]
    fn user_message_is_trimmed_and_marked() {
        let message = Message::new(Role::User, "  hello there  \n");
        let rendered = render_message(&message, &Palette::plain());
        assert_eq!(rendered, "* user\nhello there\n");
    }

    #[test]
    fn system_message_keeps_its_role_name() {
        let message = Message::new(Role::System, "be brief");
        let rendered = render_message(&message, &Palette::plain());
        assert_eq!(rendered, "* system\nbe brief\n");
    }

    #[test]
    fn code_section_renders_body_and_language_tag() {
        let message = assistant("before\n```python\nprint(1)\n``` after");
        let rendered = render_message(&message, &Palette::plain());

        assert!(rendered.contains("before"));
        assert!(rendered.contains("```(python)\n"));
        assert!(rendered.contains("print(1)\n"));
        assert!(rendered.contains("after"));
        // Prose stays outside the fences.
        let code_region_start = rendered.find("```(python)").unwrap();
        assert!(rendered.find("before").unwrap() < code_region_start);
        assert!(rendered.find("after").unwrap() > code_region_start);
    }

    #[test]
    fn fence_without_language_has_no_parens() {
        let message = assistant("```\nx = 1\n```\n");
        let rendered = render_message(&message, &Palette::plain());
        assert!(rendered.contains("```\nx = 1\n```\n"));
        assert!(!rendered.contains("()"));
    }

    #[test]
    fn two_fences_render_as_two_code_regions() {
        let message = assistant("```py\none\n```\nmiddle\n```sh\ntwo\n```\n");
        let rendered = render_message(&message, &Palette::plain());

        assert!(rendered.contains("```(py)\none\n```"));
        assert!(rendered.contains("```(sh)\ntwo\n```"));
        assert!(rendered.contains("middle"));
        // Four fence markers total: two regions, not one spanning both.
        assert_eq!(rendered.matches("```").count(), 4);
    }

    #[test]
    fn inline_keyword_keeps_literal_backticks() {
        let message = assistant("use `x` now");
        let plain = render_message(&message, &Palette::plain());
        assert!(plain.contains("use `x` now"));

        let colored = render_message(&message, &Palette::colored());
        // Backticks survive; only the token between them is styled cyan.
        assert!(colored.contains("`\u{1b}[36mx\u{1b}[0m`"));
    }

    #[test]
    fn colored_styles_always_reset() {
        let message = Message::new(Role::User, "styled");
        let rendered = render_message(&message, &Palette::colored());
        // Both the role line and the content line close their styles.
        let resets = rendered.matches("\u{1b}[0m").count();
        assert!(resets >= 2, "expected closed styles in {rendered:?}");
        assert!(rendered.trim_end().ends_with("\u{1b}[0m"));
    }

    #[test]
    fn colored_code_region_is_highlighted() {
        let message = assistant("```rust\nfn main() {}\n```\n");
        let rendered = render_message(&message, &Palette::colored());
        assert!(rendered.contains("\u{1b}[38;2;"));
        let stripped = console::strip_ansi_codes(&rendered).to_string();
        assert!(stripped.contains("fn main() {}"));
    }

    #[test]
    fn unknown_language_falls_back_to_raw_body() {
        let message = assistant("```qqxz\nzq zq zq\n```\n");
        let rendered = render_message(&message, &Palette::colored());
        let stripped = console::strip_ansi_codes(&rendered).to_string();
        assert!(stripped.contains("zq zq zq\n"));
    }

    #[test]
    fn conversation_renders_messages_in_order() {
        let mut conversation = Conversation::new();
        conversation.add_user("question");
        conversation.add_assistant("answer");
        let rendered = render_conversation(&conversation, &Palette::plain());

        let q = rendered.find("question").unwrap();
        let a = rendered.find("answer").unwrap();
        assert!(q < a);
        assert_eq!(rendered.matches("* ").count(), 2);
    }
}
