//! Render-time display palettes.
//!
//! A [`Palette`] is a plain value record: styles and marker strings chosen
//! by the caller at render time. Palettes are never persisted with a
//! conversation and carry no behavior of their own.

use console::Style;

/// Named display attributes for one rendering run.
#[derive(Debug, Clone)]
pub struct Palette {
    /// Glyph printed before each role name.
    pub role_marker: &'static str,
    pub marker_style: Style,

    pub user_role: Style,
    pub user_content: Style,
    pub assistant_role: Style,
    pub assistant_content: Style,
    pub system_role: Style,
    pub system_content: Style,

    /// Text used for the start and end fence markers.
    pub fence: &'static str,
    pub fence_style: Style,
    /// Style for the language tag on a start fence.
    pub language_style: Style,
    /// Style for inline `keyword` tokens in prose.
    pub keyword_style: Style,
    /// Style for code bodies no highlighter could claim.
    pub code_style: Style,

    /// Run code bodies through the syntax highlighter.
    pub highlight_code: bool,
}

impl Palette {
    /// ANSI palette tuned for dark terminals. Styling is forced so output
    /// is identical whether or not stdout is a tty.
    pub fn colored() -> Self {
        let f = |style: Style| style.force_styling(true);
        Self {
            role_marker: "▪",
            marker_style: f(Style::new().yellow()),
            user_role: f(Style::new().blue()),
            user_content: f(Style::new().italic()),
            assistant_role: f(Style::new().yellow()),
            assistant_content: Style::new(),
            system_role: f(Style::new().red()),
            system_content: f(Style::new().bold()),
            fence: "```",
            fence_style: f(Style::new().green().bold()),
            language_style: f(Style::new().red().underlined()),
            keyword_style: f(Style::new().cyan()),
            code_style: f(Style::new().blue()),
            highlight_code: true,
        }
    }

    /// Escape-free palette for piping and `--no-color` output.
    pub fn plain() -> Self {
        Self {
            role_marker: "*",
            marker_style: Style::new(),
            user_role: Style::new(),
            user_content: Style::new(),
            assistant_role: Style::new(),
            assistant_content: Style::new(),
            system_role: Style::new(),
            system_content: Style::new(),
            fence: "```",
            fence_style: Style::new(),
            language_style: Style::new(),
            keyword_style: Style::new(),
            code_style: Style::new(),
            highlight_code: false,
        }
    }
}
