//! Linear scanner that splits assistant text into plain and fenced-code
//! segments.
//!
//! The scanner alternates strictly between a plain-text state and a fenced
//! state, starting in plain text. An opening fence is three backticks at the
//! start of the text or after a newline, with only blanks before them on
//! that line, followed by an optional language tag and a newline. The body
//! is the shortest run ending at a closing fence on its own line; the
//! closing line's leading blanks may precede the backticks. Fences that
//! never close stay plain text. Matching is byte-exact: segment contents
//! are slices of the input, never rewritten.

/// One typed span of assistant output, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Prose between code sections.
    Plain(&'a str),
    /// A fenced code section. `language` is the verbatim tag from the
    /// opening fence line; an empty tag is reported as `None`.
    Code {
        language: Option<&'a str>,
        body: &'a str,
    },
}

const FENCE: &str = "```";

/// Split `text` into ordered plain/code segments.
pub fn scan(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    while let Some(open) = find_fence(text, cursor) {
        let tag_start = open + FENCE.len();
        // The opening fence line must terminate; otherwise nothing after
        // this point can form a code section.
        let Some(tag_len) = text[tag_start..].find('\n') else {
            break;
        };
        let body_start = tag_start + tag_len + 1;

        let Some((body_end, resume)) = find_closing(text, body_start) else {
            break;
        };

        if open > cursor {
            segments.push(Segment::Plain(&text[cursor..open]));
        }
        let tag = &text[tag_start..tag_start + tag_len];
        segments.push(Segment::Code {
            language: if tag.is_empty() { None } else { Some(tag) },
            body: &text[body_start..body_end],
        });
        cursor = resume;
    }

    if cursor < text.len() {
        segments.push(Segment::Plain(&text[cursor..]));
    }
    segments
}

/// Find the next backtick fence at or after `from` that sits at the start
/// of a line, allowing leading blanks.
fn find_fence(text: &str, from: usize) -> Option<usize> {
    let mut idx = from;
    while let Some(rel) = text[idx..].find(FENCE) {
        let pos = idx + rel;
        if line_prefix_is_blank(text, pos, from) {
            return Some(pos);
        }
        idx = pos + FENCE.len();
    }
    None
}

/// Find the closing fence for a body starting at `body_start`. Returns the
/// end of the body (the start of the closing line, so the body keeps its
/// trailing newline) and the position to resume scanning after the fence.
fn find_closing(text: &str, body_start: usize) -> Option<(usize, usize)> {
    let mut idx = body_start;
    while let Some(rel) = text[idx..].find(FENCE) {
        let pos = idx + rel;
        let line_start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
        // The closing fence needs a newline inside the body before it, so
        // its line must begin strictly after the body does.
        if line_start > body_start
            && text[line_start..pos].chars().all(|c| c == ' ' || c == '\t')
        {
            return Some((line_start, pos + FENCE.len()));
        }
        idx = pos + FENCE.len();
    }
    None
}

/// True when everything between the start of `pos`'s line (or `floor`,
/// whichever is later) and `pos` is blank. Covers both "start of text" and
/// "immediately after a newline, optionally indented".
fn line_prefix_is_blank(text: &str, pos: usize, floor: usize) -> bool {
    let line_start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    let check_from = line_start.max(floor.min(pos));
    // Resuming mid-line after a closing fence never opens a new one.
    if line_start < floor && text[line_start..floor].chars().any(|c| c != ' ' && c != '\t') {
        return false;
    }
    text[check_from..pos].chars().all(|c| c == ' ' || c == '\t')
}
