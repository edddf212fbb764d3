use crate::extract::COMMAND_MARKER;

pub const DEFAULT_WRAP_WIDTH: usize = 70;

const COMMENT_PREFIX: &str = "# ";

/// Reflow a model reply for the terminal.
///
/// `$` lines are kept verbatim. Every other non-blank line is wrapped to
/// `width` columns and each piece is prefixed with `# `. Each source line is
/// followed by a blank line. A line that already starts with `#` is unwrapped
/// first, so formatting formatted text does not stack markers.
pub fn format_response(text: &str, width: usize) -> String {
    let mut output = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with(COMMAND_MARKER) {
            output.push_str(line);
            output.push('\n');
        } else {
            let body = trimmed.trim_start_matches('#').trim_start();
            for piece in textwrap::wrap(body, width.max(1)) {
                output.push_str(COMMENT_PREFIX);
                output.push_str(&piece);
                output.push('\n');
            }
        }
        output.push('\n');
    }

    output.trim_end().to_string()
}
