//! Caret diagnostics for rejected queries.

use owo_colors::OwoColorize;

/// Renders the query line containing `offset` with a caret beneath it.
///
/// `offset` is a character column into the whole query. Offsets past the end
/// point just after the last character, where "end of input" errors land.
pub fn render_caret(query: &str, offset: usize, use_colors: bool) -> String {
    let mut column = offset;
    let mut lines = query.split('\n').peekable();
    let mut line = "";

    while let Some(current) = lines.next() {
        line = current;
        let width = current.chars().count();
        if column <= width || lines.peek().is_none() {
            column = column.min(width);
            break;
        }
        column -= width + 1;
    }

    // Tabs are kept so the caret lines up under them.
    let pad: String = line
        .chars()
        .take(column)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();

    if use_colors {
        format!("  {}\n  {}{}", line, pad, "^".red().bold())
    } else {
        format!("  {}\n  {}^", line, pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_under_offset() {
        assert_eq!(render_caret("pages > x", 8, false), "  pages > x\n          ^");
    }

    #[test]
    fn test_caret_at_end_of_input() {
        assert_eq!(render_caret("a = ", 4, false), "  a = \n      ^");
        assert_eq!(render_caret("a = ", 40, false), "  a = \n      ^");
    }

    #[test]
    fn test_caret_on_later_line() {
        assert_eq!(render_caret("a = 1\nand b", 10, false), "  and b\n      ^");
    }

    #[test]
    fn test_caret_counts_characters_not_bytes() {
        assert_eq!(render_caret("café = ?", 7, false), "  café = ?\n         ^");
    }

    #[test]
    fn test_caret_keeps_tabs() {
        assert_eq!(render_caret("\ta = ?", 5, false), "  \ta = ?\n  \t    ^");
    }

    #[test]
    fn test_colored_caret_still_contains_query() {
        let rendered = render_caret("a = ?", 4, true);
        assert!(rendered.starts_with("  a = ?\n"));
        assert!(rendered.contains('^'));
    }
}
