//! Compact rendering of backend messages for the console and the journal.
//!
//! Error bodies from the hosted API can span lines or carry whole SQL
//! statements; they are collapsed to one bounded line before display.

/// Longest error message kept in stage reports.
pub const ERROR_PREVIEW_CHARS: usize = 300;

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

pub fn compact_error(input: &str) -> String {
    compact_line(input, ERROR_PREVIEW_CHARS)
}

/// Join up to `max_items` messages on one line, noting how many were left out.
pub fn preview_messages(messages: &[String], max_items: usize, max_chars: usize) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let shown = messages
        .iter()
        .take(max_items)
        .map(|m| compact_line(m, max_chars))
        .collect::<Vec<_>>()
        .join(" | ");
    if messages.len() > max_items {
        format!("{} (+{} more)", shown, messages.len() - max_items)
    } else {
        shown
    }
}

/// `1 client`, `3 clients`, `1 activity log`.
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compacts_multiline_errors() {
        let msg = "relation \"public.tasks\"\n   does not exist";
        assert_eq!(compact_error(msg), "relation \"public.tasks\" does not exist");
        assert_eq!(compact_line("abcdef", 3), "abc...");
    }

    #[test]
    fn preview_counts_hidden_items() {
        let msgs: Vec<String> = (1..=4).map(|i| format!("row {i}")).collect();
        assert_eq!(preview_messages(&msgs, 2, 20), "row 1 | row 2 (+2 more)");
        assert_eq!(preview_messages(&[], 2, 20), "");
    }

    #[test]
    fn plurals() {
        assert_eq!(plural(1, "client", "clients"), "1 client");
        assert_eq!(plural(0, "client", "clients"), "0 clients");
    }
}
