//! Plain-text rendering of the board for a terminal.

use client_core::view::{Layout, MessageRow};

const FORM_COLUMN_WIDTH: usize = 34;

fn form_lines(name: &str) -> Vec<String> {
    let name = if name.trim().is_empty() {
        "(not set, use /name <NAME>)"
    } else {
        name
    };
    vec![
        "== Send a message ==".to_string(),
        format!("Name: {name}"),
        "Type and press Enter.".to_string(),
        "/name /refresh /retry /quit".to_string(),
    ]
}

fn list_lines(rows: &[MessageRow]) -> Vec<String> {
    let mut lines = vec!["== Messages ==".to_string()];
    if rows.is_empty() {
        lines.push("No messages yet.".to_string());
    }
    for row in rows {
        lines.push(row.title.clone());
        lines.push(format!("    {}", row.timestamp));
    }
    lines
}

/// Form and list either stacked (form first) or side by side.
pub fn render_board(rows: &[MessageRow], name: &str, layout: Layout) -> String {
    let form = form_lines(name);
    let list = list_lines(rows);

    match layout {
        Layout::Stacked => {
            let mut lines = form;
            lines.push(String::new());
            lines.extend(list);
            lines.join("\n")
        }
        Layout::SideBySide => {
            let height = form.len().max(list.len());
            (0..height)
                .map(|i| {
                    let left = form.get(i).map(String::as_str).unwrap_or_default();
                    let right = list.get(i).map(String::as_str).unwrap_or_default();
                    format!("{left:<FORM_COLUMN_WIDTH$} | {right}")
                        .trim_end()
                        .to_string()
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Rows only, for one-shot listing.
pub fn render_rows(rows: &[MessageRow]) -> String {
    list_lines(rows)[1..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str) -> MessageRow {
        MessageRow {
            key: "1".into(),
            title: title.into(),
            timestamp: "01/01/2024, 10:00:00".into(),
        }
    }

    #[test]
    fn stacked_layout_puts_form_above_list() {
        let board = render_board(&[row("Ana: Oi")], "Ana", Layout::Stacked);
        let form_at = board.find("== Send a message ==").expect("form");
        let list_at = board.find("== Messages ==").expect("list");
        assert!(form_at < list_at);
        assert!(board.contains("Ana: Oi\n    01/01/2024, 10:00:00"));
    }

    #[test]
    fn side_by_side_layout_shares_lines() {
        let board = render_board(&[row("Ana: Oi")], "Ana", Layout::SideBySide);
        let first = board.lines().next().expect("line");
        assert!(first.starts_with("== Send a message =="));
        assert!(first.ends_with("| == Messages =="));
    }

    #[test]
    fn empty_board_has_hint() {
        assert_eq!(render_rows(&[]), "No messages yet.");
    }
}
