//! Telegram HTML helpers and a plain-text table renderer for `<pre>` blocks.

/// Escape text for Telegram's HTML parse mode.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Deep link that opens a user's profile.
pub fn tg_link(user_id: i64) -> String {
    format!("tg://user?id={user_id}")
}

/// An HTML anchor to a user's profile. `text` is escaped.
pub fn tg_href(user_id: i64, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", tg_link(user_id), html_escape(text))
}

/// Greedy word wrap. Words longer than `width` are broken.
pub fn wrap(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(word.drain(..width).collect());
        }
        if word.is_empty() {
            continue;
        }

        let line_len = line.chars().count();
        if line_len > 0 && line_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines.join("\n")
}

/// One table cell. Numbers are right-aligned, text left-aligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Number(i64),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn number(n: i64) -> Self {
        Self::Number(n)
    }

    fn lines(&self) -> Vec<String> {
        match self {
            Self::Text(s) => s.lines().map(str::to_string).collect(),
            Self::Number(n) => vec![n.to_string()],
        }
    }
}

/// Space between columns, and the minimum slack around each header.
const PADDING: usize = 2;

/// Render rows under a dashed header rule.
///
/// ```text
/// Übung      Todo    Done
/// --------  ------  ------
/// Dips          0      30
/// ```
///
/// Text cells may span several lines; the row grows to fit.
pub fn table(headers: &[&str], rows: &[Vec<Cell>]) -> String {
    let numeric: Vec<bool> = (0..headers.len())
        .map(|i| {
            !rows.is_empty()
                && rows
                    .iter()
                    .all(|row| matches!(row.get(i), Some(Cell::Number(_))))
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .flat_map(|cell| cell.lines())
                .map(|line| line.chars().count())
                .fold(header.chars().count() + PADDING, usize::max)
        })
        .collect();

    let mut out: Vec<String> = Vec::new();
    out.push(render_line(
        &headers.iter().map(|h| h.to_string()).collect::<Vec<_>>(),
        &widths,
        &numeric,
    ));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(&" ".repeat(PADDING)),
    );

    for row in rows {
        let cells: Vec<Vec<String>> = (0..headers.len())
            .map(|i| row.get(i).map(Cell::lines).unwrap_or_default())
            .collect();
        let height = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
        for line_no in 0..height {
            let line: Vec<String> = cells
                .iter()
                .map(|c| c.get(line_no).cloned().unwrap_or_default())
                .collect();
            out.push(render_line(&line, &widths, &numeric));
        }
    }

    out.join("\n")
}

fn render_line(cells: &[String], widths: &[usize], numeric: &[bool]) -> String {
    cells
        .iter()
        .zip(widths)
        .zip(numeric)
        .map(|((cell, width), right)| {
            if *right {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join(&" ".repeat(PADDING))
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#x27;");
        assert_eq!(html_escape("Übung"), "Übung");
    }

    #[test]
    fn test_tg_href_escapes_name() {
        assert_eq!(
            tg_href(7, "<Eve>"),
            "<a href=\"tg://user?id=7\">&lt;Eve&gt;</a>"
        );
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("Dips", 12), "Dips");
        assert_eq!(wrap("Klimmzuguebungen", 12), "Klimmzuguebu\nngen");
        assert_eq!(wrap("one two three four", 9), "one two\nthree\nfour");
        assert_eq!(wrap("", 12), "");
    }

    #[test]
    fn test_table_alignment() {
        let rows = vec![
            vec![Cell::text("Dips"), Cell::number(0), Cell::number(30)],
            vec![Cell::text("Crunches"), Cell::number(30), Cell::number(50)],
        ];
        let rendered = table(&["Übung", "Todo", "Done"], &rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Übung       Todo    Done");
        assert_eq!(lines[1], "--------  ------  ------");
        assert_eq!(lines[2], "Dips           0      30");
        assert_eq!(lines[3], "Crunches      30      50");
    }

    #[test]
    fn test_table_multiline_cell() {
        let rows = vec![vec![
            Cell::text(wrap("Klimmzuguebungen", 12)),
            Cell::number(5),
        ]];
        let rendered = table(&["Übung", "Todo"], &rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "Klimmzuguebu       5");
        assert_eq!(lines[3], "ngen");
    }

    #[test]
    fn test_table_without_rows() {
        let rendered = table(&["Übung"], &[]);
        assert_eq!(rendered, "Übung\n-------");
    }
}
