//! Shared utilities for channel implementations.

/// Split a long message into chunks that respect a platform's character limit.
///
/// All slice boundaries are aligned to UTF-8 char boundaries. Prefers
/// splitting at newline boundaries when possible.
pub fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let end = floor_char_boundary(text, (start + max_len).min(text.len()));
        let break_at = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .map(|i| start + i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        // A single char wider than max_len still has to go somewhere.
        let break_at = if break_at == start {
            start + text[start..].chars().next().map_or(1, char::len_utf8)
        } else {
            break_at
        };
        chunks.push(&text[start..break_at]);
        start = break_at;
    }

    chunks
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Split an HTML-formatted message into chunks that each parse on their own.
///
/// Tags still open at a cut are closed at the end of the chunk and reopened
/// at the start of the next, with the reopened and closing markup counted
/// against `max_len`. Cuts never land inside a tag or an `&...;` entity and
/// prefer newline boundaries.
pub fn split_html(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let safe = safe_cuts(text);
    let mut chunks = Vec::new();
    let mut open: Vec<&str> = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let prefix = open.concat();
        let mut budget = max_len.saturating_sub(prefix.len());

        let (end, still_open) = loop {
            let end = html_cut(text, &safe, start, budget);
            let mut still_open = open.clone();
            track_tags(&text[start..end], &mut still_open);

            let total = prefix.len() + (end - start) + closing_len(&still_open);
            if total <= max_len || budget == 0 {
                break (end, still_open);
            }
            budget = (end - start)
                .saturating_sub(total - max_len)
                .min(budget - 1);
        };

        let closing: String = still_open
            .iter()
            .rev()
            .map(|markup| format!("</{}>", tag_name(markup)))
            .collect();
        chunks.push(format!("{prefix}{}{closing}", &text[start..end]));

        open = still_open;
        start = end;
    }

    chunks
}

/// Where a cut may go: char boundaries outside tags and entities.
fn safe_cuts(text: &str) -> Vec<bool> {
    let mut safe = vec![false; text.len() + 1];
    let (mut in_tag, mut in_entity) = (false, false);
    for (i, c) in text.char_indices() {
        safe[i] = !in_tag && !in_entity;
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            '&' if !in_tag => in_entity = true,
            ';' => in_entity = false,
            c if c.is_whitespace() => in_entity = false,
            _ => {}
        }
    }
    safe[text.len()] = true;
    safe
}

/// End of the next chunk body starting at `start`, at most `budget` bytes
/// long unless not even one tag or entity fits.
fn html_cut(text: &str, safe: &[bool], start: usize, budget: usize) -> usize {
    let mut end = (start + budget).min(text.len());
    if end == text.len() {
        return end;
    }
    while end > start && !safe[end] {
        end -= 1;
    }
    let newline = text[start..end]
        .rfind('\n')
        .map(|i| start + i + 1)
        .filter(|&at| safe[at]);
    match newline {
        Some(at) => at,
        None if end > start => end,
        None => (start + 1..=text.len())
            .find(|&at| safe[at])
            .unwrap_or(text.len()),
    }
}

/// Update the stack of open tags (their full opening markup) with the tags
/// in `html`.
fn track_tags<'a>(html: &'a str, open: &mut Vec<&'a str>) {
    let mut rest = html;
    while let Some(lt) = rest.find('<') {
        let Some(gt) = rest[lt..].find('>') else {
            break;
        };
        let markup = &rest[lt..lt + gt + 1];
        if markup.starts_with("</") {
            let name = tag_name(markup);
            if let Some(pos) = open.iter().rposition(|m| tag_name(m) == name) {
                open.remove(pos);
            }
        } else if !markup.ends_with("/>") {
            open.push(markup);
        }
        rest = &rest[lt + gt + 1..];
    }
}

fn tag_name(markup: &str) -> &str {
    let markup = markup.trim_start_matches(['<', '/']);
    let end = markup
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(markup.len());
    &markup[..end]
}

fn closing_len(open: &[&str]) -> usize {
    open.iter().map(|markup| tag_name(markup).len() + 3).sum()
}
