/// Truncate at a char boundary, keeping at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Reduce an HTML fragment (e.g. a generated summary) to readable plain text:
/// script/style blocks go away entirely, block-level tags become newlines,
/// remaining tags are dropped, common entities are decoded and blank runs are
/// collapsed. Input is untrusted, possibly malformed markup; the worst a bad
/// fragment can do is render badly.
pub fn html_to_plain_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let stripped = strip_blocks(&strip_blocks(html, "script"), "style");

    let mut text = String::with_capacity(stripped.len());
    let mut rest = stripped.as_str();
    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find('>') {
            Some(end) => {
                let tag = &tail[1..end];
                if !tag.starts_with('/') && is_block_tag(tag) {
                    text.push('\n');
                }
                rest = &tail[end + 1..];
            }
            None => {
                // Unterminated tag: keep the text as-is.
                text.push_str(tail);
                rest = "";
            }
        }
    }
    text.push_str(rest);

    let decoded = decode_entities(&text);
    collapse_blank_runs(decoded.trim())
}

fn is_block_tag(tag: &str) -> bool {
    let name: String = tag
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    matches!(name.as_str(), "br" | "p" | "div" | "li")
}

/// Remove `<tag ...> ... </tag ...>` sections, case-insensitively. An
/// unterminated block swallows the remainder of the input.
fn strip_blocks(html: &str, tag: &str) -> String {
    let open = format!("<{}", tag);
    let close = format!("</{}", tag);
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    loop {
        let Some(start) = find_ascii_ci(rest, &open) else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..start]);
        let after = &rest[start..];
        let Some(close_start) = find_ascii_ci(after, &close) else {
            return out;
        };
        let tail = &after[close_start..];
        let Some(end) = tail.find('>') else {
            return out;
        };
        rest = &tail[end + 1..];
    }
}

fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Collapse any whitespace run containing two or more newlines into a single
/// blank line.
fn collapse_blank_runs(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '\n' {
            let mut last_newline = None;
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                if chars[j] == '\n' {
                    last_newline = Some(j);
                }
                j += 1;
            }
            if let Some(last) = last_newline {
                out.push_str("\n\n");
                i = last + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }

    #[test]
    fn tags_are_stripped_and_blocks_become_newlines() {
        let html = "<div>Markets rallied.</div><p>Tech led the way.</p>";
        assert_eq!(
            html_to_plain_text(html),
            "Markets rallied.\nTech led the way."
        );
    }

    #[test]
    fn script_and_style_blocks_vanish() {
        let html = "before<script>alert('x')</script>after<style>p{}</style>!";
        assert_eq!(html_to_plain_text(html), "beforeafter!");
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(
            html_to_plain_text("S&amp;P 500 &gt; 5000, &quot;records&quot;&nbsp;again"),
            "S&P 500 > 5000, \"records\" again"
        );
    }

    #[test]
    fn blank_runs_collapse_to_one_blank_line() {
        let html = "line one<br><br><br>line two";
        assert_eq!(html_to_plain_text(html), "line one\n\nline two");
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(html_to_plain_text(""), "");
    }

    #[test]
    fn case_insensitive_script_stripping() {
        let html = "a<SCRIPT src='x'>bad()</Script>b";
        assert_eq!(html_to_plain_text(html), "ab");
    }
}
