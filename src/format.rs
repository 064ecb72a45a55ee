//! A small markdown subset rendered to HTML for the response panel.
//!
//! Input is escaped before any markup is applied, so provider output can never
//! inject tags.

use regex::Regex;
use std::sync::OnceLock;

fn code_regex() -> &'static Regex {
    static CODE_REGEX: OnceLock<Regex> = OnceLock::new();
    CODE_REGEX.get_or_init(|| Regex::new(r"`([^`]+)`").unwrap())
}

fn bold_regex() -> &'static Regex {
    static BOLD_REGEX: OnceLock<Regex> = OnceLock::new();
    BOLD_REGEX.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap())
}

fn italic_regex() -> &'static Regex {
    static ITALIC_REGEX: OnceLock<Regex> = OnceLock::new();
    // The opening `*` must not follow a word character, so `5*3 and 4*2` stays literal.
    ITALIC_REGEX.get_or_init(|| Regex::new(r"(^|[^\w*])\*([^*\s][^*]*)\*").unwrap())
}

fn ordered_item_regex() -> &'static Regex {
    static ORDERED_REGEX: OnceLock<Regex> = OnceLock::new();
    ORDERED_REGEX.get_or_init(|| Regex::new(r"^\d+\.\s+(.*)$").unwrap())
}

/// Inline markup on an already escaped line. Code spans are protected from
/// emphasis by splitting around them.
fn render_inline(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for caps in code_regex().captures_iter(line) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&render_emphasis(&line[last..whole.start()]));
        out.push_str("<code>");
        out.push_str(inner.as_str());
        out.push_str("</code>");
        last = whole.end();
    }
    out.push_str(&render_emphasis(&line[last..]));
    out
}

fn render_emphasis(text: &str) -> String {
    let bold = bold_regex().replace_all(text, "<strong>$1</strong>");
    italic_regex()
        .replace_all(&bold, "${1}<em>${2}</em>")
        .into_owned()
}

enum Block {
    Paragraph(Vec<String>),
    Unordered(Vec<String>),
    Ordered(Vec<String>),
}

impl Block {
    fn render(self, out: &mut String) {
        match self {
            Block::Paragraph(lines) => {
                out.push_str("<p>");
                out.push_str(&lines.join("<br>"));
                out.push_str("</p>");
            }
            Block::Unordered(items) => render_list(out, "ul", items),
            Block::Ordered(items) => render_list(out, "ol", items),
        }
    }
}

fn render_list(out: &mut String, tag: &str, items: Vec<String>) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    for item in items {
        out.push_str("<li>");
        out.push_str(&item);
        out.push_str("</li>");
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Renders headings, bullet and numbered lists, paragraphs, line breaks,
/// `code`, **bold** and *italic*.
pub fn render_markdown(text: &str) -> String {
    let escaped = html_escape::encode_text(text.trim()).replace("\r\n", "\n");
    let mut out = String::new();
    let mut current: Option<Block> = None;

    for raw_line in escaped.lines() {
        let line = raw_line.trim_end();

        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                block.render(&mut out);
            }
            continue;
        }

        let trimmed = line.trim_start();
        if let Some(heading) = trimmed
            .strip_prefix("### ")
            .or_else(|| trimmed.strip_prefix("## "))
            .or_else(|| trimmed.strip_prefix("# "))
        {
            if let Some(block) = current.take() {
                block.render(&mut out);
            }
            out.push_str("<p><strong>");
            out.push_str(&render_inline(heading.trim()));
            out.push_str("</strong></p>");
            continue;
        }

        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            let item = render_inline(item.trim());
            match current.as_mut() {
                Some(Block::Unordered(items)) => items.push(item),
                _ => {
                    if let Some(block) = current.replace(Block::Unordered(vec![item])) {
                        block.render(&mut out);
                    }
                }
            }
            continue;
        }

        if let Some(caps) = ordered_item_regex().captures(trimmed) {
            let item = render_inline(caps.get(1).map_or("", |m| m.as_str()).trim());
            match current.as_mut() {
                Some(Block::Ordered(items)) => items.push(item),
                _ => {
                    if let Some(block) = current.replace(Block::Ordered(vec![item])) {
                        block.render(&mut out);
                    }
                }
            }
            continue;
        }

        let rendered = render_inline(trimmed);
        match current.as_mut() {
            Some(Block::Paragraph(lines)) => lines.push(rendered),
            _ => {
                if let Some(block) = current.replace(Block::Paragraph(vec![rendered])) {
                    block.render(&mut out);
                }
            }
        }
    }

    if let Some(block) = current.take() {
        block.render(&mut out);
    }
    out
}
