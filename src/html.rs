// src/html.rs
//! Small tag scanner for pulling one block out of a page.
//!
//! Not a parser: attribute values containing `>` and unclosed tags are not
//! handled. Good enough for well-formed server-rendered markup.

use once_cell::sync::OnceCell;
use regex::Regex;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Open,
    Close,
    SelfClosing,
}

#[derive(Debug, Clone)]
struct Tag {
    start: usize,
    end: usize,
    name: String,
    kind: TagKind,
}

fn next_tag(html: &str, from: usize) -> Option<Tag> {
    let mut pos = from;
    loop {
        let lt = html.get(pos..)?.find('<')? + pos;
        let rest = &html[lt..];
        if rest.starts_with("<!--") {
            pos = lt + rest.find("-->")? + 3;
            continue;
        }
        let gt = lt + rest.find('>')?;
        let body = &html[lt + 1..gt];
        let (closing, body) = match body.strip_prefix('/') {
            Some(b) => (true, b),
            None => (false, body),
        };
        let name_len = body
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(body.len());
        if name_len == 0 {
            // <!DOCTYPE ...>, stray '<'
            pos = gt + 1;
            continue;
        }
        let name = body[..name_len].to_ascii_lowercase();
        let kind = if closing {
            TagKind::Close
        } else if body.ends_with('/') || VOID_ELEMENTS.contains(&name.as_str()) {
            TagKind::SelfClosing
        } else {
            TagKind::Open
        };
        return Some(Tag {
            start: lt,
            end: gt + 1,
            name,
            kind,
        });
    }
}

/// End offset (exclusive) of the element opened by `open`.
fn element_end(html: &str, open: &Tag) -> Option<usize> {
    if open.kind == TagKind::SelfClosing {
        return Some(open.end);
    }
    let mut depth = 1usize;
    let mut pos = open.end;
    while let Some(tag) = next_tag(html, pos) {
        pos = tag.end;
        if tag.name != open.name {
            continue;
        }
        match tag.kind {
            TagKind::Open => depth += 1,
            TagKind::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(tag.end);
                }
            }
            TagKind::SelfClosing => {}
        }
    }
    None
}

/// Outer HTML of the element carrying `id="<id>"`.
pub fn element_by_id<'a>(html: &'a str, id: &str) -> Option<&'a str> {
    let re = Regex::new(&format!(r#"(?i)\sid\s*=\s*["']{}["']"#, regex::escape(id))).ok()?;
    let at = re.find(html)?.start();
    let start = html[..at].rfind('<')?;
    let open = next_tag(html, start)?;
    if open.kind == TagKind::Close {
        return None;
    }
    let end = element_end(html, &open)?;
    Some(&html[start..end])
}

/// Markup between an element's opening and closing tags.
pub fn inner_html(element: &str) -> &str {
    let Some(open) = next_tag(element, 0) else {
        return element;
    };
    if open.kind == TagKind::SelfClosing {
        return "";
    }
    let close = element.rfind("</").unwrap_or(element.len());
    if close < open.end {
        return "";
    }
    &element[open.end..close]
}

/// Outer HTML of the last top-level element in `fragment`.
pub fn last_child_element(fragment: &str) -> Option<&str> {
    let mut last = None;
    let mut pos = 0;
    while let Some(tag) = next_tag(fragment, pos) {
        match tag.kind {
            TagKind::Close => pos = tag.end,
            TagKind::SelfClosing => {
                last = Some((tag.start, tag.end));
                pos = tag.end;
            }
            TagKind::Open => {
                let end = element_end(fragment, &tag)?;
                last = Some((tag.start, end));
                pos = end;
            }
        }
    }
    last.map(|(s, e)| &fragment[s..e])
}

/// Replace every `<a ...>text</a>` with its text content.
pub fn unwrap_anchors(html: &str) -> String {
    static RE_ANCHOR: OnceCell<Regex> = OnceCell::new();
    let re = RE_ANCHOR.get_or_init(|| Regex::new(r"(?is)</?a(\s[^>]*)?>").unwrap());
    re.replace_all(html, "").to_string()
}
