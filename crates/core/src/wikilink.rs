// Wiki link markup: parsing `[[...]]` occurrences and rendering new ones.
//
// Supported forms:
// - [[target]]
// - [[target|label]]
// - [[target#fragment]]
// - [[target#fragment|label]]
// - [[:Category:target]] (leading colon = plain link, no category assignment)

/// A wiki link found in page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    /// Link target before any `#fragment`, leading colon removed.
    pub target: String,
    /// Optional section fragment after `#`.
    pub fragment: Option<String>,
    /// Optional display label after `|`.
    pub label: Option<String>,
    /// Whether the target was written with a leading colon.
    pub colon_escaped: bool,
    /// Byte offset of the opening `[[`.
    pub start: usize,
    /// Byte offset just after the closing `]]`.
    pub end: usize,
}

impl WikiLink {
    /// Text a reader sees for this link.
    pub fn display_text(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.target)
    }
}

/// Render link markup. When `label` equals `target` the short form is used.
pub fn render_link(target: &str, label: &str) -> String {
    if target == label {
        format!("[[{target}]]")
    } else {
        format!("[[{target}|{label}]]")
    }
}

/// Find every well-formed wiki link in `text`, in document order.
pub fn parse_wiki_links(text: &str) -> Vec<WikiLink> {
    let mut links = Vec::new();
    let mut cursor = 0usize;

    while let Some(open) = text[cursor..].find("[[") {
        let start = cursor + open;
        let inner_start = start + 2;
        let Some(close) = text[inner_start..].find("]]") else {
            break;
        };
        let inner_end = inner_start + close;
        let end = inner_end + 2;

        if let Some(link) = parse_inner(&text[inner_start..inner_end], start, end) {
            links.push(link);
        }
        cursor = end;
    }

    links
}

fn parse_inner(inner: &str, start: usize, end: usize) -> Option<WikiLink> {
    let (target_part, label) = match inner.split_once('|') {
        Some((left, right)) => {
            let right = right.trim();
            (left.trim(), (!right.is_empty()).then(|| right.to_string()))
        }
        None => (inner.trim(), None),
    };

    let colon_escaped = target_part.starts_with(':');
    let target_part = target_part.trim_start_matches(':').trim();

    let (target, fragment) = match target_part.split_once('#') {
        Some((target, fragment)) => {
            let fragment = fragment.trim();
            (target.trim(), (!fragment.is_empty()).then(|| fragment.to_string()))
        }
        None => (target_part, None),
    };

    if target.is_empty() || target.contains('[') || target.contains('\n') {
        return None;
    }

    Some(WikiLink {
        target: target.to_string(),
        fragment,
        label,
        colon_escaped,
        start,
        end,
    })
}
