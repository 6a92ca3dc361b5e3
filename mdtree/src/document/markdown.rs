// Title/description heuristic: the leading `# heading` is the title and the
// first paragraph after it is the description. Both are views into the body;
// the rewrite helpers edit those same lines in place.

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

fn heading_regex() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| Regex::new(r"^#[ \t]+(.+?)[ \t]*$").expect("valid heading regex"))
}

/// Where the title and description sit in a markdown body, by line index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    pub title: Option<(usize, String)>,
    pub description: Option<(Range<usize>, String)>,
}

impl Outline {
    pub fn parse(body: &str) -> Self {
        let lines: Vec<&str> = body.lines().collect();
        let mut outline = Outline::default();
        let mut idx = 0;

        while idx < lines.len() && lines[idx].trim().is_empty() {
            idx += 1;
        }
        if let Some(caps) = lines.get(idx).and_then(|l| heading_regex().captures(l)) {
            outline.title = Some((idx, caps[1].to_string()));
            idx += 1;
        }

        while idx < lines.len() {
            let line = lines[idx].trim();
            if line.is_empty() || line.starts_with('#') {
                idx += 1;
                continue;
            }
            let start = idx;
            while idx < lines.len() {
                let line = lines[idx].trim();
                if line.is_empty() || line.starts_with('#') {
                    break;
                }
                idx += 1;
            }
            let text = lines[start..idx]
                .iter()
                .map(|l| l.trim())
                .collect::<Vec<_>>()
                .join(" ");
            outline.description = Some((start..idx, text));
            break;
        }

        outline
    }

    pub fn title_text(&self) -> String {
        self.title.as_ref().map(|(_, t)| t.clone()).unwrap_or_default()
    }

    pub fn description_text(&self) -> String {
        self.description
            .as_ref()
            .map(|(_, d)| d.clone())
            .unwrap_or_default()
    }
}

/// Replace the leading heading, insert one when absent, or drop it for an empty title.
pub fn replace_title(body: &str, title: &str) -> String {
    let outline = Outline::parse(body);
    let mut lines = owned_lines(body);
    match (outline.title, title.is_empty()) {
        (Some((idx, _)), false) => lines[idx] = format!("# {title}"),
        (Some((idx, _)), true) => {
            lines.remove(idx);
            if lines.get(idx).map(|l| l.trim().is_empty()).unwrap_or(false) {
                lines.remove(idx);
            }
        }
        (None, false) => {
            lines.insert(0, format!("# {title}"));
            if lines.len() > 1 {
                lines.insert(1, String::new());
            }
        }
        (None, true) => return body.to_string(),
    }
    rejoin(body, lines)
}

/// Replace the first paragraph, insert one after the title when absent, or
/// drop it for an empty description.
pub fn replace_description(body: &str, description: &str) -> String {
    let outline = Outline::parse(body);
    let mut lines = owned_lines(body);
    match (outline.description, description.is_empty()) {
        (Some((range, _)), false) => {
            lines.splice(range, [description.to_string()]);
        }
        (Some((range, _)), true) => {
            let start = range.start;
            lines.drain(range);
            if lines.get(start).map(|l| l.trim().is_empty()).unwrap_or(false) {
                lines.remove(start);
            }
        }
        (None, false) => {
            let at = outline.title.map(|(idx, _)| idx + 1).unwrap_or(0);
            let mut inserted = vec![description.to_string()];
            if at > 0 {
                inserted.insert(0, String::new());
            }
            if at < lines.len() {
                inserted.push(String::new());
            }
            lines.splice(at..at, inserted);
        }
        (None, true) => return body.to_string(),
    }
    rejoin(body, lines)
}

fn owned_lines(body: &str) -> Vec<String> {
    body.lines().map(str::to_string).collect()
}

fn rejoin(original: &str, lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    if original.ends_with('\n') || original.is_empty() {
        out.push('\n');
    }
    out
}
