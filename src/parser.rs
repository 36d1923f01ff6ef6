use crate::error::{AnalyzerError, Result};
use crate::types::Suggestions;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<hash>#+\s*)?[*_]*\s*(?P<name>summary|improvements)\s*[*_]*\s*(?P<colon>:)?\s*[*_]*\s*(?P<rest>.*)$",
    )
    .expect("static regex")
});

static ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(?P<text>.*)$").expect("static regex"));

static OTHER_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#+\s").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Improvements,
}

/// Extracts a summary and improvement list from a completion.
///
/// Accepts a JSON object anywhere in the text first, then the
/// `SUMMARY:` / `IMPROVEMENTS:` layout. Anything else is a [`AnalyzerError::Parse`].
pub fn parse_suggestions(text: &str) -> Result<Suggestions> {
    if let Some(suggestions) = parse_json(text) {
        debug!("Parsed completion as JSON");
        return Ok(suggestions);
    }
    if let Some(suggestions) = parse_delimited(text) {
        debug!("Parsed completion by headings");
        return Ok(suggestions);
    }
    Err(AnalyzerError::Parse(
        "completion has neither a JSON object nor SUMMARY/IMPROVEMENTS headings".to_string(),
    ))
}

/// Like [`parse_suggestions`] but never fails: unrecognised output becomes
/// the summary verbatim with no improvements.
pub fn parse_or_fallback(text: &str) -> Suggestions {
    parse_suggestions(text).unwrap_or_else(|e| {
        warn!("Falling back to raw completion: {}", e);
        Suggestions {
            summary: text.to_string(),
            improvements: Vec::new(),
        }
    })
}

fn parse_json(text: &str) -> Option<Suggestions> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: Value = serde_json::from_str(&text[start..=end]).ok()?;

    let summary = [
        &value["summary"],
        &value["project_overview"]["detailed_description"],
        &value["project_overview"]["elevator_pitch"],
    ]
    .into_iter()
    .filter_map(Value::as_str)
    .map(str::trim)
    .find(|s| !s.is_empty())?
    .to_string();

    let improvements = [&value["improvements"], &value["contribution_guide"]["suggested_roadmap"]]
        .into_iter()
        .filter_map(Value::as_array)
        .map(|items| items.iter().filter_map(json_item).collect::<Vec<_>>())
        .find(|items| !items.is_empty())
        .unwrap_or_default();

    Some(Suggestions { summary, improvements })
}

fn json_item(item: &Value) -> Option<String> {
    let text = match item {
        Value::String(s) => s.trim().to_string(),
        Value::Object(map) => {
            let field = |key: &str| map.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty());
            match (field("title"), field("description")) {
                (Some(title), Some(description)) => format!("{}: {}", title, description),
                (Some(only), None) | (None, Some(only)) => only.to_string(),
                (None, None) => return None,
            }
        }
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn heading(line: &str) -> Option<(Section, &str)> {
    let caps = HEADING.captures(line)?;
    let rest = caps.name("rest").map_or("", |m| m.as_str()).trim();
    let has_colon = caps.name("colon").is_some();
    let has_hash = caps.name("hash").is_some();
    if !has_colon && !(has_hash && rest.is_empty()) {
        return None;
    }

    let section = if caps["name"].eq_ignore_ascii_case("summary") {
        Section::Summary
    } else {
        Section::Improvements
    };
    Some((section, rest))
}

fn parse_delimited(text: &str) -> Option<Suggestions> {
    let mut section = None;
    let mut summary_lines: Vec<&str> = Vec::new();
    let mut improvements: Vec<String> = Vec::new();
    let mut saw_summary = false;
    let mut saw_improvements = false;

    for line in text.lines() {
        if let Some((found, rest)) = heading(line) {
            match found {
                Section::Summary if !saw_summary => saw_summary = true,
                Section::Improvements if saw_summary && !saw_improvements => saw_improvements = true,
                _ => continue,
            }
            section = Some(found);
            if !rest.is_empty() {
                match found {
                    Section::Summary => summary_lines.push(rest),
                    Section::Improvements => push_item_line(&mut improvements, rest),
                }
            }
            continue;
        }

        match section {
            Some(Section::Summary) => {
                let line = line.trim();
                if !line.is_empty() {
                    summary_lines.push(line);
                }
            }
            Some(Section::Improvements) => {
                if OTHER_HEADING.is_match(line) {
                    section = None;
                } else {
                    push_item_line(&mut improvements, line);
                }
            }
            None => {}
        }
    }

    let summary = summary_lines.join(" ");
    if !saw_improvements || summary.is_empty() {
        return None;
    }
    Some(Suggestions { summary, improvements })
}

fn push_item_line(items: &mut Vec<String>, line: &str) {
    if let Some(caps) = ITEM.captures(line) {
        let text = caps["text"].trim();
        if !text.is_empty() {
            items.push(text.to_string());
        }
        return;
    }

    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match items.last_mut() {
        Some(last) => {
            last.push(' ');
            last.push_str(line);
        }
        None => items.push(line.to_string()),
    }
}
