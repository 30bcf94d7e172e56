//! Tool-call extraction from raw model output.
//!
//! Models emit tool calls as text wrapped in [`TOOL_CALL_START`] /
//! [`TOOL_CALL_END`]. Two block formats are understood:
//!
//! 1. JSON: `{"name": "web_search", "arguments": {"queries": ["q1"]}}` or an
//!    array of such objects.
//! 2. Call expressions: `[web_search(queries=["q1", "q2"]), done()]`.
//!
//! Parsing never fails. Anything that cannot be understood is skipped.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::types::ToolCall;

/// Marker opening a tool-call block.
pub const TOOL_CALL_START: &str = "<|tool_call_start|>";
/// Marker closing a tool-call block.
pub const TOOL_CALL_END: &str = "<|tool_call_end|>";

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"(?s){}(.*?){}",
        regex::escape(TOOL_CALL_START),
        regex::escape(TOOL_CALL_END)
    );
    Regex::new(&pattern).expect("tool call block pattern is valid")
});

static CALL_HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\(").expect("call head pattern is valid"));

static KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*(\w+)\s*=(.*)$").expect("keyword pattern is valid"));

/// Extract every tool call from `text`, in order of appearance.
pub fn parse_tool_calls(text: &str) -> Vec<ToolCall> {
    let mut calls = Vec::new();

    for captures in BLOCK_RE.captures_iter(text) {
        let block = captures.get(1).map_or("", |m| m.as_str()).trim();

        if block.starts_with('{') || block.starts_with('[') {
            let parsed = parse_json_block(block);
            if !parsed.is_empty() {
                calls.extend(parsed);
                continue;
            }
        }

        calls.extend(parse_call_expressions(block));
    }

    calls
}

/// Decode a JSON object or array of objects into tool calls.
///
/// Returns an empty list when the block is not valid JSON.
fn parse_json_block(block: &str) -> Vec<ToolCall> {
    let items = match serde_json::from_str::<Value>(block) {
        Ok(Value::Array(items)) => items,
        Ok(value @ Value::Object(_)) => vec![value],
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| {
            let Value::Object(mut object) = item else {
                return None;
            };
            let name = object.get("name")?.as_str()?.to_string();
            let arguments = match object.remove("arguments") {
                Some(Value::Object(arguments)) => arguments,
                // Some servers send arguments as an encoded JSON string.
                Some(Value::String(encoded)) => serde_json::from_str(&encoded).unwrap_or_default(),
                _ => Map::new(),
            };
            Some(ToolCall::new(name, arguments))
        })
        .collect()
}

/// Parse `name(key=value, ...)` expressions.
fn parse_call_expressions(block: &str) -> Vec<ToolCall> {
    let mut calls = Vec::new();
    let mut pos = 0;

    while let Some(captures) = CALL_HEAD_RE.captures_at(block, pos) {
        let (Some(head), Some(name)) = (captures.get(0), captures.get(1)) else {
            break;
        };
        let rest = &block[head.end()..];
        // Unterminated call: nothing after it can be trusted.
        let Some(close) = find_call_end(rest) else {
            break;
        };

        calls.push(ToolCall::new(name.as_str(), parse_parameters(&rest[..close])));
        pos = head.end() + close + 1;
    }

    calls
}

/// Index of the `)` closing a call whose arguments start at `s[0]`.
///
/// Brackets nest and quoted strings are opaque.
fn find_call_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut scanner = StringTracker::default();

    for (i, c) in s.char_indices() {
        if scanner.consume(c) {
            continue;
        }
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    None
}

/// Split on commas that sit outside brackets and strings.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut scanner = StringTracker::default();

    for (i, c) in s.char_indices() {
        if scanner.consume(c) {
            continue;
        }
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);

    parts
}

fn parse_parameters(params: &str) -> Map<String, Value> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for part in split_top_level(params) {
        if let Some(captures) = KEYWORD_RE.captures(part) {
            pairs.push((captures[1].to_string(), captures[2].to_string()));
        } else if let Some((_, value)) = pairs.last_mut() {
            // A comma inside an unquoted value: glue it back on.
            value.push(',');
            value.push_str(part);
        }
    }

    pairs
        .into_iter()
        .map(|(key, raw)| (key, parse_value(raw.trim())))
        .collect()
}

/// JSON first, then a quoted string, then the raw token.
fn parse_value(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return value;
    }

    let quoted = raw.len() >= 2
        && ((raw.starts_with('"') && raw.ends_with('"'))
            || (raw.starts_with('\'') && raw.ends_with('\'')));
    if quoted {
        return Value::String(raw[1..raw.len() - 1].to_string());
    }

    Value::String(raw.to_string())
}

/// Tracks whether a character scan is inside a string literal.
///
/// Double quotes always open a string. A single quote only opens one where a
/// value starts, so apostrophes in bare words stay literal.
#[derive(Default)]
struct StringTracker {
    quote: Option<char>,
    escaped: bool,
    last: Option<char>,
}

impl StringTracker {
    /// Feed one character; returns true when it belongs to a string literal.
    fn consume(&mut self, c: char) -> bool {
        if let Some(quote) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == quote {
                self.quote = None;
                self.last = Some(c);
            }
            return true;
        }

        let opens = c == '"'
            || (c == '\'' && matches!(self.last, None | Some('=' | ',' | '(' | '[' | '{' | ':')));
        if !c.is_whitespace() {
            self.last = Some(c);
        }
        if opens {
            self.quote = Some(c);
        }
        opens
    }
}
