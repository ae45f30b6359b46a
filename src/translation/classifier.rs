/*!
 * Line and block classifier for markdown documents.
 *
 * Decides per line what may be sent to a translation backend. The whole state
 * is two flags (inside a fenced code block, inside a fenced YAML block), so a
 * line's class depends only on the line itself and those flags.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::language_utils::contains_hangul;

/// Values made only of these characters are identifiers or paths
static PATH_LIKE_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_./:@~#?=&%+\-]*$").expect("Invalid identifier regex"));

/// `- ` list marker plus indentation of a YAML continuation line
static YAML_LINE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*(?:-\s+)?)(.*)$").expect("Invalid YAML prefix regex"));

/// Characters that change meaning at the start of a plain YAML scalar
const YAML_INDICATORS: &[char] = &[
    '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`',
];

/// Block flags carried from one line to the next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierState {
    pub in_code: bool,
    pub in_yaml: bool,
}

/// How a YAML value was quoted in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteStyle {
    Double,
    Single,
    /// Block scalar indicator as written, e.g. `|`, `>-`, including the space after it
    Literal(String),
    Plain,
}

/// A `key: value` line inside a YAML block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlValue {
    /// Everything before the first colon, indentation included
    pub key: String,
    /// Whitespace between the colon and the value
    pub separator: String,
    pub style: QuoteStyle,
    /// Value without its quotes
    pub value: String,
    /// Whitespace and any inline `# comment` after the value
    pub trailing: String,
}

impl YamlValue {
    fn parse(line: &str) -> Option<Self> {
        let colon = line.find(':')?;
        let key = &line[..colon];
        let remainder = &line[colon + 1..];

        let body = remainder.trim_start();
        let separator = &remainder[..remainder.len() - body.len()];
        let scalar = match comment_start(body, !separator.is_empty()) {
            Some(index) => &body[..index],
            None => body,
        };
        let value = scalar.trim_end();
        let trailing = &body[value.len()..];

        let (style, inner) = split_quotes(value);

        Some(Self {
            key: key.to_string(),
            separator: separator.to_string(),
            style,
            value: inner.to_string(),
            trailing: trailing.to_string(),
        })
    }

    /// Whether the value holds Korean prose worth sending to a backend
    pub fn is_translatable(&self) -> bool {
        contains_hangul(&self.value) && !PATH_LIKE_VALUE.is_match(&self.value)
    }

    /// Rebuild the line with `translated` in place of the value, same quoting
    pub fn render(&self, translated: &str) -> String {
        let cleaned = strip_added_quotes(translated.trim());

        let value = match &self.style {
            QuoteStyle::Double => format!("\"{}\"", escape_double(cleaned)),
            QuoteStyle::Single => format!("'{}'", cleaned.replace('\'', "''")),
            QuoteStyle::Literal(indicator) => format!("{}{}", indicator, cleaned),
            QuoteStyle::Plain if needs_quoting(cleaned) => format!("\"{}\"", escape_double(cleaned)),
            QuoteStyle::Plain => cleaned.to_string(),
        };

        format!("{}:{}{}{}", self.key, self.separator, value, self.trailing)
    }

    /// The line exactly as it was read
    pub fn original(&self) -> String {
        let value = match &self.style {
            QuoteStyle::Double => format!("\"{}\"", self.value),
            QuoteStyle::Single => format!("'{}'", self.value),
            QuoteStyle::Literal(indicator) => format!("{}{}", indicator, self.value),
            QuoteStyle::Plain => self.value.clone(),
        };
        format!("{}:{}{}{}", self.key, self.separator, value, self.trailing)
    }
}

/// Byte offset of an inline comment in a value, ignoring `#` inside quotes
///
/// A `#` starts a comment only after whitespace; `blank_before` tells whether
/// the value itself follows whitespace.
fn comment_start(body: &str, blank_before: bool) -> Option<usize> {
    let scan_from = match body.chars().next() {
        Some('"') => closing_double_quote(body)? + 1,
        Some('\'') => closing_single_quote(body)? + 1,
        _ => 0,
    };

    let mut previous_blank = if scan_from == 0 {
        blank_before
    } else {
        false
    };
    for (offset, c) in body[scan_from..].char_indices() {
        if c == '#' && previous_blank {
            return Some(scan_from + offset);
        }
        previous_blank = c.is_whitespace();
    }
    None
}

fn closing_double_quote(body: &str) -> Option<usize> {
    let mut escaped = false;
    for (index, c) in body.char_indices().skip(1) {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(index),
            _ => escaped = false,
        }
    }
    None
}

fn closing_single_quote(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut index = 1;
    while index < bytes.len() {
        if bytes[index] == b'\'' {
            // '' is an escaped quote
            if bytes.get(index + 1) == Some(&b'\'') {
                index += 2;
                continue;
            }
            return Some(index);
        }
        index += 1;
    }
    None
}

fn split_quotes(value: &str) -> (QuoteStyle, &str) {
    for (quote, style) in [('"', QuoteStyle::Double), ('\'', QuoteStyle::Single)] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return (style, &value[1..value.len() - 1]);
        }
    }

    if value.starts_with(['|', '>']) {
        let indicator_len = value
            .find(|c: char| !matches!(c, '|' | '>' | '-' | '+' | '0'..='9'))
            .unwrap_or(value.len());
        let rest = value[indicator_len..].trim_start();
        let indicator = &value[..value.len() - rest.len()];
        return (QuoteStyle::Literal(indicator.to_string()), rest);
    }

    (QuoteStyle::Plain, value)
}

fn strip_added_quotes(text: &str) -> &str {
    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”')] {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            return &text[open.len_utf8()..text.len() - close.len_utf8()];
        }
    }
    text
}

fn escape_double(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn needs_quoting(value: &str) -> bool {
    value.contains(": ")
        || value.contains(" #")
        || value.ends_with(':')
        || value.starts_with(YAML_INDICATORS)
}

/// Classification of one markdown line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Korean prose outside code and YAML; `trailing` keeps hard breaks and `\r`
    Prose { indent: String, text: String, trailing: String },
    /// `key: value` inside a YAML block
    YamlKeyValue(YamlValue),
    /// Korean continuation text inside a YAML block, after indentation and list marker
    YamlMultilineScalar { prefix: String, text: String, trailing: String },
    /// Three backticks, opening or closing a block
    CodeFenceBoundary,
    /// Copied to the output unchanged
    PassThrough,
}

impl LineClass {
    /// Whether a backend has to be called for this line
    pub fn is_translatable(&self) -> bool {
        match self {
            Self::Prose { .. } | Self::YamlMultilineScalar { .. } => true,
            Self::YamlKeyValue(value) => value.is_translatable(),
            Self::CodeFenceBoundary | Self::PassThrough => false,
        }
    }
}

pub fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Number of fence lines in a document
pub fn count_fence_lines(text: &str) -> usize {
    text.lines().filter(|line| is_fence_line(line)).count()
}

/// Classify one line given the flags left by the previous line
pub fn classify(line: &str, state: ClassifierState) -> (LineClass, ClassifierState) {
    let trimmed = line.trim_start();

    if trimmed.starts_with("```") {
        let next = if state.in_code {
            ClassifierState { in_code: false, ..state }
        } else if state.in_yaml {
            ClassifierState { in_yaml: false, ..state }
        } else if trimmed[3..].to_lowercase().contains("yaml") {
            ClassifierState { in_yaml: true, ..state }
        } else {
            ClassifierState { in_code: true, ..state }
        };
        return (LineClass::CodeFenceBoundary, next);
    }

    if state.in_code {
        return (LineClass::PassThrough, state);
    }

    if state.in_yaml {
        return (classify_yaml(line, trimmed), state);
    }

    (classify_markdown(line, trimmed), state)
}

fn classify_yaml(line: &str, trimmed: &str) -> LineClass {
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return LineClass::PassThrough;
    }

    if line.contains(':') {
        return YamlValue::parse(line)
            .map(LineClass::YamlKeyValue)
            .unwrap_or(LineClass::PassThrough);
    }

    if contains_hangul(line) {
        if let Some(caps) = YAML_LINE_PREFIX.captures(line) {
            let (text, trailing) = split_trailing(&caps[2]);
            return LineClass::YamlMultilineScalar {
                prefix: caps[1].to_string(),
                text: text.to_string(),
                trailing: trailing.to_string(),
            };
        }
    }

    LineClass::PassThrough
}

fn classify_markdown(line: &str, trimmed: &str) -> LineClass {
    let passes_through = trimmed.is_empty()
        || trimmed.starts_with("---")
        || trimmed.starts_with("http")
        || trimmed.starts_with("![")
        || line.contains("](");

    if passes_through || !contains_hangul(line) {
        return LineClass::PassThrough;
    }

    let indent = &line[..line.len() - trimmed.len()];
    let (text, trailing) = split_trailing(trimmed);
    LineClass::Prose {
        indent: indent.to_string(),
        text: text.to_string(),
        trailing: trailing.to_string(),
    }
}

fn split_trailing(text: &str) -> (&str, &str) {
    let content = text.trim_end();
    (content, &text[content.len()..])
}

/// Classify every line of a document in order
pub fn classify_document(text: &str) -> Vec<(String, LineClass)> {
    let mut state = ClassifierState::default();
    text.split('\n')
        .map(|line| {
            let (class, next) = classify(line, state);
            state = next;
            (line.to_string(), class)
        })
        .collect()
}
