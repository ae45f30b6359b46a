/*!
 * Post-processing for translated markdown.
 *
 * Repairs the defects hosted models are known to introduce: wrong brand-name
 * casing, mangled bold list items, over-escaped quotes and lower-cased H1
 * headings. Fenced code is never touched and every rule is idempotent.
 */

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use super::classifier::is_fence_line;

/// `*** Text **` at line start
static MANGLED_BOLD_ITEM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)\*\*\* ([^*\n]+?) \*\*").expect("Invalid bold item regex"));

/// Bare `*** ` at line start, left over after the rule above
static BARE_TRIPLE_STAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)\*\*\* ").expect("Invalid triple star regex"));

/// Any run of backslashes in front of a quote
static ESCAPED_QUOTE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\\+(["'])"#).expect("Invalid escaped quote regex"));

/// Rule-based fixer applied after every successful translation
#[derive(Debug, Clone)]
pub struct PostProcessor {
    brands: Vec<(Regex, String)>,
}

impl PostProcessor {
    pub fn new(brand_names: &[String]) -> Self {
        let brands = brand_names
            .iter()
            .filter(|name| !name.trim().is_empty())
            .filter_map(|name| {
                match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name.trim()))) {
                    Ok(regex) => Some((regex, name.trim().to_string())),
                    Err(e) => {
                        warn!("Ignoring brand name {:?}: {}", name, e);
                        None
                    }
                }
            })
            .collect();

        Self { brands }
    }

    /// Fix `translated`; `source` decides whether the H1 is capitalized
    pub fn apply(&self, source: &str, translated: &str) -> String {
        let capitalize_heading = source.starts_with("# ");
        let mut heading_done = false;
        let mut in_fence = false;

        let lines: Vec<String> = translated
            .split('\n')
            .map(|line| {
                if is_fence_line(line) {
                    in_fence = !in_fence;
                    return line.to_string();
                }
                if in_fence {
                    return line.to_string();
                }

                let mut fixed = self.fix_line(line);
                if capitalize_heading && !heading_done && fixed.starts_with("# ") {
                    fixed = capitalize_after_marker(&fixed);
                    heading_done = true;
                }
                fixed
            })
            .collect();

        lines.join("\n")
    }

    fn fix_line(&self, line: &str) -> String {
        let mut result = line.to_string();

        for (regex, canonical) in &self.brands {
            result = regex.replace_all(&result, canonical.as_str()).into_owned();
        }

        result = MANGLED_BOLD_ITEM_REGEX.replace(&result, "${1}* **${2}**").into_owned();
        result = BARE_TRIPLE_STAR_REGEX.replace(&result, "${1}* **").into_owned();
        result = ESCAPED_QUOTE_REGEX.replace_all(&result, "$1").into_owned();

        result
    }
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new(&["SowonFlow".to_string()])
    }
}

fn capitalize_after_marker(heading: &str) -> String {
    let text = &heading[2..];
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => {
            format!("# {}{}", first.to_uppercase(), chars.as_str())
        }
        _ => heading.to_string(),
    }
}
