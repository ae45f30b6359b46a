/*!
 * Relative link validation for translated documents.
 *
 * Every `[text](./path)` or `[text](../path)` link outside fenced code must
 * point at an existing file once its fragment and query are removed.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::translation::classifier::is_fence_line;

/// Regex for markdown links, capturing the target
static LINK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[[^\]]*\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).expect("Invalid link regex")
});

/// Link validator
pub struct LinkValidator;

impl LinkValidator {
    /// Relative link targets in document order, fenced code excluded
    pub fn relative_links(content: &str) -> Vec<String> {
        let mut in_fence = false;
        let mut links = Vec::new();

        for line in content.lines() {
            if is_fence_line(line) {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }

            links.extend(
                LINK_REGEX
                    .captures_iter(line)
                    .map(|caps| caps[1].to_string())
                    .filter(|url| url.starts_with("./") || url.starts_with("../")),
            );
        }

        links
    }

    /// Link path without `#fragment` and `?query`
    pub fn strip_fragment(url: &str) -> &str {
        let end = url.find(['#', '?']).unwrap_or(url.len());
        &url[..end]
    }

    /// Relative links of `content` that do not resolve from `document_dir`
    pub fn broken_links(content: &str, document_dir: &Path) -> Vec<String> {
        Self::relative_links(content)
            .into_iter()
            .filter(|url| !Self::resolves(document_dir, Self::strip_fragment(url)))
            .collect()
    }

    fn resolves(document_dir: &Path, link: &str) -> bool {
        let target = document_dir.join(link);
        if target.exists() {
            return true;
        }
        // Docusaurus resolves extensionless links to markdown pages
        target.extension().is_none() && target.with_extension("md").is_file()
    }
}
