use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::{DirEntry, WalkDir};

use crate::app_config::PathMapping;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file, replacing it atomically
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Self::ensure_dir(parent)?;

        let mut temp = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temporary file in {:?}", parent))?;
        temp.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to file: {:?}", path))?;
        temp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write to file: {:?}", path))?;

        Ok(())
    }

    /// Size of a file in bytes
    pub fn file_size<P: AsRef<Path>>(path: P) -> Result<u64> {
        let metadata = fs::metadata(&path)
            .with_context(|| format!("Failed to stat file: {:?}", path.as_ref()))?;
        Ok(metadata.len())
    }

    /// Find files under `root` matching a glob, as sorted paths relative to `root`
    pub fn find_matching_files<P: AsRef<Path>>(root: P, pattern: &GlobPattern) -> Result<Vec<PathBuf>> {
        let root = root.as_ref();
        let walk_root = root.join(pattern.base_dir());
        let mut result = Vec::new();

        if !walk_root.exists() {
            return Ok(result);
        }

        let walker = WalkDir::new(&walk_root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .with_context(|| format!("{:?} is outside {:?}", entry.path(), root))?;

            if pattern.matches(relative) {
                result.push(relative.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Join path components with `/`, dropping `.` components
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Shell-style glob over `/`-separated relative paths
///
/// Supports `*` (within one segment), `**` (any number of segments), `?`,
/// `{a,b}` alternatives and `[...]` character classes.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: Regex,
    base_dir: PathBuf,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let normalized = pattern.trim().trim_start_matches("./").to_string();
        if normalized.is_empty() {
            return Err(anyhow!("Empty file pattern"));
        }

        let regex = Regex::new(&glob_to_regex(&normalized))
            .with_context(|| format!("Invalid file pattern: {}", pattern))?;

        Ok(Self {
            base_dir: literal_base_dir(&normalized),
            pattern: normalized,
            regex,
        })
    }

    /// Whether a path relative to the docs root matches
    pub fn matches<P: AsRef<Path>>(&self, relative: P) -> bool {
        self.regex.is_match(&to_slash_path(relative.as_ref()))
    }

    /// Longest directory prefix without wildcards
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

fn literal_base_dir(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').collect();
    segments
        .iter()
        .take(segments.len().saturating_sub(1))
        .take_while(|segment| !has_wildcard(segment))
        .fold(PathBuf::new(), |dir, segment| dir.join(segment))
}

fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut brace_depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '{' => {
                brace_depth += 1;
                out.push_str("(?:");
            }
            '}' if brace_depth > 0 => {
                brace_depth -= 1;
                out.push(')');
            }
            ',' if brace_depth > 0 => out.push('|'),
            '[' => {
                if let Some(close) = chars[i + 1..].iter().position(|c| *c == ']') {
                    let class: String = chars[i + 1..i + 1 + close].iter().collect();
                    out.push('[');
                    match class.strip_prefix('!') {
                        Some(negated) => {
                            out.push('^');
                            out.push_str(&negated.replace('\\', "\\\\"));
                        }
                        None => out.push_str(&class.replace('\\', "\\\\")),
                    }
                    out.push(']');
                    i += close + 2;
                    continue;
                }
                out.push_str("\\[");
            }
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    out.push('$');
    out
}

/// Maps source document paths to target document paths by root substitution
#[derive(Debug, Clone)]
pub struct PathMapper {
    mappings: Vec<PathMapping>,
}

impl PathMapper {
    pub fn new(mappings: Vec<PathMapping>) -> Self {
        Self { mappings }
    }

    /// `ko/x/y.md` -> `en/x/y.md`, `docs-ko/x/y.md` -> `docs/x/y.md`
    pub fn to_target<P: AsRef<Path>>(&self, source: P) -> Result<PathBuf> {
        let source = source.as_ref();
        self.mappings
            .iter()
            .find_map(|m| substitute_root(source, &m.source, &m.target))
            .ok_or_else(|| anyhow!("{} is not under a source root", source.display()))
    }

    /// Inverse of `to_target`
    pub fn to_source<P: AsRef<Path>>(&self, target: P) -> Result<PathBuf> {
        let target = target.as_ref();
        self.mappings
            .iter()
            .find_map(|m| substitute_root(target, &m.target, &m.source))
            .ok_or_else(|| anyhow!("{} is not under a target root", target.display()))
    }

    pub fn is_source_path<P: AsRef<Path>>(&self, path: P) -> bool {
        self.to_target(path).is_ok()
    }
}

impl Default for PathMapper {
    fn default() -> Self {
        Self::new(crate::app_config::Config::default().path_mappings)
    }
}

fn substitute_root(path: &Path, from: &str, to: &str) -> Option<PathBuf> {
    let mut components = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .peekable();

    match components.next()? {
        Component::Normal(first) if first == from => {}
        _ => return None,
    }

    let rest: PathBuf = components.collect();
    if rest.components().any(|c| !matches!(c, Component::Normal(_))) {
        return None;
    }

    Some(PathBuf::from(to).join(rest))
}
