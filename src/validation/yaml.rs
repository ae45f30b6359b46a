/*!
 * Structural check of fenced YAML blocks.
 *
 * Not a YAML parser: a line inside a ```` ```yaml ```` block is suspicious when
 * it is not blank, not a comment, has no colon and starts with neither a space
 * nor a list dash. Translations that merge or split lines produce exactly that.
 */

use crate::translation::classifier::{classify, ClassifierState, LineClass};

/// A YAML block with at least one suspicious line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedBlock {
    /// 1-based index of the YAML block in the document
    pub block: usize,
    /// 1-based line number of the first suspicious line
    pub line: usize,
}

/// YAML block validator
pub struct YamlBlockValidator;

impl YamlBlockValidator {
    fn is_suspicious(line: &str) -> bool {
        let trimmed = line.trim();
        !trimmed.is_empty()
            && !trimmed.starts_with('#')
            && !line.contains(':')
            && !line.starts_with(' ')
            && !line.starts_with('-')
    }

    /// Find malformed YAML blocks, reporting each block once
    pub fn malformed_blocks(content: &str) -> Vec<MalformedBlock> {
        let mut state = ClassifierState::default();
        let mut block = 0;
        let mut reported_block = 0;
        let mut found = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let (class, next) = classify(line, state);

            if class == LineClass::CodeFenceBoundary && next.in_yaml && !state.in_yaml {
                block += 1;
            } else if state.in_yaml && next.in_yaml && reported_block != block && Self::is_suspicious(line) {
                reported_block = block;
                found.push(MalformedBlock { block, line: index + 1 });
            }

            state = next;
        }

        found
    }
}
