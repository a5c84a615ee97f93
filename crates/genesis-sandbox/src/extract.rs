//! Fenced code block extraction from LLM responses.
//!
//! Recognizes ```` ```python ````, ```` ```py ````, ```` ```javascript ````,
//! ```` ```js ````, ```` ```code ````, and bare ```` ``` ```` fences.
//! Untagged and `code`-tagged blocks default to Python. At most three
//! blocks are taken and oversized blocks are skipped.

use serde::{Deserialize, Serialize};

/// Maximum blocks executed per response.
pub const MAX_BLOCKS_PER_RESPONSE: usize = 3;

/// Maximum characters per block.
pub const MAX_CODE_LENGTH: usize = 5000;

/// Language of an extracted block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// Executed by the Python harness.
    Python,
    /// Executed by the Node harness.
    Javascript,
}

impl Language {
    /// Display name used in events and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Javascript => "javascript",
        }
    }
}

/// One extracted code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// The code inside the fence, trimmed.
    pub code: String,
    /// The language determined from the fence tag.
    pub language: Language,
}

/// Map a fence tag to a language. Unknown or empty tags mean Python.
fn language_for_tag(tag: &str) -> Language {
    match tag.to_ascii_lowercase().as_str() {
        "javascript" | "js" => Language::Javascript,
        _ => Language::Python,
    }
}

/// Extract up to [`MAX_BLOCKS_PER_RESPONSE`] fenced code blocks.
///
/// Blocks longer than [`MAX_CODE_LENGTH`] characters and empty blocks
/// are skipped rather than truncated: oversized code is more likely a
/// runaway generation than a program.
pub fn extract_code_blocks(response: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut rest = response;

    while blocks.len() < MAX_BLOCKS_PER_RESPONSE {
        let Some(open) = rest.find("```") else {
            break;
        };
        let after_open = &rest[open + 3..];

        // The fence tag runs to the end of the opening line.
        let Some(tag_end) = after_open.find('\n') else {
            break;
        };
        let tag = after_open[..tag_end].trim();
        let body_start = &after_open[tag_end + 1..];

        let Some(close) = body_start.find("```") else {
            break;
        };
        let code = body_start[..close].trim();

        if !code.is_empty() && code.len() <= MAX_CODE_LENGTH {
            blocks.push(CodeBlock {
                code: code.to_owned(),
                language: language_for_tag(tag),
            });
        }

        rest = &body_start[close + 3..];
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tagged_blocks() {
        let response = "Here:\n```python\nworld.say('hi')\n```\nand\n```js\nworld.move(1, 2)\n```";
        let blocks = extract_code_blocks(response);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks.first().map(|b| b.language), Some(Language::Python));
        assert_eq!(blocks.get(1).map(|b| b.language), Some(Language::Javascript));
    }

    #[test]
    fn untagged_defaults_to_python() {
        let blocks = extract_code_blocks("```\nworld.say('x')\n```");
        assert_eq!(blocks.first().map(|b| b.language), Some(Language::Python));
    }

    #[test]
    fn caps_block_count() {
        let response = "```\na\n```\n```\nb\n```\n```\nc\n```\n```\nd\n```";
        assert_eq!(extract_code_blocks(response).len(), MAX_BLOCKS_PER_RESPONSE);
    }

    #[test]
    fn skips_oversized_and_empty_blocks() {
        let big = "x".repeat(MAX_CODE_LENGTH + 1);
        let response = format!("```python\n{big}\n```\n```python\n\n```\n```python\nok\n```");
        let blocks = extract_code_blocks(&response);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks.first().map(|b| b.code.as_str()), Some("ok"));
    }

    #[test]
    fn no_fences_no_blocks() {
        assert!(extract_code_blocks("just prose, no code").is_empty());
    }
}
