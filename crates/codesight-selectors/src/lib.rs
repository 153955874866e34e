//! Exclusion rules for codesight snapshots.
//!
//! Patterns use gitignore semantics: later rules override earlier ones, `!`
//! re-includes, a trailing `/` matches directories only and a leading `/`
//! anchors the pattern at the project root. The final rule set is assembled
//! in a fixed order (see [`exclusion_patterns`]) and compiled once into an
//! [`ExclusionRules`] matcher that is shared read-only by discovery workers.

mod patterns;
mod rules;

pub use patterns::{
    STANDARD_EXCLUDES, STRUCTURAL_EXCLUDES, TEST_EXCLUDES, exclusion_patterns,
    self_reference_patterns,
};
pub use rules::{ExclusionRules, read_gitignore};

use serde::{Deserialize, Serialize};

/// File selection settings, as found in the `[selectors]` config section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Extra gitignore-style patterns to exclude
    pub exclude: Vec<String>,
    /// Keep test files and test directories
    pub include_tests: bool,
    /// Keep build manifests, packaging files and package markers
    pub include_structural: bool,
    /// Keep the `.codesight/` directory itself (its prompts, config and cache
    /// stay excluded)
    pub dogfood: bool,
}
