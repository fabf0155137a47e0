//! Transpilation results.

use serde::Serialize;

/// The result of a successful transpilation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranspileOutput {
    /// Generated CSS
    pub css: String,

    /// Source map file name, when one was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map_filename: Option<String>,

    /// Source map JSON, when one was generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map_content: Option<String>,
}

impl TranspileOutput {
    /// Build an output from the strings read back from the native context.
    /// Empty strings are treated as absent.
    pub fn from_native(
        css: Option<String>,
        source_map_filename: Option<String>,
        source_map_content: Option<String>,
    ) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        Self {
            css: css.unwrap_or_default(),
            source_map_filename: present(source_map_filename),
            source_map_content: present(source_map_content),
        }
    }

    /// Whether a source map was produced
    pub fn has_source_map(&self) -> bool {
        self.source_map_content.is_some()
    }
}
