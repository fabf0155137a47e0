//! Transpiler configuration types and defaults.
//!
//! This module defines the options forwarded to LibSass for one transpiler:
//! output style, numeric precision, include paths, source map settings and
//! the optional import resolver.

use crate::importer::{ImportResolver, ResolvedImport};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::os::raw::c_int;
use std::path::PathBuf;
use std::str::FromStr;

/// CSS formatting mode used by the native engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Nested blocks, closing braces on the last declaration line (default)
    #[default]
    Nested,
    /// One declaration per line, closing braces on their own line
    Expanded,
    /// One rule per line
    Compact,
    /// Minimal whitespace
    Compressed,
}

impl OutputStyle {
    /// All styles, in native enum order
    pub const ALL: [OutputStyle; 4] = [
        OutputStyle::Nested,
        OutputStyle::Expanded,
        OutputStyle::Compact,
        OutputStyle::Compressed,
    ];

    /// Parse a style name case-insensitively, falling back to `Nested`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "expanded" => OutputStyle::Expanded,
            "compact" => OutputStyle::Compact,
            "compressed" => OutputStyle::Compressed,
            _ => OutputStyle::Nested,
        }
    }

    /// Map a native enum value to a style, falling back to `Nested`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => OutputStyle::Expanded,
            2 => OutputStyle::Compact,
            3 => OutputStyle::Compressed,
            _ => OutputStyle::Nested,
        }
    }

    /// The native enum value
    pub fn code(self) -> i32 {
        match self {
            OutputStyle::Nested => 0,
            OutputStyle::Expanded => 1,
            OutputStyle::Compact => 2,
            OutputStyle::Compressed => 3,
        }
    }

    /// The lowercase style name
    pub fn as_str(self) -> &'static str {
        match self {
            OutputStyle::Nested => "nested",
            OutputStyle::Expanded => "expanded",
            OutputStyle::Compact => "compact",
            OutputStyle::Compressed => "compressed",
        }
    }
}

impl std::fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputStyle {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

/// Configuration for a transpiler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Output style (default: nested)
    #[serde(default)]
    pub output_style: OutputStyle,

    /// Precision of floating point math; `None` or `Some(0)` keeps the native default
    #[serde(default)]
    pub precision: Option<u32>,

    /// Directories searched when resolving imports
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,

    /// Input uses the indentation-significant (SASS) syntax
    #[serde(default)]
    pub sass_syntax: bool,

    /// Source map file name; enables source map generation
    #[serde(default)]
    pub source_map_filename: Option<String>,

    /// Value of the source map's `sourceRoot`
    #[serde(default)]
    pub source_map_root: Option<String>,

    /// Input path label recorded in source map metadata
    #[serde(default)]
    pub input_path: Option<String>,

    /// Output path label recorded in source map metadata
    #[serde(default)]
    pub output_path: Option<String>,

    /// Include the original sources' contents in the source map
    #[serde(default)]
    pub source_map_contents: bool,

    /// Omit the `sourceMappingURL` comment from the CSS
    #[serde(default)]
    pub omit_source_map_url: bool,

    /// Embed the source map inline as a data URI
    #[serde(default)]
    pub enable_embedded_source_map: bool,

    /// Import resolver consulted for every `@import`
    #[serde(skip)]
    pub import_resolver: Option<ImportResolver>,
}

impl Options {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the output style
    pub fn with_output_style(mut self, style: OutputStyle) -> Self {
        self.output_style = style;
        self
    }

    /// Set the numeric precision; zero keeps the native default
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Add an include path
    pub fn with_include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    /// Treat input as indentation-significant SASS syntax
    pub fn with_sass_syntax(mut self, enable: bool) -> Self {
        self.sass_syntax = enable;
        self
    }

    /// Set the source map file name
    pub fn with_source_map_filename(mut self, name: impl Into<String>) -> Self {
        self.source_map_filename = Some(name.into());
        self
    }

    /// Set the source map root
    pub fn with_source_map_root(mut self, root: impl Into<String>) -> Self {
        self.source_map_root = Some(root.into());
        self
    }

    /// Set the input path label
    pub fn with_input_path(mut self, path: impl Into<String>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the output path label
    pub fn with_output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Include source contents in the source map
    pub fn with_source_map_contents(mut self, enable: bool) -> Self {
        self.source_map_contents = enable;
        self
    }

    /// Omit the source map URL comment
    pub fn with_omit_source_map_url(mut self, omit: bool) -> Self {
        self.omit_source_map_url = omit;
        self
    }

    /// Embed the source map in the CSS
    pub fn with_embedded_source_map(mut self, enable: bool) -> Self {
        self.enable_embedded_source_map = enable;
        self
    }

    /// Install an import resolver.
    ///
    /// The resolver receives the import path as written and the path of the
    /// importing file. Returning `Ok(None)` or an error falls back to the
    /// native file loader.
    pub fn with_import_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str, &str) -> anyhow::Result<Option<ResolvedImport>> + Send + Sync + 'static,
    {
        self.import_resolver = Some(ImportResolver::new(resolver));
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let strings = [
            ("source_map_filename", &self.source_map_filename),
            ("source_map_root", &self.source_map_root),
            ("input_path", &self.input_path),
            ("output_path", &self.output_path),
        ];
        for (field, value) in strings {
            if value.as_deref().is_some_and(|v| v.contains('\0')) {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    reason: "must not contain NUL bytes".into(),
                });
            }
        }

        if let Some(precision) = self.precision {
            if c_int::try_from(precision).is_err() {
                return Err(ConfigError::InvalidValue {
                    field: "precision".into(),
                    reason: format!("must be at most {}", c_int::MAX),
                });
            }
        }

        self.joined_include_paths()?;

        if self.enable_embedded_source_map && self.omit_source_map_url {
            return Err(ConfigError::InvalidCombination {
                reason: "an embedded source map is carried by the source map URL comment, \
                         which omit_source_map_url removes"
                    .into(),
            });
        }

        Ok(())
    }

    /// Include paths joined with the platform path-list separator.
    ///
    /// Returns `None` when no include paths are configured.
    pub fn joined_include_paths(&self) -> Result<Option<String>, ConfigError> {
        if self.include_paths.is_empty() {
            return Ok(None);
        }

        let joined =
            std::env::join_paths(&self.include_paths).map_err(|e| ConfigError::InvalidValue {
                field: "include_paths".into(),
                reason: e.to_string(),
            })?;

        let joined = joined
            .into_string()
            .map_err(|_| ConfigError::InvalidValue {
                field: "include_paths".into(),
                reason: "must be valid UTF-8".into(),
            })?;

        if joined.contains('\0') {
            return Err(ConfigError::InvalidValue {
                field: "include_paths".into(),
                reason: "must not contain NUL bytes".into(),
            });
        }

        Ok(Some(joined))
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The field name
        field: String,
        /// The reason it's invalid
        reason: String,
    },

    /// Options that cannot be used together
    #[error("Invalid configuration: {reason}")]
    InvalidCombination {
        /// Why the combination is rejected
        reason: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
