//! # LibSass Bridge
//!
//! This library compiles SCSS and indented-syntax Sass to CSS with LibSass,
//! and lets the host answer `@import`s through a Rust resolver.
//!
//! ## Architecture
//!
//! ```text
//! Transpiler::transpile
//!     │
//!     │ one Session per call
//!     ▼
//! LibSass data context + compiler
//!     │
//!     │ importer callback (cookie = Handle)
//!     ▼
//! ImporterRegistry ──► ImportResolver
//! ```
//!
//! ## Features
//!
//! - **Import Resolvers**: Supply import bodies or redirect paths from Rust
//! - **Parallel Sessions**: Each call owns its native context; resolvers never cross
//! - **Structured Errors**: Native errors decoded into file, line, column and message
//! - **Indented Syntax**: `.sass` input converted before compilation
//!
//! ## Example
//!
//! ```no_run
//! use libsass_bridge::{Options, OutputStyle, ResolvedImport, Transpiler};
//!
//! let options = Options::new()
//!     .with_output_style(OutputStyle::Compressed)
//!     .with_import_resolver(|url, _prev| {
//!         Ok(Some(ResolvedImport::path(url).with_body("$white: #fff;")))
//!     });
//!
//! let transpiler = Transpiler::new(options)?;
//! let output = transpiler.transpile("@import \"colors\"; div { color: $white; }")?;
//! assert_eq!(output.css, "div{color:#fff}\n");
//! # Ok::<(), libsass_bridge::TranspileError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod importer;
pub mod metrics;
pub mod output;

// Re-export commonly used types
pub use config::{ConfigError, Options, OutputStyle};
pub use dialect::{libsass_version, sass2scss_version, sass_to_scss};
pub use engine::{Session, SessionState, Transpiler};
pub use error::{ErrorCode, SassError, TranspileError};
pub use importer::{ImportResolver, ImporterRegistry, ResolvedImport};
pub use metrics::TranspileStats;
pub use output::TranspileOutput;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install a `tracing` subscriber filtered by `RUST_LOG`, defaulting to debug
/// output for this crate. Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "libsass_bridge=debug".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
