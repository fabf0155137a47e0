//! Transpiler engine.
//!
//! This module provides the [`Transpiler`], which validates options once and
//! runs every call in its own [`Session`] against a fresh LibSass context.

pub(crate) mod native;
pub mod session;

use crate::config::Options;
use crate::error::Result;
use crate::importer::ImporterRegistry;
use crate::metrics::{MetricsCollector, TranspileStats, TranspileTimer};
use crate::output::TranspileOutput;
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub use session::{Session, SessionState};

/// SCSS/Sass to CSS transpiler
pub struct Transpiler {
    /// Transpiler options
    options: Options,
    /// Metrics collector
    metrics: Arc<MetricsCollector>,
}

impl Transpiler {
    /// Create a new transpiler
    pub fn new(options: Options) -> Result<Self> {
        options.validate()?;

        info!(
            output_style = %options.output_style,
            include_paths = options.include_paths.len(),
            sass_syntax = options.sass_syntax,
            import_resolver = options.import_resolver.is_some(),
            "Initializing transpiler"
        );

        Ok(Self {
            options,
            metrics: Arc::new(MetricsCollector::new()),
        })
    }

    /// Transpile `source` to CSS
    #[instrument(
        skip(self, source),
        fields(source_len = source.len(), style = %self.options.output_style)
    )]
    pub fn transpile(&self, source: &str) -> Result<TranspileOutput> {
        let timer = TranspileTimer::start(source.len());

        let mut import_calls = 0;
        let result = Session::new(source, &self.options).and_then(|mut session| {
            let output = session.execute();
            import_calls = session.import_calls();
            output
        });

        match &result {
            Ok(output) => {
                debug!(css_len = output.css.len(), import_calls, "Transpiled");
                let metrics = timer.into_metrics(output.css.len(), import_calls, true);
                self.metrics.record_transpile(&metrics);
            }
            Err(e) => {
                debug!(error = %e, "Transpile failed");
                let metrics = timer.into_metrics(0, import_calls, false);
                self.metrics.record_transpile(&metrics);
                self.metrics.record_error(e.code());
            }
        }

        result
    }

    /// Read all of `src`, transpile it and write the CSS to `dst`.
    ///
    /// Nothing is written when transpilation fails.
    pub fn transpile_to<W: Write, R: Read>(
        &self,
        mut dst: W,
        mut src: R,
    ) -> Result<TranspileOutput> {
        let mut source = String::new();
        src.read_to_string(&mut source)?;

        let output = self.transpile(&source)?;
        dst.write_all(output.css.as_bytes())?;
        dst.flush()?;
        Ok(output)
    }

    /// The options this transpiler was created with
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Get transpiler statistics
    pub fn stats(&self) -> TranspileStats {
        TranspileStats {
            total_transpiles: self.metrics.total_transpiles(),
            successful_transpiles: self.metrics.successful_transpiles(),
            failed_transpiles: self.metrics.failed_transpiles(),
            avg_duration_us: self.metrics.avg_duration_us(),
            import_calls: self.metrics.import_calls(),
            registered_resolvers: ImporterRegistry::global().len(),
        }
    }

    /// Get Prometheus metrics
    pub fn prometheus_metrics(&self) -> String {
        self.metrics.to_prometheus()
    }
}
