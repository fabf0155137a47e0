//! One compilation session.
//!
//! A session owns the native data context for a single source and, when the
//! caller supplied a resolver, the registration that routes import callbacks
//! to it. Fields drop in declaration order, so the context (and with it every
//! path by which LibSass could call back) is gone before the handle is
//! released for reuse.

use super::native::DataContext;
use crate::config::Options;
use crate::dialect::sass_to_scss;
use crate::error::{Result, SassError, TranspileError, UNKNOWN_ERROR_MESSAGE};
use crate::importer::{ImporterRegistry, Registration};
use crate::output::TranspileOutput;
use tracing::trace;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Native options applied, nothing compiled yet
    Configuring,
    /// Native parse phase running
    Parsing,
    /// Native execute phase running
    Executing,
    /// Compilation succeeded and the results were read back
    Extracting,
    /// Compilation failed
    Errored,
    /// Native resources released
    Closed,
}

/// A single compilation of one source
pub struct Session {
    state: SessionState,
    empty_source: bool,
    context: DataContext,
    registration: Option<Registration<'static>>,
}

fn enter(state: &mut SessionState, next: SessionState) {
    trace!(from = ?*state, to = ?next, "Session state change");
    *state = next;
}

impl Session {
    /// Create a session for `source`, configured from `options`.
    ///
    /// Indented-syntax sources are converted to SCSS first. The resolver, if
    /// any, is registered in the process-wide registry.
    pub fn new(source: &str, options: &Options) -> Result<Self> {
        let converted;
        let source = if options.sass_syntax {
            converted = sass_to_scss(source)?;
            converted.as_str()
        } else {
            source
        };

        let registration = options
            .import_resolver
            .clone()
            .map(|resolver| ImporterRegistry::global().register(resolver));

        let mut context = DataContext::new(source)?;
        context.configure(options, registration.as_ref().map(Registration::handle))?;

        Ok(Self {
            state: SessionState::Configuring,
            empty_source: source.trim().is_empty(),
            context,
            registration,
        })
    }

    /// Compile the source.
    ///
    /// Runs the parse phase, then the execute phase unless parsing failed. On
    /// a native error the CSS is discarded and the decoded error returned.
    pub fn execute(&mut self) -> Result<TranspileOutput> {
        if self.state != SessionState::Configuring {
            return Err(TranspileError::InvalidState(format!(
                "session cannot execute in state {:?}",
                self.state
            )));
        }

        let status = {
            let mut compiler = match self.context.compiler() {
                Ok(compiler) => compiler,
                Err(e) => {
                    enter(&mut self.state, SessionState::Errored);
                    return Err(e);
                }
            };

            enter(&mut self.state, SessionState::Parsing);
            let mut status = compiler.parse();
            if status == 0 {
                enter(&mut self.state, SessionState::Executing);
                status = compiler.execute();
            }
            status
        };

        let error_status = self.context.error_status();
        if status != 0 || error_status != 0 {
            enter(&mut self.state, SessionState::Errored);
            let status = if error_status != 0 {
                error_status
            } else {
                status
            };
            return Err(self.native_error(status).into());
        }

        enter(&mut self.state, SessionState::Extracting);
        Ok(TranspileOutput::from_native(
            self.context.output_string(),
            self.context.source_map_file(),
            self.context.source_map_string(),
        ))
    }

    /// Decode the native error, falling back to the plain-text message when
    /// the JSON payload is missing or carries no message.
    fn native_error(&self, status: i32) -> SassError {
        let json = self.context.error_json().unwrap_or_default();
        let mut error = SassError::from_json_with_status(&json, status);
        if error.message != UNKNOWN_ERROR_MESSAGE {
            return error;
        }

        let message = self.context.error_message().unwrap_or_default();
        if !message.trim().is_empty() {
            error.message = message.trim_end().to_string();
        } else if self.empty_source {
            error.message = "source is empty".to_string();
        }
        error
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Import callbacks answered by this session's resolver so far
    pub fn import_calls(&self) -> u64 {
        self.registration.as_ref().map_or(0, Registration::calls)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        enter(&mut self.state, SessionState::Closed);
    }
}
