//! ---
//! pvd_section: "03-persistence-logging"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Structured logging adapters and sinks."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Structured logging for the R-PVD workspace.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber suitable for development.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer())
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Project identifier associated with the log event.
    pub project: Option<&'a str>,
    /// Circuit identifier associated with the log event.
    pub circuit: Option<&'a str>,
    /// Row number in the source take-off table.
    pub row: Option<u64>,
    /// Active normative profile (IEC, NEC, ...).
    pub norm: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a project identifier.
    pub fn with_project(mut self, project: &'a str) -> Self {
        self.project = Some(project);
        self
    }

    /// Attach a circuit identifier.
    pub fn with_circuit(mut self, circuit: &'a str) -> Self {
        self.circuit = Some(circuit);
        self
    }

    /// Attach a source-table row number.
    pub fn with_row(mut self, row: u64) -> Self {
        self.row = Some(row);
        self
    }

    /// Attach the active normative profile name.
    pub fn with_norm(mut self, norm: &'a str) -> Self {
        self.norm = Some(norm);
        self
    }
}

/// High-level outcome used when emitting lifecycle log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The operation completed successfully.
    Success,
    /// The operation failed or was aborted.
    Fault,
}

impl SystemEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Fault => "fault",
        }
    }

    fn level(&self) -> Level {
        match self {
            SystemEventOutcome::Success => Level::INFO,
            SystemEventOutcome::Fault => Level::ERROR,
        }
    }
}

/// Emit a standardized system event with a success/fault outcome.
pub fn log_system_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let default_ctx = LogContext::default();
    let ctx = context.unwrap_or(&default_ctx);
    match outcome.level() {
        Level::ERROR => tracing::event!(
            Level::ERROR,
            event,
            outcome = outcome.as_str(),
            project = ctx.project.unwrap_or(""),
            circuit = ctx.circuit.unwrap_or(""),
            row = ctx.row.unwrap_or_default(),
            norm = ctx.norm.unwrap_or(""),
            message = %message
        ),
        Level::WARN => tracing::event!(
            Level::WARN,
            event,
            outcome = outcome.as_str(),
            project = ctx.project.unwrap_or(""),
            circuit = ctx.circuit.unwrap_or(""),
            row = ctx.row.unwrap_or_default(),
            norm = ctx.norm.unwrap_or(""),
            message = %message
        ),
        Level::INFO => tracing::event!(
            Level::INFO,
            event,
            outcome = outcome.as_str(),
            project = ctx.project.unwrap_or(""),
            circuit = ctx.circuit.unwrap_or(""),
            row = ctx.row.unwrap_or_default(),
            norm = ctx.norm.unwrap_or(""),
            message = %message
        ),
        Level::DEBUG => tracing::event!(
            Level::DEBUG,
            event,
            outcome = outcome.as_str(),
            project = ctx.project.unwrap_or(""),
            circuit = ctx.circuit.unwrap_or(""),
            row = ctx.row.unwrap_or_default(),
            norm = ctx.norm.unwrap_or(""),
            message = %message
        ),
        Level::TRACE => tracing::event!(
            Level::TRACE,
            event,
            outcome = outcome.as_str(),
            project = ctx.project.unwrap_or(""),
            circuit = ctx.circuit.unwrap_or(""),
            row = ctx.row.unwrap_or_default(),
            norm = ctx.norm.unwrap_or(""),
            message = %message
        ),
    }
}
