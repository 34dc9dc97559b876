//! ---
//! pvd_section: "03-persistence-logging"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Structured logging adapters and sinks."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
/// Emit an informational log enriched with R-PVD context.
#[macro_export]
macro_rules! pvd_info {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::INFO,
            project = ctx.project.unwrap_or(""),
            circuit = ctx.circuit.unwrap_or(""),
            row = ctx.row.unwrap_or_default(),
            norm = ctx.norm.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::INFO,
            project = ctx.project.unwrap_or(""),
            circuit = ctx.circuit.unwrap_or(""),
            row = ctx.row.unwrap_or_default(),
            norm = ctx.norm.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit a debug log enriched with R-PVD context.
#[macro_export]
macro_rules! pvd_debug {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::DEBUG,
            project = ctx.project.unwrap_or(""),
            circuit = ctx.circuit.unwrap_or(""),
            row = ctx.row.unwrap_or_default(),
            norm = ctx.norm.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::DEBUG,
            project = ctx.project.unwrap_or(""),
            circuit = ctx.circuit.unwrap_or(""),
            row = ctx.row.unwrap_or_default(),
            norm = ctx.norm.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an error log enriched with R-PVD context.
#[macro_export]
macro_rules! pvd_error {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::ERROR,
            project = ctx.project.unwrap_or(""),
            circuit = ctx.circuit.unwrap_or(""),
            row = ctx.row.unwrap_or_default(),
            norm = ctx.norm.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::ERROR,
            project = ctx.project.unwrap_or(""),
            circuit = ctx.circuit.unwrap_or(""),
            row = ctx.row.unwrap_or_default(),
            norm = ctx.norm.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}
