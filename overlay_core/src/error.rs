//! Error handling for the overlay

use std::fmt;

use crate::counters::CounterStatus;

/// Step of the counter session that produced a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterStep {
    OpenQuery,
    AddCpuCounter,
    AddDiskCounter,
    Collect,
    ReadValue,
}

impl fmt::Display for CounterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CounterStep::OpenQuery => "open query",
            CounterStep::AddCpuCounter => "add cpu counter",
            CounterStep::AddDiskCounter => "add disk counter",
            CounterStep::Collect => "collect query data",
            CounterStep::ReadValue => "read counter value",
        };
        f.write_str(name)
    }
}

/// Overlay error types
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Counter error ({step}): status {status}")]
    Counter {
        step: CounterStep,
        status: CounterStatus,
    },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Font loading error: {message}")]
    Font { message: String },

    #[error("Window error: {message}")]
    Window { message: String },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, OverlayError>;

impl OverlayError {
    pub fn counter(step: CounterStep, status: CounterStatus) -> Self {
        Self::Counter { step, status }
    }

    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    pub fn font<S: Into<String>>(message: S) -> Self {
        Self::Font {
            message: message.into(),
        }
    }

    pub fn window<S: Into<String>>(message: S) -> Self {
        Self::Window {
            message: message.into(),
        }
    }

    /// Status code carried by a counter error, if any
    pub fn status(&self) -> Option<CounterStatus> {
        match self {
            Self::Counter { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_error_names_step_and_code() {
        let err = OverlayError::counter(CounterStep::AddDiskCounter, CounterStatus::NO_OBJECT);
        assert_eq!(
            err.to_string(),
            "Counter error (add disk counter): status 0xC0000BB8"
        );
        assert_eq!(err.status(), Some(CounterStatus::NO_OBJECT));
    }

    #[test]
    fn non_counter_errors_have_no_status() {
        assert!(OverlayError::font("missing").status().is_none());
        assert_eq!(
            OverlayError::render("surface lost").to_string(),
            "Render error: surface lost"
        );
    }
}
