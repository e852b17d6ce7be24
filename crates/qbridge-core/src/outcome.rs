//! Uniform execution outcome.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use qbridge_hal::Counts;

/// Result of executing a circuit, success or failure.
///
/// Serialised flat with a `status` tag. Fields that do not apply to a
/// variant are written as `null` rather than omitted.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Success {
        counts: Counts,
        circuit_drawing: String,
        backend_name: String,
        /// Wall time in seconds.
        execution_time: f64,
    },
    Error {
        message: String,
        circuit_drawing: String,
        backend_name: String,
    },
}

impl ExecutionOutcome {
    pub fn error(
        message: impl Into<String>,
        circuit_drawing: impl Into<String>,
        backend_name: impl Into<String>,
    ) -> Self {
        Self::Error {
            message: message.into(),
            circuit_drawing: circuit_drawing.into(),
            backend_name: backend_name.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }

    pub fn counts(&self) -> Option<&Counts> {
        match self {
            Self::Success { counts, .. } => Some(counts),
            Self::Error { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Error { message, .. } => Some(message),
        }
    }

    pub fn circuit_drawing(&self) -> &str {
        match self {
            Self::Success {
                circuit_drawing, ..
            }
            | Self::Error {
                circuit_drawing, ..
            } => circuit_drawing,
        }
    }

    pub fn backend_name(&self) -> &str {
        match self {
            Self::Success { backend_name, .. } | Self::Error { backend_name, .. } => backend_name,
        }
    }

    pub fn execution_time(&self) -> Option<f64> {
        match self {
            Self::Success { execution_time, .. } => Some(*execution_time),
            Self::Error { .. } => None,
        }
    }
}

impl Serialize for ExecutionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ExecutionOutcome", 6)?;
        state.serialize_field("status", self.status())?;
        state.serialize_field("counts", &self.counts())?;
        state.serialize_field("circuit_drawing", self.circuit_drawing())?;
        state.serialize_field("backend_name", self.backend_name())?;
        state.serialize_field("execution_time", &self.execution_time())?;
        state.serialize_field("message", &self.message())?;
        state.end()
    }
}
