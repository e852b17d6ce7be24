//! Shared application state.

use std::path::PathBuf;

use qbridge_core::{CapabilityFlags, Dispatcher};

/// State shared by every HTTP handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Manifest served verbatim by `GET /schema`.
    pub schema_path: PathBuf,
    /// Allowed CORS origins; empty allows any.
    pub cors_origins: Vec<String>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, schema_path: impl Into<PathBuf>) -> Self {
        Self {
            dispatcher,
            schema_path: schema_path.into(),
            cors_origins: Vec::new(),
        }
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    pub fn flags(&self) -> CapabilityFlags {
        self.dispatcher.capabilities().flags()
    }
}
