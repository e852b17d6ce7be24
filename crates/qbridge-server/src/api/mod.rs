//! HTTP handlers.

pub mod function;
pub mod health;
pub mod schema;
