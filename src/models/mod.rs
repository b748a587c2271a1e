//! Request and Response models for the state store
//!
//! This module defines the DTOs (Data Transfer Objects) shared by the HTTP
//! API and the state tool.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{Action, SetRequest, ToolRequest};
pub use responses::{
    ClearResponse, DeleteResponse, ErrorResponse, GetResponse, HealthResponse, MetaResponse,
    SetResponse,
};
