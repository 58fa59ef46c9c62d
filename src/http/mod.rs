//! HTTP API module for the gadget store
//!
//! Provides REST endpoints for:
//! - Named and ad-hoc query evaluation
//! - Entity and relationship insertion
//! - Bulk import and Turtle export

pub mod server;

pub use server::{
    create_server, start_server, ApiError, AppState, ErrorResponse, ListQueriesResponse,
    RegisterQueryRequest, RegisterQueryResponse, SuccessResponse,
};
