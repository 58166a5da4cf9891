// Registrar Control Plane Library
// Decision: Shared library for binaries (API server, OpenAPI export) and integration tests

// API routes and types
pub mod api;

// Application assembly
pub mod app;

// Identity and access control
pub mod auth;

// Server configuration
pub mod config;

// HTTP error mapping
pub mod error;

// OpenAPI spec generation
pub mod openapi;

// Services layer
pub mod services;
pub use services::{AuthService, RecordService};

// Storage layer
pub mod storage;
