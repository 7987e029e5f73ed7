//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers and
//! CLI commands. They handle database transactions, validation, and
//! multi-step operations.

pub mod api_key_service;
pub mod catalog_service;
pub mod lifecycle_service;
pub mod user_service;
pub mod verify_service;
