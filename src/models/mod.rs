//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request/response types derived from them.

/// API key authentication model
pub mod api_key;
/// Marketplace platform reference data
pub mod platform;
/// Purchase (ownership) records
pub mod purchase;
/// Purchasable resources and their per-platform links
pub mod resource;
/// End-user identities
pub mod user;
