//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Performs business logic (database queries, validation)
//! 3. Returns HTTP response (JSON, status code)

use serde::Deserialize;

/// Health check endpoint
pub mod health;
/// Purchase recording endpoint
pub mod purchases;
/// Resource browsing endpoints
pub mod resources;
/// User browsing endpoints
pub mod users;
/// Ownership verification endpoint
pub mod verify;

/// Maximum page size accepted by the listing endpoints.
const MAX_PER_PAGE: u32 = 200;

/// Pagination query parameters shared by the listing endpoints.
///
/// `page` is 1-based. Out-of-range values are clamped rather than rejected:
/// a lazy client asking for `per_page=100000` gets the cap, not a 400.
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}

impl Pagination {
    /// Convert to SQL `LIMIT`/`OFFSET` values, clamping to sane bounds.
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page.clamp(1, MAX_PER_PAGE);
        let page = self.page.max(1);
        let offset = i64::from(page - 1) * i64::from(per_page);
        (i64::from(per_page), offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.limit_offset(), (50, 0));
    }

    #[test]
    fn offset_follows_page() {
        let p = Pagination {
            page: 3,
            per_page: 20,
        };
        assert_eq!(p.limit_offset(), (20, 40));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let zero = Pagination {
            page: 0,
            per_page: 0,
        };
        assert_eq!(zero.limit_offset(), (1, 0));

        let huge = Pagination {
            page: 2,
            per_page: 100_000,
        };
        assert_eq!(huge.limit_offset(), (MAX_PER_PAGE as i64, MAX_PER_PAGE as i64));
    }
}
