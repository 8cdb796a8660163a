//! Shared response envelope types for API handlers.

use serde::Serialize;

/// `{ "items": [...] }` list envelope.
#[derive(Debug, Serialize)]
pub struct ItemsResponse<T: Serialize> {
    pub items: Vec<T>,
}
