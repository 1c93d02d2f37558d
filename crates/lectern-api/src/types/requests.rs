//! Request DTOs for the API.

use serde::Deserialize;

/// Query for the class lookups.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutlineQuery {
    /// Only return sections that jump to a pause point.
    #[serde(default)]
    pub jumpable: bool,
}
