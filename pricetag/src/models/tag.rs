use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id;

/// A catalog entry. `prefix`, `code` and `full_tag` never change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagDefinition {
    pub tag_id: TagId,
    pub prefix: String,
    pub code: String,
    pub full_tag: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    /// Usage hint only, see [`crate::Pricetag::recount_customer_counts`].
    pub customer_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTagDefinition {
    pub prefix: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Denormalized pointer to a [`TagDefinition`], copied into customers,
/// addresses and carts at assignment time. Two refs are the same tag when
/// their `full_tag` matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRef {
    pub tag_id: TagId,
    pub full_tag: String,
    pub prefix: String,
    pub code: String,
}

id!(Tag);
