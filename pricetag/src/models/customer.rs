use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id;

use super::tag::TagRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub name: String,
    /// Defaults, applied at every address without a same-prefix override.
    #[sqlx(json)]
    pub tags: Vec<TagRef>,
    #[sqlx(skip)]
    pub addresses: Vec<Address>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub address_id: AddressId,
    pub customer_id: CustomerId,
    pub label: String,
    #[sqlx(json)]
    pub tag_overrides: Vec<TagRef>,
}

id!(Customer);
id!(Address);
