use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::id;

use super::customer::{AddressId, CustomerId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum CartStatus {
    Draft,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cart {
    pub cart_id: CartId,
    pub customer_id: CustomerId,
    pub address_id: AddressId,
    pub status: CartStatus,
    /// Resolved `full_tag` values, frozen when the cart was created.
    #[sqlx(json)]
    pub effective_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

id!(Cart);
