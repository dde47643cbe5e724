use chrono::Utc;
use sqlx::{types::Json, Sqlite, Transaction};
use tracing::{debug, info};

use crate::{
    models::{Address, AddressId, Cart, CartId, CartStatus, Customer, CustomerId},
    resolve::resolve_effective_tags,
    Pricetag,
};

/// The tags a new cart for `address` is priced with.
pub fn snapshot_effective_tags(customer: &Customer, address: &Address) -> Vec<String> {
    resolve_effective_tags(&customer.tags, &address.tag_overrides)
}

impl Cart {
    pub async fn find_draft(
        tx: &mut Transaction<'_, Sqlite>,
        customer_id: CustomerId,
        address_id: AddressId,
    ) -> Result<Option<Cart>, crate::Error> {
        Ok(sqlx::query_as(
            "SELECT * FROM carts WHERE customer_id = ? AND address_id = ? AND status = ?;",
        )
        .bind(customer_id)
        .bind(address_id)
        .bind(CartStatus::Draft)
        .fetch_optional(&mut **tx)
        .await?)
    }

    /// Returns the existing draft cart for the pair, or creates one with a
    /// fresh snapshot of the effective tags. The snapshot is never recomputed.
    pub async fn create(
        tx: &mut Transaction<'_, Sqlite>,
        customer_id: CustomerId,
        address_id: AddressId,
    ) -> Result<Cart, crate::Error> {
        if let Some(cart) = Self::find_draft(tx, customer_id, address_id).await? {
            debug!("Reusing draft cart {} for address {address_id}", cart.cart_id);
            return Ok(cart);
        }

        let customer = Customer::get(tx, customer_id).await?;
        let address = customer.address(address_id)?;

        let cart = Cart {
            cart_id: CartId::generate(),
            customer_id,
            address_id,
            status: CartStatus::Draft,
            effective_tags: snapshot_effective_tags(&customer, address),
            created_at: Utc::now(),
        };

        let inserted = sqlx::query(
            r#"
                INSERT INTO carts(cart_id, customer_id, address_id, status, effective_tags, created_at)
                VALUES (?, ?, ?, ?, ?, ?);
            "#,
        )
        .bind(cart.cart_id)
        .bind(cart.customer_id)
        .bind(cart.address_id)
        .bind(cart.status)
        .bind(Json(&cart.effective_tags))
        .bind(cart.created_at)
        .execute(&mut **tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(error)) if error.is_unique_violation() => {
                // Another request created the draft first.
                return Self::find_draft(tx, customer_id, address_id)
                    .await?
                    .ok_or(crate::Error::AddressNotFound(address_id));
            }
            Err(error) => return Err(error.into()),
        }

        info!(
            "Created cart {} for address {address_id} with tags {:?}",
            cart.cart_id, cart.effective_tags
        );

        Ok(cart)
    }

    pub async fn get(
        tx: &mut Transaction<'_, Sqlite>,
        cart_id: CartId,
    ) -> Result<Cart, crate::Error> {
        sqlx::query_as("SELECT * FROM carts WHERE cart_id = ?;")
            .bind(cart_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(crate::Error::CartNotFound(cart_id))
    }

    pub async fn submit(
        tx: &mut Transaction<'_, Sqlite>,
        cart_id: CartId,
    ) -> Result<Cart, crate::Error> {
        let mut cart = Self::get(tx, cart_id).await?;

        if cart.status == CartStatus::Submitted {
            return Ok(cart);
        }

        sqlx::query("UPDATE carts SET status = ? WHERE cart_id = ?;")
            .bind(CartStatus::Submitted)
            .bind(cart_id)
            .execute(&mut **tx)
            .await?;

        cart.status = CartStatus::Submitted;

        info!("Submitted cart {cart_id}");

        Ok(cart)
    }
}

impl Pricetag {
    pub async fn create_cart(
        &self,
        customer_id: CustomerId,
        address_id: AddressId,
    ) -> Result<Cart, crate::Error> {
        let mut tx = self.begin().await?;
        let cart = Cart::create(&mut tx, customer_id, address_id).await?;
        tx.commit().await?;

        Ok(cart)
    }

    pub async fn get_cart(&self, cart_id: CartId) -> Result<Cart, crate::Error> {
        let mut tx = self.begin().await?;
        let cart = Cart::get(&mut tx, cart_id).await?;
        tx.commit().await?;

        Ok(cart)
    }

    pub async fn submit_cart(&self, cart_id: CartId) -> Result<Cart, crate::Error> {
        let mut tx = self.begin().await?;
        let cart = Cart::submit(&mut tx, cart_id).await?;
        tx.commit().await?;

        Ok(cart)
    }
}
