use async_trait::async_trait;
use tracing::{debug, info};

use crate::models::{Address, Customer, TagDefinition, TagId, TagRef};

/// Catalog access needed while assigning tags.
#[async_trait]
pub trait TagCatalog: Send {
    /// Returns the active definition for `full_tag`, or [`crate::Error::TagNotFound`].
    async fn find_tag_definition(&mut self, full_tag: &str) -> Result<TagDefinition, crate::Error>;

    async fn adjust_customer_count(&mut self, tag_id: TagId, delta: i64)
        -> Result<(), crate::Error>;
}

/// Appends `tag`, removing any entry with the same prefix. Every assignment
/// path goes through here so that a list never holds two tags of one prefix.
pub fn replace_by_prefix(tags: &mut Vec<TagRef>, tag: TagRef) -> Option<TagRef> {
    let displaced = tags
        .iter()
        .position(|existing| existing.same_prefix(&tag))
        .map(|index| tags.remove(index));

    tags.retain(|existing| !existing.same_prefix(&tag));
    tags.push(tag);

    displaced
}

pub fn remove_by_full_tag(tags: &mut Vec<TagRef>, full_tag: &str) -> Option<TagRef> {
    let index = tags.iter().position(|existing| existing.is(full_tag))?;

    Some(tags.remove(index))
}

pub async fn assign_customer_tag<'c, C: TagCatalog + ?Sized>(
    catalog: &mut C,
    customer: &'c mut Customer,
    full_tag: &str,
) -> Result<&'c [TagRef], crate::Error> {
    let definition = catalog.find_tag_definition(full_tag).await?;

    if customer.tags.iter().any(|tag| tag.is(&definition.full_tag)) {
        debug!("Customer {} already has {full_tag}", customer.customer_id);
        return Ok(&customer.tags);
    }

    let mut tags = customer.tags.clone();
    let displaced = replace_by_prefix(&mut tags, TagRef::from(&definition));

    catalog
        .adjust_customer_count(definition.tag_id, 1)
        .await?;

    if let Some(displaced) = &displaced {
        catalog.adjust_customer_count(displaced.tag_id, -1).await?;
    }

    match &displaced {
        Some(displaced) => info!(
            "Customer {}: {} replaced by {}",
            customer.customer_id, displaced.full_tag, definition.full_tag
        ),
        None => info!(
            "Customer {}: assigned {}",
            customer.customer_id, definition.full_tag
        ),
    }

    customer.tags = tags;

    Ok(&customer.tags)
}

/// Removing a tag the customer does not have is a no-op.
pub async fn remove_customer_tag<C: TagCatalog + ?Sized>(
    catalog: &mut C,
    customer: &mut Customer,
    full_tag: &str,
) -> Result<Option<TagRef>, crate::Error> {
    let mut tags = customer.tags.clone();

    let Some(removed) = remove_by_full_tag(&mut tags, full_tag) else {
        debug!("Customer {} does not have {full_tag}", customer.customer_id);
        return Ok(None);
    };

    catalog.adjust_customer_count(removed.tag_id, -1).await?;

    info!("Customer {}: removed {full_tag}", customer.customer_id);

    customer.tags = tags;

    Ok(Some(removed))
}

/// Overrides are address-scoped and leave `customer_count` alone.
pub async fn assign_address_tag_override<'a, C: TagCatalog + ?Sized>(
    catalog: &mut C,
    address: &'a mut Address,
    full_tag: &str,
) -> Result<&'a [TagRef], crate::Error> {
    let definition = catalog.find_tag_definition(full_tag).await?;

    if let Some(displaced) = replace_by_prefix(&mut address.tag_overrides, TagRef::from(&definition)) {
        debug!(
            "Address {}: override {} replaced by {}",
            address.address_id, displaced.full_tag, definition.full_tag
        );
    }

    info!(
        "Address {}: override {} set",
        address.address_id, definition.full_tag
    );

    Ok(&address.tag_overrides)
}

pub fn remove_address_tag_override(address: &mut Address, full_tag: &str) -> Option<TagRef> {
    let removed = remove_by_full_tag(&mut address.tag_overrides, full_tag);

    if removed.is_some() {
        info!("Address {}: override {full_tag} removed", address.address_id);
    }

    removed
}
