use std::collections::HashMap;

use chrono::Utc;
use sqlx::{types::Json, Sqlite, Transaction};
use tracing::info;

use crate::{
    assign,
    models::{Address, AddressId, Customer, CustomerId, TagRef},
    resolve::{resolve_effective_tags, resolve_effective_tags_detailed, EffectiveTag},
    tag::dedup_by_prefix,
    Pricetag,
};

impl Customer {
    pub async fn create(
        tx: &mut Transaction<'_, Sqlite>,
        name: &str,
    ) -> Result<Customer, crate::Error> {
        let customer = Customer {
            customer_id: CustomerId::generate(),
            name: name.to_owned(),
            tags: Vec::new(),
            addresses: Vec::new(),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO customers(customer_id, name, tags, created_at) VALUES (?, ?, ?, ?);")
            .bind(customer.customer_id)
            .bind(&customer.name)
            .bind(Json(&customer.tags))
            .bind(customer.created_at)
            .execute(&mut **tx)
            .await?;

        info!("Created customer {} ({})", customer.customer_id, customer.name);

        Ok(customer)
    }

    pub async fn get(
        tx: &mut Transaction<'_, Sqlite>,
        customer_id: CustomerId,
    ) -> Result<Customer, crate::Error> {
        let mut customer: Customer = sqlx::query_as("SELECT * FROM customers WHERE customer_id = ?;")
            .bind(customer_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(crate::Error::CustomerNotFound(customer_id))?;

        customer.addresses = sqlx::query_as(
            "SELECT address_id, customer_id, label, tag_overrides FROM addresses WHERE customer_id = ? ORDER BY position;",
        )
        .bind(customer_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(customer.normalized())
    }

    pub async fn list(pricetag: &Pricetag) -> Result<Vec<Customer>, crate::Error> {
        let customers: Vec<Customer> =
            sqlx::query_as("SELECT * FROM customers ORDER BY created_at, name;")
                .fetch_all(&pricetag.pool)
                .await?;

        let addresses: Vec<Address> = sqlx::query_as(
            "SELECT address_id, customer_id, label, tag_overrides FROM addresses ORDER BY position;",
        )
        .fetch_all(&pricetag.pool)
        .await?;

        let mut by_customer: HashMap<CustomerId, Vec<Address>> = HashMap::new();

        for address in addresses {
            by_customer
                .entry(address.customer_id)
                .or_default()
                .push(address);
        }

        Ok(customers
            .into_iter()
            .map(|mut customer| {
                customer.addresses = by_customer
                    .remove(&customer.customer_id)
                    .unwrap_or_default();
                customer.normalized()
            })
            .collect())
    }

    /// Older documents may hold several tags of one prefix; the last one wins.
    fn normalized(mut self) -> Self {
        self.tags = dedup_by_prefix(self.tags);

        for address in self.addresses.iter_mut() {
            address.tag_overrides = dedup_by_prefix(std::mem::take(&mut address.tag_overrides));
        }

        self
    }

    pub async fn add_address(
        &mut self,
        tx: &mut Transaction<'_, Sqlite>,
        label: &str,
    ) -> Result<&Address, crate::Error> {
        let address = Address {
            address_id: AddressId::generate(),
            customer_id: self.customer_id,
            label: label.to_owned(),
            tag_overrides: Vec::new(),
        };

        sqlx::query(
            r#"
                INSERT INTO addresses(address_id, customer_id, label, tag_overrides, position)
                VALUES (?, ?, ?, ?, (SELECT COUNT(*) FROM addresses WHERE customer_id = ?));
            "#,
        )
        .bind(address.address_id)
        .bind(address.customer_id)
        .bind(&address.label)
        .bind(Json(&address.tag_overrides))
        .bind(address.customer_id)
        .execute(&mut **tx)
        .await?;

        info!("Customer {}: added address {}", self.customer_id, address.address_id);

        self.addresses.push(address);

        Ok(&self.addresses[self.addresses.len() - 1])
    }

    pub fn address(&self, address_id: AddressId) -> Result<&Address, crate::Error> {
        self.addresses
            .iter()
            .find(|address| address.address_id == address_id)
            .ok_or(crate::Error::AddressNotFound(address_id))
    }

    pub fn address_mut(&mut self, address_id: AddressId) -> Result<&mut Address, crate::Error> {
        self.addresses
            .iter_mut()
            .find(|address| address.address_id == address_id)
            .ok_or(crate::Error::AddressNotFound(address_id))
    }

    pub async fn save_tags(&self, tx: &mut Transaction<'_, Sqlite>) -> Result<(), crate::Error> {
        sqlx::query("UPDATE customers SET tags = ? WHERE customer_id = ?;")
            .bind(Json(&self.tags))
            .bind(self.customer_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl Address {
    pub async fn save_overrides(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), crate::Error> {
        sqlx::query("UPDATE addresses SET tag_overrides = ? WHERE address_id = ?;")
            .bind(Json(&self.tag_overrides))
            .bind(self.address_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl Pricetag {
    pub async fn create_customer(&self, name: &str) -> Result<Customer, crate::Error> {
        let mut tx = self.begin().await?;
        let customer = Customer::create(&mut tx, name).await?;
        tx.commit().await?;

        Ok(customer)
    }

    pub async fn get_customer(&self, customer_id: CustomerId) -> Result<Customer, crate::Error> {
        let mut tx = self.begin().await?;
        let customer = Customer::get(&mut tx, customer_id).await?;
        tx.commit().await?;

        Ok(customer)
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, crate::Error> {
        Customer::list(self).await
    }

    pub async fn add_address(
        &self,
        customer_id: CustomerId,
        label: &str,
    ) -> Result<Address, crate::Error> {
        let mut tx = self.begin().await?;
        let mut customer = Customer::get(&mut tx, customer_id).await?;
        let address = customer.add_address(&mut tx, label).await?.clone();
        tx.commit().await?;

        Ok(address)
    }

    pub async fn assign_customer_tag(
        &self,
        customer_id: CustomerId,
        full_tag: &str,
    ) -> Result<Vec<TagRef>, crate::Error> {
        let mut tx = self.begin().await?;
        let mut customer = Customer::get(&mut tx, customer_id).await?;

        let tags = assign::assign_customer_tag(&mut tx, &mut customer, full_tag)
            .await?
            .to_vec();

        customer.save_tags(&mut tx).await?;
        tx.commit().await?;

        Ok(tags)
    }

    pub async fn remove_customer_tag(
        &self,
        customer_id: CustomerId,
        full_tag: &str,
    ) -> Result<Vec<TagRef>, crate::Error> {
        let mut tx = self.begin().await?;
        let mut customer = Customer::get(&mut tx, customer_id).await?;

        if assign::remove_customer_tag(&mut tx, &mut customer, full_tag)
            .await?
            .is_some()
        {
            customer.save_tags(&mut tx).await?;
        }

        tx.commit().await?;

        Ok(customer.tags)
    }

    pub async fn assign_address_tag_override(
        &self,
        customer_id: CustomerId,
        address_id: AddressId,
        full_tag: &str,
    ) -> Result<Vec<TagRef>, crate::Error> {
        let mut tx = self.begin().await?;
        let mut customer = Customer::get(&mut tx, customer_id).await?;
        let address = customer.address_mut(address_id)?;

        let overrides = assign::assign_address_tag_override(&mut tx, address, full_tag)
            .await?
            .to_vec();

        address.save_overrides(&mut tx).await?;
        tx.commit().await?;

        Ok(overrides)
    }

    pub async fn remove_address_tag_override(
        &self,
        customer_id: CustomerId,
        address_id: AddressId,
        full_tag: &str,
    ) -> Result<Vec<TagRef>, crate::Error> {
        let mut tx = self.begin().await?;
        let mut customer = Customer::get(&mut tx, customer_id).await?;
        let address = customer.address_mut(address_id)?;

        if assign::remove_address_tag_override(address, full_tag).is_some() {
            address.save_overrides(&mut tx).await?;
        }

        tx.commit().await?;

        Ok(address.tag_overrides.clone())
    }

    pub async fn effective_tags(
        &self,
        customer_id: CustomerId,
        address_id: AddressId,
    ) -> Result<Vec<String>, crate::Error> {
        let customer = self.get_customer(customer_id).await?;
        let address = customer.address(address_id)?;

        Ok(resolve_effective_tags(&customer.tags, &address.tag_overrides))
    }

    pub async fn effective_tags_detailed(
        &self,
        customer_id: CustomerId,
        address_id: AddressId,
    ) -> Result<Vec<EffectiveTag>, crate::Error> {
        let customer = self.get_customer(customer_id).await?;
        let address = customer.address(address_id)?;

        Ok(resolve_effective_tags_detailed(
            &customer.tags,
            &address.tag_overrides,
        ))
    }
}

#[cfg(test)]
mod test {
    use sqlx::types::Json;

    use crate::{
        assign,
        models::{AddressId, Customer, CustomerId},
        resolve::TagSource,
        test::{seed_tags, tag_ref, temp_pricetag},
        ErrorKind,
    };

    const SCONTO_45: &str = "categoria-di-sconto:sconto-45";
    const SCONTO_50: &str = "categoria-di-sconto:sconto-50";
    const IDRAULICO: &str = "categoria-clienti:idraulico";

    #[tokio::test]
    async fn test_customer_crud() -> Result<(), crate::Error> {
        let temp = temp_pricetag().await;
        let pricetag = temp.as_ref();

        let customer = pricetag.create_customer("Idraulica Rossi").await?;
        let first = pricetag.add_address(customer.customer_id, "Sede").await?;
        let second = pricetag
            .add_address(customer.customer_id, "Magazzino")
            .await?;

        let loaded = pricetag.get_customer(customer.customer_id).await?;

        assert_eq!("Idraulica Rossi", loaded.name);
        assert_eq!(
            vec![first.address_id, second.address_id],
            loaded
                .addresses
                .iter()
                .map(|a| a.address_id)
                .collect::<Vec<_>>()
        );

        let listed = pricetag.list_customers().await?;
        assert_eq!(1, listed.len());
        assert_eq!(2, listed[0].addresses.len());

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_documents() {
        let temp = temp_pricetag().await;
        let pricetag = temp.as_ref();

        let error = pricetag
            .get_customer(CustomerId::generate())
            .await
            .unwrap_err();
        assert_eq!(ErrorKind::NotFound, error.kind());

        let customer = pricetag.create_customer("Rossi").await.unwrap();
        let error = pricetag
            .assign_address_tag_override(customer.customer_id, AddressId::generate(), SCONTO_45)
            .await
            .unwrap_err();
        assert!(matches!(error, crate::Error::AddressNotFound(_)));
    }

    #[tokio::test]
    async fn test_assignment_scenarios() -> Result<(), crate::Error> {
        let temp = temp_pricetag().await;
        let pricetag = temp.as_ref();
        seed_tags(pricetag, [SCONTO_45, SCONTO_50, IDRAULICO]).await;

        let customer = pricetag.create_customer("Idraulica Rossi").await?;
        let address = pricetag.add_address(customer.customer_id, "Sede").await?;
        let (customer_id, address_id) = (customer.customer_id, address.address_id);

        pricetag.assign_customer_tag(customer_id, SCONTO_45).await?;
        pricetag.assign_customer_tag(customer_id, IDRAULICO).await?;

        let detailed = pricetag
            .effective_tags_detailed(customer_id, address_id)
            .await?;
        assert_eq!(
            vec![SCONTO_45, IDRAULICO],
            detailed
                .iter()
                .map(|e| e.tag.full_tag.as_str())
                .collect::<Vec<_>>()
        );
        assert!(detailed.iter().all(|e| e.source == TagSource::Customer));

        pricetag
            .assign_address_tag_override(customer_id, address_id, SCONTO_50)
            .await?;
        assert_eq!(
            vec![IDRAULICO, SCONTO_50],
            pricetag.effective_tags(customer_id, address_id).await?
        );

        pricetag
            .remove_address_tag_override(customer_id, address_id, SCONTO_50)
            .await?;
        assert_eq!(
            vec![SCONTO_45, IDRAULICO],
            pricetag.effective_tags(customer_id, address_id).await?
        );

        let tags = pricetag.assign_customer_tag(customer_id, SCONTO_50).await?;
        assert_eq!(1, tags.iter().filter(|t| t.prefix == "categoria-di-sconto").count());

        assert_eq!(0, pricetag.find_tag_definition(SCONTO_45).await?.customer_count);
        assert_eq!(1, pricetag.find_tag_definition(SCONTO_50).await?.customer_count);
        assert_eq!(1, pricetag.find_tag_definition(IDRAULICO).await?.customer_count);

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_tag_is_not_applied() -> Result<(), crate::Error> {
        let temp = temp_pricetag().await;
        let pricetag = temp.as_ref();
        seed_tags(pricetag, [IDRAULICO]).await;

        let customer = pricetag.create_customer("Rossi").await?;
        pricetag
            .assign_customer_tag(customer.customer_id, IDRAULICO)
            .await?;

        let error = pricetag
            .assign_customer_tag(customer.customer_id, "foo:bar")
            .await
            .unwrap_err();

        assert_eq!("tag 'foo:bar' not found", error.to_string());
        assert_eq!(
            vec![IDRAULICO],
            pricetag
                .get_customer(customer.customer_id)
                .await?
                .tags
                .iter()
                .map(|t| t.full_tag.as_str())
                .collect::<Vec<_>>()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_idempotent_removal() -> Result<(), crate::Error> {
        let temp = temp_pricetag().await;
        let pricetag = temp.as_ref();
        seed_tags(pricetag, [SCONTO_45]).await;

        let customer = pricetag.create_customer("Rossi").await?;

        assert!(pricetag
            .remove_customer_tag(customer.customer_id, SCONTO_45)
            .await?
            .is_empty());
        assert!(pricetag
            .remove_customer_tag(customer.customer_id, "foo:bar")
            .await?
            .is_empty());
        assert_eq!(0, pricetag.find_tag_definition(SCONTO_45).await?.customer_count);

        Ok(())
    }

    #[tokio::test]
    async fn test_deactivated_tag_keeps_resolving() -> Result<(), crate::Error> {
        let temp = temp_pricetag().await;
        let pricetag = temp.as_ref();
        seed_tags(pricetag, [IDRAULICO]).await;

        let customer = pricetag.create_customer("Rossi").await?;
        let address = pricetag.add_address(customer.customer_id, "Sede").await?;

        pricetag
            .assign_customer_tag(customer.customer_id, IDRAULICO)
            .await?;
        pricetag.deactivate_tag_definition(IDRAULICO).await?;

        assert_eq!(
            vec![IDRAULICO],
            pricetag
                .effective_tags(customer.customer_id, address.address_id)
                .await?
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_counter_drift_is_repaired_by_recount() -> Result<(), crate::Error> {
        let temp = temp_pricetag().await;
        let pricetag = temp.as_ref();
        seed_tags(pricetag, [SCONTO_45, SCONTO_50]).await;

        let customer = pricetag.create_customer("Rossi").await?;
        let address = pricetag.add_address(customer.customer_id, "Sede").await?;

        // Two writers working from the same stale document.
        let mut first = pricetag.get_customer(customer.customer_id).await?;
        let mut second = pricetag.get_customer(customer.customer_id).await?;

        for (document, tag) in [(&mut first, SCONTO_45), (&mut second, SCONTO_50)] {
            let mut tx = pricetag.begin().await?;
            assign::assign_customer_tag(&mut tx, document, tag).await?;
            document.save_tags(&mut tx).await?;
            tx.commit().await?;
        }

        let stored: Customer = pricetag.get_customer(customer.customer_id).await?;
        assert_eq!(1, stored.tags.len());
        assert_eq!(SCONTO_50, stored.tags[0].full_tag);

        assert_eq!(1, pricetag.find_tag_definition(SCONTO_45).await?.customer_count);
        assert_eq!(
            vec![SCONTO_50],
            pricetag
                .effective_tags(customer.customer_id, address.address_id)
                .await?
        );

        assert_eq!(1, pricetag.recount_customer_counts().await?);
        assert_eq!(0, pricetag.find_tag_definition(SCONTO_45).await?.customer_count);
        assert_eq!(1, pricetag.find_tag_definition(SCONTO_50).await?.customer_count);
        assert_eq!(0, pricetag.recount_customer_counts().await?);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_assignments_all_succeed() -> Result<(), crate::Error> {
        let temp = temp_pricetag().await;
        let pricetag = temp.as_ref();
        seed_tags(pricetag, [SCONTO_45, SCONTO_50, IDRAULICO]).await;

        let rossi = pricetag.create_customer("Rossi").await?.customer_id;
        let bianchi = pricetag.create_customer("Bianchi").await?.customer_id;

        for round in 0..20 {
            let sconto = if round % 2 == 0 { SCONTO_45 } else { SCONTO_50 };

            let (first, second, third) = tokio::join!(
                pricetag.assign_customer_tag(rossi, sconto),
                pricetag.assign_customer_tag(bianchi, IDRAULICO),
                pricetag.assign_customer_tag(bianchi, sconto),
            );

            first?;
            second?;
            third?;
        }

        for customer_id in [rossi, bianchi] {
            let customer = pricetag.get_customer(customer_id).await?;
            assert!(customer.tags.iter().any(|t| t.is(SCONTO_50)));
        }

        assert_eq!(2, pricetag.find_tag_definition(SCONTO_50).await?.customer_count);
        assert_eq!(0, pricetag.find_tag_definition(SCONTO_45).await?.customer_count);
        assert_eq!(0, pricetag.recount_customer_counts().await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_stored_duplicates_are_normalized_on_load() -> Result<(), crate::Error> {
        let temp = temp_pricetag().await;
        let pricetag = temp.as_ref();

        let customer = pricetag.create_customer("Rossi").await?;
        let address = pricetag.add_address(customer.customer_id, "Sede").await?;

        sqlx::query("UPDATE customers SET tags = ? WHERE customer_id = ?;")
            .bind(Json(vec![
                tag_ref(SCONTO_45),
                tag_ref(IDRAULICO),
                tag_ref(SCONTO_50),
            ]))
            .bind(customer.customer_id)
            .execute(&pricetag.pool)
            .await?;

        sqlx::query("UPDATE addresses SET tag_overrides = ? WHERE address_id = ?;")
            .bind(Json(vec![tag_ref(SCONTO_50), tag_ref(SCONTO_45)]))
            .bind(address.address_id)
            .execute(&pricetag.pool)
            .await?;

        let loaded = pricetag.get_customer(customer.customer_id).await?;

        assert_eq!(
            vec![IDRAULICO, SCONTO_50],
            loaded.tags.iter().map(|t| t.full_tag.as_str()).collect::<Vec<_>>()
        );
        assert_eq!(
            vec![SCONTO_45],
            loaded.addresses[0]
                .tag_overrides
                .iter()
                .map(|t| t.full_tag.as_str())
                .collect::<Vec<_>>()
        );

        let listed = pricetag.list_customers().await?;
        assert_eq!(loaded.tags, listed[0].tags);

        Ok(())
    }
}
