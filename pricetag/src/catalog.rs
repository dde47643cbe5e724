use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use tracing::{info, warn};

use crate::{
    assign::TagCatalog,
    models::{NewTagDefinition, TagDefinition, TagId, TagRef},
    tag::validate_color,
    Pricetag,
};

impl TagDefinition {
    pub async fn create(
        tx: &mut Transaction<'_, Sqlite>,
        new: &NewTagDefinition,
    ) -> Result<TagDefinition, crate::Error> {
        let full_tag = new.full_tag()?;

        let existing: Option<(TagId,)> =
            sqlx::query_as("SELECT tag_id FROM tag_definitions WHERE full_tag = ?;")
                .bind(full_tag.to_string())
                .fetch_optional(&mut **tx)
                .await?;

        if existing.is_some() {
            return Err(crate::Error::DuplicateTag(full_tag));
        }

        let definition = TagDefinition {
            tag_id: TagId::generate(),
            full_tag: full_tag.to_string(),
            prefix: full_tag.prefix.clone(),
            code: full_tag.code.clone(),
            description: new.description.clone(),
            color: new.color.clone(),
            is_active: true,
            customer_count: 0,
            created_at: Utc::now(),
        };

        let inserted = sqlx::query(
            r#"
                INSERT INTO tag_definitions
                    (tag_id, prefix, code, full_tag, description, color, is_active, customer_count, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?);
            "#,
        )
        .bind(definition.tag_id)
        .bind(&definition.prefix)
        .bind(&definition.code)
        .bind(&definition.full_tag)
        .bind(&definition.description)
        .bind(&definition.color)
        .bind(definition.is_active)
        .bind(definition.customer_count)
        .bind(definition.created_at)
        .execute(&mut **tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(error)) if error.is_unique_violation() => {
                return Err(crate::Error::DuplicateTag(full_tag));
            }
            Err(error) => return Err(error.into()),
        }

        info!("Created tag {}", definition.full_tag);

        Ok(definition)
    }

    pub async fn find_active(
        tx: &mut Transaction<'_, Sqlite>,
        full_tag: &str,
    ) -> Result<TagDefinition, crate::Error> {
        sqlx::query_as("SELECT * FROM tag_definitions WHERE full_tag = ? AND is_active;")
            .bind(full_tag)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| crate::Error::TagNotFound(full_tag.to_owned()))
    }

    /// Looks up a definition whether or not it is active.
    pub async fn get_by_full_tag(
        pricetag: &Pricetag,
        full_tag: &str,
    ) -> Result<TagDefinition, crate::Error> {
        sqlx::query_as("SELECT * FROM tag_definitions WHERE full_tag = ?;")
            .bind(full_tag)
            .fetch_optional(&pricetag.pool)
            .await?
            .ok_or_else(|| crate::Error::TagNotFound(full_tag.to_owned()))
    }

    pub async fn list(
        pricetag: &Pricetag,
        include_inactive: bool,
    ) -> Result<Vec<TagDefinition>, crate::Error> {
        Ok(sqlx::query_as(
            "SELECT * FROM tag_definitions WHERE is_active OR ? ORDER BY full_tag;",
        )
        .bind(include_inactive)
        .fetch_all(&pricetag.pool)
        .await?)
    }

    pub async fn deactivate(
        tx: &mut Transaction<'_, Sqlite>,
        full_tag: &str,
    ) -> Result<TagDefinition, crate::Error> {
        let definition: TagDefinition = sqlx::query_as(
            "UPDATE tag_definitions SET is_active = FALSE WHERE full_tag = ? RETURNING *;",
        )
        .bind(full_tag)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| crate::Error::TagNotFound(full_tag.to_owned()))?;

        info!("Deactivated tag {full_tag}");

        Ok(definition)
    }

    /// Changes display metadata only. References already copied into
    /// customers and addresses keep their structural fields.
    pub async fn update_display(
        tx: &mut Transaction<'_, Sqlite>,
        full_tag: &str,
        description: Option<String>,
        color: Option<String>,
    ) -> Result<TagDefinition, crate::Error> {
        if let Some(color) = &color {
            validate_color(color)?;
        }

        Ok(sqlx::query_as(
            r#"
                UPDATE tag_definitions
                SET description = COALESCE(?, description), color = COALESCE(?, color)
                WHERE full_tag = ?
                RETURNING *;
            "#,
        )
        .bind(description)
        .bind(color)
        .bind(full_tag)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| crate::Error::TagNotFound(full_tag.to_owned()))?)
    }

    pub async fn adjust_count(
        tx: &mut Transaction<'_, Sqlite>,
        tag_id: TagId,
        delta: i64,
    ) -> Result<(), crate::Error> {
        let result = sqlx::query(
            "UPDATE tag_definitions SET customer_count = MAX(customer_count + ?, 0) WHERE tag_id = ?;",
        )
        .bind(delta)
        .bind(tag_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            warn!("Could not adjust customer count of unknown tag {tag_id}");
        }

        Ok(())
    }
}

#[async_trait]
impl<'c> TagCatalog for Transaction<'c, Sqlite> {
    async fn find_tag_definition(&mut self, full_tag: &str) -> Result<TagDefinition, crate::Error> {
        TagDefinition::find_active(self, full_tag).await
    }

    async fn adjust_customer_count(
        &mut self,
        tag_id: TagId,
        delta: i64,
    ) -> Result<(), crate::Error> {
        TagDefinition::adjust_count(self, tag_id, delta).await
    }
}

impl Pricetag {
    pub async fn create_tag_definition(
        &self,
        new: &NewTagDefinition,
    ) -> Result<TagDefinition, crate::Error> {
        let mut tx = self.begin().await?;
        let definition = TagDefinition::create(&mut tx, new).await?;
        tx.commit().await?;

        Ok(definition)
    }

    pub async fn list_tag_definitions(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<TagDefinition>, crate::Error> {
        TagDefinition::list(self, include_inactive).await
    }

    pub async fn find_tag_definition(&self, full_tag: &str) -> Result<TagDefinition, crate::Error> {
        let mut tx = self.begin().await?;
        let definition = TagDefinition::find_active(&mut tx, full_tag).await?;
        tx.commit().await?;

        Ok(definition)
    }

    /// Like [`Pricetag::find_tag_definition`], but also returns inactive definitions.
    pub async fn get_tag_definition_any(&self, full_tag: &str) -> Result<TagDefinition, crate::Error> {
        TagDefinition::get_by_full_tag(self, full_tag).await
    }

    pub async fn deactivate_tag_definition(
        &self,
        full_tag: &str,
    ) -> Result<TagDefinition, crate::Error> {
        let mut tx = self.begin().await?;
        let definition = TagDefinition::deactivate(&mut tx, full_tag).await?;
        tx.commit().await?;

        Ok(definition)
    }

    pub async fn update_tag_display(
        &self,
        full_tag: &str,
        description: Option<String>,
        color: Option<String>,
    ) -> Result<TagDefinition, crate::Error> {
        let mut tx = self.begin().await?;
        let definition = TagDefinition::update_display(&mut tx, full_tag, description, color).await?;
        tx.commit().await?;

        Ok(definition)
    }

    /// Recomputes every `customer_count` from the customers' tag lists and
    /// returns how many definitions had drifted.
    pub async fn recount_customer_counts(&self) -> Result<usize, crate::Error> {
        let mut tx = self.begin().await?;

        let tag_lists: Vec<(sqlx::types::Json<Vec<TagRef>>,)> =
            sqlx::query_as("SELECT tags FROM customers;")
                .fetch_all(&mut *tx)
                .await?;

        let mut counts: HashMap<TagId, i64> = HashMap::new();

        for (tags,) in tag_lists {
            for tag in tags.0 {
                *counts.entry(tag.tag_id).or_default() += 1;
            }
        }

        let stored: Vec<(TagId, String, i64)> =
            sqlx::query_as("SELECT tag_id, full_tag, customer_count FROM tag_definitions;")
                .fetch_all(&mut *tx)
                .await?;

        let mut drifted = 0;

        for (tag_id, full_tag, customer_count) in stored {
            let actual = counts.get(&tag_id).copied().unwrap_or_default();

            if actual != customer_count {
                warn!("Customer count of {full_tag} drifted: stored {customer_count}, actual {actual}");

                sqlx::query("UPDATE tag_definitions SET customer_count = ? WHERE tag_id = ?;")
                    .bind(actual)
                    .bind(tag_id)
                    .execute(&mut *tx)
                    .await?;

                drifted += 1;
            }
        }

        tx.commit().await?;

        Ok(drifted)
    }
}
