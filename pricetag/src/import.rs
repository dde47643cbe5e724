//! Bulk customer import.
//!
//! Tags that are unknown or malformed are skipped one by one; the rest of the
//! record is still imported.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    assign,
    models::{Customer, CustomerId},
    tag::RawTag,
    ErrorKind, Pricetag,
};

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerRecord {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<RawTag>,
    #[serde(default)]
    pub addresses: Vec<AddressRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressRecord {
    pub label: String,
    #[serde(default, alias = "tagOverrides")]
    pub tag_overrides: Vec<RawTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTag {
    pub tag: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub customer_id: CustomerId,
    pub assigned: Vec<String>,
    pub skipped: Vec<SkippedTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedLine {
    pub line: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkImportReport {
    pub imported: Vec<ImportReport>,
    pub failed: Vec<FailedLine>,
}

impl ImportReport {
    fn skip(&mut self, tag: impl Into<String>, reason: impl Into<String>) {
        let skipped = SkippedTag {
            tag: tag.into(),
            reason: reason.into(),
        };

        warn!(
            "Customer {}: skipping tag '{}': {}",
            self.customer_id, skipped.tag, skipped.reason
        );

        self.skipped.push(skipped);
    }

    /// Records an assignment result. Only not-found errors are skipped.
    fn record<T>(&mut self, full_tag: String, result: Result<T, crate::Error>) -> Result<(), crate::Error> {
        match result {
            Ok(_) => self.assigned.push(full_tag),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                self.skip(full_tag, error.to_string())
            }
            Err(error) => return Err(error),
        }

        Ok(())
    }
}

impl Pricetag {
    pub async fn import_customer(
        &self,
        record: &CustomerRecord,
    ) -> Result<ImportReport, crate::Error> {
        let mut tx = self.begin().await?;

        let mut customer = Customer::create(&mut tx, &record.name).await?;

        let mut report = ImportReport {
            customer_id: customer.customer_id,
            assigned: Vec::new(),
            skipped: Vec::new(),
        };

        for raw in &record.tags {
            let Some(full_tag) = raw.full_tag() else {
                report.skip(raw.to_string(), "no tag name");
                continue;
            };

            let result = assign::assign_customer_tag(&mut tx, &mut customer, &full_tag).await;
            report.record(full_tag, result)?;
        }

        customer.save_tags(&mut tx).await?;

        for address_record in &record.addresses {
            let mut address = customer
                .add_address(&mut tx, &address_record.label)
                .await?
                .clone();

            for raw in &address_record.tag_overrides {
                let Some(full_tag) = raw.full_tag() else {
                    report.skip(raw.to_string(), "no tag name");
                    continue;
                };

                let result =
                    assign::assign_address_tag_override(&mut tx, &mut address, &full_tag).await;
                report.record(full_tag, result)?;
            }

            address.save_overrides(&mut tx).await?;
        }

        tx.commit().await?;

        info!(
            "Imported customer {} with {} tags, {} skipped",
            report.customer_id,
            report.assigned.len(),
            report.skipped.len()
        );

        Ok(report)
    }

    /// Imports one JSON record per line. Lines that fail are reported and the
    /// remaining lines are still imported.
    pub async fn import_lines(&self, text: &str) -> BulkImportReport {
        let mut report = BulkImportReport::default();

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;

            if line.trim().is_empty() {
                continue;
            }

            let result = match serde_json::from_str::<CustomerRecord>(line) {
                Ok(record) => self.import_customer(&record).await,
                Err(error) => Err(error.into()),
            };

            match result {
                Ok(imported) => report.imported.push(imported),
                Err(error) => {
                    warn!("Could not import line {line_number}: {error}");
                    report.failed.push(FailedLine {
                        line: line_number,
                        error: error.to_string(),
                    });
                }
            }
        }

        report
    }
}
