//! Effective tag resolution.
//!
//! An address's overrides replace the customer's default tag of the same
//! prefix. Tags of other prefixes pass through. Surviving customer tags come
//! first in their original order, followed by the overrides in theirs.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::models::TagRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TagSource {
    Customer,
    AddressOverride,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveTag {
    pub prefix: String,
    pub tag: TagRef,
    pub source: TagSource,
}

pub fn resolve_effective_tags_detailed(
    customer_tags: &[TagRef],
    address_overrides: &[TagRef],
) -> Vec<EffectiveTag> {
    let mut effective: Vec<EffectiveTag> = customer_tags
        .iter()
        .map(|tag| EffectiveTag {
            prefix: tag.prefix.clone(),
            tag: tag.clone(),
            source: TagSource::Customer,
        })
        .collect();

    for tag in address_overrides {
        effective.retain(|existing| existing.prefix != tag.prefix);
        effective.push(EffectiveTag {
            prefix: tag.prefix.clone(),
            tag: tag.clone(),
            source: TagSource::AddressOverride,
        });
    }

    effective
}

pub fn resolve_effective_tags(customer_tags: &[TagRef], address_overrides: &[TagRef]) -> Vec<String> {
    resolve_effective_tags_detailed(customer_tags, address_overrides)
        .into_iter()
        .map(|effective| effective.tag.full_tag)
        .collect()
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::{resolve_effective_tags, resolve_effective_tags_detailed, TagSource};
    use crate::test::tag_ref;

    const SCONTO_45: &str = "categoria-di-sconto:sconto-45";
    const SCONTO_50: &str = "categoria-di-sconto:sconto-50";
    const IDRAULICO: &str = "categoria-clienti:idraulico";

    #[test]
    fn test_no_overrides() {
        let customer = [tag_ref(SCONTO_45), tag_ref(IDRAULICO)];

        assert_eq!(vec![SCONTO_45, IDRAULICO], resolve_effective_tags(&customer, &[]));
        assert!(resolve_effective_tags_detailed(&customer, &[])
            .iter()
            .all(|effective| effective.source == TagSource::Customer));
    }

    #[test]
    fn test_override_replaces_same_prefix() {
        let customer = [tag_ref(SCONTO_45), tag_ref(IDRAULICO)];
        let overrides = [tag_ref(SCONTO_50)];

        assert_eq!(
            vec![IDRAULICO, SCONTO_50],
            resolve_effective_tags(&customer, &overrides)
        );

        let detailed = resolve_effective_tags_detailed(&customer, &overrides);

        assert_eq!(2, detailed.len());
        assert_eq!(TagSource::Customer, detailed[0].source);
        assert_eq!("categoria-clienti", detailed[0].prefix);
        assert_eq!(TagSource::AddressOverride, detailed[1].source);
        assert_eq!("categoria-di-sconto", detailed[1].prefix);
        assert_eq!(SCONTO_50, detailed[1].tag.full_tag);
    }

    #[test]
    fn test_removing_override_reverts() {
        let customer = [tag_ref(SCONTO_45), tag_ref(IDRAULICO)];

        assert_eq!(
            vec![IDRAULICO, SCONTO_50],
            resolve_effective_tags(&customer, &[tag_ref(SCONTO_50)])
        );
        assert_eq!(vec![SCONTO_45, IDRAULICO], resolve_effective_tags(&customer, &[]));
    }

    #[test]
    fn test_new_prefix_override_is_appended() {
        let customer = [tag_ref(SCONTO_45)];
        let overrides = [tag_ref("listino:ingrosso")];

        assert_eq!(
            vec![SCONTO_45, "listino:ingrosso"],
            resolve_effective_tags(&customer, &overrides)
        );
    }

    #[test]
    fn test_overrides_only() {
        let overrides = [tag_ref(SCONTO_50), tag_ref(IDRAULICO)];

        assert_eq!(vec![SCONTO_50, IDRAULICO], resolve_effective_tags(&[], &overrides));
        assert!(resolve_effective_tags(&[], &[]).is_empty());
    }

    #[test]
    fn test_customer_tags_precede_overrides() {
        let customer = [
            tag_ref("a:one"),
            tag_ref("b:one"),
            tag_ref("c:one"),
            tag_ref("d:one"),
        ];
        let overrides = [tag_ref("c:two"), tag_ref("e:two"), tag_ref("a:two")];

        assert_eq!(
            vec!["b:one", "d:one", "c:two", "e:two", "a:two"],
            resolve_effective_tags(&customer, &overrides)
        );
    }

    #[test]
    fn test_one_entry_per_prefix() {
        let customer = [tag_ref("a:one"), tag_ref("b:one"), tag_ref("c:one")];
        let overrides = [tag_ref("b:two"), tag_ref("d:two")];

        let detailed = resolve_effective_tags_detailed(&customer, &overrides);

        let prefixes: Vec<&str> = detailed.iter().map(|e| e.prefix.as_str()).collect();
        let unique: HashSet<&str> = prefixes.iter().copied().collect();

        assert_eq!(prefixes.len(), unique.len());
        assert_eq!(HashSet::from(["a", "b", "c", "d"]), unique);

        for effective in &detailed {
            let expected = overrides
                .iter()
                .chain(customer.iter().filter(|t| !overrides.iter().any(|o| o.same_prefix(t))))
                .find(|t| t.prefix == effective.prefix)
                .unwrap();

            assert_eq!(expected, &effective.tag);
        }
    }

    #[test]
    fn test_source_wire_names() {
        assert_eq!(
            r#""address_override""#,
            serde_json::to_string(&TagSource::AddressOverride).unwrap()
        );
        assert_eq!("customer", TagSource::Customer.to_string());
    }
}
