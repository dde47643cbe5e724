pub mod legacy;

use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    str::FromStr,
};

use lazy_static::lazy_static;
use regex::Regex;
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{
    models::{NewTagDefinition, TagDefinition, TagRef},
    parse::{complete, full_tag, segment, ParseError},
};

pub use legacy::RawTag;

lazy_static! {
    static ref COLOR: Regex = Regex::new(r#"^#[0-9a-fA-F]{6}$"#).unwrap();
}

/// A parsed `prefix:code` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct FullTag {
    pub prefix: String,
    pub code: String,
}

impl FullTag {
    pub fn new(prefix: impl Into<String>, code: impl Into<String>) -> Result<Self, crate::Error> {
        let prefix = prefix.into();
        let code = code.into();

        validate_segment("prefix", &prefix)?;
        validate_segment("code", &code)?;

        Ok(Self { prefix, code })
    }
}

impl Display for FullTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.prefix, self.code)
    }
}

impl FromStr for FullTag {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, code) = complete(s, full_tag)?;

        Ok(Self {
            prefix: prefix.to_owned(),
            code: code.to_owned(),
        })
    }
}

pub fn validate_segment(field: &'static str, value: &str) -> Result<(), crate::Error> {
    let valid = matches!(segment(value), Ok((rest, _)) if rest.is_empty());

    if !valid {
        return Err(crate::Error::Validation {
            field,
            value: value.to_owned(),
            reason: "must be non-empty and contain only lowercase letters, digits and hyphens",
        });
    }

    Ok(())
}

pub fn validate_color(color: &str) -> Result<(), crate::Error> {
    if !COLOR.is_match(color) {
        return Err(crate::Error::Validation {
            field: "color",
            value: color.to_owned(),
            reason: "must be a hex color like #1f8a70",
        });
    }

    Ok(())
}

impl NewTagDefinition {
    pub fn full_tag(&self) -> Result<FullTag, crate::Error> {
        if let Some(color) = &self.color {
            validate_color(color)?;
        }

        FullTag::new(self.prefix.trim(), self.code.trim())
    }
}

impl From<&TagDefinition> for TagRef {
    fn from(definition: &TagDefinition) -> Self {
        Self {
            tag_id: definition.tag_id,
            full_tag: definition.full_tag.clone(),
            prefix: definition.prefix.clone(),
            code: definition.code.clone(),
        }
    }
}

impl TagRef {
    pub fn same_prefix(&self, other: &TagRef) -> bool {
        self.prefix == other.prefix
    }

    pub fn is(&self, full_tag: &str) -> bool {
        self.full_tag == full_tag
    }
}

impl PartialEq for TagRef {
    fn eq(&self, other: &Self) -> bool {
        self.full_tag == other.full_tag
    }
}

impl Eq for TagRef {}

impl Hash for TagRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_tag.hash(state);
    }
}

impl Display for TagRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_tag)
    }
}

/// Drops earlier entries that share a prefix with a later one.
pub fn dedup_by_prefix(tags: Vec<TagRef>) -> Vec<TagRef> {
    let mut result: Vec<TagRef> = Vec::with_capacity(tags.len());

    for tag in tags {
        result.retain(|existing| !existing.same_prefix(&tag));
        result.push(tag);
    }

    result
}

#[cfg(test)]
mod test {
    use std::{collections::HashSet, str::FromStr};

    use crate::{
        models::NewTagDefinition,
        tag::{dedup_by_prefix, validate_color, validate_segment, FullTag},
        test::tag_ref,
    };

    #[test]
    fn test_full_tag_display_round_trip() {
        let tag = FullTag::from_str("categoria-clienti:idraulico").unwrap();

        assert_eq!("categoria-clienti", tag.prefix);
        assert_eq!("idraulico", tag.code);
        assert_eq!("categoria-clienti:idraulico", tag.to_string());
    }

    #[test]
    fn test_full_tag_serializes_as_string() {
        let tag = FullTag::new("categoria-di-sconto", "sconto-45").unwrap();

        assert_eq!(
            r#""categoria-di-sconto:sconto-45""#,
            serde_json::to_string(&tag).unwrap()
        );
        assert_eq!(
            tag,
            serde_json::from_str::<FullTag>(r#""categoria-di-sconto:sconto-45""#).unwrap()
        );
        assert!(serde_json::from_str::<FullTag>(r#""Bad Tag""#).is_err());
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("prefix", "categoria-di-sconto").is_ok());
        assert!(validate_segment("code", "sconto-45").is_ok());

        for bad in ["", "Sconto", "sconto 45", "sconto_45", "a:b", "scontò"] {
            assert!(
                matches!(
                    validate_segment("code", bad),
                    Err(crate::Error::Validation { field: "code", .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("#1F8a70").is_ok());
        assert!(validate_color("1f8a70").is_err());
        assert!(validate_color("#1f8a7").is_err());
    }

    #[test]
    fn test_new_definition_trims() {
        let new = NewTagDefinition {
            prefix: " categoria-clienti ".into(),
            code: "idraulico".into(),
            ..Default::default()
        };

        assert_eq!(
            "categoria-clienti:idraulico",
            new.full_tag().unwrap().to_string()
        );
    }

    #[test]
    fn test_tag_ref_identity_is_full_tag() {
        let stale = tag_ref("categoria-di-sconto:sconto-45");
        let fresh = tag_ref("categoria-di-sconto:sconto-45");

        assert_ne!(stale.tag_id, fresh.tag_id);
        assert_eq!(stale, fresh);
        assert_eq!(1, HashSet::from([stale.clone(), fresh]).len());

        assert_ne!(stale, tag_ref("categoria-di-sconto:sconto-50"));
    }

    #[test]
    fn test_dedup_by_prefix() {
        let tags = vec![
            tag_ref("categoria-di-sconto:sconto-45"),
            tag_ref("categoria-clienti:idraulico"),
            tag_ref("categoria-di-sconto:sconto-50"),
        ];

        let deduped: Vec<String> = dedup_by_prefix(tags)
            .into_iter()
            .map(|t| t.full_tag)
            .collect();

        assert_eq!(
            vec!["categoria-clienti:idraulico", "categoria-di-sconto:sconto-50"],
            deduped
        );
    }
}
