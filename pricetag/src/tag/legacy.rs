use std::fmt::Display;

use serde::Deserialize;

/// Tag shapes found in older customer documents and import files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawTag {
    Plain(String),
    Structured(StructuredTag),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct StructuredTag {
    #[serde(default, alias = "fullTag", alias = "tag")]
    pub full_tag: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl RawTag {
    /// The `prefix:code` string to look up, if the shape carries one.
    pub fn full_tag(&self) -> Option<String> {
        match self {
            RawTag::Plain(tag) => Some(tag.trim().to_owned()).filter(|t| !t.is_empty()),
            RawTag::Structured(StructuredTag {
                full_tag: Some(full_tag),
                ..
            }) => Some(full_tag.trim().to_owned()),
            RawTag::Structured(StructuredTag {
                prefix: Some(prefix),
                code: Some(code),
                ..
            }) => Some(format!("{}:{}", prefix.trim(), code.trim())),
            RawTag::Structured(_) => None,
        }
    }
}

impl Display for RawTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawTag::Plain(tag) => f.write_str(tag),
            RawTag::Structured(StructuredTag {
                full_tag: Some(full_tag),
                ..
            }) => f.write_str(full_tag),
            RawTag::Structured(StructuredTag { prefix, code, .. }) => write!(
                f,
                "{}:{}",
                prefix.as_deref().unwrap_or("?"),
                code.as_deref().unwrap_or("?")
            ),
        }
    }
}

impl From<&str> for RawTag {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_owned())
    }
}

#[cfg(test)]
mod test {
    use super::RawTag;

    fn parse(json: &str) -> RawTag {
        serde_json::from_str(json).expect("valid raw tag")
    }

    #[test]
    fn test_plain_string() {
        assert_eq!(
            Some("categoria-clienti:idraulico".to_owned()),
            parse(r#"" categoria-clienti:idraulico ""#).full_tag()
        );
        assert_eq!(None, parse(r#""   ""#).full_tag());
    }

    #[test]
    fn test_field_aliases() {
        for json in [
            r#"{"full_tag": "categoria-di-sconto:sconto-45"}"#,
            r#"{"fullTag": "categoria-di-sconto:sconto-45", "tagId": "abc"}"#,
            r#"{"tag": "categoria-di-sconto:sconto-45", "_id": "abc"}"#,
            r#"{"prefix": "categoria-di-sconto", "code": "sconto-45"}"#,
        ] {
            assert_eq!(
                Some("categoria-di-sconto:sconto-45".to_owned()),
                parse(json).full_tag(),
                "{json}"
            );
        }
    }

    #[test]
    fn test_incomplete_object() {
        let raw = parse(r#"{"prefix": "categoria-di-sconto"}"#);

        assert_eq!(None, raw.full_tag());
        assert_eq!("categoria-di-sconto:?", raw.to_string());
    }
}
