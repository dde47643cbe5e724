use itertools::Itertools;
use pricetag::models::TagRef;

pub fn join_tags(tags: &[TagRef]) -> String {
    tags.iter().map(|tag| tag.full_tag.as_str()).join(", ")
}

pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}
