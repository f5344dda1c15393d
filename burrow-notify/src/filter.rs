//! Compiled filter tree (spec §4.8): an AND composition of per-field
//! predicates, currently only key-prefix. `Filter::And(vec![])` (no
//! `<Filter>` element at all) is vacuously true.

use crate::event::ObjectEvent;
use crate::xml::FilterXml;
use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Prefix(String),
}

impl Filter {
    /// `event.Records[0].s3.object.key` starting with `prefix`; an AND of
    /// zero children is vacuously true.
    pub fn matches(&self, event: &ObjectEvent) -> bool {
        match self {
            Filter::And(children) => children.iter().all(|f| f.matches(event)),
            Filter::Prefix(prefix) => event.key.starts_with(prefix.as_str()),
        }
    }

    pub fn compile(raw: Option<&FilterXml>) -> Result<Self, Error> {
        let rules = raw
            .and_then(|f| f.s3_key.as_ref())
            .map(|k| k.filter_rules.as_slice())
            .unwrap_or(&[]);
        let mut children = Vec::with_capacity(rules.len());
        for rule in rules {
            match rule.name.as_str() {
                "prefix" => children.push(Filter::Prefix(rule.value.clone())),
                other => return Err(Error::UnsupportedFilterName(other.to_string())),
            }
        }
        Ok(Filter::And(children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{FilterRuleXml, S3KeyXml};

    fn event_with_key(key: &str) -> ObjectEvent {
        ObjectEvent {
            bucket: "b".into(),
            key: key.into(),
            size: 0,
            event_name: "s3:ObjectCreated:Put",
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let f = Filter::compile(None).unwrap();
        assert!(f.matches(&event_with_key("anything")));
    }

    // Spec §8 boundary behaviour: a `<Filter>` with no `<S3Key>` (or an
    // `<S3Key>` with no rules) accepts every event.
    #[test]
    fn filter_with_empty_s3key_section_matches_everything() {
        let raw = FilterXml { s3_key: None };
        let f = Filter::compile(Some(&raw)).unwrap();
        assert!(f.matches(&event_with_key("anything")));

        let raw = FilterXml {
            s3_key: Some(S3KeyXml { filter_rules: vec![] }),
        };
        let f = Filter::compile(Some(&raw)).unwrap();
        assert!(f.matches(&event_with_key("anything")));
    }

    #[test]
    fn prefix_filter_matches_only_matching_keys() {
        let f = Filter::And(vec![Filter::Prefix("uploads/".into())]);
        assert!(f.matches(&event_with_key("uploads/photo.png")));
        assert!(!f.matches(&event_with_key("downloads/photo.png")));
    }

    #[test]
    fn unsupported_rule_name_is_rejected() {
        let raw = FilterXml {
            s3_key: Some(S3KeyXml {
                filter_rules: vec![FilterRuleXml {
                    name: "suffix".into(),
                    value: ".png".into(),
                }],
            }),
        };
        let err = Filter::compile(Some(&raw)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFilterName(n) if n == "suffix"));
    }
}
