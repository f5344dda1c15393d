//! A bucket's notification configuration: the raw XML shape (kept so it
//! round-trips byte-identically back out) plus a compiled handler list used
//! for fast dispatch matching (spec §4.8).

use crate::event::ObjectEvent;
use crate::filter::Filter;
use crate::xml::{self, NotificationConfigurationXml};
use crate::Error;

#[derive(Debug, Clone)]
pub struct Handler {
    pub target_arn: String,
    pub event_patterns: Vec<String>,
    pub filter: Filter,
}

impl Handler {
    fn matches(&self, event: &ObjectEvent) -> bool {
        self.event_patterns.iter().any(|p| event.name_matches(p)) && self.filter.matches(event)
    }
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    raw: NotificationConfigurationXml,
    handlers: Vec<Handler>,
}

impl NotificationConfig {
    pub fn empty() -> Self {
        Self {
            raw: NotificationConfigurationXml::default(),
            handlers: Vec::new(),
        }
    }

    pub fn parse(xml_body: &str) -> Result<Self, Error> {
        let raw = xml::parse(xml_body)?;
        Self::compile(raw)
    }

    fn compile(raw: NotificationConfigurationXml) -> Result<Self, Error> {
        let mut handlers = Vec::with_capacity(raw.cloud_function_configurations.len());
        for entry in &raw.cloud_function_configurations {
            handlers.push(Handler {
                target_arn: entry.cloud_function.clone(),
                event_patterns: entry.events.clone(),
                filter: Filter::compile(entry.filter.as_ref())?,
            });
        }
        Ok(Self { raw, handlers })
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        xml::to_xml_string(&self.raw)
    }

    /// Handlers whose event pattern and filter both match `event`, in
    /// declaration order.
    pub fn matching_handlers(&self, event: &ObjectEvent) -> impl Iterator<Item = &Handler> {
        self.handlers.iter().filter(move |h| h.matches(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xml_with_prefix_filter() -> &'static str {
        r#"<NotificationConfiguration>
  <CloudFunctionConfiguration>
    <CloudFunction>arn:aws:lambda:function:thumbnailer</CloudFunction>
    <Event>s3:ObjectCreated:*</Event>
    <Filter>
      <S3Key>
        <FilterRule><Name>prefix</Name><Value>uploads/</Value></FilterRule>
      </S3Key>
    </Filter>
  </CloudFunctionConfiguration>
</NotificationConfiguration>"#
    }

    #[test]
    fn matching_handlers_respects_event_name_and_prefix() {
        let cfg = NotificationConfig::parse(xml_with_prefix_filter()).unwrap();
        let matched = ObjectEvent::put("b", "uploads/a.png", 10);
        let unmatched_prefix = ObjectEvent::put("b", "other/a.png", 10);

        assert_eq!(cfg.matching_handlers(&matched).count(), 1);
        assert_eq!(cfg.matching_handlers(&unmatched_prefix).count(), 0);
    }

    #[test]
    fn empty_config_matches_nothing() {
        let cfg = NotificationConfig::empty();
        let event = ObjectEvent::put("b", "k", 1);
        assert_eq!(cfg.matching_handlers(&event).count(), 0);
    }

    #[test]
    fn round_trips_through_xml_serialization() {
        let cfg = NotificationConfig::parse(xml_with_prefix_filter()).unwrap();
        let serialized = cfg.to_xml_string().unwrap();
        let reparsed = NotificationConfig::parse(&serialized).unwrap();
        assert_eq!(reparsed.handlers.len(), 1);
    }
}
