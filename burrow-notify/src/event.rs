//! Event JSON synthesis (spec §6.4): the AWS S3-compatible subset emitted
//! on every mutating bucket operation.

use serde_json::{json, Value};

/// The closed set of event names this system emits (spec §3).
pub const OBJECT_CREATED_PUT: &str = "s3:ObjectCreated:Put";
pub const OBJECT_CREATED_POST: &str = "s3:ObjectCreated:Post";
pub const OBJECT_CREATED_COPY: &str = "s3:ObjectCreated:Copy";
pub const OBJECT_REMOVED_DELETE: &str = "s3:ObjectRemoved:Delete";

#[derive(Debug, Clone)]
pub struct ObjectEvent {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub event_name: &'static str,
}

impl ObjectEvent {
    pub fn put(bucket: impl Into<String>, key: impl Into<String>, size: u64) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            size,
            event_name: OBJECT_CREATED_PUT,
        }
    }

    /// True iff `pattern` (an entry from a `<Event>` element, optionally
    /// ending in `*` as a wildcard) matches this event's name.
    pub fn name_matches(&self, pattern: &str) -> bool {
        match pattern.strip_suffix('*') {
            Some(prefix) => self.event_name.starts_with(prefix),
            None => pattern == self.event_name,
        }
    }

    pub fn to_json(&self, region: &str) -> Value {
        json!({
            "Records": [{
                "eventVersion": "2.0",
                "eventSource": "aws:s3",
                "awsRegion": region,
                "eventName": self.event_name,
                "eventTime": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "bucket": {
                        "name": self.bucket,
                        "arn": burrow_core::arn::s3_arn(&self.bucket),
                    },
                    "object": {
                        "key": self.key,
                        "size": self.size,
                    }
                }
            }]
        })
    }
}
