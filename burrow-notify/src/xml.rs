//! Raw XML shape of a bucket's `NotificationConfiguration` (spec §4.8),
//! deserialized/serialized via `quick-xml`'s serde integration so the
//! persisted file round-trips byte-for-byte through the same struct a
//! client PUT populated.

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename = "NotificationConfiguration")]
pub struct NotificationConfigurationXml {
    #[serde(rename = "CloudFunctionConfiguration", default)]
    pub cloud_function_configurations: Vec<CloudFunctionConfigurationXml>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CloudFunctionConfigurationXml {
    #[serde(rename = "CloudFunction")]
    pub cloud_function: String,
    #[serde(rename = "Event", default)]
    pub events: Vec<String>,
    #[serde(rename = "Filter", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterXml>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FilterXml {
    #[serde(rename = "S3Key", default, skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<S3KeyXml>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct S3KeyXml {
    #[serde(rename = "FilterRule", default)]
    pub filter_rules: Vec<FilterRuleXml>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FilterRuleXml {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
}

pub fn parse(xml: &str) -> Result<NotificationConfigurationXml, Error> {
    Ok(quick_xml::de::from_str(xml)?)
}

pub fn to_xml_string(cfg: &NotificationConfigurationXml) -> Result<String, Error> {
    Ok(quick_xml::se::to_string(cfg)?)
}
