//! Write configuration and backend request options
//!
//! Callers pass a [`WriteConfig`] with loosely typed keys. Uploads translate
//! the recognized keys into [`ObjectOptions`] through a fixed table; anything
//! else in the config is ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// Visibility value that maps to a public-read ACL
pub const VISIBILITY_PUBLIC: &str = "public";

/// Visibility value that maps to a private ACL
pub const VISIBILITY_PRIVATE: &str = "private";

/// File visibility as seen by filesystem callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub const fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => VISIBILITY_PUBLIC,
            Visibility::Private => VISIBILITY_PRIVATE,
        }
    }

    /// The ACL written to the backend for this visibility
    pub const fn acl(self) -> ObjectAcl {
        match self {
            Visibility::Public => ObjectAcl::PublicRead,
            Visibility::Private => ObjectAcl::Private,
        }
    }

    /// Public only for a public-read ACL
    pub const fn from_acl(acl: ObjectAcl) -> Self {
        match acl {
            ObjectAcl::PublicRead => Visibility::Public,
            _ => Visibility::Private,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            VISIBILITY_PUBLIC => Ok(Visibility::Public),
            VISIBILITY_PRIVATE => Ok(Visibility::Private),
            other => Err(Error::General(format!(
                "Unknown visibility '{other}', expected 'public' or 'private'"
            ))),
        }
    }
}

/// Canned object ACL as understood by OSS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectAcl {
    /// Inherit the bucket ACL
    Default,
    Private,
    PublicRead,
    PublicReadWrite,
}

impl ObjectAcl {
    pub const fn as_str(self) -> &'static str {
        match self {
            ObjectAcl::Default => "default",
            ObjectAcl::Private => "private",
            ObjectAcl::PublicRead => "public-read",
            ObjectAcl::PublicReadWrite => "public-read-write",
        }
    }
}

impl fmt::Display for ObjectAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectAcl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(ObjectAcl::Default),
            "private" => Ok(ObjectAcl::Private),
            "public-read" => Ok(ObjectAcl::PublicRead),
            "public-read-write" => Ok(ObjectAcl::PublicReadWrite),
            other => Err(Error::General(format!("Unknown object ACL '{other}'"))),
        }
    }
}

/// Per-call configuration handed to write operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteConfig {
    values: Map<String, Value>,
}

impl WriteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// Backend-side option a config key maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OssOption {
    ContentType,
    ContentLength,
    Headers,
}

/// Recognized config keys and the backend option each one sets
pub const OPTION_MAP: &[(&str, OssOption)] = &[
    ("contentType", OssOption::ContentType),
    ("mimetype", OssOption::ContentType),
    ("contentLength", OssOption::ContentLength),
    ("size", OssOption::ContentLength),
    ("headers", OssOption::Headers),
];

/// Request options sent along with uploads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectOptions {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    /// Raw headers passed through to the backend
    pub headers: BTreeMap<String, String>,
    pub acl: Option<ObjectAcl>,
}

impl ObjectOptions {
    /// Start from adapter-wide default headers
    pub fn with_headers(headers: BTreeMap<String, String>) -> Self {
        Self {
            headers,
            ..Default::default()
        }
    }

    /// Apply the recognized keys of `config` on top of these options.
    ///
    /// Later table entries win when a config sets two keys for the same
    /// option. A `visibility` key sets the ACL: public-read when it equals
    /// [`VISIBILITY_PUBLIC`], private for any other value.
    pub fn apply(mut self, config: &WriteConfig) -> Self {
        for (key, option) in OPTION_MAP {
            let Some(value) = config.get(key) else {
                continue;
            };
            match option {
                OssOption::ContentType => {
                    if let Some(s) = value_as_string(value) {
                        self.content_type = Some(s);
                    }
                }
                OssOption::ContentLength => {
                    if let Some(n) = value_as_u64(value) {
                        self.content_length = Some(n);
                    }
                }
                OssOption::Headers => {
                    if let Value::Object(map) = value {
                        for (name, v) in map {
                            if let Some(s) = value_as_string(v) {
                                self.headers.insert(name.clone(), s);
                            }
                        }
                    }
                }
            }
        }

        if let Some(visibility) = config.get("visibility") {
            self.acl = Some(if visibility.as_str() == Some(VISIBILITY_PUBLIC) {
                ObjectAcl::PublicRead
            } else {
                ObjectAcl::Private
            });
        }

        self
    }
}

pub(crate) fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
