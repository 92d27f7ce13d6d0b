//! Lifecycle notifications from the content runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::value::ContentRecord;
use semsearch_core::Error;

/// What happened to a source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleKind {
    /// Record created.
    Created,
    /// Record updated (including publish).
    Updated,
    /// Record deleted.
    Deleted,
}

impl LifecycleKind {
    /// Lowercase name used in logs and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "created" | "create" => Ok(Self::Created),
            "updated" | "update" => Ok(Self::Updated),
            "deleted" | "delete" => Ok(Self::Deleted),
            other => Err(Error::validation(format!("unknown lifecycle event: {other}"))),
        }
    }
}

/// A lifecycle notification for one record of one content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    /// Event kind.
    pub kind: LifecycleKind,

    /// Content type of the record.
    pub content_type: String,

    /// The record as the runtime reported it after the change.
    pub record: ContentRecord,
}

impl LifecycleEvent {
    /// Create an event.
    pub fn new(kind: LifecycleKind, content_type: impl Into<String>, record: ContentRecord) -> Self {
        Self {
            kind,
            content_type: content_type.into(),
            record,
        }
    }

    /// A `Created` event.
    pub fn created(content_type: impl Into<String>, record: ContentRecord) -> Self {
        Self::new(LifecycleKind::Created, content_type, record)
    }

    /// An `Updated` event.
    pub fn updated(content_type: impl Into<String>, record: ContentRecord) -> Self {
        Self::new(LifecycleKind::Updated, content_type, record)
    }

    /// A `Deleted` event.
    pub fn deleted(content_type: impl Into<String>, record: ContentRecord) -> Self {
        Self::new(LifecycleKind::Deleted, content_type, record)
    }
}
