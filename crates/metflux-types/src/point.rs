//! Points and batches: what the reporter writes to the store.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Tag set shared by all points produced by one reporter.
pub type Tags = Arc<BTreeMap<String, String>>;

/// Value of a single field of a [`Point`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Boolean(_) | Self::String(_) => None,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// One timestamped row in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Name of the series the point belongs to.
    pub measurement: String,

    pub tags: Tags,

    pub fields: BTreeMap<String, FieldValue>,

    /// Capture time.  Points without a timestamp are stamped by the reporter
    /// with the time of the export cycle that produced them.
    pub time: Option<DateTime<Utc>>,
}

impl Point {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Tags::default(),
            fields: BTreeMap::new(),
            time: None,
        }
    }

    /// Replace the tag set.
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Add a single tag, copying the tag set if it is shared.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.tags).insert(key.into(), value.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}

/// The unit of a single write: every point produced by one export cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchPoints {
    pub database: String,
    pub points: Vec<Point>,
}

impl BatchPoints {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
