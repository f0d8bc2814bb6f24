//! Container Records
//!
//! The external data store hands the engine a flat list of container records.
//! Records are replaced wholesale on every refresh and never mutated in place,
//! so the engine shares them as `Arc<ContainerRecord>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared handle to an immutable container record.
pub type RecordRef = Arc<ContainerRecord>;

/// ISO container size class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SizeClass {
    #[serde(rename = "20")]
    Twenty,
    #[serde(rename = "40")]
    Forty,
    #[serde(rename = "40HC")]
    FortyHighCube,
    #[serde(rename = "45")]
    FortyFive,
}

impl SizeClass {
    /// All size classes in display order.
    pub const ALL: [SizeClass; 4] = [
        SizeClass::Twenty,
        SizeClass::Forty,
        SizeClass::FortyHighCube,
        SizeClass::FortyFive,
    ];

    /// Short label used in the UI and in the JSON data.
    pub fn label(&self) -> &'static str {
        match self {
            SizeClass::Twenty => "20",
            SizeClass::Forty => "40",
            SizeClass::FortyHighCube => "40HC",
            SizeClass::FortyFive => "45",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operational status of a container, drives its appearance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    #[default]
    Normal,
    /// Needs attention (damage, customs hold) - rendered in the alarm color
    Flagged,
    /// Not yet confirmed in the yard - rendered lighter and pulsing
    Pending,
}

/// One container as supplied by the data store.
///
/// `slot` is kept raw; it is parsed and validated when a layer is built so a
/// single malformed address never rejects the whole record set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: String,
    /// Raw slot address, e.g. `"A1A"` or `"D7"`
    pub slot: String,
    pub size: SizeClass,
    /// Carrier / brand label, e.g. `"MAERSK"`
    pub carrier: String,
    #[serde(default)]
    pub status: ContainerStatus,
    /// Which collection of the data store the record came from
    #[serde(default)]
    pub source: String,
}

impl ContainerRecord {
    pub fn new(
        id: impl Into<String>,
        slot: impl Into<String>,
        size: SizeClass,
        carrier: impl Into<String>,
        status: ContainerStatus,
    ) -> Self {
        Self {
            id: id.into(),
            slot: slot.into(),
            size,
            carrier: carrier.into(),
            status,
            source: String::new(),
        }
    }

    /// Set the source collection tag and return self for chaining.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn into_ref(self) -> RecordRef {
        Arc::new(self)
    }
}
