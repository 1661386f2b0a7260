//! JSON Schema export for the config file format.

use crate::TombstoneConfig;
use schemars::{Schema, schema_for};

/// JSON Schema for `TombstoneConfig`.
#[must_use]
pub fn tombstone_config_schema() -> Schema {
    schema_for!(TombstoneConfig)
}
