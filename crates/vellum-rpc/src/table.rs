use std::fmt;

use bson::Bson;

use crate::error::MetadataError;
use crate::flags::QueryFlags;

// ── Field table ───────────────────────────────────────────────
//
// Request/Reply | legacy location                   | metadata key
// ─────────────────────────────────────────────────────────────────
// Request       | secondaryOk query-flags bit       | $secondaryOk
//               | (or a slaveOk bool command field) |
// Request       | $readPreference command field     | $readPreference
// Request       | $impersonatedUsers command field  | $impersonatedUsers
// Request       | $impersonatedRoles command field  | $impersonatedRoles
// Request       | maxTimeMS command field           | $maxTimeMS
// Reply         | gleStats reply field              | $gleStats
//
// Every converter consults this table, so adding a concept is a
// one-row change. Fields outside the table are never inspected.

pub(crate) const SECONDARY_OK: &str = "$secondaryOk";
pub(crate) const SECONDARY_OK_FIELD: &str = "slaveOk";
pub(crate) const READ_PREFERENCE: &str = "$readPreference";
pub(crate) const IMPERSONATED_USERS: &str = "$impersonatedUsers";
pub(crate) const IMPERSONATED_ROLES: &str = "$impersonatedRoles";
pub(crate) const MAX_TIME_MS: &str = "$maxTimeMS";
pub(crate) const MAX_TIME_MS_FIELD: &str = "maxTimeMS";
pub(crate) const GLE_STATS: &str = "$gleStats";
pub(crate) const GLE_STATS_FIELD: &str = "gleStats";

/// Where a metadata concept lives in the legacy encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LegacyLocation {
    /// An ordinary field of the command or reply document.
    Field(&'static str),
    /// A bit of the query-flags word. `field_alias` is the spelling some
    /// legacy senders use as a bool command field instead of the bit;
    /// downconversion always emits the bit.
    FlagBit {
        bit: QueryFlags,
        field_alias: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Request,
    Reply,
}

/// Value kind a mapped field must carry on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Doc,
    Array,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Bool => write!(f, "boolean"),
            FieldKind::Int => write!(f, "integer"),
            FieldKind::Doc => write!(f, "document"),
            FieldKind::Array => write!(f, "array"),
        }
    }
}

pub(crate) struct FieldMapping {
    pub legacy: LegacyLocation,
    pub metadata_key: &'static str,
    pub kind: FieldKind,
    pub direction: Direction,
}

pub(crate) const FIELD_MAPPINGS: &[FieldMapping] = &[
    FieldMapping {
        legacy: LegacyLocation::FlagBit {
            bit: QueryFlags::SECONDARY_OK,
            field_alias: SECONDARY_OK_FIELD,
        },
        metadata_key: SECONDARY_OK,
        kind: FieldKind::Bool,
        direction: Direction::Request,
    },
    FieldMapping {
        legacy: LegacyLocation::Field(READ_PREFERENCE),
        metadata_key: READ_PREFERENCE,
        kind: FieldKind::Doc,
        direction: Direction::Request,
    },
    FieldMapping {
        legacy: LegacyLocation::Field(IMPERSONATED_USERS),
        metadata_key: IMPERSONATED_USERS,
        kind: FieldKind::Array,
        direction: Direction::Request,
    },
    FieldMapping {
        legacy: LegacyLocation::Field(IMPERSONATED_ROLES),
        metadata_key: IMPERSONATED_ROLES,
        kind: FieldKind::Array,
        direction: Direction::Request,
    },
    FieldMapping {
        legacy: LegacyLocation::Field(MAX_TIME_MS_FIELD),
        metadata_key: MAX_TIME_MS,
        kind: FieldKind::Int,
        direction: Direction::Request,
    },
    FieldMapping {
        legacy: LegacyLocation::Field(GLE_STATS_FIELD),
        metadata_key: GLE_STATS,
        kind: FieldKind::Doc,
        direction: Direction::Reply,
    },
];

impl FieldMapping {
    /// Check a present value against the mapping's expected kind.
    pub(crate) fn check_kind(&self, field: &str, value: &Bson) -> Result<(), MetadataError> {
        let ok = match self.kind {
            FieldKind::Bool => matches!(value, Bson::Boolean(_)),
            FieldKind::Int => matches!(value, Bson::Int32(_) | Bson::Int64(_)),
            FieldKind::Doc => matches!(value, Bson::Document(_)),
            FieldKind::Array => matches!(value, Bson::Array(_)),
        };
        if ok {
            Ok(())
        } else {
            Err(MetadataError::MalformedField {
                field: field.to_string(),
                expected: self.kind,
                actual: value.element_type(),
            })
        }
    }
}

/// Look up a mapping by its legacy document-field spelling.
pub(crate) fn by_legacy_field(name: &str, direction: Direction) -> Option<&'static FieldMapping> {
    FIELD_MAPPINGS.iter().find(|m| {
        m.direction == direction
            && match m.legacy {
                LegacyLocation::Field(field) => field == name,
                LegacyLocation::FlagBit { field_alias, .. } => field_alias == name,
            }
    })
}

/// Look up a mapping by its metadata-document key.
pub(crate) fn by_metadata_key(key: &str, direction: Direction) -> Option<&'static FieldMapping> {
    FIELD_MAPPINGS
        .iter()
        .find(|m| m.direction == direction && m.metadata_key == key)
}

/// Flag-bit mappings for the given direction.
pub(crate) fn flag_mappings(
    direction: Direction,
) -> impl Iterator<Item = (QueryFlags, &'static FieldMapping)> {
    FIELD_MAPPINGS.iter().filter_map(move |m| match m.legacy {
        LegacyLocation::FlagBit { bit, .. } if m.direction == direction => Some((bit, m)),
        _ => None,
    })
}
