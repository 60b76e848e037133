use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::error::MetadataError;
use crate::flags::QueryFlags;
use crate::table::{self, Direction, LegacyLocation};

/// A command document stripped of metadata, paired with the metadata
/// document extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandAndMetadata {
    pub command: Document,
    pub metadata: Document,
}

/// A legacy command document and its query-flags word. The command may
/// still carry metadata fields, so it must not be dispatched directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyCommandAndFlags {
    pub command: Document,
    pub flags: QueryFlags,
}

/// Parse and remove request metadata from a legacy command document and
/// flags word, producing the stripped command and a metadata document.
///
/// Fields outside the mapping table are copied through in their original
/// relative order. Absent fields are a no-op; a present field of the
/// wrong kind fails the whole conversion.
pub fn upconvert_request_metadata(
    legacy: Document,
    flags: QueryFlags,
) -> Result<CommandAndMetadata, MetadataError> {
    let mut command = Document::new();
    let mut metadata = Document::new();

    for (key, value) in legacy {
        match table::by_legacy_field(&key, Direction::Request) {
            Some(mapping) => {
                mapping.check_kind(&key, &value)?;
                metadata.insert(mapping.metadata_key, value);
            }
            None => {
                command.insert(key, value);
            }
        }
    }

    for (bit, mapping) in table::flag_mappings(Direction::Request) {
        if flags.contains(bit) {
            metadata.insert(mapping.metadata_key, true);
        }
    }

    Ok(CommandAndMetadata { command, metadata })
}

/// Fold a metadata document back into a legacy command document and
/// flags word.
///
/// Every metadata key must have a legacy location; a key outside the
/// mapping table has nowhere to go in the legacy encoding and fails the
/// conversion rather than being dropped.
pub fn downconvert_request_metadata(
    command: Document,
    metadata: Document,
) -> Result<LegacyCommandAndFlags, MetadataError> {
    let mut legacy = command;
    let mut flags = QueryFlags::NONE;

    for (key, value) in metadata {
        let mapping = table::by_metadata_key(&key, Direction::Request)
            .ok_or_else(|| MetadataError::UnknownField(key.clone()))?;
        mapping.check_kind(&key, &value)?;
        match mapping.legacy {
            LegacyLocation::Field(name) => {
                legacy.insert(name, value);
            }
            LegacyLocation::FlagBit { bit, .. } => {
                if matches!(value, Bson::Boolean(true)) {
                    flags |= bit;
                }
            }
        }
    }

    Ok(LegacyCommandAndFlags {
        command: legacy,
        flags,
    })
}
