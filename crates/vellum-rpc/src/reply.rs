use bson::Document;
use serde::{Deserialize, Serialize};

use crate::error::MetadataError;
use crate::table::{self, Direction, LegacyLocation};

/// A command reply stripped of metadata, paired with the metadata
/// document extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyAndMetadata {
    pub reply: Document,
    pub metadata: Document,
}

/// Strip reply metadata from a legacy reply document.
pub fn upconvert_reply_metadata(legacy_reply: Document) -> Result<ReplyAndMetadata, MetadataError> {
    let mut reply = Document::new();
    let mut metadata = Document::new();

    for (key, value) in legacy_reply {
        match table::by_legacy_field(&key, Direction::Reply) {
            Some(mapping) => {
                mapping.check_kind(&key, &value)?;
                metadata.insert(mapping.metadata_key, value);
            }
            None => {
                reply.insert(key, value);
            }
        }
    }

    Ok(ReplyAndMetadata { reply, metadata })
}

/// Fold a reply metadata document back into a legacy reply document.
/// There is no flags word on the reply side.
pub fn downconvert_reply_metadata(
    reply: Document,
    metadata: Document,
) -> Result<Document, MetadataError> {
    let mut legacy = reply;

    for (key, value) in metadata {
        let mapping = table::by_metadata_key(&key, Direction::Reply)
            .ok_or_else(|| MetadataError::UnknownField(key.clone()))?;
        mapping.check_kind(&key, &value)?;
        match mapping.legacy {
            LegacyLocation::Field(name) => {
                legacy.insert(name, value);
            }
            // The table carries no flag-mapped reply rows.
            LegacyLocation::FlagBit { .. } => {}
        }
    }

    Ok(legacy)
}
