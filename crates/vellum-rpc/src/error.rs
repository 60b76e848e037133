use std::error::Error;
use std::fmt;

use bson::spec::ElementType;

use crate::table::FieldKind;

/// Error a hook reports back to the registry.
pub type HookError = Box<dyn Error + Send + Sync>;

#[derive(Debug)]
pub enum MetadataError {
    /// A mapped field is present but carries the wrong value kind.
    MalformedField {
        field: String,
        expected: FieldKind,
        actual: ElementType,
    },
    /// Downconversion saw a metadata key with no legacy location.
    UnknownField(String),
    /// A registered hook failed; `index` is its registration position.
    Hook { index: usize, source: HookError },
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::MalformedField {
                field,
                expected,
                actual,
            } => write!(
                f,
                "malformed metadata field {field}: expected {expected}, found {actual:?}"
            ),
            MetadataError::UnknownField(key) => write!(f, "unknown metadata field: {key}"),
            MetadataError::Hook { index, source } => {
                write!(f, "metadata hook {index} failed: {source}")
            }
        }
    }
}

impl Error for MetadataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MetadataError::Hook { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
