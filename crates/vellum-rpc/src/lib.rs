mod context;
mod error;
mod flags;
mod hooks;
mod reply;
mod request;
mod table;

pub use context::{
    CallContext, make_empty_metadata, read_request_metadata, write_request_metadata,
};
pub use error::{HookError, MetadataError};
pub use flags::QueryFlags;
pub use hooks::{
    HookRegistry, HookRegistryBuilder, ReplyMetadataReader, RequestMetadataReader,
    RequestMetadataWriter,
};
pub use reply::{ReplyAndMetadata, downconvert_reply_metadata, upconvert_reply_metadata};
pub use request::{
    CommandAndMetadata, LegacyCommandAndFlags, downconvert_request_metadata,
    upconvert_request_metadata,
};
pub use table::FieldKind;
