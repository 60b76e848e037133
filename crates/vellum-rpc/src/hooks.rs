use std::fmt;

use bson::Document;

use crate::error::{HookError, MetadataError};

/// Adds fields to an outgoing request metadata document.
pub type RequestMetadataWriter = Box<dyn Fn(&mut Document) -> Result<(), HookError> + Send + Sync>;

/// Consumes an inbound request metadata document.
pub type RequestMetadataReader = Box<dyn Fn(&Document) -> Result<(), HookError> + Send + Sync>;

/// Consumes a reply metadata document. The second argument is the
/// address of the server that executed the command.
pub type ReplyMetadataReader =
    Box<dyn Fn(&Document, &str) -> Result<(), HookError> + Send + Sync>;

// ── HookRegistryBuilder ───────────────────────────────────────

/// Registration phase of the hook registry.
///
/// Registration is a single-threaded setup step at process or connection
/// start; [`build`](HookRegistryBuilder::build) consumes the builder and
/// freezes the collections into an immutable [`HookRegistry`], so hooks
/// cannot be added once invocation has begun.
#[derive(Default)]
pub struct HookRegistryBuilder {
    request_writers: Vec<RequestMetadataWriter>,
    request_readers: Vec<RequestMetadataReader>,
    reply_readers: Vec<ReplyMetadataReader>,
}

impl HookRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_request_writer<F>(mut self, writer: F) -> Self
    where
        F: Fn(&mut Document) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.request_writers.push(Box::new(writer));
        self
    }

    pub fn register_request_reader<F>(mut self, reader: F) -> Self
    where
        F: Fn(&Document) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.request_readers.push(Box::new(reader));
        self
    }

    pub fn register_reply_reader<F>(mut self, reader: F) -> Self
    where
        F: Fn(&Document, &str) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.reply_readers.push(Box::new(reader));
        self
    }

    pub fn build(self) -> HookRegistry {
        HookRegistry {
            request_writers: self.request_writers,
            request_readers: self.request_readers,
            reply_readers: self.reply_readers,
        }
    }
}

// ── HookRegistry ──────────────────────────────────────────────

/// Frozen hook collections. Invocation order is registration order and
/// is part of the observable contract.
pub struct HookRegistry {
    request_writers: Vec<RequestMetadataWriter>,
    request_readers: Vec<RequestMetadataReader>,
    reply_readers: Vec<ReplyMetadataReader>,
}

impl HookRegistry {
    /// A registry with no hooks.
    pub fn empty() -> Self {
        HookRegistryBuilder::new().build()
    }

    /// Run each request writer against the same builder, in registration
    /// order. The first failure aborts the sequence; fields written by
    /// earlier hooks stay in the builder.
    pub(crate) fn write_request(&self, builder: &mut Document) -> Result<(), MetadataError> {
        for (index, writer) in self.request_writers.iter().enumerate() {
            writer(builder).map_err(|source| MetadataError::Hook { index, source })?;
        }
        Ok(())
    }

    /// Run each request reader in registration order, first failure wins.
    pub(crate) fn read_request(&self, metadata: &Document) -> Result<(), MetadataError> {
        for (index, reader) in self.request_readers.iter().enumerate() {
            reader(metadata).map_err(|source| MetadataError::Hook { index, source })?;
        }
        Ok(())
    }

    /// Invoked by the host's reply path with the metadata document and
    /// the address of the originating server. Readers run in
    /// registration order, first failure wins.
    pub fn read_reply_metadata(
        &self,
        metadata: &Document,
        source: &str,
    ) -> Result<(), MetadataError> {
        for (index, reader) in self.reply_readers.iter().enumerate() {
            reader(metadata, source).map_err(|err| MetadataError::Hook { index, source: err })?;
        }
        Ok(())
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("request_writers", &self.request_writers.len())
            .field("request_readers", &self.request_readers.len())
            .field("reply_readers", &self.reply_readers.len())
            .finish()
    }
}
