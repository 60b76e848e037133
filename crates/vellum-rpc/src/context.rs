use bson::{Array, Bson, Document};

use crate::error::MetadataError;
use crate::hooks::HookRegistry;
use crate::table::{self, FieldKind};

/// Call-scoped request state.
///
/// One context exists per in-flight call and is owned by the host: the
/// bridge reads and writes its attributes but never its lifecycle.
/// Distinct calls' contexts are fully independent, so no cross-call
/// locking is needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallContext {
    secondary_ok: bool,
    read_preference: Option<Document>,
    impersonated_users: Option<Array>,
    impersonated_roles: Option<Array>,
    max_time_ms: Option<i64>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn secondary_ok(&self) -> bool {
        self.secondary_ok
    }

    pub fn set_secondary_ok(&mut self, allowed: bool) {
        self.secondary_ok = allowed;
    }

    pub fn read_preference(&self) -> Option<&Document> {
        self.read_preference.as_ref()
    }

    pub fn set_read_preference(&mut self, pref: Document) {
        self.read_preference = Some(pref);
    }

    pub fn impersonated_users(&self) -> Option<&Array> {
        self.impersonated_users.as_ref()
    }

    pub fn set_impersonated_users(&mut self, users: Array) {
        self.impersonated_users = Some(users);
    }

    pub fn impersonated_roles(&self) -> Option<&Array> {
        self.impersonated_roles.as_ref()
    }

    pub fn set_impersonated_roles(&mut self, roles: Array) {
        self.impersonated_roles = Some(roles);
    }

    pub fn max_time_ms(&self) -> Option<i64> {
        self.max_time_ms
    }

    pub fn set_max_time_ms(&mut self, millis: i64) {
        self.max_time_ms = Some(millis);
    }
}

/// Returns an empty metadata document.
pub fn make_empty_metadata() -> Document {
    Document::new()
}

/// Apply known request fields from a metadata document onto the context,
/// then run the registry's request readers in registration order.
///
/// Keys outside the mapping table are left for the readers; the bridge
/// does not police them. The first failing reader aborts the sequence
/// and its error is returned; attributes applied before the failure stay
/// applied.
pub fn read_request_metadata(
    ctx: &mut CallContext,
    metadata: &Document,
    hooks: &HookRegistry,
) -> Result<(), MetadataError> {
    if let Some(value) = metadata.get(table::SECONDARY_OK) {
        match value {
            Bson::Boolean(b) => ctx.secondary_ok = *b,
            other => return Err(malformed(table::SECONDARY_OK, FieldKind::Bool, other)),
        }
    }
    if let Some(value) = metadata.get(table::READ_PREFERENCE) {
        match value {
            Bson::Document(pref) => ctx.read_preference = Some(pref.clone()),
            other => return Err(malformed(table::READ_PREFERENCE, FieldKind::Doc, other)),
        }
    }
    if let Some(value) = metadata.get(table::IMPERSONATED_USERS) {
        match value {
            Bson::Array(users) => ctx.impersonated_users = Some(users.clone()),
            other => return Err(malformed(table::IMPERSONATED_USERS, FieldKind::Array, other)),
        }
    }
    if let Some(value) = metadata.get(table::IMPERSONATED_ROLES) {
        match value {
            Bson::Array(roles) => ctx.impersonated_roles = Some(roles.clone()),
            other => return Err(malformed(table::IMPERSONATED_ROLES, FieldKind::Array, other)),
        }
    }
    if let Some(value) = metadata.get(table::MAX_TIME_MS) {
        match value {
            Bson::Int32(millis) => ctx.max_time_ms = Some(i64::from(*millis)),
            Bson::Int64(millis) => ctx.max_time_ms = Some(*millis),
            other => return Err(malformed(table::MAX_TIME_MS, FieldKind::Int, other)),
        }
    }

    hooks.read_request(metadata)
}

/// Serialize the context's attributes into the metadata builder, then
/// run each registered request writer against the same builder in
/// registration order.
///
/// The first failing writer aborts the sequence and its error is
/// returned; fields written by earlier hooks stay in the builder. The
/// builder is append-only, not transactional.
pub fn write_request_metadata(
    ctx: &CallContext,
    builder: &mut Document,
    hooks: &HookRegistry,
) -> Result<(), MetadataError> {
    if ctx.secondary_ok {
        builder.insert(table::SECONDARY_OK, true);
    }
    if let Some(pref) = &ctx.read_preference {
        builder.insert(table::READ_PREFERENCE, pref.clone());
    }
    if let Some(users) = &ctx.impersonated_users {
        builder.insert(table::IMPERSONATED_USERS, Bson::Array(users.clone()));
    }
    if let Some(roles) = &ctx.impersonated_roles {
        builder.insert(table::IMPERSONATED_ROLES, Bson::Array(roles.clone()));
    }
    if let Some(millis) = ctx.max_time_ms {
        builder.insert(table::MAX_TIME_MS, millis);
    }

    hooks.write_request(builder)
}

fn malformed(field: &str, expected: FieldKind, actual: &Bson) -> MetadataError {
    MetadataError::MalformedField {
        field: field.to_string(),
        expected,
        actual: actual.element_type(),
    }
}

#[cfg(test)]
mod tests {
    use bson::{bson, doc};

    use super::*;

    #[test]
    fn empty_metadata_is_empty() {
        assert!(make_empty_metadata().is_empty());
    }

    #[test]
    fn read_applies_secondary_ok() {
        let mut ctx = CallContext::new();
        read_request_metadata(&mut ctx, &doc! { "$secondaryOk": true }, &HookRegistry::empty())
            .unwrap();
        assert!(ctx.secondary_ok());
    }

    #[test]
    fn read_applies_all_request_fields() {
        let mut ctx = CallContext::new();
        read_request_metadata(
            &mut ctx,
            &doc! {
                "$secondaryOk": true,
                "$readPreference": { "mode": "nearest" },
                "$impersonatedUsers": [{ "user": "bob", "db": "admin" }],
                "$impersonatedRoles": [{ "role": "root", "db": "admin" }],
                "$maxTimeMS": 1500,
            },
            &HookRegistry::empty(),
        )
        .unwrap();

        assert!(ctx.secondary_ok());
        assert_eq!(ctx.read_preference(), Some(&doc! { "mode": "nearest" }));
        assert_eq!(
            ctx.impersonated_users(),
            Some(&vec![bson!({ "user": "bob", "db": "admin" })])
        );
        assert_eq!(
            ctx.impersonated_roles(),
            Some(&vec![bson!({ "role": "root", "db": "admin" })])
        );
        assert_eq!(ctx.max_time_ms(), Some(1500));
    }

    #[test]
    fn read_ignores_unknown_keys() {
        let mut ctx = CallContext::new();
        read_request_metadata(
            &mut ctx,
            &doc! { "$auditToken": "opaque" },
            &HookRegistry::empty(),
        )
        .unwrap();
        assert_eq!(ctx, CallContext::new());
    }

    #[test]
    fn read_rejects_malformed_field() {
        let mut ctx = CallContext::new();
        let err = read_request_metadata(
            &mut ctx,
            &doc! { "$maxTimeMS": "soon" },
            &HookRegistry::empty(),
        )
        .unwrap_err();
        assert!(matches!(err, MetadataError::MalformedField { .. }));
    }

    #[test]
    fn read_keeps_fields_applied_before_hook_failure() {
        use crate::hooks::HookRegistryBuilder;

        let registry = HookRegistryBuilder::new()
            .register_request_reader(|_| Err("consumer refused".into()))
            .build();

        let mut ctx = CallContext::new();
        let err =
            read_request_metadata(&mut ctx, &doc! { "$secondaryOk": true }, &registry).unwrap_err();
        assert!(matches!(err, MetadataError::Hook { index: 0, .. }));
        // No rollback: the attribute write sticks.
        assert!(ctx.secondary_ok());
    }

    #[test]
    fn write_serializes_context_attributes() {
        let mut ctx = CallContext::new();
        ctx.set_secondary_ok(true);
        ctx.set_read_preference(doc! { "mode": "secondaryPreferred" });
        ctx.set_max_time_ms(2000);

        let mut builder = make_empty_metadata();
        write_request_metadata(&ctx, &mut builder, &HookRegistry::empty()).unwrap();
        assert_eq!(
            builder,
            doc! {
                "$secondaryOk": true,
                "$readPreference": { "mode": "secondaryPreferred" },
                "$maxTimeMS": 2000_i64,
            }
        );
    }

    #[test]
    fn write_omits_unset_attributes() {
        let mut builder = make_empty_metadata();
        write_request_metadata(&CallContext::new(), &mut builder, &HookRegistry::empty()).unwrap();
        assert!(builder.is_empty());
    }

    #[test]
    fn write_then_read_round_trips_context() {
        let mut ctx = CallContext::new();
        ctx.set_secondary_ok(true);
        ctx.set_impersonated_users(vec![bson!({ "user": "eve", "db": "admin" })]);
        ctx.set_max_time_ms(750);

        let mut builder = make_empty_metadata();
        write_request_metadata(&ctx, &mut builder, &HookRegistry::empty()).unwrap();

        let mut restored = CallContext::new();
        read_request_metadata(&mut restored, &builder, &HookRegistry::empty()).unwrap();
        assert_eq!(restored, ctx);
    }
}
