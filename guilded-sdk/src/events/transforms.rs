//! Payload transforms applied before decoding.
//!
//! A transform receives the raw `d` payload of a frame and returns the JSON
//! that is handed to the deserializer. It may add or rewrite fields but must
//! not change which event the payload describes.

use std::sync::Arc;

use serde_json::Value;

use crate::errors::TransformError;

/// Raw-payload rewrite registered alongside a descriptor.
pub type Transform = Arc<dyn Fn(Value) -> Result<Value, TransformError> + Send + Sync>;

/// Copy the top-level `field` of the payload into the nested object `into`.
///
/// An existing value in `into` is kept.
pub fn copy_envelope_field(field: &'static str, into: &'static str) -> Transform {
    Arc::new(move |payload| copy_field(payload, field, into))
}

/// `ServerMemberJoined` sends `serverId` beside `member`, but [`crate::models::ServerMember`]
/// requires it.
pub fn member_joined() -> Transform {
    copy_envelope_field("serverId", "member")
}

fn copy_field(
    mut payload: Value,
    field: &'static str,
    into: &'static str,
) -> Result<Value, TransformError> {
    let envelope = payload
        .as_object_mut()
        .ok_or(TransformError::WrongType("d"))?;
    let value = envelope
        .get(field)
        .cloned()
        .ok_or(TransformError::MissingField(field))?;
    let target = envelope
        .get_mut(into)
        .ok_or(TransformError::MissingField(into))?
        .as_object_mut()
        .ok_or(TransformError::WrongType(into))?;

    target.entry(field).or_insert(value);
    Ok(payload)
}
