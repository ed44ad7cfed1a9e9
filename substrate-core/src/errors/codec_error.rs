/// Errors raised while encoding records into backend property maps.
///
/// These fire before any backend call is made.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("field `{field}` holds a nested object; the backend accepts primitives only")]
    NestedObject { field: String },

    #[error("field `{field}` is an array containing objects or arrays")]
    ArrayOfObjects { field: String },

    #[error("field `{field}` is an array mixing primitive types")]
    HeterogeneousArray { field: String },

    #[error("field `{field}` holds a non-finite float")]
    NonFiniteFloat { field: String },

    #[error("missing field `{field}`")]
    MissingField { field: String },

    #[error("field `{field}` has the wrong type, expected {expected}")]
    TypeMismatch { field: String, expected: &'static str },

    #[error("unknown {kind} type `{type_name}`")]
    UnknownType { kind: String, type_name: String },

    #[error("generic type name `{type_name}` collides with a built-in {kind} type")]
    ReservedTypeName { kind: String, type_name: String },

    #[error("blob field `{field}` could not be decoded: {reason}")]
    InvalidBlob { field: String, reason: String },
}
