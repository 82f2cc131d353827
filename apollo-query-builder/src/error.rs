//! Query builder errors.
//!
//! Every layer reports its own error type so callers (and tests) can tell a bad schema from a
//! bad query expression or a malformed response. [`enum@Error`] wraps all of them for the
//! [`QueryContext`](crate::QueryContext) entry points.

use displaydoc::Display;
use thiserror::Error;

/// Errors raised while building a [`GraphSchema`](crate::GraphSchema).
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// could not parse schema: {0}
    Parse(String),
    /// type '{name}' referenced by '{referenced_by}' is not defined
    UnresolvedType {
        /// The missing type.
        name: String,
        /// The definition holding the reference.
        referenced_by: String,
    },
    /// '{referenced_by}' references '{name}' which is not {expected}
    InvalidReference {
        /// The referenced type.
        name: String,
        /// The definition holding the reference.
        referenced_by: String,
        /// The kind of type the reference requires.
        expected: String,
    },
    /// type '{0}' is defined more than once
    DuplicateType(String),
    /// schema does not define a query root type
    MissingQueryType,
    /// '{0}' is not a valid GraphQL name
    InvalidName(String),
    /// invalid introspection result: {0}
    Introspection(String),
}

/// Errors raised while binding filter arguments to query variables.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BindError {
    /// argument source has no member named '{argument}'
    ArgumentResolution {
        /// The argument that could not be resolved.
        argument: String,
    },
    /// argument source must serialize to an object: {0}
    InvalidArgumentSource(String),
}

/// Errors raised while compiling a query expression into a query document.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompileError {
    /// type '{domain_type}' maps to '{type_name}' which is not defined in the schema
    UnknownType {
        /// The domain type.
        domain_type: String,
        /// The mapped graph type name.
        type_name: String,
    },
    /// member '{member}' of '{declaring_type}' does not map to a field of '{graph_type}'
    UnmappedMember {
        /// The member name.
        member: String,
        /// The domain type declaring the member.
        declaring_type: String,
        /// The graph type that was searched.
        graph_type: String,
    },
    /// '{type_name}' is not a possible type of '{parent_type}'
    NotAPossibleType {
        /// The requested type.
        type_name: String,
        /// The type the cast was applied to.
        parent_type: String,
    },
    /// field '{field}' is selected both as '{first}' and as '{second}'
    ConflictingFieldShape {
        /// The field name.
        field: String,
        /// The type of the first selection.
        first: String,
        /// The type of the conflicting selection.
        second: String,
    },
    /// field '{field}' is selected twice with different argument sources
    ConflictingArguments {
        /// The field name.
        field: String,
    },
    /// field '{field}' takes arguments but no argument source was provided
    MissingArgumentSource {
        /// The field name.
        field: String,
    },
    /// no query field returns '{type_name}'{details}
    NoEntryPoint {
        /// The root graph type.
        type_name: String,
        /// Extra context about the expected arguments.
        details: String,
    },
    /// several query fields return '{type_name}': {candidates}
    AmbiguousEntryPoint {
        /// The root graph type.
        type_name: String,
        /// The matching field names.
        candidates: String,
    },
    /// query field '{entry_point}' does not return '{type_name}'
    InvalidEntryPoint {
        /// The requested query field.
        entry_point: String,
        /// The root graph type.
        type_name: String,
    },
    /// '{0}' has no fields to select from
    NotAComplexType(String),
    /// selector does not access any member
    EmptySelector,
    /// selection of '{0}' is empty
    EmptySelection(String),
    /// query recursion limit ({0}) exceeded
    RecursionLimitExceeded(usize),
    /// {0}
    Bind(#[from] BindError),
}

/// Errors raised while materializing a JSON result into entities.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MaterializeError {
    /// cannot construct abstract type '{0}' without a discriminator or a factory
    CannotConstructAbstractType(String),
    /// type '{type_name}' carries several identity fields: {fields}
    AmbiguousIdentity {
        /// The object type.
        type_name: String,
        /// The identity fields present in the object.
        fields: String,
    },
    /// discriminator '{0}' does not name a schema type
    UnknownDiscriminator(String),
    /// '{type_name}' is not a possible type of '{expected}'
    NotAPossibleType {
        /// The discriminated type.
        type_name: String,
        /// The expected type.
        expected: String,
    },
    /// entity '{id}' is a '{existing}' but the response says '{found}'
    TypeMismatch {
        /// The entity identity.
        id: String,
        /// The type of the cached entity.
        existing: String,
        /// The type named by the response.
        found: String,
    },
    /// an entity of type '{type_name}' with id '{id}' is already registered
    DuplicateEntity {
        /// The type the entity was registered under.
        type_name: String,
        /// The entity identity.
        id: String,
    },
    /// expected a value of type '{expected}', found {found}
    InvalidValue {
        /// The expected graph type.
        expected: String,
        /// A short description of the JSON value.
        found: String,
    },
    /// '{0}' is not an output type
    NotAnOutputType(String),
    /// query recursion limit ({0}) exceeded
    RecursionLimitExceeded(usize),
}

/// Errors raised while loading a [`Configuration`](crate::Configuration).
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not read configuration: {0}
    Yaml(String),
}

/// Any error raised by the query builder.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// {0}
    Schema(#[from] SchemaError),
    /// {0}
    Compile(#[from] CompileError),
    /// {0}
    Materialize(#[from] MaterializeError),
    /// {0}
    Configuration(#[from] ConfigurationError),
    /// transport failed: {0}
    Transport(String),
    /// response has no data for entry point '{0}'
    MissingEntryPoint(String),
}

impl From<BindError> for Error {
    fn from(error: BindError) -> Self {
        Error::Compile(error.into())
    }
}
