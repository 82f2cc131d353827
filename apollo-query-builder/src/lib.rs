//! Typed GraphQL queries from composable expressions.
//!
//! A [`QueryExpression`] describes what to fetch in terms of domain types and members. The
//! [`Compiler`] turns it into a minimal query document (fragments, polymorphic subtypes and
//! variables included) against a [`GraphSchema`]. Once a [`Transport`] has executed the
//! document, the [`Materializer`] rebuilds the result as a graph of [`Entity`] handles in which
//! every entity with a given identity is a single shared instance.
//!
//! [`QueryContext`] wires the three together.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod compiler;
mod configuration;
mod context;
mod display_helpers;
pub mod error;
mod expression;
mod mapping;
mod materializer;
mod query;
pub mod schema;
mod variables;

pub use crate::compiler::CompiledQuery;
pub use crate::compiler::Compiler;
pub use crate::configuration::Configuration;
pub use crate::context::BoxError;
pub use crate::context::QueryContext;
pub use crate::context::Transport;
pub use crate::error::Error;
pub use crate::expression::Fragment;
pub use crate::expression::QueryExpression;
pub use crate::expression::member;
pub use crate::mapping::ArgumentSource;
pub use crate::mapping::IdentityNameMapper;
pub use crate::mapping::MappedNames;
pub use crate::mapping::Member;
pub use crate::mapping::MemberAccessor;
pub use crate::mapping::MemberNameMapper;
pub use crate::mapping::TypeNameMapper;
pub use crate::materializer::Materializer;
pub use crate::materializer::cache::EntityCache;
pub use crate::materializer::entity::Entity;
pub use crate::materializer::entity::Value;
pub use crate::schema::GraphSchema;
pub use crate::schema::GraphType;
pub use crate::schema::SchemaSource;
pub use crate::variables::VariableBinding;
