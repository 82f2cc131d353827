//! Declarative query expressions.
//!
//! ```
//! use apollo_query_builder::ArgumentSource;
//! use apollo_query_builder::QueryExpression;
//! use apollo_query_builder::member;
//!
//! let filter = ArgumentSource::from_serialize(&serde_json::json!({ "productId": 1 })).unwrap();
//! let query = QueryExpression::root("DrawSchema")
//!     .filter(filter)
//!     .include(member("DrawSchema", "items").include(member("DrawSchemaItem", "template")));
//! # let _ = query;
//! ```

use crate::mapping::ArgumentSource;
use crate::mapping::Member;

/// A query over domain types.
///
/// Query-level chains start at [`QueryExpression::Root`]. Selectors (the arguments of
/// [`project`](QueryExpression::project), [`include`](QueryExpression::include) and friends)
/// start at [`QueryExpression::Current`], the element they are applied to.
#[derive(Debug, Clone)]
pub enum QueryExpression {
    /// All values of a domain type, fetched through a query field.
    Root {
        domain_type: String,
        /// Explicit query field; inferred from the type and filter when absent.
        entry_point: Option<String>,
    },
    /// The selector parameter.
    Current,
    /// Member access.
    Member {
        target: Box<QueryExpression>,
        member: Member,
    },
    /// Narrows each element to the selected value.
    Project {
        source: Box<QueryExpression>,
        selector: Box<QueryExpression>,
    },
    /// Narrows each element to the selected collection and flattens the result.
    ProjectMany {
        source: Box<QueryExpression>,
        selector: Box<QueryExpression>,
    },
    /// Passes arguments to the field selected last.
    Filter {
        source: Box<QueryExpression>,
        arguments: ArgumentSource,
    },
    /// Also fetches the selected relation.
    Include {
        source: Box<QueryExpression>,
        selector: Box<QueryExpression>,
    },
    /// Keeps values of the given subtype.
    Cast {
        source: Box<QueryExpression>,
        domain_type: String,
    },
    /// Selects the fields of a named fragment.
    ApplyFragment {
        source: Box<QueryExpression>,
        fragment: Fragment,
    },
}

impl QueryExpression {
    pub fn root(domain_type: impl Into<String>) -> Self {
        QueryExpression::Root {
            domain_type: domain_type.into(),
            entry_point: None,
        }
    }

    /// Like [`root`](Self::root), fetched through the query field named `entry_point`.
    pub fn root_with_entry_point(
        domain_type: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        QueryExpression::Root {
            domain_type: domain_type.into(),
            entry_point: Some(entry_point.into()),
        }
    }

    pub fn current() -> Self {
        QueryExpression::Current
    }

    pub fn member(self, declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        QueryExpression::Member {
            target: Box::new(self),
            member: Member::new(declaring_type, name),
        }
    }

    pub fn project(self, selector: QueryExpression) -> Self {
        QueryExpression::Project {
            source: Box::new(self),
            selector: Box::new(selector),
        }
    }

    pub fn project_many(self, selector: QueryExpression) -> Self {
        QueryExpression::ProjectMany {
            source: Box::new(self),
            selector: Box::new(selector),
        }
    }

    pub fn filter(self, arguments: ArgumentSource) -> Self {
        QueryExpression::Filter {
            source: Box::new(self),
            arguments,
        }
    }

    pub fn include(self, selector: QueryExpression) -> Self {
        QueryExpression::Include {
            source: Box::new(self),
            selector: Box::new(selector),
        }
    }

    pub fn cast(self, domain_type: impl Into<String>) -> Self {
        QueryExpression::Cast {
            source: Box::new(self),
            domain_type: domain_type.into(),
        }
    }

    pub fn apply_fragment(self, fragment: Fragment) -> Self {
        QueryExpression::ApplyFragment {
            source: Box::new(self),
            fragment,
        }
    }
}

/// Shorthand for `QueryExpression::current().member(declaring_type, name)`.
pub fn member(declaring_type: impl Into<String>, name: impl Into<String>) -> QueryExpression {
    QueryExpression::current().member(declaring_type, name)
}

/// A reusable, named selection on a domain type.
#[derive(Debug, Clone)]
pub struct Fragment {
    name: String,
    domain_type: String,
    selection: Box<QueryExpression>,
}

impl Fragment {
    /// `select` receives the fragment's own element and returns what to fetch with it, for
    /// example `|q| q.include(member("Node", "parent"))`. Leaf fields are always selected.
    pub fn new(
        name: impl Into<String>,
        domain_type: impl Into<String>,
        select: impl FnOnce(QueryExpression) -> QueryExpression,
    ) -> Self {
        Self {
            name: name.into(),
            domain_type: domain_type.into(),
            selection: Box::new(select(QueryExpression::current())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain_type(&self) -> &str {
        &self.domain_type
    }

    pub(crate) fn selection(&self) -> &QueryExpression {
        &self.selection
    }
}
