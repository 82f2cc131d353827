//! Compiler and materializer options.

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigurationError;

/// Options shared by the [`Compiler`](crate::Compiler) and the
/// [`Materializer`](crate::Materializer).
///
/// ```yaml
/// variable_prefix: "p"
/// identity_scalar: "ID"
/// recursion_limit: 128
/// default_scalars: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Prefix of the variables declared by compiled documents, followed by the ordinal.
    pub variable_prefix: String,

    /// Name of the scalar whose fields identify entities.
    pub identity_scalar: String,

    /// Maximum depth of the query tree and of materialized values.
    pub recursion_limit: usize,

    /// Whether root references and includes select the leaf fields of their type.
    pub default_scalars: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            variable_prefix: "var_".to_string(),
            identity_scalar: "ID".to_string(),
            // < # expected to cause stack overflow && > # expected in a legitimate query
            recursion_limit: 512,
            default_scalars: true,
        }
    }
}

impl Configuration {
    /// Reads a configuration from YAML. Missing keys keep their default value.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        serde_yaml::from_str(yaml).map_err(|err| ConfigurationError::Yaml(err.to_string()))
    }
}
