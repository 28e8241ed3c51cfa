use std::io;

/// Errors that abort a whole conversion run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Module graph error: {0}")]
    GraphError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported configuration for axis {axis}: {key}")]
    UnsupportedConfiguration { axis: String, key: String },

    #[error("Attribute {attribute} cannot be collapsed: {reason}")]
    UncollapsibleAttribute { attribute: String, reason: String },

    #[error("Force-enabled modules failed to convert: {}", .0.join(", "))]
    ForceEnabledNotConverted(Vec<String>),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for bp2bazel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors attributed to a single module; the module is dropped and the run continues
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
    #[error("depends on missing module {0}")]
    MissingDependency(String),

    #[error("depends on unconverted module {0}")]
    UnconvertedDependency(String),

    #[error("references unknown path {0}")]
    MissingPath(String),

    #[error("target {0} is already generated in this directory")]
    DuplicateTarget(String),

    #[error("property {property}: {reason}")]
    InvalidProperty { property: String, reason: String },
}

impl ModuleError {
    /// Short, stable identifier used in metrics output
    pub fn kind(&self) -> &'static str {
        match self {
            ModuleError::MissingDependency(_) => "missing_dependency",
            ModuleError::UnconvertedDependency(_) => "unconverted_dependency",
            ModuleError::MissingPath(_) => "missing_path",
            ModuleError::DuplicateTarget(_) => "duplicate_target",
            ModuleError::InvalidProperty { .. } => "invalid_property",
        }
    }

    pub fn invalid_property(property: impl Into<String>, reason: impl Into<String>) -> Self {
        ModuleError::InvalidProperty {
            property: property.into(),
            reason: reason.into(),
        }
    }
}

/// Either kind of failure a rule handler can hit while converting a module
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Fatal(#[from] Error),

    #[error(transparent)]
    Module(#[from] ModuleError),
}
