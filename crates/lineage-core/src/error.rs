//! Error types for lineage-core

/// Result type for lineage-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lineage-core operations
///
/// Structural defects in the parent graph (cycles, diamonds, missing
/// references) and parameter inconsistencies are not errors: they are
/// reported as data by the checks that find them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No entity with this name is registered
    #[error("Unknown entity: {name}")]
    UnknownEntity { name: String },

    /// An entity with this name already exists
    #[error("Entity already exists: {name}")]
    EntityExists { name: String },

    /// Entity name failed validation
    #[error("Invalid entity name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Transient entities carry no version history
    #[error("Entity '{name}' is transient and cannot be versioned")]
    TransientNotVersioned { name: String },

    /// Version id does not exist in the entity's log
    #[error("Entity '{entity}' has no version {id}")]
    UnknownVersion { entity: String, id: u64 },

    /// Adding the parent would create a cycle or diamond
    #[error("Adding parent '{parent}' to '{entity}' would create a cyclic or diamond dependency")]
    CyclicDependency { entity: String, parent: String },

    /// The parent is already referenced
    #[error("Entity '{entity}' already has parent '{parent}'")]
    DuplicateParent { entity: String, parent: String },

    /// Unrecognised inheritance mode string
    #[error("Invalid inheritance mode: {mode}")]
    InvalidMode { mode: String },

    /// Malformed version pin (expected `name=id`)
    #[error("Invalid version pin '{pin}': expected <entity>=<version>")]
    InvalidPin { pin: String },

    /// Version log backend failure
    #[error("Version store error for '{entity}': {message}")]
    Persistence { entity: String, message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from lineage-fs
    #[error(transparent)]
    Fs(#[from] lineage_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub(crate) fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownEntity { name: name.into() }
    }
}
