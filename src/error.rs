use thiserror::Error;

/// Errors raised while reading a pipeline document from its textual or wire form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Failed to parse pipeline document JSON: {0}")]
    JsonParseError(String),

    #[error("Node with order {order} has neither an effectId nor a gateType")]
    MissingKind { order: i64 },

    #[error("Node with order {order} sets both effectId {effect_id} and gateType '{gate_type}'")]
    AmbiguousKind {
        order: i64,
        effect_id: i64,
        gate_type: String,
    },

    #[error("Unknown gate type '{0}'")]
    UnknownGateType(String),

    #[error("Effect id {0} is not a positive integer")]
    InvalidEffectId(i64),

    #[error("Order {0} is out of range; orders must be non-negative")]
    OrderOutOfRange(i64),

    #[error("Branch '{key}' is malformed: {message}")]
    MalformedBranch { key: String, message: String },
}

/// Errors raised while loading or installing a registry snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Failed to load registry data: {0}")]
    LoadError(String),

    #[error("Effect id {0} is defined more than once")]
    DuplicateEffectId(u32),

    #[error("Effect name '{0}' is defined more than once")]
    DuplicateEffectName(String),

    #[error("Effect '{name}' has invalid id {id}; ids must be positive")]
    InvalidEffectId { name: String, id: u32 },
}

/// Errors raised while reading a visual program from its JSON form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProgramError {
    #[error("Failed to parse visual program JSON: {0}")]
    JsonParseError(String),

    #[error("Block {handle} is referenced from {referenced_from} but does not exist")]
    DanglingHandle {
        handle: usize,
        referenced_from: String,
    },

    #[error("Block {handle} links back to itself through its next or slot links")]
    LinkCycle { handle: usize },
}

/// Errors raised while loading a `CompilerConfig`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config JSON: {0}")]
    JsonParseError(String),
}
