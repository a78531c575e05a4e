use crate::archetype::ArchetypeId;
use thiserror::Error;

/// An archetype could not be instantiated as a shadow.
///
/// Equip operations that hit this leave the prior identity untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("unknown archetype `{0}`")]
    Unknown(ArchetypeId),
    #[error("archetype `{0}` is not summonable")]
    NotSummonable(ArchetypeId),
    #[error("archetype `{0}` is not a living archetype")]
    NotLiving(ArchetypeId),
    #[error("the world rejected construction of `{0}`")]
    Rejected(ArchetypeId),
}

/// A persisted identity record could not be loaded.
///
/// Never fatal: the owning state has already been normalized to empty when this is returned.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("malformed identity record: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("identity record references unknown archetype `{0}`")]
    UnknownArchetype(String),
    #[error("identity record for `{archetype}` could not be constructed: {source}")]
    Unconstructible {
        archetype: ArchetypeId,
        #[source]
        source: ConstructionError,
    },
    #[error("corrupt entity data for `{archetype}`: {source}")]
    CorruptEntityData {
        archetype: ArchetypeId,
        #[source]
        source: serde_json::Error,
    },
}

/// An updater hook failed for one render pass invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("updater for `{archetype}` failed: {reason}")]
pub struct UpdaterError {
    pub archetype: ArchetypeId,
    pub reason: String,
}

impl UpdaterError {
    pub fn new(archetype: &ArchetypeId, reason: impl Into<String>) -> Self {
        Self {
            archetype: archetype.clone(),
            reason: reason.into(),
        }
    }
}

/// A self-service equip request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquipError {
    #[error("identity `{0}` is not unlocked")]
    NotUnlocked(ArchetypeId),
    #[error("actor {0} cannot hold an identity")]
    NotPrimary(u64),
    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid identity configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid identity configuration: {0}")]
    Invalid(String),
}

/// A privileged command failed before or during execution.
///
/// Failures map to a message and a zero exit code; they never abort the invoking session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Parse(String),
    #[error("invalid target selector `{0}`")]
    InvalidSelector(String),
    #[error("unknown or non-summonable identity `{0}`")]
    UnknownArchetype(ArchetypeId),
    #[error("no targets matched `{0}`")]
    NoTargets(String),
    #[error("only one player is allowed, but `{0}` matched several")]
    TooManyTargets(String),
    #[error("permission level {required} required (have {actual})")]
    PermissionDenied { required: u8, actual: u8 },
}

impl CommandError {
    /// Exit code reported for a failed command.
    pub fn exit_code(&self) -> i32 {
        0
    }
}
