/// Persisted `id` value meaning "no identity equipped".
///
/// Always paired with an empty (and ignored) `EntityData` payload.
pub const EMPTY_IDENTITY_ID: &str = "empty";

/// Namespace prefix accepted on archetype ids and stripped during normalization.
///
/// `"minecraft:zombie"` and `"zombie"` name the same archetype, and the legacy
/// `"minecraft:empty"` sentinel reads as [`EMPTY_IDENTITY_ID`].
pub const ARCHETYPE_NAMESPACE: &str = "minecraft:";

/// Archetype of a plain player actor with no identity equipped.
pub const PLAYER_ARCHETYPE: &str = "player";

/// Max-health base restored when an identity is cleared with health scaling on.
pub const DEFAULT_BASELINE_MAX_HEALTH: f32 = 20.0;

/// Default cap applied to a scaled max-health value.
pub const DEFAULT_MAX_HEALTH_CAP: f32 = 40.0;

/// Minimum permission level for the privileged `identity` command.
pub const DEFAULT_COMMAND_PERMISSION_LEVEL: u8 = 2;

/// Permission level granted to the module owner.
pub const OWNER_PERMISSION_LEVEL: u8 = 4;

/// Authoritative tick pass frequency (Hz).
pub const IDENTITY_TICK_HZ: i64 = 20;

/// Eye height as a fraction of body height when an archetype does not specify one.
pub const DEFAULT_EYE_HEIGHT_RATIO: f32 = 0.85;
