//! The privileged `identity` command.
//!
//! ```text
//! identity grant   <players>  <archetype>
//! identity revoke  <players>  <archetype>
//! identity equip   <entities> <archetype>
//! identity unequip <entities>
//! identity test    <player> [not] <archetype>
//! identity test    not <player> <archetype>
//! ```
//!
//! Commands are gated by a permission level and bypass unlocks entirely. The engine
//! integration exposes its actors through [`IdentityHost`]; selector semantics live
//! here so every integration resolves targets the same way.

use crate::{
    actor::{ActorHost, ActorId},
    archetype::{ArchetypeId, ArchetypeInfo, WorldContext},
    error::CommandError,
    identity::IdentityState,
    services::IdentityServices,
    unlock::UnlockedSet,
};
use nalgebra::Point3;
use std::{fmt, str::FromStr};

const COMMAND_NAME: &str = "identity";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// `@s`
    Source,
    /// `@p`
    NearestPlayer,
    /// `@a`
    AllPlayers,
    /// `@e`
    AllEntities,
    /// `#<actor id>`
    Id(ActorId),
    Name(String),
}

impl FromStr for Selector {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let selector = match s {
            "@s" => Selector::Source,
            "@p" => Selector::NearestPlayer,
            "@a" => Selector::AllPlayers,
            "@e" => Selector::AllEntities,
            _ => {
                if let Some(id) = s.strip_prefix('#') {
                    let id = id
                        .parse()
                        .map_err(|_| CommandError::InvalidSelector(s.to_owned()))?;
                    Selector::Id(id)
                } else if is_player_name(s) {
                    Selector::Name(s.to_owned())
                } else {
                    return Err(CommandError::InvalidSelector(s.to_owned()));
                }
            }
        };
        Ok(selector)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Source => f.write_str("@s"),
            Selector::NearestPlayer => f.write_str("@p"),
            Selector::AllPlayers => f.write_str("@a"),
            Selector::AllEntities => f.write_str("@e"),
            Selector::Id(id) => write!(f, "#{id}"),
            Selector::Name(name) => f.write_str(name),
        }
    }
}

fn is_player_name(s: &str) -> bool {
    (1..=16).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityCommand {
    Grant {
        targets: Selector,
        archetype: ArchetypeId,
    },
    Revoke {
        targets: Selector,
        archetype: ArchetypeId,
    },
    Equip {
        targets: Selector,
        archetype: ArchetypeId,
    },
    Unequip {
        targets: Selector,
    },
    Test {
        target: Selector,
        archetype: ArchetypeId,
    },
    TestNot {
        target: Selector,
        archetype: ArchetypeId,
    },
}

impl FromStr for IdentityCommand {
    type Err = CommandError;

    /// Parses a command line, with or without the leading `/identity`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens
            .first()
            .is_some_and(|first| first.trim_start_matches('/') == COMMAND_NAME)
        {
            tokens.remove(0);
        }

        let command = match tokens.as_slice() {
            ["grant", targets, archetype] => IdentityCommand::Grant {
                targets: targets.parse()?,
                archetype: ArchetypeId::new(archetype),
            },
            ["revoke", targets, archetype] => IdentityCommand::Revoke {
                targets: targets.parse()?,
                archetype: ArchetypeId::new(archetype),
            },
            ["equip", targets, archetype] => IdentityCommand::Equip {
                targets: targets.parse()?,
                archetype: ArchetypeId::new(archetype),
            },
            ["unequip", targets] => IdentityCommand::Unequip {
                targets: targets.parse()?,
            },
            ["test", "not", target, archetype] | ["test", target, "not", archetype] => {
                IdentityCommand::TestNot {
                    target: target.parse()?,
                    archetype: ArchetypeId::new(archetype),
                }
            }
            ["test", target, archetype] => IdentityCommand::Test {
                target: target.parse()?,
                archetype: ArchetypeId::new(archetype),
            },
            _ => return Err(CommandError::Parse(line.trim().to_owned())),
        };
        Ok(command)
    }
}

/// How many and which kind of actors a selector may resolve to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    Players,
    SinglePlayer,
    Entities,
}

/// Who issued a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSource {
    /// `None` for the server console.
    pub actor: Option<ActorId>,
    pub name: String,
    pub permission_level: u8,
}

impl CommandSource {
    pub fn console(permission_level: u8) -> Self {
        Self {
            actor: None,
            name: "Server".to_owned(),
            permission_level,
        }
    }
}

/// Mutable view of one actor's identity and the actor itself.
pub struct IdentityEntry<'a> {
    pub state: &'a mut IdentityState,
    pub actor: &'a mut dyn ActorHost,
}

/// The actors a command can see and touch.
pub trait IdentityHost {
    fn players(&self) -> Vec<ActorId>;
    /// Every actor, players included.
    fn entities(&self) -> Vec<ActorId>;
    fn player_named(&self, name: &str) -> Option<ActorId>;
    fn position(&self, actor: ActorId) -> Option<Point3<f32>>;
    fn display_name(&self, actor: ActorId) -> String;
    /// `None` for actors that cannot hold unlocks.
    fn unlocked_mut(&mut self, actor: ActorId) -> Option<&mut UnlockedSet>;
    /// `None` for actors that cannot hold an identity.
    fn identity_entry(&mut self, actor: ActorId) -> Option<IdentityEntry<'_>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recipient {
    Source,
    Actor(ActorId),
}

/// One confirmation line: a translation key plus its rendered English text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub recipient: Recipient,
    pub key: &'static str,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub exit_code: i32,
    pub feedback: Vec<Feedback>,
}

impl CommandOutcome {
    fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            feedback: Vec::new(),
        }
    }
}

pub struct AuthorizationService<'a> {
    services: &'a IdentityServices,
    world: &'a dyn WorldContext,
}

impl<'a> AuthorizationService<'a> {
    pub fn new(services: &'a IdentityServices, world: &'a dyn WorldContext) -> Self {
        Self { services, world }
    }

    /// Parses and executes `line`. Failures become an error line with exit code 0.
    pub fn run(&self, host: &mut dyn IdentityHost, source: &CommandSource, line: &str) -> CommandOutcome {
        let result = line
            .parse::<IdentityCommand>()
            .and_then(|command| self.execute(host, source, &command));

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                log::debug!("`{}` failed for {}: {err}", line.trim(), source.name);
                CommandOutcome {
                    exit_code: err.exit_code(),
                    feedback: vec![Feedback {
                        recipient: Recipient::Source,
                        key: "identity.command_failed",
                        text: err.to_string(),
                    }],
                }
            }
        }
    }

    pub fn execute(
        &self,
        host: &mut dyn IdentityHost,
        source: &CommandSource,
        command: &IdentityCommand,
    ) -> Result<CommandOutcome, CommandError> {
        let required = self.services.config.command_permission_level;
        if source.permission_level < required {
            return Err(CommandError::PermissionDenied {
                required,
                actual: source.permission_level,
            });
        }

        match command {
            IdentityCommand::Grant { targets, archetype } => {
                let targets = self.resolve(host, source, targets, TargetKind::Players)?;
                self.grant(host, &targets, archetype)
            }
            IdentityCommand::Revoke { targets, archetype } => {
                let targets = self.resolve(host, source, targets, TargetKind::Players)?;
                self.revoke(host, &targets, archetype)
            }
            IdentityCommand::Equip { targets, archetype } => {
                let targets = self.resolve(host, source, targets, TargetKind::Entities)?;
                self.equip(host, &targets, archetype)
            }
            IdentityCommand::Unequip { targets } => {
                let targets = self.resolve(host, source, targets, TargetKind::Entities)?;
                Ok(self.unequip(host, &targets))
            }
            IdentityCommand::Test { target, archetype } => {
                let target = self.resolve(host, source, target, TargetKind::SinglePlayer)?[0];
                self.test(host, target, archetype)
            }
            IdentityCommand::TestNot { target, archetype } => {
                let target = self.resolve(host, source, target, TargetKind::SinglePlayer)?[0];
                self.test_not(host, target, archetype)
            }
        }
    }

    /// Resolves `selector`; never returns an empty list.
    pub fn resolve(
        &self,
        host: &dyn IdentityHost,
        source: &CommandSource,
        selector: &Selector,
        kind: TargetKind,
    ) -> Result<Vec<ActorId>, CommandError> {
        let players = host.players();
        let mut targets = match selector {
            Selector::Source => source.actor.into_iter().collect(),
            Selector::NearestPlayer => nearest_player(host, source, &players).into_iter().collect(),
            Selector::AllPlayers => players.clone(),
            Selector::AllEntities => host.entities(),
            Selector::Id(id) => host.entities().into_iter().filter(|actor| actor == id).collect(),
            Selector::Name(name) => host.player_named(name).into_iter().collect::<Vec<_>>(),
        };

        if kind != TargetKind::Entities {
            targets.retain(|actor| players.contains(actor));
        }
        if targets.is_empty() {
            return Err(CommandError::NoTargets(selector.to_string()));
        }
        if kind == TargetKind::SinglePlayer && targets.len() > 1 {
            return Err(CommandError::TooManyTargets(selector.to_string()));
        }
        Ok(targets)
    }

    pub fn grant(
        &self,
        host: &mut dyn IdentityHost,
        targets: &[ActorId],
        archetype: &ArchetypeId,
    ) -> Result<CommandOutcome, CommandError> {
        let info = self.summonable(archetype)?;
        let mut outcome = CommandOutcome::new(1);

        for &target in targets {
            let player = host.display_name(target);
            let Some(unlocked) = host.unlocked_mut(target) else {
                continue;
            };
            if unlocked.unlock(archetype.clone()) {
                log::info!("Granted `{archetype}` to {player}");
                self.feedback(
                    &mut outcome,
                    Recipient::Actor(target),
                    "identity.unlock_entity",
                    format!("You unlocked the {} identity!", info.display_name),
                );
                self.feedback(
                    &mut outcome,
                    Recipient::Source,
                    "identity.grant_success",
                    format!("Granted {} to {player}.", info.display_name),
                );
            } else {
                self.feedback(
                    &mut outcome,
                    Recipient::Source,
                    "identity.already_has",
                    format!("{player} already has the {} identity.", info.display_name),
                );
            }
        }
        Ok(outcome)
    }

    pub fn revoke(
        &self,
        host: &mut dyn IdentityHost,
        targets: &[ActorId],
        archetype: &ArchetypeId,
    ) -> Result<CommandOutcome, CommandError> {
        let info = self.summonable(archetype)?;
        let mut outcome = CommandOutcome::new(1);

        for &target in targets {
            let player = host.display_name(target);
            let Some(unlocked) = host.unlocked_mut(target) else {
                continue;
            };
            if unlocked.revoke(archetype) {
                log::info!("Revoked `{archetype}` from {player}");
                self.feedback(
                    &mut outcome,
                    Recipient::Actor(target),
                    "identity.revoke_entity",
                    format!("Your {} identity was revoked.", info.display_name),
                );
                self.feedback(
                    &mut outcome,
                    Recipient::Source,
                    "identity.revoke_success",
                    format!("Revoked {} from {player}.", info.display_name),
                );
            } else {
                self.feedback(
                    &mut outcome,
                    Recipient::Source,
                    "identity.does_not_have",
                    format!("{player} does not have the {} identity.", info.display_name),
                );
            }
        }
        Ok(outcome)
    }

    /// Force-equips every target that can hold an identity; the rest are skipped.
    pub fn equip(
        &self,
        host: &mut dyn IdentityHost,
        targets: &[ActorId],
        archetype: &ArchetypeId,
    ) -> Result<CommandOutcome, CommandError> {
        let info = self.summonable(archetype)?;
        let mut outcome = CommandOutcome::new(1);

        for &target in targets {
            let name = host.display_name(target);
            let Some(entry) = host.identity_entry(target) else {
                continue;
            };
            match entry
                .state
                .set_identity(Some(archetype), self.services, self.world, entry.actor)
            {
                Ok(_) => self.feedback(
                    &mut outcome,
                    Recipient::Source,
                    "identity.equip_success",
                    format!("Equipped {} on {name}.", info.display_name),
                ),
                Err(err) => log::debug!("Skipping {name}: {err}"),
            }
        }
        Ok(outcome)
    }

    pub fn unequip(&self, host: &mut dyn IdentityHost, targets: &[ActorId]) -> CommandOutcome {
        let mut outcome = CommandOutcome::new(1);

        for &target in targets {
            let name = host.display_name(target);
            let Some(entry) = host.identity_entry(target) else {
                continue;
            };
            // Clearing never constructs, so it cannot fail.
            if entry
                .state
                .set_identity(None, self.services, self.world, entry.actor)
                .is_ok()
            {
                self.feedback(
                    &mut outcome,
                    Recipient::Source,
                    "identity.unequip_success",
                    format!("Cleared the identity of {name}."),
                );
            }
        }
        outcome
    }

    /// Exit code 1 iff `target` is equipped with exactly `archetype`.
    pub fn test(
        &self,
        host: &mut dyn IdentityHost,
        target: ActorId,
        archetype: &ArchetypeId,
    ) -> Result<CommandOutcome, CommandError> {
        let info = self.summonable(archetype)?;
        let equipped = self.is_equipped_with(host, target, archetype);
        Ok(self.test_outcome(host, target, info, equipped, equipped))
    }

    /// Exit code 1 iff `target` is not equipped with `archetype`, including no identity.
    pub fn test_not(
        &self,
        host: &mut dyn IdentityHost,
        target: ActorId,
        archetype: &ArchetypeId,
    ) -> Result<CommandOutcome, CommandError> {
        let info = self.summonable(archetype)?;
        let equipped = self.is_equipped_with(host, target, archetype);
        Ok(self.test_outcome(host, target, info, equipped, !equipped))
    }

    fn is_equipped_with(&self, host: &mut dyn IdentityHost, target: ActorId, archetype: &ArchetypeId) -> bool {
        host.identity_entry(target)
            .is_some_and(|entry| entry.state.is_equipped_with(archetype))
    }

    fn test_outcome(
        &self,
        host: &dyn IdentityHost,
        target: ActorId,
        info: &ArchetypeInfo,
        equipped: bool,
        passed: bool,
    ) -> CommandOutcome {
        let player = host.display_name(target);
        let mut outcome = CommandOutcome::new(i32::from(passed));
        if equipped {
            self.feedback(
                &mut outcome,
                Recipient::Source,
                "identity.test_positive",
                format!("{player} is a {}.", info.display_name),
            );
        } else {
            self.feedback(
                &mut outcome,
                Recipient::Source,
                "identity.test_failed",
                format!("{player} is not a {}.", info.display_name),
            );
        }
        outcome
    }

    fn summonable(&self, archetype: &ArchetypeId) -> Result<&'a ArchetypeInfo, CommandError> {
        self.services
            .archetypes
            .summonable(archetype)
            .ok_or_else(|| CommandError::UnknownArchetype(archetype.clone()))
    }

    fn feedback(&self, outcome: &mut CommandOutcome, recipient: Recipient, key: &'static str, text: String) {
        if self.services.config.log_commands {
            outcome.feedback.push(Feedback {
                recipient,
                key,
                text,
            });
        }
    }
}

fn nearest_player(host: &dyn IdentityHost, source: &CommandSource, players: &[ActorId]) -> Option<ActorId> {
    let Some(origin) = source.actor else {
        return players.first().copied();
    };
    if players.contains(&origin) {
        return Some(origin);
    }
    let origin = host.position(origin)?;

    players
        .iter()
        .filter_map(|&player| Some((player, nalgebra::distance(&origin, &host.position(player)?))))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(player, _)| player)
}
