//! Command dispatch.
//!
//! Host frontends hand the engine a command name, a target subject, and
//! pre-tokenized arguments; parsing human input and formatting replies
//! stays on the host side. Every handler funnels through the holder
//! operations, appends an audit entry, and queues a coalesced save.

use warden_core::{ContextSet, MutableContextSet, Node, Tristate};
use warden_model::{PermissionHolder, SetOutcome, UnsetOutcome, UserId};
use warden_store::ActionLogEntry;
use warden_store::Store;

use crate::engine::{now_millis, Engine};
use crate::saving::SaveKey;

/// Outcome classification for a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// The command ran and changed state (or answered a query).
    Success,
    /// The actor is not allowed to run this command.
    NoPermission,
    /// The command was well-formed but the state refused it
    /// (duplicate node, unknown group, nothing to remove).
    StateError,
    /// Malformed arguments.
    InvalidArgs,
    /// An internal error prevented execution.
    Failure,
}

/// The subject a command acts upon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandTarget {
    User(UserId),
    Group(String),
}

/// Mutable per-invocation state: arguments in, replies out.
#[derive(Debug)]
pub struct CommandContext {
    pub actor: Option<UserId>,
    pub actor_name: String,
    pub target: CommandTarget,
    pub args: Vec<String>,
    replies: Vec<String>,
}

impl CommandContext {
    pub fn new(
        actor: Option<UserId>,
        actor_name: impl Into<String>,
        target: CommandTarget,
        args: Vec<String>,
    ) -> Self {
        Self {
            actor,
            actor_name: actor_name.into(),
            target,
            args,
            replies: Vec::new(),
        }
    }

    /// Record a reply line for the host to surface.
    pub fn reply(&mut self, message: impl Into<String>) {
        self.replies.push(message.into());
    }

    pub fn replies(&self) -> &[String] {
        &self.replies
    }
}

/// The recognized commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    PermissionSet,
    PermissionUnset,
    PermissionSetTemp,
    MetaSet,
    MetaSetTemp,
    ParentAdd,
    ParentRemove,
}

/// Name-to-handler dispatch table.
pub const DISPATCH: &[(&str, CommandKind)] = &[
    ("permission set", CommandKind::PermissionSet),
    ("permission unset", CommandKind::PermissionUnset),
    ("permission settemp", CommandKind::PermissionSetTemp),
    ("meta set", CommandKind::MetaSet),
    ("meta settemp", CommandKind::MetaSetTemp),
    ("parent add", CommandKind::ParentAdd),
    ("parent remove", CommandKind::ParentRemove),
];

impl CommandKind {
    /// Look a command up by its wire name.
    pub fn parse(name: &str) -> Option<Self> {
        DISPATCH
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| *kind)
    }
}

/// Run a command against the engine.
pub async fn execute<S: Store + 'static>(
    engine: &Engine<S>,
    kind: CommandKind,
    ctx: &mut CommandContext,
) -> CommandResult {
    match kind {
        CommandKind::PermissionSet => permission_set(engine, ctx).await,
        CommandKind::PermissionUnset => permission_unset(engine, ctx).await,
        CommandKind::PermissionSetTemp => permission_settemp(engine, ctx).await,
        CommandKind::MetaSet => meta_set(engine, ctx).await,
        CommandKind::MetaSetTemp => meta_settemp(engine, ctx).await,
        CommandKind::ParentAdd => parent_add(engine, ctx).await,
        CommandKind::ParentRemove => parent_remove(engine, ctx).await,
    }
}

enum TargetHandle {
    User(warden_model::UserRef),
    Group(warden_model::GroupRef),
}

impl TargetHandle {
    fn with_holder<R>(&self, f: impl FnOnce(&mut PermissionHolder) -> R) -> R {
        match self {
            TargetHandle::User(u) => f(u.write().unwrap().holder_mut()),
            TargetHandle::Group(g) => f(g.write().unwrap().holder_mut()),
        }
    }
}

async fn resolve_target<S: Store + 'static>(
    engine: &Engine<S>,
    ctx: &mut CommandContext,
) -> Result<TargetHandle, CommandResult> {
    match &ctx.target {
        CommandTarget::User(id) => match engine.get_or_load_user(*id, None).await {
            Ok(handle) => Ok(TargetHandle::User(handle)),
            Err(err) => {
                ctx.reply(format!("could not load user: {err}"));
                Err(CommandResult::Failure)
            }
        },
        CommandTarget::Group(name) => match engine.get_group(name) {
            Some(handle) => Ok(TargetHandle::Group(handle)),
            None => {
                ctx.reply(format!("group {name} does not exist"));
                Err(CommandResult::StateError)
            }
        },
    }
}

fn save_key(target: &CommandTarget) -> SaveKey {
    match target {
        CommandTarget::User(id) => SaveKey::User(*id),
        CommandTarget::Group(name) => SaveKey::Group(name.clone()),
    }
}

fn acted(target: &CommandTarget, handle: &TargetHandle) -> (String, String) {
    match (target, handle) {
        (CommandTarget::User(id), TargetHandle::User(u)) => {
            (id.to_string(), u.read().unwrap().friendly_name())
        }
        (CommandTarget::Group(name), _) => (name.clone(), name.clone()),
        (CommandTarget::User(id), _) => (id.to_string(), id.to_string()),
    }
}

fn record<S: Store + 'static>(
    engine: &Engine<S>,
    ctx: &CommandContext,
    handle: &TargetHandle,
    action: String,
) {
    let (acted, acted_name) = acted(&ctx.target, handle);
    engine.submit_action(ActionLogEntry {
        timestamp: now_millis(),
        actor: ctx.actor,
        actor_name: ctx.actor_name.clone(),
        acted,
        acted_name,
        action,
    });
    engine.queue_save(save_key(&ctx.target));
}

/// Parse trailing `key=value` pairs into a context set.
fn parse_contexts(args: &[String]) -> Option<ContextSet> {
    let mut set = MutableContextSet::new();
    for arg in args {
        let (key, value) = arg.split_once('=')?;
        if key.is_empty() || value.is_empty() {
            return None;
        }
        set.add(key, value);
    }
    Some(set.freeze())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_duration_secs(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|secs| *secs > 0)
}

async fn permission_set<S: Store + 'static>(
    engine: &Engine<S>,
    ctx: &mut CommandContext,
) -> CommandResult {
    let args = ctx.args.clone();
    let Some(key) = args.first() else {
        ctx.reply("usage: <permission> [true|false] [contexts...]");
        return CommandResult::InvalidArgs;
    };
    let (value, rest) = match args.get(1).map(String::as_str) {
        Some("true") => (true, &args[2..]),
        Some("false") => (false, &args[2..]),
        _ => (true, &args[1..]),
    };
    let Some(contexts) = parse_contexts(rest) else {
        ctx.reply("contexts must be key=value pairs");
        return CommandResult::InvalidArgs;
    };

    let node = match Node::new(key.clone(), value, contexts, None) {
        Ok(node) => node,
        Err(err) => {
            ctx.reply(format!("invalid node: {err}"));
            return CommandResult::InvalidArgs;
        }
    };

    let handle = match resolve_target(engine, ctx).await {
        Ok(handle) => handle,
        Err(result) => return result,
    };

    match handle.with_holder(|h| h.set_permission(node.clone(), now_millis())) {
        SetOutcome::Success(_) => {
            ctx.reply(format!("set {key} to {value}"));
            record(engine, ctx, &handle, format!("permission set {key} {value}"));
            CommandResult::Success
        }
        SetOutcome::AlreadyHas | SetOutcome::AlreadyHasTemporary => {
            ctx.reply(format!("{key} is already set"));
            CommandResult::StateError
        }
    }
}

async fn permission_unset<S: Store + 'static>(
    engine: &Engine<S>,
    ctx: &mut CommandContext,
) -> CommandResult {
    let args = ctx.args.clone();
    let Some(key) = args.first() else {
        ctx.reply("usage: <permission> [contexts...]");
        return CommandResult::InvalidArgs;
    };
    let Some(contexts) = parse_contexts(&args[1..]) else {
        ctx.reply("contexts must be key=value pairs");
        return CommandResult::InvalidArgs;
    };

    // Identity is (key, contexts); value is irrelevant for removal.
    let node = match Node::new(key.clone(), true, contexts, None) {
        Ok(node) => node,
        Err(err) => {
            ctx.reply(format!("invalid node: {err}"));
            return CommandResult::InvalidArgs;
        }
    };

    let handle = match resolve_target(engine, ctx).await {
        Ok(handle) => handle,
        Err(result) => return result,
    };

    match handle.with_holder(|h| h.unset_permission(&node)) {
        UnsetOutcome::Success => {
            ctx.reply(format!("unset {key}"));
            record(engine, ctx, &handle, format!("permission unset {key}"));
            CommandResult::Success
        }
        UnsetOutcome::DoesNotHave => {
            ctx.reply(format!("{key} is not set"));
            CommandResult::StateError
        }
    }
}

async fn permission_settemp<S: Store + 'static>(
    engine: &Engine<S>,
    ctx: &mut CommandContext,
) -> CommandResult {
    let args = ctx.args.clone();
    let (Some(key), Some(value), Some(duration)) = (
        args.first(),
        args.get(1).and_then(|v| parse_bool(v)),
        args.get(2).and_then(|d| parse_duration_secs(d)),
    ) else {
        ctx.reply("usage: <permission> <true|false> <seconds> [contexts...]");
        return CommandResult::InvalidArgs;
    };
    let Some(contexts) = parse_contexts(&args[3..]) else {
        ctx.reply("contexts must be key=value pairs");
        return CommandResult::InvalidArgs;
    };

    let now = now_millis();
    let node = match Node::new(key.clone(), value, contexts, Some(now + duration * 1_000)) {
        Ok(node) => node,
        Err(err) => {
            ctx.reply(format!("invalid node: {err}"));
            return CommandResult::InvalidArgs;
        }
    };

    let handle = match resolve_target(engine, ctx).await {
        Ok(handle) => handle,
        Err(result) => return result,
    };

    let behaviour = engine.config().temporary_add_behaviour;
    match handle.with_holder(|h| h.set_permission_with(node, behaviour, now)) {
        SetOutcome::Success(stored) => {
            ctx.reply(format!(
                "set {key} to {value} until {}",
                stored.expiry().unwrap_or(0)
            ));
            record(
                engine,
                ctx,
                &handle,
                format!("permission settemp {key} {value} {duration}s"),
            );
            CommandResult::Success
        }
        SetOutcome::AlreadyHasTemporary | SetOutcome::AlreadyHas => {
            ctx.reply(format!("{key} is already set temporarily"));
            CommandResult::StateError
        }
    }
}

async fn meta_set<S: Store + 'static>(
    engine: &Engine<S>,
    ctx: &mut CommandContext,
) -> CommandResult {
    let args = ctx.args.clone();
    let (Some(meta_key), Some(meta_value)) = (args.first(), args.get(1)) else {
        ctx.reply("usage: <key> <value> [contexts...]");
        return CommandResult::InvalidArgs;
    };
    let Some(contexts) = parse_contexts(&args[2..]) else {
        ctx.reply("contexts must be key=value pairs");
        return CommandResult::InvalidArgs;
    };

    let node = match Node::meta(meta_key, meta_value)
        .with_extra_context(&contexts)
        .build()
    {
        Ok(node) => node,
        Err(err) => {
            ctx.reply(format!("invalid node: {err}"));
            return CommandResult::InvalidArgs;
        }
    };

    let handle = match resolve_target(engine, ctx).await {
        Ok(handle) => handle,
        Err(result) => return result,
    };

    // One effective value per key per context.
    handle.with_holder(|h| {
        h.clear_meta_keys(meta_key, &contexts, false);
        h.set_permission(node, now_millis())
    });

    ctx.reply(format!("set meta {meta_key} to {meta_value}"));
    record(
        engine,
        ctx,
        &handle,
        format!("meta set {meta_key} {meta_value}"),
    );
    CommandResult::Success
}

async fn meta_settemp<S: Store + 'static>(
    engine: &Engine<S>,
    ctx: &mut CommandContext,
) -> CommandResult {
    let args = ctx.args.clone();
    let (Some(meta_key), Some(meta_value), Some(duration)) = (
        args.first(),
        args.get(1),
        args.get(2).and_then(|d| parse_duration_secs(d)),
    ) else {
        ctx.reply("usage: <key> <value> <seconds> [contexts...]");
        return CommandResult::InvalidArgs;
    };
    let Some(contexts) = parse_contexts(&args[3..]) else {
        ctx.reply("contexts must be key=value pairs");
        return CommandResult::InvalidArgs;
    };

    let now = now_millis();
    let node = match Node::meta(meta_key, meta_value)
        .with_extra_context(&contexts)
        .duration(now, duration)
        .build()
    {
        Ok(node) => node,
        Err(err) => {
            ctx.reply(format!("invalid node: {err}"));
            return CommandResult::InvalidArgs;
        }
    };

    let handle = match resolve_target(engine, ctx).await {
        Ok(handle) => handle,
        Err(result) => return result,
    };

    if handle.with_holder(|h| h.has_permission(&node, true, now)) == Tristate::True {
        ctx.reply(format!("meta {meta_key} is already set to {meta_value}"));
        return CommandResult::StateError;
    }

    let behaviour = engine.config().temporary_add_behaviour;
    let outcome = handle.with_holder(|h| {
        // Displace other temporary values for this key before merging.
        h.clear_meta_keys(meta_key, &contexts, true);
        h.set_permission_with(node, behaviour, now)
    });

    match outcome {
        SetOutcome::Success(stored) => {
            ctx.reply(format!(
                "set meta {meta_key} to {meta_value} until {}",
                stored.expiry().unwrap_or(0)
            ));
            record(
                engine,
                ctx,
                &handle,
                format!("meta settemp {meta_key} {meta_value} {duration}s"),
            );
            CommandResult::Success
        }
        SetOutcome::AlreadyHasTemporary | SetOutcome::AlreadyHas => {
            ctx.reply(format!("meta {meta_key} is already set temporarily"));
            CommandResult::StateError
        }
    }
}

async fn parent_add<S: Store + 'static>(
    engine: &Engine<S>,
    ctx: &mut CommandContext,
) -> CommandResult {
    let args = ctx.args.clone();
    let Some(group) = args.first() else {
        ctx.reply("usage: <group> [contexts...]");
        return CommandResult::InvalidArgs;
    };
    let Some(contexts) = parse_contexts(&args[1..]) else {
        ctx.reply("contexts must be key=value pairs");
        return CommandResult::InvalidArgs;
    };

    if engine.get_group(group).is_none() {
        ctx.reply(format!("group {group} does not exist"));
        return CommandResult::StateError;
    }

    let node = match Node::group(group).with_extra_context(&contexts).build() {
        Ok(node) => node,
        Err(err) => {
            ctx.reply(format!("invalid node: {err}"));
            return CommandResult::InvalidArgs;
        }
    };

    let handle = match resolve_target(engine, ctx).await {
        Ok(handle) => handle,
        Err(result) => return result,
    };

    match handle.with_holder(|h| h.set_permission(node, now_millis())) {
        SetOutcome::Success(_) => {
            ctx.reply(format!("now inherits from {group}"));
            record(engine, ctx, &handle, format!("parent add {group}"));
            CommandResult::Success
        }
        SetOutcome::AlreadyHas | SetOutcome::AlreadyHasTemporary => {
            ctx.reply(format!("already inherits from {group}"));
            CommandResult::StateError
        }
    }
}

async fn parent_remove<S: Store + 'static>(
    engine: &Engine<S>,
    ctx: &mut CommandContext,
) -> CommandResult {
    let args = ctx.args.clone();
    let Some(group) = args.first() else {
        ctx.reply("usage: <group> [contexts...]");
        return CommandResult::InvalidArgs;
    };
    let Some(contexts) = parse_contexts(&args[1..]) else {
        ctx.reply("contexts must be key=value pairs");
        return CommandResult::InvalidArgs;
    };

    let node = match Node::group(group).with_extra_context(&contexts).build() {
        Ok(node) => node,
        Err(err) => {
            ctx.reply(format!("invalid node: {err}"));
            return CommandResult::InvalidArgs;
        }
    };

    let handle = match resolve_target(engine, ctx).await {
        Ok(handle) => handle,
        Err(result) => return result,
    };

    match handle.with_holder(|h| h.unset_permission(&node)) {
        UnsetOutcome::Success => {
            ctx.reply(format!("no longer inherits from {group}"));
            record(engine, ctx, &handle, format!("parent remove {group}"));
            CommandResult::Success
        }
        UnsetOutcome::DoesNotHave => {
            ctx.reply(format!("does not inherit from {group}"));
            CommandResult::StateError
        }
    }
}
