//! Command descriptors, the command registry and command-line parsing.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tbb_core::{BotCommand, Update};
use tracing::warn;

use crate::context::SessionContext;
use crate::conversation::{Continuation, Conversation};

/// Prefix every command name starts with.
pub const COMMAND_PREFIX: char = '/';

/// Entry point invoked when a registered command matches.
#[async_trait]
pub trait CommandHandler<S: Conversation>: Send + Sync {
    /// Runs the command. Return a state to start a follow-up exchange.
    async fn handle(&self, ctx: &SessionContext, command: &Command<S>) -> Continuation<S>;
}

/// Named trigger bound to a handler. Only commands with a description appear in the bot menu.
pub struct Command<S: Conversation> {
    pub name: String,
    pub description: String,
    /// Tokens after the command name; filled per invocation.
    pub params: Vec<String>,
    pub handler: Option<Arc<dyn CommandHandler<S>>>,
    /// Opaque payload attached at registration and shared by every invocation.
    pub data: Option<Arc<dyn Any + Send + Sync>>,
}

impl<S: Conversation> Clone for Command<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            params: self.params.clone(),
            handler: self.handler.clone(),
            data: self.data.clone(),
        }
    }
}

impl<S: Conversation> fmt::Debug for Command<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("params", &self.params)
            .field("has_handler", &self.handler.is_some())
            .field("has_data", &self.data.is_some())
            .finish()
    }
}

impl<S: Conversation> Command<S> {
    /// Command without description and handler. Matching it only records it as the session's command.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            params: Vec::new(),
            handler: None,
            data: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn handler(mut self, handler: impl CommandHandler<S> + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.data = Some(Arc::new(data));
        self
    }

    /// The attached payload, if there is one of type `T`.
    pub fn data_as<T: Any>(&self) -> Option<&T> {
        self.data.as_deref()?.downcast_ref::<T>()
    }

    /// True when the command is advertised in the bot menu.
    pub fn is_visible(&self) -> bool {
        !self.name.is_empty() && !self.description.is_empty()
    }
}

/// Splits a command line into the command token and its parameters.
///
/// Surrounding whitespace is trimmed and runs of two or more whitespace characters collapse to a
/// single space before splitting on spaces. Returns `None` unless the text starts with [`COMMAND_PREFIX`].
pub fn parse_command_line(text: &str) -> Option<(String, Vec<String>)> {
    let text = text.trim();
    if !text.starts_with(COMMAND_PREFIX) {
        return None;
    }

    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() && chars.peek().is_some_and(|n| n.is_whitespace()) {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            normalized.push(' ');
        } else {
            normalized.push(c);
        }
    }

    let mut tokens = normalized.split(' ').map(str::to_string);
    let name = tokens.next()?;
    Some((name, tokens.collect()))
}

/// Name-keyed, immutable set of commands.
pub struct CommandRegistry<S: Conversation> {
    commands: HashMap<String, Command<S>>,
}

impl<S: Conversation> Clone for CommandRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
        }
    }
}

impl<S: Conversation> Default for CommandRegistry<S> {
    fn default() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }
}

impl<S: Conversation> CommandRegistry<S> {
    /// Builds the registry; later commands replace earlier ones with the same name.
    /// Names without the command prefix are skipped.
    pub fn new(commands: impl IntoIterator<Item = Command<S>>) -> Self {
        let mut map = HashMap::new();
        for command in commands {
            if !command.name.starts_with(COMMAND_PREFIX) || command.name.len() < 2 {
                warn!(command = %command.name, "Skipping command without '/' prefix");
                continue;
            }
            map.insert(command.name.clone(), command);
        }
        Self { commands: map }
    }

    pub fn get(&self, name: &str) -> Option<&Command<S>> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns a copy of the matching command with its parameters bound, if the update's
    /// message text invokes a registered command.
    pub fn match_update(&self, update: &Update) -> Option<Command<S>> {
        let (name, params) = parse_command_line(update.text()?)?;
        let mut command = self.commands.get(&name)?.clone();
        command.params = params;
        Some(command)
    }

    /// Menu entries for visible commands, sorted by name, without the prefix.
    pub fn menu_commands(&self) -> Vec<BotCommand> {
        let mut menu: Vec<BotCommand> = self
            .commands
            .values()
            .filter(|c| c.is_visible())
            .map(|c| BotCommand {
                command: c.name.trim_start_matches(COMMAND_PREFIX).to_string(),
                description: c.description.clone(),
            })
            .collect();
        menu.sort_by(|a, b| a.command.cmp(&b.command));
        menu
    }
}
