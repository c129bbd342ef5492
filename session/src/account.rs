//! Account context: process-wide, read-only state shared by every session of one bot account.

use std::sync::Arc;
use std::time::Duration;

use storage::UserStore;
use tbb_core::{Bot, LookupTimezoneResolver, Result, TbbError, TimezoneResolver};
use tracing::info;

use crate::command::{Command, CommandRegistry};
use crate::conversation::Conversation;
use crate::handler::{DefaultUpdateHandler, HandlerFactory, UpdateHandler};

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_PROFILE_REFRESH_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// Access policy and timing for sessions.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Chats allowed to use the bot. Empty allows everyone.
    pub allowed_chat_ids: Vec<i64>,
    /// Idle time after which a session evicts itself.
    pub session_timeout: Duration,
    /// Age of a user record after which the profile is refreshed in the background.
    pub profile_refresh_after: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            allowed_chat_ids: Vec::new(),
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            profile_refresh_after: DEFAULT_PROFILE_REFRESH_AFTER,
        }
    }
}

impl SessionSettings {
    pub fn is_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chat_ids.is_empty() || self.allowed_chat_ids.contains(&chat_id)
    }
}

/// External collaborators every session talks to. Not generic over the conversation type, so
/// handlers and states only need a [`crate::SessionContext`].
pub struct AccountServices {
    pub settings: SessionSettings,
    pub bot: Arc<dyn Bot>,
    pub store: Arc<dyn UserStore>,
    pub timezones: Arc<dyn TimezoneResolver>,
}

/// Shared state of one bot account: services, command registry and the handler factory.
pub struct AccountContext<S: Conversation> {
    services: Arc<AccountServices>,
    commands: CommandRegistry<S>,
    handler_factory: HandlerFactory<S>,
}

impl<S: Conversation> AccountContext<S> {
    pub fn builder() -> AccountBuilder<S> {
        AccountBuilder::new()
    }

    pub fn services(&self) -> &Arc<AccountServices> {
        &self.services
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.services.settings
    }

    pub fn bot(&self) -> &Arc<dyn Bot> {
        &self.services.bot
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.services.store
    }

    pub fn commands(&self) -> &CommandRegistry<S> {
        &self.commands
    }

    /// Creates a fresh handler for a new session.
    pub fn new_handler(&self) -> Box<dyn UpdateHandler<S>> {
        (self.handler_factory)()
    }

    /// Publishes the visible commands as the bot menu, or clears the menu when there are none.
    pub async fn register_command_menu(&self) -> Result<()> {
        let menu = self.commands.menu_commands();
        if menu.is_empty() {
            info!("No visible commands, clearing bot command menu");
            self.services.bot.delete_my_commands().await
        } else {
            info!(count = menu.len(), "Registering bot command menu");
            self.services.bot.set_my_commands(menu).await
        }
    }
}

/// Builder for [`AccountContext`]. Bot and store are required.
pub struct AccountBuilder<S: Conversation> {
    settings: SessionSettings,
    bot: Option<Arc<dyn Bot>>,
    store: Option<Arc<dyn UserStore>>,
    timezones: Option<Arc<dyn TimezoneResolver>>,
    commands: Vec<Command<S>>,
    handler_factory: Option<HandlerFactory<S>>,
}

impl<S: Conversation> Default for AccountBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Conversation> AccountBuilder<S> {
    pub fn new() -> Self {
        Self {
            settings: SessionSettings::default(),
            bot: None,
            store: None,
            timezones: None,
            commands: Vec::new(),
            handler_factory: None,
        }
    }

    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn bot(mut self, bot: Arc<dyn Bot>) -> Self {
        self.bot = Some(bot);
        self
    }

    pub fn store(mut self, store: Arc<dyn UserStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Defaults to [`LookupTimezoneResolver`].
    pub fn timezone_resolver(mut self, resolver: Arc<dyn TimezoneResolver>) -> Self {
        self.timezones = Some(resolver);
        self
    }

    pub fn command(mut self, command: Command<S>) -> Self {
        self.commands.push(command);
        self
    }

    /// Defaults to [`DefaultUpdateHandler`].
    pub fn handler_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn UpdateHandler<S>> + Send + Sync + 'static,
    {
        self.handler_factory = Some(Arc::new(factory));
        self
    }

    pub fn build(self) -> Result<AccountContext<S>> {
        let bot = self
            .bot
            .ok_or_else(|| TbbError::Config("bot client is required".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| TbbError::Config("user store is required".to_string()))?;
        if self.settings.session_timeout.is_zero() {
            return Err(TbbError::Config(
                "session timeout must be greater than zero".to_string(),
            ));
        }
        let timezones = self
            .timezones
            .unwrap_or_else(|| Arc::new(LookupTimezoneResolver::new()));
        let handler_factory = self.handler_factory.unwrap_or_else(|| {
            Arc::new(|| Box::new(DefaultUpdateHandler) as Box<dyn UpdateHandler<S>>)
        });

        Ok(AccountContext {
            services: Arc::new(AccountServices {
                settings: self.settings,
                bot,
                store,
                timezones,
            }),
            commands: CommandRegistry::new(self.commands),
            handler_factory,
        })
    }
}
