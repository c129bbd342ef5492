use async_trait::async_trait;

use crate::command::{Command, CommandHandler};
use crate::context::SessionContext;
use crate::conversation::{Continuation, Conversation};

const DEFAULT_HELP: &str = "Hi {name} 👋. Here is a list of available commands:

/enable   Enables the notifications
/disable  Disables the notifications
/timezone Sets your time zone from a location
/help     Shows this help message";

/// Sends a help text. `{name}` is replaced with the user's first name or handle.
#[derive(Debug, Clone)]
pub struct HelpCommand {
    template: String,
}

impl Default for HelpCommand {
    fn default() -> Self {
        Self::new(DEFAULT_HELP)
    }
}

impl HelpCommand {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, name: &str) -> String {
        self.template.replace("{name}", name)
    }
}

#[async_trait]
impl<S: Conversation> CommandHandler<S> for HelpCommand {
    async fn handle(&self, ctx: &SessionContext, _command: &Command<S>) -> Continuation<S> {
        let name = ctx.display_name().await;
        ctx.reply(&self.render(&name)).await;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_name() {
        let help = HelpCommand::new("Hi {name}, bye {name}");
        assert_eq!(help.render("Ada"), "Hi Ada, bye Ada");
    }

    #[test]
    fn test_default_lists_commands() {
        let text = HelpCommand::default().render("Ada");
        assert!(text.starts_with("Hi Ada"));
        assert!(text.contains("/enable"));
        assert!(text.contains("/timezone"));
    }
}
