//! Update handler: one method per update variant, used when no conversation is in flight.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tbb_core::{
    CallbackQuery, ChatJoinRequest, ChatMemberStatus, ChatMemberUpdated, ChosenInlineResult,
    InlineQuery, Message, PreCheckoutQuery, ShippingQuery, Update,
};
use tracing::{error, info};

use crate::context::SessionContext;
use crate::conversation::{Continuation, Conversation};

/// Creates the handler owned by each new session.
pub type HandlerFactory<S> = Arc<dyn Fn() -> Box<dyn UpdateHandler<S>> + Send + Sync>;

fn log_payload<T: Serialize>(ctx: &SessionContext, method: &str, payload: &T) {
    let json = serde_json::to_string(payload).unwrap_or_default();
    info!(chat_id = ctx.chat_id(), method, payload = %json, "Unhandled update");
}

/// Enables the user when the bot becomes a member of the chat again and disables the user when it
/// was blocked. Other status changes are only logged.
pub async fn apply_membership_change(ctx: &SessionContext, update: &ChatMemberUpdated) {
    match update.new_chat_member.status {
        ChatMemberStatus::Member => ctx.enable_user().await,
        ChatMemberStatus::Kicked => ctx.disable_user().await,
        status => info!(
            chat_id = ctx.chat_id(),
            status = ?status,
            "Ignoring membership status change"
        ),
    }
}

/// Initial handlers per update variant. Every method has a default that logs the payload and
/// starts no conversation; bots override the ones they care about.
#[async_trait]
pub trait UpdateHandler<S: Conversation>: Send + Sync {
    async fn handle_message(&mut self, ctx: &SessionContext, message: &Message) -> Continuation<S> {
        log_payload(ctx, "handle_message", message);
        None
    }

    async fn handle_edited_message(
        &mut self,
        ctx: &SessionContext,
        message: &Message,
    ) -> Continuation<S> {
        log_payload(ctx, "handle_edited_message", message);
        None
    }

    async fn handle_channel_post(
        &mut self,
        ctx: &SessionContext,
        message: &Message,
    ) -> Continuation<S> {
        log_payload(ctx, "handle_channel_post", message);
        None
    }

    async fn handle_edited_channel_post(
        &mut self,
        ctx: &SessionContext,
        message: &Message,
    ) -> Continuation<S> {
        log_payload(ctx, "handle_edited_channel_post", message);
        None
    }

    async fn handle_inline_query(
        &mut self,
        ctx: &SessionContext,
        query: &InlineQuery,
    ) -> Continuation<S> {
        log_payload(ctx, "handle_inline_query", query);
        None
    }

    async fn handle_chosen_inline_result(
        &mut self,
        ctx: &SessionContext,
        result: &ChosenInlineResult,
    ) -> Continuation<S> {
        log_payload(ctx, "handle_chosen_inline_result", result);
        None
    }

    async fn handle_callback_query(
        &mut self,
        ctx: &SessionContext,
        query: &CallbackQuery,
    ) -> Continuation<S> {
        log_payload(ctx, "handle_callback_query", query);
        None
    }

    async fn handle_shipping_query(
        &mut self,
        ctx: &SessionContext,
        query: &ShippingQuery,
    ) -> Continuation<S> {
        log_payload(ctx, "handle_shipping_query", query);
        None
    }

    async fn handle_pre_checkout_query(
        &mut self,
        ctx: &SessionContext,
        query: &PreCheckoutQuery,
    ) -> Continuation<S> {
        log_payload(ctx, "handle_pre_checkout_query", query);
        None
    }

    async fn handle_chat_member(
        &mut self,
        ctx: &SessionContext,
        update: &ChatMemberUpdated,
    ) -> Continuation<S> {
        log_payload(ctx, "handle_chat_member", update);
        None
    }

    /// Change of the bot's own membership. Runs even while a conversation is in flight.
    async fn handle_my_chat_member(
        &mut self,
        ctx: &SessionContext,
        update: &ChatMemberUpdated,
    ) -> Continuation<S> {
        apply_membership_change(ctx, update).await;
        None
    }

    async fn handle_chat_join_request(
        &mut self,
        ctx: &SessionContext,
        request: &ChatJoinRequest,
    ) -> Continuation<S> {
        log_payload(ctx, "handle_chat_join_request", request);
        None
    }

    async fn handle_unknown(&mut self, ctx: &SessionContext, update: &Update) -> Continuation<S> {
        error!(
            chat_id = ctx.chat_id(),
            update = %update.to_json(),
            "Update has an unknown type"
        );
        None
    }
}

/// Handler that keeps every default.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultUpdateHandler;

#[async_trait]
impl<S: Conversation> UpdateHandler<S> for DefaultUpdateHandler {}
