//! Message-list assembly for routine generation and follow-up chat.
//!
//! The conversation is either `Fresh` (no routine yet) or `Active` (a
//! routine was generated and later turns build on it). Only a successful
//! routine response moves it to `Active`; only [`Conversation::reset`]
//! moves it back.

use std::sync::Arc;
use tracing::debug;

use crate::errors::AssembleError;
use crate::prompt;
use crate::wire::{ChatMessage, Product, Role};

pub const PLACEHOLDER_FRESH: &str = "Ask me about products or routines…";
pub const PLACEHOLDER_ACTIVE: &str = "Ask me about your routine or request changes...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutineState {
    #[default]
    Fresh,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationEvent {
    RoutineGenerated,
    ReplyAppended,
    Reset,
}

pub trait ConversationObserver: Send + Sync {
    fn conversation_changed(&self, event: ConversationEvent, history: &[ChatMessage]);
}

/// The two messages of a routine request, kept apart so the caller can
/// record them after a successful reply.
#[derive(Debug, Clone)]
pub struct RoutineRequest {
    pub system: ChatMessage,
    pub user: ChatMessage,
}

impl RoutineRequest {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![self.system.clone(), self.user.clone()]
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub user: ChatMessage,
}

pub fn build_routine_request(selection: &[Product]) -> Result<RoutineRequest, AssembleError> {
    if selection.is_empty() {
        return Err(AssembleError::EmptySelection);
    }
    Ok(RoutineRequest {
        system: ChatMessage::system(prompt::system_prompt_routine()),
        user: ChatMessage::user(prompt::user_prompt_routine(selection)),
    })
}

/// Fresh system prompt, then prior non-system turns, then the new user turn.
pub fn build_chat_request(
    state: RoutineState,
    selection: &[Product],
    history: &[ChatMessage],
    new_user_text: &str,
) -> Result<ChatRequest, AssembleError> {
    let text = new_user_text.trim();
    if text.is_empty() {
        return Err(AssembleError::EmptyMessage);
    }
    let system = prompt::system_prompt_chat_with(selection, state == RoutineState::Active);
    let user = ChatMessage::user(text);

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(history.iter().filter(|m| m.role != Role::System).cloned());
    messages.push(user.clone());

    Ok(ChatRequest { messages, user })
}

#[derive(Default)]
pub struct Conversation {
    history: Vec<ChatMessage>,
    state: RoutineState,
    observers: Vec<Arc<dyn ConversationObserver>>,
}

impl Conversation {
    pub fn new(observers: Vec<Arc<dyn ConversationObserver>>) -> Self {
        Self { history: Vec::new(), state: RoutineState::Fresh, observers }
    }

    #[cfg(test)]
    pub fn state(&self) -> RoutineState {
        self.state
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn placeholder(&self) -> &'static str {
        match self.state {
            RoutineState::Fresh => PLACEHOLDER_FRESH,
            RoutineState::Active => PLACEHOLDER_ACTIVE,
        }
    }

    pub fn build_routine_request(&self, selection: &[Product]) -> Result<RoutineRequest, AssembleError> {
        build_routine_request(selection)
    }

    pub fn build_chat_request(&self, selection: &[Product], new_user_text: &str) -> Result<ChatRequest, AssembleError> {
        build_chat_request(self.state, selection, &self.history, new_user_text)
    }

    pub fn on_routine_success(&mut self, system: ChatMessage, user: ChatMessage, assistant_content: String) {
        self.history.push(system);
        self.history.push(user);
        self.history.push(ChatMessage::assistant(assistant_content));
        self.state = RoutineState::Active;
        debug!(history = self.history.len(), "routine recorded");
        self.notify(ConversationEvent::RoutineGenerated);
    }

    pub fn on_chat_success(&mut self, user: ChatMessage, assistant_content: String) {
        self.history.push(user);
        self.history.push(ChatMessage::assistant(assistant_content));
        debug!(history = self.history.len(), "chat turn recorded");
        self.notify(ConversationEvent::ReplyAppended);
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.state = RoutineState::Fresh;
        self.notify(ConversationEvent::Reset);
    }

    fn notify(&self, event: ConversationEvent) {
        for o in &self.observers {
            o.conversation_changed(event, &self.history);
        }
    }
}
