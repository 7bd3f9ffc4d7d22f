//! Owned application state: the selection, the conversation built on it,
//! and the bookkeeping that lets a late completion be discarded.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::conversation::{ChatRequest, Conversation, ConversationObserver, RoutineRequest};
use crate::errors::{AssembleError, CompletionError, SessionError};
use crate::log::ExchangeLog;
use crate::provider::CompletionClient;
use crate::selection::{SelectionObserver, SelectionStore};
use crate::storage::SelectionStorage;
use crate::wire::{ChatMessage, Product};

/// Identifies one in-flight completion. Any later request or a clear-all
/// makes it stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

pub struct PendingRoutine {
    pub ticket: Ticket,
    pub request: RoutineRequest,
}

pub struct PendingChat {
    pub ticket: Ticket,
    pub request: ChatRequest,
}

#[derive(Default)]
pub struct Observers {
    pub selection: Vec<Arc<dyn SelectionObserver>>,
    pub conversation: Vec<Arc<dyn ConversationObserver>>,
}

pub struct Session {
    selection: SelectionStore,
    conversation: Conversation,
    current: u64,
    exchanges: Option<ExchangeLog>,
}

impl Session {
    pub fn new(storage: SelectionStorage, observers: Observers) -> Self {
        Self {
            selection: SelectionStore::restore(storage, observers.selection),
            conversation: Conversation::new(observers.conversation),
            current: 0,
            exchanges: None,
        }
    }

    pub fn with_exchange_log(mut self, log: ExchangeLog) -> Self {
        self.exchanges = Some(log);
        self
    }

    pub fn selection(&self) -> &[Product] {
        self.selection.products()
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn history(&self) -> &[ChatMessage] {
        self.conversation.history()
    }

    #[cfg(test)]
    pub fn routine_state(&self) -> crate::conversation::RoutineState {
        self.conversation.state()
    }

    pub fn placeholder(&self) -> &'static str {
        self.conversation.placeholder()
    }

    pub fn select(&mut self, product: Product) -> bool {
        self.selection.add(product)
    }

    pub fn remove(&mut self, id: i64) -> bool {
        self.selection.remove(id)
    }

    /// Empties the selection and its stored copy, forgets the conversation,
    /// and orphans any in-flight request.
    pub fn clear_all(&mut self) {
        self.selection.clear();
        self.conversation.reset();
        self.current += 1;
        info!("selection and conversation cleared");
    }

    fn next_ticket(&mut self) -> Ticket {
        self.current += 1;
        Ticket(self.current)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.current
    }

    pub fn begin_routine(&mut self) -> Result<PendingRoutine, AssembleError> {
        let request = self.conversation.build_routine_request(self.selection.products())?;
        Ok(PendingRoutine { ticket: self.next_ticket(), request })
    }

    pub fn finish_routine(
        &mut self,
        pending: PendingRoutine,
        outcome: Result<String, CompletionError>,
    ) -> Result<String, SessionError> {
        self.record_exchange("routine", &pending.request.messages(), &outcome);
        if !self.is_current(pending.ticket) {
            debug!(ticket = pending.ticket.0, "dropping stale routine response");
            return Err(SessionError::Superseded);
        }
        let routine = outcome?;
        let RoutineRequest { system, user } = pending.request;
        self.conversation.on_routine_success(system, user, routine.clone());
        Ok(routine)
    }

    pub fn begin_chat(&mut self, text: &str) -> Result<PendingChat, AssembleError> {
        let request = self.conversation.build_chat_request(self.selection.products(), text)?;
        Ok(PendingChat { ticket: self.next_ticket(), request })
    }

    pub fn finish_chat(
        &mut self,
        pending: PendingChat,
        outcome: Result<String, CompletionError>,
    ) -> Result<String, SessionError> {
        self.record_exchange("chat", &pending.request.messages, &outcome);
        if !self.is_current(pending.ticket) {
            debug!(ticket = pending.ticket.0, "dropping stale chat response");
            return Err(SessionError::Superseded);
        }
        let reply = outcome?;
        self.conversation.on_chat_success(pending.request.user, reply.clone());
        Ok(reply)
    }

    /// One routine round trip. An empty selection fails before any request.
    pub async fn generate_routine(&mut self, client: &dyn CompletionClient) -> Result<String, SessionError> {
        let pending = self.begin_routine()?;
        let outcome = client.complete(&pending.request.messages()).await;
        self.finish_routine(pending, outcome)
    }

    /// One follow-up chat round trip. Blank text fails before any request.
    pub async fn ask(&mut self, client: &dyn CompletionClient, text: &str) -> Result<String, SessionError> {
        let pending = self.begin_chat(text)?;
        let outcome = client.complete(&pending.request.messages).await;
        self.finish_chat(pending, outcome)
    }

    fn record_exchange(&mut self, stage: &str, request: &[ChatMessage], outcome: &Result<String, CompletionError>) {
        if let Some(log) = self.exchanges.as_mut() {
            let outcome = outcome.as_deref().map_err(|e| e.to_string());
            if let Err(err) = log.save(stage, request, outcome) {
                warn!("could not save {stage} exchange: {err:#}");
            }
        }
    }
}
