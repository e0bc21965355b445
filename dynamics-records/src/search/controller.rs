//! Debounced, token-reconciled lookup search
//!
//! Timers and queries run as spawned tasks that report back through one
//! event channel. The owner pulls events with [`SearchController::next_event`]
//! and feeds them to [`SearchController::handle`] together with the field's
//! state, so all state mutation stays on the caller's task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::state::{LookupFieldState, RequestToken, SearchPhase};
use crate::api::DataAccess;
use crate::config::SearchConfig;
use crate::metadata::{FieldDescriptor, SelectOption, resolve_lookup_target};

/// Completion of a timer or query, addressed to one lookup field
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// Input quiesced for the debounce window
    DebounceElapsed { field: String, token: RequestToken },
    /// A lookup query finished
    Completed {
        field: String,
        token: RequestToken,
        outcome: Result<Vec<SelectOption>, String>,
    },
    /// Grace period after blur elapsed
    BlurElapsed { field: String, token: RequestToken },
}

impl SearchEvent {
    pub fn field(&self) -> &str {
        match self {
            SearchEvent::DebounceElapsed { field, .. }
            | SearchEvent::Completed { field, .. }
            | SearchEvent::BlurElapsed { field, .. } => field,
        }
    }
}

/// What handling an event did to the field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTransition {
    /// Event no longer applies (superseded timer, unknown field)
    Ignored,
    /// A query was issued
    Searching,
    Resolved,
    /// A stale query result was discarded
    Cancelled,
    Failed,
    DropdownClosed,
}

/// Drives lookup searches for every lookup field of a session
pub struct SearchController {
    data_access: Arc<dyn DataAccess>,
    config: SearchConfig,
    last_token: u64,
    events_tx: mpsc::UnboundedSender<SearchEvent>,
    events_rx: mpsc::UnboundedReceiver<SearchEvent>,
}

impl SearchController {
    pub fn new(data_access: Arc<dyn DataAccess>, config: SearchConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            data_access,
            config,
            last_token: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Issue a token newer than every token issued before
    pub fn issue_token(&mut self) -> RequestToken {
        self.last_token += 1;
        RequestToken::new(self.last_token)
    }

    /// Keystroke in a lookup field.
    ///
    /// Clears the selection label, opens the dropdown and restarts the
    /// debounce timer. The caller clears the working value.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, since the timer is a
    /// spawned task.
    pub fn on_input(&mut self, field_name: &str, state: &mut LookupFieldState, search_term: &str) {
        let token = self.issue_token();
        state.token = token;
        state.search_term = search_term.to_string();
        state.selected_label = None;
        state.dropdown_open = true;
        state.phase = SearchPhase::Typing;
        state.blur.cancel();

        let event = SearchEvent::DebounceElapsed {
            field: field_name.to_string(),
            token,
        };
        state
            .debounce
            .restart(self.schedule(self.config.debounce(), event));
    }

    /// Focus left the field; the dropdown closes after the grace period
    /// unless a selection or new keystroke happens first.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn on_blur(&mut self, field_name: &str, state: &mut LookupFieldState) {
        let event = SearchEvent::BlurElapsed {
            field: field_name.to_string(),
            token: state.token,
        };
        state.blur.restart(self.schedule(self.config.blur_grace(), event));
    }

    /// Apply a timer or query completion to the field it belongs to
    pub fn handle(
        &mut self,
        descriptor: &FieldDescriptor,
        state: &mut LookupFieldState,
        event: SearchEvent,
    ) -> SearchTransition {
        match event {
            SearchEvent::DebounceElapsed { field, token } => {
                if token != state.token {
                    return SearchTransition::Ignored;
                }

                let Some(target) = resolve_lookup_target(descriptor) else {
                    log::debug!("Lookup '{}' has no resolvable target, skipping search", field);
                    state.options.clear();
                    state.phase = SearchPhase::Resolved;
                    return SearchTransition::Resolved;
                };

                state.phase = SearchPhase::Searching;
                self.spawn_query(field, token, target, state.search_term.clone());
                SearchTransition::Searching
            }
            SearchEvent::Completed {
                field,
                token,
                outcome,
            } => {
                if token != state.token {
                    log::debug!(
                        "Discarding stale lookup result {} for '{}' (current {})",
                        token,
                        field,
                        state.token
                    );
                    return SearchTransition::Cancelled;
                }

                match outcome {
                    Ok(options) => {
                        log::debug!("Lookup '{}' resolved with {} options", field, options.len());
                        state.options = options;
                        state.phase = SearchPhase::Resolved;
                        SearchTransition::Resolved
                    }
                    Err(message) => {
                        log::warn!("Lookup search for '{}' failed: {}", field, message);
                        state.options.clear();
                        state.phase = SearchPhase::Failed;
                        SearchTransition::Failed
                    }
                }
            }
            SearchEvent::BlurElapsed { token, .. } => {
                if token != state.token {
                    return SearchTransition::Ignored;
                }
                state.dropdown_open = false;
                SearchTransition::DropdownClosed
            }
        }
    }

    /// Wait for the next timer or query completion
    pub async fn next_event(&mut self) -> Option<SearchEvent> {
        self.events_rx.recv().await
    }

    /// Next already-delivered event, without waiting
    pub fn try_next_event(&mut self) -> Option<SearchEvent> {
        self.events_rx.try_recv().ok()
    }

    fn schedule(&self, delay: Duration, event: SearchEvent) -> tokio::task::JoinHandle<()> {
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events_tx.send(event);
        })
    }

    fn spawn_query(&self, field: String, token: RequestToken, target: String, search_term: String) {
        log::debug!(
            "Searching {} for '{}' (field '{}', token {})",
            target,
            search_term,
            field,
            token
        );

        let data_access = Arc::clone(&self.data_access);
        let events_tx = self.events_tx.clone();
        let max_results = self.config.max_results;

        // In-flight queries are never aborted; a newer token makes the result stale
        tokio::spawn(async move {
            let outcome = data_access
                .search_lookup_candidates(&target, &search_term, max_results)
                .await
                .map_err(|error| format!("{:#}", error));
            let _ = events_tx.send(SearchEvent::Completed {
                field,
                token,
                outcome,
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MemoryStore, ObjectFixture, StoreCall, StoreFixture, StoreOperation};
    use crate::metadata::{FormPurpose, RawFieldConfig, resolve_descriptors};
    use serde_json::json;

    fn store() -> Arc<MemoryStore> {
        let accounts = ["Acme", "Abbott", "Abacus", "Beta"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                json!({"Id": format!("001{}", i), "Name": name})
                    .as_object()
                    .cloned()
                    .unwrap()
            })
            .collect();
        Arc::new(MemoryStore::new(
            StoreFixture::new().with_object("Account", ObjectFixture::new().with_records(accounts)),
        ))
    }

    fn lookup(field_name: &str) -> FieldDescriptor {
        resolve_descriptors(&[RawFieldConfig::new(field_name, "lookup")], FormPurpose::Edit).remove(0)
    }

    fn searched_terms(store: &MemoryStore) -> Vec<String> {
        store
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::SearchLookupCandidates { search_term, .. } => Some(search_term),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_within_window_issue_one_query() {
        let store = store();
        let mut controller = SearchController::new(store.clone(), SearchConfig::default());
        let descriptor = lookup("AccountId");
        let mut state = LookupFieldState::new();

        controller.on_input("AccountId", &mut state, "a");
        controller.on_input("AccountId", &mut state, "ab");
        controller.on_input("AccountId", &mut state, "abc");
        assert_eq!(state.phase, SearchPhase::Typing);
        assert!(state.dropdown_open);

        let event = controller.next_event().await.unwrap();
        assert_eq!(
            event,
            SearchEvent::DebounceElapsed {
                field: "AccountId".into(),
                token: state.pending_token(),
            }
        );
        assert_eq!(controller.handle(&descriptor, &mut state, event), SearchTransition::Searching);
        assert_eq!(state.phase, SearchPhase::Searching);

        let event = controller.next_event().await.unwrap();
        assert_eq!(controller.handle(&descriptor, &mut state, event), SearchTransition::Resolved);
        assert!(state.options.is_empty());
        assert_eq!(searched_terms(&store), vec!["abc".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let store = store();
        store.set_search_latency("a", Duration::from_secs(5));
        let mut controller = SearchController::new(store.clone(), SearchConfig::default());
        let descriptor = lookup("AccountId");
        let mut state = LookupFieldState::new();

        // First query for "a" starts and stays in flight
        controller.on_input("AccountId", &mut state, "a");
        let event = controller.next_event().await.unwrap();
        assert_eq!(controller.handle(&descriptor, &mut state, event), SearchTransition::Searching);

        // Newer query for "ab" starts and completes first
        controller.on_input("AccountId", &mut state, "ab");
        let event = controller.next_event().await.unwrap();
        assert_eq!(controller.handle(&descriptor, &mut state, event), SearchTransition::Searching);
        let event = controller.next_event().await.unwrap();
        assert_eq!(controller.handle(&descriptor, &mut state, event), SearchTransition::Resolved);
        assert_eq!(
            state.options,
            vec![SelectOption::new("0011", "Abbott"), SelectOption::new("0012", "Abacus")]
        );

        // The late "a" result must not overwrite the current options
        let event = controller.next_event().await.unwrap();
        assert_eq!(controller.handle(&descriptor, &mut state, event), SearchTransition::Cancelled);
        assert_eq!(state.options.len(), 2);
        assert_eq!(state.phase, SearchPhase::Resolved);
        assert_eq!(searched_terms(&store), vec!["a".to_string(), "ab".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolvable_target_resolves_empty() {
        let store = store();
        let mut controller = SearchController::new(store.clone(), SearchConfig::default());
        let descriptor = lookup("Reference");
        let mut state = LookupFieldState::new();

        controller.on_input("Reference", &mut state, "acme");
        let event = controller.next_event().await.unwrap();
        assert_eq!(controller.handle(&descriptor, &mut state, event), SearchTransition::Resolved);
        assert!(searched_terms(&store).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_search_degrades_to_empty_options() {
        let store = store();
        store.fail(StoreOperation::SearchLookupCandidates, "Search unavailable");
        let mut controller = SearchController::new(store.clone(), SearchConfig::default());
        let descriptor = lookup("AccountId");
        let mut state = LookupFieldState::new();
        state.options = vec![SelectOption::new("x", "old")];

        controller.on_input("AccountId", &mut state, "ac");
        let event = controller.next_event().await.unwrap();
        controller.handle(&descriptor, &mut state, event);
        let event = controller.next_event().await.unwrap();
        assert_eq!(controller.handle(&descriptor, &mut state, event), SearchTransition::Failed);
        assert!(state.options.is_empty());
        assert_eq!(state.phase, SearchPhase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_closes_after_grace_unless_superseded() {
        let store = store();
        let mut controller = SearchController::new(store, SearchConfig::default());
        let descriptor = lookup("AccountId");
        let mut state = LookupFieldState::new();
        state.dropdown_open = true;

        controller.on_blur("AccountId", &mut state);
        assert!(state.dropdown_open);
        let event = controller.next_event().await.unwrap();
        assert_eq!(
            controller.handle(&descriptor, &mut state, event),
            SearchTransition::DropdownClosed
        );
        assert!(!state.dropdown_open);

        // A blur whose token was superseded by a selection does nothing
        state.dropdown_open = true;
        let stale = SearchEvent::BlurElapsed {
            field: "AccountId".into(),
            token: state.pending_token(),
        };
        let token = controller.issue_token();
        state.apply_selection(&SelectOption::new("0010", "Acme"), token);
        assert_eq!(controller.handle(&descriptor, &mut state, stale), SearchTransition::Ignored);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fields_are_independent() {
        let store = store();
        let mut controller = SearchController::new(store.clone(), SearchConfig::default());
        let account = lookup("AccountId");
        let parent = lookup("ParentAccountId");
        let mut account_state = LookupFieldState::new();
        let mut parent_state = LookupFieldState::new();

        controller.on_input("AccountId", &mut account_state, "ac");
        controller.on_input("ParentAccountId", &mut parent_state, "be");

        let settled = |phase: SearchPhase| matches!(phase, SearchPhase::Resolved | SearchPhase::Failed);
        while !settled(account_state.phase) || !settled(parent_state.phase) {
            let event = controller.next_event().await.unwrap();
            match event.field() {
                "AccountId" => controller.handle(&account, &mut account_state, event),
                _ => controller.handle(&parent, &mut parent_state, event),
            };
        }

        // "ParentAccount" is not a known object type; only that field fails
        assert_eq!(
            account_state.options,
            vec![SelectOption::new("0010", "Acme"), SelectOption::new("0012", "Abacus")]
        );
        assert_eq!(account_state.phase, SearchPhase::Resolved);
        assert_eq!(parent_state.phase, SearchPhase::Failed);
    }
}
