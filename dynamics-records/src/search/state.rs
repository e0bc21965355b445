//! Per-field lookup search state

use tokio::task::JoinHandle;

use crate::metadata::SelectOption;

/// Search lifecycle of one lookup field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    /// Keystrokes arriving, debounce timer running
    Typing,
    /// Query in flight
    Searching,
    Resolved,
    /// Query failed; options were cleared
    Failed,
}

/// Opaque request token; a newer token supersedes every older one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(u64);

impl RequestToken {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cancelable one-shot timer task. Restarting or dropping it aborts the
/// previous task.
#[derive(Debug, Default)]
pub struct DebounceTimer {
    handle: Option<JoinHandle<()>>,
}

impl DebounceTimer {
    pub fn restart(&mut self, handle: JoinHandle<()>) {
        self.cancel();
        self.handle = Some(handle);
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// UI state of one lookup field
#[derive(Debug, Default)]
pub struct LookupFieldState {
    pub search_term: String,
    pub options: Vec<SelectOption>,
    /// Display label of the current selection
    pub selected_label: Option<String>,
    pub dropdown_open: bool,
    pub phase: SearchPhase,
    pub(crate) token: RequestToken,
    pub(crate) debounce: DebounceTimer,
    pub(crate) blur: DebounceTimer,
}

impl LookupFieldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a field whose current value already has a display label
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            selected_label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn pending_token(&self) -> RequestToken {
        self.token
    }

    pub fn is_debouncing(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Record a chosen option and close the dropdown
    pub(crate) fn apply_selection(&mut self, option: &SelectOption, token: RequestToken) {
        self.cancel_timers();
        self.token = token;
        self.selected_label = Some(option.label.clone());
        self.options.clear();
        self.search_term.clear();
        self.dropdown_open = false;
        self.phase = SearchPhase::Idle;
    }

    /// Forget the selection, search term and options
    pub(crate) fn reset(&mut self, token: RequestToken) {
        self.cancel_timers();
        self.token = token;
        self.selected_label = None;
        self.options.clear();
        self.search_term.clear();
        self.dropdown_open = false;
        self.phase = SearchPhase::Idle;
    }

    pub(crate) fn cancel_timers(&mut self) {
        self.debounce.cancel();
        self.blur.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_selection_clears_search_state() {
        let mut state = LookupFieldState::new();
        state.search_term = "ac".into();
        state.options = vec![SelectOption::new("001", "Acme")];
        state.dropdown_open = true;
        state.phase = SearchPhase::Resolved;

        state.apply_selection(&SelectOption::new("001", "Acme"), RequestToken::new(7));
        assert_eq!(state.selected_label.as_deref(), Some("Acme"));
        assert!(state.options.is_empty());
        assert!(state.search_term.is_empty());
        assert!(!state.dropdown_open);
        assert_eq!(state.pending_token(), RequestToken::new(7));
    }

    #[test]
    fn test_reset_clears_label() {
        let mut state = LookupFieldState::with_label("Ada");
        state.reset(RequestToken::new(2));
        assert_eq!(state.selected_label, None);
        assert_eq!(state.phase, SearchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_restart_aborts_previous() {
        let mut timer = DebounceTimer::default();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let first = tx.clone();
        timer.restart(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = first.send(1);
        }));
        let second = tx.clone();
        timer.restart(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = second.send(2);
        }));
        drop(tx);

        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_timer_cancels_task() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<u8>();
        {
            let mut timer = DebounceTimer::default();
            timer.restart(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let _ = tx.send(1);
            }));
            assert!(timer.is_pending());
        }
        assert_eq!(rx.recv().await, None);
    }
}
