//! Search-as-you-type for lookup fields
//!
//! Each lookup field owns a [`LookupFieldState`]; the [`SearchController`]
//! debounces keystrokes, issues queries against the data access collaborator
//! and reconciles completions by request token, so only the latest search
//! for a field is ever honored.

pub mod controller;
pub mod state;

pub use controller::{SearchController, SearchEvent, SearchTransition};
pub use state::{DebounceTimer, LookupFieldState, RequestToken, SearchPhase};
