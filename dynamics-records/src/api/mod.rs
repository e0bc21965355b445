//! Data access boundary
//!
//! The engine never talks to a transport directly. Everything remote goes
//! through the [`DataAccess`] collaborator, which may be backed by an HTTP
//! client, a local fixture ([`MemoryStore`]) or a test double.

pub mod memory;
pub mod models;

pub use memory::{MemoryStore, ObjectFixture, StoreCall, StoreFixture, StoreOperation};
pub use models::{EditableRecord, MutationResponse, Payload, RecordList, Row};

use anyhow::Result;
use async_trait::async_trait;

use crate::metadata::{RawFieldConfig, SelectOption};

/// Remote record store and configuration source.
///
/// Any `Err` is treated the same as a `success: false` response.
#[async_trait]
pub trait DataAccess: Send + Sync {
    /// Records of `object_type` plus the table column configuration
    async fn list_records(
        &self,
        object_type: &str,
        search_term: Option<&str>,
        limit: usize,
    ) -> Result<RecordList>;

    /// One record with its edit field configuration and lookup display labels
    async fn get_record_for_edit(&self, object_type: &str, record_id: &str) -> Result<EditableRecord>;

    /// Field configuration for the create form
    async fn get_create_fields(&self, object_type: &str) -> Result<Vec<RawFieldConfig>>;

    /// Candidate records of `target_type` matching `search_term`
    async fn search_lookup_candidates(
        &self,
        target_type: &str,
        search_term: &str,
        max_results: usize,
    ) -> Result<Vec<SelectOption>>;

    async fn create_record(&self, object_type: &str, payload: &Payload) -> Result<MutationResponse>;

    async fn update_record(
        &self,
        object_type: &str,
        record_id: &str,
        payload: &Payload,
    ) -> Result<MutationResponse>;

    async fn delete_record(&self, object_type: &str, record_id: &str) -> Result<MutationResponse>;
}
