//! In-memory data store backed by a JSON fixture
//!
//! Serves the CLI (fixture file on disk) and tests (scripted store with call
//! recording, injectable failures and per-term search latency).

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DataAccess;
use super::models::{EditableRecord, MutationResponse, Payload, RecordList, Row};
use crate::metadata::{FormPurpose, RawFieldConfig, SelectOption, resolve_descriptors, resolve_lookup_target};

fn default_id_field() -> String {
    "Id".to_string()
}

fn default_name_field() -> String {
    "Name".to_string()
}

/// Configuration and records of one object type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectFixture {
    pub columns: Vec<RawFieldConfig>,
    pub edit_fields: Vec<RawFieldConfig>,
    pub create_fields: Vec<RawFieldConfig>,
    pub records: Vec<Row>,
}

impl ObjectFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(mut self, columns: Vec<RawFieldConfig>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_edit_fields(mut self, fields: Vec<RawFieldConfig>) -> Self {
        self.edit_fields = fields;
        self
    }

    pub fn with_create_fields(mut self, fields: Vec<RawFieldConfig>) -> Self {
        self.create_fields = fields;
        self
    }

    pub fn with_records(mut self, records: Vec<Row>) -> Self {
        self.records = records;
        self
    }
}

/// Whole store contents, as read from / written to a fixture file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFixture {
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Field used as the display label of lookup candidates
    #[serde(default = "default_name_field")]
    pub name_field: String,
    #[serde(default)]
    pub objects: BTreeMap<String, ObjectFixture>,
}

impl Default for StoreFixture {
    fn default() -> Self {
        Self {
            id_field: default_id_field(),
            name_field: default_name_field(),
            objects: BTreeMap::new(),
        }
    }
}

impl StoreFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, object_type: impl Into<String>, object: ObjectFixture) -> Self {
        self.objects.insert(object_type.into(), object);
        self
    }
}

/// Kinds of collaborator calls, used for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    ListRecords,
    GetRecordForEdit,
    GetCreateFields,
    SearchLookupCandidates,
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
}

/// A recorded collaborator call
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    ListRecords {
        object_type: String,
        search_term: Option<String>,
        limit: usize,
    },
    GetRecordForEdit {
        object_type: String,
        record_id: String,
    },
    GetCreateFields {
        object_type: String,
    },
    SearchLookupCandidates {
        target_type: String,
        search_term: String,
        max_results: usize,
    },
    CreateRecord {
        object_type: String,
        payload: Payload,
    },
    UpdateRecord {
        object_type: String,
        record_id: String,
        payload: Payload,
    },
    DeleteRecord {
        object_type: String,
        record_id: String,
    },
}

impl StoreCall {
    pub fn operation(&self) -> StoreOperation {
        match self {
            StoreCall::ListRecords { .. } => StoreOperation::ListRecords,
            StoreCall::GetRecordForEdit { .. } => StoreOperation::GetRecordForEdit,
            StoreCall::GetCreateFields { .. } => StoreOperation::GetCreateFields,
            StoreCall::SearchLookupCandidates { .. } => StoreOperation::SearchLookupCandidates,
            StoreCall::CreateRecord { .. } => StoreOperation::CreateRecord,
            StoreCall::UpdateRecord { .. } => StoreOperation::UpdateRecord,
            StoreCall::DeleteRecord { .. } => StoreOperation::DeleteRecord,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self.operation(),
            StoreOperation::CreateRecord | StoreOperation::UpdateRecord | StoreOperation::DeleteRecord
        )
    }
}

#[derive(Debug, Default)]
struct StoreState {
    fixture: StoreFixture,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOperation, String>,
    search_latency: HashMap<String, Duration>,
}

/// [`DataAccess`] implementation holding everything in memory.
///
/// Injected failures surface as `success: false` for list and mutation calls
/// and as `Err` for the other calls, so both failure shapes get exercised.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new(fixture: StoreFixture) -> Self {
        Self {
            state: Mutex::new(StoreState {
                fixture,
                ..StoreState::default()
            }),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let fixture: StoreFixture = serde_json::from_str(json).context("Invalid store fixture")?;
        Ok(Self::new(fixture))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read store fixture: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to load store fixture: {}", path.display()))
    }

    /// Write the current contents back as a fixture file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.fixture())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write store fixture: {}", path.display()))
    }

    pub fn fixture(&self) -> StoreFixture {
        self.lock().fixture.clone()
    }

    pub fn records(&self, object_type: &str) -> Vec<Row> {
        self.lock()
            .fixture
            .objects
            .get(object_type)
            .map(|object| object.records.clone())
            .unwrap_or_default()
    }

    /// Display name of a record, as lookup options label it
    pub fn record_label(&self, object_type: &str, record_id: &str) -> Option<String> {
        name_of(&self.lock().fixture, object_type, record_id)
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make every call of `operation` fail with `message` until cleared
    pub fn fail(&self, operation: StoreOperation, message: impl Into<String>) {
        self.lock().failures.insert(operation, message.into());
    }

    pub fn clear_failure(&self, operation: StoreOperation) {
        self.lock().failures.remove(&operation);
    }

    /// Delay lookup searches for an exact search term
    pub fn set_search_latency(&self, search_term: impl Into<String>, latency: Duration) {
        self.lock().search_latency.insert(search_term.into(), latency);
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and return the injected failure for it, if any
    fn begin(&self, call: StoreCall) -> (MutexGuard<'_, StoreState>, Option<String>) {
        let mut state = self.lock();
        let failure = state.failures.get(&call.operation()).cloned();
        state.calls.push(call);
        (state, failure)
    }
}

/// Name-field value of the record `record_id` of `object_type`
fn name_of(fixture: &StoreFixture, object_type: &str, record_id: &str) -> Option<String> {
    fixture
        .objects
        .get(object_type)?
        .records
        .iter()
        .find(|row| string_value(row, &fixture.id_field).as_deref() == Some(record_id))
        .and_then(|row| string_value(row, &fixture.name_field))
}

fn string_value(row: &Row, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn row_matches(row: &Row, needle: &str) -> bool {
    row.values().any(|value| match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        _ => false,
    })
}

#[async_trait]
impl DataAccess for MemoryStore {
    async fn list_records(
        &self,
        object_type: &str,
        search_term: Option<&str>,
        limit: usize,
    ) -> Result<RecordList> {
        let (state, failure) = self.begin(StoreCall::ListRecords {
            object_type: object_type.to_string(),
            search_term: search_term.map(str::to_string),
            limit,
        });
        if let Some(message) = failure {
            return Ok(RecordList::failed(message));
        }

        let Some(object) = state.fixture.objects.get(object_type) else {
            return Ok(RecordList::failed(format!("Unknown object type '{}'", object_type)));
        };

        let needle = search_term
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty());

        let records = object
            .records
            .iter()
            .filter(|row| needle.as_deref().is_none_or(|needle| row_matches(row, needle)))
            .take(limit)
            .cloned()
            .collect();

        Ok(RecordList::ok(records, object.columns.clone()))
    }

    async fn get_record_for_edit(&self, object_type: &str, record_id: &str) -> Result<EditableRecord> {
        let (state, failure) = self.begin(StoreCall::GetRecordForEdit {
            object_type: object_type.to_string(),
            record_id: record_id.to_string(),
        });
        if let Some(message) = failure {
            anyhow::bail!(message);
        }

        let fixture = &state.fixture;
        let object = fixture
            .objects
            .get(object_type)
            .with_context(|| format!("Unknown object type '{}'", object_type))?;
        let record = object
            .records
            .iter()
            .find(|row| string_value(row, &fixture.id_field).as_deref() == Some(record_id))
            .cloned()
            .with_context(|| format!("Record '{}' not found", record_id))?;

        let mut lookup_labels = HashMap::new();
        for descriptor in resolve_descriptors(&object.edit_fields, FormPurpose::Edit) {
            if !descriptor.is_external_lookup {
                continue;
            }
            let (Some(value), Some(target)) = (
                string_value(&record, &descriptor.field_name),
                resolve_lookup_target(&descriptor),
            ) else {
                continue;
            };
            if let Some(label) = name_of(fixture, &target, &value) {
                lookup_labels.insert(descriptor.field_name.clone(), label);
            }
        }

        Ok(EditableRecord {
            record,
            edit_fields: object.edit_fields.clone(),
            lookup_labels,
        })
    }

    async fn get_create_fields(&self, object_type: &str) -> Result<Vec<RawFieldConfig>> {
        let (state, failure) = self.begin(StoreCall::GetCreateFields {
            object_type: object_type.to_string(),
        });
        if let Some(message) = failure {
            anyhow::bail!(message);
        }

        let object = state
            .fixture
            .objects
            .get(object_type)
            .with_context(|| format!("Unknown object type '{}'", object_type))?;
        Ok(object.create_fields.clone())
    }

    async fn search_lookup_candidates(
        &self,
        target_type: &str,
        search_term: &str,
        max_results: usize,
    ) -> Result<Vec<SelectOption>> {
        let (result, latency) = {
            let (state, failure) = self.begin(StoreCall::SearchLookupCandidates {
                target_type: target_type.to_string(),
                search_term: search_term.to_string(),
                max_results,
            });
            let latency = state.search_latency.get(search_term).copied();

            let result = match failure {
                Some(message) => Err(anyhow::anyhow!(message)),
                None => match state.fixture.objects.get(target_type) {
                    None => Err(anyhow::anyhow!("Unknown object type '{}'", target_type)),
                    Some(object) => {
                        let needle = search_term.trim().to_lowercase();
                        let fixture = &state.fixture;
                        Ok(object
                            .records
                            .iter()
                            .filter_map(|row| {
                                let id = string_value(row, &fixture.id_field)?;
                                let name = string_value(row, &fixture.name_field)?;
                                name.to_lowercase()
                                    .contains(&needle)
                                    .then(|| SelectOption::new(id, name))
                            })
                            .take(max_results)
                            .collect())
                    }
                },
            };
            (result, latency)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        result
    }

    async fn create_record(&self, object_type: &str, payload: &Payload) -> Result<MutationResponse> {
        let (mut state, failure) = self.begin(StoreCall::CreateRecord {
            object_type: object_type.to_string(),
            payload: payload.clone(),
        });
        if let Some(message) = failure {
            return Ok(MutationResponse::failed(message));
        }

        let id_field = state.fixture.id_field.clone();
        let Some(object) = state.fixture.objects.get_mut(object_type) else {
            return Ok(MutationResponse::failed(format!("Unknown object type '{}'", object_type)));
        };

        let mut record = payload.clone();
        record.insert(id_field, Value::String(uuid::Uuid::new_v4().to_string()));
        object.records.push(record);
        Ok(MutationResponse::ok())
    }

    async fn update_record(
        &self,
        object_type: &str,
        record_id: &str,
        payload: &Payload,
    ) -> Result<MutationResponse> {
        let (mut state, failure) = self.begin(StoreCall::UpdateRecord {
            object_type: object_type.to_string(),
            record_id: record_id.to_string(),
            payload: payload.clone(),
        });
        if let Some(message) = failure {
            return Ok(MutationResponse::failed(message));
        }

        let id_field = state.fixture.id_field.clone();
        let record = state
            .fixture
            .objects
            .get_mut(object_type)
            .and_then(|object| {
                object
                    .records
                    .iter_mut()
                    .find(|row| string_value(row, &id_field).as_deref() == Some(record_id))
            });

        match record {
            Some(record) => {
                for (field, value) in payload {
                    record.insert(field.clone(), value.clone());
                }
                Ok(MutationResponse::ok())
            }
            None => Ok(MutationResponse::failed(format!("Record '{}' not found", record_id))),
        }
    }

    async fn delete_record(&self, object_type: &str, record_id: &str) -> Result<MutationResponse> {
        let (mut state, failure) = self.begin(StoreCall::DeleteRecord {
            object_type: object_type.to_string(),
            record_id: record_id.to_string(),
        });
        if let Some(message) = failure {
            return Ok(MutationResponse::failed(message));
        }

        let id_field = state.fixture.id_field.clone();
        let Some(object) = state.fixture.objects.get_mut(object_type) else {
            return Ok(MutationResponse::failed(format!("Unknown object type '{}'", object_type)));
        };

        let before = object.records.len();
        object
            .records
            .retain(|row| string_value(row, &id_field).as_deref() != Some(record_id));

        if object.records.len() == before {
            Ok(MutationResponse::failed(format!("Record '{}' not found", record_id)))
        } else {
            Ok(MutationResponse::ok())
        }
    }
}
