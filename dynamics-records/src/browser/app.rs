//! The record browser state machine
//!
//! `Idle -> Loading -> {Loaded, LoadError}`; `Loaded -> Editing ->
//! Submitting -> {Loading, Editing}`; `Loaded -> Deleting -> {Loading,
//! DeleteError}` behind an explicit confirmation. Every successful mutation
//! re-runs the full load path.

use std::sync::Arc;

use serde_json::Value;

use super::state::{BrowserPhase, BrowserView, Intent};
use crate::api::{DataAccess, MutationResponse, Row};
use crate::config::BrowserConfig;
use crate::editing::{EditMode, EditSession};
use crate::error::BrowserError;
use crate::metadata::{FieldSchema, FormPurpose, SchemaCache, SelectOption};
use crate::search::{SearchController, SearchEvent, SearchPhase, SearchTransition};
use crate::table::{TableColumn, TableViewState, build_columns};

pub struct RecordBrowser {
    data_access: Arc<dyn DataAccess>,
    config: BrowserConfig,
    object_type: String,
    phase: BrowserPhase,

    // Table
    rows: Vec<Row>,
    columns: Vec<TableColumn>,
    table: TableViewState,
    search_term: String,

    // Form
    session: Option<EditSession>,
    search: SearchController,
    schemas: SchemaCache,

    // Delete confirmation
    pending_delete: Option<String>,

    // Messages
    error: Option<BrowserError>,
    notice: Option<String>,
    configuration_warning: Option<BrowserError>,
}

impl RecordBrowser {
    pub fn new(
        data_access: Arc<dyn DataAccess>,
        object_type: impl Into<String>,
        config: BrowserConfig,
    ) -> Self {
        let search = SearchController::new(Arc::clone(&data_access), config.search.clone());
        Self {
            data_access,
            object_type: object_type.into(),
            phase: BrowserPhase::Idle,
            rows: Vec::new(),
            columns: Vec::new(),
            table: TableViewState::new(config.default_page_size),
            search_term: String::new(),
            session: None,
            search,
            schemas: SchemaCache::new(),
            pending_delete: None,
            error: None,
            notice: None,
            configuration_warning: None,
            config,
        }
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    pub fn phase(&self) -> &BrowserPhase {
        &self.phase
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn table(&self) -> &TableViewState {
        &self.table
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn error(&self) -> Option<&BrowserError> {
        self.error.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn configuration_warning(&self) -> Option<&BrowserError> {
        self.configuration_warning.as_ref()
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Snapshot of everything the rendering layer needs
    pub fn view(&self) -> BrowserView<'_> {
        BrowserView {
            object_type: &self.object_type,
            phase: &self.phase,
            is_loading: self.phase == BrowserPhase::Loading,
            columns: &self.columns,
            page: self.table.project(&self.rows),
            sort_field: self.table.sort_field(),
            sort_direction: self.table.sort_direction(),
            page_size_options: &self.config.page_size_options,
            search_term: &self.search_term,
            error: self.error.as_ref(),
            notice: self.notice.as_deref(),
            configuration_warning: self.configuration_warning.as_ref(),
            pending_delete: self.pending_delete.as_deref(),
            edit_mode: self.session.as_ref().map(EditSession::mode),
            fields: self
                .session
                .as_ref()
                .map(|session| session.fields_with_values())
                .unwrap_or_default(),
        }
    }

    /// Apply one user intent
    pub async fn dispatch(&mut self, intent: Intent) -> Result<(), BrowserError> {
        log::debug!("{}: {:?} while {}", self.object_type, intent, self.phase);
        match intent {
            Intent::Search(term) => self.search(&term).await,
            Intent::Sort(field) => {
                self.sort(&field);
                Ok(())
            }
            Intent::ChangePage(page) => {
                self.change_page(page);
                Ok(())
            }
            Intent::ChangePageSize(page_size) => self.change_page_size(page_size),
            Intent::StartEdit(record_id) => self.start_edit(&record_id).await,
            Intent::StartCreate => self.start_create().await,
            Intent::ChangeField { field, value } => self.change_field(&field, value),
            Intent::LookupInput { field, term } => self.lookup_input(&field, &term),
            Intent::LookupBlur(field) => self.lookup_blur(&field),
            Intent::SelectLookupOption { field, option } => self.select_lookup_option(&field, &option),
            Intent::ClearLookup(field) => self.clear_lookup(&field),
            Intent::Submit => self.submit().await,
            Intent::Cancel => self.cancel(),
            Intent::Delete(record_id) => self.request_delete(&record_id),
            Intent::ConfirmDelete => self.confirm_delete().await,
            Intent::CancelDelete => {
                self.cancel_delete();
                Ok(())
            }
        }
    }

    /// Switch to another object type, dropping everything loaded for the
    /// current one
    pub fn switch_object_type(&mut self, object_type: impl Into<String>) -> Result<(), BrowserError> {
        if self.phase.is_busy() {
            return self.track(Err(self.invalid_state("switch object type")));
        }

        self.object_type = object_type.into();
        self.schemas.retain_object(&self.object_type);
        self.session = None;
        self.pending_delete = None;
        self.rows.clear();
        self.columns.clear();
        self.search_term.clear();
        self.table = TableViewState::new(self.config.default_page_size);
        self.error = None;
        self.notice = None;
        self.configuration_warning = None;
        self.set_phase(BrowserPhase::Idle);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Table
    // ------------------------------------------------------------------

    /// Load the first `list_limit` records matching the current search term
    pub async fn load(&mut self) -> Result<(), BrowserError> {
        if self.phase.is_busy() || self.session.is_some() {
            return self.track(Err(self.invalid_state("load records")));
        }
        self.reload().await
    }

    pub async fn search(&mut self, search_term: &str) -> Result<(), BrowserError> {
        if self.phase.is_busy() || self.session.is_some() {
            return self.track(Err(self.invalid_state("search")));
        }
        self.search_term = search_term.trim().to_string();
        self.reload().await
    }

    /// Sort by a column; ignored for unknown or non-sortable columns
    pub fn sort(&mut self, field_name: &str) -> bool {
        let sortable = self
            .columns
            .iter()
            .any(|column| column.field_name == field_name && column.sortable);
        if !sortable {
            log::debug!("Ignoring sort on '{}'", field_name);
            return false;
        }

        self.table.sort_by(field_name);
        log::debug!(
            "Sorting {} by {} {}",
            self.object_type,
            field_name,
            self.table.sort_direction()
        );
        true
    }

    pub fn change_page(&mut self, page_index: usize) {
        self.table.set_page(page_index, self.rows.len());
    }

    pub fn change_page_size(&mut self, page_size: usize) -> Result<(), BrowserError> {
        if !self.table.set_page_size(page_size, self.rows.len()) {
            return self.track(Err(BrowserError::InvalidPageSize(page_size)));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Form
    // ------------------------------------------------------------------

    pub async fn start_edit(&mut self, record_id: &str) -> Result<(), BrowserError> {
        if !self.phase.is_browsing() {
            return self.track(Err(self.invalid_state("open a record")));
        }
        self.notice = None;
        self.pending_delete = None;

        let editable = match self
            .data_access
            .get_record_for_edit(&self.object_type, record_id)
            .await
        {
            Ok(editable) => editable,
            Err(error) => {
                let error = BrowserError::transport("load record", format!("{:#}", error));
                log::warn!("{}", error);
                return self.track(Err(error));
            }
        };

        let schema = self
            .schemas
            .get_or_resolve(&self.object_type, FormPurpose::Edit, &editable.edit_fields);
        self.check_configured(&schema);

        let session = EditSession::edit(
            schema,
            editable.record,
            &self.config.id_field,
            &editable.lookup_labels,
        );
        match session {
            Ok(session) => {
                self.open_session(session);
                Ok(())
            }
            Err(error) => self.track(Err(error)),
        }
    }

    pub async fn start_create(&mut self) -> Result<(), BrowserError> {
        if !self.phase.is_browsing() {
            return self.track(Err(self.invalid_state("create a record")));
        }
        self.notice = None;
        self.pending_delete = None;

        let fields = match self.data_access.get_create_fields(&self.object_type).await {
            Ok(fields) => fields,
            Err(error) => {
                let error = BrowserError::transport("load create form", format!("{:#}", error));
                log::warn!("{}", error);
                return self.track(Err(error));
            }
        };

        let schema = self
            .schemas
            .get_or_resolve(&self.object_type, FormPurpose::Create, &fields);
        self.check_configured(&schema);

        let session = EditSession::create(schema, &self.config.id_field);
        self.open_session(session);
        Ok(())
    }

    /// Set a non-lookup field. Lookup fields answer `LookupRequiresSelection`.
    pub fn change_field(&mut self, field_name: &str, value: Value) -> Result<(), BrowserError> {
        let Some(session) = self.session.as_mut() else {
            return self.track(Err(self.invalid_state("change a field")));
        };
        let result = session.set_value(field_name, value);
        self.track(result)
    }

    /// Keystroke in a lookup field. Clears the field's value until an
    /// option is selected.
    ///
    /// # Panics
    ///
    /// Panics outside a tokio runtime (see [`SearchController::on_input`]).
    pub fn lookup_input(&mut self, field_name: &str, term: &str) -> Result<(), BrowserError> {
        let Some(session) = self.session.as_mut() else {
            return self.track(Err(self.invalid_state("search a lookup")));
        };
        let Some((_, state)) = session.lookup_parts_mut(field_name) else {
            return self.track(Err(unknown_field(field_name)));
        };
        self.search.on_input(field_name, state, term);
        session.clear_lookup_value(field_name);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics outside a tokio runtime (see [`SearchController::on_blur`]).
    pub fn lookup_blur(&mut self, field_name: &str) -> Result<(), BrowserError> {
        let Some(session) = self.session.as_mut() else {
            return self.track(Err(self.invalid_state("leave a lookup")));
        };
        let Some((_, state)) = session.lookup_parts_mut(field_name) else {
            return self.track(Err(unknown_field(field_name)));
        };
        self.search.on_blur(field_name, state);
        Ok(())
    }

    pub fn select_lookup_option(
        &mut self,
        field_name: &str,
        option: &SelectOption,
    ) -> Result<(), BrowserError> {
        let Some(session) = self.session.as_mut() else {
            return self.track(Err(self.invalid_state("select a lookup option")));
        };
        let token = self.search.issue_token();
        let result = session.select_lookup_option(field_name, option, token);
        self.track(result)
    }

    pub fn clear_lookup(&mut self, field_name: &str) -> Result<(), BrowserError> {
        let Some(session) = self.session.as_mut() else {
            return self.track(Err(self.invalid_state("clear a lookup")));
        };
        let token = self.search.issue_token();
        let result = session.clear_lookup(field_name, token);
        self.track(result)
    }

    /// Validate, compute the change-set and send it.
    ///
    /// Validation and empty change-sets fail before any collaborator call.
    /// On success the form closes and the table reloads; on a transport
    /// failure the form stays open with its values intact.
    pub async fn submit(&mut self) -> Result<(), BrowserError> {
        if self.phase != BrowserPhase::Editing {
            return self.track(Err(self.invalid_state("submit")));
        }
        let Some(session) = self.session.as_ref() else {
            return self.track(Err(self.invalid_state("submit")));
        };

        if let Err(error) = session.validate() {
            log::debug!("Submission blocked: {}", error);
            return self.track(Err(error.into()));
        }
        let payload = match session.changeset() {
            Ok(payload) => payload,
            Err(error) => {
                log::debug!("Submission blocked: {}", error);
                return self.track(Err(error));
            }
        };
        let mode = session.mode();
        let record_id = session.record_id().map(str::to_string);

        self.set_phase(BrowserPhase::Submitting);
        let outcome = match (mode, record_id.as_deref()) {
            (EditMode::Edit, Some(record_id)) => {
                log::info!(
                    "Updating {} {} ({} fields)",
                    self.object_type,
                    record_id,
                    payload.len()
                );
                let result = self
                    .data_access
                    .update_record(&self.object_type, record_id, &payload)
                    .await;
                MutationResponse::into_outcome(result, "update record")
            }
            _ => {
                log::info!("Creating {} ({} fields)", self.object_type, payload.len());
                let result = self.data_access.create_record(&self.object_type, &payload).await;
                MutationResponse::into_outcome(result, "create record")
            }
        };

        match outcome {
            Ok(()) => {
                self.session = None;
                self.error = None;
                self.notice = Some(match mode {
                    EditMode::Edit => "Record saved".to_string(),
                    EditMode::Create => "Record created".to_string(),
                });
                self.reload().await
            }
            Err(error) => {
                log::warn!("{}", error);
                self.set_phase(BrowserPhase::Editing);
                self.track(Err(error))
            }
        }
    }

    /// Close the form without saving
    pub fn cancel(&mut self) -> Result<(), BrowserError> {
        if self.phase != BrowserPhase::Editing || self.session.is_none() {
            return self.track(Err(self.invalid_state("cancel")));
        }
        self.session = None;
        self.error = None;
        self.set_phase(BrowserPhase::Loaded);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Ask for confirmation before deleting `record_id`
    pub fn request_delete(&mut self, record_id: &str) -> Result<(), BrowserError> {
        if !self.phase.is_browsing() {
            return self.track(Err(self.invalid_state("delete")));
        }
        log::debug!("Awaiting confirmation to delete {} {}", self.object_type, record_id);
        self.notice = None;
        self.pending_delete = Some(record_id.to_string());
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        if matches!(self.phase, BrowserPhase::DeleteError(_)) {
            self.error = None;
            self.set_phase(BrowserPhase::Loaded);
        }
    }

    pub async fn confirm_delete(&mut self) -> Result<(), BrowserError> {
        if !self.phase.is_browsing() {
            return self.track(Err(self.invalid_state("confirm a delete")));
        }
        let Some(record_id) = self.pending_delete.take() else {
            return self.track(Err(self.invalid_state("confirm a delete")));
        };

        self.set_phase(BrowserPhase::Deleting);
        log::info!("Deleting {} {}", self.object_type, record_id);
        let result = self
            .data_access
            .delete_record(&self.object_type, &record_id)
            .await;

        match MutationResponse::into_outcome(result, "delete record") {
            Ok(()) => {
                self.error = None;
                self.notice = Some("Record deleted".to_string());
                self.reload().await
            }
            Err(error) => {
                log::warn!("{}", error);
                self.set_phase(BrowserPhase::DeleteError(error.to_string()));
                self.track(Err(error))
            }
        }
    }

    // ------------------------------------------------------------------
    // Lookup search events
    // ------------------------------------------------------------------

    /// Wait for the next lookup timer or query completion
    pub async fn next_search_event(&mut self) -> Option<SearchEvent> {
        self.search.next_event().await
    }

    /// Apply a lookup event to the open form. Events for a closed form or a
    /// field without lookup state are ignored.
    pub fn handle_search_event(&mut self, event: SearchEvent) -> SearchTransition {
        let Some(session) = self.session.as_mut() else {
            return SearchTransition::Ignored;
        };
        if session.lookup_state(event.field()).is_none() {
            return SearchTransition::Ignored;
        }
        let field_name = event.field().to_string();
        let Some((descriptor, state)) = session.lookup_parts_mut(&field_name) else {
            return SearchTransition::Ignored;
        };
        self.search.handle(descriptor, state, event)
    }

    /// Handle every event already delivered, without waiting
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.search.try_next_event() {
            self.handle_search_event(event);
            handled += 1;
        }
        handled
    }

    /// Drive events until the lookup field stops typing or searching
    pub async fn settle_lookup(&mut self, field_name: &str) -> Result<SearchPhase, BrowserError> {
        loop {
            let phase = match self
                .session
                .as_ref()
                .and_then(|session| session.lookup_state(field_name))
            {
                Some(state) => state.phase,
                None => return self.track(Err(unknown_field(field_name))),
            };
            if !matches!(phase, SearchPhase::Typing | SearchPhase::Searching) {
                return Ok(phase);
            }

            match self.search.next_event().await {
                Some(event) => {
                    self.handle_search_event(event);
                }
                None => return Ok(phase),
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Full load path: fresh rows, fresh columns, default sort and page
    async fn reload(&mut self) -> Result<(), BrowserError> {
        self.set_phase(BrowserPhase::Loading);

        let search_term = Some(self.search_term.as_str()).filter(|term| !term.is_empty());
        let result = self
            .data_access
            .list_records(&self.object_type, search_term, self.config.list_limit)
            .await;

        let list = match result {
            Ok(list) if list.success => list,
            Ok(list) => {
                let error =
                    BrowserError::transport("load records", list.error_message.unwrap_or_default());
                return self.load_failed(error);
            }
            Err(error) => {
                let error = BrowserError::transport("load records", format!("{:#}", error));
                return self.load_failed(error);
            }
        };

        let schema = FieldSchema::resolve(&self.object_type, FormPurpose::Table, &list.columns);
        self.configuration_warning = None;
        self.check_configured(&schema);

        self.columns = build_columns(&schema.descriptors);
        self.rows = list.records;
        self.table = TableViewState::new(self.config.default_page_size);
        self.error = None;
        log::info!("Loaded {} {} records", self.rows.len(), self.object_type);
        self.set_phase(BrowserPhase::Loaded);
        Ok(())
    }

    /// Prior rows stay so the user can retry
    fn load_failed(&mut self, error: BrowserError) -> Result<(), BrowserError> {
        log::warn!("{}", error);
        self.set_phase(BrowserPhase::LoadError(error.to_string()));
        self.track(Err(error))
    }

    fn open_session(&mut self, session: EditSession) {
        log::debug!(
            "Opened {:?} form for {} with {} fields",
            session.mode(),
            self.object_type,
            session.descriptors().len()
        );
        self.error = None;
        self.session = Some(session);
        self.set_phase(BrowserPhase::Editing);
    }

    /// Zero configured fields degrade to an empty table or form
    fn check_configured(&mut self, schema: &FieldSchema) {
        if schema.is_empty() {
            let warning = BrowserError::Configuration {
                object_type: self.object_type.clone(),
            };
            log::warn!("{} ({} view)", warning, schema.purpose);
            self.configuration_warning = Some(warning);
        }
    }

    fn set_phase(&mut self, phase: BrowserPhase) {
        log::debug!("{}: {} -> {}", self.object_type, self.phase, phase);
        self.phase = phase;
    }

    fn invalid_state(&self, action: &'static str) -> BrowserError {
        BrowserError::InvalidState {
            action,
            phase: self.phase.to_string(),
        }
    }

    /// Remember a failure as the current user-visible error
    fn track<T>(&mut self, result: Result<T, BrowserError>) -> Result<T, BrowserError> {
        if let Err(error) = &result {
            self.error = Some(error.clone());
        }
        result
    }
}

fn unknown_field(field_name: &str) -> BrowserError {
    BrowserError::UnknownField {
        field_name: field_name.to_string(),
    }
}
