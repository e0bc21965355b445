//! Record command handlers
//!
//! Every command goes through [`RecordBrowser`] intents so the CLI gets the
//! same validation and change-set rules as any other front end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::*;
use dialoguer::Confirm;
use serde_json::{Number, Value};

use super::{CreateArgs, DeleteArgs, ListArgs, LookupArgs, OutputFormat, ShowArgs, UpdateArgs};
use dynamics_records::editing::{display_value, parse_calendar_date};
use dynamics_records::metadata::resolve_lookup_target;
use dynamics_records::{
    BrowserConfig, BrowserError, BrowserView, ColumnKind, FieldDescriptor, FieldType, Intent, MemoryStore,
    RecordBrowser, SearchConfig, SearchPhase, SelectOption,
};

/// Settings shared by every record command
pub struct CommandContext {
    pub store_path: PathBuf,
    pub config: BrowserConfig,
}

impl CommandContext {
    pub fn new(store_path: PathBuf, config: BrowserConfig) -> Self {
        Self { store_path, config }
    }

    /// Open the store and load the first page of `object_type`
    async fn open(&self, object_type: &str) -> Result<(Arc<MemoryStore>, RecordBrowser)> {
        self.open_with(object_type, self.config.clone()).await
    }

    async fn open_with(
        &self,
        object_type: &str,
        config: BrowserConfig,
    ) -> Result<(Arc<MemoryStore>, RecordBrowser)> {
        let store = Arc::new(MemoryStore::from_path(&self.store_path)?);
        let mut browser = RecordBrowser::new(store.clone(), object_type, config);
        browser
            .load()
            .await
            .with_context(|| format!("Failed to load {} records", object_type))?;

        if let Some(warning) = browser.configuration_warning() {
            eprintln!("{} {}", "warning:".yellow().bold(), warning);
        }
        Ok((store, browser))
    }

    fn save(&self, store: &MemoryStore) -> Result<()> {
        store.save(&self.store_path)
    }
}

pub async fn handle_list(context: &CommandContext, args: ListArgs) -> Result<()> {
    let (_store, mut browser) = context.open(&args.object_type).await?;

    if let Some(term) = &args.search {
        browser
            .dispatch(Intent::Search(term.clone()))
            .await
            .context("Search failed")?;
    }
    if let Some(page_size) = args.page_size {
        browser.dispatch(Intent::ChangePageSize(page_size)).await?;
    }
    if let Some(field) = &args.sort {
        if !browser.sort(field) {
            anyhow::bail!("Column '{}' does not exist or is not sortable", field);
        }
        if args.desc {
            browser.sort(field);
        }
    }
    browser.dispatch(Intent::ChangePage(args.page)).await?;

    let view = browser.view();
    match args.format {
        OutputFormat::Json => {
            let rows: Vec<&dynamics_records::Row> = view.page.rows.iter().map(|r| r.row).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("Failed to format JSON output")?
            );
        }
        OutputFormat::Table => print_table(&view),
    }
    Ok(())
}

pub async fn handle_show(context: &CommandContext, args: ShowArgs) -> Result<()> {
    let (_store, mut browser) = context.open(&args.object_type).await?;
    browser
        .dispatch(Intent::StartEdit(args.id.clone()))
        .await
        .with_context(|| format!("Failed to open {} {}", args.object_type, args.id))?;

    println!("{} {}", args.object_type.bold(), args.id.dimmed());
    print_form(&browser);
    Ok(())
}

pub async fn handle_create(context: &CommandContext, args: CreateArgs) -> Result<()> {
    let (store, mut browser) = context.open(&args.object_type).await?;
    browser.dispatch(Intent::StartCreate).await?;
    apply_assignments(&store, &mut browser, &args.assignments).await?;

    submit(&mut browser).await?;
    context.save(&store)?;
    println!("{} Created {} record", "✓".green(), args.object_type);
    Ok(())
}

pub async fn handle_update(context: &CommandContext, args: UpdateArgs) -> Result<()> {
    let (store, mut browser) = context.open(&args.object_type).await?;
    browser
        .dispatch(Intent::StartEdit(args.id.clone()))
        .await
        .with_context(|| format!("Failed to open {} {}", args.object_type, args.id))?;
    apply_assignments(&store, &mut browser, &args.assignments).await?;

    match submit(&mut browser).await {
        Err(BrowserError::NoChanges) => {
            println!("{}", "No changes to save".yellow());
            return Ok(());
        }
        result => result?,
    }
    context.save(&store)?;
    println!("{} Updated {} {}", "✓".green(), args.object_type, args.id);
    Ok(())
}

pub async fn handle_delete(context: &CommandContext, args: DeleteArgs) -> Result<()> {
    let (store, mut browser) = context.open(&args.object_type).await?;

    let id_field = context.config.id_field.as_str();
    let exists = browser
        .rows()
        .iter()
        .any(|row| row.get(id_field).map(display_value).as_deref() == Some(args.id.as_str()));
    if !exists {
        anyhow::bail!("{} {} not found", args.object_type, args.id);
    }

    browser.dispatch(Intent::Delete(args.id.clone())).await?;

    let confirmed = args.yes
        || Confirm::new()
            .with_prompt(format!("Delete {} {}?", args.object_type, args.id))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
    if !confirmed {
        browser.dispatch(Intent::CancelDelete).await?;
        println!("{}", "Cancelled".dimmed());
        return Ok(());
    }

    browser.dispatch(Intent::ConfirmDelete).await?;
    context.save(&store)?;
    println!("{} Deleted {} {}", "✓".green(), args.object_type, args.id);
    Ok(())
}

pub async fn handle_lookup(context: &CommandContext, args: LookupArgs) -> Result<()> {
    // The whole term arrives at once, so there is nothing to debounce
    let search = SearchConfig {
        max_results: context.config.search.max_results,
        ..SearchConfig::immediate()
    };
    let config = context.config.clone().with_search(search);
    let (_store, mut browser) = context.open_with(&args.object_type, config).await?;
    let intent = match &args.record {
        Some(id) => Intent::StartEdit(id.clone()),
        None => Intent::StartCreate,
    };
    browser.dispatch(intent).await?;

    browser
        .dispatch(Intent::LookupInput {
            field: args.field.clone(),
            term: args.term.clone(),
        })
        .await?;
    let phase = browser.settle_lookup(&args.field).await?;

    let options = browser
        .session()
        .and_then(|session| session.lookup_state(&args.field))
        .map(|state| state.options.clone())
        .unwrap_or_default();

    match phase {
        SearchPhase::Failed => {
            println!("{}", "Lookup search failed; no suggestions available".yellow());
        }
        _ if options.is_empty() => println!("{}", "No matches".dimmed()),
        _ => {
            for option in options {
                println!("{}  {}", option.value.dimmed(), option.label);
            }
        }
    }
    Ok(())
}

async fn submit(browser: &mut RecordBrowser) -> Result<(), BrowserError> {
    let result = browser.dispatch(Intent::Submit).await;
    if let Err(BrowserError::Validation(error)) = &result {
        eprintln!("{} {}", "invalid:".red().bold(), error);
    }
    result
}

async fn apply_assignments(
    store: &MemoryStore,
    browser: &mut RecordBrowser,
    assignments: &[String],
) -> Result<()> {
    for assignment in assignments {
        let (field, raw) = assignment
            .split_once('=')
            .with_context(|| format!("Expected FIELD=VALUE, got '{}'", assignment))?;
        let field = field.trim();

        let descriptor = browser
            .session()
            .and_then(|session| session.descriptor(field))
            .cloned()
            .with_context(|| format!("Field '{}' is not on the {} form", field, browser.object_type()))?;
        let intent = if descriptor.is_external_lookup {
            lookup_assignment(store, &descriptor, raw)
        } else {
            Intent::ChangeField {
                field: field.to_string(),
                value: parse_assignment(&descriptor, raw)?,
            }
        };
        browser.dispatch(intent).await?;
    }
    Ok(())
}

/// A lookup is set by selecting the record with id `raw`, labelled from
/// the store when the target record exists. An empty value clears it.
fn lookup_assignment(store: &MemoryStore, descriptor: &FieldDescriptor, raw: &str) -> Intent {
    let raw = raw.trim();
    if raw.is_empty() {
        return Intent::ClearLookup(descriptor.field_name.clone());
    }

    let label = resolve_lookup_target(descriptor)
        .and_then(|target| store.record_label(&target, raw))
        .unwrap_or_else(|| raw.to_string());
    Intent::SelectLookupOption {
        field: descriptor.field_name.clone(),
        option: SelectOption::new(raw, label),
    }
}

/// Convert a command-line value to the JSON value of the field's type.
/// An empty value clears the field.
fn parse_assignment(descriptor: &FieldDescriptor, raw: &str) -> Result<Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Value::Null);
    }

    let value = match descriptor.field_type {
        FieldType::Number => {
            let number = raw
                .parse::<i64>()
                .ok()
                .map(Number::from)
                .or_else(|| raw.parse::<f64>().ok().and_then(Number::from_f64))
                .with_context(|| format!("{} expects a number, got '{}'", descriptor.label, raw))?;
            Value::Number(number)
        }
        FieldType::Boolean => match raw.to_lowercase().as_str() {
            "true" | "yes" | "1" => Value::Bool(true),
            "false" | "no" | "0" => Value::Bool(false),
            _ => anyhow::bail!("{} expects true or false, got '{}'", descriptor.label, raw),
        },
        FieldType::Date => {
            let date = parse_calendar_date(raw)
                .with_context(|| format!("{} expects a date, got '{}'", descriptor.label, raw))?;
            Value::String(date.format("%Y-%m-%d").to_string())
        }
        FieldType::Picklist => {
            let option = descriptor
                .picklist_options
                .iter()
                .find(|o| o.value == raw || o.label.eq_ignore_ascii_case(raw))
                .with_context(|| {
                    let choices: Vec<&str> =
                        descriptor.picklist_options.iter().map(|o| o.label.as_str()).collect();
                    format!(
                        "'{}' is not an option of {} ({})",
                        raw,
                        descriptor.label,
                        choices.join(", ")
                    )
                })?;
            Value::String(option.value.clone())
        }
        _ => Value::String(raw.to_string()),
    };
    Ok(value)
}

fn print_table(view: &BrowserView<'_>) {
    if view.columns.is_empty() {
        println!("{}", "No columns configured".dimmed());
        return;
    }

    let header: Vec<String> = std::iter::once("#".to_string())
        .chain(view.columns.iter().map(|c| c.label.clone()))
        .collect();
    let body: Vec<Vec<String>> = view
        .page
        .rows
        .iter()
        .map(|numbered| {
            std::iter::once(numbered.number.to_string())
                .chain(view.columns.iter().map(|c| {
                    numbered
                        .row
                        .get(&c.field_name)
                        .map(display_value)
                        .unwrap_or_default()
                }))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line: Vec<String> = header
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<w$}", h, w = *w).bold().to_string())
        .collect();
    println!("{}", line.join("  "));

    for row in &body {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let padded = format!("{:<w$}", cell, w = widths[i]);
                match i {
                    0 => padded.dimmed().to_string(),
                    _ if view.columns[i - 1].kind == ColumnKind::RowAction => padded.cyan().to_string(),
                    _ => padded,
                }
            })
            .collect();
        println!("{}", line.join("  "));
    }

    let mut footer = format!(
        "Page {} of {} ({} records)",
        view.page.page_index, view.page.total_pages, view.page.total_rows
    );
    if let Some(field) = view.sort_field {
        footer.push_str(&format!(", sorted by {} {}", field, view.sort_direction));
    }
    println!("{}", footer.dimmed());
}

fn print_form(browser: &RecordBrowser) {
    let Some(session) = browser.session() else {
        return;
    };
    let view = browser.view();
    if view.fields.is_empty() {
        println!("{}", "No fields configured".dimmed());
        return;
    }

    let width = view
        .fields
        .iter()
        .map(|f| f.descriptor.label.chars().count())
        .max()
        .unwrap_or(0);

    for field in &view.fields {
        let descriptor = field.descriptor;
        let marker = if descriptor.required { "*" } else { " " };
        let value = match field.display_label {
            Some(label) => format!("{} {}", label, format!("({})", display_value(field.value)).dimmed()),
            None => display_value(field.value),
        };
        let label = format!("{:<w$}", descriptor.label, w = width);
        println!("{}{}  {}", marker.red(), label.bold(), value);

        if let Some(error) = session.field_error(&descriptor.field_name) {
            println!("   {}", error.to_string().red());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynamics_records::metadata::{FormPurpose, RawFieldConfig, resolve_descriptors};
    use serde_json::json;

    fn descriptor(field_type: &str) -> FieldDescriptor {
        let options = vec![SelectOption::new("1", "Hot"), SelectOption::new("2", "Cold")];
        resolve_descriptors(
            &[RawFieldConfig::new("Field", field_type)
                .with_label("Field")
                .with_options(options)],
            FormPurpose::Edit,
        )
        .remove(0)
    }

    #[test]
    fn test_parse_assignment_by_type() {
        assert_eq!(parse_assignment(&descriptor("number"), "42").unwrap(), json!(42));
        assert_eq!(parse_assignment(&descriptor("number"), "2.5").unwrap(), json!(2.5));
        assert_eq!(parse_assignment(&descriptor("boolean"), "Yes").unwrap(), json!(true));
        assert_eq!(
            parse_assignment(&descriptor("date"), "01/05/2024").unwrap(),
            json!("2024-01-05")
        );
        assert_eq!(parse_assignment(&descriptor("picklist"), "cold").unwrap(), json!("2"));
        assert_eq!(parse_assignment(&descriptor("picklist"), "1").unwrap(), json!("1"));
        assert_eq!(parse_assignment(&descriptor("text"), " hi ").unwrap(), json!("hi"));
        assert_eq!(parse_assignment(&descriptor("text"), "").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_assignment_rejects_bad_values() {
        assert!(parse_assignment(&descriptor("number"), "many").is_err());
        assert!(parse_assignment(&descriptor("boolean"), "maybe").is_err());
        assert!(parse_assignment(&descriptor("date"), "someday").is_err());

        let error = parse_assignment(&descriptor("picklist"), "Warm").unwrap_err();
        assert!(error.to_string().contains("Hot, Cold"));
    }

    #[test]
    fn test_lookup_assignment_selects_by_id() {
        let store = MemoryStore::from_json_str(include_str!("../../../../../demos/records.json")).unwrap();
        let owner = resolve_descriptors(&[RawFieldConfig::new("OwnerId", "lookup")], FormPurpose::Edit).remove(0);

        assert_eq!(
            lookup_assignment(&store, &owner, "U-02"),
            Intent::SelectLookupOption {
                field: "OwnerId".into(),
                option: SelectOption::new("U-02", "Sam Okafor"),
            }
        );
        assert_eq!(
            lookup_assignment(&store, &owner, "U-99"),
            Intent::SelectLookupOption {
                field: "OwnerId".into(),
                option: SelectOption::new("U-99", "U-99"),
            }
        );
        assert_eq!(
            lookup_assignment(&store, &owner, " "),
            Intent::ClearLookup("OwnerId".into())
        );
    }
}
