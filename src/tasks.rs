// ABOUTME: Reader for the CSV task list describing what to promote
// ABOUTME: Each row names a module, object type, folder and object name

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::PromoterError;

const MODULE_COLUMN: usize = 0;
const TYPE_COLUMN: usize = 1;
const FOLDER_COLUMN: usize = 2;
const NAME_COLUMN: usize = 3;

/// Modules are promoted in this order; other modules follow, in file order.
pub const MODULE_ORDER: &[&str] = &["R360", "CDI", "CAI", "CDQ"];

fn module_rank(module: &str) -> usize {
    MODULE_ORDER
        .iter()
        .position(|known| known.eq_ignore_ascii_case(module))
        .unwrap_or(MODULE_ORDER.len())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationTask {
    pub module: String,
    pub object_type: String,
    pub folder: String,
    pub object_name: String,
}

impl MigrationTask {
    pub fn new(folder: &str, object_name: &str) -> Self {
        Self {
            module: String::new(),
            object_type: String::new(),
            folder: folder.to_string(),
            object_name: object_name.to_string(),
        }
    }

    /// Logical catalog path, `folder/object_name`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.folder, self.object_name)
    }
}

/// Finds the task list: `path` itself, or the first `.csv` file (by name)
/// when `path` is a directory.
pub fn locate_task_file(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(path)
        .with_context(|| format!("Failed to read task directory {}", path.display()))?
    {
        let entry_path = entry?.path();
        let is_csv = entry_path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv && entry_path.is_file() {
            candidates.push(entry_path);
        }
    }
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        PromoterError::TaskList(format!("no CSV file found in {}", path.display())).into()
    })
}

/// Reads tasks from a CSV file or a directory holding one.
///
/// The header row and blank rows are skipped. With `module` set, only rows
/// whose module column matches (case-insensitively) are kept. Rows are
/// grouped by module in [`MODULE_ORDER`], keeping file order within a module.
pub fn read_tasks(path: &Path, module: Option<&str>) -> Result<Vec<MigrationTask>> {
    let file = locate_task_file(path)?;
    info!(file = %file.display(), "Reading task list");

    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(&file)
        .with_context(|| format!("Failed to open task list {}", file.display()))?;

    let tasks = parse_tasks(reader)?;
    let mut tasks: Vec<MigrationTask> = match module {
        Some(module) => tasks
            .into_iter()
            .filter(|task| task.module.eq_ignore_ascii_case(module))
            .collect(),
        None => tasks,
    };
    tasks.sort_by_key(|task| module_rank(&task.module));

    info!(count = tasks.len(), "Loaded migration tasks");
    Ok(tasks)
}

fn parse_tasks<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<MigrationTask>> {
    let mut tasks = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // header is row 1
        let row = index + 2;
        let record = record.with_context(|| format!("Failed to parse task list row {}", row))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() <= NAME_COLUMN {
            return Err(PromoterError::TaskList(format!(
                "row {} has {} column(s), expected at least {}",
                row,
                record.len(),
                NAME_COLUMN + 1
            ))
            .into());
        }

        let task = MigrationTask {
            module: record[MODULE_COLUMN].to_string(),
            object_type: record[TYPE_COLUMN].to_string(),
            folder: record[FOLDER_COLUMN].to_string(),
            object_name: record[NAME_COLUMN].to_string(),
        };
        if task.folder.is_empty() || task.object_name.is_empty() {
            return Err(PromoterError::TaskList(format!(
                "row {} is missing a folder or object name",
                row
            ))
            .into());
        }
        tasks.push(task);
    }
    Ok(tasks)
}
