//! Custom command discovery from magefile sources
//!
//! Scans `magefiles/*.go` or `magefile.go` for targets and keeps them in a
//! case-insensitive catalog. Queries that only ask "does this exist?" treat a
//! broken magefile the same as an empty one; listing and searching report the
//! underlying error.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::Serialize;

use super::gosource::{parse_source, Declaration, SourceFile};
use super::location::{ScriptLocation, ScriptLocator};
use super::normalize::{lookup_key, NAMESPACE_SEPARATOR};
use crate::error::DiscoveryError;

/// Most suggestions offered for a query with no matches
pub const MAX_SUGGESTIONS: usize = 5;

/// Largest edit distance still offered as a suggestion
const SUGGESTION_DISTANCE: usize = 2;

/// How a target was declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetKind {
    /// Top-level function
    Function,
    /// Method on a namespace type
    Method { namespace: String, method: String },
}

/// A target found in the magefile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredCommand {
    /// Lower-cased flattened name, the catalog key
    pub name: String,
    /// Name as declared: `Deploy` or `Pipeline:CI`
    pub original_name: String,
    /// Leading line comment, empty if absent
    pub description: String,
    pub kind: TargetKind,
}

impl DiscoveredCommand {
    /// Target declared as a top-level function
    pub fn function(name: impl Into<String>, description: impl Into<String>) -> Self {
        let original_name = name.into();
        Self {
            name: original_name.to_lowercase(),
            original_name,
            description: description.into(),
            kind: TargetKind::Function,
        }
    }

    /// Target declared as a method on a namespace type
    pub fn method(
        namespace: impl Into<String>,
        method: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let namespace = namespace.into();
        let method = method.into();
        Self {
            name: format!("{}{}", namespace, method).to_lowercase(),
            original_name: format!("{}{}{}", namespace, NAMESPACE_SEPARATOR, method),
            description: description.into(),
            kind: TargetKind::Method { namespace, method },
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match &self.kind {
            TargetKind::Function => None,
            TargetKind::Method { namespace, .. } => Some(namespace),
        }
    }

    /// Name as users type it: `deploy` or `pipeline:ci`
    pub fn display_name(&self) -> String {
        match &self.kind {
            TargetKind::Function => self.name.clone(),
            TargetKind::Method { namespace, method } => format!(
                "{}{}{}",
                namespace.to_lowercase(),
                NAMESPACE_SEPARATOR,
                method.to_lowercase()
            ),
        }
    }
}

/// Insertion-ordered, case-insensitive set of discovered targets
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    commands: Vec<DiscoveredCommand>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target; a later target with the same key replaces the earlier one
    pub fn insert(&mut self, command: DiscoveredCommand) {
        let key = command.name.to_lowercase();
        match self.index.get(&key) {
            Some(&slot) => {
                tracing::debug!(
                    "Target '{}' replaces earlier '{}'",
                    command.original_name,
                    self.commands[slot].original_name
                );
                self.commands[slot] = command;
            }
            None => {
                self.index.insert(key, self.commands.len());
                self.commands.push(command);
            }
        }
    }

    /// Look up a target by any casing of `name` or `namespace:method`
    pub fn get(&self, name: &str) -> Option<&DiscoveredCommand> {
        self.index
            .get(&lookup_key(name))
            .map(|&slot| &self.commands[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Targets in discovery order
    pub fn commands(&self) -> &[DiscoveredCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Targets whose display name or description contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Vec<&DiscoveredCommand> {
        let query = query.to_lowercase();
        self.commands
            .iter()
            .filter(|c| {
                c.display_name().contains(&query)
                    || c.name.contains(&query)
                    || c.description.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Near misses for a query that `search` found nothing for
    ///
    /// A target qualifies when its name contains the query, or when the query
    /// is longer than two characters and within two edits of the name.
    pub fn suggest(&self, query: &str) -> Vec<&DiscoveredCommand> {
        let query = query.to_lowercase();
        let fuzzy = query.chars().count() > SUGGESTION_DISTANCE;

        self.commands
            .iter()
            .filter(|c| {
                let display = c.display_name();
                let matched = [display.as_str(), c.name.as_str()].into_iter().any(|name| {
                    name.contains(&query)
                        || (fuzzy && strsim::levenshtein(name, &query) <= SUGGESTION_DISTANCE)
                });
                matched
            })
            .take(MAX_SUGGESTIONS)
            .collect()
    }

    /// Targets grouped by lower-cased namespace; top-level functions use ""
    pub fn by_namespace(&self) -> BTreeMap<String, Vec<&DiscoveredCommand>> {
        let mut groups: BTreeMap<String, Vec<&DiscoveredCommand>> = BTreeMap::new();
        for command in &self.commands {
            let group = command.namespace().unwrap_or_default().to_lowercase();
            groups.entry(group).or_default().push(command);
        }
        groups
    }
}

/// Scan the magefile location and build a catalog
///
/// Returns an empty catalog when the project has no magefile.
///
/// # Errors
/// * `DiscoveryError::Read` - If a source file or the directory can't be read
/// * `DiscoveryError::Parse` - If any source file has a syntax error
pub fn scan(locator: &ScriptLocator) -> Result<Catalog, DiscoveryError> {
    let files = match locator.resolve() {
        ScriptLocation::None => {
            tracing::debug!("No magefile found under {}", locator.root().display());
            return Ok(Catalog::new());
        }
        ScriptLocation::Directory { path, .. } => source_files(&path)?,
        ScriptLocation::SingleFile(path) => vec![path],
    };

    let mut parsed: Vec<SourceFile> = Vec::with_capacity(files.len());
    for path in &files {
        let source = fs::read_to_string(path).map_err(|e| DiscoveryError::Read {
            path: path.clone(),
            message: e.to_string(),
        })?;
        parsed.push(parse_source(path, &source)?);
    }

    // Namespace types may be declared after their methods or in another file
    let namespaces: HashSet<&str> = parsed
        .iter()
        .flat_map(|f| f.namespaces.iter().map(String::as_str))
        .collect();

    let mut catalog = Catalog::new();
    for declaration in parsed.iter().flat_map(|f| &f.declarations) {
        match declaration {
            Declaration::Function { name, description } => {
                catalog.insert(DiscoveredCommand::function(name, description));
            }
            Declaration::Method {
                receiver,
                name,
                description,
            } if namespaces.contains(receiver.as_str()) => {
                catalog.insert(DiscoveredCommand::method(receiver, name, description));
            }
            Declaration::Method { .. } => {}
        }
    }

    tracing::debug!(
        "Discovered {} custom commands from {} file(s)",
        catalog.len(),
        files.len()
    );
    Ok(catalog)
}

/// Go sources in a magefiles directory, sorted by file name
fn source_files(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let read_error = |e: std::io::Error| DiscoveryError::Read {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        let is_source = path.extension().is_some_and(|ext| ext == "go")
            && !path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("_test.go"));
        if is_source && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read access to discovered targets, as needed by delegation
#[cfg_attr(test, mockall::automock)]
pub trait CommandLookup {
    /// Whether a target exists, ignoring case
    fn has_command(&self, name: &str) -> bool;

    /// Declared name of a target, ignoring case
    fn original_name(&self, name: &str) -> Option<String>;
}

/// Lazily populated discovery cache
///
/// Owned by the caller's top-level context and passed by reference to whatever
/// needs it. The first query scans; `invalidate` forces the next query to scan
/// again.
#[derive(Debug)]
pub struct CommandDiscovery {
    locator: ScriptLocator,
    catalog: OnceCell<Result<Catalog, DiscoveryError>>,
}

impl CommandDiscovery {
    pub fn new(locator: ScriptLocator) -> Self {
        Self {
            locator,
            catalog: OnceCell::new(),
        }
    }

    /// Discovery with a pre-built catalog, skipping the scan
    pub fn with_catalog(locator: ScriptLocator, catalog: Catalog) -> Self {
        Self {
            locator,
            catalog: OnceCell::with_value(Ok(catalog)),
        }
    }

    pub fn locator(&self) -> &ScriptLocator {
        &self.locator
    }

    pub fn is_loaded(&self) -> bool {
        self.catalog.get().is_some()
    }

    /// Scan on first use and return the catalog or the scan error
    pub fn discover(&self) -> Result<&Catalog, DiscoveryError> {
        self.catalog
            .get_or_init(|| scan(&self.locator))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Drop the cached result
    pub fn invalidate(&mut self) {
        self.catalog.take();
    }

    /// Drop the cached result and scan again
    pub fn rescan(&mut self) -> Result<&Catalog, DiscoveryError> {
        self.invalidate();
        self.discover()
    }

    /// Look up a target; a failed scan finds nothing
    pub fn get_command(&self, name: &str) -> Option<&DiscoveredCommand> {
        match self.discover() {
            Ok(catalog) => catalog.get(name),
            Err(e) => {
                tracing::debug!("Discovery failed, treating '{}' as unknown: {}", name, e);
                None
            }
        }
    }

    /// All targets, or the scan error
    pub fn list_commands(&self) -> Result<&[DiscoveredCommand], DiscoveryError> {
        self.discover().map(Catalog::commands)
    }

    /// Matching targets, or the scan error
    pub fn search(&self, query: &str) -> Result<Vec<&DiscoveredCommand>, DiscoveryError> {
        self.discover().map(|catalog| catalog.search(query))
    }

    /// Near misses for `query`, or the scan error
    pub fn suggest(&self, query: &str) -> Result<Vec<&DiscoveredCommand>, DiscoveryError> {
        self.discover().map(|catalog| catalog.suggest(query))
    }
}

impl CommandLookup for CommandDiscovery {
    fn has_command(&self, name: &str) -> bool {
        self.get_command(name).is_some()
    }

    fn original_name(&self, name: &str) -> Option<String> {
        self.get_command(name).map(|c| c.original_name.clone())
    }
}
