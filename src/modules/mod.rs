//! Sequence modules
//!
//! A module decides what the sign shows. `-m <name>` picks one:
//! - `sample`: built-in hello world
//! - `<name>`: declarative module file `<modules dir>/<name>.toml`
//! - a path to a `.toml` module file

pub mod duration;
pub mod file;
pub mod pool;
pub mod sample;
pub mod schedule;
pub mod sections;

use crate::queue::MessageReceiver;
use crate::sequence::Sequence;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

pub use file::FileModule;
pub use sample::SampleModule;

/// Module names that need no file
pub const BUILTIN_MODULES: &[&str] = &[sample::NAME];

/// Extension of declarative module files
const MODULE_EXTENSION: &str = "toml";

/// Errors raised while loading or running a module
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("Module '{name}' not found (looked for built-ins and {dir}/{name}.toml)")]
    NotFound { name: String, dir: PathBuf },

    #[error("Failed to read module file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse module file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid module: {0}")]
    Invalid(String),

    #[error("Section '{section}' failed: {message}")]
    Section { section: String, message: String },
}

/// What the sign loop hands a module on each refresh
pub struct ModuleContext<'a> {
    /// User messages submitted through the web server
    pub messages: &'a mut MessageReceiver,
    /// Wall clock at the start of this refresh
    pub now: DateTime<Local>,
}

impl<'a> ModuleContext<'a> {
    pub fn new(messages: &'a mut MessageReceiver) -> Self {
        Self {
            messages,
            now: Local::now(),
        }
    }

    pub fn at(messages: &'a mut MessageReceiver, now: DateTime<Local>) -> Self {
        Self { messages, now }
    }
}

/// Source of sign sequences
#[async_trait]
pub trait SequenceModule: Send {
    fn name(&self) -> &str;

    /// Sequence to display next; `None` shows nothing for the default duration
    async fn sign_sequence(
        &mut self,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<Option<Sequence>, ModuleError>;

    /// Whether the sign should be showing anything at `now`
    fn is_active(&self, _now: &DateTime<Local>) -> bool {
        true
    }

    /// Whether `sign_sequence` reads submitted messages; the runner discards
    /// them otherwise
    fn accepts_messages(&self) -> bool {
        false
    }
}

/// Resolve a module name to a loaded module.
pub fn load_module(name: &str, dir: &Path) -> Result<Box<dyn SequenceModule>, ModuleError> {
    if name == sample::NAME {
        return Ok(Box::new(SampleModule));
    }

    let as_path = Path::new(name);
    if is_module_file(as_path) && as_path.is_file() {
        return Ok(Box::new(FileModule::load(as_path)?));
    }

    let in_dir = dir.join(format!("{}.{}", name, MODULE_EXTENSION));
    if in_dir.is_file() {
        return Ok(Box::new(FileModule::load(&in_dir)?));
    }

    Err(ModuleError::NotFound {
        name: name.to_string(),
        dir: dir.to_path_buf(),
    })
}

/// Names accepted by `-m`, built-ins first.
pub fn list_modules(dir: &Path) -> Vec<String> {
    let mut found: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| is_module_file(p))
                .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
                .collect()
        })
        .unwrap_or_default();
    found.sort();

    BUILTIN_MODULES
        .iter()
        .map(|s| s.to_string())
        .chain(found.into_iter().filter(|n| !BUILTIN_MODULES.contains(&n.as_str())))
        .collect()
}

fn is_module_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MODULE_EXTENSION)
}
