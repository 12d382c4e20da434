//! Declarative module files
//!
//! ```toml
//! duration = "5m"
//!
//! [schedule]
//! hours = [8, 19]
//! weekdays = ["mon", "tue", "wed", "thu", "fri"]
//!
//! [defaults]
//! color = "GREEN"
//!
//! [[section]]
//! kind = "status"
//!
//! [[section]]
//! kind = "pool"
//! fill = 4
//! fillers = ["Just what do you think you're doing, Dave?"]
//! interleave_pauses = true
//! ```

use super::duration::HumanDuration;
use super::schedule::{Schedule, ScheduleSpec};
use super::sections::{Section, SectionSpec, Style};
use super::{ModuleContext, ModuleError, SequenceModule};
use crate::sequence::{Color, Mode, Sequence, Speed, DEFAULT_DURATION_SECS};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Module file as written on disk
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleFile {
    /// How long each sequence stays on the sign
    pub duration: Option<HumanDuration>,

    #[serde(default)]
    pub schedule: ScheduleSpec,

    #[serde(default)]
    pub defaults: DefaultsSpec,

    #[serde(default, rename = "section")]
    pub sections: Vec<SectionSpec>,
}

/// Attributes for generated text when a section sets none
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsSpec {
    #[serde(default = "default_mode")]
    pub mode: Mode,
    #[serde(default = "default_color")]
    pub color: Option<Color>,
    #[serde(default = "default_speed")]
    pub speed: Option<Speed>,
}

fn default_mode() -> Mode {
    Style::default().mode
}

fn default_color() -> Option<Color> {
    Style::default().color
}

fn default_speed() -> Option<Speed> {
    Style::default().speed
}

impl Default for DefaultsSpec {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            color: default_color(),
            speed: default_speed(),
        }
    }
}

impl ModuleFile {
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ModuleError> {
        toml::from_str(contents).map_err(|e| ModuleError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Module backed by a module file
pub struct FileModule {
    name: String,
    path: PathBuf,
    duration: u32,
    schedule: Schedule,
    sections: Vec<Section>,
    rng: StdRng,
}

impl FileModule {
    /// Read and validate a module file; the module is named after the file stem
    pub fn load(path: &Path) -> Result<Self, ModuleError> {
        let contents = fs::read_to_string(path).map_err(|e| ModuleError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file = ModuleFile::parse(&contents, path)?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_file(name, path.to_path_buf(), file, StdRng::from_entropy())
    }

    /// Build from an already parsed file with a given random source
    pub fn from_file(
        name: String,
        path: PathBuf,
        file: ModuleFile,
        rng: StdRng,
    ) -> Result<Self, ModuleError> {
        let duration = match file.duration {
            Some(d) if d.as_secs() == 0 => {
                return Err(ModuleError::Invalid(format!(
                    "{}: duration must be at least one second",
                    name
                )))
            }
            Some(d) => u32::try_from(d.as_secs()).map_err(|_| {
                ModuleError::Invalid(format!("{}: duration is too long", name))
            })?,
            None => DEFAULT_DURATION_SECS,
        };

        let schedule = Schedule::try_from(file.schedule)
            .map_err(|e| ModuleError::Invalid(format!("{}: schedule: {}", name, e)))?;

        let defaults = Style {
            mode: file.defaults.mode,
            color: file.defaults.color,
            speed: file.defaults.speed,
        };

        let sections = file
            .sections
            .into_iter()
            .enumerate()
            .map(|(i, spec)| Section::from_spec(i, spec, &defaults))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ModuleError::Invalid(format!("{}: {}", name, e)))?;

        if sections.iter().filter(|s| s.is_pool()).count() > 1 {
            return Err(ModuleError::Invalid(format!(
                "{}: only one pool section is allowed",
                name
            )));
        }

        Ok(Self {
            name,
            path,
            duration,
            schedule,
            sections,
            rng,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SequenceModule for FileModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts_messages(&self) -> bool {
        self.sections.iter().any(Section::is_pool)
    }

    async fn sign_sequence(
        &mut self,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<Option<Sequence>, ModuleError> {
        let mut messages = Vec::new();

        for section in &mut self.sections {
            match section.generate(ctx, &mut self.rng).await {
                Ok(generated) => {
                    debug!("{} produced {} message(s)", section.label(), generated.len());
                    messages.extend(generated);
                }
                Err(e) => error!("Error in module '{}': {}", self.name, e),
            }
        }

        Sequence::new(self.duration, messages)
            .map(Some)
            .map_err(|e| ModuleError::Invalid(e.to_string()))
    }

    fn is_active(&self, now: &DateTime<Local>) -> bool {
        self.schedule.is_active(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use crate::sequence::Message;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const OFFICE: &str = r#"
duration = "5m"

[schedule]
hours = [8, 19]

[defaults]
color = "GREEN"

[[section]]
kind = "status"

[[section]]
kind = "pause"

[[section]]
kind = "texts"
texts = ["Now THAT'S a solution for progress!"]

[[section]]
kind = "lines"
path = "/nonexistent/simplesign/quips.txt"

[[section]]
kind = "pool"
size = 4
"#;

    fn module(src: &str) -> FileModule {
        let path = PathBuf::from("office.toml");
        let file = ModuleFile::parse(src, &path).unwrap();
        FileModule::from_file("office".to_string(), path, file, StdRng::seed_from_u64(1)).unwrap()
    }

    #[tokio::test]
    async fn test_sections_assembled_in_order() {
        let mut m = module(OFFICE);
        let (handle, _s, mut msgs) = queue::channel();
        handle.enqueue_message(Message::new("hi from the web")).unwrap();

        let now = Local.with_ymd_and_hms(2024, 1, 8, 9, 5, 0).unwrap();
        let mut ctx = ModuleContext::at(&mut msgs, now);
        let seq = m.sign_sequence(&mut ctx).await.unwrap().unwrap();

        assert_eq!(seq.duration, 300);
        // The failing lines section is skipped
        assert_eq!(
            seq.texts(),
            vec![
                "Status 9:05am",
                "          ",
                "Now THAT'S a solution for progress!",
                "hi from the web",
            ]
        );
        assert_eq!(seq.messages[2].color, Some(Color::Green));
    }

    #[test]
    fn test_accepts_messages_only_with_pool() {
        assert!(module(OFFICE).accepts_messages());
        assert!(!module("[[section]]\nkind = \"status\"").accepts_messages());
        assert!(!module("").accepts_messages());
    }

    #[test]
    fn test_schedule_controls_activity() {
        let m = module(OFFICE);
        assert!(m.is_active(&Local.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap()));
        assert!(!m.is_active(&Local.with_ymd_and_hms(2024, 1, 8, 22, 0, 0).unwrap()));
    }

    #[tokio::test]
    async fn test_empty_module_file() {
        let mut m = module("");
        let (_h, _s, mut msgs) = queue::channel();
        let mut ctx = ModuleContext::new(&mut msgs);

        let seq = m.sign_sequence(&mut ctx).await.unwrap().unwrap();
        assert_eq!(seq.duration, DEFAULT_DURATION_SECS);
        assert!(seq.is_empty());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let path = PathBuf::from("bad.toml");
        let file = ModuleFile::parse("duration = 0", &path).unwrap();
        let result = FileModule::from_file("bad".into(), path, file, StdRng::seed_from_u64(1));
        assert!(matches!(result, Err(ModuleError::Invalid(_))));
    }

    #[test]
    fn test_two_pools_rejected() {
        let src = "[[section]]\nkind = \"pool\"\n[[section]]\nkind = \"pool\"\n";
        let path = PathBuf::from("pools.toml");
        let file = ModuleFile::parse(src, &path).unwrap();
        let result = FileModule::from_file("pools".into(), path, file, StdRng::seed_from_u64(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_color_in_defaults_rejected() {
        let path = PathBuf::from("bad.toml");
        assert!(ModuleFile::parse("[defaults]\ncolor = \"PLAID\"", &path).is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("office.toml");
        std::fs::write(&path, OFFICE).unwrap();

        let m = FileModule::load(&path).unwrap();
        assert_eq!(m.name(), "office");
        assert_eq!(m.path(), path.as_path());
    }
}
