//! Sections of a declarative module
//!
//! A module file lists sections; each one contributes messages to the
//! sequence, in file order. Section kinds:
//! - `messages`: literal messages
//! - `texts`: plain strings styled with the module defaults
//! - `random`: like `texts`, showing `count` of them (one if unset)
//! - `status`: clock header ("Status 3:45pm")
//! - `pause`: blank spacer
//! - `lines`: one message per line of a text file
//! - `command`: one message per stdout line of an external command
//! - `pool`: messages submitted through the web form
//! - `weekend`: a reminder shown on Saturdays and Sundays
//!
//! Any section may set `count` to show that many of its messages picked at
//! random, and `interleave_pauses` to space them out.

use super::duration::HumanDuration;
use super::pool::{MessagePool, DEFAULT_MAX_AGE, DEFAULT_POOL_SIZE};
use super::{ModuleContext, ModuleError};
use crate::sequence::{
    interleave_pauses, is_displayable, normalize, pause, Color, Message, Mode, Speed,
};
use chrono::{Datelike, Weekday};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

const DEFAULT_PAUSE_WIDTH: usize = 10;
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Section as written in a module file
#[derive(Debug, Clone, Deserialize)]
pub struct SectionSpec {
    #[serde(flatten)]
    pub source: SourceSpec,

    /// Show this many messages, picked at random
    pub count: Option<usize>,

    #[serde(default)]
    pub interleave_pauses: bool,

    pub mode: Option<Mode>,
    pub color: Option<Color>,
    pub speed: Option<Speed>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSpec {
    Messages {
        messages: Vec<Message>,
    },
    Texts {
        texts: Vec<String>,
    },
    Random {
        texts: Vec<String>,
    },
    Status,
    Pause {
        width: Option<usize>,
    },
    Lines {
        path: PathBuf,
    },
    Command {
        command: Vec<String>,
        cache: Option<HumanDuration>,
        timeout: Option<HumanDuration>,
    },
    Pool {
        size: Option<usize>,
        max_age: Option<HumanDuration>,
        #[serde(default)]
        fill: usize,
        #[serde(default)]
        fillers: Vec<String>,
    },
    Weekend,
}

/// Attributes applied to generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub mode: Mode,
    pub color: Option<Color>,
    pub speed: Option<Speed>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            mode: Mode::Rotate,
            color: Some(Color::Red),
            speed: Some(Speed::Speed1),
        }
    }
}

impl Style {
    fn message(&self, text: impl Into<String>) -> Message {
        Message {
            text: text.into(),
            mode: Some(self.mode),
            color: self.color,
            speed: self.speed,
        }
    }

    fn overridden(&self, spec: &SectionSpec) -> Self {
        Self {
            mode: spec.mode.unwrap_or(self.mode),
            color: spec.color.or(self.color),
            speed: spec.speed.or(self.speed),
        }
    }
}

enum Source {
    Messages(Vec<Message>),
    Texts(Vec<String>),
    Status,
    Pause(usize),
    Lines(PathBuf),
    Command {
        argv: Vec<String>,
        cache_for: Option<Duration>,
        timeout: Duration,
        cached: Option<(Instant, Vec<String>)>,
    },
    Pool {
        pool: MessagePool,
        fill: usize,
        fillers: Vec<String>,
    },
    Weekend,
}

/// A section ready to generate messages
pub struct Section {
    label: String,
    source: Source,
    style: Style,
    pause_mode: Option<Mode>,
    count: Option<usize>,
    interleave: bool,
}

impl Section {
    pub fn from_spec(index: usize, spec: SectionSpec, defaults: &Style) -> Result<Self, String> {
        let style = defaults.overridden(&spec);
        let label = format!("{}#{}", spec.source.kind(), index + 1);
        let count = match spec.source {
            SourceSpec::Random { .. } => Some(spec.count.unwrap_or(1)),
            _ => spec.count,
        };

        let source = match spec.source {
            SourceSpec::Messages { messages } => Source::Messages(messages),
            SourceSpec::Texts { texts } | SourceSpec::Random { texts } => Source::Texts(texts),
            SourceSpec::Status => Source::Status,
            SourceSpec::Pause { width } => Source::Pause(width.unwrap_or(DEFAULT_PAUSE_WIDTH)),
            SourceSpec::Lines { path } => Source::Lines(path),
            SourceSpec::Command {
                command,
                cache,
                timeout,
            } => {
                if command.is_empty() {
                    return Err(format!("{}: command must not be empty", label));
                }
                Source::Command {
                    argv: command,
                    cache_for: cache.map(|d| d.0),
                    timeout: timeout.map(|d| d.0).unwrap_or(DEFAULT_COMMAND_TIMEOUT),
                    cached: None,
                }
            }
            SourceSpec::Pool {
                size,
                max_age,
                fill,
                fillers,
            } => {
                let size = size.unwrap_or(DEFAULT_POOL_SIZE);
                if size == 0 {
                    return Err(format!("{}: pool size must be at least 1", label));
                }
                let max_age = max_age.map(|d| d.0).unwrap_or(DEFAULT_MAX_AGE);
                Source::Pool {
                    pool: MessagePool::new(size, max_age),
                    fill,
                    fillers,
                }
            }
            SourceSpec::Weekend => Source::Weekend,
        };

        Ok(Self {
            label,
            source,
            style,
            pause_mode: spec.mode,
            count,
            interleave: spec.interleave_pauses,
        })
    }

    /// `kind#position`, used in logs
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_pool(&self) -> bool {
        matches!(self.source, Source::Pool { .. })
    }

    /// Messages this section contributes right now
    pub async fn generate(
        &mut self,
        ctx: &mut ModuleContext<'_>,
        rng: &mut StdRng,
    ) -> Result<Vec<Message>, ModuleError> {
        let style = self.style;
        let mut messages = match &mut self.source {
            Source::Messages(messages) => clean(messages.clone()),
            Source::Texts(texts) => {
                clean(texts.iter().map(|t| style.message(t.as_str())).collect())
            }
            Source::Status => {
                let text = format!("Status {}", clock(&ctx.now));
                vec![Message::new(text)
                    .with_mode(Mode::Hold)
                    .with_speed(Speed::Speed1)]
            }
            Source::Pause(width) => {
                vec![pause(*width, self.pause_mode.unwrap_or(Mode::Hold))]
            }
            Source::Lines(path) => {
                let contents = tokio::fs::read_to_string(&*path).await.map_err(|e| {
                    ModuleError::Section {
                        section: self.label.clone(),
                        message: format!("cannot read '{}': {}", path.display(), e),
                    }
                })?;
                clean(
                    non_empty_lines(&contents)
                        .map(|line| style.message(line))
                        .collect(),
                )
            }
            Source::Command {
                argv,
                cache_for,
                timeout,
                cached,
            } => {
                let fresh = match (cached.as_ref(), *cache_for) {
                    (Some((at, lines)), Some(ttl)) if at.elapsed() < ttl => Some(lines.clone()),
                    _ => None,
                };
                let lines = match fresh {
                    Some(lines) => {
                        debug!("{} cache hit", self.label);
                        lines
                    }
                    None => {
                        debug!("{} cache miss", self.label);
                        let lines = run_command(&self.label, argv, *timeout).await?;
                        *cached = Some((Instant::now(), lines.clone()));
                        lines
                    }
                };
                clean(lines.into_iter().map(|line| style.message(line)).collect())
            }
            Source::Pool {
                pool,
                fill,
                fillers,
            } => {
                let incoming = ctx.messages.drain();
                let mut pooled = clean(pool.refresh(incoming, ctx.now));
                if pooled.len() < *fill {
                    let gap = *fill - pooled.len();
                    let extra: Vec<Message> = fillers
                        .choose_multiple(rng, gap)
                        .map(|t| style.message(t.as_str()))
                        .collect();
                    pooled.extend(clean(extra));
                }
                pooled
            }
            Source::Weekend => {
                let day = match ctx.now.weekday() {
                    Weekday::Sat => Some("SATURDAY"),
                    Weekday::Sun => Some("SUNDAY"),
                    _ => None,
                };
                day.map(|d| style.message(format!("It's {}! What are you doing here?!", d)))
                    .into_iter()
                    .collect()
            }
        };

        if let Some(count) = self.count {
            messages = messages.choose_multiple(rng, count).cloned().collect();
        }

        if self.interleave {
            messages = interleave_pauses(messages);
        }

        Ok(messages)
    }
}

impl SourceSpec {
    fn kind(&self) -> &'static str {
        match self {
            SourceSpec::Messages { .. } => "messages",
            SourceSpec::Texts { .. } => "texts",
            SourceSpec::Random { .. } => "random",
            SourceSpec::Status => "status",
            SourceSpec::Pause { .. } => "pause",
            SourceSpec::Lines { .. } => "lines",
            SourceSpec::Command { .. } => "command",
            SourceSpec::Pool { .. } => "pool",
            SourceSpec::Weekend => "weekend",
        }
    }
}

/// Normalize text and drop what the sign cannot show.
fn clean(messages: Vec<Message>) -> Vec<Message> {
    messages
        .into_iter()
        .map(|mut m| {
            m.text = normalize(&m.text);
            m
        })
        .filter(|m| {
            let keep = is_displayable(m);
            if !keep {
                info!("Filtering out undisplayable message: {:?}", m.text);
            }
            keep
        })
        .collect()
}

/// "3:45pm"
fn clock(now: &chrono::DateTime<chrono::Local>) -> String {
    now.format("%-I:%M%P").to_string()
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

async fn run_command(
    label: &str,
    argv: &[String],
    timeout: Duration,
) -> Result<Vec<String>, ModuleError> {
    let section_error = |message: String| ModuleError::Section {
        section: label.to_string(),
        message,
    };

    let mut command = tokio::process::Command::new(&argv[0]);
    command.args(&argv[1..]).kill_on_drop(true);

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| section_error(format!("'{}' timed out after {:?}", argv[0], timeout)))?
        .map_err(|e| section_error(format!("cannot run '{}': {}", argv[0], e)))?;

    if !output.status.success() {
        return Err(section_error(format!(
            "'{}' exited with {}",
            argv[0], output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(non_empty_lines(&stdout).map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use chrono::{Local, TimeZone};
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn section(toml_src: &str) -> Section {
        let spec: SectionSpec = toml::from_str(toml_src).unwrap();
        Section::from_spec(0, spec, &Style::default()).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn texts(messages: &[Message]) -> Vec<String> {
        messages.iter().map(|m| m.text.clone()).collect()
    }

    #[tokio::test]
    async fn test_texts_section_uses_style() {
        let mut s = section("kind = \"texts\"\ntexts = [\"a\", \"b\"]\ncolor = \"GREEN\"");
        let (_h, _s, mut msgs) = queue::channel();
        let mut ctx = ModuleContext::new(&mut msgs);

        let out = s.generate(&mut ctx, &mut rng()).await.unwrap();
        assert_eq!(texts(&out), vec!["a", "b"]);
        assert_eq!(out[0].color, Some(Color::Green));
        assert_eq!(out[0].mode, Some(Mode::Rotate));
        assert_eq!(out[0].speed, Some(Speed::Speed1));
    }

    #[tokio::test]
    async fn test_messages_section_filters_and_normalizes() {
        let long = "x".repeat(200);
        let src = format!(
            "kind = \"messages\"\n\
             messages = [{{ text = \"It\u{2019}s ok\", mode = \"HOLD\" }}, {{ text = \"{}\" }}]",
            long
        );
        let mut s = section(&src);
        let (_h, _s, mut msgs) = queue::channel();
        let mut ctx = ModuleContext::new(&mut msgs);

        let out = s.generate(&mut ctx, &mut rng()).await.unwrap();
        assert_eq!(texts(&out), vec!["It's ok"]);
        assert_eq!(out[0].mode, Some(Mode::Hold));
        assert_eq!(out[0].color, None);
    }

    #[tokio::test]
    async fn test_status_section_shows_clock() {
        let mut s = section("kind = \"status\"");
        let (_h, _s, mut msgs) = queue::channel();
        let now = Local.with_ymd_and_hms(2024, 1, 8, 15, 45, 0).unwrap();
        let mut ctx = ModuleContext::at(&mut msgs, now);

        let out = s.generate(&mut ctx, &mut rng()).await.unwrap();
        assert_eq!(texts(&out), vec!["Status 3:45pm"]);
        assert_eq!(out[0].mode, Some(Mode::Hold));
    }

    #[tokio::test]
    async fn test_pause_section() {
        let mut s = section("kind = \"pause\"\nwidth = 4");
        let (_h, _s, mut msgs) = queue::channel();
        let mut ctx = ModuleContext::new(&mut msgs);

        let out = s.generate(&mut ctx, &mut rng()).await.unwrap();
        assert_eq!(texts(&out), vec!["    "]);
        assert_eq!(out[0].mode, Some(Mode::Hold));
    }

    #[tokio::test]
    async fn test_count_and_interleave() {
        let mut s = section(
            "kind = \"texts\"\ntexts = [\"a\", \"b\", \"c\", \"d\"]\ncount = 2\n\
             interleave_pauses = true",
        );
        let (_h, _s, mut msgs) = queue::channel();
        let mut ctx = ModuleContext::new(&mut msgs);

        let out = s.generate(&mut ctx, &mut rng()).await.unwrap();
        assert_eq!(out.len(), 4);
        assert!(out[1].text.trim().is_empty());
        assert!(out[3].text.trim().is_empty());
        assert_ne!(out[0].text, out[2].text);
    }

    #[tokio::test]
    async fn test_pool_drains_queue_and_fills() {
        let mut s = section(
            "kind = \"pool\"\nsize = 2\nfill = 3\nfillers = [\"filler one\", \"filler two\"]",
        );
        let (handle, _s, mut msgs) = queue::channel();
        handle.enqueue_message(Message::new("from web")).unwrap();
        let mut ctx = ModuleContext::new(&mut msgs);

        let out = s.generate(&mut ctx, &mut rng()).await.unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].text, "from web");
        assert!(out[1..].iter().all(|m| m.text.starts_with("filler")));
    }

    #[tokio::test]
    async fn test_weekend_section() {
        let mut s = section("kind = \"weekend\"");
        let (_h, _s, mut msgs) = queue::channel();

        let saturday = Local.with_ymd_and_hms(2024, 1, 6, 12, 0, 0).unwrap();
        let mut ctx = ModuleContext::at(&mut msgs, saturday);
        let out = s.generate(&mut ctx, &mut rng()).await.unwrap();
        assert_eq!(texts(&out), vec!["It's SATURDAY! What are you doing here?!"]);

        let monday = Local.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap();
        let mut ctx = ModuleContext::at(&mut msgs, monday);
        assert!(s.generate(&mut ctx, &mut rng()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lines_section_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quips.txt");
        std::fs::write(&path, "first quip\n\n  second quip  \n").unwrap();

        let mut s = section(&format!("kind = \"lines\"\npath = {:?}", path.display().to_string()));
        let (_h, _s, mut msgs) = queue::channel();
        let mut ctx = ModuleContext::new(&mut msgs);

        let out = s.generate(&mut ctx, &mut rng()).await.unwrap();
        assert_eq!(texts(&out), vec!["first quip", "second quip"]);
    }

    #[tokio::test]
    async fn test_lines_section_missing_file_errors() {
        let mut s = section("kind = \"lines\"\npath = \"/nonexistent/simplesign/quips.txt\"");
        let (_h, _s, mut msgs) = queue::channel();
        let mut ctx = ModuleContext::new(&mut msgs);

        let err = s.generate(&mut ctx, &mut rng()).await.unwrap_err();
        assert!(matches!(err, ModuleError::Section { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_section_runs_and_caches() {
        let dir = TempDir::new().unwrap();
        let counter = dir.path().join("count");
        let script = format!("echo run >> {}; echo Buildbot OK.", counter.display());

        let src = format!(
            "kind = \"command\"\ncommand = [\"sh\", \"-c\", {:?}]\ncache = \"1h\"",
            script
        );
        let mut s = section(&src);
        let (_h, _s, mut msgs) = queue::channel();
        let mut ctx = ModuleContext::new(&mut msgs);

        let first = s.generate(&mut ctx, &mut rng()).await.unwrap();
        let second = s.generate(&mut ctx, &mut rng()).await.unwrap();

        assert_eq!(texts(&first), vec!["Buildbot OK."]);
        assert_eq!(first, second);
        let runs = std::fs::read_to_string(&counter).unwrap();
        assert_eq!(runs.lines().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_section_failure() {
        let mut s = section("kind = \"command\"\ncommand = [\"sh\", \"-c\", \"exit 3\"]");
        let (_h, _s, mut msgs) = queue::channel();
        let mut ctx = ModuleContext::new(&mut msgs);

        assert!(s.generate(&mut ctx, &mut rng()).await.is_err());
    }

    #[test]
    fn test_invalid_sections_rejected() {
        let spec: SectionSpec = toml::from_str("kind = \"command\"\ncommand = []").unwrap();
        assert!(Section::from_spec(0, spec, &Style::default()).is_err());

        let spec: SectionSpec = toml::from_str("kind = \"pool\"\nsize = 0").unwrap();
        assert!(Section::from_spec(0, spec, &Style::default()).is_err());

        assert!(toml::from_str::<SectionSpec>("kind = \"teleport\"").is_err());
    }

    #[tokio::test]
    async fn test_random_shows_one_by_default() {
        let mut s = section("kind = \"random\"\ntexts = [\"x\", \"y\", \"z\"]");
        let (_h, _s, mut msgs) = queue::channel();
        let mut ctx = ModuleContext::new(&mut msgs);

        let out = s.generate(&mut ctx, &mut rng()).await.unwrap();
        assert_eq!(out.len(), 1);
        assert!(["x", "y", "z"].contains(&out[0].text.as_str()));
        assert_eq!(s.label(), "random#1");
    }

    #[tokio::test]
    async fn test_random_honors_count() {
        let mut s = section("kind = \"random\"\ntexts = [\"x\", \"y\", \"z\"]\ncount = 2");
        let (_h, _s, mut msgs) = queue::channel();
        let mut ctx = ModuleContext::new(&mut msgs);

        let out = s.generate(&mut ctx, &mut rng()).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_ne!(out[0].text, out[1].text);
    }
}
