//! Local Ollama model discovery.
//!
//! Models are listed by running the daemon CLI through an ordered set of
//! listing strategies (structured JSON first, then the plain-text table). The
//! first strategy that succeeds wins. Results are memoized in an explicit
//! [`LocalModelCache`] so an interactive session does not respawn the CLI on
//! every menu redraw.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use crew_core::{elapsed_between, Clock, SystemClock};
use serde_json::Value;
use thiserror::Error;
use wait_timeout::ChildExt;

use crate::cli_executable::resolve_executable;

pub const DEFAULT_OLLAMA_EXECUTABLE: &str = "ollama";
pub const OLLAMA_LIST_TIMEOUT_MS: u64 = 5_000;
pub const LOCAL_MODELS_CACHE_TTL: Duration = Duration::from_secs(60);

const TABLE_HEADER_KEYWORDS: [&str; 3] = ["NAME", "ID", "SIZE"];

#[derive(Debug, Error)]
pub enum LocalListingError {
    #[error("executable '{0}' is not available")]
    MissingExecutable(String),
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed while waiting for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` timed out after {timeout_ms} ms")]
    Timeout { command: String, timeout_ms: u128 },
    #[error("`{command}` exited with status {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("unexpected output from `{command}`: {reason}")]
    MalformedOutput { command: String, reason: String },
}

/// Runs an external command and returns its stdout.
pub trait CommandRunner {
    fn run(
        &self,
        executable: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, LocalListingError>;
}

fn render_command(executable: &str, args: &[&str]) -> String {
    let mut parts = Vec::with_capacity(args.len().saturating_add(1));
    parts.push(executable.trim());
    parts.extend_from_slice(args);
    parts.join(" ")
}

fn spawn_with_text_file_busy_retry(
    command: &mut Command,
    rendered: &str,
) -> Result<Child, LocalListingError> {
    const MAX_TEXT_FILE_BUSY_RETRIES: u32 = 5;
    const TEXT_FILE_BUSY_ERRNO: i32 = 26;
    let mut attempt = 0;
    loop {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(error)
                if error.raw_os_error() == Some(TEXT_FILE_BUSY_ERRNO)
                    && attempt < MAX_TEXT_FILE_BUSY_RETRIES =>
            {
                attempt += 1;
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(source) => {
                return Err(LocalListingError::Spawn {
                    command: rendered.to_string(),
                    source,
                })
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
/// Spawns real processes and enforces the timeout with `wait-timeout`.
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run(
        &self,
        executable: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, LocalListingError> {
        let rendered = render_command(executable, args);
        let Some(program) = resolve_executable(executable) else {
            return Err(LocalListingError::MissingExecutable(
                executable.trim().to_string(),
            ));
        };

        let mut command = Command::new(program);
        command.args(args);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        let mut child = spawn_with_text_file_busy_retry(&mut command, &rendered)?;
        let stdout_reader = child.stdout.take().map(spawn_pipe_reader);
        let stderr_reader = child.stderr.take().map(spawn_pipe_reader);

        let waited = child.wait_timeout(timeout);
        let status = match waited {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                join_pipe_reader(stdout_reader);
                join_pipe_reader(stderr_reader);
                return Err(LocalListingError::Timeout {
                    command: rendered,
                    timeout_ms: timeout.as_millis(),
                });
            }
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(LocalListingError::Wait {
                    command: rendered,
                    source,
                });
            }
        };

        let stdout = join_pipe_reader(stdout_reader);
        let stderr = join_pipe_reader(stderr_reader);
        if !status.success() {
            let status = status
                .code()
                .map(|value| value.to_string())
                .unwrap_or_else(|| "terminated_by_signal".to_string());
            return Err(LocalListingError::Exit {
                command: rendered,
                status,
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Reads a child pipe to the end on its own thread.
fn spawn_pipe_reader<P>(mut pipe: P) -> Option<JoinHandle<Vec<u8>>>
where
    P: Read + Send + 'static,
{
    thread::Builder::new()
        .name("crew-ollama-pipe".to_string())
        .spawn(move || {
            let mut buffer = Vec::new();
            let _ = pipe.read_to_end(&mut buffer);
            buffer
        })
        .ok()
}

fn join_pipe_reader(reader: Option<Option<JoinHandle<Vec<u8>>>>) -> Vec<u8> {
    reader
        .flatten()
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One way of asking the daemon for its models.
pub enum ListingStrategy {
    /// `ollama list --json`
    StructuredJson,
    /// `ollama list`, parsed as a whitespace table.
    PlainTable,
}

pub const DEFAULT_LISTING_STRATEGIES: &[ListingStrategy] =
    &[ListingStrategy::StructuredJson, ListingStrategy::PlainTable];

impl ListingStrategy {
    pub fn name(self) -> &'static str {
        match self {
            Self::StructuredJson => "structured_json",
            Self::PlainTable => "plain_table",
        }
    }

    pub fn args(self) -> &'static [&'static str] {
        match self {
            Self::StructuredJson => &["list", "--json"],
            Self::PlainTable => &["list"],
        }
    }

    pub fn parse(self, stdout: &str) -> Result<Vec<String>, String> {
        match self {
            Self::StructuredJson => parse_structured_model_list(stdout),
            Self::PlainTable => Ok(parse_plain_model_table(stdout)),
        }
    }
}

/// Extracts `name` from each entry of a JSON array. Entries without a name are skipped.
pub fn parse_structured_model_list(stdout: &str) -> Result<Vec<String>, String> {
    let value = serde_json::from_str::<Value>(stdout.trim()).map_err(|error| error.to_string())?;
    let Value::Array(entries) = value else {
        return Err("expected a JSON array of models".to_string());
    };
    Ok(entries
        .iter()
        .filter_map(|entry| entry.get("name").and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}

/// First column of every non-blank, non-header row.
///
/// A row is a header when its upper-cased text contains `NAME`, `ID` or `SIZE`.
/// The match is a plain substring test, so a model whose name contains one of
/// those words is dropped as well.
pub fn parse_plain_model_table(stdout: &str) -> Vec<String> {
    stdout
        .trim()
        .lines()
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let upper = line.to_uppercase();
            !TABLE_HEADER_KEYWORDS
                .iter()
                .any(|keyword| upper.contains(keyword))
        })
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct OllamaModelLister<R> {
    runner: R,
    executable: String,
    timeout: Duration,
    strategies: Vec<ListingStrategy>,
}

impl<R: CommandRunner> OllamaModelLister<R> {
    pub fn new(runner: R, executable: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            executable: executable.into(),
            timeout,
            strategies: DEFAULT_LISTING_STRATEGIES.to_vec(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Tries each strategy in order. Returns an empty list when all of them fail.
    pub fn fetch_models(&self) -> Vec<String> {
        for strategy in &self.strategies {
            match self.run_strategy(*strategy) {
                Ok(models) => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        models = models.len(),
                        "listed local ollama models"
                    );
                    return models;
                }
                Err(error) => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        "local model listing failed: {error}"
                    );
                }
            }
        }
        Vec::new()
    }

    fn run_strategy(&self, strategy: ListingStrategy) -> Result<Vec<String>, LocalListingError> {
        let stdout = self
            .runner
            .run(&self.executable, strategy.args(), self.timeout)?;
        strategy
            .parse(&stdout)
            .map_err(|reason| LocalListingError::MalformedOutput {
                command: render_command(&self.executable, strategy.args()),
                reason,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Last listing result plus when it was taken.
pub struct LocalModelCache {
    ttl: Duration,
    last_fetch_time: Option<SystemTime>,
    cached_value: Vec<String>,
}

impl LocalModelCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            last_fetch_time: None,
            cached_value: Vec::new(),
        }
    }

    /// Cached models while they are non-empty and younger than the TTL.
    pub fn get(&self, now: SystemTime) -> Option<&[String]> {
        let fetched_at = self.last_fetch_time?;
        if self.cached_value.is_empty() || elapsed_between(fetched_at, now) >= self.ttl {
            return None;
        }
        Some(&self.cached_value)
    }

    pub fn store(&mut self, now: SystemTime, models: Vec<String>) {
        self.last_fetch_time = Some(now);
        self.cached_value = models;
    }

    pub fn get_or_refresh<F>(&mut self, now: SystemTime, fetch: F) -> Vec<String>
    where
        F: FnOnce() -> Vec<String>,
    {
        if let Some(models) = self.get(now) {
            return models.to_vec();
        }
        let models = fetch();
        self.store(now, models.clone());
        models
    }
}

impl Default for LocalModelCache {
    fn default() -> Self {
        Self::new(LOCAL_MODELS_CACHE_TTL)
    }
}

/// Anything that can enumerate models served locally.
pub trait LocalModelSource {
    fn list_local_models(&mut self) -> Vec<String>;
}

#[derive(Debug, Clone)]
/// Lister + cache + clock, built once per process and threaded through the wizard.
pub struct LocalModelDiscovery<R, C> {
    lister: OllamaModelLister<R>,
    cache: LocalModelCache,
    clock: C,
}

impl LocalModelDiscovery<ProcessCommandRunner, SystemClock> {
    pub fn system(executable: impl Into<String>, timeout_ms: u64, cache_ttl: Duration) -> Self {
        Self::new(
            OllamaModelLister::new(
                ProcessCommandRunner,
                executable,
                Duration::from_millis(timeout_ms.max(1)),
            ),
            LocalModelCache::new(cache_ttl),
            SystemClock,
        )
    }
}

impl<R: CommandRunner, C: Clock> LocalModelDiscovery<R, C> {
    pub fn new(lister: OllamaModelLister<R>, cache: LocalModelCache, clock: C) -> Self {
        Self {
            lister,
            cache,
            clock,
        }
    }

    pub fn lister(&self) -> &OllamaModelLister<R> {
        &self.lister
    }
}

impl<R: CommandRunner, C: Clock> LocalModelSource for LocalModelDiscovery<R, C> {
    fn list_local_models(&mut self) -> Vec<String> {
        let now = self.clock.now();
        let lister = &self.lister;
        self.cache.get_or_refresh(now, || lister.fetch_models())
    }
}
