use std::{
    cell::Cell,
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::Result;
use crew_core::Clock;
use crew_onboarding::{
    full_provider_list, provider_menu_choices, run_provider_selection, AbortReason, LineStyle,
    SelectionOutcome, SelectionTerminal, OTHER_PROVIDER_CHOICE,
};
use crew_provider::{
    build_provider_index, CommandRunner, LocalListingError, LocalModelCache, LocalModelDiscovery,
    NoopDownloadProgress, OllamaModelLister, ProviderCatalog, ProviderCatalogLoadOptions,
    LOCAL_MODELS_CACHE_TTL, LOCAL_PROVIDER, PROVIDER_CACHE_TTL,
};
use serde_json::json;
use tempfile::TempDir;

struct ScriptedTerminal {
    inputs: VecDeque<String>,
    lines: Vec<String>,
}

impl ScriptedTerminal {
    fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|input| input.to_string()).collect(),
            lines: Vec::new(),
        }
    }
}

impl SelectionTerminal for ScriptedTerminal {
    fn render_line(&mut self, _style: LineStyle, text: &str) -> Result<()> {
        self.lines.push(text.to_string());
        Ok(())
    }

    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.inputs.pop_front())
    }
}

/// Answers `list --json` and `list` from canned output; `None` simulates a failing command.
struct CannedOllama {
    structured: Option<&'static str>,
    table: Option<&'static str>,
    calls: Cell<usize>,
}

impl CommandRunner for CannedOllama {
    fn run(
        &self,
        executable: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<String, LocalListingError> {
        self.calls.set(self.calls.get() + 1);
        let canned = if args.contains(&"--json") {
            self.structured
        } else {
            self.table
        };
        canned
            .map(str::to_string)
            .ok_or_else(|| LocalListingError::Exit {
                command: format!("{executable} {}", args.join(" ")),
                status: "1".to_string(),
                stderr: "daemon not running".to_string(),
            })
    }
}

struct SteppingClock {
    now: Cell<SystemTime>,
}

impl SteppingClock {
    fn starting_now() -> Self {
        Self {
            now: Cell::new(SystemTime::now()),
        }
    }

    fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> SystemTime {
        self.now.get()
    }
}

struct Workspace {
    _dir: TempDir,
    cache_path: PathBuf,
}

impl Workspace {
    fn with_cached_catalog() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache_path = dir.path().join(".crewai").join("provider_cache.json");
        fs::create_dir_all(cache_path.parent().expect("cache dir")).expect("create cache dir");
        fs::write(&cache_path, sample_catalog_document().to_string()).expect("seed cache");
        Self {
            _dir: dir,
            cache_path,
        }
    }

    fn options(&self) -> ProviderCatalogLoadOptions {
        ProviderCatalogLoadOptions {
            catalog_url: "http://127.0.0.1:9/catalog.json".to_string(),
            request_timeout_ms: 2_000,
            ..ProviderCatalogLoadOptions::with_cache_path(self.cache_path.clone())
        }
    }
}

fn sample_catalog_document() -> serde_json::Value {
    json!({
        "gpt-4o": {"litellm_provider": "openai"},
        "together_ai/mistralai/Mixtral-8x22B": {"litellm_provider": "together_ai"},
        "together_ai/meta-llama/Llama-3-70b": {"litellm_provider": "together_ai"},
        "custom-endpoint": {"litellm_provider": "https://proxy.internal"}
    })
}

fn menu_position(choices: &[String], wanted: &str) -> String {
    let position = choices
        .iter()
        .position(|choice| choice == wanted)
        .expect("menu entry present");
    (position + 1).to_string()
}

fn discovery<'c>(
    runner: CannedOllama,
    clock: &'c SteppingClock,
) -> LocalModelDiscovery<CannedOllama, &'c SteppingClock> {
    LocalModelDiscovery::new(
        OllamaModelLister::new(runner, "ollama", Duration::from_secs(5)),
        LocalModelCache::new(LOCAL_MODELS_CACHE_TTL),
        clock,
    )
}

fn run(
    workspace: &Workspace,
    clock: &SteppingClock,
    terminal: &mut ScriptedTerminal,
    local: &mut LocalModelDiscovery<CannedOllama, &SteppingClock>,
) -> SelectionOutcome {
    run_provider_selection(
        &workspace.options(),
        clock,
        &mut NoopDownloadProgress,
        terminal,
        local,
    )
    .expect("selection run")
}

fn cache_contents(path: &Path) -> String {
    fs::read_to_string(path).expect("read cache")
}

#[test]
fn integration_other_escape_selects_catalog_provider_model() {
    let workspace = Workspace::with_cached_catalog();
    let clock = SteppingClock::starting_now();
    let catalog = ProviderCatalog::from_value(sample_catalog_document()).expect("catalog");
    let providers = full_provider_list(&build_provider_index(&catalog));
    let other = menu_position(&provider_menu_choices(), OTHER_PROVIDER_CHOICE);
    let together = menu_position(&providers, "together_ai");
    let mut terminal = ScriptedTerminal::new(&[other.as_str(), together.as_str(), "2"]);
    let mut local = discovery(
        CannedOllama {
            structured: None,
            table: None,
            calls: Cell::new(0),
        },
        &clock,
    );

    let outcome = run(&workspace, &clock, &mut terminal, &mut local);

    assert_eq!(
        outcome.into_pair(),
        (
            Some("together_ai".to_string()),
            Some("together_ai/meta-llama/Llama-3-70b".to_string())
        )
    );
    assert!(!providers.iter().any(|provider| provider.contains("http")));
    assert_eq!(local.lister().runner().calls.get(), 0);
}

#[test]
fn integration_local_listing_is_reused_across_wizard_runs_until_ttl_expires() {
    let workspace = Workspace::with_cached_catalog();
    let clock = SteppingClock::starting_now();
    let ollama = menu_position(&provider_menu_choices(), LOCAL_PROVIDER);
    let mut local = discovery(
        CannedOllama {
            structured: Some(r#"[{"name": "llama3"}, {"name": "ollama/qwen2:7b"}]"#),
            table: None,
            calls: Cell::new(0),
        },
        &clock,
    );

    let mut first = ScriptedTerminal::new(&[ollama.as_str(), "1"]);
    let first_outcome = run(&workspace, &clock, &mut first, &mut local);
    clock.advance(Duration::from_secs(30));
    let mut second = ScriptedTerminal::new(&[ollama.as_str(), "2"]);
    let second_outcome = run(&workspace, &clock, &mut second, &mut local);

    assert_eq!(
        first_outcome,
        SelectionOutcome::Selected {
            provider: "ollama".to_string(),
            model: "ollama/llama3".to_string(),
        }
    );
    assert_eq!(
        second_outcome,
        SelectionOutcome::Selected {
            provider: "ollama".to_string(),
            model: "ollama/qwen2:7b".to_string(),
        }
    );
    assert_eq!(local.lister().runner().calls.get(), 1);

    clock.advance(LOCAL_MODELS_CACHE_TTL);
    let mut third = ScriptedTerminal::new(&[ollama.as_str(), "q"]);
    let third_outcome = run(&workspace, &clock, &mut third, &mut local);
    assert_eq!(third_outcome, SelectionOutcome::Aborted(AbortReason::UserQuit));
    assert_eq!(local.lister().runner().calls.get(), 2);
}

#[test]
fn integration_plain_table_fallback_feeds_model_menu() {
    let workspace = Workspace::with_cached_catalog();
    let clock = SteppingClock::starting_now();
    let ollama = menu_position(&provider_menu_choices(), LOCAL_PROVIDER);
    let mut local = discovery(
        CannedOllama {
            structured: None,
            table: Some(
                "NAME              ID              SIZE      MODIFIED\n\
                 phi3:mini         4f2222927938    2.2 GB    5 days ago\n\
                 \n\
                 gemma2:9b         ff02c3702f32    5.4 GB    2 weeks ago\n",
            ),
            calls: Cell::new(0),
        },
        &clock,
    );
    let mut terminal = ScriptedTerminal::new(&[ollama.as_str(), "2"]);

    let outcome = run(&workspace, &clock, &mut terminal, &mut local);

    assert_eq!(
        outcome.into_pair(),
        (Some("ollama".to_string()), Some("ollama/gemma2:9b".to_string()))
    );
    assert!(terminal.lines.contains(&"1. ollama/phi3:mini".to_string()));
    assert_eq!(local.lister().runner().calls.get(), 2);
}

#[test]
fn integration_expired_cache_with_unreachable_catalog_aborts_and_keeps_file() {
    let workspace = Workspace::with_cached_catalog();
    let clock = SteppingClock::starting_now();
    clock.advance(PROVIDER_CACHE_TTL + Duration::from_secs(60));
    let before = cache_contents(&workspace.cache_path);
    let mut terminal = ScriptedTerminal::new(&["1", "1"]);
    let mut local = discovery(
        CannedOllama {
            structured: None,
            table: None,
            calls: Cell::new(0),
        },
        &clock,
    );

    let outcome = run(&workspace, &clock, &mut terminal, &mut local);

    assert_eq!(
        outcome,
        SelectionOutcome::Aborted(AbortReason::CatalogUnavailable)
    );
    assert_eq!(terminal.lines.len(), 2);
    assert_eq!(
        terminal.lines[0],
        "Cache expired or not found. Fetching provider data from the web..."
    );
    assert!(terminal.lines[1].starts_with("Error fetching provider data: "));
    assert_eq!(cache_contents(&workspace.cache_path), before);
}
