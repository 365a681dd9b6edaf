//! Provider and model selection menus.
//!
//! The wizard walks three states: choose a provider (with an `other` escape
//! into the full provider list), choose a model for that provider, finish.
//! Every failure that is not a terminal I/O error resolves into a
//! [`SelectionOutcome`] rather than an error.

use std::collections::BTreeSet;
use std::fmt;

use anyhow::Result;
use crew_core::Clock;
use crew_provider::{
    build_provider_index, is_predefined_provider, load_provider_catalog,
    normalize_local_model_name, predefined_models, CatalogNotice, CatalogStatusSink,
    DownloadProgress, LocalModelSource, ProviderCatalogLoadOptions, ProviderIndex,
    LOCAL_PROVIDER, PREDEFINED_PROVIDERS,
};
use serde::Serialize;

use crate::selection_terminal::{LineStyle, SelectionTerminal};

pub const QUIT_SENTINEL: &str = "q";
pub const OTHER_PROVIDER_CHOICE: &str = "other";

const SELECTION_PROMPT: &str = "Enter the number of your choice or 'q' to quit";
const PROVIDER_MENU_TITLE: &str = "Select a provider to set up:";
const FULL_PROVIDER_MENU_TITLE: &str = "Select a provider from the full list:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
/// Why the wizard finished without a selection.
pub enum AbortReason {
    UserQuit,
    CatalogUnavailable,
    NoModels { provider: String },
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserQuit => "user_quit",
            Self::CatalogUnavailable => "catalog_unavailable",
            Self::NoModels { .. } => "no_models",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserQuit => write!(f, "user quit"),
            Self::CatalogUnavailable => write!(f, "provider data unavailable"),
            Self::NoModels { provider } => {
                write!(f, "no models available for provider '{provider}'")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected { provider: String, model: String },
    Aborted(AbortReason),
}

impl SelectionOutcome {
    /// `(provider, model)` with `None` for whatever was not chosen.
    pub fn into_pair(self) -> (Option<String>, Option<String>) {
        match self {
            Self::Selected { provider, model } => (Some(provider), Some(model)),
            Self::Aborted(AbortReason::NoModels { provider }) => (Some(provider), None),
            Self::Aborted(_) => (None, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState {
    ChooseProvider,
    ChooseFromFullList,
    ChooseModel { provider: String },
    Finished(SelectionOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuInput {
    Quit,
    /// Zero-based position in the menu.
    Choice(usize),
    Invalid,
}

/// Interprets one menu response against a menu of `choice_count` entries.
pub fn parse_menu_input(raw: &str, choice_count: usize) -> MenuInput {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case(QUIT_SENTINEL) {
        return MenuInput::Quit;
    }
    match trimmed.parse::<usize>() {
        Ok(position) if (1..=choice_count).contains(&position) => MenuInput::Choice(position - 1),
        _ => MenuInput::Invalid,
    }
}

/// Renders a numbered menu and loops until a valid choice or quit.
/// End of input counts as quit.
pub fn select_choice<T>(terminal: &mut T, title: &str, choices: &[String]) -> Result<Option<String>>
where
    T: SelectionTerminal + ?Sized,
{
    if choices.is_empty() {
        tracing::debug!(title, "skipping empty selection menu");
        return Ok(None);
    }

    terminal.render_line(LineStyle::Menu, title)?;
    for (position, choice) in choices.iter().enumerate() {
        terminal.render_line(LineStyle::Menu, &format!("{}. {choice}", position + 1))?;
    }
    terminal.render_line(LineStyle::Menu, &format!("{QUIT_SENTINEL}. Quit"))?;

    loop {
        let Some(raw) = terminal.read_line(SELECTION_PROMPT)? else {
            return Ok(None);
        };
        match parse_menu_input(&raw, choices.len()) {
            MenuInput::Quit => return Ok(None),
            MenuInput::Choice(position) => return Ok(Some(choices[position].clone())),
            MenuInput::Invalid => terminal.render_line(
                LineStyle::Error,
                &format!(
                    "Invalid selection. Please select a number between 1 and {} or '{QUIT_SENTINEL}' to quit.",
                    choices.len()
                ),
            )?,
        }
    }
}

/// Predefined providers followed by the `other` escape.
pub fn provider_menu_choices() -> Vec<String> {
    PREDEFINED_PROVIDERS
        .iter()
        .copied()
        .chain(std::iter::once(OTHER_PROVIDER_CHOICE))
        .map(str::to_string)
        .collect()
}

/// Sorted, de-duplicated union of predefined and catalog providers.
pub fn full_provider_list(index: &ProviderIndex) -> Vec<String> {
    let mut providers = PREDEFINED_PROVIDERS
        .iter()
        .map(|provider| provider.to_lowercase())
        .collect::<BTreeSet<_>>();
    providers.extend(index.providers().map(str::to_lowercase));
    providers.into_iter().collect()
}

/// Models offered for `provider`.
///
/// The local provider asks `local_models` first and falls back to its static
/// list; every local name is normalized to carry the `ollama/` prefix.
pub fn available_models<L>(provider: &str, index: &ProviderIndex, local_models: &mut L) -> Vec<String>
where
    L: LocalModelSource + ?Sized,
{
    if provider == LOCAL_PROVIDER {
        let mut models = local_models.list_local_models();
        if models.is_empty() {
            tracing::debug!("no local models discovered; using built-in list");
            models = predefined_models(provider)
                .iter()
                .map(|model| model.to_string())
                .collect();
        }
        return models
            .iter()
            .map(|model| normalize_local_model_name(model))
            .collect();
    }
    if is_predefined_provider(provider) {
        return predefined_models(provider)
            .iter()
            .map(|model| model.to_string())
            .collect();
    }
    index.models_for(provider).to_vec()
}

fn capitalize_provider(provider: &str) -> String {
    let mut chars = provider.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub struct ProviderSelectionWizard<'a, T: ?Sized, L: ?Sized> {
    index: &'a ProviderIndex,
    terminal: &'a mut T,
    local_models: &'a mut L,
}

impl<'a, T, L> ProviderSelectionWizard<'a, T, L>
where
    T: SelectionTerminal + ?Sized,
    L: LocalModelSource + ?Sized,
{
    pub fn new(index: &'a ProviderIndex, terminal: &'a mut T, local_models: &'a mut L) -> Self {
        Self {
            index,
            terminal,
            local_models,
        }
    }

    pub fn run(&mut self) -> Result<SelectionOutcome> {
        self.run_from(SelectionState::ChooseProvider)
    }

    pub fn run_from(&mut self, mut state: SelectionState) -> Result<SelectionOutcome> {
        loop {
            state = match state {
                SelectionState::Finished(outcome) => {
                    tracing::debug!(?outcome, "provider selection finished");
                    return Ok(outcome);
                }
                pending => self.advance(pending)?,
            };
        }
    }

    fn advance(&mut self, state: SelectionState) -> Result<SelectionState> {
        let next = match state {
            SelectionState::ChooseProvider => {
                match select_choice(&mut *self.terminal, PROVIDER_MENU_TITLE, &provider_menu_choices())? {
                    None => SelectionState::Finished(SelectionOutcome::Aborted(AbortReason::UserQuit)),
                    Some(choice) if choice == OTHER_PROVIDER_CHOICE => {
                        SelectionState::ChooseFromFullList
                    }
                    Some(provider) => SelectionState::ChooseModel { provider },
                }
            }
            SelectionState::ChooseFromFullList => {
                let providers = full_provider_list(self.index);
                match select_choice(&mut *self.terminal, FULL_PROVIDER_MENU_TITLE, &providers)? {
                    None => SelectionState::Finished(SelectionOutcome::Aborted(AbortReason::UserQuit)),
                    Some(provider) => SelectionState::ChooseModel {
                        provider: provider.to_lowercase(),
                    },
                }
            }
            SelectionState::ChooseModel { provider } => self.choose_model(provider)?,
            finished @ SelectionState::Finished(_) => finished,
        };
        Ok(next)
    }

    fn choose_model(&mut self, provider: String) -> Result<SelectionState> {
        let models = available_models(&provider, self.index, &mut *self.local_models);
        if models.is_empty() {
            self.terminal.render_line(
                LineStyle::Error,
                &format!("No models available for provider '{provider}'."),
            )?;
            return Ok(SelectionState::Finished(SelectionOutcome::Aborted(
                AbortReason::NoModels { provider },
            )));
        }

        let title = format!("Select a model to use for {}:", capitalize_provider(&provider));
        let outcome = match select_choice(&mut *self.terminal, &title, &models)? {
            Some(model) => SelectionOutcome::Selected { provider, model },
            None => SelectionOutcome::Aborted(AbortReason::UserQuit),
        };
        Ok(SelectionState::Finished(outcome))
    }
}

fn catalog_notice_style(notice: &CatalogNotice) -> LineStyle {
    match notice {
        CatalogNotice::CacheCorrupted => LineStyle::Warning,
        CatalogNotice::CacheUnavailable => LineStyle::Info,
        CatalogNotice::InvalidCatalogJson | CatalogNotice::FetchFailed(_) => LineStyle::Error,
    }
}

/// Forwards catalog notices to the selection terminal, keeping the first write failure.
struct TerminalCatalogStatus<'a, T: ?Sized> {
    terminal: &'a mut T,
    write_error: Option<anyhow::Error>,
}

impl<T: SelectionTerminal + ?Sized> CatalogStatusSink for TerminalCatalogStatus<'_, T> {
    fn notify(&mut self, notice: &CatalogNotice) {
        if self.write_error.is_some() {
            return;
        }
        if let Err(error) = self
            .terminal
            .render_line(catalog_notice_style(notice), &notice.message())
        {
            self.write_error = Some(error);
        }
    }
}

/// Loads the catalog once, then runs the wizard over it.
///
/// A catalog that cannot be loaded, or that yields no usable provider, aborts
/// with [`AbortReason::CatalogUnavailable`] before any menu is shown.
pub fn run_provider_selection<T, L>(
    options: &ProviderCatalogLoadOptions,
    clock: &dyn Clock,
    progress: &mut dyn DownloadProgress,
    terminal: &mut T,
    local_models: &mut L,
) -> Result<SelectionOutcome>
where
    T: SelectionTerminal + ?Sized,
    L: LocalModelSource + ?Sized,
{
    let mut status = TerminalCatalogStatus {
        terminal: &mut *terminal,
        write_error: None,
    };
    let catalog = load_provider_catalog(options, clock, progress, &mut status);
    if let Some(error) = status.write_error {
        return Err(error);
    }
    let Some(catalog) = catalog else {
        return Ok(SelectionOutcome::Aborted(AbortReason::CatalogUnavailable));
    };
    let index = build_provider_index(&catalog);
    if index.is_empty() {
        tracing::warn!(
            entries = catalog.len(),
            "provider catalog contains no usable provider tags"
        );
        return Ok(SelectionOutcome::Aborted(AbortReason::CatalogUnavailable));
    }
    ProviderSelectionWizard::new(&index, terminal, local_models).run()
}
