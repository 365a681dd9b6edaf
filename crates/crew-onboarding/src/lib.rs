//! Interactive provider and model selection for crew project setup.
//!
//! Drives numbered terminal menus over the built-in provider table, the
//! remote provider catalog, and models discovered on a local Ollama daemon.

pub mod provider_selection;
pub mod selection_terminal;

pub use provider_selection::*;
pub use selection_terminal::*;
