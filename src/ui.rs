//! Presentation sinks driven by the viewer.
//!
//! The viewer never draws UI itself; it tells a [`ViewerUi`] what the card
//! list, loading text and info panel should show. [`ConsoleUi`] logs every
//! change and keeps the latest state for inspection.

use std::fmt;

use tracing::{error, info};

use crate::catalog::ArtifactCard;

/// Text shown by the loading indicator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoadingStatus {
    Hidden,
    Loading,
    /// Completed fraction in `[0, 1]`.
    Progress(f32),
    Failed,
    NoArtifacts,
}

impl LoadingStatus {
    pub fn is_visible(&self) -> bool {
        !matches!(self, LoadingStatus::Hidden)
    }
}

impl fmt::Display for LoadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadingStatus::Hidden => Ok(()),
            LoadingStatus::Loading => write!(f, "Loading Model..."),
            LoadingStatus::Progress(fraction) => {
                write!(f, "Loading Model: {}%", (fraction * 100.0).round() as u32)
            }
            LoadingStatus::Failed => write!(f, "Error loading model!"),
            LoadingStatus::NoArtifacts => write!(f, "No artifacts defined."),
        }
    }
}

/// Content of the info panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoPanel {
    pub title: String,
    pub content: String,
}

/// The UI surface the viewer reports to.
pub trait ViewerUi {
    /// The selectable artifact list, in catalog order.
    fn show_cards(&mut self, cards: &[ArtifactCard]);
    /// Highlight one card, or none.
    fn set_active_card(&mut self, id: Option<&str>);
    fn set_loading(&mut self, status: LoadingStatus);
    fn show_info(&mut self, title: &str, content: &str);
    fn hide_info(&mut self);
    /// A blocking, user-visible error message.
    fn alert(&mut self, message: &str);
}

/// Logs every UI change and keeps the current state.
#[derive(Clone, Debug, Default)]
pub struct ConsoleUi {
    pub cards: Vec<ArtifactCard>,
    pub active_card: Option<String>,
    pub loading: Option<LoadingStatus>,
    pub info: Option<InfoPanel>,
    pub alerts: Vec<String>,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// The loading text currently displayed, if any.
    pub fn loading_text(&self) -> Option<String> {
        self.loading
            .filter(LoadingStatus::is_visible)
            .map(|s| s.to_string())
    }
}

impl ViewerUi for ConsoleUi {
    fn show_cards(&mut self, cards: &[ArtifactCard]) {
        info!(count = cards.len(), "artifact cards populated");
        self.cards = cards.to_vec();
    }

    fn set_active_card(&mut self, id: Option<&str>) {
        self.active_card = id.map(str::to_string);
    }

    fn set_loading(&mut self, status: LoadingStatus) {
        if status.is_visible() && self.loading != Some(status) {
            info!(status = %status, "loading indicator");
        }
        self.loading = Some(status);
    }

    fn show_info(&mut self, title: &str, content: &str) {
        info!(title, content, "info panel");
        self.info = Some(InfoPanel {
            title: title.to_string(),
            content: content.to_string(),
        });
    }

    fn hide_info(&mut self) {
        self.info = None;
    }

    fn alert(&mut self, message: &str) {
        error!("{}", message);
        self.alerts.push(message.to_string());
    }
}
