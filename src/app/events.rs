//! Defines the events sent from the application layer to the display.

use super::view_model::UiState;

/// Events sent to whatever shell displays the application.
#[derive(Debug)]
pub enum UserEvent {
    /// A complete state update to re-render the display. `is_scanning` doubles
    /// as the busy/ready signal around a scan.
    StateUpdate(Box<UiState>),
    /// The generated prompt, possibly followed by a clipboard failure notice.
    ShowGeneratedContent(String),
    /// An error message to be displayed to the user.
    ShowError(String),
}
