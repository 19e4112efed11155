//! An abstraction layer for native file dialogs to enable testing.

use std::path::PathBuf;

/// Defines a common interface for file and folder selection dialogs.
/// This allows for a mock implementation during tests, avoiding the need
/// to interact with actual OS dialog windows.
///
/// Every method returns `None` when the user cancels.
pub trait DialogService: Send + Sync {
    /// Opens a dialog to select the project root folder.
    fn pick_directory(&self) -> Option<PathBuf>;

    /// Opens a dialog to select the prompt template file.
    fn pick_template(&self) -> Option<PathBuf>;

    /// Opens a dialog to select the context file.
    fn pick_context(&self) -> Option<PathBuf>;
}

/// The production implementation that uses the `rfd` crate to show native OS dialogs.
pub struct NativeDialogService;

impl DialogService for NativeDialogService {
    fn pick_directory(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Select Root Folder")
            .pick_folder()
    }

    fn pick_template(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Select Template File")
            .add_filter("Text Files", &["txt"])
            .pick_file()
    }

    fn pick_context(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Select Context File")
            .add_filter("Text Files", &["txt"])
            .pick_file()
    }
}
