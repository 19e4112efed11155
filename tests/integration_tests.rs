//! Integration tests for the defect prompt builder.
//!
//! These tests use an async-aware MPSC channel from `tokio::sync` to avoid
//! deadlocks between the test thread and the application's async tasks.

use defect_prompt_builder::app::{self, events::UserEvent, proxy::EventProxy, state::AppState};
use defect_prompt_builder::config::AppConfig;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tracing_test::traced_test;

/// Contains the test infrastructure.
mod helpers {
    use super::*;
    use defect_prompt_builder::app::clipboard::{ClipboardError, ClipboardSink};
    use defect_prompt_builder::app::file_dialog::DialogService;
    use std::fs;

    /// A test double for the display using a tokio MPSC channel.
    #[derive(Clone)]
    pub struct TestEventProxy {
        pub sender: mpsc::UnboundedSender<UserEvent>,
    }

    impl EventProxy for TestEventProxy {
        fn send_event(&self, event: UserEvent) {
            if let Err(e) = self.sender.send(event) {
                // Panic in a test if the receiver is dropped, as it indicates a test setup error.
                panic!("Test receiver dropped: {}", e);
            }
        }
    }

    /// A dialog where the user always presses "Cancel".
    pub struct CancellingDialog;

    impl DialogService for CancellingDialog {
        fn pick_directory(&self) -> Option<PathBuf> {
            None
        }
        fn pick_template(&self) -> Option<PathBuf> {
            None
        }
        fn pick_context(&self) -> Option<PathBuf> {
            None
        }
    }

    /// Records what was copied instead of touching the system clipboard.
    #[derive(Default)]
    pub struct RecordingClipboard {
        pub copied: Mutex<Vec<String>>,
    }

    impl ClipboardSink for RecordingClipboard {
        fn copy_text(&self, text: &str) -> Result<(), ClipboardError> {
            self.copied.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    /// `TestHarness` sets up a complete, isolated environment for each test case.
    pub struct TestHarness {
        pub state: Arc<Mutex<AppState>>,
        pub proxy: TestEventProxy,
        pub event_rx: mpsc::UnboundedReceiver<UserEvent>,
        pub root_path: PathBuf,
        pub temp_dir: TempDir,
    }

    impl TestHarness {
        /// Creates a new test harness whose project root is named `proj`.
        pub fn new(config: AppConfig) -> Self {
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let root_path = temp_dir.path().join("proj");
            fs::create_dir(&root_path).expect("Failed to create project dir");
            let (event_tx, event_rx) = mpsc::unbounded_channel();

            let state = AppState::new(config, Some(temp_dir.path().join("settings.json")));

            Self {
                state: Arc::new(Mutex::new(state)),
                proxy: TestEventProxy { sender: event_tx },
                event_rx,
                root_path,
                temp_dir,
            }
        }

        /// A configuration with no exclusions at all.
        pub fn clean_config() -> AppConfig {
            AppConfig {
                excluded_folders: HashSet::new(),
                excluded_extensions: HashSet::new(),
                ..AppConfig::default()
            }
        }

        /// Creates a file inside the project directory.
        pub fn create_file(&self, path: &str, content: &str) {
            let file_path = self.root_path.join(path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent dir");
            }
            fs::write(file_path, content).expect("Failed to write file");
        }

        /// Writes a file next to the project, outside the scanned root.
        pub fn create_outside_file(&self, name: &str, content: &str) -> PathBuf {
            let path = self.temp_dir.path().join(name);
            fs::write(&path, content).expect("Failed to write file");
            path
        }

        /// Discards queued events so a later wait only sees new ones.
        pub fn drain_events(&mut self) {
            while self.event_rx.try_recv().is_ok() {}
        }

        pub fn start_scan(&mut self) {
            self.drain_events();
            app::tasks::start_scan_on_path(
                self.root_path.clone(),
                self.proxy.clone(),
                self.state.clone(),
            );
        }

        /// Waits for the background scan to complete.
        pub async fn wait_for_scan_completion(&mut self) {
            loop {
                match tokio::time::timeout(Duration::from_secs(10), self.event_rx.recv()).await {
                    Ok(Some(UserEvent::StateUpdate(ui_state))) => {
                        if !ui_state.is_scanning {
                            return;
                        }
                    }
                    Ok(Some(UserEvent::ShowError(e))) => panic!("Scan failed: {}", e),
                    Ok(Some(_)) => { /* Ignore other events */ }
                    _ => panic!("Scan did not complete within timeout or channel closed"),
                }
            }
        }

        /// Waits for the generated prompt.
        pub async fn wait_for_generated_content(&mut self) -> String {
            loop {
                match tokio::time::timeout(Duration::from_secs(5), self.event_rx.recv()).await {
                    Ok(Some(UserEvent::ShowGeneratedContent(text))) => return text,
                    Ok(Some(UserEvent::ShowError(e))) => panic!("Generation failed: {}", e),
                    Ok(Some(_)) => {}
                    _ => panic!("No prompt was generated within timeout"),
                }
            }
        }

        /// Collects the names of the root's direct children.
        pub fn top_level_names(&self) -> Vec<String> {
            let state = self.state.lock().unwrap();
            let tree = state.tree.as_ref().expect("tree should be loaded");
            tree.children(tree.root())
                .iter()
                .map(|&id| tree.node(id).name.clone())
                .collect()
        }

        /// Collects the relative path of every node below the root.
        pub fn all_relative_paths(&self) -> HashSet<PathBuf> {
            let state = self.state.lock().unwrap();
            let tree = state.tree.as_ref().expect("tree should be loaded");
            tree.pre_order()
                .skip(1)
                .map(|id| tree.relative_path_of(id))
                .collect()
        }
    }
}

use helpers::{CancellingDialog, RecordingClipboard, TestHarness};

#[tokio::test]
async fn test_scan_excludes_configured_folder() {
    // --- ARRANGE ---
    let mut config = TestHarness::clean_config();
    config.excluded_folders.insert(".git".to_string());
    let mut harness = TestHarness::new(config);
    harness.create_file("a/x.txt", "x");
    harness.create_file("b.py", "print()");
    harness.create_file(".git/HEAD", "ref: refs/heads/main");

    // --- ACT ---
    harness.start_scan();
    harness.wait_for_scan_completion().await;

    // --- ASSERT ---
    assert_eq!(harness.top_level_names(), vec!["a", "b.py"]);
    let paths = harness.all_relative_paths();
    assert!(paths.iter().all(|p| !p.starts_with(".git")));
}

#[tokio::test]
async fn test_scan_excludes_extension_at_any_depth() {
    let mut config = TestHarness::clean_config();
    config.excluded_extensions.insert(".pyc".to_string());
    let mut harness = TestHarness::new(config);
    harness.create_file("m.py", "");
    harness.create_file("m.pyc", "");
    harness.create_file("pkg/deep/m.pyc", "");
    harness.create_file("pkg/deep/m.py", "");

    harness.start_scan();
    harness.wait_for_scan_completion().await;

    let paths = harness.all_relative_paths();
    assert!(paths.contains(Path::new("m.py")));
    assert!(paths.contains(Path::new("pkg/deep/m.py")));
    assert!(!paths.contains(Path::new("m.pyc")));
    assert!(!paths.contains(Path::new("pkg/deep/m.pyc")));
}

#[tokio::test]
async fn test_full_flow_produces_prompt_in_order() {
    // --- ARRANGE ---
    let mut harness = TestHarness::new(TestHarness::clean_config());
    harness.create_file("src/a.txt", "hello");
    harness.create_file("readme.md", "# Readme");
    let template = harness.create_outside_file("template.txt", "T");
    let context = harness.create_outside_file("context.txt", "C");

    app::commands::set_template(template, harness.proxy.clone(), harness.state.clone());
    app::commands::set_context(context, harness.proxy.clone(), harness.state.clone());
    app::commands::set_description("D".to_string(), harness.proxy.clone(), harness.state.clone());

    harness.start_scan();
    harness.wait_for_scan_completion().await;

    // --- ACT ---
    assert!(app::commands::toggle_path(
        Path::new("src"),
        harness.proxy.clone(),
        harness.state.clone()
    ));
    let clipboard = RecordingClipboard::default();
    app::commands::generate_prompt(harness.proxy.clone(), harness.state.clone(), &clipboard);
    let prompt = harness.wait_for_generated_content().await;

    // --- ASSERT ---
    let expected = "T\n\n\
        **Defect Description:**\nD\n\n\
        **Project Context:**\nC\n\n\
        **Project File Structure:**\nproj/\n└── src\n    └── a.txt\n\n\
        **File Contents:**\n\n\
        [File: src/a.txt]\nhello\n";
    assert_eq!(prompt, expected);
    assert_eq!(clipboard.copied.lock().unwrap().as_slice(), [expected.to_string()]);
    assert!(!prompt.contains("readme.md"));
}

#[tokio::test]
async fn test_full_tree_diagram_matches_scan() {
    let mut harness = TestHarness::new(TestHarness::clean_config());
    harness.create_file("src/a.txt", "hello");
    harness.create_file("readme.md", "");

    harness.start_scan();
    harness.wait_for_scan_completion().await;

    let diagram = {
        let state = harness.state.lock().unwrap();
        app::view_model::generate_ui_state(&state).tree_diagram
    };
    assert_eq!(diagram, "proj/\n├── src\n│   └── a.txt\n└── readme.md\n");
}

#[tokio::test]
async fn test_unreadable_file_is_isolated() {
    let mut harness = TestHarness::new(TestHarness::clean_config());
    harness.create_file("good.txt", "fine");
    std::fs::write(harness.root_path.join("bad.bin"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

    harness.start_scan();
    harness.wait_for_scan_completion().await;
    app::commands::select_all(harness.proxy.clone(), harness.state.clone());

    let clipboard = RecordingClipboard::default();
    app::commands::generate_prompt(harness.proxy.clone(), harness.state.clone(), &clipboard);
    let prompt = harness.wait_for_generated_content().await;

    let bad = prompt.find("[File: bad.bin]").expect("bad.bin header");
    let good = prompt.find("[File: good.txt]").expect("good.txt header");
    assert!(bad < good);
    assert!(prompt.contains("[File: bad.bin]\n[BINARY OR NON-UTF8 FILE - CONTENT SKIPPED]\n"));
    assert!(prompt.contains("[File: good.txt]\nfine\n"));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_non_utf8_file_name_contents_reach_the_prompt() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let mut harness = TestHarness::new(TestHarness::clean_config());
    let raw = OsStr::from_bytes(b"caf\xe9.txt");
    std::fs::write(harness.root_path.join(raw), "real content").unwrap();

    harness.start_scan();
    harness.wait_for_scan_completion().await;
    app::commands::select_all(harness.proxy.clone(), harness.state.clone());

    let clipboard = RecordingClipboard::default();
    app::commands::generate_prompt(harness.proxy.clone(), harness.state.clone(), &clipboard);
    let prompt = harness.wait_for_generated_content().await;

    assert!(prompt.contains("[File: caf\u{FFFD}.txt]\nreal content\n"));
    assert!(!prompt.contains("[ERROR READING FILE"));
}

#[tokio::test]
async fn test_rescan_resets_selection() {
    let mut harness = TestHarness::new(TestHarness::clean_config());
    harness.create_file("one.txt", "1");

    harness.start_scan();
    harness.wait_for_scan_completion().await;
    app::commands::select_all(harness.proxy.clone(), harness.state.clone());
    assert_eq!(
        app::view_model::generate_ui_state(&harness.state.lock().unwrap()).selected_files_count,
        1
    );

    harness.create_file("two.txt", "2");
    harness.drain_events();
    app::commands::rescan_directory(harness.proxy.clone(), harness.state.clone());
    harness.wait_for_scan_completion().await;

    let ui = app::view_model::generate_ui_state(&harness.state.lock().unwrap());
    assert_eq!(ui.selected_files_count, 0);
    assert_eq!(ui.nodes.len(), 3);
}

#[tokio::test]
#[traced_test]
async fn test_cancelled_root_dialog_keeps_state() {
    let mut harness = TestHarness::new(TestHarness::clean_config());

    app::commands::select_root_folder(
        &CancellingDialog,
        harness.proxy.clone(),
        harness.state.clone(),
    );

    match harness.event_rx.try_recv() {
        Ok(UserEvent::StateUpdate(ui)) => {
            assert!(ui.root_folder.is_none());
            assert!(!ui.is_scanning);
        }
        Ok(other) => panic!("expected a state update, got {:?}", other),
        Err(e) => panic!("expected a state update, got {}", e),
    }
    assert!(harness.state.lock().unwrap().tree.is_none());
    assert!(logs_contain("User cancelled root folder selection."));
}
