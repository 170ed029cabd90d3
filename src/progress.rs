//! Consumer-side rolling progress window
//!
//! The engine's progress stream is a flat sequence of [`ProgressEvent`]s;
//! aggregating them into a capped, render-ready view is the consumer's job.
//! [`ProgressWindow`] is that aggregation: a fixed leading status line, the
//! most recent file basenames with the oldest evicted first, and a trailing
//! completion marker. A log-view widget can call [`render`](ProgressWindow::render)
//! after every applied event and replace its text wholesale.

use crate::types::ProgressEvent;
use std::collections::VecDeque;

/// Default number of recent file names kept in the window
pub const WINDOW_CAPACITY: usize = 10;

/// Rolling, oldest-evicted-first view of a run's progress stream
#[derive(Clone, Debug)]
pub struct ProgressWindow {
    header: Option<String>,
    recent: VecDeque<String>,
    capacity: usize,
    completed: bool,
}

impl Default for ProgressWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressWindow {
    /// Create a window holding at most [`WINDOW_CAPACITY`] recent names
    pub fn new() -> Self {
        Self::with_capacity(WINDOW_CAPACITY)
    }

    /// Create a window with a custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            header: None,
            recent: VecDeque::with_capacity(capacity),
            capacity,
            completed: false,
        }
    }

    /// Fold one progress event into the window
    pub fn apply(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { destination_root } => {
                self.header = Some(format!("Downloading to {} ...", destination_root.display()));
                self.recent.clear();
                self.completed = false;
            }
            ProgressEvent::FileStarted { basename } => {
                if self.recent.len() == self.capacity {
                    self.recent.pop_front();
                }
                self.recent.push_back(basename.clone());
            }
            ProgressEvent::RunCompleted => {
                self.completed = true;
            }
        }
    }

    /// Render the window as display-ready lines
    pub fn render(&self) -> String {
        let mut lines: Vec<&str> = Vec::with_capacity(self.recent.len() + 2);
        if let Some(header) = &self.header {
            lines.push(header);
        }
        lines.extend(self.recent.iter().map(String::as_str));
        if self.completed {
            lines.push("Download completed");
        }
        lines.join("\n")
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn started(name: &str) -> ProgressEvent {
        ProgressEvent::FileStarted {
            basename: name.to_string(),
        }
    }

    #[test]
    fn header_then_files_then_marker() {
        let mut window = ProgressWindow::new();
        window.apply(&ProgressEvent::RunStarted {
            destination_root: PathBuf::from("/data/images"),
        });
        window.apply(&started("a.png"));
        window.apply(&started("b.png"));
        window.apply(&ProgressEvent::RunCompleted);

        assert_eq!(
            window.render(),
            "Downloading to /data/images ...\na.png\nb.png\nDownload completed"
        );
    }

    #[test]
    fn oldest_name_is_evicted_at_capacity() {
        let mut window = ProgressWindow::with_capacity(3);
        for name in ["a", "b", "c", "d"] {
            window.apply(&started(name));
        }
        assert_eq!(window.render(), "b\nc\nd");
    }

    #[test]
    fn default_capacity_holds_ten_names() {
        let mut window = ProgressWindow::new();
        for i in 0..15 {
            window.apply(&started(&format!("f{i}")));
        }
        let rendered = window.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "f5");
        assert_eq!(lines[9], "f14");
    }

    #[test]
    fn new_run_resets_previous_window() {
        let mut window = ProgressWindow::new();
        window.apply(&ProgressEvent::RunStarted {
            destination_root: PathBuf::from("/one/images"),
        });
        window.apply(&started("old.png"));
        window.apply(&ProgressEvent::RunCompleted);

        window.apply(&ProgressEvent::RunStarted {
            destination_root: PathBuf::from("/two/images"),
        });
        assert_eq!(window.render(), "Downloading to /two/images ...");
    }
}
