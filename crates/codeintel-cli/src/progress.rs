//! Progress reporting for ingestion tasks

use codeintel_core::IngestionTaskView;
use std::io::{self, Write};

/// Single-line progress on stderr
pub struct ProgressReporter {
    enabled: bool,
    last: Option<(usize, usize)>,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last: None,
        }
    }

    pub fn update(&mut self, view: &IngestionTaskView) {
        if !self.enabled {
            return;
        }
        let state = (view.files_processed, view.total_files);
        if self.last == Some(state) {
            return;
        }
        self.last = Some(state);

        let pct = if view.total_files == 0 {
            0
        } else {
            view.files_processed * 100 / view.total_files
        };
        let current = view.current_file.as_deref().unwrap_or("");
        eprint!(
            "\r[{:>3}%] {}/{} {:<50.50}",
            pct, view.files_processed, view.total_files, current
        );
        io::stderr().flush().ok();
    }

    pub fn finish(&self) {
        if self.enabled && self.last.is_some() {
            eprintln!();
        }
    }
}
