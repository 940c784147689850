//! Progress bar display for batch pinning

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress over the files of one batch
pub struct ProgressDisplay {
    file_pb: ProgressBar,
}

impl ProgressDisplay {
    /// Create a progress display for `total_files` files, drawn on stderr
    pub fn new(total_files: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let file_pb = ProgressBar::with_draw_target(Some(total_files), ProgressDrawTarget::stderr());
        file_pb.set_style(style);

        Self { file_pb }
    }

    /// Show the file currently being processed
    pub fn update_file(&self, file_path: &str) {
        // Truncate long paths for display
        let display_path = if file_path.chars().count() > 50 {
            let tail: String = file_path
                .chars()
                .rev()
                .take(47)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("...{tail}")
        } else {
            file_path.to_string()
        };
        self.file_pb.set_message(display_path);
    }

    /// Mark one file as done
    pub fn inc_file(&self) {
        self.file_pb.inc(1);
    }

    /// Finish and clear the bar
    pub fn finish(&self) {
        self.file_pb.finish_and_clear();
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.file_pb.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts_files() {
        let progress = ProgressDisplay::new(2);
        progress.update_file(".github/workflows/ci.yml");
        progress.inc_file();
        progress.update_file(&format!(".github/workflows/{}.yml", "x".repeat(80)));
        progress.inc_file();
        assert_eq!(progress.file_pb.position(), 2);
        progress.finish();
    }
}
