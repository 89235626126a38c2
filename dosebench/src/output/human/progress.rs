use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Per-run lines on stdout with a bar for the current target on stderr.
pub(crate) struct HumanProgress {
    inner: Mutex<Option<TargetBar>>,
}

struct TargetBar {
    target: String,
    pb: ProgressBar,
}

impl HumanProgress {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    pub(crate) fn record(&self, target: &str, index: usize, total: usize, line: &str) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if inner.as_ref().is_some_and(|b| b.target != target)
            && let Some(old) = inner.take()
        {
            old.pb.finish_and_clear();
        }

        let bar = inner.get_or_insert_with(|| {
            let pb = ProgressBar::with_draw_target(
                Some(total as u64),
                ProgressDrawTarget::stderr_with_hz(5),
            );
            pb.set_style(bar_style());
            pb.set_prefix(target.to_string());
            TargetBar {
                target: target.to_string(),
                pb,
            }
        });

        // The line must land above the bar, and must still print when the bar is hidden.
        bar.pb.suspend(|| println!("{line}"));
        bar.pb.set_position(index as u64);
    }

    pub(crate) fn finish(&self) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(bar) = inner.take() {
            bar.pb.finish_and_clear();
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix} [ {bar:20.cyan/blue} ] {pos}/{len} {elapsed}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█░")
}
