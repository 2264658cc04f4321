//! Progress reporting utilities using indicatif.
//!
//! Listing commands wait on the backend; [`FetchSpinner`] shows a spinner on
//! stderr while they do. It is hidden in quiet mode and when stderr is not a
//! terminal, so piped JSON and CSV stay clean.

use std::future::Future;
use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner shown while a request is in flight.
pub struct FetchSpinner {
    bar: ProgressBar,
}

impl FetchSpinner {
    /// Create a spinner with `message`.
    ///
    /// # Arguments
    ///
    /// * `message` - What is being fetched, e.g. "Fetching interns"
    /// * `quiet` - If true, nothing is drawn
    #[must_use]
    pub fn new(message: &str, quiet: bool) -> Self {
        let visible = !quiet && std::io::stderr().is_terminal();
        let bar = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(Self::style());
        bar.set_message(message.to_string());
        if visible {
            bar.enable_steady_tick(Duration::from_millis(100));
        }
        Self { bar }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    /// Whether the spinner draws anything.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }

    /// Run `future` with the spinner visible and clear it afterwards.
    pub async fn run<F: Future>(self, future: F) -> F::Output {
        let output = future.await;
        self.bar.finish_and_clear();
        output
    }
}

impl Drop for FetchSpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
