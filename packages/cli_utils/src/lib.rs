#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal output for the `rental_crawl` binary: the crawl progress line
//! ([`IndicatifProgress`]) and logger setup ([`init_logger`]).

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use rental_crawl_crawler::progress::ProgressCallback;

pub use indicatif::MultiProgress;

/// Single crawl progress line shared by every region and phase.
///
/// Shows a spinner until the first phase reports its size, then a bar of
/// completed fetches. Each later phase resets the bar to its own total.
pub struct IndicatifProgress {
    bar: ProgressBar,
    phase_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Adds the crawl line to `multi`, labeled `message` until the first
    /// phase names itself.
    #[must_use]
    pub fn crawl_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());

        let phase_style = ProgressStyle::with_template(
            "  {msg} {wide_bar:.cyan/dim} {pos}/{len} fetched [{elapsed}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

        Arc::new(Self { bar, phase_style })
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.phase_style.clone());
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Installs `pretty_env_logger` (filtered by `RUST_LOG`) behind
/// `indicatif-log-bridge`, so crawl warnings print above the progress line
/// instead of through it.
///
/// Returns the [`MultiProgress`] the crawl bar must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;

    use super::*;

    #[test]
    fn phases_reset_position_and_length() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let bar = multi.add(ProgressBar::hidden());
        let progress = IndicatifProgress {
            bar: bar.clone(),
            phase_style: ProgressStyle::default_bar(),
        };

        progress.set_total(5);
        progress.inc(3);
        assert_eq!(bar.position(), 3);

        progress.set_total(2);
        assert_eq!(bar.position(), 0);
        assert_eq!(bar.length(), Some(2));

        progress.finish("done".to_string());
        assert!(bar.is_finished());
    }
}
