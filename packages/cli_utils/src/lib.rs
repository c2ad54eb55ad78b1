#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the `outbreak` binary: a logger that cooperates
//! with progress bars, and a bar for grid sampling.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use outbreak_environment::ProgressCallback;

pub use indicatif::MultiProgress;

/// Log filter applied when `RUST_LOG` is unset. Pipeline crates log at
/// `info`; HTTP and runtime crates only surface warnings.
pub const DEFAULT_LOG_FILTER: &str = "warn,outbreak=info";

const WAITING_TEMPLATE: &str = "{spinner:.green} {prefix:.bold} {msg}";
const SAMPLING_TEMPLATE: &str =
    "{prefix:>10.bold} [{bar:32.green/dim}] {pos:>5}/{len} days {per_sec:>9} eta {eta} {msg}";

/// Progress of a day-sampling batch.
///
/// Spins while the plan is built, then counts sampled days against the
/// planned total.
pub struct SamplingBar {
    bar: ProgressBar,
    counting: ProgressStyle,
}

impl SamplingBar {
    /// Adds a sampling bar labeled `prefix` to `multi`.
    #[must_use]
    pub fn new(multi: &MultiProgress, prefix: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template(WAITING_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix(prefix.to_string());
        bar.set_message("planning days");
        bar.enable_steady_tick(Duration::from_millis(120));

        let counting = ProgressStyle::with_template(SAMPLING_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");

        Arc::new(Self { bar, counting })
    }
}

impl ProgressCallback for SamplingBar {
    fn set_total(&self, total: u64) {
        self.bar.set_style(self.counting.clone());
        self.bar.set_length(total);
        self.bar.reset();
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        let elapsed = self.bar.elapsed().as_secs_f64();
        self.bar.finish_with_message(format!("{msg} in {elapsed:.1}s"));
    }
}

/// Installs `pretty_env_logger` behind `indicatif-log-bridge`, so log lines
/// print above active bars instead of tearing them.
///
/// The filter comes from `RUST_LOG`, or [`DEFAULT_LOG_FILTER`] when unset.
/// Returns the [`MultiProgress`] bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    let logger = pretty_env_logger::formatted_timed_builder()
        .parse_filters(&filter)
        .build();
    let level = logger.filter();

    // Tests may have installed a logger already.
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
    fn templates_parse() {
        assert!(ProgressStyle::with_template(WAITING_TEMPLATE).is_ok());
        assert!(ProgressStyle::with_template(SAMPLING_TEMPLATE).is_ok());
    }

    #[test]
    fn counts_days_against_the_plan() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let bar = SamplingBar {
            bar: multi.add(ProgressBar::new_spinner()),
            counting: ProgressStyle::default_bar(),
        };

        bar.set_total(12);
        bar.inc(5);
        bar.inc(2);
        assert_eq!(bar.bar.length(), Some(12));
        assert_eq!(bar.bar.position(), 7);

        bar.finish("7 sampled".to_string());
        assert!(bar.bar.is_finished());
        assert!(bar.bar.message().starts_with("7 sampled in "));
    }
}
