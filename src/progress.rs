use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::downloader::ProgressFn;

const BAR_TEMPLATE: &str =
    "{msg:30!} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";

fn file_name(src: &str) -> String {
    src.rsplit('/').next().unwrap_or(src).to_owned()
}

/// Returns the default progress function: one `indicatif` bar per download,
/// stacked so concurrent editions don't overwrite each other.
pub fn default_progress_fn() -> ProgressFn {
    let multi = MultiProgress::new();
    let bars: Mutex<HashMap<String, ProgressBar>> = Mutex::new(HashMap::new());
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

    Arc::new(move |src: &str, current: u64, total: u64, _mib_per_sec: f64, complete: bool| {
        let Ok(mut bars) = bars.lock() else {
            return;
        };
        let bar = bars.entry(src.to_owned()).or_insert_with(|| {
            let bar = multi.add(ProgressBar::new(total));
            bar.set_style(style.clone());
            bar.set_message(file_name(src));
            bar
        });

        if total > 0 {
            bar.set_length(total);
        }
        bar.set_position(current);

        if complete {
            bar.finish();
            bars.remove(src);
        }
    })
}

/// Returns a plain-text progress function for non-interactive output: a single
/// line per finished download.
pub fn plain_progress_fn() -> ProgressFn {
    Arc::new(|src: &str, current: u64, _total: u64, mib_per_sec: f64, complete: bool| {
        if complete {
            println!(
                "downloaded {} ({:.2} MiB, {:.2} MiB/s)",
                file_name(src),
                current as f64 / (1024.0 * 1024.0),
                mib_per_sec
            );
        }
    })
}
