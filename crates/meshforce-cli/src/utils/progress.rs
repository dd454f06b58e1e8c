use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use meshforce::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use tracing::warn;

#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0).with_style(Self::bar_style());
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb_guard) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::SweepStart { index, total_edges } => {
                    pb_guard.reset();
                    pb_guard.set_length(total_edges);
                    pb_guard.set_position(0);
                    pb_guard.set_message(format!("Sweep {}", index + 1));
                }
                Progress::EdgeAttempted { .. } => {
                    pb_guard.inc(1);
                }
                Progress::SweepFinish { accepted } => {
                    let total = pb_guard.length().unwrap_or(0);
                    pb_guard.set_position(total);
                    pb_guard.finish_with_message(format!("{accepted} accepted"));
                }
                Progress::EvaluationFinished {
                    timestep,
                    total_area,
                } => {
                    pb_guard.set_message(format!("step {timestep}: area {total_area:.6}"));
                }
                Progress::Message(msg) => {
                    if !pb_guard.is_finished() {
                        pb_guard.println(format!("  {}", msg));
                    } else {
                        pb_guard.set_message(msg);
                    }
                }
            }
        })
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<20} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
