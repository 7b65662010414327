//! Per-device render loop.

use ledmatrix_hw::preset::FPS_RANGE;
use ledmatrix_hw::LedMatrix;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, warn};

/// A device shared between its render task and the shutdown path.
pub type SharedMatrix = Arc<Mutex<LedMatrix>>;

/// Locks a device, recovering it if a render hook panicked while holding it.
pub fn lock(matrix: &Mutex<LedMatrix>) -> MutexGuard<'_, LedMatrix> {
    matrix.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Time between two render ticks, with the rate clamped to [`FPS_RANGE`].
fn frame_interval(fps: u32) -> Duration {
    let fps = fps.clamp(*FPS_RANGE.start(), *FPS_RANGE.end());
    Duration::from_millis(1000 / u64::from(fps))
}

/// Invokes the device's render hook once per frame until shutdown is
/// signalled. The hook runs on the blocking pool with the device locked.
pub async fn render_loop(matrix: SharedMatrix, mut shutdown: watch::Receiver<bool>) {
    let (id, fps) = {
        let matrix = lock(&matrix);
        (matrix.id(), matrix.fps())
    };
    debug!("Render loop for device {} started at {} fps", id, fps);

    let mut ticker = tokio::time::interval(frame_interval(fps));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut consecutive_errors: u32 = 0;
    let mut last_error_log = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        let device = matrix.clone();
        let result = tokio::task::spawn_blocking(move || lock(&device).render()).await;

        if let Err(e) = result {
            consecutive_errors += 1;
            // Only log errors once per minute or on first error
            let elapsed = last_error_log.elapsed();
            if consecutive_errors == 1 || elapsed >= Duration::from_secs(60) {
                if consecutive_errors > 1 {
                    warn!(
                        "Render error on device {} (repeated {} times in {:?}): {}",
                        id, consecutive_errors, elapsed, e
                    );
                } else {
                    warn!("Render error on device {}: {}", id, e);
                }
                last_error_log = Instant::now();
                consecutive_errors = 0;
            }
        } else {
            consecutive_errors = 0;
        }
    }

    debug!("Render loop for device {} stopped", id);
}
