//! File Chooser Thumbnail Scheduler
//!
//! Runs thumbnail generation on a single background worker and hands the
//! results back to the render thread.
//!
//! Jobs are deduplicated by key while outstanding and executed strictly in
//! submission order. A reset cancels everything in flight, starts a new
//! worker generation and guarantees that no result from the old generation
//! is ever delivered.
//!
//! # Example
//!
//! ```
//! use filechooser_scheduler::{GenerationScheduler, JobOutcome};
//! use std::time::Duration;
//!
//! let mut scheduler: GenerationScheduler<String, Vec<u8>, String> =
//!     GenerationScheduler::new().unwrap();
//!
//! scheduler.schedule("a.png".to_string(), |token| {
//!     if token.is_cancelled() {
//!         return Err("cancelled".to_string());
//!     }
//!     Ok(vec![0; 16])
//! });
//!
//! // Directory changed: drop everything queued for the old listing
//! scheduler.reset().unwrap();
//! assert_eq!(scheduler.pending_len(), 0);
//!
//! // Once per frame on the render thread
//! for completion in scheduler.wait(Duration::from_millis(10)) {
//!     if let JobOutcome::Completed(pixels) = completion.outcome {
//!         println!("{} ready ({} bytes)", completion.key, pixels.len());
//!     }
//! }
//! ```

mod cancel;
mod job;
mod scheduler;
mod worker;

// Re-export public API
pub use cancel::CancellationToken;
pub use job::{Completion, JobBody, JobOutcome, JobState};
pub use scheduler::{GenerationScheduler, SchedulerError, SchedulerStats};
