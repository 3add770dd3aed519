//! Bounded fan-out for per-item scoring.
//!
//! Items are processed in fixed-size batches; each item runs on its own scoped
//! thread so a failure (error or panic) stays with that item.

use std::any::Any;
use std::thread;

use crate::error::ForecastError;

/// Run `f` over `items`, at most `batch_size` at a time.
///
/// Results are returned in input order. A panicking item yields
/// `ForecastError::WorkerPanicked`; the rest of the batch is unaffected.
pub fn run_batched<T, R, F>(items: &[T], batch_size: usize, f: F) -> Vec<Result<R, ForecastError>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R, ForecastError> + Sync,
{
    let batch_size = batch_size.max(1);
    let f = &f;
    let mut out = Vec::with_capacity(items.len());

    for batch in items.chunks(batch_size) {
        thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|item| scope.spawn(move || f(item)))
                .collect();

            for handle in handles {
                let result = handle.join().unwrap_or_else(|payload| {
                    Err(ForecastError::WorkerPanicked(panic_message(payload)))
                });
                out.push(result);
            }
        });
    }

    out
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
