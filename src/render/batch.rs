//! Fixed-size batch scheduling.
//!
//! ```text
//! units:  [u0 u1 u2 | u3 u4 u5 | u6]      batch_size = 3
//!           └ spawn ┘  └ spawn ┘  └┘
//!           join all → join all → join all
//! ```
//!
//! At most `batch_size` units are in flight at any time. A failing unit lets
//! its batch finish, then no further batch starts.

use super::{cancel::CancelToken, error::BuildError};
use std::future::Future;
use tokio::task::JoinSet;

/// Default number of units started together.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Run `units` in batches of `batch_size`, calling `on_done` after each
/// finished unit. Results come back in completion order.
pub async fn run_batched<F, T>(
    units: Vec<F>,
    batch_size: usize,
    cancel: &CancelToken,
    on_done: &impl Fn(),
) -> Result<Vec<T>, BuildError>
where
    F: Future<Output = Result<T, BuildError>> + Send + 'static,
    T: Send + 'static,
{
    let batch_size = batch_size.max(1);
    let mut results = Vec::with_capacity(units.len());
    let mut units = units.into_iter().peekable();

    while units.peek().is_some() {
        cancel.check()?;

        let mut batch = JoinSet::new();
        for unit in units.by_ref().take(batch_size) {
            batch.spawn(unit);
        }

        let mut first_error = None;
        while let Some(joined) = batch.join_next().await {
            match joined {
                Ok(Ok(value)) => {
                    results.push(value);
                    on_done();
                }
                Ok(Err(err)) => {
                    first_error.get_or_insert(err);
                }
                Err(err) => {
                    first_error.get_or_insert(BuildError::TaskPanicked(err.to_string()));
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }
    }

    Ok(results)
}
