//! The mempool expiry sweeper.
//!
//! Periodically deletes unconfirmed transactions whose deadline has
//! passed, reversing their unconfirmed state and notifying listeners.

use std::time::Duration;

use tokio::{task::JoinHandle, time::sleep};
use tracing_futures::Instrument;

use crate::{components::ledger::Ledger, BoxError};

use super::TransactionProcessor;

/// The periodic expiry sweep task.
pub struct ExpirySweeper<L: Ledger> {
    interval: Duration,
    processor: TransactionProcessor<L>,
}

impl<L: Ledger> ExpirySweeper<L> {
    /// Spawns an asynchronous task to run the expiry sweeper.
    pub fn spawn(
        interval: Duration,
        processor: TransactionProcessor<L>,
    ) -> JoinHandle<Result<(), BoxError>> {
        let sweeper = ExpirySweeper {
            interval,
            processor,
        };
        tokio::spawn(sweeper.run().in_current_span())
    }

    /// Periodically sweeps expired transactions.
    ///
    /// Recoverable failures are logged and the next tick continues.
    /// Fatal storage failures stop the task, and the embedding node
    /// should stop the process with it.
    async fn run(self) -> Result<(), BoxError> {
        info!("initializing mempool expiry sweeper task");

        loop {
            sleep(self.interval).await;
            match self.processor.sweep_expired() {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "swept expired unconfirmed transactions"),
                Err(error) if error.is_fatal() => {
                    error!(%error, "fatal error sweeping expired transactions");
                    return Err(error.into());
                }
                Err(error) => debug!(%error, "error removing unconfirmed transactions"),
            }
        }
    }
}
