// src/partition.rs
//! Per-user partitioned evaluation (requires the `async` feature)
//!
//! Each worker task owns its own [`Detector`]. Transactions are routed by a
//! stable hash of `user_id`, so one user's sub-stream is always handled by
//! the same worker, in submission order, and no state is shared between
//! workers.

use crate::detector::{Detector, EvaluationResult};
use crate::Transaction;
use ahash::RandomState;
use std::hash::BuildHasher;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

// Fixed seeds keep routing stable for the lifetime of the process.
const ROUTING_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

#[derive(Error, Debug)]
pub enum PartitionError {
    #[error("Worker {0} is no longer accepting transactions")]
    WorkerClosed(usize),
}

/// Pool of detectors, one per partition
pub struct PartitionedDetector {
    senders: Vec<mpsc::Sender<Transaction>>,
    workers: Vec<JoinHandle<()>>,
    router: RandomState,
}

impl PartitionedDetector {
    /// Spawn `partitions` workers, each with a detector from `factory`.
    ///
    /// `capacity` bounds each worker's input queue. Results arrive on the
    /// returned receiver, which is closed once every worker has stopped.
    pub fn spawn<F>(
        partitions: usize,
        capacity: usize,
        factory: F,
    ) -> (Self, mpsc::UnboundedReceiver<EvaluationResult>)
    where
        F: Fn() -> Detector,
    {
        let partitions = partitions.max(1);
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let mut senders = Vec::with_capacity(partitions);
        let mut workers = Vec::with_capacity(partitions);

        for partition in 0..partitions {
            let (tx, mut rx) = mpsc::channel::<Transaction>(capacity.max(1));
            let mut detector = factory();
            let results = results_tx.clone();

            workers.push(tokio::spawn(async move {
                while let Some(transaction) = rx.recv().await {
                    let result = detector.evaluate(&transaction);
                    if results.send(result).is_err() {
                        debug!(partition, "Result receiver dropped, stopping worker");
                        break;
                    }
                }
            }));
            senders.push(tx);
        }

        let pool = Self {
            senders,
            workers,
            router: RandomState::with_seeds(
                ROUTING_SEEDS[0],
                ROUTING_SEEDS[1],
                ROUTING_SEEDS[2],
                ROUTING_SEEDS[3],
            ),
        };
        (pool, results_rx)
    }

    pub fn partitions(&self) -> usize {
        self.senders.len()
    }

    /// Partition that owns `user_id`.
    pub fn partition_for(&self, user_id: &str) -> usize {
        (BuildHasher::hash_one(&self.router, user_id) % self.senders.len() as u64) as usize
    }

    /// Queue a transaction on its user's partition, waiting for room.
    pub async fn submit(&self, transaction: Transaction) -> Result<(), PartitionError> {
        let partition = self.partition_for(transaction.user_id());
        self.senders[partition]
            .send(transaction)
            .await
            .map_err(|_| PartitionError::WorkerClosed(partition))
    }

    /// Stop accepting input and wait for every queued transaction to be evaluated.
    pub async fn shutdown(self) {
        drop(self.senders);
        for (partition, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                error!(partition, error = %e, "Partition worker failed");
            }
        }
    }
}
