//! Parallel dispatch of chunks to the synthesis worker.

use crate::text::TextChunk;
use crate::worker::{ChunkResult, SynthesisWorker};
use log::{debug, error};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};

/// Upper bound on the default pool size.
const MAX_DEFAULT_CONCURRENCY: usize = 32;

/// Default number of concurrent synthesis calls: `min(32, cpus + 4)`.
pub fn default_concurrency() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    MAX_DEFAULT_CONCURRENCY.min(cpus + 4)
}

/// Progress information for a dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchProgress {
    /// Number of chunks submitted.
    pub total: usize,
    /// Chunks finished, successfully or not.
    pub finished: usize,
    /// Chunks that failed so far.
    pub failed: usize,
}

/// Runs the synthesis worker over many chunks with bounded concurrency.
pub struct ParallelDispatcher {
    worker: Arc<SynthesisWorker>,
    concurrency: usize,
}

impl ParallelDispatcher {
    /// Create a dispatcher. A `concurrency` of zero is treated as one.
    pub fn new(worker: SynthesisWorker, concurrency: usize) -> Self {
        Self {
            worker: Arc::new(worker),
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Synthesize every chunk exactly once and return one result per chunk.
    ///
    /// Chunks run concurrently, at most `concurrency` at a time, and finish in
    /// any order. A failed chunk never stops the others. The returned results
    /// are sorted by chunk index. Chunk indices must be unique.
    pub async fn run<F>(&self, chunks: Vec<TextChunk>, mut on_progress: F) -> Vec<ChunkResult>
    where
        F: FnMut(&DispatchProgress),
    {
        let total = chunks.len();
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let (tx, mut rx) = mpsc::channel::<ChunkResult>(total.max(1));

        for chunk in chunks {
            let worker = Arc::clone(&self.worker);
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();

            tokio::spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => worker.synthesize(&chunk).await,
                    Err(_) => ChunkResult::failure(chunk.index, "dispatcher shut down", 0),
                };
                let _ = tx.send(result).await;
            });
        }
        // Only the spawned tasks hold senders now, so `recv` ends when they all finish.
        drop(tx);

        let mut progress = DispatchProgress {
            total,
            ..Default::default()
        };
        let mut results: BTreeMap<usize, ChunkResult> = BTreeMap::new();

        while let Some(result) = rx.recv().await {
            progress.finished += 1;
            if !result.is_success() {
                progress.failed += 1;
            }
            debug!(
                "Chunk {} finished ({}/{})",
                result.index, progress.finished, progress.total
            );
            results.insert(result.index, result);
            on_progress(&progress);
        }

        // A task that panicked never sent its result.
        for index in indices {
            if !results.contains_key(&index) {
                error!("Chunk {} ended without a result", index);
                progress.finished += 1;
                progress.failed += 1;
                results.insert(index, ChunkResult::failure(index, "synthesis task aborted", 0));
                on_progress(&progress);
            }
        }

        results.into_values().collect()
    }
}
