//! Round-based coordinator folding the pending corpus into the global buffer
//!
//! Each round lists the input directory, splits the eligible names across a
//! fixed pool of workers, waits for every worker, merges their private buffers
//! into a staged copy of the global buffer, persists it and only then moves the
//! round's files out of the pending set. A crash at any point therefore leaves
//! every pending file either unsummed or already reflected on disk.

use crate::accumulate::SumBuffer;
use crate::accumulate::worker::{
    Batch, BatchAccumulator, FailedItem, PartialResult, partition_round_robin,
};
use crate::io::configuration::AccumulateSettings;
use crate::io::error::{AverageError, Result, computation_error};
use crate::io::progress::RoundProgress;
use crate::io::storage::BufferStore;
use crate::io::workspace::Workspace;
use ndarray::Zip;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Coordinator state within a round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting to list the input directory
    Idle,
    /// Workers are summing their batches
    Dispatching,
    /// Partial buffers are being summed into the staged global buffer
    Merging,
    /// The staged buffer is being written to durable storage
    Persisting,
    /// Summed and failed files are being moved out of the pending set
    Relocating,
    /// The round is reported before the next listing
    Draining,
    /// A listing found no eligible input
    Done,
}

/// Outcome of one accumulation round
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// 1-based round number within this run
    pub round: usize,
    /// Files handed to workers
    pub dispatched: usize,
    /// Files whose contribution was persisted
    pub summed: usize,
    /// Files moved to the failed directory
    pub failed: usize,
}

/// Totals across every round of a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rounds that processed at least one file
    pub rounds: usize,
    /// Files summed across all rounds
    pub summed: usize,
    /// Files moved to the failed directory across all rounds
    pub failed: usize,
}

impl RunSummary {
    const fn record(&mut self, report: &RoundReport) {
        self.rounds += 1;
        self.summed += report.summed;
        self.failed += report.failed;
    }
}

/// Merged worker output awaiting persistence
#[derive(Debug, Default)]
pub struct MergedRound {
    /// Filenames whose contribution is in the merged buffer
    pub completed: Vec<String>,
    /// Filenames no worker could sum
    pub failed: Vec<FailedItem>,
}

/// Sum every partial buffer into `global` and collect the filename lists
///
/// Addition is exact, so the result does not depend on the order of
/// `partials`.
///
/// # Errors
///
/// Returns `BufferShape` if a partial buffer differs in shape from `global`
/// and `Computation` if any element would overflow; `global` may be partially
/// updated in either case and must be discarded
pub fn merge_partials(global: &mut SumBuffer, partials: Vec<PartialResult>) -> Result<MergedRound> {
    let mut merged = MergedRound::default();

    for partial in partials {
        if partial.buffer.dim() != global.dim() {
            return Err(AverageError::BufferShape {
                expected: global.dim(),
                actual: partial.buffer.dim(),
            });
        }

        let mut overflowed = false;
        Zip::from(&mut *global)
            .and(&partial.buffer)
            .for_each(|total, &value| match total.checked_add(value) {
                Some(sum) => *total = sum,
                None => overflowed = true,
            });
        if overflowed {
            return Err(computation_error(
                "merge",
                &"sum buffer element overflowed u64",
            ));
        }

        merged.completed.extend(partial.completed);
        merged.failed.extend(partial.failed);
    }

    Ok(merged)
}

/// Owns the global sum buffer and drives accumulation rounds
pub struct Coordinator {
    settings: AccumulateSettings,
    workspace: Workspace,
    store: BufferStore,
    accumulator: BatchAccumulator,
    buffer: SumBuffer,
    pool: ThreadPool,
    progress: RoundProgress,
    phase: Phase,
    round: usize,
}

impl Coordinator {
    /// Validate settings, open the directories and load or create the buffer
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for unusable settings, `FileSystem` if the
    /// directories cannot be created, `BufferLoad`/`BufferShape` for an
    /// unusable persisted buffer and `Computation` if the worker pool cannot
    /// be started
    pub fn open(settings: AccumulateSettings, progress: RoundProgress) -> Result<Self> {
        settings.validate()?;

        let workspace = Workspace::open(
            &settings.input_dir,
            &settings.completed_dir,
            &settings.failed_dir,
            &settings.suffix,
        )?;
        let store = BufferStore::new(settings.buffer_path.clone());
        let buffer = store.load_or_zeroed(settings.canvas_size)?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.workers)
            .thread_name(|index| format!("avgphoto-worker-{index}"))
            .build()
            .map_err(|e| computation_error("worker pool", &e))?;

        Ok(Self {
            accumulator: BatchAccumulator::from_settings(&settings),
            settings,
            workspace,
            store,
            buffer,
            pool,
            progress,
            phase: Phase::Idle,
            round: 0,
        })
    }

    /// Current phase
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The global buffer as of the last persisted round
    pub const fn buffer(&self) -> &SumBuffer {
        &self.buffer
    }

    /// Consume the coordinator, returning the global buffer
    pub fn into_buffer(self) -> SumBuffer {
        self.buffer
    }

    /// Run rounds until a listing finds no eligible input
    ///
    /// # Errors
    ///
    /// Propagates the first round error; every earlier round stays persisted
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        while let Some(report) = self.run_round()? {
            summary.record(&report);
        }
        log::info!(
            "Done: {} rounds, {} summed, {} failed",
            summary.rounds,
            summary.summed,
            summary.failed
        );
        Ok(summary)
    }

    /// Run one round, or return `None` when there is nothing left to sum
    ///
    /// # Errors
    ///
    /// Returns an error from a worker, the merge, persistence or relocation.
    /// When persistence fails no file of the round is moved and the in-memory
    /// buffer keeps its previous contents.
    pub fn run_round(&mut self) -> Result<Option<RoundReport>> {
        self.transition(Phase::Idle);
        let limit = self.settings.workers.saturating_mul(self.settings.batch_size);
        let names = self.workspace.pending(limit)?;
        if names.is_empty() {
            self.transition(Phase::Done);
            return Ok(None);
        }

        self.round += 1;
        let dispatched = names.len();
        let batches = partition_round_robin(names, self.settings.workers);
        log::info!(
            "Round {}: {dispatched} images on {} workers",
            self.round,
            batches.len()
        );

        self.transition(Phase::Dispatching);
        let bar = self.progress.start_round(self.round, dispatched);
        let partials = self.dispatch(&batches, || bar.inc(1))?;

        self.transition(Phase::Merging);
        let mut staged = self.buffer.clone();
        let merged = merge_partials(&mut staged, partials)?;

        self.transition(Phase::Persisting);
        self.store.save(&staged)?;
        self.buffer = staged;

        self.transition(Phase::Relocating);
        for name in &merged.completed {
            self.workspace.mark_completed(name)?;
        }
        for item in &merged.failed {
            self.workspace.mark_failed(&item.name)?;
        }

        self.transition(Phase::Draining);
        let report = RoundReport {
            round: self.round,
            dispatched,
            summed: merged.completed.len(),
            failed: merged.failed.len(),
        };
        self.progress.finish_round(&bar, &report);
        log::info!(
            "Round {}: {} summed, {} failed",
            report.round,
            report.summed,
            report.failed
        );

        Ok(Some(report))
    }

    /// Run every batch on the worker pool and wait for all of them
    fn dispatch(
        &self,
        batches: &[Batch],
        on_item: impl Fn() + Sync,
    ) -> Result<Vec<PartialResult>> {
        let accumulator = &self.accumulator;
        let on_item = &on_item;
        self.pool.install(|| {
            batches
                .par_iter()
                .map(|batch| accumulator.accumulate(batch, on_item))
                .collect::<Result<Vec<_>>>()
        })
    }

    fn transition(&mut self, next: Phase) {
        log::debug!("{:?} -> {next:?}", self.phase);
        self.phase = next;
    }
}
