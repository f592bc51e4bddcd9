//==================================================================================================
// Configuration
//==================================================================================================
#![deny(clippy::all)]

//==================================================================================================
// Imports
//==================================================================================================
use ::anyhow::{Context, Result};
use mem_lib::EngineConfig;
use mmu_lib::{AccessOutcome, MemorySnapshot, MMU};

use std::{
    ops::RangeInclusive,
    sync::Arc,
};
use tokio::sync::mpsc;
use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};

use log::{debug, info, warn};

//==================================================================================================
// Constants
//==================================================================================================
const SWEEP_CHANNEL_CAPACITY: usize = 16;

//==================================================================================================
// Enum
//==================================================================================================
/// Everything a front-end needs to narrate a run, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Emitted once, before the first reference.
    Started {
	sim_id: usize,
	snapshot: MemorySnapshot,
    },
    /// Emitted for every reference, including ignored ones.
    Accessed {
	/// 1-based position of the reference in the string
	step: usize,
	reference: i64,
	outcome: AccessOutcome,
	snapshot: MemorySnapshot,
    },
    /// Emitted once, after the last reference.
    Finished(RunReport),
}

//==================================================================================================
// Structures
//==================================================================================================
/// Totals of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub frame_count		: usize,
    pub virtual_page_count	: usize,
    pub faults			: u64,
    pub hits			: u64,
    pub total_accesses		: u64,
    /// References outside the virtual space, ignored by the engine
    pub rejected		: u64,
}

/// Drives one reference string through its own paging engine.
pub struct Simulation
{
    /// `Simulation` identifier, used in logs (private field)
    sim_id	: usize,
    /// The engine, owned by this simulation alone (private field)
    mmu		: MMU,
    /// Page references, in access order (private field)
    references	: Vec<i64>,
}

//==================================================================================================
// Implementations
//==================================================================================================
impl RunReport {
    /// Faults over in-range accesses, as a percentage. Zero when nothing was accessed.
    pub fn fault_rate(&self) -> f64 {
	Self::percentage(self.faults, self.total_accesses)
    }

    /// Hits over in-range accesses, as a percentage. Zero when nothing was accessed.
    pub fn hit_rate(&self) -> f64 {
	Self::percentage(self.hits, self.total_accesses)
    }

    fn percentage(part: u64, whole: u64) -> f64 {
	if whole == 0 {
	    return 0.0;
	}
	part as f64 / whole as f64 * 100.0
    }
}

impl Simulation
{
    /// Creates a new `Simulation` instance.
    ///
    /// # Arguments
    ///
    /// * `id`         - Identifier of the simulation.
    /// * `config`     - Memory sizes of the engine built for this run.
    /// * `references` - Virtual pages to access, in order. Out-of-range values are allowed.
    pub fn new(id: usize, config: EngineConfig, references: Vec<i64>) -> Self {
	debug!(
	    "[SIM {}] Creating simulation of {} references",
	    id,
	    references.len(),
	);
	Self {
	    sim_id: id,
	    mmu: MMU::new(config),
	    references,
	}
    }

    /// Runs every reference through the engine, reporting each step to `observer`.
    ///
    /// # Returns
    ///
    /// * The totals of the run, also delivered as the final `SimEvent::Finished`.
    pub fn run<F>(mut self, mut observer: F) -> RunReport
    where
	F: FnMut(&SimEvent),
    {
	info!(
	    "[SIM {}] Starting: {} frames, {} pages",
	    self.sim_id,
	    self.mmu.config().frame_count(),
	    self.mmu.config().virtual_page_count(),
	);
	observer(&SimEvent::Started {
	    sim_id: self.sim_id,
	    snapshot: self.mmu.snapshot(),
	});

	let mut rejected = 0;
	for (idx, &reference) in self.references.iter().enumerate() {
	    let outcome = self.mmu.access(reference);
	    if let AccessOutcome::OutOfRange { page } = outcome {
		warn!("[SIM {}] Ignoring invalid virtual page {}", self.sim_id, page);
		rejected += 1;
	    }
	    observer(&SimEvent::Accessed {
		step: idx + 1,
		reference,
		outcome,
		snapshot: self.mmu.snapshot(),
	    });
	}

	let counters = self.mmu.counters();
	let report = RunReport {
	    frame_count: self.mmu.config().frame_count(),
	    virtual_page_count: self.mmu.config().virtual_page_count(),
	    faults: counters.faults,
	    hits: counters.hits,
	    total_accesses: counters.total_accesses,
	    rejected,
	};
	info!(
	    "[SIM {}] Finished: {} faults, {} hits, {} ignored",
	    self.sim_id,
	    report.faults,
	    report.hits,
	    report.rejected,
	);
	observer(&SimEvent::Finished(report));

	report
    }
}

/// Reads a reference string such as `"0 1 2, 3,4"`.
///
/// Tokens are separated by whitespace and/or commas. Negative numbers are accepted here; the
/// engine reports them as out of range.
pub fn parse_references(input: &str) -> Result<Vec<i64>> {
    input
	.split(|c: char| c == ',' || c.is_whitespace())
	.filter(|token| !token.is_empty())
	.enumerate()
	.map(|(idx, token)| {
	    token
		.parse::<i64>()
		.with_context(|| format!("reference #{} ('{}') is not an integer", idx + 1, token))
	})
	.collect()
}

/// Reproducible reference string of `len` pages drawn from `[0, virtual_page_count)`.
pub fn random_references(len: usize, virtual_page_count: usize, seed: u64) -> Vec<i64> {
    if virtual_page_count == 0 {
	return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
	.map(|_| rng.gen_range(0..virtual_page_count as i64))
	.collect()
}

/// Runs the same reference string once per frame count in `frames`, concurrently.
///
/// Each run owns its own engine; nothing is shared between them but the (read-only) references.
///
/// # Returns
///
/// * `Ok(Vec<RunReport>)`  - one report per frame count, by ascending frame count
/// * `Err(..)`             - if any frame count (or the page count) is not a valid size
pub async fn sweep(
    frames: RangeInclusive<usize>,
    virtual_page_count: usize,
    references: &[i64],
) -> Result<Vec<RunReport>> {
    let virtual_page_count = i64::try_from(virtual_page_count)?;
    let configs = frames
	.map(|frame_count| -> Result<EngineConfig> {
	    Ok(EngineConfig::new(i64::try_from(frame_count)?, virtual_page_count)?)
	})
	.collect::<Result<Vec<_>>>()?;

    run_concurrently(configs, references, |id, config, references| {
	Simulation::new(id, config, references).run(|_| {})
    })
    .await
}

/// Spawns one `run` per config and gathers the reports, failing if any run did not finish.
async fn run_concurrently<F>(
    configs: Vec<EngineConfig>,
    references: &[i64],
    run: F,
) -> Result<Vec<RunReport>>
where
    F: Fn(usize, EngineConfig, Vec<i64>) -> RunReport + Copy + Send + 'static,
{
    let references: Arc<[i64]> = Arc::from(references);
    let (transmitter, mut receiver) = mpsc::channel(SWEEP_CHANNEL_CAPACITY);

    let mut handles = Vec::with_capacity(configs.len());
    for (id, config) in configs.into_iter().enumerate() {
	let references = Arc::clone(&references);
	let transmitter = transmitter.clone();
	handles.push(tokio::spawn(async move {
	    let report = run(id, config, references.to_vec());
	    if transmitter.send(report).await.is_err() {
		warn!("[SIM {}] Sweep receiver dropped", id);
	    }
	}));
    }
    drop(transmitter);

    // Drain first: senders block once the channel is full.
    let mut reports = Vec::with_capacity(handles.len());
    while let Some(report) = receiver.recv().await {
	reports.push(report);
    }
    for (id, handle) in handles.into_iter().enumerate() {
	handle
	    .await
	    .with_context(|| format!("sweep run {} did not complete", id))?;
    }
    reports.sort_by_key(|report| report.frame_count);

    Ok(reports)
}

/// Consecutive frame counts `(n, n + 1)` where the extra frame produced more faults.
///
/// `reports` is expected sorted by frame count, as [`sweep`] returns it.
pub fn belady_anomalies(reports: &[RunReport]) -> Vec<(usize, usize)> {
    reports
	.windows(2)
	.filter(|pair| {
	    pair[1].frame_count == pair[0].frame_count + 1 && pair[1].faults > pair[0].faults
	})
	.map(|pair| (pair[0].frame_count, pair[1].frame_count))
	.collect()
}
