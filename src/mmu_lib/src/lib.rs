//==================================================================================================
// Configuration
//==================================================================================================
#![deny(clippy::all)]

//==================================================================================================
// Imports
//==================================================================================================
use mem_lib::{ConfigurationError, EngineConfig, FrameNumber, VirtualPage};
use ram_lib::{Frame, Placement, RAM};

use log::debug;

//==================================================================================================
// Structures
//==================================================================================================
/// The paging engine: resolves page references against a FIFO-managed frame pool.
///
/// Owns all of its state. Independent simulations each build their own `MMU`.
#[derive(Debug, Clone)]
pub struct MMU {
    config: EngineConfig,
    ram: RAM,
    counters: Counters,
}

/// What happened to a single reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    /// The page was already resident in `frame`.
    Hit { frame: FrameNumber },
    /// The page was loaded into `frame`, replacing `evicted` if memory was full.
    Fault {
	frame: FrameNumber,
	evicted: Option<VirtualPage>,
    },
    /// The reference lies outside the virtual space and was ignored.
    OutOfRange { page: i64 },
}

#[derive(Debug)]
enum TranslateResult {
    Hit(FrameNumber),
    Fault,
}

/// Access counters. Out-of-range references are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub faults: u64,
    pub hits: u64,
    pub total_accesses: u64,
}

/// Read-only picture of the engine between two accesses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySnapshot {
    /// Frame table, indexed by frame number
    pub frames: Vec<Frame>,
    /// Resident pages in load order, next victim first
    pub fifo_queue: Vec<VirtualPage>,
    /// `(frame, page)` pairs by ascending frame number
    pub mappings: Vec<(FrameNumber, VirtualPage)>,
    pub counters: Counters,
}

//==================================================================================================
// Implementations
//==================================================================================================
impl AccessOutcome {
    /// Frame that holds the referenced page after the access.
    pub fn frame(&self) -> Option<FrameNumber> {
	match self {
	    AccessOutcome::Hit { frame } | AccessOutcome::Fault { frame, .. } => Some(*frame),
	    AccessOutcome::OutOfRange { .. } => None,
	}
    }
}

impl MMU {
    pub fn new(config: EngineConfig) -> Self {
	debug!(
	    "[MMU] Creating MMU ({} frames, {} pages)",
	    config.frame_count(),
	    config.virtual_page_count(),
	);
	Self {
	    config,
	    ram: RAM::new(config.frame_count(), config.virtual_page_count()),
	    counters: Counters::default(),
	}
    }

    /// Builds an engine straight from raw sizes.
    ///
    /// # Returns
    ///
    /// * `Err(ConfigurationError)` - if either size is not strictly positive. No engine is built.
    pub fn with_sizes(frame_count: i64, virtual_page_count: i64) -> Result<Self, ConfigurationError> {
	Ok(Self::new(EngineConfig::new(frame_count, virtual_page_count)?))
    }

    /// References `virtual_page`.
    ///
    /// Pages outside `[0, virtual_page_count)` leave the engine untouched and yield
    /// `OutOfRange`. Otherwise the access is counted as a hit or a fault; a fault loads the page
    /// into the lowest free frame or, with memory full, into the frame of the oldest loaded page.
    pub fn access(&mut self, virtual_page: i64) -> AccessOutcome {
	let page = match self.in_range(virtual_page) {
	    Some(page) => page,
	    None => {
		debug!("[MMU] Ignoring reference to page {}", virtual_page);
		return AccessOutcome::OutOfRange { page: virtual_page };
	    }
	};

	self.counters.total_accesses += 1;
	match self.translate(page) {
	    TranslateResult::Hit(frame) => {
		self.counters.hits += 1;
		debug!("[MMU] Hit: page {} in frame {}", page, frame);
		AccessOutcome::Hit { frame }
	    }
	    TranslateResult::Fault => {
		self.counters.faults += 1;
		debug!("[MMU] Page fault on page {}", page);
		let Placement { frame, evicted } = self.handle_page_fault(page);
		AccessOutcome::Fault { frame, evicted }
	    }
	}
    }

    fn in_range(&self, virtual_page: i64) -> Option<VirtualPage> {
	let page = VirtualPage::try_from(virtual_page).ok()?;
	(page < self.config.virtual_page_count()).then_some(page)
    }

    fn translate(&self, page: VirtualPage) -> TranslateResult {
	match self.ram.ram_lookup(page).and_then(|entry| entry.frame_number()) {
	    Some(frame) => TranslateResult::Hit(frame),
	    None => TranslateResult::Fault,
	}
    }

    /// Loads `page`, which `translate` just reported as in range and not resident.
    fn handle_page_fault(&mut self, page: VirtualPage) -> Placement {
	match self.ram.ram_alloc_frame(page) {
	    Ok(placement) => placement,
	    Err(e) => unreachable!("[MMU] Fault on page {} could not be served: {:#}", page, e),
	}
    }

    pub fn snapshot(&self) -> MemorySnapshot {
	MemorySnapshot {
	    frames: self.ram.frames().to_vec(),
	    fifo_queue: self.ram.frames_queue().collect(),
	    mappings: self.ram.ram_mappings(),
	    counters: self.counters,
	}
    }

    pub fn counters(&self) -> Counters {
	self.counters
    }

    pub fn config(&self) -> EngineConfig {
	self.config
    }

    /// Underlying memory, for consistency checks.
    pub fn ram(&self) -> &RAM {
	&self.ram
    }
}

//==================================================================================================
// Tests
//==================================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(mmu: &mut MMU, references: &[i64]) -> Vec<AccessOutcome> {
	references
	    .iter()
	    .map(|&page| {
		let outcome = mmu.access(page);
		mmu.ram().ram_verify().unwrap();
		outcome
	    })
	    .collect()
    }

    #[test]
    fn test_rejects_bad_sizes() {
	assert!(MMU::with_sizes(0, 10).is_err());
	assert!(MMU::with_sizes(3, 0).is_err());
	assert!(MMU::with_sizes(-3, 10).is_err());
	assert!(MMU::with_sizes(3, -10).is_err());
    }

    #[test]
    fn test_first_access_faults_into_frame_zero() {
	let mut mmu = MMU::with_sizes(3, 10).unwrap();
	assert_eq!(mmu.access(4), AccessOutcome::Fault { frame: 0, evicted: None });
	assert_eq!(mmu.access(4), AccessOutcome::Hit { frame: 0 });
	assert_eq!(mmu.counters(), Counters { faults: 1, hits: 1, total_accesses: 2 });
    }

    #[test]
    fn test_scenario_sixteen_references_three_frames() {
	let mut mmu = MMU::with_sizes(3, 10).unwrap();
	let outcomes = run(&mut mmu, &[0, 1, 2, 3, 0, 4, 1, 5, 2, 6, 3, 7, 4, 8, 5, 9]);

	// Every repeat comes back after its page was pushed out.
	assert!(outcomes.iter().all(|o| matches!(o, AccessOutcome::Fault { .. })));
	assert_eq!(outcomes[3], AccessOutcome::Fault { frame: 0, evicted: Some(0) });
	assert_eq!(outcomes[4], AccessOutcome::Fault { frame: 1, evicted: Some(1) });
	assert_eq!(outcomes[15], AccessOutcome::Fault { frame: 0, evicted: Some(4) });
	assert_eq!(mmu.counters(), Counters { faults: 16, hits: 0, total_accesses: 16 });

	let snapshot = mmu.snapshot();
	assert_eq!(snapshot.frames, vec![Frame::Occupied(9), Frame::Occupied(8), Frame::Occupied(5)]);
	assert_eq!(snapshot.fifo_queue, vec![8, 5, 9]);
    }

    #[test]
    fn test_scenario_single_frame_alternating() {
	let mut mmu = MMU::with_sizes(1, 2).unwrap();
	let outcomes = run(&mut mmu, &[0, 1, 0, 1]);
	assert_eq!(
	    outcomes,
	    vec![
		AccessOutcome::Fault { frame: 0, evicted: None },
		AccessOutcome::Fault { frame: 0, evicted: Some(0) },
		AccessOutcome::Fault { frame: 0, evicted: Some(1) },
		AccessOutcome::Fault { frame: 0, evicted: Some(0) },
	    ]
	);
	assert_eq!(mmu.counters(), Counters { faults: 4, hits: 0, total_accesses: 4 });
    }

    #[test]
    fn test_scenario_both_pages_fit() {
	let mut mmu = MMU::with_sizes(2, 5).unwrap();
	let outcomes = run(&mut mmu, &[0, 1, 0, 1]);
	assert_eq!(
	    outcomes,
	    vec![
		AccessOutcome::Fault { frame: 0, evicted: None },
		AccessOutcome::Fault { frame: 1, evicted: None },
		AccessOutcome::Hit { frame: 0 },
		AccessOutcome::Hit { frame: 1 },
	    ]
	);
	assert_eq!(mmu.counters(), Counters { faults: 2, hits: 2, total_accesses: 4 });
    }

    #[test]
    fn test_hits_do_not_promote_pages() {
	let mut mmu = MMU::with_sizes(3, 10).unwrap();
	run(&mut mmu, &[0, 1, 2]);
	// Page 0 is hit repeatedly but stays at the head of the queue.
	run(&mut mmu, &[0, 0, 0]);
	assert_eq!(mmu.snapshot().fifo_queue, vec![0, 1, 2]);
	assert_eq!(mmu.access(3), AccessOutcome::Fault { frame: 0, evicted: Some(0) });
    }

    #[test]
    fn test_out_of_range_is_a_no_op() {
	let mut mmu = MMU::with_sizes(2, 4).unwrap();
	run(&mut mmu, &[0, 3]);
	let before = mmu.snapshot();

	assert_eq!(mmu.access(-1), AccessOutcome::OutOfRange { page: -1 });
	assert_eq!(mmu.access(4), AccessOutcome::OutOfRange { page: 4 });
	assert_eq!(mmu.access(i64::MAX), AccessOutcome::OutOfRange { page: i64::MAX });
	assert_eq!(mmu.snapshot(), before);
	assert_eq!(mmu.counters().total_accesses, 2);
    }

    #[test]
    fn test_more_frames_than_pages() {
	let mut mmu = MMU::with_sizes(5, 2).unwrap();
	run(&mut mmu, &[0, 1, 0, 1, 1]);
	let snapshot = mmu.snapshot();
	assert_eq!(&snapshot.frames[2..], &[Frame::Free, Frame::Free, Frame::Free]);
	assert_eq!(snapshot.counters, Counters { faults: 2, hits: 3, total_accesses: 5 });
    }

    #[test]
    fn test_snapshot_mappings_sorted_by_frame() {
	let mut mmu = MMU::with_sizes(3, 10).unwrap();
	run(&mut mmu, &[7, 2, 9, 4]);
	// Page 4 replaced page 7 in frame 0.
	assert_eq!(mmu.snapshot().mappings, vec![(0, 4), (1, 2), (2, 9)]);
	assert_eq!(mmu.snapshot().fifo_queue, vec![2, 9, 4]);
    }

    #[test]
    fn test_snapshot_does_not_mutate() {
	let mut mmu = MMU::with_sizes(2, 4).unwrap();
	run(&mut mmu, &[1, 2, 3]);
	let first = mmu.snapshot();
	let second = mmu.snapshot();
	assert_eq!(first, second);
	assert_eq!(mmu.counters(), first.counters);
    }

    #[test]
    fn test_belady_reference_string() {
	let references = [1, 2, 3, 4, 1, 2, 5, 1, 2, 3, 4, 5];
	let mut three = MMU::with_sizes(3, 6).unwrap();
	let mut four = MMU::with_sizes(4, 6).unwrap();
	run(&mut three, &references);
	run(&mut four, &references);
	assert_eq!(three.counters().faults, 9);
	assert_eq!(four.counters().faults, 10);
    }

    proptest! {
	#[test]
	fn prop_tables_stay_consistent(
	    frames in 1i64..6,
	    pages in 1i64..12,
	    references in prop::collection::vec(-3i64..15, 0..80),
	) {
	    let mut mmu = MMU::with_sizes(frames, pages).unwrap();
	    let mut in_range = 0u64;
	    for &page in &references {
		let outcome = mmu.access(page);
		prop_assert!(mmu.ram().ram_verify().is_ok());
		if (0..pages).contains(&page) {
		    in_range += 1;
		    prop_assert!(outcome.frame().is_some());
		} else {
		    prop_assert_eq!(outcome, AccessOutcome::OutOfRange { page });
		}
	    }
	    let counters = mmu.counters();
	    prop_assert_eq!(counters.hits + counters.faults, counters.total_accesses);
	    prop_assert_eq!(counters.total_accesses, in_range);
	}

	#[test]
	fn prop_evicts_in_load_order(
	    frames in 1usize..5,
	    extra in 1usize..8,
	) {
	    // Distinct pages only: every access faults, nothing is ever hit.
	    let total = frames + extra;
	    let mut mmu = MMU::with_sizes(frames as i64, total as i64).unwrap();
	    for page in 0..total {
		let outcome = mmu.access(page as i64);
		let expected = page.checked_sub(frames);
		prop_assert_eq!(
		    outcome,
		    AccessOutcome::Fault { frame: page % frames, evicted: expected }
		);
	    }
	}
    }
}
