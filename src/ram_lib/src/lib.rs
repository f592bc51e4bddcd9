//==================================================================================================
// Configuration
//==================================================================================================
#![deny(clippy::all)]

//==================================================================================================
// Imports
//==================================================================================================
use mem_lib::{FrameNumber, VirtualPage};
use anyhow::{bail, Result};
use std::{
    collections::{
	HashSet,
	VecDeque,
    },
    fmt,
};
use log::debug;

//==================================================================================================
// Structures
//==================================================================================================
/// A slot of the physical frame pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Free,
    Occupied(VirtualPage),
}

/// Page table entry. A page is present exactly when it carries the frame that holds it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTableEntry {
    frame_number: Option<FrameNumber>,
}

/// Where the fault handler put a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Frame now holding the faulting page
    pub frame: FrameNumber,
    /// Page that was thrown out to make room, if the pool was full
    pub evicted: Option<VirtualPage>,
}

/// Physical memory: the frame table, the page table and the FIFO eviction queue.
///
/// The three structures describe the same resident set and are only ever changed together,
/// by [`RAM::ram_alloc_frame`].
#[derive(Debug, Clone)]
pub struct RAM {
    frames: Vec<Frame>,
    page_table: Vec<PageTableEntry>,
    frames_queue: VecDeque<VirtualPage>,
}

//==================================================================================================
// Implementations
//==================================================================================================
impl Frame {
    pub fn is_free(&self) -> bool {
	matches!(self, Frame::Free)
    }

    pub fn page(&self) -> Option<VirtualPage> {
	match self {
	    Frame::Free => None,
	    Frame::Occupied(page) => Some(*page),
	}
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	match self {
	    Frame::Free => write!(f, "-"),
	    Frame::Occupied(page) => write!(f, "{}", page),
	}
    }
}

impl PageTableEntry {
    pub fn absent() -> Self {
	Self { frame_number: None }
    }

    pub fn present(frame_number: FrameNumber) -> Self {
	Self { frame_number: Some(frame_number) }
    }

    pub fn is_present(&self) -> bool {
	self.frame_number.is_some()
    }

    pub fn frame_number(&self) -> Option<FrameNumber> {
	self.frame_number
    }
}

impl RAM {
    pub fn new(max_frames: usize, virtual_pages: usize) -> Self {
	debug!("[RAM] Creating RAM with {} frames for {} pages", max_frames, virtual_pages);
	Self {
	    frames: vec![Frame::Free; max_frames],
	    page_table: vec![PageTableEntry::absent(); virtual_pages],
	    frames_queue: VecDeque::with_capacity(max_frames),
	}
    }

    /// Page table entry of `page`, or `None` when the page lies outside the virtual space.
    pub fn ram_lookup(&self, page: VirtualPage) -> Option<PageTableEntry> {
	self.page_table.get(page).copied()
    }

    /// Lowest-numbered free frame.
    pub fn ram_free_frame(&self) -> Option<FrameNumber> {
	self.frames.iter().position(Frame::is_free)
    }

    /// Loads a non-resident `page` into memory.
    ///
    /// Takes the lowest free frame when there is one. Otherwise the page at the head of the FIFO
    /// queue is evicted and its frame reused. Hits never touch the queue, so the victim is always
    /// the page loaded longest ago.
    ///
    /// # Arguments
    /// * `page` - A virtual page inside the page table that is not currently present;
    ///
    /// # Returns
    /// * The frame that now holds `page`, and the evicted page if any.
    /// * `Err` if `page` lies outside the page table or is already resident. Nothing is changed.
    pub fn ram_alloc_frame(&mut self, page: VirtualPage) -> Result<Placement> {
	match self.ram_lookup(page) {
	    None => bail!("page {} is outside the page table ({} pages)", page, self.page_table.len()),
	    Some(entry) if entry.is_present() => bail!("page {} is already resident", page),
	    Some(_) => {}
	}

	if let Some(frame) = self.ram_free_frame() {
	    debug!("[RAM] Loading page {} into free frame {}", page, frame);
	    self.ram_install(frame, page);
	    return Ok(Placement { frame, evicted: None });
	}

	let victim = match self.frames_queue.front() {
	    Some(&victim) => victim,
	    None => bail!("frame pool is full but the FIFO queue is empty"),
	};
	let frame = match self.ram_lookup(victim).and_then(|entry| entry.frame_number()) {
	    Some(frame) => frame,
	    None => bail!("queued page {} has no frame", victim),
	};
	self.frames_queue.pop_front();
	debug!("[RAM] Evicted page {} from frame {}", victim, frame);

	self.page_table[victim] = PageTableEntry::absent();
	self.ram_install(frame, page);

	Ok(Placement { frame, evicted: Some(victim) })
    }

    fn ram_install(&mut self, frame: FrameNumber, page: VirtualPage) {
	self.frames[frame] = Frame::Occupied(page);
	self.frames_queue.push_back(page);
	self.page_table[page] = PageTableEntry::present(frame);
    }

    pub fn frames(&self) -> &[Frame] {
	&self.frames
    }

    /// Resident pages in load order, oldest first.
    pub fn frames_queue(&self) -> impl Iterator<Item = VirtualPage> + '_ {
	self.frames_queue.iter().copied()
    }

    /// Active `(frame, page)` mappings by ascending frame number.
    pub fn ram_mappings(&self) -> Vec<(FrameNumber, VirtualPage)> {
	self.frames
	    .iter()
	    .enumerate()
	    .filter_map(|(frame, slot)| slot.page().map(|page| (frame, page)))
	    .collect()
    }

    /// Checks that the frame table, the page table and the FIFO queue agree on the resident set.
    pub fn ram_verify(&self) -> Result<()> {
	let mut resident = HashSet::new();
	for (frame, slot) in self.frames.iter().enumerate() {
	    let Some(page) = slot.page() else { continue };
	    if !resident.insert(page) {
		bail!("page {} occupies more than one frame", page);
	    }
	    match self.page_table.get(page).and_then(PageTableEntry::frame_number) {
		Some(mapped) if mapped == frame => {}
		Some(mapped) => bail!("frame {} holds page {} but the page maps to frame {}", frame, page, mapped),
		None => bail!("frame {} holds page {} which is not present", frame, page),
	    }
	}

	for (page, entry) in self.page_table.iter().enumerate() {
	    if entry.is_present() && !resident.contains(&page) {
		bail!("page {} is present but no frame holds it", page);
	    }
	}

	let mut queued = HashSet::new();
	for page in self.frames_queue.iter() {
	    if !queued.insert(*page) {
		bail!("page {} is queued twice", page);
	    }
	}
	if queued != resident {
	    bail!(
		"FIFO queue {:?} does not match the resident set {:?}",
		self.frames_queue,
		resident,
	    );
	}

	Ok(())
    }
}
