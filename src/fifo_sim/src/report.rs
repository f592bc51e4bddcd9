//==================================================================================================
// Imports
//==================================================================================================
use mmu_lib::{AccessOutcome, MemorySnapshot};
use sim_lib::{belady_anomalies, RunReport, SimEvent};
use std::{
    fmt::Display,
    io::{self, Write},
};

//==================================================================================================
// Structures
//==================================================================================================
/// Turns simulation events into the step-by-step text trace.
///
/// Write errors are kept until [`Renderer::finish`], since events arrive through a callback.
pub struct Renderer<W: Write> {
    out: W,
    quiet: bool,
    error: Option<io::Error>,
}

//==================================================================================================
// Implementations
//==================================================================================================
impl<W: Write> Renderer<W> {
    pub fn new(out: W, quiet: bool) -> Self {
	Self {
	    out,
	    quiet,
	    error: None,
	}
    }

    pub fn render(&mut self, event: &SimEvent) {
	if self.error.is_some() {
	    return;
	}
	if let Err(e) = self.write_event(event) {
	    self.error = Some(e);
	}
    }

    pub fn finish(mut self) -> io::Result<()> {
	if let Some(e) = self.error.take() {
	    return Err(e);
	}
	self.out.flush()
    }

    fn write_event(&mut self, event: &SimEvent) -> io::Result<()> {
	match event {
	    SimEvent::Started { snapshot, .. } => {
		if self.quiet {
		    return Ok(());
		}
		writeln!(self.out, "--- SIMULATION START ---")?;
		self.write_state(snapshot)
	    }
	    SimEvent::Accessed { reference, outcome, snapshot, .. } => {
		if self.quiet {
		    return Ok(());
		}
		self.write_access(*reference, outcome)?;
		if outcome.frame().is_some() {
		    self.write_state(snapshot)?;
		}
		Ok(())
	    }
	    SimEvent::Finished(report) => {
		if !self.quiet {
		    writeln!(self.out, "--- SIMULATION END ---")?;
		}
		write_summary(&mut self.out, report)
	    }
	}
    }

    fn write_access(&mut self, reference: i64, outcome: &AccessOutcome) -> io::Result<()> {
	match *outcome {
	    AccessOutcome::OutOfRange { page } => {
		writeln!(self.out, "--- WARNING: invalid virtual page {}, ignoring. ---", page)?;
		writeln!(self.out)
	    }
	    AccessOutcome::Hit { frame } => {
		writeln!(self.out, "Accessing virtual page: {}", reference)?;
		writeln!(self.out, "  -> Hit! Page {} is already in physical frame {}.", reference, frame)
	    }
	    AccessOutcome::Fault { frame, evicted } => {
		writeln!(self.out, "Accessing virtual page: {}", reference)?;
		writeln!(self.out, "  -> Page fault! Page {} is not in physical memory.", reference)?;
		match evicted {
		    None => writeln!(
			self.out,
			"  -> Loading page {} into free physical frame {}.",
			reference,
			frame,
		    ),
		    Some(victim) => {
			writeln!(self.out, "  -> Physical memory full. Replacing page {} (FIFO).", victim)?;
			writeln!(self.out, "  -> Loading page {} into physical frame {}.", reference, frame)
		    }
		}
	    }
	}
    }

    fn write_state(&mut self, snapshot: &MemorySnapshot) -> io::Result<()> {
	let mappings: Vec<String> = snapshot
	    .mappings
	    .iter()
	    .map(|(frame, page)| format!("{}->{}", frame, page))
	    .collect();

	writeln!(self.out, "   Physical memory (frames): {}", list(&snapshot.frames))?;
	writeln!(self.out, "   FIFO queue (pages):       {}", list(&snapshot.fifo_queue))?;
	writeln!(self.out, "   Mappings (frame->page):   [{}]", mappings.join(", "))?;
	writeln!(self.out)
    }
}

fn list<T: Display>(items: &[T]) -> String {
    let items: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}

pub fn write_summary<W: Write>(out: &mut W, report: &RunReport) -> io::Result<()> {
    writeln!(out, "Frames: {}, virtual pages: {}", report.frame_count, report.virtual_page_count)?;
    writeln!(out, "Total accesses:     {}", report.total_accesses)?;
    writeln!(out, "Total page faults:  {} ({:.2}%)", report.faults, report.fault_rate())?;
    writeln!(out, "Total hits:         {} ({:.2}%)", report.hits, report.hit_rate())?;
    writeln!(out, "Ignored references: {}", report.rejected)
}

pub fn write_sweep<W: Write>(out: &mut W, reports: &[RunReport]) -> io::Result<()> {
    writeln!(out, "{:>6} | {:>8} | {:>8} | {:>10}", "Frames", "Faults", "Hits", "Fault rate")?;
    for report in reports {
	writeln!(
	    out,
	    "{:>6} | {:>8} | {:>8} | {:>9.2}%",
	    report.frame_count,
	    report.faults,
	    report.hits,
	    report.fault_rate(),
	)?;
    }

    for (fewer, more) in belady_anomalies(reports) {
	writeln!(
	    out,
	    "Belady's anomaly: {} frames fault more often than {} frames.",
	    more,
	    fewer,
	)?;
    }
    Ok(())
}
