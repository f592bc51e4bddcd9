//==================================================================================================
// Structures
//==================================================================================================
use ::anyhow::{anyhow, bail, Context, Result};

#[derive(Debug)]
pub struct Args {
    /// Number of physical frames, as typed by the operator
    frames: String,
    /// Number of virtual pages, as typed by the operator
    pages: String,
    /// Explicit reference string
    sequence: Option<String>,
    /// Length of a generated reference string
    random: Option<usize>,
    /// Seed of the generated reference string
    seed: u64,
    /// Largest frame count of a sweep (starting at 1 frame)
    sweep: Option<usize>,
    /// Ask for sizes and references on stdin
    interactive: bool,
    /// Print only the final summary
    quiet: bool,
    help: bool,
}

//==================================================================================================
// Implementation
//==================================================================================================
impl Args {
    const OPT_HELP: &'static str = "--help";
    const OPT_FRAMES: &'static str = "--frames";
    const OPT_PAGES: &'static str = "--pages";
    const OPT_SEQUENCE: &'static str = "--sequence";
    const OPT_RANDOM: &'static str = "--random";
    const OPT_SEED: &'static str = "--seed";
    const OPT_SWEEP: &'static str = "--sweep";
    const OPT_INTERACTIVE: &'static str = "--interactive";
    const OPT_QUIET: &'static str = "--quiet";

    pub const DEFAULT_FRAMES: &'static str = "3";
    pub const DEFAULT_PAGES: &'static str = "10";
    pub const DEFAULT_SEQUENCE: &'static str = "0,1,2,3,0,4,1,5,2,6,3,7,4,8,5,9";

    pub fn parse(args: Vec<String>) -> Result<Self> {
	let mut frames: Option<String> = None;
	let mut pages: Option<String> = None;
	let mut sequence: Option<String> = None;
	let mut random: Option<usize> = None;
	let mut seed: u64 = 1;
	let mut sweep: Option<usize> = None;
	let mut interactive: bool = false;
	let mut quiet: bool = false;
	let mut help: bool = false;

	let mut i: usize = 1;
	while i < args.len() {
	    match args[i].as_str() {
		Self::OPT_HELP => {
		    help = true;
		}
		Self::OPT_FRAMES => {
		    i += 1;
		    frames = Some(Self::value(&args, i, Self::OPT_FRAMES)?.to_string());
		},
		Self::OPT_PAGES => {
		    i += 1;
		    pages = Some(Self::value(&args, i, Self::OPT_PAGES)?.to_string());
		},
		Self::OPT_SEQUENCE => {
		    i += 1;
		    sequence = Some(Self::value(&args, i, Self::OPT_SEQUENCE)?.to_string());
		},
		Self::OPT_RANDOM => {
		    i += 1;
		    random = Some(Self::number(&args, i, Self::OPT_RANDOM)?);
		}
		Self::OPT_SEED => {
		    i += 1;
		    seed = Self::number(&args, i, Self::OPT_SEED)?;
		}
		Self::OPT_SWEEP => {
		    i += 1;
		    let max: usize = Self::number(&args, i, Self::OPT_SWEEP)?;
		    if max == 0 {
			bail!("{} needs at least 1 frame", Self::OPT_SWEEP);
		    }
		    sweep = Some(max);
		}
		Self::OPT_INTERACTIVE => {
		    interactive = true;
		}
		Self::OPT_QUIET => {
		    quiet = true;
		}
		other => {
		    return Err(anyhow!("invalid argument '{}'", other));
		}
	    }

	    i += 1;
	}

	if sequence.is_some() && random.is_some() {
	    bail!("{} and {} cannot be combined", Self::OPT_SEQUENCE, Self::OPT_RANDOM);
	}

	// Interactive mode reads sizes and references from stdin.
	if interactive {
	    let given = [
		(Self::OPT_FRAMES, frames.is_some()),
		(Self::OPT_PAGES, pages.is_some()),
		(Self::OPT_SEQUENCE, sequence.is_some()),
		(Self::OPT_RANDOM, random.is_some()),
	    ];
	    if let Some((option, _)) = given.iter().find(|(_, set)| *set) {
		bail!("{} and {} cannot be combined", Self::OPT_INTERACTIVE, option);
	    }
	}

	Ok(Self {
	    frames: frames.unwrap_or_else(|| Self::DEFAULT_FRAMES.to_string()),
	    pages: pages.unwrap_or_else(|| Self::DEFAULT_PAGES.to_string()),
	    sequence,
	    random,
	    seed,
	    sweep,
	    interactive,
	    quiet,
	    help,
	})
    }

    fn value<'a>(args: &'a [String], i: usize, option: &str) -> Result<&'a str> {
	args.get(i)
	    .map(String::as_str)
	    .ok_or_else(|| anyhow!("missing value for {}", option))
    }

    fn number<T: std::str::FromStr>(args: &[String], i: usize, option: &str) -> Result<T>
    where
	T::Err: std::error::Error + Send + Sync + 'static,
    {
	let raw = Self::value(args, i, option)?;
	raw.parse::<T>()
	    .with_context(|| format!("invalid value '{}' for {}", raw, option))
    }

    pub fn usage(program: &str) {
	println!("Usage: {} [OPTIONS]", program);
	println!();
	println!("Simulates demand paging with FIFO page replacement.");
	println!();
	println!("Options:");
	println!("  {} N        Number of physical frames (default {})", Self::OPT_FRAMES, Self::DEFAULT_FRAMES);
	println!("  {} N         Number of virtual pages (default {})", Self::OPT_PAGES, Self::DEFAULT_PAGES);
	println!("  {} LIST   Page references, space or comma separated", Self::OPT_SEQUENCE);
	println!("                     (default {})", Self::DEFAULT_SEQUENCE);
	println!("  {} LEN     Generate LEN random references instead", Self::OPT_RANDOM);
	println!("  {} S         Seed of the random references (default 1)", Self::OPT_SEED);
	println!("  {} MAX      Run once per frame count from 1 to MAX and compare faults", Self::OPT_SWEEP);
	println!("  {}    Read sizes and references from stdin", Self::OPT_INTERACTIVE);
	println!("  {}          Print only the final summary", Self::OPT_QUIET);
	println!("  {}           Print this help message", Self::OPT_HELP);
    }

    pub fn frames(&self) -> &str {
	&self.frames
    }

    pub fn pages(&self) -> &str {
	&self.pages
    }

    pub fn sequence(&self) -> Option<&str> {
	self.sequence.as_deref()
    }

    pub fn random(&self) -> Option<usize> {
	self.random
    }

    pub fn seed(&self) -> u64 {
	self.seed
    }

    pub fn sweep(&self) -> Option<usize> {
	self.sweep
    }

    pub fn interactive(&self) -> bool {
	self.interactive
    }

    pub fn quiet(&self) -> bool {
	self.quiet
    }

    pub fn help(&self) -> bool {
	self.help
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Args> {
	let args = std::iter::once("fifo_sim")
	    .chain(line.split_whitespace())
	    .map(String::from)
	    .collect();
	Args::parse(args)
    }

    #[test]
    fn test_defaults() {
	let args = parse("").unwrap();
	assert_eq!(args.frames(), "3");
	assert_eq!(args.pages(), "10");
	assert_eq!(args.sequence(), None);
	assert_eq!(args.random(), None);
	assert_eq!(args.seed(), 1);
	assert!(!args.interactive() && !args.quiet() && !args.help());
    }

    #[test]
    fn test_all_options() {
	let args = parse("--frames 4 --pages 16 --random 50 --seed 9 --sweep 6 --quiet").unwrap();
	assert_eq!(args.frames(), "4");
	assert_eq!(args.pages(), "16");
	assert_eq!(args.random(), Some(50));
	assert_eq!(args.seed(), 9);
	assert_eq!(args.sweep(), Some(6));
	assert!(args.quiet());
    }

    #[test]
    fn test_sizes_are_kept_as_text() {
	// Validation happens when the engine is configured.
	let args = parse("--frames 2.5").unwrap();
	assert_eq!(args.frames(), "2.5");
    }

    #[test]
    fn test_rejects_unknown_option() {
	assert!(parse("--lru").is_err());
    }

    #[test]
    fn test_rejects_missing_value() {
	let err = parse("--frames").unwrap_err();
	assert!(err.to_string().contains("--frames"));
    }

    #[test]
    fn test_rejects_sequence_with_random() {
	assert!(parse("--sequence 1,2 --random 5").is_err());
    }

    #[test]
    fn test_rejects_empty_sweep() {
	assert!(parse("--sweep 0").is_err());
	assert!(parse("--sweep many").is_err());
    }

    #[test]
    fn test_interactive_accepts_sweep_and_quiet() {
	let args = parse("--interactive --sweep 4 --quiet").unwrap();
	assert!(args.interactive());
	assert_eq!(args.sweep(), Some(4));
    }

    #[test]
    fn test_rejects_interactive_with_input_options() {
	for line in [
	    "--interactive --frames 4",
	    "--pages 8 --interactive",
	    "--interactive --sequence 1,2",
	    "--interactive --random 10",
	] {
	    let err = parse(line).unwrap_err();
	    assert!(err.to_string().contains("--interactive"), "{}", line);
	}
    }

    #[test]
    fn test_errors_are_debug_printable() {
	let err = format!("{:?}", parse("--frames 2 --bogus"));
	assert!(err.contains("invalid argument '--bogus'"));
    }
}
