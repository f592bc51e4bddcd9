//==================================================================================================
// Configuration
//==================================================================================================
#![deny(clippy::all)]

//==================================================================================================
// Modules
//==================================================================================================
mod args;
mod input;
mod report;

//==================================================================================================
// Imports
//==================================================================================================
use anyhow::{Context, Result};
use args::Args;
use mem_lib::EngineConfig;
use report::Renderer;
use sim_lib::{parse_references, random_references, sweep, Simulation};
use log::{debug, info};
use tokio::runtime::Builder;
use std::{
    io::{self, Write},
    process,
};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
	eprintln!("Error: {:#}", e);
	process::exit(1);
    }
}

fn run() -> Result<()> {
    let raw: Vec<String> = std::env::args().collect();
    let program = raw.first().cloned().unwrap_or_else(|| "fifo_sim".to_string());
    let args: Args = Args::parse(raw)?;

    if args.help() {
	Args::usage(&program);
	return Ok(());
    }

    let (config, references) = if args.interactive() {
	let stdin = io::stdin();
	input::prompt(&mut stdin.lock(), &mut io::stdout())?
    } else {
	let config = EngineConfig::parse(args.frames(), args.pages())?;
	let references = match (args.sequence(), args.random()) {
	    (_, Some(len)) => random_references(len, config.virtual_page_count(), args.seed()),
	    (Some(sequence), None) => parse_references(sequence)?,
	    (None, None) => parse_references(Args::DEFAULT_SEQUENCE)?,
	};
	(config, references)
    };
    debug!("References: {:?}", references);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(max_frames) = args.sweep() {
	info!("Sweeping 1..={} frames over {} references", max_frames, references.len());
	let runtime = Builder::new_current_thread()
	    .enable_all()
	    .build()
	    .context("failed to start the runtime")?;
	let reports = runtime.block_on(sweep(1..=max_frames, config.virtual_page_count(), &references))?;
	report::write_sweep(&mut out, &reports)?;
	out.flush()?;
	return Ok(());
    }

    let mut renderer = Renderer::new(&mut out, args.quiet());
    Simulation::new(0, config, references).run(|event| renderer.render(event));
    renderer.finish()?;

    Ok(())
}
