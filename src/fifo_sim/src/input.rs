//==================================================================================================
// Imports
//==================================================================================================
use ::anyhow::{bail, Context, Result};
use mem_lib::EngineConfig;
use sim_lib::parse_references;
use std::io::{BufRead, Write};

//==================================================================================================
// Functions
//==================================================================================================
/// Asks the operator for the memory sizes and the reference string.
pub fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<(EngineConfig, Vec<i64>)> {
    let frames = ask(input, output, "Number of physical frames: ")?;
    let pages = ask(input, output, "Number of virtual pages: ")?;
    let config = EngineConfig::parse(&frames, &pages)?;

    let references = ask(input, output, "Page references (space or comma separated): ")?;
    let references = parse_references(&references)?;

    Ok((config, references))
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;

    let mut line = String::new();
    let read = input
	.read_line(&mut line)
	.context("failed to read from stdin")?;
    if read == 0 {
	bail!("input ended before '{}' was answered", question.trim_end_matches(": "));
    }
    Ok(line.trim().to_string())
}
