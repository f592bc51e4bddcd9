//==================================================================================================
// Configuration
//==================================================================================================
#![deny(clippy::all)]

//==================================================================================================
// Imports
//==================================================================================================
use log::debug;
use std::{
    error::Error,
    fmt,
};

//==================================================================================================
// Aliases
//==================================================================================================
/// Number of a page in the virtual address space.
pub type VirtualPage = usize;
/// Index of a slot in the physical frame pool.
pub type FrameNumber = usize;

//==================================================================================================
// Enum
//==================================================================================================
/// Raised when the engine is asked to build memories that cannot exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A size was zero or negative.
    NonPositive {
	/// Which size was rejected (`"frame count"` or `"virtual page count"`)
	field: &'static str,
	/// The rejected value
	value: i64,
    },
    /// A size could not be read as an integer at all.
    NotAnInteger {
	field: &'static str,
	raw: String,
    },
}

//==================================================================================================
// Structures
//==================================================================================================
/// Validated sizes of the two memories being simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig
{
    /// Number of physical frames (private field)
    frame_count		: usize,
    /// Number of virtual pages (private field)
    virtual_page_count	: usize,
}

//==================================================================================================
// Implementations
//==================================================================================================
impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	match self {
	    ConfigurationError::NonPositive { field, value } => {
		write!(f, "{} must be a positive integer, got {}", field, value)
	    }
	    ConfigurationError::NotAnInteger { field, raw } => {
		write!(f, "{} must be a positive integer, got '{}'", field, raw)
	    }
	}
    }
}

impl Error for ConfigurationError {}

impl EngineConfig
{
    const FRAME_COUNT: &'static str = "frame count";
    const VIRTUAL_PAGE_COUNT: &'static str = "virtual page count";

    /// Validates the memory sizes of a simulation.
    ///
    /// # Arguments
    /// * `frame_count`        - Number of physical frames;
    /// * `virtual_page_count` - Number of virtual pages;
    ///
    /// # Returns
    ///
    /// * `Ok(EngineConfig)`          - if both sizes are strictly positive
    /// * `Err(ConfigurationError)`   - otherwise
    ///
    /// A virtual space smaller than the frame pool is accepted; the surplus frames simply stay free.
    pub fn new(frame_count: i64, virtual_page_count: i64) -> Result<Self, ConfigurationError>
    {
	let frame_count = Self::positive(Self::FRAME_COUNT, frame_count)?;
	let virtual_page_count = Self::positive(Self::VIRTUAL_PAGE_COUNT, virtual_page_count)?;

	debug!(
	    "Configured {} frames over {} virtual pages",
	    frame_count,
	    virtual_page_count,
	);

	Ok(Self {
	    frame_count,
	    virtual_page_count,
	})
    }

    /// Same as [`EngineConfig::new`], from operator-supplied text.
    ///
    /// Text that is not an integer (`"2.5"`, `"three"`, `""`) is a configuration error too.
    pub fn parse(frame_count: &str, virtual_page_count: &str) -> Result<Self, ConfigurationError>
    {
	let frame_count = Self::integer(Self::FRAME_COUNT, frame_count)?;
	let virtual_page_count = Self::integer(Self::VIRTUAL_PAGE_COUNT, virtual_page_count)?;
	Self::new(frame_count, virtual_page_count)
    }

    pub fn frame_count(&self) -> usize {
	self.frame_count
    }

    pub fn virtual_page_count(&self) -> usize {
	self.virtual_page_count
    }

    fn positive(field: &'static str, value: i64) -> Result<usize, ConfigurationError> {
	if value <= 0 {
	    return Err(ConfigurationError::NonPositive { field, value });
	}
	usize::try_from(value).map_err(|_| ConfigurationError::NonPositive { field, value })
    }

    fn integer(field: &'static str, raw: &str) -> Result<i64, ConfigurationError> {
	raw.trim()
	    .parse::<i64>()
	    .map_err(|_| ConfigurationError::NotAnInteger {
		field,
		raw: raw.to_string(),
	    })
    }
}

//==================================================================================================
// Tests
//==================================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_positive_sizes() {
	let config = EngineConfig::new(3, 10).unwrap();
	assert_eq!(config.frame_count(), 3);
	assert_eq!(config.virtual_page_count(), 10);
    }

    #[test]
    fn test_more_frames_than_pages_is_legal() {
	let config = EngineConfig::new(8, 2).unwrap();
	assert_eq!(config.frame_count(), 8);
	assert_eq!(config.virtual_page_count(), 2);
    }

    #[test]
    fn test_rejects_zero() {
	assert_eq!(
	    EngineConfig::new(0, 10),
	    Err(ConfigurationError::NonPositive { field: "frame count", value: 0 })
	);
	assert_eq!(
	    EngineConfig::new(3, 0),
	    Err(ConfigurationError::NonPositive { field: "virtual page count", value: 0 })
	);
    }

    #[test]
    fn test_rejects_negative() {
	assert!(EngineConfig::new(-1, 10).is_err());
	assert!(EngineConfig::new(3, -7).is_err());
    }

    #[test]
    fn test_parse_trims_whitespace() {
	let config = EngineConfig::parse(" 4 ", "16\n").unwrap();
	assert_eq!(config, EngineConfig::new(4, 16).unwrap());
    }

    #[test]
    fn test_parse_rejects_non_integers() {
	assert_eq!(
	    EngineConfig::parse("2.5", "10"),
	    Err(ConfigurationError::NotAnInteger { field: "frame count", raw: "2.5".to_string() })
	);
	assert!(EngineConfig::parse("3", "ten").is_err());
	assert!(EngineConfig::parse("", "10").is_err());
    }

    #[test]
    fn test_parse_rejects_non_positive_text() {
	assert!(matches!(
	    EngineConfig::parse("-2", "10"),
	    Err(ConfigurationError::NonPositive { value: -2, .. })
	));
    }

    #[test]
    fn test_error_message_names_the_field() {
	let err = EngineConfig::new(3, 0).unwrap_err();
	assert_eq!(err.to_string(), "virtual page count must be a positive integer, got 0");
    }
}
