use clap::{Args, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

use streamprims_channel::DEFAULT_PIPE_CAPACITY;
use streamprims_frame::DEFAULT_MAX_ELEMENT_LEN;

use crate::exit::{io_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod encode;
pub mod inspect;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read TLV elements through a bounded pipe and print one record each.
    Inspect(InspectArgs),
    /// Print the canonical encoding of a single element.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Inspect(args) => inspect::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input file. Reads stdin when omitted or `-`.
    #[arg(conflicts_with = "hex")]
    pub input: Option<PathBuf>,
    /// Hex-encoded input instead of a file (whitespace ignored).
    #[arg(long)]
    pub hex: Option<String>,
    /// Capacity of each pipe direction in bytes (0 selects the default).
    #[arg(long, default_value_t = DEFAULT_PIPE_CAPACITY)]
    pub pipe_capacity: usize,
    /// Largest accepted element, header included.
    #[arg(long, default_value_t = DEFAULT_MAX_ELEMENT_LEN)]
    pub max_len: usize,
    /// Stop after N elements.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Tag byte, decimal or 0x-prefixed hex.
    #[arg(long, value_parser = parse_tag)]
    pub tag: u8,
    /// Contents as a UTF-8 string.
    #[arg(long, conflicts_with_all = ["hex", "file"], required_unless_present_any = ["hex", "file"])]
    pub data: Option<String>,
    /// Contents as hex (whitespace ignored).
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read contents from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
    /// Largest element to produce, header included.
    #[arg(long, default_value_t = DEFAULT_MAX_ELEMENT_LEN)]
    pub max_len: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_tag(raw: &str) -> Result<u8, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(digits) => u8::from_str_radix(digits, 16),
        None => raw.parse::<u8>(),
    };
    parsed.map_err(|err| format!("invalid tag {raw:?}: {err}"))
}

pub(crate) fn decode_hex(text: &str) -> CliResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact).map_err(|err| CliError::usage(format!("invalid hex input: {err}")))
}

pub(crate) fn read_file(path: &Path) -> CliResult<Vec<u8>> {
    std::fs::read(path).map_err(|err| io_error(&format!("read {}", path.display()), err))
}

pub(crate) fn read_stdin() -> CliResult<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin()
        .lock()
        .read_to_end(&mut buf)
        .map_err(|err| io_error("read stdin", err))?;
    Ok(buf)
}
