//! Configuration module.
//!
//! This module defines the command-line interface of the `minisym` inspection tool using `clap`.

use clap::Parser;
use std::path::PathBuf;

use crate::layout::DEFAULT_BASE;

/// Resolve addresses to the nearest preceding minimal symbol of the given object files.
///
/// Each object file, and each member of an archive, is loaded as a separate container.
/// Relocatable objects are placed page-aligned one after another starting at `--base`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Object files or archives to load
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Address to resolve (hex with 0x prefix, or decimal)
    #[arg(short, long = "address", value_parser = parse_address)]
    pub addresses: Vec<u64>,

    /// Load address for relocatable inputs
    #[arg(long, default_value_t = DEFAULT_BASE, value_parser = parse_address)]
    pub base: u64,

    /// Maximum number of live handles per container
    #[arg(long, default_value_t = u32::MAX as usize)]
    pub handle_limit: usize,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}

pub fn parse_address(arg: &str) -> Result<u64, String> {
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => arg.parse(),
    };
    parsed.map_err(|e| format!("invalid address `{arg}`: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses() {
        assert_eq!(parse_address("0x1800"), Ok(0x1800));
        assert_eq!(parse_address("0XfF"), Ok(0xff));
        assert_eq!(parse_address("4096"), Ok(4096));
        assert!(parse_address("0x").is_err());
        assert!(parse_address("foo").is_err());
    }

    #[test]
    fn parses_command_line() {
        let config =
            Config::try_parse_from(["minisym", "a.o", "-a", "0x1900", "--address", "16"]).unwrap();
        assert_eq!(config.inputs, vec![PathBuf::from("a.o")]);
        assert_eq!(config.addresses, vec![0x1900, 16]);
        assert_eq!(config.base, DEFAULT_BASE);
    }
}
