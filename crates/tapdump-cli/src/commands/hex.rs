//! `tapdump hex`: expose the hex codec.

use anyhow::{Context, Result};
use clap::Subcommand;
use tapdump_core::{bytes_to_hex_with, bytes_to_printable_ascii, hex_to_bytes};

#[derive(Subcommand, Debug)]
pub enum HexCommands {
    /// Render the UTF-8 bytes of TEXT as hex
    Encode {
        text: String,

        /// Separator placed between bytes
        #[arg(short, long, default_value = "")]
        separator: String,
    },

    /// Decode HEX (colons and spaces allowed) and show it as hex and ASCII
    Decode {
        hex: String,
    },
}

pub fn run(command: HexCommands) -> Result<()> {
    match command {
        HexCommands::Encode { text, separator } => {
            println!("{}", encode(&text, &separator));
        }
        HexCommands::Decode { hex } => {
            println!("{}", decode(&hex)?);
        }
    }
    Ok(())
}

fn encode(text: &str, separator: &str) -> String {
    bytes_to_hex_with(text.as_bytes(), separator)
}

fn decode(hex: &str) -> Result<String> {
    let bytes = hex_to_bytes(hex).with_context(|| format!("cannot decode '{hex}'"))?;
    Ok(format!(
        "{}  |{}|",
        bytes_to_hex_with(&bytes, " "),
        bytes_to_printable_ascii(&bytes)
    ))
}
