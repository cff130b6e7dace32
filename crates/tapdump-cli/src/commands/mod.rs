//! Subcommand implementations.

pub mod hex;
pub mod listen;
pub mod simulate;

use crate::output::{OutputFormat, render_event};
use anyhow::Result;
use tapdump_acquisition::{AcquisitionEvent, AcquisitionHandle};

/// Print one event to stdout.
pub fn print_event(event: &AcquisitionEvent, format: OutputFormat) -> Result<()> {
    if let Some(rendered) = render_event(event, format)? {
        println!("{rendered}");
    }
    Ok(())
}

/// Print events until the controller stops or Ctrl-C is pressed.
pub async fn print_until_interrupted(
    mut handle: AcquisitionHandle,
    format: OutputFormat,
) -> Result<()> {
    loop {
        tokio::select! {
            event = handle.recv() => match event {
                Some(event) => print_event(&event, format)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping");
                break;
            }
        }
    }
    handle.shutdown().await?;
    Ok(())
}
