//! Rendering of acquisition events for the terminal.

use anyhow::Result;
use clap::ValueEnum;
use serde_json::{Value, json};
use tapdump_acquisition::AcquisitionEvent;
use tapdump_mifare::CardSnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable lines and the annotated dump.
    #[default]
    Text,

    /// One JSON document per event.
    Json,
}

/// Render an event, or `None` for events with nothing to show.
pub fn render_event(event: &AcquisitionEvent, format: OutputFormat) -> Result<Option<String>> {
    match format {
        OutputFormat::Text => Ok(render_text(event)),
        OutputFormat::Json => render_json(event)
            .map(|value| value.and_then(|v| serde_json::to_string_pretty(&v)))
            .transpose()
            .map_err(Into::into),
    }
}

fn render_text(event: &AcquisitionEvent) -> Option<String> {
    match event {
        AcquisitionEvent::CardDetected(detection) => Some(format!(
            "Card detected: {} ({}) at {}",
            detection.identity,
            detection.card_type,
            detection.identity.discovered_at().to_rfc3339()
        )),
        AcquisitionEvent::NotSupported => Some("NFC is not supported on this host".to_string()),
        AcquisitionEvent::Disabled => Some("NFC adapter is disabled".to_string()),
        AcquisitionEvent::CardRead(snapshot) => Some(snapshot_text(snapshot)),
        AcquisitionEvent::ReadFailed { identity, error } => {
            Some(format!("Read of {identity} failed: {error}"))
        }
        _ => None,
    }
}

fn snapshot_text(snapshot: &CardSnapshot) -> String {
    let mut out = format!(
        "{} {} ({} bytes): {}/{} sectors authenticated, {} faulted blocks\n\n",
        snapshot.identity(),
        snapshot.card_type(),
        snapshot.size_bytes(),
        snapshot.authenticated_sectors(),
        snapshot.sector_count(),
        snapshot.faulted_blocks(),
    );
    out.push_str(&snapshot.annotated_dump());
    out
}

fn render_json(event: &AcquisitionEvent) -> Option<Result<Value, serde_json::Error>> {
    let body = match event {
        AcquisitionEvent::CardDetected(detection) => serde_json::to_value(detection),
        AcquisitionEvent::CardRead(snapshot) => serde_json::to_value(snapshot),
        AcquisitionEvent::ReadFailed { identity, error } => Ok(json!({
            "identity": identity,
            "error": error.to_string(),
        })),
        AcquisitionEvent::NotSupported | AcquisitionEvent::Disabled => Ok(json!({})),
        _ => return None,
    };
    Some(body.map(|body| json!({ "event": event.kind(), "data": body })))
}
