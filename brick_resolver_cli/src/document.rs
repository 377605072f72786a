// Plan documents on disk.
//
// The generator hands over either a bare JSON array of placements or an
// object with a `steps` array (the shape the app stores, with other fields
// such as a title alongside, which are ignored here). Output is always the
// object form: `{ "steps": [...], "report": {...} }`, i.e. a serialized
// `Resolution`.

use std::io::{Read, Write};

use brick_resolver::{Placement, Resolution};
use serde::Deserialize;

use crate::CliError;

/// Either accepted input shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PlanDocument {
    Bare(Vec<Placement>),
    Wrapped { steps: Vec<Placement> },
}

impl PlanDocument {
    pub fn into_steps(self) -> Vec<Placement> {
        match self {
            PlanDocument::Bare(steps) | PlanDocument::Wrapped { steps } => steps,
        }
    }
}

/// Parse a plan document from `reader`. `source` names it in errors.
pub fn read_plan(mut reader: impl Read, source: &str) -> Result<Vec<Placement>, CliError> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| CliError::io(source, e))?;
    let doc: PlanDocument = serde_json::from_str(&text).map_err(|e| CliError::Json {
        source_name: source.to_string(),
        source: e,
    })?;
    Ok(doc.into_steps())
}

/// Serialize a resolution, followed by a newline.
pub fn write_resolution(
    mut writer: impl Write,
    resolution: &Resolution,
    pretty: bool,
    target: &str,
) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(resolution)
    } else {
        serde_json::to_string(resolution)
    }
    .map_err(|e| CliError::Json {
        source_name: target.to_string(),
        source: e,
    })?;
    writeln!(writer, "{json}").map_err(|e| CliError::io(target, e))
}
