//! Processing request files from disk

use anyhow::Context;
use gradualflow_plugin::{ModifyRequest, ModifyService};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Where a processed response goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    /// `<name>.out.json` next to the request, or in the given directory
    File(Option<PathBuf>),
}

/// Path of the response file for the request at `input`
pub fn output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "request".to_string());
    let name = format!("{}.out.json", stem);
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// Run one request file through `service` on behalf of `client`
///
/// Returns the path written to, if any.
pub fn process_file(
    service: &ModifyService,
    client: Uuid,
    input: &Path,
    destination: &Destination,
) -> anyhow::Result<Option<PathBuf>> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read request {}", input.display()))?;
    let request: ModifyRequest = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse request {}", input.display()))?;

    let response = service
        .handle(client, &request)
        .with_context(|| format!("Failed to process {}", input.display()))?;
    let json = serde_json::to_string_pretty(&response)?;

    match destination {
        Destination::Stdout => {
            println!("{}", json);
            Ok(None)
        }
        Destination::File(dir) => {
            let out = output_path(input, dir.as_deref());
            fs::write(&out, json)
                .with_context(|| format!("Failed to write response {}", out.display()))?;
            tracing::info!("{} -> {}", input.display(), out.display());
            Ok(Some(out))
        }
    }
}
