//! Conversion orchestrator.
//!
//! This module drives a conversion: it walks the manifest in order, expands
//! each declaration by its count, feeds every occurrence to the topology
//! emitter, and serializes the resulting element list.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{info, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::Settings;
use crate::config_loader::load_manifest;
use crate::error::TopologyError;
use crate::resource::{Manifest, ResourceHook, ResourceInstance};
use crate::topology::{TopologyEmitter, TopologyRecord};
use crate::utils::interpolation::{resource_reference, ResourceId};

/// Visit every resource occurrence of a manifest with a hook.
///
/// Counts are evaluated up front so an oversized or malformed expansion is
/// reported before any hook runs. Returns the number of occurrences visited.
pub fn drive<H: ResourceHook + ?Sized>(manifest: &Manifest, settings: &Settings, hook: &mut H) -> Result<usize> {
    let counts = manifest
        .resources
        .iter()
        .map(|decl| decl.count())
        .collect::<Result<Vec<_>, TopologyError>>()?;

    let total = counts
        .iter()
        .try_fold(0usize, |total, count| total.checked_add(*count))
        .ok_or_else(|| eyre!("Manifest expands to more resource occurrences than can be counted"))?;
    if let Some(max) = settings.max_resources {
        if total > max {
            return Err(eyre!(
                "Manifest expands to {} resource occurrences, above the limit of {}",
                total,
                max
            ));
        }
    }

    for (resource, reference) in unindexed_references(manifest, &counts) {
        warn!(
            "{} refers to {} without an index, but it expands to several occurrences; no edges will reach it",
            resource, reference
        );
    }

    for (decl, count) in manifest.resources.iter().zip(counts) {
        for i in 0..count {
            let index = if count > 1 { Some(i) } else { None };
            let occurrence = ResourceInstance::new(decl, index);
            hook.on_resource(&occurrence)
                .wrap_err_with(|| format!("Failed to process resource {}", occurrence.id()))?;
        }
    }

    Ok(total)
}

/// References to counted declarations that carry no expansion index.
/// Such an identifier matches none of the `.0`, `.1`, ... occurrences.
pub fn unindexed_references(manifest: &Manifest, counts: &[usize]) -> Vec<(ResourceId, ResourceId)> {
    let counted: HashSet<ResourceId> = manifest
        .resources
        .iter()
        .zip(counts)
        .filter(|(_, count)| **count > 1)
        .map(|(decl, _)| decl.base_id())
        .collect();
    if counted.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();
    for decl in &manifest.resources {
        let mut strings = Vec::new();
        for value in decl.attributes.values() {
            collect_strings(value, &mut strings);
        }
        for raw in strings {
            if let Some(reference) = resource_reference(&decl.module_path, raw, &decl.variables) {
                if counted.contains(&reference) {
                    found.push((decl.base_id(), reference));
                }
            }
        }
    }
    found
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_strings(item, out)),
        _ => {}
    }
}

/// Convert a manifest into topology records
pub fn convert(manifest: &Manifest, settings: &Settings) -> Result<Vec<TopologyRecord>> {
    let mut emitter = TopologyEmitter::new(settings);
    let visited = drive(manifest, settings, &mut emitter)?;

    let records = emitter.into_records();
    info!(
        "Visited {} resource occurrences, emitted {} elements",
        visited,
        records.len()
    );
    Ok(records)
}

/// Serialize records as the JSON element array
pub fn render_json(records: &[TopologyRecord]) -> Result<String, TopologyError> {
    serde_json::to_string(records).map_err(|e| TopologyError::Serialization(e.to_string()))
}

/// Load a manifest, convert it, and write the JSON element array
pub fn convert_file(manifest_path: &Path, settings: &Settings, output_path: &Path) -> Result<usize> {
    let manifest = load_manifest(manifest_path)?;
    let records = convert(&manifest, settings)?;
    let json = render_json(&records)?;

    fs::write(output_path, json)
        .wrap_err_with(|| format!("Failed to write topology to '{}'", output_path.display()))?;

    info!("Wrote {} elements to {:?}", records.len(), output_path);
    Ok(records.len())
}
