//! Read-modify-write mapping operations against single outcome records. The
//! codec owns the field encoding; this module owns the fetch/guard/update
//! sequence around it.

use anyhow::Context as _;
use serde_json::Value;

use crate::cli::{MapArgs, UnmapArgs};
use crate::client::CanvasClient;
use crate::codec;
use crate::config::CanvasConfig;

/// Maps `outcome_id` to the parent outcome, returning the updated record.
/// Fails if the outcome does not exist or if the mapping would point the
/// outcome at itself.
pub fn map_outcome(
    client: &CanvasClient,
    outcome_id: i64,
    parent_id: i64,
    parent_title: &str,
) -> anyhow::Result<Value> {
    let detail = client
        .outcome_details(outcome_id)
        .context("fetch outcome detail")?;

    let parent = parent_id.to_string();
    let ref_code = detail.get("title").and_then(Value::as_str).unwrap_or_default();
    if parent_id == outcome_id || parent == ref_code {
        anyhow::bail!("cannot map outcome {outcome_id} to itself");
    }

    let vendor_guid = detail
        .get("vendor_guid")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let description = detail
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let update = codec::add_mapping(vendor_guid, description, &parent, parent_title);
    tracing::debug!(outcome_id, parent_id, parent_title, "writing mapping");

    client
        .update_outcome(outcome_id, &update.vendor_guid, &update.description)
        .context("write mapped outcome")
}

/// Removes one mapping link. Unmapping a parent that is not present leaves
/// the guid unchanged.
pub fn unmap_outcome(
    client: &CanvasClient,
    outcome_id: i64,
    parent_id: i64,
    parent_title: &str,
) -> anyhow::Result<Value> {
    let detail = client
        .outcome_details(outcome_id)
        .context("fetch outcome detail")?;

    let vendor_guid = detail
        .get("vendor_guid")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let description = detail
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let update = codec::remove_mapping(vendor_guid, description, &parent_id.to_string());
    tracing::debug!(outcome_id, parent_id, parent_title, "removing mapping");

    client
        .update_outcome(outcome_id, &update.vendor_guid, &update.description)
        .context("write unmapped outcome")
}

pub fn run_map(args: MapArgs) -> anyhow::Result<()> {
    let config = CanvasConfig::from_env().context("load canvas config")?;
    let client = CanvasClient::new(&config).context("build canvas client")?;

    let updated = map_outcome(&client, args.outcome_id, args.parent_id, &args.parent_title)
        .context("map outcome")?;

    let json = serde_json::to_string_pretty(&updated).context("serialize updated outcome")?;
    println!("{json}");
    Ok(())
}

pub fn run_unmap(args: UnmapArgs) -> anyhow::Result<()> {
    let config = CanvasConfig::from_env().context("load canvas config")?;
    let client = CanvasClient::new(&config).context("build canvas client")?;

    let updated = unmap_outcome(&client, args.outcome_id, args.parent_id, &args.parent_title)
        .context("unmap outcome")?;

    let json = serde_json::to_string_pretty(&updated).context("serialize updated outcome")?;
    println!("{json}");
    Ok(())
}
