//! Flat walks over the account hierarchy that skip the tree shape: a
//! mapped/orphan summary and a title search, both over the direct
//! `outcome_group_links` listing of each account.

use anyhow::Context as _;
use serde::Serialize;
use serde_json::Value;

use crate::cli::{SearchArgs, SummaryArgs};
use crate::client::CanvasClient;
use crate::codec::MAPPED_PREFIX;
use crate::config::CanvasConfig;

/// An outcome linked into some account, tagged with that account's name.
/// Outcomes linked in several accounts appear once per account.
#[derive(Debug, Clone, Serialize)]
pub struct LinkedOutcome {
    pub id: i64,
    pub title: String,
    pub account: String,
}

#[derive(Debug, Default, Serialize)]
pub struct OutcomeSummary {
    pub mapped: Vec<LinkedOutcome>,
    pub orphans: Vec<LinkedOutcome>,
}

/// Classifies every directly linked outcome under the account and its
/// descendants as mapped (guid carries the mapping marker) or orphaned.
pub fn collect_all(client: &CanvasClient, account_id: i64) -> anyhow::Result<OutcomeSummary> {
    let mut summary = OutcomeSummary::default();
    visit(client, account_id, &mut |outcome, vendor_guid| {
        if vendor_guid.contains(MAPPED_PREFIX) {
            summary.mapped.push(outcome);
        } else {
            summary.orphans.push(outcome);
        }
    })?;
    Ok(summary)
}

/// Emits outcomes whose title contains `query` (case-insensitive), in
/// traversal order. No ranking.
pub fn search(
    client: &CanvasClient,
    account_id: i64,
    query: &str,
) -> anyhow::Result<Vec<LinkedOutcome>> {
    let needle = query.to_lowercase();
    let mut results = Vec::new();
    visit(client, account_id, &mut |outcome, _vendor_guid| {
        if outcome.title.to_lowercase().contains(&needle) {
            results.push(outcome);
        }
    })?;
    Ok(results)
}

fn visit(
    client: &CanvasClient,
    account_id: i64,
    emit: &mut impl FnMut(LinkedOutcome, &str),
) -> anyhow::Result<()> {
    let detail = client
        .account_details(account_id)
        .context("fetch account detail")?;
    let account_name = detail
        .get("name")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("Account {account_id}"));

    let links_url = client.endpoint(&format!("accounts/{account_id}/outcome_group_links"));
    for link in client.paginate(Some(&links_url), false) {
        let raw = link.get("outcome").unwrap_or(&link);
        let Some(id) = raw.get("id").and_then(Value::as_i64) else {
            continue;
        };
        let title = raw
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let vendor_guid = raw
            .get("vendor_guid")
            .and_then(Value::as_str)
            .unwrap_or_default();

        emit(
            LinkedOutcome {
                id,
                title,
                account: account_name.clone(),
            },
            vendor_guid,
        );
    }

    let subs_url = client.endpoint(&format!("accounts/{account_id}/sub_accounts"));
    for sub in client.paginate(Some(&subs_url), false) {
        let Some(sub_id) = sub.get("id").and_then(Value::as_i64) else {
            continue;
        };
        visit(client, sub_id, emit)?;
    }

    Ok(())
}

pub fn run_summary(args: SummaryArgs) -> anyhow::Result<()> {
    let config = CanvasConfig::from_env().context("load canvas config")?;
    let client = CanvasClient::new(&config).context("build canvas client")?;

    let summary = collect_all(&client, args.account_id).context("collect outcomes")?;
    tracing::info!(
        mapped = summary.mapped.len(),
        orphans = summary.orphans.len(),
        "collected outcomes"
    );

    let json = serde_json::to_string_pretty(&summary).context("serialize summary")?;
    println!("{json}");
    Ok(())
}

pub fn run_search(args: SearchArgs) -> anyhow::Result<()> {
    let config = CanvasConfig::from_env().context("load canvas config")?;
    let client = CanvasClient::new(&config).context("build canvas client")?;

    let results = search(&client, args.account_id, &args.query).context("search outcomes")?;
    let json = serde_json::to_string_pretty(&results).context("serialize search results")?;
    println!("{json}");
    Ok(())
}
