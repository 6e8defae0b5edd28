use anyhow::Context as _;
use serde_json::Value;

use crate::cli::TreeArgs;
use crate::client::CanvasClient;
use crate::config::CanvasConfig;
use crate::tree::{self, FolderNode, TreeNode};

/// Sentinel `vendor_guid` marking a group as the account's implicit root
/// container. Such groups are flattened into the account node.
const ROOT_GROUP_GUID: &str = "ROOT";

/// Progress sink injected into a crawl. Synchronous and side-effect only.
pub trait Progress {
    fn notify(&self, message: &str);
}

/// Forwards progress to the log; the default observer for CLI crawls.
pub struct LogProgress;

impl Progress for LogProgress {
    fn notify(&self, message: &str) {
        tracing::info!("{message}");
    }
}

pub struct Crawler<'a> {
    client: &'a CanvasClient,
    observer: Option<&'a dyn Progress>,
}

impl<'a> Crawler<'a> {
    pub fn new(client: &'a CanvasClient, observer: Option<&'a dyn Progress>) -> Self {
        Self { client, observer }
    }

    fn notify(&self, message: &str) {
        if let Some(observer) = self.observer {
            observer.notify(message);
        }
    }

    /// Builds the full display tree for one account, depth first.
    ///
    /// Unreachable listings degrade to partial results inside
    /// [`CanvasClient::paginate`]; an unreachable account detail is fatal to
    /// the whole crawl.
    pub fn build_tree(&self, account_id: i64) -> anyhow::Result<TreeNode> {
        let detail = self
            .client
            .account_details(account_id)
            .context("fetch account detail")?;
        let account_name = detail
            .get("name")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("Account {account_id}"));

        self.notify(&format!("Accessing Account: {account_name}"));

        let mut children = Vec::new();

        let subs_url = self
            .client
            .endpoint(&format!("accounts/{account_id}/sub_accounts"));
        for sub in self.client.paginate(Some(&subs_url), false) {
            let Some(sub_id) = sub.get("id").and_then(Value::as_i64) else {
                continue;
            };
            children.push(self.build_tree(sub_id)?);
        }

        let groups_url = self
            .client
            .endpoint(&format!("accounts/{account_id}/outcome_groups"));
        for group in self.client.paginate(Some(&groups_url), false) {
            let Some(group_id) = group.get("id").and_then(Value::as_i64) else {
                continue;
            };
            let group_title = group
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();

            let contents = self.group_contents(account_id, group_id, &group_title);

            let is_root_group = group.get("vendor_guid").and_then(Value::as_str)
                == Some(ROOT_GROUP_GUID)
                || group_title == account_name;
            if is_root_group {
                children.extend(contents);
            } else {
                children.push(TreeNode::Folder(FolderNode {
                    id: group_id,
                    name: group_title,
                    is_account: false,
                    children: contents,
                }));
            }
        }

        let mut children = tree::dedup_children(children);
        tree::sort_children(&mut children);

        Ok(TreeNode::Folder(FolderNode {
            id: account_id,
            name: account_name,
            is_account: true,
            children,
        }))
    }

    /// Resolves one group's direct outcomes and subgroups, recursing into
    /// the subgroups. The account-scoped listing is preferred (it supports
    /// `outcome_style=full`); some groups are only reachable through the
    /// group-scoped route, so an empty result falls back to that. Both
    /// probes are silent.
    fn group_contents(&self, account_id: i64, group_id: i64, group_title: &str) -> Vec<TreeNode> {
        let mut children = Vec::new();

        let scoped = self.client.endpoint(&format!(
            "accounts/{account_id}/outcome_groups/{group_id}/outcomes?outcome_style=full"
        ));
        let mut outcome_links = self.client.paginate(Some(&scoped), true);
        if outcome_links.is_empty() {
            let fallback = self
                .client
                .endpoint(&format!("outcome_groups/{group_id}/outcomes?outcome_style=full"));
            outcome_links = self.client.paginate(Some(&fallback), true);
        }

        self.notify(&format!(
            "Loading {} items in {group_title}",
            outcome_links.len()
        ));

        for link in &outcome_links {
            // Listing entries usually wrap the record under `outcome`.
            let raw = link.get("outcome").unwrap_or(link);
            if let Some(outcome) = tree::format_outcome_node(raw) {
                children.push(TreeNode::Outcome(outcome));
            }
        }

        let scoped = self.client.endpoint(&format!(
            "accounts/{account_id}/outcome_groups/{group_id}/subgroups"
        ));
        let mut subgroups = self.client.paginate(Some(&scoped), true);
        if subgroups.is_empty() {
            let fallback = self
                .client
                .endpoint(&format!("outcome_groups/{group_id}/subgroups"));
            subgroups = self.client.paginate(Some(&fallback), true);
        }

        for subgroup in subgroups {
            let Some(sub_id) = subgroup.get("id").and_then(Value::as_i64) else {
                continue;
            };
            let sub_title = subgroup
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            let contents = self.group_contents(account_id, sub_id, &sub_title);
            children.push(TreeNode::Folder(FolderNode {
                id: sub_id,
                name: sub_title,
                is_account: false,
                children: contents,
            }));
        }

        // Nested folders get the same ordering and dedup invariant as the
        // account root.
        let mut children = tree::dedup_children(children);
        tree::sort_children(&mut children);
        children
    }
}

pub fn run(args: TreeArgs) -> anyhow::Result<()> {
    let config = CanvasConfig::from_env().context("load canvas config")?;
    let client = CanvasClient::new(&config).context("build canvas client")?;

    let crawler = Crawler::new(&client, Some(&LogProgress));
    let root = crawler
        .build_tree(args.account_id)
        .context("crawl account hierarchy")?;

    let json = serde_json::to_string_pretty(&root).context("serialize tree")?;
    println!("{json}");
    Ok(())
}
