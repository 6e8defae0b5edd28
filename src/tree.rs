use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::codec;

/// One node of the display tree. Serializes with a `type` tag of `folder` or
/// `outcome`, matching what the tree consumers render.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Folder(FolderNode),
    Outcome(OutcomeNode),
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderNode {
    pub id: i64,
    pub name: String,
    pub is_account: bool,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeNode {
    pub id: i64,
    pub ref_code: String,
    pub display_name: String,
    pub description: String,
    pub is_mapped: bool,
    pub parent_ids: Vec<String>,
}

impl TreeNode {
    fn is_folder(&self) -> bool {
        matches!(self, TreeNode::Folder(_))
    }

    fn key(&self) -> (&'static str, i64) {
        match self {
            TreeNode::Folder(folder) => ("folder", folder.id),
            TreeNode::Outcome(outcome) => ("outcome", outcome.id),
        }
    }

    fn sort_label(&self) -> &str {
        match self {
            TreeNode::Folder(folder) => &folder.name,
            TreeNode::Outcome(outcome) => &outcome.display_name,
        }
    }
}

/// Formats one raw outcome record into a leaf node. A record without an `id`
/// yields `None` and is silently skipped by callers.
pub fn format_outcome_node(raw: &Value) -> Option<OutcomeNode> {
    let record = raw.as_object()?;
    let id = record.get("id")?.as_i64()?;

    let ref_code = record
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    let display_name = match record.get("display_name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ if !ref_code.is_empty() => ref_code.clone(),
        _ => format!("ID: {id}"),
    };

    let full_description = record
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let (description, _) = codec::split_description(full_description);

    let vendor_guid = record
        .get("vendor_guid")
        .and_then(Value::as_str)
        .unwrap_or_default();

    // Anti-self-reference guard: a guid naming the outcome's own id or its
    // own ref_code never shows up as a parent.
    let own_id = id.to_string();
    let parent_ids: Vec<String> = codec::decode_parents(vendor_guid)
        .into_iter()
        .filter(|value| *value != own_id && *value != ref_code)
        .collect();

    Some(OutcomeNode {
        id,
        ref_code,
        display_name,
        description,
        is_mapped: !parent_ids.is_empty(),
        parent_ids,
    })
}

/// Keeps the first occurrence of each (type, id) pair.
pub fn dedup_children(children: Vec<TreeNode>) -> Vec<TreeNode> {
    let mut seen = HashSet::new();
    children
        .into_iter()
        .filter(|child| seen.insert(child.key()))
        .collect()
}

/// Folders before leaves, then case-insensitive by display label. Stable, so
/// equal labels keep their traversal order.
pub fn sort_children(children: &mut [TreeNode]) {
    children.sort_by_key(|child| (!child.is_folder(), child.sort_label().to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: i64, name: &str) -> TreeNode {
        TreeNode::Folder(FolderNode {
            id,
            name: name.to_owned(),
            is_account: false,
            children: Vec::new(),
        })
    }

    fn outcome(id: i64, name: &str) -> TreeNode {
        TreeNode::Outcome(OutcomeNode {
            id,
            ref_code: name.to_owned(),
            display_name: name.to_owned(),
            description: String::new(),
            is_mapped: false,
            parent_ids: Vec::new(),
        })
    }

    #[test]
    fn format_outcome_node_filters_self_references() {
        let raw = serde_json::json!({
            "id": 5,
            "title": "X",
            "vendor_guid": "MAPPED_TO:5,Y",
            "description": "desc",
        });

        let node = format_outcome_node(&raw).expect("format node");
        assert_eq!(node.parent_ids, vec!["Y"]);
        assert!(node.is_mapped);
    }

    #[test]
    fn format_outcome_node_filters_own_ref_code() {
        let raw = serde_json::json!({
            "id": 5,
            "title": "X",
            "vendor_guid": "MAPPED_TO:X,7",
        });

        let node = format_outcome_node(&raw).expect("format node");
        assert_eq!(node.parent_ids, vec!["7"]);
    }

    #[test]
    fn format_outcome_node_without_id_is_none() {
        assert!(format_outcome_node(&serde_json::json!({"title": "X"})).is_none());
        assert!(format_outcome_node(&serde_json::json!("not an object")).is_none());
    }

    #[test]
    fn display_name_falls_back_to_ref_code_then_id() {
        let raw = serde_json::json!({"id": 9, "title": "SLO 1"});
        assert_eq!(
            format_outcome_node(&raw).expect("format node").display_name,
            "SLO 1"
        );

        let raw = serde_json::json!({"id": 9});
        assert_eq!(
            format_outcome_node(&raw).expect("format node").display_name,
            "ID: 9"
        );
    }

    #[test]
    fn description_stops_at_the_divider() {
        let raw = serde_json::json!({
            "id": 9,
            "title": "SLO 1",
            "description": "Primary text <hr><b>Alignment:</b><ul></ul>",
        });

        assert_eq!(
            format_outcome_node(&raw).expect("format node").description,
            "Primary text"
        );
    }

    #[test]
    fn dedup_children_keeps_the_first_occurrence() {
        let deduped = dedup_children(vec![
            outcome(1, "first"),
            folder(1, "same id, different type"),
            outcome(1, "second"),
        ]);

        assert_eq!(deduped.len(), 2);
        let TreeNode::Outcome(kept) = &deduped[0] else {
            panic!("expected outcome first");
        };
        assert_eq!(kept.display_name, "first");
    }

    #[test]
    fn sort_children_puts_folders_first_then_case_insensitive() {
        let mut children = vec![outcome(1, "b"), folder(2, "A"), outcome(3, "a")];
        sort_children(&mut children);

        let labels: Vec<&str> = children.iter().map(|c| c.sort_label()).collect();
        assert_eq!(labels, vec!["A", "a", "b"]);
        assert!(children[0].is_folder());
    }
}
