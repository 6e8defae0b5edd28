//! Round-trips mapping state through the two writable outcome fields: the
//! `vendor_guid` tag string and the generated HTML footer at the end of the
//! description.
//!
//! The footer is never edited in place. Every mapping change rebuilds it from
//! the decoded parent-id list plus an id-to-title map recovered from the
//! previous footer items and the title supplied with the edit, so repeated
//! partial edits cannot leak or duplicate list entries.

use std::collections::{HashMap, HashSet};

pub const MAPPED_PREFIX: &str = "MAPPED_TO:";
pub const DESCRIPTION_DIVIDER: &str = "<hr>";

const FOOTER_HEADER: &str = "<b>Alignment:</b>";

/// The two fields written back to the outcome record by a mapping edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingUpdate {
    pub vendor_guid: String,
    pub description: String,
}

/// Splits a guid like `MAPPED_TO:7, 12` into `["7", "12"]`. Empty or absent
/// input decodes to an empty list.
pub fn decode_parents(vendor_guid: &str) -> Vec<String> {
    let raw = vendor_guid.strip_prefix(MAPPED_PREFIX).unwrap_or(vendor_guid);
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

pub fn encode_parents(ids: &[String]) -> String {
    if ids.is_empty() {
        String::new()
    } else {
        format!("{MAPPED_PREFIX}{}", ids.join(","))
    }
}

/// Returns the primary description (text before the divider, trimmed) and
/// whether a footer was present.
pub fn split_description(description: &str) -> (String, bool) {
    match description.split_once(DESCRIPTION_DIVIDER) {
        Some((primary, _)) => (primary.trim().to_owned(), true),
        None => (description.trim().to_owned(), false),
    }
}

pub fn add_mapping(
    vendor_guid: &str,
    description: &str,
    parent_id: &str,
    parent_title: &str,
) -> MappingUpdate {
    let mut parents = dedup_in_order(decode_parents(vendor_guid));
    if !parents.iter().any(|id| id == parent_id) {
        parents.push(parent_id.to_owned());
    }

    let mut titles = footer_titles(description);
    titles.insert(parent_id.to_owned(), parent_title.to_owned());

    let (primary, _) = split_description(description);
    MappingUpdate {
        vendor_guid: encode_parents(&parents),
        description: render_description(&primary, &parents, &titles),
    }
}

/// Removing a parent that is not present is a no-op on the guid; the
/// description is still normalized from the remaining parent list.
pub fn remove_mapping(vendor_guid: &str, description: &str, parent_id: &str) -> MappingUpdate {
    let mut parents = dedup_in_order(decode_parents(vendor_guid));
    parents.retain(|id| id != parent_id);

    let (primary, _) = split_description(description);
    if parents.is_empty() {
        return MappingUpdate {
            vendor_guid: String::new(),
            description: primary,
        };
    }

    let titles = footer_titles(description);
    MappingUpdate {
        vendor_guid: encode_parents(&parents),
        description: render_description(&primary, &parents, &titles),
    }
}

fn dedup_in_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

fn render_description(
    primary: &str,
    parents: &[String],
    titles: &HashMap<String, String>,
) -> String {
    let mut out = String::new();
    out.push_str(primary);
    out.push_str(DESCRIPTION_DIVIDER);
    out.push_str(FOOTER_HEADER);
    out.push_str("<ul>");
    for id in parents {
        match titles.get(id) {
            Some(title) => out.push_str(&format!("<li>{title} (ID: {id})</li>")),
            None => out.push_str(&format!("<li>Outcome {id} (ID: {id})</li>")),
        }
    }
    out.push_str("</ul>");
    out
}

/// Recovers the id-to-title map from an existing footer's `<li>` items.
/// Items without the `(ID: ...)` tail are ignored.
fn footer_titles(description: &str) -> HashMap<String, String> {
    let mut titles = HashMap::new();
    let Some((_, footer)) = description.split_once(DESCRIPTION_DIVIDER) else {
        return titles;
    };

    let mut rest = footer;
    while let Some(start) = rest.find("<li>") {
        rest = &rest[start + "<li>".len()..];
        let Some(end) = rest.find("</li>") else {
            break;
        };
        let item = rest[..end].trim();
        rest = &rest[end + "</li>".len()..];

        if let Some((title, tail)) = item.rsplit_once(" (ID: ")
            && let Some(id) = tail.strip_suffix(')')
        {
            titles.insert(id.trim().to_owned(), title.trim().to_owned());
        }
    }
    titles
}
