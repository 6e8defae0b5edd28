use std::time::Duration;

use anyhow::Context as _;
use reqwest::blocking::{Client, Response};
use reqwest::header::LINK;
use serde_json::Value;

use crate::config::CanvasConfig;

/// Authenticated handle on one Canvas instance. Cheap to clone; the inner
/// `reqwest` client is shared.
#[derive(Debug, Clone)]
pub struct CanvasClient {
    http: Client,
    base_url: String,
    token: String,
}

impl CanvasClient {
    pub fn new(config: &CanvasConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("build canvas http client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            token: config.token.clone(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, url: &str) -> reqwest::Result<Response> {
        self.http.get(url).bearer_auth(&self.token).send()
    }

    pub fn account_details(&self, account_id: i64) -> anyhow::Result<Value> {
        let url = self.endpoint(&format!("accounts/{account_id}"));
        let response = self.get(&url).with_context(|| format!("GET {url}"))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("account {account_id} not reachable ({status})");
        }
        response.json().context("parse account detail")
    }

    /// A missing outcome is fatal to the calling operation, unlike a missing
    /// page inside [`Self::paginate`].
    pub fn outcome_details(&self, outcome_id: i64) -> anyhow::Result<Value> {
        let url = self.endpoint(&format!("outcomes/{outcome_id}"));
        let response = self.get(&url).with_context(|| format!("GET {url}"))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("outcome {outcome_id} not found ({status})");
        }
        response.json().context("parse outcome detail")
    }

    pub fn update_outcome(
        &self,
        outcome_id: i64,
        vendor_guid: &str,
        description: &str,
    ) -> anyhow::Result<Value> {
        let url = self.endpoint(&format!("outcomes/{outcome_id}"));
        let body = serde_json::json!({
            "vendor_guid": vendor_guid,
            "description": description,
        });

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .with_context(|| format!("PUT {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("update outcome {outcome_id} failed ({status})");
        }
        response.json().context("parse updated outcome")
    }

    /// Drains a `Link: <...>; rel="next"` paginated listing into one vector.
    ///
    /// Degradation contract: a non-success page ends pagination with the
    /// items collected so far; a transport-level failure yields an empty
    /// vector. Neither is an error to the caller. `silent` downgrades the
    /// warning to debug for probe-style calls that are expected to miss.
    pub fn paginate(&self, start: Option<&str>, silent: bool) -> Vec<Value> {
        let Some(start) = start else {
            return Vec::new();
        };

        let mut url = start.to_owned();
        let mut results = Vec::new();
        loop {
            let response = match self.get(&url) {
                Ok(response) => response,
                Err(err) => {
                    if silent {
                        tracing::debug!(%url, ?err, "page fetch failed");
                    } else {
                        tracing::warn!(%url, ?err, "page fetch failed");
                    }
                    return Vec::new();
                }
            };

            let status = response.status();
            if !status.is_success() {
                if silent {
                    tracing::debug!(%url, %status, "api error while paging");
                } else {
                    tracing::warn!(%url, %status, "api error while paging");
                }
                break;
            }

            let next = next_page_url(
                response
                    .headers()
                    .get(LINK)
                    .and_then(|value| value.to_str().ok()),
            );

            match response.json::<Value>() {
                Ok(Value::Array(items)) => results.extend(items),
                Ok(_) => {}
                Err(err) => {
                    if silent {
                        tracing::debug!(%url, ?err, "page body was not json");
                    } else {
                        tracing::warn!(%url, ?err, "page body was not json");
                    }
                    return Vec::new();
                }
            }

            match next {
                Some(next) => url = next,
                None => break,
            }
        }

        results
    }
}

/// Extracts the `rel="next"` target from a `Link` header, if any.
pub(crate) fn next_page_url(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;
    for entry in header.split(',') {
        let mut pieces = entry.split(';');
        let Some(target) = pieces.next() else {
            continue;
        };
        let target = target.trim();
        if !(target.starts_with('<') && target.ends_with('>')) {
            continue;
        }

        let is_next = pieces.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if is_next {
            return Some(target[1..target.len() - 1].to_owned());
        }
    }
    None
}
