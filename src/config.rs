use anyhow::Context as _;
use url::Url;

/// Connection settings for one Canvas instance. Built explicitly and passed
/// into [`crate::client::CanvasClient::new`]; there is no ambient global.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// API root, e.g. `https://school.instructure.com/api/v1`.
    pub base_url: String,
    pub token: String,
}

impl CanvasConfig {
    /// Reads `CANVAS_BASE_URL` (full API root, mainly for tests and
    /// self-hosted instances) or `CANVAS_DOMAIN` (hostname only), plus
    /// `CANVAS_TOKEN`.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = match std::env::var("CANVAS_BASE_URL") {
            Ok(raw) => raw,
            Err(_) => {
                let domain = std::env::var("CANVAS_DOMAIN")
                    .context("set CANVAS_BASE_URL or CANVAS_DOMAIN")?;
                format!("https://{domain}/api/v1")
            }
        };
        Url::parse(&base_url).with_context(|| format!("parse canvas base url: {base_url}"))?;

        let token = std::env::var("CANVAS_TOKEN").context("set CANVAS_TOKEN")?;

        Ok(Self { base_url, token })
    }
}
