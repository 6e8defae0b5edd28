//! Streaming tree crawls: the blocking crawl runs on a worker while its
//! observer pushes events into a channel, and the consumer drains the
//! channel with a read timeout to interleave keep-alives. Dropping the
//! receiver does not cancel a running crawl.

use std::time::Duration;

use anyhow::Context as _;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::cli::StreamArgs;
use crate::client::CanvasClient;
use crate::config::CanvasConfig;
use crate::crawl::{Crawler, Progress};
use crate::tree::TreeNode;

/// How long the consumer waits for progress before emitting a keep-alive.
pub const KEEP_ALIVE_WAIT: Duration = Duration::from_secs(30);

const KEEP_ALIVE_TEXT: &str = "Still working...";

/// One streamed crawl event. `complete` and `error` are terminal.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TreeEvent {
    Info { msg: String },
    Complete { tree: TreeNode },
    Error { msg: String },
}

struct ChannelProgress {
    tx: mpsc::UnboundedSender<TreeEvent>,
}

impl Progress for ChannelProgress {
    fn notify(&self, message: &str) {
        // The receiver may already be gone; the crawl keeps going either way.
        let _ = self.tx.send(TreeEvent::Info {
            msg: message.to_owned(),
        });
    }
}

/// Starts a crawl on a blocking worker and returns the event stream. The
/// stream always ends with exactly one terminal event. The blocking HTTP
/// client is built on the worker, never on a runtime thread.
pub fn spawn_tree_crawl(
    config: CanvasConfig,
    account_id: i64,
) -> mpsc::UnboundedReceiver<TreeEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::task::spawn_blocking(move || {
        let observer = ChannelProgress { tx: tx.clone() };
        let result = CanvasClient::new(&config)
            .and_then(|client| Crawler::new(&client, Some(&observer)).build_tree(account_id));

        let terminal = match result {
            Ok(tree) => TreeEvent::Complete { tree },
            Err(err) => TreeEvent::Error {
                msg: format!("{err:#}"),
            },
        };
        let _ = tx.send(terminal);
    });

    rx
}

/// Waits for the next stream event with the given read timeout. A quiet
/// stretch yields a keep-alive info event instead; `None` means the worker
/// hung up without a terminal event.
pub async fn next_event(
    events: &mut mpsc::UnboundedReceiver<TreeEvent>,
    keep_alive_wait: Duration,
) -> Option<TreeEvent> {
    match tokio::time::timeout(keep_alive_wait, events.recv()).await {
        Ok(event) => event,
        Err(_) => Some(TreeEvent::Info {
            msg: KEEP_ALIVE_TEXT.to_owned(),
        }),
    }
}

/// Drains the stream, printing one JSON event per line until a terminal
/// event arrives.
pub async fn run(args: StreamArgs) -> anyhow::Result<()> {
    let config = CanvasConfig::from_env().context("load canvas config")?;

    let mut events = spawn_tree_crawl(config, args.account_id);
    loop {
        let event = match next_event(&mut events, KEEP_ALIVE_WAIT).await {
            Some(event) => event,
            None => anyhow::bail!("crawl worker exited without a terminal event"),
        };

        let line = serde_json::to_string(&event).context("serialize stream event")?;
        println!("{line}");

        match event {
            TreeEvent::Complete { .. } => return Ok(()),
            TreeEvent::Error { msg } => anyhow::bail!("crawl failed: {msg}"),
            TreeEvent::Info { .. } => {}
        }
    }
}
