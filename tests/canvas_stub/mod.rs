#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use serde_json::Value;

/// One canned response, keyed by path-plus-query below the `/api/v1` root.
/// `next` points at the following page's route (or an absolute URL); the
/// stub turns it into a `Link: <...>; rel="next"` header.
#[derive(Debug, Clone)]
pub struct StubPage {
    pub status: u16,
    pub body: Value,
    pub next: Option<String>,
    pub delay: Option<Duration>,
}

impl StubPage {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            body,
            next: None,
            delay: None,
        }
    }

    pub fn with_next(mut self, next: &str) -> Self {
        self.next = Some(next.to_owned());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn error(status: u16) -> Self {
        Self {
            status,
            body: Value::Null,
            next: None,
            delay: None,
        }
    }
}

/// Minimal fake Canvas API: canned GET routes plus captured PUT bodies.
pub struct CanvasStub {
    pub base_url: String,
    pub puts: Arc<Mutex<Vec<(String, Value)>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CanvasStub {
    pub fn spawn(routes: HashMap<String, StubPage>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start canvas stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/api/v1");

        let puts = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread_puts = Arc::clone(&puts);
        let thread_base = base_url.clone();
        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let route = url
                    .strip_prefix("/api/v1/")
                    .unwrap_or(url.as_str())
                    .to_owned();

                if request.method() == &tiny_http::Method::Put {
                    let mut body = String::new();
                    if std::io::Read::read_to_string(request.as_reader(), &mut body).is_err() {
                        let _ = request.respond(
                            tiny_http::Response::from_string("invalid request body")
                                .with_status_code(400),
                        );
                        continue;
                    }
                    let parsed: Value = match serde_json::from_str(&body) {
                        Ok(value) => value,
                        Err(_) => {
                            let _ = request.respond(
                                tiny_http::Response::from_string("invalid json")
                                    .with_status_code(400),
                            );
                            continue;
                        }
                    };

                    thread_puts
                        .lock()
                        .expect("lock captured puts")
                        .push((route.clone(), parsed.clone()));

                    // Echo the stored record with the id from the path.
                    let id = route
                        .rsplit('/')
                        .next()
                        .and_then(|segment| segment.parse::<i64>().ok())
                        .unwrap_or_default();
                    let mut echoed = parsed;
                    if let Some(record) = echoed.as_object_mut() {
                        record.insert("id".to_owned(), serde_json::json!(id));
                    }
                    let _ = request.respond(json_response(200, &echoed, None));
                    continue;
                }

                match routes.get(&route) {
                    Some(page) if page.status < 300 => {
                        if let Some(delay) = page.delay {
                            thread::sleep(delay);
                        }
                        let link = page.next.as_deref().map(|next| {
                            if next.starts_with("http") {
                                format!("<{next}>; rel=\"next\"")
                            } else {
                                format!("<{thread_base}/{next}>; rel=\"next\"")
                            }
                        });
                        let _ =
                            request.respond(json_response(page.status, &page.body, link.as_deref()));
                    }
                    Some(page) => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("stub error")
                                .with_status_code(page.status),
                        );
                    }
                    None => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("not found").with_status_code(404),
                        );
                    }
                }
            }
        });

        Self {
            base_url,
            puts,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn config(&self) -> outcome_atlas::config::CanvasConfig {
        outcome_atlas::config::CanvasConfig {
            base_url: self.base_url.clone(),
            token: "test-token".to_owned(),
        }
    }
}

impl Drop for CanvasStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn json_response(status: u16, body: &Value, link: Option<&str>) -> tiny_http::Response<Cursor<Vec<u8>>> {
    let mut response =
        tiny_http::Response::from_string(body.to_string()).with_status_code(status);

    let content_type =
        tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
            .expect("build content-type header");
    response = response.with_header(content_type);

    if let Some(link) = link {
        let header =
            tiny_http::Header::from_bytes(&b"Link"[..], link.as_bytes()).expect("build link header");
        response = response.with_header(header);
    }

    response
}
