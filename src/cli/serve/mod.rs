//! HTTP service: canonical redirects, link health and 404 tracking.

mod api;
mod lifecycle;
mod response;

use crate::{cli::common::App, config::cfg, debug, log, notfound::NotFoundLog};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::io::Read;
use std::sync::Arc;
use tiny_http::{Method, Request, Server};

/// Largest request body read, in bytes.
const MAX_BODY: u64 = 1 << 20;

/// Request handler threads.
const WORKERS: usize = 4;

/// State shared by request handlers.
pub struct ServeState {
    app: App,
    not_found: NotFoundLog,
    /// Serializes fix runs so writes never interleave.
    fix_lock: Mutex<()>,
}

impl ServeState {
    pub fn new(app: App) -> Self {
        let not_found = NotFoundLog::new(app.config.serve.not_found_capacity());
        Self {
            app,
            not_found,
            fix_lock: Mutex::new(()),
        }
    }
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
}

/// Bind the HTTP server without starting the request loop
pub fn bind_server() -> Result<BoundServer> {
    let config = cfg();
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    lifecycle::register_server_for_shutdown(Arc::clone(&server));

    log!("serve"; "http://{}", addr);

    Ok(BoundServer { server })
}

impl BoundServer {
    /// Start the request loop (blocking until shutdown).
    pub fn run(self, app: App) -> Result<()> {
        let state = Arc::new(ServeState::new(app));
        run_request_loop(&self.server, state)
    }
}

fn run_request_loop(server: &Server, state: Arc<ServeState>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(WORKERS)
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &state) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(mut request: Request, state: &ServeState) -> Result<()> {
    // Early exit if shutdown requested
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let body = if request.method() == &Method::Post {
        let mut body = String::new();
        let read = request
            .as_reader()
            .take(MAX_BODY)
            .read_to_string(&mut body);
        if read.is_err() {
            let reply = response::Reply::error(400, "request body is not valid UTF-8");
            return response::send(request, reply);
        }
        body
    } else {
        String::new()
    };

    let method = request.method().clone();
    let url = request.url().to_string();
    let reply = api::dispatch(state, &method, &url, &body);
    debug!("serve"; "{} {} {}", method, url, reply.status());
    response::send(request, reply)
}
