//! Request routing and JSON endpoints.
//!
//! Everything here is a pure function of the request line, body and shared
//! state, so routing is tested without a socket.

use serde::Deserialize;
use serde_json::json;
use tiny_http::Method;

use super::ServeState;
use super::response::Reply;
use crate::audit::{LinkHealth, persist};
use crate::core::UrlPath;
use crate::log;
use crate::resolve::CheckReport;
use crate::utils::path::strip_query_fragment;

/// Findings returned by a plain GET of the link health endpoints.
const HEALTH_PREVIEW: usize = 20;

/// Entries returned by `/api/not-found`.
const NOT_FOUND_TOP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    ValidateCanonical,
    LinkHealth,
    NotFound,
    Site,
}

impl Route {
    fn of(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/api/validate-canonical" => Self::ValidateCanonical,
            "/api/link-health" | "/api/fix-broken-links" => Self::LinkHealth,
            "/api/not-found" => Self::NotFound,
            _ => Self::Site,
        }
    }
}

/// `{ "urls": [...] }` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UrlsBody {
    Wrapped { urls: Vec<String> },
    Bare(Vec<String>),
}

impl UrlsBody {
    fn into_urls(self) -> Vec<String> {
        match self {
            Self::Wrapped { urls } | Self::Bare(urls) => urls,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Action {
    Scan,
    Fix,
}

#[derive(Debug, Deserialize)]
struct ActionBody {
    #[serde(default = "default_action")]
    action: Action,
}

fn default_action() -> Action {
    Action::Scan
}

/// Route one request.
pub(super) fn dispatch(state: &ServeState, method: &Method, url: &str, body: &str) -> Reply {
    let path = strip_query_fragment(url);
    let read = matches!(method, Method::Get | Method::Head);

    match (Route::of(path), method) {
        (Route::ValidateCanonical, _) if read => validate_samples(state),
        (Route::ValidateCanonical, Method::Post) => validate_posted(state, body),
        (Route::LinkHealth, _) if read => link_health(state, Some(HEALTH_PREVIEW)),
        (Route::LinkHealth, Method::Post) => link_action(state, body),
        (Route::NotFound, _) if read => not_found(state),
        (Route::ValidateCanonical | Route::LinkHealth, _) => Reply::MethodNotAllowed("GET, HEAD, POST"),
        (Route::NotFound, _) => Reply::MethodNotAllowed("GET, HEAD"),
        (Route::Site, _) => site(state, url),
    }
}

fn validate_samples(state: &ServeState) -> Reply {
    let samples = &state.app.config.canonical.samples;
    check_report(state, samples)
}

fn validate_posted(state: &ServeState, body: &str) -> Reply {
    match serde_json::from_str::<UrlsBody>(body) {
        Ok(urls) => check_report(state, &urls.into_urls()),
        Err(_) => Reply::error(400, "expected { \"urls\": [...] } or an array of urls"),
    }
}

fn check_report(state: &ServeState, urls: &[String]) -> Reply {
    let report = CheckReport::new(state.app.resolver.validate_canonical_urls(urls));
    to_json(&report)
}

fn link_action(state: &ServeState, body: &str) -> Reply {
    let parsed = if body.trim().is_empty() {
        Ok(ActionBody {
            action: default_action(),
        })
    } else {
        serde_json::from_str::<ActionBody>(body)
    };

    match parsed {
        Ok(ActionBody {
            action: Action::Scan,
        }) => link_health(state, None),
        Ok(ActionBody { action: Action::Fix }) => fix(state),
        Err(_) => Reply::error(400, "expected { \"action\": \"scan\" | \"fix\" }"),
    }
}

fn link_health(state: &ServeState, limit: Option<usize>) -> Reply {
    let corpus = match state.app.corpus() {
        Ok(corpus) => corpus,
        Err(e) => return internal(&e),
    };
    let findings = state.app.auditor().scan(&corpus);
    to_json(&LinkHealth::new(corpus.len(), findings, limit))
}

fn fix(state: &ServeState) -> Reply {
    // one fix run at a time
    let _guard = state.fix_lock.lock();

    let corpus = match state.app.corpus() {
        Ok(corpus) => corpus,
        Err(e) => return internal(&e),
    };
    let mut outcomes = state.app.auditor().fix(&corpus, None);
    let report = persist(state.app.store.as_ref(), &mut outcomes);
    log!(
        "fix";
        "updated {} of {} documents, {} errors",
        report.summary.blogs_updated,
        report.summary.total_processed,
        report.summary.errors
    );
    to_json(&report)
}

fn not_found(state: &ServeState) -> Reply {
    Reply::ok(json!({
        "total": state.not_found.len(),
        "entries": state.not_found.top(NOT_FOUND_TOP),
    }))
}

/// Redirect to the canonical URL, or record a 404.
fn site(state: &ServeState, url: &str) -> Reply {
    let resolver = &state.app.resolver;
    let path = UrlPath::from_browser(url);

    if !resolver.would_redirect(path.as_str()) {
        state.not_found.record(url);
        return Reply::NotFound;
    }

    match resolver.resolve(path.as_str()) {
        Ok(resolved) => {
            let mut location = resolver.absolute(&resolved, None);
            if !resolved.is_external()
                && let Some((_, query)) = url.split_once('?')
            {
                let query = query.split('#').next().unwrap_or_default();
                if !query.is_empty() {
                    location = format!("{location}?{query}");
                }
            }
            Reply::Redirect {
                location,
                permanent: resolved.permanent,
            }
        }
        Err(e) => internal(&e),
    }
}

fn to_json(value: &impl serde::Serialize) -> Reply {
    match serde_json::to_value(value) {
        Ok(body) => Reply::ok(body),
        Err(e) => internal(&e),
    }
}

fn internal(e: &dyn std::fmt::Display) -> Reply {
    log!("error"; "{:#}", e);
    Reply::internal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::common::tests::app;
    use crate::store::ContentDocument;

    fn state() -> ServeState {
        ServeState::new(app(vec![
            ContentDocument::new("a", "A", r#"<a href="/webseries">x</a>"#),
            ContentDocument::new("b", "B", r#"<a href='/temple-guide'>t</a> <a href="/gone-temple">g</a>"#),
        ]))
    }

    fn json_of(reply: Reply) -> (u16, serde_json::Value) {
        match reply {
            Reply::Json(status, body) => (status, body),
            other => panic!("expected json, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_canonical() {
        let state = state();
        let (status, body) = json_of(dispatch(&state, &Method::Get, "/api/validate-canonical", ""));
        assert_eq!(status, 200);
        assert_eq!(body["summary"]["total"], 2);
        assert_eq!(body["results"][1]["shouldBe"], "https://example.com/latest");

        let (_, body) = json_of(dispatch(
            &state,
            &Method::Post,
            "/api/validate-canonical",
            r#"{"urls": ["/latest"]}"#,
        ));
        assert_eq!(body["summary"]["valid"], 1);

        let (_, body) = json_of(dispatch(&state, &Method::Post, "/api/validate-canonical", r#"["/a/", "/b"]"#));
        assert_eq!(body["summary"]["total"], 2);

        let (status, body) = json_of(dispatch(&state, &Method::Post, "/api/validate-canonical", "{"));
        assert_eq!(status, 400);
        assert!(body["error"].is_string());
    }

    #[test]
    fn test_link_health_routes_share_handler() {
        let state = state();
        let get = |path| json_of(dispatch(&state, &Method::Get, path, ""));
        let (_, a) = get("/api/link-health");
        let (_, b) = get("/api/fix-broken-links/");
        assert_eq!(a, b);
        assert_eq!(a["summary"]["totalBrokenLinks"], 3);
        assert_eq!(a["summary"]["documentsAffected"], 2);
    }

    #[test]
    fn test_link_actions() {
        let state = state();
        let post = |body| dispatch(&state, &Method::Post, "/api/link-health", body);

        let (_, scan) = json_of(post(r#"{"action": "scan"}"#));
        assert_eq!(scan["findings"].as_array().map(Vec::len), Some(3));

        let (status, _) = json_of(post(r#"{"action": "delete"}"#));
        assert_eq!(status, 400);

        let (status, fixed) = json_of(post(r#"{"action": "fix"}"#));
        assert_eq!(status, 200);
        assert_eq!(fixed["success"], true);
        assert_eq!(fixed["summary"]["blogsUpdated"], 2);
        assert_eq!(fixed["summary"]["totalProcessed"], 2);

        let (_, rescan) = json_of(post(""));
        assert_eq!(rescan["summary"]["totalBrokenLinks"], 0);
    }

    #[test]
    fn test_site_redirects_and_records_misses() {
        let state = state();
        let reply = dispatch(&state, &Method::Get, "/old-latest/?ref=x", "");
        assert_eq!(
            reply,
            Reply::Redirect {
                location: "https://example.com/latest?ref=x".into(),
                permanent: false,
            }
        );

        assert_eq!(dispatch(&state, &Method::Get, "/missing", ""), Reply::NotFound);
        assert_eq!(dispatch(&state, &Method::Head, "/missing/", ""), Reply::NotFound);

        let (_, body) = json_of(dispatch(&state, &Method::Get, "/api/not-found", ""));
        assert_eq!(body["total"], 1);
        assert_eq!(body["entries"][0]["path"], "/missing");
        assert_eq!(body["entries"][0]["hits"], 2);
    }

    #[test]
    fn test_method_not_allowed() {
        let state = state();
        assert_eq!(
            dispatch(&state, &Method::Delete, "/api/link-health", "").status(),
            405
        );
        assert_eq!(
            dispatch(&state, &Method::Post, "/api/not-found", "").status(),
            405
        );
    }
}
