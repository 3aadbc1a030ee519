//! Router dispatch tests against strategy doubles: URI normalization, the
//! four behaviors, filename derivation, and the error-page boundary.

mod common;

use common::{multipart_payload, structure_with_id, FailingStrategy, RecordingStrategy};
use hsspd::error::ServiceError;
use hsspd::router::{Router, RouterResponse};
use http::Method;
use std::sync::Arc;

fn recording_router(response: &str) -> (Router, Arc<RecordingStrategy>) {
    let strategy = Arc::new(RecordingStrategy::new(response));
    (Router::new(strategy.clone()), strategy)
}

fn html_body(response: RouterResponse) -> String {
    match response {
        RouterResponse::Html(html) => html.into_owned(),
        other => panic!("expected html, got {other:?}"),
    }
}

#[test]
fn index_is_served_for_root_and_index_paths() {
    let (router, _) = recording_router("");
    let root = html_body(router.handle(&Method::GET, "/", ""));
    let index = html_body(router.handle(&Method::GET, "/index.html", ""));
    assert_eq!(root, index);
    assert!(root.contains("PDB2DSSP"));
}

#[test]
fn absolute_form_uri_routes_like_origin_form() {
    let (router, _) = recording_router("");
    let origin = html_body(router.handle(&Method::GET, "/", ""));
    let absolute = html_body(router.handle(&Method::GET, "http://host.example/", ""));
    assert_eq!(origin, absolute);
}

#[test]
fn dssp_route_derives_filename_from_structure_text() {
    let (router, strategy) = recording_router("DSSP REPORT\n");
    let payload = multipart_payload("pdb", None, &structure_with_id());

    match router.handle(&Method::POST, "/PDB2DSSP", &payload) {
        RouterResponse::Attachment { filename, body } => {
            assert_eq!(filename, "1ABC.dssp");
            assert_eq!(body, "DSSP REPORT\n");
        }
        other => panic!("expected attachment, got {other:?}"),
    }

    let calls = strategy.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "assign_structure");
    assert!(calls[0].1.starts_with("HEADER"));
    assert!(calls[0].1.ends_with("1ABC\n"));
}

#[test]
fn hssp_route_uses_same_derivation_with_hssp_extension() {
    let (router, strategy) = recording_router("HSSP REPORT\n");
    let payload = multipart_payload("pdbfile", None, &structure_with_id());

    match router.handle(&Method::POST, "/PDB2HSSP", &payload) {
        RouterResponse::Attachment { filename, .. } => assert_eq!(filename, "1ABC.hssp"),
        other => panic!("expected attachment, got {other:?}"),
    }
    assert_eq!(strategy.calls()[0].0, "align_from_structure");
}

#[test]
fn declared_filename_wins_and_extension_is_forced() {
    let (router, _) = recording_router("X\n");
    let payload = multipart_payload("pdb", Some("model.ent"), &structure_with_id());

    match router.handle(&Method::POST, "/PDB2HSSP", &payload) {
        RouterResponse::Attachment { filename, .. } => assert_eq!(filename, "model.hssp"),
        other => panic!("expected attachment, got {other:?}"),
    }
}

#[test]
fn sequence_route_url_decodes_before_the_strategy_call() {
    let (router, strategy) = recording_router("HSSP\n");

    match router.handle(&Method::POST, "/SEQ2HSSP", "seq=ACDE%20FGH") {
        RouterResponse::Attachment { filename, .. } => {
            assert_eq!(filename, "hssp-for-sequence");
        }
        other => panic!("expected attachment, got {other:?}"),
    }

    let calls = strategy.calls();
    assert_eq!(calls, vec![("align_from_sequence", "ACDE FGH".to_string())]);
}

#[test]
fn missing_sequence_parameter_renders_the_error_page() {
    let (router, _) = recording_router("X\n");
    let page = html_body(router.handle(&Method::POST, "/SEQ2HSSP", "nothing here"));
    assert!(page.contains("malformed input"));
    assert!(page.contains("sequence"));
}

#[test]
fn strategy_failure_renders_the_error_page_as_html() {
    let router = Router::new(Arc::new(FailingStrategy(ServiceError::tool(
        "maxhom failed (exit status: 2): out of memory",
    ))));
    let payload = multipart_payload("pdb", None, &structure_with_id());
    let page = html_body(router.handle(&Method::POST, "/PDB2HSSP", &payload));
    assert!(page.contains("external tool failure"));
    assert!(page.contains("out of memory"));
}

#[test]
fn malformed_multipart_renders_the_error_page() {
    let (router, strategy) = recording_router("X\n");
    // Truncated mid-part: the body never reaches a boundary line.
    let truncated = "--B\nContent-Disposition: form-data; name=\"pdb\"\n\nATOM\n";
    let page = html_body(router.handle(&Method::POST, "/PDB2DSSP", truncated));
    assert!(page.contains("malformed input"));
    assert!(strategy.calls().is_empty());
}

#[test]
fn unmatched_requests_fall_through_to_the_transport() {
    let (router, strategy) = recording_router("X\n");
    assert_eq!(
        router.handle(&Method::GET, "/metrics", ""),
        RouterResponse::NotHandled
    );
    assert_eq!(
        router.handle(&Method::PUT, "/PDB2DSSP", ""),
        RouterResponse::NotHandled
    );
    assert!(strategy.calls().is_empty());
}
