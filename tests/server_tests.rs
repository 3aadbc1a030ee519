//! End-to-end tests over real sockets: request parsing, response writing,
//! attachment headers, and the two-endpoint shutdown ordering contract.

mod common;

use common::{
    free_port, multipart_payload, send_request, setup_may_runtime, structure_with_id,
    RecordingStrategy,
};
use hsspd::pipeline::PipelineStrategy;
use hsspd::server::ServiceEndpoint;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn start_endpoint(label: &'static str, response: &str) -> ServiceEndpoint {
    setup_may_runtime();
    let strategy: Arc<dyn PipelineStrategy> = Arc::new(RecordingStrategy::new(response));
    let addr = free_port();
    let endpoint = ServiceEndpoint::bind(label, "127.0.0.1", addr.port(), "", strategy).unwrap();
    endpoint.wait_ready().unwrap();
    endpoint
}

#[test]
fn index_page_is_served_over_http() {
    let endpoint = start_endpoint("t-index", "");
    let res = send_request(endpoint.addr(), "GET", "/", "");
    assert_eq!(res.status, 200);
    assert_eq!(res.headers.get("content-type").unwrap(), "text/html");
    assert!(res.body.contains("PDB2DSSP"));

    let index = send_request(endpoint.addr(), "GET", "/index.html", "");
    assert_eq!(index.body, res.body);

    endpoint.stop_accepting();
    endpoint.join();
}

#[test]
fn structure_submission_returns_a_named_attachment() {
    let endpoint = start_endpoint("t-submit", "DSSP REPORT\n");
    let payload = multipart_payload("pdb", None, &structure_with_id());
    let res = send_request(endpoint.addr(), "POST", "/PDB2DSSP", &payload);

    assert_eq!(res.status, 200);
    assert_eq!(res.headers.get("content-type").unwrap(), "text/plain");
    // The misspelled disposition token is part of the wire contract.
    assert_eq!(
        res.headers.get("content-disposition").unwrap(),
        "attachement; filename=\"1ABC.dssp\""
    );
    assert_eq!(res.body, "DSSP REPORT\n");

    endpoint.stop_accepting();
    endpoint.join();
}

#[test]
fn sequence_submission_uses_the_fixed_attachment_name() {
    let endpoint = start_endpoint("t-seq", "HSSP REPORT\n");
    let res = send_request(endpoint.addr(), "POST", "/SEQ2HSSP", "seq=ACDEFGH");

    assert_eq!(res.status, 200);
    assert_eq!(
        res.headers.get("content-disposition").unwrap(),
        "attachement; filename=\"hssp-for-sequence\""
    );
    assert_eq!(res.body, "HSSP REPORT\n");

    endpoint.stop_accepting();
    endpoint.join();
}

#[test]
fn unmatched_path_gets_the_transport_default() {
    let endpoint = start_endpoint("t-404", "");
    let res = send_request(endpoint.addr(), "GET", "/no/such/path", "");
    assert_eq!(res.status, 404);

    endpoint.stop_accepting();
    endpoint.join();
}

#[test]
fn pipeline_failure_is_served_as_an_html_error_page() {
    setup_may_runtime();
    let strategy: Arc<dyn PipelineStrategy> = Arc::new(common::FailingStrategy(
        hsspd::error::ServiceError::not_found("entry 9XYZ not found in uniprot"),
    ));
    let addr = free_port();
    let endpoint =
        ServiceEndpoint::bind("t-error", "127.0.0.1", addr.port(), "", strategy).unwrap();
    endpoint.wait_ready().unwrap();

    let payload = multipart_payload("pdb", None, &structure_with_id());
    let res = send_request(endpoint.addr(), "POST", "/PDB2HSSP", &payload);
    assert_eq!(res.headers.get("content-type").unwrap(), "text/html");
    assert!(res.body.contains("entry 9XYZ not found in uniprot"));

    endpoint.stop_accepting();
    endpoint.join();
}

#[test]
fn both_endpoints_stop_without_blocking_each_other() {
    let first = start_endpoint("t-stop-1", "");
    let second = start_endpoint("t-stop-2", "");
    let first_addr = first.addr();
    let second_addr = second.addr();

    // Both endpoints answer before shutdown.
    assert_eq!(send_request(first_addr, "GET", "/", "").status, 200);
    assert_eq!(send_request(second_addr, "GET", "/", "").status, 200);

    // Stop accepting on both before joining either; each join must finish
    // promptly, verified with an independent timeout.
    first.stop_accepting();
    second.stop_accepting();

    for endpoint in [first, second] {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            endpoint.join();
            let _ = tx.send(());
        });
        assert!(
            rx.recv_timeout(Duration::from_secs(5)).is_ok(),
            "endpoint did not stop within its own timeout"
        );
    }
}
