use super::http_server::{start_service, ServerHandle};
use super::request::parse_request;
use super::response;
use crate::pipeline::PipelineStrategy;
use crate::router::{Router, RouterResponse};
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Per-connection service: parse, route, write. Cloned by the transport for
/// every connection; all shared state sits behind `Arc`.
#[derive(Clone)]
pub struct SubmissionService {
    router: Arc<Router>,
}

impl SubmissionService {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}

impl HttpService for SubmissionService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req);

        let method = match parsed.method.parse::<Method>() {
            Ok(m) => m,
            Err(_) => {
                response::write_default(res, &parsed.method, &parsed.path);
                return Ok(());
            }
        };

        match self.router.handle(&method, &parsed.path, &parsed.body) {
            RouterResponse::Html(html) => response::write_html(res, html.into_owned()),
            RouterResponse::Attachment { filename, body } => {
                response::write_attachment(res, &filename, body)
            }
            RouterResponse::NotHandled => {
                response::write_default(res, method.as_str(), &parsed.path)
            }
        }
        Ok(())
    }
}

/// One bound network endpoint: an address, the location advertised to
/// clients, and the accept loop serving a router bound to one pipeline
/// strategy. The strategy never changes after construction; the endpoint is
/// torn down only at process shutdown.
pub struct ServiceEndpoint {
    label: &'static str,
    addr: SocketAddr,
    advertised_location: String,
    handle: ServerHandle,
}

impl ServiceEndpoint {
    /// Bind the endpoint and start its accept loop.
    pub fn bind(
        label: &'static str,
        address: &str,
        port: u16,
        advertised_location: &str,
        strategy: Arc<dyn PipelineStrategy>,
    ) -> io::Result<Self> {
        let service = SubmissionService::new(Router::new(strategy));
        let handle = start_service(service, (address, port))?;
        let addr = handle.addr();
        info!(
            endpoint = label,
            %addr,
            location = advertised_location,
            "endpoint serving"
        );
        Ok(Self {
            label,
            addr,
            advertised_location: advertised_location.to_string(),
            handle,
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn advertised_location(&self) -> &str {
        &self.advertised_location
    }

    pub fn wait_ready(&self) -> io::Result<()> {
        self.handle.wait_ready()
    }

    /// Stop accepting new connections; never blocks on the other endpoint or
    /// on in-flight requests.
    pub fn stop_accepting(&self) {
        info!(endpoint = self.label, "stop accepting");
        self.handle.cancel();
    }

    /// Wait for the accept loop to finish.
    pub fn join(self) {
        let label = self.label;
        if self.handle.join().is_err() {
            tracing::warn!(endpoint = label, "accept loop ended with a panic");
        }
    }
}
