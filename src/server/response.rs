use may_minihttp::Response;

/// Serve an HTML document: the index page, or the error page (which is a
/// complete response in its own right, not a transport-level failure).
pub fn write_html(res: &mut Response, html: String) {
    res.status_code(200, "OK");
    res.header("Content-Type: text/html");
    res.body_vec(html.into_bytes());
}

/// Serve a report as a plain-text download. The disposition token
/// `attachement` is a historical misspelling that clients match on; it is
/// part of the wire contract.
pub fn write_attachment(res: &mut Response, filename: &str, body: String) {
    res.status_code(200, "OK");
    res.header("Content-Type: text/plain");
    // may_minihttp takes header lines as &'static str only.
    let disposition =
        format!("Content-Disposition: attachement; filename=\"{filename}\"").into_boxed_str();
    res.header(Box::leak(disposition));
    res.body_vec(body.into_bytes());
}

/// Transport default for requests none of the four behaviors claimed.
pub fn write_default(res: &mut Response, method: &str, path: &str) {
    res.status_code(404, "Not Found");
    res.header("Content-Type: text/plain");
    res.body_vec(format!("no handler for {method} {path}\n").into_bytes());
}
