//! External tool invocation.

use crate::error::ServiceError;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, error, info};

/// Longest stderr excerpt carried into an error message.
const STDERR_EXCERPT: usize = 512;

/// Run an external binary, feeding `input` on stdin and collecting stdout.
///
/// Stdin is written from a separate thread so a tool that floods stdout
/// before draining its input cannot deadlock the pipe pair.
///
/// # Errors
///
/// `ExternalTool` when the binary cannot be spawned, exits non-zero, or its
/// pipes cannot be driven. A non-zero exit carries an excerpt of the tool's
/// stderr.
pub fn invoke(tool: &Path, args: &[String], input: &str) -> Result<String, ServiceError> {
    debug!(tool = %tool.display(), ?args, stdin_bytes = input.len(), "external tool start");
    let start = Instant::now();

    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ServiceError::tool(format!("cannot run {}: {e}", tool.display())))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ServiceError::tool("tool stdin not piped"))?;
    let payload = input.to_string();
    let writer = std::thread::spawn(move || {
        let _ = stdin.write_all(payload.as_bytes());
    });

    let output = child
        .wait_with_output()
        .map_err(|e| ServiceError::tool(format!("cannot wait for {}: {e}", tool.display())))?;
    let _ = writer.join();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let excerpt: String = stderr.chars().take(STDERR_EXCERPT).collect();
        error!(
            tool = %tool.display(),
            status = %output.status,
            stderr = %excerpt.trim(),
            "external tool failed"
        );
        return Err(ServiceError::tool(format!(
            "{} failed ({}): {}",
            tool.display(),
            output.status,
            excerpt.trim()
        )));
    }

    info!(
        tool = %tool.display(),
        duration_ms = start.elapsed().as_millis() as u64,
        stdout_bytes = output.stdout.len(),
        "external tool finished"
    );
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
