//! Hand-rolled decoder for `multipart/form-data` submissions.
//!
//! Browsers post structure files to the submission endpoints as multipart
//! bodies. The decoder scans the payload once, retains the body of the field
//! named `pdb` or `pdbfile`, and records the last filename declared in any
//! part's headers. It never performs I/O: the payload is fully in memory and
//! the transform is pure and restartable.
//!
//! Two behaviors of the scan are part of the contract and covered by tests
//! rather than "fixed":
//!
//! - the last-seen filename is updated while scanning the headers of *any*
//!   part, not only the target field;
//! - decoding stops at the first boundary where the captured field holds more
//!   than two bytes, even if further parts follow.

use crate::error::ServiceError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Field names whose body is retained.
const TARGET_FIELDS: [&str; 2] = ["pdb", "pdbfile"];

/// Name assigned to a part whose disposition header carries no `name`.
const PLACEHOLDER_NAME: &str = "undef";

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bname="([^"]+)""#).expect("name pattern"));
static FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bfilename="([^"]+)""#).expect("filename pattern"));

/// Result of decoding one multipart payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedForm {
    /// Body of the `pdb`/`pdbfile` field, each line terminated with `\n`.
    /// Empty when the payload carries no target field.
    pub structure: String,
    /// Filename last seen while scanning any part's headers.
    pub filename: Option<String>,
}

/// Cursor over newline-normalized text. Running out of input while a line is
/// still expected is a decode failure, not a silent success.
struct Lines<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn next_line(&mut self) -> Result<&'a str, ServiceError> {
        if self.pos >= self.text.len() {
            return Err(ServiceError::malformed("unexpected end of form data"));
        }
        let rest = &self.text[self.pos..];
        match rest.find('\n') {
            Some(i) => {
                self.pos += i + 1;
                Ok(&rest[..i])
            }
            None => {
                self.pos = self.text.len();
                Ok(rest)
            }
        }
    }
}

fn is_target(name: &str) -> bool {
    TARGET_FIELDS.contains(&name)
}

/// Decode a raw request body into the captured structure field and the last
/// declared filename.
///
/// The first line of the payload is taken verbatim as the boundary token.
/// Parts are scanned in order: header lines up to a blank line, then body
/// lines up to the next boundary line. Only a part named `pdb` or `pdbfile`
/// has its body retained; bodies of other parts are discarded.
///
/// # Errors
///
/// Returns `MalformedInput` when the payload ends while a header or body
/// line is still expected. A well-formed payload without a target field is
/// not an error; it yields an empty captured field.
pub fn decode_form(payload: &str) -> Result<DecodedForm, ServiceError> {
    let text = normalize_newlines(payload);
    let mut lines = Lines::new(&text);

    let boundary = lines.next_line()?.to_string();

    let mut name = String::new();
    let mut filename: Option<String> = None;
    let mut structure = String::new();

    loop {
        // A boundary was just consumed; what follows are this part's headers.
        loop {
            let line = lines.next_line()?;
            if line.starts_with("Content-Disposition: form-data") {
                name = NAME_RE
                    .captures(line)
                    .map(|c| c[1].to_string())
                    .unwrap_or_else(|| PLACEHOLDER_NAME.to_string());
                if let Some(c) = FILENAME_RE.captures(line) {
                    filename = Some(c[1].to_string());
                }
                continue;
            }
            if line.is_empty() {
                break;
            }
        }

        // Body lines, up to the next boundary line.
        let last = loop {
            let line = lines.next_line()?;
            if line.starts_with(boundary.as_str()) {
                break line;
            }
            if is_target(&name) {
                structure.push_str(line);
                structure.push('\n');
            }
        };

        if is_target(&name) && structure.len() > 2 {
            break;
        }
        if last[boundary.len()..].starts_with("--") {
            break;
        }
    }

    Ok(DecodedForm {
        structure,
        filename,
    })
}

fn normalize_newlines(payload: &str) -> String {
    payload.replace("\r\n", "\n").replace('\r', "\n")
}
