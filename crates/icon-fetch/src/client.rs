use std::io::Read;
use std::time::Duration;

/// Largest response body accepted for a single icon.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;

const SVG_MARKER: &[u8] = b"<svg";
const XML_PROLOG: &[u8] = b"<?xml";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const PROLOG_SCAN_BYTES: usize = 512;

/// Why one URL did not yield an icon; the fetcher moves on to the next template.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("failed to read response body: {0}")]
    Body(#[from] std::io::Error),
    #[error("response exceeds {0} bytes")]
    TooLarge(u64),
}

pub trait HttpClient {
    /// Fetches `url` and returns the body of a 200 response.
    ///
    /// # Errors
    /// Returns an [`AttemptError`] for transport failures, non-200 statuses and
    /// unreadable or oversized bodies.
    fn get(&self, url: &str) -> Result<Vec<u8>, AttemptError>;
}

/// Blocking `ureq` client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl UreqClient {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("icon-fetch/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent, max_body_bytes: DEFAULT_MAX_BODY_BYTES }
    }
}

impl HttpClient for UreqClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, AttemptError> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(AttemptError::Status(code)),
            Err(ureq::Error::Transport(transport)) => {
                return Err(AttemptError::Transport(transport.to_string()))
            }
        };
        if response.status() != 200 {
            return Err(AttemptError::Status(response.status()));
        }

        let mut body = Vec::new();
        response.into_reader().take(self.max_body_bytes + 1).read_to_end(&mut body)?;
        if u64::try_from(body.len()).unwrap_or(u64::MAX) > self.max_body_bytes {
            return Err(AttemptError::TooLarge(self.max_body_bytes));
        }
        Ok(body)
    }
}

/// True when `body` starts with an `<svg` element, allowing a BOM, leading
/// whitespace, and an XML prolog or comments before it.
#[must_use]
pub fn is_svg_payload(body: &[u8]) -> bool {
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
    let start = body.iter().position(|byte| !byte.is_ascii_whitespace()).unwrap_or(body.len());
    let body = &body[start..];
    if body.starts_with(SVG_MARKER) {
        return true;
    }
    if !body.starts_with(XML_PROLOG) && !body.starts_with(b"<!--") {
        return false;
    }
    let head = &body[..body.len().min(PROLOG_SCAN_BYTES)];
    head.windows(SVG_MARKER.len()).any(|window| window == SVG_MARKER)
}
