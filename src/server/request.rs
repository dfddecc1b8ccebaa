use crate::protocol::Transport;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tracing::debug;

/// Header carrying the script path the call was sent to (`agi://host/<path>`)
pub const PATH_HEADER: &str = "agi_network_script";
/// Header carrying the channel identifier
pub const CHANNEL_HEADER: &str = "agi_channel";
/// Header carrying the full request URL; its query string holds named parameters
pub const REQUEST_HEADER: &str = "agi_request";
/// Header carrying the backend's own call id (`SECONDS.SEQUENCE`)
pub const UNIQUEID_HEADER: &str = "agi_uniqueid";
/// Prefix of the numbered positional argument headers (`agi_arg_1`, `agi_arg_2`, …)
pub const ARG_HEADER_PREFIX: &str = "agi_arg_";

/// Maximum number of query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Named query parameters in request order.
///
/// Names are `Arc<str>` so binding can hand them around without copying.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Raw call headers, keyed by header name.
pub type HeaderMap = HashMap<String, String>;

/// Structured view of a call's header block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCall {
    /// Channel identifier, e.g. `SIP/alice-00000001`
    pub channel: Option<String>,
    /// Target route path
    pub path: Option<String>,
    /// Positional call arguments, `agi_arg_1` first
    pub args: Vec<String>,
    /// Query parameters of the request URL
    pub query: ParamVec,
}

/// Split one `key: value` header line.
///
/// Lines without a `": "` separator are not headers and yield `None`.
#[must_use]
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(": ")?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim_end().to_string()))
}

/// Read the header block that opens every call.
///
/// Reads `key: value` lines until a blank line. End of stream before the
/// blank line ends the block with whatever was read.
///
/// # Errors
///
/// Propagates transport read failures.
pub fn read_headers(transport: &mut Transport) -> io::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    while let Some(line) = transport.read_line()? {
        if line.trim().is_empty() {
            break;
        }
        match parse_header_line(&line) {
            Some((key, value)) => {
                headers.insert(key, value);
            }
            None => debug!(line = %line, "Ignoring malformed header line"),
        }
    }
    Ok(headers)
}

/// Collect numbered argument headers in ascending order.
///
/// Numbering starts at 1 and the sequence stops at the first missing
/// number: `agi_arg_1`, `agi_arg_3` yields only the first value.
#[must_use]
pub fn positional_args(headers: &HeaderMap) -> Vec<String> {
    let mut args = Vec::new();
    for n in 1.. {
        match headers.get(&format!("{ARG_HEADER_PREFIX}{n}")) {
            Some(v) => args.push(v.clone()),
            None => break,
        }
    }
    args
}

/// Decode the query string of a request URL.
///
/// Names and values are percent-decoded. Parameters with blank values are
/// dropped. Repeated names are all kept in order; lookups take the first.
/// A URL that does not parse yields no parameters.
#[must_use]
pub fn parse_query_params(request_url: &str) -> ParamVec {
    let Ok(url) = url::Url::parse(request_url) else {
        debug!(request_url = %request_url, "Request URL did not parse");
        return ParamVec::new();
    };
    url.query_pairs()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| (Arc::<str>::from(k.as_ref()), v.into_owned()))
        .collect()
}

/// Build the structured call view from raw headers.
///
/// Missing headers are not errors: they yield `None` or empty collections.
#[must_use]
pub fn parse_call(headers: &HeaderMap) -> ParsedCall {
    ParsedCall {
        channel: headers.get(CHANNEL_HEADER).cloned(),
        path: headers
            .get(PATH_HEADER)
            .map(|p| p.trim_start_matches('/').to_string()),
        args: positional_args(headers),
        query: headers
            .get(REQUEST_HEADER)
            .map(String::as_str)
            .map(parse_query_params)
            .unwrap_or_default(),
    }
}
