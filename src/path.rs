//! Path arithmetic for chunk requests.
//!
//! Only `/`-separated paths are handled. The server scope uses these helpers to
//! resolve `require` requests against its root or against the directory of the
//! module issuing the request.

use crate::error::{Result, ScopedAmdError};
use regex::Regex;
use url::Url;

lazy_static::lazy_static! {
    static ref URL_SHAPED: Regex = Regex::new(r"(?i)^https?:").unwrap();
}

const SEPARATOR: char = '/';

/// Returns `true` for `http:`/`https:` locations.
pub fn is_url(location: &str) -> bool {
    URL_SHAPED.is_match(location)
}

/// POSIX `dirname`.
///
/// Trailing separators are ignored, a path without a separator yields `"."`
/// and a path made only of a root yields `"/"`.
pub fn dirname(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let bytes = path.as_bytes();
    let has_root = bytes[0] == b'/';
    let mut end = None;
    let mut matched_slash = true;

    for i in (1..bytes.len()).rev() {
        if bytes[i] == b'/' {
            if !matched_slash {
                end = Some(i);
                break;
            }
        } else {
            matched_slash = false;
        }
    }

    match end {
        None if has_root => "/".to_string(),
        None => ".".to_string(),
        Some(1) if has_root => "//".to_string(),
        Some(end) => path[..end].to_string(),
    }
}

/// Joins `path` onto `base`.
///
/// `.` may only appear as the first segment of `path`. `..` pops a segment of
/// the accumulated result until the first regular segment of `path` has been
/// consumed; after that it is rejected with [`ScopedAmdError::InvalidPath`].
pub fn join_path(base: &str, path: &str) -> Result<String> {
    let mut merged: Vec<&str> = base
        .split(SEPARATOR)
        .enumerate()
        .filter(|(index, segment)| *index == 0 || !segment.is_empty())
        .map(|(_, segment)| segment)
        .collect();

    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    let last = segments.len() - 1;
    let mut allow_step_back = true;

    for (index, segment) in segments.into_iter().enumerate() {
        if segment.is_empty() && index < last {
            continue;
        }
        match segment {
            "." => {
                if index > 0 {
                    return Err(ScopedAmdError::InvalidPath(path.to_string()));
                }
            }
            ".." => {
                if !allow_step_back {
                    return Err(ScopedAmdError::InvalidPath(path.to_string()));
                }
                // never pop the leading empty segment of an absolute base
                if merged.len() > 1 || !base.starts_with(SEPARATOR) {
                    merged.pop();
                }
            }
            _ => {
                allow_step_back = false;
                merged.push(segment);
            }
        }
    }

    Ok(merged.join("/"))
}

/// Resolves `request` against `base`.
///
/// URL-shaped bases follow URL reference resolution, so a base that names a
/// file resolves siblings of that file. Any other base is treated as a
/// directory and joined with [`join_path`].
pub fn resolve_request(base: &str, request: &str) -> Result<String> {
    if is_url(base) {
        let resolved = Url::parse(base)?.join(request)?;
        return Ok(resolved.to_string());
    }
    join_path(base, request)
}

/// The base that requests issued from the module at `location` resolve against.
pub fn request_base(location: &str) -> String {
    if is_url(location) {
        location.to_string()
    } else {
        dirname(location)
    }
}
