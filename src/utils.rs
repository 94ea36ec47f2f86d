//! Helpers for telling local workspace paths from remote hosts and keeping
//! credentials out of logs

use std::path::Path;

/// Check whether a workspace template points at the local filesystem
///
/// Returns true for:
/// - Absolute paths on Unix: /srv/git/
/// - Absolute paths on Windows: C:\git\ or C:/git/
/// - Relative paths: ./repos/ or ../repos/
/// - `file://` URLs
///
/// Returns false for host-style templates such as `bitbucket.org/acme/`,
/// `https://` URLs and SSH URLs.
pub fn is_local_path(path: &str) -> bool {
  if path.starts_with("file://") {
    return true;
  }

  if path.starts_with("./") || path.starts_with("../") {
    return true;
  }

  // Windows drive letter; must come before the URL check since these contain ':'
  if path.len() >= 3 {
    let bytes = path.as_bytes();
    if bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/') {
      return true;
    }
  }

  if path.starts_with("\\\\") {
    return true;
  }

  // Checked before is_absolute(): on Windows, Unix-style paths are not absolute
  if path.starts_with('/') && !path.contains("://") && !path.contains('@') {
    return true;
  }

  if path.contains("://") || path.contains('@') {
    return false;
  }

  Path::new(path).is_absolute()
}

/// Replace `user:password@` in any URL inside `text` with `***@`
pub fn redact_url_credentials(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut rest = text;

  while let Some(scheme_at) = rest.find("://") {
    let (head, tail) = rest.split_at(scheme_at + 3);
    out.push_str(head);

    let authority_end = tail.find(['/', ' ', '\n', '\'', '"']).unwrap_or(tail.len());
    let authority = &tail[..authority_end];
    match authority.rfind('@') {
      Some(at) => {
        out.push_str("***");
        out.push_str(&authority[at..]);
      }
      None => out.push_str(authority),
    }
    rest = &tail[authority_end..];
  }

  out.push_str(rest);
  out
}
