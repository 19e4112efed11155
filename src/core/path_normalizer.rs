//! Canonicalizes alternate spellings of WSL network paths.

use std::path::{Path, PathBuf};

const WSL_HOSTS: &[&str] = &["wsl$", "wsl.localhost"];

/// Rewrites `//wsl$/Ubuntu/home` style paths (any mix of `/` and `\`) to the
/// UNC form `\\wsl$\Ubuntu\home`. Anything else is returned unchanged.
pub fn normalize(path: &str) -> String {
    if !has_double_separator_prefix(path) {
        return path.to_string();
    }

    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        [host, _share, ..] if is_wsl_host(host) => format!("\\\\{}", segments.join("\\")),
        _ => path.to_string(),
    }
}

/// `Path` flavour of [`normalize`]. Non UTF-8 paths pass through untouched.
pub fn normalize_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(normalize(s)),
        None => path.to_path_buf(),
    }
}

fn has_double_separator_prefix(path: &str) -> bool {
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('/' | '\\'), Some('/' | '\\'))
    )
}

fn is_wsl_host(segment: &str) -> bool {
    WSL_HOSTS.iter().any(|h| segment.eq_ignore_ascii_case(h))
}
