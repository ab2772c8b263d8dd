//! Slash helpers for URL paths.

pub fn append_forward_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

pub fn prepend_forward_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Strip every leading and trailing `/`.
pub fn trim_slashes(path: &str) -> &str {
    path.trim_matches('/')
}
