use std::sync::OnceLock;

static HOST: OnceLock<String> = OnceLock::new();

/// Id of the current OS process.
#[inline]
pub fn pid() -> u32 {
    std::process::id()
}

/// Host name of this machine, resolved once (best effort, `"unknown"` on failure).
pub fn host() -> &'static str {
    HOST.get_or_init(|| {
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    })
}
