//! Which shell runs string commands and bare `open` calls

/// Shell for sessions: the configured one, else `$SHELL`, else the platform
/// default
///
/// Blank values count as unset at both levels.
pub fn resolve_shell(configured: Option<&str>) -> String {
    let from_env = std::env::var("SHELL").ok();
    configured
        .into_iter()
        .chain(from_env.as_deref())
        .map(str::trim)
        .find(|shell| !shell.is_empty())
        .map(str::to_string)
        .unwrap_or_else(platform_shell)
}

#[cfg(unix)]
fn platform_shell() -> String {
    "/bin/sh".to_string()
}

#[cfg(windows)]
fn platform_shell() -> String {
    std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
}
