//! Privilege checks for the current process.
//!
//! The collector never requests elevation. It only reports whether it has
//! it, since several probes see less data without it.

use log::{info, warn};

/// Check if the process is running with elevated privileges
pub fn is_elevated() -> bool {
    #[cfg(target_os = "windows")]
    {
        use winapi::um::shellapi::IsUserAnAdmin;
        unsafe { IsUserAnAdmin() != 0 }
    }
    #[cfg(unix)]
    {
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(any(target_os = "windows", unix)))]
    {
        false
    }
}

/// Name of the user running the collector, from the environment
pub fn current_user() -> Option<String> {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
}

/// Get instructions for elevating privileges on the current platform
pub fn get_elevation_instructions() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        "Run from an Administrator prompt to include services and scheduled tasks of other users"
    }
    #[cfg(unix)]
    {
        "Run with sudo to include sockets and processes owned by other users"
    }
    #[cfg(not(any(target_os = "windows", unix)))]
    {
        "Run with elevated privileges appropriate for your operating system"
    }
}

/// Log the privilege level once at startup
pub fn report_privileges() {
    if is_elevated() {
        info!("Running with elevated privileges");
    } else {
        warn!("Not running elevated, some probes will see partial data");
        info!("{}", get_elevation_instructions());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_user_not_blank() {
        if let Some(user) = current_user() {
            assert!(!user.is_empty());
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_is_elevated_matches_euid() {
        assert_eq!(is_elevated(), unsafe { libc::geteuid() } == 0);
    }
}
