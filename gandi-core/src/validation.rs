//! Loose checks for values gathered interactively.
//!
//! The provider remains the source of truth; these only catch obvious typos
//! before a round trip.

/// Allowed number of CPU cores
pub const CORES_RANGE: std::ops::RangeInclusive<i64> = 1..=6;

/// Allowed memory size in MB
pub const MEMORY_RANGE: std::ops::RangeInclusive<i64> = 256..=12288;

/// Memory must be a multiple of this many MB
pub const MEMORY_STEP: i64 = 64;

pub fn validate_hostname(hostname: &str) -> Result<(), String> {
    if hostname.trim().is_empty() {
        return Err("Server name cannot be empty".to_string());
    }
    Ok(())
}

pub fn validate_cores(cores: i64) -> Result<(), String> {
    if !CORES_RANGE.contains(&cores) {
        return Err(format!(
            "Core count must be between {} and {}",
            CORES_RANGE.start(),
            CORES_RANGE.end()
        ));
    }
    Ok(())
}

pub fn validate_memory(memory: i64) -> Result<(), String> {
    if !MEMORY_RANGE.contains(&memory) || memory % MEMORY_STEP != 0 {
        return Err(format!(
            "Your answer isn't valid (must be a multiple of {} between {} and {}, ex: 256, 512, 2048, ...)",
            MEMORY_STEP,
            MEMORY_RANGE.start(),
            MEMORY_RANGE.end()
        ));
    }
    Ok(())
}

pub fn validate_bandwidth(bandwidth: i64) -> Result<(), String> {
    if bandwidth <= 0 {
        return Err("Bandwidth must be greater than 0".to_string());
    }
    Ok(())
}

pub fn validate_ip_version(version: i64) -> Result<(), String> {
    match version {
        4 | 6 => Ok(()),
        _ => Err("IP version must be 4 or 6".to_string()),
    }
}

/// Password of 8 to 64 printable ASCII characters (space included)
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if !(8..=64).contains(&len) {
        return Err("Password must be 8 to 64 characters long".to_string());
    }
    if !password.chars().all(|c| (' '..='~').contains(&c)) {
        return Err("Password may only contain printable ASCII characters".to_string());
    }
    Ok(())
}

pub fn validate_id(id: i64) -> Result<(), String> {
    if id <= 0 {
        return Err("Identifier must be a positive number".to_string());
    }
    Ok(())
}
