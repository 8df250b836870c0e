//! Host metadata detection.
//!
//! Gathered once per process. Anything that cannot be detected is left
//! empty and reported as `unknown`.

use std::fs;

use bm_core::HostMetadata;

use crate::config::HostOverrides;

/// Detects machine metadata, preferring configured overrides.
pub fn gather(overrides: &HostOverrides) -> HostMetadata {
    HostMetadata {
        project_name: overrides
            .project_name
            .clone()
            .or_else(current_dir_name)
            .unwrap_or_default(),
        cpu_model: fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|info| parse_cpu_model(&info))
            .unwrap_or_default(),
        cpu_core_count: std::thread::available_parallelism()
            .map(|count| count.get().to_string())
            .unwrap_or_default(),
        gpu_model: overrides.gpu_model.clone().unwrap_or_default(),
        ram_size: fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|info| parse_mem_total_bytes(&info))
            .map(|bytes| bytes.to_string())
            .unwrap_or_default(),
        machine_name: hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_default(),
        host_version: overrides.host_version.clone().unwrap_or_default(),
        extension_version: env!("CARGO_PKG_VERSION").to_string(),
        username: overrides.username.clone().or_else(|| {
            std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .ok()
        }),
    }
}

fn current_dir_name() -> Option<String> {
    let dir = std::env::current_dir().ok()?;
    dir.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

/// Extracts the first `model name` entry from `/proc/cpuinfo`.
fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "model name").then(|| value.trim().to_string())
    })
}

/// Extracts `MemTotal` from `/proc/meminfo`, in bytes.
fn parse_mem_total_bytes(meminfo: &str) -> Option<u64> {
    meminfo.lines().find_map(|line| {
        let rest = line.strip_prefix("MemTotal:")?;
        let kib: u64 = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
        kib.checked_mul(1024)
    })
}
