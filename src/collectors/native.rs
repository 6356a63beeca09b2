//! Native enumeration capability.
//!
//! The orchestrator is handed an optional [`NativeProvider`]. When it is
//! absent, native strategies are reported as unavailable and the resolver
//! moves on to command-based strategies.

use anyhow::{anyhow, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use sysinfo::{CpuExt, PidExt, ProcessExt, ProcessStatus, System, SystemExt};

/// Process information data structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    pub name: String,
    pub cmd: Vec<String>,
    pub exe: Option<String>,
    pub status: String,
    pub start_time: u64,
    pub memory_bytes: u64,
}

/// Host identity data structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostIdentity {
    pub hostname: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub kernel_version: Option<String>,
    pub cpu_count: usize,
    pub cpu_brand: Option<String>,
    pub total_memory_bytes: u64,
    pub boot_time: u64,
}

/// An in-process source of host data
pub trait NativeProvider: Send + Sync {
    /// Label recorded as the outcome source
    fn name(&self) -> &'static str;

    fn processes(&self) -> Result<Vec<ProcessRecord>>;

    fn identity(&self) -> Result<HostIdentity>;
}

/// [`NativeProvider`] backed by the sysinfo crate
#[derive(Debug, Default)]
pub struct SysinfoProvider;

impl SysinfoProvider {
    pub fn new() -> Self {
        Self
    }
}

fn status_label(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Run => "Running",
        ProcessStatus::Sleep => "Sleeping",
        ProcessStatus::Stop => "Stopped",
        ProcessStatus::Zombie => "Zombie",
        ProcessStatus::Idle => "Idle",
        _ => "Unknown",
    }
}

impl NativeProvider for SysinfoProvider {
    fn name(&self) -> &'static str {
        "sysinfo"
    }

    fn processes(&self) -> Result<Vec<ProcessRecord>> {
        let mut system = System::new();
        system.refresh_processes();

        let mut processes: Vec<ProcessRecord> = system
            .processes()
            .iter()
            .map(|(pid, process)| {
                let exe = process.exe().to_string_lossy().to_string();
                ProcessRecord {
                    pid: pid.as_u32(),
                    parent_pid: process.parent().map(|p| p.as_u32()),
                    name: process.name().to_string(),
                    cmd: process.cmd().to_vec(),
                    exe: if exe.is_empty() { None } else { Some(exe) },
                    status: status_label(process.status()).to_string(),
                    start_time: process.start_time(),
                    memory_bytes: process.memory(),
                }
            })
            .collect();

        if processes.is_empty() {
            return Err(anyhow!("process table is empty"));
        }

        processes.sort_by_key(|p| p.pid);
        debug!("Enumerated {} processes natively", processes.len());
        Ok(processes)
    }

    fn identity(&self) -> Result<HostIdentity> {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();

        Ok(HostIdentity {
            hostname: system.host_name(),
            os_name: system.name(),
            os_version: system.os_version(),
            kernel_version: system.kernel_version(),
            cpu_count: system.cpus().len(),
            cpu_brand: system.cpus().first().map(|cpu| cpu.brand().to_string()),
            total_memory_bytes: system.total_memory(),
            boot_time: system.boot_time(),
        })
    }
}
