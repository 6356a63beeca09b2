//! Strategy table and fallback-chain resolution.
//!
//! Each (domain, host class) pair maps to an ordered list of [`Strategy`]
//! descriptors, highest priority first. A [`StrategyResolver`] walks the list
//! through a [`StrategyExecutor`] and turns whatever it finds into a
//! [`ProbeResult`]. Exhausting the list is a valid outcome, not an error.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde_json::{json, Value};

use crate::collectors::native::NativeProvider;
use crate::collectors::runner::{CommandResult, CommandRunner, CommandSpec, CommandStatus};
use crate::models::{
    ArtifactFormat, AttemptFailure, Domain, HostClass, ProbeOutcome, ProbeRecords, ProbeResult,
};

/// In-process enumeration calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCall {
    ProcessTable,
    HostIdentity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryHive {
    LocalMachine,
    CurrentUser,
}

impl fmt::Display for RegistryHive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryHive::LocalMachine => write!(f, "HKLM"),
            RegistryHive::CurrentUser => write!(f, "HKCU"),
        }
    }
}

/// One concrete way to obtain data for a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Native(NativeCall),
    Command(CommandSpec),
    ListDirectory(PathBuf),
    ReadFile(PathBuf),
    RegistryKey {
        hive: RegistryHive,
        path: &'static str,
    },
    ProcessEnvironment,
    /// Hostname and build target, always available in-process
    RuntimeIdentity,
}

impl Strategy {
    fn command(program: &str, args: &[&str]) -> Self {
        Strategy::Command(CommandSpec::new(program, args))
    }

    /// Human readable label, recorded as the source of collected data
    pub fn label(&self) -> String {
        match self {
            Strategy::Native(NativeCall::ProcessTable) => "native process table".to_string(),
            Strategy::Native(NativeCall::HostIdentity) => "native host identity".to_string(),
            Strategy::Command(spec) => spec.to_string(),
            Strategy::ListDirectory(path) => format!("list {}", path.display()),
            Strategy::ReadFile(path) => format!("read {}", path.display()),
            Strategy::RegistryKey { hive, path } => format!("registry {}\\{}", hive, path),
            Strategy::ProcessEnvironment => "process environment".to_string(),
            Strategy::RuntimeIdentity => "runtime identity".to_string(),
        }
    }
}

/// How a domain's strategy list is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Stop at the first strategy that yields data
    FirstSuccess,
    /// Run every strategy and keep each one as a sub-result
    Exhaustive,
}

impl ResolutionMode {
    pub fn for_domain(domain: Domain) -> Self {
        match domain {
            Domain::StartupItems => ResolutionMode::Exhaustive,
            _ => ResolutionMode::FirstSuccess,
        }
    }
}

/// Host facts the strategy table depends on
#[derive(Debug, Clone, Default)]
pub struct StrategyContext {
    pub home_dir: Option<PathBuf>,
    /// Read only when building the external scanner chain
    pub deep_mode: bool,
}

impl StrategyContext {
    /// Directory handed to the external scanner
    pub fn scan_target(&self) -> Option<PathBuf> {
        let home = self.home_dir.as_ref()?;
        if self.deep_mode {
            Some(home.clone())
        } else {
            Some(home.join("Downloads"))
        }
    }
}

const WINDOWS_PACKAGES_SCRIPT: &str = "Get-ItemProperty \
HKLM:\\Software\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\*, \
HKLM:\\Software\\WOW6432Node\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\* \
-ErrorAction SilentlyContinue | Where-Object DisplayName | \
Select-Object DisplayName, DisplayVersion, Publisher, InstallDate | \
Format-Table -AutoSize | Out-String -Width 4096";

const WINDOWS_CONNECTIONS_SCRIPT: &str =
    "Get-NetTCPConnection | Format-Table -AutoSize | Out-String -Width 4096";

const WINDOWS_NETWORK_SCRIPT: &str =
    "Get-NetIPConfiguration -Detailed | Format-List | Out-String -Width 4096";

const DEFENDER_CLI: &str = "C:\\Program Files\\Windows Defender\\MpCmdRun.exe";

const WINDOWS_RUN_KEYS: &[(RegistryHive, &str)] = &[
    (RegistryHive::LocalMachine, "Software\\Microsoft\\Windows\\CurrentVersion\\Run"),
    (RegistryHive::LocalMachine, "Software\\Microsoft\\Windows\\CurrentVersion\\RunOnce"),
    (
        RegistryHive::LocalMachine,
        "Software\\WOW6432Node\\Microsoft\\Windows\\CurrentVersion\\Run",
    ),
    (RegistryHive::CurrentUser, "Software\\Microsoft\\Windows\\CurrentVersion\\Run"),
    (RegistryHive::CurrentUser, "Software\\Microsoft\\Windows\\CurrentVersion\\RunOnce"),
];

const UNIX_CRON_DIRS: &[&str] = &[
    "/etc/cron.d",
    "/etc/cron.hourly",
    "/etc/cron.daily",
    "/etc/cron.weekly",
    "/etc/cron.monthly",
    "/var/spool/cron",
    "/var/spool/cron/crontabs",
];

const UNIX_UNIT_DIRS: &[&str] = &["/etc/systemd/system", "/etc/init.d", "/etc/xdg/autostart"];

const APPLE_LAUNCH_DIRS: &[&str] = &["/Library/LaunchAgents", "/Library/LaunchDaemons"];

/// Ordered candidate strategies for a domain on a host class
pub fn strategy_table(domain: Domain, host: HostClass, ctx: &StrategyContext) -> Vec<Strategy> {
    use HostClass::*;

    match (domain, host) {
        (Domain::SystemInfo, Windows) => vec![
            Strategy::Native(NativeCall::HostIdentity),
            Strategy::command("systeminfo", &[]),
            Strategy::RuntimeIdentity,
        ],
        (Domain::SystemInfo, Apple) => vec![
            Strategy::Native(NativeCall::HostIdentity),
            Strategy::command("sw_vers", &[]),
            Strategy::command("uname", &["-a"]),
            Strategy::RuntimeIdentity,
        ],
        (Domain::SystemInfo, Unix) => vec![
            Strategy::Native(NativeCall::HostIdentity),
            Strategy::command("uname", &["-a"]),
            Strategy::RuntimeIdentity,
        ],

        (Domain::Environment, _) => vec![Strategy::ProcessEnvironment],

        (Domain::Processes, Windows) => vec![
            Strategy::Native(NativeCall::ProcessTable),
            Strategy::command("tasklist", &["/v", "/fo", "csv"]),
        ],
        (Domain::Processes, Apple) | (Domain::Processes, Unix) => vec![
            Strategy::Native(NativeCall::ProcessTable),
            Strategy::command("ps", &["aux"]),
        ],

        (Domain::Services, Windows) => vec![
            Strategy::command("sc", &["queryex", "type=", "service", "state=", "all"]),
            Strategy::command("net", &["start"]),
        ],
        (Domain::Services, Apple) => vec![
            Strategy::command("launchctl", &["list"]),
            Strategy::command("launchctl", &["print", "system"]),
        ],
        (Domain::Services, Unix) => vec![
            Strategy::command(
                "systemctl",
                &["list-units", "--type=service", "--all", "--no-pager"],
            ),
            Strategy::command("service", &["--status-all"]),
        ],

        (Domain::Network, Windows) => vec![
            Strategy::command("ipconfig", &["/all"]),
            Strategy::Command(CommandSpec::powershell(WINDOWS_NETWORK_SCRIPT)),
        ],
        (Domain::Network, Apple) => vec![
            Strategy::command("ifconfig", &["-a"]),
            Strategy::command("networksetup", &["-listallhardwareports"]),
        ],
        (Domain::Network, Unix) => vec![
            Strategy::command("ip", &["addr", "show"]),
            Strategy::command("ifconfig", &["-a"]),
        ],

        (Domain::Connections, Windows) => vec![
            Strategy::Command(CommandSpec::powershell(WINDOWS_CONNECTIONS_SCRIPT)),
            Strategy::command("netstat", &["-ano"]),
        ],
        (Domain::Connections, Apple) => vec![
            Strategy::command("lsof", &["-nP", "-i"]),
            Strategy::command("netstat", &["-an"]),
        ],
        (Domain::Connections, Unix) => vec![
            Strategy::command("ss", &["-tunap"]),
            Strategy::command("netstat", &["-tunap"]),
        ],

        (Domain::InstalledPackages, Windows) => vec![
            Strategy::command(
                "winget",
                &["list", "--accept-source-agreements", "--disable-interactivity"],
            ),
            Strategy::Command(CommandSpec::powershell(WINDOWS_PACKAGES_SCRIPT)),
        ],
        (Domain::InstalledPackages, Apple) => vec![
            Strategy::command("pkgutil", &["--pkgs"]),
            Strategy::command("brew", &["list", "--versions"]),
        ],
        (Domain::InstalledPackages, Unix) => vec![
            Strategy::command("dpkg-query", &["-W", "--showformat=${Package}\\t${Version}\\n"]),
            Strategy::command("rpm", &["-qa"]),
            Strategy::command("apk", &["info", "-v"]),
            Strategy::command("pacman", &["-Q"]),
        ],

        (Domain::StartupItems, Windows) => {
            let mut strategies: Vec<Strategy> = WINDOWS_RUN_KEYS
                .iter()
                .map(|(hive, path)| Strategy::RegistryKey { hive: *hive, path: *path })
                .collect();
            strategies.push(Strategy::command("schtasks", &["/query", "/fo", "csv", "/v"]));
            strategies
        }
        (Domain::StartupItems, Apple) => {
            let mut strategies: Vec<Strategy> = APPLE_LAUNCH_DIRS
                .iter()
                .map(|dir| Strategy::ListDirectory(PathBuf::from(dir)))
                .collect();
            if let Some(home) = &ctx.home_dir {
                strategies.push(Strategy::ListDirectory(home.join("Library/LaunchAgents")));
            }
            strategies.push(Strategy::command(
                "osascript",
                &["-e", "tell application \"System Events\" to get the name of every login item"],
            ));
            strategies
        }
        (Domain::StartupItems, Unix) => {
            let mut strategies = vec![Strategy::ReadFile(PathBuf::from("/etc/crontab"))];
            strategies.extend(
                UNIX_CRON_DIRS
                    .iter()
                    .chain(UNIX_UNIT_DIRS)
                    .map(|dir| Strategy::ListDirectory(PathBuf::from(dir))),
            );
            if let Some(home) = &ctx.home_dir {
                strategies.push(Strategy::ListDirectory(home.join(".config/autostart")));
                strategies.push(Strategy::ListDirectory(home.join(".config/systemd/user")));
            }
            strategies.push(Strategy::command("crontab", &["-l"]));
            strategies
        }

        (Domain::ExternalScans, _) => {
            let Some(target) = ctx.scan_target() else {
                return Vec::new();
            };
            let target = target.to_string_lossy().to_string();
            let mut strategies = Vec::new();
            if host == Windows {
                // -DisableRemediation keeps Defender from quarantining anything
                strategies.push(Strategy::Command(
                    CommandSpec::new(DEFENDER_CLI, &["-Scan", "-ScanType", "3", "-DisableRemediation", "-File"])
                        .with_arg(target.clone()),
                ));
            }
            strategies.push(Strategy::Command(
                CommandSpec::new("clamscan", &["-r", "-i"]).with_arg(target),
            ));
            strategies
        }

        // Produced by the fingerprint walker, not by a strategy chain
        (Domain::RecentFileHashes, _) => Vec::new(),
    }
}

/// Data returned by an accepted strategy
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Records(Vec<Value>),
    Text(String),
}

impl Payload {
    /// Convert to the record shape the domain's artifact uses
    pub fn into_records(self, format: ArtifactFormat) -> ProbeRecords {
        match (self, format) {
            (Payload::Records(values), ArtifactFormat::Json) => ProbeRecords::Structured(values),
            (Payload::Text(text), ArtifactFormat::Text) => ProbeRecords::Text(text),
            (Payload::Text(text), ArtifactFormat::Json) => ProbeRecords::Structured(
                text.lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(|line| json!({ "raw": line }))
                    .collect(),
            ),
            (Payload::Records(values), ArtifactFormat::Text) => ProbeRecords::Text(
                values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        }
    }

    fn into_json(self) -> (&'static str, Value) {
        match self {
            Payload::Records(values) => ("entries", Value::Array(values)),
            Payload::Text(text) => ("text", Value::String(text)),
        }
    }
}

/// What happened when a single strategy was tried
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Accepted {
        payload: Payload,
        outcome: ProbeOutcome,
    },
    Rejected(AttemptFailure),
}

impl Attempt {
    fn rejected(strategy: &Strategy, reason: impl Into<String>) -> Self {
        Attempt::Rejected(AttemptFailure {
            source: strategy.label(),
            reason: reason.into(),
        })
    }

    fn complete(strategy: &Strategy, payload: Payload) -> Self {
        Attempt::Accepted {
            payload,
            outcome: ProbeOutcome::Complete {
                source: strategy.label(),
            },
        }
    }
}

/// Executes individual strategies against some host
#[async_trait::async_trait]
pub trait StrategyExecutor: Send + Sync {
    async fn execute(&self, strategy: &Strategy, limit: Duration) -> Attempt;
}

/// [`StrategyExecutor`] for the local host
pub struct HostExecutor {
    runner: Arc<dyn CommandRunner>,
    native: Option<Arc<dyn NativeProvider>>,
}

impl HostExecutor {
    pub fn new(runner: Arc<dyn CommandRunner>, native: Option<Arc<dyn NativeProvider>>) -> Self {
        Self { runner, native }
    }
}

fn native_call(provider: Option<&dyn NativeProvider>, strategy: &Strategy, call: NativeCall) -> Attempt {
    let Some(provider) = provider else {
        return Attempt::rejected(strategy, "native enumeration provider not available");
    };

    let records = match call {
        NativeCall::ProcessTable => provider.processes().and_then(|processes| {
            processes
                .iter()
                .map(|p| serde_json::to_value(p).map_err(anyhow::Error::from))
                .collect::<anyhow::Result<Vec<_>>>()
        }),
        NativeCall::HostIdentity => provider
            .identity()
            .and_then(|identity| Ok(vec![serde_json::to_value(identity)?])),
    };

    match records {
        Ok(records) => Attempt::Accepted {
            payload: Payload::Records(records),
            outcome: ProbeOutcome::Complete {
                source: format!("{} ({})", strategy.label(), provider.name()),
            },
        },
        Err(e) => Attempt::rejected(strategy, e.to_string()),
    }
}

/// Accept or reject a command result.
///
/// A clean exit is complete. A non-zero exit that still wrote to stdout is
/// kept as partial data with the full captured text. A non-zero exit with
/// nothing on stdout is rejected, carrying whatever it printed in the reason.
pub fn classify_command(strategy: &Strategy, result: &CommandResult) -> Attempt {
    match result.status {
        CommandStatus::Exited(0) => Attempt::complete(strategy, Payload::Text(result.stdout.clone())),
        CommandStatus::Exited(_) | CommandStatus::Signaled if !result.stdout.trim().is_empty() => {
            Attempt::Accepted {
                payload: Payload::Text(result.output_text()),
                outcome: ProbeOutcome::Partial {
                    source: strategy.label(),
                    exit_code: result.exit_code(),
                },
            }
        }
        CommandStatus::Exited(code) => {
            let output = result.output_text();
            let output = output.trim();
            if output.is_empty() {
                Attempt::rejected(strategy, format!("exited with status {}", code))
            } else {
                Attempt::rejected(strategy, format!("exited with status {}: {}", code, output))
            }
        }
        CommandStatus::Signaled => Attempt::rejected(strategy, "terminated by signal without output"),
        CommandStatus::TimedOut => Attempt::rejected(strategy, format!("timed out after {:?}", result.duration)),
        CommandStatus::LaunchFailed => Attempt::rejected(strategy, result.stderr.clone()),
    }
}

fn io_reason(e: &io::Error) -> String {
    match e.kind() {
        io::ErrorKind::NotFound => "not present on this host".to_string(),
        io::ErrorKind::PermissionDenied => "permission denied".to_string(),
        _ => e.to_string(),
    }
}

fn list_directory(path: &Path) -> io::Result<Vec<Value>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)? {
        let Ok(entry) = entry else { continue };
        let metadata = entry.metadata().ok();
        let modified = metadata
            .as_ref()
            .and_then(|m| m.modified().ok())
            .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339());
        entries.push(json!({
            "name": entry.file_name().to_string_lossy(),
            "path": entry.path().to_string_lossy(),
            "is_dir": metadata.as_ref().map(|m| m.is_dir()).unwrap_or(false),
            "size": metadata.as_ref().map(|m| m.len()).unwrap_or(0),
            "modified": modified,
        }));
    }
    entries.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
    Ok(entries)
}

#[cfg(target_os = "windows")]
fn read_registry_values(hive: RegistryHive, path: &str) -> io::Result<Vec<Value>> {
    use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};
    use winreg::RegKey;

    let root = match hive {
        RegistryHive::LocalMachine => RegKey::predef(HKEY_LOCAL_MACHINE),
        RegistryHive::CurrentUser => RegKey::predef(HKEY_CURRENT_USER),
    };
    let key = root.open_subkey(path)?;

    let mut values = Vec::new();
    for item in key.enum_values() {
        let Ok((name, value)) = item else { continue };
        values.push(json!({ "name": name, "value": value.to_string() }));
    }
    Ok(values)
}

#[cfg(not(target_os = "windows"))]
fn read_registry_values(_hive: RegistryHive, _path: &str) -> io::Result<Vec<Value>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "registry is only available on Windows hosts",
    ))
}

/// Answer a strategy that needs no external program.
///
/// These read the filesystem, the registry or the process table, so callers
/// run them on the blocking pool.
fn execute_in_process(native: Option<&dyn NativeProvider>, strategy: &Strategy) -> Attempt {
    match strategy {
        Strategy::Native(call) => native_call(native, strategy, *call),
        Strategy::Command(_) => Attempt::rejected(strategy, "commands go through the command runner"),
        Strategy::ListDirectory(path) => match list_directory(path) {
            Ok(entries) => Attempt::complete(strategy, Payload::Records(entries)),
            Err(e) => Attempt::rejected(strategy, io_reason(&e)),
        },
        Strategy::ReadFile(path) => match fs::read(path) {
            Ok(bytes) => Attempt::complete(
                strategy,
                Payload::Text(String::from_utf8_lossy(&bytes).into_owned()),
            ),
            Err(e) => Attempt::rejected(strategy, io_reason(&e)),
        },
        Strategy::RegistryKey { hive, path } => match read_registry_values(*hive, path) {
            Ok(values) => Attempt::complete(strategy, Payload::Records(values)),
            Err(e) => Attempt::rejected(strategy, io_reason(&e)),
        },
        Strategy::ProcessEnvironment => {
            let mut vars: Vec<(String, String)> = std::env::vars_os()
                .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
                .collect();
            vars.sort();
            let records = vars
                .into_iter()
                .map(|(name, value)| json!({ "name": name, "value": value }))
                .collect();
            Attempt::complete(strategy, Payload::Records(records))
        }
        Strategy::RuntimeIdentity => {
            let hostname = hostname::get()
                .ok()
                .map(|h| h.to_string_lossy().into_owned());
            Attempt::complete(
                strategy,
                Payload::Records(vec![json!({
                    "hostname": hostname,
                    "os_name": std::env::consts::OS,
                    "os_family": std::env::consts::FAMILY,
                    "arch": std::env::consts::ARCH,
                })]),
            )
        }
    }
}

#[async_trait::async_trait]
impl StrategyExecutor for HostExecutor {
    async fn execute(&self, strategy: &Strategy, limit: Duration) -> Attempt {
        if let Strategy::Command(spec) = strategy {
            let result = self.runner.run(spec, limit).await;
            return classify_command(strategy, &result);
        }

        let native = self.native.clone();
        let owned = strategy.clone();
        match tokio::task::spawn_blocking(move || execute_in_process(native.as_deref(), &owned)).await {
            Ok(attempt) => attempt,
            Err(e) => Attempt::rejected(strategy, format!("in-process task failed: {}", e)),
        }
    }
}

/// Walks fallback chains through a [`StrategyExecutor`]
#[derive(Clone)]
pub struct StrategyResolver {
    executor: Arc<dyn StrategyExecutor>,
}

impl StrategyResolver {
    pub fn new(executor: Arc<dyn StrategyExecutor>) -> Self {
        Self { executor }
    }

    /// Resolve a domain using the mode it is declared with
    pub async fn resolve(&self, domain: Domain, strategies: &[Strategy], limit: Duration) -> ProbeResult {
        match ResolutionMode::for_domain(domain) {
            ResolutionMode::FirstSuccess => self.first_success(domain, strategies, limit).await,
            ResolutionMode::Exhaustive => self.exhaustive(domain, strategies, limit).await,
        }
    }

    /// Accept the first strategy that yields data
    pub async fn first_success(
        &self,
        domain: Domain,
        strategies: &[Strategy],
        limit: Duration,
    ) -> ProbeResult {
        let mut attempts = Vec::new();

        for strategy in strategies {
            debug!("[{}] trying {}", domain, strategy.label());
            match self.executor.execute(strategy, limit).await {
                Attempt::Accepted { payload, outcome } => {
                    if !attempts.is_empty() {
                        debug!("[{}] fell back to {}", domain, strategy.label());
                    }
                    return ProbeResult::new(domain, outcome, payload.into_records(domain.format()));
                }
                Attempt::Rejected(failure) => {
                    debug!("[{}] {} rejected: {}", domain, failure.source, failure.reason);
                    attempts.push(failure);
                }
            }
        }

        warn!("[{}] no strategy produced data ({} tried)", domain, attempts.len());
        ProbeResult::empty(domain, attempts)
    }

    /// Run every strategy, keeping each as a sub-result
    pub async fn exhaustive(
        &self,
        domain: Domain,
        strategies: &[Strategy],
        limit: Duration,
    ) -> ProbeResult {
        let mut sections = Vec::new();
        let mut accepted = Vec::new();
        let mut attempts = Vec::new();
        let mut partial_exit = None;
        let mut any_partial = false;

        for strategy in strategies {
            debug!("[{}] collecting {}", domain, strategy.label());
            match self.executor.execute(strategy, limit).await {
                Attempt::Accepted { payload, outcome } => {
                    if let ProbeOutcome::Partial { exit_code, .. } = &outcome {
                        any_partial = true;
                        partial_exit = partial_exit.or(*exit_code);
                    }
                    let (key, body) = payload.into_json();
                    let mut section = json!({
                        "source": strategy.label(),
                        "outcome": outcome,
                    });
                    section[key] = body;
                    sections.push(section);
                    accepted.push(strategy.label());
                }
                Attempt::Rejected(failure) => {
                    debug!("[{}] {} unavailable: {}", domain, failure.source, failure.reason);
                    sections.push(json!({
                        "source": failure.source,
                        "outcome": ProbeOutcome::Empty { attempts: vec![failure.clone()] },
                        "entries": [],
                    }));
                    attempts.push(failure);
                }
            }
        }

        if accepted.is_empty() {
            warn!("[{}] none of {} sources were available", domain, strategies.len());
            return ProbeResult::empty(domain, attempts);
        }

        let source = accepted.join(", ");
        let outcome = if any_partial {
            ProbeOutcome::Partial {
                source,
                exit_code: partial_exit,
            }
        } else {
            ProbeOutcome::Complete { source }
        };
        ProbeResult::new(domain, outcome, ProbeRecords::Structured(sections))
    }
}
