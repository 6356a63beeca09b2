//! One probe per diagnostic domain.
//!
//! Most domains are a straight walk of their strategy chain. Three add their
//! own handling on top: `system_info` annotates the identity record,
//! `recent_file_hashes` runs the fingerprint walker and `external_scans`
//! caps the scanner output. No probe returns an error.

mod identity;
mod recent_files;
mod scanner;

pub use scanner::{cap_output, truncation_marker};

use std::path::PathBuf;
use std::sync::Arc;

use crate::collectors::native::{NativeProvider, SysinfoProvider};
use crate::collectors::runner::BoundedRunner;
use crate::collectors::strategy::{
    strategy_table, HostExecutor, StrategyContext, StrategyExecutor, StrategyResolver,
};
use crate::config::{user_home_dir, CollectorSettings};
use crate::models::{Domain, HostClass, ProbeResult, RunConfiguration};

/// Everything a probe may read. Shared immutably between probe tasks.
#[derive(Clone)]
pub struct ProbeContext {
    pub host: HostClass,
    pub run: Arc<RunConfiguration>,
    pub settings: Arc<CollectorSettings>,
    pub home_dir: Option<PathBuf>,
    resolver: StrategyResolver,
}

impl ProbeContext {
    pub fn new(
        host: HostClass,
        run: Arc<RunConfiguration>,
        settings: Arc<CollectorSettings>,
        home_dir: Option<PathBuf>,
        executor: Arc<dyn StrategyExecutor>,
    ) -> Self {
        Self {
            host,
            run,
            settings,
            home_dir,
            resolver: StrategyResolver::new(executor),
        }
    }

    /// Context for the machine the collector is running on
    pub fn for_local_host(run: Arc<RunConfiguration>, settings: Arc<CollectorSettings>) -> Self {
        let native: Arc<dyn NativeProvider> = Arc::new(SysinfoProvider::new());
        let executor = HostExecutor::new(Arc::new(BoundedRunner::new()), Some(native));
        Self::new(
            HostClass::detect(),
            run,
            settings,
            user_home_dir(),
            Arc::new(executor),
        )
    }

    pub fn strategy_context(&self) -> StrategyContext {
        StrategyContext {
            home_dir: self.home_dir.clone(),
            deep_mode: self.run.deep_mode,
        }
    }

    pub fn resolver(&self) -> &StrategyResolver {
        &self.resolver
    }
}

/// Run the probe for `domain`
pub async fn run_probe(domain: Domain, ctx: &ProbeContext) -> ProbeResult {
    match domain {
        Domain::SystemInfo => identity::collect(ctx).await,
        Domain::RecentFileHashes => recent_files::collect(ctx).await,
        Domain::ExternalScans => scanner::collect(ctx).await,
        _ => {
            let strategies = strategy_table(domain, ctx.host, &ctx.strategy_context());
            ctx.resolver
                .resolve(domain, &strategies, ctx.settings.command_timeout())
                .await
        }
    }
}
