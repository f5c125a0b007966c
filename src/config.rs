//! Environment-driven configuration (spec §6.4), validated at startup.
//!
//! Reads each setting with `std::env::var`, falls back to a documented
//! default, and never panics.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Criticality tier for a named upstream integration (spec §6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    /// Missing/unreachable -> health reports `degraded`; best-bets may
    /// return empty.
    Critical,
    /// Absence yields `degraded` health but operations continue.
    DegradedOk,
    /// Absence logged once, no health impact.
    Optional,
    /// Required only for relevant sports (e.g. weather for outdoor games).
    RelevanceGated,
}

/// One named integration and the OR-list of env vars that configure it
/// (spec §6.4: "the integration registry treats listed alternatives with
/// OR logic (any one present -> CONFIGURED)").
#[derive(Debug, Clone)]
pub struct IntegrationSpec {
    pub name: &'static str,
    pub criticality: Criticality,
    pub env_vars: Vec<&'static str>,
}

impl IntegrationSpec {
    pub fn configured(&self) -> bool {
        self.env_vars.iter().any(|v| env::var(v).is_ok())
    }
}

/// The set of integrations the core depends on: an env-driven kill
/// switch per upstream, generalized into a named registry rather than
/// one flag per vendor.
#[derive(Debug, Clone)]
pub struct IntegrationRegistry {
    pub integrations: Vec<IntegrationSpec>,
}

impl IntegrationRegistry {
    pub fn default_set() -> Self {
        Self {
            integrations: vec![
                IntegrationSpec {
                    name: "market_data",
                    criticality: Criticality::Critical,
                    env_vars: vec!["MARKET_DATA_API_KEY", "MARKET_DATA_API_KEY_ALT"],
                },
                IntegrationSpec {
                    name: "results",
                    criticality: Criticality::Critical,
                    env_vars: vec!["RESULTS_API_KEY"],
                },
                IntegrationSpec {
                    name: "splits",
                    criticality: Criticality::DegradedOk,
                    env_vars: vec!["SPLITS_API_KEY"],
                },
                IntegrationSpec {
                    name: "serp",
                    criticality: Criticality::Optional,
                    env_vars: vec!["SERP_API_KEY"],
                },
                IntegrationSpec {
                    name: "weather",
                    criticality: Criticality::RelevanceGated,
                    env_vars: vec!["WEATHER_API_KEY"],
                },
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&IntegrationSpec> {
        self.integrations.iter().find(|i| i.name == name)
    }

    /// True if any `Critical` integration is unconfigured.
    pub fn is_degraded(&self) -> bool {
        self.integrations
            .iter()
            .filter(|i| i.criticality == Criticality::Critical)
            .any(|i| !i.configured())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Resolved base directory for persistent state (spec §4.3, §6.4).
    pub volume_mount_path: PathBuf,
    /// Shadow-mode flag for `expert_consensus_boost` (SPEC_FULL.md §2).
    pub shadow_expert_consensus: bool,
    /// Per-upstream-call timeout for slate building (spec §4.1).
    pub market_data_timeout_secs: u64,
    /// Whole-slate batch deadline (spec §4.1).
    pub slate_batch_deadline_secs: u64,
    /// Default misfire grace window for scheduled jobs (spec §4.5).
    pub scheduler_misfire_grace_secs: u64,
    pub integrations: IntegrationRegistry,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let volume_mount_path = env::var("VOLUME_MOUNT_PATH")
            .context("VOLUME_MOUNT_PATH must be set to a writable, durable, mounted directory")?;

        let shadow_expert_consensus = env::var("SHADOW_EXPERT_CONSENSUS")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(true);

        let market_data_timeout_secs = env::var("MARKET_DATA_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let slate_batch_deadline_secs = env::var("SLATE_BATCH_DEADLINE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15);

        let scheduler_misfire_grace_secs = env::var("SCHEDULER_MISFIRE_GRACE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(600);

        Ok(Self {
            volume_mount_path: PathBuf::from(volume_mount_path),
            shadow_expert_consensus,
            market_data_timeout_secs,
            slate_batch_deadline_secs,
            scheduler_misfire_grace_secs,
            integrations: IntegrationRegistry::default_set(),
        })
    }

    /// Validate the resolved volume at startup: writable, a real
    /// mountpoint (best-effort on non-Linux), and not obviously
    /// ephemeral (e.g. `/tmp`). Fatal on failure per spec §4.3/§5.
    pub fn validate_storage(&self) -> Result<()> {
        let path = &self.volume_mount_path;
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("failed to create volume dir {}", path.display()))?;
        }
        let probe = path.join(".write_probe");
        std::fs::write(&probe, b"ok")
            .with_context(|| format!("{} is not writable", path.display()))?;
        let _ = std::fs::remove_file(&probe);

        if looks_ephemeral(path) {
            bail!(
                "resolved volume {} looks ephemeral; refusing to start",
                path.display()
            );
        }
        Ok(())
    }
}

fn looks_ephemeral(path: &PathBuf) -> bool {
    let s = path.to_string_lossy();
    s.starts_with("/tmp") || s.starts_with("/dev/shm")
}
