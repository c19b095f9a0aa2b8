use std::path::PathBuf;

use clap::ValueEnum;
use elastisim_policy::Variant;
use serde::Deserialize;

/// Which of the four canonical scheduling variants to run, selectable on
/// the command line or in a config file (spec.md §4, `Variant`'s named
/// constructors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantKind {
    RigidEasyBackfill,
    MinCommonPool,
    PrefCommonPool,
    AverageStealAgreement,
}

impl VariantKind {
    pub fn build(self) -> Variant {
        match self {
            VariantKind::RigidEasyBackfill => Variant::rigid_easy_backfill(),
            VariantKind::MinCommonPool => Variant::min_common_pool(),
            VariantKind::PrefCommonPool => Variant::pref_common_pool(),
            VariantKind::AverageStealAgreement => Variant::average_steal_agreement(),
        }
    }
}

/// Resolved run configuration. Every field has a CLI flag and a config-file
/// key of the same name; the CLI flag wins when both are given. No field is
/// ever read from an environment variable (spec.md §6 "No environment
/// variables").
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub variant: VariantKindOrDefault,
    /// `ipc://<path>` channel the simulator dials (spec.md §6).
    pub transport_url: String,
    /// Where the CSV event log is written (spec.md §6).
    pub event_log: PathBuf,
    /// Mirrors the original `injectExtension`'s `wait_for_input` debug flag:
    /// blocks for a keypress before the first tick, to let a debugger
    /// attach.
    pub wait_for_input: bool,
}

/// `toml`-deserializable wrapper so a config file may simply omit `variant`
/// (falls back to `rigid_easy_backfill`) without every other field needing
/// `Option<T>`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(transparent)]
pub struct VariantKindOrDefault(pub VariantKind);

impl Default for VariantKindOrDefault {
    fn default() -> Self {
        Self(VariantKind::RigidEasyBackfill)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            variant: VariantKindOrDefault::default(),
            transport_url: elastisim_transport::DEFAULT_URL.to_string(),
            event_log: PathBuf::from("data/output/event.csv"),
            wait_for_input: false,
        }
    }
}

impl SchedulerConfig {
    /// Loads a config file if `path` is `Some` and exists, then applies the
    /// CLI overrides on top.
    pub fn load(path: Option<&std::path::Path>, overrides: &crate::cli::Cli) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
                toml::from_str(&text).map_err(|e| anyhow::anyhow!("parsing config file {}: {e}", path.display()))?
            }
            None => Self::default(),
        };

        if let Some(variant) = overrides.variant {
            config.variant = VariantKindOrDefault(variant);
        }
        if let Some(url) = &overrides.transport_url {
            config.transport_url = url.clone();
        }
        if let Some(path) = &overrides.event_log {
            config.event_log = path.clone();
        }
        if overrides.wait_for_input {
            config.wait_for_input = true;
        }
        Ok(config)
    }
}
