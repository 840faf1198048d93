//! YAML rule definitions: the candidate file and rule directories.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cronload_core::ScheduledJob;

use super::error::{LoadError, LoadResult, LoadStatus, Result};

/// The scheduling-relevant part of a detection rule file.
///
/// Rule files carry many more keys (description, search text, alert
/// actions, severity); those are ignored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    #[serde(default)]
    pub cron: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl From<RuleDefinition> for ScheduledJob {
    fn from(rule: RuleDefinition) -> Self {
        ScheduledJob {
            id: rule.name,
            cron_expression: rule.cron,
            enabled: !rule.disabled,
        }
    }
}

/// Parse a single YAML rule file into a job.
pub fn load_rule_file(path: &Path) -> Result<ScheduledJob> {
    let contents = fs::read_to_string(path)?;
    let rule: RuleDefinition = serde_yaml::from_str(&contents)?;
    if rule.name.trim().is_empty() {
        return Err(LoadError::Validation(format!(
            "rule in {} has an empty name",
            path.display()
        )));
    }
    Ok(rule.into())
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false)
}

/// Recursively load every YAML rule under `dir`.
///
/// Dotfiles and non-YAML files are skipped. A file that fails to parse is
/// reported in the results and does not abort the scan. Files are visited in
/// path order so the job list is stable across runs.
pub fn load_rules_dir(dir: &Path) -> Result<(Vec<ScheduledJob>, Vec<LoadResult>)> {
    let mut jobs = Vec::new();
    let mut results = Vec::new();
    scan_dir_recursive(dir, &mut jobs, &mut results)?;
    info!(
        path = %dir.display(),
        loaded = jobs.len(),
        files = results.len(),
        "loaded rules directory"
    );
    Ok((jobs, results))
}

fn scan_dir_recursive(dir: &Path, jobs: &mut Vec<ScheduledJob>, results: &mut Vec<LoadResult>) -> Result<()> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        // Skip dotfiles/dotdirs
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                if path.is_file() {
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Skipped {
                            reason: "dotfile".to_string(),
                        },
                    });
                }
                continue;
            }
        }

        if path.is_dir() {
            scan_dir_recursive(&path, jobs, results)?;
            continue;
        }

        if !is_yaml(&path) {
            results.push(LoadResult {
                path,
                status: LoadStatus::Skipped {
                    reason: "not a YAML file".to_string(),
                },
            });
            continue;
        }

        match load_rule_file(&path) {
            Ok(job) => {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Loaded { job_id: job.id.clone() },
                });
                jobs.push(job);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load rule file");
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Failed { error: e.to_string() },
                });
            }
        }
    }
    Ok(())
}
