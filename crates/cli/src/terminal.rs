use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};

use cronload_forecast::{JobOutcome, ViolationKind};

use crate::report::Report;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const HEADER: Color = Color::Magenta;
    const SAFE: Color = Color::Green;
    const SOFT: Color = Color::Yellow;
    const HARD: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
}

/// Maximum violation rows printed before summarizing the rest.
const MAX_VIOLATION_ROWS: usize = 20;

/// Writes a human-readable report to stdout.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    pub fn print_report(&self, report: &Report) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("cronload"),
            ResetColor,
            Print(format!(
                " - window {} .. {}\n",
                report.window.start.to_rfc3339(),
                report.window.end.to_rfc3339()
            )),
            SetForegroundColor(Colors::DIM),
            Print(format!(
                "hard limit {} | soft limit {} | soft policy {}{}\n",
                report.limits.hard_limit,
                report.limits.soft_limit,
                report.limits.soft_limit_policy,
                if report.limits.fallback { " | fallback" } else { "" },
            )),
            Print(format!(
                "{} job(s) simulated, {} skipped\n",
                report.simulated(),
                report.skipped().count()
            )),
            ResetColor,
        )?;

        for outcome in report.skipped() {
            self.print_skipped(outcome)?;
        }

        if let Some(peak) = report.baseline_peak {
            execute!(
                stdout,
                Print(format!(
                    "baseline peak: {} at {}\n",
                    peak.count,
                    peak.timestamp.to_rfc3339()
                ))
            )?;
        }

        if let Some(candidate) = &report.candidate {
            execute!(
                stdout,
                Print(format!(
                    "candidate '{}': {} firing(s) in window\n",
                    candidate.job_id, candidate.firings
                ))
            )?;
            if let Some(peak) = report.peak {
                execute!(
                    stdout,
                    Print(format!(
                        "peak with candidate: {} at {}\n",
                        peak.count,
                        peak.timestamp.to_rfc3339()
                    ))
                )?;
            }
        }

        let violations = &report.decision.violations;
        for v in violations.iter().take(MAX_VIOLATION_ROWS) {
            let color = match v.kind {
                ViolationKind::Hard => Colors::HARD,
                ViolationKind::Soft => Colors::SOFT,
            };
            execute!(
                stdout,
                SetForegroundColor(color),
                Print(format!("  {:<4}", v.kind.to_string())),
                ResetColor,
                Print(format!(
                    " {}  {} > {}\n",
                    v.timestamp.to_rfc3339(),
                    v.observed_count,
                    v.limit
                )),
            )?;
        }
        if violations.len() > MAX_VIOLATION_ROWS {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print(format!(
                    "  ... {} more violation(s)\n",
                    violations.len() - MAX_VIOLATION_ROWS
                )),
                ResetColor,
            )?;
        }

        let (color, verdict) = if report.decision.safe {
            (Colors::SAFE, "SAFE")
        } else {
            (Colors::HARD, "UNSAFE")
        };
        execute!(
            stdout,
            Print("verdict: "),
            SetForegroundColor(color),
            Print(verdict),
            ResetColor,
            Print("\n"),
        )?;
        stdout.flush()?;
        Ok(())
    }

    fn print_skipped(&self, outcome: &JobOutcome) -> Result<()> {
        let reason = match outcome {
            JobOutcome::Disabled { .. } => "disabled".to_string(),
            JobOutcome::Unscheduled { .. } => "no schedule".to_string(),
            JobOutcome::InvalidSchedule {
                expression, reason, ..
            } => format!("invalid schedule '{expression}': {reason}"),
            JobOutcome::Simulated { .. } => return Ok(()),
        };
        execute!(
            io::stdout(),
            SetForegroundColor(Colors::DIM),
            Print(format!("  skipped {}: {}\n", outcome.job_id(), reason)),
            ResetColor,
        )?;
        Ok(())
    }

    /// Print an error message in red to stderr.
    pub fn print_error(&self, msg: &str) -> Result<()> {
        let mut stderr = io::stderr();
        execute!(
            stderr,
            SetForegroundColor(Colors::HARD),
            Print(format!("Error: {}\n", msg)),
            ResetColor,
        )?;
        stderr.flush()?;
        Ok(())
    }
}
