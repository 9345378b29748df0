// src/dispatch/mod.rs - Platform print dispatcher
//
// Stateless request/response: given one file, walk the platform's strategy
// table until a method succeeds or the table is exhausted, and classify the
// result. All failures are recovered into a `PrintOutcome` value; nothing in
// this module escapes as a fault.

pub mod strategy;

pub use strategy::{ExitPolicy, Locator, PrintStrategy, StrategyTimeouts, strategies_for};

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use crate::platform::{self, Platform};

/// Bound on the best-effort diagnostic queries.
const DIAGNOSTIC_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("file not found: {path}")]
    FileNotFound { path: String },
    #[error("unsupported platform: {os}")]
    UnsupportedPlatform { os: String },
    #[error("no print tool installed for {platform}")]
    ToolNotFound { platform: Platform },
    #[error("print command '{tool}' timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },
    #[error("print command '{tool}' failed: {detail}")]
    ExecutionFailed { tool: String, detail: String },
    #[error("no print method succeeded: {detail}")]
    NoPrintMethodAvailable { detail: String },
}

/// Result of one dispatch attempt. Immutable once created.
#[derive(Debug)]
pub struct PrintOutcome {
    pub succeeded: bool,
    pub error: Option<DispatchError>,
}

impl PrintOutcome {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(error: DispatchError) -> Self {
        Self {
            succeeded: false,
            error: Some(error),
        }
    }

    /// Message for event payloads; empty when the dispatch succeeded.
    pub fn error_message(&self) -> String {
        self.error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default()
    }
}

/// Prints exactly one file. Implemented by the system dispatcher and by test
/// stubs driving the batch controller.
#[async_trait]
pub trait PdfDispatcher: Send + Sync {
    async fn dispatch(&self, path: &Path) -> PrintOutcome;
}

/// Dispatcher backed by the host's print tooling.
#[derive(Debug, Clone, Default)]
pub struct SystemDispatcher {
    timeouts: StrategyTimeouts,
}

impl SystemDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeouts(timeouts: StrategyTimeouts) -> Self {
        Self { timeouts }
    }

    /// Table-driven dispatch core.
    ///
    /// Walks `strategies` in order: a strategy whose executable is missing is
    /// skipped; a located one is run under its timeout. A timeout aborts the
    /// whole dispatch (the tool hung; retrying another method would double
    /// print on a slow spooler), any other failure falls through to the next
    /// row. Spawns at most one subprocess per located strategy.
    pub async fn dispatch_with(
        &self,
        platform: Platform,
        strategies: &[PrintStrategy],
        path: &Path,
    ) -> PrintOutcome {
        if !path.is_file() {
            return PrintOutcome::failure(DispatchError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let mut last_error: Option<DispatchError> = None;
        let mut any_located = false;

        for strategy in strategies {
            let Some(exe) = strategy.locate() else {
                tracing::debug!(strategy = strategy.name, "print tool not installed, skipping");
                continue;
            };
            any_located = true;

            match run_strategy(strategy, &exe, path).await {
                Ok(()) => {
                    tracing::info!(strategy = strategy.name, file = %path.display(), "printed");
                    return PrintOutcome::success();
                }
                Err(err @ DispatchError::Timeout { .. }) => {
                    tracing::error!(strategy = strategy.name, %err, "print tool hung");
                    return PrintOutcome::failure(err);
                }
                Err(err) => {
                    tracing::warn!(strategy = strategy.name, %err, "falling back to next method");
                    last_error = Some(err);
                }
            }
        }

        if !any_located {
            return PrintOutcome::failure(DispatchError::ToolNotFound { platform });
        }
        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no strategies configured".to_string());
        PrintOutcome::failure(DispatchError::NoPrintMethodAvailable { detail })
    }
}

#[async_trait]
impl PdfDispatcher for SystemDispatcher {
    async fn dispatch(&self, path: &Path) -> PrintOutcome {
        let platform = Platform::current();
        if platform == Platform::Unknown {
            return PrintOutcome::failure(DispatchError::UnsupportedPlatform {
                os: std::env::consts::OS.to_string(),
            });
        }
        let strategies = strategies_for(platform, self.timeouts);
        self.dispatch_with(platform, &strategies, path).await
    }
}

async fn run_strategy(
    strategy: &PrintStrategy,
    exe: &Path,
    path: &Path,
) -> Result<(), DispatchError> {
    let mut command = Command::new(exe);
    command
        .args(strategy.args_for(path))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(strategy = strategy.name, exe = %exe.display(), "spawning print tool");

    let output = match timeout(strategy.timeout, command.output()).await {
        Err(_) => {
            // Dropping the output future kills the hung child.
            return Err(DispatchError::Timeout {
                tool: strategy.name.to_string(),
                seconds: strategy.timeout.as_secs(),
            });
        }
        Ok(Err(err)) => {
            return Err(DispatchError::ExecutionFailed {
                tool: strategy.name.to_string(),
                detail: err.to_string(),
            });
        }
        Ok(Ok(output)) => output,
    };

    match strategy.exit_policy {
        ExitPolicy::AnyCompletion => Ok(()),
        ExitPolicy::ZeroIsSuccess if output.status.success() => Ok(()),
        ExitPolicy::ZeroIsSuccess => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = match stderr.trim() {
                "" => format!("exit status {}", output.status),
                text => text.to_string(),
            };
            Err(DispatchError::ExecutionFailed {
                tool: strategy.name.to_string(),
                detail,
            })
        }
    }
}

/// Readiness report for the host print subsystem.
#[derive(Debug, Clone)]
pub struct PrintSystemStatus {
    pub ready: bool,
    pub detail: String,
}

/// Name of the system default printer, or `None` when no default is set or
/// the query fails. Best-effort: never raises.
pub async fn default_printer() -> Option<String> {
    match Platform::current() {
        Platform::Linux | Platform::MacOs => default_printer_unix().await,
        Platform::Windows => default_printer_windows().await,
        Platform::Unknown => None,
    }
}

async fn default_printer_unix() -> Option<String> {
    let output = query_tool("lpstat", &["-d"]).await?;
    // Output format: "system default destination: PRINTER_NAME"
    let text = String::from_utf8_lossy(&output).trim().to_string();
    let (_, name) = text.rsplit_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

async fn default_printer_windows() -> Option<String> {
    let output = query_tool(
        "powershell",
        &[
            "-NoProfile",
            "-Command",
            "(Get-CimInstance Win32_Printer -Filter \"Default=true\").Name",
        ],
    )
    .await?;
    let name = String::from_utf8_lossy(&output).trim().to_string();
    if name.is_empty() { None } else { Some(name) }
}

async fn query_tool(tool: &str, args: &[&str]) -> Option<Vec<u8>> {
    let exe = platform::find_in_path(tool)?;
    let mut command = Command::new(exe);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    let output = timeout(DIAGNOSTIC_TIMEOUT, command.output()).await.ok()?.ok()?;
    if output.status.success() {
        Some(output.stdout)
    } else {
        None
    }
}

/// Check whether the print subsystem is minimally configured. Best-effort:
/// degrades to "not ready" with a reason, never raises.
pub async fn print_system_status() -> PrintSystemStatus {
    match Platform::current() {
        Platform::Windows => PrintSystemStatus {
            // The shell print verb is always available as a last resort.
            ready: true,
            detail: "Windows print system ready".to_string(),
        },
        Platform::Linux => {
            if platform::find_in_path("lp").is_none() && platform::find_in_path("lpr").is_none() {
                return PrintSystemStatus {
                    ready: false,
                    detail: "CUPS not installed (lp/lpr not found)".to_string(),
                };
            }
            match default_printer().await {
                Some(printer) => PrintSystemStatus {
                    ready: true,
                    detail: format!("CUPS ready, default printer: {printer}"),
                },
                None => PrintSystemStatus {
                    ready: false,
                    detail: "no default printer configured".to_string(),
                },
            }
        }
        Platform::MacOs => {
            if platform::find_in_path("lpr").is_some() {
                PrintSystemStatus {
                    ready: true,
                    detail: "macOS print system ready".to_string(),
                }
            } else {
                PrintSystemStatus {
                    ready: false,
                    detail: "lpr not found".to_string(),
                }
            }
        }
        Platform::Unknown => PrintSystemStatus {
            ready: false,
            detail: format!("unsupported platform: {}", std::env::consts::OS),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_message_is_empty_on_success() {
        assert_eq!(PrintOutcome::success().error_message(), "");
    }

    #[test]
    fn outcome_message_carries_error_text() {
        let outcome = PrintOutcome::failure(DispatchError::FileNotFound {
            path: "a.pdf".to_string(),
        });
        assert!(!outcome.succeeded);
        assert_eq!(outcome.error_message(), "file not found: a.pdf");
    }

    #[tokio::test]
    async fn dispatch_fails_fast_on_missing_file() {
        let dispatcher = SystemDispatcher::new();
        let outcome = dispatcher
            .dispatch_with(Platform::Linux, &[], Path::new("/nonexistent/missing.pdf"))
            .await;
        assert!(!outcome.succeeded);
        assert!(matches!(
            outcome.error,
            Some(DispatchError::FileNotFound { .. })
        ));
    }
}
