// src/dispatch/strategy.rs - Per-platform print strategy tables
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::platform::{self, Platform};

/// Placeholder in an argument template that is replaced by the target file.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// How a strategy's subprocess exit status maps to success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Exit code 0 is success, anything else is a failure.
    ZeroIsSuccess,
    /// Any completion counts as success, regardless of exit code.
    ///
    /// Adobe Reader's `/t` switch is known to report nonzero even after the
    /// document was handed to the spooler. Accepting the tool's unreliable
    /// status is a deliberate per-strategy policy, not a bug to fix here.
    AnyCompletion,
}

/// How the strategy's executable is located on the host.
#[derive(Debug, Clone)]
pub enum Locator {
    /// Fixed install locations, probed in order.
    Candidates(Vec<PathBuf>),
    /// Name resolved through the PATH environment variable.
    PathLookup(String),
}

/// One concrete way of handing a file to the platform print mechanism.
///
/// Strategies are data, not control flow: the dispatcher walks a table of
/// these in priority order, so adding a method means adding a row.
#[derive(Debug, Clone)]
pub struct PrintStrategy {
    pub name: &'static str,
    pub locator: Locator,
    /// Argument template; [`FILE_PLACEHOLDER`] is replaced by the target path.
    pub args: Vec<String>,
    pub timeout: Duration,
    pub exit_policy: ExitPolicy,
}

impl PrintStrategy {
    /// Locate the strategy's executable, or `None` if it is not installed.
    pub fn locate(&self) -> Option<PathBuf> {
        match &self.locator {
            Locator::Candidates(paths) => paths.iter().find(|p| p.is_file()).cloned(),
            Locator::PathLookup(tool) => platform::find_in_path(tool),
        }
    }

    /// Expand the argument template for a concrete file.
    pub fn args_for(&self, file: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| {
                if arg == FILE_PLACEHOLDER {
                    file.as_os_str().to_os_string()
                } else {
                    OsString::from(arg)
                }
            })
            .collect()
    }
}

/// Timeout bounds applied when building the strategy tables.
///
/// GUI tools on Windows can sit in a hung dialog for a long time; spooler
/// clients either queue quickly or fail quickly.
#[derive(Debug, Clone, Copy)]
pub struct StrategyTimeouts {
    pub gui_tool: Duration,
    pub spooler: Duration,
}

impl Default for StrategyTimeouts {
    fn default() -> Self {
        Self {
            gui_tool: Duration::from_secs(60),
            spooler: Duration::from_secs(30),
        }
    }
}

/// The strategy table for a platform, in priority order.
///
/// Which executables are probed, in which order, with which arguments is a
/// compatibility contract; changes here change what "printing" means on a host.
pub fn strategies_for(platform: Platform, timeouts: StrategyTimeouts) -> Vec<PrintStrategy> {
    match platform {
        Platform::Windows => windows_strategies(timeouts),
        Platform::Linux => vec![
            spooler_strategy("lp", timeouts),
            spooler_strategy("lpr", timeouts),
        ],
        Platform::MacOs => vec![spooler_strategy("lpr", timeouts)],
        Platform::Unknown => Vec::new(),
    }
}

fn windows_strategies(timeouts: StrategyTimeouts) -> Vec<PrintStrategy> {
    let mut sumatra_candidates = vec![
        PathBuf::from(r"C:\Program Files\SumatraPDF\SumatraPDF.exe"),
        PathBuf::from(r"C:\Program Files (x86)\SumatraPDF\SumatraPDF.exe"),
    ];
    if let Some(local_app_data) = env::var_os("LOCALAPPDATA") {
        sumatra_candidates.push(PathBuf::from(local_app_data).join(r"SumatraPDF\SumatraPDF.exe"));
    }

    let adobe_candidates = vec![
        PathBuf::from(r"C:\Program Files\Adobe\Acrobat DC\Acrobat\Acrobat.exe"),
        PathBuf::from(r"C:\Program Files (x86)\Adobe\Acrobat DC\Acrobat\Acrobat.exe"),
        PathBuf::from(r"C:\Program Files\Adobe\Acrobat Reader DC\Reader\AcroRd32.exe"),
        PathBuf::from(r"C:\Program Files (x86)\Adobe\Acrobat Reader DC\Reader\AcroRd32.exe"),
        PathBuf::from(r"C:\Program Files\Adobe\Reader 11.0\Reader\AcroRd32.exe"),
        PathBuf::from(r"C:\Program Files (x86)\Adobe\Reader 11.0\Reader\AcroRd32.exe"),
    ];

    vec![
        PrintStrategy {
            name: "sumatra",
            locator: Locator::Candidates(sumatra_candidates),
            args: vec![
                "-print-to-default".to_string(),
                "-silent".to_string(),
                FILE_PLACEHOLDER.to_string(),
            ],
            timeout: timeouts.gui_tool,
            exit_policy: ExitPolicy::ZeroIsSuccess,
        },
        PrintStrategy {
            name: "adobe-reader",
            locator: Locator::Candidates(adobe_candidates),
            args: vec!["/t".to_string(), FILE_PLACEHOLDER.to_string()],
            timeout: timeouts.gui_tool,
            exit_policy: ExitPolicy::AnyCompletion,
        },
        // Shell "print" verb, delegated to whatever application is registered
        // for PDF files.
        PrintStrategy {
            name: "print-verb",
            locator: Locator::PathLookup("powershell".to_string()),
            args: vec![
                "-NoProfile".to_string(),
                "-Command".to_string(),
                "Start-Process".to_string(),
                "-FilePath".to_string(),
                FILE_PLACEHOLDER.to_string(),
                "-Verb".to_string(),
                "Print".to_string(),
                "-WindowStyle".to_string(),
                "Hidden".to_string(),
            ],
            timeout: timeouts.gui_tool,
            exit_policy: ExitPolicy::ZeroIsSuccess,
        },
    ]
}

fn spooler_strategy(tool: &'static str, timeouts: StrategyTimeouts) -> PrintStrategy {
    PrintStrategy {
        name: tool,
        locator: Locator::PathLookup(tool.to_string()),
        args: vec![FILE_PLACEHOLDER.to_string()],
        timeout: timeouts.spooler,
        exit_policy: ExitPolicy::ZeroIsSuccess,
    }
}
