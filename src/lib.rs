// src/lib.rs - Library surface for the pdfbatch binary and integration tests
pub mod batch;
pub mod config;
pub mod dispatch;
pub mod platform;
pub mod scanner;

pub use batch::{BatchController, BatchEvent, BatchHandle, BatchStatus, BatchSummary};
pub use dispatch::{DispatchError, PdfDispatcher, PrintOutcome, SystemDispatcher};
pub use platform::Platform;
