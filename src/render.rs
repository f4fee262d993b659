//! Background PDF renders with an explicit completion signal.
//!
//! Each job owns its invoice snapshot and reports exactly once over a
//! channel. Waiting is bounded; a job that does not report in time is
//! abandoned and surfaces as [`InvoiceError::RenderTimeout`].

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::error::{InvoiceError, Result};
use crate::model::InvoiceData;
use crate::pdf::{render_to_pdf, FontSet};

pub struct RenderJob {
    label: String,
    done: Receiver<Result<Vec<u8>>>,
}

impl RenderJob {
    /// Starts rendering `data` on a worker thread.
    pub fn spawn(data: InvoiceData, fonts: Arc<FontSet>) -> Self {
        let label = data.invoice_number.clone();
        Self::spawn_with(label, move || render_to_pdf(&data, &fonts))
    }

    /// Runs any render closure as a job.
    pub fn spawn_with<F>(label: impl Into<String>, render: F) -> Self
    where
        F: FnOnce() -> Result<Vec<u8>> + Send + 'static,
    {
        let label = label.into();
        let (tx, rx) = mpsc::channel();
        let worker_label = label.clone();
        thread::spawn(move || {
            debug!("render of {worker_label} started");
            // The receiver may be gone after a timeout.
            let _ = tx.send(render());
        });
        Self { label, done: rx }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Blocks until the render finishes or `timeout` elapses.
    pub fn wait(self, timeout: Duration) -> Result<Vec<u8>> {
        match self.done.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!("render of {} timed out after {:?}", self.label, timeout);
                Err(InvoiceError::RenderTimeout {
                    invoice: self.label,
                    seconds: timeout.as_secs(),
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(InvoiceError::PdfGeneration(format!(
                "render of {} stopped without a result",
                self.label
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn finished_job_returns_pdf_bytes() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let job = RenderJob::spawn(InvoiceData::new_default(today), Arc::new(FontSet::builtin()));
        let bytes = job.wait(Duration::from_secs(30)).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn slow_job_times_out() {
        let job = RenderJob::spawn_with("INV-SLOW", || {
            thread::sleep(Duration::from_millis(500));
            Ok(Vec::new())
        });
        let err = job.wait(Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, InvoiceError::RenderTimeout { ref invoice, .. } if invoice == "INV-SLOW"));
    }

    #[test]
    fn panicking_job_reports_failure() {
        let job = RenderJob::spawn_with("INV-PANIC", || panic!("boom"));
        assert!(job.wait(Duration::from_secs(5)).is_err());
    }
}
