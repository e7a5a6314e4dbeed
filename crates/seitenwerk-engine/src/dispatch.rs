// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion dispatch: routes a job to the operation matching its target
// and plumbs the option set through. The `JobRunner` seam keeps the queue
// testable without a PDF engine.

use seitenwerk_core::error::Result;
use seitenwerk_core::types::{CancelToken, ConversionJob, Operation, TargetFormat};
use seitenwerk_document::PageRasterizer;
use tracing::{info, instrument};

use crate::{batch, convert, merge, split};

/// Outcome of a successfully finished operation.
#[derive(Debug, Clone)]
pub struct OpReport {
    /// Human-readable summary shown next to the finished job.
    pub message: String,
    /// Whether the operation wrote nothing because the collision policy
    /// skipped an existing output.
    pub skipped: bool,
}

impl OpReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            skipped: false,
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            skipped: true,
        }
    }
}

/// Executes one job at a time on behalf of the queue worker.
pub trait JobRunner {
    fn run(
        &mut self,
        job: &ConversionJob,
        cancel: &CancelToken,
        progress: &mut dyn FnMut(u8),
    ) -> Result<OpReport>;
}

/// The production runner: owns the PDFium rasteriser (created once, on the
/// worker thread, because PDFium wants thread affinity) and routes each
/// operation to its implementation.
pub struct Dispatcher {
    rasterizer: PageRasterizer,
}

impl Dispatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rasterizer: PageRasterizer::new()?,
        })
    }
}

impl JobRunner for Dispatcher {
    #[instrument(skip_all, fields(job_id = %job.id))]
    fn run(
        &mut self,
        job: &ConversionJob,
        cancel: &CancelToken,
        progress: &mut dyn FnMut(u8),
    ) -> Result<OpReport> {
        job.settings.validate()?;
        info!(operation = %job.operation.label(), "dispatching job");

        match &job.operation {
            Operation::Convert {
                input,
                output,
                format,
            } => match format {
                TargetFormat::Pptx => convert::convert_to_pptx(
                    &self.rasterizer,
                    input,
                    output,
                    &job.settings,
                    cancel,
                    progress,
                ),
                TargetFormat::Docx => convert::convert_to_docx(
                    &self.rasterizer,
                    input,
                    output,
                    &job.settings,
                    cancel,
                    progress,
                ),
                raster => convert::convert_to_images(
                    &self.rasterizer,
                    input,
                    output,
                    *raster,
                    &job.settings,
                    cancel,
                    progress,
                ),
            },
            Operation::Merge { inputs, output } => {
                merge::merge_pdfs(inputs, output, &job.settings, cancel, progress)
            }
            Operation::Split { input, output_dir } => {
                split::split_pdf(input, output_dir, &job.settings, cancel, progress)
            }
            Operation::Batch {
                input_dir,
                output_dir,
                format,
            } => batch::convert_folder(
                &self.rasterizer,
                input_dir,
                output_dir,
                *format,
                &job.settings,
                cancel,
                progress,
            ),
        }
    }
}

/// Clamped integer percentage used by all operations.
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    ((done * 100) / total.max(1)).min(100) as u8
}
