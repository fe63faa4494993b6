//! The run loop: solution to projects to documents to output files.
//!
//! Projects and documents are processed one at a time in enumeration order.
//! Per-document failures are logged and counted as skipped; only
//! configuration and solution errors abort the run.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use reswrite_core::config::AppSettings;
use reswrite_core::error::ReswriteError;
use reswrite_core::filter::{FileFilterSpec, NameFilter};
use reswrite_core::output::{OutputWriter, RunSummary};
use reswrite_core::workspace::Solution;
use reswrite_csharp::ops::ResourcesExSourceVisitor;
use reswrite_csharp::project::{load_project, DocumentIdGenerator};
use reswrite_csharp::{Document, PipelineOutcome, VisitorPipeline};

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub settings: AppSettings,
    /// The configuration file the settings came from (for error messages).
    pub config_path: PathBuf,
    /// Run the rewrite without writing any file.
    pub dry_run: bool,
}

/// The pipeline applied to every document.
pub fn default_pipeline() -> VisitorPipeline {
    VisitorPipeline::new().with_visitor(ResourcesExSourceVisitor::new())
}

/// Process the configured solution.
pub async fn run(options: &RunOptions) -> Result<RunSummary, ReswriteError> {
    let settings = &options.settings;
    settings.validate(&options.config_path)?;

    let project_filter = NameFilter::new(
        &settings.projects_include_names,
        &settings.projects_exclude_names,
    );
    let file_filter = FileFilterSpec::new(
        &settings.files_include_patterns,
        &settings.files_exclude_patterns,
    )?;

    let solution = Solution::open(Path::new(&settings.solution))?;
    for diagnostic in &solution.diagnostics {
        warn!(%diagnostic, "workspace diagnostic");
    }

    let pipeline = default_pipeline();
    let writer = OutputWriter::new(settings.rewrite_files, options.dry_run);
    let mut summary = RunSummary::new(options.dry_run);
    let mut ids = DocumentIdGenerator::new();

    for project in solution
        .projects
        .iter()
        .filter(|p| project_filter.matches(&p.name))
    {
        info!(project = %project.name, "processing project");
        summary.projects += 1;

        let loaded = load_project(project, &mut ids);
        for document in loaded
            .documents
            .iter()
            .filter(|d| file_filter.matches(d.name(), d.path()))
        {
            info!(document = %document.name(), "processing document");
            summary.documents += 1;
            process_document(&pipeline, &writer, document, &mut summary).await;
        }
    }

    info!(
        projects = summary.projects,
        documents = summary.documents,
        rewritten = summary.rewritten,
        skipped = summary.skipped,
        "run complete"
    );
    Ok(summary)
}

async fn process_document(
    pipeline: &VisitorPipeline,
    writer: &OutputWriter,
    document: &Document,
    summary: &mut RunSummary,
) {
    let updated = match pipeline.run(document).await {
        Ok(PipelineOutcome::Unchanged) => return,
        Ok(PipelineOutcome::Changed(updated)) => updated,
        Err(error) => {
            warn!(document = %document.name(), %error, "skipping document");
            summary.skipped += 1;
            return;
        }
    };

    let Some(text) = updated.to_full_text() else {
        warn!(document = %updated.name(), "rewritten document has no tree");
        summary.skipped += 1;
        return;
    };

    match writer.write(updated.name(), updated.path(), &text, updated.content_hash()) {
        Ok(target) => {
            summary.rewritten += 1;
            summary.files.push(target.display().to_string());
        }
        Err(error) => {
            warn!(document = %updated.name(), %error, "skipping document");
            summary.skipped += 1;
        }
    }
}
