//! Actions command implementation
//!
//! `pin` rewrites every workflow in the workflow directory as one batch: all
//! files are rewritten in memory first, then published together. If any file
//! fails, no workflow is modified.

use std::path::{Path, PathBuf};

use console::Style;
use walkdir::WalkDir;

use crate::cli::{ActionsArgs, ActionsCommands, ActionsPinArgs};
use crate::error::{PinnyError, Result};
use crate::pin::{Rewrite, workflow};
use crate::progress::ProgressDisplay;
use crate::resolver::Resolver;
use crate::settings::Settings;
use crate::text::SourceText;
use crate::transaction::Transaction;

/// A workflow file and its rewritten content
#[derive(Debug)]
pub struct PinnedWorkflow {
    pub path: PathBuf,
    pub rewrite: Rewrite,
}

/// Run actions command
pub fn run(args: ActionsArgs) -> Result<()> {
    let settings = Settings::default()
        .with_github_token(args.github.github_token)
        .with_github_api_url(args.github.github_api_url);

    match args.command {
        ActionsCommands::Pin(pin) => run_pin(&settings.with_strict(pin.strict), &pin),
        ActionsCommands::Digest(digest) => run_digest(&settings, &digest.action),
    }
}

fn run_pin(settings: &Settings, args: &ActionsPinArgs) -> Result<()> {
    let files = find_workflows(&args.workflow_dir)?;
    let mut resolver = settings.resolver();

    let progress = ProgressDisplay::new(files.len() as u64);
    let pinned = match rewrite_workflows(&files, &mut resolver, Some(&progress)) {
        Ok(pinned) => {
            progress.finish();
            pinned
        }
        Err(e) => {
            progress.abandon();
            return Err(e);
        }
    };

    if args.dry_run {
        for workflow in &pinned {
            println!(
                "{}",
                Style::new()
                    .bold()
                    .apply_to(format!("# {}", workflow.path.display()))
            );
            print!("{}", workflow.rewrite.content);
        }
        return Ok(());
    }

    let written = publish(&pinned)?;
    tracing::debug!("Published {} of {} workflow(s)", written, pinned.len());
    print_summary(&pinned);
    Ok(())
}

fn run_digest(settings: &Settings, action: &str) -> Result<()> {
    let resolved = settings.resolver().resolve_action(action)?;
    match resolved.reference.digest {
        Some(digest) => {
            println!("{digest}");
            Ok(())
        }
        None => Err(PinnyError::UnresolvedReference {
            reference: action.to_string(),
        }),
    }
}

/// `.yml`/`.yaml` files directly inside `dir`, sorted by name
pub fn find_workflows(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PinnyError::NoWorkflowsFound {
            path: dir.display().to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| PinnyError::FileReadFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let is_workflow = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == "yml" || ext == "yaml");
        if entry.file_type().is_file() && is_workflow {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(PinnyError::NoWorkflowsFound {
            path: dir.display().to_string(),
        });
    }
    Ok(files)
}

/// Rewrite every file in memory, stopping at the first failure
pub fn rewrite_workflows(
    files: &[PathBuf],
    resolver: &mut Resolver,
    progress: Option<&ProgressDisplay>,
) -> Result<Vec<PinnedWorkflow>> {
    let mut pinned = Vec::with_capacity(files.len());
    for path in files {
        if let Some(progress) = progress {
            progress.update_file(&path.display().to_string());
        }
        tracing::debug!("Pinning {}", path.display());

        let source = SourceText::read(path)?;
        if source.is_empty() {
            tracing::warn!("{} is empty", path.display());
        }
        let rewrite = workflow::rewrite(&source, resolver)?;
        pinned.push(PinnedWorkflow {
            path: path.clone(),
            rewrite,
        });

        if let Some(progress) = progress {
            progress.inc_file();
        }
    }
    Ok(pinned)
}

/// Stage every changed workflow and publish them together
///
/// Returns the number of files written.
pub fn publish(pinned: &[PinnedWorkflow]) -> Result<usize> {
    let mut transaction = Transaction::new();
    for workflow in pinned.iter().filter(|w| !w.rewrite.is_unchanged()) {
        transaction.stage(&workflow.path, &workflow.rewrite.content)?;
    }
    if transaction.is_empty() {
        return Ok(0);
    }
    let written = transaction.len();
    transaction.commit()?;
    Ok(written)
}

fn print_summary(pinned: &[PinnedWorkflow]) {
    for workflow in pinned {
        let rewrite = &workflow.rewrite;
        let mut line = if rewrite.is_unchanged() {
            format!(
                "  {} {}",
                Style::new().dim().apply_to("unchanged"),
                workflow.path.display()
            )
        } else {
            format!(
                "  {} {} ({})",
                Style::new().green().bold().apply_to("pinned"),
                workflow.path.display(),
                plural(rewrite.pinned, "reference")
            )
        };
        if rewrite.warnings > 0 {
            line.push_str(&format!(
                " {}",
                Style::new()
                    .yellow()
                    .apply_to(format!("[{}]", plural(rewrite.warnings, "warning")))
            ));
        }
        println!("{line}");
    }
}

fn plural(count: usize, noun: &str) -> String {
    format!("{count} {noun}{}", if count == 1 { "" } else { "s" })
}
