//! Docker command implementation

use std::path::{Path, PathBuf};

use console::Style;

use crate::cli::{DockerArgs, DockerCommands, DockerfileArgs};
use crate::commands::timestamp;
use crate::error::{PinnyError, Result};
use crate::lockfile::{self, LockFile};
use crate::pin::Rewrite;
use crate::pin::dockerfile::DigestSource;
use crate::settings::Settings;
use crate::text::SourceText;
use crate::transaction;

/// Run docker command
pub fn run(args: DockerArgs) -> Result<()> {
    let settings = Settings::default().with_lockfile(args.lockfile);

    match args.command {
        DockerCommands::Pin(pin) => {
            let mut resolver = settings.resolver();
            let output = pin_dockerfile(
                &pin.dockerfile,
                pin.inplace,
                &mut DigestSource::Registry(&mut resolver),
                &timestamp(),
            )?;
            print_pinned(&pin, &output);
            Ok(())
        }
        DockerCommands::Transform(transform) => {
            let lock = LockFile::load(&settings.lockfile)?;
            let output = pin_dockerfile(
                &transform.dockerfile,
                transform.inplace,
                &mut DigestSource::LockFile(&lock),
                &timestamp(),
            )?;
            print_pinned(&transform, &output);
            Ok(())
        }
        DockerCommands::Lock(lock) => {
            let mut resolver = settings.resolver();
            let generated =
                lockfile::generate(&lock.dockerfile, &settings.lockfile, &mut resolver, &timestamp())?;
            println!(
                "  {} {} ({} image{})",
                Style::new().green().bold().apply_to("locked"),
                settings.lockfile.display(),
                generated.entries.len(),
                if generated.entries.len() == 1 { "" } else { "s" }
            );
            Ok(())
        }
        DockerCommands::Digest(digest) => {
            let image = settings.resolver().resolve_image(&digest.image)?;
            let value = image.digest.ok_or_else(|| PinnyError::DigestNotFound {
                reference: digest.image.clone(),
            })?;
            println!("{value}");
            Ok(())
        }
    }
}

/// A written Dockerfile and what was rewritten in it
#[derive(Debug)]
pub struct PinnedDockerfile {
    pub output: PathBuf,
    pub rewrite: Rewrite,
}

/// Rewrite `dockerfile` and write the result to its output path
///
/// The output is `<dockerfile>.pinned`, or the Dockerfile itself when
/// `inplace` is set. An in-place rewrite that changes nothing does not touch
/// the file.
pub fn pin_dockerfile(
    dockerfile: &Path,
    inplace: bool,
    digests: &mut DigestSource<'_>,
    timestamp: &str,
) -> Result<PinnedDockerfile> {
    let source = SourceText::read(dockerfile)?;
    let rewrite = crate::pin::dockerfile::rewrite(
        &dockerfile.display().to_string(),
        &source,
        digests,
        timestamp,
    )?;

    let output = output_path(dockerfile, inplace);
    if !(inplace && rewrite.is_unchanged()) {
        transaction::write_atomic(&output, &rewrite.content)?;
    }
    Ok(PinnedDockerfile { output, rewrite })
}

/// `<dockerfile>.pinned`, or the Dockerfile itself in place
fn output_path(dockerfile: &Path, inplace: bool) -> PathBuf {
    if inplace {
        return dockerfile.to_path_buf();
    }
    let mut name = dockerfile
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".pinned");
    dockerfile.with_file_name(name)
}

fn print_pinned(args: &DockerfileArgs, pinned: &PinnedDockerfile) {
    let count = pinned.rewrite.pinned;
    println!(
        "  {} {} -> {} ({} image{})",
        Style::new().green().bold().apply_to("pinned"),
        args.dockerfile.display(),
        pinned.output.display(),
        count,
        if count == 1 { "" } else { "s" }
    );
}
