//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::client::github::DEFAULT_API_URL;
use crate::lockfile::DEFAULT_LOCKFILE;

/// Pinny - pin mutable references to immutable digests
///
/// Rewrites GitHub Actions workflows and Dockerfiles so every action and base
/// image is referenced by commit SHA or manifest digest.
#[derive(Parser, Debug)]
#[command(
    name = "pinny",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Pin GitHub Actions and Docker images to immutable digests",
    long_about = "Pinny replaces mutable references (tags, branches) in GitHub Actions \
                  workflows and Dockerfiles with the commit SHAs and manifest digests they \
                  currently point at, leaving a comment with the original reference.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  pinny actions pin\n    \
                  pinny actions digest actions/checkout@v4\n    \
                  pinny docker pin -f Dockerfile\n    \
                  pinny docker lock && pinny docker transform -i\n    \
                  pinny docker digest alpine:3.18"
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pin GitHub Actions workflow steps
    Actions(ActionsArgs),

    /// Pin Dockerfile base images
    Docker(DockerArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Hosting API access shared by the actions subcommands
#[derive(Args, Debug)]
pub struct GithubArgs {
    /// GitHub token (anonymous access when unset)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub github_token: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "PINNY_GITHUB_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub github_api_url: String,
}

/// Arguments for the actions command
#[derive(Parser, Debug)]
pub struct ActionsArgs {
    #[command(flatten)]
    pub github: GithubArgs,

    #[command(subcommand)]
    pub command: ActionsCommands,
}

#[derive(Subcommand, Debug)]
pub enum ActionsCommands {
    /// Pin every workflow in the workflow directory
    Pin(ActionsPinArgs),

    /// Print the commit SHA a step reference points at
    Digest(ActionsDigestArgs),
}

/// Arguments for actions pin
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Pin all workflows:\n    pinny actions pin\n\n\
                  Preview without writing:\n    pinny actions pin --dry-run\n\n\
                  Fail on references that cannot be resolved:\n    pinny actions pin --strict")]
pub struct ActionsPinArgs {
    /// Directory holding workflow files
    #[arg(long, default_value = ".github/workflows")]
    pub workflow_dir: PathBuf,

    /// Print rewritten workflows instead of writing them
    #[arg(long, short = 'd')]
    pub dry_run: bool,

    /// Fail on step references that cannot be pinned
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for actions digest
#[derive(Parser, Debug)]
pub struct ActionsDigestArgs {
    /// Step reference, e.g. actions/checkout@v4
    pub action: String,
}

/// Arguments for the docker command
#[derive(Parser, Debug)]
pub struct DockerArgs {
    /// Lock file used by lock and transform
    #[arg(long, env = "PINNY_LOCKFILE", default_value = DEFAULT_LOCKFILE, global = true)]
    pub lockfile: PathBuf,

    #[command(subcommand)]
    pub command: DockerCommands,
}

#[derive(Subcommand, Debug)]
pub enum DockerCommands {
    /// Pin base images using the registry
    Pin(DockerfileArgs),

    /// Pin base images using the lock file, without network access
    Transform(DockerfileArgs),

    /// Resolve base images and record their digests in the lock file
    Lock(DockerLockArgs),

    /// Print the manifest digest an image reference points at
    Digest(DockerDigestArgs),
}

/// Arguments for docker pin and docker transform
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Write Dockerfile.pinned:\n    pinny docker pin\n\n\
                  Rewrite in place:\n    pinny docker pin -i -f build/Dockerfile")]
pub struct DockerfileArgs {
    /// Dockerfile to pin
    #[arg(long, short = 'f', default_value = "Dockerfile")]
    pub dockerfile: PathBuf,

    /// Rewrite the Dockerfile in place instead of writing <file>.pinned
    #[arg(long, short = 'i')]
    pub inplace: bool,
}

/// Arguments for docker lock
#[derive(Parser, Debug)]
pub struct DockerLockArgs {
    /// Dockerfile to lock
    #[arg(long, short = 'f', default_value = "Dockerfile")]
    pub dockerfile: PathBuf,
}

/// Arguments for docker digest
#[derive(Parser, Debug)]
pub struct DockerDigestArgs {
    /// Image reference, e.g. alpine:3.18 or docker://ghcr.io/org/app:v1
    pub image: String,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    pinny completions --shell bash > ~/.bash_completion.d/pinny\n\n\
                  Generate zsh completions:\n    pinny completions --shell zsh > ~/.zfunc/_pinny\n\n\
                  Generate fish completions:\n    pinny completions --shell fish > ~/.config/fish/completions/pinny.fish\n\n\
                  Generate PowerShell completions:\n    pinny completions --shell powershell")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}
