use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

pub const KICHE_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\n{all-args}\n";

pub const KICHE_BEFORE_HELP: &str = concat!(
    "kiche ",
    env!("CARGO_PKG_VERSION"),
    " – throwaway python environments from standalone builds\n\n",
    "  run              Provision python + requirements, then run a command in it.\n",
    "  resolve          Show which standalone build would be used on this host.\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "kiche",
    author,
    version,
    disable_help_subcommand = true,
    before_help = KICHE_BEFORE_HELP,
    help_template = KICHE_HELP_TEMPLATE
)]
pub struct KicheCli {
    #[arg(
        short,
        long,
        help = "Only print warnings and errors",
        conflicts_with = "verbose",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        about = "Provision an isolated environment and run a command inside it",
        override_usage = "kiche run [OPTIONS] [-- <ARGS>...]",
        after_help = "Examples:\n  kiche run --python 3.10 -r click==7.1.2 -- -c \"import click\"\n  kiche run --config launcher.json -- --extra-flag\n\nThe process exits with the command's exit code."
    )]
    Run(RunArgs),
    #[command(about = "Print the standalone python build selected for this host")]
    Resolve(ResolveArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "JSON launcher config with requirements, python_version, command, environ, cwd"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long = "python",
        value_name = "VERSION",
        help = "Full or partial python version (default: newest)"
    )]
    pub python: Option<String>,
    #[arg(
        short = 'r',
        long = "requirement",
        value_name = "REQ",
        help = "Requirement to install (repeatable)"
    )]
    pub requirements: Vec<String>,
    #[arg(
        long,
        value_name = "FILE",
        help = "Read additional requirements, one per line"
    )]
    pub requirements_file: Option<PathBuf>,
    #[arg(
        long,
        value_name = "DIR",
        help = "Provision into DIR and keep it (default: a temporary directory)"
    )]
    pub workdir: Option<PathBuf>,
    #[arg(long, value_name = "DIR", help = "Directory the command runs in")]
    pub cwd: Option<PathBuf>,
    #[arg(
        last = true,
        value_name = "ARGS",
        help = "Arguments appended to the configured command"
    )]
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[arg(
        long = "python",
        value_name = "VERSION",
        help = "Full or partial python version (default: newest)"
    )]
    pub python: Option<String>,
    #[arg(long, help = "Print the release as JSON")]
    pub json: bool,
}
