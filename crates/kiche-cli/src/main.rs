use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use kiche_core::{
    build_http_client, detect_platform, release_catalog, resolve_release, Config, KicheLauncher,
    ProvisionIssue, Provisioner,
};
use serde_json::json;
use tempfile::TempDir;

mod cli;

use cli::{Command, KicheCli, ResolveArgs, RunArgs};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = KicheCli::parse();
    init_tracing(cli.trace, cli.verbose, cli.quiet);

    let config = Config::from_env();
    let outcome = match &cli.command {
        Command::Run(args) => run(&config, args),
        Command::Resolve(args) => resolve(&config, args, cli.quiet),
    };
    let code = outcome.map_err(into_report)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8, quiet: bool) {
    let level = if trace {
        "trace"
    } else if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("kiche_core={level},kiche_cli={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn into_report(err: anyhow::Error) -> color_eyre::Report {
    if let Some(issue) = err.downcast_ref::<ProvisionIssue>() {
        if let Some(hint) = issue.hint() {
            eprintln!("Hint: {hint}");
        }
        return eyre!("[{}] {err:?}", issue.code());
    }
    eyre!("{err:?}")
}

fn run(config: &Config, args: &RunArgs) -> anyhow::Result<i32> {
    let launcher = launcher_from_args(args)?;
    launcher.validate()?;
    let mut provisioner = Provisioner::from_config(config)?;

    // The temporary directory must outlive `execute`; it is removed on drop.
    let mut temp: Option<TempDir> = None;
    let work_dir = match &args.workdir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating work directory {}", dir.display()))?;
            dir.clone()
        }
        None => temp
            .insert(
                tempfile::Builder::new()
                    .prefix(&format!("{}-", KicheLauncher::NAME))
                    .tempdir()
                    .context("creating temporary work directory")?,
            )
            .path()
            .to_path_buf(),
    };
    tracing::debug!(work_dir = %work_dir.display(), "provisioning");

    launcher.execute(&mut provisioner, &work_dir, &args.args)
}

fn launcher_from_args(args: &RunArgs) -> anyhow::Result<KicheLauncher> {
    let mut launcher = match &args.config {
        Some(path) => read_launcher_config(path)?,
        None => KicheLauncher {
            requirements: Vec::new(),
            python_version: String::new(),
            command: Vec::new(),
            environ: BTreeMap::new(),
            cwd: None,
        },
    };
    if let Some(python) = &args.python {
        launcher.python_version.clone_from(python);
    }
    launcher.requirements.extend(args.requirements.iter().cloned());
    if let Some(file) = &args.requirements_file {
        launcher.requirements.extend(read_requirements_file(file)?);
    }

    let mut environ: BTreeMap<String, String> = env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect();
    environ.append(&mut launcher.environ);
    launcher.environ = environ;

    if let Some(cwd) = &args.cwd {
        launcher.cwd = Some(cwd.clone());
    }
    Ok(launcher)
}

fn read_launcher_config(path: &Path) -> anyhow::Result<KicheLauncher> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading launcher config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parsing launcher config {}", path.display()))
}

fn read_requirements_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading requirements file {}", path.display()))?;
    Ok(parse_requirements(&contents))
}

fn parse_requirements(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

fn resolve(config: &Config, args: &ResolveArgs, quiet: bool) -> anyhow::Result<i32> {
    let client = build_http_client(config.network())?;
    let catalog = release_catalog(config.catalog(), client);
    let platform = detect_platform();
    let version = args
        .python
        .as_deref()
        .map(str::trim)
        .filter(|version| !version.is_empty());
    let release = resolve_release(catalog.as_ref(), version, &platform)?;

    if args.json {
        let payload = json!({
            "name": release.basename(),
            "version": release.python_version(),
            "url": release.url(),
            "checksum_url": release.checksum_url(),
            "platform": platform.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if !quiet {
        println!("python {} for {platform}", release.python_version());
        println!("{}", release.url());
    }
    Ok(0)
}
