use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::config::{self, SearchPaths, TEMPLATES_ENV, TemplateStore};
use crate::error::TdgError;
use crate::resolve::{self, Anchors};
use crate::writer::Writer;

/// Everything an invocation reads from its environment, gathered up front.
#[derive(Clone, Debug)]
pub struct InvocationContext {
    pub anchors: Anchors,
    pub search: SearchPaths,
    pub dry_run: bool,
}

impl InvocationContext {
    pub fn from_process(cli: &Cli) -> std::result::Result<Self, TdgError> {
        let cwd = current_working_dir()?;
        let explicit = cli
            .file
            .as_ref()
            .map(|file| utf8(file.clone()).map(|file| cwd.join(file)))
            .transpose()?;

        let search = SearchPaths {
            explicit,
            env_override: std::env::var(TEMPLATES_ENV).ok(),
            install_dir: install_dir(),
            user_config_dir: dirs::config_dir().and_then(lossless),
        };
        let anchors = Anchors::new(cwd).with_home(dirs::home_dir().and_then(lossless));

        Ok(Self {
            anchors,
            search,
            dry_run: cli.dry_run,
        })
    }

    fn load_store(&self) -> std::result::Result<TemplateStore, TdgError> {
        let location = config::locate(&self.search)?;
        debug!(config = %location.path, source = location.source.as_str(), "using template config");
        TemplateStore::load(&location.path)
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let ctx = InvocationContext::from_process(&cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.list {
        return list(&ctx, &mut out);
    }

    let (Some(template), Some(name)) = (cli.template.as_deref(), cli.name.as_deref()) else {
        bail!("both a template and a name are required");
    };
    generate(&ctx, template, name, &mut out)?;
    Ok(())
}

/// Validate, load, select, resolve, and write. Returns the entry count.
pub fn generate(
    ctx: &InvocationContext,
    template: &str,
    name: &str,
    out: &mut impl Write,
) -> std::result::Result<usize, TdgError> {
    resolve::validate_name(name)?;
    let store = ctx.load_store()?;
    let record = store.select(template).inspect_err(|_| {
        let available = store.names().collect::<Vec<_>>().join(", ");
        warn!(config = %store.path(), available = %available, "unknown template");
    })?;
    let resolved = resolve::resolve(record, name, &ctx.anchors);
    info!(template, name, config = %store.path(), base = %resolved.base_dir, "resolved template");
    Writer::new(ctx.dry_run).write(&resolved, out)
}

fn list(ctx: &InvocationContext, out: &mut impl Write) -> Result<()> {
    let store = ctx.load_store()?;
    write!(out, "{}", store.format_summary()).context("writing template list")
}

fn current_working_dir() -> std::result::Result<Utf8PathBuf, TdgError> {
    let cwd = std::env::current_dir().map_err(TdgError::CurrentDir)?;
    utf8(cwd)
}

fn install_dir() -> Option<Utf8PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let exe = fs::canonicalize(&exe).unwrap_or(exe);
    exe.parent().map(PathBuf::from).and_then(lossless)
}

fn utf8(path: PathBuf) -> std::result::Result<Utf8PathBuf, TdgError> {
    Utf8PathBuf::from_path_buf(path).map_err(TdgError::NonUtf8Path)
}

fn lossless(path: PathBuf) -> Option<Utf8PathBuf> {
    match Utf8PathBuf::from_path_buf(path) {
        Ok(path) => Some(path),
        Err(path) => {
            debug!(path = %path.display(), "ignoring non UTF-8 path");
            None
        }
    }
}
