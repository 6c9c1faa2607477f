//! Permission audit CLI
//!
//! Reports every site, subsite, list, and folder where one user holds
//! permissions, directly or through a group, as a comma-delimited report.
//!
//! ```text
//! permission-audit --config hr-site.yaml --user alice@contoso.com --output alice.csv
//! ```
//!
//! See [`config`] for how file, environment, and flag settings are layered.

mod config;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use permission_audit::{AuditService, AuditSummary, DelimitedReportWriter, SessionContext};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppConfig, CliOverrides, LogFormat, LoggingConfig, TOKEN_ENV};

/// Audit where a user holds permissions across a site tree.
#[derive(Parser, Debug)]
#[command(name = "permission-audit")]
#[command(version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root site URL (overrides `audit.site_url`)
    #[arg(long, value_name = "URL")]
    site: Option<String>,

    /// Login name or e-mail of the user to audit
    #[arg(short, long, value_name = "LOGIN")]
    user: Option<String>,

    /// Scan every list item, not only folders
    #[arg(long)]
    all_items: bool,

    /// Page size for collection requests
    #[arg(long)]
    batch_size: Option<u32>,

    /// Do not expand subsites deeper than this (root is 0)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Report file; written to stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Access token for the remote service
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            site_url: self.site.clone(),
            target_user: self.user.clone(),
            all_items: self.all_items,
            batch_size: self.batch_size,
            max_depth: self.max_depth,
            log_format: self.log_format,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = AppConfig::load(args.config.as_deref(), &args.overrides())?;

    init_tracing(&cfg.logging, args.verbose);

    let mut session = SessionContext::builder().site_url(&cfg.audit.site_url);
    if let Some(token) = args.token {
        session = session.bearer_token(token);
    }
    let ctx = session.build();

    let client = Arc::new(static_content_plugin::Service::from_config(&cfg.static_content));
    info!(backend = "static", root = %cfg.static_content.root.url, "content backend ready");

    let audit = AuditService::new(client, cfg.audit)?;
    let summary = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create report file {}", path.display()))?;
            write_report(&audit, &ctx, BufWriter::new(file)).await?
        }
        None => write_report(&audit, &ctx, io::stdout().lock()).await?,
    };

    info!(
        user = %summary.target.login_name,
        rows = summary.stats.rows_emitted,
        webs = summary.stats.webs_visited,
        lists = summary.stats.lists_scanned,
        "report written"
    );
    Ok(())
}

async fn write_report<W: Write>(
    audit: &AuditService,
    ctx: &SessionContext,
    out: W,
) -> Result<AuditSummary> {
    let mut writer = DelimitedReportWriter::new(out)?;
    let summary = audit.run(ctx, &mut writer).await?;
    writer.finish()?;
    Ok(summary)
}

/// Logs go to stderr so the report can be piped from stdout.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
    }
}
