//! vswir CLI: browse VSWIR views, export results, run spectra extraction and
//! manage users.

mod table;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use vswir_client::admin::{CreateUser, ALL_GROUPS};
use vswir_client::auth::credentials_from_config;
use vswir_client::{submit_extraction, HttpClient, JobPoller, JobStatusSource, PagedFetcher, Pager};
use vswir_core::claims::IdTokenClaims;
use vswir_core::config::ClientConfig;
use vswir_core::filter::{parse_filters, FilterSet};
use vswir_core::geometry::FeatureCollection;
use vswir_core::id::JobId;
use vswir_core::job::{JobProgress, JobStatusReport};
use vswir_core::view::{ViewCatalog, ViewDescriptor, DEFAULT_VIEW};
use vswir_io::{CsvWriter, JsonlWriter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "vswir")]
#[command(about = "Client for the VSWIR plant-spectroscopy data API", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Settings that override the `VSWIR_*` environment.
#[derive(Args, Debug, Default, Clone)]
struct GlobalArgs {
    /// API base URL (overrides VSWIR_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer id_token (overrides VSWIR_ID_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// JSON token file holding `id_token` (overrides VSWIR_TOKEN_FILE)
    #[arg(long, global = true)]
    token_file: Option<String>,

    /// JSON view catalog (overrides VSWIR_VIEWS_FILE)
    #[arg(long, global = true)]
    views_file: Option<String>,

    /// Rows per page (overrides VSWIR_PAGE_SIZE)
    #[arg(long, global = true)]
    page_size: Option<u64>,

    /// Job polling delay in ms (overrides VSWIR_POLL_INTERVAL_MS)
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Request timeout in seconds (overrides VSWIR_REQUEST_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

/// View plus filter inputs shared by query, export and extract.
#[derive(Args, Debug, Clone)]
struct ViewArgs {
    /// View name
    #[arg(default_value = DEFAULT_VIEW)]
    view: String,

    /// Filter as FIELD=VALUE (repeatable); plot_name takes a comma-separated list
    #[arg(short, long = "filter", value_name = "FIELD=VALUE")]
    filters: Vec<String>,

    /// GeoJSON file restricting results to a region
    #[arg(long)]
    region: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the configured views and their filters
    Views,

    /// Fetch and print pages of a view
    Query {
        #[command(flatten)]
        target: ViewArgs,

        /// Row offset of the first page
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Rows per page (defaults to the configured page size)
        #[arg(long)]
        limit: Option<u64>,

        /// Number of consecutive pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: u32,

        /// Write the map overlay of the fetched rows as GeoJSON
        #[arg(long)]
        geojson_out: Option<PathBuf>,

        /// Array items kept from each end when printing cells
        #[arg(long, default_value_t = 3)]
        summarize: usize,
    },

    /// Fetch the full result set and write it as CSV or NDJSON
    Export {
        #[command(flatten)]
        target: ViewArgs,

        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Submit a spectra extraction job for the current filters
    Extract {
        #[command(flatten)]
        target: ViewArgs,

        /// Poll until the job completes
        #[arg(long)]
        wait: bool,
    },

    /// Inspect extraction jobs
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// User and group administration
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Show the identity carried by the configured token
    Whoami,
}

#[derive(Subcommand)]
enum JobCommands {
    /// Query a job's status once
    Status { job_id: String },
    /// Poll a job until it completes or polling fails
    Wait { job_id: String },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// List users with their groups
    Users,
    /// Create a user with a temporary password
    Create {
        username: String,
        email: String,
        #[arg(long)]
        temporary_password: String,
        /// Group to join (repeatable; defaults to "users")
        #[arg(long = "group")]
        groups: Vec<String>,
    },
    /// Delete a user
    Delete { username: String },
    /// Add a user to a group
    AddGroup { username: String, group: String },
    /// Remove a user from a group
    RemoveGroup { username: String, group: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Csv,
    Jsonl,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    apply_overrides(&mut config, &cli.global);

    if let Err(e) = run(cli.command, config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: ClientConfig) -> CliResult<()> {
    match command {
        Commands::Views => list_views(&load_catalog(&config)?),
        Commands::Query {
            target,
            offset,
            limit,
            pages,
            geojson_out,
            summarize,
        } => {
            let page_size = limit.unwrap_or(config.page_size);
            query(&config, &target, offset, page_size, pages, geojson_out, summarize).await
        }
        Commands::Export {
            target,
            format,
            output,
        } => export(&config, &target, format, output).await,
        Commands::Extract { target, wait } => extract(&config, &target, wait).await,
        Commands::Job { command } => match command {
            JobCommands::Status { job_id } => job_status(&config, JobId::new(job_id)).await,
            JobCommands::Wait { job_id } => {
                let client = Arc::new(connect(&config)?);
                let progress = wait_for_job(&config, client, JobId::new(job_id)).await;
                report_outcome(&progress)
            }
        },
        Commands::Admin { command } => admin(&config, command).await,
        Commands::Whoami => whoami(&config),
    }
}

fn apply_overrides(cfg: &mut ClientConfig, args: &GlobalArgs) {
    if let Some(url) = &args.api_url {
        cfg.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(token) = &args.token {
        cfg.id_token = Some(token.clone());
    }
    if let Some(path) = &args.token_file {
        cfg.token_file = Some(path.clone());
    }
    if let Some(path) = &args.views_file {
        cfg.views_file = Some(path.clone());
    }
    if let Some(n) = args.page_size {
        cfg.page_size = n;
    }
    if let Some(ms) = args.poll_interval_ms {
        cfg.poll_interval_ms = ms;
    }
    if let Some(secs) = args.timeout_secs {
        cfg.request_timeout_secs = secs;
    }
}

fn load_catalog(cfg: &ClientConfig) -> CliResult<ViewCatalog> {
    match &cfg.views_file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("cannot read view catalog {}: {}", path, e))?;
            Ok(ViewCatalog::from_json(&text)?)
        }
        None => Ok(ViewCatalog::builtin()),
    }
}

fn connect(cfg: &ClientConfig) -> CliResult<HttpClient> {
    Ok(HttpClient::new(cfg, credentials_from_config(cfg))?)
}

/// `FIELD=VALUE` pairs into the raw form map.
fn parse_filter_args(args: &[String]) -> CliResult<BTreeMap<String, String>> {
    let mut raw = BTreeMap::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| format!("filter '{}' is not FIELD=VALUE", arg))?;
        raw.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(raw)
}

/// Resolve the view and build its filters. Unknown filter fields are
/// rejected before anything is sent.
fn resolve_target(cfg: &ClientConfig, target: &ViewArgs) -> CliResult<(ViewDescriptor, FilterSet)> {
    let catalog = load_catalog(cfg)?;
    let view = catalog.get(&target.view)?.clone();
    let raw = parse_filter_args(&target.filters)?;
    view.check_filter_fields(raw.keys())?;
    let region = match &target.region {
        Some(path) => Some(
            fs::read_to_string(path)
                .map_err(|e| format!("cannot read region {}: {}", path.display(), e))?,
        ),
        None => None,
    };
    Ok((view, parse_filters(&raw, region.as_deref())))
}

fn list_views(catalog: &ViewCatalog) -> CliResult<()> {
    let mut out = io::stdout().lock();
    for view in catalog.iter() {
        let marker = if view.supports_extraction() {
            " [extractable]"
        } else {
            ""
        };
        writeln!(out, "{}{}", view.name, marker)?;
        writeln!(out, "  columns: {}", view.select_columns.join(", "))?;
        for f in &view.filters {
            writeln!(out, "  --filter {}=...  {} ({})", f.id, f.label, f.placeholder)?;
        }
    }
    Ok(())
}

async fn query(
    cfg: &ClientConfig,
    target: &ViewArgs,
    offset: u64,
    page_size: u64,
    pages: u32,
    geojson_out: Option<PathBuf>,
    summarize: usize,
) -> CliResult<()> {
    let (view, filters) = resolve_target(cfg, target)?;
    let fetcher = PagedFetcher::new(Arc::new(connect(cfg)?));
    let mut pager = Pager::new(page_size);
    let mut overlay = Vec::new();
    let mut out = io::stdout().lock();

    let mut req = pager.begin_at(offset);
    for _ in 0..pages.max(1) {
        let Some(page) = pager.run(&fetcher, req, &view, &filters).await? else {
            break;
        };
        writeln!(out, "# {} rows from offset {}", page.len(), page.offset)?;
        table::render(&mut out, &page.rows, summarize)?;
        if let Some(fc) = page.geojson {
            overlay.extend(fc.features);
        }
        if !pager.has_more() {
            break;
        }
        req = pager.begin_next();
    }

    if let Some(path) = geojson_out {
        if overlay.is_empty() {
            tracing::info!("no geometries in fetched rows; overlay not written");
        } else {
            let fc = FeatureCollection::new(overlay);
            fs::write(&path, serde_json::to_vec_pretty(&fc)?)?;
            eprintln!("✓ Wrote {} features to {}", fc.len(), path.display());
        }
    }
    Ok(())
}

async fn export(
    cfg: &ClientConfig,
    target: &ViewArgs,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> CliResult<()> {
    let (view, filters) = resolve_target(cfg, target)?;
    let fetcher = PagedFetcher::new(Arc::new(connect(cfg)?));
    let page = fetcher.fetch(&view, &filters, None, 0).await?;

    let sink: Box<dyn Write> = match &output {
        Some(path) => Box::new(io::BufWriter::new(fs::File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    match format {
        ExportFormat::Csv => {
            let mut w = CsvWriter::to_writer(sink);
            w.write_rows(&page.rows)?;
            w.finish()?.flush()?;
        }
        ExportFormat::Jsonl => {
            let mut w = JsonlWriter::to_writer(sink, true);
            w.write_rows(&page.rows)?;
            w.into_inner()?.flush()?;
        }
    }
    if let Some(path) = output {
        eprintln!("✓ Exported {} rows to {}", page.len(), path.display());
    }
    Ok(())
}

async fn extract(cfg: &ClientConfig, target: &ViewArgs, wait: bool) -> CliResult<()> {
    let (view, filters) = resolve_target(cfg, target)?;
    let client = Arc::new(connect(cfg)?);
    let fetcher = PagedFetcher::new(Arc::clone(&client));
    let job = submit_extraction(&fetcher, &view, &filters).await?;

    println!("job_id: {}", job.job_id);
    println!(
        "pixels: {} in {} ranges",
        job.pixel_count,
        job.ranges.len()
    );
    if !wait {
        return Ok(());
    }
    let progress = wait_for_job(cfg, client, job.job_id).await;
    report_outcome(&progress)
}

async fn job_status(cfg: &ClientConfig, job_id: JobId) -> CliResult<()> {
    let client = connect(cfg)?;
    let report = match client.job_status(&job_id).await {
        Ok(body) => JobStatusReport::from_body(body),
        Err(vswir_client::Error::NotFound(_)) => JobStatusReport::queued(),
        Err(e) => return Err(e.into()),
    };
    println!("status: {}", report.state);
    println!("rows_processed: {}", report.rows_processed);
    if let Some(url) = report.download_url {
        println!("download: {}", url);
    }
    Ok(())
}

async fn wait_for_job(cfg: &ClientConfig, client: Arc<HttpClient>, job_id: JobId) -> JobProgress {
    let mut poller = JobPoller::new(client, cfg.poll_interval());
    let mut rx = poller.subscribe();
    poller.activate(job_id);

    loop {
        let progress = rx.borrow_and_update().clone();
        if let Some(state) = progress.state {
            eprintln!("  {}: {} rows processed", state, progress.rows_processed);
        }
        if progress.is_terminal() || rx.changed().await.is_err() {
            return progress;
        }
    }
}

fn report_outcome(progress: &JobProgress) -> CliResult<()> {
    if let Some(err) = &progress.error {
        return Err(format!("job status polling failed: {}", err).into());
    }
    println!("✓ Extraction complete ({} rows)", progress.rows_processed);
    if let Some(url) = &progress.download_url {
        println!("download: {}", url);
    }
    Ok(())
}

async fn admin(cfg: &ClientConfig, command: AdminCommands) -> CliResult<()> {
    let client = connect(cfg)?;
    match command {
        AdminCommands::Users => {
            let users = client.list_users().await?;
            let mut out = io::stdout().lock();
            for u in users {
                writeln!(
                    out,
                    "{}  {}  {}  {}  [{}]",
                    u.username,
                    u.email,
                    u.status.as_deref().unwrap_or("-"),
                    if u.enabled.unwrap_or(false) { "enabled" } else { "disabled" },
                    u.groups.join(", ")
                )?;
            }
        }
        AdminCommands::Create {
            username,
            email,
            temporary_password,
            groups,
        } => {
            let mut req = CreateUser::new(username, email, temporary_password);
            if !groups.is_empty() {
                check_groups(&groups)?;
                req.groups = groups;
            }
            client.create_user(&req).await?;
            println!("✓ Created {}", req.username);
        }
        AdminCommands::Delete { username } => {
            client.delete_user(&username).await?;
            println!("✓ Deleted {}", username);
        }
        AdminCommands::AddGroup { username, group } => {
            check_groups(std::slice::from_ref(&group))?;
            client.add_to_group(&username, &group).await?;
            println!("✓ Added {} to {}", username, group);
        }
        AdminCommands::RemoveGroup { username, group } => {
            client.remove_from_group(&username, &group).await?;
            println!("✓ Removed {} from {}", username, group);
        }
    }
    Ok(())
}

fn check_groups(groups: &[String]) -> CliResult<()> {
    for g in groups {
        if !ALL_GROUPS.contains(&g.as_str()) {
            return Err(format!("unknown group '{}' (expected one of {})", g, ALL_GROUPS.join(", ")).into());
        }
    }
    Ok(())
}

fn whoami(cfg: &ClientConfig) -> CliResult<()> {
    let token = credentials_from_config(cfg)
        .bearer_token()
        .ok_or("no id_token configured (set VSWIR_ID_TOKEN or VSWIR_TOKEN_FILE)")?;
    let claims = IdTokenClaims::decode(&token)?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    println!("username: {}", claims.username.as_deref().unwrap_or("-"));
    println!("email: {}", claims.email.as_deref().unwrap_or("-"));
    println!("groups: {}", claims.groups().join(", "));
    println!(
        "role: {}",
        if claims.is_super_admin() {
            "superadmin"
        } else if claims.is_admin() {
            "admin"
        } else {
            "user"
        }
    );
    if claims.is_expired(now) {
        println!("token: expired");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_env_defaults() {
        let mut config = ClientConfig::default();
        let args = GlobalArgs {
            api_url: Some("https://api.example/".into()),
            page_size: Some(100),
            poll_interval_ms: Some(500),
            ..Default::default()
        };
        apply_overrides(&mut config, &args);
        assert_eq!(config.api_url, "https://api.example");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn filter_args_split_on_first_equals() {
        let raw = parse_filter_args(&["plot_name=a, b".into(), "expr=x=y".into()]).unwrap();
        assert_eq!(raw["plot_name"], "a, b");
        assert_eq!(raw["expr"], "x=y");
        assert!(parse_filter_args(&["oops".into()]).is_err());
    }

    #[test]
    fn unknown_filter_field_is_rejected() {
        let target = ViewArgs {
            view: DEFAULT_VIEW.into(),
            filters: vec!["nope=1".into()],
            region: None,
        };
        let err = resolve_target(&ClientConfig::default(), &target).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn plot_names_become_a_list() {
        let target = ViewArgs {
            view: DEFAULT_VIEW.into(),
            filters: vec!["plot_name=276-ER18, 001-ER18".into()],
            region: None,
        };
        let (view, filters) = resolve_target(&ClientConfig::default(), &target).unwrap();
        assert_eq!(view.name, DEFAULT_VIEW);
        assert_eq!(
            serde_json::to_value(&filters).unwrap()["plot_name"],
            serde_json::json!(["276-ER18", "001-ER18"])
        );
    }

    #[test]
    fn group_names_are_checked() {
        assert!(check_groups(&["admins".into()]).is_ok());
        assert!(check_groups(&["root".into()]).is_err());
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vswir",
            "query",
            "insitu_sample_trait_mv",
            "-f",
            "plot_name=a",
            "--api-url",
            "http://x",
            "--limit",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.global.api_url.as_deref(), Some("http://x"));
        match cli.command {
            Commands::Query { target, limit, .. } => {
                assert_eq!(target.view, "insitu_sample_trait_mv");
                assert_eq!(limit, Some(10));
            }
            _ => panic!("expected query"),
        }
    }
}
