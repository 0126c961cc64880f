mod config;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use config::Config;
use dataplex_dcl::dataplex::{Asset, Client, DataplexResource, Lake, ResourceList, Zone};
use dataplex_dcl::dcl::{ApplyOption, LifecycleParam};
use dataplex_dcl::gcp::auth::{validate_project_id, GcpCredentials};
use dataplex_dcl::gcp::http::format_error;
use dataplex_dcl::sdsaas::{self, HostPatch, SdsaasV1, SdsaasV1Options, VolumeMappingIdentity, VolumePatch};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Declarative client for Dataplex lakes, zones and assets, and the IBM
/// storage-as-a-service API
#[derive(Parser, Debug)]
#[command(name = "dplx", version, about, long_about = None)]
struct Args {
    /// GCP project to use
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Dataplex location (region) to use
    #[arg(short, long, global = true)]
    location: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Override the Dataplex endpoint
    #[arg(long, global = true)]
    base_path: Option<String>,

    /// Bearer token to use instead of Application Default Credentials
    #[arg(long, env = "DPLX_ACCESS_TOKEN", hide_env_values = true, global = true)]
    access_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one resource
    Get(ResourceArgs),
    /// List resources under a parent
    List(ListArgs),
    /// Reconcile a resource with a desired-state file
    Apply(ApplyArgs),
    /// Delete one resource
    Delete(ResourceArgs),
    /// Storage-as-a-service operations
    Sds {
        #[command(subcommand)]
        command: SdsCommand,
    },
    /// Show or change the saved configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Lake,
    Zone,
    Asset,
}

#[derive(ClapArgs, Debug)]
struct ResourceArgs {
    kind: Kind,
    name: String,
    /// Parent lake (zones and assets)
    #[arg(long)]
    lake: Option<String>,
    /// Parent zone (assets)
    #[arg(long)]
    zone: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    kind: Kind,
    #[arg(long)]
    lake: Option<String>,
    #[arg(long)]
    zone: Option<String>,
    /// Results per request; all pages are still fetched
    #[arg(long)]
    page_size: Option<i32>,
}

#[derive(ClapArgs, Debug)]
struct ApplyArgs {
    /// YAML or JSON document with a `kind` of Lake, Zone or Asset
    #[arg(short, long)]
    file: PathBuf,
    #[arg(long)]
    block_creation: bool,
    #[arg(long)]
    block_acquire: bool,
    #[arg(long)]
    block_modification: bool,
    #[arg(long)]
    block_destruction: bool,
}

#[derive(Subcommand, Debug)]
enum SdsCommand {
    Volumes {
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        name: Option<String>,
    },
    Volume {
        volume_id: String,
    },
    VolumeCreate {
        /// Capacity in GB
        #[arg(long)]
        capacity: i64,
        #[arg(long)]
        name: Option<String>,
        /// Map the new volume to the host with this NQN
        #[arg(long)]
        host_nqn: Option<String>,
    },
    VolumeUpdate {
        volume_id: String,
        #[arg(long)]
        capacity: Option<i64>,
        #[arg(long)]
        name: Option<String>,
    },
    VolumeDelete {
        volume_id: String,
    },
    Hosts {
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        name: Option<String>,
    },
    Host {
        host_id: String,
    },
    HostCreate {
        #[arg(long)]
        nqn: String,
        #[arg(long)]
        name: Option<String>,
        /// Volume to map; repeatable
        #[arg(long = "volume")]
        volumes: Vec<String>,
    },
    HostUpdate {
        host_id: String,
        #[arg(long)]
        name: Option<String>,
    },
    HostDelete {
        host_id: String,
    },
    HostVolUpdate {
        host_id: String,
        volume_id: String,
    },
    HostVolDelete {
        host_id: String,
        volume_id: String,
    },
    HostVolDeleteall {
        host_id: String,
    },
    Creds,
    CredCreate {
        access_key: String,
    },
    CredDelete {
        access_key: String,
    },
    Cert,
    CertUpload {
        /// PEM file with the certificate and key
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    /// Keys: project, location, base_path, sdsaas_url, timeout_secs, max_attempts
    Set { key: String, value: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("dplx started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("dplx").join("dplx.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".dplx").join("dplx.log");
    }
    PathBuf::from("dplx.log")
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        tracing::error!("{:#}", err);
        eprintln!("Error: {}", format_error(&err));
        drop(log_guard);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load();
    match &args.command {
        Command::Config { command } => run_config(&mut config, command),
        Command::Sds { command } => run_sds(&config, command).await,
        Command::Get(r) => {
            let scope = Scope::resolve(&args, &config)?;
            let client = dataplex_client(&args, &config).await?;
            match r.kind {
                Kind::Lake => print_json(&client.get_lake(&scope.lake(&r.name)).await?),
                Kind::Zone => print_json(&client.get_zone(&scope.zone(r.lake.as_deref(), &r.name)?).await?),
                Kind::Asset => print_json(
                    &client
                        .get_asset(&scope.asset(r.lake.as_deref(), r.zone.as_deref(), &r.name)?)
                        .await?,
                ),
            }
        }
        Command::List(l) => {
            let scope = Scope::resolve(&args, &config)?;
            let client = dataplex_client(&args, &config).await?;
            let (p, loc) = (scope.project.as_str(), scope.location.as_str());
            match (l.kind, l.page_size) {
                (Kind::Lake, None) => print_json(&client.list_lake(p, loc).await?),
                (Kind::Lake, Some(n)) => {
                    let page = client.list_lake_page(p, loc, Some(n)).await?;
                    print_json(&all_pages(&client, page).await?)
                }
                (Kind::Zone, size) => {
                    let lake = required(l.lake.as_deref(), "--lake")?;
                    match size {
                        None => print_json(&client.list_zone(p, loc, lake).await?),
                        Some(n) => {
                            let page = client.list_zone_page(p, loc, lake, Some(n)).await?;
                            print_json(&all_pages(&client, page).await?)
                        }
                    }
                }
                (Kind::Asset, size) => {
                    let lake = required(l.lake.as_deref(), "--lake")?;
                    let zone = required(l.zone.as_deref(), "--zone")?;
                    match size {
                        None => print_json(&client.list_asset(p, loc, lake, zone).await?),
                        Some(n) => {
                            let page = client.list_asset_page(p, loc, lake, zone, Some(n)).await?;
                            print_json(&all_pages(&client, page).await?)
                        }
                    }
                }
            }
        }
        Command::Apply(a) => {
            let scope = Scope::resolve(&args, &config)?;
            let client = dataplex_client(&args, &config).await?;
            let mut doc = load_document(&a.file)?;
            let kind = take_kind(&mut doc)?;
            scope.fill_identity(&mut doc);
            match kind {
                Kind::Lake => {
                    let desired = Lake::from_document(&doc);
                    print_json(&client.apply_lake(&desired, &lifecycle::<Lake>(a)).await?)
                }
                Kind::Zone => {
                    let desired = Zone::from_document(&doc);
                    print_json(&client.apply_zone(&desired, &lifecycle::<Zone>(a)).await?)
                }
                Kind::Asset => {
                    let desired = Asset::from_document(&doc);
                    print_json(&client.apply_asset(&desired, &lifecycle::<Asset>(a)).await?)
                }
            }
        }
        Command::Delete(r) => {
            let scope = Scope::resolve(&args, &config)?;
            let client = dataplex_client(&args, &config).await?;
            match r.kind {
                Kind::Lake => client.delete_lake(&scope.lake(&r.name)).await?,
                Kind::Zone => client.delete_zone(&scope.zone(r.lake.as_deref(), &r.name)?).await?,
                Kind::Asset => {
                    client
                        .delete_asset(&scope.asset(r.lake.as_deref(), r.zone.as_deref(), &r.name)?)
                        .await?
                }
            }
            println!("Deleted {:?} {}", r.kind, r.name);
            Ok(())
        }
    }
}

/// Project and location every Dataplex command runs in.
struct Scope {
    project: String,
    location: String,
}

impl Scope {
    fn resolve(args: &Args, config: &Config) -> Result<Self> {
        let project = config
            .effective_project(args.project.as_deref())
            .context("No GCP project configured. Set GOOGLE_CLOUD_PROJECT or use --project flag")?;
        if !validate_project_id(&project) {
            tracing::warn!("Project ID {} does not look like a GCP project ID", project);
        }
        let location = config
            .effective_location(args.location.as_deref())
            .context("No Dataplex location configured. Set DATAPLEX_LOCATION or use --location flag")?;
        tracing::info!("Using project: {}, location: {}", project, location);
        Ok(Self { project, location })
    }

    fn lake(&self, name: &str) -> Lake {
        Lake::new(&self.project, &self.location, name)
    }

    fn zone(&self, lake: Option<&str>, name: &str) -> Result<Zone> {
        let lake = required(lake, "--lake")?;
        Ok(Zone::new(&self.project, &self.location, lake, name))
    }

    fn asset(&self, lake: Option<&str>, zone: Option<&str>, name: &str) -> Result<Asset> {
        let lake = required(lake, "--lake")?;
        let zone = required(zone, "--zone")?;
        Ok(Asset::new(&self.project, &self.location, lake, zone, name))
    }

    /// Documents may omit project and location.
    fn fill_identity(&self, doc: &mut Map<String, Value>) {
        doc.entry("project")
            .or_insert_with(|| Value::String(self.project.clone()));
        doc.entry("location")
            .or_insert_with(|| Value::String(self.location.clone()));
    }
}

fn required<'a>(value: Option<&'a str>, flag: &str) -> Result<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .with_context(|| format!("{flag} is required for this resource"))
}

async fn dataplex_client(args: &Args, config: &Config) -> Result<Client> {
    let client_config = config.to_client_config(args.base_path.as_deref());
    let client = match args.access_token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => Client::with_credentials(GcpCredentials::from_static_token(token), client_config)?,
        None => Client::new(client_config)
            .await
            .context("Failed to load Application Default Credentials")?,
    };
    Ok(client)
}

async fn all_pages<R: DataplexResource>(client: &Client, mut page: ResourceList<R>) -> Result<Vec<R>> {
    let mut items = std::mem::take(&mut page.items);
    while page.has_next() {
        page.next(client).await?;
        items.append(&mut page.items);
    }
    Ok(items)
}

fn load_document(path: &Path) -> Result<Map<String, Value>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let value: Value = if is_json {
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
    } else {
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
    };
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("{} must hold an object, found {}", path.display(), other),
    }
}

fn take_kind(doc: &mut Map<String, Value>) -> Result<Kind> {
    let kind = doc
        .remove("kind")
        .and_then(|k| k.as_str().map(str::to_string))
        .context("document has no `kind` (Lake, Zone or Asset)")?;
    Kind::from_str(&kind, true).map_err(|e| anyhow::anyhow!("unknown kind {kind}: {e}"))
}

fn lifecycle<R>(a: &ApplyArgs) -> Vec<ApplyOption<R>> {
    [
        (a.block_creation, LifecycleParam::BlockCreation),
        (a.block_acquire, LifecycleParam::BlockAcquire),
        (a.block_modification, LifecycleParam::BlockModification),
        (a.block_destruction, LifecycleParam::BlockDestruction),
    ]
    .into_iter()
    .filter(|(set, _)| *set)
    .map(|(_, p)| ApplyOption::Lifecycle(p))
    .collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_config(config: &mut Config, command: &ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => print_json(&*config),
        ConfigCommand::Set { key, value } => {
            config.set(key, value)?;
            print_json(&*config)
        }
    }
}

fn sds_client(config: &Config) -> Result<SdsaasV1> {
    // SDSAAS_URL wins over the saved URL.
    let url = match std::env::var("SDSAAS_URL") {
        Ok(v) if !v.is_empty() => None,
        _ => config.sdsaas_url.clone(),
    };
    let mut client = SdsaasV1::from_external_config(SdsaasV1Options {
        url,
        ..Default::default()
    })
    .context("Failed to configure the sdsaas client")?;
    if client.service_url().is_empty() {
        bail!("No sdsaas URL configured. Set SDSAAS_URL or run `dplx config set sdsaas_url <url>`");
    }
    client.enable_retries(config.max_attempts.map_or(0, |n| n.saturating_sub(1)), Duration::ZERO);
    Ok(client)
}

/// Prints the typed result, or the status line for bodiless replies.
fn print_sds<T: Serialize>(result: Option<T>, response: &sdsaas::DetailedResponse) -> Result<()> {
    match result {
        Some(value) => print_json(&value),
        None => print_status(response),
    }
}

fn print_status(response: &sdsaas::DetailedResponse) -> Result<()> {
    println!("HTTP {}", response.status_code);
    Ok(())
}

async fn run_sds(config: &Config, command: &SdsCommand) -> Result<()> {
    let sds = sds_client(config)?;
    match command {
        SdsCommand::Volumes { limit, name } => {
            let opts = sdsaas::VolumesOptions {
                limit: *limit,
                name: name.clone(),
                ..Default::default()
            };
            let (r, resp) = sds.volumes(&opts).await?;
            print_sds(r, &resp)
        }
        SdsCommand::Volume { volume_id } => {
            let (r, resp) = sds.volume(&sdsaas::VolumeOptions::new(volume_id)).await?;
            print_sds(r, &resp)
        }
        SdsCommand::VolumeCreate {
            capacity,
            name,
            host_nqn,
        } => {
            let opts = sdsaas::VolumeCreateOptions {
                name: name.clone(),
                hostnqnstring: host_nqn.clone(),
                ..sdsaas::VolumeCreateOptions::new(*capacity)
            };
            let (r, resp) = sds.volume_create(&opts).await?;
            print_sds(r, &resp)
        }
        SdsCommand::VolumeUpdate {
            volume_id,
            capacity,
            name,
        } => {
            let patch = VolumePatch {
                capacity: *capacity,
                name: name.clone(),
            };
            let opts = sdsaas::VolumeUpdateOptions {
                volume_id: volume_id.clone(),
                volume_patch: patch.as_patch()?,
                ..Default::default()
            };
            let (r, resp) = sds.volume_update(&opts).await?;
            print_sds(r, &resp)
        }
        SdsCommand::VolumeDelete { volume_id } => {
            print_status(&sds.volume_delete(&sdsaas::VolumeDeleteOptions::new(volume_id)).await?)
        }
        SdsCommand::Hosts { limit, name } => {
            let opts = sdsaas::HostsOptions {
                limit: *limit,
                name: name.clone(),
                ..Default::default()
            };
            let (r, resp) = sds.hosts(&opts).await?;
            print_sds(r, &resp)
        }
        SdsCommand::Host { host_id } => {
            let (r, resp) = sds.host(&sdsaas::HostOptions::new(host_id)).await?;
            print_sds(r, &resp)
        }
        SdsCommand::HostCreate { nqn, name, volumes } => {
            let opts = sdsaas::HostCreateOptions {
                name: name.clone(),
                volumes: volumes.iter().map(VolumeMappingIdentity::new).collect(),
                ..sdsaas::HostCreateOptions::new(nqn)
            };
            let (r, resp) = sds.host_create(&opts).await?;
            print_sds(r, &resp)
        }
        SdsCommand::HostUpdate { host_id, name } => {
            let opts = sdsaas::HostUpdateOptions {
                host_id: host_id.clone(),
                host_patch: HostPatch { name: name.clone() }.as_patch()?,
                ..Default::default()
            };
            let (r, resp) = sds.host_update(&opts).await?;
            print_sds(r, &resp)
        }
        SdsCommand::HostDelete { host_id } => {
            print_status(&sds.host_delete(&sdsaas::HostDeleteOptions::new(host_id)).await?)
        }
        SdsCommand::HostVolUpdate { host_id, volume_id } => {
            let (r, resp) = sds
                .host_vol_update(&sdsaas::HostVolUpdateOptions::new(host_id, volume_id))
                .await?;
            print_sds(r, &resp)
        }
        SdsCommand::HostVolDelete { host_id, volume_id } => print_status(
            &sds.host_vol_delete(&sdsaas::HostVolDeleteOptions::new(host_id, volume_id))
                .await?,
        ),
        SdsCommand::HostVolDeleteall { host_id } => print_status(
            &sds.host_vol_deleteall(&sdsaas::HostVolDeleteallOptions::new(host_id))
                .await?,
        ),
        SdsCommand::Creds => {
            let (r, resp) = sds.creds(&sdsaas::CredsOptions::default()).await?;
            print_sds(r, &resp)
        }
        SdsCommand::CredCreate { access_key } => {
            let (r, resp) = sds.cred_create(&sdsaas::CredCreateOptions::new(access_key)).await?;
            print_sds(r, &resp)
        }
        SdsCommand::CredDelete { access_key } => {
            print_status(&sds.cred_delete(&sdsaas::CredDeleteOptions::new(access_key)).await?)
        }
        SdsCommand::Cert => {
            let (r, resp) = sds.cert(&sdsaas::CertOptions::default()).await?;
            print_sds(r, &resp)
        }
        SdsCommand::CertUpload { file } => {
            let body = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
            let opts = sdsaas::CertUploadOptions {
                body,
                ..Default::default()
            };
            let (r, resp) = sds.cert_upload(&opts).await?;
            print_sds(r, &resp)
        }
    }
}
