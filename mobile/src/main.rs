use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inure_foss::{
    adb, android_packagemanager, db, db_foss, db_stack_trace, is_valid_package_id, log_capture, Config,
    CrashReport, FossParser, MetaData, MetaValue, PackageInfo, Settings, ToggleOutcome,
};

#[derive(Parser)]
#[command(name = "inure-foss", version, about = "Inspect and curate the FOSS status of Android packages")]
struct Cli {
    /// Log filter, overrides the saved setting (e.g. "debug", "inure_foss=trace")
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show FOSS status and license of a package
    Check {
        package: String,
        /// Treat the package as declaring `open_source` in its manifest
        #[arg(long)]
        open_source: bool,
        /// Treat the package as declaring this `open_source_license`
        #[arg(long)]
        license: Option<String>,
    },
    /// Mark a package as FOSS under a license
    Mark { package: String, license: String },
    /// Mark a package as not FOSS
    Unmark { package: String },
    /// Flip a package between FOSS and not FOSS
    Toggle {
        package: String,
        #[arg(long)]
        license: Option<String>,
    },
    /// Print every package currently considered FOSS
    List,
    /// List FOSS packages installed on a device
    Scan {
        #[arg(long)]
        device: Option<String>,
    },
    /// Show app-op states of a package on a device
    Appops {
        package: String,
        #[arg(long)]
        device: Option<String>,
    },
    /// Forget user markings so the bundled list applies again
    Reset {
        /// Package to reset; use --all for every package
        package: Option<String>,
        #[arg(long, conflicts_with = "package")]
        all: bool,
    },
    /// Print stored crash traces
    Crashes {
        /// Delete the trace with this id
        #[arg(long)]
        delete: Option<i32>,
        /// Delete every stored trace
        #[arg(long, conflicts_with = "delete")]
        clear: bool,
    },
    /// Save the default log level
    LogLevel { level: String },
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::reload;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    // Create a reloadable filter layer for dynamic log level changes
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let (filter, reload_handle) = reload::Layer::new(env_filter);

    // Store the reload handle for later use (type-erased via closure)
    log_capture::set_reload_fn(move |level: &str| {
        let new_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("error"));
        if let Err(e) = reload_handle.reload(new_filter) {
            eprintln!("Failed to reload log filter: {}", e);
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(log_capture::LogCaptureLayer)
        .init();
}

fn resolve_device(device: Option<String>, settings: &Settings) -> Result<String> {
    if let Some(device) = device {
        return Ok(device);
    }
    if !settings.device.is_empty() {
        return Ok(settings.device.clone());
    }
    adb::get_devices()
        .context("Failed to run adb")?
        .into_iter()
        .next()
        .context("No device attached")
}

/// Packages of the local package manager when running on a device, else of
/// the adb device. Only the local package manager exposes manifest meta-data.
fn installed_packages(device: Option<String>, settings: &Settings) -> Result<Vec<PackageInfo>> {
    if device.is_none() {
        match android_packagemanager::get_installed_packages() {
            Ok(names) => {
                return Ok(names
                    .iter()
                    .filter(|p| is_valid_package_id(p))
                    .map(|p| {
                        android_packagemanager::get_package_info(p).unwrap_or_else(|e| {
                            tracing::warn!("Failed to read meta-data of {}: {}", p, e);
                            PackageInfo::new(p)
                        })
                    })
                    .collect());
            }
            Err(e) => tracing::debug!("Falling back to adb: {}", e),
        }
    }

    let device = resolve_device(device, settings)?;
    Ok(adb::list_packages(&device)?
        .into_iter()
        .filter(|p| is_valid_package_id(p))
        .map(|p| PackageInfo::new(&p))
        .collect())
}

fn print_status(parser: &FossParser, info: &PackageInfo) {
    let license = parser
        .get_license(info)
        .unwrap_or_else(|| "unknown".to_string());
    println!("package:        {}", info.package_name);
    println!("foss:           {}", parser.is_foss(info));
    println!("self-declared:  {}", parser.is_embedded_foss(info));
    println!("user decides:   {}", parser.is_user_overridden(&info.package_name));
    println!("license:        {}", license);
}

fn run(command: Command, parser: &FossParser, config: &Config, settings: &Settings) -> Result<()> {
    match command {
        Command::Check {
            package,
            open_source,
            license,
        } => {
            let mut info = android_packagemanager::get_package_info(&package)?;
            if open_source || license.is_some() {
                let meta = info.meta_data.get_or_insert_with(MetaData::new);
                if open_source {
                    meta.insert(inure_foss::package_info::OPEN_SOURCE, MetaValue::Bool(true));
                }
                if let Some(license) = license {
                    meta.insert(
                        inure_foss::package_info::OPEN_SOURCE_LICENSE,
                        MetaValue::Str(license),
                    );
                }
            }
            print_status(parser, &info);
        }
        Command::Mark { package, license } => {
            parser.mark_foss(&package, &license)?.wait()?;
            println!("Marked {} as FOSS ({})", package, license);
        }
        Command::Unmark { package } => {
            parser.unmark_foss(&package)?.wait()?;
            println!("Marked {} as not FOSS", package);
        }
        Command::Toggle { package, license } => {
            let info = android_packagemanager::get_package_info(&package)?;
            match parser.toggle_foss(&info, license.as_deref())? {
                ToggleOutcome::SelfDeclared => {
                    println!("{} declares itself open source; nothing to change", package);
                }
                ToggleOutcome::Unmarked(write) => {
                    write.wait()?;
                    println!("Marked {} as not FOSS", package);
                }
                ToggleOutcome::Marked { license, write } => {
                    write.wait()?;
                    println!("Marked {} as FOSS ({})", package, license);
                }
                ToggleOutcome::LicenseRequired => {
                    anyhow::bail!("{} is not known to be FOSS; pass --license to mark it", package);
                }
            }
        }
        Command::List => {
            let snapshot = parser.snapshot();
            let mut packages: Vec<_> = snapshot.iter().collect();
            packages.sort();
            for (package, license) in packages {
                println!("{}\t{}", package, license);
            }
        }
        Command::Scan { device } => {
            let packages = installed_packages(device, settings)?;
            let foss = parser.filter_foss(&packages);
            for info in &foss {
                let license = parser
                    .get_license(info)
                    .unwrap_or_else(|| "unknown".to_string());
                println!("{}\t{}", info.package_name, license);
            }
            println!("{} of {} packages are FOSS", foss.len(), packages.len());
        }
        Command::Appops { package, device } => {
            let device = resolve_device(device, settings)?;
            for op in adb::get_app_ops(&device, &package)? {
                println!(
                    "{:<28} {:<8} time={} duration={} rejectTime={}",
                    op.permission(),
                    if op.is_enabled() { "allowed" } else { "denied" },
                    op.time(),
                    op.duration(),
                    op.reject_time()
                );
            }
        }
        Command::Reset { package, all } => {
            let conn = &mut db::establish_connection()?;
            match (package, all) {
                (Some(package), _) => {
                    let count = db_foss::delete_foss_marking(conn, &package)?;
                    println!("Reset {} ({} marking removed)", package, count);
                }
                (None, true) => {
                    let count = db::flush_foss(conn)?;
                    println!("Removed {} markings", count);
                }
                (None, false) => anyhow::bail!("Pass a package or --all"),
            }
            parser.initialize();
        }
        Command::Crashes { delete, clear } => {
            let conn = &mut db::establish_connection()?;
            if clear {
                println!("Removed {} traces", db::flush_stack_traces(conn)?);
                return Ok(());
            }
            if let Some(trace_id) = delete {
                println!("Removed {} traces", db_stack_trace::delete_trace(conn, trace_id)?);
                return Ok(());
            }
            for trace in db_stack_trace::get_all_traces(conn)? {
                println!("#{} at {}: {}", trace.id, trace.timestamp, trace.message.unwrap_or_default());
            }
        }
        Command::LogLevel { level } => {
            log_capture::update_tracing_level(&level.to_lowercase());
            let settings = Settings {
                log_level: level,
                ..settings.clone()
            };
            config.save_settings(&settings)?;
            tracing::info!("Log level set to {}", settings.log_level);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::new()?;
    let settings = config.load_settings().unwrap_or_default();

    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| settings.log_level.to_lowercase());
    init_tracing(&log_level);

    if settings.crash_reporting {
        let crash_report = CrashReport::new(&config);
        if let Some(pending) = crash_report.initialize() {
            eprintln!(
                "The previous run crashed ({}):\n{}",
                pending.message.as_deref().unwrap_or("unknown"),
                pending.stack
            );
            crash_report.acknowledge()?;
        }
    }

    let parser = inure_foss::init_common(&config);

    run(cli.command, &parser, &config, &settings)
}
