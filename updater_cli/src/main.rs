use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;

use updater_core::config::UpdateConfig;
use updater_core::downloader::http_transport::HttpTransport;
use updater_core::notification::LogNotifier;
use updater_core::service::UpdateService;
use updater_core::types::types::DownloadError;

mod adb_installer;
mod desktop_context;
mod terminal_callback;
use adb_installer::AdbInstaller;
use desktop_context::DesktopContext;
use terminal_callback::{Outcome, TerminalCallback};

#[derive(Parser)]
#[command(name = "updater", about = "Download and install an app update")]
struct Args {
    /// URL of the package to download
    #[arg(short, long)]
    url: Option<String>,

    /// JSON file with a full update config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Destination directory (defaults to the app data directory)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Destination filename (derived from the URL when omitted)
    #[arg(short, long)]
    filename: Option<String>,

    /// Expected MD5 or SHA-256 of the package
    #[arg(long)]
    checksum: Option<String>,

    /// Expected version code of the package
    #[arg(long)]
    version_code: Option<i64>,

    /// Extra request header, `Name: value`
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Install with adb after downloading
    #[arg(long)]
    install: bool,

    #[arg(long)]
    no_notification: bool,

    /// Re-download after a failure while retries remain
    #[arg(long)]
    retry_on_error: bool,

    #[arg(long, default_value = "AppUpdater")]
    app_name: String,

    #[arg(long, default_value = "com.example.app")]
    package: String,
}

/// Splits `Name: value` into a header pair.
fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got {:?}", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name missing in {:?}", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn build_config(args: &Args) -> Result<UpdateConfig, DownloadError> {
    let mut config = match &args.config {
        Some(path) => UpdateConfig::from_json_file(path)?,
        None => UpdateConfig::default(),
    };

    if let Some(url) = &args.url {
        config.url = url.clone();
    }
    if config.url.is_empty() {
        return Err(DownloadError::InvalidUrl("no URL given".to_string()));
    }
    if let Some(dir) = &args.dir {
        config = config.with_path(dir);
    }
    if let Some(filename) = &args.filename {
        config = config.with_filename(filename);
    }
    if let Some(checksum) = &args.checksum {
        config = config.with_checksum(checksum);
    }
    if let Some(version_code) = args.version_code {
        config = config.with_version_code(version_code);
    }
    for (name, value) in &args.headers {
        config = config.add_header(name.as_str(), value.as_str());
    }
    if args.config.is_none() || args.install {
        config = config.with_install_apk(args.install);
    }
    if args.no_notification {
        config = config.with_notification(false);
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    let transport = match HttpTransport::new() {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("Could not create HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let service = Arc::new(UpdateService::new(
        Arc::new(DesktopContext::new(args.app_name.clone(), args.package.clone())),
        Arc::new(LogNotifier),
        Arc::new(AdbInstaller),
        Arc::new(transport),
    ));

    let on_interrupt = Arc::clone(&service);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.stop();
        }
    });

    let callback = Arc::new(TerminalCallback::new());
    println!("Starting download: {}", config.url);
    let start = Instant::now();

    service.start(&config, None, Some(callback.clone())).await;
    loop {
        service.wait_idle().await;
        match callback.take_outcome() {
            Some(Outcome::Finished(file)) => {
                println!(
                    "Update ready at {} ({:.2}s)",
                    file.display(),
                    start.elapsed().as_secs_f64()
                );
                return;
            }
            Some(Outcome::Failed(error))
                if args.retry_on_error && service.snapshot().retry_offered =>
            {
                eprintln!("Download failed: {}; downloading again", error);
                service.redownload(&config, None, Some(callback.clone())).await;
            }
            Some(Outcome::Failed(error)) => {
                eprintln!("Download failed: {}", error);
                std::process::exit(1);
            }
            Some(Outcome::Cancelled) => {
                eprintln!("Download cancelled");
                std::process::exit(130);
            }
            Some(Outcome::Busy) | None => {
                eprintln!("Download did not complete");
                std::process::exit(1);
            }
        }
    }
}
