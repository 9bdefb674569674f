use anyhow::Result;
use clickable_urls::{
    ClickableUrls, DocumentId, DocumentSource, HostBindings, SettingsFile, SettingsSource,
    SystemBrowser, UrlCommand, UrlSettings,
};
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;
use std::{env, process};
use urlview::TerminalHost;

const USAGE: &str = "\
Usage:
  urlview scan <file>               List and underline the URLs in a file
  urlview open <file> <line>:<col>  Open the URL at a position
  urlview open-all <file>           Open every URL in a file
  urlview init-settings             Write the default settings file";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger with debug fallback for development
    let mut logger = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(LevelFilter::Info);
        logger.filter_module("urlview", LevelFilter::Debug);
        logger.filter_module("clickable_urls", LevelFilter::Debug);
    }
    logger.init();

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(err) = run(&args).await {
        eprintln!("エラー: {:#}", err);
        log::error!("urlview failed: {}", err);
        process::exit(1);
    }
    Ok(())
}

async fn run(args: &[String]) -> Result<()> {
    let settings = Arc::new(SettingsFile::from_default_location()?);

    match args.first().map(String::as_str) {
        Some("scan") => {
            let file = file_arg(args)?;
            scan(settings, file).await
        }
        Some("open") => {
            let file = file_arg(args)?;
            let position = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing position\n\n{}", USAGE))?;
            open_at(settings, file, position).await
        }
        Some("open-all") => {
            let file = file_arg(args)?;
            open_all(settings, file).await
        }
        Some("init-settings") => {
            let defaults = settings.load().await.unwrap_or_else(|_| UrlSettings::default());
            settings.save(&defaults).await?;
            println!("Settings written to {}", settings.path().display());
            Ok(())
        }
        Some("-h") | Some("--help") | None => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => Err(anyhow::anyhow!("Unknown command: {}\n\n{}", other, USAGE)),
    }
}

fn file_arg(args: &[String]) -> Result<PathBuf> {
    args.get(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("Missing file argument\n\n{}", USAGE))
}

/// Opens the file as a document. With `fire_load` the plugin sees the
/// load event, as it would in an editor.
async fn load(
    settings: Arc<SettingsFile>,
    file: PathBuf,
    fire_load: bool,
) -> Result<(Arc<TerminalHost>, ClickableUrls, DocumentId)> {
    let host = Arc::new(TerminalHost::new());
    let bindings = HostBindings::from_host(host.clone(), Arc::new(SystemBrowser));
    let plugin = ClickableUrls::new(bindings, settings);

    let doc = host.open_path(&file).await?;
    if fire_load {
        plugin.on_load(doc).await;
    }
    log::debug!("Loaded {} as document {}", file.display(), doc);
    Ok((host, plugin, doc))
}

async fn scan(settings: Arc<SettingsFile>, file: PathBuf) -> Result<()> {
    // find_urls scans on its own
    let (host, plugin, doc) = load(settings, file, false).await?;

    if let Some(status) = plugin.run_command(doc, UrlCommand::FindUrls).await? {
        println!("{}", status);
    }

    if let Some(urls) = plugin.registry().urls(doc).await {
        for url in &urls {
            let (line, column) = host
                .with_buffer(doc, |buf| buf.offset_to_position(url.start))
                .unwrap_or((0, 0));
            let text = host.substr(doc, url.range()).unwrap_or_default();
            println!("{}:{}\t{}\t{}", line + 1, column + 1, text, url.scope);
        }
    }

    if !host.marker_ranges(doc).is_empty() {
        if let Some(rendered) = host.render(doc) {
            println!();
            print!("{}", rendered);
        }
    }
    Ok(())
}

async fn open_at(settings: Arc<SettingsFile>, file: PathBuf, position: &str) -> Result<()> {
    let (host, plugin, doc) = load(settings, file, true).await?;

    let offset = host
        .with_buffer(doc, |buf| buf.parse_position(position))
        .flatten()
        .ok_or_else(|| anyhow::anyhow!("Invalid position: {}", position))?;
    host.with_buffer_mut(doc, |buf| buf.set_cursor(offset));

    match plugin.run_command(doc, UrlCommand::OpenUrlUnderCursor).await? {
        Some(status) => println!("{}", status),
        None => println!("No URL at {}", position),
    }
    report_opened_files(&host);
    Ok(())
}

async fn open_all(settings: Arc<SettingsFile>, file: PathBuf) -> Result<()> {
    let (host, plugin, doc) = load(settings, file, true).await?;

    match plugin.run_command(doc, UrlCommand::OpenAllUrls).await? {
        Some(status) => println!("{}", status),
        None => println!("No URLs to open"),
    }
    report_opened_files(&host);
    for error in host.errors() {
        eprintln!("{}", error);
    }
    Ok(())
}

fn report_opened_files(host: &TerminalHost) {
    for path in host.opened_files() {
        println!("Opened file: {}", path.display());
    }
}
