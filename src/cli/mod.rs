//! CLI argument parsing module
//!
//! This module handles command-line argument parsing and application entry point.

use crate::bulk::Confirmed;
use crate::config::Config;
use crate::cookie::{to_editable, EditableRecord, SameSite};
use crate::error::{CookieError, Result};
use crate::exit_code::exit_code_for_error;
use crate::gateway::CookieGateway;
use crate::host::memory::MemoryCookieHost;
use crate::host::CookieHost;
use crate::output::{format_cookie_list, Notice, OutputWriter};
use crate::session::CookieSession;
use crate::transfer::{export_file_name, StdioClipboard, Transfer, TransferTarget};
use crate::utils::{FileUtils, UrlUtils};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;

/// Main entry point for the CLI application
pub fn run() {
    let matches = create_app().get_matches();
    crate::logging::init(matches.get_flag("verbose"));

    if let Err(e) = run_with_args(&matches) {
        std::process::exit(exit_code_for_error(&e));
    }
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq)]
enum Action {
    List,
    Get { name: String },
    Set { record: EditableRecord },
    Update { old_name: String, record: EditableRecord },
    Delete { name: String },
    DeleteAll { confirmed: bool },
    Export,
    Import { file: Option<PathBuf> },
}

impl Action {
    fn label(&self) -> &'static str {
        match self {
            Action::List => "List cookies",
            Action::Get { .. } => "Get cookie",
            Action::Set { .. } => "Set cookie",
            Action::Update { .. } => "Update cookie",
            Action::Delete { .. } => "Delete cookie",
            Action::DeleteAll { .. } => "Delete all cookies",
            Action::Export => "Export cookies",
            Action::Import { .. } => "Import cookies",
        }
    }

    fn mutates(&self) -> bool {
        matches!(
            self,
            Action::Set { .. }
                | Action::Update { .. }
                | Action::Delete { .. }
                | Action::DeleteAll { .. }
                | Action::Import { .. }
        )
    }
}

/// Run with parsed command line arguments. Failures are reported as a notice
/// before being returned for the exit code.
fn run_with_args(matches: &ArgMatches) -> Result<()> {
    let config = build_config_from_args(matches)?;
    let action = parse_action(matches)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CookieError::Config(format!("Failed to create async runtime: {}", e)))?;

    rt.block_on(execute(config, action))
}

async fn execute(config: Config, action: Action) -> Result<()> {
    let writer = OutputWriter::new(config.output.clone());
    let outcome = perform(&config, &action, &writer).await;

    match &outcome {
        Ok(notice) => writer.notice(notice)?,
        Err(err) => writer.notice(&Notice::from_error(action.label(), err))?,
    }
    outcome.map(|_| ())
}

async fn perform(config: &Config, action: &Action, writer: &OutputWriter) -> Result<Notice> {
    let url = config.active_url()?;

    let host = match &config.store_path {
        Some(path) => Some(Arc::new(MemoryCookieHost::load(path).await?)),
        None => None,
    };
    let gateway = match &host {
        Some(host) => {
            let host: Arc<dyn CookieHost> = host.clone();
            CookieGateway::new(host)
        }
        None => CookieGateway::unavailable(),
    };

    let mut session = CookieSession::new(url, gateway);
    if let Some(document_cookie) = &config.document_cookie {
        session = session.with_fallback(document_cookie.clone());
    }

    let outcome = dispatch(&session, config, action, writer).await;

    // Saved even when the action failed part-way.
    if action.mutates() {
        if let (Some(host), Some(path)) = (&host, &config.store_path) {
            match host.save(path).await {
                Ok(()) => writer.write_verbose(&format!("Saved cookie store {:?}", path))?,
                Err(err) => {
                    log::error!("Failed to save cookie store {:?}: {}", path, err);
                    if outcome.is_ok() {
                        return Err(err);
                    }
                }
            }
        }
    }
    outcome
}

async fn dispatch(
    session: &CookieSession,
    config: &Config,
    action: &Action,
    writer: &OutputWriter,
) -> Result<Notice> {
    match action {
        Action::List => {
            let cookies = session.refresh().await?;
            writer.write(&format_cookie_list(&cookies))?;
            Ok(Notice::info(format!(
                "{} cookies for {}",
                cookies.len(),
                session.url()
            )))
        }
        Action::Get { name } => {
            session.refresh().await?;
            match session.get_cookie(name).await? {
                Some(cookie) => {
                    writer.write(&serde_json::to_string_pretty(&cookie)?)?;
                    Ok(Notice::success(format!("Found cookie '{}'", name)))
                }
                None => Ok(Notice::warning(format!("Cookie '{}' not found", name))),
            }
        }
        Action::Set { record } => {
            session.set_cookie(record).await?;
            Ok(Notice::success(format!("Cookie '{}' saved", record.name)))
        }
        Action::Update { old_name, record } => {
            session.refresh().await?;
            let record = carry_over(session, old_name, record);
            session.update_cookie(old_name, &record).await?;
            Ok(Notice::success(format!(
                "Cookie '{}' updated as '{}'",
                old_name, record.name
            )))
        }
        Action::Delete { name } => {
            session.refresh().await?;
            if session.delete_cookie(name).await? {
                Ok(Notice::success(format!("Cookie '{}' deleted", name)))
            } else {
                Ok(Notice::warning(format!("Cookie '{}' not found", name)))
            }
        }
        Action::DeleteAll { confirmed } => {
            if !confirmed {
                return Err(CookieError::Validation(
                    "Deleting all cookies cannot be undone; pass --yes to confirm".to_string(),
                ));
            }
            let result = session.delete_all(Confirmed::acknowledge()).await?;
            Ok(Notice::from_bulk(action.label(), &result))
        }
        Action::Export => {
            session.refresh().await?;
            let target = match &config.output.file {
                Some(path) => TransferTarget::File(path.clone()),
                None => TransferTarget::Clipboard,
            };
            if target == TransferTarget::Clipboard {
                if let Some(host) = UrlUtils::validate_url(session.url())
                    .ok()
                    .and_then(|url| UrlUtils::extract_host(&url))
                {
                    writer.write_verbose(&format!("Save as {}", export_file_name(&host)))?;
                }
            }
            let count = session.export(&stdio_transfer(), &target).await?;
            Ok(Notice::success(format!("Exported {} cookies", count)))
        }
        Action::Import { file } => {
            let source = match file {
                Some(path) => TransferTarget::File(path.clone()),
                None => TransferTarget::Clipboard,
            };
            let result = session.import(&stdio_transfer(), &source).await?;
            Ok(Notice::from_bulk(action.label(), &result))
        }
    }
}

/// Keep the partition and path of the cookie being replaced, and its domain unless
/// it was host-only. Explicit `--domain` and `--path` win.
fn carry_over(session: &CookieSession, old_name: &str, record: &EditableRecord) -> EditableRecord {
    let mut record = record.clone();
    let Some(existing) = session.cached(old_name) else {
        return record;
    };
    let current = to_editable(&existing);
    if record.domain.is_none() && !existing.host_only {
        record.domain = current.domain;
    }
    if record.path.is_none() {
        record.path = current.path;
    }
    record.read_only = current.read_only;
    record
}

fn stdio_transfer() -> Transfer {
    Transfer::new(Arc::new(StdioClipboard))
}

/// Create the CLI application structure
fn create_app() -> Command {
    Command::new("cookie-inspector")
        .version(crate::VERSION)
        .about("Inspect, edit, import and export the cookies of a page")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(Arg::new("url")
            .long("url")
            .value_name("URL")
            .env("COOKIE_INSPECTOR_URL")
            .help("URL of the active page")
            .global(true))
        .arg(Arg::new("store")
            .long("store")
            .value_name("FILE")
            .env("COOKIE_INSPECTOR_STORE")
            .help("JSON cookie store; without it the cookie API is unavailable")
            .global(true))
        .arg(Arg::new("document-cookie")
            .long("document-cookie")
            .value_name("COOKIES")
            .help("Cookie string listed when the cookie API is unavailable")
            .global(true))
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .value_name("FILE")
            .help("Write output to file")
            .global(true))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Verbose output")
            .action(ArgAction::SetTrue)
            .global(true))
        .arg(Arg::new("silent")
            .short('s')
            .long("silent")
            .help("Silent mode")
            .action(ArgAction::SetTrue)
            .global(true))
        .subcommand(Command::new("list").about("List cookies of the page"))
        .subcommand(Command::new("get")
            .about("Show one cookie")
            .arg(Arg::new("name").required(true).index(1)))
        .subcommand(cookie_args(Command::new("set")
            .about("Create or overwrite a cookie")
            .arg(Arg::new("name").required(true).index(1))
            .arg(Arg::new("value").required(true).index(2))))
        .subcommand(cookie_args(Command::new("update")
            .about("Replace a cookie (remove, then set)")
            .arg(Arg::new("old-name").required(true).index(1))
            .arg(Arg::new("name").required(true).index(2))
            .arg(Arg::new("value").required(true).index(3))))
        .subcommand(Command::new("delete")
            .about("Delete one cookie")
            .arg(Arg::new("name").required(true).index(1)))
        .subcommand(Command::new("delete-all")
            .about("Delete every cookie of the page")
            .arg(Arg::new("yes")
                .long("yes")
                .help("Confirm the irreversible deletion")
                .action(ArgAction::SetTrue)))
        .subcommand(Command::new("export")
            .about("Export cookies as JSON to stdout or to --output"))
        .subcommand(Command::new("import")
            .about("Import cookies from a JSON file or stdin")
            .arg(Arg::new("file").index(1).value_name("FILE")))
}

/// Attributes shared by `set` and `update`
fn cookie_args(command: Command) -> Command {
    command
        .arg(Arg::new("domain")
            .long("domain")
            .value_name("DOMAIN")
            .help("Cookie domain; a leading dot is accepted"))
        .arg(Arg::new("path")
            .long("path")
            .value_name("PATH")
            .help("Cookie path [default: / or, for update, the old cookie's path]"))
        .arg(Arg::new("expires")
            .long("expires")
            .value_name("EPOCH_SECONDS")
            .help("Expiration time; omit for a session cookie")
            .value_parser(clap::value_parser!(f64)))
        .arg(Arg::new("secure")
            .long("secure")
            .help("Only send over https")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("http-only")
            .long("http-only")
            .help("Hide from page scripts")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("same-site")
            .long("same-site")
            .value_name("no_restriction|lax|strict")
            .help("SameSite policy; unknown values mean no_restriction"))
}

/// Build configuration from command line arguments
fn build_config_from_args(matches: &ArgMatches) -> Result<Config> {
    let mut config = Config::default();

    if let Some(url) = matches.get_one::<String>("url") {
        config.url = url.clone();
    }

    if let Some(store) = matches.get_one::<String>("store") {
        config.store_path = Some(FileUtils::expand_path(store)?);
    }

    if let Some(document_cookie) = matches.get_one::<String>("document-cookie") {
        config.document_cookie = Some(document_cookie.clone());
    }

    config.output.verbose = matches.get_flag("verbose");
    config.output.silent = matches.get_flag("silent");

    if let Some(output_file) = matches.get_one::<String>("output") {
        config.output.file = Some(FileUtils::expand_path(output_file)?);
    }

    Ok(config)
}

fn parse_action(matches: &ArgMatches) -> Result<Action> {
    let action = match matches.subcommand() {
        Some(("list", _)) => Action::List,
        Some(("get", sub)) => Action::Get {
            name: required(sub, "name")?,
        },
        Some(("set", sub)) => Action::Set {
            record: record_from_args(sub)?,
        },
        Some(("update", sub)) => Action::Update {
            old_name: required(sub, "old-name")?,
            record: record_from_args(sub)?,
        },
        Some(("delete", sub)) => Action::Delete {
            name: required(sub, "name")?,
        },
        Some(("delete-all", sub)) => Action::DeleteAll {
            confirmed: sub.get_flag("yes"),
        },
        Some(("export", _)) => Action::Export,
        Some(("import", sub)) => Action::Import {
            file: sub
                .get_one::<String>("file")
                .map(|f| FileUtils::expand_path(f))
                .transpose()?,
        },
        Some((other, _)) => {
            return Err(CookieError::Config(format!("Unknown command: {}", other)))
        }
        None => return Err(CookieError::Config("No command given".to_string())),
    };
    Ok(action)
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .ok_or_else(|| CookieError::Config(format!("Missing argument: {}", id)))
}

fn record_from_args(matches: &ArgMatches) -> Result<EditableRecord> {
    Ok(EditableRecord {
        name: required(matches, "name")?,
        value: required(matches, "value")?,
        path: matches.get_one::<String>("path").cloned(),
        domain: matches.get_one::<String>("domain").cloned(),
        expiration_date: matches.get_one::<f64>("expires").copied(),
        same_site: matches
            .get_one::<String>("same-site")
            .map(|s| SameSite::normalize(s))
            .unwrap_or_default(),
        http_only: matches.get_flag("http-only"),
        secure: matches.get_flag("secure"),
        read_only: None,
    })
}
