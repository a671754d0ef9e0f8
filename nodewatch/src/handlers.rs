use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use nodewatch_client::{ApiClient, FieldValue, Node, NodeId};
use nodewatch_core::{
    AppState, ControllerError, RiskClass, RunController, RunState, Settings, SharedClass,
    expand_path, risk_class, shared_class,
};
use nodewatch_tui::{SystemClipboard, UiContext};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;

/// How long `check` waits for the service to confirm a Ctrl+C stop.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Settings resolved from the file plus command-line overrides.
#[derive(Debug, Clone)]
pub struct Session {
    pub settings: Settings,
    pub settings_path: PathBuf,
    pub server: Url,
    pub quiet: bool,
}

impl Session {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let raw_path = matches
            .get_one::<String>("config")
            .map(String::as_str)
            .unwrap_or(nodewatch_core::DEFAULT_SETTINGS_PATH);
        let settings_path = expand_path(raw_path);
        let settings = Settings::load(&settings_path)?;

        Self::resolve(
            settings,
            settings_path,
            matches.get_one::<Url>("server").cloned(),
            matches.get_flag("quiet"),
        )
    }

    /// `server` wins over the settings file.
    pub fn resolve(
        settings: Settings,
        settings_path: PathBuf,
        server: Option<Url>,
        quiet: bool,
    ) -> Result<Self> {
        let server = match server {
            Some(url) => url,
            None => settings.server_url()?,
        };
        Ok(Self {
            settings,
            settings_path,
            server,
            quiet,
        })
    }

    pub fn client(&self) -> Result<ApiClient> {
        Ok(ApiClient::new(self.server.clone())?)
    }

    pub fn controller(&self) -> Result<RunController<ApiClient>> {
        Ok(RunController::new(
            self.client()?,
            self.settings.check.clone(),
        ))
    }
}

/// Where log output goes.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Off,
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// default level.
pub fn init_tracing(verbose: bool, target: LogTarget) -> Result<()> {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let installed = match target {
        LogTarget::Stderr => builder.with_writer(io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = fs::File::create(&path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init()
        }
        LogTarget::Off => builder.with_writer(io::sink).try_init(),
    };
    installed.map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}

/// Read a node list; empty files are refused before they reach the service.
pub fn load_source(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read node list {}", path.display()))?;
    if content.trim().is_empty() {
        bail!("Node list {} is empty", path.display());
    }
    Ok(content)
}

/// Parse `1,2, 3` into ids, keeping the given order and dropping repeats.
pub fn parse_id_list(raw: &str) -> Result<Vec<NodeId>, String> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = part
            .parse::<u64>()
            .map(NodeId)
            .map_err(|_| format!("'{}' is not a node id", part))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    if ids.is_empty() {
        return Err("No node ids given".to_string());
    }
    Ok(ids)
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_header(session: &Session, title: &str) {
    if session.quiet {
        return;
    }
    print_divider();
    println!("{}", format!("  {}", title).bright_white().bold());
    print_divider();
    println!(
        "{} Server: {}",
        "→".blue(),
        session.server.as_str().bright_white()
    );
    println!();
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn confirm(msg: &str) -> bool {
    match print_prompt(&format!("{} [y/N]:", msg)) {
        Ok(response) => response == "y" || response == "yes",
        Err(e) => {
            debug!("Prompt failed: {}", e);
            false
        }
    }
}

fn risk_colored(value: &FieldValue) -> ColoredString {
    let text = value.as_str();
    match risk_class(text) {
        Some(RiskClass::White) => text.white(),
        Some(RiskClass::Green) => text.green(),
        Some(RiskClass::Yellow) => text.yellow(),
        Some(RiskClass::Orange) => text.bright_red(),
        Some(RiskClass::Red) => text.red().bold(),
        Some(RiskClass::Black) => text.magenta().bold(),
        None => text.dimmed(),
    }
}

fn shared_colored(value: &FieldValue) -> ColoredString {
    let text = value.as_str();
    match shared_class(text) {
        Some(SharedClass::Green) => text.green(),
        Some(SharedClass::Yellow) => text.yellow(),
        Some(SharedClass::Orange) => text.bright_red(),
        Some(SharedClass::Red) => text.red().bold(),
        Some(SharedClass::Black) => text.magenta().bold(),
        None => text.dimmed(),
    }
}

/// One table line for `node`.
pub fn format_node_row(node: &Node, selected: bool) -> String {
    let mark = if selected { "✓".green().bold() } else { " ".normal() };
    let status = match &node.error {
        Some(error) => format!("error: {}", error).red(),
        None => node.status.as_str().normal(),
    };

    format!(
        "{} {:>4}  {:<28} {:<16} {:>6}  {:>10}  {:<8} {:<6} {:<7} {}",
        mark,
        node.id.to_string().bright_black(),
        node.name,
        node.ip.as_str(),
        risk_colored(&node.risk),
        shared_colored(&node.shared),
        node.ip_type.as_str(),
        node.native.as_str(),
        node.source.as_str(),
        status
    )
}

/// The node list as printed by `check` and `nodes`.
pub fn format_node_table(state: &AppState) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        format!(
            "  {:>4}  {:<28} {:<16} {:>6}  {:>10}  {:<8} {:<6} {:<7} {}",
            "ID", "NAME", "IP", "RISK", "SHARED", "TYPE", "NATIVE", "SOURCE", "STATUS"
        )
        .bold()
    ));
    for node in state.nodes().iter() {
        out.push_str(&format_node_row(node, state.is_selected(node.id)));
        out.push('\n');
    }
    out.push_str(&format!(
        "\n{} {} nodes, {} selected\n",
        "ℹ".blue(),
        state.nodes().len(),
        state.selection().len()
    ));
    out
}

pub fn handle_init(session: &Session, args: &ArgMatches) -> Result<()> {
    print_header(session, "NODEWATCH INITIALIZATION");
    let force = args.get_flag("force");
    let path = &session.settings_path;

    if path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!(
            "Settings already exist at {}",
            path.display().to_string().bright_white()
        );
        if !confirm("Overwrite them with the defaults?") {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
    }

    Settings::default().save(path)?;
    println!(
        "{} Settings written to {}",
        "✓".green().bold(),
        path.display().to_string().bright_white()
    );
    Ok(())
}

pub async fn handle_ui(session: &Session, args: &ArgMatches) -> Result<()> {
    let file = args
        .get_one::<PathBuf>("file")
        .ok_or_else(|| anyhow!("--file is required"))?;
    let source = load_source(file)?;

    let mut controller = session.controller()?;
    if let Err(e) = controller.refresh_nodes().await {
        controller
            .state_mut()
            .notices
            .warn(format!("Could not load current nodes: {}", e));
    }

    let ctx = UiContext {
        source,
        source_label: file.display().to_string(),
        server: session.server.clone(),
        download_dir: std::env::current_dir()?,
    };
    nodewatch_tui::run(&mut controller, ctx).await
}

pub async fn handle_check(session: &Session, args: &ArgMatches) -> Result<()> {
    let file = args
        .get_one::<PathBuf>("file")
        .ok_or_else(|| anyhow!("--file is required"))?;
    let export_dir = args.get_one::<PathBuf>("export");
    let source = load_source(file)?;

    print_header(session, "NODEWATCH CHECK");
    let skip = session.settings.check.skip_keywords();
    if !session.quiet && !skip.is_empty() {
        println!("{} Skipping nodes named with: {}", "→".blue(), skip.join(", "));
    }

    let mut controller = session.controller()?;
    controller.start_check(&source).await?;

    let bar = ProgressBar::new(controller.state().progress.total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(100));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stopping = false;
    while controller.is_following() {
        if stopping {
            if tokio::time::timeout(STOP_GRACE, controller.pump()).await.is_err() {
                info!("No stop confirmation from the service, giving up on the feed");
                break;
            }
        } else {
            let mut interrupted = false;
            tokio::select! {
                _ = &mut ctrl_c => interrupted = true,
                _ = controller.pump() => {}
            }
            if interrupted {
                stopping = true;
                bar.set_message("stopping...");
                controller.stop_check().await;
            }
        }

        let progress = &controller.state().progress;
        bar.set_length(progress.total as u64);
        bar.set_position(progress.done as u64);
        bar.set_message(progress.current.clone());
    }
    bar.finish_and_clear();

    let state = controller.state();
    if !session.quiet {
        for notice in state.notices.iter() {
            println!("{} {}", "→".blue(), notice.message);
        }
        println!();
    }
    print!("{}", format_node_table(state));

    if stopping || state.run != RunState::Idle {
        println!("{} Run stopped before completion", "⚠".yellow().bold());
        return Ok(());
    }

    if let Some(dir) = export_dir {
        controller.select_all();
        controller.export().await?;
        let path = controller.download_export(dir)?;
        println!(
            "{} Exported to {}",
            "✓".green().bold(),
            path.display().to_string().bright_white()
        );
    }
    Ok(())
}

pub async fn handle_stop(session: &Session) -> Result<()> {
    session.client()?.stop().await?;
    println!("{} Stop requested", "✓".green().bold());
    Ok(())
}

pub async fn handle_nodes(session: &Session) -> Result<()> {
    let snapshot = session.client()?.nodes().await?;
    let running = snapshot.is_running;

    let mut state = AppState::new();
    state.reset_nodes(snapshot.nodes);

    print_header(session, "NODEWATCH NODES");
    print!("{}", format_node_table(&state));
    if running {
        println!("{} A check is running", "⠋".yellow());
    }
    Ok(())
}

pub async fn handle_recheck(session: &Session, args: &ArgMatches) -> Result<()> {
    let id = NodeId(*args.get_one::<u64>("id").ok_or_else(|| anyhow!("--id is required"))?);

    let mut controller = session.controller()?;
    controller.refresh_nodes().await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Rechecking node {}...", id));

    let result = controller.recheck_node(id).await;
    spinner.finish_and_clear();
    result?;

    if let Some(node) = controller.state().node(id) {
        println!("{}", format_node_row(node, false));
    }
    Ok(())
}

pub async fn handle_rename(session: &Session, args: &ArgMatches) -> Result<()> {
    let id = NodeId(*args.get_one::<u64>("id").ok_or_else(|| anyhow!("--id is required"))?);
    let name = args
        .get_one::<String>("name")
        .ok_or_else(|| anyhow!("--name is required"))?;

    let mut controller = session.controller()?;
    controller.refresh_nodes().await?;
    controller.start_edit(id)?;
    if let Some(draft) = controller.edit_draft_mut() {
        *draft = name.clone();
    }

    if controller.save_edit().await? {
        println!("{} Node {} renamed to {}", "✓".green().bold(), id, name.bright_white());
    } else {
        println!("{} Nothing to rename", "ℹ".blue());
    }
    Ok(())
}

pub async fn handle_delete(session: &Session, args: &ArgMatches) -> Result<()> {
    let id = NodeId(*args.get_one::<u64>("id").ok_or_else(|| anyhow!("--id is required"))?);
    let yes = args.get_flag("yes");

    let mut controller = session.controller()?;
    controller.refresh_nodes().await?;

    let mut ask = |prompt: &str| yes || confirm(prompt);
    match controller.delete_node(id, &mut ask).await {
        Ok(()) => {
            println!("{} Node {} deleted", "✓".green().bold(), id);
            Ok(())
        }
        Err(ControllerError::Cancelled) => {
            println!("{} Delete cancelled.", "✗".red().bold());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn handle_export(session: &Session, args: &ArgMatches) -> Result<()> {
    let raw_ids = args
        .get_one::<String>("ids")
        .ok_or_else(|| anyhow!("--ids is required"))?;
    let ids = parse_id_list(raw_ids).map_err(|e| anyhow!(e))?;
    let out = args.get_one::<PathBuf>("out");
    let copy = args.get_flag("copy");
    let link = args.get_flag("link");

    let mut controller = session.controller()?;
    controller.refresh_nodes().await?;
    controller.select_none();
    for id in &ids {
        if controller.toggle_selected(*id).is_none() {
            bail!("Node {} not found", id);
        }
    }

    controller.export().await?;

    if let Some(dir) = out {
        let path = controller.download_export(dir)?;
        println!(
            "{} Saved {}",
            "✓".green().bold(),
            path.display().to_string().bright_white()
        );
    }
    if copy {
        controller.copy_export(&mut SystemClipboard)?;
        println!("{} Copied to clipboard", "✓".green().bold());
    }
    if link {
        let uri = controller
            .import_link(&session.server)
            .ok_or_else(|| anyhow!("No import link available"))?;
        println!("{}", uri);
    }
    if out.is_none() && !copy && !link
        && let Some(export) = controller.export_session()
    {
        print!("{}", export.document);
    }
    Ok(())
}
