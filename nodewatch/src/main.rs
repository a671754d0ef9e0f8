use colored::Colorize;
use commands::command_argument_builder;
use nodewatch::handlers::{self, LogTarget, Session};
use std::path::PathBuf;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let verbose = chosen_command.get_flag("verbose");

    // The UI owns the terminal, so its logs go to a file or nowhere.
    let log_target = match chosen_command.subcommand() {
        Some(("ui", sub)) => match sub.get_one::<PathBuf>("log-file") {
            Some(path) => LogTarget::File(path.clone()),
            None => LogTarget::Off,
        },
        _ => LogTarget::Stderr,
    };
    if let Err(e) = handlers::init_tracing(verbose, log_target) {
        eprintln!("{} {}", "✗".red().bold(), e);
    }

    let session = match Session::from_matches(&chosen_command) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    let result = match chosen_command.subcommand() {
        Some(("init", sub)) => handlers::handle_init(&session, sub),
        Some(("ui", sub)) => handlers::handle_ui(&session, sub).await,
        Some(("check", sub)) => handlers::handle_check(&session, sub).await,
        Some(("stop", _)) => handlers::handle_stop(&session).await,
        Some(("nodes", _)) => handlers::handle_nodes(&session).await,
        Some(("recheck", sub)) => handlers::handle_recheck(&session, sub).await,
        Some(("rename", sub)) => handlers::handle_rename(&session, sub).await,
        Some(("delete", sub)) => handlers::handle_delete(&session, sub).await,
        Some(("export", sub)) => handlers::handle_export(&session, sub).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
