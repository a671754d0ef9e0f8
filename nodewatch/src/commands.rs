use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("nodewatch")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("nodewatch")
        .about("Follow and curate proxy node health checks")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("Settings file to use")
                .default_value(nodewatch_core::DEFAULT_SETTINGS_PATH),
        )
        .arg(
            arg!(-s --"server" <URL>)
                .required(false)
                .global(true)
                .help("Checker service base URL (overrides the settings file)")
                .value_parser(clap::value_parser!(Url)),
        )
        .arg(
            arg!(-q --"quiet" "Suppress headers and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log debug output to stderr")
                .required(false)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            command!("init")
                .about("Writes a default settings file")
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing settings file without asking")
                        .required(false),
                ),
        )
        .subcommand(
            command!("ui")
                .about("Opens the interactive node table")
                .arg(
                    arg!(-f --"file" <PATH>)
                        .required(true)
                        .help("Clash YAML node list to check")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"log-file" <PATH>)
                        .required(false)
                        .help("Write logs here while the UI owns the terminal")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            command!("check")
                .about("Runs a check, follows it to the end and prints the results")
                .arg(
                    arg!(-f --"file" <PATH>)
                        .required(true)
                        .help("Clash YAML node list to check")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-e --"export" <DIR>)
                        .required(false)
                        .help("Export every node into this directory once the run completes")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(command!("stop").about("Stops the running check"))
        .subcommand(command!("nodes").about("Lists the service's current nodes"))
        .subcommand(
            command!("recheck").about("Rechecks a single node").arg(
                arg!(-i --"id" <ID>)
                    .required(true)
                    .help("Node id")
                    .value_parser(clap::value_parser!(u64)),
            ),
        )
        .subcommand(
            command!("rename")
                .about("Renames a node")
                .arg(
                    arg!(-i --"id" <ID>)
                        .required(true)
                        .help("Node id")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-n --"name" <NAME>)
                        .required(true)
                        .help("The new display name"),
                ),
        )
        .subcommand(
            command!("delete")
                .about("Deletes a node from the result set")
                .arg(
                    arg!(-i --"id" <ID>)
                        .required(true)
                        .help("Node id")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-y --"yes")
                        .help("Do not ask for confirmation")
                        .required(false),
                ),
        )
        .subcommand(
            command!("export")
                .about("Exports the given nodes as a Clash config")
                .arg(
                    arg!(--"ids" <IDS>)
                        .required(true)
                        .help("Comma separated node ids, in any order"),
                )
                .arg(
                    arg!(-o --"out" <DIR>)
                        .required(false)
                        .help("Write the exported file into this directory")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"copy")
                        .help("Copy the exported document to the clipboard")
                        .required(false),
                )
                .arg(
                    arg!(--"link")
                        .help("Print a clash:// import link")
                        .required(false),
                ),
        )
}
