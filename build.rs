// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Packages argument shared by several subcommands
fn packages_arg(required: bool) -> Arg {
    Arg::new("packages")
        .num_args(1..)
        .required(required)
        .help("Package names")
}

fn force_arg() -> Arg {
    Arg::new("force")
        .short('f')
        .long("force")
        .action(ArgAction::SetTrue)
        .help("Do not ask for confirmation")
}

fn build_cli() -> Command {
    Command::new("rekindle")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Rekindle Contributors")
        .about("Track locally built packages that need a rebuild after library upgrades")
        .subcommand_required(true)
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Suppress informational output"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
        .arg(
            Arg::new("db_path")
                .long("db-path")
                .global(true)
                .value_name("PATH")
                .help("Database path [default: /var/lib/rekindle/rekindle.db, env: REKINDLE_DB_PATH]"),
        )
        .arg(
            Arg::new("conf_dir")
                .long("conf-dir")
                .global(true)
                .value_name("DIR")
                .help("Configuration directory [default: /etc/rekindle, env: REKINDLE_CONF_DIR]"),
        )
        .subcommand(
            Command::new("mark")
                .about("Mark packages for rebuild")
                .arg(packages_arg(true))
                .arg(Arg::new("trigger").long("trigger").help("Trigger package that caused the mark"))
                .arg(
                    Arg::new("trigger_version")
                        .long("trigger-version")
                        .requires("trigger")
                        .help("Version of the trigger package"),
                ),
        )
        .subcommand(
            Command::new("unmark")
                .about("Remove packages from the queue (reads stdin when none are given)")
                .arg(packages_arg(false))
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Exit with status 2 if any package was not queued"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List queued packages with the trigger that last marked them")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("query")
                .about("Print which of the given packages are queued")
                .arg(packages_arg(true)),
        )
        .subcommand(
            Command::new("ismarked")
                .about("Exit 0 if a package is queued, 2 otherwise")
                .arg(Arg::new("package").required(true).help("Package name")),
        )
        .subcommand(
            Command::new("clear")
                .about("Clear the queue, or only the marks made by one trigger")
                .arg(force_arg())
                .arg(Arg::new("trigger").help("Only clear what this trigger marked")),
        )
        .subcommand(
            Command::new("rebuild")
                .about("Rebuild queued packages with an AUR helper")
                .arg(force_arg())
                .arg(
                    Arg::new("checkrebuild")
                        .long("checkrebuild")
                        .action(ArgAction::SetTrue)
                        .help("Include packages with broken linkage reported by checkrebuild"),
                )
                .arg(
                    Arg::new("cmd")
                        .long("cmd")
                        .value_name("COMMAND")
                        .help("Helper command line to use instead of the configured or detected one"),
                )
                .arg(packages_arg(false))
                .arg(
                    Arg::new("helper_args")
                        .last(true)
                        .num_args(1..)
                        .help("Extra arguments passed to the helper after --"),
                ),
        )
        .subcommand(
            Command::new("trigger")
                .about("Evaluate upgraded packages against the trigger registry")
                .arg(
                    Arg::new("dry_run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Show what would be marked without changing the queue"),
                )
                .arg(
                    Arg::new("upgrades")
                        .num_args(1..)
                        .help("Upgrades as 'name old new', 'name:old:new' or 'name' (default: stdin)"),
                ),
        )
        .subcommand(Command::new("triggers").about("Show registered triggers and their thresholds"))
        .subcommand(Command::new("config").about("Show the effective configuration"))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(Arg::new("shell").required(true).help("bash, zsh, fish, elvish or powershell")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("rekindle.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
