//! codeatlas: offline code intelligence for TypeScript and JavaScript
//!
//! Usage:
//!   codeatlas index [path] [--name <full_name>]   Index a codebase
//!   codeatlas status [path]                       Show index statistics
//!   codeatlas search <query>                      Full-text search
//!   codeatlas deps <file>                         Query the import graph
//!   codeatlas export / import                     Sync through JSON lines

use std::env;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use codeatlas::cli::{
    deps_command, export_command, import_command, index_command, projects_command, recent_command, repos_command,
    search_command, status_command, DepsOptions,
};

const DEFAULT_SEARCH_LIMIT: usize = 20;
const DEFAULT_RECENT_LIMIT: usize = 20;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    setup_logging(has_flag(&args, "--verbose"));
    let root = flag_value(&args, "--root").unwrap_or(".");
    let repository = flag_value(&args, "--repo");
    let rest = positional(&args[2..]);

    match args[1].as_str() {
        "index" => {
            let path = rest.first().map(|s| s.as_str()).unwrap_or(".");
            index_command(path, flag_value(&args, "--name"))?;
        }
        "status" => {
            let path = rest.first().map(|s| s.as_str()).unwrap_or(root);
            status_command(path)?;
        }
        "search" => {
            if rest.is_empty() {
                eprintln!("Usage: codeatlas search <query> [--repo <name>] [--limit <n>]");
                return Ok(());
            }
            let query = rest.join(" ");
            let limit = parse_flag(&args, "--limit")?.unwrap_or(DEFAULT_SEARCH_LIMIT);
            search_command(root, &query, repository, limit)?;
        }
        "recent" => {
            let limit = parse_flag(&args, "--limit")?.unwrap_or(DEFAULT_RECENT_LIMIT);
            recent_command(root, repository, limit)?;
        }
        "deps" => {
            let Some(file) = rest.first() else {
                eprintln!("Usage: codeatlas deps <file> [--direction dependents|dependencies|both] [--depth <1-5>] [--tests]");
                return Ok(());
            };
            let options = DepsOptions {
                direction: flag_value(&args, "--direction").unwrap_or("both"),
                depth: parse_flag(&args, "--depth")?.unwrap_or(1),
                include_tests: has_flag(&args, "--tests"),
                repository,
            };
            deps_command(root, file, &options)?;
        }
        "export" => {
            export_command(root, has_flag(&args, "--force"))?;
        }
        "import" => {
            import_command(root, rest.first().map(|s| s.as_str()))?;
        }
        "repos" => {
            repos_command(root, &rest)?;
        }
        "projects" => {
            projects_command(root, &rest)?;
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "--version" | "-V" | "version" => {
            print_version();
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
        }
    }

    Ok(())
}

/// Flags that take a value; everything else starting with `--` is a switch
const VALUE_FLAGS: [&str; 6] = ["--root", "--repo", "--name", "--limit", "--depth", "--direction"];

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    flag_value(args, flag)
        .map(|v| v.parse::<T>().with_context(|| format!("Invalid value for {}: {}", flag, v)))
        .transpose()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Arguments that are neither flags nor flag values
fn positional(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
        } else if VALUE_FLAGS.contains(&arg.as_str()) {
            skip = true;
        } else if !arg.starts_with("--") {
            out.push(arg.clone());
        }
    }
    out
}

fn print_usage() {
    println!(
        r#"codeatlas: Offline code intelligence for TypeScript and JavaScript

USAGE:
    codeatlas <COMMAND> [OPTIONS]

COMMANDS:
    index [path] [--name <full_name>]   Index a codebase (default: current directory)
    status [path]                       Show index statistics
    search <query>                      Full-text search over file contents
    recent                              List recently indexed files
    deps <file>                         Show dependents and dependencies of a file
    export [--force]                    Export the index as JSON lines
    import [dir]                        Import JSON lines into the index
    repos [list | remove <name>]        Manage indexed repositories
    projects [list | create | add | remove | delete]
                                        Manage projects
    help                                Show this help message

OPTIONS:
    --root <path>        Project root holding the index (default: .)
    --repo <name>        Restrict a query to one repository
    --limit <n>          Maximum results for search and recent
    --direction <dir>    dependents, dependencies or both (default: both)
    --depth <n>          Traversal depth, 1 to 5 (default: 1)
    --tests              Include test files in dependency results
    --verbose            Debug logging

EXAMPLES:
    codeatlas index                          # Index current directory
    codeatlas index ~/src/web --name acme/web
    codeatlas search "useSession"            # Files mentioning useSession
    codeatlas deps src/api/client.ts --depth 2 --direction dependents
    codeatlas export && git add .codeatlas/sync
"#
    );
}

fn print_version() {
    println!("codeatlas {}", env!("CARGO_PKG_VERSION"));
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
