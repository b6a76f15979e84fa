//! Command implementations for CLI operations

use anyhow::{bail, Result};

use crate::index_repository;
use crate::sync;
use crate::types::{Direction, RepositoryDescriptor};

use super::db_utils::{canonicalize_path, default_full_name, load_config, open_existing_store, open_project_store};

/// Index a codebase at the given path
pub fn index_command(path: &str, full_name: Option<&str>) -> Result<()> {
    let project_root = canonicalize_path(path)?;
    let config = load_config(&project_root)?;
    let store = open_project_store(&project_root, &config)?;

    let full_name = full_name
        .map(str::to_string)
        .unwrap_or_else(|| default_full_name(&project_root));
    let descriptor = RepositoryDescriptor::new(full_name, &project_root);
    let stats = index_repository(&store, &descriptor, &config.index)?;

    println!("\nIndexing complete!");
    println!("  Files indexed:   {}", stats.files_indexed);
    println!("  Symbols:         {}", stats.symbols_extracted);
    println!("  References:      {}", stats.references_extracted);
    println!("  Dependencies:    {}", stats.dependencies_extracted);
    if stats.circular_dependencies > 0 {
        println!("  Circular deps:   {}", stats.circular_dependencies);
    }
    if stats.read_errors > 0 {
        println!("  Read errors:     {}", stats.read_errors);
    }
    if !stats.parse_failures.is_empty() {
        println!("  Parse failures:  {}", stats.parse_failures.len());
        for failure in &stats.parse_failures {
            println!("    {}: {}", failure.path, failure.message);
        }
    }

    Ok(())
}

/// Show index statistics for a project
pub fn status_command(path: &str) -> Result<()> {
    let project_root = canonicalize_path(path)?;
    let config = load_config(&project_root)?;
    let Some(store) = open_existing_store(&project_root, &config)? else {
        return Ok(());
    };
    let stats = store.stats()?;

    println!("codeatlas Index Status");
    println!("======================");
    println!("Database: {}", config.database_path(&project_root).display());
    println!("Repositories: {}", stats.total_repositories);
    println!("Files: {}", stats.total_files);
    println!("Symbols: {}", stats.total_symbols);
    println!("References: {}", stats.total_references);
    println!("Dependencies: {}", stats.total_edges);
    println!("Size: {:.2} KB", stats.db_size_bytes as f64 / 1024.0);

    let repositories = store.list_repositories()?;
    if !repositories.is_empty() {
        println!("\nRepositories:");
        for repo in &repositories {
            match repo.last_indexed_at {
                Some(at) => println!("  {} (indexed at {})", repo.full_name, at),
                None => println!("  {} (never indexed)", repo.full_name),
            }
        }
    }

    if !stats.languages.is_empty() {
        println!("\nLanguages:");
        for (lang, count) in &stats.languages {
            println!("  {}: {} files", lang.as_str(), count);
        }
    }

    if !stats.symbol_kinds.is_empty() {
        println!("\nSymbol Types:");
        for (kind, count) in &stats.symbol_kinds {
            println!("  {}: {}", kind.as_str(), count);
        }
    }

    Ok(())
}

/// Full-text search over indexed file contents
pub fn search_command(path: &str, query: &str, repository: Option<&str>, limit: usize) -> Result<()> {
    let project_root = canonicalize_path(path)?;
    let config = load_config(&project_root)?;
    let Some(store) = open_existing_store(&project_root, &config)? else {
        return Ok(());
    };

    let hits = store.search(query, repository, limit)?;
    if hits.is_empty() {
        println!("No files found matching '{}'", query);
        return Ok(());
    }

    println!("Found {} files matching '{}':\n", hits.len(), query);
    for hit in hits {
        println!("  {} [{}] score {:.3}", hit.path, hit.repository, hit.score);
        println!("    {}", hit.snippet.replace('\n', " "));
        if !hit.dependencies.is_empty() {
            println!("    imports: {}", hit.dependencies.join(", "));
        }
    }

    Ok(())
}

/// List the most recently indexed files
pub fn recent_command(path: &str, repository: Option<&str>, limit: usize) -> Result<()> {
    let project_root = canonicalize_path(path)?;
    let config = load_config(&project_root)?;
    let Some(store) = open_existing_store(&project_root, &config)? else {
        return Ok(());
    };

    let files = store.list_recent_files(limit, repository)?;
    if files.is_empty() {
        println!("No files indexed.");
        return Ok(());
    }
    for file in files {
        println!(
            "  {} [{}] {} {} bytes (indexed at {})",
            file.path,
            file.repository,
            file.language.as_str(),
            file.size,
            file.indexed_at
        );
    }

    Ok(())
}

/// Options for the `deps` command
#[derive(Debug, Clone)]
pub struct DepsOptions<'a> {
    pub direction: &'a str,
    pub depth: u32,
    pub include_tests: bool,
    pub repository: Option<&'a str>,
}

/// Show the files around `file` in the import graph
pub fn deps_command(path: &str, file: &str, options: &DepsOptions<'_>) -> Result<()> {
    let Some(direction) = Direction::from_str(options.direction) else {
        bail!(
            "Unknown direction '{}' (expected dependents, dependencies or both)",
            options.direction
        );
    };

    let project_root = canonicalize_path(path)?;
    let config = load_config(&project_root)?;
    let Some(store) = open_existing_store(&project_root, &config)? else {
        return Ok(());
    };

    let result = store.query_dependencies(file, direction, options.depth, options.include_tests, options.repository)?;
    match &result.repository {
        Some(repo) => println!("{} [{}]", result.file_path, repo),
        None => {
            println!("'{}' is not indexed", file);
            return Ok(());
        }
    }

    if direction.includes_dependents() {
        println!("\nDependents:");
        print_levels(&result.dependents);
    }
    if direction.includes_dependencies() {
        println!("\nDependencies:");
        print_levels(&result.dependencies);
    }
    if !result.cycles.is_empty() {
        println!("\nCycles:");
        for cycle in &result.cycles {
            println!("  {}", cycle.nodes().join(" -> "));
        }
    }
    if result.depth_limited {
        println!("\n(depth limit {} reached; results truncated)", result.depth);
    }

    Ok(())
}

fn print_levels(levels: &[crate::types::DependencyLevel]) {
    if levels.iter().all(|l| l.files.is_empty()) {
        println!("  (none)");
        return;
    }
    for level in levels {
        for file in &level.files {
            println!("  [{}] {}", level.depth, file);
        }
    }
}

/// Export the index as JSON lines
pub fn export_command(path: &str, force: bool) -> Result<()> {
    let project_root = canonicalize_path(path)?;
    let config = load_config(&project_root)?;
    let Some(store) = open_existing_store(&project_root, &config)? else {
        return Ok(());
    };

    let dir = config.export_dir(&project_root);
    let result = sync::export(&store, &dir, force)?;

    println!("Exported to {}", dir.display());
    println!("  Tables written: {}", result.tables_exported.join(", "));
    if !result.tables_skipped.is_empty() {
        println!("  Unchanged:      {}", result.tables_skipped.join(", "));
    }
    println!("  Rows:           {}", result.total_rows);
    println!("  Deletions:      {}", result.deletions);
    println!("  Duration:       {:?}", result.duration);

    Ok(())
}

/// Import JSON lines into the index
pub fn import_command(path: &str, dir: Option<&str>) -> Result<()> {
    let project_root = canonicalize_path(path)?;
    let config = load_config(&project_root)?;
    let store = open_project_store(&project_root, &config)?;

    let dir = match dir {
        Some(dir) => canonicalize_path(dir)?,
        None => config.export_dir(&project_root),
    };
    let result = sync::import(&store, &dir)?;

    println!("Imported from {}", dir.display());
    println!("  Tables:   {}", result.tables_imported.join(", "));
    println!("  Rows:     {}", result.rows_imported);
    println!("  Deleted:  {}", result.rows_deleted);
    println!("  Duration: {:?}", result.duration);
    if !result.errors.is_empty() {
        println!("  Skipped records: {}", result.errors.len());
        for error in &result.errors {
            println!("    {}:{}: {}", error.table, error.line, error.message);
        }
    }

    Ok(())
}

/// Manage repositories: `list` or `remove <full_name>`
pub fn repos_command(path: &str, args: &[String]) -> Result<()> {
    let project_root = canonicalize_path(path)?;
    let config = load_config(&project_root)?;
    let Some(store) = open_existing_store(&project_root, &config)? else {
        return Ok(());
    };

    match args.first().map(String::as_str) {
        None | Some("list") => {
            for repo in store.list_repositories()? {
                println!("  {} ({})", repo.full_name, repo.default_branch);
            }
        }
        Some("remove") => {
            let Some(name) = args.get(1) else {
                bail!("Usage: codeatlas repos remove <full_name>");
            };
            if store.delete_repository(name)? {
                println!("Removed {}", name);
            } else {
                println!("No repository named {}", name);
            }
        }
        Some(other) => bail!("Unknown repos subcommand: {}", other),
    }

    Ok(())
}

/// Manage projects: `list`, `create <name> [description]`,
/// `add <project> <repo>`, `remove <project> <repo>`, `delete <name>`
pub fn projects_command(path: &str, args: &[String]) -> Result<()> {
    let project_root = canonicalize_path(path)?;
    let config = load_config(&project_root)?;
    let store = open_project_store(&project_root, &config)?;

    let arg = |i: usize| args.get(i).map(String::as_str);
    match (arg(0), arg(1), arg(2)) {
        (None, _, _) | (Some("list"), _, _) => {
            let projects = store.list_projects()?;
            if projects.is_empty() {
                println!("No projects.");
            }
            for project in projects {
                match &project.description {
                    Some(desc) => println!("{} - {}", project.name, desc),
                    None => println!("{}", project.name),
                }
                for repo in &project.repositories {
                    println!("  {}", repo);
                }
            }
        }
        (Some("create"), Some(name), _) => {
            let description = (args.len() > 2).then(|| args[2..].join(" "));
            let project = store.create_project(name, description.as_deref())?;
            println!("Created project {}", project.name);
        }
        (Some("add"), Some(project), Some(repo)) => {
            store.add_repository_to_project(project, repo)?;
            println!("Added {} to {}", repo, project);
        }
        (Some("remove"), Some(project), Some(repo)) => {
            if store.remove_repository_from_project(project, repo)? {
                println!("Removed {} from {}", repo, project);
            } else {
                println!("{} is not in {}", repo, project);
            }
        }
        (Some("delete"), Some(name), _) => {
            if store.delete_project(name)? {
                println!("Deleted project {}", name);
            } else {
                println!("No project named {}", name);
            }
        }
        _ => bail!(
            "Usage: codeatlas projects [list | create <name> [description] | add <project> <repo> | remove <project> <repo> | delete <name>]"
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn indexed_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("util.ts"), "export function add(a: number, b: number) { return a + b; }\n").unwrap();
        std::fs::write(dir.path().join("main.ts"), "import { add } from './util';\nadd(1, 2);\n").unwrap();
        index_command(dir.path().to_str().unwrap(), Some("acme/web")).unwrap();
        dir
    }

    #[test]
    fn test_index_then_query_commands() {
        let dir = indexed_root();
        let path = dir.path().to_str().unwrap();

        status_command(path).unwrap();
        search_command(path, "add", None, 10).unwrap();
        recent_command(path, Some("acme/web"), 5).unwrap();
        let options = DepsOptions {
            direction: "both",
            depth: 2,
            include_tests: false,
            repository: None,
        };
        deps_command(path, "util.ts", &options).unwrap();

        let store = open_project_store(dir.path(), &Config::default()).unwrap();
        assert_eq!(store.list_repositories().unwrap()[0].full_name, "acme/web");
    }

    #[test]
    fn test_deps_rejects_bad_direction_and_depth() {
        let dir = indexed_root();
        let path = dir.path().to_str().unwrap();
        let mut options = DepsOptions {
            direction: "sideways",
            depth: 1,
            include_tests: false,
            repository: None,
        };
        assert!(deps_command(path, "util.ts", &options).is_err());

        options.direction = "dependents";
        options.depth = 9;
        assert!(deps_command(path, "util.ts", &options).is_err());
    }

    #[test]
    fn test_export_import_commands() {
        let dir = indexed_root();
        let path = dir.path().to_str().unwrap();
        export_command(path, false).unwrap();
        assert!(dir.path().join(".codeatlas/sync/files.jsonl").exists());

        let other = TempDir::new().unwrap();
        let sync_dir = dir.path().join(".codeatlas/sync");
        import_command(other.path().to_str().unwrap(), sync_dir.to_str()).unwrap();
        let store = open_project_store(other.path(), &Config::default()).unwrap();
        assert_eq!(store.stats().unwrap().total_files, 2);
    }

    #[test]
    fn test_projects_command() {
        let dir = indexed_root();
        let path = dir.path().to_str().unwrap();
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        projects_command(path, &args(&["create", "platform", "Shared", "code"])).unwrap();
        projects_command(path, &args(&["add", "platform", "acme/web"])).unwrap();
        projects_command(path, &args(&[])).unwrap();
        assert!(projects_command(path, &args(&["add", "platform"])).is_err());

        let store = open_project_store(dir.path(), &Config::default()).unwrap();
        let projects = store.list_projects().unwrap();
        assert_eq!(projects[0].description.as_deref(), Some("Shared code"));
        assert_eq!(projects[0].repositories, vec!["acme/web"]);
    }
}
