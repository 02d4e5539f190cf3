use anyhow::Result;
use clap::{Parser, Subcommand};
use codemod_patcher::config::{
    apply_mods, load_from_path, ApplicationError, ApplyMode, FileChange, ModResult,
};
use codemod_patcher::generated::find_generated_blocks;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "codemod-patcher")]
#[command(about = "Idempotent generated-code mods for native projects", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply mods to a project
    Apply {
        /// Path to project root (auto-detected if not specified)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Specific mod file to apply (otherwise applies all in mods/)
        #[arg(short, long)]
        mods: Option<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Check status of mods without applying
    Status {
        /// Path to project root (auto-detected if not specified)
        #[arg(short, long)]
        project: Option<PathBuf>,
    },

    /// Verify every mod is already applied
    Verify {
        /// Path to project root (auto-detected if not specified)
        #[arg(short, long)]
        project: Option<PathBuf>,
    },

    /// List mod files and the mods they contain
    List {
        /// Path to project root (auto-detected if not specified)
        #[arg(short, long)]
        project: Option<PathBuf>,
    },

    /// List generated blocks found in a file
    Blocks {
        /// File to scan
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = codemod_patcher::logging::init(cli.verbose) {
        eprintln!("{}", format!("Warning: failed to initialize logging: {e}").yellow());
    }

    match cli.command {
        Commands::Apply {
            project,
            mods,
            dry_run,
            diff,
        } => cmd_apply(project, mods, dry_run, diff),

        Commands::Status { project } => cmd_status(project),

        Commands::Verify { project } => cmd_verify(project),

        Commands::List { project } => cmd_list(project),

        Commands::Blocks { file } => cmd_blocks(&file),
    }
}

/// Helper: Discover all .toml mod files in a mods/ directory.
///
/// Discovery order:
/// 1. `<project>/mods` (mod files kept alongside the native project).
/// 2. `./mods` relative to the current working directory.
fn discover_mod_files(project: &Path) -> Result<Vec<PathBuf>> {
    let cwd_mods_dir = env::current_dir().ok().map(|cwd| cwd.join("mods"));
    let project_mods_dir = project.join("mods");

    let candidate_dirs: Vec<PathBuf> = std::iter::once(project_mods_dir)
        .chain(cwd_mods_dir)
        .collect();

    for mods_dir in candidate_dirs {
        if !mods_dir.exists() {
            continue;
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&mods_dir).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
            {
                files.push(entry.path().to_path_buf());
            }
        }

        files.sort();

        if !files.is_empty() {
            return Ok(files);
        }
    }

    anyhow::bail!(
        "No .toml mod files found in either {}/mods or ./mods",
        project.display()
    )
}

/// Resolve project path using multiple detection strategies
///
/// Priority order:
/// 1. Explicit --project flag
/// 2. CODEMOD_PROJECT environment variable
/// 3. Nearest ancestor of the current directory that looks like a project
fn resolve_project(cli_project: Option<PathBuf>) -> Result<PathBuf> {
    // 1. Explicit flag (highest priority)
    if let Some(path) = cli_project {
        return Ok(path.canonicalize()?);
    }

    // 2. Environment variable
    if let Ok(env_path) = env::var("CODEMOD_PROJECT") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!(
                "Warning: CODEMOD_PROJECT is set but path doesn't exist: {}",
                env_path
            )
            .yellow()
        );
    }

    // 3. Auto-detect from current directory
    if let Some(path) = auto_detect_project() {
        println!(
            "{}",
            format!("Auto-detected project: {}", path.display()).dimmed()
        );
        return Ok(path);
    }

    anyhow::bail!(
        "{}\n{}\n  {}\n  {}\n  {}",
        "Could not find a native project.".red(),
        "Try one of:".bold(),
        "1. cd into your project directory (containing android/, ios/ or mods/)",
        "2. Specify explicitly: codemod-patcher apply --project /path/to/app",
        "3. Set environment variable: export CODEMOD_PROJECT=/path/to/app"
    )
}

/// Walk up from the current directory looking for `android/`, `ios/` or `mods/`.
fn auto_detect_project() -> Option<PathBuf> {
    let current = env::current_dir().ok()?;
    current
        .ancestors()
        .find(|ancestor| {
            ["android", "ios", "mods"]
                .iter()
                .any(|dir| ancestor.join(dir).is_dir())
        })
        .map(Path::to_path_buf)
}

/// Helper: Show unified diff between original and modified content
fn display_diff(change: &FileChange) {
    let original = change.before.as_deref().unwrap_or("");
    let label = if change.before.is_some() {
        "original"
    } else {
        "new file"
    };
    println!(
        "\n{}",
        format!("--- {} ({})", change.path.display(), label).dimmed()
    );
    println!("{}", format!("+++ {} (modded)", change.path.display()).dimmed());

    let diff = TextDiff::from_lines(original, &change.after);

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for line_change in hunk.iter_changes() {
            let line = match line_change.tag() {
                ChangeTag::Delete => format!("-{}", line_change).red(),
                ChangeTag::Insert => format!("+{}", line_change).green(),
                ChangeTag::Equal => format!(" {}", line_change).normal(),
            };
            print!("{}", line);
            if line_change.missing_newline() {
                println!();
            }
        }
    }
}

fn cmd_apply(
    project: Option<PathBuf>,
    mods: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    // 1. Resolve project path
    let project = resolve_project(project)?;

    // 2. Determine mod files to load
    let mod_files = if let Some(path) = mods {
        vec![path]
    } else {
        discover_mod_files(&project)?
    };

    println!("Project: {}", project.display());
    println!();

    let mode = if dry_run {
        ApplyMode::Check
    } else {
        ApplyMode::Write
    };

    // 3. Load and apply each mod file
    let mut total_applied = 0;
    let mut total_unchanged = 0;
    let mut total_removed = 0;
    let mut total_failed = 0;

    for mod_file in mod_files {
        println!("Loading mods from {}...", mod_file.display());

        let config = load_from_path(&mod_file)?;
        if dry_run {
            println!("{}", "  [DRY RUN - showing what would be applied]".cyan());
        }

        let report = apply_mods(&config, &project, mode);

        // 4. Report results
        for (mod_id, result) in &report.results {
            match result {
                Ok(ModResult::Applied { file, replaced }) => {
                    let verb = match (dry_run, *replaced) {
                        (true, false) => "Would apply to",
                        (true, true) => "Would update in",
                        (false, false) => "Applied to",
                        (false, true) => "Updated in",
                    };
                    println!("{} {}: {} {}", "✓".green(), mod_id, verb, file.display());
                    total_applied += 1;
                }
                Ok(ModResult::Removed { file }) => {
                    let verb = if dry_run { "Would remove from" } else { "Removed from" };
                    println!("{} {}: {} {}", "✓".green(), mod_id, verb, file.display());
                    total_removed += 1;
                }
                Ok(result @ (ModResult::AlreadyApplied { .. } | ModResult::NotPresent { .. })) => {
                    println!("{} {}: {}", "⊙".yellow(), mod_id, result);
                    total_unchanged += 1;
                }
                Err(e) => {
                    eprintln!("{} {}: Error - {}", "✗".red(), mod_id, e);
                    total_failed += 1;

                    // Provide helpful conflict diagnostics
                    match e {
                        ApplicationError::Merge { file, .. } => {
                            eprintln!("  {}", "CONFLICT: Anchor matched no line".red());
                            eprintln!("  File: {}", file.display());
                            eprintln!("  Possible causes:");
                            eprintln!("    - The anchor line was edited or removed");
                            eprintln!("    - The mod targets the wrong file");
                        }
                        ApplicationError::MissingFile { file } => {
                            eprintln!("  File: {}", file.display());
                            eprintln!("  Action: Generate the native project before applying mods");
                        }
                        ApplicationError::FileAborted { .. } => {
                            eprintln!("  {}", "No changes were written to this file".dimmed());
                        }
                        _ => {}
                    }
                }
            }
        }

        if show_diff {
            for change in &report.changes {
                display_diff(change);
            }
        }

        println!();
    }

    // 5. Summary
    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", total_applied).green());
    println!("  {} removed", format!("{}", total_removed).green());
    println!("  {} unchanged", format!("{}", total_unchanged).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_status(project: Option<PathBuf>) -> Result<()> {
    // 1. Resolve project path
    let project = resolve_project(project)?;

    // 2. Discover mod files
    let mod_files = discover_mod_files(&project)?;

    println!("{}", "Mod Status Report".bold());
    println!("Project: {}", project.display());
    println!();

    let mut applied = Vec::new();
    let mut not_applied = Vec::new();

    // 3. Check status of all mods (read-only; does not touch project files)
    for mod_file in mod_files {
        let config = load_from_path(&mod_file)?;
        let report = apply_mods(&config, &project, ApplyMode::Check);

        for (mod_id, result) in report.results {
            match result {
                Ok(ref result) if result.is_settled() => applied.push(mod_id),
                Ok(ModResult::Applied { replaced: true, .. }) => {
                    not_applied.push((mod_id, "outdated block present".to_string()));
                }
                Ok(_) => {
                    not_applied.push((mod_id, "change pending".to_string()));
                }
                Err(ref e) => {
                    not_applied.push((mod_id, e.to_string()));
                }
            }
        }
    }

    // 4. Report grouped by status
    if !applied.is_empty() {
        println!(
            "{} {} ({} mods)",
            "✓".green(),
            "APPLIED".green().bold(),
            applied.len()
        );
        for id in &applied {
            println!("  - {}", id);
        }
        println!();
    }

    if !not_applied.is_empty() {
        println!(
            "{} {} ({} mods)",
            "⊙".yellow(),
            "NOT APPLIED".yellow().bold(),
            not_applied.len()
        );
        for (id, reason) in &not_applied {
            println!("  - {} ({})", id, reason.dimmed());
        }
        println!();
    }

    Ok(())
}

fn cmd_verify(project: Option<PathBuf>) -> Result<()> {
    // 1. Resolve project path
    let project = resolve_project(project)?;

    // 2. Discover mod files
    let mod_files = discover_mod_files(&project)?;

    println!("{}", "Verifying mods...".bold());
    println!("Project: {}", project.display());
    println!();

    let mut verified = 0;
    let mut mismatch = 0;

    // 3. Check verification for all mods
    for mod_file in mod_files {
        let config = load_from_path(&mod_file)?;
        let report = apply_mods(&config, &project, ApplyMode::Check);

        for (mod_id, result) in report.results {
            match result {
                Ok(ref result) if result.is_settled() => {
                    println!("{} {}: Verified ({})", "✓".green(), mod_id, result);
                    verified += 1;
                }
                Ok(result) => {
                    // A pending change means the mod is not applied yet
                    eprintln!("{} {}: MISMATCH", "✗".red(), mod_id);
                    eprintln!("  Expected: mod already applied");
                    eprintln!("  Found: change pending");
                    eprintln!("  Location: {}", result.file().display());
                    mismatch += 1;
                }
                Err(ref e) => {
                    eprintln!("{} {}: MISMATCH", "✗".red(), mod_id);
                    eprintln!("  Error: {}", e);
                    mismatch += 1;
                }
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} verified", format!("{}", verified).green());
    println!("  {} mismatch", format!("{}", mismatch).red());

    if mismatch > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_list(project: Option<PathBuf>) -> Result<()> {
    let project = resolve_project(project)?;
    let mod_files = discover_mod_files(&project)?;

    for mod_file in mod_files {
        let config = load_from_path(&mod_file)?;
        let title = if config.meta.name.is_empty() {
            mod_file.display().to_string()
        } else {
            format!("{} ({})", config.meta.name, mod_file.display())
        };
        println!("{}", title.bold());
        if let Some(description) = &config.meta.description {
            println!("  {}", description.dimmed());
        }
        for def in &config.mods {
            println!(
                "  - {}: {} -> {}",
                def.id,
                def.operation.describe(),
                def.file
            );
        }
        println!();
    }

    Ok(())
}

fn cmd_blocks(file: &Path) -> Result<()> {
    let contents = fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", file.display()))?;
    let blocks = find_generated_blocks(&contents);

    if blocks.is_empty() {
        println!("{}", format!("No generated blocks in {}", file.display()).dimmed());
        return Ok(());
    }

    println!("{} ({} blocks)", file.display().to_string().bold(), blocks.len());
    for block in blocks {
        println!(
            "  {} lines {}-{} {}",
            block.tag.green(),
            block.start_line + 1,
            block.end_line + 1,
            block.hash.as_deref().unwrap_or("(no hash)").dimmed()
        );
    }

    Ok(())
}
