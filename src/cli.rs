//! Command-line interface for model-annotations.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

use crate::config::{self, AnnotateConfig, DEFAULT_CONFIG_NAMES};
use crate::registry::{ModelRegistry, ProjectRegistry};
use crate::report::{self, Format};
use crate::runner::Runner;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Generate IDE annotations for SilverStripe data models.
///
/// Scans a project for model classes, reads their static `db`, `has_one`,
/// `belongs_to`, `has_many`, `many_many` and `belongs_many_many`
/// configuration and adds the matching `@property` and `@method` lines to
/// each class doc comment. Existing annotations are never removed or
/// duplicated.
#[derive(Parser)]
#[command(name = "model-annotations")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log every step to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate annotations for model classes
    #[command(visible_alias = "annotate")]
    Run(RunArgs),
    /// List the model classes found in a project
    Classes(ClassesArgs),
    /// Create a new configuration file from a template
    Init(InitArgs),
}

/// Arguments for the run command.
#[derive(Parser)]
pub struct RunArgs {
    /// Project directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Annotate only this class (fully-qualified, case-insensitive)
    #[arg(short, long)]
    pub data_class: Option<String>,

    /// Print the result instead of writing files
    #[arg(long, value_name = "BOOL")]
    pub dry_run: Option<bool>,

    /// Write files (same as --dry-run false)
    #[arg(short, long, conflicts_with = "dry_run")]
    pub write: bool,

    /// Add `use` statements for types that are not imported yet
    #[arg(long, value_name = "BOOL")]
    pub add_use_statements: Option<bool>,

    /// Back up each file before writing it
    #[arg(long, value_name = "BOOL")]
    pub create_backup_file: Option<bool>,

    /// Print nothing; failures are still logged
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

impl RunArgs {
    /// Apply command-line overrides on top of file configuration.
    pub fn apply(&self, config: &mut AnnotateConfig) {
        if let Some(class) = &self.data_class {
            config.data_class = Some(class.clone());
        }
        if let Some(dry_run) = self.dry_run {
            config.dry_run = dry_run;
        }
        if self.write {
            config.dry_run = false;
        }
        if let Some(add) = self.add_use_statements {
            config.add_use_statements = add;
        }
        if let Some(backup) = self.create_backup_file {
            config.create_backup_file = backup;
        }
        if self.quiet {
            config.quiet = true;
        }
    }
}

/// Arguments for the classes command.
#[derive(Parser)]
pub struct ClassesArgs {
    /// Project directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "model-annotations.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "default")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// Available config templates.
struct Template {
    name: &'static str,
    description: &'static str,
    content: &'static str,
}

/// All available templates.
static TEMPLATES: &[Template] = &[
    Template {
        name: "default",
        description: "Data objects only, dry run, fully-qualified types",
        content: include_str!("templates/default.yaml"),
    },
    Template {
        name: "cms",
        description: "Project with CMS pages: writes files, adds use statements, keeps backups",
        content: include_str!("templates/cms.yaml"),
    },
];

/// Load the configuration for a project.
///
/// An explicit path must exist. Otherwise the project root and then the
/// working directory are searched; no file means built-in defaults.
fn load_config(explicit: Option<&Path>, root: &Path) -> anyhow::Result<AnnotateConfig> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => AnnotateConfig::discover(root).or_else(|| AnnotateConfig::discover(Path::new("."))),
    };

    match path {
        Some(path) => {
            tracing::debug!(config = %path.display(), "loading configuration");
            Ok(AnnotateConfig::parse_file(&path)?)
        }
        None => {
            tracing::debug!(
                "no config file found (looked for {}), using defaults",
                DEFAULT_CONFIG_NAMES.join(", ")
            );
            Ok(AnnotateConfig::default())
        }
    }
}

/// Resolve and check the project root.
fn project_root(path: &Path) -> Result<PathBuf, String> {
    let abs_path = path
        .canonicalize()
        .map_err(|e| format!("cannot access path {:?}: {}", path, e))?;
    if !abs_path.is_dir() {
        return Err(format!("not a directory: {}", abs_path.display()));
    }
    Ok(abs_path)
}

/// Run the run command.
pub fn run_annotate(args: &RunArgs) -> anyhow::Result<i32> {
    // Validate format
    let format = match Format::parse(&args.format) {
        Some(f) => f,
        None => {
            eprintln!(
                "Error: invalid format {:?}, must be 'pretty' or 'json'",
                args.format
            );
            return Ok(EXIT_ERROR);
        }
    };

    let root = match project_root(&args.path) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let mut config = match load_config(args.config.as_deref(), &root) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    args.apply(&mut config);

    if let Err(e) = config::validate(&config) {
        eprintln!("Error: {}", e);
        return Ok(EXIT_ERROR);
    }

    let registry = ProjectRegistry::scan(&root, config.registry_options()?)?;
    tracing::debug!(classes = registry.len(), root = %root.display(), "project scanned");

    let mut presenter = report::presenter_for(format, config.quiet);
    let runner = Runner::new(&registry, &config);

    match runner.run(presenter.as_mut()) {
        Ok(summary) if summary.has_failures() => Ok(EXIT_FAILED),
        Ok(_) => Ok(EXIT_SUCCESS),
        Err(e) => {
            if config.quiet {
                tracing::error!(error = %e, "annotation run aborted");
            } else {
                eprintln!("Error: {}", e);
            }
            Ok(EXIT_ERROR)
        }
    }
}

/// Run the classes command.
pub fn run_classes(args: &ClassesArgs) -> anyhow::Result<i32> {
    let root = match project_root(&args.path) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let config = load_config(args.config.as_deref(), &root)?;
    if let Err(e) = config::validate(&config) {
        eprintln!("Error: {}", e);
        return Ok(EXIT_ERROR);
    }

    let registry = ProjectRegistry::scan(&root, config.registry_options()?)?;
    let classes = registry.list_target_classes(None)?;

    if classes.is_empty() {
        println!("No model classes found under {}", root.display());
        return Ok(EXIT_SUCCESS);
    }

    println!("  {} ({}):", "Model classes".bold(), classes.len());
    println!();
    for fqn in &classes {
        let path = registry
            .locate_source_file(fqn)
            .map(|p| p.strip_prefix(&root).map(Path::to_path_buf).unwrap_or(p))
            .unwrap_or_default();
        let page = if registry.is_site_tree_like(fqn) {
            " page".yellow().to_string()
        } else {
            String::new()
        };
        println!("    {:<48} {}{}", fqn, path.display().to_string().blue(), page);
    }

    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.list {
        print_templates();
        return Ok(EXIT_SUCCESS);
    }

    let Some(template) = TEMPLATES.iter().find(|t| t.name == args.template) else {
        let known: Vec<_> = TEMPLATES.iter().map(|t| t.name).collect();
        eprintln!(
            "{} no template named {:?} (known: {})",
            "init:".red().bold(),
            args.template,
            known.join(", ")
        );
        return Ok(EXIT_ERROR);
    };

    if args.output.exists() {
        eprintln!(
            "{} {} exists, not overwriting it",
            "init:".red().bold(),
            args.output.display()
        );
        return Ok(EXIT_ERROR);
    }

    if let Err(e) = write_template(&args.output, template) {
        eprintln!("{} {:#}", "init:".red().bold(), e);
        return Ok(EXIT_ERROR);
    }

    let config = args.output.display();
    println!("Wrote {} ({} template)", config, template.name);
    println!();
    println!("Adjust the class filter and type options, then:");
    println!("  model-annotations classes . --config {}    # list the models found", config);
    println!("  model-annotations run . --config {}        # preview the annotations", config);
    println!("  model-annotations run . --config {} --write", config);

    Ok(EXIT_SUCCESS)
}

/// Write `template` to `output`, creating missing parent directories.
fn write_template(output: &Path, template: &Template) -> anyhow::Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(output, template.content)
        .with_context(|| format!("cannot write {}", output.display()))
}

fn print_templates() {
    println!("Configuration templates (pick one with --template):");
    for template in TEMPLATES {
        let marker = if template.name == "default" { "*" } else { " " };
        println!(" {} {:<10} {}", marker, template.name, template.description);
    }
}
