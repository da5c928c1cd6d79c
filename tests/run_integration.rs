//! End-to-end runs over the fixture project.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;
use walkdir::WalkDir;

use model_annotations::cli::{self, Cli, Commands, EXIT_ERROR, EXIT_SUCCESS};
use model_annotations::registry::ProjectRegistry;
use model_annotations::report::{JsonPresenter, PrettyPresenter};
use model_annotations::{AnnotateConfig, AnnotateError, ClassStatus, Runner};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn project_copy() -> TempDir {
    let source = testdata_path().join("project");
    let temp = TempDir::new().expect("should create temp dir");

    for entry in WalkDir::new(&source) {
        let entry = entry.expect("should walk fixtures");
        let target = temp.path().join(entry.path().strip_prefix(&source).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }

    temp
}

fn load(root: &Path, overrides: impl FnOnce(&mut AnnotateConfig)) -> (AnnotateConfig, ProjectRegistry) {
    let mut config = AnnotateConfig::parse_file(root.join("model-annotations.yaml")).expect("fixture config");
    overrides(&mut config);
    let registry = ProjectRegistry::scan(root, config.registry_options().unwrap()).unwrap();
    (config, registry)
}

/// All PHP sources under `root`, keyed by relative path.
fn php_sources(root: &Path) -> Vec<(PathBuf, String)> {
    let mut files: Vec<_> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|x| x == "php").unwrap_or(false))
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, fs::read_to_string(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_dry_run_reports_every_class() {
    colored::control::set_override(false);

    let temp = project_copy();
    let (config, registry) = load(temp.path(), |_| {});
    let before = php_sources(temp.path());

    let mut presenter = PrettyPresenter::new(Vec::new());
    let summary = Runner::new(&registry, &config).run(&mut presenter).unwrap();

    assert_eq!(summary.processed, 6);
    assert_eq!(summary.changed, 4);
    assert_eq!(summary.written, 0);
    assert_eq!(summary.failed, 0);

    let statuses: Vec<_> = summary.classes.iter().map(|c| (c.fqn.as_str(), c.status)).collect();
    assert_eq!(
        statuses,
        vec![
            ("App\\Model\\Player", ClassStatus::Annotated),
            ("App\\Model\\Supporter", ClassStatus::Unchanged),
            ("App\\Model\\Team", ClassStatus::Annotated),
            ("App\\Model\\TeamSupporter", ClassStatus::Annotated),
            ("App\\Page\\HomePage", ClassStatus::Annotated),
            ("Page", ClassStatus::Unchanged),
        ]
    );

    let output = String::from_utf8(presenter.into_inner()).unwrap();
    assert!(output.contains(
        "Params: | dataClass: All | dryRun: true | addUseStatements: false | createBackupFile: false | quiet: false |"
    ));
    assert_eq!(output.matches("Generating annotations done").count(), 6);
    // one separator between each pair of classes
    assert_eq!(output.matches("-----------------------").count(), 5);
    assert!(output.contains(" * @property int  $TeamID Team ID"));
    assert!(output.contains("No update for"));
    assert!(output.trim_end().ends_with("Task finished"));

    // nothing was written
    assert_eq!(php_sources(temp.path()), before);
}

#[test]
fn test_write_run_then_rerun() {
    let temp = project_copy();
    let (config, registry) = load(temp.path(), |c| {
        c.dry_run = false;
        c.add_use_statements = true;
        c.create_backup_file = true;
    });

    let mut presenter = PrettyPresenter::new(Vec::new());
    let summary = Runner::new(&registry, &config).run(&mut presenter).unwrap();
    assert_eq!(summary.written, 4);
    assert!(summary.classes.iter().all(|c| c.content.is_none()));

    let output = String::from_utf8(presenter.into_inner()).unwrap();
    assert_eq!(output.matches("Creating backup file at").count(), 4);
    assert_eq!(output.matches("Writing file").count(), 4);

    assert!(temp.path().join("app/src/Model/Team.php.bck").exists());
    assert!(!temp.path().join("app/src/Model/Supporter.php.bck").exists());

    let after_first = php_sources(temp.path());

    let (config, registry) = load(temp.path(), |c| {
        c.dry_run = false;
        c.add_use_statements = true;
    });
    let summary = Runner::new(&registry, &config)
        .run(&mut PrettyPresenter::new(Vec::new()))
        .unwrap();
    assert_eq!(summary.changed, 0);
    assert_eq!(summary.written, 0);
    assert_eq!(php_sources(temp.path()), after_first);
}

#[test]
fn test_single_class_run() {
    let temp = project_copy();
    let (config, registry) = load(temp.path(), |c| {
        c.data_class = Some("app\\model\\team".to_string());
    });

    let summary = Runner::new(&registry, &config)
        .run(&mut PrettyPresenter::new(Vec::new()))
        .unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.classes[0].fqn, "App\\Model\\Team");
}

#[test]
fn test_unknown_class_aborts_run() {
    let temp = project_copy();
    let (config, registry) = load(temp.path(), |c| {
        c.data_class = Some("App\\Model\\Coach".to_string());
    });

    let result = Runner::new(&registry, &config).run(&mut PrettyPresenter::new(Vec::new()));
    match result {
        Err(AnnotateError::ClassNotFound(name)) => assert_eq!(name, "App\\Model\\Coach"),
        other => panic!("expected ClassNotFound, got {:?}", other.map(|s| s.processed)),
    }
}

#[test]
fn test_broken_relation_is_reported_and_run_continues() {
    let temp = project_copy();
    let team = temp.path().join("app/src/Model/Team.php");
    let source = fs::read_to_string(&team)
        .unwrap()
        .replace("'through' => TeamSupporter::class,", "");
    fs::write(&team, source).unwrap();

    let (config, registry) = load(temp.path(), |_| {});
    let summary = Runner::new(&registry, &config)
        .run(&mut PrettyPresenter::new(Vec::new()))
        .unwrap();

    assert_eq!(summary.processed, 6);
    assert_eq!(summary.failed, 1);
    let failed = summary
        .classes
        .iter()
        .find(|c| c.status == ClassStatus::Failed)
        .unwrap();
    assert_eq!(failed.fqn, "App\\Model\\Team");
    assert!(failed.error.as_deref().unwrap().contains("Supporters"));
}

#[test]
fn test_json_report() {
    let temp = project_copy();
    let (config, registry) = load(temp.path(), |_| {});

    let mut presenter = JsonPresenter::new(Vec::new());
    Runner::new(&registry, &config).run(&mut presenter).unwrap();

    let output = String::from_utf8(presenter.into_inner()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");
    assert_eq!(json["params"]["dryRun"], true);
    assert_eq!(json["processed"], 6);
    assert_eq!(json["changed"], 4);
    assert_eq!(json["classes"][2]["fqn"], "App\\Model\\Team");
    assert_eq!(json["classes"][2]["methods_added"][1], "Supporters");
    assert!(json["classes"][2]["content"].as_str().unwrap().contains("@method"));
}

#[test]
fn test_cli_run_exit_codes() {
    let temp = project_copy();
    let path = temp.path().to_str().unwrap();

    let cli = Cli::parse_from(["model-annotations", "run", path, "--quiet", "--write"]);
    let Commands::Run(args) = cli.command else {
        panic!("expected run command");
    };
    assert_eq!(cli::run_annotate(&args).unwrap(), EXIT_SUCCESS);
    assert!(fs::read_to_string(temp.path().join("app/src/Model/Team.php"))
        .unwrap()
        .contains(" * @method \\SilverStripe\\ORM\\HasManyList  Players()"));

    let cli = Cli::parse_from(["model-annotations", "run", path, "--quiet", "-d", "App\\Nope"]);
    let Commands::Run(args) = cli.command else {
        panic!("expected run command");
    };
    assert_eq!(cli::run_annotate(&args).unwrap(), EXIT_ERROR);

    let cli = Cli::parse_from(["model-annotations", "run", path, "--format", "sarif"]);
    let Commands::Run(args) = cli.command else {
        panic!("expected run command");
    };
    assert_eq!(cli::run_annotate(&args).unwrap(), EXIT_ERROR);
}

#[test]
fn test_cli_init_writes_template() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("conf/model-annotations.yaml");
    let out = output.to_str().unwrap();

    let cli = Cli::parse_from(["model-annotations", "init", "--template", "cms", "--output", out]);
    let Commands::Init(args) = cli.command else {
        panic!("expected init command");
    };
    assert_eq!(cli::run_init(&args).unwrap(), EXIT_SUCCESS);

    let config = AnnotateConfig::parse_file(&output).unwrap();
    assert!(!config.dry_run);

    // refuses to overwrite
    assert_eq!(cli::run_init(&args).unwrap(), EXIT_ERROR);
}

#[test]
fn test_cli_init_template_selection() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("model-annotations.yaml");
    let out = output.to_str().unwrap();

    let cli = Cli::parse_from(["model-annotations", "init", "--template", "nope", "--output", out]);
    let Commands::Init(args) = cli.command else {
        panic!("expected init command");
    };
    assert_eq!(cli::run_init(&args).unwrap(), EXIT_ERROR);
    assert!(!output.exists());

    let cli = Cli::parse_from(["model-annotations", "init", "--list", "--output", out]);
    let Commands::Init(args) = cli.command else {
        panic!("expected init command");
    };
    assert_eq!(cli::run_init(&args).unwrap(), EXIT_SUCCESS);
    assert!(!output.exists());

    let cli = Cli::parse_from(["model-annotations", "init", "--output", out]);
    let Commands::Init(args) = cli.command else {
        panic!("expected init command");
    };
    assert_eq!(cli::run_init(&args).unwrap(), EXIT_SUCCESS);
    let config = AnnotateConfig::parse_file(&output).unwrap();
    assert!(config.dry_run);
}

#[test]
fn test_cli_classes_lists_models() {
    let temp = project_copy();
    let path = temp.path().to_str().unwrap();

    let cli = Cli::parse_from(["model-annotations", "classes", path]);
    let Commands::Classes(args) = cli.command else {
        panic!("expected classes command");
    };
    assert_eq!(cli::run_classes(&args).unwrap(), EXIT_SUCCESS);

    let cli = Cli::parse_from(["model-annotations", "classes", "/definitely/not/here"]);
    let Commands::Classes(args) = cli.command else {
        panic!("expected classes command");
    };
    assert_eq!(cli::run_classes(&args).unwrap(), EXIT_ERROR);
}
