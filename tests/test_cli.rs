use std::fs;
use std::path::Path;
use tempfile::TempDir;
use xmlcontract::frontend::cli::{parse_args, Cli, CliError, Command};
use xmlcontract::frontend::config::{Config, OutputFormat, CONFIG_FILE_NAME};

const SHOP: &str = r#"{
    "assembly": "Shop",
    "types": [
        { "name": "Shop.Order", "data_contract": {},
          "members": [
            { "name": "Id", "type": "int", "data_member": {} },
            { "name": "Lines", "type": "Shop.Line[]", "data_member": {} }
          ] },
        { "name": "Shop.Line", "data_contract": {},
          "members": [ { "name": "Sku", "type": "string", "data_member": {} } ] }
    ]
}"#;

const BILLING: &str = r#"{
    "assembly": "Billing",
    "types": [
        { "name": "Billing.Invoice", "data_contract": {},
          "members": [ { "name": "Order", "type": "Shop.Order", "data_member": {} } ] }
    ]
}"#;

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("models/nested")).unwrap();
    fs::write(dir.path().join("models/shop.json"), SHOP).unwrap();
    fs::write(dir.path().join("models/nested/billing.json"), BILLING).unwrap();
    fs::write(dir.path().join("models/notes.txt"), "not a model").unwrap();
    dir
}

fn cli(dir: &Path, config: &str, extra: &[&str]) -> Cli {
    let config_path = dir.join(CONFIG_FILE_NAME);
    fs::write(&config_path, config).unwrap();
    let mut args: Vec<String> = vec!["--config".into(), config_path.display().to_string()];
    args.extend(extra.iter().map(|s| s.to_string()));
    args.push(dir.join("models").display().to_string());
    match parse_args(args).unwrap() {
        Command::Run(options) => Cli::new(options).unwrap(),
        other => panic!("unexpected command {:?}", other),
    }
}

fn run(cli: &Cli) -> (i32, String, String) {
    let (mut out, mut err) = (Vec::new(), Vec::new());
    let code = cli.run_with(&mut out, &mut err).unwrap();
    (code, String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
}

#[test]
fn test_models_across_files_resolve_together() {
    let dir = project();
    let cli = cli(dir.path(), "[output]\ncolor = false\n", &["--sequential"]);

    let files = cli.model_files().unwrap();
    assert_eq!(files.len(), 2);

    let (code, out, err) = run(&cli);
    assert_eq!(code, 0, "{}", err);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    let names: Vec<&str> = json["contracts"].as_array().unwrap().iter().filter_map(|c| c["type_name"].as_str()).collect();
    assert!(names.contains(&"Billing.Invoice"));
    assert!(names.contains(&"Shop.Line[]"));
    assert!(err.contains("0 errors"));
    assert!(!err.contains('\x1b'));
}

#[test]
fn test_exclude_patterns_from_config() {
    let dir = project();
    let config = "[paths]\ninclude = [\"**/*.json\"]\nexclude = [\"nested/**\"]\n";
    let cli = cli(dir.path(), config, &[]);
    let files = cli.model_files().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("shop.json"));
}

#[test]
fn test_text_output_with_root() {
    let dir = project();
    let cli = cli(dir.path(), "", &["--format", "text", "--root", "Shop.Line", "--no-color"]);
    let (code, out, _) = run(&cli);
    assert_eq!(code, 0);
    assert!(out.contains("Shop.Line"));
    assert!(!out.contains("Billing.Invoice"));
}

#[test]
fn test_flags_override_config() {
    let dir = project();
    let config = "[output]\nformat = \"text\"\n\n[diagnostics]\nmax_errors = 5\n";
    let cli = cli(dir.path(), config, &["--format", "json", "--max-errors", "2", "--workers", "4"]);
    assert_eq!(cli.config().output.format, OutputFormat::Json);
    assert_eq!(cli.config().diagnostics.max_errors, 2);
    assert_eq!(cli.config().resolve.workers, 4);
}

#[test]
fn test_unknown_root_is_an_error() {
    let dir = project();
    let cli = cli(dir.path(), "", &["--root", "Shop.Missing"]);
    let (mut out, mut err) = (Vec::new(), Vec::new());
    assert!(matches!(cli.run_with(&mut out, &mut err), Err(CliError::Model(_))));
}

#[test]
fn test_invalid_model_file() {
    let dir = project();
    fs::write(dir.path().join("models/broken.json"), "{ \"types\": [").unwrap();
    let cli = cli(dir.path(), "", &[]);
    let (mut out, mut err) = (Vec::new(), Vec::new());
    assert!(matches!(cli.run_with(&mut out, &mut err), Err(CliError::Model(_))));
}

#[test]
fn test_config_discovery_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a/b");
    fs::create_dir_all(&nested).unwrap();

    let mut config = Config::default();
    config.resolve.parallel = false;
    config.diagnostics.suppress = vec!["DCS103".to_string()];
    config.save(&dir.path().join(CONFIG_FILE_NAME)).unwrap();

    let discovered = Config::discover_from(&nested);
    assert_eq!(discovered, config);
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = project();
    let config_path = dir.path().join("bad.toml");
    fs::write(&config_path, "[resolve]\nparallel = \"sometimes\"\n").unwrap();
    let args = vec!["--config".to_string(), config_path.display().to_string(), "models".to_string()];
    let Command::Run(options) = parse_args(args).unwrap() else {
        panic!("expected run");
    };
    assert!(matches!(Cli::new(options), Err(CliError::Config(_))));
}
