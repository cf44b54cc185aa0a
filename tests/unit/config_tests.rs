use photomark::config::{AppConfig, LogFormat};
use photomark::imaging::OutputFormat;
use std::fs;
use std::path::PathBuf;

#[test]
fn test_load_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photomark.yaml");
    fs::write(
        &path,
        r#"
output:
  format: webp
  prefix: "wm_"
logging:
  format: json
"#,
    )
    .unwrap();

    let config = AppConfig::from_file(&path).unwrap();
    assert_eq!(config.output.format, OutputFormat::WebP);
    assert_eq!(config.output.prefix, "wm_");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.templates.dir, PathBuf::from("templates"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_unknown_output_format_is_rejected() {
    let result = AppConfig::from_yaml_with_env("output:\n  format: gif\n");
    assert!(result.is_err());
}

#[test]
fn test_out_of_range_quality_fails_validation() {
    let config = AppConfig::from_yaml_with_env("output:\n  quality: 101\n").unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_round_trips_through_yaml() {
    let mut config = AppConfig::default();
    config.fonts.system_fonts = false;
    config.batch.cancel_timeout_ms = 1500;

    let yaml = serde_yaml::to_string(&config).unwrap();
    assert_eq!(AppConfig::from_yaml_with_env(&yaml).unwrap(), config);
}
