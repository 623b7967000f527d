// logveil-core/tests/config_tests.rs
use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use tempfile::NamedTempFile;

use logveil_core::{FilterConfig, PresetTier, REDACTED};

#[test]
fn test_default_config_builds_full_filter() -> Result<()> {
    let config = FilterConfig::default();
    assert_eq!(config.tier, PresetTier::Full);
    let filter = config.build()?;
    assert!(filter.is_enabled());
    assert!(filter.pattern_count() >= 20);
    Ok(())
}

#[test]
fn test_load_from_file() -> Result<()> {
    let yaml_content = r#"
tier: basic
patterns:
  - '(?i)employee_id=(\d+)'
  - 'INTERNAL-[A-Z]{4}'
limits:
  timeout_ms: 250
  max_input_length: 4096
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;

    let config = FilterConfig::load_from_file(file.path())?;
    assert_eq!(config.tier, PresetTier::Basic);
    assert_eq!(config.patterns.len(), 2);

    let filter = config.build()?;
    assert_eq!(filter.limits().timeout, Duration::from_millis(250));
    assert_eq!(filter.limits().max_input_length, 4096);
    assert_eq!(
        filter.filter("employee_id=4411 code INTERNAL-ABCD"),
        format!("employee_id={} code {}", REDACTED, REDACTED)
    );
    Ok(())
}

#[test]
fn test_disabled_in_config() -> Result<()> {
    let config = FilterConfig::from_yaml("enabled: false\ntier: none\n")?;
    let filter = config.build()?;
    assert!(!filter.is_enabled());
    assert_eq!(filter.pattern_count(), 0);
    Ok(())
}

#[test]
fn test_invalid_patterns_reported_together() {
    let yaml_content = "patterns:\n  - '(a+)+b'\n  - ''\n  - 'fine'\n";
    let err = FilterConfig::from_yaml(yaml_content).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Pattern #0"), "{}", message);
    assert!(message.contains("Pattern #1"), "{}", message);
    assert!(!message.contains("Pattern #2"), "{}", message);
}

#[test]
fn test_unknown_field_rejected() {
    assert!(FilterConfig::from_yaml("tier: full\nbogus: 1\n").is_err());
    assert!(FilterConfig::from_yaml("tier: extreme\n").is_err());
}

#[test]
fn test_missing_file() {
    let err = FilterConfig::load_from_file("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
