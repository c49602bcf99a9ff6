//! Integration tests for config loading from fixture files.
//!
//! These tests verify that the sample config file has every section and key the tools read.

use std::fs;
use std::path::Path;

/// Read the sample config file content.
fn read_sample_config() -> String {
    let config_path = Path::new("tests/fixtures/sample_config.toml");
    fs::read_to_string(config_path).expect("Failed to read sample config file")
}

fn sample_config_value() -> toml::Value {
    toml::from_str(&read_sample_config()).expect("should parse")
}

#[test]
fn sample_config_file_exists() {
    let config_path = Path::new("tests/fixtures/sample_config.toml");
    assert!(config_path.exists(), "Sample config file should exist");
}

#[test]
fn sample_config_is_valid_toml() {
    let config_content = read_sample_config();
    let result: Result<toml::Value, _> = toml::from_str(&config_content);
    assert!(result.is_ok(), "Sample config should be valid TOML: {:?}", result.err());
}

#[test]
fn sample_config_has_all_sections() {
    let value = sample_config_value();
    let table = value.as_table().expect("should be a table");

    for section in ["proxyprint", "setcode"] {
        assert!(table.contains_key(section), "Config should have [{section}] section");
    }
}

#[test]
fn proxyprint_section_has_expected_structure() {
    let value = sample_config_value();
    let proxyprint = value.get("proxyprint").expect("should have proxyprint section");

    for key in [
        "images_dir",
        "decks_dir",
        "output_dir",
        "page_size",
        "card_width",
        "card_height",
        "spacing_x",
        "spacing_y",
        "fill",
        "missing",
        "delay_ms",
        "api_url",
        "offline",
        "no_overview",
        "verbose",
    ] {
        assert!(proxyprint.get(key).is_some(), "[proxyprint] should have key {key}");
    }
}

#[test]
fn setcode_section_has_expected_structure() {
    let value = sample_config_value();
    let setcode = value.get("setcode").expect("should have setcode section");

    for key in ["decks_dir", "output_dir", "delay_ms", "api_url", "yes", "verbose"] {
        assert!(setcode.get(key).is_some(), "[setcode] should have key {key}");
    }
}

#[test]
fn config_values_have_correct_types() {
    let value = sample_config_value();

    // Check boolean types
    let proxyprint = value.get("proxyprint").expect("should have proxyprint section");
    assert!(proxyprint.get("offline").unwrap().is_bool());
    assert!(proxyprint.get("no_overview").unwrap().is_bool());
    let setcode = value.get("setcode").expect("should have setcode section");
    assert!(setcode.get("yes").unwrap().is_bool());

    // Check integer types
    assert!(proxyprint.get("delay_ms").unwrap().is_integer());
    assert!(setcode.get("delay_ms").unwrap().is_integer());

    // Check float types
    assert!(proxyprint.get("card_width").unwrap().is_float());
    assert!(proxyprint.get("spacing_y").unwrap().is_float());

    // Check string types
    assert!(proxyprint.get("page_size").unwrap().is_str());
    assert!(proxyprint.get("fill").unwrap().is_str());
    assert!(proxyprint.get("missing").unwrap().is_str());
}

#[test]
fn sample_config_values_are_usable() {
    let value = sample_config_value();
    let proxyprint = value.get("proxyprint").expect("should have proxyprint section");

    let fill = proxyprint.get("fill").and_then(toml::Value::as_str).expect("fill");
    assert!(fill.parse::<proxy_printer::layout::Rgb>().is_ok());

    let page_size = proxyprint.get("page_size").expect("page_size").clone();
    let page_size: proxy_printer::layout::PageSize = page_size.try_into().expect("should be a page size");
    assert_eq!(page_size, proxy_printer::layout::PageSize::A4);

    let missing = proxyprint.get("missing").expect("missing").clone();
    let missing: proxy_printer::render::MissingImage = missing.try_into().expect("should be a missing image policy");
    assert_eq!(missing, proxy_printer::render::MissingImage::Placeholder);
}
