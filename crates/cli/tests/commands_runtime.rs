use std::env;
use std::sync::{Mutex, OnceLock};

use fruitlink_cli::commands::matches::MatchTarget;
use fruitlink_cli::commands::{certifications, chat, config, directory, forecast, matches};
use fruitlink_core::directory::{BuyerFilter, SupplierFilter};
use fruitlink_core::domain::buyer::Volume;
use serde_json::Value;

#[test]
fn forecast_reports_prediction_payload() {
    let result = forecast::run("Mango");
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "forecast");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["data"]["fruit"], "mango");
    assert_eq!(payload["data"]["forecast"].as_array().map(Vec::len), Some(6));
}

#[test]
fn forecast_rejects_blank_fruit() {
    let result = forecast::run("  ");
    assert_eq!(result.exit_code, 2);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "invalid_input");
}

#[test]
fn supplier_listing_applies_filters() {
    let result = directory::suppliers(&SupplierFilter {
        fruit: Some("banana".to_string()),
        ..SupplierFilter::default()
    });
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["message"], "2 of 4 suppliers match");
    let names = payload["data"]
        .as_array()
        .map(|suppliers| suppliers.iter().filter_map(|supplier| supplier["name"].as_str()).collect::<Vec<_>>())
        .unwrap_or_default();
    assert_eq!(names, vec!["PT Nusantara Segar Abadi", "Truong Ton"]);
}

#[test]
fn buyer_listing_filters_by_volume() {
    let result =
        directory::buyers(&BuyerFilter { volume: Some(Volume::Medium), ..BuyerFilter::default() });

    let payload = parse_payload(&result.output);
    assert_eq!(payload["message"], "2 of 4 buyers match");
}

#[test]
fn buyer_matches_include_risk() {
    with_env(&[], || {
        let result = matches::run(&MatchTarget::Buyer("1".to_string()));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["suppliers"].as_array().map(Vec::len), Some(2));
        assert_eq!(payload["data"]["risk"]["level"], "Medium");
    });
}

#[test]
fn unknown_supplier_is_not_found() {
    with_env(&[], || {
        let result = matches::run(&MatchTarget::Supplier("99".to_string()));
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "not_found");
    });
}

#[test]
fn matches_fail_on_invalid_config() {
    with_env(&[("FRUITLINK_LLM_PROVIDER", "openai")], || {
        let result = matches::run(&MatchTarget::Buyer("1".to_string()));
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn chat_against_unreachable_server_reports_service_error() {
    with_env(&[("FRUITLINK_COLLABORATOR_TIMEOUT_SECS", "2")], || {
        let result = chat::run("hello there", Some("http://127.0.0.1:9"));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["message"], "Sorry, there was an error connecting to the AI service.");
        assert_eq!(payload["data"]["intent"], "conversation");
        assert!(payload["data"]["action"].is_null());
    });
}

#[test]
fn certification_lookup_against_unreachable_server_fails_cleanly() {
    with_env(&[("FRUITLINK_COLLABORATOR_TIMEOUT_SECS", "2")], || {
        let result = certifications::run("Truong Ton", Some("http://127.0.0.1:9"));
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "certifications");
        assert_eq!(payload["error_class"], "collaborator_unavailable");
    });
}

#[test]
fn certification_lookup_rejects_blank_name() {
    let result = certifications::run("   ", None);
    assert_eq!(result.exit_code, 2);
    assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");
}

#[test]
fn config_reports_env_source_and_redacts_secrets() {
    with_env(&[("FRUITLINK_SERVER_PORT", "4100"), ("FRUITLINK_LLM_API_KEY", "sk-live-secret")], || {
        let output = config::run();

        assert!(output.contains("- server.port = 4100 (source: env (FRUITLINK_SERVER_PORT))"));
        assert!(output.contains("- llm.api_key = <redacted>"));
        assert!(!output.contains("sk-live-secret"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "FRUITLINK_SERVER_PORT",
        "FRUITLINK_COLLABORATOR_BASE_URL",
        "FRUITLINK_COLLABORATOR_TIMEOUT_SECS",
        "FRUITLINK_LLM_PROVIDER",
        "FRUITLINK_LLM_API_KEY",
        "FRUITLINK_MATCHING_NORMALIZE_FRUIT_NAMES",
        "FRUITLINK_LOGGING_LEVEL",
        "FRUITLINK_LOG_LEVEL",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
