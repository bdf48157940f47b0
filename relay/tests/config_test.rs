use std::collections::HashMap;
use std::time::Duration;

use sendmail_relay::config::{AppEnv, ConfigError, EnvConfig, HostType};
use sendmail_relay::RelayConfig;
use serde::Deserialize;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn required() -> Vec<(&'static str, &'static str)> {
    vec![
        ("HOST_NAME", "localhost"),
        ("SERVER_PORT", "3005"),
        ("MAIL_FROM", "no-reply@example.org"),
        ("MAIL_HOST_TYPE", "postfix"),
    ]
}

#[test]
fn loads_required_settings_with_defaults() {
    let config = RelayConfig::load_from(vars(&required())).unwrap();

    assert_eq!(config.host_name, "localhost");
    assert_eq!(config.server_port, 3005);
    assert_eq!(config.mail_from, "no-reply@example.org");
    assert_eq!(config.mail_host_type, HostType::Postfix);
    assert!(config.enable_send);
    assert_eq!(config.app_env, AppEnv::Development);
    assert_eq!(config.send_timeout(), Duration::from_secs(10));
    assert_eq!(config.ethereal_api_url, "https://api.nodemailer.com/user");
    assert_eq!(
        config.banner(),
        "sendmail-relay server running at http://localhost:3005/"
    );
}

#[test]
fn reads_optional_settings() {
    let mut pairs = required();
    pairs.extend([
        ("MAIL_HOST_TYPE", "ethereal"),
        ("ENABLE_SEND", "false"),
        ("APP_ENV", "production"),
        ("SEND_TIMEOUT_SECS", "3"),
    ]);
    let config = RelayConfig::load_from(vars(&pairs)).unwrap();

    assert_eq!(config.mail_host_type, HostType::Ethereal);
    assert!(!config.enable_send);
    assert_eq!(config.app_env, AppEnv::Production);
    assert_eq!(config.send_timeout(), Duration::from_secs(3));
}

#[test]
fn unknown_app_env_means_development() {
    let mut pairs = required();
    pairs.push(("APP_ENV", "staging"));
    let config = RelayConfig::load_from(vars(&pairs)).unwrap();
    assert_eq!(config.app_env, AppEnv::Development);
}

#[test]
fn app_env_values_are_case_sensitive() {
    for value in ["dev", "Production", "TEST"] {
        let mut pairs = required();
        pairs.push(("APP_ENV", value));
        let config = RelayConfig::load_from(vars(&pairs)).unwrap();
        assert_eq!(config.app_env, AppEnv::Development, "{value}");
    }
}

#[test]
fn empty_optional_settings_use_defaults() {
    let mut pairs = required();
    pairs.extend([("ENABLE_SEND", ""), ("APP_ENV", ""), ("SEND_TIMEOUT_SECS", "")]);
    let config = RelayConfig::load_from(vars(&pairs)).unwrap();

    assert!(config.enable_send);
    assert_eq!(config.app_env, AppEnv::Development);
    assert_eq!(config.send_timeout(), Duration::from_secs(10));
}

#[test]
fn zero_timeout_fails() {
    let mut pairs = required();
    pairs.push(("SEND_TIMEOUT_SECS", "0"));
    assert!(matches!(
        RelayConfig::load_from(vars(&pairs)),
        Err(ConfigError::ZeroTimeout)
    ));
}

#[test]
fn missing_required_settings_fail() {
    for missing in ["HOST_NAME", "SERVER_PORT", "MAIL_FROM", "MAIL_HOST_TYPE"] {
        let pairs: Vec<_> = required().into_iter().filter(|(k, _)| *k != missing).collect();
        let result = RelayConfig::load_from(vars(&pairs));
        assert!(matches!(result, Err(ConfigError::Env(_))), "{missing}");
    }
}

#[test]
fn unknown_host_type_fails_fast() {
    let mut pairs = required();
    pairs.push(("MAIL_HOST_TYPE", "sendgrid"));
    assert!(matches!(
        RelayConfig::load_from(vars(&pairs)),
        Err(ConfigError::Env(_))
    ));
}

#[test]
fn invalid_sender_fails() {
    let mut pairs = required();
    pairs.push(("MAIL_FROM", "not a mailbox"));
    assert!(matches!(
        RelayConfig::load_from(vars(&pairs)),
        Err(ConfigError::InvalidFrom(_))
    ));
}

#[test]
fn blank_host_name_fails() {
    let mut pairs = required();
    pairs.push(("HOST_NAME", " "));
    assert!(matches!(
        RelayConfig::load_from(vars(&pairs)),
        Err(ConfigError::Empty("HOST_NAME"))
    ));
}

#[derive(Debug, Deserialize, PartialEq)]
struct TestConfig {
    host: String,
    port: u16,
    debug: bool,
}

#[test]
fn env_config_with_prefix() {
    std::env::set_var("RELAYTEST_HOST", "0.0.0.0");
    std::env::set_var("RELAYTEST_PORT", "3000");
    std::env::set_var("RELAYTEST_DEBUG", "false");

    let config = TestConfig::from_env_with_prefix("RELAYTEST").unwrap();

    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 3000);
    assert!(!config.debug);

    std::env::remove_var("RELAYTEST_HOST");
    std::env::remove_var("RELAYTEST_PORT");
    std::env::remove_var("RELAYTEST_DEBUG");
}
