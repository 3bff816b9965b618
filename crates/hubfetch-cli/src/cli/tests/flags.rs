//! Tests for flag names, defaults and the proxy value rule.

use super::parse;
use crate::cli::{Cli, DEFAULT_MODEL};
use clap::{CommandFactory, Parser};
use hubfetch_core::hub::RepoType;
use hubfetch_core::proxy::DEFAULT_PROXY_ADDR;
use std::path::Path;

#[test]
fn cli_defaults() {
    let cli = parse(&["hubfetch"]);
    assert_eq!(cli.model, DEFAULT_MODEL);
    assert_eq!(cli.path, Path::new("./"));
    assert_eq!(cli.max_retry, 10);
    assert!(!cli.proxy);
    assert_eq!(cli.proxy_addr, DEFAULT_PROXY_ADDR);
    assert_eq!(cli.repo_type, RepoType::Dataset);
    assert_eq!(cli.revision, "main");
    assert!(!cli.fail_fast);
}

#[test]
fn cli_underscore_flags() {
    let cli = parse(&[
        "hubfetch",
        "--model",
        "org/data",
        "--path",
        "/tmp/out",
        "--max_retry",
        "3",
        "--proxy_addr",
        "http://10.0.0.2:3128",
        "--repo_type",
        "model",
        "--revision",
        "v1.0",
        "--fail_fast",
    ]);
    assert_eq!(cli.model, "org/data");
    assert_eq!(cli.path, Path::new("/tmp/out"));
    assert_eq!(cli.max_retry, 3);
    assert_eq!(cli.proxy_addr, "http://10.0.0.2:3128");
    assert_eq!(cli.repo_type, RepoType::Model);
    assert_eq!(cli.revision, "v1.0");
    assert!(cli.fail_fast);
}

#[test]
fn cli_proxy_values_containing_y_enable() {
    for v in ["True", "yes", "Y", "nay"] {
        assert!(parse(&["hubfetch", "--proxy", v]).proxy, "{}", v);
    }
    for v in ["no", "false", "0"] {
        assert!(!parse(&["hubfetch", "--proxy", v]).proxy, "{}", v);
    }
}

#[test]
fn cli_proxy_requires_value() {
    assert!(Cli::try_parse_from(["hubfetch", "--proxy"]).is_err());
}

#[test]
fn cli_proxy_help_says_env_is_not_exported() {
    let cmd = Cli::command();
    let proxy = cmd
        .get_arguments()
        .find(|a| a.get_id() == "proxy")
        .expect("--proxy argument");
    let help = proxy.get_long_help().expect("long help").to_string();
    assert!(help.contains("http_proxy"), "{}", help);
    assert!(help.contains("not exported"), "{}", help);
}

#[test]
fn cli_rejects_negative_retry_and_unknown_type() {
    assert!(Cli::try_parse_from(["hubfetch", "--max_retry", "-1"]).is_err());
    assert!(Cli::try_parse_from(["hubfetch", "--repo_type", "kernel"]).is_err());
}
