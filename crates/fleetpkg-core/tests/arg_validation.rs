//! Run configuration validation tests
//!
//! Covers mutual exclusions, mandatory parameters, numeric parsing, the
//! default verify policy and the batching capability probe.

use fleetpkg_core::broker::ScriptedBroker;
use fleetpkg_core::config::{BatchSpec, RawArgs, RunConfig, Settings, Verbosity};
use fleetpkg_core::error::ArgError;
use fleetpkg_core::types::FilterAttr;

// =============================================================================
// Test Helpers
// =============================================================================

fn base_args() -> RawArgs {
    RawArgs {
        hosts: vec!["web01".to_string()],
        packages: vec!["httpd.2.2.3-33".to_string()],
        ..RawArgs::default()
    }
}

fn validate(raw: RawArgs) -> Result<RunConfig, ArgError> {
    RunConfig::validate(raw, &Settings::default(), &ScriptedBroker::new())
}

// =============================================================================
// Mutual Exclusion Tests
// =============================================================================

#[test]
fn verbose_and_quiet_conflict() {
    let raw = RawArgs {
        verbose: true,
        quiet: true,
        ..base_args()
    };
    assert_eq!(validate(raw), Err(ArgError::Conflict("--verbose", "--quiet")));
}

#[test]
fn status_rejects_every_mutator() {
    let cases: Vec<(RawArgs, &str)> = vec![
        (
            RawArgs {
                downgrade: true,
                ..base_args()
            },
            "--downgrade",
        ),
        (
            RawArgs {
                verify: Some("true".into()),
                ..base_args()
            },
            "--verify",
        ),
        (
            RawArgs {
                verify: Some("false".into()),
                ..base_args()
            },
            "--verify",
        ),
        (
            RawArgs {
                pause: vec!["httpd".into()],
                ..base_args()
            },
            "--pause",
        ),
        (
            RawArgs {
                refresh: vec!["httpd".into()],
                ..base_args()
            },
            "--refresh",
        ),
    ];

    for (raw, flag) in cases {
        let raw = RawArgs {
            status: true,
            ..raw
        };
        assert_eq!(validate(raw), Err(ArgError::Conflict("--status", flag)));
    }
}

#[test]
fn status_alone_is_accepted() {
    let config = validate(RawArgs {
        status: true,
        ..base_args()
    })
    .unwrap();
    assert!(config.status_only());
}

// =============================================================================
// Mandatory Parameter Tests
// =============================================================================

#[test]
fn missing_host_is_rejected() {
    let raw = RawArgs {
        hosts: Vec::new(),
        ..base_args()
    };
    let err = validate(raw).unwrap_err();
    assert_eq!(err, ArgError::Missing("--host"));
    assert_eq!(err.to_string(), "missing required parameter: --host");
}

#[test]
fn missing_packages_are_rejected() {
    let raw = RawArgs {
        packages: Vec::new(),
        ..base_args()
    };
    assert_eq!(validate(raw), Err(ArgError::Missing("package")));
}

#[test]
fn missing_host_wins_over_otherwise_valid_flags() {
    let raw = RawArgs {
        hosts: Vec::new(),
        pause: vec!["httpd".into()],
        verify_timeout: Some("60".into()),
        downgrade: true,
        ..base_args()
    };
    assert_eq!(validate(raw), Err(ArgError::Missing("--host")));
}

// =============================================================================
// Numeric and Boolean Parsing Tests
// =============================================================================

#[test]
fn malformed_numbers_are_rejected() {
    for bad in ["abc", "-5", "+5", "1.5", "", " 10"] {
        let raw = RawArgs {
            verify_timeout: Some(bad.to_string()),
            ..base_args()
        };
        assert!(
            matches!(
                validate(raw),
                Err(ArgError::InvalidNumber {
                    flag: "--verifytimeout",
                    ..
                })
            ),
            "accepted {bad:?}"
        );
    }

    let raw = RawArgs {
        timeout: Some("two".into()),
        ..base_args()
    };
    assert!(matches!(
        validate(raw),
        Err(ArgError::InvalidNumber {
            flag: "--timeout",
            ..
        })
    ));
}

#[test]
fn numeric_defaults_come_from_settings() {
    let config = validate(base_args()).unwrap();
    assert_eq!(config.timeout_secs(), 2);
    assert_eq!(config.verify_timeout_secs(), 120);

    let settings = Settings {
        verify_timeout_secs: 30,
        ..Settings::default()
    };
    let config = RunConfig::validate(base_args(), &settings, &ScriptedBroker::new()).unwrap();
    assert_eq!(config.verify_timeout_secs(), 30);
}

#[test]
fn explicit_numbers_override_defaults() {
    let raw = RawArgs {
        timeout: Some("0".into()),
        verify_timeout: Some("300".into()),
        ..base_args()
    };
    let config = validate(raw).unwrap();
    assert_eq!(config.timeout_secs(), 0);
    assert_eq!(config.verify_timeout_secs(), 300);
}

#[test]
fn verify_accepts_only_true_or_false() {
    let raw = RawArgs {
        verify: Some("yes".into()),
        ..base_args()
    };
    assert_eq!(validate(raw), Err(ArgError::InvalidBoolean("yes".into())));
}

// =============================================================================
// Verify Policy Tests
// =============================================================================

#[test]
fn verify_defaults_on_when_a_version_is_given() {
    let raw = RawArgs {
        packages: vec!["php".into(), "httpd.2.2.3-33".into()],
        ..base_args()
    };
    assert!(validate(raw).unwrap().verify());
}

#[test]
fn verify_defaults_off_without_versions() {
    let raw = RawArgs {
        packages: vec!["httpd".into()],
        ..base_args()
    };
    assert!(!validate(raw).unwrap().verify());
}

#[test]
fn explicit_verify_false_overrides_default() {
    let raw = RawArgs {
        verify: Some("false".into()),
        ..base_args()
    };
    assert!(!validate(raw).unwrap().verify());
}

#[test]
fn versionless_package_is_never_verified() {
    let raw = RawArgs {
        packages: vec!["httpd".into(), "php.5.1.6-27".into()],
        verify: Some("true".into()),
        ..base_args()
    };
    let config = validate(raw).unwrap();
    assert!(config.verify());
    assert!(!config.verifies(&config.packages()[0]));
    assert!(config.verifies(&config.packages()[1]));
}

// =============================================================================
// List Handling Tests
// =============================================================================

#[test]
fn list_flags_accumulate_in_order_with_duplicates() {
    let raw = RawArgs {
        hosts: vec!["a,b".into(), "c.example.com".into(), "a".into()],
        pause: vec!["httpd,tomcat".into(), "httpd".into()],
        refresh: vec!["nscd".into()],
        ..base_args()
    };
    let config = validate(raw).unwrap();

    let hosts: Vec<&str> = config.hosts().iter().map(|h| h.pattern()).collect();
    assert_eq!(hosts, vec!["a", "b", "c.example.com", "a"]);
    assert_eq!(config.hosts()[2].attr(), FilterAttr::Fqdn);
    assert_eq!(config.pause_services(), ["httpd", "tomcat", "httpd"]);
    assert_eq!(config.refresh_services(), ["nscd"]);
}

#[test]
fn empty_list_items_are_rejected() {
    let raw = RawArgs {
        hosts: vec!["a,".into()],
        ..base_args()
    };
    assert_eq!(validate(raw), Err(ArgError::EmptyItem { flag: "--host" }));
}

#[test]
fn invalid_package_token_is_rejected() {
    let raw = RawArgs {
        packages: vec!["httpd.".into()],
        ..base_args()
    };
    assert!(matches!(validate(raw), Err(ArgError::InvalidPackage { .. })));
}

#[test]
fn verbosity_is_derived_from_flags() {
    assert_eq!(validate(base_args()).unwrap().verbosity(), Verbosity::Normal);
    let verbose = RawArgs {
        verbose: true,
        ..base_args()
    };
    assert_eq!(validate(verbose).unwrap().verbosity(), Verbosity::Verbose);
    let quiet = RawArgs {
        quiet: true,
        ..base_args()
    };
    assert_eq!(validate(quiet).unwrap().verbosity(), Verbosity::Quiet);
}

// =============================================================================
// Batch Capability Tests
// =============================================================================

#[test]
fn batch_requires_broker_support() {
    let raw = RawArgs {
        batch: Some("10,30".into()),
        ..base_args()
    };
    let unsupported = ScriptedBroker::new().with_batching(false);
    assert_eq!(
        RunConfig::validate(raw, &Settings::default(), &unsupported),
        Err(ArgError::BatchUnsupported)
    );
}

#[test]
fn batch_is_accepted_when_supported() {
    let raw = RawArgs {
        batch: Some("10,30".into()),
        ..base_args()
    };
    let supported = ScriptedBroker::new().with_batching(true);
    let config = RunConfig::validate(raw, &Settings::default(), &supported).unwrap();
    assert_eq!(
        config.batch(),
        Some(BatchSpec {
            agents: 10,
            pause_secs: Some(30)
        })
    );
}

#[test]
fn batch_with_bad_count_is_rejected() {
    let raw = RawArgs {
        batch: Some("many".into()),
        ..base_args()
    };
    let supported = ScriptedBroker::new().with_batching(true);
    assert_eq!(
        RunConfig::validate(raw, &Settings::default(), &supported),
        Err(ArgError::InvalidBatch("many".into()))
    );
}
