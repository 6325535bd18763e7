use super::*;

const BASE: &str = "https://downloads.example.test/releases/";

#[test]
fn parse_version_label() {
    let version = PhpVersion::parse("8.3").expect("label should parse");
    assert_eq!(version.as_str(), "8.3");
    assert_eq!(version.dir_name(), "v8.3");
    assert_eq!(version.to_string(), "8.3");
}

#[test]
fn parse_version_label_rejects_malformed_input() {
    for input in ["", "8", "8.", ".3", "8.3.1", "v8.3", "8.x", " 8.3", "8.3 ", "../8.3"] {
        let err = PhpVersion::parse(input).expect_err("label must be rejected");
        assert!(
            matches!(err, PvmError::InvalidVersion { .. }),
            "unexpected error for {input:?}: {err}"
        );
        assert_eq!(err.kind(), FailureKind::UserInput);
    }
}

#[test]
fn version_dir_name_round_trip() {
    let version = PhpVersion::from_dir_name("v7.4").expect("dir name should parse");
    assert_eq!(version.as_str(), "7.4");
    assert!(PhpVersion::from_dir_name("7.4").is_none());
    assert!(PhpVersion::from_dir_name("v7").is_none());
    assert!(PhpVersion::from_dir_name("vx.y").is_none());
}

#[test]
fn versions_order_numerically() {
    let mut versions = ["8.10", "7.4", "8.2", "8.0"]
        .iter()
        .map(|label| PhpVersion::parse(label).expect("valid label"))
        .collect::<Vec<_>>();
    versions.sort();
    let labels = versions.iter().map(PhpVersion::as_str).collect::<Vec<_>>();
    assert_eq!(labels, vec!["7.4", "8.0", "8.2", "8.10"]);
}

#[test]
fn reported_version_reads_major_minor_from_first_line() {
    let output = "PHP 8.2.12 (cli) (built: Oct 24 2023 21:15:15) (NTS Visual C++ 2019 x64)\nCopyright (c) The PHP Group\nZend Engine v4.2.12\n";
    assert_eq!(
        parse_reported_version(output),
        ActiveVersion::Known("8.2".to_string())
    );
}

#[test]
fn reported_version_is_unknown_for_unrelated_output() {
    assert_eq!(parse_reported_version(""), ActiveVersion::Unknown);
    assert_eq!(
        parse_reported_version("'php' is not recognized as an internal or external command"),
        ActiveVersion::Unknown
    );
    assert_eq!(parse_reported_version("PHP version"), ActiveVersion::Unknown);
    assert_eq!(
        parse_reported_version("Copyright\nPHP 8.1.0 (cli)"),
        ActiveVersion::Unknown,
        "only the first line is considered"
    );
    assert_eq!(ActiveVersion::Unknown.as_str(), "unknown");
}

#[test]
fn active_version_matches_label() {
    let version = PhpVersion::parse("8.0").expect("valid label");
    assert!(ActiveVersion::Known("8.0".to_string()).matches(&version));
    assert!(!ActiveVersion::Known("8.1".to_string()).matches(&version));
    assert!(!ActiveVersion::Unknown.matches(&version));
}

#[test]
fn host_arch_mapping() {
    assert_eq!(HostArch::from_target_arch("x86"), HostArch::X86);
    assert_eq!(HostArch::from_target_arch("x86_64"), HostArch::X64);
    assert_eq!(HostArch::from_target_arch("aarch64"), HostArch::X64);
    assert_eq!(HostArch::from_target_arch("riscv64"), HostArch::X64);
}

#[test]
fn host_arch_variant_filter_requires_nts_prefix_and_arch_suffix() {
    assert!(HostArch::X64.matches_variant("nts-vs16-x64"));
    assert!(!HostArch::X64.matches_variant("ts-vs16-x64"));
    assert!(!HostArch::X64.matches_variant("nts-vs16-x86"));
    assert!(!HostArch::X64.matches_variant("nts-vs16-x64-debug"));
    assert!(HostArch::X86.matches_variant("nts-vc15-x86"));
}

#[test]
fn catalog_scenario_resolves_single_artifact() {
    let input =
        r#"{"8.0": {"nts-x64": {"zip": {"path": "p.zip", "size": "10", "sha256": "abc"}}}}"#;
    let catalog = ReleaseCatalog::from_json_str(input, BASE, HostArch::X64).expect("must parse");

    assert_eq!(catalog.len(), 1);
    assert_eq!(
        catalog.get("8.0"),
        Some(&ReleaseArtifact {
            path: format!("{BASE}p.zip"),
            size: "10".to_string(),
            sha256: "abc".to_string(),
        })
    );
}

#[test]
fn catalog_filters_by_arch_and_thread_safety() {
    let input = r#"{
        "8.3": {
            "version": "8.3.12",
            "source": {"path": "php-8.3.12-src.zip", "size": "25.6MB"},
            "ts-vs16-x64": {"mtime": "2024-09-24", "zip": {"path": "php-8.3.12-Win32-vs16-x64.zip", "size": "31MB", "sha256": "ts64"}},
            "nts-vs16-x64": {"mtime": "2024-09-24", "zip": {"path": "php-8.3.12-nts-Win32-vs16-x64.zip", "size": "30MB", "sha256": "nts64"}, "debug_pack": {"path": "dbg.zip", "size": "1MB", "sha256": "d"}},
            "nts-vs16-x86": {"zip": {"path": "php-8.3.12-nts-Win32-vs16-x86.zip", "size": "28MB", "sha256": "nts86"}}
        },
        "7.4": {
            "version": "7.4.33",
            "ts-vc15-x64": {"zip": {"path": "php-7.4.33-Win32-vc15-x64.zip", "size": "25MB", "sha256": "old-ts"}}
        }
    }"#;

    let x64 = ReleaseCatalog::from_json_str(input, BASE, HostArch::X64).expect("must parse");
    assert_eq!(x64.len(), 1, "7.4 has no nts x64 artifact and must be dropped");
    let release = x64.release("8.3").expect("8.3 must resolve");
    assert_eq!(release.full_version.as_deref(), Some("8.3.12"));
    assert_eq!(release.artifact.sha256, "nts64");
    assert!(release.artifact.path.ends_with("php-8.3.12-nts-Win32-vs16-x64.zip"));
    assert!(x64.get("7.4").is_none());

    let x86 = ReleaseCatalog::from_json_str(input, BASE, HostArch::X86).expect("must parse");
    assert_eq!(x86.get("8.3").map(|a| a.sha256.as_str()), Some("nts86"));
}

#[test]
fn catalog_last_matching_variant_wins() {
    let input = r#"{"8.1": {
        "nts-vs16-x64": {"zip": {"path": "a.zip", "size": "1", "sha256": "a"}},
        "nts-vs17-x64": {"zip": {"path": "b.zip", "size": "2", "sha256": "b"}}
    }}"#;
    let catalog = ReleaseCatalog::from_json_str(input, BASE, HostArch::X64).expect("must parse");
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.get("8.1").map(|a| a.sha256.as_str()), Some("b"));
}

#[test]
fn catalog_rejects_malformed_matching_variant() {
    let input = r#"{"8.0": {"nts-x64": {"zip": {"path": "p.zip", "size": 10}}}}"#;
    let err = ReleaseCatalog::from_json_str(input, BASE, HostArch::X64)
        .expect_err("shape mismatch must fail");
    assert!(
        format!("{err:#}").contains("invalid artifact entry for release '8.0' variant 'nts-x64'"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn catalog_rejects_invalid_json() {
    let err = ReleaseCatalog::from_json_str("<html>503</html>", BASE, HostArch::X64)
        .expect_err("non-json must fail");
    assert!(err.to_string().contains("failed to parse PHP release catalog"));
}

#[test]
fn catalog_labels_sort_newest_first() {
    let input = r#"{
        "8.2": {"nts-x64": {"zip": {"path": "a.zip", "size": "1", "sha256": "a"}}},
        "8.10": {"nts-x64": {"zip": {"path": "b.zip", "size": "1", "sha256": "b"}}},
        "7.4": {"nts-x64": {"zip": {"path": "c.zip", "size": "1", "sha256": "c"}}}
    }"#;
    let catalog = ReleaseCatalog::from_json_str(input, BASE, HostArch::X64).expect("must parse");
    assert_eq!(catalog.labels(), vec!["8.10", "8.2", "7.4"]);
}

#[test]
fn error_kinds_pick_warning_label_for_user_mistakes() {
    let warning = PvmError::AlreadyInstalled {
        version: "8.0".to_string(),
    };
    assert!(warning.is_warning());
    assert_eq!(warning.to_string(), "PHP v8.0 is already installed.");

    let failure = PvmError::Download {
        version: "8.0".to_string(),
        source: anyhow::anyhow!("connection reset").into(),
    };
    assert!(!failure.is_warning());
    assert_eq!(failure.kind(), FailureKind::Transport);
    assert_eq!(
        std::error::Error::source(&failure).map(ToString::to_string),
        Some("connection reset".to_string())
    );

    let missing = PvmError::MissingEnv { name: "PVM_ROOT" };
    assert_eq!(missing.kind(), FailureKind::Configuration);
}

#[test]
fn lookup_failures_are_errors_not_warnings() {
    let unknown = PvmError::UnknownRelease {
        version: "5.6".to_string(),
    };
    let invalid = PvmError::InvalidVersion {
        input: "8.x".to_string(),
    };
    let not_installed = PvmError::NotInstalled {
        version: "8.2".to_string(),
    };
    for err in [&unknown, &invalid, &not_installed] {
        assert!(!err.is_warning(), "{err} must render as an error");
    }

    for warning in [
        PvmError::MissingArgument { verb: "use" },
        PvmError::ActiveVersion {
            version: "8.0".to_string(),
        },
        PvmError::NoInstalledVersions,
        PvmError::EmptyCatalog {
            url: "https://downloads.example.test/releases.json".to_string(),
        },
    ] {
        assert!(warning.is_warning(), "{warning} must render as a warning");
    }
}
