//! Runs the utility as a user would
// (c) 2026 The unirpc developers

use std::io::Write as _;

use rstest::rstest;

#[rstest]
#[case::greeting(&["loopback", "--name", "tester"], true)]
#[case::no_request(&["loopback", "--no-request"], false)]
#[case::garbage(&["loopback", "--garbage"], false)]
#[case::empty_name(&["loopback", "--name", ""], false)]
#[case::told_to_fail(&["loopback", "--fail", "not_found", "--message", "nobody home"], false)]
#[case::told_ok(&["loopback", "--fail", "ok"], true)]
fn loopback_exit_status(#[case] args: &[&str], #[case] expected: bool) {
    let argv = std::iter::once("unirpct").chain(args.iter().copied());
    assert_eq!(unirpct::run(argv).unwrap(), expected);
}

#[test]
fn help_and_version_succeed() {
    assert!(unirpct::run(["unirpct", "--help"]).unwrap());
    assert!(unirpct::run(["unirpct", "--version"]).unwrap());
}

#[test]
fn bad_arguments_fail() {
    let _ = unirpct::run(["unirpct"]).unwrap_err();
    let _ = unirpct::run(["unirpct", "loopback", "--no-request", "--garbage"]).unwrap_err();
}

#[test]
fn config_file_is_honoured() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    // Far too small for any request
    writeln!(file, "max_request_size = 1").unwrap();
    let path = file.path().to_str().unwrap();
    assert!(!unirpct::run(["unirpct", "--config", path, "loopback"]).unwrap());
}

#[test]
fn invalid_config_is_an_error() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "max_request_size = 0").unwrap();
    let path = file.path().to_str().unwrap();
    let err = unirpct::run(["unirpct", "--config", path, "loopback"]).unwrap_err();
    assertables::assert_contains!(format!("{err:#}"), "max_request_size");
}
