use assert_cmd::cargo::cargo_bin_cmd;

fn help_for(args: &[&str]) -> String {
    let mut cmd = cargo_bin_cmd!("impactctl");
    let output = cmd
        .args(args)
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8_lossy(&output).into_owned()
}

#[test]
fn top_level_help_lists_workflows() {
    let text = help_for(&[]);
    for command in ["asset", "group", "abaca-asset", "abaca-cohort", "reference", "probe", "check"] {
        assert!(text.contains(command), "top-level help missing {command}");
    }
}

#[test]
fn asset_help_mentions_input_and_regenerate() {
    let text = help_for(&["asset"]);
    assert!(text.contains("--input"), "asset help missing --input");
    assert!(text.contains("--regenerate"), "asset help missing --regenerate");
}

#[test]
fn probe_help_mentions_descriptor_fields() {
    let text = help_for(&["probe"]);
    for flag in ["--name", "--industry", "--country", "--employees"] {
        assert!(text.contains(flag), "probe help missing {flag}");
    }
}

#[test]
fn check_fails_without_api_key() {
    let dir = std::env::temp_dir();
    let mut cmd = cargo_bin_cmd!("impactctl");
    cmd.env_remove("VESTED_API_KEY")
        .env_remove("IMPACT_CONFIG_PATH")
        .arg("--env-file")
        .arg(dir.join("impactctl-no-such.env"))
        .arg("check")
        .assert()
        .failure();
}
