use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["snoowatch-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["snoowatch-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn ingest_defaults_to_persisting() {
    let cli = Cli::try_parse_from(["snoowatch-cli", "ingest"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Ingest { dry_run: false })
    ));
}

#[test]
fn ingest_dry_run_flag() {
    let cli = Cli::try_parse_from(["snoowatch-cli", "ingest", "--dry-run"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Ingest { dry_run: true })));
}

#[test]
fn stats_keyword_limit_defaults_to_ten() {
    let cli = Cli::try_parse_from(["snoowatch-cli", "stats"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Stats { keywords: 10 })));
}

#[test]
fn parses_reset_ignored() {
    let cli = Cli::try_parse_from(["snoowatch-cli", "reset-ignored"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::ResetIgnored)));
}

#[test]
fn parses_tag_with_score() {
    let cli = Cli::try_parse_from([
        "snoowatch-cli",
        "tag",
        "t3_abc",
        "--label",
        "Negative",
        "--score",
        "12",
        "--by",
        "reviewer",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Tag {
            ref id,
            label: Label::Negative,
            score: Some(12),
            ref by,
        }) if id == "t3_abc" && by == "reviewer"
    ));
}

#[test]
fn tag_score_is_optional() {
    let cli = Cli::try_parse_from([
        "snoowatch-cli",
        "tag",
        "t1_x",
        "--label",
        "neutral",
        "--by",
        "ops",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Tag {
            label: Label::Neutral,
            score: None,
            ..
        })
    ));
}

#[test]
fn tag_rejects_unknown_label() {
    let result = Cli::try_parse_from([
        "snoowatch-cli",
        "tag",
        "t1_x",
        "--label",
        "furious",
        "--by",
        "ops",
    ]);
    assert!(result.is_err());
}

#[test]
fn tag_rejects_out_of_range_score() {
    let result = Cli::try_parse_from([
        "snoowatch-cli",
        "tag",
        "t1_x",
        "--label",
        "positive",
        "--score",
        "0",
        "--by",
        "ops",
    ]);
    assert!(result.is_err());
}

#[test]
fn tag_requires_reviewer() {
    let result = Cli::try_parse_from(["snoowatch-cli", "tag", "t1_x", "--label", "positive"]);
    assert!(result.is_err());
}

#[test]
fn ignore_and_undo() {
    let set = Cli::try_parse_from(["snoowatch-cli", "ignore", "t3_a"]).unwrap();
    assert!(matches!(
        set.command,
        Some(Commands::Ignore { undo: false, .. })
    ));

    let undo = Cli::try_parse_from(["snoowatch-cli", "ignore", "t3_a", "--undo"]).unwrap();
    assert!(matches!(
        undo.command,
        Some(Commands::Ignore { ref id, undo: true }) if id == "t3_a"
    ));
}

#[test]
fn urgent_requires_id() {
    assert!(Cli::try_parse_from(["snoowatch-cli", "urgent"]).is_err());
    let cli = Cli::try_parse_from(["snoowatch-cli", "urgent", "t1_z"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Urgent { undo: false, .. })
    ));
}

#[test]
fn runs_limit() {
    let default = Cli::try_parse_from(["snoowatch-cli", "runs"]).unwrap();
    assert!(matches!(default.command, Some(Commands::Runs { limit: 20 })));

    let custom = Cli::try_parse_from(["snoowatch-cli", "runs", "--limit", "5"]).unwrap();
    assert!(matches!(custom.command, Some(Commands::Runs { limit: 5 })));
}
