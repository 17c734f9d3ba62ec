mod common;

use std::path::Path;

use clap::Parser;
use common::{garmin_tcx, garmin_tcx_with_lap_time, micoach_tcx};
use hrsplice_rs::cli::{run_merge, Cli, Command, MergeArgs};
use hrsplice_rs::config::{Config, LapSource};
use hrsplice_rs::error::AppError;

fn merge_args(dir: &Path, garmin: &str) -> MergeArgs {
    let structural = dir.join("micoach.tcx");
    let heart_rate = dir.join("garmin.tcx");
    std::fs::write(&structural, micoach_tcx()).expect("write structural");
    std::fs::write(&heart_rate, garmin).expect("write heart rate");

    MergeArgs {
        distance_only: false,
        structural,
        heart_rate,
        output: dir.join("converted.tcx"),
        lap_source: Some(LapSource::HeartRate),
        structural_offset_hours: Some(0),
        heart_rate_offset_hours: Some(2),
        require_heart_rate: false,
    }
}

#[test]
fn merge_command_writes_the_output_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = merge_args(dir.path(), &garmin_tcx());

    let summary = run_merge(&args, &Config::from_env()).expect("merge");

    assert_eq!(summary.laps.len(), 2);
    let written = std::fs::read_to_string(&args.output).expect("output");
    assert!(written.contains("<AvgSpeed>6.25</AvgSpeed>"));
}

#[test]
fn failed_merge_leaves_no_output_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = merge_args(dir.path(), &garmin_tcx_with_lap_time("0"));

    let err = run_merge(&args, &Config::from_env()).expect_err("zero duration lap");

    assert!(matches!(err, AppError::Merge(_)));
    assert!(!args.output.exists());
}

#[test]
fn unknown_extension_is_rejected_before_reading() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut args = merge_args(dir.path(), &garmin_tcx());
    args.heart_rate = dir.path().join("garmin.gpx");

    let err = run_merge(&args, &Config::from_env()).expect_err("unsupported");

    assert!(matches!(err, AppError::BadRequest(_)));
}

#[test]
fn distance_only_flag_leads_the_positional_files() {
    let cli = Cli::try_parse_from(["hrsplice", "merge", "-d", "micoach.tcx", "garmin.tcx"]).expect("parse");

    let Command::Merge(args) = cli.command else {
        panic!("expected merge command");
    };
    assert!(args.distance_only);
    assert_eq!(args.structural, Path::new("micoach.tcx"));
    assert_eq!(args.heart_rate, Path::new("garmin.tcx"));
    assert_eq!(args.output, Path::new("converted.tcx"));

    let options = args.options(&Config::from_env());
    assert!(options.distance_only);
}

#[test]
fn offsets_and_lap_source_override_the_environment() {
    let cli = Cli::try_parse_from([
        "hrsplice",
        "merge",
        "--lap-source",
        "structural",
        "--heart-rate-offset-hours",
        "-1",
        "--structural-offset-hours",
        "3",
        "a.tcx",
        "b.fit",
    ])
    .expect("parse");

    let Command::Merge(args) = cli.command else {
        panic!("expected merge command");
    };
    let options = args.options(&Config::from_env());
    assert_eq!(options.lap_source, LapSource::Structural);
    assert_eq!(options.heart_rate_offset.hours, -1);
    assert_eq!(options.structural_offset.hours, 3);
}

#[test]
fn lap_source_names_parse_case_insensitively() {
    assert_eq!("Structural".parse::<LapSource>(), Ok(LapSource::Structural));
    assert_eq!("heart_rate".parse::<LapSource>(), Ok(LapSource::HeartRate));
    assert_eq!("HEART-RATE".parse::<LapSource>(), Ok(LapSource::HeartRate));
    assert!("gps".parse::<LapSource>().is_err());
}
