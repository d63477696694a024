use std::path::{Path, PathBuf};

use survey_rater::analyzers::aggregate::{AggregateOptions, aggregate, combine};
use survey_rater::analyzers::analyzer::summarize;
use survey_rater::analyzers::average::GroupBy;
use survey_rater::analyzers::bucket::{BinaryScheme, BucketMode};
use survey_rater::analyzers::grade::{GaugeRating, Rating};
use survey_rater::analyzers::score::aggregate_scores;
use survey_rater::config::{Config, CriterionConfig, SourceConfig};
use survey_rater::filter::{FilterChain, FilterState, Selection};
use survey_rater::parser::{LoadOptions, load_or_empty, load_responses, parse_responses};
use survey_rater::scores::load_scores;

const STATUS: &str = "1. Status Bpk/Ibu/Saudara/i:";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn c1_options() -> LoadOptions {
    LoadOptions {
        respondent_column: Some(STATUS.to_string()),
        ..Default::default()
    }
}

fn c4_options() -> LoadOptions {
    LoadOptions {
        header_rows: 2,
        ..Default::default()
    }
}

fn understanding() -> AggregateOptions {
    AggregateOptions {
        bucket_mode: BucketMode::Binary,
        binary_scheme: BinaryScheme::Understanding,
        ..Default::default()
    }
}

#[test]
fn test_load_single_header_with_status() {
    let table = load_responses(&fixture("c1_visi_misi.csv"), &c1_options())
        .expect("Failed to load fixture");

    // timestamp and free-text columns are dropped, status becomes the row attribute
    assert_eq!(
        table.columns(),
        &["Visi dipahami", "Misi dipahami", "Tujuan dipahami"]
    );
    assert_eq!(table.respondent_groups(), vec!["Dosen", "Mahasiswa", "Tendik"]);
    assert_eq!(table.rows()[1], vec![Some(4), Some(2), Some(1)]);
    // 9 is outside the Likert range
    assert_eq!(table.rows()[3], vec![Some(3), Some(5), None]);
    assert_eq!(table.present_count(), 10);
}

#[test]
fn test_understanding_pipeline() {
    let table = load_responses(&fixture("c1_visi_misi.csv"), &c1_options()).unwrap();
    let report = aggregate(&table, &understanding());

    assert_eq!(report.respondents, 4);
    assert_eq!(report.neutral_excluded, 2);
    assert_eq!(report.distribution.total, 8);
    assert!((report.distribution.percentage("Faham") - 75.0).abs() < 1e-9);
    assert!((report.distribution.percentage("Tidak Faham") - 25.0).abs() < 1e-9);
    assert!((report.satisfied_pct - 75.0).abs() < 1e-9);
}

#[test]
fn test_filter_then_aggregate() {
    let table = load_responses(&fixture("c1_visi_misi.csv"), &c1_options()).unwrap();
    let filter = FilterState {
        respondent: Selection::Only("Dosen".into()),
        ..Default::default()
    };
    let report = aggregate(&filter.apply(&table), &understanding());

    assert_eq!(report.respondents, 2);
    assert_eq!(report.distribution.total, 3);
    assert_eq!(report.distribution.percentage("Faham"), 100.0);
}

#[test]
fn test_group_by_respondent() {
    let table = load_responses(&fixture("c1_visi_misi.csv"), &c1_options()).unwrap();
    let options = AggregateOptions {
        group_by: Some(GroupBy::Respondent),
        ..Default::default()
    };
    let report = aggregate(&table, &options);

    assert_eq!(report.averages.group_by, Some(GroupBy::Respondent));
    let dosen = &report.averages.rows[0];
    assert_eq!(dosen.respondent.as_deref(), Some("Dosen"));
    assert_eq!(dosen.responses, 5);
    assert!((dosen.average - 4.0).abs() < 1e-9);
    assert_eq!(dosen.rating, Rating::SangatBaik);
}

#[test]
fn test_two_row_header_pipeline() {
    let table = load_responses(&fixture("c4_dosen.csv"), &c4_options()).unwrap();

    assert_eq!(
        table.columns(),
        &[
            "Pedagogik_Q1",
            "Pedagogik_Q2",
            "Kepegawaian_Q1",
            "Kepegawaian_Q2"
        ]
    );

    let options = AggregateOptions {
        group_by: Some(GroupBy::Category),
        ..Default::default()
    };
    let report = aggregate(&table, &options);

    assert_eq!(report.distribution.total, 9);
    assert_eq!(report.distribution.bucket("Sangat Baik").unwrap().count, 3);
    assert_eq!(report.distribution.bucket("Baik").unwrap().count, 3);
    assert_eq!(report.distribution.bucket("Kurang").unwrap().count, 2);
    assert_eq!(report.distribution.bucket("Sangat Kurang").unwrap().count, 1);
    assert!((report.overall_average.unwrap() - 38.0 / 11.0).abs() < 1e-9);

    let kepegawaian = &report.averages.rows[0];
    assert_eq!(kepegawaian.category.as_deref(), Some("Kepegawaian"));
    assert!((kepegawaian.average - 17.0 / 6.0).abs() < 1e-9);
    assert_eq!(kepegawaian.rating, Rating::Netral);
}

#[test]
fn test_missing_file_is_empty() {
    let table = load_or_empty(&fixture("does_not_exist.csv"), &LoadOptions::default());
    let report = aggregate(&table, &AggregateOptions::default());

    assert!(table.is_empty());
    assert_eq!(report.distribution.total, 0);
    assert_eq!(report.satisfied_pct, 0.0);
}

#[test]
fn test_combine_two_sources() {
    let c1 = load_responses(&fixture("c1_visi_misi.csv"), &c1_options()).unwrap();
    let c4 = load_responses(&fixture("c4_dosen.csv"), &c4_options()).unwrap();
    let options = AggregateOptions {
        bucket_mode: BucketMode::Binary,
        ..Default::default()
    };
    let combined = combine(&[c1, c4], &options);

    // 6 + 2 from the first file, 6 + 3 from the second
    assert_eq!(combined.total, 17);
    assert_eq!(combined.bucket("Puas").unwrap().count, 12);
    assert_eq!(combined.bucket("Tidak Puas").unwrap().count, 5);
}

#[test]
fn test_summary_from_config() {
    let out = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.input.base_dir = fixture("");
    config.criteria = vec![CriterionConfig {
        id: "C.1".into(),
        name: "Visi dan Misi".into(),
        aggregate: Some(understanding()),
        sources: vec![
            SourceConfig {
                label: "STT".into(),
                path: PathBuf::from("c1_visi_misi.csv"),
                header_rows: None,
                respondent_column: Some(STATUS.into()),
                exclude_columns: Some(vec!["Timestamp".into()]),
                scores: None,
            },
            SourceConfig {
                label: "TIF".into(),
                path: PathBuf::from("missing.csv"),
                header_rows: None,
                respondent_column: None,
                exclude_columns: None,
                scores: None,
            },
        ],
    }];

    let index = summarize(&config, out.path()).unwrap();

    assert_eq!(index.criteria.len(), 1);
    assert_eq!(index.criteria[0].mode, BucketMode::Binary);
    assert_eq!(index.criteria[0].total, 8);
    assert!((index.criteria[0].satisfied_pct - 75.0).abs() < 1e-9);

    let written = std::fs::read_to_string(out.path().join("criteria").join("C.1.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["sources"].as_array().unwrap().len(), 2);
    assert_eq!(value["combined"]["buckets"][1]["label"], "Faham");
}

#[test]
fn test_timestamps_and_fractions_are_not_counted() {
    let data = "Timestamp,Q1,Q2\n1/2/2024 10:00:00,4.5,5\n1/3/2024 11:00:00,2,1\n";
    let table = parse_responses(data.as_bytes(), &LoadOptions::default()).unwrap();
    let report = aggregate(&table, &AggregateOptions::default());

    assert_eq!(table.columns(), &["Q1", "Q2"]);
    assert_eq!(report.distribution.total, 3);
    assert_eq!(report.distribution.bucket("Sangat Kurang").unwrap().count, 1);
    assert_eq!(report.distribution.bucket("Kurang").unwrap().count, 1);
    assert_eq!(report.distribution.bucket("Sangat Baik").unwrap().count, 1);
}

fn c6_scores() -> survey_rater::scores::ScoreTable {
    let config = Config::default();
    let columns = config.criterion("C.6").unwrap().sources[0]
        .scores
        .clone()
        .unwrap();
    load_scores(&fixture("c6_dosen_scores.csv"), &columns.load_options()).unwrap()
}

#[test]
fn test_c6_scores_by_competency() {
    let report = aggregate_scores(&c6_scores(), Some("Kompetensi"));

    assert_eq!(report.records, 8);
    let groups: Vec<_> = report.groups.iter().map(|g| g.group.as_str()).collect();
    assert_eq!(groups, vec!["Kepribadian", "Pedagogik", "Profesional"]);

    let pedagogik = &report.groups[1];
    assert_eq!(pedagogik.records, 4);
    assert!((pedagogik.average - 3.3).abs() < 1e-9);
    assert_eq!(pedagogik.gauge, GaugeRating::Baik);
    assert!((pedagogik.fulfillment.fulfilled_pct - 66.0).abs() < 1e-9);
    assert!(pedagogik.fulfillment.satisfied);
}

#[test]
fn test_c6_chained_filters() {
    let table = c6_scores();
    let chain = FilterChain::new(["Tahun Akademik", "Nama Dosen", "Matakuliah"])
        .select("Tahun Akademik", Selection::Only("2024/2025".into()))
        .select("Nama Dosen", Selection::Only("Ani Rahmawati".into()));

    let options = chain.options(&table);
    assert_eq!(options[1].options, vec!["Ani Rahmawati", "Citra Lestari"]);
    assert_eq!(options[2].options, vec!["Statistika"]);

    let report = aggregate_scores(&chain.apply(&table), Some("Kompetensi"));
    assert_eq!(report.records, 2);
    // the blank Profesional score leaves a single group
    assert_eq!(report.groups.len(), 1);
    assert!((report.groups[0].average - 3.8).abs() < 1e-9);

    // Budi has no 2024/2025 rows, so the lecturer filter falls back to All
    let chain = chain.select("Nama Dosen", Selection::Only("Budi Santoso".into()));
    assert_eq!(chain.apply(&table).len(), 3);
}
