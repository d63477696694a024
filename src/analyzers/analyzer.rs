use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::analyzers::aggregate::{aggregate, combine, combined_average, combined_satisfied_pct};
use crate::analyzers::grade::{categorize, gauge_rating};
use crate::analyzers::score::aggregate_scores;
use crate::analyzers::types::{CriterionReport, IndexEntry, SourceReport, SurveyIndex};
use crate::config::{Config, CriterionConfig};
use crate::output::write_json;
use crate::parser::load_or_empty;
use crate::scores::load_scores_or_empty;
use crate::table::ResponseTable;

/// Aggregates every source of one criterion and merges their counts.
///
/// A source that cannot be loaded contributes an empty table, so the
/// criterion still reports (with zero counts) instead of failing. Score
/// exports also get per-group averages; their whole-valued scores join
/// the bucket counts.
#[tracing::instrument(skip_all, fields(criterion = %criterion.id))]
pub fn summarize_criterion(config: &Config, criterion: &CriterionConfig) -> CriterionReport {
    let options = criterion.options(&config.aggregate);

    let mut tables: Vec<ResponseTable> = Vec::with_capacity(criterion.sources.len());
    let mut sources = Vec::with_capacity(criterion.sources.len());

    for source in &criterion.sources {
        let path = config.source_path(source);
        let (table, scores) = match &source.scores {
            Some(columns) => {
                let score_table = load_scores_or_empty(&path, &columns.load_options());
                let report = aggregate_scores(&score_table, columns.group_column.as_deref());
                (score_table.to_response_table(), Some(report))
            }
            None => (load_or_empty(&path, &source.load_options(&config.input)), None),
        };
        if table.is_empty() {
            warn!(source = %source.label, path = %path.display(), "Source has no responses");
        }

        sources.push(SourceReport {
            label: source.label.clone(),
            path: path.display().to_string(),
            report: aggregate(&table, options),
            scores,
        });
        tables.push(table);
    }

    let overall_average = combined_average(&tables);

    CriterionReport {
        id: criterion.id.clone(),
        name: criterion.name.clone(),
        combined: combine(&tables, options),
        satisfied_pct: combined_satisfied_pct(&tables, &options.neutral_values),
        overall_average,
        overall_rating: overall_average.map(categorize),
        gauge: overall_average.map(gauge_rating),
        sources,
    }
}

/// Headline numbers of each criterion, as shown on the home page.
pub fn build_index(reports: &[CriterionReport]) -> SurveyIndex {
    SurveyIndex {
        generated_at: Utc::now(),
        criteria: reports
            .iter()
            .map(|report| IndexEntry {
                id: report.id.clone(),
                name: report.name.clone(),
                mode: report.combined.mode,
                total: report.combined.total,
                satisfied_pct: report.satisfied_pct,
                overall_average: report.overall_average,
                overall_rating: report.overall_rating,
                gauge: report.gauge,
            })
            .collect(),
    }
}

/// Summarizes all configured criteria, writes `criteria/<id>.json` for each
/// and `index.json` into `output_dir`.
#[tracing::instrument(skip_all, fields(output_dir = %output_dir.display()))]
pub fn summarize(config: &Config, output_dir: &Path) -> Result<SurveyIndex> {
    let mut reports = Vec::with_capacity(config.criteria.len());

    for criterion in &config.criteria {
        let report = summarize_criterion(config, criterion);

        write_json(
            &output_dir.join("criteria").join(format!("{}.json", criterion.id)),
            &report,
        )?;

        info!(
            criterion = %report.id,
            total = report.combined.total,
            satisfied_pct = report.satisfied_pct,
            "Criterion summarized"
        );
        reports.push(report);
    }

    let index = build_index(&reports);
    write_json(&output_dir.join("index.json"), &index)?;

    info!(criteria = index.criteria.len(), "Summary complete");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::bucket::BucketMode;
    use crate::analyzers::grade::GaugeRating;
    use crate::config::{ScoreColumns, SourceConfig};
    use std::fs;
    use std::path::PathBuf;

    fn source(label: &str, path: &str) -> SourceConfig {
        SourceConfig {
            label: label.into(),
            path: PathBuf::from(path),
            header_rows: None,
            respondent_column: None,
            exclude_columns: None,
            scores: None,
        }
    }

    fn config_in(dir: &Path) -> Config {
        fs::write(dir.join("dosen.csv"), "q1,q2\n5,4\n1,3\n").unwrap();
        fs::write(dir.join("tendik.csv"), "q1,q2\n5,2\n").unwrap();

        let mut config = Config::default();
        config.input.base_dir = dir.to_path_buf();
        config.criteria = vec![CriterionConfig {
            id: "C.6".into(),
            name: "Pendidikan".into(),
            aggregate: None,
            sources: vec![
                source("Dosen", "dosen.csv"),
                source("Tendik", "tendik.csv"),
                source("Mahasiswa", "missing.csv"),
            ],
        }];
        config
    }

    #[test]
    fn test_summarize_criterion_merges_sources() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let report = summarize_criterion(&config, &config.criteria[0]);

        assert_eq!(report.sources.len(), 3);
        assert_eq!(report.sources[2].report.respondents, 0);
        // 5,4,1 from dosen (3 excluded) plus 5,2 from tendik
        assert_eq!(report.combined.mode, BucketMode::FourWay);
        assert_eq!(report.combined.total, 5);
        assert_eq!(report.combined.bucket("Sangat Baik").unwrap().count, 2);
        assert!((report.satisfied_pct - 60.0).abs() < 1e-9);
        // averages keep the neutral answer: 20 / 6
        assert!((report.overall_average.unwrap() - 20.0 / 6.0).abs() < 1e-9);
        assert_eq!(report.gauge, Some(GaugeRating::Baik));
    }

    #[test]
    fn test_score_source_in_criterion() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        fs::write(
            dir.path().join("evaluasi.csv"),
            "Nama Dosen,Kompetensi,Nilai\nAni,Pedagogik,4.5\nAni,Sosial,4\nBudi,Pedagogik,2\n",
        )
        .unwrap();
        let mut evaluasi = source("Evaluasi", "evaluasi.csv");
        evaluasi.scores = Some(ScoreColumns {
            score_column: "Nilai".into(),
            group_column: Some("Kompetensi".into()),
            filter_columns: vec!["Nama Dosen".into()],
        });
        config.criteria[0].sources = vec![evaluasi];

        let report = summarize_criterion(&config, &config.criteria[0]);
        let scores = report.sources[0].scores.as_ref().unwrap();

        assert_eq!(scores.groups.len(), 2);
        assert_eq!(scores.groups[0].group, "Pedagogik");
        assert!((scores.groups[0].average - 3.25).abs() < 1e-9);
        // 4.5 is not a whole answer, 4 and 2 are
        assert_eq!(report.combined.total, 2);
        assert_eq!(report.combined.bucket("Baik").unwrap().count, 1);
        assert_eq!(report.combined.bucket("Kurang").unwrap().count, 1);
    }

    #[test]
    fn test_summarize_writes_index_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let out = dir.path().join("aggregates");

        let index = summarize(&config, &out).unwrap();

        assert_eq!(index.criteria.len(), 1);
        assert_eq!(index.criteria[0].total, 5);
        assert!(out.join("index.json").exists());
        assert!(out.join("criteria").join("C.6.json").exists());
    }

    #[test]
    fn test_build_index_of_nothing() {
        let index = build_index(&[]);
        assert!(index.criteria.is_empty());
    }
}
