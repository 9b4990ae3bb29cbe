use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::io::object_to_json;
use crate::summary::Summary;
use crate::types::DetectorKind;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// The orderings reported after the full table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ranking {
    /// Mean match count, descending.
    ByMatchCount,
    /// Mean detection plus description time, ascending.
    ByTotalTime,
    /// Total time per mean match, ascending.
    ByTimePerMatch,
}

impl Ranking {
    pub const ALL: [Ranking; 3] = [
        Ranking::ByMatchCount,
        Ranking::ByTotalTime,
        Ranking::ByTimePerMatch,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Ranking::ByMatchCount => "# MATCHES",
            Ranking::ByTotalTime => "PERFORMANCE",
            Ranking::ByTimePerMatch => "TIME/MATCH",
        }
    }
}

/// Summaries ordered by `ranking`. The sort is stable so ties keep input order.
///
/// Summaries without measurements are left out of the time ranking, and summaries
/// without matches are left out of the time per match ranking.
pub fn rank(summaries: &[Summary], ranking: Ranking) -> Vec<&Summary> {
    let mut ranked: Vec<&Summary> = match ranking {
        Ranking::ByMatchCount => summaries.iter().collect(),
        Ranking::ByTotalTime => summaries.iter().filter(|s| s.measurements() > 0).collect(),
        Ranking::ByTimePerMatch => summaries
            .iter()
            .filter(|s| s.time_per_match().is_some())
            .collect(),
    };
    match ranking {
        Ranking::ByMatchCount => {
            ranked.sort_by(|a, b| b.mean_match_count().total_cmp(&a.mean_match_count()))
        }
        Ranking::ByTotalTime => ranked.sort_by(|a, b| a.total_time().total_cmp(&b.total_time())),
        Ranking::ByTimePerMatch => ranked.sort_by(|a, b| {
            let ta = a.time_per_match().unwrap_or(f64::INFINITY);
            let tb = b.time_per_match().unwrap_or(f64::INFINITY);
            ta.total_cmp(&tb)
        }),
    }
    ranked
}

pub fn top(summaries: &[Summary], ranking: Ranking, n: usize) -> Vec<&Summary> {
    let mut ranked = rank(summaries, ranking);
    ranked.truncate(n);
    ranked
}

/// One table line, times in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub detector: String,
    pub descriptor: String,
    pub frames: usize,
    pub mean_keypoints: f64,
    pub mean_matches: f64,
    pub mean_detection_ms: f64,
    pub mean_description_ms: f64,
    pub total_ms: f64,
    pub ms_per_match: Option<f64>,
}

impl From<&Summary> for ReportRow {
    fn from(s: &Summary) -> Self {
        ReportRow {
            detector: s.configuration.detector.to_string(),
            descriptor: s.configuration.descriptor.to_string(),
            frames: s.measurements(),
            mean_keypoints: s.mean_keypoint_count(),
            mean_matches: s.mean_match_count(),
            mean_detection_ms: s.mean_detection_time() * 1000.0,
            mean_description_ms: s.mean_description_time() * 1000.0,
            total_ms: s.total_time() * 1000.0,
            ms_per_match: s.time_per_match().map(|t| t * 1000.0),
        }
    }
}

const HEADER: &str = "detector   descriptor   frames   keypoints    matches   detect(ms) describe(ms)   total(ms)   ms/match";

fn format_row(row: &ReportRow) -> String {
    let per_match = match row.ms_per_match {
        Some(t) => format!("{:>10.4}", t),
        None => format!("{:>10}", "n/a"),
    };
    format!(
        "{:<10} {:<10} {:>8} {:>11.1} {:>10.1} {:>12.3} {:>12.3} {:>11.3} {}",
        row.detector,
        row.descriptor,
        row.frames,
        row.mean_keypoints,
        row.mean_matches,
        row.mean_detection_ms,
        row.mean_description_ms,
        row.total_ms,
        per_match
    )
}

/// Full table of every summary followed by the top `top_n` of each ranking.
pub fn render_table(summaries: &[Summary], top_n: usize) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "ALL CONFIGURATIONS");
    let _ = writeln!(s, "{}", HEADER);
    for summary in summaries {
        let _ = writeln!(s, "{}", format_row(&summary.into()));
    }
    for ranking in Ranking::ALL {
        let _ = writeln!(s);
        let _ = writeln!(s, "TOP {} {}", top_n, ranking.title());
        for summary in top(summaries, ranking, top_n) {
            let _ = writeln!(s, "{}", format_row(&summary.into()));
        }
    }
    s
}

#[derive(Serialize)]
struct JsonReport {
    timestamp: String,
    configurations: Vec<ReportRow>,
    rankings: BTreeMap<&'static str, Vec<ReportRow>>,
}

/// Writes every row and the top `top_n` of each ranking as JSON.
pub fn write_json_report<P: AsRef<Path>>(
    output_path: P,
    summaries: &[Summary],
    top_n: usize,
) -> Result<(), ReportError> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let rankings: BTreeMap<&'static str, Vec<ReportRow>> = Ranking::ALL
        .iter()
        .map(|r| {
            (
                r.title(),
                top(summaries, *r, top_n)
                    .into_iter()
                    .map(ReportRow::from)
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    let report = JsonReport {
        timestamp: now.format(&Rfc3339)?,
        configurations: summaries.iter().map(ReportRow::from).collect(),
        rankings,
    };
    object_to_json(output_path, &report)?;
    Ok(())
}

/// Writes `<DETECTOR>_keypoints.csv` files with one keypoint size per line.
///
/// Each detector is exported once, from its first summary with measurements.
/// Returns the written paths.
pub fn write_keypoint_sizes<P: AsRef<Path>>(
    output_dir: P,
    summaries: &[Summary],
) -> Result<Vec<PathBuf>, ReportError> {
    let mut exported: BTreeMap<DetectorKind, &Summary> = BTreeMap::new();
    for s in summaries.iter().filter(|s| s.measurements() > 0) {
        exported.entry(s.configuration.detector).or_insert(s);
    }
    let mut written = Vec::new();
    for (detector, summary) in exported {
        let path = output_dir.as_ref().join(format!("{}_keypoints.csv", detector));
        let mut file = std::io::BufWriter::new(std::fs::File::create(&path)?);
        for size in summary.keypoint_sizes() {
            writeln!(file, "{}", size)?;
        }
        file.flush()?;
        log::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
