//! Parse orchestration for selected data files.
//!
//! Files are parsed either sequentially on the calling task or concurrently
//! on blocking workers, with at most `workers` parses in flight. Each worker
//! owns its file and returns an independent table. A file that fails to
//! parse is logged and skipped. Surviving tables are concatenated, rows
//! without a timestamp dropped, sorted by time and clipped to the range.

use super::datafile::DataFile;
use crate::error::{Result, UataqError};
use crate::models::{Driver, ParseSummary, TIME_COLUMN, Workers};
use crate::timerange::TimeRange;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use std::path::PathBuf;
use tokio::task;
use tracing::{debug, info, warn};

/// Options for a single orchestration call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub workers: Workers,
    pub driver: Driver,
    pub show_progress: bool,
}

impl ParseOptions {
    pub fn new(workers: Workers, driver: Driver) -> Self {
        Self {
            workers,
            driver,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

/// Clamp a requested worker count to the available units and the file count
pub fn resolve_workers(requested: Workers, available: usize, file_count: usize) -> usize {
    let available = available.max(1);
    let mut workers = match requested {
        Workers::Max => available,
        Workers::Count(n) if n > available => {
            warn!(
                "{} workers requested, but there are only {} CPU(s) available",
                n, available
            );
            available
        }
        Workers::Count(n) => n,
    };

    if workers > file_count {
        debug!(
            "{} workers requested, but there are only {} files to parse",
            workers, file_count
        );
        workers = file_count;
    }

    workers.max(1)
}

/// Parse data files and merge them into one time-indexed table
pub async fn parse_datafiles(
    files: Vec<DataFile>,
    time_range: &TimeRange,
    workers: Workers,
    driver: Driver,
) -> Result<DataFrame> {
    let (data, _summary) =
        parse_datafiles_with_summary(files, time_range, ParseOptions::new(workers, driver)).await?;
    Ok(data)
}

/// Parse data files, also reporting how many succeeded
///
/// # Errors
///
/// - [`UataqError::UnimplementedDriver`] before any parsing if the array
///   driver is selected
/// - [`UataqError::NoFilesParsed`] if no file produced a table
pub async fn parse_datafiles_with_summary(
    files: Vec<DataFile>,
    time_range: &TimeRange,
    options: ParseOptions,
) -> Result<(DataFrame, ParseSummary)> {
    if options.driver != Driver::Polars {
        return Err(UataqError::UnimplementedDriver {
            driver: options.driver.to_string(),
        });
    }

    let workers = resolve_workers(options.workers, num_cpus::get(), files.len());
    let progress = create_progress_bar(files.len() as u64, options.show_progress);

    let outcomes = if workers == 1 {
        info!("Parsing {} files sequentially", files.len());
        files
            .iter()
            .enumerate()
            .map(|(index, file)| {
                let outcome = (index, file.path().to_path_buf(), file.parse());
                progress.inc(1);
                outcome
            })
            .collect::<Vec<_>>()
    } else {
        info!(
            "Parsing {} files in parallel with {} workers",
            files.len(),
            workers
        );
        parse_concurrently(files, workers, &progress).await
    };

    progress.finish_and_clear();

    let mut summary = ParseSummary {
        workers,
        ..ParseSummary::default()
    };
    let frames = collect_frames(outcomes, &mut summary)?;

    if frames.is_empty() {
        return Err(UataqError::NoFilesParsed {
            files_failed: summary.files_failed,
        });
    }

    debug!("Concatenating datasets and reducing rows to time range");
    let data = merge_frames(frames, time_range)?;
    summary.total_rows = data.height();

    info!(
        "Parsed {} files ({} failed), {} rows in {}",
        summary.files_parsed, summary.files_failed, summary.total_rows, time_range
    );
    Ok((data, summary))
}

type Outcome = (usize, PathBuf, Result<DataFrame>);

async fn parse_concurrently(
    files: Vec<DataFile>,
    workers: usize,
    progress: &ProgressBar,
) -> Vec<Outcome> {
    stream::iter(files.into_iter().enumerate())
        .map(|(index, file)| {
            let progress = progress.clone();
            async move {
                let path = file.path().to_path_buf();
                let result = task::spawn_blocking(move || file.parse())
                    .await
                    .unwrap_or_else(|e| {
                        Err(UataqError::parser(&path, format!("parse worker failed: {e}")))
                    });
                progress.inc(1);
                (index, path, result)
            }
        })
        .buffer_unordered(workers)
        .collect()
        .await
}

/// Split outcomes into tables in file order, logging per-file failures
fn collect_frames(mut outcomes: Vec<Outcome>, summary: &mut ParseSummary) -> Result<Vec<LazyFrame>> {
    outcomes.sort_by_key(|(index, _, _)| *index);

    let mut frames = Vec::with_capacity(outcomes.len());
    for (_, path, result) in outcomes {
        match result.and_then(|df| prepare_frame(df, &path)) {
            Ok(frame) => {
                summary.files_parsed += 1;
                frames.push(frame);
            }
            Err(e) if e.is_per_file() => {
                warn!("Error parsing {}: {}", path.display(), e);
                summary.files_failed += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(frames)
}

/// Normalise a file's time column so tables from different files concatenate
fn prepare_frame(df: DataFrame, path: &std::path::Path) -> Result<LazyFrame> {
    let dtype = df
        .column(TIME_COLUMN)
        .map_err(|_| UataqError::parser(path, format!("missing {TIME_COLUMN} column")))?
        .dtype()
        .clone();

    match dtype {
        DataType::Datetime(_, _) | DataType::Date => Ok(df.lazy().with_column(
            col(TIME_COLUMN).cast(DataType::Datetime(TimeUnit::Microseconds, None)),
        )),
        other => Err(UataqError::parser(
            path,
            format!("{TIME_COLUMN} column has type {other}, expected a datetime"),
        )),
    }
}

/// Concatenate tables, drop rows without a timestamp, sort and clip to `[start, stop]`.
///
/// Columns missing from a table are null-filled and a column inferred with
/// different types across files is cast to their common supertype.
fn merge_frames(frames: Vec<LazyFrame>, time_range: &TimeRange) -> Result<DataFrame> {
    let args = UnionArgs {
        to_supertypes: true,
        ..Default::default()
    };
    let mut data = concat_lf_diagonal(frames, args)?.filter(col(TIME_COLUMN).is_not_null());

    if let Some(start) = time_range.start() {
        data = data.filter(col(TIME_COLUMN).gt_eq(lit(start)));
    }
    if let Some(stop) = time_range.stop() {
        data = data.filter(col(TIME_COLUMN).lt_eq(lit(stop)));
    }

    Ok(data
        .sort_by_exprs(
            [col(TIME_COLUMN)],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?)
}

fn create_progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("Parsing files");
    pb
}
