//! Time-range selection of data files.

use super::datafile::DataFile;
use crate::error::{Result, UataqError};
use crate::timerange::TimeRange;
use tracing::{debug, info};

/// Select the files whose period falls in `time_range`, ordered by period.
///
/// Files are kept when their period overlaps the closed range `[start, stop]`:
/// the period must end after `start` and begin no later than `stop`. A final
/// file starting exactly at `stop` only touches the range boundary and is
/// dropped. `pattern` is a plain substring match against the full path.
///
/// # Errors
///
/// Returns [`UataqError::NoFilesInRange`] when nothing is selected.
pub fn filter_datafiles(
    files: Vec<DataFile>,
    time_range: &TimeRange,
    pattern: Option<&str>,
) -> Result<Vec<DataFile>> {
    info!("Filtering files to time range: {}", time_range);
    let candidates = files.len();

    let mut files = files;
    files.sort_by_key(|file| file.period().start_time());

    let (start, stop) = time_range.bounds();
    let mut selected: Vec<DataFile> = files
        .into_iter()
        .filter(|file| {
            let period = file.period();
            start.is_none_or(|start| period.end_time() > start)
                && stop.is_none_or(|stop| period.start_time() <= stop)
        })
        .filter(|file| pattern.is_none_or(|p| file.path().to_string_lossy().contains(p)))
        .collect();

    if let (Some(last), Some(stop)) = (selected.last(), stop) {
        if last.period().start_time() == stop {
            debug!("Dropping {} which starts at the end of the range", last);
            selected.pop();
        }
    }

    if selected.is_empty() {
        return Err(UataqError::NoFilesInRange {
            time_range: time_range.to_string(),
        });
    }

    debug!("Selected {} of {} files", selected.len(), candidates);
    Ok(selected)
}
