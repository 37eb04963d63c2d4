//! Reader for `LATA` data files.
//!
//! The format is line oriented with whitespace separated tokens:
//!
//! ```text
//! | comment
//! LATA 2015 2016 2017 2018
//! twKI 1.03
//! KI   1023752.2 1050000.0
//! ```
//!
//! The `LATA` header lists one year per horizon position. Every following line names a
//! series and gives its values. Short series are padded by repeating their last value and
//! values beyond the horizon are ignored.

use crate::attribute::AttributeValue;
use crate::errors::{ModelRunError, ModelRunResult};
use crate::handle::ModelHandle;
use crate::series_table::SeriesTable;
use crate::timeseries::{forward_fill, FloatValue, YearPolicy, Years};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// First token of the header line
pub const HEADER_TOKEN: &str = "LATA";

const COMMENT_PREFIX: char = '|';

/// Parses data files and binds their series onto a model.
#[derive(Debug, Clone)]
pub struct DataLoader {
    year_policy: YearPolicy,
    skip_pipe_comments: bool,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            year_policy: YearPolicy::Header,
            skip_pipe_comments: true,
        }
    }

    pub fn with_year_policy(mut self, year_policy: YearPolicy) -> Self {
        self.year_policy = year_policy;
        self
    }

    /// Whether lines starting with `|` are treated as comments.
    ///
    /// When disabled such lines are read as data lines.
    pub fn with_pipe_comments(mut self, skip: bool) -> Self {
        self.skip_pipe_comments = skip;
        self
    }

    /// Read a data file and bind every series onto `handle`.
    pub fn load(
        &self,
        path: impl AsRef<Path>,
        handle: &mut ModelHandle,
    ) -> ModelRunResult<(SeriesTable, Years)> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ModelRunError::FileNotFound(path.to_path_buf()),
            _ => ModelRunError::Io(e),
        })?;

        let (table, years) = self.parse_str(&text, &path.display().to_string(), handle)?;
        info!(
            "Loaded {} series over {} years from {}",
            table.len(),
            years.len(),
            path.display()
        );
        Ok((table, years))
    }

    /// Parse data held in memory.
    ///
    /// `source` names the data in error messages.
    pub fn parse_str(
        &self,
        text: &str,
        source: &str,
        handle: &mut ModelHandle,
    ) -> ModelRunResult<(SeriesTable, Years)> {
        let mut header: Option<(SeriesTable, Years)> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || (self.skip_pipe_comments && line.starts_with(COMMENT_PREFIX)) {
                continue;
            }

            let error = |message: String| ModelRunError::DataFormat {
                path: source.to_string(),
                line: line_number,
                message,
            };

            let mut tokens = line.split_whitespace();
            let Some(first) = tokens.next() else {
                continue;
            };
            let values: Vec<&str> = tokens.collect();

            if first == HEADER_TOKEN {
                if header.is_some() {
                    return Err(error(format!("duplicate {HEADER_TOKEN} header")));
                }
                let years = self.parse_years(&values).map_err(error)?;
                let horizon = years.len();
                handle.set_horizon(horizon);
                debug!("Horizon set to {} from {} header", horizon, HEADER_TOKEN);
                header = Some((SeriesTable::new(horizon), years));
                continue;
            }

            let Some((table, _)) = header.as_mut() else {
                return Err(error(format!(
                    "series '{first}' appears before the {HEADER_TOKEN} header"
                )));
            };

            let values = parse_values(first, &values, table.horizon()).map_err(error)?;
            handle
                .set_attribute(first, AttributeValue::Series(values.clone()))
                .map_err(|e| error(e.to_string()))?;
            if table.insert(first, values).is_some() {
                debug!("Series '{}' redefined on line {}", first, line_number);
            }
        }

        Ok(header.unwrap_or_default())
    }

    fn parse_years(&self, tokens: &[&str]) -> Result<Years, String> {
        if tokens.is_empty() {
            return Err(format!("{HEADER_TOKEN} header lists no years"));
        }

        match self.year_policy {
            YearPolicy::Header => tokens
                .iter()
                .map(|token| {
                    token
                        .parse::<i32>()
                        .map_err(|_| format!("invalid year '{token}'"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Years::new),
            YearPolicy::Synthesized { start } => Ok(Years::synthesized(start, tokens.len())),
        }
    }
}

/// Data files (`*.txt`) directly inside `dir`, sorted by file name.
pub fn discover_data_files(dir: impl AsRef<Path>) -> ModelRunResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ModelRunError::FileNotFound(dir.to_path_buf()),
        _ => ModelRunError::Io(e),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse up to `horizon` values and forward fill the remainder.
fn parse_values(
    name: &str,
    tokens: &[&str],
    horizon: usize,
) -> Result<crate::timeseries::Series, String> {
    if tokens.is_empty() {
        return Err(format!("series '{name}' has no values"));
    }

    let values = tokens
        .iter()
        .take(horizon)
        .map(|token| {
            token
                .parse::<FloatValue>()
                .map_err(|_| format!("invalid number '{token}' in series '{name}'"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(forward_fill(&values, horizon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example_models::{TestAccumulator, TestDoubler};
    use ndarray::array;
    use std::io::Write;

    fn doubler() -> ModelHandle {
        ModelHandle::from_model("models.Doubler", Box::new(TestDoubler)).unwrap()
    }

    fn parse(text: &str, handle: &mut ModelHandle) -> ModelRunResult<(SeriesTable, Years)> {
        DataLoader::new().parse_str(text, "test.txt", handle)
    }

    #[test]
    fn header_sets_horizon_and_years() {
        let mut handle = doubler();
        let (table, years) = parse("LATA 2020 2021 2022\nX 1 2 3\n", &mut handle).unwrap();

        assert_eq!(handle.horizon(), 3);
        assert_eq!(years.values(), &[2020, 2021, 2022]);
        assert_eq!(table.horizon(), 3);
        assert_eq!(table.get("X"), Some(&array![1.0, 2.0, 3.0]));
        assert_eq!(
            handle.get_attribute("X").unwrap().as_series(),
            Some(&array![1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn short_series_forward_filled() {
        let mut handle = doubler();
        parse("LATA 1 2 3 4 5\nX 1 2 3\n", &mut handle).unwrap();

        assert_eq!(
            handle.get_attribute("X").unwrap().as_series(),
            Some(&array![1.0, 2.0, 3.0, 3.0, 3.0])
        );
    }

    #[test]
    fn excess_values_ignored() {
        let mut handle = doubler();
        let (table, _) = parse("LATA 2020 2021\nX 1 2 3 not-a-number\n", &mut handle).unwrap();
        assert_eq!(table.get("X"), Some(&array![1.0, 2.0]));
    }

    #[test]
    fn comments_and_blank_lines_skipped() {
        let mut handle = doubler();
        let text = "| header comment\n\n   \nLATA 2020 2021\n| X 9 9\nX 4\n";
        let (table, _) = parse(text, &mut handle).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("X"), Some(&array![4.0, 4.0]));
    }

    #[test]
    fn pipe_lines_are_data_when_comments_disabled() {
        let mut handle = doubler();
        let err = DataLoader::new()
            .with_pipe_comments(false)
            .parse_str("LATA 2020\n| 5\n", "test.txt", &mut handle)
            .unwrap_err();
        assert!(err.to_string().contains("Model 'models.Doubler' has no bindable attribute named '|'"));
    }

    #[test]
    fn unknown_series_is_data_format_error() {
        let mut handle = doubler();
        let err = parse("LATA 2020 2021\nX 1\nZ 1 2\n", &mut handle).unwrap_err();

        match err {
            ModelRunError::DataFormat { path, line, message } => {
                assert_eq!(path, "test.txt");
                assert_eq!(line, 3);
                assert!(message.contains("no bindable attribute named 'Z'"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(
            handle.get_attribute("X").unwrap().as_series(),
            Some(&array![1.0, 1.0])
        );
    }

    #[test]
    fn malformed_number_reports_line_and_token() {
        let mut handle = doubler();
        let err = parse("LATA 2020 2021\n\nX 1 2,5\n", &mut handle).unwrap_err();
        assert_eq!(
            err.to_string(),
            "test.txt:3: invalid number '2,5' in series 'X'"
        );
    }

    #[test]
    fn malformed_year() {
        let mut handle = doubler();
        let err = parse("LATA 2020 20x1\n", &mut handle).unwrap_err();
        assert_eq!(err.to_string(), "test.txt:1: invalid year '20x1'");
    }

    #[test]
    fn synthesized_years_ignore_header_values() {
        let mut handle = doubler();
        let (_, years) = DataLoader::new()
            .with_year_policy(YearPolicy::Synthesized { start: 2015 })
            .parse_str("LATA a b c\nX 1\n", "test.txt", &mut handle)
            .unwrap();
        assert_eq!(years.values(), &[2015, 2016, 2017]);
        assert_eq!(handle.horizon(), 3);
    }

    #[test]
    fn data_before_header() {
        let mut handle = doubler();
        let err = parse("X 1 2\nLATA 2020 2021\n", &mut handle).unwrap_err();
        assert!(err.to_string().contains("appears before the LATA header"));
    }

    #[test]
    fn header_without_years() {
        let mut handle = doubler();
        let err = parse("LATA\n", &mut handle).unwrap_err();
        assert!(err.to_string().contains("lists no years"));
    }

    #[test]
    fn duplicate_header() {
        let mut handle = doubler();
        let err = parse("LATA 2020\nLATA 2021\n", &mut handle).unwrap_err();
        assert_eq!(err.to_string(), "test.txt:2: duplicate LATA header");
    }

    #[test]
    fn series_without_values() {
        let mut handle = doubler();
        let err = parse("LATA 2020\nX\n", &mut handle).unwrap_err();
        assert!(err.to_string().contains("series 'X' has no values"));
    }

    #[test]
    fn horizon_attribute_cannot_be_bound_as_series() {
        let mut handle = doubler();
        let err = parse("LATA 2020\nLL 4\n", &mut handle).unwrap_err();
        assert!(matches!(err, ModelRunError::DataFormat { line: 2, .. }));
    }

    #[test]
    fn empty_file_has_no_years() {
        let mut handle = doubler();
        let (table, years) = parse("| nothing here\n", &mut handle).unwrap();
        assert!(table.is_empty());
        assert!(years.is_empty());
    }

    #[test]
    fn state_series_are_bound() {
        let mut handle =
            ModelHandle::from_model("models.Accumulator", Box::new(TestAccumulator)).unwrap();
        parse("LATA 2020 2021\nX 1\nS 10 20\n", &mut handle).unwrap();
        assert_eq!(
            handle.get_attribute("S").unwrap().as_series(),
            Some(&array![10.0, 20.0])
        );
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "LATA 2020 2021 2022").unwrap();
        writeln!(file, "X 1 2").unwrap();

        let mut handle = doubler();
        let (table, years) = DataLoader::new().load(file.path(), &mut handle).unwrap();
        assert_eq!(years.len(), 3);
        assert_eq!(table.get("X"), Some(&array![1.0, 2.0, 2.0]));
    }

    #[test]
    fn missing_file() {
        let mut handle = doubler();
        let err = DataLoader::new()
            .load("does/not/exist.txt", &mut handle)
            .unwrap_err();
        assert!(matches!(err, ModelRunError::FileNotFound(_)));
    }

    #[test]
    fn discovers_txt_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gdp.txt"), "LATA 2020\n").unwrap();
        fs::write(dir.path().join("doubler.txt"), "LATA 2020\n").unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let names: Vec<String> = discover_data_files(dir.path())
            .unwrap()
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["doubler.txt", "gdp.txt"]);

        assert!(matches!(
            discover_data_files(dir.path().join("missing")),
            Err(ModelRunError::FileNotFound(_))
        ));
    }
}
