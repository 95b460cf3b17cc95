use std::{fs, path::Path};

use log::debug;

use super::{Dataset, dataset::parse_label};
use crate::{MlErr, Result};

impl Dataset {
    /// Loads a dataset from a CSV file where each line holds the features of an example followed
    /// by its label. Blank lines are skipped.
    ///
    /// # Errors
    /// Returns an error if the file can't be read, a value can't be parsed, lines have different
    /// widths or a label is not a valid class.
    pub fn from_csv<P: AsRef<Path>>(path: P, num_classes: usize) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let dataset = Self::parse_csv(&content, num_classes)?;

        debug!("loaded {} examples from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Parses the contents of a CSV file, see `from_csv`.
    pub fn parse_csv(content: &str, num_classes: usize) -> Result<Self> {
        let mut data = Vec::new();
        let mut row_size = None;

        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let values = line
                .split(',')
                .map(|v| {
                    v.trim().parse::<f32>().map_err(|_| MlErr::Parse {
                        line: i,
                        reason: format!("cannot parse '{v}' as f32"),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let expected = *row_size.get_or_insert(values.len());
            if values.len() != expected || expected < 2 {
                return Err(MlErr::Parse {
                    line: i,
                    reason: format!(
                        "expected {} values (features and label), got {}",
                        expected.max(2),
                        values.len()
                    ),
                });
            }

            parse_label(values[expected - 1], i)?;
            data.extend(values);
        }

        let x_size = row_size.map_or(0, |size| size - 1);
        Self::from_rows(&data, x_size, num_classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_features_and_labels() {
        let csv = "0.5, 1.0, 0\n\n2.0,3.5,1\n";
        let ds = Dataset::parse_csv(csv, 2).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.num_features(), 2);
        assert_eq!(ds.labels(), [0, 1]);
    }

    #[test]
    fn ragged_lines_fail() {
        let csv = "0.5,1.0,0\n2.0,1\n";

        assert!(matches!(
            Dataset::parse_csv(csv, 2),
            Err(MlErr::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn garbage_fails() {
        assert!(matches!(
            Dataset::parse_csv("a,b,1", 2),
            Err(MlErr::Parse { line: 0, .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            Dataset::from_csv("/definitely/not/here.csv", 2),
            Err(MlErr::Io(_))
        ));
    }
}
