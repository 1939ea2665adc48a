//! CSV loader for municipal income tax rates.
//!
//! ## CSV Format
//!
//! | Column              | Type    | Notes                                  |
//! |---------------------|---------|----------------------------------------|
//! | `municipality_code` | string  | Four digits, e.g. `0301`               |
//! | `name`              | string  | Display name, not used in computations |
//! | `rate`              | decimal | Percentage, e.g. `22.0`                |
//!
//! ```csv
//! municipality_code,name,rate
//! 0301,Oslo,22.0
//! 4601,Bergen,22.0
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::error::LoaderError;

/// A single row of the municipal rates CSV file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MunicipalRateRecord {
    pub municipality_code: String,
    pub name: String,
    pub rate: Decimal,
}

/// Loader for municipal rate tables.
pub struct MunicipalRateLoader;

impl MunicipalRateLoader {
    /// Parse and validate records from a CSV reader. Rows are returned in
    /// file order.
    ///
    /// # Errors
    ///
    /// * [`LoaderError::Csv`] if the CSV is structurally invalid.
    /// * [`LoaderError::InvalidMunicipalityCode`] for a code that is not four
    ///   digits.
    /// * [`LoaderError::InvalidRate`] for a rate outside `0..=100`.
    /// * [`LoaderError::DuplicateMunicipality`] if a code appears twice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<MunicipalRateRecord>, LoaderError> {
        let code_pattern = Regex::new(r"^\d{4}$")?;
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records: Vec<MunicipalRateRecord> = Vec::new();
        for (idx, result) in csv_reader.deserialize().enumerate() {
            let record: MunicipalRateRecord = result?;
            let row = idx + 1;

            if !code_pattern.is_match(&record.municipality_code) {
                return Err(LoaderError::InvalidMunicipalityCode {
                    code: record.municipality_code,
                    row,
                });
            }
            if record.rate < Decimal::ZERO || record.rate > Decimal::ONE_HUNDRED {
                return Err(LoaderError::InvalidRate {
                    code: record.municipality_code,
                    rate: record.rate,
                    row,
                });
            }
            if records
                .iter()
                .any(|existing| existing.municipality_code == record.municipality_code)
            {
                return Err(LoaderError::DuplicateMunicipality {
                    code: record.municipality_code,
                    row,
                });
            }

            records.push(record);
        }

        debug!(count = records.len(), "parsed municipal rates");
        Ok(records)
    }

    /// Read a file from disk and delegate to [`parse`](Self::parse).
    pub fn load_from_file(path: &Path) -> Result<Vec<MunicipalRateRecord>, LoaderError> {
        let file = std::fs::File::open(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(file)
    }

    /// Rate table keyed by municipality code.
    pub fn into_table(records: Vec<MunicipalRateRecord>) -> BTreeMap<String, Decimal> {
        records
            .into_iter()
            .map(|record| (record.municipality_code, record.rate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const TEST_CSV: &str = "\
municipality_code,name,rate
0301,Oslo,22.0
4601,Bergen,21.5
5001,Trondheim,22.0
";

    #[test]
    fn test_parse_csv_rows_in_order() {
        let records = MunicipalRateLoader::parse(TEST_CSV.as_bytes()).expect("valid CSV");

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[1],
            MunicipalRateRecord {
                municipality_code: "4601".to_string(),
                name: "Bergen".to_string(),
                rate: dec!(21.5),
            }
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let csv = "municipality_code,name,rate\n 1101 , Stavanger , 22.0 \n";

        let records = MunicipalRateLoader::parse(csv.as_bytes()).expect("valid CSV");

        assert_eq!(records[0].municipality_code, "1101");
        assert_eq!(records[0].rate, dec!(22.0));
    }

    #[test]
    fn test_into_table_keys_by_code() {
        let records = MunicipalRateLoader::parse(TEST_CSV.as_bytes()).unwrap();

        let table = MunicipalRateLoader::into_table(records);

        assert_eq!(table.len(), 3);
        assert_eq!(table["4601"], dec!(21.5));
    }

    #[test]
    fn test_parse_rejects_short_code() {
        let csv = "municipality_code,name,rate\n301,Oslo,22.0\n";

        let err = MunicipalRateLoader::parse(csv.as_bytes()).expect_err("code is three digits");

        let LoaderError::InvalidMunicipalityCode { code, row } = err else {
            panic!("Expected InvalidMunicipalityCode, got: {:?}", err);
        };
        assert_eq!(code, "301");
        assert_eq!(row, 1);
    }

    #[test]
    fn test_parse_rejects_rate_above_hundred() {
        let csv = "municipality_code,name,rate\n0301,Oslo,122.0\n";

        let err = MunicipalRateLoader::parse(csv.as_bytes()).expect_err("rate out of range");

        assert!(matches!(err, LoaderError::InvalidRate { row: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        let csv = "municipality_code,name,rate\n0301,Oslo,22.0\n0301,Oslo,21.0\n";

        let err = MunicipalRateLoader::parse(csv.as_bytes()).expect_err("duplicate code");

        assert!(matches!(err, LoaderError::DuplicateMunicipality { row: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_bad_decimal() {
        let csv = "municipality_code,name,rate\n0301,Oslo,abc\n";

        let err = MunicipalRateLoader::parse(csv.as_bytes()).expect_err("invalid decimal");

        assert!(matches!(err, LoaderError::Csv(_)));
    }
}
