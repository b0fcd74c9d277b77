//! Encoded training table shared by all four models.

use chrono::NaiveDateTime;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::encoder::{EncoderKind, EncodingError, LabelEncoder};
use crate::extract::ExtractedRow;
use crate::schema::{FEATURE_COUNT, FeatureRow};

/// The three fitted categorical encoders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoders {
    /// Operational region encoder.
    pub region: LabelEncoder,
    /// Initial report encoder.
    pub report: LabelEncoder,
    /// Incident group encoder.
    pub group: LabelEncoder,
}

impl Encoders {
    /// Fits all three encoders on the extracted corpus.
    #[must_use]
    pub fn fit(rows: &[ExtractedRow]) -> Self {
        Self {
            region: LabelEncoder::fit(EncoderKind::Region, rows.iter().map(|r| &r.region)),
            report: LabelEncoder::fit(EncoderKind::Report, rows.iter().map(|r| &r.report_text)),
            group: LabelEncoder::fit(EncoderKind::Group, rows.iter().map(|r| &r.group_label)),
        }
    }

    /// Encodes a single model input.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::UnknownCategory`] if `region` or `report` was
    /// not seen during fitting.
    pub fn encode_features(
        &self,
        region: &str,
        occurred_at: NaiveDateTime,
        report: &str,
    ) -> Result<FeatureRow, EncodingError> {
        Ok(FeatureRow::new(
            self.region.encode(region)?,
            occurred_at,
            self.report.encode(report)?,
        ))
    }
}

/// Encoded features and every target column, row-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingTable {
    /// Model inputs.
    pub features: Vec<FeatureRow>,
    /// Encoded incident group per row.
    pub group_codes: Vec<u32>,
    /// Casualty count per row.
    pub casualties: Vec<f64>,
    /// Response minutes per row.
    pub response_minutes: Vec<f64>,
    /// Mass-casualty flag per row (0 or 1).
    pub mass_flags: Vec<u32>,
}

impl TrainingTable {
    /// Encodes every extracted row with `encoders`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError`] if a row holds a category absent from the
    /// encoders, which only happens when the encoders were fitted on a
    /// different corpus.
    pub fn build(rows: &[ExtractedRow], encoders: &Encoders) -> Result<Self, EncodingError> {
        let mut table = Self {
            features: Vec::with_capacity(rows.len()),
            group_codes: Vec::with_capacity(rows.len()),
            casualties: Vec::with_capacity(rows.len()),
            response_minutes: Vec::with_capacity(rows.len()),
            mass_flags: Vec::with_capacity(rows.len()),
        };

        for row in rows {
            table.features.push(encoders.encode_features(
                &row.region,
                row.occurred_at,
                &row.report_text,
            )?);
            table.group_codes.push(encoders.group.encode(&row.group_label)?);
            table.casualties.push(f64::from(row.casualty_count));
            table.response_minutes.push(row.response_minutes);
            table.mass_flags.push(u32::from(row.mass_flag));
        }

        Ok(table)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Dense `rows x FEATURE_COUNT` input matrix in model column order.
    #[must_use]
    pub fn feature_matrix(&self) -> Array2<f64> {
        let mut matrix = Array2::zeros((self.len(), FEATURE_COUNT));
        for (mut out, row) in matrix.rows_mut().into_iter().zip(&self.features) {
            for (cell, value) in out.iter_mut().zip(row.to_values()) {
                *cell = value;
            }
        }
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(region: &str, report: &str, group: &str, casualties: u32) -> ExtractedRow {
        ExtractedRow {
            region: region.to_string(),
            occurred_at: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            report_text: report.to_string(),
            group_label: group.to_string(),
            casualty_count: casualties,
            response_minutes: 12.5,
            mass_flag: u8::from(casualties >= 5),
        }
    }

    fn rows() -> Vec<ExtractedRow> {
        vec![
            row("RMR", "Pedestrian struck", "PRE_HOSPITAL_CARE", 1),
            row("SERTAO", "Vegetation fire", "FIRE", 0),
            row("MATA", "Pedestrian struck", "PRE_HOSPITAL_CARE", 6),
        ]
    }

    #[test]
    fn encoders_cover_corpus_vocabulary() {
        let encoders = Encoders::fit(&rows());
        assert_eq!(encoders.region.len(), 3);
        assert_eq!(encoders.report.len(), 2);
        assert_eq!(encoders.group.len(), 2);
    }

    #[test]
    fn table_columns_are_row_aligned() {
        let rows = rows();
        let encoders = Encoders::fit(&rows);
        let table = TrainingTable::build(&rows, &encoders).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.group_codes, vec![1, 0, 1]);
        assert_eq!(table.casualties, vec![1.0, 0.0, 6.0]);
        assert_eq!(table.mass_flags, vec![0, 0, 1]);
        assert_eq!(table.features[1].region_code, encoders.region.encode("SERTAO").unwrap());
    }

    #[test]
    fn feature_matrix_uses_schema_order() {
        let rows = rows();
        let encoders = Encoders::fit(&rows);
        let table = TrainingTable::build(&rows, &encoders).unwrap();
        let matrix = table.feature_matrix();

        assert_eq!(matrix.dim(), (3, FEATURE_COUNT));
        // 2024-03-04 is a Monday.
        assert_eq!(matrix.row(0).to_vec(), vec![1.0, 9.0, 0.0, 0.0]);
        assert_eq!(matrix.row(1).to_vec(), vec![2.0, 9.0, 0.0, 1.0]);
    }

    #[test]
    fn foreign_encoders_are_rejected() {
        let encoders = Encoders::fit(&rows()[..1]);
        assert!(TrainingTable::build(&rows(), &encoders).is_err());
    }
}
