use super::meta::{ModelMetadata, PreprocessSpec};
use crate::scoring::InputError;
use crate::table::FeatureTable;

/// Dense row-major feature matrix handed to the models.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: usize,
    width: usize,
    values: Vec<f64>,
}

impl FeatureMatrix {
    /// Builds a matrix from row-major values; `width` must divide the length.
    pub fn new(width: usize, values: Vec<f64>) -> Self {
        let rows = values.len().checked_div(width).unwrap_or(0);
        Self {
            rows,
            width,
            values,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.width;
        &self.values[start..start + self.width]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |index| self.row(index))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum EncodedColumn {
    Numeric { name: String },
    Categorical { name: String, levels: Vec<String> },
}

impl EncodedColumn {
    fn name(&self) -> &str {
        match self {
            EncodedColumn::Numeric { name } | EncodedColumn::Categorical { name, .. } => name,
        }
    }

    fn width(&self) -> usize {
        match self {
            EncodedColumn::Numeric { .. } => 1,
            EncodedColumn::Categorical { levels, .. } => levels.len(),
        }
    }
}

/// Turns raw table cells into model features.
///
/// Columns are emitted in `feature_cols` order. Numeric columns pass through,
/// with empty cells becoming NaN; categorical columns one-hot encode over
/// their declared levels, and unseen levels encode as all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEncoder {
    columns: Vec<EncodedColumn>,
}

impl FeatureEncoder {
    pub fn new(metadata: &ModelMetadata, preprocess: &PreprocessSpec) -> Self {
        let columns = metadata
            .feature_cols
            .iter()
            .map(|name| {
                if metadata.is_categorical(name) {
                    EncodedColumn::Categorical {
                        name: name.clone(),
                        levels: preprocess.categories.get(name).cloned().unwrap_or_default(),
                    }
                } else {
                    EncodedColumn::Numeric { name: name.clone() }
                }
            })
            .collect();

        Self { columns }
    }

    pub fn width(&self) -> usize {
        self.columns.iter().map(EncodedColumn::width).sum()
    }

    pub fn encode(&self, table: &FeatureTable) -> Result<FeatureMatrix, InputError> {
        let mut indices = Vec::with_capacity(self.columns.len());
        let mut missing = Vec::new();
        for column in &self.columns {
            match table.column_index(column.name()) {
                Some(index) => indices.push(index),
                None => missing.push(column.name().to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(InputError::MissingColumns(missing));
        }

        let width = self.width();
        let mut values = Vec::with_capacity(table.len() * width);

        for row in 0..table.len() {
            for (column, &index) in self.columns.iter().zip(&indices) {
                let cell = table.cell(row, index);
                match column {
                    EncodedColumn::Numeric { name } => values.push(parse_numeric(cell, row, name)?),
                    EncodedColumn::Categorical { levels, .. } => {
                        values.extend(levels.iter().map(|level| {
                            if level == cell {
                                1.0
                            } else {
                                0.0
                            }
                        }));
                    }
                }
            }
        }

        Ok(FeatureMatrix {
            rows: table.len(),
            width,
            values,
        })
    }
}

fn parse_numeric(cell: &str, row: usize, column: &str) -> Result<f64, InputError> {
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>().map_err(|_| InputError::InvalidNumber {
        row,
        column: column.to_string(),
        value: cell.to_string(),
    })
}
