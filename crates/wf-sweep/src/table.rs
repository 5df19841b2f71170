//! Result table: one row per sample, inputs then outputs.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::debug;
use wf_core::lerp;

use crate::error::{SweepError, SweepResult};
use crate::sampling::Grid;

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub sample: usize,
    pub inputs: Vec<f64>,
    /// NaN where the sample failed or the output could not be evaluated.
    pub outputs: Vec<f64>,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    input_names: Vec<String>,
    output_names: Vec<String>,
    rows: Vec<ResultRow>,
    grid: Grid,
}

impl ResultTable {
    pub(crate) fn new(
        input_names: Vec<String>,
        output_names: Vec<String>,
        rows: Vec<ResultRow>,
        grid: Grid,
    ) -> Self {
        Self {
            input_names,
            output_names,
            rows,
            grid,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    /// Field names in declaration order, inputs first.
    pub fn header(&self) -> Vec<&str> {
        self.input_names
            .iter()
            .chain(&self.output_names)
            .map(String::as_str)
            .collect()
    }

    pub fn failed_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.converged).count()
    }

    /// Values of one input or output field, by name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        if let Some(k) = self.input_names.iter().position(|n| n == name) {
            return Some(self.rows.iter().map(|r| r.inputs[k]).collect());
        }
        let k = self.output_names.iter().position(|n| n == name)?;
        Some(self.rows.iter().map(|r| r.outputs[k]).collect())
    }

    /// Fill NaN outputs of failed samples from converged neighbours.
    ///
    /// Along each grid dimension the nearest converged, finite samples on
    /// both sides are found with the other coordinates held; a dimension
    /// bracketing the cell contributes the linear interpolation between
    /// them. The cell takes the mean of all contributions. Cells with no
    /// bracketing dimension (edges, isolated failures) stay NaN.
    ///
    /// Returns the number of cells filled.
    pub fn interpolate_failed(&mut self) -> usize {
        let shape = self.grid.shape();
        let coords: Vec<Vec<f64>> = (0..shape.len()).map(|d| self.grid.coordinates(d)).collect();
        let known = |row: &ResultRow, k: usize| row.converged && row.outputs[k].is_finite();

        let mut fills = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            if row.converged {
                continue;
            }
            let pos = self.grid.position(i);
            for k in 0..self.output_names.len() {
                if row.outputs[k].is_finite() {
                    continue;
                }
                let mut estimates = Vec::new();
                for d in 0..shape.len() {
                    let neighbour = |step: isize| {
                        let mut p = pos.clone();
                        loop {
                            let next = p[d] as isize + step;
                            if next < 0 || next as usize >= shape[d] {
                                return None;
                            }
                            p[d] = next as usize;
                            let r = &self.rows[self.grid.index(&p)];
                            if known(r, k) {
                                return Some((coords[d][p[d]], r.outputs[k]));
                            }
                        }
                    };
                    if let (Some((x0, y0)), Some((x1, y1))) = (neighbour(-1), neighbour(1)) {
                        estimates.push(lerp(x0, y0, x1, y1, coords[d][pos[d]]));
                    }
                }
                if !estimates.is_empty() {
                    let mean = estimates.iter().sum::<f64>() / estimates.len() as f64;
                    fills.push((i, k, mean));
                }
            }
        }

        for &(i, k, v) in &fills {
            self.rows[i].outputs[k] = v;
        }
        debug!(filled = fills.len(), "interpolated failed samples");
        fills.len()
    }

    /// Delimited text with a header line; NaN is written as `NaN`.
    pub fn to_delimited(&self, delimiter: char) -> String {
        let sep = delimiter.to_string();
        let mut out = self.header().join(&sep);
        out.push('\n');
        for row in &self.rows {
            let cells: Vec<String> = row
                .inputs
                .iter()
                .chain(&row.outputs)
                .map(|v| v.to_string())
                .collect();
            let _ = writeln!(out, "{}", cells.join(&sep));
        }
        out
    }

    pub fn write_delimited(&self, path: &Path, delimiter: char) -> SweepResult<()> {
        fs::write(path, self.to_delimited(delimiter)).map_err(|e| SweepError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
