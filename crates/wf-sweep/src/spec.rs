//! Sweep specification: sampled inputs and recorded outputs.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{SweepError, SweepResult};
use crate::sampling::{Grid, SampleMode, Sampling};

/// A sampled field: `target` names a variable of the case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputField {
    pub name: String,
    pub target: String,
    pub sampling: Sampling,
}

/// A recorded field: `reference` names a variable, constraint or expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputField {
    pub name: String,
    pub reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepSpec {
    pub inputs: Vec<InputField>,
    #[serde(default)]
    pub outputs: Vec<OutputField>,
    #[serde(default)]
    pub mode: SampleMode,
    /// Fill failed samples from converged grid neighbours.
    #[serde(default)]
    pub interpolate: bool,
    /// Seed for random sampling rules. Without one, every grid draws fresh
    /// values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl SweepSpec {
    pub fn new(mode: SampleMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn input(mut self, name: &str, target: &str, sampling: Sampling) -> Self {
        self.inputs.push(InputField {
            name: name.to_string(),
            target: target.to_string(),
            sampling,
        });
        self
    }

    pub fn output(mut self, name: &str, reference: &str) -> Self {
        self.outputs.push(OutputField {
            name: name.to_string(),
            reference: reference.to_string(),
        });
        self
    }

    pub fn with_interpolation(mut self) -> Self {
        self.interpolate = true;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of samples the sweep will run.
    pub fn sample_count(&self) -> SweepResult<usize> {
        Ok(self.grid()?.len())
    }

    /// Check the field structure and build the sample grid. Does not look
    /// at any case.
    ///
    /// Random rules draw from one generator in field order, so a seeded spec
    /// always yields the same grid.
    pub fn grid(&self) -> SweepResult<Grid> {
        if self.inputs.is_empty() {
            return Err(SweepError::EmptySpec);
        }

        let mut names = HashSet::new();
        let all_names = self
            .inputs
            .iter()
            .map(|f| &f.name)
            .chain(self.outputs.iter().map(|f| &f.name));
        for name in all_names {
            if !names.insert(name.as_str()) {
                return Err(SweepError::DuplicateField { name: name.clone() });
            }
        }

        for field in &self.inputs {
            if let Some(what) = field.sampling.problem() {
                return Err(SweepError::InvalidSampling {
                    field: field.name.clone(),
                    what,
                });
            }
        }

        if self.interpolate
            && let Some(field) = self.inputs.iter().find(|f| f.sampling.is_random())
        {
            return Err(SweepError::InvalidSampling {
                field: field.name.clone(),
                what: "interpolation needs a deterministic grid".to_string(),
            });
        }

        if self.mode == SampleMode::Paired {
            let expected = self.inputs[0].sampling.len();
            for field in &self.inputs[1..] {
                let found = field.sampling.len();
                if found != expected {
                    return Err(SweepError::PairedLength {
                        field: field.name.clone(),
                        expected,
                        found,
                    });
                }
            }
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let axes = self
            .inputs
            .iter()
            .map(|f| {
                f.sampling
                    .values(&mut rng)
                    .map_err(|what| SweepError::InvalidSampling {
                        field: f.name.clone(),
                        what,
                    })
            })
            .collect::<SweepResult<Vec<_>>>()?;
        Ok(Grid::new(self.mode, axes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spec_is_rejected() {
        assert_eq!(
            SweepSpec::default().grid().unwrap_err(),
            SweepError::EmptySpec
        );
    }

    #[test]
    fn duplicate_names_across_inputs_and_outputs() {
        let spec = SweepSpec::default()
            .input("x", "x", Sampling::linear(0.0, 1.0, 2))
            .output("x", "y");
        assert_eq!(
            spec.grid().unwrap_err(),
            SweepError::DuplicateField { name: "x".into() }
        );
    }

    #[test]
    fn paired_lengths_must_match() {
        let spec = SweepSpec::new(SampleMode::Paired)
            .input("a", "a", Sampling::linear(0.0, 1.0, 3))
            .input("b", "b", Sampling::list(vec![1.0, 2.0]));
        assert_eq!(
            spec.grid().unwrap_err(),
            SweepError::PairedLength {
                field: "b".into(),
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn sample_counts_per_mode() {
        let cartesian = SweepSpec::default()
            .input("a", "a", Sampling::linear(0.0, 1.0, 3))
            .input("b", "b", Sampling::list(vec![1.0, 2.0]));
        assert_eq!(cartesian.sample_count().unwrap(), 6);

        let paired = SweepSpec::new(SampleMode::Paired)
            .input("a", "a", Sampling::linear(0.0, 1.0, 2))
            .input("b", "b", Sampling::list(vec![1.0, 2.0]));
        assert_eq!(paired.sample_count().unwrap(), 2);
    }

    #[test]
    fn zero_samples_name_the_field() {
        let spec = SweepSpec::default().input("recovery", "r", Sampling::linear(0.0, 1.0, 0));
        assert!(matches!(
            spec.grid(),
            Err(SweepError::InvalidSampling { field, .. }) if field == "recovery"
        ));
    }

    #[test]
    fn seeded_random_grid_is_reproducible() {
        let spec = SweepSpec::new(SampleMode::Paired)
            .input("a", "a", Sampling::latin_hypercube(0.0, 1.0, 6))
            .input("b", "b", Sampling::uniform(5.0, 6.0, 6))
            .with_seed(11);
        let grid = spec.grid().unwrap();
        assert_eq!(grid.len(), 6);
        assert_eq!(grid, spec.grid().unwrap());
        assert_ne!(grid, spec.clone().with_seed(12).grid().unwrap());

        // each dimension of the paired design hits every stratum once
        let mut strata: Vec<usize> = grid
            .samples()
            .iter()
            .map(|s| (s[0] * 6.0).floor() as usize)
            .collect();
        strata.sort_unstable();
        assert_eq!(strata, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn random_fields_cannot_be_interpolated() {
        let spec = SweepSpec::default()
            .input("a", "a", Sampling::linear(0.0, 1.0, 3))
            .input("b", "b", Sampling::normal(1.0, 0.1, 3))
            .with_interpolation()
            .with_seed(0);
        assert!(matches!(
            spec.grid(),
            Err(SweepError::InvalidSampling { field, .. }) if field == "b"
        ));
    }

    #[test]
    fn yaml_round_trip() {
        let text = r#"
inputs:
  - name: recovery
    target: fs.unit.recovery_frac_mass_H2O
    sampling: {type: linear, lower: 0.5, upper: 0.9, num_samples: 5}
outputs:
  - name: lcow
    reference: costing.LCOW
interpolate: true
seed: 1
"#;
        let spec: SweepSpec = serde_yaml::from_str(text).unwrap();
        assert_eq!(spec.mode, SampleMode::Cartesian);
        assert!(spec.interpolate);
        assert_eq!(spec.seed, Some(1));
        assert_eq!(spec.sample_count().unwrap(), 5);
        let back: SweepSpec = serde_yaml::from_str(&serde_yaml::to_string(&spec).unwrap()).unwrap();
        assert_eq!(back, spec);
    }
}
