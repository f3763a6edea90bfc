//! Compensated chi-square over binned data.
//!
//! The statistic is a sum of `(model − data)² / error²` over bins, accumulated
//! with compensated summation (`math::kahan`) because a minimizer evaluates it
//! thousands of times and the terms span many orders of magnitude.
//!
//! Evaluation is expressed over a `[first, last)` bin range with a stride so
//! disjoint partitions of one dataset can be computed independently (here: on
//! rayon workers) and merged afterwards. Partitions never overlap; merging
//! folds each partition's carry exactly once, in ascending partition order.
//!
//! Per-bin policy, in order:
//! - invalid bins are skipped;
//! - bins with zero data weight are skipped (they carry no statistical
//!   information under the stored-error convention);
//! - a zero uncertainty on a countable bin is a dataset inconsistency: the
//!   whole evaluation aborts, reporting the first such bin in scan order.

use rayon::prelude::*;

use crate::error::AppError;
use crate::hist::Hist1d;
use crate::math::CompensatedSum;

/// One bin of a binned dataset.
#[derive(Debug, Clone, Copy)]
pub struct Bin {
    /// Coordinate at which the model is evaluated.
    pub center: f64,
    /// Observed weight (event count).
    pub weight: f64,
    /// Low-side uncertainty, used when the model undershoots.
    pub err_low: f64,
    /// High-side uncertainty, used when the model overshoots.
    pub err_high: f64,
    /// Bin volume multiplying the model density.
    pub volume: f64,
    pub valid: bool,
}

/// Binned dataset the chi-square runs over.
#[derive(Debug, Clone, Default)]
pub struct BinnedData {
    bins: Vec<Bin>,
}

impl BinnedData {
    pub fn new(bins: Vec<Bin>) -> Self {
        Self { bins }
    }

    /// Poisson-style view of a 1D histogram: symmetric `sqrt(n)` errors and
    /// the bin width as volume.
    pub fn from_hist(hist: &Hist1d) -> Self {
        let bins = (0..hist.nbins())
            .map(|i| {
                let weight = hist.content(i);
                let err = weight.max(0.0).sqrt();
                Bin {
                    center: hist.bin_center(i),
                    weight,
                    err_low: err,
                    err_high: err,
                    volume: hist.bin_width(),
                    valid: true,
                }
            })
            .collect();
        Self { bins }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Total data weight over valid bins.
    pub fn sum_entries(&self) -> f64 {
        self.bins
            .iter()
            .filter(|b| b.valid)
            .map(|b| b.weight)
            .sum()
    }
}

/// How the model value is normalized into an expected bin count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FuncMode {
    /// The model already yields counts per unit volume.
    Function,
    /// The model is a probability density; scale by the total data weight.
    Pdf,
    /// The model is a density with its own event-count prediction.
    ExtendedPdf { expected: f64 },
}

/// Which uncertainty enters the denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Asymmetric stored errors, picked by the residual's sign.
    Stored,
    /// `sqrt(model)` expected errors.
    Expected,
}

/// A contiguous evaluation range with stride.
#[derive(Debug, Clone, Copy)]
pub struct Partition {
    pub first: usize,
    pub last: usize,
    pub step: usize,
}

impl Partition {
    pub fn full(data: &BinnedData) -> Self {
        Self {
            first: 0,
            last: data.len(),
            step: 1,
        }
    }
}

/// Chi-square evaluator configuration.
#[derive(Debug, Clone, Copy)]
pub struct ChiSquare {
    pub mode: FuncMode,
    pub errors: ErrorMode,
}

impl ChiSquare {
    /// Evaluate one partition.
    ///
    /// Returns the partition's `(sum, carry)` accumulator; the caller merges
    /// partitions with [`CompensatedSum::merge`].
    pub fn evaluate_partition<F>(
        &self,
        data: &BinnedData,
        model: F,
        partition: Partition,
    ) -> Result<CompensatedSum, AppError>
    where
        F: Fn(f64) -> f64,
    {
        if partition.step == 0 {
            return Err(AppError::config("Partition stride must be at least 1."));
        }
        if partition.first > partition.last || partition.last > data.len() {
            return Err(AppError::config(format!(
                "Partition [{}, {}) out of range for {} bins.",
                partition.first,
                partition.last,
                data.len()
            )));
        }

        let norm_factor = match self.mode {
            FuncMode::Function => 1.0,
            FuncMode::Pdf => data.sum_entries(),
            FuncMode::ExtendedPdf { expected } => expected,
        };

        let mut acc = CompensatedSum::new();
        let mut i = partition.first;
        while i < partition.last {
            let bin = &data.bins()[i];
            if !bin.valid {
                i += partition.step;
                continue;
            }

            let n_data = bin.weight;
            let n_pdf = model(bin.center) * norm_factor * bin.volume;
            let residual = n_pdf - n_data;

            let err_int = match self.errors {
                ErrorMode::Expected => n_pdf.sqrt(),
                ErrorMode::Stored => {
                    if residual > 0.0 {
                        bin.err_high
                    } else {
                        bin.err_low
                    }
                }
            };

            if n_data == 0.0 {
                i += partition.step;
                continue;
            }
            if err_int == 0.0 {
                return Err(AppError::numeric(format!(
                    "Chi-square evaluation failed: bin {i} has zero error."
                )));
            }

            acc.add(residual * residual / (err_int * err_int));
            i += partition.step;
        }

        Ok(acc)
    }

    /// Evaluate the full range as a single partition.
    pub fn evaluate<F>(&self, data: &BinnedData, model: F) -> Result<CompensatedSum, AppError>
    where
        F: Fn(f64) -> f64,
    {
        self.evaluate_partition(data, model, Partition::full(data))
    }

    /// Evaluate the full range split into `n_partitions` disjoint chunks on
    /// rayon workers, merged in ascending partition order.
    ///
    /// A zero-error bin aborts the whole evaluation; the reported bin is the
    /// lowest-index offender (each chunk stops at its first, and chunks are
    /// inspected in order).
    pub fn evaluate_parallel<F>(
        &self,
        data: &BinnedData,
        model: F,
        n_partitions: usize,
    ) -> Result<CompensatedSum, AppError>
    where
        F: Fn(f64) -> f64 + Sync,
    {
        let n_partitions = n_partitions.max(1).min(data.len().max(1));
        let chunk = data.len().div_ceil(n_partitions);

        let results: Vec<Result<CompensatedSum, AppError>> = (0..n_partitions)
            .into_par_iter()
            .map(|p| {
                let first = p * chunk;
                let last = ((p + 1) * chunk).min(data.len());
                self.evaluate_partition(data, &model, Partition { first, last, step: 1 })
            })
            .collect();

        let mut total = CompensatedSum::new();
        for result in results {
            total.merge(result?);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poisson_like_data(n: usize) -> BinnedData {
        let bins = (0..n)
            .map(|i| {
                let weight = 40.0 + 25.0 * ((i as f64 - n as f64 / 2.0) / 4.0).tanh();
                Bin {
                    center: i as f64,
                    weight,
                    err_low: weight.sqrt(),
                    err_high: weight.sqrt(),
                    volume: 1.0,
                    valid: true,
                }
            })
            .collect();
        BinnedData::new(bins)
    }

    fn model(x: f64) -> f64 {
        42.0 + 0.8 * x
    }

    #[test]
    fn perfect_model_gives_zero_chi_square() {
        let data = poisson_like_data(20);
        let stat = ChiSquare {
            mode: FuncMode::Function,
            errors: ErrorMode::Stored,
        };
        let weights: Vec<f64> = data.bins().iter().map(|b| b.weight).collect();
        let v = stat
            .evaluate(&data, |x| weights[x as usize])
            .unwrap()
            .value();
        assert!(v.abs() < 1e-12);
    }

    #[test]
    fn split_partitions_merge_to_the_single_pass_value() {
        let data = poisson_like_data(100);
        let stat = ChiSquare {
            mode: FuncMode::Function,
            errors: ErrorMode::Stored,
        };

        let whole = stat
            .evaluate_partition(&data, model, Partition { first: 0, last: 100, step: 1 })
            .unwrap();
        let first = stat
            .evaluate_partition(&data, model, Partition { first: 0, last: 50, step: 1 })
            .unwrap();
        let second = stat
            .evaluate_partition(&data, model, Partition { first: 50, last: 100, step: 1 })
            .unwrap();

        let mut merged = first;
        merged.merge(second);
        assert!((merged.value() - whole.value()).abs() < 1e-9 * whole.value().abs().max(1.0));
    }

    #[test]
    fn parallel_evaluation_matches_sequential() {
        let data = poisson_like_data(97);
        let stat = ChiSquare {
            mode: FuncMode::Function,
            errors: ErrorMode::Stored,
        };
        let seq = stat.evaluate(&data, model).unwrap().value();
        let par = stat.evaluate_parallel(&data, model, 8).unwrap().value();
        assert!((seq - par).abs() < 1e-9 * seq.abs().max(1.0));
    }

    #[test]
    fn zero_weight_bins_are_skipped() {
        let mut bins = poisson_like_data(10).bins().to_vec();
        bins[4].weight = 0.0;
        bins[4].err_low = 0.0;
        bins[4].err_high = 0.0;
        let data = BinnedData::new(bins);
        let stat = ChiSquare {
            mode: FuncMode::Function,
            errors: ErrorMode::Stored,
        };
        // The zero-weight bin would divide by zero if it were not skipped.
        assert!(stat.evaluate(&data, model).is_ok());
    }

    #[test]
    fn invalid_bins_are_skipped() {
        let mut bins = poisson_like_data(10).bins().to_vec();
        bins[2].valid = false;
        bins[2].err_low = 0.0;
        bins[2].err_high = 0.0;
        let data = BinnedData::new(bins);
        let stat = ChiSquare {
            mode: FuncMode::Function,
            errors: ErrorMode::Stored,
        };
        assert!(stat.evaluate(&data, model).is_ok());
    }

    #[test]
    fn first_zero_error_bin_aborts_with_its_index() {
        let mut bins = poisson_like_data(10).bins().to_vec();
        for &i in &[3usize, 7] {
            bins[i].err_low = 0.0;
            bins[i].err_high = 0.0;
        }
        let data = BinnedData::new(bins);
        let stat = ChiSquare {
            mode: FuncMode::Function,
            errors: ErrorMode::Stored,
        };
        let err = stat.evaluate(&data, model).unwrap_err();
        assert!(err.to_string().contains("bin 3"), "got: {err}");
    }

    #[test]
    fn pdf_mode_scales_by_total_entries() {
        // Uniform pdf over 10 unit bins: expected count per bin is
        // sum_entries / 10, which matches the data exactly.
        let bins = (0..10)
            .map(|i| Bin {
                center: i as f64,
                weight: 5.0,
                err_low: 5.0f64.sqrt(),
                err_high: 5.0f64.sqrt(),
                volume: 1.0,
                valid: true,
            })
            .collect();
        let data = BinnedData::new(bins);
        let stat = ChiSquare {
            mode: FuncMode::Pdf,
            errors: ErrorMode::Stored,
        };
        let v = stat.evaluate(&data, |_| 0.1).unwrap().value();
        assert!(v.abs() < 1e-12, "got {v}");
    }

    #[test]
    fn expected_error_mode_uses_sqrt_of_model() {
        let bins = vec![Bin {
            center: 0.0,
            weight: 9.0,
            err_low: 123.0,
            err_high: 456.0,
            volume: 1.0,
            valid: true,
        }];
        let data = BinnedData::new(bins);
        let stat = ChiSquare {
            mode: FuncMode::Function,
            errors: ErrorMode::Expected,
        };
        // model = 16, data = 9: term = (16-9)^2 / 16.
        let v = stat.evaluate(&data, |_| 16.0).unwrap().value();
        assert!((v - 49.0 / 16.0).abs() < 1e-12);
    }
}
