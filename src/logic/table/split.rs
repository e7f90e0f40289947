//! Seeded train / hold-out split

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::logic::error::ModelingError;

use super::Table;

/// Shuffle rows with `seed` and hold out `ceil(fraction * n)` of them.
///
/// Returns `(train, holdout)`. Both keep the shuffled order.
pub fn train_test_split(table: &Table, fraction: f64, seed: u64) -> Result<(Table, Table), ModelingError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(ModelingError::InvalidConfig(format!(
            "hold-out fraction must be in (0, 1), got {}",
            fraction
        )));
    }

    let n = table.n_rows();
    let n_test = (fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ModelingError::InvalidConfig(format!(
            "cannot hold out {} of {} rows",
            n_test, n
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let holdout = table.select_rows(&indices[..n_test]).renamed("hold-out");
    let train = table.select_rows(&indices[n_test..]).renamed("training");
    Ok((train, holdout))
}
