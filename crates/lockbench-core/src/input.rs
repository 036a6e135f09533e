//! Input synthesis
//!
//! Builds the cyclic grid workload and writes it, prefixed by the run
//! parameters, to the shared input artifact. The grid is a structured load,
//! never checked for Sudoku validity.

use crate::error::{HarnessError, HarnessResult};
use crate::types::RunConfig;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Square grid filled by the cyclic placement formula
///
/// Cells are computed on demand; a 10000×10000 grid is never held in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    root: usize,
}

impl Grid {
    /// Create the cyclic grid of side `size`
    ///
    /// # Errors
    /// Returns `InvalidParameter` if `size` is zero or not a perfect square
    pub fn cyclic(size: u32) -> HarnessResult<Self> {
        let size = size as usize;
        let root = integer_sqrt(size);
        if size == 0 || root * root != size {
            return Err(HarnessError::InvalidParameter(format!(
                "grid size {size} must be a positive perfect square"
            )));
        }
        Ok(Self { size, root })
    }

    /// Side length
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Value at row `i`, column `j`, in `1..=size`
    #[inline]
    #[must_use]
    pub fn cell(&self, i: usize, j: usize) -> usize {
        let n = self.root;
        ((n * (i % n) + i / n + j) % self.size) + 1
    }

    /// Values of row `i`
    pub fn row(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).map(move |j| self.cell(i, j))
    }
}

fn integer_sqrt(value: usize) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let mut root = (value as f64).sqrt() as usize;
    while root * root > value {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= value {
        root += 1;
    }
    root
}

/// Run parameters plus grid, as consumed by every benchmarked program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputArtifact {
    /// Header line
    pub config: RunConfig,
    /// Workload
    pub grid: Grid,
}

impl InputArtifact {
    /// Build the artifact for `config`
    ///
    /// # Errors
    /// Returns `InvalidParameter` if the grid size is not a perfect square
    pub fn new(config: RunConfig) -> HarnessResult<Self> {
        let grid = Grid::cyclic(config.grid_size)?;
        Ok(Self { config, grid })
    }

    /// Serialize to `out`
    ///
    /// Header line, then one line per row; the last row has no trailing
    /// newline.
    ///
    /// # Errors
    /// Propagates write errors from `out`
    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        writeln!(out, "{}", self.config)?;
        for i in 0..self.grid.size() {
            if i > 0 {
                out.write_all(b"\n")?;
            }
            for (j, value) in self.grid.row(i).enumerate() {
                if j > 0 {
                    out.write_all(b" ")?;
                }
                write!(out, "{value}")?;
            }
        }
        out.flush()
    }
}

/// Writes input artifacts to a fixed path
#[derive(Debug, Clone)]
pub struct InputSynthesizer {
    path: PathBuf,
}

impl InputSynthesizer {
    /// Create a synthesizer targeting `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Artifact location
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate `config`, then overwrite the input artifact
    ///
    /// # Errors
    /// - `InvalidParameter` before any I/O if the grid size is not a
    ///   perfect square
    /// - `Io` if the artifact cannot be written
    pub fn synthesize(&self, config: RunConfig) -> HarnessResult<InputArtifact> {
        let artifact = InputArtifact::new(config)?;
        tracing::debug!(path = %self.path.display(), %config, "writing input artifact");

        let file = File::create(&self.path).map_err(|e| HarnessError::io(&self.path, e))?;
        artifact
            .write_to(BufWriter::new(file))
            .map_err(|e| HarnessError::io(&self.path, e))?;
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn render(artifact: &InputArtifact) -> String {
        let mut buf = Vec::new();
        artifact.write_to(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn golden_nine_by_nine() {
        let grid = Grid::cyclic(9).unwrap();
        let rows: Vec<Vec<usize>> = (0..9).map(|i| grid.row(i).collect()).collect();
        assert_eq!(rows[0], vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(rows[1], vec![4, 5, 6, 7, 8, 9, 1, 2, 3]);
        assert_eq!(rows[2], vec![7, 8, 9, 1, 2, 3, 4, 5, 6]);
        assert_eq!(rows[3], vec![2, 3, 4, 5, 6, 7, 8, 9, 1]);
        assert_eq!(rows[4], vec![5, 6, 7, 8, 9, 1, 2, 3, 4]);
        assert_eq!(rows[5], vec![8, 9, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(rows[6], vec![3, 4, 5, 6, 7, 8, 9, 1, 2]);
        assert_eq!(rows[7], vec![6, 7, 8, 9, 1, 2, 3, 4, 5]);
        assert_eq!(rows[8], vec![9, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(grid.cell(0, 0), 1);
        assert_eq!(grid.cell(1, 0), 4);
    }

    #[test]
    fn rejects_non_square_sizes() {
        for size in [0, 2, 50, 99, 101] {
            let err = Grid::cyclic(size).unwrap_err();
            assert!(matches!(err, HarnessError::InvalidParameter(_)), "size {size}");
        }
    }

    #[test]
    fn render_layout() {
        let artifact = InputArtifact::new(RunConfig::new(2, 4, 3)).unwrap();
        assert_eq!(render(&artifact), "2 4 3\n1 2 3 4\n3 4 1 2\n2 3 4 1\n4 1 2 3");
    }

    #[test]
    fn hundred_grid_shape() {
        let artifact = InputArtifact::new(RunConfig::new(8, 100, 20)).unwrap();
        let text = render(&artifact);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("8 100 20"));
        let rows: Vec<&str> = lines.collect();
        assert_eq!(rows.len(), 100);
        for row in rows {
            let values: Vec<usize> = row.split(' ').map(|v| v.parse().unwrap()).collect();
            assert_eq!(values.len(), 100);
            assert!(values.iter().all(|v| (1..=100).contains(v)));
        }
    }

    #[test]
    fn integer_sqrt_is_exact() {
        assert_eq!(integer_sqrt(0), 0);
        assert_eq!(integer_sqrt(99), 9);
        assert_eq!(integer_sqrt(100), 10);
        assert_eq!(integer_sqrt(10_000), 100);
    }

    proptest! {
        #[test]
        fn prop_rows_are_permutations(root in 1usize..12) {
            let size = root * root;
            let grid = Grid::cyclic(u32::try_from(size).unwrap()).unwrap();
            for i in 0..size {
                let mut row: Vec<usize> = grid.row(i).collect();
                row.sort_unstable();
                prop_assert_eq!(row, (1..=size).collect::<Vec<_>>());
            }
        }

        #[test]
        fn prop_non_squares_rejected(size in 2u32..5000) {
            let root = integer_sqrt(size as usize);
            prop_assume!(root * root != size as usize);
            prop_assert!(Grid::cyclic(size).is_err());
        }
    }
}
