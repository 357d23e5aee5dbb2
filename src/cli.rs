// SPDX-License-Identifier: BSD-3-Clause
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Mode {
    /// Andersen, one solver instance per function
    Intra,
    /// Andersen over everything reachable from `main`
    Inter,
    /// Steensgaard over the whole module
    Steensgaard,
    /// Andersen, per-function tasks on a worker pool
    Parallel,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Intra => write!(f, "intra"),
            Mode::Inter => write!(f, "inter"),
            Mode::Steensgaard => write!(f, "steensgaard"),
            Mode::Parallel => write!(f, "parallel"),
        }
    }
}

/// Pointer analysis for LLVM modules
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Analysis variant
    #[arg(long, value_enum, default_value_t = Mode::Intra)]
    pub analysis: Mode,

    /// Write `<module>.csv` with per-function timings (intra only)
    #[arg(long)]
    pub csv: bool,

    /// LLVM module (bitcode, or textual IR with a .ll extension)
    #[arg()]
    pub module: PathBuf,

    /// Print per-value result sets
    #[arg(long)]
    pub print_results: bool,

    /// Timing repetitions per function for --csv
    #[arg(long, default_value_t = 1)]
    pub runs: u32,

    /// Per-worker runtime summaries (parallel only)
    #[arg(long)]
    pub stats: bool,

    /// Worker threads for --analysis parallel
    #[arg(long, default_value_t = 16)]
    pub threads: usize,

    /// Tracing
    #[arg(long)]
    pub tracing: bool,
}
