//! Session configuration, loadable from TOML.

use std::path::Path;

use bgemm_kernels::StreamConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ProfilerError, Result};
use crate::init::InitMethod;
use crate::problem::ProblemArgs;

/// Options for one profiling session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Compare every variant's output with the host reference.
    pub verify: bool,
    pub init: InitMethod,
    /// Dump inputs and outputs when verifying.
    pub log: bool,
    pub time_kernel: bool,
    pub cold_niters: usize,
    pub nrepeat: usize,
    /// Seed for the input generator.
    pub seed: u64,
    /// Suppress the per-variant stdout lines.
    pub quiet: bool,
    pub problem: ProblemArgs,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        let stream = StreamConfig::default();
        Self {
            verify: true,
            init: InitMethod::Integer,
            log: false,
            time_kernel: true,
            cold_niters: stream.cold_niters,
            nrepeat: stream.nrepeat,
            seed: 0x5eed,
            quiet: false,
            problem: ProblemArgs::default(),
        }
    }
}

impl ProfileConfig {
    /// Load from a TOML file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ProfilerError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ProfilerError::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Launch options derived from the timing fields.
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            time_kernel: self.time_kernel,
            cold_niters: self.cold_niters,
            nrepeat: self.nrepeat,
            ..StreamConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "verify = false\nnrepeat = 3\n\n[problem]\nm = 64\nbatch_count = 4\nstride_a = 80"
        )
        .unwrap();

        let config = ProfileConfig::from_file(file.path()).unwrap();
        assert!(!config.verify);
        assert_eq!(config.nrepeat, 3);
        assert_eq!(config.cold_niters, ProfileConfig::default().cold_niters);
        assert_eq!(config.problem.m, 64);
        assert_eq!(config.problem.n, ProblemArgs::default().n);
        assert_eq!(config.problem.stride_a, 80);
        assert_eq!(config.problem.stride_b, -1);
    }

    #[test]
    fn init_method_by_name() {
        let config: ProfileConfig = toml::from_str("init = \"decimal\"").unwrap();
        assert_eq!(config.init, InitMethod::Decimal);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = ProfileConfig { log: true, seed: 17, ..ProfileConfig::default() };
        let text = config.to_toml().unwrap();
        assert_eq!(toml::from_str::<ProfileConfig>(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProfileConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ProfilerError::ConfigIo { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "verify = maybe").unwrap();
        assert!(matches!(
            ProfileConfig::from_file(file.path()),
            Err(ProfilerError::ConfigParse { .. })
        ));
    }
}
