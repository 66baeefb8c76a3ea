use std::{fs, path::Path};

use anyhow::anyhow;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::argv::{to_argv, ArgValue};
use crate::error::AlignError;
use crate::io::LogTarget;

/// Everything needed to construct an [`Aligner`](crate::Aligner).
///
/// Options are forwarded to the index as long flags, in the order they were
/// added (or appear in the YAML file).
///
/// ```yaml
/// debug_log: stderr
/// options:
///   ref: genome
///   PML: true
///   threads: 8
/// positional: []
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignerOpts {
    #[serde(default)]
    pub debug_log: Option<LogTarget>,
    #[serde(default)]
    pub options: IndexMap<String, ArgValue>,
    #[serde(default)]
    pub positional: Vec<ArgValue>,
}

impl AlignerOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AlignError> {
        let yaml_str = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&yaml_str)?)
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn with_positional(mut self, value: impl Into<ArgValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn with_debug_log(mut self, target: LogTarget) -> Self {
        self.debug_log = Some(target);
        self
    }

    /// The argument vector handed to the index.
    pub fn to_argv(&self) -> Vec<String> {
        to_argv(&self.options, &self.positional)
    }

    /// Threads the index engine should use, taken from the `threads` option.
    /// Defaults to 1; zero or a negative count leaves the choice to the engine,
    /// which is reported as 0.
    pub fn num_threads(&self) -> Result<usize, AlignError> {
        let n = match self.options.get("threads") {
            None => return Ok(1),
            Some(ArgValue::Int(n)) => *n,
            Some(ArgValue::Str(s)) => s.trim().parse::<i64>().map_err(|e| {
                AlignError::Config(anyhow!("threads must be an integer, got '{}': {}", s, e))
            })?,
            Some(ArgValue::Bool(b)) => {
                return Err(AlignError::Config(anyhow!("threads must be an integer, got {}", b)))
            }
        };
        Ok(if n > 0 { n as usize } else { 0 })
    }

    /// The reference the index was loaded from: the `ref` option, or the first
    /// positional value.
    pub fn reference(&self) -> Option<String> {
        self.options
            .get("ref")
            .or_else(|| self.positional.first())
            .map(|x| x.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_builder_argv() {
        let opts = AlignerOpts::new()
            .with_option("ref", "genome")
            .with_option("MS", true)
            .with_option("classify", false)
            .with_option("threads", 8)
            .with_positional("reads.fa");
        assert_eq!(
            opts.to_argv(),
            vec!["--ref", "genome", "--MS", "--threads", "8", "reads.fa"]
        );
    }

    #[test]
    fn test_num_threads() {
        assert_eq!(AlignerOpts::new().num_threads().unwrap(), 1);
        assert_eq!(AlignerOpts::new().with_option("threads", 8).num_threads().unwrap(), 8);
        assert_eq!(AlignerOpts::new().with_option("threads", 0).num_threads().unwrap(), 0);
        assert_eq!(AlignerOpts::new().with_option("threads", -2).num_threads().unwrap(), 0);
        assert_eq!(AlignerOpts::new().with_option("threads", "4").num_threads().unwrap(), 4);
        assert!(matches!(
            AlignerOpts::new().with_option("threads", "many").num_threads(),
            Err(AlignError::Config(_))
        ));
        assert!(AlignerOpts::new().with_option("threads", true).num_threads().is_err());
    }

    #[test]
    fn test_reference() {
        assert_eq!(AlignerOpts::new().reference(), None);
        assert_eq!(
            AlignerOpts::new().with_positional("ref.fa").reference().as_deref(),
            Some("ref.fa")
        );
        let opts = AlignerOpts::new().with_positional("ref.fa").with_option("ref", "genome");
        assert_eq!(opts.reference().as_deref(), Some("genome"));
    }

    #[test]
    fn test_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aligner.yaml");
        std::fs::write(
            &path,
            "debug_log: run/debug.log\n\
             options:\n  ref: genome\n  PML: true\n  small_window: 4\n  doc_array: false\n  threads: 2\n\
             positional: [extra]\n",
        )
        .unwrap();

        let opts = AlignerOpts::from_path(&path).unwrap();
        assert_eq!(opts.debug_log, Some(LogTarget::File(PathBuf::from("run/debug.log"))));
        assert_eq!(opts.num_threads().unwrap(), 2);
        assert_eq!(
            opts.to_argv(),
            vec!["--ref", "genome", "--PML", "--small-window", "4", "--threads", "2", "extra"]
        );
    }

    #[test]
    fn test_yaml_rejects_empty_log() {
        let result: Result<AlignerOpts, _> = serde_yaml::from_str("debug_log: ''\n");
        assert!(result.is_err());
        let opts: AlignerOpts = serde_yaml::from_str("options: {}\n").unwrap();
        assert_eq!(opts, AlignerOpts::default());
    }
}
