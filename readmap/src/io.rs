use std::{fmt, fs::File, io::{self, BufWriter, Write}, path::{Path, PathBuf}, str::FromStr};

use crate::error::AlignError;

/// Where the debug log should go.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogTarget {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl FromStr for LogTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err("debug log target cannot be empty".to_string()),
            "stdout" => Ok(LogTarget::Stdout),
            "stderr" => Ok(LogTarget::Stderr),
            path => Ok(LogTarget::File(PathBuf::from(path))),
        }
    }
}

impl TryFrom<String> for LogTarget {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<LogTarget> for String {
    fn from(target: LogTarget) -> Self {
        target.to_string()
    }
}

impl fmt::Display for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogTarget::Stdout => write!(f, "stdout"),
            LogTarget::Stderr => write!(f, "stderr"),
            LogTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zstd,
}

impl Compression {
    /// Guess the compression from the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        match path.as_ref().extension().and_then(|x| x.to_str()) {
            Some("gz") => Some(Compression::Gzip),
            Some("zst") => Some(Compression::Zstd),
            _ => None,
        }
    }
}

/// An open debug log. The standard streams are borrowed from the process and
/// are only ever flushed, files are owned and released on [`DebugLog::close`].
pub enum DebugLog {
    Stdout(io::Stdout),
    Stderr(io::Stderr),
    File {
        path: PathBuf,
        writer: Box<dyn Write + Send>,
    },
}

impl fmt::Debug for DebugLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebugLog::Stdout(_) => write!(f, "DebugLog(stdout)"),
            DebugLog::Stderr(_) => write!(f, "DebugLog(stderr)"),
            DebugLog::File { path, .. } => write!(f, "DebugLog({})", path.display()),
        }
    }
}

impl DebugLog {
    pub fn open(target: &LogTarget) -> Result<Self, AlignError> {
        match target {
            LogTarget::Stdout => Ok(DebugLog::Stdout(io::stdout())),
            LogTarget::Stderr => Ok(DebugLog::Stderr(io::stderr())),
            LogTarget::File(path) => {
                let writer = open_file_for_write(path, Compression::from_path(path))
                    .map_err(|source| AlignError::DebugLog { path: path.clone(), source })?;
                Ok(DebugLog::File { path: path.clone(), writer })
            }
        }
    }

    /// Whether closing this log releases a resource we own.
    pub fn is_owned(&self) -> bool {
        matches!(self, DebugLog::File { .. })
    }

    /// Flush and release the log. Standard streams are flushed but stay open.
    pub fn close(mut self) -> io::Result<()> {
        // Dropping the writer finishes any compression frame and closes the file.
        self.flush()
    }
}

impl Write for DebugLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            DebugLog::Stdout(out) => out.write(buf),
            DebugLog::Stderr(err) => err.write(buf),
            DebugLog::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            DebugLog::Stdout(out) => out.flush(),
            DebugLog::Stderr(err) => err.flush(),
            DebugLog::File { writer, .. } => writer.flush(),
        }
    }
}

fn open_file_for_write<P: AsRef<Path>>(
    filename: P,
    compression: Option<Compression>,
) -> io::Result<Box<dyn Write + Send>> {
    let buffer = BufWriter::new(File::create(&filename)?);
    let writer: Box<dyn Write + Send> = match compression {
        None => Box::new(buffer),
        Some(Compression::Gzip) => Box::new(flate2::write::GzEncoder::new(buffer, flate2::Compression::new(6))),
        Some(Compression::Zstd) => Box::new(zstd::stream::Encoder::new(buffer, 9)?.auto_finish()),
    };
    Ok(writer)
}
