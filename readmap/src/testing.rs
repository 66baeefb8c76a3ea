//! A lookup-table index used by the unit tests.

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, bail, Result};
use rayon::ThreadPool;

use crate::index::{build_thread_pool, FromArgs, Index, QueryStream, DEFAULT_STREAM_CHUNK_SIZE};
use crate::record::{Alignment, Answer, Query};

/// Places a read on a contig when its whole sequence is a known key.
///
/// Argument vector understood by [`FromArgs`]:
/// `--place SEQ=CONTIG`, `--fail-on SEQ`, `--drop READ`, `--rename READ=ID`,
/// `--reverse`, `--broken`, `--chunk-size N`, `--threads N`, `--ref PREFIX`,
/// and positional values. The prefix and positional values are ignored.
pub(crate) struct LookupIndex {
    placements: HashMap<String, String>,
    failing: HashSet<String>,
    dropped: HashSet<String>,
    renamed: HashMap<String, String>,
    reverse: bool,
    broken: bool,
    chunk_size: usize,
    pool: Option<ThreadPool>,
    pub args: Vec<String>,
    pub num_threads: usize,
}

impl LookupIndex {
    pub fn new() -> Self {
        Self {
            placements: HashMap::new(),
            failing: HashSet::new(),
            dropped: HashSet::new(),
            renamed: HashMap::new(),
            reverse: false,
            broken: false,
            chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
            pool: None,
            args: Vec::new(),
            num_threads: 1,
        }
    }

    pub fn place(mut self, seq: &str, contig: &str) -> Self {
        self.placements.insert(seq.to_string(), contig.to_string());
        self
    }

    pub fn fail_on(mut self, seq: &str) -> Self {
        self.failing.insert(seq.to_string());
        self
    }

    /// Never answer the query for `read_id`.
    pub fn drop_answer(mut self, read_id: &str) -> Self {
        self.dropped.insert(read_id.to_string());
        self
    }

    /// Answer the query for `read_id` under a different id.
    pub fn rename(mut self, read_id: &str, to: &str) -> Self {
        self.renamed.insert(read_id.to_string(), to.to_string());
        self
    }

    /// Answer everything at once, last query first.
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_pool(mut self, pool: ThreadPool) -> Self {
        self.pool = Some(pool);
        self
    }

    fn is_plain(&self) -> bool {
        !self.reverse && self.dropped.is_empty() && self.renamed.is_empty()
    }
}

impl Index for LookupIndex {
    fn validate(&self) -> Result<()> {
        if self.broken {
            bail!("the index required for this computation is not available");
        }
        Ok(())
    }

    fn query(&self, seq: &str) -> Result<Alignment> {
        if self.failing.contains(seq) {
            bail!("cannot classify sequence {}", seq);
        }
        Ok(match self.placements.get(seq) {
            Some(contig) => Alignment::new(contig.as_str(), true, 0, 1.0, seq.len()),
            None => Alignment::unmapped(seq.len()),
        })
    }

    fn thread_pool(&self) -> Option<&ThreadPool> {
        self.pool.as_ref()
    }

    fn stream_chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn query_stream<'a>(
        &'a self,
        queries: Box<dyn Iterator<Item = Query> + 'a>,
    ) -> Box<dyn Iterator<Item = Result<Answer>> + 'a> {
        if self.is_plain() {
            return Box::new(QueryStream::new(self, queries, self.chunk_size));
        }
        let mut answers: Vec<Result<Answer>> = queries
            .filter(|q| !self.dropped.contains(&q.read_id))
            .map(|q| -> Result<Answer> {
                let alignment = self.query(&q.seq)?;
                let mut answer = Answer::new(q, alignment);
                if let Some(id) = self.renamed.get(&answer.read_id) {
                    answer.read_id = id.clone();
                }
                Ok(answer)
            })
            .collect();
        if self.reverse {
            answers.reverse();
        }
        Box::new(answers.into_iter())
    }
}

impl FromArgs for LookupIndex {
    fn from_args(args: &[String], num_threads: usize) -> Result<Self> {
        let mut index = LookupIndex::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let mut value = |flag: &str| iter.next().ok_or_else(|| anyhow!("{} requires a value", flag));
            match arg.as_str() {
                "--place" => {
                    let (seq, contig) = value("--place")?
                        .split_once('=')
                        .ok_or_else(|| anyhow!("--place expects SEQ=CONTIG"))?;
                    index = index.place(seq, contig);
                }
                "--fail-on" => index = index.fail_on(value("--fail-on")?),
                "--drop" => index = index.drop_answer(value("--drop")?),
                "--rename" => {
                    let (from, to) = value("--rename")?
                        .split_once('=')
                        .ok_or_else(|| anyhow!("--rename expects READ=ID"))?;
                    index = index.rename(from, to);
                }
                "--chunk-size" => index.chunk_size = value("--chunk-size")?.parse()?,
                "--threads" => {
                    value("--threads")?;
                }
                "--ref" => {
                    value("--ref")?;
                }
                "--reverse" => index.reverse = true,
                "--broken" => index.broken = true,
                flag if flag.starts_with("--") => bail!("unrecognised option: {}", flag),
                _ => {}
            }
        }
        if num_threads != 1 {
            index.pool = Some(build_thread_pool(num_threads)?);
        }
        index.args = args.to_vec();
        index.num_threads = num_threads;
        Ok(index)
    }
}
