use anyhow::Result;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use rayon::ThreadPool;

use crate::record::{Alignment, Answer, Query};

/// Number of queries pulled from the input per batch by the default
/// [`Index::query_stream`].
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 512;

/// A precomputed reference index that can be queried with read sequences.
pub trait Index: Sync {
    /// Check that the loaded index is consistent and has everything it needs.
    fn validate(&self) -> Result<()>;

    /// Classify a single sequence. An unplaced read is reported with the
    /// unmapped sentinel contig rather than an error.
    fn query(&self, seq: &str) -> Result<Alignment>;

    /// The pool batch queries run on. `None` uses rayon's global pool.
    fn thread_pool(&self) -> Option<&ThreadPool> {
        None
    }

    fn stream_chunk_size(&self) -> usize {
        DEFAULT_STREAM_CHUNK_SIZE
    }

    /// Classify a batch of sequences in parallel. Results are in input order.
    fn query_batch(&self, seqs: &[&str]) -> Result<Vec<Alignment>> {
        let run = || seqs.par_iter().map(|seq| self.query(seq)).collect::<Result<Vec<_>>>();
        match self.thread_pool() {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    /// Answer a lazily produced sequence of queries. Every query yields exactly
    /// one answer, but the order of answers is up to the implementation.
    fn query_stream<'a>(
        &'a self,
        queries: Box<dyn Iterator<Item = Query> + 'a>,
    ) -> Box<dyn Iterator<Item = Result<Answer>> + 'a> {
        Box::new(QueryStream::new(self, queries, self.stream_chunk_size()))
    }
}

/// Indices that are constructed from a command-line style argument vector.
pub trait FromArgs: Sized {
    /// `num_threads` of 0 lets the engine pick (usually all cores).
    fn from_args(args: &[String], num_threads: usize) -> Result<Self>;
}

/// Build a dedicated pool for an index engine.
pub fn build_thread_pool(num_threads: usize) -> Result<ThreadPool> {
    Ok(rayon::ThreadPoolBuilder::new().num_threads(num_threads).build()?)
}

/// Answers queries chunk by chunk: a chunk is pulled from the input only once
/// the answers of the previous one have all been consumed.
pub struct QueryStream<'a, I: Index + ?Sized> {
    index: &'a I,
    queries: Box<dyn Iterator<Item = Query> + 'a>,
    chunk_size: usize,
    buffer: std::vec::IntoIter<Answer>,
    exhausted: bool,
}

impl<'a, I: Index + ?Sized> QueryStream<'a, I> {
    pub fn new(index: &'a I, queries: Box<dyn Iterator<Item = Query> + 'a>, chunk_size: usize) -> Self {
        Self {
            index,
            queries,
            chunk_size: chunk_size.max(1),
            buffer: Vec::new().into_iter(),
            exhausted: false,
        }
    }

    fn next_chunk(&mut self) -> Option<Result<()>> {
        if self.exhausted {
            return None;
        }
        let chunk: Vec<Query> = self.queries.by_ref().take(self.chunk_size).collect();
        if chunk.len() < self.chunk_size {
            self.exhausted = true;
        }
        if chunk.is_empty() {
            return None;
        }

        let seqs: Vec<&str> = chunk.iter().map(|q| q.seq.as_str()).collect();
        match self.index.query_batch(&seqs) {
            Ok(alignments) => {
                self.buffer = chunk
                    .into_iter()
                    .zip(alignments)
                    .map(|(query, alignment)| Answer::new(query, alignment))
                    .collect::<Vec<_>>()
                    .into_iter();
                Some(Ok(()))
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}

impl<I: Index + ?Sized> Iterator for QueryStream<'_, I> {
    type Item = Result<Answer>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(answer) = self.buffer.next() {
                return Some(Ok(answer));
            }
            match self.next_chunk()? {
                Ok(()) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
