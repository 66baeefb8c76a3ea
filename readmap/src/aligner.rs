use std::cell::RefCell;
use std::collections::HashSet;
use std::io::Write;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard};

use itertools::Itertools;
use log::{debug, info, warn};

use crate::config::AlignerOpts;
use crate::correlation::CorrelationTable;
use crate::error::AlignError;
use crate::index::{FromArgs, Index};
use crate::io::DebugLog;
use crate::record::{AlignmentData, Answer, Query, ResultRecord};

/// Maps basecalled reads against an [`Index`] and hands them back with their
/// alignment data attached.
pub struct Aligner<I> {
    index: I,
    opts: AlignerOpts,
    debug_log: Mutex<Option<DebugLog>>,
}

impl<I: Index + FromArgs> Aligner<I> {
    /// Open the debug log, then load the index from the options' argument vector.
    pub fn new(opts: AlignerOpts) -> Result<Self, AlignError> {
        let debug_log = opts.debug_log.as_ref().map(DebugLog::open).transpose()?;
        let num_threads = opts.num_threads()?;
        let args = opts.to_argv();
        debug!("Argv: {}", args.iter().join(" "));
        let index = I::from_args(&args, num_threads).map_err(AlignError::Config)?;
        Ok(Self {
            index,
            opts,
            debug_log: Mutex::new(debug_log),
        })
    }
}

impl<I: Index> Aligner<I> {
    /// Wrap an index that has already been loaded.
    pub fn with_index(index: I, opts: AlignerOpts) -> Result<Self, AlignError> {
        let debug_log = opts.debug_log.as_ref().map(DebugLog::open).transpose()?;
        Ok(Self {
            index,
            opts,
            debug_log: Mutex::new(debug_log),
        })
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn opts(&self) -> &AlignerOpts {
        &self.opts
    }

    pub fn initialised(&self) -> bool {
        true
    }

    /// Run the index's own consistency checks. Failures are returned unchanged.
    pub fn validate(&self) -> Result<(), AlignError> {
        self.index.validate().map_err(AlignError::Index)?;
        info!("All OK!");
        self.write_log(format_args!("validate\tOK"));
        Ok(())
    }

    pub fn describe(&self) -> String {
        format!(
            "Loaded index from prefix {}.",
            self.opts.reference().unwrap_or_else(|| "<unset>".to_string())
        )
    }

    /// Align a stream of reads.
    ///
    /// Reads with a sequence are emitted as their answers arrive from the
    /// index, in whatever order the index answers. Reads without a sequence
    /// are never queried and come last, in input order, with an empty result.
    /// Nothing is read from `reads`, and the index is not asked for an answer
    /// stream, until the returned iterator is first polled.
    ///
    /// Read ids must be unique within one call, including reads without a
    /// sequence. A repeated id ends the stream with
    /// [`AlignError::DuplicateReadId`] once the answers already requested have
    /// been emitted. The iterator stops after the first error.
    pub fn map_reads<'a, R>(&'a self, reads: R) -> MapReads<'a>
    where
        R: IntoIterator<Item = ResultRecord>,
        R::IntoIter: 'a,
    {
        let registry = Rc::new(RefCell::new(Registry::default()));
        let queries = Registrar {
            reads: reads.into_iter(),
            registry: registry.clone(),
        };
        let index = &self.index;
        MapReads {
            registry,
            start: Some(Box::new(move || index.query_stream(Box::new(queries)))),
            answers: None,
            skipped: None,
            debug_log: &self.debug_log,
            num_answered: 0,
            finished: false,
        }
    }

    /// Flush and release the debug log. Standard streams are left open.
    /// Calling this again, or without a debug log, does nothing.
    pub fn disconnect(&self) -> Result<(), AlignError> {
        let sink = lock_log(&self.debug_log).take();
        if let Some(sink) = sink {
            debug!("Closing debug log {:?}", sink);
            sink.close()?;
        }
        Ok(())
    }

    fn write_log(&self, line: std::fmt::Arguments<'_>) {
        write_log(&self.debug_log, line);
    }
}

/// A panic while a line was being written leaves the sink usable, so a
/// poisoned lock is taken over rather than skipped.
fn lock_log(debug_log: &Mutex<Option<DebugLog>>) -> MutexGuard<'_, Option<DebugLog>> {
    debug_log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_log(debug_log: &Mutex<Option<DebugLog>>, line: std::fmt::Arguments<'_>) {
    if let Some(log) = lock_log(debug_log).as_mut() {
        if let Err(e) = writeln!(log, "{}", line) {
            warn!("Failed to write to debug log: {}", e);
        }
    }
}

/// State of one `map_reads` call, shared between the query producer and
/// the answer consumer.
#[derive(Default)]
struct Registry {
    seen: HashSet<String>,
    table: CorrelationTable,
    skipped: Vec<ResultRecord>,
    error: Option<AlignError>,
}

/// Turns incoming records into queries on demand, registering each one.
struct Registrar<R> {
    reads: R,
    registry: Rc<RefCell<Registry>>,
}

impl<R: Iterator<Item = ResultRecord>> Iterator for Registrar<R> {
    type Item = Query;

    fn next(&mut self) -> Option<Query> {
        let mut registry = self.registry.borrow_mut();
        if registry.error.is_some() {
            return None;
        }
        for record in self.reads.by_ref() {
            if !record.alignment_data().is_pending() {
                registry.error = Some(AlignError::AlreadyAligned(record.read_id));
                return None;
            }
            if !registry.seen.insert(record.read_id.clone()) {
                registry.error = Some(AlignError::DuplicateReadId(record.read_id));
                return None;
            }
            match Query::from_record(&record) {
                None => registry.skipped.push(record),
                Some(query) => {
                    if let Err(e) = registry.table.register(record) {
                        registry.error = Some(e);
                        return None;
                    }
                    return Some(query);
                }
            }
        }
        None
    }
}

type AnswerStream<'a> = Box<dyn Iterator<Item = anyhow::Result<Answer>> + 'a>;

/// Iterator returned by [`Aligner::map_reads`].
pub struct MapReads<'a> {
    registry: Rc<RefCell<Registry>>,
    /// Opens the index's answer stream on the first poll.
    start: Option<Box<dyn FnOnce() -> AnswerStream<'a> + 'a>>,
    answers: Option<AnswerStream<'a>>,
    skipped: Option<std::vec::IntoIter<ResultRecord>>,
    debug_log: &'a Mutex<Option<DebugLog>>,
    num_answered: usize,
    finished: bool,
}

impl MapReads<'_> {
    fn emit(&self, record: ResultRecord) -> Option<Result<ResultRecord, AlignError>> {
        let (contig, start, end, strand) = match record.alignment_data() {
            AlignmentData::Mapped(ali) => (ali.contig.as_str(), ali.ref_start, ali.ref_end, ali.strand),
            _ => ("*", 0, 0, 0),
        };
        write_log(
            self.debug_log,
            format_args!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                record.read_id,
                record.channel,
                record.seq_len(),
                contig,
                start,
                end,
                strand
            ),
        );
        Some(Ok(record))
    }

    fn fail(&mut self, err: AlignError) -> Option<Result<ResultRecord, AlignError>> {
        self.finished = true;
        Some(Err(err))
    }

    /// Called once the index has no more answers: check that nothing is left
    /// in flight and switch to emitting the skipped reads.
    fn finish_answers(&mut self) -> Result<(), AlignError> {
        let mut registry = self.registry.borrow_mut();
        if let Some(err) = registry.error.take() {
            return Err(err);
        }
        if !registry.table.is_empty() {
            return Err(AlignError::MissingAnswers { count: registry.table.len() });
        }
        let skipped = std::mem::take(&mut registry.skipped);
        debug!("{} reads answered by the index, {} reads without sequence", self.num_answered, skipped.len());
        self.skipped = Some(skipped.into_iter());
        Ok(())
    }
}

impl Iterator for MapReads<'_> {
    type Item = Result<ResultRecord, AlignError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if let Some(skipped) = self.skipped.as_mut() {
            return match skipped.next() {
                Some(mut record) => {
                    record.resolve(AlignmentData::Unmapped);
                    self.emit(record)
                }
                None => {
                    self.finished = true;
                    None
                }
            };
        }

        if let Some(start) = self.start.take() {
            self.answers = Some(start());
        }
        let answer = self.answers.as_mut().and_then(|answers| answers.next());
        match answer {
            Some(Ok(answer)) => {
                let resolved = self.registry.borrow_mut().table.resolve(&answer.read_id);
                match resolved {
                    Ok(mut record) => {
                        record.resolve(answer.alignment.into());
                        self.num_answered += 1;
                        self.emit(record)
                    }
                    Err(e) => self.fail(e),
                }
            }
            Some(Err(e)) => self.fail(AlignError::Index(e)),
            None => match self.finish_answers() {
                Ok(()) => self.next(),
                Err(e) => self.fail(e),
            },
        }
    }
}
