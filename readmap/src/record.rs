use serde::{Deserialize, Serialize};

/// Contig name reported by the index when a read has no placement.
pub const UNMAPPED_CONTIG: &str = "*";

/// A placement of a read on the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub contig: String,
    pub ref_start: i64,
    pub ref_end: i64,
    /// 1 for the forward strand, -1 for the reverse strand.
    pub strand: i8,
    /// Fraction of the read supporting its presence in the index.
    pub presence_fraction: f32,
}

impl Alignment {
    pub fn new(
        contig: impl Into<String>,
        forward: bool,
        start: i64,
        presence_fraction: f32,
        query_len: usize,
    ) -> Self {
        Self {
            contig: contig.into(),
            ref_start: start,
            ref_end: start + query_len as i64,
            strand: if forward { 1 } else { -1 },
            presence_fraction,
        }
    }

    pub fn unmapped(query_len: usize) -> Self {
        Self::new(UNMAPPED_CONTIG, true, 0, 0.0, query_len)
    }

    pub fn is_mapped(&self) -> bool {
        self.contig != UNMAPPED_CONTIG
    }
}

/// The alignment outcome of a read. A record starts out `Pending` and is
/// resolved exactly once by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum AlignmentData {
    #[default]
    Pending,
    Mapped(Alignment),
    Unmapped,
}

impl AlignmentData {
    pub fn is_pending(&self) -> bool {
        matches!(self, AlignmentData::Pending)
    }

    /// The alignments as a list: one element if mapped, empty if unmapped,
    /// `None` while the read has not been through the aligner.
    pub fn alignments(&self) -> Option<&[Alignment]> {
        match self {
            AlignmentData::Pending => None,
            AlignmentData::Mapped(ali) => Some(std::slice::from_ref(ali)),
            AlignmentData::Unmapped => Some(&[]),
        }
    }
}

impl From<Alignment> for AlignmentData {
    fn from(alignment: Alignment) -> Self {
        if alignment.is_mapped() {
            AlignmentData::Mapped(alignment)
        } else {
            AlignmentData::Unmapped
        }
    }
}

/// Per-read result holder, progressively filled by the basecaller, the
/// barcoder and finally the aligner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// The channel this read is being sequenced on.
    pub channel: u32,
    pub read_id: String,
    /// Basecalled sequence. May be missing or empty, in which case the read is
    /// never sent to the index.
    pub seq: Option<String>,
    pub barcode: Option<String>,
    /// Anything extra the basecaller wants to pass along.
    pub basecall_data: Option<serde_json::Value>,
    #[serde(default)]
    alignment_data: AlignmentData,
}

impl ResultRecord {
    pub fn new(channel: u32, read_id: impl Into<String>, seq: impl Into<String>) -> Self {
        Self {
            channel,
            read_id: read_id.into(),
            seq: Some(seq.into()),
            barcode: None,
            basecall_data: None,
            alignment_data: AlignmentData::Pending,
        }
    }

    pub fn without_sequence(channel: u32, read_id: impl Into<String>) -> Self {
        Self {
            seq: None,
            ..Self::new(channel, read_id, String::new())
        }
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_basecall_data(mut self, data: serde_json::Value) -> Self {
        self.basecall_data = Some(data);
        self
    }

    /// The sequence, if present and non-empty.
    pub fn sequence(&self) -> Option<&str> {
        self.seq.as_deref().filter(|s| !s.is_empty())
    }

    pub fn seq_len(&self) -> usize {
        self.seq.as_ref().map_or(0, |s| s.len())
    }

    pub fn alignment_data(&self) -> &AlignmentData {
        &self.alignment_data
    }

    pub fn alignments(&self) -> Option<&[Alignment]> {
        self.alignment_data.alignments()
    }

    /// Attach the alignment outcome. Records reach this point only from the
    /// pipeline, which rejects anything that is not pending on entry.
    pub(crate) fn resolve(&mut self, data: AlignmentData) {
        debug_assert!(self.alignment_data.is_pending(), "read {} resolved twice", self.read_id);
        self.alignment_data = data;
    }
}

/// A request sent to the index for one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub channel: u32,
    pub read_id: String,
    pub seq: String,
}

impl Query {
    /// Build the query for a record, or `None` when it has no usable sequence.
    pub fn from_record(record: &ResultRecord) -> Option<Self> {
        record.sequence().map(|seq| Self {
            channel: record.channel,
            read_id: record.read_id.clone(),
            seq: seq.to_string(),
        })
    }
}

/// The index's reply to a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub channel: u32,
    pub read_id: String,
    pub alignment: Alignment,
}

impl Answer {
    pub fn new(query: Query, alignment: Alignment) -> Self {
        Self {
            channel: query.channel,
            read_id: query.read_id,
            alignment,
        }
    }
}
