//! MagScope feature derivation layer
//!
//! Pure transformations over the shared [`Frame`](magscope_common::Frame)
//! model:
//! - codec: session-scoped categorical encode/decode
//! - bucket: quantile and fixed-width binning (`MagBin`, `CitationBin`)
//! - authors: prominence flag and citation-sum aggregates (`AuthorProminence`,
//!   `AuthorRank`)
//! - rank: dense ranking, per-row and per-group (`<col>Rank`)
//! - onehot: author indicator expansion
//! - language: abstract language detection (`Language`)
//!
//! Every derivation takes a frame by reference and returns a new frame with
//! the derived column assigned; reference data (the author statistics map,
//! the codec table) is threaded in explicitly by the caller.

pub mod authors;
pub mod bucket;
pub mod codec;
pub mod language;
pub mod onehot;
pub mod rank;

pub use authors::{add_author_prominence, add_author_rank};
pub use bucket::{add_citation_bin, add_mag_bin, BucketSpec};
pub use codec::{decode, encode, CodecTable, LabelCodec};
pub use language::add_language;
pub use onehot::one_hot_encode_authors;
pub use rank::{add_group_rank, dense_rank};
