//! Query-side subsystems: parsing, scoring, fuzzy expansion, ranking, and
//! snippet extraction.

pub mod distance;
pub mod fuzzy;
pub mod query;
pub mod ranker;
pub mod scoring;
pub mod snippet;
pub mod topk;

pub use fuzzy::{Correction, TrigramIndex, autocorrect_term};
pub use query::parse_query_input;
pub use ranker::{RankOptions, RankedDoc, rank, rank_two_pass};
pub use scoring::FusionWeights;
pub use snippet::{Snippet, extract_snippets, simple_format};
pub use topk::TopK;
