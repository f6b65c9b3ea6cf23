// Relation Infrastructure
//
// Pair extraction from rows and resolution of pairs into linked objects

pub mod extractor;
pub mod linker;

pub use linker::LinkSummary;

pub(crate) use linker::ErasedRelation;
