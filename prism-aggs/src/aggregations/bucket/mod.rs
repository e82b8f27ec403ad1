mod key;
mod queue;
mod significant;

pub use key::TermKey;
pub use queue::{BucketSignificanceQueue, Significance};
pub use significant::{SignificantBucket, SignificantTerms, UnscoredBucket};
