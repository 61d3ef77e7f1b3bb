mod dedup;
mod score;
mod similarity;
mod summary;
mod util;

pub use dedup::Dedup;
pub use score::Score;
pub use similarity::Similarity;
pub use summary::Summary;
