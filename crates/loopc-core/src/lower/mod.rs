mod after;
mod before;

pub use after::LowerAfter;
pub use before::LowerBefore;
