mod output;

pub use output::{Output, usd};
