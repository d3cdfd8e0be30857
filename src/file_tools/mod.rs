mod file_matcher;

pub use file_matcher::*;
