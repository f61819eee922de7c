pub mod vfs;
pub mod cache_bust;
pub mod comparison;
pub mod text_diff;

pub use vfs::LocalVfs;
pub use cache_bust::{decorate_with_cache_bust, CacheBust};
pub use comparison::{
    ComparisonOptions, ComparisonReport, FileDescriptor, FileReport, TextFileComparison,
};
pub use text_diff::{LineStats, TextComparison, TextDiffEngine};
