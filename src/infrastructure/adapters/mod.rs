//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod completion;
pub mod output;
pub mod source;
pub mod stages;

pub use completion::*;
pub use output::*;
pub use source::*;
pub use stages::*;
