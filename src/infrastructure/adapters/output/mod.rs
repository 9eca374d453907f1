//! Output Adapter - 章节产物输出

mod markdown_writer;

pub use markdown_writer::{
    extract_jimeng_prompts, recommended_video_count, MarkdownWriter, JIMENG_FILE, OVERVIEW_FILE,
};
