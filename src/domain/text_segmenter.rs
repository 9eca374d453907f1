//! 文本分割器
//!
//! 把长章节切成大小受限的片段，供并发摘要使用：
//! 先按空行切段落，再贪心合并；单个超长段落按句末标点继续切分。

/// 默认片段预算（字符数）
pub const DEFAULT_MAX_CHARS: usize = 2000;

/// 段落最小字符数，短于等于此值的段落视为噪声
pub const DEFAULT_MIN_PARAGRAPH_CHARS: usize = 50;

/// 片段最小字符数，短于此值的片段被丢弃
pub const DEFAULT_MIN_SEGMENT_CHARS: usize = 100;

/// 段落之间的分隔
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// 文本分割配置
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// 单个片段最大字符数
    pub max_chars: usize,
    /// 段落最小字符数
    pub min_paragraph_chars: usize,
    /// 片段最小字符数
    pub min_segment_chars: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            min_paragraph_chars: DEFAULT_MIN_PARAGRAPH_CHARS,
            min_segment_chars: DEFAULT_MIN_SEGMENT_CHARS,
        }
    }
}

impl SegmentConfig {
    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            max_chars,
            ..Default::default()
        }
    }

    /// 句子级切分的预算，给长段落留出余量
    fn sentence_budget(&self) -> usize {
        (self.max_chars * 9 / 10).max(1)
    }
}

/// 检查是否为句末标点（切分点）
#[inline]
fn is_sentence_delimiter(ch: char) -> bool {
    matches!(ch, '。' | '？' | '！' | '.' | '?' | '!')
}

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 段落是否保留：过短的段落和孤立页码被过滤
fn keep_paragraph(paragraph: &str, config: &SegmentConfig) -> bool {
    let is_numeral = !paragraph.is_empty() && paragraph.chars().all(|c| c.is_ascii_digit());
    char_len(paragraph) > config.min_paragraph_chars && !is_numeral
}

/// 按空行切分段落
fn split_paragraphs<'a>(text: &'a str, config: &SegmentConfig) -> Vec<&'a str> {
    let mut raw: Vec<&'a str> = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if offset > start {
                raw.push(&text[start..offset]);
            }
            start = offset + line.len();
        }
        offset += line.len();
    }
    if start < text.len() {
        raw.push(&text[start..]);
    }

    raw.into_iter()
        .map(str::trim)
        .filter(|p| keep_paragraph(p, config))
        .collect()
}

/// 按句末标点切分（标点保留在句尾）
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if is_sentence_delimiter(ch) {
            if !current.trim().is_empty() {
                sentences.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }

    if !current.trim().is_empty() {
        sentences.push(current);
    }

    sentences
}

/// 按字符边界硬切
fn hard_split(text: &str, budget: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(budget)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect()
}

/// 切分单个超长段落
///
/// 句子依次累积到预算内；单句超出预算时按字符硬切。
/// 末尾残留的短片段合并到前一个片段（合并后仍不超过 max_chars 时）。
fn split_long_paragraph(paragraph: &str, config: &SegmentConfig) -> Vec<String> {
    let budget = config.sentence_budget();
    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(paragraph) {
        let sentence_len = char_len(&sentence);

        if sentence_len > budget {
            if !current.trim().is_empty() {
                pieces.push(current.trim().to_string());
            }
            current.clear();
            current_len = 0;
            pieces.extend(hard_split(&sentence, budget));
            continue;
        }

        if current_len + sentence_len <= budget {
            current.push_str(&sentence);
            current_len += sentence_len;
        } else {
            if !current.trim().is_empty() {
                pieces.push(std::mem::take(&mut current).trim().to_string());
            }
            current = sentence;
            current_len = sentence_len;
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        match pieces.last_mut() {
            Some(last)
                if char_len(tail) < config.min_segment_chars
                    && char_len(last) + char_len(tail) <= config.max_chars =>
            {
                // 合并到前一个
                last.push_str(tail);
            }
            _ => pieces.push(tail.to_string()),
        }
    }

    pieces
}

/// 对文本进行分段
///
/// 分段策略：
/// 1. 按空行切分段落，过滤过短段落和纯数字段落
/// 2. 贪心合并段落，合并后不超过 max_chars
/// 3. 单个段落超过 max_chars 时按句子切分
/// 4. 丢弃短于 min_segment_chars 的片段
///
/// 纯函数：同样的输入总是得到同样的输出
pub fn segment_text(text: &str, config: &SegmentConfig) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for paragraph in split_paragraphs(text, config) {
        let paragraph_len = char_len(paragraph);
        let joined_len = if current.is_empty() {
            paragraph_len
        } else {
            current_len + PARAGRAPH_SEPARATOR.len() + paragraph_len
        };

        if joined_len <= config.max_chars {
            if !current.is_empty() {
                current.push_str(PARAGRAPH_SEPARATOR);
            }
            current.push_str(paragraph);
            current_len = joined_len;
            continue;
        }

        if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if paragraph_len > config.max_chars {
            segments.extend(split_long_paragraph(paragraph, config));
        } else {
            current.push_str(paragraph);
            current_len = paragraph_len;
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| char_len(s) >= config.min_segment_chars)
        .collect()
}

/// 使用默认配置分段（便捷方法）
pub fn segment_text_default(text: &str) -> Vec<String> {
    segment_text(text, &SegmentConfig::default())
}
