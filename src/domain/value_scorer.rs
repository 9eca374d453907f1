//! 章节价值评估
//!
//! 基于长度、标题、句子结构、内容类型关键词、目录密度和重复度，
//! 给过滤后的章节打一个 0-1 的"值得制作"分数。纯函数，无外部依赖。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 基础分
const BASELINE: f64 = 0.5;

/// 内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Academic,
    Practical,
    Narrative,
    Business,
    Philosophy,
    /// 关键词命中太少，无法判断
    Unknown,
}

/// 内容类型权重（用于在命中数相近时决定主导类型）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeWeights {
    #[serde(default = "default_academic")]
    pub academic: f64,
    #[serde(default = "default_practical")]
    pub practical: f64,
    #[serde(default = "default_narrative")]
    pub narrative: f64,
    #[serde(default = "default_business")]
    pub business: f64,
    #[serde(default = "default_philosophy")]
    pub philosophy: f64,
}

fn default_academic() -> f64 {
    0.25
}

fn default_practical() -> f64 {
    0.3
}

fn default_narrative() -> f64 {
    0.2
}

fn default_business() -> f64 {
    0.25
}

fn default_philosophy() -> f64 {
    0.2
}

impl Default for ContentTypeWeights {
    fn default() -> Self {
        Self {
            academic: default_academic(),
            practical: default_practical(),
            narrative: default_narrative(),
            business: default_business(),
            philosophy: default_philosophy(),
        }
    }
}

impl ContentTypeWeights {
    pub fn weight_of(&self, content_type: ContentType) -> f64 {
        match content_type {
            ContentType::Academic => self.academic,
            ContentType::Practical => self.practical,
            ContentType::Narrative => self.narrative,
            ContentType::Business => self.business,
            ContentType::Philosophy => self.philosophy,
            ContentType::Unknown => 0.0,
        }
    }
}

/// 各类型关键词表
const CONTENT_KEYWORDS: &[(ContentType, &[&str])] = &[
    (
        ContentType::Academic,
        &[
            "研究", "分析", "理论", "方法", "实验", "数据", "结果", "结论", "发现", "证据", "假设",
            "模型", "测试", "验证", "research", "analysis", "theory", "experiment", "evidence",
            "hypothesis",
        ],
    ),
    (
        ContentType::Practical,
        &[
            "方法", "技巧", "步骤", "如何", "怎样", "建议", "策略", "经验", "案例", "例子", "实践",
            "操作", "指南", "技能", "how to", "step", "tips", "practice", "guide",
        ],
    ),
    (
        ContentType::Narrative,
        &[
            "故事", "经历", "回忆", "描述", "讲述", "叙述", "情节", "人物", "场景", "对话", "感受",
            "体验", "story", "memory", "scene", "character",
        ],
    ),
    (
        ContentType::Business,
        &[
            "管理", "营销", "策略", "商业", "企业", "市场", "客户", "产品", "服务", "团队", "领导",
            "决策", "竞争", "management", "marketing", "market", "customer", "business",
        ],
    ),
    (
        ContentType::Philosophy,
        &[
            "思考", "观点", "理念", "价值", "意义", "本质", "存在", "认知", "思维", "逻辑", "判断",
            "选择", "人生", "meaning", "value", "existence", "logic", "philosophy",
        ],
    ),
];

/// 把关键词表编译为每类一个正则（英文按词边界匹配）
static KEYWORD_PATTERNS: Lazy<Vec<(ContentType, Regex)>> = Lazy::new(|| {
    CONTENT_KEYWORDS
        .iter()
        .filter_map(|(content_type, words)| {
            let alternatives: Vec<String> = words
                .iter()
                .map(|w| {
                    if w.is_ascii() {
                        format!(r"\b{}\b", regex::escape(w))
                    } else {
                        regex::escape(w)
                    }
                })
                .collect();
            let pattern = format!("(?i)(?:{})", alternatives.join("|"));
            Regex::new(&pattern).ok().map(|re| (*content_type, re))
        })
        .collect()
});

/// 正常章节标题
static CHAPTER_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)第[一二三四五六七八九十百\d]+[章节]|chapter|part\s+\d+|section\s+\d+")
        .expect("valid chapter title pattern")
});

/// 明确的非正文标题
static NON_CONTENT_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(目录|索引|参考文献|致谢|附录|版权|序言|前言|后记|contents|table of contents|index|references|bibliography|acknowledge?ments?|appendix|preface|foreword|afterword|introduction|conclusion)$",
    )
    .expect("valid non-content title pattern")
});

/// 目录格式特征
static TOC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\.{3,}|\d+\s*$|第\d+页|page\s+\d+|\.{2,}\d+").expect("valid toc pattern")
});

/// 句末标点
#[inline]
fn is_sentence_end(ch: char) -> bool {
    matches!(ch, '。' | '！' | '？' | '.' | '!' | '?')
}

/// 按句末标点切分，保留长度大于 min_chars 的句子
fn sentences_longer_than(text: &str, min_chars: usize) -> Vec<&str> {
    text.split(is_sentence_end)
        .map(str::trim)
        .filter(|s| s.chars().count() > min_chars)
        .collect()
}

/// 各项得分明细
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub length: f64,
    pub title: f64,
    pub sentences: f64,
    pub content_type: f64,
    pub toc_density: f64,
    pub repetition: f64,
}

impl ScoreBreakdown {
    fn total(&self) -> f64 {
        BASELINE
            + self.length
            + self.title
            + self.sentences
            + self.content_type
            + self.toc_density
            + self.repetition
    }
}

/// 章节价值评分结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterScore {
    /// 最终分数，范围 [0, 1]
    pub value: f64,
    pub content_type: ContentType,
    pub breakdown: ScoreBreakdown,
}

fn length_adjustment(char_count: usize) -> f64 {
    if char_count < 200 {
        -0.4
    } else if char_count > 300 && char_count < 8000 {
        0.2
    } else if char_count > 15000 {
        -0.1
    } else {
        0.0
    }
}

fn title_adjustment(title: &str) -> f64 {
    let title = title.trim();
    if title.is_empty() {
        return 0.0;
    }

    let mut adjustment = 0.0;
    if CHAPTER_TITLE.is_match(title) {
        adjustment += 0.15;
    }
    if NON_CONTENT_TITLE.is_match(title) {
        adjustment -= 0.6;
    }
    adjustment
}

fn sentence_adjustment(char_count: usize, sentence_count: usize) -> f64 {
    if sentence_count < 3 {
        return -0.4;
    }
    let avg_len = char_count as f64 / sentence_count as f64;
    if sentence_count > 5 && avg_len > 15.0 {
        0.1
    } else {
        0.0
    }
}

/// 统计各类型关键词命中数
fn count_keyword_hits(text: &str) -> Vec<(ContentType, usize)> {
    KEYWORD_PATTERNS
        .iter()
        .map(|(content_type, re)| (*content_type, re.find_iter(text).count()))
        .collect()
}

/// 内容类型信号：命中总数决定加减分，加权命中数最高者为主导类型
fn content_type_adjustment(text: &str, weights: &ContentTypeWeights) -> (f64, ContentType) {
    let hits = count_keyword_hits(text);
    let total: usize = hits.iter().map(|(_, count)| count).sum();

    let dominant = hits
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(t, count)| (*t, *count as f64 * weights.weight_of(*t)))
        .fold(None::<(ContentType, f64)>, |best, (t, weighted)| match best {
            Some((_, best_weighted)) if best_weighted >= weighted => best,
            _ => Some((t, weighted)),
        })
        .map(|(t, _)| t)
        .unwrap_or(ContentType::Unknown);

    let adjustment = if total > 8 {
        0.3
    } else if total > 4 {
        0.15
    } else if total < 2 {
        -0.2
    } else {
        0.0
    };

    (adjustment, dominant)
}

fn toc_adjustment(text: &str, sentence_count: usize) -> f64 {
    let matches = TOC_PATTERN.find_iter(text).count();
    if matches == 0 {
        return 0.0;
    }

    let ratio = if sentence_count == 0 {
        f64::INFINITY
    } else {
        matches as f64 / sentence_count as f64
    };

    if ratio > 0.3 {
        -0.5
    } else if matches > 15 {
        -0.3
    } else {
        0.0
    }
}

fn repetition_adjustment(text: &str) -> f64 {
    let sentences = sentences_longer_than(text, 10);
    if sentences.len() < 5 {
        return 0.0;
    }

    let unique: std::collections::HashSet<&str> = sentences.iter().copied().collect();
    let ratio = 1.0 - unique.len() as f64 / sentences.len() as f64;

    if ratio > 0.5 {
        -0.3
    } else if ratio > 0.3 {
        -0.1
    } else {
        0.0
    }
}

/// 评估章节价值
///
/// 输入为过滤后的文本和章节标题，返回分数及明细。
/// 调用方将 `value` 与最低分数阈值比较，低于阈值的章节被跳过（不是错误）。
pub fn score_chapter(text: &str, title: &str, weights: &ContentTypeWeights) -> ChapterScore {
    let char_count = text.chars().count();
    let sentence_count = sentences_longer_than(text, 8).len();
    let (content_type_score, content_type) = content_type_adjustment(text, weights);

    let breakdown = ScoreBreakdown {
        length: length_adjustment(char_count),
        title: title_adjustment(title),
        sentences: sentence_adjustment(char_count, sentence_count),
        content_type: content_type_score,
        toc_density: toc_adjustment(text, sentence_count),
        repetition: repetition_adjustment(text),
    };

    let value = breakdown.total().clamp(0.0, 1.0);

    tracing::debug!(
        title = %title,
        score = value,
        content_type = ?content_type,
        breakdown = ?breakdown,
        "Chapter scored"
    );

    ChapterScore {
        value,
        content_type,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rich_text() -> String {
        let sentence = "这项研究分析了团队管理中的决策方法，并用实验数据验证了结论";
        (0..12)
            .map(|i| format!("{}（案例{}）。", sentence, i))
            .collect::<Vec<_>>()
            .join("")
    }

    #[test]
    fn test_score_is_clamped() {
        let weights = ContentTypeWeights::default();
        let samples = ["", "短", "......1\n......2\n", &rich_text()];
        for sample in samples {
            for title in ["", "目录", "第一章 开始", "References"] {
                let score = score_chapter(sample, title, &weights);
                assert!((0.0..=1.0).contains(&score.value));
            }
        }
    }

    #[test]
    fn test_rich_chapter_scores_high() {
        let text = rich_text();
        let score = score_chapter(&text, "第3章 决策的艺术", &ContentTypeWeights::default());
        assert!(score.value >= 0.6, "score was {}", score.value);
        assert_eq!(score.breakdown.length, 0.2);
        assert_eq!(score.breakdown.title, 0.15);
        assert_eq!(score.breakdown.content_type, 0.3);
    }

    #[test]
    fn test_non_content_title_penalized() {
        let text = rich_text();
        let weights = ContentTypeWeights::default();
        let normal = score_chapter(&text, "决策的艺术", &weights);
        let references = score_chapter(&text, "References", &weights);
        assert_eq!(references.breakdown.title, -0.6);
        assert!(references.value < normal.value);
        assert!(references.value < 0.6);
    }

    #[test]
    fn test_length_bands() {
        assert_eq!(length_adjustment(150), -0.4);
        assert_eq!(length_adjustment(250), 0.0);
        assert_eq!(length_adjustment(5000), 0.2);
        assert_eq!(length_adjustment(10000), 0.0);
        assert_eq!(length_adjustment(20000), -0.1);
    }

    #[test]
    fn test_sentence_structure() {
        assert_eq!(sentence_adjustment(100, 2), -0.4);
        assert_eq!(sentence_adjustment(600, 6), 0.1);
        assert_eq!(sentence_adjustment(60, 6), 0.0);
    }

    #[test]
    fn test_content_type_detection() {
        let weights = ContentTypeWeights::default();
        let text = "这个故事讲述了人物的经历和回忆，情节与场景都很生动，对话充满感受。";
        let (adjustment, content_type) = content_type_adjustment(text, &weights);
        assert_eq!(content_type, ContentType::Narrative);
        assert_eq!(adjustment, 0.3);

        let (adjustment, content_type) = content_type_adjustment("没有关键词的一句话", &weights);
        assert_eq!(content_type, ContentType::Unknown);
        assert_eq!(adjustment, -0.2);
    }

    #[test]
    fn test_english_keywords_use_word_boundaries() {
        let hits = count_keyword_hits("Marketplace research and market research");
        let academic = hits.iter().find(|(t, _)| *t == ContentType::Academic).unwrap().1;
        let business = hits.iter().find(|(t, _)| *t == ContentType::Business).unwrap().1;
        assert_eq!(academic, 2);
        assert_eq!(business, 1);
    }

    #[test]
    fn test_toc_density_penalty() {
        let toc = "第一章 开端......1\n第二章 发展......15\n第三章 高潮......37\n";
        assert_eq!(toc_adjustment(toc, 0), -0.5);
        assert_eq!(toc_adjustment("普通的句子。", 1), 0.0);
    }

    #[test]
    fn test_repetition_penalty() {
        let repeated = "这是一句重复出现的长句子内容。".repeat(6);
        assert_eq!(repetition_adjustment(&repeated), -0.3);

        let distinct: String = (0..6)
            .map(|i| format!("这是第{}句完全不同的长句子内容。", i))
            .collect();
        assert_eq!(repetition_adjustment(&distinct), 0.0);
    }
}
