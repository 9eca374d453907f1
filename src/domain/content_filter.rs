//! 内容过滤器
//!
//! 去除章节原文中的结构性噪声：页码、目录行、版权/出版信息、网址邮箱、装饰符号行等。
//! 每条规则都是数据表中的一项，按顺序作用在逐步清理的文本上。

use once_cell::sync::Lazy;
use regex::Regex;

/// 单条过滤规则
struct FilterRule {
    name: &'static str,
    pattern: &'static str,
    replacement: &'static str,
}

/// 过滤规则表（顺序有意义）
const FILTER_RULES: &[FilterRule] = &[
    FilterRule {
        name: "page_number_line",
        pattern: r"(?m)^[ \t]*\d+[ \t]*$",
        replacement: "",
    },
    FilterRule {
        name: "toc_dotted_leader",
        pattern: r"(?m)^[^\n]{0,50}\.{3,}[^\n]{0,20}\d+[ \t]*$",
        replacement: "",
    },
    FilterRule {
        name: "toc_chapter_entry",
        pattern: r"(?m)^第[一二三四五六七八九十\d]+章[^\n]*\d+[ \t]*$",
        replacement: "",
    },
    FilterRule {
        name: "copyright",
        pattern: r"(?i)版权所有|copyright|©|保留所有权利|未经许可不得复制",
        replacement: "",
    },
    FilterRule {
        name: "publisher",
        pattern: r"(?i)ISBN|出版社|印刷|装帧|开本|印次|版次",
        replacement: "",
    },
    FilterRule {
        name: "url",
        pattern: r"https?://\S+",
        replacement: "",
    },
    FilterRule {
        name: "email",
        pattern: r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}",
        replacement: "",
    },
    FilterRule {
        name: "page_marker",
        pattern: r"第\s*\d+\s*页|页码\s*\d+",
        replacement: "",
    },
    FilterRule {
        name: "short_symbol_line",
        pattern: r"(?m)^[^\x{4e00}-\x{9fa5}a-zA-Z\n\r]{1,5}$",
        replacement: "",
    },
    FilterRule {
        name: "decorative_line",
        pattern: r"(?m)^[★☆■□▲△●○※◆◇]+[ \t]*$",
        replacement: "",
    },
    FilterRule {
        name: "blank_lines",
        pattern: r"\n\s*\n\s*\n",
        replacement: "\n\n",
    },
];

/// 编译后的规则
static COMPILED_RULES: Lazy<Vec<(&'static str, Regex, &'static str)>> = Lazy::new(|| {
    FILTER_RULES
        .iter()
        .filter_map(|rule| match Regex::new(rule.pattern) {
            Ok(re) => Some((rule.name, re, rule.replacement)),
            Err(e) => {
                tracing::error!(rule = rule.name, error = %e, "Invalid filter rule, ignored");
                None
            }
        })
        .collect()
});

/// 执行一轮全部规则
fn apply_rules(text: &str) -> String {
    let mut filtered = text.to_string();
    for (_, re, replacement) in COMPILED_RULES.iter() {
        if re.is_match(&filtered) {
            filtered = re.replace_all(&filtered, *replacement).into_owned();
        }
    }
    filtered.trim().to_string()
}

/// 过滤章节原文中的无用内容
///
/// 所有规则只删除文本或缩短空行，文本每变化一次都严格变短，循环必然结束。
/// 前面的删除可能让后面的规则产生新的匹配（例如删去 © 后剩下一个纯数字行，
/// 或删去内层「版权所有」后外层拼合成新的关键词），
/// 所以重复执行直到文本不再变化，保证对已过滤文本再次过滤是空操作。
pub fn filter_content(text: &str, title: &str) -> String {
    let mut current = apply_rules(text);

    loop {
        let next = apply_rules(&current);
        if next == current {
            break;
        }
        current = next;
    }

    tracing::debug!(
        title = %title,
        original_chars = text.chars().count(),
        filtered_chars = current.chars().count(),
        "Content filtered"
    );

    current
}
