//! 流水线提示词模板

/// 片段要点提取
pub fn segment_summary_prompt(segment: &str, max_summary_length: usize) -> String {
    format!(
        "请提取这个段落的核心要点（控制在{max}字以内）：\n\n\
         段落内容：\n{segment}\n\n\
         要求：\n\
         1. 提取最核心的1-2个观点\n\
         2. 保留重要的案例或数据\n\
         3. 保持作者的原意，忽略页码、页眉页脚\n\n\
         只输出核心要点，不要其他说明。",
        max = max_summary_length,
        segment = segment,
    )
}

/// 章节视频价值分析
pub fn chapter_analysis_prompt(title: &str, content: &str) -> String {
    format!(
        "请分析这个章节的内容，评估其视频制作价值：\n\n\
         章节标题：{title}\n\
         章节内容：{content}\n\n\
         分析要求：\n\
         1. 这个章节有几个独立的核心观点？（1-5个）\n\
         2. 每个观点是否有具体案例支撑？\n\
         3. 哪些观点最适合做成短视频？推荐制作几个视频？（1-4个）\n\n\
         输出格式：\n\
         核心观点数量：X个\n\
         推荐视频数量：X个\n\
         主要观点：\n1. [观点1]\n2. [观点2]\n\n\
         章节质量评估：[优秀/良好/一般/较差]",
        title = title,
        content = content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_embed_inputs() {
        let p = segment_summary_prompt("原文片段", 300);
        assert!(p.contains("原文片段"));
        assert!(p.contains("300字以内"));

        let p = chapter_analysis_prompt("第一章", "正文");
        assert!(p.contains("章节标题：第一章"));
        assert!(p.contains("章节内容：正文"));
    }
}
