//! 文本分割器
//!
//! 按长度预算把任意长度的文本切分为可独立合成的片段
//!
//! 长度以字符（char）计数，中英文一视同仁

/// 段落之间插入的分隔符
const PARAGRAPH_SEPARATOR: char = '\n';

/// 检查是否为句末标点
#[inline]
fn is_sentence_end(ch: char) -> bool {
    matches!(ch, '。' | '？' | '！' | '.' | '?' | '!')
}

/// 检查是否为句末标点后允许紧跟的闭合引号（最多一个）
#[inline]
fn is_closing_quote(ch: char) -> bool {
    matches!(ch, '"' | '\u{201D}' | '\'')
}

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 累积缓冲区：按段落拼接，记录字符数避免重复计数
#[derive(Debug, Default)]
struct Accumulator {
    text: String,
    len: usize,
}

impl Accumulator {
    /// 追加一个段落后的长度（即使缓冲区为空也计入分隔符）
    fn len_with(&self, paragraph_len: usize) -> usize {
        self.len + 1 + paragraph_len
    }

    fn push_paragraph(&mut self, paragraph: &str, paragraph_len: usize) {
        if self.text.is_empty() {
            self.text.push_str(paragraph);
            self.len = paragraph_len;
        } else {
            self.text.push(PARAGRAPH_SEPARATOR);
            self.text.push_str(paragraph);
            self.len += 1 + paragraph_len;
        }
    }

    fn seed(&mut self, text: String) {
        self.len = char_len(&text);
        self.text = text;
    }

    fn flush_into(&mut self, segments: &mut Vec<String>) {
        if !self.text.is_empty() {
            segments.push(std::mem::take(&mut self.text));
        }
        self.len = 0;
    }
}

/// 按句末标点切分段落
///
/// 句子 = 非句末字符 + 连续的句末标点 + 可选的一个闭合引号。
/// 不会丢弃任何字符：拼接所有句子即为原段落
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if !is_sentence_end(ch) {
            continue;
        }

        while let Some(&(_, next)) = chars.peek() {
            if !is_sentence_end(next) {
                break;
            }
            chars.next();
        }
        if let Some(&(_, next)) = chars.peek() {
            if is_closing_quote(next) {
                chars.next();
            }
        }

        let end = chars.peek().map(|&(i, _)| i).unwrap_or(paragraph.len());
        sentences.push(&paragraph[start..end]);
        start = end;
    }

    if start < paragraph.len() {
        sentences.push(&paragraph[start..]);
    }

    sentences
}

/// 把超长段落按句子重新打包
///
/// 已满的子缓冲区直接输出；最后剩余的部分返回给调用方，
/// 作为下一个输出缓冲区的起点（可以与后续段落合并）
fn pack_sentences(paragraph: &str, max_length: usize, segments: &mut Vec<String>) -> String {
    let mut inner = String::new();
    let mut inner_len = 0;

    for sentence in split_sentences(paragraph) {
        let len = char_len(sentence);
        if inner_len + len > max_length {
            let trimmed = inner.trim();
            if !trimmed.is_empty() {
                segments.push(trimmed.to_string());
            }
            inner = sentence.to_string();
            inner_len = len;
        } else {
            inner.push_str(sentence);
            inner_len += len;
        }
    }

    inner.trim().to_string()
}

/// 对文本进行分段
///
/// 分段策略：
/// 1. 文本不超过 `max_length` 时原样返回（保留空白与换行）
/// 2. 否则按换行拆分段落（去除首尾空白，丢弃空段落）
/// 3. 贪心合并段落（以单个换行连接），放不下时输出当前缓冲区
/// 4. 单个段落超长时按句子拆分重新打包，剩余部分留给下一个缓冲区
///
/// 没有句末标点且超长的段落会作为单个超长片段输出，不会被截断。
/// 只有空字符串返回空列表，仅含空白的短文本同样原样返回
pub fn segment_text(text: &str, max_length: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if char_len(text) <= max_length {
        return vec![text.to_string()];
    }

    let mut segments = Vec::new();
    let mut buffer = Accumulator::default();

    let paragraphs = text
        .split(PARAGRAPH_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty());

    for paragraph in paragraphs {
        let len = char_len(paragraph);

        if buffer.len_with(len) <= max_length {
            buffer.push_paragraph(paragraph, len);
            continue;
        }

        buffer.flush_into(&mut segments);

        if len > max_length {
            let remainder = pack_sentences(paragraph, max_length, &mut segments);
            buffer.seed(remainder);
        } else {
            buffer.seed(paragraph.to_string());
        }
    }

    buffer.flush_into(&mut segments);
    segments
}
