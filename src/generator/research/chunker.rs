use serde::{Deserialize, Serialize};

use crate::errors::ResearchError;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// 文档分块，偏移与长度均以字符计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub index: usize,
    /// 分块在原文中的起始字符偏移
    pub start: usize,
    pub text: String,
}

/// 将文本切分为相互重叠的定长窗口
///
/// 窗口起点依次为`0, s, 2s, ...`（`s = max_size - overlap`），直到起点到达文本末尾，
/// 最后一个窗口可能短于`max_size`。`overlap >= max_size`时步长不为正，返回配置错误。
pub fn chunk(
    text: &str,
    max_size: usize,
    overlap: usize,
) -> Result<Vec<DocumentChunk>, ResearchError> {
    if overlap >= max_size {
        return Err(ResearchError::Configuration(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, max_size
        )));
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let chars: Vec<char> = text.chars().collect();
    let stride = max_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + max_size).min(chars.len());
        chunks.push(DocumentChunk {
            index: chunks.len(),
            start,
            text: chars[start..end].iter().collect(),
        });
        start += stride;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 去掉每个后续分块开头的重叠部分后拼接
    fn reassemble(chunks: &[DocumentChunk], overlap: usize) -> String {
        let mut text = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                text.push_str(&chunk.text);
            } else {
                text.extend(chunk.text.chars().skip(overlap));
            }
        }
        text
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk("", 1000, 100).unwrap().is_empty());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        assert!(matches!(
            chunk("abc", 100, 100),
            Err(ResearchError::Configuration(_))
        ));
        assert!(chunk("abc", 10, 50).is_err());
        assert!(chunk("abc", 0, 0).is_err());
        assert!(chunk("", 5, 5).is_err());
    }

    #[test]
    fn test_2500_char_document() {
        let text: String = (0..2500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk(&text, 1000, 100).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(
            chunks.iter().map(|c| c.start).collect::<Vec<_>>(),
            vec![0, 900, 1800]
        );
        assert_eq!(chunks[0].text.chars().count(), 1000);
        assert_eq!(chunks[1].text.chars().count(), 1000);
        assert_eq!(chunks[2].text.chars().count(), 700);
        assert_eq!(chunks[1].text[..100], chunks[0].text[900..]);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk("hello world", 1000, 100).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello world");
    }

    #[test]
    fn test_reassembly_reconstructs_original() {
        let samples = [
            "x".to_string(),
            "abcdefghij".repeat(37),
            "héllo wörld, 你好世界 ".repeat(23),
            "0123456789".repeat(100),
        ];
        for text in &samples {
            for (size, overlap) in [(10, 3), (7, 0), (50, 49), (1000, 100), (1, 0)] {
                let chunks = chunk(text, size, overlap).unwrap();
                assert_eq!(&reassemble(&chunks, overlap), text, "size={size} overlap={overlap}");
                assert!(chunks.iter().all(|c| c.text.chars().count() <= size));
            }
        }
    }

    #[test]
    fn test_multibyte_text_is_split_on_characters() {
        let text = "数据".repeat(10);
        let chunks = chunk(&text, 3, 1).unwrap();
        assert_eq!(chunks[0].text, "数据数");
        assert_eq!(chunks[1].start, 2);
        assert_eq!(chunks[1].text, "数据数");
    }
}
