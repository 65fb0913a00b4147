//! Text chunking for long documents and corpus files
//!
//! Sizes are counted in characters, and every split lands on a character
//! boundary.

use crate::config::ChunkStrategy;

/// Splits a document into prompt-sized pieces along its structure
pub struct TextChunker {
    strategy: ChunkStrategy,
    max_chunk_size: usize,
}

impl TextChunker {
    /// Create a new text chunker
    pub fn new(strategy: ChunkStrategy, max_chunk_size: usize) -> Self {
        Self {
            strategy,
            max_chunk_size: max_chunk_size.max(1),
        }
    }

    /// Chunk the given text
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.chars().count() <= self.max_chunk_size {
            return vec![text.to_string()];
        }

        match self.strategy {
            ChunkStrategy::ByParagraph => self.chunk_by_paragraph(text),
            ChunkStrategy::BySection => self.chunk_by_section(text),
        }
    }

    fn chunk_by_paragraph(&self, text: &str) -> Vec<String> {
        let paragraphs: Vec<&str> = text
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .collect();
        self.combine_until_limit(paragraphs)
    }

    /// Sections start at markdown headers or numbered clauses ("1.", "2.3 ")
    fn chunk_by_section(&self, text: &str) -> Vec<String> {
        let mut sections = Vec::new();
        let mut current = String::new();

        for line in text.lines() {
            if is_section_header(line) && !current.trim().is_empty() {
                sections.push(current.trim().to_string());
                current.clear();
            }
            current.push_str(line);
            current.push('\n');
        }
        if !current.trim().is_empty() {
            sections.push(current.trim().to_string());
        }

        if sections.len() <= 1 {
            self.chunk_by_paragraph(text)
        } else {
            self.combine_until_limit(sections)
        }
    }

    fn combine_until_limit<S: AsRef<str>>(&self, elements: Vec<S>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for element in elements {
            let element = element.as_ref();
            let element_len = element.chars().count();

            if current_len + element_len + 2 > self.max_chunk_size {
                if !current.is_empty() {
                    chunks.push(current.trim().to_string());
                    current.clear();
                    current_len = 0;
                }

                if element_len > self.max_chunk_size {
                    chunks.extend(split_at_char_limit(element, self.max_chunk_size));
                    continue;
                }
            }

            current.push_str(element);
            current.push_str("\n\n");
            current_len += element_len + 2;
        }

        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }

        chunks
    }
}

fn is_section_header(line: &str) -> bool {
    let line = line.trim_start();
    if line.starts_with('#') {
        return true;
    }
    let digits: String = line.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
    digits.starts_with(|c: char| c.is_ascii_digit())
        && digits.contains('.')
        && line[digits.len()..].starts_with(' ')
}

fn split_at_char_limit(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit)
        .map(|c| c.iter().collect::<String>())
        .collect()
}

/// Fixed-size overlapping windows, used for knowledge-base chunks
#[derive(Debug, Clone, Copy)]
pub struct WindowChunker {
    size: usize,
    overlap: usize,
}

impl WindowChunker {
    /// Windows of `size` characters, each starting `size - overlap` after the last
    ///
    /// `overlap` is clamped below `size`.
    pub fn new(size: usize, overlap: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            overlap: overlap.min(size - 1),
        }
    }

    /// Split `text` into windows; whitespace-only windows are dropped
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.size - self.overlap;
        let mut windows = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            if !window.trim().is_empty() {
                windows.push(window);
            }
            if end == chars.len() {
                break;
            }
            start += step;
        }

        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_chunking_needed_for_small_text() {
        let chunker = TextChunker::new(ChunkStrategy::ByParagraph, 100);
        let text = "Short text here.";
        let chunks = chunker.chunk(text);
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_chunk_by_paragraph_keeps_order() {
        let chunker = TextChunker::new(ChunkStrategy::ByParagraph, 50);
        let text = "First paragraph here.\n\nSecond paragraph here.\n\nThird paragraph here.";
        let chunks = chunker.chunk(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50);
        }
        let joined = chunks.join(" ");
        assert!(joined.find("First").unwrap() < joined.find("Third").unwrap());
    }

    #[test]
    fn test_chunk_by_section_with_numbered_clauses() {
        let chunker = TextChunker::new(ChunkStrategy::BySection, 60);
        let text = "1. Monitor effluent quality monthly\nDetails\n2. Keep waste manifests on site\nMore details";
        let chunks = chunker.chunk(text);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("1. Monitor"));
        assert!(chunks[1].starts_with("2. Keep"));
    }

    #[test]
    fn test_section_fallback_to_paragraph() {
        let chunker = TextChunker::new(ChunkStrategy::BySection, 20);
        let text = "Just some text\n\nWith paragraphs\n\nBut no sections";
        let chunks = chunker.chunk(text);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_very_long_paragraph_split_on_char_boundaries() {
        let chunker = TextChunker::new(ChunkStrategy::ByParagraph, 20);
        let text = "ç".repeat(100);
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| c.chars().count() == 20));
    }

    #[test]
    fn test_windows_overlap() {
        let chunker = WindowChunker::new(10, 4);
        let text: String = ('a'..='z').collect();
        let windows = chunker.chunk(&text);

        assert_eq!(windows[0], "abcdefghij");
        assert_eq!(windows[1], "ghijklmnop");
        assert!(windows.last().unwrap().ends_with('z'));
    }

    #[test]
    fn test_short_text_is_one_window() {
        let windows = WindowChunker::new(1000, 200).chunk("licença de operação");
        assert_eq!(windows, vec!["licença de operação".to_string()]);
    }

    #[test]
    fn test_blank_text_has_no_windows() {
        assert!(WindowChunker::new(10, 2).chunk("   \n\n  ").is_empty());
        assert!(WindowChunker::new(10, 2).chunk("").is_empty());
    }

    #[test]
    fn test_overlap_clamped_below_size() {
        let windows = WindowChunker::new(3, 10).chunk("abcdef");
        assert_eq!(windows, vec!["abc", "bcd", "cde", "def"]);
    }
}
