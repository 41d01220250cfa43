//! Fenced code segment scanning
//!
//! Splits a body into prose and code segments. Fences are found with
//! pulldown-cmark, so blocks nested in list items and blockquotes are
//! extracted like top-level ones. The parser and the renderer share this
//! scan so both see the same segmentation.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::ops::Range;

use super::CodeBlock;
use crate::error::ParseError;

/// A contiguous piece of a document body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any fence, verbatim; `offset` is its byte position
    Prose {
        text: &'a str,
        offset: usize,
        line: usize,
    },
    /// A fenced block; `line` is the 1-based line of the opening fence
    Code { block: CodeBlock, line: usize },
}

/// Markdown extensions enabled wherever a body is parsed
pub(crate) fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
}

struct OpenFence {
    language: String,
    start: usize,
    content: String,
}

/// Split `body` into prose and code segments in order of appearance
pub fn segments(body: &str) -> Result<Vec<Segment<'_>>, ParseError> {
    let mut segments = Vec::new();
    let mut open: Option<OpenFence> = None;
    let mut prose_start = 0;
    let mut ordinal = 0;

    for (event, range) in Parser::new_ext(body, markdown_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                open = Some(OpenFence {
                    language: info.split_whitespace().next().unwrap_or("").to_string(),
                    start: range.start,
                    content: String::new(),
                });
            }
            Event::Text(text) => {
                if let Some(fence) = open.as_mut() {
                    fence.content.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                let Some(fence) = open.take() else {
                    continue;
                };
                let block_range = fence.start..line_end(body, range.end);
                let line = line_of(body, fence.start);
                if !is_closed(&body[block_range.clone()]) {
                    return Err(ParseError::malformed(
                        format!("body line {}", line),
                        "code fence is never closed",
                    ));
                }

                push_prose(&mut segments, body, prose_start..block_range.start);
                segments.push(Segment::Code {
                    block: CodeBlock {
                        language: fence.language,
                        content: strip_final_newline(fence.content),
                        ordinal,
                    },
                    line,
                });
                ordinal += 1;
                prose_start = block_range.end;
            }
            _ => {}
        }
    }

    push_prose(&mut segments, body, prose_start..body.len());
    Ok(segments)
}

/// Extract only the code blocks of `body`
pub fn code_blocks(body: &str) -> Result<Vec<CodeBlock>, ParseError> {
    Ok(segments(body)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Code { block, .. } => Some(block),
            Segment::Prose { .. } => None,
        })
        .collect())
}

fn push_prose<'a>(segments: &mut Vec<Segment<'a>>, body: &'a str, range: Range<usize>) {
    if !range.is_empty() {
        segments.push(Segment::Prose {
            text: &body[range.clone()],
            offset: range.start,
            line: line_of(body, range.start),
        });
    }
}

/// 1-based line number of a byte offset
fn line_of(body: &str, offset: usize) -> usize {
    body[..offset].matches('\n').count() + 1
}

/// Extend a block end over the line ending of its last line
fn line_end(body: &str, end: usize) -> usize {
    if body[..end].ends_with('\n') {
        return end;
    }
    match body[end..].find('\n') {
        Some(i) if body[end..end + i].trim().is_empty() => end + i + 1,
        _ => end,
    }
}

fn strip_final_newline(mut content: String) -> String {
    if content.ends_with('\n') {
        content.pop();
        if content.ends_with('\r') {
            content.pop();
        }
    }
    content
}

/// Container markers (list indentation, `>`) in front of a fence line
fn strip_container(line: &str) -> &str {
    line.trim_start_matches([' ', '\t', '>'])
}

fn marker_run(s: &str) -> Option<(char, usize)> {
    let marker = s.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = s.chars().take_while(|&c| c == marker).count();
    (len >= 3).then_some((marker, len))
}

/// An unclosed fence runs to the end of its container, so its last line is
/// not a closing run of the opening marker
fn is_closed(block: &str) -> bool {
    let block = block.trim_end_matches(['\n', '\r']);
    let Some((first, rest)) = block.split_once('\n') else {
        return false;
    };
    let Some((marker, len)) = marker_run(strip_container(first)) else {
        return true;
    };
    let last = strip_container(rest.rsplit('\n').next().unwrap_or(rest));
    match marker_run(last) {
        Some((m, n)) => m == marker && n >= len && last[n..].trim().is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_block() {
        let body = "Intro\n\n```cpp\nint a = 10;\n```\n\nOutro\n";
        let segs = segments(body).unwrap();
        assert_eq!(segs.len(), 3);
        assert_eq!(
            segs[0],
            Segment::Prose {
                text: "Intro\n\n",
                offset: 0,
                line: 1
            }
        );
        match &segs[1] {
            Segment::Code { block, line } => {
                assert_eq!(block.language, "cpp");
                assert_eq!(block.content, "int a = 10;");
                assert_eq!(block.ordinal, 0);
                assert_eq!(*line, 3);
            }
            other => panic!("expected code segment, got {:?}", other),
        }
        assert_eq!(
            segs[2],
            Segment::Prose {
                text: "\nOutro\n",
                offset: 30,
                line: 6
            }
        );
    }

    #[test]
    fn test_ordinals_and_missing_language() {
        let body = "```\nplain\n```\ntext\n~~~~python extra info\nprint(1)\n\n  indented\n~~~~\n";
        let blocks = code_blocks(body).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language, "");
        assert_eq!(blocks[0].ordinal, 0);
        assert_eq!(blocks[1].language, "python");
        assert_eq!(blocks[1].content, "print(1)\n\n  indented");
        assert_eq!(blocks[1].ordinal, 1);
    }

    #[test]
    fn test_closing_fence_must_match() {
        // A shorter run and the other marker do not close the fence
        let body = "````md\n```cpp\nx\n```\n~~~~\n````\n";
        let blocks = code_blocks(body).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "```cpp\nx\n```\n~~~~");
    }

    #[test]
    fn test_indented_fence_is_dedented() {
        let body = "  ```rust\n  fn main() {}\n    nested\n  ```\n";
        let blocks = code_blocks(body).unwrap();
        assert_eq!(blocks[0].content, "fn main() {}\n  nested");
    }

    #[test]
    fn test_unterminated_fence() {
        let body = "Text\n\n```cpp\nint a = 10;\n";
        let err = segments(body).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
        assert_eq!(err.location(), "body line 3");
    }

    #[test]
    fn test_inline_backticks_are_not_fences() {
        let body = "Use ```a``` inline.\n";
        let segs = segments(body).unwrap();
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn test_four_space_indent_is_not_a_fence() {
        let body = "    ```\n    code\n";
        assert!(code_blocks(body).unwrap().is_empty());
    }

    #[test]
    fn test_fences_in_list_items_and_blockquotes() {
        let body = "1. Declare it:\n\n    ```cpp\n    int a = 10;\n    ```\n\n2. Quote it:\n\n> ```c\n> int x;\n> ```\n\nDone.\n";
        let blocks = code_blocks(body).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language, "cpp");
        assert_eq!(blocks[0].content, "int a = 10;");
        assert_eq!(blocks[0].ordinal, 0);
        assert_eq!(blocks[1].language, "c");
        assert_eq!(blocks[1].content, "int x;");
        assert_eq!(blocks[1].ordinal, 1);

        let segs = segments(body).unwrap();
        let last = segs.last().unwrap();
        assert!(matches!(last, Segment::Prose { text, .. } if text.contains("Done.")));
    }

    #[test]
    fn test_unterminated_fence_in_blockquote() {
        let body = "Intro\n\n> ```c\n> int x;\n\nAfter\n";
        let err = segments(body).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
        assert_eq!(err.location(), "body line 3");
    }
}
