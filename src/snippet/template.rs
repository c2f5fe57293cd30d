//! スニペットテンプレートの解析
//!
//! `$1`、`${2}`、`${2:既定値}`（既定値内の入れ子フィールド可）、`$0`（終了位置）と
//! `\` によるエスケープに対応する

use crate::error::SnippetError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TemplatePart {
    Literal(String),
    Field { index: usize, default: Vec<TemplatePart> },
}

/// 展開後のフィールド位置（展開テキスト先頭からの文字オフセット）
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderedField {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub parent: Option<usize>,
}

/// 解析済みテンプレート
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetTemplate {
    parts: Vec<TemplatePart>,
}

impl SnippetTemplate {
    pub fn parse(template: &str) -> Result<Self, SnippetError> {
        let chars: Vec<char> = template.chars().collect();
        let mut pos = 0;
        let parts = parse_parts(&chars, &mut pos, None)?;
        Ok(Self { parts })
    }

    /// 既定値を埋めた展開テキストとフィールド位置
    pub(crate) fn render(&self) -> (String, Vec<RenderedField>) {
        let mut text = String::new();
        let mut len = 0;
        let mut fields = Vec::new();
        render_parts(&self.parts, None, &mut text, &mut len, &mut fields);
        (text, fields)
    }
}

fn parse_parts(
    chars: &[char],
    pos: &mut usize,
    open_at: Option<usize>,
) -> Result<Vec<TemplatePart>, SnippetError> {
    let mut parts = Vec::new();
    let mut literal = String::new();

    while *pos < chars.len() {
        let ch = chars[*pos];
        match ch {
            '\\' => {
                *pos += 1;
                match chars.get(*pos) {
                    Some(&next) => {
                        literal.push(next);
                        *pos += 1;
                    }
                    None => literal.push('\\'),
                }
            }
            '}' if open_at.is_some() => {
                *pos += 1;
                flush(&mut literal, &mut parts);
                return Ok(parts);
            }
            '$' => {
                let dollar = *pos;
                *pos += 1;
                match chars.get(*pos) {
                    Some(c) if c.is_ascii_digit() => {
                        let index = read_index(chars, pos)?;
                        flush(&mut literal, &mut parts);
                        parts.push(TemplatePart::Field {
                            index,
                            default: Vec::new(),
                        });
                    }
                    Some('{') => {
                        *pos += 1;
                        let index = read_index(chars, pos)?;
                        let default = match chars.get(*pos) {
                            Some('}') => {
                                *pos += 1;
                                Vec::new()
                            }
                            Some(':') => {
                                *pos += 1;
                                parse_parts(chars, pos, Some(dollar))?
                            }
                            _ => {
                                return Err(SnippetError::UnterminatedField { position: dollar })
                            }
                        };
                        flush(&mut literal, &mut parts);
                        parts.push(TemplatePart::Field { index, default });
                    }
                    _ => literal.push('$'),
                }
            }
            other => {
                literal.push(other);
                *pos += 1;
            }
        }
    }

    if let Some(position) = open_at {
        return Err(SnippetError::UnterminatedField { position });
    }
    flush(&mut literal, &mut parts);
    Ok(parts)
}

fn read_index(chars: &[char], pos: &mut usize) -> Result<usize, SnippetError> {
    let start = *pos;
    while chars.get(*pos).map(|c| c.is_ascii_digit()).unwrap_or(false) {
        *pos += 1;
    }
    let digits: String = chars[start..*pos].iter().collect();
    if digits.is_empty() {
        let found: String = chars.get(start).map(|c| c.to_string()).unwrap_or_default();
        return Err(SnippetError::InvalidIndex(found));
    }
    digits
        .parse::<usize>()
        .map_err(|_| SnippetError::InvalidIndex(digits.clone()))
}

fn flush(literal: &mut String, parts: &mut Vec<TemplatePart>) {
    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(std::mem::take(literal)));
    }
}

fn render_parts(
    parts: &[TemplatePart],
    parent: Option<usize>,
    text: &mut String,
    len: &mut usize,
    fields: &mut Vec<RenderedField>,
) {
    for part in parts {
        match part {
            TemplatePart::Literal(literal) => {
                text.push_str(literal);
                *len += literal.chars().count();
            }
            TemplatePart::Field { index, default } => {
                let slot = fields.len();
                fields.push(RenderedField {
                    index: *index,
                    start: *len,
                    end: *len,
                    parent,
                });
                render_parts(default, Some(slot), text, len, fields);
                fields[slot].end = *len;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_require_template() {
        let template = SnippetTemplate::parse("[$1 :as $2]").unwrap();
        let (text, fields) = template.render();
        assert_eq!(text, "[ :as ]");
        assert_eq!(
            fields,
            vec![
                RenderedField { index: 1, start: 1, end: 1, parent: None },
                RenderedField { index: 2, start: 6, end: 6, parent: None },
            ]
        );
    }

    #[test]
    fn renders_nested_defaults() {
        let template = SnippetTemplate::parse("[$1 :refer ${2:[$3]}]").unwrap();
        let (text, fields) = template.render();
        assert_eq!(text, "[ :refer []]");
        assert_eq!(fields[1], RenderedField { index: 2, start: 9, end: 11, parent: None });
        assert_eq!(fields[2], RenderedField { index: 3, start: 10, end: 10, parent: Some(1) });
    }

    #[test]
    fn escapes_and_stray_dollars_are_literal() {
        let template = SnippetTemplate::parse(r"\$1 costs $ ${1:x\}y}").unwrap();
        let (text, fields) = template.render();
        assert_eq!(text, "$1 costs $ x}y");
        assert_eq!(fields.len(), 1);
        assert_eq!((fields[0].start, fields[0].end), (11, 14));
    }

    #[test]
    fn malformed_templates_are_rejected() {
        assert_eq!(
            SnippetTemplate::parse("[${1:abc"),
            Err(SnippetError::UnterminatedField { position: 1 })
        );
        assert_eq!(
            SnippetTemplate::parse("${x}"),
            Err(SnippetError::InvalidIndex("x".to_string()))
        );
    }
}
