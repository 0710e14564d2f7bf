//! Well-known text, revisions 1 (GDAL and ESRI flavors) and 2 (2015/2019).
//!
//! Reading and writing go through a small keyword-tree representation; the
//! vocabulary differences between revisions live entirely in `parse` and
//! `write`.

pub(crate) mod parse;
pub(crate) mod write;

use crate::error::Error;

/// One argument of a WKT node.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Value {
    Text(String),
    Number(f64),
    /// Bare word, e.g. an axis direction or a CS type.
    Word(String),
    Node(Node),
}

/// `KEYWORD[value, value, ...]`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Node {
    pub keyword: String,
    pub values: Vec<Value>,
}

impl Node {
    pub fn new(keyword: impl Into<String>) -> Self {
        Node {
            keyword: keyword.into(),
            values: Vec::new(),
        }
    }

    pub fn push_text(mut self, text: impl Into<String>) -> Self {
        self.values.push(Value::Text(text.into()));
        self
    }

    pub fn push_number(mut self, value: f64) -> Self {
        self.values.push(Value::Number(value));
        self
    }

    pub fn push_word(mut self, word: impl Into<String>) -> Self {
        self.values.push(Value::Word(word.into()));
        self
    }

    pub fn push_node(mut self, node: Node) -> Self {
        self.values.push(Value::Node(node));
        self
    }

    pub fn is(&self, keyword: &str) -> bool {
        self.keyword.eq_ignore_ascii_case(keyword)
    }

    /// First quoted-string argument, conventionally the object name.
    pub fn name(&self) -> Option<&str> {
        self.values.iter().find_map(|v| match v {
            Value::Text(t) => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn find(&self, keyword: &str) -> Option<&Node> {
        self.values.iter().find_map(|v| match v {
            Value::Node(n) if n.is(keyword) => Some(n),
            _ => None,
        })
    }

    pub fn find_any(&self, keywords: &[&str]) -> Option<&Node> {
        keywords.iter().find_map(|k| self.find(k))
    }

    pub fn find_all<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Node> {
        self.values.iter().filter_map(move |v| match v {
            Value::Node(n) if n.is(keyword) => Some(n),
            _ => None,
        })
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &Node> {
        self.values.iter().filter_map(|v| match v {
            Value::Node(n) => Some(n),
            _ => None,
        })
    }

    pub fn number_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index)? {
            Value::Number(n) => Some(*n),
            Value::Text(t) => t.parse().ok(),
            _ => None,
        }
    }

    pub fn text_at(&self, index: usize) -> Option<&str> {
        match self.values.get(index)? {
            Value::Text(t) => Some(t.as_str()),
            Value::Word(w) => Some(w.as_str()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer

pub(crate) fn parse_tree(text: &str) -> Result<Node, Error> {
    let mut parser = TreeParser {
        text,
        chars: text.char_indices().peekable(),
    };
    let node = parser.node()?;
    parser.skip_whitespace();
    if let Some((at, c)) = parser.chars.peek().copied() {
        return Err(Error::parse(
            text,
            format!("unexpected trailing {c:?} at offset {at}"),
        ));
    }
    Ok(node)
}

struct TreeParser<'a> {
    text: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> TreeParser<'a> {
    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn node(&mut self) -> Result<Node, Error> {
        self.skip_whitespace();
        let keyword = self.word()?;
        self.skip_whitespace();
        let open = match self.chars.next() {
            Some((_, c @ ('[' | '('))) => c,
            _ => {
                return Err(Error::parse(
                    self.text,
                    format!("expected '[' after keyword {keyword}"),
                ))
            }
        };
        let close = if open == '[' { ']' } else { ')' };
        self.node_body(keyword, close)
    }

    fn node_body(&mut self, keyword: String, close: char) -> Result<Node, Error> {
        let mut node = Node::new(keyword);
        loop {
            self.skip_whitespace();
            match self.chars.peek().copied() {
                Some((_, c)) if c == close => {
                    self.chars.next();
                    return Ok(node);
                }
                Some((_, ',')) => {
                    self.chars.next();
                }
                Some((_, '"')) => node.values.push(Value::Text(self.quoted()?)),
                Some((_, c)) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                    node.values.push(Value::Number(self.number()?));
                }
                Some((_, c)) if c.is_alphabetic() || c == '_' => {
                    let word = self.word()?;
                    self.skip_whitespace();
                    if matches!(self.chars.peek(), Some((_, '[' | '('))) {
                        let open = self.chars.next().map(|(_, c)| c).unwrap_or('[');
                        let inner_close = if open == '[' { ']' } else { ')' };
                        let inner = self.node_body(word, inner_close)?;
                        node.values.push(Value::Node(inner));
                    } else {
                        node.values.push(Value::Word(word));
                    }
                }
                Some((at, c)) => {
                    return Err(Error::parse(
                        self.text,
                        format!("unexpected {c:?} at offset {at}"),
                    ))
                }
                None => {
                    return Err(Error::parse(
                        self.text,
                        format!("unterminated {} node", node.keyword),
                    ))
                }
            }
        }
    }

    fn word(&mut self) -> Result<String, Error> {
        let mut out = String::new();
        while let Some((_, c)) = self.chars.peek().copied() {
            if c.is_alphanumeric() || c == '_' {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if out.is_empty() {
            Err(Error::parse(self.text, "expected a keyword"))
        } else {
            Ok(out)
        }
    }

    fn quoted(&mut self) -> Result<String, Error> {
        self.chars.next(); // opening quote
        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some((_, '"')) => {
                    // A doubled quote is an escaped quote.
                    if matches!(self.chars.peek(), Some((_, '"'))) {
                        self.chars.next();
                        out.push('"');
                    } else {
                        return Ok(out);
                    }
                }
                Some((_, c)) => out.push(c),
                None => return Err(Error::parse(self.text, "unterminated string")),
            }
        }
    }

    fn number(&mut self) -> Result<f64, Error> {
        let mut out = String::new();
        while let Some((_, c)) = self.chars.peek().copied() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        out.parse()
            .map_err(|_| Error::parse(self.text, format!("bad number {out:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tree() {
        let node = parse_tree(r#"PRIMEM["Greenwich",0,ANGLEUNIT["degree",0.0174532925199433]]"#)
            .unwrap();
        assert!(node.is("PRIMEM"));
        assert_eq!(node.name(), Some("Greenwich"));
        assert_eq!(node.number_at(1), Some(0.0));
        let unit = node.find("ANGLEUNIT").unwrap();
        assert_eq!(unit.number_at(1), Some(0.0174532925199433));
    }

    #[test]
    fn test_parse_words_and_nested_nodes() {
        let node =
            parse_tree(r#"AXIS["geodetic latitude (Lat)",north,ORDER[1],ANGLEUNIT["degree",0.017]]"#)
                .unwrap();
        assert_eq!(node.text_at(1), Some("north"));
        assert_eq!(node.find("ORDER").unwrap().number_at(0), Some(1.0));
    }

    #[test]
    fn test_parse_wkt1_parentheses() {
        let node = parse_tree(r#"UNIT("metre",1)"#).unwrap();
        assert!(node.is("UNIT"));
        assert_eq!(node.number_at(1), Some(1.0));
    }

    #[test]
    fn test_escaped_quote() {
        let node = parse_tree(r#"DATUM["He said ""hi""",ELLIPSOID["x",1,0]]"#).unwrap();
        assert_eq!(node.name(), Some(r#"He said "hi""#));
    }

    #[test]
    fn test_unterminated_is_error() {
        assert!(matches!(
            parse_tree("GEOGCRS[\"oops\"").unwrap_err(),
            Error::DefinitionParse { .. }
        ));
        assert!(parse_tree("GEOGCRS[\"a\"]extra").is_err());
    }

    #[test]
    fn test_scientific_notation() {
        let node = parse_tree("UNIT[\"x\",1.5e-3]").unwrap();
        assert_eq!(node.number_at(1), Some(0.0015));
    }
}
