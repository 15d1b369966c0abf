use std::collections::BTreeSet;

use jzon::JsonValue;

use crate::error::{ConfigError, Error};

struct Frame {
    /// `None` for arrays.
    keys: Option<BTreeSet<String>>,
    path: String,
    expect_key: bool,
    last_key: String,
    index: usize,
}

impl Frame {
    fn new(object: bool, path: String) -> Self {
        Frame {
            keys: object.then(BTreeSet::new),
            path,
            expect_key: object,
            last_key: String::new(),
            index: 0,
        }
    }

    fn child_path(&self) -> String {
        match self.keys {
            Some(_) if self.path.is_empty() => self.last_key.clone(),
            Some(_) => format!("{}.{}", self.path, self.last_key),
            None => format!("{}[{}]", self.path, self.index),
        }
    }
}

/// Finds the first key that occurs twice within one object of a well-formed JSON text.
/// Returns the path of the object (empty for the top level) and the key.
fn find_duplicate_key(text: &str) -> Option<(String, String)> {
    let bytes = text.as_bytes();
    let mut stack: Vec<Frame> = vec![];
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' => {
                let start = pos;
                pos += 1;
                while pos < bytes.len() && bytes[pos] != b'"' {
                    if bytes[pos] == b'\\' {
                        pos += 1;
                    }
                    pos += 1;
                }
                let token = text.get(start..=pos)?;
                if let Some(frame) = stack.last_mut() {
                    if let Some(keys) = &mut frame.keys {
                        if frame.expect_key {
                            let key = jzon::parse(token).ok()?.as_str()?.to_string();
                            if !keys.insert(key.clone()) {
                                return Some((frame.path.clone(), key));
                            }
                            frame.last_key = key;
                            frame.expect_key = false;
                        }
                    }
                }
            }
            open @ (b'{' | b'[') => {
                let path = stack.last().map(Frame::child_path).unwrap_or_default();
                stack.push(Frame::new(open == b'{', path));
            }
            b'}' | b']' => {
                stack.pop();
            }
            b',' => {
                if let Some(frame) = stack.last_mut() {
                    frame.expect_key = frame.keys.is_some();
                    frame.index += 1;
                }
            }
            _ => (),
        }
        pos += 1;
    }
    None
}

/// Parses a JSON document, rejecting objects that repeat a key.
pub fn parse_json(text: &str) -> Result<JsonValue, Error> {
    let doc = jzon::parse(text)?;
    if let Some((path, key)) = find_duplicate_key(text) {
        let place = if path.is_empty() {
            "the top-level object".to_string()
        } else {
            path
        };
        Err(ConfigError::MalformedInput(format!(
            "duplicate key {key:?} in {place}"
        )))?
    }
    Ok(doc)
}
