use std::collections::BTreeMap;

use super::detection::Detection;

/// Class id to label mapping.
///
/// Ids without an entry render as `class{id}`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassNames {
    names: BTreeMap<usize, String>,
}

impl ClassNames {
    /// Parses the `names` entry Ultralytics writes into exported ONNX
    /// metadata, a Python dict literal such as `{0: 'pill', 1: 'capsule'}`.
    ///
    /// Returns `None` if the text is not in that shape.
    pub fn parse_metadata(text: &str) -> Option<Self> {
        let body = text.trim().strip_prefix('{')?.strip_suffix('}')?;
        let mut names = BTreeMap::new();
        let mut rest = body.trim_start();

        while !rest.is_empty() {
            let (key, after_key) = take_token(rest)?;
            let id: usize = key.parse().ok()?;
            let after_colon = after_key.trim_start().strip_prefix(':')?.trim_start();
            let (name, after_name) = take_token(after_colon)?;
            names.insert(id, name.to_string());

            rest = after_name.trim_start();
            if let Some(next) = rest.strip_prefix(',') {
                rest = next.trim_start();
            } else if !rest.is_empty() {
                return None;
            }
        }

        Some(Self { names })
    }

    pub fn name(&self, class_id: usize) -> String {
        self.names
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| format!("class{class_id}"))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Per-class counts in class id order, e.g. `2 pills, 1 capsule`.
    pub fn summarize(&self, detections: &[Detection]) -> String {
        if detections.is_empty() {
            return "(no detections)".to_string();
        }
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for d in detections {
            *counts.entry(d.class_id).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(id, n)| {
                let plural = if n > 1 { "s" } else { "" };
                format!("{n} {}{plural}", self.name(id))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Splits one quoted string or bare integer off the front of `s`.
fn take_token(s: &str) -> Option<(&str, &str)> {
    let quote = s.chars().next()?;
    if quote == '\'' || quote == '"' {
        let inner = &s[1..];
        let end = inner.find(quote)?;
        Some((&inner[..end], &inner[end + 1..]))
    } else {
        let end = s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len());
        if end == 0 {
            return None;
        }
        Some((&s[..end], &s[end..]))
    }
}
