use crate::error::Result;
use crate::storage::WriteRequest;
use std::collections::{BTreeMap, HashSet};

/// Allow-List von Pfad-Patterns für einen Bucket Sync, alles andere ist ausgeschlossen.
///
/// `*` passt auf beliebig viele Zeichen (auch `/`), `?` auf genau eines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusionFilter {
    patterns: Vec<String>,
}

impl InclusionFilter {
    /// Ein `"<ObjectId>/*"` pro unterschiedlicher ObjectId, in Reihenfolge des ersten Auftretens
    pub fn from_requests(requests: &[WriteRequest]) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut patterns = Vec::new();

        for request in requests {
            let object_id = request.object_id()?;
            if seen.insert(object_id) {
                patterns.push(format!("{}/*", object_id));
            }
        }

        Ok(Self { patterns })
    }

    #[cfg(test)]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, key: &str) -> bool {
        self.patterns.iter().any(|pattern| wildcard_match(pattern, key))
    }

    /// Literal Präfix jedes Patterns, für gezieltes Listing.
    ///
    /// `true`, wenn das Pattern nur aus Präfix und abschließendem `*` besteht
    /// und damit jeder gelistete Key ohne weiteren Vergleich eingeschlossen ist.
    pub fn list_prefixes(&self) -> Vec<(&str, bool)> {
        let mut prefixes = BTreeMap::new();
        for pattern in &self.patterns {
            let end = pattern.find(['*', '?']).unwrap_or(pattern.len());
            let exhaustive = &pattern[end..] == "*";
            *prefixes.entry(&pattern[..end]).or_insert(false) |= exhaustive;
        }
        prefixes.into_iter().collect()
    }
}

fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.as_bytes();
    let text = text.as_bytes();
    let (mut p, mut t) = (0, 0);
    // Position des letzten `*` und die Textstelle, ab der es gerade matcht
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == b'?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}
