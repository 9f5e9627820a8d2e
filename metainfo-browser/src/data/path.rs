use std::{fmt, str::FromStr};

use crate::error::NavError;

/// One navigation step: a property name, optionally selecting the i-th
/// element of a repeating sub-section (`name:index`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChildKey {
    pub name: String,
    pub index: Option<usize>,
}

impl ChildKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }
}

impl FromStr for ChildKey {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, index) = match s.rsplit_once(':') {
            Some((name, index)) => {
                let index = index
                    .parse::<usize>()
                    .map_err(|_| NavError::InvalidKey(s.to_string()))?;
                (name, Some(index))
            }
            None => (s, None),
        };
        if name.is_empty() || name.contains('/') {
            return Err(NavError::InvalidKey(s.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            index,
        })
    }
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}:{}", self.name, i),
            None => f.write_str(&self.name),
        }
    }
}

/// Location of a node in a document, as the keys leading to it from the
/// root. Displayed as `run:0/system:1/energy`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ArchivePath(Vec<ChildKey>);

impl ArchivePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> &[ChildKey] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&ChildKey> {
        self.0.last()
    }

    pub fn join(&self, key: ChildKey) -> Self {
        let mut keys = self.0.clone();
        keys.push(key);
        Self(keys)
    }

    /// Parse a data-level reference such as `/run/0/system/1` or
    /// `#/run/0/system/1`. A numeric segment selects an element of the
    /// preceding repeating sub-section.
    pub fn from_reference(reference: &str) -> Option<Self> {
        let body = reference.strip_prefix('#').unwrap_or(reference);
        let body = body.strip_prefix('/')?;
        let mut keys: Vec<ChildKey> = Vec::new();
        for segment in body.split('/').filter(|s| !s.is_empty()) {
            match segment.parse::<usize>() {
                Ok(i) => {
                    let last = keys.last_mut()?;
                    if last.index.is_some() {
                        return None;
                    }
                    last.index = Some(i);
                }
                Err(_) => keys.push(ChildKey::new(segment)),
            }
        }
        Some(Self(keys))
    }

    /// The reference form of this path (`/run/0/system/1`).
    pub fn to_reference(&self) -> String {
        let mut out = String::new();
        for key in &self.0 {
            out.push('/');
            out.push_str(&key.name);
            if let Some(i) = key.index {
                out.push('/');
                out.push_str(&i.to_string());
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }

    /// JSON pointer to this node in the document.
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for key in &self.0 {
            out = pointer_push(&out, &key.name);
            if let Some(i) = key.index {
                out = pointer_push(&out, &i.to_string());
            }
        }
        out
    }
}

impl FromStr for ArchivePath {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split('/')
            .filter(|seg| !seg.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&keys.join("/"))
    }
}

impl serde::Serialize for ArchivePath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Append one key to a JSON pointer, escaping `~` and `/`.
pub(crate) fn pointer_push(pointer: &str, token: &str) -> String {
    let escaped = token.replace('~', "~0").replace('/', "~1");
    format!("{pointer}/{escaped}")
}
