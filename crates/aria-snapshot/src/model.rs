use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use crate::errors::SnapshotError;

/// Opaque reference to one element within one snapshot generation.
///
/// Wire form is `s<generation>e<index>`; the round-trip through
/// `Display`/`FromStr` is bit-exact.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RefToken {
    pub generation: u32,
    pub index: u32,
}

impl fmt::Display for RefToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}e{}", self.generation, self.index)
    }
}

impl FromStr for RefToken {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SnapshotError::MalformedRef(s.to_string());
        let rest = s.strip_prefix('s').ok_or_else(malformed)?;
        let (generation, index) = rest.split_once('e').ok_or_else(malformed)?;
        if generation.is_empty() || index.is_empty() {
            return Err(malformed());
        }
        Ok(RefToken {
            generation: generation.parse().map_err(|_| malformed())?,
            index: index.parse().map_err(|_| malformed())?,
        })
    }
}

/// Conditional per-role state, attached only for role categories where the
/// state is meaningful.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StateFlags {
    pub checked: Option<bool>,
    pub disabled: Option<bool>,
    pub expanded: Option<bool>,
    pub selected: Option<bool>,
    pub level: Option<u8>,
}

impl StateFlags {
    pub fn is_empty(&self) -> bool {
        *self == StateFlags::default()
    }

    /// Words emitted into the rendered tree line, in a fixed order.
    pub fn words(&self) -> Vec<String> {
        let mut out = Vec::new();
        match self.checked {
            Some(true) => out.push("checked".to_string()),
            Some(false) => out.push("unchecked".to_string()),
            None => {}
        }
        if self.disabled == Some(true) {
            out.push("disabled".to_string());
        }
        match self.expanded {
            Some(true) => out.push("expanded".to_string()),
            Some(false) => out.push("collapsed".to_string()),
            None => {}
        }
        if self.selected == Some(true) {
            out.push("selected".to_string());
        }
        if let Some(level) = self.level {
            out.push(format!("level={level}"));
        }
        out
    }
}

/// A retained tree entry: either a nested element node or bare text.
#[derive(Clone, Debug)]
pub enum AriaChild {
    Node(AriaNode),
    Text(String),
}

/// One retained element in the emitted accessibility tree.
#[derive(Clone, Debug)]
pub struct AriaNode {
    pub role: String,
    pub name: Option<String>,
    pub token: RefToken,
    pub flags: StateFlags,
    pub children: Vec<AriaChild>,
}

/// Result of one tree build. Exactly one snapshot is current per page
/// context; its generation gates every token it issued.
#[derive(Clone, Debug)]
pub struct AriaSnapshot {
    pub generation: u32,
    pub nodes: Vec<AriaChild>,
    pub created_at: SystemTime,
}
