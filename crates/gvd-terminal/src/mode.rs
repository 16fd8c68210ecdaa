//! Mode hierarchy: identifiers, definitions, and transitions.

use std::collections::HashMap;
use std::fmt;

use gvd_types::error::{GvdError, Result};

/// Stable identifier of a CLI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeId(&'static str);

impl ModeId {
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Static description of one mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeDef {
    pub id: ModeId,
    /// `None` only for the apex mode.
    pub parent: Option<ModeId>,
    /// Text shown inside the prompt parentheses.
    pub prompt: String,
    /// Human name used in help headers and the "exit" help text.
    pub name: String,
    /// Configuration-style modes accept "no" and "default" prefixes.
    pub config_style: bool,
}

impl ModeDef {
    /// The top-level mode every session starts in.
    pub fn apex(id: ModeId, name: &str) -> Self {
        Self {
            id,
            parent: None,
            prompt: String::new(),
            name: name.to_string(),
            config_style: false,
        }
    }

    pub fn child(id: ModeId, parent: ModeId, prompt: &str, name: &str) -> Self {
        Self {
            id,
            parent: Some(parent),
            prompt: prompt.to_string(),
            name: name.to_string(),
            config_style: false,
        }
    }

    /// Mark the mode as configuration-style.
    pub fn configurable(mut self) -> Self {
        self.config_style = true;
        self
    }
}

/// A mode change requested by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Return to the parent mode ("exit"). No-op at the apex.
    Parent,
    /// Return to the apex mode ("end").
    Apex,
    /// Descend into the given mode.
    Enter(ModeId),
}

/// Validated set of modes forming a single tree.
#[derive(Debug, Clone)]
pub struct ModeTable {
    defs: HashMap<ModeId, ModeDef>,
    order: Vec<ModeId>,
    apex: ModeId,
}

impl ModeTable {
    /// Build the table, rejecting duplicates, unknown parents, cycles, and
    /// anything other than exactly one apex.
    pub fn new(defs: Vec<ModeDef>) -> Result<Self> {
        let mut map = HashMap::with_capacity(defs.len());
        let mut order = Vec::with_capacity(defs.len());
        let mut apex = None;

        for def in defs {
            if def.parent.is_none() {
                if let Some(existing) = apex {
                    return Err(GvdError::Mode(format!(
                        "two apex modes: {existing} and {}",
                        def.id
                    )));
                }
                apex = Some(def.id);
            }
            order.push(def.id);
            if let Some(dup) = map.insert(def.id, def) {
                return Err(GvdError::Mode(format!("duplicate mode: {}", dup.id)));
            }
        }

        let apex = apex.ok_or_else(|| GvdError::Mode("no apex mode".into()))?;
        let table = Self {
            defs: map,
            order,
            apex,
        };

        for id in &table.order {
            if let Some(parent) = table.defs[id].parent
                && !table.defs.contains_key(&parent)
            {
                return Err(GvdError::Mode(format!(
                    "mode {id} has unknown parent {parent}"
                )));
            }
            table.depth(*id)?;
        }
        Ok(table)
    }

    /// Number of hops from `id` to the apex.
    fn depth(&self, id: ModeId) -> Result<usize> {
        let mut hops = 0;
        let mut cur = id;
        while let Some(parent) = self.get(cur).and_then(|d| d.parent) {
            hops += 1;
            if hops > self.order.len() {
                return Err(GvdError::Mode(format!("parent cycle through {id}")));
            }
            cur = parent;
        }
        Ok(hops)
    }

    pub fn apex(&self) -> ModeId {
        self.apex
    }

    pub fn get(&self, id: ModeId) -> Option<&ModeDef> {
        self.defs.get(&id)
    }

    pub fn contains(&self, id: ModeId) -> bool {
        self.defs.contains_key(&id)
    }

    /// Modes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModeDef> {
        self.order.iter().filter_map(|id| self.defs.get(id))
    }

    /// Mode reached from `current` by applying `transition`.
    pub fn resolve(&self, current: ModeId, transition: Transition) -> ModeId {
        match transition {
            Transition::Parent => self
                .get(current)
                .and_then(|d| d.parent)
                .unwrap_or(current),
            Transition::Apex => self.apex,
            Transition::Enter(target) if self.contains(target) => target,
            Transition::Enter(target) => {
                log::warn!("ignoring transition to unknown mode {target}");
                current
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOP: ModeId = ModeId::new("top");
    const MID: ModeId = ModeId::new("mid");
    const LEAF: ModeId = ModeId::new("leaf");

    fn table() -> ModeTable {
        ModeTable::new(vec![
            ModeDef::apex(TOP, "Top"),
            ModeDef::child(MID, TOP, "mid", "Middle").configurable(),
            ModeDef::child(LEAF, MID, "leaf", "Leaf"),
        ])
        .unwrap()
    }

    #[test]
    fn apex_and_lookup() {
        let t = table();
        assert_eq!(t.apex(), TOP);
        assert!(t.get(MID).unwrap().config_style);
        assert!(!t.get(LEAF).unwrap().config_style);
        assert_eq!(t.iter().map(|d| d.id).collect::<Vec<_>>(), vec![TOP, MID, LEAF]);
    }

    #[test]
    fn resolve_transitions() {
        let t = table();
        assert_eq!(t.resolve(LEAF, Transition::Parent), MID);
        assert_eq!(t.resolve(MID, Transition::Parent), TOP);
        assert_eq!(t.resolve(TOP, Transition::Parent), TOP);
        assert_eq!(t.resolve(LEAF, Transition::Apex), TOP);
        assert_eq!(t.resolve(TOP, Transition::Enter(LEAF)), LEAF);
        assert_eq!(t.resolve(MID, Transition::Enter(ModeId::new("nope"))), MID);
    }

    #[test]
    fn rejects_missing_apex() {
        let err = ModeTable::new(vec![ModeDef::child(MID, TOP, "mid", "Middle")]).unwrap_err();
        assert!(format!("{err}").contains("no apex"));
    }

    #[test]
    fn rejects_two_apexes() {
        let err = ModeTable::new(vec![ModeDef::apex(TOP, "Top"), ModeDef::apex(MID, "Mid")])
            .unwrap_err();
        assert!(format!("{err}").contains("two apex"));
    }

    #[test]
    fn rejects_duplicate() {
        let err = ModeTable::new(vec![
            ModeDef::apex(TOP, "Top"),
            ModeDef::child(MID, TOP, "a", "A"),
            ModeDef::child(MID, TOP, "b", "B"),
        ])
        .unwrap_err();
        assert!(format!("{err}").contains("duplicate mode: mid"));
    }

    #[test]
    fn rejects_unknown_parent() {
        let err = ModeTable::new(vec![
            ModeDef::apex(TOP, "Top"),
            ModeDef::child(LEAF, MID, "leaf", "Leaf"),
        ])
        .unwrap_err();
        assert!(format!("{err}").contains("unknown parent"));
    }

    #[test]
    fn rejects_cycle() {
        let err = ModeTable::new(vec![
            ModeDef::apex(TOP, "Top"),
            ModeDef::child(MID, LEAF, "mid", "Mid"),
            ModeDef::child(LEAF, MID, "leaf", "Leaf"),
        ])
        .unwrap_err();
        assert!(format!("{err}").contains("cycle"));
    }

    #[test]
    fn display_mode_id() {
        assert_eq!(LEAF.to_string(), "leaf");
        assert_eq!(LEAF.as_str(), "leaf");
    }
}
