//! Per-function check registry and alias map.
//!
//! Every tracked path owns an ascending list of `CheckedPosition` slots. An
//! alias (`y := x.F`) makes `y` and `x.F` refer to the *same* list, so a
//! guard recorded through either name is visible through both.
//!
//! The registry uses `Rc<RefCell<_>>` and is therefore `!Send`: one registry
//! belongs to exactly one function's analysis.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use npecheck_ast::ast::Pos;

use crate::chain::Path;

/// What a slot stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// A pointer value.
    Default,
    /// An element of a `[]*T`; trusted element-wise.
    SliceElem,
    /// `a.B.C` where `a.B` is a pointer and the compared leaf `C` is not.
    ParentPointerLeafNonPointer,
}

/// One recorded validation state of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckedPosition {
    pub pos: Pos,
    pub guarded: bool,
    pub kind: SlotKind,
}

impl CheckedPosition {
    pub fn unguarded(pos: Pos) -> Self {
        Self {
            pos,
            guarded: false,
            kind: SlotKind::Default,
        }
    }

    pub fn guarded(pos: Pos) -> Self {
        Self {
            pos,
            guarded: true,
            kind: SlotKind::Default,
        }
    }

    pub fn slice_elem(pos: Pos) -> Self {
        Self {
            pos,
            guarded: true,
            kind: SlotKind::SliceElem,
        }
    }

    /// Placed at 0:0 so it precedes every access in the function.
    pub fn parent_pointer_leaf() -> Self {
        Self {
            pos: Pos::default(),
            guarded: true,
            kind: SlotKind::ParentPointerLeafNonPointer,
        }
    }
}

type SlotList = Rc<RefCell<Vec<CheckedPosition>>>;

/// Result of applying a guard to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// An unguarded slot became guarded.
    Guarded,
    /// A fresh guarded entry was created for a path with no slots.
    Created,
    /// The covering slot was already guarded.
    AlreadyGuarded,
    /// Nothing to guard: unknown path, or no slot covers the position.
    Untracked,
}

#[derive(Debug, Default)]
pub struct CheckRegistry {
    slots: HashMap<Path, SlotList>,
    aliases: HashMap<Path, Path>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// A root name originates from outside the function.
    pub fn is_tracked_root(&self, name: &str) -> bool {
        self.slots.contains_key(&Path::root(name))
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.list(path).is_some()
    }

    /// The path `derived` was last assigned from, if any.
    pub fn alias_of(&self, derived: &Path) -> Option<&Path> {
        self.aliases.get(derived)
    }

    /// Snapshot of a path's slots, in position order.
    pub fn slots(&self, path: &Path) -> Vec<CheckedPosition> {
        self.list(path)
            .map(|l| l.borrow().clone())
            .unwrap_or_default()
    }

    /// All tracked paths, sorted for stable output.
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.slots.keys().collect();
        paths.sort();
        paths
    }

    /// Two paths observe the same slot list.
    pub fn shares_slots(&self, a: &Path, b: &Path) -> bool {
        match (self.list(a), self.list(b)) {
            (Some(x), Some(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }

    fn list(&self, path: &Path) -> Option<&SlotList> {
        self.slots.get(path)
    }

    /// Append a slot, creating the entry on first use.
    pub fn seed(&mut self, path: Path, slot: CheckedPosition) {
        tracing::debug!(path = %path, pos = %slot.pos, guarded = slot.guarded, "seed");
        match self.slots.get(&path) {
            Some(list) => list.borrow_mut().push(slot),
            None => {
                self.slots.insert(path, Rc::new(RefCell::new(vec![slot])));
            }
        }
    }

    /// Record `derived := canonical`: both keys now share `derived`'s list.
    pub fn alias(&mut self, derived: Path, canonical: Path) {
        let Some(list) = self.slots.get(&derived).cloned() else {
            return;
        };
        tracing::debug!(derived = %derived, canonical = %canonical, "alias");
        self.slots.insert(canonical.clone(), list);
        self.aliases.insert(derived, canonical);
    }

    /// Index of the slot responsible for position `at`.
    ///
    /// The covering slot is the entry `i` with `L[i] <= at < L[i+1]`; a
    /// single-entry list always covers. This is a purely textual stand-in
    /// for reachability and does not distinguish sibling branches.
    pub fn covering_slot(&self, path: &Path, at: Pos) -> Option<usize> {
        let list = self.list(path)?.borrow();
        covering_index(&list, at)
    }

    /// Nearest slot strictly before `at`.
    pub fn nearest_before(&self, path: &Path, at: Pos) -> Option<CheckedPosition> {
        let list = self.list(path)?.borrow();
        list.iter().rev().find(|slot| slot.pos < at).copied()
    }

    /// Apply an `x == nil` / `x != nil` comparison at `at`.
    ///
    /// Unknown paths are left alone. A name's own list takes the guard; if
    /// the name was assigned from a chain, that chain is re-pointed at the
    /// guarded list.
    pub fn mark_guarded(&mut self, path: &Path, at: Pos) -> GuardOutcome {
        let Some(list) = self.list(path).cloned() else {
            return GuardOutcome::Untracked;
        };
        let outcome = replace_covering(&list, CheckedPosition::guarded(at), at);
        tracing::debug!(path = %path, pos = %at, outcome = ?outcome, "comparison guard");
        if outcome == GuardOutcome::Guarded {
            if let Some(canonical) = self.aliases.get(path) {
                self.slots.insert(canonical.clone(), list);
            }
        }
        outcome
    }

    /// Apply a comparison on a multi-segment chain: like `mark_guarded`, but
    /// a path with no entry yet gets a fresh list holding `slot`.
    pub fn guard_chain(&mut self, path: Path, slot: CheckedPosition, at: Pos) -> GuardOutcome {
        let outcome = match self.list(&path) {
            Some(list) => replace_covering(list, slot, at),
            None => {
                self.slots.insert(path.clone(), Rc::new(RefCell::new(vec![slot])));
                GuardOutcome::Created
            }
        };
        tracing::debug!(path = %path, pos = %at, outcome = ?outcome, "chain guard");
        outcome
    }
}

fn covering_index(list: &[CheckedPosition], at: Pos) -> Option<usize> {
    match list.len() {
        0 => None,
        1 => Some(0),
        n => (0..n).find(|&i| list[i].pos <= at && list.get(i + 1).is_none_or(|next| at < next.pos)),
    }
}

fn replace_covering(list: &SlotList, slot: CheckedPosition, at: Pos) -> GuardOutcome {
    let mut slots = list.borrow_mut();
    match covering_index(&slots, at) {
        Some(i) if slots[i].guarded => GuardOutcome::AlreadyGuarded,
        Some(i) => {
            slots[i] = slot;
            GuardOutcome::Guarded
        }
        None => GuardOutcome::Untracked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(line: u32, column: u32) -> Pos {
        Pos::new(line, column)
    }

    #[test]
    fn test_seed_appends_in_order() {
        let mut reg = CheckRegistry::new();
        let u = Path::root("u");
        reg.seed(u.clone(), CheckedPosition::unguarded(p(3, 9)));
        reg.seed(u.clone(), CheckedPosition::unguarded(p(8, 9)));
        let slots = reg.slots(&u);
        assert_eq!(slots.len(), 2);
        assert!(slots[0].pos < slots[1].pos);
        assert!(reg.is_tracked_root("u"));
        assert!(!reg.is_tracked_root("v"));
    }

    #[test]
    fn test_single_entry_always_covers() {
        let mut reg = CheckRegistry::new();
        let e = Path::root("e");
        reg.seed(e.clone(), CheckedPosition::unguarded(p(10, 30)));
        assert_eq!(reg.covering_slot(&e, p(1, 1)), Some(0));
        assert_eq!(reg.covering_slot(&e, p(99, 1)), Some(0));
    }

    #[test]
    fn test_covering_slot_between_neighbours() {
        let mut reg = CheckRegistry::new();
        let u = Path::root("u");
        for line in [5, 10, 15] {
            reg.seed(u.clone(), CheckedPosition::unguarded(p(line, 2)));
        }
        assert_eq!(reg.covering_slot(&u, p(5, 2)), Some(0));
        assert_eq!(reg.covering_slot(&u, p(7, 1)), Some(0));
        assert_eq!(reg.covering_slot(&u, p(10, 2)), Some(1));
        assert_eq!(reg.covering_slot(&u, p(12, 40)), Some(1));
        assert_eq!(reg.covering_slot(&u, p(40, 1)), Some(2));
        // Before every entry of a multi-entry list: nothing covers.
        assert_eq!(reg.covering_slot(&u, p(1, 1)), None);
    }

    #[test]
    fn test_mark_guarded_moves_slot_to_comparison() {
        let mut reg = CheckRegistry::new();
        let e = Path::root("e");
        reg.seed(e.clone(), CheckedPosition::unguarded(p(1, 20)));
        assert_eq!(reg.mark_guarded(&e, p(2, 5)), GuardOutcome::Guarded);
        assert_eq!(reg.slots(&e), vec![CheckedPosition::guarded(p(2, 5))]);

        // Guarded is terminal: a later comparison does not move it again.
        assert_eq!(reg.mark_guarded(&e, p(9, 5)), GuardOutcome::AlreadyGuarded);
        assert_eq!(reg.slots(&e)[0].pos, p(2, 5));
    }

    #[test]
    fn test_mark_guarded_unknown_path_is_noop() {
        let mut reg = CheckRegistry::new();
        assert_eq!(
            reg.mark_guarded(&Path::root("o"), p(3, 5)),
            GuardOutcome::Untracked
        );
        assert!(reg.is_empty());
    }

    #[test]
    fn test_nearest_before_is_strict() {
        let mut reg = CheckRegistry::new();
        let u = Path::root("u");
        reg.seed(u.clone(), CheckedPosition::unguarded(p(4, 2)));
        reg.seed(u.clone(), CheckedPosition::guarded(p(9, 2)));
        assert_eq!(reg.nearest_before(&u, p(4, 2)), None);
        assert_eq!(reg.nearest_before(&u, p(4, 3)).map(|s| s.guarded), Some(false));
        assert_eq!(reg.nearest_before(&u, p(12, 1)).map(|s| s.guarded), Some(true));
        assert_eq!(reg.nearest_before(&Path::root("x"), p(12, 1)), None);
    }

    #[test]
    fn test_alias_shares_list_both_ways() {
        let mut reg = CheckRegistry::new();
        let user = Path::root("userInfo");
        let field = Path::from_segments(["userInfo", "A"]);
        let temp = Path::root("tempA");
        reg.seed(user, CheckedPosition::unguarded(p(1, 20)));
        reg.seed(temp.clone(), CheckedPosition::unguarded(p(5, 19)));
        reg.alias(temp.clone(), field.clone());

        assert!(reg.shares_slots(&temp, &field));
        assert_eq!(reg.alias_of(&temp), Some(&field));

        reg.mark_guarded(&temp, p(6, 6));
        assert!(reg.slots(&field)[0].guarded);

        // Later slots appended through the derived name are visible too.
        reg.seed(temp.clone(), CheckedPosition::unguarded(p(20, 3)));
        assert_eq!(reg.slots(&field).len(), 2);
    }

    #[test]
    fn test_guard_on_earlier_alias_repoints_chain() {
        // y := x.F; z := x.F; if y != nil
        let mut reg = CheckRegistry::new();
        let field = Path::from_segments(["x", "F"]);
        let y = Path::root("y");
        let z = Path::root("z");
        reg.seed(Path::root("x"), CheckedPosition::unguarded(p(1, 8)));
        reg.seed(y.clone(), CheckedPosition::unguarded(p(2, 9)));
        reg.alias(y.clone(), field.clone());
        reg.seed(z.clone(), CheckedPosition::unguarded(p(3, 9)));
        reg.alias(z.clone(), field.clone());
        assert!(reg.shares_slots(&z, &field));

        assert_eq!(reg.mark_guarded(&y, p(4, 5)), GuardOutcome::Guarded);
        assert_eq!(reg.slots(&y), vec![CheckedPosition::guarded(p(4, 5))]);
        assert!(!reg.slots(&z)[0].guarded);
        assert!(reg.shares_slots(&y, &field));
        assert!(!reg.shares_slots(&z, &field));
    }

    #[test]
    fn test_alias_without_derived_entry_is_noop() {
        let mut reg = CheckRegistry::new();
        reg.alias(Path::root("y"), Path::from_segments(["x", "F"]));
        assert!(reg.is_empty());
        assert!(reg.alias_of(&Path::root("y")).is_none());
    }

    #[test]
    fn test_guard_chain_creates_entry() {
        let mut reg = CheckRegistry::new();
        let path = Path::from_segments(["input", "A"]);
        assert_eq!(
            reg.guard_chain(path.clone(), CheckedPosition::guarded(p(3, 5)), p(3, 5)),
            GuardOutcome::Created
        );
        assert_eq!(
            reg.guard_chain(path.clone(), CheckedPosition::guarded(p(8, 5)), p(8, 5)),
            GuardOutcome::AlreadyGuarded
        );
        assert_eq!(reg.slots(&path), vec![CheckedPosition::guarded(p(3, 5))]);
    }

    #[test]
    fn test_parent_pointer_leaf_precedes_everything() {
        let mut reg = CheckRegistry::new();
        let path = Path::from_segments(["m", "Items"]);
        reg.guard_chain(path.clone(), CheckedPosition::parent_pointer_leaf(), p(4, 5));
        let slot = reg.nearest_before(&path, p(1, 1)).unwrap();
        assert!(slot.guarded);
        assert_eq!(slot.kind, SlotKind::ParentPointerLeafNonPointer);
    }

    #[test]
    fn test_slice_elem_slot_is_guarded() {
        let slot = CheckedPosition::slice_elem(p(2, 2));
        assert!(slot.guarded);
        assert_eq!(slot.kind, SlotKind::SliceElem);
    }
}
