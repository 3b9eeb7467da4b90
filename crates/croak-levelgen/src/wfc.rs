//! Wave Function Collapse over a sparse grid.
//!
//! Each cell holds an ordered list of candidate options. Every option carries
//! the rule predicates it must satisfy; a rule sees the option's value, its
//! coordinate and the grid of decisions made so far.
//!
//! Generation runs in passes. One pass:
//!
//! 1. snapshots the uncollapsed cells and sorts them by surviving option
//!    count, fewest first (stable, so ties keep grid order);
//! 2. narrows every snapshotted cell by re-evaluating its options' rules;
//! 3. collapses any cell left with at most one option, zero options giving
//!    an undecided cell;
//! 4. force-collapses the first cell of the sorted snapshot, which
//!    guarantees progress.
//!
//! [`collapse_step`](WaveFunctionCollapser::collapse_step) runs one pass and
//! returns, so a host loop can spread generation over several ticks.
//! [`collapse`](WaveFunctionCollapser::collapse) runs passes to completion;
//! the pass count is bounded by the number of cells.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use croak_core::{Coord, EventBus, NamedEvent, SparseGrid};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

/// Event name under which collapses are published.
pub const CELL_COLLAPSE: &str = "cellcollapse";

// ---------------------------------------------------------------------------
// Rules and options
// ---------------------------------------------------------------------------

/// A rule predicate: `rule(value, x, y, decisions)`.
pub type Rule<V> = Rc<dyn Fn(&V, i32, i32, &SparseGrid<V>) -> bool>;

/// A reference to a rule when adding an option: by registered name or inline.
pub enum RuleRef<V> {
    Named(String),
    Inline(Rule<V>),
}

impl<V> RuleRef<V> {
    /// Wrap a closure as an inline rule.
    pub fn inline<F>(rule: F) -> Self
    where
        F: Fn(&V, i32, i32, &SparseGrid<V>) -> bool + 'static,
    {
        RuleRef::Inline(Rc::new(rule))
    }
}

impl<V> From<&str> for RuleRef<V> {
    fn from(name: &str) -> Self {
        RuleRef::Named(name.to_owned())
    }
}

impl<V> From<String> for RuleRef<V> {
    fn from(name: String) -> Self {
        RuleRef::Named(name)
    }
}

/// One candidate value for a cell.
pub struct CellOption<V> {
    pub x: i32,
    pub y: i32,
    pub value: V,
    rules: Vec<Rule<V>>,
}

impl<V> CellOption<V> {
    /// Whether every attached rule accepts this option against `decisions`.
    pub fn permits(&self, decisions: &SparseGrid<V>) -> bool {
        self.rules
            .iter()
            .all(|rule| rule(&self.value, self.x, self.y, decisions))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl<V: Clone> Clone for CellOption<V> {
    fn clone(&self) -> Self {
        Self {
            x: self.x,
            y: self.y,
            value: self.value.clone(),
            rules: self.rules.clone(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for CellOption<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellOption")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("value", &self.value)
            .field("rules", &self.rules.len())
            .finish()
    }
}

/// Generation state of one grid cell.
///
/// Once collapsed, the decision is fixed and the options are no longer
/// consulted. A collapsed cell with no decision is a legal outcome.
pub struct Cell<V> {
    options: Vec<CellOption<V>>,
    collapsed: bool,
    decision: Option<CellOption<V>>,
}

impl<V> Cell<V> {
    fn new() -> Self {
        Self {
            options: Vec::new(),
            collapsed: false,
            decision: None,
        }
    }

    pub fn options(&self) -> &[CellOption<V>] {
        &self.options
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// The chosen option, if the cell collapsed with one.
    pub fn decision(&self) -> Option<&CellOption<V>> {
        self.decision.as_ref()
    }
}

impl<V: fmt::Debug> fmt::Debug for Cell<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("options", &self.options.len())
            .field("collapsed", &self.collapsed)
            .field("decision", &self.decision.as_ref().map(|d| &d.value))
            .finish()
    }
}

/// Payload of a `cellcollapse` notification.
#[derive(Debug, Clone, PartialEq)]
pub struct CellCollapse<V> {
    pub x: i32,
    pub y: i32,
    /// `None` when the cell ran out of options.
    pub decision: Option<V>,
}

impl<V> NamedEvent for CellCollapse<V> {
    fn event_name(&self) -> &str {
        CELL_COLLAPSE
    }
}

// ---------------------------------------------------------------------------
// Policy and progress
// ---------------------------------------------------------------------------

/// Which decisions rules see while a pass narrows cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    /// Decisions made earlier in the same pass, in sorted order, are visible
    /// to the cells narrowed after them.
    #[default]
    Live,
    /// Every cell in a pass is narrowed against the decisions as they stood
    /// when the pass began.
    PassStart,
}

/// Outcome of one [`collapse_step`](WaveFunctionCollapser::collapse_step).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapseStep {
    Progress { remaining: usize },
    Complete,
}

// ---------------------------------------------------------------------------
// WaveFunctionCollapser
// ---------------------------------------------------------------------------

/// Grid-based constrained random generator.
pub struct WaveFunctionCollapser<V> {
    cells: SparseGrid<Cell<V>>,
    /// Values of decided cells, the view rules read.
    decisions: SparseGrid<V>,
    rules: HashMap<String, Rule<V>>,
    events: EventBus<CellCollapse<V>>,
    rng: Pcg64,
    propagation: Propagation,
    passes: usize,
}

impl<V: Clone + 'static> WaveFunctionCollapser<V> {
    /// A collapser seeded from system entropy.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// A collapser whose choices are reproducible for `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            cells: SparseGrid::new(),
            decisions: SparseGrid::new(),
            rules: HashMap::new(),
            events: EventBus::new(),
            rng: Pcg64::seed_from_u64(seed),
            propagation: Propagation::default(),
            passes: 0,
        }
    }

    pub fn with_propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    pub fn propagation(&self) -> Propagation {
        self.propagation
    }

    // -- setup --------------------------------------------------------------

    /// Register (or replace) the rule `name`.
    pub fn create_rule<F>(&mut self, name: &str, rule: F) -> &mut Self
    where
        F: Fn(&V, i32, i32, &SparseGrid<V>) -> bool + 'static,
    {
        self.rules.insert(name.to_owned(), Rc::new(rule));
        self
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Reset `(x, y)` to an empty, uncollapsed cell.
    pub fn set_cell(&mut self, x: i32, y: i32) -> &mut Self {
        self.cells.set(x, y, Cell::new());
        self.decisions.remove(x, y);
        self
    }

    /// Append a candidate `value` to the cell at `(x, y)`.
    ///
    /// Named rules that are not registered are dropped. Returns `false`, and
    /// does nothing, when there is no cell at `(x, y)`.
    pub fn add_option_to_cell<I>(&mut self, x: i32, y: i32, value: V, rules: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<RuleRef<V>>,
    {
        let Some(cell) = self.cells.get_mut(x, y) else {
            return false;
        };
        let mut resolved = Vec::new();
        for rule in rules {
            match rule.into() {
                RuleRef::Inline(rule) => resolved.push(rule),
                RuleRef::Named(name) => match self.rules.get(&name) {
                    Some(rule) => resolved.push(Rc::clone(rule)),
                    None => tracing::trace!(rule = %name, x, y, "dropping unknown rule"),
                },
            }
        }
        cell.options.push(CellOption {
            x,
            y,
            value,
            rules: resolved,
        });
        true
    }

    /// Subscribe to collapse notifications.
    pub fn on_cell_collapse<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&CellCollapse<V>) + 'static,
    {
        self.events.on(CELL_COLLAPSE, callback);
        self
    }

    pub fn events(&self) -> &EventBus<CellCollapse<V>> {
        &self.events
    }

    // -- generation ---------------------------------------------------------

    /// Run one pass.
    pub fn collapse_step(&mut self) -> CollapseStep {
        let mut order: Vec<(usize, Coord)> = self
            .cells
            .iter()
            .filter(|(_, cell)| !cell.collapsed)
            .map(|(coord, cell)| (cell.options.len(), coord))
            .collect();
        if order.is_empty() {
            return CollapseStep::Complete;
        }
        order.sort_by_key(|&(count, _)| count);
        self.passes += 1;

        let pass_start = match self.propagation {
            Propagation::PassStart => Some(self.decisions.clone()),
            Propagation::Live => None,
        };

        for &(_, coord) in &order {
            let view = pass_start.as_ref().unwrap_or(&self.decisions);
            let Some(cell) = self.cells.get_mut(coord.x, coord.y) else {
                continue;
            };
            if cell.collapsed {
                continue;
            }
            cell.options.retain(|option| option.permits(view));
            if cell.options.len() <= 1 {
                self.collapse_cell(coord.x, coord.y);
            }
        }

        let (_, first) = order[0];
        self.collapse_cell(first.x, first.y);

        let remaining = self.uncollapsed_count();
        tracing::trace!(pass = self.passes, remaining, "collapse pass");
        if remaining == 0 {
            CollapseStep::Complete
        } else {
            CollapseStep::Progress { remaining }
        }
    }

    /// Run passes until every cell is collapsed. Returns the number of
    /// passes this call ran.
    pub fn collapse(&mut self) -> usize {
        let start = self.passes;
        while let CollapseStep::Progress { .. } = self.collapse_step() {}
        let passes = self.passes - start;
        tracing::debug!(passes, cells = self.cells.len(), "collapse finished");
        passes
    }

    /// Decide the cell at `(x, y)` by a uniform choice among its surviving
    /// options and publish the result.
    ///
    /// Returns `None` without publishing if there is no such cell or it is
    /// already collapsed.
    pub fn collapse_cell(&mut self, x: i32, y: i32) -> Option<CellCollapse<V>> {
        let cell = self.cells.get_mut(x, y)?;
        if cell.collapsed {
            return None;
        }
        if !cell.options.is_empty() {
            let pick = self.rng.gen_range(0..cell.options.len());
            cell.decision = Some(cell.options[pick].clone());
        }
        cell.collapsed = true;

        let decision = cell.decision.as_ref().map(|option| option.value.clone());
        if let Some(value) = &decision {
            self.decisions.set(x, y, value.clone());
        }
        let event = CellCollapse { x, y, decision };
        self.events.trigger(CELL_COLLAPSE, &event);
        Some(event)
    }

    // -- queries ------------------------------------------------------------

    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell<V>> {
        self.cells.get(x, y)
    }

    pub fn cells(&self) -> &SparseGrid<Cell<V>> {
        &self.cells
    }

    /// The decided value at `(x, y)`.
    pub fn decision(&self, x: i32, y: i32) -> Option<&V> {
        self.decisions.get(x, y)
    }

    pub fn decisions(&self) -> &SparseGrid<V> {
        &self.decisions
    }

    pub fn uncollapsed_count(&self) -> usize {
        self.cells.values().filter(|cell| !cell.collapsed).count()
    }

    pub fn is_complete(&self) -> bool {
        self.uncollapsed_count() == 0
    }

    /// Passes run so far.
    pub fn passes(&self) -> usize {
        self.passes
    }
}

impl<V: Clone + 'static> Default for WaveFunctionCollapser<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for WaveFunctionCollapser<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveFunctionCollapser")
            .field("cells", &self.cells.len())
            .field("decided", &self.decisions.len())
            .field("rules", &self.rules.len())
            .field("propagation", &self.propagation)
            .field("passes", &self.passes)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn no_neighbor_equal(value: &char, x: i32, y: i32, decisions: &SparseGrid<char>) -> bool {
        Coord::new(x, y)
            .neighbors8()
            .all(|n| decisions.get_at(n) != Some(value))
    }

    fn square(wfc: &mut WaveFunctionCollapser<char>, radius: i32, values: &[char]) {
        for x in -radius..=radius {
            for y in -radius..=radius {
                wfc.set_cell(x, y);
                for &v in values {
                    wfc.add_option_to_cell(x, y, v, ["no-neighbor-equal"]);
                }
            }
        }
    }

    #[test]
    fn single_option_cells_decide_to_that_option() {
        for seed in 0..8 {
            let mut wfc = WaveFunctionCollapser::with_seed(seed);
            for x in 0..4 {
                for y in 0..4 {
                    wfc.set_cell(x, y);
                    wfc.add_option_to_cell(x, y, x * 10 + y, Vec::<RuleRef<i32>>::new());
                }
            }
            wfc.collapse();
            for x in 0..4 {
                for y in 0..4 {
                    assert_eq!(wfc.decision(x, y), Some(&(x * 10 + y)));
                }
            }
        }
    }

    #[test]
    fn collapse_terminates_with_every_cell_collapsed() {
        for propagation in [Propagation::Live, Propagation::PassStart] {
            let mut wfc = WaveFunctionCollapser::with_seed(7).with_propagation(propagation);
            wfc.create_rule("no-neighbor-equal", no_neighbor_equal);
            square(&mut wfc, 3, &['a', 'b', 'c']);
            let passes = wfc.collapse();
            assert!(passes <= 49);
            assert!(wfc.is_complete());
            assert!(wfc.cells().values().all(Cell::is_collapsed));
        }
    }

    #[test]
    fn exhausted_cell_collapses_undecided() {
        let mut wfc: WaveFunctionCollapser<u8> = WaveFunctionCollapser::with_seed(1);
        wfc.set_cell(0, 0);
        wfc.add_option_to_cell(0, 0, 1, [RuleRef::<u8>::inline(|_, _, _, _| false)]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        wfc.on_cell_collapse(move |event| sink.borrow_mut().push(event.clone()));

        assert_eq!(wfc.collapse_step(), CollapseStep::Complete);
        let cell = wfc.cell(0, 0).unwrap();
        assert!(cell.is_collapsed());
        assert!(cell.decision().is_none());
        assert_eq!(
            *seen.borrow(),
            vec![CellCollapse {
                x: 0,
                y: 0,
                decision: None
            }]
        );
    }

    #[test]
    fn collapse_cell_is_idempotent() {
        let mut wfc = WaveFunctionCollapser::with_seed(5);
        wfc.set_cell(2, 2);
        wfc.add_option_to_cell(2, 2, 'x', Vec::<RuleRef<char>>::new());
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        wfc.on_cell_collapse(move |_| *c.borrow_mut() += 1);

        assert_eq!(wfc.collapse_cell(2, 2).unwrap().decision, Some('x'));
        assert!(wfc.collapse_cell(2, 2).is_none());
        assert!(wfc.collapse_cell(9, 9).is_none());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn unknown_rule_names_are_dropped() {
        let mut wfc = WaveFunctionCollapser::with_seed(0);
        wfc.set_cell(0, 0);
        assert!(wfc.add_option_to_cell(0, 0, 'a', ["does-not-exist"]));
        assert_eq!(wfc.cell(0, 0).unwrap().options()[0].rule_count(), 0);
        assert!(!wfc.add_option_to_cell(1, 1, 'a', ["does-not-exist"]));
    }

    #[test]
    fn same_seed_same_outcome() {
        let run = |seed| {
            let mut wfc = WaveFunctionCollapser::with_seed(seed);
            wfc.create_rule("no-neighbor-equal", no_neighbor_equal);
            square(&mut wfc, 3, &['a', 'b', 'c']);
            wfc.collapse();
            wfc.decisions().iter().map(|(c, v)| (c, *v)).collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn step_reports_progress() {
        let mut wfc = WaveFunctionCollapser::with_seed(9);
        wfc.create_rule("no-neighbor-equal", no_neighbor_equal);
        square(&mut wfc, 2, &['a', 'b', 'c']);
        let mut steps = 0;
        loop {
            steps += 1;
            match wfc.collapse_step() {
                CollapseStep::Progress { remaining } => assert!(remaining > 0),
                CollapseStep::Complete => break,
            }
        }
        assert_eq!(steps, wfc.passes());
        assert_eq!(wfc.collapse_step(), CollapseStep::Complete);
    }
}
