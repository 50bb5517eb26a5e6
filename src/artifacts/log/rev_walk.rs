//! Revision walker
//!
//! Walks the commit graph from one or more start points, emitting every
//! reachable commit exactly once.
//!
//! ## States
//!
//! `Idle` (no start points) → `Seeded` → `Walking` → `Exhausted`.
//! Start points can only be added before the walk begins; `reset` returns to
//! `Idle` from anywhere. Pushing onto an exhausted walk resets it first, so a
//! finished walker can be reused directly.
//!
//! ## Ordering
//!
//! - no flags: breadth-first discovery order (start points in push order,
//!   parents in recorded order)
//! - `TIME`: newest committer time first, ties in discovery order
//! - `TOPOLOGICAL`: every commit after all of its children that are part of the
//!   walk; ready commits in discovery order, or newest first with `TIME`
//! - `REVERSE`: the final order reversed, before the count limit is applied
//!
//! Unsorted and time-sorted walks are incremental. Topological and reversed
//! walks need the whole reachable graph up front.

use crate::areas::database::Database;
use crate::artifacts::core::error::{Error, Result};
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

bitflags! {
    /// Emission order of a walk; flags combine
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SortMode: u32 {
        const TOPOLOGICAL = 1;
        const TIME = 2;
        const REVERSE = 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkState {
    Idle,
    Seeded,
    Walking,
    Exhausted,
}

/// One emitted commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub oid: ObjectId,
    pub commit: Commit,
}

/// Commit waiting in the frontier
///
/// Ordered so that a max-heap pops the highest time first and, among equal
/// times, the earliest discovered.
#[derive(Debug)]
struct Pending {
    time: i64,
    sequence: u64,
    entry: WalkEntry,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.sequence == other.sequence
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Priority frontier shared by every ordering
#[derive(Debug, Default)]
struct Frontier {
    by_time: bool,
    heap: BinaryHeap<Pending>,
    sequence: u64,
}

impl Frontier {
    fn new(by_time: bool) -> Self {
        Frontier {
            by_time,
            ..Default::default()
        }
    }

    fn push(&mut self, entry: WalkEntry) {
        let time = if self.by_time { entry.commit.time() } else { 0 };
        self.heap.push(Pending {
            time,
            sequence: self.sequence,
            entry,
        });
        self.sequence += 1;
    }

    fn pop(&mut self) -> Option<WalkEntry> {
        self.heap.pop().map(|pending| pending.entry)
    }
}

/// How the remaining commits are produced
#[derive(Debug)]
enum Source {
    /// Discover parents as commits are emitted
    Incremental(Frontier),
    /// Order computed up front
    Prepared(VecDeque<WalkEntry>),
}

pub struct RevWalk<'d> {
    database: &'d Database,
    state: WalkState,
    sorting: SortMode,
    max_count: Option<usize>,
    emitted: usize,
    seeds: Vec<WalkEntry>,
    seen: HashSet<ObjectId>,
    source: Option<Source>,
}

impl<'d> RevWalk<'d> {
    pub fn new(database: &'d Database) -> Self {
        RevWalk {
            database,
            state: WalkState::Idle,
            sorting: SortMode::empty(),
            max_count: None,
            emitted: 0,
            seeds: Vec::new(),
            seen: HashSet::new(),
            source: None,
        }
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn sorting(&self) -> SortMode {
        self.sorting
    }

    /// Add a start point
    ///
    /// An exhausted walk is reset first. Fails with `InvalidArgument` while a
    /// walk is in progress or when `oid` is not a commit, and with `NotFound`
    /// when it is missing.
    pub fn push(&mut self, oid: ObjectId) -> Result<()> {
        if self.state == WalkState::Exhausted {
            self.reset();
        }
        if self.state == WalkState::Walking {
            return Err(Error::invalid_argument(
                "revwalk_push",
                oid,
                "cannot add start points after the walk has started; reset first",
            ));
        }

        let commit = self.database.read_commit(&oid)?;
        if !self.seeds.iter().any(|seed| seed.oid == oid) {
            self.seeds.push(WalkEntry { oid, commit });
        }
        self.state = WalkState::Seeded;

        Ok(())
    }

    /// Add the commit HEAD resolves to; an unborn HEAD adds nothing
    pub fn push_head(&mut self, refs: &crate::areas::refs::Refs) -> Result<()> {
        match refs.read_head()? {
            Some(oid) => self.push(oid),
            None => Ok(()),
        }
    }

    pub fn set_sorting(&mut self, sorting: SortMode) -> Result<()> {
        if self.state == WalkState::Walking {
            return Err(Error::invalid_argument(
                "revwalk_sorting",
                format!("{sorting:?}"),
                "cannot change sorting during a walk; reset first",
            ));
        }

        self.sorting = sorting;
        Ok(())
    }

    /// Limit the number of emitted commits; negative means unlimited
    ///
    /// Raising the limit after it was hit resumes the walk.
    pub fn set_max_count(&mut self, max_count: i64) {
        self.max_count = usize::try_from(max_count).ok();
    }

    /// Drop start points and walk progress, keeping sorting and limit
    pub fn reset(&mut self) {
        self.state = WalkState::Idle;
        self.emitted = 0;
        self.seeds.clear();
        self.seen.clear();
        self.source = None;
    }

    fn start(&mut self) -> Result<Source> {
        tracing::debug!(seeds = self.seeds.len(), sorting = ?self.sorting, "starting revision walk");

        let seeds = std::mem::take(&mut self.seeds);
        if self.sorting.intersects(SortMode::TOPOLOGICAL | SortMode::REVERSE) {
            let mut order = if self.sorting.contains(SortMode::TOPOLOGICAL) {
                self.topological_order(seeds)?
            } else {
                self.drain(seeds)?
            };
            if self.sorting.contains(SortMode::REVERSE) {
                order.make_contiguous().reverse();
            }

            Ok(Source::Prepared(order))
        } else {
            let mut frontier = Frontier::new(self.sorting.contains(SortMode::TIME));
            for seed in seeds {
                if self.seen.insert(seed.oid) {
                    frontier.push(seed);
                }
            }

            Ok(Source::Incremental(frontier))
        }
    }

    /// Emit the next commit of an incremental walk, queueing its unseen parents
    fn step(&mut self, frontier: &mut Frontier) -> Result<Option<WalkEntry>> {
        let Some(entry) = frontier.pop() else {
            return Ok(None);
        };

        for parent in entry.commit.parents() {
            if self.seen.insert(*parent) {
                let commit = self.database.read_commit(parent)?;
                frontier.push(WalkEntry {
                    oid: *parent,
                    commit,
                });
            }
        }
        tracing::trace!(oid = %entry.oid, "walk step");

        Ok(Some(entry))
    }

    /// Run an incremental walk to completion
    fn drain(&mut self, seeds: Vec<WalkEntry>) -> Result<VecDeque<WalkEntry>> {
        let mut frontier = Frontier::new(self.sorting.contains(SortMode::TIME));
        for seed in seeds {
            if self.seen.insert(seed.oid) {
                frontier.push(seed);
            }
        }

        let mut order = VecDeque::new();
        while let Some(entry) = self.step(&mut frontier)? {
            order.push_back(entry);
        }

        Ok(order)
    }

    /// Kahn's algorithm over the reachable subgraph
    fn topological_order(&mut self, seeds: Vec<WalkEntry>) -> Result<VecDeque<WalkEntry>> {
        // discovery pass: collect reachable commits and count children per commit
        let mut discovered = Vec::new();
        let mut position = HashMap::new();
        let mut in_degree = Vec::new();
        let mut queue = VecDeque::new();

        for seed in seeds {
            if self.seen.insert(seed.oid) {
                queue.push_back(seed);
            }
        }
        while let Some(entry) = queue.pop_front() {
            for parent in entry.commit.parents() {
                if self.seen.insert(*parent) {
                    let commit = self.database.read_commit(parent)?;
                    queue.push_back(WalkEntry {
                        oid: *parent,
                        commit,
                    });
                }
            }
            position.insert(entry.oid, discovered.len());
            discovered.push(Some(entry));
            in_degree.push(0usize);
        }
        for entry in discovered.iter().flatten() {
            for parent in entry.commit.parents() {
                if let Some(&index) = position.get(parent) {
                    in_degree[index] += 1;
                }
            }
        }

        // ready set in discovery order (or by time), so ties stay deterministic
        let mut ready = Frontier::new(self.sorting.contains(SortMode::TIME));
        for (index, degree) in in_degree.iter().enumerate() {
            if *degree == 0
                && let Some(entry) = discovered[index].take()
            {
                ready.push(entry);
            }
        }

        let mut order = VecDeque::with_capacity(discovered.len());
        while let Some(entry) = ready.pop() {
            for parent in entry.commit.parents() {
                let Some(&index) = position.get(parent) else {
                    continue;
                };
                in_degree[index] -= 1;
                if in_degree[index] == 0
                    && let Some(parent_entry) = discovered[index].take()
                {
                    ready.push(parent_entry);
                }
            }
            order.push_back(entry);
        }

        Ok(order)
    }

    fn advance(&mut self) -> Result<Option<WalkEntry>> {
        match self.state {
            WalkState::Idle | WalkState::Exhausted => {
                self.state = WalkState::Exhausted;
                return Ok(None);
            }
            WalkState::Seeded => {
                let source = self.start()?;
                self.source = Some(source);
                self.state = WalkState::Walking;
            }
            WalkState::Walking => {}
        }

        if self.max_count.is_some_and(|max| self.emitted >= max) {
            return Ok(None);
        }

        let next = match self.source.take() {
            Some(Source::Incremental(mut frontier)) => {
                let next = self.step(&mut frontier);
                self.source = Some(Source::Incremental(frontier));
                next?
            }
            Some(Source::Prepared(mut order)) => {
                let next = order.pop_front();
                self.source = Some(Source::Prepared(order));
                next
            }
            None => None,
        };

        match next {
            Some(entry) => {
                self.emitted += 1;
                Ok(Some(entry))
            }
            None => {
                self.state = WalkState::Exhausted;
                Ok(None)
            }
        }
    }
}

impl Iterator for RevWalk<'_> {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(entry) => entry.map(Ok),
            Err(error) => {
                self.state = WalkState::Exhausted;
                self.source = None;
                Some(Err(error))
            }
        }
    }
}
