use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound::{self, Excluded, Included, Unbounded};

use aa_index::{ByKey, Comparator, Direction, OrderedMultiIndex};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 400;

// ─── Shape checker ───────────────────────────────────────────────────────────

/// Rebuilds parent links from the in-order node list and checks every AA-tree
/// invariant, collecting all violations before asserting.
///
/// In an in-order listing the parent of a left child is the nearest later node
/// that is shallower, and the parent of a right child the nearest earlier one.
fn assert_aa_shape<T, C: Comparator<T>>(index: &OrderedMultiIndex<T, C>) {
    let nodes = index.nodes();
    let mut errors: Vec<String> = Vec::new();

    let parents: Vec<Option<usize>> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| match node.direction() {
            Direction::Root => None,
            Direction::Left => nodes[i + 1..].iter().position(|n| n.depth() < node.depth()).map(|p| i + 1 + p),
            Direction::Right => nodes[..i].iter().rposition(|n| n.depth() < node.depth()),
        })
        .collect();

    let mut children = vec![0usize; nodes.len()];
    let mut roots = 0;
    for (i, node) in nodes.iter().enumerate() {
        if node.values().is_empty() {
            errors.push(format!("node #{i}: empty bucket"));
        }
        if node.level() == 0 {
            errors.push(format!("node #{i}: level 0"));
        }
        if node.direction() == Direction::Root {
            roots += 1;
            if node.depth() != 0 {
                errors.push(format!("node #{i}: root at depth {}", node.depth()));
            }
            if node.level() != index.root_level() {
                errors.push(format!("node #{i}: root level {} != {}", node.level(), index.root_level()));
            }
            continue;
        }
        let Some(p) = parents[i] else {
            errors.push(format!("node #{i}: no parent found"));
            continue;
        };
        children[p] += 1;
        let parent = &nodes[p];
        if parent.depth() + 1 != node.depth() {
            errors.push(format!("node #{i}: depth {} under parent at depth {}", node.depth(), parent.depth()));
        }
        match node.direction() {
            Direction::Left if node.level() + 1 != parent.level() => {
                errors.push(format!("node #{i}: left child level {} under {}", node.level(), parent.level()));
            }
            Direction::Right if node.level() != parent.level() && node.level() + 1 != parent.level() => {
                errors.push(format!("node #{i}: right child level {} under {}", node.level(), parent.level()));
            }
            _ => {}
        }
        if node.direction() == Direction::Right
            && parent.direction() == Direction::Right
            && let Some(g) = parents[p]
            && node.level() >= nodes[g].level()
        {
            errors.push(format!("node #{i}: right grandchild level {} not below {}", node.level(), nodes[g].level()));
        }
    }
    for (i, node) in nodes.iter().enumerate() {
        if node.level() > 1 && children[i] != 2 {
            errors.push(format!("node #{i}: level {} with {} children", node.level(), children[i]));
        }
    }
    if !nodes.is_empty() && roots != 1 {
        errors.push(format!("{roots} roots"));
    }
    for (i, pair) in nodes.windows(2).enumerate() {
        if index.comparator().compare(pair[0].key(), pair[1].key()) != Ordering::Less {
            errors.push(format!("nodes #{i} and #{} out of order", i + 1));
        }
    }
    let stored: usize = nodes.iter().map(|n| n.values().len()).sum();
    if stored != index.len() {
        errors.push(format!("len {} but {stored} values stored", index.len()));
    }

    assert!(errors.is_empty(), "AA-tree shape violated:\n{}", errors.join("\n"));
}

// ─── Model ───────────────────────────────────────────────────────────────────

type Item = (i32, u8);
type KeyFn = fn(&Item) -> i32;

fn first(item: &Item) -> i32 {
    item.0
}

fn keyed_index() -> OrderedMultiIndex<Item, ByKey<KeyFn>> {
    OrderedMultiIndex::with_comparator(ByKey::new(first as KeyFn))
}

/// A sorted multiset keeping equal keys in insertion order.
#[derive(Default)]
struct Model(Vec<Item>);

impl Model {
    fn insert(&mut self, item: Item) {
        let at = self.0.partition_point(|v| v.0 <= item.0);
        self.0.insert(at, item);
    }

    fn remove(&mut self, item: &Item) -> bool {
        match self.0.iter().position(|v| v == item) {
            Some(at) => {
                self.0.remove(at);
                true
            }
            None => false,
        }
    }

    fn remove_all(&mut self, item: &Item) -> usize {
        let before = self.0.len();
        self.0.retain(|v| v != item);
        before - self.0.len()
    }

    fn min(&self, limit: Bound<&Item>) -> Option<&Item> {
        self.0.iter().find(|v| within_lower(v, limit))
    }

    fn max(&self, limit: Bound<&Item>) -> Option<&Item> {
        let key = self.0.iter().rev().find(|v| within_upper(v, limit))?.0;
        self.0.iter().find(|v| v.0 == key)
    }

    fn forward(&self) -> Vec<Item> {
        self.0.clone()
    }

    fn backward(&self) -> Vec<Item> {
        self.0.chunk_by(|a, b| a.0 == b.0).rev().flatten().copied().collect()
    }
}

fn within_lower(v: &Item, limit: Bound<&Item>) -> bool {
    match limit {
        Unbounded => true,
        Included(x) => v.0 >= x.0,
        Excluded(x) => v.0 > x.0,
    }
}

fn within_upper(v: &Item, limit: Bound<&Item>) -> bool {
    match limit {
        Unbounded => true,
        Included(x) => v.0 <= x.0,
        Excluded(x) => v.0 < x.0,
    }
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Insert(Item),
    Remove(Item),
    RemoveAll(Item),
    Min(Bound<Item>),
    Max(Bound<Item>),
    Count(Item),
}

fn item_strategy() -> impl Strategy<Value = Item> {
    (-40i32..40, 0u8..3)
}

fn bound_strategy() -> impl Strategy<Value = Bound<Item>> {
    prop_oneof![
        1 => Just(Unbounded),
        2 => item_strategy().prop_map(Included),
        2 => item_strategy().prop_map(Excluded),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => item_strategy().prop_map(Op::Insert),
        4 => item_strategy().prop_map(Op::Remove),
        1 => item_strategy().prop_map(Op::RemoveAll),
        2 => bound_strategy().prop_map(Op::Min),
        2 => bound_strategy().prop_map(Op::Max),
        1 => item_strategy().prop_map(Op::Count),
    ]
}

fn collect_forward<T: Clone, C: Comparator<T>>(index: &OrderedMultiIndex<T, C>) -> Vec<T> {
    index.forward_from(Unbounded, Unbounded).attach(index).cloned().collect()
}

fn collect_backward<T: Clone, C: Comparator<T>>(index: &OrderedMultiIndex<T, C>) -> Vec<T> {
    index.backward_from(Unbounded, Unbounded).attach(index).cloned().collect()
}

// ─── Randomized model checks ─────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Replays random operations on the index and on a sorted `Vec` model and
    /// asserts identical results and a valid tree shape at every step.
    #[test]
    fn ops_match_model(ops in proptest::collection::vec(op_strategy(), 1..TEST_SIZE)) {
        let mut index = keyed_index();
        let mut model = Model::default();

        for op in &ops {
            match op {
                Op::Insert(item) => {
                    index.insert(*item);
                    model.insert(*item);
                }
                Op::Remove(item) => {
                    prop_assert_eq!(index.remove(item), model.remove(item), "remove({:?})", item);
                }
                Op::RemoveAll(item) => {
                    prop_assert_eq!(index.remove_all(item), model.remove_all(item), "remove_all({:?})", item);
                }
                Op::Min(limit) => {
                    prop_assert_eq!(index.min(limit.as_ref()), model.min(limit.as_ref()), "min({:?})", limit);
                }
                Op::Max(limit) => {
                    prop_assert_eq!(index.max(limit.as_ref()), model.max(limit.as_ref()), "max({:?})", limit);
                }
                Op::Count(item) => {
                    let expected = model.0.iter().filter(|v| v.0 == item.0).count();
                    prop_assert_eq!(index.count(item), expected, "count({:?})", item);
                    prop_assert_eq!(index.contains(item), model.0.contains(item));
                }
            }
            prop_assert_eq!(index.len(), model.0.len());
            assert_aa_shape(&index);
        }

        prop_assert_eq!(collect_forward(&index), model.forward());
        prop_assert_eq!(collect_backward(&index), model.backward());
        prop_assert_eq!(index.first(), model.0.first());
    }

    /// Every inserted value comes back exactly once, in sorted order, and
    /// walking backward visits the same values in reverse.
    #[test]
    fn walks_preserve_the_multiset(values in proptest::collection::vec(-1_000i32..1_000, 0..500)) {
        let index: OrderedMultiIndex<i32> = values.iter().copied().collect();
        assert_aa_shape(&index);

        let mut sorted = values.clone();
        sorted.sort_unstable();
        let forward = collect_forward(&index);
        prop_assert_eq!(&forward, &sorted);

        let mut backward = collect_backward(&index);
        backward.reverse();
        prop_assert_eq!(backward, forward);
    }

    /// Inserting then removing every value leaves an empty index.
    #[test]
    fn insert_then_remove_everything(values in proptest::collection::vec(-200i32..200, 0..300)) {
        let mut index: OrderedMultiIndex<i32> = values.iter().copied().collect();
        prop_assert_eq!(index.len(), values.len());
        for v in values.iter().rev() {
            prop_assert!(index.remove(v));
            assert_aa_shape(&index);
        }
        prop_assert!(index.is_empty());
        prop_assert_eq!(index.root_level(), 0);
        prop_assert_eq!(index.first(), None);
    }

    /// `min`/`max` obey their boundary laws for every bound kind.
    #[test]
    fn min_max_boundary_laws(values in proptest::collection::btree_set(-100i32..100, 0..60), x in -110i32..110) {
        let index: OrderedMultiIndex<i32> = values.iter().copied().collect();

        prop_assert_eq!(index.min(Included(&x)), values.range(x..).next());
        prop_assert_eq!(index.min(Excluded(&x)), values.range((Excluded(x), Unbounded)).next());
        prop_assert_eq!(index.max(Included(&x)), values.range(..=x).next_back());
        prop_assert_eq!(index.max(Excluded(&x)), values.range(..x).next_back());
        prop_assert_eq!(index.min(Unbounded), values.first());
        prop_assert_eq!(index.max(Unbounded), values.last());
    }
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn sequential_stress() {
    let mut index: OrderedMultiIndex<u64> = (0..100_000).collect();
    assert_eq!(index.len(), 100_000);
    assert_eq!(index.iter().sum::<u64>(), 4_999_950_000);
    assert_eq!(index.backward_from(Unbounded, Unbounded).attach(&index).sum::<u64>(), 4_999_950_000);
    assert!(index.root_level() <= 17, "root level {}", index.root_level());
    assert_aa_shape(&index);

    for v in (0..100_000).step_by(2) {
        assert!(index.remove(&v));
    }
    assert_eq!(index.len(), 50_000);
    assert_eq!(index.first(), Some(&1));
    assert_eq!(index.last(), Some(&99_999));
    assert_aa_shape(&index);
}

#[test]
fn remove_stress_matches_counter() {
    // Deterministic LCG so failures reproduce.
    let mut x: u64 = 12345;
    let mut next = move || {
        x = x.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        i32::try_from((x >> 33) % 10_001).unwrap() - 5_000
    };

    let mut counter: BTreeMap<i32, usize> = BTreeMap::new();
    let mut index = OrderedMultiIndex::new();
    for _ in 0..10_000 {
        let v = next();
        *counter.entry(v).or_default() += 1;
        index.insert(v);
    }
    for _ in 0..30_000 {
        let v = next();
        if let Some(n) = counter.get_mut(&v).filter(|n| **n > 0) {
            *n -= 1;
            assert!(index.remove(&v));
        } else {
            assert!(!index.remove(&v));
        }
    }

    let expected: Vec<i32> = counter.range(0..).flat_map(|(&v, &n)| std::iter::repeat_n(v, n)).collect();
    let actual: Vec<i32> = index.forward_from(Included(&0), Unbounded).attach(&index).copied().collect();
    assert_eq!(actual, expected);
    assert_aa_shape(&index);
}

type Row = (i32, char, &'static str);

fn first_asc_second_desc(a: &Row, b: &Row) -> Ordering {
    a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1))
}

#[test]
fn tuple_comparator_scenario() {
    let mut index = OrderedMultiIndex::with_comparator(first_asc_second_desc as fn(&Row, &Row) -> Ordering);
    index.extend([
        (1, 'a', "1-st"),
        (10, 'p', "2-nd"),
        (5, 'c', "3-rd"),
        (5, 'd', "4-th"),
        (5, 'q', "5-th"),
        (5, 'd', "6-th"),
    ]);
    let start: Row = (5, 'd', "");

    let forward: Vec<Row> = index.forward_from(Included(&start), Unbounded).attach(&index).copied().collect();
    assert_eq!(forward, [(5, 'd', "4-th"), (5, 'd', "6-th"), (5, 'c', "3-rd"), (10, 'p', "2-nd")]);

    let backward: Vec<Row> = index.backward_from(Included(&start), Unbounded).attach(&index).copied().collect();
    assert_eq!(backward, [(5, 'd', "4-th"), (5, 'd', "6-th"), (5, 'q', "5-th"), (1, 'a', "1-st")]);
    assert_eq!(index.len(), 6);

    assert!(index.remove(&(10, 'p', "2-nd")));
    assert!(index.remove(&(1, 'a', "1-st")));
    let expected = [(5, 'q', "5-th"), (5, 'd', "4-th"), (5, 'd', "6-th"), (5, 'c', "3-rd")];
    assert_eq!(collect_forward(&index), expected);

    // Found by key, but not the same value: nothing is removed.
    assert!(!index.remove(&(5, 'q', "never been inserted")));
    assert_eq!(collect_forward(&index), expected);
    assert_aa_shape(&index);
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Employee {
    id: u32,
    name: &'static str,
    salary: u32,
}

#[test]
fn by_key_orders_by_salary_then_name() {
    let staff = OrderedMultiIndex::from_values_with(
        ByKey::new(|e: &Employee| (e.salary, e.name)),
        [
            Employee { id: 1, name: "John", salary: 1000 },
            Employee { id: 2, name: "Alice", salary: 1000 },
            Employee { id: 3, name: "Paul", salary: 900 },
            Employee { id: 4, name: "Bob", salary: 1100 },
            Employee { id: 5, name: "Celine", salary: 1050 },
        ],
    );
    let ids: Vec<u32> = staff.iter().map(|e| e.id).collect();
    assert_eq!(ids, [3, 2, 1, 5, 4]);

    let low = Employee { id: 0, name: "-", salary: 1000 };
    let ids: Vec<u32> = staff.backward_from(Included(&low), Unbounded).attach(&staff).map(|e| e.id).collect();
    assert_eq!(ids, [3]);

    let high = Employee { id: 0, name: "ZZZ", salary: 1000 };
    let ids: Vec<u32> = staff.backward_from(Included(&high), Unbounded).attach(&staff).map(|e| e.id).collect();
    assert_eq!(ids, [1, 2, 3]);
}

#[test]
fn duplicates_share_a_node_in_insertion_order() {
    let mut index = keyed_index();
    index.extend([(1, 0), (1, 1), (0, 0), (1, 2)]);
    let nodes = index.nodes();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].values(), &[(1, 0), (1, 1), (1, 2)]);
    assert_eq!(index.count(&(1, 9)), 3);
    assert!(!index.contains(&(1, 9)));

    // Removing the head of a bucket promotes the next value to key.
    assert!(index.remove(&(1, 0)));
    assert_eq!(index.nodes()[1].key(), &(1, 1));
    assert_eq!(index.max(Unbounded), Some(&(1, 1)));
}

#[test]
fn empty_index_queries() {
    let index: OrderedMultiIndex<i32> = OrderedMultiIndex::default();
    assert!(index.is_empty());
    assert_eq!(index.len(), 0);
    assert_eq!(index.root_level(), 0);
    assert_eq!(index.min(Unbounded), None);
    assert_eq!(index.max(Included(&3)), None);
    assert!(index.nodes().is_empty());
    assert_eq!(collect_forward(&index), Vec::<i32>::new());
}

#[test]
fn trait_surface() {
    let a = OrderedMultiIndex::from([3, 1, 2, 1]);
    let b: OrderedMultiIndex<i32> = [1, 1, 2, 3].into_iter().collect();
    assert_eq!(a, b);
    assert_eq!(format!("{a:?}"), "[1, 1, 2, 3]");

    let mut c = a.clone();
    c.extend(&[4]);
    assert_ne!(a, c);
    assert_eq!((&c).into_iter().copied().collect::<Vec<_>>(), [1, 1, 2, 3, 4]);

    let mut sized: OrderedMultiIndex<i32> = OrderedMultiIndex::with_capacity(8);
    assert!(sized.capacity() >= 8);
    sized.extend(0..4);
    sized.reserve(100);
    assert!(sized.capacity() >= 104);
    sized.clear();
    sized.shrink_to_fit();
    assert!(sized.is_empty());
}
