//! Drag-and-drop reordering of manually ordered lists.
//!
//! A move from index `from` to index `to` of a visible list only renumbers
//! the entities between the two positions, shifting their order values by
//! one slot. Entities outside the visible list are never touched, so order
//! values may coincide with hidden entities; ties are resolved by graph
//! order.
//!
//! # Example
//!
//! ```
//! use gtd_core::tasks::reorder::renumber;
//!
//! // A=1 B=2 C=3 D=4, drag A onto index 2.
//! let changes = renumber(&[1, 2, 3, 4], 0, 2);
//! assert_eq!(changes, vec![(1, 1), (2, 2), (0, 3)]);
//! ```

use crate::error::Result;
use crate::tasks::filter::{LogicalList, ViewFilter, ViewMode};
use crate::tasks::models::{ListKind, Ordered, Task};
use crate::traits::Store;
use chrono::NaiveDateTime;

/// Convert a drop offset into the final index of the moved element.
///
/// List widgets commonly report where the element is inserted in the list
/// as it was *before* removal; moving down by such an offset lands one
/// slot earlier.
#[must_use]
pub const fn drop_target(source: usize, offset: usize) -> usize {
    if offset > source {
        offset - 1
    } else {
        offset
    }
}

/// Compute the order values after moving `orders[from]` to index `to`.
///
/// `orders` are the order values of the visible list, ascending. Returns
/// `(index, new_order)` pairs for every entity whose order is assigned,
/// the moved entity last. Empty when `from == to`.
///
/// # Panics
///
/// Panics if `from` or `to` is out of range; callers only pass indices of
/// the list they display.
#[must_use]
pub fn renumber(orders: &[i64], from: usize, to: usize) -> Vec<(usize, i64)> {
    assert!(from < orders.len() && to < orders.len(), "move {from} -> {to} outside list");

    let mut changes = Vec::with_capacity(from.abs_diff(to) + 1);
    if from < to {
        let mut running = orders[from];
        for k in from + 1..=to {
            changes.push((k, running));
            running += 1;
        }
        changes.push((from, running));
    } else if from > to {
        let new_order = orders[to];
        let mut running = orders[to] + 1;
        for k in to..from {
            changes.push((k, running));
            running += 1;
        }
        changes.push((from, new_order));
    }
    changes
}

/// Plan a move in a project view, which is made of one section per list.
///
/// Orders only ascend inside a section, so the move is renumbered inside
/// the section the task lands in. Dropping the task next to tasks of
/// another list moves it into that list. Returns the destination list and
/// the `(task id, order)` assignments.
fn plan_section_move(visible: &[&Task], from: usize, to: usize) -> (ListKind, Vec<(String, i64)>) {
    assert!(from < visible.len() && to < visible.len(), "move {from} -> {to} outside list");

    let moved = visible[from];
    let mut rest = visible.to_vec();
    rest.remove(from);
    let prev = to.checked_sub(1).and_then(|i| rest.get(i)).map(|t| t.list);
    let next = rest.get(to).map(|t| t.list);
    let list = if prev == Some(moved.list) || next == Some(moved.list) {
        moved.list
    } else {
        prev.or(next).unwrap_or(moved.list)
    };

    let mut section: Vec<&Task> =
        visible.iter().copied().filter(|t| t.list == list && t.id != moved.id).collect();
    let mut orders: Vec<i64> = section.iter().map(|t| t.order).collect();
    let source = if moved.list == list {
        let index = visible[..from].iter().filter(|t| t.list == list).count();
        orders.insert(index, moved.order);
        section.insert(index, moved);
        index
    } else {
        // Joins the section from just below its last task.
        orders.push(orders.last().map_or(moved.order, |last| last + 1));
        section.push(moved);
        section.len() - 1
    };
    let target = rest[..to].iter().filter(|t| t.list == list).count();

    let mut changes: Vec<(String, i64)> = renumber(&orders, source, target)
        .into_iter()
        .map(|(index, order)| (section[index].id.clone(), order))
        .collect();
    if changes.is_empty() && moved.list != list {
        changes.push((moved.id.clone(), orders[source]));
    }
    (list, changes)
}

/// Move a task within a logical list and save.
///
/// The visible list is recomputed with the same filter the view uses. In
/// a project view a task dropped among tasks of another list moves into
/// that list.
///
/// # Errors
///
/// Returns an error if the store fails to save.
pub fn move_task(
    store: &mut dyn Store,
    list: &LogicalList,
    mode: ViewMode,
    now: NaiveDateTime,
    from: usize,
    to: usize,
) -> Result<()> {
    if from == to {
        return Ok(());
    }

    let (list_change, changes) = {
        let filter = ViewFilter::new(store.graph(), now, mode);
        let visible = filter.visible_tasks(list);
        if matches!(list, LogicalList::Project(_)) {
            let (destination, changes) = plan_section_move(&visible, from, to);
            let moved = visible[from];
            ((moved.list != destination).then(|| (moved.id.clone(), destination)), changes)
        } else {
            let orders: Vec<i64> = visible.iter().map(|t| t.order).collect();
            let changes: Vec<(String, i64)> = renumber(&orders, from, to)
                .into_iter()
                .map(|(index, order)| (visible[index].id.clone(), order))
                .collect();
            (None, changes)
        }
    };

    let graph = store.graph_mut();
    if let Some((id, destination)) = &list_change {
        if let Some(task) = graph.task_mut(id) {
            task.list = *destination;
            if *destination != ListKind::Next {
                task.focus = false;
            }
            task.touch();
        }
    }
    for (id, order) in &changes {
        if let Some(task) = graph.task_mut(id) {
            task.set_order(*order);
        }
    }

    tracing::debug!(?list, from, to, renumbered = changes.len(), "moved task");
    store.save()
}

/// Move a project within the manually ordered project list and save.
///
/// # Errors
///
/// Returns an error if the store fails to save.
pub fn move_project(store: &mut dyn Store, from: usize, to: usize) -> Result<()> {
    if from == to {
        return Ok(());
    }

    let (ids, orders) = {
        let filter = ViewFilter::new(store.graph(), NaiveDateTime::MIN, ViewMode::default());
        let visible = filter.visible_projects();
        let ids: Vec<String> = visible.iter().map(|p| p.id.clone()).collect();
        let orders: Vec<i64> = visible.iter().map(|p| p.order).collect();
        (ids, orders)
    };

    let changes = renumber(&orders, from, to);
    let graph = store.graph_mut();
    for &(index, order) in &changes {
        if let Some(project) = graph.project_mut(&ids[index]) {
            project.set_order(order);
        }
    }

    tracing::debug!(from, to, renumbered = changes.len(), "moved project");
    store.save()
}

/// Move a tag within the tag list and save.
///
/// # Errors
///
/// Returns an error if the store fails to save.
pub fn move_tag(store: &mut dyn Store, from: usize, to: usize) -> Result<()> {
    if from == to {
        return Ok(());
    }

    let (ids, orders) = {
        let filter = ViewFilter::new(store.graph(), NaiveDateTime::MIN, ViewMode::default());
        let visible = filter.visible_tags();
        let ids: Vec<String> = visible.iter().map(|t| t.id.clone()).collect();
        let orders: Vec<i64> = visible.iter().map(|t| t.order).collect();
        (ids, orders)
    };

    let changes = renumber(&orders, from, to);
    let graph = store.graph_mut();
    for &(index, order) in &changes {
        if let Some(tag) = graph.tag_mut(&ids[index]) {
            tag.set_order(order);
        }
    }

    tracing::debug!(from, to, renumbered = changes.len(), "moved tag");
    store.save()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use proptest::prelude::*;

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 6, 10).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    /// Apply a move to named items and return names sorted by the new orders.
    fn apply(items: &[(&'static str, i64)], from: usize, to: usize) -> Vec<(&'static str, i64)> {
        let mut items = items.to_vec();
        let orders: Vec<i64> = items.iter().map(|(_, o)| *o).collect();
        for (index, order) in renumber(&orders, from, to) {
            items[index].1 = order;
        }
        items.sort_by_key(|(_, o)| *o);
        items
    }

    #[test]
    fn test_move_down_literal_trace() {
        let result = apply(&[("A", 1), ("B", 2), ("C", 3), ("D", 4)], 0, 2);
        assert_eq!(result, vec![("B", 1), ("C", 2), ("A", 3), ("D", 4)]);
    }

    #[test]
    fn test_move_up() {
        let result = apply(&[("A", 1), ("B", 2), ("C", 3), ("D", 4)], 3, 0);
        assert_eq!(result, vec![("D", 1), ("A", 2), ("B", 3), ("C", 4)]);
    }

    #[test]
    fn test_move_up_middle_keeps_outside() {
        let result = apply(&[("A", 10), ("B", 20), ("C", 30), ("D", 40), ("E", 50)], 3, 1);
        assert_eq!(result, vec![("A", 10), ("D", 20), ("B", 21), ("C", 22), ("E", 50)]);
    }

    #[test]
    fn test_move_same_index_is_noop() {
        assert!(renumber(&[1, 2, 3], 1, 1).is_empty());
    }

    #[test]
    fn test_adjacent_swap() {
        let result = apply(&[("A", 5), ("B", 9)], 0, 1);
        assert_eq!(result, vec![("B", 5), ("A", 6)]);
    }

    #[test]
    #[should_panic(expected = "outside list")]
    fn test_out_of_range_panics() {
        let _ = renumber(&[1, 2], 0, 2);
    }

    #[test]
    fn test_drop_target() {
        assert_eq!(drop_target(0, 3), 2);
        assert_eq!(drop_target(3, 0), 0);
        assert_eq!(drop_target(2, 2), 2);
    }

    #[test]
    fn test_duplicate_orders_keep_graph_tie_break() {
        assert_eq!(renumber(&[1, 1, 1, 1], 0, 2), vec![(1, 1), (2, 2), (0, 3)]);

        let mut store = MemoryStore::new();
        let ids: Vec<String> = ["A", "B", "C", "D"]
            .iter()
            .map(|name| store.graph_mut().create_task(name, ListKind::Now, 1).id.clone())
            .collect();
        let list = LogicalList::List(ListKind::Now);

        move_task(&mut store, &list, ViewMode::default(), now(), 0, 2).unwrap();

        // D keeps order 1 and ties with B, so it sorts ahead of C.
        let orders: Vec<i64> = ids.iter().map(|id| store.graph().task(id).unwrap().order).collect();
        assert_eq!(orders, vec![3, 1, 2, 1]);
        let filter = ViewFilter::new(store.graph(), now(), ViewMode::default());
        assert_eq!(
            filter.visible_task_ids(&list),
            vec![ids[1].clone(), ids[3].clone(), ids[2].clone(), ids[0].clone()]
        );
    }

    fn project_store(tasks: &[(&str, ListKind, i64)]) -> (MemoryStore, LogicalList, Vec<String>) {
        let mut store = MemoryStore::new();
        let pid = store.graph_mut().create_project("Move house", 0).id.clone();
        let ids = tasks
            .iter()
            .map(|(name, kind, order)| {
                let task = store.graph_mut().create_task(name, *kind, *order);
                task.project = Some(pid.clone());
                task.id.clone()
            })
            .collect();
        (store, LogicalList::Project(pid), ids)
    }

    fn project_view(store: &MemoryStore, view: &LogicalList) -> Vec<String> {
        ViewFilter::new(store.graph(), now(), ViewMode::default()).visible_task_ids(view)
    }

    #[test]
    fn test_project_move_across_lists_adopts_list() {
        let (mut store, view, ids) =
            project_store(&[("Book van", ListKind::Next, 1), ("Sort boxes", ListKind::Inbox, 50)]);
        let (next, inbox) = (&ids[0], &ids[1]);
        assert_eq!(project_view(&store, &view), vec![inbox.clone(), next.clone()]);

        move_task(&mut store, &view, ViewMode::default(), now(), 1, 0).unwrap();

        assert_eq!(project_view(&store, &view), vec![next.clone(), inbox.clone()]);
        assert_eq!(store.graph().task(next).unwrap().list, ListKind::Inbox);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_project_move_to_bottom_joins_last_list() {
        let (mut store, view, ids) = project_store(&[
            ("Sort boxes", ListKind::Inbox, 50),
            ("Book van", ListKind::Next, 1),
            ("Pack books", ListKind::Next, 2),
        ]);
        move_task(&mut store, &view, ViewMode::default(), now(), 0, 2).unwrap();

        assert_eq!(project_view(&store, &view), vec![ids[1].clone(), ids[2].clone(), ids[0].clone()]);
        let moved = store.graph().task(&ids[0]).unwrap();
        assert_eq!(moved.list, ListKind::Next);
        assert_eq!(moved.order, 3);
    }

    #[test]
    fn test_project_move_within_section_keeps_list() {
        let (mut store, view, ids) = project_store(&[
            ("Sort boxes", ListKind::Inbox, 50),
            ("Book van", ListKind::Next, 1),
            ("Pack books", ListKind::Next, 2),
        ]);
        move_task(&mut store, &view, ViewMode::default(), now(), 2, 1).unwrap();

        assert_eq!(project_view(&store, &view), vec![ids[0].clone(), ids[2].clone(), ids[1].clone()]);
        assert_eq!(store.graph().task(&ids[2]).unwrap().list, ListKind::Next);
        assert_eq!(store.graph().task(&ids[0]).unwrap().order, 50);
    }

    #[test]
    fn test_move_task_saves_once() {
        let mut store = MemoryStore::new();
        let ids: Vec<String> = ["A", "B", "C", "D"]
            .iter()
            .zip(1..)
            .map(|(name, order)| store.graph_mut().create_task(name, ListKind::Now, order).id.clone())
            .collect();
        store.save().unwrap();
        let list = LogicalList::List(ListKind::Now);

        move_task(&mut store, &list, ViewMode::default(), now(), 0, 2).unwrap();

        assert_eq!(store.save_count(), 2);
        let filter = ViewFilter::new(store.graph(), now(), ViewMode::default());
        assert_eq!(
            filter.visible_task_ids(&list),
            vec![ids[1].clone(), ids[2].clone(), ids[0].clone(), ids[3].clone()]
        );
    }

    #[test]
    fn test_move_task_noop_does_not_save() {
        let mut store = MemoryStore::new();
        store.graph_mut().create_task("A", ListKind::Now, 0);
        move_task(&mut store, &LogicalList::List(ListKind::Now), ViewMode::default(), now(), 0, 0)
            .unwrap();
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_move_task_ignores_hidden_tasks() {
        let mut store = MemoryStore::new();
        let graph = store.graph_mut();
        let a = graph.create_task("A", ListKind::Next, 1).id.clone();
        let hidden = graph.create_task("Hidden", ListKind::Next, 2).id.clone();
        graph.task_mut(&hidden).unwrap().focus = true;
        let b = graph.create_task("B", ListKind::Next, 3).id.clone();

        move_task(&mut store, &LogicalList::Next, ViewMode::default(), now(), 1, 0).unwrap();

        let graph = store.graph();
        assert_eq!(graph.task(&b).unwrap().order, 1);
        assert_eq!(graph.task(&a).unwrap().order, 2);
        assert_eq!(graph.task(&hidden).unwrap().order, 2, "hidden task keeps its order");
    }

    #[test]
    fn test_move_task_propagates_save_failure() {
        let mut store = MemoryStore::new();
        store.graph_mut().create_task("A", ListKind::Now, 1);
        store.graph_mut().create_task("B", ListKind::Now, 2);
        store.fail_saves(true);
        let result =
            move_task(&mut store, &LogicalList::List(ListKind::Now), ViewMode::default(), now(), 0, 1);
        assert!(result.is_err());
        assert!(store.graph().has_changes(), "changes kept for retry");
    }

    #[test]
    fn test_move_project_skips_single_actions() {
        let mut store = MemoryStore::new();
        let graph = store.graph_mut();
        let single = graph.create_project("Single", 0).id.clone();
        graph.project_mut(&single).unwrap().single_actions = true;
        let p1 = graph.create_project("P1", 1).id.clone();
        let p2 = graph.create_project("P2", 2).id.clone();

        move_project(&mut store, 1, 0).unwrap();

        let graph = store.graph();
        assert_eq!(graph.project(&p2).unwrap().order, 1);
        assert_eq!(graph.project(&p1).unwrap().order, 2);
        assert_eq!(graph.project(&single).unwrap().order, 0);
    }

    #[test]
    fn test_move_tag() {
        let mut store = MemoryStore::new();
        let t1 = store.graph_mut().create_tag("home", 1).id.clone();
        let t2 = store.graph_mut().create_tag("work", 2).id.clone();
        move_tag(&mut store, 0, 1).unwrap();
        assert_eq!(store.graph().tag(&t2).unwrap().order, 1);
        assert_eq!(store.graph().tag(&t1).unwrap().order, 2);
    }

    fn strictly_increasing() -> impl Strategy<Value = Vec<i64>> {
        prop::collection::vec(1i64..5, 1..20).prop_map(|gaps| {
            gaps.iter()
                .scan(-10i64, |acc, gap| {
                    *acc += gap;
                    Some(*acc)
                })
                .collect()
        })
    }

    fn sectioned() -> impl Strategy<Value = Vec<(ListKind, i64)>> {
        prop::collection::vec((0usize..4, 1i64..4), 1..12).prop_map(|specs| {
            let mut running = [0i64; 4];
            specs
                .into_iter()
                .map(|(list, gap)| {
                    running[list] += gap;
                    (ListKind::ALL[list], running[list])
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_project_move_lands_at_target(
            (tasks, from, to) in sectioned().prop_flat_map(|tasks| {
                let len = tasks.len();
                (Just(tasks), 0..len, 0..len)
            })
        ) {
            let named: Vec<(&str, ListKind, i64)> =
                tasks.iter().map(|(list, order)| ("t", *list, *order)).collect();
            let (mut store, view, _) = project_store(&named);
            let before = project_view(&store, &view);

            move_task(&mut store, &view, ViewMode::default(), now(), from, to).unwrap();

            let mut expected = before;
            let moved = expected.remove(from);
            expected.insert(to, moved);
            prop_assert_eq!(project_view(&store, &view), expected);
        }

        #[test]
        fn prop_moved_item_lands_at_target(
            (orders, from, to) in strictly_increasing().prop_flat_map(|orders| {
                let len = orders.len();
                (Just(orders), 0..len, 0..len)
            })
        ) {
            let mut items: Vec<(usize, i64)> = orders.iter().copied().enumerate().collect();
            for (index, order) in renumber(&orders, from, to) {
                items[index].1 = order;
            }
            items.sort_by_key(|(_, o)| *o);
            let result: Vec<usize> = items.iter().map(|(id, _)| *id).collect();

            let mut expected: Vec<usize> = (0..orders.len()).collect();
            let moved = expected.remove(from);
            expected.insert(to, moved);

            prop_assert_eq!(result, expected);
        }

        #[test]
        fn prop_untouched_outside_range(
            (orders, from, to) in strictly_increasing().prop_flat_map(|orders| {
                let len = orders.len();
                (Just(orders), 0..len, 0..len)
            })
        ) {
            let (lo, hi) = (from.min(to), from.max(to));
            for (index, _) in renumber(&orders, from, to) {
                prop_assert!(index >= lo && index <= hi);
            }
        }
    }
}
