//! Order values for newly inserted entities.
//!
//! New entities go directly above the first or below the last entity of
//! the filtered list they are added to, never of the whole collection.

use crate::tasks::filter::{LogicalList, ViewFilter};
use serde::{Deserialize, Serialize};

/// Where a new entity is placed in its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Above the first entity.
    Top,
    /// Below the last entity.
    #[default]
    Bottom,
}

/// Order for an entity inserted above `orders` (ascending).
///
/// The first entity of an empty list gets `0`.
#[must_use]
pub fn order_at_top(orders: &[i64]) -> i64 {
    orders.first().map_or(0, |first| first - 1)
}

/// Order for an entity inserted below `orders` (ascending).
///
/// An empty list yields `1`.
#[must_use]
pub fn order_at_bottom(orders: &[i64]) -> i64 {
    orders.last().copied().unwrap_or(0) + 1
}

/// Order for an entity inserted at `position` of `orders` (ascending).
#[must_use]
pub fn order_at(orders: &[i64], position: Position) -> i64 {
    match position {
        Position::Top => order_at_top(orders),
        Position::Bottom => order_at_bottom(orders),
    }
}

/// Order for a new task placed at `position` of a logical list.
#[must_use]
pub fn task_order_in(filter: &ViewFilter<'_>, list: &LogicalList, position: Position) -> i64 {
    let orders: Vec<i64> = filter.visible_tasks(list).iter().map(|t| t.order).collect();
    order_at(&orders, position)
}

/// Order for a new project at the bottom of the project list.
#[must_use]
pub fn next_project_order(filter: &ViewFilter<'_>) -> i64 {
    let orders: Vec<i64> = filter.visible_projects().iter().map(|p| p.order).collect();
    order_at_bottom(&orders)
}

/// Order for a new tag at the bottom of the tag list.
#[must_use]
pub fn next_tag_order(filter: &ViewFilter<'_>) -> i64 {
    let orders: Vec<i64> = filter.visible_tags().iter().map(|t| t.order).collect();
    order_at_bottom(&orders)
}
