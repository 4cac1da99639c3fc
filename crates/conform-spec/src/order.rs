//! Render ordering for field specs.

use crate::field::FieldSpec;

/// Resolve render orders for one schema level.
///
/// `declared` holds each property's schema `order` in declaration order.
/// Non-negative declared orders are kept; every other property gets the next
/// integer after the largest declared order, in declaration order.
pub fn assign_orders(declared: &[Option<i64>]) -> Vec<i64> {
    let mut next = declared
        .iter()
        .flatten()
        .filter(|order| **order >= 0)
        .max()
        .map_or(0, |max| max.saturating_add(1));

    declared
        .iter()
        .map(|order| match order {
            Some(order) if *order >= 0 => *order,
            _ => {
                let assigned = next;
                next = next.saturating_add(1);
                assigned
            }
        })
        .collect()
}

/// Sort specs ascending by `order`, recursing into nested specs.
///
/// The sort is stable, so equal orders keep their relative position and
/// sorting an already sorted list leaves it untouched.
pub fn sort_specs(specs: &mut [FieldSpec]) {
    specs.sort_by_key(|spec| spec.order);
    for spec in specs.iter_mut() {
        sort_specs(&mut spec.specs);
    }
}
