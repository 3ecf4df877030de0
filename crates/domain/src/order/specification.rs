use sales_store::Money;

use super::OrderAggregate;

/// Decides whether a committed order is a special order.
///
/// An order is special when it has more than `min_lines` lines, or when a
/// minimum total is configured and the order total reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialOrderSpecification {
    min_lines: usize,
    min_total: Option<Money>,
}

impl Default for SpecialOrderSpecification {
    fn default() -> Self {
        Self {
            min_lines: 3,
            min_total: None,
        }
    }
}

impl SpecialOrderSpecification {
    pub fn new(min_lines: usize, min_total: Option<Money>) -> Self {
        Self {
            min_lines,
            min_total,
        }
    }

    pub fn is_satisfied_by(&self, order: &OrderAggregate) -> bool {
        order.line_count() > self.min_lines
            || self.min_total.is_some_and(|min| order.total() >= min)
    }
}
