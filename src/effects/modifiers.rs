use ordered_float::OrderedFloat;
use serde::Serialize;

/// Slot of the damage formula a modifier multiplies into.
pub const SLOT_MOD1: u8 = 0;
pub const SLOT_MOD2: u8 = 1;
pub const SLOT_MOD3: u8 = 2;

/// One multiplicative contribution to a damage or stat calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Modifier {
    pub slot: u8,
    pub value: OrderedFloat<f64>,
    /// Lower priorities apply first within a slot.
    pub priority: i32,
}

impl Modifier {
    pub fn new(slot: u8, value: f64, priority: i32) -> Self {
        Self {
            slot,
            value: OrderedFloat(value),
            priority,
        }
    }

    /// Stat modifiers have a single slot.
    pub fn stat(value: f64, priority: i32) -> Self {
        Self::new(0, value, priority)
    }
}

/// Orders contributions by (slot, priority). The sort is stable, so equal
/// priorities keep the order in which the dispatcher collected them.
pub fn sort_modifiers(modifiers: &mut [Modifier]) {
    modifiers.sort_by_key(|m| (m.slot, m.priority));
}

/// Multiplies `value` by every modifier in `slot`, flooring after each step.
pub fn apply_slot(value: u32, modifiers: &[Modifier], slot: u8) -> u32 {
    modifiers
        .iter()
        .filter(|m| m.slot == slot)
        .fold(value, |acc, m| (acc as f64 * m.value.into_inner()).floor() as u32)
}

/// Applies every slot strictly greater than `after`, in ascending order.
pub fn apply_slots_after(value: u32, modifiers: &[Modifier], after: u8) -> u32 {
    modifiers
        .iter()
        .filter(|m| m.slot > after)
        .fold(value, |acc, m| (acc as f64 * m.value.into_inner()).floor() as u32)
}

/// Unfloored product of all contributions.
pub fn product(modifiers: &[Modifier]) -> f64 {
    modifiers.iter().map(|m| m.value.into_inner()).product()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sort_is_slot_then_priority_and_stable() {
        let mut mods = vec![
            Modifier::new(5, 1.5, 0),
            Modifier::new(0, 0.5, 1),
            Modifier::new(0, 2.0, 0),
            Modifier::new(0, 3.0, 0),
        ];
        sort_modifiers(&mut mods);
        let order: Vec<(u8, f64)> = mods.iter().map(|m| (m.slot, m.value.into_inner())).collect();
        assert_eq!(order, vec![(0, 2.0), (0, 3.0), (0, 0.5), (5, 1.5)]);
    }

    #[test]
    fn test_slot_application_floors_each_step() {
        let mods = vec![Modifier::new(0, 0.5, 0), Modifier::new(0, 1.5, 1)];
        // 15 * 0.5 = 7.5 -> 7, 7 * 1.5 = 10.5 -> 10
        assert_eq!(apply_slot(15, &mods, 0), 10);
        assert_eq!(apply_slot(15, &mods, 1), 15);
    }

    #[test]
    fn test_product_ignores_slot_order() {
        let a = vec![Modifier::new(0, 0.5, 0), Modifier::new(5, 1.5, 0)];
        let b = vec![Modifier::new(5, 1.5, 0), Modifier::new(0, 0.5, 0)];
        assert_eq!(product(&a), 0.75);
        assert_eq!(product(&a), product(&b));
    }
}
