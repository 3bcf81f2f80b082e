//! Property-based tests for process step ordering
//!
//! Normalized steps always carry a dense `1..=n` order and keep the
//! relative order of their effective input positions.

use procwatch_domain::{normalize_steps, StepInput};
use proptest::prelude::*;

fn steps_strategy() -> impl Strategy<Value = Vec<StepInput>> {
    proptest::collection::vec(proptest::option::of(1u32..20), 0..12).prop_map(|orders| {
        orders
            .into_iter()
            .enumerate()
            .map(|(index, order)| StepInput {
                order,
                ..StepInput::new(format!("step-{}", index))
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_orders_are_dense(inputs in steps_strategy()) {
        let count = inputs.len();
        let steps = normalize_steps(inputs).expect("unique ids normalize");

        let orders: Vec<u32> = steps.iter().map(|s| s.order).collect();
        let dense: Vec<u32> = (1..=count as u32).collect();
        prop_assert_eq!(orders, dense);
    }

    #[test]
    fn prop_effective_order_is_stable(inputs in steps_strategy()) {
        let mut expected: Vec<(u32, String)> = inputs
            .iter()
            .enumerate()
            .map(|(index, s)| (s.order.unwrap_or(index as u32 + 1), s.step_id.clone()))
            .collect();
        expected.sort_by_key(|(order, _)| *order);

        let steps = normalize_steps(inputs).expect("unique ids normalize");
        let ids: Vec<String> = steps.into_iter().map(|s| s.step_id).collect();
        let expected_ids: Vec<String> = expected.into_iter().map(|(_, id)| id).collect();
        prop_assert_eq!(ids, expected_ids);
    }

    #[test]
    fn prop_duplicate_ids_are_rejected(mut inputs in steps_strategy(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!inputs.is_empty());
        let duplicate = inputs[pick.index(inputs.len())].step_id.clone();
        inputs.push(StepInput::new(duplicate));

        prop_assert!(normalize_steps(inputs).is_err());
    }
}
