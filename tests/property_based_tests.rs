//! Property-based tests for the breakpoint engine
//!
//! Core properties:
//! 1. p-values always land in [0, 1] and statistics are non-negative
//! 2. Proportional tables never reject uniformity or independence
//! 3. Negation flips every verdict
//! 4. Insertion never modifies the source program
//! 5. Collection is a pure function of its inputs
//! 6. Marginalising onto every bit in order is the identity
//! 7. Every selector form resolves to the same flat indices

use proptest::prelude::*;
use qbreak::circuit::{Circuit, RegisterKind};
use qbreak::collector::{ExecutionOutput, RunContext};
use qbreak::selector::{BitRef, BitSelector};
use qbreak::stat_test::{goodness_of_fit, independence_test, ExpectedShape};
use qbreak::{Assertion, FrequencyTable};

fn label(value: usize, width: usize) -> String {
    format!("{:0width$b}", value, width = width)
}

fn table_from(counts: &[u64], width: usize) -> FrequencyTable {
    counts
        .iter()
        .enumerate()
        .map(|(value, &count)| (label(value, width), count))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_goodness_of_fit_pvalue_in_unit_interval(
        counts in prop::collection::vec(0u64..5000, 2..16),
    ) {
        prop_assume!(counts.iter().sum::<u64>() > 0);

        let test = goodness_of_fit(&counts, &ExpectedShape::Uniform).unwrap();
        prop_assert!(test.statistic >= 0.0);
        prop_assert!((0.0..=1.0).contains(&test.pvalue));
        prop_assert_eq!(test.df, counts.len() - 1);
    }

    #[test]
    fn prop_equal_counts_never_reject_uniformity(
        per_outcome in 1u64..10_000,
        width in 1usize..6,
    ) {
        let counts = vec![per_outcome; 1 << width];
        let test = goodness_of_fit(&counts, &ExpectedShape::Uniform).unwrap();
        prop_assert_eq!(test.statistic, 0.0);
        prop_assert!((test.pvalue - 1.0).abs() < 1e-12);
    }

    #[test]
    fn prop_outer_product_tables_are_independent(
        rows in prop::collection::vec(1u64..50, 2..5),
        cols in prop::collection::vec(1u64..50, 2..5),
        yates in any::<bool>(),
    ) {
        let table: Vec<Vec<u64>> = rows
            .iter()
            .map(|r| cols.iter().map(|c| r * c).collect())
            .collect();

        let test = independence_test(&table, yates).unwrap();
        prop_assert_eq!(test.df, (rows.len() - 1) * (cols.len() - 1));
        prop_assert!((test.pvalue - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_negation_flips_verdict(
        counts in prop::collection::vec(1u64..2000, 4),
        pcrit in 0.001f64..0.5,
    ) {
        let circuit = Circuit::with_size("c", 2, 2);
        let table = table_from(&counts, 2);

        let assertions = [
            Assertion::superposition(circuit.space(), 0..2, 0..2, pcrit).unwrap(),
            Assertion::classical(circuit.space(), 0..2, 0..2, 3, pcrit).unwrap(),
            Assertion::product(circuit.space(), 0, 0, 1, 1, pcrit).unwrap(),
        ];
        for assertion in assertions {
            let plain = assertion.stat_test(&table).unwrap();
            let negated = assertion.negated().stat_test(&table).unwrap();
            prop_assert_eq!(plain.passed, !negated.passed);
            prop_assert_eq!(plain.p_value, negated.p_value);
        }
    }

    #[test]
    fn prop_insertion_is_non_destructive(
        gates in prop::collection::vec(0usize..3, 0..20),
        target in 0usize..3,
    ) {
        let mut ctx = RunContext::new();
        let mut circuit = Circuit::with_size("prog", 3, 3);
        for qubit in gates {
            circuit.h(qubit).unwrap();
        }
        let before = circuit.clone();

        let bp = ctx.insert_classical(&circuit, target, target, 0, 0.05).unwrap();

        prop_assert_eq!(&circuit, &before);
        prop_assert_eq!(bp.program().len(), before.len() + 2);
        prop_assert_eq!(bp.program().ops()[..before.len()].to_vec(), before.ops().to_vec());
    }

    #[test]
    fn prop_collect_is_pure(
        counts in prop::collection::vec(0u64..500, 4),
    ) {
        prop_assume!(counts.iter().sum::<u64>() > 0);

        let mut ctx = RunContext::new();
        let circuit = Circuit::with_size("prog", 2, 2);
        let bp = ctx.insert_superposition(&circuit, 0..2, 0..2, 0.05).unwrap();

        let mut output = ExecutionOutput::new();
        output.insert(bp.id().to_string(), table_from(&counts, 2));

        let first = ctx.collect(std::slice::from_ref(&bp), &output).unwrap();
        let second = ctx.collect(std::slice::from_ref(&bp), &output).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(ctx.registry().len(), 1);
    }

    #[test]
    fn prop_full_marginal_is_identity(
        counts in prop::collection::vec(0u64..100, 8),
    ) {
        let table = table_from(&counts, 3);
        prop_assert_eq!(table.marginal(&[0, 1, 2]).unwrap(), table);
    }

    #[test]
    fn prop_selector_forms_agree(
        start in 0usize..6,
        len in 1usize..6,
        spare in 0usize..3,
    ) {
        let size = start + len + spare;
        let circuit = Circuit::with_size("c", size, size);
        let space = circuit.space();

        let expected: Vec<usize> = (start..start + len).collect();
        let forms = [
            BitSelector::from(start..start + len),
            BitSelector::from(expected.clone()),
            BitSelector::from(
                (start..start + len)
                    .map(|i| BitRef::new("q", i))
                    .collect::<Vec<_>>(),
            ),
        ];
        for form in forms {
            prop_assert_eq!(form.resolve(space, RegisterKind::Quantum).unwrap(), expected.clone());
        }
        if start == 0 && len == size {
            let whole = BitSelector::register("q").resolve(space, RegisterKind::Quantum).unwrap();
            prop_assert_eq!(whole, expected);
        }
    }
}
