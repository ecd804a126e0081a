//! Helper functions for integration tests

#![allow(dead_code)]

use nei_core::Element;
use nei_rates::{EigenTable, ScaledHydrogenic, TemperatureGrid};
use nei_sim::SimulationState;

pub fn el(symbol: &str) -> Element {
    Element::from_symbol(symbol).unwrap()
}

/// Scaled-hydrogenic table over 10^4..10^8 K with 0.05 dex spacing.
pub fn table(symbols: &[&str]) -> EigenTable {
    let elements: Vec<Element> = symbols.iter().map(|s| el(s)).collect();
    let grid = TemperatureGrid {
        log_t_min: 4.0,
        log_t_max: 8.0,
        points: 81,
    };
    EigenTable::build(&ScaledHydrogenic::default(), &elements, grid).unwrap()
}

/// Assert every committed column of every element sums to one.
pub fn assert_conserved(state: &SimulationState, tolerance: f64) {
    for &element in state.elements() {
        let fractions = state.ionic_fractions(element).unwrap();
        for (col, column) in fractions.column_iter().enumerate() {
            let sum = column.sum();
            assert!(
                (sum - 1.0).abs() < tolerance,
                "{element} column {col} sums to {sum}"
            );
        }
    }
}

/// Charge-weighted sum of stored number densities at one column.
pub fn recomputed_electron_density(state: &SimulationState, col: usize) -> f64 {
    state
        .elements()
        .iter()
        .map(|&element| {
            let nd = state.number_densities(element).unwrap();
            (0..nd.nrows()).map(|i| i as f64 * nd[(i, col)]).sum::<f64>()
        })
        .sum()
}
