//! Integration tests: full runs through the NEI driver.
//!
//! Checks that hold for every run:
//! - every committed column sums to one
//! - stored electron densities match the charge-weighted number densities
//! - `index == max_steps + 1` after a run

mod common;

use std::sync::Arc;

use common::{TwoLevelHydrogen, assert_conserved, el, recomputed_electron_density, table};
use nei_atomic::{AbundanceSpec, IonicInputs};
use nei_core::units::{Time, k, per_cm3, s, to_kelvin, to_seconds};
use nei_rates::RateTableProvider;
use nei_sim::{Nei, NeiConfig, SimError, TimeSeriesInput};

fn heating_config(symbols: &[&str]) -> NeiConfig {
    let elements = symbols.iter().map(|x| el(x)).collect();
    let mut config = NeiConfig::new(IonicInputs::Elements(elements));
    config.temperature = Some(TimeSeriesInput::function(|t: Time| {
        k(2e4 + 2e4 * to_seconds(t))
    }));
    config.density = Some(TimeSeriesInput::Constant(per_cm3(1e9)));
    config.dt = Some(s(1.0));
    config.max_steps = 50;
    config
}

#[test]
fn heating_run_conserves_and_tracks_electrons() {
    let symbols = ["H", "He", "C", "O"];
    let provider: Arc<dyn RateTableProvider> = Arc::new(table(&symbols));
    let mut nei = Nei::new(heating_config(&symbols), provider).unwrap();
    let state = nei.simulate().unwrap();

    assert_eq!(state.index(), 51);
    assert_conserved(state, 1e-10);
    for col in 0..state.index() {
        let expected = recomputed_electron_density(state, col);
        let stored = state.electron_density()[col];
        assert!(
            (stored - expected).abs() <= 1e-12 * expected.max(1.0),
            "column {col}: {stored} vs {expected}"
        );
    }

    // temperature column k is the input evaluated at t = k s
    for (t, te) in state.time().iter().zip(state.electron_temperature()) {
        assert!((te - (2e4 + 2e4 * t)).abs() < 1e-6);
    }

    // heating strips oxygen
    let first = state.fractions_at(el("O"), 0).unwrap();
    let last = state.fractions_at(el("O"), 50).unwrap();
    let mean_charge = |f: &[f64]| f.iter().enumerate().map(|(i, x)| i as f64 * x).sum::<f64>();
    assert!(mean_charge(&last) > mean_charge(&first));
}

#[test]
fn oxygen_converges_to_hot_equilibrium() {
    let table = table(&["H", "O"]);
    let cold_o = table.equilibrium_state(el("O"), 4e4).unwrap();
    let cold_h = table.equilibrium_state(el("H"), 4e4).unwrap();
    let hot_o = table.equilibrium_state(el("O"), 1e6).unwrap().clone();

    let mut config = NeiConfig::new(IonicInputs::Fractions(vec![
        (el("H"), cold_h.iter().copied().collect()),
        (el("O"), cold_o.iter().copied().collect()),
    ]));
    config.temperature = Some(TimeSeriesInput::Constant(k(1e6)));
    config.density = Some(TimeSeriesInput::Constant(per_cm3(1e8)));
    config.dt = Some(s(1e5));
    config.max_steps = 100;

    let mut nei = Nei::new(config, Arc::new(table)).unwrap();
    nei.simulate().unwrap();
    let last = nei.final_state().unwrap();
    assert_eq!(last.index, 100);
    for (got, want) in last.ionic_fractions[&el("O")].iter().zip(hot_o.iter()) {
        assert!((got - want).abs() < 1e-8, "got {got}, want {want}");
    }
}

#[test]
fn equilibrium_is_preserved() {
    let table = table(&["H", "C"]);
    let eq_c: Vec<f64> = table.equilibrium_state(el("C"), 3e5).unwrap().iter().copied().collect();

    let mut config = NeiConfig::new(IonicInputs::Elements(vec![el("H"), el("C")]));
    config.temperature = Some(TimeSeriesInput::Constant(k(3e5)));
    config.density = Some(TimeSeriesInput::Constant(per_cm3(1e10)));
    config.dt = Some(s(100.0));
    config.max_steps = 10;

    let mut nei = Nei::new(config, Arc::new(table)).unwrap();
    let state = nei.simulate().unwrap();
    for col in 0..state.index() {
        let f = state.fractions_at(el("C"), col).unwrap();
        for (a, b) in f.iter().zip(&eq_c) {
            assert!((a - b).abs() < 1e-10, "column {col}");
        }
    }
}

#[test]
fn two_level_matches_closed_form() {
    let model = TwoLevelHydrogen::new(2e-9, 1e-9);
    let expected1 = model.analytical_neutral(0.5, 0.5e9);

    let mut config = NeiConfig::new(IonicInputs::Fractions(vec![(el("H"), vec![0.5, 0.5])]));
    config.abundances = AbundanceSpec::Explicit(vec![(el("H"), 1.0)]);
    config.temperature = Some(TimeSeriesInput::Constant(k(1e4)));
    config.density = Some(TimeSeriesInput::Constant(per_cm3(1e9)));
    config.dt = Some(s(1.0));
    config.max_steps = 2;

    let mut nei = Nei::new(config, Arc::new(model)).unwrap();
    let state = nei.simulate().unwrap();

    let f1 = state.fractions_at(el("H"), 1).unwrap();
    assert!((f1[0] - expected1).abs() < 1e-14);
    assert!((state.electron_density()[1] - (1.0 - expected1) * 1e9).abs() < 1e-3);

    // step 2 uses the electron density of column 1
    let model = TwoLevelHydrogen::new(2e-9, 1e-9);
    let expected2 = model.analytical_neutral(expected1, (1.0 - expected1) * 1e9);
    let f2 = state.fractions_at(el("H"), 2).unwrap();
    assert!((f2[0] - expected2).abs() < 1e-14);
}

#[test]
fn tabulated_inputs_interpolate_between_grid_points() {
    let symbols = ["H", "He"];
    let mut config = NeiConfig::new(IonicInputs::Elements(symbols.iter().map(|x| el(x)).collect()));
    config.time_input = Some(vec![s(0.0), s(100.0), s(200.0)]);
    config.temperature = Some(TimeSeriesInput::Tabulated(vec![k(1e5), k(1e6), k(1e6)]));
    config.density = Some(TimeSeriesInput::Tabulated(vec![
        per_cm3(1e9),
        per_cm3(2e9),
        per_cm3(2e9),
    ]));
    config.dt = Some(s(10.0));
    config.max_steps = 20;

    let mut nei = Nei::new(config, Arc::new(table(&symbols))).unwrap();
    assert_eq!(nei.time_max().map(to_seconds), Some(200.0));
    assert!((to_kelvin(nei.electron_temperature(s(50.0)).unwrap()) - 5.5e5).abs() < 1e-6);

    let state = nei.simulate().unwrap();
    assert_eq!(state.index(), 21);
    assert_eq!(state.time()[20], 200.0);
    assert!((state.electron_temperature()[5] - 5.5e5).abs() < 1e-6);
    let n_h = state.elemental_density(el("H")).unwrap();
    assert!((n_h[5] - 1.5e9).abs() < 1e-3);
}

#[test]
fn non_dyadic_step_lands_on_time_max() {
    // 0.1 + 0.1 + 0.1 overshoots 0.3 by one ulp
    let symbols = ["H", "He"];
    let mut config = NeiConfig::new(IonicInputs::Elements(symbols.iter().map(|x| el(x)).collect()));
    config.time_input = Some(vec![s(0.0), s(0.3)]);
    config.temperature = Some(TimeSeriesInput::Tabulated(vec![k(1e5), k(1e6)]));
    config.density = Some(TimeSeriesInput::Constant(per_cm3(1e9)));
    config.dt = Some(s(0.1));
    config.max_steps = 3;

    let mut nei = Nei::new(config, Arc::new(table(&symbols))).unwrap();
    let time_max = nei.time_max().map(to_seconds).unwrap();
    let state = nei.simulate().unwrap();
    assert_eq!(state.index(), 4);
    assert_eq!(state.time().last().copied(), Some(time_max));
    assert!((state.time()[1] - 0.1).abs() < 1e-15);
    assert!((state.time()[2] - 0.2).abs() < 1e-15);
    assert!((state.electron_temperature()[3] - 1e6).abs() < 1e-6);
    assert_conserved(state, 1e-10);
}

#[test]
fn parallel_matches_sequential() {
    let symbols = ["H", "He", "C", "N", "O", "Ne"];
    let provider: Arc<dyn RateTableProvider> = Arc::new(table(&symbols));

    let mut sequential = Nei::new(heating_config(&symbols), Arc::clone(&provider)).unwrap();
    let mut config = heating_config(&symbols);
    config.parallel = true;
    let mut parallel = Nei::new(config, provider).unwrap();

    let a = sequential.simulate().unwrap().clone();
    let b = parallel.simulate().unwrap();
    assert_eq!(a.electron_density(), b.electron_density());
    for symbol in symbols {
        assert_eq!(a.ionic_fractions(el(symbol)), b.ionic_fractions(el(symbol)));
    }
}

#[test]
fn renormalized_columns_sum_to_one() {
    let symbols = ["H", "He", "O"];
    let mut config = heating_config(&symbols);
    config.renormalize = true;
    let mut nei = Nei::new(config, Arc::new(table(&symbols))).unwrap();
    let state = nei.simulate().unwrap();
    assert_conserved(state, 1e-14);
}

#[test]
fn rerun_starts_fresh() {
    let symbols = ["H", "He"];
    let mut nei = Nei::new(heating_config(&symbols), Arc::new(table(&symbols))).unwrap();
    let first = nei.simulate().unwrap().clone();
    let second = nei.simulate().unwrap();
    assert_eq!(second.index(), 51);
    assert_eq!(first.time(), second.time());
    assert_eq!(first.electron_density(), second.electron_density());
}

#[test]
fn full_state_rejects_more_columns() {
    let symbols = ["H", "He"];
    let mut config = heating_config(&symbols);
    config.max_steps = 3;
    let mut nei = Nei::new(config, Arc::new(table(&symbols))).unwrap();
    let mut state = nei.simulate().unwrap().clone();
    assert_eq!(state.index(), 4);

    let last = state.last().unwrap();
    let err = state
        .append(10.0, &last.ionic_fractions, 1e5, 1e9)
        .unwrap_err();
    assert_eq!(err, SimError::CapacityExceeded { capacity: 4 });
    assert_eq!(state.index(), 4);
}
