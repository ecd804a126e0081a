//! Integration tests: configuration rejections and mid-run failures.

mod common;

use std::sync::Arc;

use common::{CountingProvider, assert_conserved, el, table};
use nei_atomic::IonicInputs;
use nei_core::units::{Time, k, per_cm3, s, to_seconds};
use nei_rates::RatesError;
use nei_sim::{Nei, NeiConfig, SimError, TimeSeriesInput};

fn base_config(symbols: &[&str]) -> NeiConfig {
    let mut config = NeiConfig::new(IonicInputs::Elements(symbols.iter().map(|x| el(x)).collect()));
    config.temperature = Some(TimeSeriesInput::Constant(k(1e6)));
    config.density = Some(TimeSeriesInput::Constant(per_cm3(1e9)));
    config.dt = Some(s(1.0));
    config.max_steps = 10;
    config
}

fn explicit_config() -> NeiConfig {
    let mut config = base_config(&["H", "He"]);
    config.inputs = IonicInputs::Fractions(vec![
        (el("H"), vec![0.0, 1.0]),
        (el("He"), vec![0.0, 0.2, 0.8]),
    ]);
    config
}

#[test]
fn non_increasing_time_grid_is_rejected() {
    for grid in [vec![0.0, 10.0, 10.0], vec![0.0, 20.0, 10.0]] {
        let mut config = base_config(&["H", "He"]);
        config.time_input = Some(grid.into_iter().map(s).collect());
        config.temperature = Some(TimeSeriesInput::Tabulated(vec![k(1e6); 3]));
        let err = Nei::new(config, Arc::new(table(&["H", "He"]))).unwrap_err();
        assert!(matches!(err, SimError::Configuration { ref what, .. } if what.contains("increasing")));
    }
}

#[test]
fn hydrogen_is_required() {
    let config = base_config(&["He", "O"]);
    let err = Nei::new(config, Arc::new(table(&["He", "O"]))).unwrap_err();
    match err {
        SimError::Configuration { what, inputs } => {
            assert!(what.contains("hydrogen"));
            assert!(inputs.contains("dt: 1 s"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn tabulated_length_mismatch_is_rejected() {
    let mut config = base_config(&["H"]);
    config.time_input = Some(vec![s(0.0), s(1.0), s(2.0)]);
    config.density = Some(TimeSeriesInput::Tabulated(vec![per_cm3(1e9), per_cm3(1e9)]));
    assert!(matches!(
        Nei::new(config, Arc::new(table(&["H"]))),
        Err(SimError::Configuration { .. })
    ));
}

#[test]
fn start_temperature_outside_table_is_a_configuration_error() {
    let mut config = base_config(&["H", "He"]);
    config.temperature = Some(TimeSeriesInput::Constant(k(5e3)));
    assert!(matches!(
        Nei::new(config, Arc::new(table(&["H", "He"]))),
        Err(SimError::Configuration { .. })
    ));
}

#[test]
fn evaluation_outside_time_domain() {
    let mut config = base_config(&["H", "He"]);
    config.time_start = Some(s(10.0));
    config.time_max = Some(s(20.0));
    let nei = Nei::new(config, Arc::new(table(&["H", "He"]))).unwrap();

    assert!(nei.electron_temperature(s(10.0)).is_ok());
    assert!(nei.electron_temperature(s(20.0)).is_ok());
    assert!(nei.density_scale(s(15.0)).is_ok());
    assert!(matches!(
        nei.electron_temperature(s(9.0)),
        Err(SimError::Domain { .. })
    ));
    assert!(matches!(nei.density_scale(s(21.0)), Err(SimError::Domain { .. })));
}

#[test]
fn adaptive_without_dt_is_unimplemented() {
    let mut config = base_config(&["H", "He"]);
    config.dt = None;
    let mut nei = Nei::new(config, Arc::new(table(&["H", "He"]))).unwrap();
    assert!(matches!(nei.simulate(), Err(SimError::Unimplemented { .. })));
}

#[test]
fn running_past_time_max_keeps_earlier_columns() {
    let mut config = base_config(&["H", "He"]);
    config.time_max = Some(s(5.0));
    let mut nei = Nei::new(config, Arc::new(table(&["H", "He"]))).unwrap();

    let err = nei.simulate().unwrap_err();
    match err {
        SimError::Run { step, element, source } => {
            assert_eq!(step, 6);
            assert_eq!(element, None);
            assert!(matches!(*source, SimError::Domain { .. }));
        }
        other => panic!("unexpected {other:?}"),
    }
    let state = nei.results().unwrap();
    assert_eq!(state.index(), 6);
    assert_eq!(state.time().last().copied(), Some(5.0));
    assert_conserved(state, 1e-10);
}

#[test]
fn provider_failure_mid_run() {
    // two lookups per step; the fourth step fails on helium
    let provider = CountingProvider::new(table(&["H", "He"]), 7);
    let mut nei = Nei::new(explicit_config(), Arc::new(provider)).unwrap();

    let err = nei.simulate().unwrap_err();
    match &err {
        SimError::Run { step, element, source } => {
            assert_eq!(*step, 4);
            assert_eq!(*element, Some(el("He")));
            assert!(matches!(**source, SimError::Rates(RatesError::Numeric { .. })));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(err.to_string().contains("step 4 for He"));

    let state = nei.results().unwrap();
    assert_eq!(state.index(), 4);
    assert_eq!(state.time(), &[0.0, 1.0, 2.0, 3.0]);
    assert!(nei.final_state().is_some_and(|s| s.index == 3));
    assert_conserved(state, 1e-10);
}

#[test]
fn temperature_leaving_the_table_fails_the_step() {
    let mut config = explicit_config();
    config.temperature = Some(TimeSeriesInput::function(|t: Time| {
        k(1e6 * 10f64.powf(to_seconds(t)))
    }));
    let mut nei = Nei::new(config, Arc::new(table(&["H", "He"]))).unwrap();

    // columns 0..=2 lie inside 10^4..10^8 K; step 4 advances at 10^9 K
    let err = nei.simulate().unwrap_err();
    assert!(matches!(
        err,
        SimError::Run {
            step: 4,
            element: Some(e),
            ..
        } if e == el("H")
    ));
    assert_eq!(nei.results().map(|r| r.index()), Some(4));
}
