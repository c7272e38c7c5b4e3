//! Invariants of the dispatch/integration/sizing pipeline on a realistic series.

mod common;

use approx::assert_abs_diff_eq;
use bess_sizer::runner::{SizingRun, compare_methods};
use bess_sizer::sim::engine::DispatchSimulator;
use bess_sizer::sim::integrator::{EnergyIntegrator, SocMode};
use bess_sizer::sim::sizing::{SizingCalculator, SizingMethod};

#[test]
fn grid_exchange_is_conserved() {
    let series = common::two_days();
    for policy in common::all_policies() {
        let (_, steps) = DispatchSimulator::new(policy)
            .expect("valid simulator")
            .run(&series)
            .expect("run succeeds");
        assert_eq!(steps.len(), series.len());
        for s in &steps {
            assert_eq!(s.grid_exchange_kw, s.net_load_kw + s.battery_power_kw);
        }
    }
}

#[test]
fn soc_follows_recurrence_in_both_modes() {
    let series = common::two_days();
    let dt = series.dt_hours();
    let policy = common::all_policies()[2];
    let (_, steps) = DispatchSimulator::new(policy)
        .expect("valid simulator")
        .run(&series)
        .expect("run succeeds");

    let continuous = EnergyIntegrator::new(SocMode::Continuous).integrate(&steps);
    assert_abs_diff_eq!(continuous[0], steps[0].battery_power_kw * dt);
    for t in 1..steps.len() {
        assert_abs_diff_eq!(
            continuous[t],
            continuous[t - 1] + steps[t].battery_power_kw * dt,
            epsilon = 1e-9
        );
    }

    let daily = EnergyIntegrator::new(SocMode::DailyReset).integrate(&steps);
    for t in 1..steps.len() {
        let expected = if steps[t].date() != steps[t - 1].date() {
            steps[t].battery_power_kw * dt
        } else {
            daily[t - 1] + steps[t].battery_power_kw * dt
        };
        assert_abs_diff_eq!(daily[t], expected, epsilon = 1e-9);
    }
}

#[test]
fn ratings_are_non_negative_for_every_combination() {
    let series = common::two_days();
    for policy in common::all_policies() {
        let results =
            compare_methods(&series, policy, &SizingMethod::all_defaults(), None)
                .expect("runs succeed");
        for r in results {
            assert!(r.required_capacity_kwh >= 0.0, "{policy} / {}", r.method);
            assert!(r.required_power_kw >= 0.0, "{policy} / {}", r.method);
            assert_eq!(r.steps.len(), series.len());
        }
    }
}

#[test]
fn guaranteed_bounds_range_based_methods() {
    let series = common::two_days();
    for policy in common::all_policies() {
        let (_, steps) = DispatchSimulator::new(policy)
            .expect("valid simulator")
            .run(&series)
            .expect("run succeeds");
        let capacity = |method: SizingMethod| {
            SizingCalculator::new(method)
                .expect("valid method")
                .required_capacity_kwh(&steps)
        };
        let guaranteed = capacity(SizingMethod::Guaranteed);
        let daily = capacity(SizingMethod::DailyCycle);
        for hours in [1.0, 6.0, 24.0, 72.0] {
            let window = capacity(SizingMethod::worst_window(hours).expect("valid method"));
            assert!(guaranteed + 1e-9 >= window, "{policy}: {hours} h window");
        }
        assert!(guaranteed + 1e-9 >= daily, "{policy}");
    }
}

#[test]
fn window_covering_horizon_equals_guaranteed() {
    let series = common::two_days();
    let policy = common::all_policies()[0];
    let (_, steps) = DispatchSimulator::new(policy)
        .expect("valid simulator")
        .run(&series)
        .expect("run succeeds");
    let guaranteed = SizingCalculator::new(SizingMethod::Guaranteed)
        .expect("valid method")
        .required_capacity_kwh(&steps);
    let window = SizingCalculator::new(SizingMethod::worst_window(72.0).expect("valid method"))
        .expect("valid method")
        .required_capacity_kwh(&steps);
    assert_abs_diff_eq!(guaranteed, window, epsilon = 1e-9);
}

#[test]
fn repeated_runs_are_bit_identical() {
    let series = common::two_days();
    for policy in common::all_policies() {
        for method in SizingMethod::all_defaults() {
            let run = SizingRun::new(policy, method).expect("valid run");
            let first = run.run(&series).expect("run succeeds");
            let second = run.run(&series).expect("run succeeds");
            assert_eq!(first, second, "{policy} / {method}");
        }
    }
}

#[test]
fn power_rating_is_largest_battery_power() {
    let series = common::two_days();
    for policy in common::all_policies() {
        let run = SizingRun::new(policy, SizingMethod::Guaranteed).expect("valid run");
        let result = run.run(&series).expect("run succeeds");
        let max = result
            .steps
            .iter()
            .map(|s| s.battery_power_kw.abs())
            .fold(0.0, f64::max);
        assert_eq!(result.required_power_kw, max);
    }
}

#[test]
fn strict_limits_keep_grid_inside_band() {
    let series = common::two_days();
    let policy = common::all_policies()[0];
    let result = SizingRun::new(policy, SizingMethod::Guaranteed)
        .expect("valid run")
        .run(&series)
        .expect("run succeeds");
    for s in &result.steps {
        assert!(s.grid_exchange_kw <= 50.0 + 1e-9);
        assert!(s.grid_exchange_kw >= -10.0 - 1e-9);
    }
    assert_eq!(result.kpis.samples_over_limit, 0);
    assert!(result.kpis.peak_net_import_kw > result.kpis.peak_grid_import_kw);
}
