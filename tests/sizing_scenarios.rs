//! Worked sizing scenarios through the public pipeline.

mod common;

use approx::assert_abs_diff_eq;
use bess_sizer::Error;
use bess_sizer::runner::SizingRun;
use bess_sizer::sim::integrator::SocMode;
use bess_sizer::sim::policy::DispatchPolicy;
use bess_sizer::sim::sizing::SizingMethod;

#[test]
fn strict_import_limit_sizes_to_full_shortfall() {
    let series = common::series(&[10.0; 4], &[0.0; 4]);
    let policy = DispatchPolicy::strict_limits(5.0, 0.0).expect("valid policy");
    let run = SizingRun::new(policy, SizingMethod::Guaranteed).expect("valid run");
    let result = run.run(&series).expect("run succeeds");

    let power: Vec<f64> = result.steps.iter().map(|s| s.battery_power_kw).collect();
    let soc: Vec<f64> = result.steps.iter().map(|s| s.soc_kwh).collect();
    assert_eq!(power, vec![-5.0; 4]);
    assert_eq!(soc, vec![-1.25, -2.5, -3.75, -5.0]);
    assert_eq!(result.required_power_kw, 5.0);
    assert_abs_diff_eq!(result.required_capacity_kwh, 5.0, epsilon = 1e-12);
}

#[test]
fn self_consumption_largest_event_is_one_evening() {
    let series = common::series(&[0.0, 10.0], &[10.0, 0.0]);
    let run = SizingRun::new(
        DispatchPolicy::self_consumption(),
        SizingMethod::LargestDischargeEvent,
    )
    .expect("valid run");
    let result = run.run(&series).expect("run succeeds");

    let net: Vec<f64> = result.steps.iter().map(|s| s.net_load_kw).collect();
    let power: Vec<f64> = result.steps.iter().map(|s| s.battery_power_kw).collect();
    assert_eq!(net, vec![-10.0, 10.0]);
    assert_eq!(power, vec![10.0, -10.0]);
    assert_abs_diff_eq!(result.required_capacity_kwh, 2.5);
    assert_eq!(result.required_power_kw, 10.0);
    assert_eq!(result.events.len(), 1);
}

#[test]
fn empty_series_sizes_to_zero_for_every_combination() {
    let series = common::series(&[], &[]);
    for policy in common::all_policies() {
        for method in SizingMethod::all_defaults() {
            let run = SizingRun::new(policy, method).expect("valid run");
            let result = run.run(&series).expect("empty series never fails");
            assert_eq!(result.required_capacity_kwh, 0.0, "{policy} / {method}");
            assert_eq!(result.required_power_kw, 0.0, "{policy} / {method}");
            assert!(result.steps.is_empty());
        }
    }
}

#[test]
fn daily_surplus_uses_linear_interpolation() {
    // One surplus hour per day storing 10, 20, 30, 40 kWh, then an evening
    // load that drains it.
    let mut load = Vec::new();
    let mut pv = Vec::new();
    for day in 1..=4 {
        for hour in 0..24 {
            let (l, p) = match hour {
                12 => (0.0, 10.0 * day as f64),
                20 => (10.0 * day as f64, 0.0),
                _ => (0.0, 0.0),
            };
            load.push(l);
            pv.push(p);
        }
    }
    let series = common::series_with_dt(&load, &pv, 1.0);
    let method = SizingMethod::percentile_surplus(0.9).expect("valid method");
    let run = SizingRun::new(DispatchPolicy::self_consumption(), method).expect("valid run");
    let result = run.run(&series).expect("run succeeds");

    // h = 3 * 0.9 = 2.7 → 30 + 0.7 * 10
    assert_abs_diff_eq!(result.required_capacity_kwh, 37.0, epsilon = 1e-9);
    assert_eq!(result.soc_mode, SocMode::DailyReset);
}

#[test]
fn percentile_policy_resolves_threshold_on_load() {
    let series = common::series(&[10.0, 20.0, 30.0, 40.0], &[0.0, 0.0, 0.0, 25.0]);
    let policy = DispatchPolicy::percentile_peak_shaving(90.0, 0.0).expect("valid policy");
    let run = SizingRun::new(policy, SizingMethod::LargestDischargeEvent).expect("valid run");
    let result = run.run(&series).expect("run succeeds");

    assert_abs_diff_eq!(result.peak_threshold_kw.unwrap_or_default(), 37.0, epsilon = 1e-9);
    // Load 40 is 3 kW above the threshold even though net load is only 15.
    assert_abs_diff_eq!(result.steps[3].battery_power_kw, -3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.required_power_kw, 3.0, epsilon = 1e-9);
}

#[test]
fn arbitrage_without_prices_is_rejected() {
    let series = common::series(&[5.0, 5.0], &[0.0, 0.0]);
    let policy = DispatchPolicy::price_arbitrage(0.3, 0.1).expect("valid policy");
    let run = SizingRun::new(policy, SizingMethod::DailyCycle).expect("valid run");
    let err = run.run(&series).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(err.field(), "price");
}

#[test]
fn arbitrage_on_priced_fixture() {
    let series = common::two_days();
    let policy = DispatchPolicy::price_arbitrage(0.30, 0.10).expect("valid policy");
    let run = SizingRun::new(policy, SizingMethod::DailyCycle).expect("valid run");
    let result = run.run(&series).expect("run succeeds");

    for step in &result.steps {
        let price = step.price.unwrap_or_default();
        if step.battery_power_kw < 0.0 {
            assert!(price > 0.30);
        } else if step.battery_power_kw > 0.0 {
            assert!(price < 0.10);
        }
    }
    assert!(result.required_capacity_kwh > 0.0);
}
