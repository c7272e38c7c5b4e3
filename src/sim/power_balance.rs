//! Site power balance around the battery.

/// Computes net load of the site before the battery.
///
/// Positive = net draw from the grid, negative = net export of PV surplus.
///
/// # Arguments
///
/// * `load_kw` - Building load (positive)
/// * `pv_kw` - PV production (positive)
pub fn net_load_kw(load_kw: f64, pv_kw: f64) -> f64 {
    load_kw - pv_kw
}

/// Computes grid exchange after the battery.
///
/// Both inputs follow the same convention as the grid meter:
/// - Positive = import / load (net draw, battery charging)
/// - Negative = export / generation (PV surplus, battery discharging)
///
/// This function performs pure summation with **no sign flipping**.
pub fn grid_exchange_kw(net_load_kw: f64, battery_power_kw: f64) -> f64 {
    net_load_kw + battery_power_kw
}
