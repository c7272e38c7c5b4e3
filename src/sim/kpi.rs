//! Post-hoc KPI computation from a dispatch trajectory.

use std::fmt;

use super::event::discharge_events;
use super::types::DispatchStep;

/// Grid exchange above an import limit by more than this counts as a breach.
const LIMIT_TOLERANCE_KW: f64 = 1e-9;

/// Aggregate indicators of how the sized battery changes the grid profile.
///
/// Computed post-hoc from the dispatch steps so the report always agrees
/// with the exported series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchKpis {
    /// Peak net import before the battery (kW, positive).
    pub peak_net_import_kw: f64,
    /// Peak net export before the battery (kW, positive magnitude).
    pub peak_net_export_kw: f64,
    /// Peak grid import after the battery (kW, positive).
    pub peak_grid_import_kw: f64,
    /// Peak grid export after the battery (kW, positive magnitude).
    pub peak_grid_export_kw: f64,
    /// Energy charged into the battery (kWh).
    pub energy_charged_kwh: f64,
    /// Energy discharged from the battery (kWh, positive magnitude).
    pub energy_discharged_kwh: f64,
    /// Battery throughput (kWh, sum of |power| * dt).
    pub throughput_kwh: f64,
    /// Equivalent full cycles against the required capacity.
    pub equivalent_full_cycles: f64,
    /// Number of contiguous discharge runs.
    pub discharge_events: usize,
    /// Steps whose grid import still exceeds the policy's import limit.
    pub samples_over_limit: usize,
}

impl DispatchKpis {
    /// Computes all KPIs.
    ///
    /// # Arguments
    ///
    /// * `steps` - Complete dispatch trajectory
    /// * `dt_hours` - Sample duration in hours
    /// * `capacity_kwh` - Required capacity, for the cycle count
    /// * `import_limit_kw` - Import limit the policy enforces, if any
    pub fn from_steps(
        steps: &[DispatchStep],
        dt_hours: f64,
        capacity_kwh: f64,
        import_limit_kw: Option<f64>,
    ) -> Self {
        let mut kpis = Self {
            discharge_events: discharge_events(steps).len(),
            ..Self::default()
        };

        for s in steps {
            kpis.peak_net_import_kw = kpis.peak_net_import_kw.max(s.net_load_kw);
            kpis.peak_net_export_kw = kpis.peak_net_export_kw.max(-s.net_load_kw);
            kpis.peak_grid_import_kw = kpis.peak_grid_import_kw.max(s.grid_exchange_kw);
            kpis.peak_grid_export_kw = kpis.peak_grid_export_kw.max(-s.grid_exchange_kw);

            if s.is_charging() {
                kpis.energy_charged_kwh += s.energy_kwh;
            } else if s.is_discharging() {
                kpis.energy_discharged_kwh -= s.energy_kwh;
            }
            kpis.throughput_kwh += s.battery_power_kw.abs() * dt_hours;

            if import_limit_kw.is_some_and(|limit| s.grid_exchange_kw > limit + LIMIT_TOLERANCE_KW)
            {
                kpis.samples_over_limit += 1;
            }
        }

        if capacity_kwh > 0.0 {
            kpis.equivalent_full_cycles = kpis.throughput_kwh / (2.0 * capacity_kwh);
        }
        kpis
    }
}

impl fmt::Display for DispatchKpis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Dispatch KPIs ---")?;
        writeln!(
            f,
            "Peak import:           {:.2} kW -> {:.2} kW",
            self.peak_net_import_kw, self.peak_grid_import_kw
        )?;
        writeln!(
            f,
            "Peak export:           {:.2} kW -> {:.2} kW",
            self.peak_net_export_kw, self.peak_grid_export_kw
        )?;
        writeln!(f, "Energy charged:        {:.2} kWh", self.energy_charged_kwh)?;
        writeln!(f, "Energy discharged:     {:.2} kWh", self.energy_discharged_kwh)?;
        writeln!(
            f,
            "Battery throughput:    {:.2} kWh ({:.2} equiv. cycles)",
            self.throughput_kwh, self.equivalent_full_cycles
        )?;
        writeln!(f, "Discharge events:      {}", self.discharge_events)?;
        write!(f, "Samples over limit:    {}", self.samples_over_limit)
    }
}
