//! Temperature classifier — satiation and critical-temperature judgement.
//!
//! Satiation is one-sided around the target: a heating room is satiated once
//! its warmest reading has come up to `target − deadband` (overshoot stays
//! satiated), a cooling room once its coolest reading has come down to
//! `target + deadband`. Criticality uses the whole-room reading (warmest for
//! heat, coolest for cool): every spot must be past the critical threshold
//! before an unoccupied room may call for conditioning.

use std::collections::BTreeMap;

use zonehub_domain::id::SensorId;
use zonehub_domain::mode::HvacMode;
use zonehub_domain::settings::Setpoints;

/// Degrees past the target that make a room critical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalThresholds {
    /// Below `heat target − heating` is critically cold.
    pub heating: f64,
    /// Above `cool target + cooling` is critically hot.
    pub cooling: f64,
}

/// Outcome of classifying one room's readings.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureAssessment {
    pub is_satiated: bool,
    pub is_critical: bool,
    pub determining_sensor: SensorId,
    pub determining_temperature: f64,
    /// `|determining − target|`, zero when satiated.
    pub distance_from_target: f64,
}

/// Classify a room. `satiation_targets` may be away-substituted; critical
/// judgement always runs against `critical_targets`. Returns `None` when
/// there are no usable readings — the room is excluded for this cycle,
/// never treated as satiated or critical.
#[must_use]
pub fn assess(
    readings: &BTreeMap<SensorId, f64>,
    mode: HvacMode,
    satiation_targets: Setpoints,
    critical_targets: Setpoints,
    deadband: f64,
    thresholds: CriticalThresholds,
) -> Option<TemperatureAssessment> {
    if readings.is_empty() {
        return None;
    }

    let (satiated, sensor, temperature) = match mode {
        HvacMode::Heat => {
            let (sensor, temp) = warmest(readings);
            (temp >= satiation_targets.heat - deadband, sensor, temp)
        }
        HvacMode::Cool => {
            let (sensor, temp) = coolest(readings);
            (temp <= satiation_targets.cool + deadband, sensor, temp)
        }
        HvacMode::HeatCool => in_band(readings, satiation_targets, deadband),
        HvacMode::Off => {
            let (sensor, temp) = closest_to(readings, average(readings));
            (true, sensor, temp)
        }
    };

    let is_critical = match mode {
        HvacMode::Heat => warmest(readings).1 < critical_targets.heat - thresholds.heating,
        HvacMode::Cool => coolest(readings).1 > critical_targets.cool + thresholds.cooling,
        HvacMode::HeatCool => {
            warmest(readings).1 < critical_targets.heat - thresholds.heating
                || coolest(readings).1 > critical_targets.cool + thresholds.cooling
        }
        HvacMode::Off => false,
    };

    let distance = if satiated {
        0.0
    } else {
        (temperature - satiation_targets.target_for(mode)).abs()
    };

    Some(TemperatureAssessment {
        is_satiated: satiated,
        is_critical,
        determining_sensor: sensor.clone(),
        determining_temperature: temperature,
        distance_from_target: distance,
    })
}

/// Infer the evaluation mode while the thermostat is off: whichever side of
/// the setpoint band the mean reading is closer to. `None` without readings.
#[must_use]
pub fn infer_hvac_mode(temperatures: &[f64], setpoints: Setpoints) -> Option<HvacMode> {
    if temperatures.is_empty() {
        return None;
    }
    #[expect(clippy::cast_precision_loss, reason = "sensor counts are tiny")]
    let avg = temperatures.iter().sum::<f64>() / temperatures.len() as f64;

    let distance_to_heat = setpoints.heat - avg; // positive when cold
    let distance_to_cool = avg - setpoints.cool; // positive when hot

    if distance_to_heat <= 0.0 && distance_to_cool <= 0.0 {
        // inside the band: lean toward the nearer boundary
        if distance_to_heat.abs() < distance_to_cool.abs() {
            Some(HvacMode::Heat)
        } else {
            Some(HvacMode::Cool)
        }
    } else if distance_to_heat > 0.0 {
        Some(HvacMode::Heat)
    } else {
        Some(HvacMode::Cool)
    }
}

fn warmest(readings: &BTreeMap<SensorId, f64>) -> (&SensorId, f64) {
    extreme(readings, |a, b| a > b)
}

fn coolest(readings: &BTreeMap<SensorId, f64>) -> (&SensorId, f64) {
    extreme(readings, |a, b| a < b)
}

fn extreme(
    readings: &BTreeMap<SensorId, f64>,
    better: impl Fn(f64, f64) -> bool,
) -> (&SensorId, f64) {
    let mut iter = readings.iter();
    let (mut best_id, mut best) = iter
        .next()
        .map(|(id, temp)| (id, *temp))
        .expect("readings checked non-empty");
    for (id, temp) in iter {
        if better(*temp, best) {
            best_id = id;
            best = *temp;
        }
    }
    (best_id, best)
}

fn closest_to(readings: &BTreeMap<SensorId, f64>, target: f64) -> (&SensorId, f64) {
    extreme(readings, |a, b| (a - target).abs() < (b - target).abs())
}

fn average(readings: &BTreeMap<SensorId, f64>) -> f64 {
    #[expect(clippy::cast_precision_loss, reason = "sensor counts are tiny")]
    let len = readings.len() as f64;
    readings.values().sum::<f64>() / len
}

fn in_band(
    readings: &BTreeMap<SensorId, f64>,
    targets: Setpoints,
    deadband: f64,
) -> (bool, &SensorId, f64) {
    let low = targets.heat - deadband;
    let high = targets.cool + deadband;
    for (id, temp) in readings {
        if (low..=high).contains(temp) {
            return (true, id, *temp);
        }
    }
    // nobody in the band: report the reading closest to it
    let (id, temp) = extreme(readings, |a, b| {
        distance_to_band(a, low, high) < distance_to_band(b, low, high)
    });
    (false, id, temp)
}

fn distance_to_band(temp: f64, low: f64, high: f64) -> f64 {
    if temp < low {
        low - temp
    } else if temp > high {
        temp - high
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(values: &[(&str, f64)]) -> BTreeMap<SensorId, f64> {
        values
            .iter()
            .map(|(id, temp)| (SensorId::from(*id), *temp))
            .collect()
    }

    fn targets() -> Setpoints {
        Setpoints::new(20.0, 24.0)
    }

    fn thresholds() -> CriticalThresholds {
        CriticalThresholds {
            heating: 3.0,
            cooling: 3.0,
        }
    }

    fn assess_simple(values: &[(&str, f64)], mode: HvacMode) -> TemperatureAssessment {
        assess(&readings(values), mode, targets(), targets(), 0.5, thresholds()).unwrap()
    }

    #[test]
    fn should_return_none_without_readings() {
        let empty = BTreeMap::new();
        assert_eq!(
            assess(&empty, HvacMode::Heat, targets(), targets(), 0.5, thresholds()),
            None
        );
    }

    #[test]
    fn should_satiate_heat_when_warmest_reaches_target_minus_deadband() {
        let result = assess_simple(&[("sensor.a", 18.0), ("sensor.b", 19.6)], HvacMode::Heat);
        assert!(result.is_satiated);
        assert_eq!(result.determining_sensor, SensorId::from("sensor.b"));
        assert!((result.distance_from_target).abs() < f64::EPSILON);
    }

    #[test]
    fn should_not_satiate_heat_when_all_below_threshold() {
        let result = assess_simple(&[("sensor.a", 18.0), ("sensor.b", 19.0)], HvacMode::Heat);
        assert!(!result.is_satiated);
        assert!((result.determining_temperature - 19.0).abs() < f64::EPSILON);
        assert!((result.distance_from_target - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_keep_heat_satiated_on_overshoot() {
        let result = assess_simple(&[("sensor.a", 25.0)], HvacMode::Heat);
        assert!(result.is_satiated);
    }

    #[test]
    fn should_satiate_cool_when_coolest_reaches_target_plus_deadband() {
        let result = assess_simple(&[("sensor.a", 24.4), ("sensor.b", 26.0)], HvacMode::Cool);
        assert!(result.is_satiated);
        assert_eq!(result.determining_sensor, SensorId::from("sensor.a"));
    }

    #[test]
    fn should_not_satiate_cool_when_all_above_threshold() {
        let result = assess_simple(&[("sensor.a", 25.0), ("sensor.b", 26.0)], HvacMode::Cool);
        assert!(!result.is_satiated);
        assert!((result.determining_temperature - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_satiate_heat_cool_when_any_reading_is_in_band() {
        let result = assess_simple(&[("sensor.a", 17.0), ("sensor.b", 21.0)], HvacMode::HeatCool);
        assert!(result.is_satiated);
        assert_eq!(result.determining_sensor, SensorId::from("sensor.b"));
    }

    #[test]
    fn should_report_closest_reading_when_heat_cool_unsatiated() {
        let result = assess_simple(&[("sensor.a", 17.0), ("sensor.b", 26.0)], HvacMode::HeatCool);
        assert!(!result.is_satiated);
        // 26.0 is 1.5 above the band, 17.0 is 2.5 below it
        assert_eq!(result.determining_sensor, SensorId::from("sensor.b"));
    }

    #[test]
    fn should_flag_critical_heat_only_when_warmest_is_below_threshold() {
        // warmest 18.0 > 17.0 threshold: one cold corner is not critical
        let warm_enough = assess_simple(&[("sensor.a", 14.0), ("sensor.b", 18.0)], HvacMode::Heat);
        assert!(!warm_enough.is_critical);

        let critical = assess_simple(&[("sensor.a", 14.0), ("sensor.b", 16.5)], HvacMode::Heat);
        assert!(critical.is_critical);
    }

    #[test]
    fn should_flag_critical_cool_when_coolest_is_above_threshold() {
        let critical = assess_simple(&[("sensor.a", 27.5), ("sensor.b", 29.0)], HvacMode::Cool);
        assert!(critical.is_critical);

        let fine = assess_simple(&[("sensor.a", 26.0), ("sensor.b", 29.0)], HvacMode::Cool);
        assert!(!fine.is_critical);
    }

    #[test]
    fn should_flag_critical_heat_cool_on_either_side() {
        let cold = assess_simple(&[("sensor.a", 16.0)], HvacMode::HeatCool);
        assert!(cold.is_critical);

        let hot = assess_simple(&[("sensor.a", 28.0)], HvacMode::HeatCool);
        assert!(hot.is_critical);
    }

    #[test]
    fn should_treat_off_mode_as_satiated_and_never_critical() {
        let result = assess_simple(&[("sensor.a", 10.0)], HvacMode::Off);
        assert!(result.is_satiated);
        assert!(!result.is_critical);
    }

    // Away-target substitution is assumed to shift only the satiation
    // comparison; critical thresholds stay on the normal targets.
    #[test]
    fn should_keep_critical_on_normal_targets_when_satiation_uses_away_targets() {
        let away = Setpoints::new(16.0, 28.0);
        let result = assess(
            &readings(&[("sensor.a", 16.2)]),
            HvacMode::Heat,
            away,
            targets(),
            0.5,
            thresholds(),
        )
        .unwrap();

        // satiated against the away target (16.2 >= 16.0 - 0.5)...
        assert!(result.is_satiated);
        // ...but still critical against the normal target (16.2 < 20.0 - 3.0)
        assert!(result.is_critical);
    }

    #[test]
    fn should_infer_heat_when_below_band() {
        assert_eq!(infer_hvac_mode(&[18.0, 19.0], targets()), Some(HvacMode::Heat));
    }

    #[test]
    fn should_infer_cool_when_above_band() {
        assert_eq!(infer_hvac_mode(&[26.0, 27.0], targets()), Some(HvacMode::Cool));
    }

    #[test]
    fn should_infer_nearer_boundary_inside_band() {
        assert_eq!(infer_hvac_mode(&[20.5], targets()), Some(HvacMode::Heat));
        assert_eq!(infer_hvac_mode(&[23.5], targets()), Some(HvacMode::Cool));
    }

    #[test]
    fn should_infer_nothing_without_readings() {
        assert_eq!(infer_hvac_mode(&[], targets()), None);
    }
}
