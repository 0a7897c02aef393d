use serde::{Deserialize, Serialize};

/// A single vitals snapshot taken at intake.
///
/// Plain numeric fields; nothing here is range-checked.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    /// Body temperature in degrees Celsius.
    pub temp: f64,
    /// Systolic blood pressure in mmHg.
    pub bp_systolic: f64,
    /// Diastolic blood pressure in mmHg.
    pub bp_diastolic: f64,
    /// Pulse rate in beats per minute.
    pub pulse: f64,
    /// Oxygen saturation (SpO2) in percent.
    pub oxygen: f64,
}

impl Default for Vitals {
    /// Normal adult values, used to pre-fill the intake form.
    fn default() -> Self {
        Self {
            temp: 36.5,
            bp_systolic: 120.0,
            bp_diastolic: 80.0,
            pulse: 75.0,
            oxygen: 98.0,
        }
    }
}

impl std::fmt::Display for Vitals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Temp {}C, BP {}/{}, HR {}, SpO2 {}%",
            self.temp, self.bp_systolic, self.bp_diastolic, self.pulse, self.oxygen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_camel_case_keys() {
        let vitals = Vitals {
            temp: 39.5,
            bp_systolic: 90.0,
            bp_diastolic: 60.0,
            pulse: 130.0,
            oxygen: 89.0,
        };
        let json = serde_json::to_value(vitals).expect("vitals should serialise");
        assert_eq!(json["bpSystolic"], 90.0);
        assert_eq!(json["bpDiastolic"], 60.0);
        assert_eq!(json["oxygen"], 89.0);
    }

    #[test]
    fn display_matches_prompt_format() {
        let vitals = Vitals::default();
        assert_eq!(vitals.to_string(), "Temp 36.5C, BP 120/80, HR 75, SpO2 98%");
    }

    #[test]
    fn accepts_integer_json_numbers() {
        let vitals: Vitals = serde_json::from_str(
            r#"{"temp":37,"bpSystolic":110,"bpDiastolic":70,"pulse":80,"oxygen":99}"#,
        )
        .expect("integer values should deserialise");
        assert_eq!(vitals.temp, 37.0);
    }
}
