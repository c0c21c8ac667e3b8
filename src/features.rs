//! The thirteen clinical inputs and their fixed-order encoding.
//!
//! [`RawFeatures`] is what arrives from a form, a JSON body, a CLI or a CSV row.
//! [`Features`] can only be obtained by validating a `RawFeatures`, so every
//! value it holds is inside the bounds the form declares.

use serde::{Deserialize, Serialize};

use crate::error::{HeartRiskError, Result};

pub const FEATURE_COUNT: usize = 13;

/// Column order expected by the classifier.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Bounds {
    const fn new(min: f64, max: f64, step: f64) -> Self {
        Bounds { min, max, step }
    }

    fn check(&self, field: &'static str, value: f64) -> Result<f64> {
        // written so that NaN fails too
        if !(value >= self.min && value <= self.max) {
            return Err(HeartRiskError::OutOfRange {
                field,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value)
    }

    /// Snap onto the slider grid, staying inside the bounds.
    fn snap(&self, value: f64) -> f64 {
        let steps = ((value - self.min) / self.step).round();
        (self.min + steps / self.step.recip()).clamp(self.min, self.max)
    }
}

pub const AGE: Bounds = Bounds::new(18.0, 100.0, 1.0);
pub const RESTING_BP: Bounds = Bounds::new(94.0, 200.0, 1.0);
pub const CHOLESTEROL: Bounds = Bounds::new(126.0, 564.0, 1.0);
pub const MAX_HEART_RATE: Bounds = Bounds::new(71.0, 202.0, 1.0);
pub const ST_DEPRESSION: Bounds = Bounds::new(0.0, 6.2, 0.1);
pub const MAJOR_VESSELS: Bounds = Bounds::new(0.0, 4.0, 1.0);

/// A categorical input encoded as an integer code.
pub trait Choice: Sized + Copy + PartialEq + 'static {
    const FIELD: &'static str;
    /// Every variant, in the order the dropdown lists them.
    const ALL: &'static [Self];

    fn code(self) -> i64;
    fn label(self) -> &'static str;

    fn from_code(code: i64) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|choice| choice.code() == code)
            .ok_or(HeartRiskError::InvalidChoice {
                field: Self::FIELD,
                value: code,
            })
    }

    fn options() -> Vec<(i64, &'static str)> {
        Self::ALL.iter().map(|c| (c.code(), c.label())).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male = 1,
    Female = 0,
}

impl Choice for Sex {
    const FIELD: &'static str = "sex";
    const ALL: &'static [Self] = &[Sex::Male, Sex::Female];

    fn code(self) -> i64 {
        self as i64
    }

    fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestPain {
    TypicalAngina = 0,
    AtypicalAngina = 1,
    NonAnginalPain = 2,
    Asymptomatic = 3,
}

impl Choice for ChestPain {
    const FIELD: &'static str = "cp";
    const ALL: &'static [Self] = &[
        ChestPain::TypicalAngina,
        ChestPain::AtypicalAngina,
        ChestPain::NonAnginalPain,
        ChestPain::Asymptomatic,
    ];

    fn code(self) -> i64 {
        self as i64
    }

    fn label(self) -> &'static str {
        match self {
            ChestPain::TypicalAngina => "Typical Angina",
            ChestPain::AtypicalAngina => "Atypical Angina",
            ChestPain::NonAnginalPain => "Non-anginal Pain",
            ChestPain::Asymptomatic => "Asymptomatic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastingBloodSugar {
    Above120 = 1,
    Normal = 0,
}

impl Choice for FastingBloodSugar {
    const FIELD: &'static str = "fbs";
    const ALL: &'static [Self] = &[FastingBloodSugar::Above120, FastingBloodSugar::Normal];

    fn code(self) -> i64 {
        self as i64
    }

    fn label(self) -> &'static str {
        match self {
            FastingBloodSugar::Above120 => "Yes",
            FastingBloodSugar::Normal => "No",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestingEcg {
    Normal = 0,
    StTWaveAbnormality = 1,
    LeftVentricularHypertrophy = 2,
}

impl Choice for RestingEcg {
    const FIELD: &'static str = "restecg";
    const ALL: &'static [Self] = &[
        RestingEcg::Normal,
        RestingEcg::StTWaveAbnormality,
        RestingEcg::LeftVentricularHypertrophy,
    ];

    fn code(self) -> i64 {
        self as i64
    }

    fn label(self) -> &'static str {
        match self {
            RestingEcg::Normal => "Normal",
            RestingEcg::StTWaveAbnormality => "ST-T Wave Abnormality",
            RestingEcg::LeftVentricularHypertrophy => "Left Ventricular Hypertrophy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseAngina {
    No = 0,
    Yes = 1,
}

impl Choice for ExerciseAngina {
    const FIELD: &'static str = "exang";
    const ALL: &'static [Self] = &[ExerciseAngina::No, ExerciseAngina::Yes];

    fn code(self) -> i64 {
        self as i64
    }

    fn label(self) -> &'static str {
        match self {
            ExerciseAngina::No => "No",
            ExerciseAngina::Yes => "Yes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StSlope {
    Upsloping = 0,
    Flat = 1,
    Downsloping = 2,
}

impl Choice for StSlope {
    const FIELD: &'static str = "slope";
    const ALL: &'static [Self] = &[StSlope::Upsloping, StSlope::Flat, StSlope::Downsloping];

    fn code(self) -> i64 {
        self as i64
    }

    fn label(self) -> &'static str {
        match self {
            StSlope::Upsloping => "Upsloping",
            StSlope::Flat => "Flat",
            StSlope::Downsloping => "Downsloping",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thalassemia {
    Normal = 1,
    FixedDefect = 2,
    ReversibleDefect = 3,
}

impl Choice for Thalassemia {
    const FIELD: &'static str = "thal";
    const ALL: &'static [Self] = &[
        Thalassemia::Normal,
        Thalassemia::FixedDefect,
        Thalassemia::ReversibleDefect,
    ];

    fn code(self) -> i64 {
        self as i64
    }

    fn label(self) -> &'static str {
        match self {
            Thalassemia::Normal => "Normal",
            Thalassemia::FixedDefect => "Fixed Defect",
            Thalassemia::ReversibleDefect => "Reversible Defect",
        }
    }
}

/// Unvalidated inputs. Missing fields take the form defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFeatures {
    pub age: i64,
    pub sex: i64,
    pub cp: i64,
    pub trestbps: i64,
    pub chol: i64,
    pub fbs: i64,
    pub restecg: i64,
    pub thalach: i64,
    pub exang: i64,
    pub oldpeak: f64,
    pub slope: i64,
    pub ca: i64,
    pub thal: i64,
}

impl Default for RawFeatures {
    fn default() -> Self {
        RawFeatures {
            age: 54,
            sex: Sex::Male.code(),
            cp: ChestPain::TypicalAngina.code(),
            trestbps: 130,
            chol: 240,
            fbs: FastingBloodSugar::Normal.code(),
            restecg: RestingEcg::Normal.code(),
            thalach: 150,
            exang: ExerciseAngina::No.code(),
            oldpeak: 1.0,
            slope: StSlope::Flat.code(),
            ca: 0,
            thal: Thalassemia::Normal.code(),
        }
    }
}

impl RawFeatures {
    /// Set one input by its column name. Every input but `oldpeak` must be a whole number.
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        let field = FEATURE_NAMES
            .iter()
            .copied()
            .find(|known| *known == name)
            .ok_or_else(|| HeartRiskError::UnknownFeature {
                name: name.to_string(),
            })?;
        if field == "oldpeak" {
            self.oldpeak = value;
            return Ok(());
        }

        if !value.is_finite() || value.fract() != 0.0 {
            return Err(HeartRiskError::NotWholeNumber { field, value });
        }
        let int = value as i64;
        match field {
            "age" => self.age = int,
            "sex" => self.sex = int,
            "cp" => self.cp = int,
            "trestbps" => self.trestbps = int,
            "chol" => self.chol = int,
            "fbs" => self.fbs = int,
            "restecg" => self.restecg = int,
            "thalach" => self.thalach = int,
            "exang" => self.exang = int,
            "slope" => self.slope = int,
            "ca" => self.ca = int,
            _ => self.thal = int,
        }
        Ok(())
    }

    /// Value of one input as the classifier sees it.
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "age" => self.age as f64,
            "sex" => self.sex as f64,
            "cp" => self.cp as f64,
            "trestbps" => self.trestbps as f64,
            "chol" => self.chol as f64,
            "fbs" => self.fbs as f64,
            "restecg" => self.restecg as f64,
            "thalach" => self.thalach as f64,
            "exang" => self.exang as f64,
            "oldpeak" => self.oldpeak,
            "slope" => self.slope as f64,
            "ca" => self.ca as f64,
            "thal" => self.thal as f64,
            _ => return None,
        };
        Some(value)
    }

    pub fn from_named<'a>(values: impl IntoIterator<Item = (&'a str, f64)>) -> Result<Self> {
        let mut raw = RawFeatures::default();
        for (name, value) in values {
            raw.set(name, value)?;
        }
        Ok(raw)
    }
}

/// Validated inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    age: u8,
    sex: Sex,
    cp: ChestPain,
    trestbps: u16,
    chol: u16,
    fbs: FastingBloodSugar,
    restecg: RestingEcg,
    thalach: u16,
    exang: ExerciseAngina,
    oldpeak: f64,
    slope: StSlope,
    ca: u8,
    thal: Thalassemia,
}

impl TryFrom<RawFeatures> for Features {
    type Error = HeartRiskError;

    fn try_from(raw: RawFeatures) -> Result<Self> {
        Ok(Features {
            age: AGE.check("age", raw.age as f64)? as u8,
            sex: Sex::from_code(raw.sex)?,
            cp: ChestPain::from_code(raw.cp)?,
            trestbps: RESTING_BP.check("trestbps", raw.trestbps as f64)? as u16,
            chol: CHOLESTEROL.check("chol", raw.chol as f64)? as u16,
            fbs: FastingBloodSugar::from_code(raw.fbs)?,
            restecg: RestingEcg::from_code(raw.restecg)?,
            thalach: MAX_HEART_RATE.check("thalach", raw.thalach as f64)? as u16,
            exang: ExerciseAngina::from_code(raw.exang)?,
            oldpeak: ST_DEPRESSION.snap(ST_DEPRESSION.check("oldpeak", raw.oldpeak)?),
            slope: StSlope::from_code(raw.slope)?,
            ca: MAJOR_VESSELS.check("ca", raw.ca as f64)? as u8,
            thal: Thalassemia::from_code(raw.thal)?,
        })
    }
}

impl Features {
    /// The feature vector, in [`FEATURE_NAMES`] order.
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age as f64,
            self.sex.code() as f64,
            self.cp.code() as f64,
            self.trestbps as f64,
            self.chol as f64,
            self.fbs.code() as f64,
            self.restecg.code() as f64,
            self.thalach as f64,
            self.exang.code() as f64,
            self.oldpeak,
            self.slope.code() as f64,
            self.ca as f64,
            self.thal.code() as f64,
        ]
    }

    pub fn raw(&self) -> RawFeatures {
        RawFeatures {
            age: self.age as i64,
            sex: self.sex.code(),
            cp: self.cp.code(),
            trestbps: self.trestbps as i64,
            chol: self.chol as i64,
            fbs: self.fbs.code(),
            restecg: self.restecg.code(),
            thalach: self.thalach as i64,
            exang: self.exang.code(),
            oldpeak: self.oldpeak,
            slope: self.slope.code(),
            ca: self.ca as i64,
            thal: self.thal.code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Slider(Bounds),
    Select(Vec<(i64, &'static str)>),
}

/// How one input is presented on the form.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub name: &'static str,
    pub label: &'static str,
    pub help: Option<&'static str>,
    pub widget: Widget,
}

/// Form inputs in feature order.
pub fn inputs() -> Vec<Input> {
    fn slider(name: &'static str, label: &'static str, bounds: Bounds) -> Input {
        Input {
            name,
            label,
            help: None,
            widget: Widget::Slider(bounds),
        }
    }

    fn select<C: Choice>(label: &'static str) -> Input {
        Input {
            name: C::FIELD,
            label,
            help: None,
            widget: Widget::Select(C::options()),
        }
    }

    vec![
        Input {
            help: Some("Patient age in years"),
            ..slider("age", "Age (years)", AGE)
        },
        select::<Sex>("Sex"),
        select::<ChestPain>("Chest Pain Type"),
        slider("trestbps", "Resting Blood Pressure (mm Hg)", RESTING_BP),
        slider("chol", "Cholesterol (mg/dl)", CHOLESTEROL),
        select::<FastingBloodSugar>("Fasting Blood Sugar > 120 mg/dl"),
        select::<RestingEcg>("Resting ECG"),
        slider("thalach", "Max Heart Rate Achieved", MAX_HEART_RATE),
        select::<ExerciseAngina>("Exercise-Induced Angina"),
        slider("oldpeak", "ST Depression (oldpeak)", ST_DEPRESSION),
        select::<StSlope>("ST Segment Slope"),
        slider("ca", "Major Vessels (fluoroscopy)", MAJOR_VESSELS),
        select::<Thalassemia>("Thalassemia"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_order_does_not_depend_on_input_order() {
        let values = [
            ("age", 61.0),
            ("sex", 0.0),
            ("cp", 2.0),
            ("trestbps", 140.0),
            ("chol", 300.0),
            ("fbs", 1.0),
            ("restecg", 1.0),
            ("thalach", 120.0),
            ("exang", 1.0),
            ("oldpeak", 2.3),
            ("slope", 2.0),
            ("ca", 3.0),
            ("thal", 3.0),
        ];
        let mut reversed = values;
        reversed.reverse();
        let mut shuffled = values;
        shuffled.swap(0, 12);
        shuffled.swap(3, 9);
        shuffled.swap(5, 7);

        let expected = [
            61.0, 0.0, 2.0, 140.0, 300.0, 1.0, 1.0, 120.0, 1.0, 2.3, 2.0, 3.0, 3.0,
        ];
        for order in [values, reversed, shuffled] {
            let raw = RawFeatures::from_named(order).unwrap();
            let features = Features::try_from(raw).unwrap();
            assert_eq!(features.to_row(), expected);
        }
    }

    #[test]
    fn row_positions_match_feature_names() {
        let raw = RawFeatures {
            age: 70,
            chol: 400,
            ..RawFeatures::default()
        };
        let row = Features::try_from(raw).unwrap().to_row();
        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            assert_eq!(Some(row[i]), raw.get(name), "column {name}");
        }
    }

    #[test]
    fn defaults_match_the_form() {
        let features = Features::try_from(RawFeatures::default()).unwrap();
        assert_eq!(features.raw(), RawFeatures::default());
        assert_eq!(
            features.to_row(),
            [54.0, 1.0, 0.0, 130.0, 240.0, 0.0, 0.0, 150.0, 0.0, 1.0, 1.0, 0.0, 1.0]
        );
    }

    #[test]
    fn out_of_range_sliders_are_rejected() {
        let cases = [
            RawFeatures { age: 17, ..Default::default() },
            RawFeatures { age: 101, ..Default::default() },
            RawFeatures { trestbps: 93, ..Default::default() },
            RawFeatures { chol: 565, ..Default::default() },
            RawFeatures { thalach: 203, ..Default::default() },
            RawFeatures { oldpeak: 6.3, ..Default::default() },
            RawFeatures { oldpeak: -0.1, ..Default::default() },
            RawFeatures { oldpeak: f64::NAN, ..Default::default() },
            RawFeatures { ca: 5, ..Default::default() },
        ];
        for raw in cases {
            let err = Features::try_from(raw).unwrap_err();
            assert!(
                matches!(err, HeartRiskError::OutOfRange { .. }),
                "{raw:?} gave {err}"
            );
        }
    }

    #[test]
    fn slider_bounds_are_inclusive() {
        let low = RawFeatures {
            age: 18,
            trestbps: 94,
            chol: 126,
            thalach: 71,
            oldpeak: 0.0,
            ca: 0,
            ..Default::default()
        };
        let high = RawFeatures {
            age: 100,
            trestbps: 200,
            chol: 564,
            thalach: 202,
            oldpeak: 6.2,
            ca: 4,
            ..Default::default()
        };
        assert!(Features::try_from(low).is_ok());
        assert!(Features::try_from(high).is_ok());
    }

    #[test]
    fn unknown_choices_are_rejected() {
        // thal 0 exists in some copies of the dataset but is not offered by the form
        let err = Features::try_from(RawFeatures {
            thal: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            HeartRiskError::InvalidChoice { field: "thal", value: 0 }
        ));

        let err = Features::try_from(RawFeatures {
            cp: 4,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, HeartRiskError::InvalidChoice { field: "cp", .. }));
    }

    #[test]
    fn oldpeak_snaps_to_tenths() {
        let features = Features::try_from(RawFeatures {
            oldpeak: 1.26,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(features.to_row()[9], 1.3);
    }

    #[test]
    fn unknown_column_names_are_errors() {
        let err = RawFeatures::from_named([("bmi", 22.0)]).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn fractional_or_missing_codes_are_not_rounded() {
        for (name, value) in [("sex", f64::NAN), ("sex", 0.4), ("cp", 2.5), ("age", f64::INFINITY)] {
            let err = RawFeatures::from_named([(name, value)]).unwrap_err();
            assert!(
                matches!(err, HeartRiskError::NotWholeNumber { field, .. } if field == name),
                "{name} = {value} gave {err}"
            );
            assert!(err.is_input_error());
        }
        // oldpeak is continuous and checked later against its slider
        let raw = RawFeatures::from_named([("oldpeak", 0.4), ("cp", 2.0)]).unwrap();
        assert_eq!((raw.oldpeak, raw.cp), (0.4, 2));
    }

    #[test]
    fn inputs_follow_feature_order() {
        let names: Vec<_> = inputs().iter().map(|input| input.name).collect();
        assert_eq!(names, FEATURE_NAMES);
    }

    #[test]
    fn dropdowns_list_options_in_form_order() {
        assert_eq!(Sex::options(), vec![(1, "Male"), (0, "Female")]);
        assert_eq!(FastingBloodSugar::options(), vec![(1, "Yes"), (0, "No")]);
        assert_eq!(
            Thalassemia::options(),
            vec![(1, "Normal"), (2, "Fixed Defect"), (3, "Reversible Defect")]
        );
    }
}
