//! Feature Key Module
//! Typed age/ethnicity/cause codes and the composite column key built from them.

use serde::Serialize;

/// Age bracket codes used by the cause-of-death table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeGroup {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 6] = [
        AgeGroup::A,
        AgeGroup::B,
        AgeGroup::C,
        AgeGroup::D,
        AgeGroup::E,
        AgeGroup::F,
    ];

    pub fn code(self) -> &'static str {
        match self {
            AgeGroup::A => "A",
            AgeGroup::B => "B",
            AgeGroup::C => "C",
            AgeGroup::D => "D",
            AgeGroup::E => "E",
            AgeGroup::F => "F",
        }
    }

    /// Human-readable bracket for selector widgets.
    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::A => "Under 1 Years Old",
            AgeGroup::B => "1 - 14 Years Old",
            AgeGroup::C => "15 - 24 Years Old",
            AgeGroup::D => "25 - 44 Years Old",
            AgeGroup::E => "45 - 64 Years Old",
            AgeGroup::F => "65+ Years Old",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.code() == code)
    }

    pub fn options() -> Vec<SelectorOption> {
        Self::ALL.iter().map(|a| a.option()).collect()
    }

    fn option(self) -> SelectorOption {
        SelectorOption {
            label: self.label(),
            value: self.code(),
        }
    }
}

/// Ethnicity codes used by the cause-of-death table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ethnicity {
    Wh,
    Bl,
    Hi,
    Ot,
}

impl Ethnicity {
    pub const ALL: [Ethnicity; 4] = [Ethnicity::Wh, Ethnicity::Bl, Ethnicity::Hi, Ethnicity::Ot];

    pub fn code(self) -> &'static str {
        match self {
            Ethnicity::Wh => "Wh",
            Ethnicity::Bl => "Bl",
            Ethnicity::Hi => "Hi",
            Ethnicity::Ot => "Ot",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Ethnicity::Wh => "White",
            Ethnicity::Bl => "Black",
            Ethnicity::Hi => "Hispanic",
            Ethnicity::Ot => "Other",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }

    pub fn options() -> Vec<SelectorOption> {
        Self::ALL
            .iter()
            .map(|e| SelectorOption {
                label: e.label(),
                value: e.code(),
            })
            .collect()
    }
}

/// Cause-of-death family codes used by the cause-of-death table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cause {
    Comp,
    BirthDef,
    Injury,
    Suicide,
    Cancer,
    Homicide,
    HeartDis,
    Hiv,
}

impl Cause {
    pub const ALL: [Cause; 8] = [
        Cause::Comp,
        Cause::BirthDef,
        Cause::Injury,
        Cause::Suicide,
        Cause::Cancer,
        Cause::Homicide,
        Cause::HeartDis,
        Cause::Hiv,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Cause::Comp => "Comp",
            Cause::BirthDef => "BirthDef",
            Cause::Injury => "Injury",
            Cause::Suicide => "Suicide",
            Cause::Cancer => "Cancer",
            Cause::Homicide => "Homicide",
            Cause::HeartDis => "HeartDis",
            Cause::Hiv => "HIV",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Cause::Comp => "Birth Complication",
            Cause::BirthDef => "Birth Defect",
            Cause::Injury => "Injury",
            Cause::Suicide => "Suicide",
            Cause::Cancer => "Cancer",
            Cause::Homicide => "Homicide",
            Cause::HeartDis => "Heart Disease",
            Cause::Hiv => "HIV",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    pub fn options() -> Vec<SelectorOption> {
        Self::ALL
            .iter()
            .map(|c| SelectorOption {
                label: c.label(),
                value: c.code(),
            })
            .collect()
    }
}

/// One dropdown entry handed to the chart layer.
#[derive(Debug, Clone, Serialize)]
pub struct SelectorOption {
    pub label: &'static str,
    pub value: &'static str,
}

/// Composite `<age>_<ethnicity>_<cause>` key addressing one rate column.
///
/// Not every combination exists as a column; callers check
/// `Dataset::has_column` before looking one up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureKey {
    pub age: AgeGroup,
    pub ethnicity: Ethnicity,
    pub cause: Cause,
}

impl FeatureKey {
    pub fn new(age: AgeGroup, ethnicity: Ethnicity, cause: Cause) -> Self {
        Self {
            age,
            ethnicity,
            cause,
        }
    }

    /// The column name this key addresses, e.g. `D_Wh_Homicide`.
    pub fn column_name(&self) -> String {
        format!(
            "{}_{}_{}",
            self.age.code(),
            self.ethnicity.code(),
            self.cause.code()
        )
    }

    /// Parse a column name into its three typed components.
    ///
    /// The name must consist of exactly an age code, an ethnicity code and a
    /// cause code joined by underscores; anything else (identity columns,
    /// confidence-interval columns) returns `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let mut parts = name.splitn(3, '_');
        let age = AgeGroup::from_code(parts.next()?)?;
        let ethnicity = Ethnicity::from_code(parts.next()?)?;
        let cause = Cause::from_code(parts.next()?)?;
        Some(Self {
            age,
            ethnicity,
            cause,
        })
    }
}
