//! Closed vocabularies used by field meta data.
//!
//! Function spaces, data types, time steps, interpolation methods, synonym
//! conventions and positive directions are fixed sets declared by the model's
//! support modules. Each is a closed enum here; parsing is case-insensitive
//! (Fortran names are) and display uses the canonical spelling.
//!
//! Vertical level markers are the exception: the set in force is read from
//! `levels_enum_mod.f90` at run time, so they are validated against a
//! [`LevelSet`] rather than a compiled-in enum.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A term that is not part of the vocabulary it was checked against
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{term}' is not a recognised {vocabulary}")]
pub struct UnknownTerm {
    pub vocabulary: &'static str,
    pub term: String,
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every member of the vocabulary, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical spelling
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownTerm;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let term = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(term))
                    .ok_or_else(|| UnknownTerm {
                        vocabulary: $label,
                        term: term.to_string(),
                    })
            }
        }
    };
}

vocabulary! {
    /// Where a field's values live on the computational grid.
    FunctionSpace, "function space" {
        W0 => "W0",
        W1 => "W1",
        W2 => "W2",
        W2V => "W2V",
        W2H => "W2H",
        W2Broken => "W2broken",
        W2Trace => "W2trace",
        W2VTrace => "W2Vtrace",
        W2HTrace => "W2Htrace",
        W3 => "W3",
        WTheta => "Wtheta",
        WChi => "Wchi",
    }
}

vocabulary! {
    /// Intrinsic type of the field's values.
    DataType, "data type" {
        Real => "REAL_TYPE",
        Integer => "INTEGER_TYPE",
        Logical => "LOGICAL_TYPE",
    }
}

vocabulary! {
    /// Cadence at which the field is updated.
    TimeStep, "time step" {
        Standard => "STANDARD_TIMESTEP",
        Radiation => "RADIATION_TIMESTEP",
    }
}

vocabulary! {
    /// Interpolation method recommended for the field.
    Interpolation, "interpolation method" {
        Bilinear => "BILINEAR",
        NearestNeighbour => "NEAREST_NEIGHBOUR",
        Conservative => "CONSERVATIVE",
    }
}

vocabulary! {
    /// External naming conventions a field may have a synonym in.
    SynonymConvention, "synonym naming convention" {
        Amip => "AMIP",
        Grib => "GRIB",
        Cf => "CF",
        Cmip6 => "CMIP6",
        Stash => "STASH",
    }
}

vocabulary! {
    /// Positive direction of a vertical axis.
    Positive, "positive direction" {
        Up => "POSITIVE_UP",
        Down => "POSITIVE_DOWN",
    }
}

/// How the points of a non-spatial dimension are defined.
///
/// Declared as `NUMERICAL` / `CATEGORICAL` in Fortran, written to JSON as the
/// name of the definition list each category carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionCategory {
    #[serde(rename = "axis_definition")]
    Numerical,
    #[serde(rename = "label_definition")]
    Categorical,
}

impl DimensionCategory {
    /// Rose value type used when the dimension has to be configured by hand
    pub fn rose_type(&self) -> &'static str {
        match self {
            DimensionCategory::Numerical => "real",
            DimensionCategory::Categorical => "character",
        }
    }
}

impl FromStr for DimensionCategory {
    type Err = UnknownTerm;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NUMERICAL" => Ok(DimensionCategory::Numerical),
            "CATEGORICAL" => Ok(DimensionCategory::Categorical),
            _ => Err(UnknownTerm {
                vocabulary: "dimension category",
                term: s.trim().to_string(),
            }),
        }
    }
}

/// Identifier of a standard vertical level, e.g. `TOP_ATMOSPHERIC_LEVEL`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelMarker(String);

impl LevelMarker {
    pub const TOP_ATMOSPHERIC: &'static str = "TOP_ATMOSPHERIC_LEVEL";
    pub const BOTTOM_ATMOSPHERIC: &'static str = "BOTTOM_ATMOSPHERIC_LEVEL";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn top_atmospheric() -> Self {
        Self::new(Self::TOP_ATMOSPHERIC)
    }

    pub fn bottom_atmospheric() -> Self {
        Self::new(Self::BOTTOM_ATMOSPHERIC)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static STANDARD_LEVELS: Lazy<LevelSet> = Lazy::new(|| {
    LevelSet::from_names([
        "TOP_ATMOSPHERIC_LEVEL",
        "BOTTOM_ATMOSPHERIC_LEVEL",
        "TOP_WET_LEVEL",
        "TOP_SOIL_LEVEL",
        "BOTTOM_SOIL_LEVEL",
    ])
});

/// The standard level markers in force for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelSet {
    markers: Vec<LevelMarker>,
}

impl LevelSet {
    /// Build a set from enumerator names, keeping their declared order
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut markers: Vec<LevelMarker> = Vec::new();
        for name in names {
            let marker = LevelMarker::new(name);
            if !markers.contains(&marker) {
                markers.push(marker);
            }
        }
        Self { markers }
    }

    /// Built-in markers used when no `levels_enum_mod.f90` is available
    pub fn standard() -> Self {
        STANDARD_LEVELS.clone()
    }

    /// Resolve a level name to its canonical marker (case-insensitive)
    pub fn resolve(&self, name: &str) -> std::result::Result<LevelMarker, UnknownTerm> {
        let term = name.trim();
        self.markers
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(term))
            .cloned()
            .ok_or_else(|| UnknownTerm {
                vocabulary: "standard level marker",
                term: term.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelMarker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl Default for LevelSet {
    fn default() -> Self {
        Self::standard()
    }
}
