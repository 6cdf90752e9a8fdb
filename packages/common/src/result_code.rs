#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome the grading subsystem attached to a single problem attempt.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum ResultCode {
    #[serde(rename = "AC")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "AC"))]
    Accepted,
    #[serde(rename = "WA")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "WA"))]
    WrongAnswer,
    #[serde(rename = "TLE")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "TLE"))]
    TimeLimitExceeded,
    #[serde(rename = "MLE")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "MLE"))]
    MemoryLimitExceeded,
    #[serde(rename = "OLE")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "OLE"))]
    OutputLimitExceeded,
    #[serde(rename = "IR")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "IR"))]
    InvalidReturn,
    #[serde(rename = "RTE")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "RTE"))]
    RuntimeError,
    /// Never counted against the contestant by penalty-based formats.
    #[serde(rename = "CE")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "CE"))]
    CompilationError,
    /// Judge-side failure. Never counted against the contestant.
    #[serde(rename = "IE")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "IE"))]
    InternalError,
    #[serde(rename = "SC")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SC"))]
    ShortCircuit,
    #[serde(rename = "AB")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "AB"))]
    Aborted,
}

impl ResultCode {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Returns true if a penalty-based format should charge this attempt.
    pub fn is_penalized(&self) -> bool {
        !matches!(
            self,
            Self::Accepted | Self::CompilationError | Self::InternalError
        )
    }

    /// All possible result codes.
    pub const ALL: &'static [ResultCode] = &[
        Self::Accepted,
        Self::WrongAnswer,
        Self::TimeLimitExceeded,
        Self::MemoryLimitExceeded,
        Self::OutputLimitExceeded,
        Self::InvalidReturn,
        Self::RuntimeError,
        Self::CompilationError,
        Self::InternalError,
        Self::ShortCircuit,
        Self::Aborted,
    ];

    /// Returns the short judge code (`AC`, `WA`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "AC",
            Self::WrongAnswer => "WA",
            Self::TimeLimitExceeded => "TLE",
            Self::MemoryLimitExceeded => "MLE",
            Self::OutputLimitExceeded => "OLE",
            Self::InvalidReturn => "IR",
            Self::RuntimeError => "RTE",
            Self::CompilationError => "CE",
            Self::InternalError => "IE",
            Self::ShortCircuit => "SC",
            Self::Aborted => "AB",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid result code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResultCodeError {
    invalid: String,
}

impl fmt::Display for ParseResultCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid result code '{}'. Valid values: {}",
            self.invalid,
            ResultCode::ALL
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseResultCodeError {}

impl FromStr for ResultCode {
    type Err = ParseResultCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResultCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| ParseResultCodeError {
                invalid: s.to_string(),
            })
    }
}
