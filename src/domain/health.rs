use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorName {
    Default,
    Fallback,
}

impl ProcessorName {
    pub const ALL: [ProcessorName; 2] = [ProcessorName::Default, ProcessorName::Fallback];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorName::Default => "default",
            ProcessorName::Fallback => "fallback",
        }
    }

    /// Slot of this processor in a two-entry lookup table.
    pub fn index(&self) -> usize {
        match self {
            ProcessorName::Default => 0,
            ProcessorName::Fallback => 1,
        }
    }
}

impl fmt::Display for ProcessorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessorName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(ProcessorName::Default),
            "fallback" => Ok(ProcessorName::Fallback),
            other => Err(anyhow::anyhow!("unknown processor name: {}", other)),
        }
    }
}

/// Latest health sample reported by a processor's service-health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorHealth {
    pub failing: bool,
    #[serde(rename = "minResponseTime")]
    pub min_response_time_ms: u64,
}

impl ProcessorHealth {
    pub fn healthy(min_response_time_ms: u64) -> Self {
        Self {
            failing: false,
            min_response_time_ms,
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            min_response_time_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names_only() {
        assert_eq!("default".parse::<ProcessorName>().unwrap(), ProcessorName::Default);
        assert_eq!("fallback".parse::<ProcessorName>().unwrap(), ProcessorName::Fallback);
        assert!("Default".parse::<ProcessorName>().is_err());
        assert!("".parse::<ProcessorName>().is_err());
    }

    #[test]
    fn health_uses_upstream_field_names() {
        let h: ProcessorHealth =
            serde_json::from_str(r#"{"failing":true,"minResponseTime":120}"#).unwrap();
        assert!(h.failing);
        assert_eq!(h.min_response_time_ms, 120);
    }
}
