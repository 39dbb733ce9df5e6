
use std::fmt::Display;
use std::str::FromStr;

/// SAP system landscape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SapEnvironment {
    /// Quality assurance
    Qas,
    /// Production
    #[default]
    Prd,
}

impl SapEnvironment {
    /// SAP Logon connection entry for this system
    pub fn connection_name(&self) -> &'static str {
        match self {
            Self::Qas => "S/4 - QAS",
            Self::Prd => "S/4 - PRD",
        }
    }

    /// Suffix of the database environment variables (`HOST_LAB`, `HOST_RISE`, ...)
    pub fn db_env_suffix(&self) -> &'static str {
        match self {
            Self::Qas => "LAB",
            Self::Prd => "RISE",
        }
    }
}

impl FromStr for SapEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QAS" => Ok(Self::Qas),
            "PRD" => Ok(Self::Prd),
            _ => Err(format!("unknown SAP environment <{}>", s)),
        }
    }
}

impl Display for SapEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Qas => write!(f, "QAS"),
            Self::Prd => write!(f, "PRD"),
        }
    }
}
