use serde::{Deserialize, Serialize};

/// The restaurant locations served by this deployment. Each one is a tenant
/// with its own database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Location {
    Becker,
    Tempe,
    Downtown,
    NorthScottsdale,
}

impl Location {
    pub const ALL: [Location; 4] = [
        Location::Becker,
        Location::Tempe,
        Location::Downtown,
        Location::NorthScottsdale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Becker => "becker",
            Location::Tempe => "tempe",
            Location::Downtown => "downtown",
            Location::NorthScottsdale => "north-scottsdale",
        }
    }

    /// Name of the environment variable holding this location's connection string.
    pub fn env_var(&self) -> &'static str {
        match self {
            Location::Becker => "DATABASE_URL_BECKER",
            Location::Tempe => "DATABASE_URL_TEMPE",
            Location::Downtown => "DATABASE_URL_DOWNTOWN",
            Location::NorthScottsdale => "DATABASE_URL_NORTH_SCOTTSDALE",
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::ALL
            .into_iter()
            .find(|location| location.as_str() == s)
            .ok_or_else(|| format!("Invalid location: {}", s))
    }
}
