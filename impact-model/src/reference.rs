//! Reference data published by the service: activities, countries,
//! currencies, industries and regions.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An activity category within an industry. Breakdown rows must reference
/// one of these by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Activity {
    pub id: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub industry: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Activities {
    #[cfg_attr(feature = "serde", serde(default))]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Country {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Countries {
    #[cfg_attr(feature = "serde", serde(default))]
    pub countries: Vec<Country>,
}

impl Countries {
    /// Case-insensitive lookup by display name.
    pub fn by_name(&self, name: &str) -> Option<&Country> {
        self.countries
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn by_code(&self, code: &str) -> Option<&Country> {
        self.countries
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Currency {
    pub code: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub symbol: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Currencies {
    #[cfg_attr(feature = "serde", serde(default))]
    pub currencies: Vec<Currency>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Industries {
    #[cfg_attr(feature = "serde", serde(default))]
    pub industries: Vec<String>,
}

impl Industries {
    /// First industry whose name contains `keyword`, ignoring case.
    pub fn find_containing(&self, keyword: &str) -> Option<&str> {
        let needle = keyword.to_lowercase();
        self.industries
            .iter()
            .find(|i| i.to_lowercase().contains(&needle))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub countries: Vec<Country>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Regions {
    #[cfg_attr(feature = "serde", serde(default))]
    pub regions: Vec<Region>,
}
