//! Continent buckets and the country → continent table

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Continent {
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "South America")]
    SouthAmerica,
    Asia,
    Europe,
    Oceania,
    Africa,
}

impl Continent {
    pub const ALL: [Continent; 6] = [
        Continent::NorthAmerica,
        Continent::SouthAmerica,
        Continent::Asia,
        Continent::Europe,
        Continent::Oceania,
        Continent::Africa,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Continent::NorthAmerica => "North America",
            Continent::SouthAmerica => "South America",
            Continent::Asia => "Asia",
            Continent::Europe => "Europe",
            Continent::Oceania => "Oceania",
            Continent::Africa => "Africa",
        }
    }

    /// Exact-name lookup; anything else is not a stacking bucket
    pub fn from_name(name: &str) -> Option<Self> {
        Continent::ALL.into_iter().find(|c| c.name() == name.trim())
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

use Continent::*;

/// Canonical country name → continent
const BUILTIN: &[(&str, Continent)] = &[
    // North America
    ("Antigua and Barbuda", NorthAmerica),
    ("Bahamas", NorthAmerica),
    ("Barbados", NorthAmerica),
    ("Belize", NorthAmerica),
    ("Canada", NorthAmerica),
    ("Costa Rica", NorthAmerica),
    ("Cuba", NorthAmerica),
    ("Dominica", NorthAmerica),
    ("Dominican Republic", NorthAmerica),
    ("Dominican Rep.", NorthAmerica),
    ("El Salvador", NorthAmerica),
    ("Greenland", NorthAmerica),
    ("Grenada", NorthAmerica),
    ("Guatemala", NorthAmerica),
    ("Haiti", NorthAmerica),
    ("Honduras", NorthAmerica),
    ("Jamaica", NorthAmerica),
    ("Mexico", NorthAmerica),
    ("Nicaragua", NorthAmerica),
    ("Panama", NorthAmerica),
    ("Puerto Rico", NorthAmerica),
    ("St. Kitts and Nevis", NorthAmerica),
    ("Saint Lucia", NorthAmerica),
    ("St. Vin. and Gren.", NorthAmerica),
    ("Trinidad and Tobago", NorthAmerica),
    ("United States", NorthAmerica),
    // South America
    ("Argentina", SouthAmerica),
    ("Bolivia", SouthAmerica),
    ("Brazil", SouthAmerica),
    ("Chile", SouthAmerica),
    ("Colombia", SouthAmerica),
    ("Ecuador", SouthAmerica),
    ("Guyana", SouthAmerica),
    ("Paraguay", SouthAmerica),
    ("Peru", SouthAmerica),
    ("Suriname", SouthAmerica),
    ("Uruguay", SouthAmerica),
    ("Venezuela", SouthAmerica),
    // Asia
    ("Afghanistan", Asia),
    ("Armenia", Asia),
    ("Azerbaijan", Asia),
    ("Bahrain", Asia),
    ("Bangladesh", Asia),
    ("Bhutan", Asia),
    ("Brunei", Asia),
    ("Cambodia", Asia),
    ("China", Asia),
    ("Cyprus", Asia),
    ("Georgia", Asia),
    ("India", Asia),
    ("Indonesia", Asia),
    ("Iran", Asia),
    ("Iraq", Asia),
    ("Israel", Asia),
    ("Japan", Asia),
    ("Jordan", Asia),
    ("Kazakhstan", Asia),
    ("Kuwait", Asia),
    ("Kyrgyzstan", Asia),
    ("Laos", Asia),
    ("Lebanon", Asia),
    ("Malaysia", Asia),
    ("Maldives", Asia),
    ("Mongolia", Asia),
    ("Myanmar", Asia),
    ("Nepal", Asia),
    ("North Korea", Asia),
    ("Oman", Asia),
    ("Pakistan", Asia),
    ("Palestine", Asia),
    ("Philippines", Asia),
    ("Qatar", Asia),
    ("Saudi Arabia", Asia),
    ("Singapore", Asia),
    ("South Korea", Asia),
    ("Sri Lanka", Asia),
    ("Syria", Asia),
    ("Taiwan", Asia),
    ("Tajikistan", Asia),
    ("Thailand", Asia),
    ("Timor-Leste", Asia),
    ("Turkey", Asia),
    ("Turkmenistan", Asia),
    ("United Arab Emirates", Asia),
    ("Uzbekistan", Asia),
    ("Vietnam", Asia),
    ("Yemen", Asia),
    // Europe
    ("Albania", Europe),
    ("Andorra", Europe),
    ("Austria", Europe),
    ("Belarus", Europe),
    ("Belgium", Europe),
    ("Bosnia and Herz.", Europe),
    ("Bulgaria", Europe),
    ("Croatia", Europe),
    ("Czechia", Europe),
    ("Denmark", Europe),
    ("Estonia", Europe),
    ("Finland", Europe),
    ("France", Europe),
    ("Germany", Europe),
    ("Greece", Europe),
    ("Hungary", Europe),
    ("Iceland", Europe),
    ("Ireland", Europe),
    ("Italy", Europe),
    ("Kosovo", Europe),
    ("Latvia", Europe),
    ("Liechtenstein", Europe),
    ("Lithuania", Europe),
    ("Luxembourg", Europe),
    ("Malta", Europe),
    ("Moldova", Europe),
    ("Monaco", Europe),
    ("Montenegro", Europe),
    ("Netherlands", Europe),
    ("North Macedonia", Europe),
    ("Norway", Europe),
    ("Poland", Europe),
    ("Portugal", Europe),
    ("Romania", Europe),
    ("Russia", Europe),
    ("San Marino", Europe),
    ("Serbia", Europe),
    ("Slovakia", Europe),
    ("Slovenia", Europe),
    ("Spain", Europe),
    ("Sweden", Europe),
    ("Switzerland", Europe),
    ("Ukraine", Europe),
    ("United Kingdom", Europe),
    ("Vatican", Europe),
    // Oceania
    ("Australia", Oceania),
    ("Fiji", Oceania),
    ("Kiribati", Oceania),
    ("Marshall Islands", Oceania),
    ("Micronesia", Oceania),
    ("New Zealand", Oceania),
    ("Palau", Oceania),
    ("Papua New Guinea", Oceania),
    ("Samoa", Oceania),
    ("Solomon Islands", Oceania),
    ("Tonga", Oceania),
    ("Vanuatu", Oceania),
    // Africa
    ("Algeria", Africa),
    ("Angola", Africa),
    ("Benin", Africa),
    ("Botswana", Africa),
    ("Burkina Faso", Africa),
    ("Burundi", Africa),
    ("Cabo Verde", Africa),
    ("Cameroon", Africa),
    ("Central African Republic", Africa),
    ("Central African Rep.", Africa),
    ("Chad", Africa),
    ("Comoros", Africa),
    ("Congo", Africa),
    ("Djibouti", Africa),
    ("Egypt", Africa),
    ("Equatorial Guinea", Africa),
    ("Eritrea", Africa),
    ("Eswatini", Africa),
    ("Ethiopia", Africa),
    ("Gabon", Africa),
    ("Gambia", Africa),
    ("Ghana", Africa),
    ("Guinea", Africa),
    ("Guinea-Bissau", Africa),
    ("Ivory Coast", Africa),
    ("Kenya", Africa),
    ("Lesotho", Africa),
    ("Liberia", Africa),
    ("Libya", Africa),
    ("Madagascar", Africa),
    ("Malawi", Africa),
    ("Mali", Africa),
    ("Mauritania", Africa),
    ("Mauritius", Africa),
    ("Morocco", Africa),
    ("Mozambique", Africa),
    ("Namibia", Africa),
    ("Niger", Africa),
    ("Nigeria", Africa),
    ("Rwanda", Africa),
    ("Sao Tome and Principe", Africa),
    ("Senegal", Africa),
    ("Seychelles", Africa),
    ("Sierra Leone", Africa),
    ("Somalia", Africa),
    ("South Africa", Africa),
    ("South Sudan", Africa),
    ("Sudan", Africa),
    ("Tanzania", Africa),
    ("Togo", Africa),
    ("Tunisia", Africa),
    ("Uganda", Africa),
    ("Western Sahara", Africa),
    ("Zambia", Africa),
    ("Zimbabwe", Africa),
];

#[derive(Debug, Deserialize)]
struct ContinentEntry {
    country: String,
    continent: String,
}

/// Country → continent name lookup
#[derive(Debug, Clone, Default)]
pub struct ContinentMap {
    by_country: HashMap<String, String>,
}

impl ContinentMap {
    pub fn builtin() -> Self {
        Self {
            by_country: BUILTIN
                .iter()
                .map(|(country, continent)| (country.to_string(), continent.name().to_string()))
                .collect(),
        }
    }

    /// Load a `[{"country": .., "continent": ..}]` table. Continent names
    /// outside the six buckets are kept but never stack.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<ContinentEntry> =
            serde_json::from_str(json).context("Failed to parse continent table")?;
        Ok(Self {
            by_country: entries
                .into_iter()
                .map(|e| (e.country, e.continent))
                .collect(),
        })
    }

    /// Continent name for a canonical country, empty when unknown
    pub fn continent_of(&self, country: &str) -> String {
        self.by_country.get(country).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_country.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_country.is_empty()
    }
}
