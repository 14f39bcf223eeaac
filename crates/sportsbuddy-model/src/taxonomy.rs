use serde::{Deserialize, Serialize};

/// A city and its areas. Area names are unique within a city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// Unique city name.
    pub name: String,
    /// Area names; order carries no meaning.
    #[serde(default)]
    pub areas: Vec<String>,
}

impl City {
    /// A city with no areas.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            areas: Vec::new(),
        }
    }

    /// True if the city lists `area`.
    pub fn has_area(&self, area: &str) -> bool {
        self.areas.iter().any(|a| a == area)
    }

    /// Inserts `area` unless already present. Returns whether it was added.
    pub fn insert_area(&mut self, area: &str) -> bool {
        if self.has_area(area) {
            return false;
        }
        self.areas.push(area.to_string());
        true
    }

    /// Removes `area` if present. Returns whether it was removed.
    pub fn remove_area(&mut self, area: &str) -> bool {
        let before = self.areas.len();
        self.areas.retain(|a| a != area);
        self.areas.len() != before
    }
}

/// Categories seeded into an empty local store.
pub fn default_categories() -> Vec<String> {
    [
        "Football",
        "Cricket",
        "Badminton",
        "Baseball",
        "Boxing",
        "Golf",
        "Tennis",
        "Table Tennis",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Cities seeded into an empty local store.
pub fn default_cities() -> Vec<City> {
    vec![
        City {
            name: "Ahmedabad".to_string(),
            areas: [
                "Navrangpura",
                "Maninagar",
                "Isanpur",
                "Narol",
                "Shivranjani",
                "Nehrunagar",
                "Gota",
                "Chandkheda",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        },
        City {
            name: "Surat".to_string(),
            areas: vec!["Adajan".to_string(), "Vesu".to_string()],
        },
    ]
}
