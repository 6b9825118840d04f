//! cities_db skill - city lookup by location and population

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::skills::traits::require;
use crate::skills::{Arguments, ParamKind, Parameter, Skill, SkillError, SkillFunction};

struct City {
    name: &'static str,
    country: &'static str,
    continent: &'static str,
    population: u64,
}

/// Metropolitan populations, rounded
const CITIES: &[City] = &[
    City { name: "Tokyo", country: "Japan", continent: "Asia", population: 37_400_000 },
    City { name: "Delhi", country: "India", continent: "Asia", population: 28_500_000 },
    City { name: "Shanghai", country: "China", continent: "Asia", population: 25_600_000 },
    City { name: "Sao Paulo", country: "Brazil", continent: "South America", population: 21_700_000 },
    City { name: "Mexico City", country: "Mexico", continent: "North America", population: 21_600_000 },
    City { name: "Cairo", country: "Egypt", continent: "Africa", population: 20_100_000 },
    City { name: "Mumbai", country: "India", continent: "Asia", population: 20_000_000 },
    City { name: "New York", country: "United States", continent: "North America", population: 18_800_000 },
    City { name: "Buenos Aires", country: "Argentina", continent: "South America", population: 15_000_000 },
    City { name: "Istanbul", country: "Turkey", continent: "Europe", population: 14_800_000 },
    City { name: "Lagos", country: "Nigeria", continent: "Africa", population: 13_500_000 },
    City { name: "Moscow", country: "Russia", continent: "Europe", population: 12_400_000 },
    City { name: "Paris", country: "France", continent: "Europe", population: 10_900_000 },
    City { name: "London", country: "United Kingdom", continent: "Europe", population: 9_000_000 },
    City { name: "Madrid", country: "Spain", continent: "Europe", population: 6_500_000 },
    City { name: "Barcelona", country: "Spain", continent: "Europe", population: 5_500_000 },
    City { name: "Sydney", country: "Australia", continent: "Oceania", population: 4_900_000 },
];

/// Builder for the `cities_db` skill
pub struct CitiesSkill;

impl CitiesSkill {
    pub fn build() -> Skill {
        debug!("CitiesSkill::build: called");
        Skill::new("cities_db", "Plugin useful to retrieve cities based on some filters.").with_function(GetCities)
    }
}

struct GetCities;

/// Population constraint parsed from a filter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PopulationFilter {
    Max,
    Min,
    Greater(u64),
    GreaterEq(u64),
    Less(u64),
    LessEq(u64),
    Equal(u64),
}

impl PopulationFilter {
    fn parse(value: &Value) -> Result<Self, SkillError> {
        debug!(%value, "PopulationFilter::parse: called");
        let invalid = || SkillError::InvalidArgument(format!("Unsupported population filter: {}", value));

        let text = match value {
            Value::Number(n) => return n.as_u64().map(Self::Equal).ok_or_else(invalid),
            Value::String(s) => s.trim().to_lowercase(),
            _ => return Err(invalid()),
        };

        match text.as_str() {
            "max(population)" | "max" => return Ok(Self::Max),
            "min(population)" | "min" => return Ok(Self::Min),
            _ => {}
        }

        let (ctor, rest): (fn(u64) -> Self, &str) = if let Some(rest) = text.strip_prefix(">=") {
            (Self::GreaterEq, rest)
        } else if let Some(rest) = text.strip_prefix("<=") {
            (Self::LessEq, rest)
        } else if let Some(rest) = text.strip_prefix('>') {
            (Self::Greater, rest)
        } else if let Some(rest) = text.strip_prefix('<') {
            (Self::Less, rest)
        } else if let Some(rest) = text.strip_prefix('=') {
            (Self::Equal, rest)
        } else {
            (Self::Equal, text.as_str())
        };

        let digits: String = rest.chars().filter(|c| !matches!(c, ',' | '_' | ' ')).collect();
        digits.parse::<u64>().map(ctor).map_err(|_| invalid())
    }

    fn keeps(&self, population: u64) -> bool {
        match *self {
            Self::Greater(n) => population > n,
            Self::GreaterEq(n) => population >= n,
            Self::Less(n) => population < n,
            Self::LessEq(n) => population <= n,
            Self::Equal(n) => population == n,
            Self::Max | Self::Min => true,
        }
    }
}

fn text_filter(filter: &Map<String, Value>, key: &str) -> Result<Option<String>, SkillError> {
    match filter.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(SkillError::InvalidArgument(format!("{} filter must be text, got {}", key, other))),
    }
}

fn select(filter: &Map<String, Value>) -> Result<Vec<&'static str>, SkillError> {
    debug!(keys = ?filter.keys().collect::<Vec<_>>(), "GetCities::select: called");
    if let Some(key) = filter
        .keys()
        .find(|k| !matches!(k.as_str(), "continent" | "country" | "name" | "population"))
    {
        return Err(SkillError::InvalidArgument(format!("Unsupported filter key: {}", key)));
    }

    let continent = text_filter(filter, "continent")?;
    let country = text_filter(filter, "country")?;
    let name = text_filter(filter, "name")?;
    let population = filter.get("population").map(PopulationFilter::parse).transpose()?;

    let matches_text = |wanted: &Option<String>, actual: &str| wanted.as_ref().is_none_or(|w| w.eq_ignore_ascii_case(actual));

    let mut cities: Vec<&City> = CITIES
        .iter()
        .filter(|c| matches_text(&continent, c.continent))
        .filter(|c| matches_text(&country, c.country))
        .filter(|c| matches_text(&name, c.name))
        .filter(|c| population.is_none_or(|p| p.keeps(c.population)))
        .collect();
    cities.sort_by(|a, b| b.population.cmp(&a.population));

    let names = match population {
        Some(PopulationFilter::Max) => cities.first().map(|c| vec![c.name]).unwrap_or_default(),
        Some(PopulationFilter::Min) => cities.last().map(|c| vec![c.name]).unwrap_or_default(),
        _ => cities.iter().map(|c| c.name).collect(),
    };
    debug!(count = names.len(), "GetCities::select: matched");
    Ok(names)
}

#[async_trait]
impl SkillFunction for GetCities {
    fn name(&self) -> &'static str {
        "get_cities"
    }

    fn description(&self) -> &'static str {
        "Get the cities based on locations (for example countries or continents), population, etc.."
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter::required(
            "filter",
            ParamKind::Object,
            "filters in dict format with the information to filter. Here are some examples \
             {'population': 'max(population)', 'continent': 'Europe'}. {'population': '>5000'}",
        )]
    }

    async fn invoke(&self, args: &Arguments) -> Result<Value, SkillError> {
        debug!("GetCities::invoke: called");
        let filter = match require(args, "filter")? {
            Value::Object(map) => map.clone(),
            // Models sometimes send the filter as a JSON string
            Value::String(s) => serde_json::from_str::<Map<String, Value>>(s)
                .map_err(|e| SkillError::InvalidArgument(format!("filter is not a JSON object: {}", e)))?,
            other => {
                return Err(SkillError::InvalidArgument(format!("filter must be an object, got {}", other)));
            }
        };

        let names = select(&filter)?;
        Ok(Value::Array(names.into_iter().map(|n| Value::String(n.to_string())).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_most_populated_city_in_the_world() {
        assert_eq!(select(&filter(json!({ "population": "max(population)" }))).unwrap(), vec!["Tokyo"]);
    }

    #[test]
    fn test_most_populated_in_continent() {
        let names = select(&filter(json!({ "population": "max(population)", "continent": "europe" }))).unwrap();
        assert_eq!(names, vec!["Istanbul"]);
    }

    #[test]
    fn test_threshold_filter_sorted_by_population() {
        let names = select(&filter(json!({ "population": "> 20,000,000" }))).unwrap();
        assert_eq!(names, vec!["Tokyo", "Delhi", "Shanghai", "Sao Paulo", "Mexico City", "Cairo"]);
    }

    #[test]
    fn test_country_filter() {
        let names = select(&filter(json!({ "country": "Spain" }))).unwrap();
        assert_eq!(names, vec!["Madrid", "Barcelona"]);
    }

    #[test]
    fn test_population_filter_parse() {
        assert_eq!(PopulationFilter::parse(&json!("min(population)")).unwrap(), PopulationFilter::Min);
        assert_eq!(PopulationFilter::parse(&json!(">=5000")).unwrap(), PopulationFilter::GreaterEq(5000));
        assert_eq!(PopulationFilter::parse(&json!("<1_000")).unwrap(), PopulationFilter::Less(1000));
        assert_eq!(PopulationFilter::parse(&json!(42)).unwrap(), PopulationFilter::Equal(42));
        assert!(PopulationFilter::parse(&json!("lots")).is_err());
        assert!(PopulationFilter::parse(&json!(true)).is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = select(&filter(json!({ "climate": "warm" }))).unwrap_err();
        assert!(err.to_string().contains("climate"));
    }

    #[tokio::test]
    async fn test_invoke_accepts_stringified_filter() {
        let mut args = Arguments::new();
        args.insert("filter".to_string(), json!("{\"continent\": \"Oceania\"}"));

        let output = GetCities.invoke(&args).await.unwrap();
        assert_eq!(output, json!(["Sydney"]));
    }

    #[tokio::test]
    async fn test_invoke_requires_filter() {
        let err = GetCities.invoke(&Arguments::new()).await.unwrap_err();
        assert!(matches!(err, SkillError::MissingArgument { .. }));
    }
}
