//! Typed parameter bag for dispatch calls
//!
//! Every query the plugin understands takes one of a handful of parameter
//! shapes. [`QueryParams`] names those shapes explicitly and serializes them
//! onto the wire as the flat camelCase object the plugin expects.

use serde_json::{Map, Value};

/// Wire key for a planet identifier
pub const PLANET_ID: &str = "planetId";
/// Wire key for an item identifier
pub const ITEM_ID: &str = "itemId";
/// Wire key for a logistics station identifier
pub const STATION_ID: &str = "stationId";
/// Wire key for a production statistics time window
pub const TIME_LEVEL: &str = "timeLevel";

/// Errors decoding a parameter bag from untyped JSON
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("Parameters must be a JSON object")]
    NotAnObject,
}

/// Keys the dispatcher knows about; anything else is dropped on decode
const KNOWN_KEYS: [&str; 4] = [PLANET_ID, ITEM_ID, STATION_ID, TIME_LEVEL];

/// Parameters for a single dispatch call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueryParams {
    /// No arguments
    #[default]
    None,
    /// Scoped to one planet
    Planet { planet_id: i64 },
    /// Scoped to one item type
    Item { item_id: i64 },
    /// Scoped to one logistics station on a planet
    Station { planet_id: i64, station_id: i64 },
    /// Production statistics window; a missing planet means galaxy-wide
    Production {
        planet_id: Option<i64>,
        time_level: Option<i64>,
    },
    /// Known keys in a combination no typed shape covers, or with values
    /// that are not integers; sent exactly as received
    Raw(Map<String, Value>),
}

impl QueryParams {
    /// Planet-scoped parameters
    pub fn planet(planet_id: i64) -> Self {
        Self::Planet { planet_id }
    }

    /// Item-scoped parameters
    pub fn item(item_id: i64) -> Self {
        Self::Item { item_id }
    }

    /// Identifier used to select a scoped fixture file, if any
    pub fn scope_id(&self) -> Option<i64> {
        match *self {
            Self::None => None,
            Self::Planet { planet_id } | Self::Station { planet_id, .. } => Some(planet_id),
            Self::Item { item_id } => Some(item_id),
            Self::Production { planet_id, .. } => planet_id,
            Self::Raw(ref map) => [PLANET_ID, ITEM_ID]
                .iter()
                .find_map(|key| map.get(*key).and_then(parse_id)),
        }
    }

    /// Whether there are no arguments to send
    pub fn is_empty(&self) -> bool {
        self.to_wire().is_empty()
    }

    /// Flat wire object (empty when there are no arguments)
    pub fn to_wire(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match *self {
            Self::None => {}
            Self::Raw(ref raw) => map.clone_from(raw),
            Self::Planet { planet_id } => {
                map.insert(PLANET_ID.into(), planet_id.into());
            }
            Self::Item { item_id } => {
                map.insert(ITEM_ID.into(), item_id.into());
            }
            Self::Station {
                planet_id,
                station_id,
            } => {
                map.insert(PLANET_ID.into(), planet_id.into());
                map.insert(STATION_ID.into(), station_id.into());
            }
            Self::Production {
                planet_id,
                time_level,
            } => {
                if let Some(planet_id) = planet_id {
                    map.insert(PLANET_ID.into(), planet_id.into());
                }
                if let Some(time_level) = time_level {
                    map.insert(TIME_LEVEL.into(), time_level.into());
                }
            }
        }
        map
    }

    /// Wire object as a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_wire())
    }

    /// Decode from an untyped JSON object
    ///
    /// Unknown keys and `null` values are dropped; known keys are never
    /// lost. Integer values (or strings holding one) in a combination that
    /// matches a typed shape decode to that shape; anything else is kept
    /// verbatim as [`QueryParams::Raw`]. `null` decodes to
    /// [`QueryParams::None`].
    pub fn from_wire(value: &Value) -> Result<Self, ParamError> {
        let map = match value {
            Value::Null => return Ok(Self::None),
            Value::Object(map) => map,
            _ => return Err(ParamError::NotAnObject),
        };

        let known: Map<String, Value> = map
            .iter()
            .filter(|(key, value)| KNOWN_KEYS.contains(&key.as_str()) && !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self::typed(&known).unwrap_or(Self::Raw(known)))
    }

    /// The typed shape carrying exactly these keys, if every value is an
    /// integer
    fn typed(known: &Map<String, Value>) -> Option<Self> {
        let mut ids = [None; 4];
        for (slot, key) in ids.iter_mut().zip(KNOWN_KEYS) {
            if let Some(value) = known.get(key) {
                *slot = Some(parse_id(value)?);
            }
        }

        match ids {
            [None, None, None, None] => Some(Self::None),
            [Some(planet_id), None, None, None] => Some(Self::Planet { planet_id }),
            [None, Some(item_id), None, None] => Some(Self::Item { item_id }),
            [Some(planet_id), None, Some(station_id), None] => Some(Self::Station {
                planet_id,
                station_id,
            }),
            [planet_id, None, None, time_level @ Some(_)] => Some(Self::Production {
                planet_id,
                time_level,
            }),
            _ => None,
        }
    }

    /// Decode from string key/value pairs (e.g. an HTTP query string)
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let map: Map<String, Value> = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        Self::from_wire(&Value::Object(map))
    }
}

/// Parse an integer from a JSON number or numeric string
pub fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
