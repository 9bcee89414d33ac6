//! Endpoint registry
//!
//! Static table mapping every exposed operation to the plugin method it
//! calls, its HTTP route, and the parameters it takes. Both surfaces build
//! their routes and tools from this table.

use dspbridge_protocol::params::{PLANET_ID, TIME_LEVEL};
use dspbridge_protocol::{parse_id, MethodName, QueryParams};
use serde_json::{json, Value};

/// Route segment that captures a planet id
const PLANET_SEGMENT: &str = "{planetId}";

/// Highest production statistics window (0=1m, 1=10m, 2=1h, 3=10h, 4=100h, 5=all)
pub const MAX_TIME_LEVEL: i64 = 5;

/// Parameters an endpoint accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    /// No arguments
    None,
    /// Required planet id
    Planet,
    /// Optional planet id (-1 or absent for all planets) and time window
    Production,
}

impl ParamShape {
    /// JSON Schema for MCP tool arguments
    pub fn input_schema(&self) -> Value {
        match self {
            Self::None => json!({
                "type": "object",
                "properties": {}
            }),
            Self::Planet => json!({
                "type": "object",
                "properties": {
                    PLANET_ID: {
                        "type": "integer",
                        "description": "Planet ID (see list_planets)"
                    }
                },
                "required": [PLANET_ID]
            }),
            Self::Production => json!({
                "type": "object",
                "properties": {
                    PLANET_ID: {
                        "type": "integer",
                        "description": "Planet ID, or -1 for the whole galaxy (default: -1)"
                    },
                    TIME_LEVEL: {
                        "type": "integer",
                        "minimum": 0,
                        "maximum": MAX_TIME_LEVEL,
                        "description": "Statistics window: 0=1m, 1=10m, 2=1h, 3=10h, 4=100h, 5=all time (default: 0)"
                    }
                }
            }),
        }
    }

    /// Build parameters from MCP tool arguments
    ///
    /// Unknown arguments are ignored.
    pub fn parse_arguments(&self, args: &Value) -> Result<QueryParams, String> {
        let field = |key: &str| args.get(key).filter(|v| !v.is_null());
        match self {
            Self::None => Ok(QueryParams::None),
            Self::Planet => field(PLANET_ID)
                .and_then(parse_id)
                .map(QueryParams::planet)
                .ok_or_else(missing_planet),
            Self::Production => production(
                field(PLANET_ID).map(|v| parse_id(v).ok_or(PLANET_ID)),
                field(TIME_LEVEL).map(|v| parse_id(v).ok_or(TIME_LEVEL)),
            ),
        }
    }

    /// Build parameters from an HTTP path capture and query string pairs
    pub fn parse_request(
        &self,
        planet_segment: Option<&str>,
        query: &[(String, String)],
    ) -> Result<QueryParams, String> {
        let field = |key: &str| {
            query
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.trim().parse::<i64>())
        };
        match self {
            Self::None => Ok(QueryParams::None),
            Self::Planet => planet_segment
                .and_then(|s| s.parse::<i64>().ok())
                .map(QueryParams::planet)
                .ok_or_else(missing_planet),
            Self::Production => production(
                field(PLANET_ID).map(|r| r.map_err(|_| PLANET_ID)),
                field(TIME_LEVEL).map(|r| r.map_err(|_| TIME_LEVEL)),
            ),
        }
    }
}

fn missing_planet() -> String {
    format!("Missing or invalid '{}' parameter", PLANET_ID)
}

/// Combine optional production fields, checking the time window
fn production(
    planet_id: Option<Result<i64, &str>>,
    time_level: Option<Result<i64, &str>>,
) -> Result<QueryParams, String> {
    let invalid = |key: &str| format!("Invalid '{}' parameter", key);
    let planet_id = planet_id.transpose().map_err(invalid)?;
    let time_level = time_level.transpose().map_err(invalid)?;

    if let Some(level) = time_level {
        if !(0..=MAX_TIME_LEVEL).contains(&level) {
            return Err(format!(
                "'{}' must be between 0 and {}",
                TIME_LEVEL, MAX_TIME_LEVEL
            ));
        }
    }

    Ok(QueryParams::Production {
        planet_id,
        time_level,
    })
}

/// One exposed operation
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    /// Plugin method, also the MCP tool name
    pub method: &'static str,
    /// HTTP route; `{planetId}` captures one segment
    pub route: &'static str,
    /// Human-readable description for tool listings
    pub description: &'static str,
    /// Accepted parameters
    pub shape: ParamShape,
}

impl Endpoint {
    /// Plugin method name
    pub fn method_name(&self) -> MethodName {
        MethodName::from_static(self.method)
    }
}

/// Every operation exposed over HTTP and MCP
pub static ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        method: "ping",
        route: "/api/ping",
        description: "Check that the game plugin is reachable.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "get_game_info",
        route: "/api/info",
        description: "Get basic game info: version, current planet, and star count.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "list_methods",
        route: "/api/methods",
        description: "List the query methods the game plugin supports.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "get_research_progress",
        route: "/api/research",
        description: "Get current research tech, progress percentage, and total hash rate.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "get_research_by_planet",
        route: "/api/research/by-planet",
        description: "Get research hash rate by planet, with lab counts, working/idle labs, and hash/sec per planet.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "get_tech_queue",
        route: "/api/research/tech-queue",
        description: "Get the research queue with progress on each queued technology.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "get_upgrades",
        route: "/api/research/upgrades",
        description: "Get mecha upgrades, research speed multipliers, logistics capacities, and Dyson sphere unlocks.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "list_planets",
        route: "/api/planets",
        description: "List all planets with basic details.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "get_planet_resources",
        route: "/api/planets/{planetId}/resources",
        description: "Get resource veins and amounts for one planet.",
        shape: ParamShape::Planet,
    },
    Endpoint {
        method: "get_lab_details",
        route: "/api/planets/{planetId}/labs",
        description: "Get every lab on one planet with its research speed and the tech being researched.",
        shape: ParamShape::Planet,
    },
    Endpoint {
        method: "get_ils_details",
        route: "/api/planets/{planetId}/ils",
        description: "Get detailed state for every Interstellar Logistics Station on one planet.",
        shape: ParamShape::Planet,
    },
    Endpoint {
        method: "get_power_grids_by_planet",
        route: "/api/planets/{planetId}/power",
        description: "Get generation, consumption, and storage for each power network on one planet.",
        shape: ParamShape::Planet,
    },
    Endpoint {
        method: "get_assembler_details",
        route: "/api/planets/{planetId}/assemblers",
        description: "Get assemblers on one planet grouped by recipe, with working and idle counts.",
        shape: ParamShape::Planet,
    },
    Endpoint {
        method: "get_stars",
        route: "/api/stars",
        description: "List all stars with details.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "get_galaxy_details",
        route: "/api/galaxy",
        description: "Get galaxy-wide details and statistics.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "list_ils_per_planet",
        route: "/api/ils",
        description: "List Interstellar Logistics Stations grouped by planet, with drones, ships, warpers, energy, and item storage modes.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "get_power_grid_status",
        route: "/api/power",
        description: "Get galaxy-wide power generation and consumption.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "get_ships",
        route: "/api/ships",
        description: "List logistics vessels in flight with their cargo and routes.",
        shape: ParamShape::None,
    },
    Endpoint {
        method: "get_production_stats",
        route: "/api/production",
        description: "Get per-item production and consumption rates per minute for one planet or the whole galaxy.",
        shape: ParamShape::Production,
    },
];

/// Find the endpoint for an MCP tool name
pub fn find_tool(name: &str) -> Option<&'static Endpoint> {
    ENDPOINTS.iter().find(|e| e.method == name)
}

/// Matched HTTP route
#[derive(Debug, Clone, Copy)]
pub struct RouteMatch<'a> {
    /// Endpoint the path belongs to
    pub endpoint: &'static Endpoint,
    /// Raw `{planetId}` capture, if the route has one
    pub planet_segment: Option<&'a str>,
}

impl RouteMatch<'_> {
    /// Build dispatch parameters for this request
    pub fn params(&self, query: &[(String, String)]) -> Result<QueryParams, String> {
        self.endpoint.shape.parse_request(self.planet_segment, query)
    }
}

/// Match a request path against the registry, segment by segment
///
/// A trailing slash is ignored.
pub fn match_route(path: &str) -> Option<RouteMatch<'_>> {
    let path = path.strip_suffix('/').filter(|p| !p.is_empty()).unwrap_or(path);

    ENDPOINTS.iter().find_map(|endpoint| {
        let mut route = endpoint.route.split('/');
        let mut segments = path.split('/');
        let mut planet_segment = None;

        loop {
            match (route.next(), segments.next()) {
                (None, None) => {
                    return Some(RouteMatch {
                        endpoint,
                        planet_segment,
                    })
                }
                (Some(PLANET_SEGMENT), Some(segment)) if !segment.is_empty() => {
                    planet_segment = Some(segment);
                }
                (Some(expected), Some(segment)) if expected == segment => {}
                _ => return None,
            }
        }
    })
}
