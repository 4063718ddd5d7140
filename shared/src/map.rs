//! Map model and JSON loader.
//!
//! Maps are authored with a handful of relative-positioning tokens
//! ("last_right", "last_bottom", "last_y", "last_width", "last_height") so
//! zones can be laid out against the previous sibling without repeating
//! arithmetic. Tokens are resolved once, at load time, against concrete
//! floats; nothing downstream ever re-evaluates them.

use crate::enemy::EnemyVariant;
use crate::geometry::{Aabb, Vector2};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapLoadError {
    #[error("failed to read map file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse map json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("zone {zone} in area {area} has unresolvable token {token:?}")]
    UnresolvableToken {
        area: usize,
        zone: usize,
        token: String,
    },
    #[error("unknown zone type {0:?}")]
    UnknownZoneType(String),
    #[error("unknown enemy type {0:?} in spawner")]
    UnknownEnemyType(String),
}

/// A map speed in the source JSON is divided by this retune factor on load.
const SPEED_RETUNE_DIVISOR: f32 = 1.20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    Safe,
    Active,
    Exit,
    Teleport,
    Blocked,
}

impl ZoneKind {
    fn from_str(s: &str) -> Result<Self, MapLoadError> {
        Ok(match s {
            "safe" => ZoneKind::Safe,
            "active" => ZoneKind::Active,
            "exit" => ZoneKind::Exit,
            "teleport" => ZoneKind::Teleport,
            "blocked" => ZoneKind::Blocked,
            other => return Err(MapLoadError::UnknownZoneType(other.to_string())),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Spawner {
    pub radius: f32,
    pub speed: Option<f32>,
    pub min_speed: f32,
    pub max_speed: f32,
    pub count: u32,
    pub move_clockwise: bool,
    pub enemy_types: Vec<EnemyVariant>,
}

#[derive(Debug, Clone)]
pub struct Zone {
    pub kind: ZoneKind,
    pub bounds: Aabb,
    pub minimum_speed: Option<f32>,
    pub translate: Vector2,
    pub spawners: Vec<Spawner>,
}

#[derive(Debug, Clone)]
pub struct Area {
    pub x: f32,
    pub y: f32,
    pub zones: Vec<Zone>,
}

impl Area {
    pub fn width(&self) -> f32 {
        self.zones
            .iter()
            .map(|z| z.bounds.right)
            .fold(0.0, f32::max)
    }

    pub fn height(&self) -> f32 {
        self.zones
            .iter()
            .map(|z| z.bounds.bottom)
            .fold(0.0, f32::max)
    }

    pub fn world_bounds(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.x + self.width(), self.y + self.height())
    }

    pub fn zone_at(&self, x: f32, y: f32) -> Option<&Zone> {
        self.zones.iter().find(|z| z.bounds.contains_point(x - self.x, y - self.y))
    }
}

#[derive(Debug, Clone)]
pub struct MapProperties {
    pub background_color: [u8; 4],
    pub friction: f32,
}

#[derive(Debug, Clone)]
pub struct Map {
    pub name: String,
    pub properties: MapProperties,
    pub areas: Vec<Area>,
}

impl Map {
    /// The authoritative spawn point: the first Safe zone's center in the
    /// first area that has one. Scans every area rather than assuming a
    /// fixed index, so maps with few areas still resolve to somewhere safe.
    pub fn spawn_point(&self) -> Vector2 {
        for area in &self.areas {
            for zone in &area.zones {
                if zone.kind == ZoneKind::Safe {
                    let center = zone.bounds.center();
                    return Vector2::new(area.x + center.x, area.y + center.y);
                }
            }
        }
        Vector2::ZERO
    }

    pub fn area_containing(&self, x: f32, y: f32) -> Option<usize> {
        self.areas.iter().position(|a| a.world_bounds().contains_point(x, y))
    }

    /// Index of the area whose bounds are closest to `(x, y)`, preferring an
    /// area that actually contains the point.
    pub fn closest_area(&self, x: f32, y: f32) -> usize {
        let mut closest = 0;
        let mut min_dist = f32::MAX;
        for (i, area) in self.areas.iter().enumerate() {
            let bounds = area.world_bounds();
            if bounds.contains_point(x, y) {
                return i;
            }
            let dist = bounds.distance_squared(x, y);
            if dist < min_dist {
                min_dist = dist;
                closest = i;
            }
        }
        closest
    }

    /// Resolves an entity's position against map geometry, repositioning it
    /// out of disallowed zones. `is_enemy` selects which zone kinds repel:
    /// players are blocked by `Blocked`, enemies are repelled from `Safe`
    /// and `Exit`.
    pub fn resolve(&self, x: f32, y: f32, radius: f32, is_enemy: bool) -> (f32, f32, bool) {
        let area_idx = match self.area_containing(x, y) {
            Some(i) => i,
            None => {
                let i = self.closest_area(x, y);
                let area = &self.areas[i];
                let target = area
                    .zones
                    .iter()
                    .find(|z| z.kind == ZoneKind::Safe)
                    .or_else(|| area.zones.iter().find(|z| z.kind != ZoneKind::Blocked))
                    .map(|z| z.bounds.center())
                    .unwrap_or(Vector2::ZERO);
                return (area.x + target.x, area.y + target.y, true);
            }
        };
        let area = &self.areas[area_idx];

        let clamped_x = x.max(area.x + radius).min(area.x + area.width() - radius);
        let clamped_y = y.max(area.y + radius).min(area.y + area.height() - radius);
        let mut adjusted = clamped_x != x || clamped_y != y;
        let mut cx = clamped_x;
        let mut cy = clamped_y;

        for zone in &area.zones {
            let repels = if is_enemy {
                zone.kind == ZoneKind::Safe || zone.kind == ZoneKind::Exit
            } else {
                zone.kind == ZoneKind::Blocked
            };
            if !repels {
                continue;
            }
            let world_bounds = Aabb::new(
                area.x + zone.bounds.left,
                area.y + zone.bounds.top,
                area.x + zone.bounds.right,
                area.y + zone.bounds.bottom,
            );
            let res = crate::geometry::resolve_circle_aabb(cx, cy, radius, &world_bounds, 0.1);
            if res.adjusted {
                cx = res.x;
                cy = res.y;
                adjusted = true;
            }
        }

        (cx, cy, adjusted)
    }

    pub fn load_from_path(path: &std::path::Path) -> Result<Map, MapLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| MapLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Map, MapLoadError> {
        let raw: RawMap = serde_json::from_str(text)?;
        raw.resolve()
    }

    /// A minimal built-in map used when no map path is given or the given
    /// path fails to load: one area, one Safe zone spanning a modest world
    /// rectangle, no enemies.
    pub fn fallback() -> Map {
        Map {
            name: "fallback".to_string(),
            properties: MapProperties {
                background_color: [20, 20, 20, 255],
                friction: 1.0,
            },
            areas: vec![Area {
                x: 0.0,
                y: 0.0,
                zones: vec![Zone {
                    kind: ZoneKind::Safe,
                    bounds: Aabb::new(0.0, 0.0, 800.0, 600.0),
                    minimum_speed: None,
                    translate: Vector2::ZERO,
                    spawners: vec![],
                }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenOrNumber {
    Number(f32),
    Token(String),
}

#[derive(Debug, Deserialize)]
struct RawVector {
    x: f32,
    y: f32,
}

#[derive(Debug, Deserialize, Default)]
struct RawZoneProperties {
    minimum_speed: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RawSpawner {
    radius: f32,
    #[serde(default)]
    speed: Option<f32>,
    #[serde(default)]
    min_speed: Option<f32>,
    #[serde(default)]
    max_speed: Option<f32>,
    count: u32,
    #[serde(default)]
    move_clockwise: bool,
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawZone {
    #[serde(rename = "type")]
    kind: String,
    x: TokenOrNumber,
    y: TokenOrNumber,
    width: TokenOrNumber,
    height: TokenOrNumber,
    #[serde(default)]
    properties: RawZoneProperties,
    #[serde(default)]
    translate: Option<RawVector>,
    #[serde(default)]
    spawner: Vec<RawSpawner>,
    #[serde(default)]
    spawners: Vec<RawSpawner>,
}

#[derive(Debug, Deserialize)]
struct RawArea {
    x: TokenOrNumber,
    y: TokenOrNumber,
    zones: Vec<RawZone>,
}

#[derive(Debug, Deserialize, Default)]
struct RawMapProperties {
    #[serde(default)]
    background_color: Vec<u8>,
    #[serde(default = "default_friction")]
    friction: f32,
}

fn default_friction() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
struct RawMap {
    name: String,
    #[serde(default)]
    properties: RawMapProperties,
    areas: Vec<RawArea>,
}

/// Snapshot of the previous sibling used to resolve `last_*` tokens.
#[derive(Debug, Clone, Copy, Default)]
struct Previous {
    x: f32,
    y: f32,
    right: f32,
    bottom: f32,
    width: f32,
    height: f32,
}

fn resolve_token(
    value: &TokenOrNumber,
    prev: &Previous,
    area: usize,
    zone: usize,
) -> Result<f32, MapLoadError> {
    match value {
        TokenOrNumber::Number(n) => Ok(*n),
        TokenOrNumber::Token(t) => match t.as_str() {
            "last_right" => Ok(prev.right),
            "last_bottom" => Ok(prev.bottom),
            "last_y" => Ok(prev.y),
            "last_width" => Ok(prev.width),
            "last_height" => Ok(prev.height),
            other => Err(MapLoadError::UnresolvableToken {
                area,
                zone,
                token: other.to_string(),
            }),
        },
    }
}

impl RawMap {
    fn resolve(self) -> Result<Map, MapLoadError> {
        let mut areas = Vec::with_capacity(self.areas.len());
        let mut prev_area = Previous::default();

        for (area_idx, raw_area) in self.areas.into_iter().enumerate() {
            let area_x = resolve_token(&raw_area.x, &prev_area, area_idx, 0)?;
            let area_y = resolve_token(&raw_area.y, &prev_area, area_idx, 0)?;

            let mut zones = Vec::with_capacity(raw_area.zones.len());
            let mut prev_zone = Previous::default();

            for (zone_idx, raw_zone) in raw_area.zones.into_iter().enumerate() {
                let x = resolve_token(&raw_zone.x, &prev_zone, area_idx, zone_idx)?;
                let y = resolve_token(&raw_zone.y, &prev_zone, area_idx, zone_idx)?;
                let width = resolve_token(&raw_zone.width, &prev_zone, area_idx, zone_idx)?;
                let height = resolve_token(&raw_zone.height, &prev_zone, area_idx, zone_idx)?;

                let kind = ZoneKind::from_str(&raw_zone.kind)?;
                let translate = raw_zone
                    .translate
                    .map(|t| Vector2::new(t.x, t.y))
                    .unwrap_or(Vector2::ZERO);

                let mut spawners = Vec::new();
                for raw in raw_zone.spawner.into_iter().chain(raw_zone.spawners.into_iter()) {
                    let mut enemy_types = Vec::with_capacity(raw.types.len());
                    for name in &raw.types {
                        enemy_types.push(
                            EnemyVariant::from_name(name)
                                .ok_or_else(|| MapLoadError::UnknownEnemyType(name.clone()))?,
                        );
                    }
                    let speed = raw.speed.map(|s| s / SPEED_RETUNE_DIVISOR);
                    let min_speed = match raw.min_speed {
                        Some(v) => v / SPEED_RETUNE_DIVISOR,
                        None => speed.map(|s| s / 2.0).unwrap_or(0.0),
                    };
                    let max_speed = match raw.max_speed {
                        Some(v) => v / SPEED_RETUNE_DIVISOR,
                        None => speed.map(|s| s * 2.0).unwrap_or(0.0),
                    };
                    spawners.push(Spawner {
                        radius: raw.radius,
                        speed,
                        min_speed,
                        max_speed,
                        count: raw.count,
                        move_clockwise: raw.move_clockwise,
                        enemy_types,
                    });
                }

                prev_zone = Previous {
                    x,
                    y,
                    right: x + width,
                    bottom: y + height,
                    width,
                    height,
                };

                zones.push(Zone {
                    kind,
                    bounds: Aabb::new(x, y, x + width, y + height),
                    minimum_speed: raw_zone.properties.minimum_speed,
                    translate,
                    spawners,
                });
            }

            let area = Area {
                x: area_x,
                y: area_y,
                zones,
            };
            prev_area = Previous {
                x: area_x,
                y: area_y,
                right: area_x + area.width(),
                bottom: area_y + area.height(),
                width: area.width(),
                height: area.height(),
            };
            areas.push(area);
        }

        let background_color = {
            let c = &self.properties.background_color;
            [
                *c.first().unwrap_or(&0),
                *c.get(1).unwrap_or(&0),
                *c.get(2).unwrap_or(&0),
                *c.get(3).unwrap_or(&255),
            ]
        };

        Ok(Map {
            name: self.name,
            properties: MapProperties {
                background_color,
                friction: self.properties.friction,
            },
            areas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    {
        "name": "test map",
        "properties": { "background_color": [10, 10, 10, 255], "friction": 1.0 },
        "areas": [
            {
                "x": 0, "y": 0,
                "zones": [
                    { "type": "safe", "x": 0, "y": 0, "width": 200, "height": 200 },
                    { "type": "active", "x": "last_right", "y": 0, "width": 300, "height": 200,
                      "spawner": [ { "radius": 10, "speed": 120, "count": 2, "types": ["normal"] } ] }
                ]
            },
            {
                "x": "last_right", "y": 0,
                "zones": [
                    { "type": "blocked", "x": 0, "y": 0, "width": 100, "height": 100 }
                ]
            }
        ]
    }
    "#;

    #[test]
    fn loads_and_resolves_tokens() {
        let map = Map::load_from_str(SAMPLE).unwrap();
        assert_eq!(map.areas.len(), 2);
        assert_eq!(map.areas[0].zones[1].bounds.left, 200.0);
        assert_eq!(map.areas[1].x, 500.0);
    }

    #[test]
    fn spawn_point_is_first_safe_zone_center() {
        let map = Map::load_from_str(SAMPLE).unwrap();
        let spawn = map.spawn_point();
        assert_eq!(spawn, Vector2::new(100.0, 100.0));
    }

    #[test]
    fn resolve_pushes_player_out_of_blocked_zone() {
        let map = Map::load_from_str(SAMPLE).unwrap();
        let (x, y, adjusted) = map.resolve(550.0, 50.0, 10.0, false);
        assert!(adjusted);
        assert!(x >= 510.0 || y >= 0.0);
        let _ = (x, y);
    }

    #[test]
    fn resolve_recovers_when_point_outside_all_areas() {
        let map = Map::load_from_str(SAMPLE).unwrap();
        let (x, y, adjusted) = map.resolve(100_000.0, 100_000.0, 10.0, false);
        assert!(adjusted);
        assert!(x.is_finite() && y.is_finite());
    }

    #[test]
    fn unknown_zone_type_is_rejected() {
        let bad = SAMPLE.replace("\"safe\"", "\"weird\"");
        assert!(matches!(
            Map::load_from_str(&bad),
            Err(MapLoadError::UnknownZoneType(_))
        ));
    }

    #[test]
    fn spawner_without_min_max_defaults_to_half_and_double_speed() {
        let map = Map::load_from_str(SAMPLE).unwrap();
        let spawner = &map.areas[0].zones[1].spawners[0];
        let speed = spawner.speed.unwrap();
        assert_eq!(spawner.min_speed, speed / 2.0);
        assert_eq!(spawner.max_speed, speed * 2.0);
    }

    #[test]
    fn spawner_with_explicit_min_max_keeps_them() {
        let json = SAMPLE.replace(
            r#""speed": 120, "count": 2"#,
            r#""speed": 120, "min_speed": 60, "max_speed": 180, "count": 2"#,
        );
        let map = Map::load_from_str(&json).unwrap();
        let spawner = &map.areas[0].zones[1].spawners[0];
        assert_eq!(spawner.min_speed, 60.0 / SPEED_RETUNE_DIVISOR);
        assert_eq!(spawner.max_speed, 180.0 / SPEED_RETUNE_DIVISOR);
    }
}
