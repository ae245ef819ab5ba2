use roomview_scene::{Material, Side, StencilState};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Number of stencil planes; they write refs `1..=PLANE_COUNT`.
pub const PLANE_COUNT: u8 = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("room {room:?} tests stencil ref {reference}, but planes only write 1 to 4")]
    UnwrittenRef { room: String, reference: u8 },
    #[error("rooms {first:?} and {second:?} both test stencil ref {reference}")]
    DuplicateRef {
        first: String,
        second: String,
        reference: u8,
    },
}

/// One loadable sub-scene and how its materials are masked.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomSpec {
    pub name: String,
    pub path: String,
    /// Stencil value the room is visible through. `None` means always visible.
    #[serde(default)]
    pub stencil_ref: Option<u8>,
    #[serde(default)]
    pub side: Side,
}

impl RoomSpec {
    pub fn new(name: &str, stencil_ref: Option<u8>) -> Self {
        Self {
            name: name.to_string(),
            path: format!("./assets/{name}.glb"),
            stencil_ref,
            side: Side::Front,
        }
    }

    /// Configure a material of this room: stencil-equal test when a ref is
    /// set, and always the face-culling side.
    pub fn apply_to(&self, material: &mut Material) {
        if let Some(reference) = self.stencil_ref {
            material.stencil = Some(StencilState::equal(reference));
        }
        material.side = self.side;
    }
}

/// Viewer settings. Every field has a default, so an empty document is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Directory the room paths are resolved against.
    pub asset_root: PathBuf,
    /// Add line geometry outlining the sun's shadow frustum.
    pub shadow_helper: bool,
    pub rooms: Vec<RoomSpec>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            shadow_helper: false,
            rooms: vec![
                RoomSpec::new("frame", None),
                RoomSpec::new("roomA", Some(1)),
                RoomSpec::new("roomB", Some(4)),
                RoomSpec::new("roomC", Some(2)),
            ],
        }
    }
}

impl ViewerConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Check that each room ref is written by exactly one plane and read by
    /// at most one room. A plane ref no room reads is allowed; it only shows
    /// the frame.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut readers: BTreeMap<u8, &str> = BTreeMap::new();
        for room in &self.rooms {
            let Some(reference) = room.stencil_ref else {
                continue;
            };
            if !(1..=PLANE_COUNT).contains(&reference) {
                return Err(ConfigError::UnwrittenRef {
                    room: room.name.clone(),
                    reference,
                });
            }
            if let Some(first) = readers.insert(reference, &room.name) {
                return Err(ConfigError::DuplicateRef {
                    first: first.to_string(),
                    second: room.name.clone(),
                    reference,
                });
            }
        }

        for reference in 1..=PLANE_COUNT {
            if !readers.contains_key(&reference) {
                tracing::warn!(reference, "stencil plane is read by no room");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomview_scene::StencilFunc;

    #[test]
    fn default_layout() {
        let config = ViewerConfig::default();
        let refs: Vec<_> = config
            .rooms
            .iter()
            .map(|r| (r.name.as_str(), r.stencil_ref))
            .collect();
        assert_eq!(
            refs,
            vec![
                ("frame", None),
                ("roomA", Some(1)),
                ("roomB", Some(4)),
                ("roomC", Some(2)),
            ]
        );
        assert_eq!(config.rooms[2].path, "./assets/roomB.glb");
        assert!(config.rooms.iter().all(|r| r.side == Side::Front));
        assert!(!config.shadow_helper);
        config.validate().unwrap();
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(ViewerConfig::from_yaml_str("{}").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn yaml_overrides() {
        let config = ViewerConfig::from_yaml_str(
            r#"
shadow_helper: true
rooms:
  - name: hall
    path: ./assets/hall.glb
    stencil_ref: 3
    side: double
"#,
        )
        .unwrap();
        assert!(config.shadow_helper);
        assert_eq!(config.rooms.len(), 1);
        assert_eq!(config.rooms[0].side, Side::Double);
        assert_eq!(config.rooms[0].stencil_ref, Some(3));
        assert_eq!(config.asset_root, PathBuf::from("."));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = ViewerConfig::from_yaml_str("shadow_helpr: true").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn duplicate_ref_is_rejected() {
        let config = ViewerConfig {
            rooms: vec![RoomSpec::new("a", Some(2)), RoomSpec::new("b", Some(2))],
            ..ViewerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRef { reference: 2, .. }));
    }

    #[test]
    fn ref_outside_planes_is_rejected() {
        for reference in [0, 5] {
            let config = ViewerConfig {
                rooms: vec![RoomSpec::new("a", Some(reference))],
                ..ViewerConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::UnwrittenRef { .. })
            ));
        }
    }

    #[test]
    fn from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.yaml");
        std::fs::write(&path, "asset_root: /srv/rooms\n").unwrap();
        let config = ViewerConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.asset_root, PathBuf::from("/srv/rooms"));
        assert!(matches!(
            ViewerConfig::from_yaml_file(dir.path().join("missing.yaml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn apply_sets_stencil_and_side() {
        let mut material = Material::default().with_side(Side::Double);
        RoomSpec::new("roomB", Some(4)).apply_to(&mut material);
        assert_eq!(material.side, Side::Front);
        let stencil = material.stencil.unwrap();
        assert_eq!(stencil.func, StencilFunc::Equal);
        assert_eq!(stencil.reference, 4);

        let mut frame = Material::default().with_side(Side::Double);
        RoomSpec::new("frame", None).apply_to(&mut frame);
        assert_eq!(frame.side, Side::Front);
        assert!(frame.stencil.is_none());
    }
}
