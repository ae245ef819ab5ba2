use serde::{Deserialize, Serialize};

/// Which faces of a surface are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Stencil comparison against the reference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StencilFunc {
    #[default]
    Always,
    Equal,
}

/// What happens to the stencil value when both stencil and depth tests pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StencilOp {
    #[default]
    Keep,
    Replace,
}

/// Per-material stencil configuration.
///
/// Read and write masks are always `0xff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StencilState {
    pub func: StencilFunc,
    pub reference: u8,
    pub z_pass: StencilOp,
}

impl StencilState {
    /// Pass where the buffer equals `reference`; leave the buffer untouched.
    pub fn equal(reference: u8) -> Self {
        Self {
            func: StencilFunc::Equal,
            reference,
            z_pass: StencilOp::Keep,
        }
    }

    /// Always pass and write `reference` where depth passes.
    pub fn replace(reference: u8) -> Self {
        Self {
            func: StencilFunc::Always,
            reference,
            z_pass: StencilOp::Replace,
        }
    }

    pub fn writes(&self) -> bool {
        self.z_pass == StencilOp::Replace
    }

    pub fn tests(&self) -> bool {
        self.func != StencilFunc::Always
    }
}

/// Shading model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MaterialKind {
    /// Unlit.
    Basic,
    /// Lit by the scene lights.
    #[default]
    Physical,
}

/// Surface material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    pub base_color: [f32; 4],
    pub side: Side,
    pub color_write: bool,
    pub depth_write: bool,
    pub stencil: Option<StencilState>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            kind: MaterialKind::Physical,
            base_color: [1.0, 1.0, 1.0, 1.0],
            side: Side::Front,
            color_write: true,
            depth_write: true,
            stencil: None,
        }
    }
}

impl Material {
    /// Invisible material that only writes `reference` into the stencil buffer.
    pub fn stencil_writer(reference: u8) -> Self {
        Self {
            name: format!("stencil_writer_{reference}"),
            kind: MaterialKind::Basic,
            color_write: false,
            depth_write: false,
            stencil: Some(StencilState::replace(reference)),
            ..Self::default()
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Restrict this material to pixels where the stencil equals `reference`.
    pub fn with_stencil_equal(mut self, reference: u8) -> Self {
        self.stencil = Some(StencilState::equal(reference));
        self
    }

    /// Reference value this material tests against, if it tests at all.
    pub fn stencil_test_ref(&self) -> Option<u8> {
        self.stencil.filter(|s| s.tests()).map(|s| s.reference)
    }

    /// Reference value this material writes, if it writes at all.
    pub fn stencil_write_ref(&self) -> Option<u8> {
        self.stencil.filter(|s| s.writes()).map(|s| s.reference)
    }
}
