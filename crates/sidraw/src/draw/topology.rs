//! Primitive topology tables.

use sidraw_pm4::sid::{vgt_gs_out_prim_type as gs_out, vgt_primitive_type as pt};

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
    Quads = 7,
    QuadStrip = 8,
    Polygon = 9,
    LinesAdjacency = 10,
    LineStripAdjacency = 11,
    TrianglesAdjacency = 12,
    TriangleStripAdjacency = 13,
}

const NUM_MODES: usize = 14;

/// Hardware topology per mode. Adjacency has no fixed-function equivalent.
const PRIM_CONV: [Option<u32>; NUM_MODES] = [
    Some(pt::DI_PT_POINTLIST),
    Some(pt::DI_PT_LINELIST),
    Some(pt::DI_PT_LINELOOP),
    Some(pt::DI_PT_LINESTRIP),
    Some(pt::DI_PT_TRILIST),
    Some(pt::DI_PT_TRISTRIP),
    Some(pt::DI_PT_TRIFAN),
    Some(pt::DI_PT_QUADLIST),
    Some(pt::DI_PT_QUADSTRIP),
    Some(pt::DI_PT_POLYGON),
    None,
    None,
    None,
    None,
];

/// Output assembly bucket per mode.
const GS_OUT_CONV: [Option<u32>; NUM_MODES] = [
    Some(gs_out::OUTPRIM_TYPE_POINTLIST),
    Some(gs_out::OUTPRIM_TYPE_LINESTRIP),
    Some(gs_out::OUTPRIM_TYPE_LINESTRIP),
    Some(gs_out::OUTPRIM_TYPE_LINESTRIP),
    Some(gs_out::OUTPRIM_TYPE_TRISTRIP),
    Some(gs_out::OUTPRIM_TYPE_TRISTRIP),
    Some(gs_out::OUTPRIM_TYPE_TRISTRIP),
    Some(gs_out::OUTPRIM_TYPE_TRISTRIP),
    Some(gs_out::OUTPRIM_TYPE_TRISTRIP),
    Some(gs_out::OUTPRIM_TYPE_TRISTRIP),
    Some(gs_out::OUTPRIM_TYPE_LINESTRIP),
    Some(gs_out::OUTPRIM_TYPE_LINESTRIP),
    Some(gs_out::OUTPRIM_TYPE_TRISTRIP),
    Some(gs_out::OUTPRIM_TYPE_TRISTRIP),
];

impl PrimitiveMode {
    pub const ALL: [PrimitiveMode; NUM_MODES] = [
        Self::Points,
        Self::Lines,
        Self::LineLoop,
        Self::LineStrip,
        Self::Triangles,
        Self::TriangleStrip,
        Self::TriangleFan,
        Self::Quads,
        Self::QuadStrip,
        Self::Polygon,
        Self::LinesAdjacency,
        Self::LineStripAdjacency,
        Self::TrianglesAdjacency,
        Self::TriangleStripAdjacency,
    ];

    pub const fn from_u32(v: u32) -> Option<Self> {
        if (v as usize) < NUM_MODES {
            Some(Self::ALL[v as usize])
        } else {
            None
        }
    }

    pub const fn is_adjacency(self) -> bool {
        matches!(
            self,
            Self::LinesAdjacency
                | Self::LineStripAdjacency
                | Self::TrianglesAdjacency
                | Self::TriangleStripAdjacency
        )
    }

    /// `VGT_PRIMITIVE_TYPE` value, or `None` when the hardware cannot draw this mode.
    pub fn hw_primitive(self) -> Option<u32> {
        PRIM_CONV[self as usize]
    }

    /// `VGT_GS_OUT_PRIM_TYPE` value.
    pub fn gs_out_primitive(self) -> u32 {
        let Some(v) = GS_OUT_CONV[self as usize] else {
            panic!("no output primitive type for {self:?}");
        };
        v
    }

    /// Quads and polygons are flat shaded from their last vertex.
    pub const fn provoking_vertex_last(self) -> bool {
        matches!(self, Self::Quads | Self::QuadStrip | Self::Polygon)
    }
}
