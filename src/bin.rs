//! Discrete addresses of projection-data elements.

/// One element of projection data: `(segment, view, axial_pos, tangential_pos)`
/// plus a value.
///
/// Bins are built transiently, per lookup. A bin whose `value` is
/// [`Bin::INVALID_VALUE`] does not correspond to any element of the data: it
/// is only produced by [`crate::ProjDataInfo::get_bin_with_sentinel`], which
/// exists for callers that still expect the legacy `-1` convention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bin {
    pub segment_num       : i32,
    pub view_num          : i32,
    pub axial_pos_num     : i32,
    pub tangential_pos_num: i32,
    pub value             : f32,
}

impl Bin {
    pub const INVALID_VALUE: f32 = -1.0;

    pub fn new(segment_num: i32, view_num: i32, axial_pos_num: i32, tangential_pos_num: i32) -> Self {
        Self { segment_num, view_num, axial_pos_num, tangential_pos_num, value: 0.0 }
    }

    pub fn with_value(self, value: f32) -> Self { Self { value, ..self } }

    pub(crate) fn invalid() -> Self { Self::new(0, 0, 0, 0).with_value(Self::INVALID_VALUE) }

    /// `false` only for bins carrying the legacy `-1` sentinel.
    pub fn is_valid(&self) -> bool { self.value != Self::INVALID_VALUE }

    /// The four indices, ignoring the value
    pub fn indices(&self) -> (i32, i32, i32, i32) {
        (self.segment_num, self.view_num, self.axial_pos_num, self.tangential_pos_num)
    }
}

impl std::fmt::Display for Bin {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "<Bin seg {:4} view {:4} ax_pos {:4} tang_pos {:4}: {}>",
               self.segment_num, self.view_num, self.axial_pos_num, self.tangential_pos_num, self.value)
    }
}
