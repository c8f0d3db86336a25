/// Units which are simply type aliases for `f32` rather than having an
/// implementation as a `uom` `Quantity`.
///
/// These are used in the inner loops of the bin and ROI calculations, where
/// values have already been extracted from their `uom` wrappers (in `mm`,
/// `mm^3` or `radian`), but we still want some clues in the source as to
/// what they represent.

pub type Lengthf32    = f32;
pub type Anglef32     = f32;
pub type Ratiof32     = f32;
pub type Volumef32    = f32;
pub type Intensityf32 = f32; // TODO uom Intensity
