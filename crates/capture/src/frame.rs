/// One grayscale video frame as produced by a capture device.
///
/// `sequence` increases monotonically per stream and is what engines and
/// preview consumers use to reason about frame identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub sequence: u64,
    /// Row-major luma plane, `width * height` bytes.
    pub luma: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, sequence: u64, luma: Vec<u8>) -> Self {
        debug_assert_eq!(luma.len(), (width * height) as usize);
        Self {
            width,
            height,
            sequence,
            luma,
        }
    }
}
