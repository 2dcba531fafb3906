//! Console presentation helpers shared by the reader binary

use crate::frame::Acceleration;

/// Magnitude of the most negative 12-bit count
pub const FULL_SCALE_COUNTS: i16 = 2048;

/// Horizontal bar graph for one axis, centered on zero
///
/// The bar is `width` cells plus the center marker; negative counts grow to
/// the left, positive to the right.
///
/// # Example
/// ```
/// use mma8452q_interface::axis_bar;
///
/// // Half of full scale on a 40-cell bar
/// let bar = axis_bar(1024, 40);
/// println!("[{}]", bar);
/// ```
pub fn axis_bar(count: i16, width: usize) -> String {
    let half = width / 2;
    let magnitude = usize::from(count.unsigned_abs()).min(FULL_SCALE_COUNTS as usize);
    let filled = (magnitude * half / FULL_SCALE_COUNTS as usize).min(half);

    let (left, right) = if count < 0 {
        (
            format!("{}{}", " ".repeat(half - filled), "█".repeat(filled)),
            " ".repeat(half),
        )
    } else {
        (
            " ".repeat(half),
            format!("{}{}", "█".repeat(filled), " ".repeat(half - filled)),
        )
    };

    format!("{}|{}", left, right)
}

/// `X Axis: 16` style labels for each axis
pub fn axis_lines(accel: &Acceleration) -> [String; 3] {
    [
        format!("X Axis: {}", accel.x),
        format!("Y Axis: {}", accel.y),
        format!("Z Axis: {}", accel.z),
    ]
}
