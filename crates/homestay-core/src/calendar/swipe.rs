use crate::calendar::carousel::NavigationCommand;

/// Horizontal travel, in device-independent pixels, below which a touch is a tap.
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 50.0;

/// Dragging left pages forward, dragging right pages back.
pub fn interpret_swipe(start_x: f64, end_x: f64, threshold: f64) -> Option<NavigationCommand> {
    if start_x - end_x > threshold {
        Some(NavigationCommand::Next)
    } else if end_x - start_x > threshold {
        Some(NavigationCommand::Previous)
    } else {
        None
    }
}
