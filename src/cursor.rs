// Cursor kinematics driven by the control vector. Rendering stays
// outside the core; this model only owns position, bounds, and reset.
//
// Display coordinates grow downward, so upward control subtracts from y.

use crate::config::ChannelLayout;
use crate::types::CursorPoint;

pub const DISPLAY_WIDTH: f64 = 1000.0;
pub const DISPLAY_HEIGHT: f64 = 700.0;

/// Axis magnitude below which a control value produces no motion.
pub const DEAD_ZONE: f64 = 0.1;

const VERTICAL_SENSITIVITY: f64 = 6.0;
const CROSSHAIR_SENSITIVITY: f64 = 5.0;
const FLIGHT_SPEED: f64 = 2.0;
/// Fraction of flight speed applied as descent while the throttle idles.
const IDLE_DESCENT: f64 = 0.3;

#[derive(Debug, Clone, Copy)]
struct Bounds {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

/// Position model for the on-screen cursor or vehicle.
#[derive(Debug, Clone)]
pub struct CursorModel {
    layout: ChannelLayout,
    position: CursorPoint,
    home: CursorPoint,
    bounds: Bounds,
}

impl CursorModel {
    pub fn new(layout: ChannelLayout) -> Self {
        let home = CursorPoint::new(DISPLAY_WIDTH / 2.0, DISPLAY_HEIGHT / 2.0);
        let bounds = match layout {
            // The vertical layout moves on y only; x stays at home.
            ChannelLayout::Vertical | ChannelLayout::Crosshair => Bounds {
                x_min: 50.0,
                x_max: DISPLAY_WIDTH - 50.0,
                y_min: 50.0,
                y_max: DISPLAY_HEIGHT - 50.0,
            },
            // The vehicle keeps a wider margin and never reaches the
            // ground band at the bottom of the display.
            ChannelLayout::Flight => Bounds {
                x_min: 100.0,
                x_max: DISPLAY_WIDTH - 100.0,
                y_min: 100.0,
                y_max: DISPLAY_HEIGHT - 200.0,
            },
        };
        Self {
            layout,
            position: home,
            home,
            bounds,
        }
    }

    pub fn position(&self) -> CursorPoint {
        self.position
    }

    /// Returns the cursor to its home position.
    pub fn reset(&mut self) {
        self.position = self.home;
    }

    /// Applies one tick of the control vector.
    pub fn advance(&mut self, control: &[f64]) {
        match self.layout {
            ChannelLayout::Vertical => {
                let vertical = channel(control, 0);
                if vertical.abs() > DEAD_ZONE {
                    self.position.y -= vertical * VERTICAL_SENSITIVITY;
                }
            }
            ChannelLayout::Crosshair => {
                let lr = channel(control, 0);
                let ud = channel(control, 1);
                if lr.abs() > DEAD_ZONE {
                    self.position.x += lr * CROSSHAIR_SENSITIVITY;
                }
                if ud.abs() > DEAD_ZONE {
                    self.position.y -= ud * CROSSHAIR_SENSITIVITY;
                }
            }
            ChannelLayout::Flight => {
                let throttle = channel(control, 0);
                let yaw = channel(control, 1);
                if throttle > DEAD_ZONE {
                    self.position.y -= FLIGHT_SPEED * throttle;
                } else {
                    // The vehicle sinks gently while the throttle idles.
                    self.position.y += FLIGHT_SPEED * IDLE_DESCENT;
                }
                // Yaw has no dead zone.
                self.position.x += yaw * FLIGHT_SPEED;
            }
        }
        self.clamp();
    }

    fn clamp(&mut self) {
        self.position.x = self.position.x.clamp(self.bounds.x_min, self.bounds.x_max);
        self.position.y = self.position.y.clamp(self.bounds.y_min, self.bounds.y_max);
    }
}

fn channel(control: &[f64], index: usize) -> f64 {
    control.get(index).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_is_display_center() {
        for layout in ChannelLayout::all() {
            let model = CursorModel::new(layout);
            assert_eq!(model.position(), CursorPoint::new(500.0, 350.0));
        }
    }

    #[test]
    fn test_vertical_moves_y_only() {
        let mut model = CursorModel::new(ChannelLayout::Vertical);
        model.advance(&[0.5]);
        assert_eq!(model.position(), CursorPoint::new(500.0, 347.0));
        model.advance(&[-0.5]);
        assert_eq!(model.position(), CursorPoint::new(500.0, 350.0));
    }

    #[test]
    fn test_dead_zone_suppresses_motion() {
        let mut model = CursorModel::new(ChannelLayout::Crosshair);
        model.advance(&[0.1, -0.1]);
        assert_eq!(model.position(), CursorPoint::new(500.0, 350.0));
        model.advance(&[0.11, 0.0]);
        assert!(model.position().x > 500.0);
    }

    #[test]
    fn test_crosshair_axes() {
        let mut model = CursorModel::new(ChannelLayout::Crosshair);
        model.advance(&[1.0, 1.0]);
        assert_eq!(model.position(), CursorPoint::new(505.0, 345.0));
    }

    #[test]
    fn test_crosshair_clamped_to_margin() {
        let mut model = CursorModel::new(ChannelLayout::Crosshair);
        for _ in 0..200 {
            model.advance(&[0.0, 1.0]);
        }
        assert_eq!(model.position().y, 50.0);
        for _ in 0..200 {
            model.advance(&[-1.0, 0.0]);
        }
        assert_eq!(model.position().x, 50.0);
    }

    #[test]
    fn test_flight_idle_descent_until_ground_band() {
        let mut model = CursorModel::new(ChannelLayout::Flight);
        model.advance(&[0.0, 0.0, 0.0, 0.0]);
        assert!((model.position().y - 350.6).abs() < 1e-9);
        for _ in 0..1000 {
            model.advance(&[0.0, 0.0, 0.0, 0.0]);
        }
        assert_eq!(model.position().y, 500.0);
    }

    #[test]
    fn test_flight_throttle_climbs() {
        let mut model = CursorModel::new(ChannelLayout::Flight);
        model.advance(&[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(model.position().y, 348.0);
        // Unconditioned high outputs climb proportionally faster.
        model.advance(&[3.0, 0.0, 0.0, 0.0]);
        assert_eq!(model.position().y, 342.0);
    }

    #[test]
    fn test_flight_yaw_has_no_dead_zone() {
        let mut model = CursorModel::new(ChannelLayout::Flight);
        model.advance(&[1.0, 0.05, 0.0, 0.0]);
        assert!((model.position().x - 500.1).abs() < 1e-9);
    }

    #[test]
    fn test_flight_bounds() {
        let mut model = CursorModel::new(ChannelLayout::Flight);
        for _ in 0..1000 {
            model.advance(&[1.0, 1.0, 0.0, 0.0]);
        }
        assert_eq!(model.position().x, 900.0);
        assert_eq!(model.position().y, 100.0);
    }

    #[test]
    fn test_reset_restores_home() {
        let mut model = CursorModel::new(ChannelLayout::Crosshair);
        for _ in 0..10 {
            model.advance(&[1.0, 1.0]);
        }
        model.reset();
        assert_eq!(model.position(), CursorPoint::new(500.0, 350.0));
    }

    #[test]
    fn test_short_vector_is_inert() {
        let mut model = CursorModel::new(ChannelLayout::Crosshair);
        model.advance(&[]);
        assert_eq!(model.position(), CursorPoint::new(500.0, 350.0));
    }
}
