//! Turns raw pointer, wheel and touch events into scene rotations and zooms.

use serde::{Deserialize, Serialize};

use super::{RotationAxis, Scene};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputOptions {
    /// Radians of rotation per pixel dragged.
    pub drag_sensitivity: f64,
    /// Zoom steps per pixel of change in pinch distance.
    pub pinch_sensitivity: f64,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.003,
            pinch_sensitivity: 0.025,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    Wheel { delta: f64, x: f64, y: f64 },
    /// The pointer entered (`true`) or left a cluster that scrolls its own content with the
    /// wheel. Wheel zoom is suspended in between.
    WheelCapture { captured: bool },
    TouchStart { touches: Vec<[f64; 2]> },
    TouchMove { touches: Vec<[f64; 2]> },
    TouchEnd,
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    options: InputOptions,
    dragging: bool,
    last: Option<[f64; 2]>,
    last_pinch: Option<f64>,
    wheel_captured: bool,
}

impl InputState {
    pub fn new(options: InputOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &InputOptions {
        &self.options
    }

    /// Applies a drag of `(dx, dy)` pixels and refreshes the view.
    pub fn drag(&self, scene: &mut Scene, dx: f64, dy: f64) {
        let s = self.options.drag_sensitivity;
        scene.rotate(RotationAxis::X, -dx * s);
        scene.rotate(RotationAxis::Y, dy * s);
        scene.update_view();
        scene.update_detail_level();
    }

    fn drag_to(&mut self, scene: &mut Scene, x: f64, y: f64) {
        if let Some([lx, ly]) = self.last {
            self.drag(scene, x - lx, y - ly);
        }
        self.last = Some([x, y]);
    }

    /// Returns whether the scene was changed by the event.
    pub fn handle(&mut self, scene: &mut Scene, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y } => {
                self.dragging = true;
                self.last = Some([*x, *y]);
                false
            }
            InputEvent::PointerMove { x, y } => {
                if !self.dragging {
                    return false;
                }
                self.drag_to(scene, *x, *y);
                true
            }
            InputEvent::PointerUp => {
                self.dragging = false;
                false
            }
            InputEvent::Wheel { delta, x, y } => {
                if self.wheel_captured {
                    return false;
                }
                scene.zoom(*delta, *x, *y);
                true
            }
            InputEvent::WheelCapture { captured } => {
                self.wheel_captured = *captured;
                false
            }
            InputEvent::TouchStart { touches } => {
                if let [[x, y]] = touches.as_slice() {
                    self.last = Some([*x, *y]);
                }
                false
            }
            InputEvent::TouchMove { touches } => match touches.as_slice() {
                [[x, y]] => {
                    self.drag_to(scene, *x, *y);
                    true
                }
                [[x0, y0], [x1, y1], ..] => {
                    let (dx, dy) = (x0 - x1, y0 - y1);
                    let dist = (dx * dx + dy * dy).sqrt();
                    let zoomed = match self.last_pinch {
                        Some(last) => {
                            let delta = (dist - last) * self.options.pinch_sensitivity;
                            scene.zoom(delta, (x0 + x1) / 2.0, (y0 + y1) / 2.0);
                            true
                        }
                        None => false,
                    };
                    self.last_pinch = Some(dist);
                    zoomed
                }
                [] => false,
            },
            InputEvent::TouchEnd => {
                self.last_pinch = None;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ClusterSpec, GraphSpec, NodeKind, NodeSpec};
    use crate::math::Quaternion;
    use crate::scene::SceneOptions;
    use crate::text::DeterministicTextMeasurer;

    fn scene() -> Scene {
        let spec = GraphSpec {
            clusters: vec![ClusterSpec {
                id: "root".to_string(),
                nodes: vec!["r".to_string()],
            }],
            nodes: vec![NodeSpec {
                id: "r".to_string(),
                text: "root".to_string(),
                kind: NodeKind::User,
                parent: None,
                url: None,
            }],
            links: Vec::new(),
        };
        Scene::from_spec(
            &spec,
            800.0,
            600.0,
            SceneOptions::default(),
            Box::new(DeterministicTextMeasurer::default()),
        )
        .expect("scene")
    }

    #[test]
    fn drag_rotates_by_sensitivity() {
        let mut s = scene();
        let mut input = InputState::default();
        assert!(!input.handle(&mut s, &InputEvent::PointerDown { x: 10.0, y: 10.0 }));
        assert!(input.handle(&mut s, &InputEvent::PointerMove { x: 110.0, y: 30.0 }));

        let mut expected = Quaternion::IDENTITY;
        expected.multiply(&Quaternion::from_euler(-100.0 * 0.003, 0.0, 0.0));
        expected.normalize();
        expected.multiply(&Quaternion::from_euler(0.0, 0.0, 20.0 * 0.003));
        expected.normalize();
        let q = s.orientation();
        assert!((q.x - expected.x).abs() < 1e-12);
        assert!((q.y - expected.y).abs() < 1e-12);
        assert!((q.z - expected.z).abs() < 1e-12);
        assert!((q.w - expected.w).abs() < 1e-12);
    }

    #[test]
    fn moves_without_a_press_are_ignored() {
        let mut s = scene();
        let mut input = InputState::default();
        assert!(!input.handle(&mut s, &InputEvent::PointerMove { x: 50.0, y: 50.0 }));
        input.handle(&mut s, &InputEvent::PointerDown { x: 0.0, y: 0.0 });
        input.handle(&mut s, &InputEvent::PointerUp);
        assert!(!input.handle(&mut s, &InputEvent::PointerMove { x: 50.0, y: 50.0 }));
        assert_eq!(s.orientation(), Quaternion::IDENTITY);
    }

    #[test]
    fn captured_wheel_does_not_zoom() {
        let mut s = scene();
        let mut input = InputState::default();
        input.handle(&mut s, &InputEvent::WheelCapture { captured: true });
        let wheel = InputEvent::Wheel {
            delta: 1.0,
            x: 400.0,
            y: 300.0,
        };
        assert!(!input.handle(&mut s, &wheel));
        assert_eq!(s.scale(), 1.0);

        input.handle(&mut s, &InputEvent::WheelCapture { captured: false });
        assert!(input.handle(&mut s, &wheel));
        assert!((s.scale() - 1.3).abs() < 1e-12);
    }

    #[test]
    fn pinch_zooms_around_the_midpoint() {
        let mut s = scene();
        let mut input = InputState::default();
        let pinch = |half: f64| InputEvent::TouchMove {
            touches: vec![[400.0 - half, 300.0], [400.0 + half, 300.0]],
        };

        assert!(!input.handle(&mut s, &pinch(50.0)));
        assert!(input.handle(&mut s, &pinch(70.0)));
        // 40px wider at 0.025 per px is one zoom step.
        assert!((s.scale() - 1.3).abs() < 1e-12);
        assert_eq!(s.offset().x, 0.0);
        assert_eq!(s.offset().y, 0.0);

        input.handle(&mut s, &InputEvent::TouchEnd);
        assert!(!input.handle(&mut s, &pinch(10.0)));
        assert!((s.scale() - 1.3).abs() < 1e-12);
    }

    #[test]
    fn single_touch_drags() {
        let mut s = scene();
        let mut input = InputState::default();
        input.handle(
            &mut s,
            &InputEvent::TouchStart {
                touches: vec![[0.0, 0.0]],
            },
        );
        assert!(input.handle(
            &mut s,
            &InputEvent::TouchMove {
                touches: vec![[0.0, 40.0]],
            },
        ));
        assert_ne!(s.orientation(), Quaternion::IDENTITY);
    }

    #[test]
    fn events_parse_from_json() {
        let events: Vec<InputEvent> = serde_json::from_str(
            r#"[{"type": "pointer_down", "x": 1, "y": 2}, {"type": "wheel", "delta": -1, "x": 0, "y": 0}, {"type": "touch_end"}]"#,
        )
        .expect("events");
        assert_eq!(events[0], InputEvent::PointerDown { x: 1.0, y: 2.0 });
        assert_eq!(events[2], InputEvent::TouchEnd);
    }
}
