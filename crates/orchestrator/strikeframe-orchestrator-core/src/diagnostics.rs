use serde::{Deserialize, Serialize};

use strikeframe_animation_core::{ColorGrade, Point, Pose, VfxDefinition};

use crate::collaborators::{
    Camera, CombatSink, ShatterParams, SpriteEffects, TimeDilationSink, VfxSpawner,
};

/// One outward call, as seen by a `CallRecorder`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum OutboundCall {
    Spawn {
        vfx: String,
        position: Point,
        facing: f32,
    },
    Projectile {
        kind: String,
        role: String,
    },
    Shake {
        magnitude: f32,
    },
    Focus {
        zoom: Option<f32>,
        focus: Option<Point>,
        duration_ms: f32,
    },
    Hitstop {
        ms: f32,
    },
    CameraReset,
    TimeScale {
        scale: f32,
        duration_ms: f32,
    },
    Tint {
        role: String,
        color: u32,
        duration_ms: f32,
    },
    Shatter {
        role: String,
        params: ShatterParams,
        position: Point,
    },
    Afterimage {
        role: String,
        pose: Pose,
        position: Point,
        color: u32,
    },
    ColorGrade {
        grade: ColorGrade,
        duration_ms: f32,
    },
    Damage {
        amount: f32,
        target: String,
    },
    Buff {
        name: String,
        value: f32,
        target: String,
    },
    Debuff {
        name: String,
        value: f32,
        target: String,
    },
    Event {
        kind: String,
        value: f32,
    },
}

/// Collaborator that records every call in order. Useful for tests and for
/// dumping a fight's presentation trace as JSON.
#[derive(Clone, Debug, Default)]
pub struct CallRecorder {
    pub calls: Vec<OutboundCall>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// `(amount, target)` of every damage call.
    pub fn damage(&self) -> Vec<(f32, &str)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                OutboundCall::Damage { amount, target } => Some((*amount, target.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&OutboundCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.calls)
    }
}

impl VfxSpawner for CallRecorder {
    fn spawn(&mut self, vfx: &VfxDefinition, position: Point, facing: f32) {
        self.calls.push(OutboundCall::Spawn {
            vfx: vfx.id.clone(),
            position,
            facing,
        });
    }

    fn projectile(&mut self, kind: &str, role: &str) {
        self.calls.push(OutboundCall::Projectile {
            kind: kind.to_string(),
            role: role.to_string(),
        });
    }
}

impl Camera for CallRecorder {
    fn shake(&mut self, magnitude: f32) {
        self.calls.push(OutboundCall::Shake { magnitude });
    }

    fn focus(&mut self, zoom: Option<f32>, focus: Option<Point>, duration_ms: f32) {
        self.calls.push(OutboundCall::Focus {
            zoom,
            focus,
            duration_ms,
        });
    }

    fn hitstop(&mut self, ms: f32) {
        self.calls.push(OutboundCall::Hitstop { ms });
    }

    fn reset(&mut self) {
        self.calls.push(OutboundCall::CameraReset);
    }
}

impl TimeDilationSink for CallRecorder {
    fn set_time_scale(&mut self, scale: f32, duration_ms: f32) {
        self.calls.push(OutboundCall::TimeScale { scale, duration_ms });
    }
}

impl SpriteEffects for CallRecorder {
    fn tint(&mut self, role: &str, color: u32, duration_ms: f32) {
        self.calls.push(OutboundCall::Tint {
            role: role.to_string(),
            color,
            duration_ms,
        });
    }

    fn shatter(&mut self, role: &str, params: &ShatterParams, position: Point) {
        self.calls.push(OutboundCall::Shatter {
            role: role.to_string(),
            params: params.clone(),
            position,
        });
    }

    fn afterimage(&mut self, role: &str, pose: &Pose, position: Point, color: u32) {
        self.calls.push(OutboundCall::Afterimage {
            role: role.to_string(),
            pose: *pose,
            position,
            color,
        });
    }

    fn color_grade(&mut self, grade: ColorGrade, duration_ms: f32) {
        self.calls.push(OutboundCall::ColorGrade { grade, duration_ms });
    }
}

impl CombatSink for CallRecorder {
    fn apply_damage(&mut self, amount: f32, target: &str) {
        self.calls.push(OutboundCall::Damage {
            amount,
            target: target.to_string(),
        });
    }

    fn apply_buff(&mut self, name: &str, value: f32, target: &str) {
        self.calls.push(OutboundCall::Buff {
            name: name.to_string(),
            value,
            target: target.to_string(),
        });
    }

    fn apply_debuff(&mut self, name: &str, value: f32, target: &str) {
        self.calls.push(OutboundCall::Debuff {
            name: name.to_string(),
            value,
            target: target.to_string(),
        });
    }

    fn emit_event(&mut self, kind: &str, value: f32) {
        self.calls.push(OutboundCall::Event {
            kind: kind.to_string(),
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Collaborators;

    fn drive(collab: &mut dyn Collaborators) {
        collab.apply_damage(6.0, "enemy");
        collab.shake(8.0);
        collab.set_time_scale(1.0, 0.0);
    }

    #[test]
    fn records_in_call_order_and_serializes() {
        let mut rec = CallRecorder::new();
        drive(&mut rec);
        assert_eq!(rec.calls.len(), 3);
        assert_eq!(rec.damage(), vec![(6.0, "enemy")]);
        let json = rec.to_json().unwrap();
        assert!(json.contains("\"call\": \"damage\""));
        assert!(json.contains("\"call\": \"time_scale\""));
    }
}
