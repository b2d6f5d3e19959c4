//! Named easing curves, parsed once into a typed descriptor.
//!
//! Names follow the `family.direction(args)` convention used by the stored
//! data: `power2.out`, `sine.inOut`, `elastic.out(1,0.5)`, `back.in(2)`.
//! A family without a direction eases out. Every curve maps 0 to 0 and 1 to 1;
//! `elastic` and `back` overshoot in between.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DefinitionError, Result};
use crate::interp::functions::clamp01;

pub const DEFAULT_OVERSHOOT: f32 = 1.70158;
pub const DEFAULT_AMPLITUDE: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EaseDir {
    In,
    Out,
    InOut,
}

impl EaseDir {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            "inout" => Some(Self::InOut),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::InOut => "inOut",
        }
    }
}

/// Easing descriptor: curve family plus its numeric parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
    Linear,
    /// Polynomial of order `degree + 1` (power1 is quadratic).
    Power {
        degree: u8,
        dir: EaseDir,
    },
    Sine(EaseDir),
    Expo(EaseDir),
    Circ(EaseDir),
    Bounce(EaseDir),
    Elastic {
        dir: EaseDir,
        amplitude: f32,
        period: f32,
    },
    Back {
        dir: EaseDir,
        overshoot: f32,
    },
}

impl Ease {
    pub const fn power(degree: u8, dir: EaseDir) -> Ease {
        if degree == 0 {
            Ease::Linear
        } else {
            Ease::Power { degree, dir }
        }
    }

    /// Parse a stored easing name such as `power3.inOut` or `elastic.out(1,0.5)`.
    pub fn parse(name: &str) -> Result<Ease> {
        let trimmed = name.trim();
        let (head, args) = split_args(trimmed)?;
        let (family, dir) = match head.split_once('.') {
            Some((family, dir)) => {
                let dir = EaseDir::parse(dir).ok_or_else(|| DefinitionError::UnknownEase {
                    name: trimmed.to_string(),
                })?;
                (family, dir)
            }
            None => (head, EaseDir::Out),
        };

        let no_args = |ease: Ease| -> Result<Ease> {
            if args.is_empty() {
                Ok(ease)
            } else {
                Err(DefinitionError::EaseArguments {
                    name: trimmed.to_string(),
                    reason: "this curve takes no arguments".into(),
                })
            }
        };

        match family.to_ascii_lowercase().as_str() {
            "linear" | "none" | "power0" => no_args(Ease::Linear),
            "power1" | "quad" => no_args(Ease::power(1, dir)),
            "power2" | "cubic" => no_args(Ease::power(2, dir)),
            "power3" | "quart" => no_args(Ease::power(3, dir)),
            "power4" | "quint" | "strong" => no_args(Ease::power(4, dir)),
            "sine" => no_args(Ease::Sine(dir)),
            "expo" => no_args(Ease::Expo(dir)),
            "circ" => no_args(Ease::Circ(dir)),
            "bounce" => no_args(Ease::Bounce(dir)),
            "elastic" => {
                if args.len() > 2 {
                    return Err(DefinitionError::EaseArguments {
                        name: trimmed.to_string(),
                        reason: "elastic takes (amplitude, period)".into(),
                    });
                }
                let default_period = if dir == EaseDir::InOut { 0.45 } else { 0.3 };
                Ok(Ease::Elastic {
                    dir,
                    amplitude: args.first().copied().unwrap_or(DEFAULT_AMPLITUDE),
                    period: args.get(1).copied().unwrap_or(default_period),
                })
            }
            "back" => {
                if args.len() > 1 {
                    return Err(DefinitionError::EaseArguments {
                        name: trimmed.to_string(),
                        reason: "back takes (overshoot)".into(),
                    });
                }
                Ok(Ease::Back {
                    dir,
                    overshoot: args.first().copied().unwrap_or(DEFAULT_OVERSHOOT),
                })
            }
            _ => Err(DefinitionError::UnknownEase {
                name: trimmed.to_string(),
            }),
        }
    }

    /// Map normalized progress through the curve. Input is clamped to [0,1].
    pub fn apply(&self, t: f32) -> f32 {
        let t = clamp01(t);
        match *self {
            Ease::Linear => t,
            Ease::Power { degree, dir } => {
                let order = i32::from(degree) + 1;
                shape(dir, t, |p| 1.0 - (1.0 - p).powi(order))
            }
            Ease::Sine(dir) => shape(dir, t, |p| (p * FRAC_PI_2).sin()),
            Ease::Expo(dir) => shape(dir, t, |p| {
                if p >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * p)
                }
            }),
            Ease::Circ(dir) => shape(dir, t, |p| (1.0 - (p - 1.0) * (p - 1.0)).max(0.0).sqrt()),
            Ease::Bounce(dir) => shape(dir, t, bounce_out),
            Ease::Elastic {
                dir,
                amplitude,
                period,
            } => {
                let curve = ElasticOut::new(amplitude, period);
                shape(dir, t, |p| curve.eval(p))
            }
            Ease::Back { dir, overshoot } => shape(dir, t, |p| {
                let q = p - 1.0;
                q * q * ((overshoot + 1.0) * q + overshoot) + 1.0
            }),
        }
    }
}

/// Build in / inOut variants from the out curve.
#[inline]
fn shape(dir: EaseDir, t: f32, out: impl Fn(f32) -> f32) -> f32 {
    match dir {
        EaseDir::Out => out(t),
        EaseDir::In => 1.0 - out(1.0 - t),
        EaseDir::InOut => {
            if t < 0.5 {
                (1.0 - out(1.0 - t * 2.0)) / 2.0
            } else {
                0.5 + out((t - 0.5) * 2.0) / 2.0
            }
        }
    }
}

fn bounce_out(p: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if p < 1.0 / D {
        N * p * p
    } else if p < 2.0 / D {
        let q = p - 1.5 / D;
        N * q * q + 0.75
    } else if p < 2.5 / D {
        let q = p - 2.25 / D;
        N * q * q + 0.9375
    } else {
        let q = p - 2.625 / D;
        N * q * q + 0.984375
    }
}

/// Damped sine with amplitude floor 1; amplitudes below 1 stretch the period.
struct ElasticOut {
    amplitude: f32,
    omega: f32,
    phase: f32,
}

impl ElasticOut {
    fn new(amplitude: f32, period: f32) -> Self {
        let amplitude = if amplitude > 0.0 { amplitude } else { 1.0 };
        let period = if period > 0.0 { period } else { 0.3 };
        let a = amplitude.max(1.0);
        let p = period / amplitude.min(1.0);
        Self {
            amplitude: a,
            omega: TAU / p,
            phase: p / TAU * (1.0 / a).asin(),
        }
    }

    fn eval(&self, p: f32) -> f32 {
        if p >= 1.0 {
            return 1.0;
        }
        self.amplitude * 2f32.powf(-10.0 * p) * ((p - self.phase) * self.omega).sin() + 1.0
    }
}

fn split_args(s: &str) -> Result<(&str, Vec<f32>)> {
    let Some(open) = s.find('(') else {
        return Ok((s, Vec::new()));
    };
    let Some(inner) = s[open + 1..].strip_suffix(')') else {
        return Err(DefinitionError::EaseArguments {
            name: s.to_string(),
            reason: "unbalanced parentheses".into(),
        });
    };
    let mut args = Vec::new();
    for raw in inner.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        let v = raw
            .parse::<f32>()
            .map_err(|_| DefinitionError::EaseArguments {
                name: s.to_string(),
                reason: format!("'{raw}' is not a number"),
            })?;
        args.push(v);
    }
    Ok((&s[..open], args))
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Ease::Linear => f.write_str("linear"),
            Ease::Power { degree, dir } => write!(f, "power{degree}.{}", dir.name()),
            Ease::Sine(dir) => write!(f, "sine.{}", dir.name()),
            Ease::Expo(dir) => write!(f, "expo.{}", dir.name()),
            Ease::Circ(dir) => write!(f, "circ.{}", dir.name()),
            Ease::Bounce(dir) => write!(f, "bounce.{}", dir.name()),
            Ease::Elastic {
                dir,
                amplitude,
                period,
            } => write!(f, "elastic.{}({amplitude},{period})", dir.name()),
            Ease::Back { dir, overshoot } => write!(f, "back.{}({overshoot})", dir.name()),
        }
    }
}

impl FromStr for Ease {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self> {
        Ease::parse(s)
    }
}

impl TryFrom<String> for Ease {
    type Error = DefinitionError;

    fn try_from(s: String) -> Result<Self> {
        Ease::parse(&s)
    }
}

impl From<Ease> for String {
    fn from(ease: Ease) -> String {
        ease.to_string()
    }
}

impl Default for Ease {
    fn default() -> Self {
        Ease::Linear
    }
}
