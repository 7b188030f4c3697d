//! The circling/cruise mode machine.
//!
//! ```text
//!          turning               turning ≥ 15 s
//!  Cruise ─────────► PossibleClimb ─────────────► Climb
//!    ▲                    │ not turning             │ not turning
//!    │◄───────────────────┘                         ▼
//!    │      not turning ≥ 10 s              PossibleCruise
//!    └──────────────────────────────────────────────┘
//!                        turning again ─► Climb
//! ```
//!
//! [`transition`] is a pure function of the current mode and this tick's
//! inputs. It returns the next mode plus the captures the caller has to
//! record, so every edge can be tested on its own.

use crate::geo::GeoPoint;
use crate::snapshot::FlightModeSwitch;

/// Current phase of the circling machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CirclingMode {
    /// Established cruise.
    #[default]
    Cruise,
    /// Turning in cruise; climb not yet confirmed.
    PossibleClimb,
    /// Established climb.
    Climb,
    /// Stopped turning in a climb; cruise not yet confirmed.
    PossibleCruise,
}

impl std::fmt::Display for CirclingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cruise => write!(f, "Cruise"),
            Self::PossibleClimb => write!(f, "PossibleClimb"),
            Self::Climb => write!(f, "Climb"),
            Self::PossibleCruise => write!(f, "PossibleCruise"),
        }
    }
}

/// Mode demanded by an external switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForcedMode {
    #[default]
    None,
    Circling,
    Cruise,
}

impl ForcedMode {
    /// Map a switch box flight mode input.
    pub fn from_switch(mode: FlightModeSwitch) -> Self {
        match mode {
            FlightModeSwitch::Unknown => Self::None,
            FlightModeSwitch::Circling => Self::Circling,
            FlightModeSwitch::Cruise => Self::Cruise,
        }
    }
}

/// Where and when a phase started.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseMark {
    pub time: f64,
    pub location: Option<GeoPoint>,
    /// Navigation altitude (m).
    pub altitude: Option<f64>,
    /// Kinetic energy expressed as height (m).
    pub energy_height: f64,
}

/// A record the caller must take as a side effect of a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Capture {
    /// A turn started (or, from a climb, ended) at this mark.
    TurnStart(PhaseMark),
    /// Circling confirmed. The climb began at the last turn start.
    ClimbConfirmed,
    /// Cruise confirmed. The cruise began at the last turn start.
    CruiseConfirmed,
}

/// Result of one step of the mode machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub mode: CirclingMode,
    /// Captures in the order they happened.
    pub captures: Vec<Capture>,
}

/// Switch delays of the mode machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchDelays {
    /// Turning time needed to confirm a climb (s).
    pub cruise_climb: f64,
    /// Straight flight needed to confirm cruise (s).
    pub climb_cruise: f64,
}

/// One step of the mode machine.
///
/// `turn_start_time` is the time of the last recorded turn start. A forced
/// mode skips the waiting states.
pub fn transition(
    mode: CirclingMode,
    turning: bool,
    force: ForcedMode,
    now: &PhaseMark,
    turn_start_time: Option<f64>,
    delays: SwitchDelays,
) -> Transition {
    let force_circling = force == ForcedMode::Circling;
    let force_cruise = force == ForcedMode::Cruise;

    let mut captures = Vec::new();
    let mut turn_start_time = turn_start_time;
    let elapsed = |start: Option<f64>| start.map_or(0.0, |start| now.time - start);

    let mut mode = mode;
    loop {
        match mode {
            CirclingMode::Cruise => {
                if turning || force_circling {
                    captures.push(Capture::TurnStart(*now));
                    turn_start_time = Some(now.time);
                    mode = CirclingMode::PossibleClimb;
                }
                if !force_circling {
                    break;
                }
            }
            CirclingMode::PossibleClimb => {
                if force_cruise {
                    mode = CirclingMode::Cruise;
                } else if turning || force_circling {
                    if force_circling || elapsed(turn_start_time) >= delays.cruise_climb {
                        captures.push(Capture::ClimbConfirmed);
                        mode = CirclingMode::Climb;
                    }
                } else {
                    mode = CirclingMode::Cruise;
                }
                break;
            }
            CirclingMode::Climb => {
                if !turning || force_cruise {
                    captures.push(Capture::TurnStart(*now));
                    turn_start_time = Some(now.time);
                    mode = CirclingMode::PossibleCruise;
                }
                if !force_cruise {
                    break;
                }
            }
            CirclingMode::PossibleCruise => {
                if force_circling {
                    mode = CirclingMode::Climb;
                } else if !turning || force_cruise {
                    if force_cruise || elapsed(turn_start_time) >= delays.climb_cruise {
                        captures.push(Capture::CruiseConfirmed);
                        mode = CirclingMode::Cruise;
                    }
                } else {
                    mode = CirclingMode::Climb;
                }
                break;
            }
        }
    }

    Transition { mode, captures }
}
