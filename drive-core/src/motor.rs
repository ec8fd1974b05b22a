//! Propulsion motor state machine.
//!
//! The ESC needs a short arming tap before it will reverse from standstill,
//! and must not be slammed from one direction into the other. Direction
//! changes therefore go through a brake tap and a neutral pause:
//!
//! ```text
//!              fwd                       rev
//!   Neutral ---------> ForwardHold <------------------+
//!      |                   |  rev                     |
//!      | rev               v                          |
//!      v              FwdBrakeTap (60 %)              |
//!  NeutralToReverseTap (40 %)  | tap elapsed          |
//!      | tap elapsed       v                          |
//!      v              FwdNeutralGap (50 %) ---> ReverseHold
//!  NeutralToReverseGap (50 %)                    |  fwd
//!      | gap elapsed                             v
//!      +----> ForwardHold / ReverseHold    RevBrakeTap (40 %)
//!                                                |
//!                                          RevNeutralGap (50 %)
//! ```
//!
//! A zero target returns to `Neutral` from any hold or gap state. All
//! timing is "check and act" against the millisecond clock passed to
//! [`Motor::tick`].

use embedded_hal::pwm::SetDutyCycle;

use crate::config::MotorConfig;

pub const NEUTRAL_DUTY: u8 = 50;
/// Arming tap before reversing from standstill.
pub const REVERSE_TAP_DUTY: u8 = 40;
/// Brake tap when a reverse target arrives while moving forward.
pub const FORWARD_BRAKE_DUTY: u8 = 60;
/// Brake tap when a forward target arrives while reversing.
pub const REVERSE_BRAKE_DUTY: u8 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorState {
    #[default]
    Neutral,
    NeutralToReverseTap,
    NeutralToReverseGap,
    ForwardHold,
    FwdBrakeTap,
    FwdNeutralGap,
    ReverseHold,
    RevBrakeTap,
    RevNeutralGap,
}

/// Target set by commands, consumed by [`Motor::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorContext {
    pub target_speed_mm_s: i16,
    /// Duty for the target speed, `0..=100`.
    pub target_duty: u8,
    /// Direction of the last non-zero target.
    pub target_forward: bool,
    pub deadline_ms: u32,
}

impl MotorContext {
    const NEUTRAL: Self = Self {
        target_speed_mm_s: 0,
        target_duty: NEUTRAL_DUTY,
        target_forward: true,
        deadline_ms: 0,
    };
}

/// Map a signed speed to a duty percentage. 50 is neutral; the bounds
/// saturate at 0 and 100.
#[must_use]
pub fn speed_to_duty(speed_mm_s: i16, config: &MotorConfig) -> u8 {
    let speed = i32::from(speed_mm_s);
    let max_fwd = i32::from(config.max_forward_mm_s);
    let max_rev = i32::from(config.max_reverse_mm_s);

    if speed == 0 {
        return NEUTRAL_DUTY;
    }
    if speed >= max_fwd {
        return 100;
    }
    if speed <= max_rev {
        return 0;
    }
    let half = i32::from(NEUTRAL_DUTY);
    let duty = if speed > 0 {
        half + speed * half / max_fwd
    } else {
        half + speed * half / -max_rev
    };
    duty.clamp(0, 100) as u8
}

/// Wraparound-safe "has `deadline` passed" for a 32-bit millisecond clock.
#[inline]
#[must_use]
pub const fn deadline_reached(now_ms: u32, deadline_ms: u32) -> bool {
    (now_ms.wrapping_sub(deadline_ms) as i32) >= 0
}

pub struct Motor<P> {
    pwm: P,
    config: MotorConfig,
    state: MotorState,
    ctx: MotorContext,
    applied_duty: u8,
}

impl<P: SetDutyCycle> Motor<P> {
    /// Take ownership of the ESC output and drive it to neutral.
    pub fn new(pwm: P, config: MotorConfig) -> Self {
        let mut motor = Self {
            pwm,
            config,
            state: MotorState::Neutral,
            ctx: MotorContext::NEUTRAL,
            applied_duty: NEUTRAL_DUTY,
        };
        motor.apply(NEUTRAL_DUTY);
        motor
    }

    /// Set the target speed. Takes effect on the next [`tick`](Self::tick).
    pub fn set_target_speed(&mut self, speed_mm_s: i16) {
        self.ctx.target_speed_mm_s = speed_mm_s;
        if speed_mm_s == 0 {
            self.ctx.target_duty = NEUTRAL_DUTY;
        } else {
            self.ctx.target_duty = speed_to_duty(speed_mm_s, &self.config);
            self.ctx.target_forward = speed_mm_s > 0;
        }
    }

    /// Advance the state machine. Call once per millisecond.
    pub fn tick(&mut self, now_ms: u32) {
        let want_neutral = self.ctx.target_speed_mm_s == 0;
        let forward = self.ctx.target_forward;

        match self.state {
            MotorState::Neutral => {
                self.apply(NEUTRAL_DUTY);
                if want_neutral {
                    return;
                }
                if forward {
                    self.apply(self.ctx.target_duty);
                    self.enter(MotorState::ForwardHold);
                } else {
                    self.apply(REVERSE_TAP_DUTY);
                    self.ctx.deadline_ms = now_ms.wrapping_add(self.config.brake_tap_ms);
                    self.enter(MotorState::NeutralToReverseTap);
                }
            }
            MotorState::ForwardHold | MotorState::ReverseHold => {
                let holding_forward = self.state == MotorState::ForwardHold;
                if want_neutral {
                    self.apply(NEUTRAL_DUTY);
                    self.enter(MotorState::Neutral);
                } else if forward == holding_forward {
                    self.apply(self.ctx.target_duty);
                } else {
                    let (duty, next) = if holding_forward {
                        (FORWARD_BRAKE_DUTY, MotorState::FwdBrakeTap)
                    } else {
                        (REVERSE_BRAKE_DUTY, MotorState::RevBrakeTap)
                    };
                    self.apply(duty);
                    self.ctx.deadline_ms = now_ms.wrapping_add(self.config.brake_tap_ms);
                    self.enter(next);
                }
            }
            MotorState::NeutralToReverseTap | MotorState::FwdBrakeTap | MotorState::RevBrakeTap => {
                if !deadline_reached(now_ms, self.ctx.deadline_ms) {
                    return;
                }
                self.apply(NEUTRAL_DUTY);
                self.ctx.deadline_ms = now_ms.wrapping_add(self.config.neutral_gap_ms);
                self.enter(match self.state {
                    MotorState::NeutralToReverseTap => MotorState::NeutralToReverseGap,
                    MotorState::FwdBrakeTap => MotorState::FwdNeutralGap,
                    _ => MotorState::RevNeutralGap,
                });
            }
            MotorState::NeutralToReverseGap
            | MotorState::FwdNeutralGap
            | MotorState::RevNeutralGap => {
                if !deadline_reached(now_ms, self.ctx.deadline_ms) {
                    return;
                }
                if want_neutral {
                    self.apply(NEUTRAL_DUTY);
                    self.enter(MotorState::Neutral);
                } else {
                    self.apply(self.ctx.target_duty);
                    self.enter(if forward {
                        MotorState::ForwardHold
                    } else {
                        MotorState::ReverseHold
                    });
                }
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> MotorState {
        self.state
    }

    #[must_use]
    pub fn context(&self) -> &MotorContext {
        &self.ctx
    }

    /// Duty percentage last written to the ESC.
    #[must_use]
    pub fn applied_duty(&self) -> u8 {
        self.applied_duty
    }

    #[must_use]
    pub fn pwm(&self) -> &P {
        &self.pwm
    }

    pub fn into_inner(self) -> P {
        self.pwm
    }

    fn enter(&mut self, next: MotorState) {
        trace!("motor {} -> {}", self.state, next);
        self.state = next;
    }

    fn apply(&mut self, percent: u8) {
        let percent = percent.min(100);
        self.applied_duty = percent;
        let pulse_us = self.config.pulse.pulse_us(percent);
        let duty = self.config.pulse.duty(pulse_us, self.pwm.max_duty_cycle());
        if self.pwm.set_duty_cycle(duty).is_err() {
            warn!("motor pwm write failed");
        }
    }
}
