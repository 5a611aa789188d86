//! Verification step between registration and the first session.
//!
//! ```text
//! PendingSignup --enter(armed)--> AwaitingCode --verify ok--> Verified
//!                                  ^        |
//!                                  +-resend-+   (refused while cooling down)
//! ```
//!
//! Requests are split into `begin_*` / `finish_*` halves so the gate never
//! has to be borrowed across an await point.

use thiserror::Error;

use crate::error::ApiError;
use crate::routes::Route;

pub const CODE_LENGTH: usize = 6;
pub const REJECTED_CODE: &str = "Invalid or expired code. Please resend.";
pub const RESEND_FAILED: &str = "Error resending code";
pub const RESEND_SENT: &str = "A new code has been sent.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    PendingSignup,
    AwaitingCode,
    Verified,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Sign up before verifying a code")]
    NotArmed,
    #[error("Enter all 6 digits of the code.")]
    IncompleteCode,
    #[error("Please wait {0}s before requesting another code.")]
    CoolingDown(u32),
    #[error("A request is already in progress")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoFactorGate {
    state: GateState,
    digits: [Option<char>; CODE_LENGTH],
    error: Option<String>,
    message: Option<String>,
    cooldown: u32,
    cooldown_ticks: u32,
    in_flight: bool,
}

impl TwoFactorGate {
    pub fn new(cooldown_ticks: u32) -> Self {
        Self {
            state: GateState::PendingSignup,
            digits: [None; CODE_LENGTH],
            error: None,
            message: None,
            cooldown: 0,
            cooldown_ticks,
            in_flight: false,
        }
    }

    /// Entry guard. Without a completed registration the caller is sent back
    /// to sign-up.
    pub fn enter(&mut self, verification_pending: bool) -> Result<(), Route> {
        if !verification_pending {
            tracing::debug!("two-factor entered without a registration");
            return Err(Route::SignUp);
        }
        if self.state == GateState::PendingSignup {
            self.state = GateState::AwaitingCode;
        }
        Ok(())
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn can_resend(&self) -> bool {
        self.state == GateState::AwaitingCode && self.cooldown == 0 && !self.in_flight
    }

    pub fn digit(&self, index: usize) -> Option<char> {
        self.digits.get(index).copied().flatten()
    }

    /// Sets one input box. Accepts an empty string (clears the box) or a
    /// single ASCII digit; anything else is ignored and `false` returned.
    pub fn set_digit(&mut self, index: usize, input: &str) -> bool {
        let Some(slot) = self.digits.get_mut(index) else {
            return false;
        };
        let mut chars = input.chars();
        match (chars.next(), chars.next()) {
            (None, _) => {
                *slot = None;
                true
            }
            (Some(c), None) if c.is_ascii_digit() => {
                *slot = Some(c);
                true
            }
            _ => false,
        }
    }

    pub fn code(&self) -> String {
        self.digits.iter().flatten().collect()
    }

    pub fn begin_resend(&mut self) -> Result<(), GateError> {
        if self.state != GateState::AwaitingCode {
            return Err(GateError::NotArmed);
        }
        if self.in_flight {
            return Err(GateError::Busy);
        }
        if self.cooldown > 0 {
            return Err(GateError::CoolingDown(self.cooldown));
        }
        self.error = None;
        self.message = None;
        self.digits = [None; CODE_LENGTH];
        self.cooldown = self.cooldown_ticks;
        self.in_flight = true;
        Ok(())
    }

    pub fn finish_resend(&mut self, result: Result<Option<String>, ApiError>) {
        self.in_flight = false;
        match result {
            Ok(message) => self.message = Some(message.unwrap_or_else(|| RESEND_SENT.to_string())),
            Err(e) => {
                tracing::warn!(error = %e, "resending code failed");
                self.message = Some(RESEND_FAILED.to_string());
            }
        }
    }

    /// Returns the code to submit.
    pub fn begin_verify(&mut self) -> Result<String, GateError> {
        if self.state != GateState::AwaitingCode {
            return Err(GateError::NotArmed);
        }
        if self.in_flight {
            return Err(GateError::Busy);
        }
        let code = self.code();
        if code.len() != CODE_LENGTH {
            self.error = Some(GateError::IncompleteCode.to_string());
            return Err(GateError::IncompleteCode);
        }
        self.error = None;
        self.in_flight = true;
        Ok(code)
    }

    /// Returns the route to navigate to once the code was accepted.
    pub fn finish_verify(&mut self, result: Result<Route, ApiError>) -> Option<Route> {
        self.in_flight = false;
        match result {
            Ok(route) => {
                self.state = GateState::Verified;
                Some(route)
            }
            Err(e) => {
                tracing::debug!(error = %e, "code rejected");
                self.error = Some(REJECTED_CODE.to_string());
                None
            }
        }
    }

    /// Advances the resend cooldown by one unit.
    pub fn tick(&mut self) -> u32 {
        self.cooldown = self.cooldown.saturating_sub(1);
        self.cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed() -> TwoFactorGate {
        let mut gate = TwoFactorGate::new(5);
        gate.enter(true).unwrap();
        gate
    }

    fn fill(gate: &mut TwoFactorGate, code: &str) {
        for (index, digit) in code.chars().enumerate() {
            assert!(gate.set_digit(index, &digit.to_string()));
        }
    }

    #[test]
    fn direct_entry_is_sent_to_sign_up() {
        let mut gate = TwoFactorGate::new(5);
        assert_eq!(gate.enter(false), Err(Route::SignUp));
        assert_eq!(gate.state(), GateState::PendingSignup);
    }

    #[test]
    fn only_single_digits_are_accepted() {
        let mut gate = armed();
        assert!(!gate.set_digit(0, "a"));
        assert!(!gate.set_digit(0, "12"));
        assert!(!gate.set_digit(CODE_LENGTH, "1"));
        assert!(gate.set_digit(0, "4"));
        assert_eq!(gate.digit(0), Some('4'));
        assert!(gate.set_digit(0, ""));
        assert_eq!(gate.digit(0), None);
    }

    #[test]
    fn incomplete_code_is_not_submitted() {
        let mut gate = armed();
        fill(&mut gate, "123");
        assert_eq!(gate.begin_verify(), Err(GateError::IncompleteCode));
        assert!(!gate.is_busy());
        assert!(gate.error().is_some());
    }

    #[test]
    fn resend_is_refused_during_cooldown() {
        let mut gate = armed();
        fill(&mut gate, "123456");

        gate.begin_resend().unwrap();
        assert_eq!(gate.code(), "");
        gate.finish_resend(Ok(None));
        assert_eq!(gate.message(), Some(RESEND_SENT));

        for remaining in (1..=5).rev() {
            assert_eq!(gate.begin_resend(), Err(GateError::CoolingDown(remaining)));
            gate.tick();
        }
        assert!(gate.can_resend());
        gate.begin_resend().unwrap();
        assert_eq!(gate.cooldown(), 5);
    }

    #[test]
    fn rejected_code_keeps_waiting_without_a_lockout() {
        let mut gate = armed();
        for _ in 0..10 {
            fill(&mut gate, "000000");
            let code = gate.begin_verify().unwrap();
            assert_eq!(code, "000000");
            assert_eq!(
                gate.finish_verify(Err(ApiError::Status { status: 400, message: None })),
                None
            );
            assert_eq!(gate.state(), GateState::AwaitingCode);
            assert_eq!(gate.error(), Some(REJECTED_CODE));
        }
    }

    #[test]
    fn resend_clears_a_displayed_error() {
        let mut gate = armed();
        fill(&mut gate, "999999");
        gate.begin_verify().unwrap();
        gate.finish_verify(Err(ApiError::Status { status: 400, message: None }));

        gate.begin_resend().unwrap();
        assert_eq!(gate.error(), None);
        gate.finish_resend(Err(ApiError::Network("offline".to_string())));
        assert_eq!(gate.message(), Some(RESEND_FAILED));
    }

    #[test]
    fn accepted_code_verifies_the_gate() {
        let mut gate = armed();
        fill(&mut gate, "314159");
        gate.begin_verify().unwrap();
        assert_eq!(gate.begin_verify(), Err(GateError::Busy));
        assert_eq!(gate.finish_verify(Ok(Route::Chat)), Some(Route::Chat));
        assert_eq!(gate.state(), GateState::Verified);
        assert_eq!(gate.begin_resend(), Err(GateError::NotArmed));
    }
}
