mod common;

use chatdesk_core::api::{REGISTER_PATH, RESEND_OTP_PATH, VERIFY_OTP_PATH};
use chatdesk_core::auth::{SignUpForm, SignUpOutcome, MISSING_FIELDS};
use chatdesk_core::guard::{evaluate, GuardDecision, GuardInput};
use chatdesk_core::two_factor::{GateError, REJECTED_CODE, RESEND_SENT};
use chatdesk_core::{ApiError, GateState, Notice, Redirect, Route, TwoFactorGate};
use common::{Harness, LOGIN_OK};
use futures::executor::block_on;

const REGISTERED: &str = r#"{"user":{"id":12,"email":"ana@example.com"},"session_id":null}"#;

fn form() -> SignUpForm {
    SignUpForm {
        username: "ana".to_string(),
        email: "ana@example.com".to_string(),
        password: "hunter2".to_string(),
        phone_number: "+15550100".to_string(),
    }
}

fn registered(harness: &Harness) -> TwoFactorGate {
    harness.transport.reply(REGISTER_PATH, 201, REGISTERED);
    let outcome = block_on(harness.auth.sign_up(&form())).unwrap();
    assert_eq!(outcome, SignUpOutcome::VerificationRequired);
    assert_eq!(outcome.route(), Route::TwoFactor);

    let mut gate = TwoFactorGate::new(harness.config.resend_cooldown_ticks);
    gate.enter(harness.auth.verification_pending()).unwrap();
    gate
}

fn type_code(gate: &mut TwoFactorGate, code: &str) {
    for (index, digit) in code.chars().enumerate() {
        gate.set_digit(index, &digit.to_string());
    }
}

/// Mirrors what the view does on "Verify".
fn verify(harness: &Harness, gate: &mut TwoFactorGate) -> Option<Route> {
    let code = gate.begin_verify().ok()?;
    let result = block_on(harness.auth.verify_code(&code));
    gate.finish_verify(result)
}

/// Mirrors what the view does on "Resend".
fn resend(harness: &Harness, gate: &mut TwoFactorGate) -> Result<(), GateError> {
    gate.begin_resend()?;
    let result = block_on(harness.auth.resend_code());
    gate.finish_resend(result);
    Ok(())
}

#[test]
fn direct_entry_without_signup_redirects_to_sign_up() {
    let harness = Harness::new();

    let mut gate = TwoFactorGate::new(5);
    assert_eq!(gate.enter(harness.auth.verification_pending()), Err(Route::SignUp));
    assert_eq!(
        evaluate(GuardInput {
            route: Route::TwoFactor,
            location: Route::TwoFactor.path(),
            status: harness.auth.status(),
            verification_pending: harness.auth.verification_pending(),
        }),
        GuardDecision::Redirect(Redirect::to(Route::SignUp))
    );
}

#[test]
fn incomplete_signup_form_sends_nothing() {
    let harness = Harness::new();
    let mut incomplete = form();
    incomplete.phone_number = "  ".to_string();

    let error = block_on(harness.auth.sign_up(&incomplete)).unwrap_err();

    assert_eq!(error, ApiError::Validation(MISSING_FIELDS.to_string()));
    assert_eq!(harness.transport.count(REGISTER_PATH), 0);
    assert!(!harness.auth.verification_pending());
}

#[test]
fn registration_keeps_a_draft_and_arms_the_gate() {
    let harness = Harness::new();
    let gate = registered(&harness);

    assert_eq!(gate.state(), GateState::AwaitingCode);
    let pending = harness.auth.pending_verification().unwrap();
    assert_eq!(pending.user_id, "12");
    assert_eq!(pending.email, "ana@example.com");
    assert_eq!(harness.session.signup_draft().unwrap().number, "+15550100");
    assert!(!harness.session.is_authenticated());
    assert!(harness.auth.notices().take(Notice::SignupCompleted));
}

#[test]
fn correct_code_establishes_the_session() {
    let harness = Harness::new();
    let mut gate = registered(&harness);
    harness.transport.reply(VERIFY_OTP_PATH, 200, LOGIN_OK);

    type_code(&mut gate, "482913");
    let route = verify(&harness, &mut gate);

    assert_eq!(route, Some(Route::Chat));
    assert_eq!(gate.state(), GateState::Verified);
    assert_eq!(
        harness.transport.bodies(VERIFY_OTP_PATH),
        vec![serde_json::json!({ "otp": "482913", "user_id": "12" })]
    );
    assert_eq!(harness.session.token().as_deref(), Some("tok-1"));
    assert_eq!(harness.session.session_id().as_deref(), Some("sess-9"));
    assert!(harness.auth.notices().take(Notice::LoginSucceeded));
    assert!(!harness.auth.verification_pending());
    assert_eq!(harness.session.signup_draft(), None);
}

#[test]
fn wrong_code_shows_fixed_message_and_allows_retry() {
    let harness = Harness::new();
    let mut gate = registered(&harness);
    harness
        .transport
        .reply(VERIFY_OTP_PATH, 400, r#"{"error":"Invalid OTP"}"#);
    harness.transport.reply(VERIFY_OTP_PATH, 200, LOGIN_OK);

    type_code(&mut gate, "000000");
    assert_eq!(verify(&harness, &mut gate), None);
    assert_eq!(gate.error(), Some(REJECTED_CODE));
    assert_eq!(gate.state(), GateState::AwaitingCode);
    assert!(!harness.session.is_authenticated());

    assert_eq!(verify(&harness, &mut gate), Some(Route::Chat));
    assert_eq!(harness.transport.count(VERIFY_OTP_PATH), 2);
}

#[test]
fn second_resend_within_cooldown_issues_no_request() {
    let harness = Harness::new();
    let mut gate = registered(&harness);
    harness
        .transport
        .reply(RESEND_OTP_PATH, 200, r#"{"message":"OTP resent to your email."}"#);
    harness.transport.reply(RESEND_OTP_PATH, 200, "{}");

    resend(&harness, &mut gate).unwrap();
    assert_eq!(gate.message(), Some("OTP resent to your email."));
    assert_eq!(gate.cooldown(), 5);

    assert_eq!(resend(&harness, &mut gate), Err(GateError::CoolingDown(5)));
    for _ in 0..4 {
        gate.tick();
    }
    assert_eq!(resend(&harness, &mut gate), Err(GateError::CoolingDown(1)));
    assert_eq!(harness.transport.count(RESEND_OTP_PATH), 1);

    gate.tick();
    resend(&harness, &mut gate).unwrap();
    assert_eq!(harness.transport.count(RESEND_OTP_PATH), 2);
    assert_eq!(
        harness.transport.bodies(RESEND_OTP_PATH)[0],
        serde_json::json!({ "user_id": "12" })
    );
}

#[test]
fn signup_with_token_skips_verification() {
    let harness = Harness::new();
    harness.transport.reply(
        REGISTER_PATH,
        201,
        r#"{"user":{"id":3,"email":"bo@example.com"},"session_id":"s-3","token":"tok-3"}"#,
    );

    let outcome = block_on(harness.auth.sign_up(&form())).unwrap();

    assert_eq!(outcome, SignUpOutcome::SignedIn);
    assert_eq!(outcome.route(), Route::Chat);
    assert_eq!(harness.session.user_email().as_deref(), Some("bo@example.com"));
    assert!(!harness.auth.verification_pending());
    assert_eq!(harness.session.signup_draft(), None);
}

#[test]
fn resend_with_empty_body_counts_as_sent() {
    let harness = Harness::new();
    let mut gate = registered(&harness);
    harness.transport.reply(RESEND_OTP_PATH, 200, "");

    resend(&harness, &mut gate).unwrap();

    assert_eq!(gate.message(), Some(RESEND_SENT));
    assert_eq!(gate.cooldown(), 5);
}
