use streak_core::ledger::{
    CheckInKind, StreakEvent, StreakLedger, ACTIVATION_FEE, MIN_CHECKIN_INTERVAL, STREAK_WINDOW,
};
use streak_core::StreakError;

fn user(name: &str) -> String {
    name.to_string()
}

#[test]
fn two_user_lifecycle() {
    let mut ledger = StreakLedger::new(user("admin"));

    // A activates at t=0 paying exactly the fee.
    let outcome = ledger.check_in(&user("a"), ACTIVATION_FEE, 0).unwrap();
    assert_eq!(outcome.kind, CheckInKind::Activated);
    assert_eq!(outcome.record.count, 1);
    assert!(outcome.record.is_active);

    // A continues exactly one hour later.
    let outcome = ledger
        .check_in(&user("a"), ACTIVATION_FEE, MIN_CHECKIN_INTERVAL)
        .unwrap();
    assert_eq!(outcome.kind, CheckInKind::Continued);
    assert_eq!(outcome.record.count, 2);

    // A misses the window and breaks back to 1.
    let late = MIN_CHECKIN_INTERVAL + STREAK_WINDOW + 2;
    let outcome = ledger.check_in(&user("a"), ACTIVATION_FEE, late).unwrap();
    assert_eq!(outcome.kind, CheckInKind::Broken);
    assert_eq!(outcome.record.count, 1);
    assert!(outcome.record.is_active);

    // B's single check-in at t=0 is untouched by A's history.
    let outcome = ledger.check_in(&user("b"), ACTIVATION_FEE, 0).unwrap();
    assert_eq!(outcome.kind, CheckInKind::Activated);
    assert_eq!(ledger.get_streak(&user("b"), late).count, 1);
    assert_eq!(ledger.get_streak(&user("a"), late).count, 1);

    // One event per accepted call, in order.
    let kinds: Vec<&'static str> = ledger
        .events()
        .iter()
        .map(|event| match event {
            StreakEvent::StreakActivated { .. } => "activated",
            StreakEvent::StreakContinued { .. } => "continued",
            StreakEvent::StreakBroken { .. } => "broken",
            StreakEvent::BalanceWithdrawn { .. } => "withdrawn",
        })
        .collect();
    assert_eq!(kinds, ["activated", "continued", "broken", "activated"]);

    // Administrator drains the four collected fees.
    let amount = ledger.withdraw(&user("admin"), late + 1).unwrap();
    assert_eq!(amount, ACTIVATION_FEE * 4);
    assert!(matches!(
        ledger.withdraw(&user("admin"), late + 2),
        Err(StreakError::NothingToWithdraw)
    ));
}

#[test]
fn snapshot_survives_json_round_trip() {
    let mut ledger = StreakLedger::new(user("admin"));
    ledger.check_in(&user("a"), ACTIVATION_FEE, 0).unwrap();
    ledger
        .check_in(&user("a"), ACTIVATION_FEE * 2, MIN_CHECKIN_INTERVAL)
        .unwrap();

    let json = serde_json::to_string_pretty(&ledger.snapshot()).unwrap();
    let restored = StreakLedger::from_snapshot(serde_json::from_str(&json).unwrap()).unwrap();

    assert_eq!(restored.administrator(), &user("admin"));
    assert_eq!(restored.accumulated_balance(), ACTIVATION_FEE * 3);
    assert_eq!(restored.record(&user("a")).unwrap().count, 2);
    assert_eq!(restored.events().len(), 2);
}
