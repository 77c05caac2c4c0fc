use proptest::prelude::*;
use teloxide::types::InlineKeyboardButtonKind;
use test_strategy::proptest;

use super::*;

fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn reminder(id: ReminderId, fire_at: &str, text: Option<&str>) -> Reminder {
    Reminder {
        id,
        owner_id: 7,
        fire_at: at(fire_at),
        text: text.map(str::to_string),
        created_at: at("2025-06-20T10:00:00+06:00"),
        sent: false,
    }
}

#[test]
fn created_reply_shows_instant_and_escaped_text() {
    let now = at("2025-06-20T10:00:00+06:00");
    let reminder = reminder(3, "2025-06-20T18:30:00+06:00", Some("<b>milk</b> & eggs"));

    let message = created(&reminder, Some(2), &now);

    assert_eq!(
        message,
        "✅ Reminder #3 set for <b>18:30 20.06.2025</b> (in 8h 30m).\n\
         📝 &lt;b&gt;milk&lt;/b&gt; &amp; eggs\n\
         Pending reminders: 2"
    );
}

#[test]
fn past_time_reply_depends_on_shape() {
    assert!(past_time(true).contains("passed today"));
    assert!(!past_time(false).contains("today"));
}

#[test]
fn submit_reply_covers_every_outcome() {
    let now = at("2025-06-20T10:00:00+06:00");

    assert_eq!(submit_reply(&SubmitOutcome::InvalidFormat, &now), invalid_format());
    assert_eq!(submit_reply(&SubmitOutcome::AccessDenied, &now), ACCESS_DENIED);
    assert_eq!(submit_reply(&SubmitOutcome::Failed, &now), GENERIC_ERROR);
    assert_eq!(
        submit_reply(&SubmitOutcome::PastTime { today_only: true }, &now),
        past_time(true)
    );
}

#[test]
fn empty_list_has_a_friendly_message() {
    let now = at("2025-06-20T10:00:00+06:00");

    assert_eq!(reminder_list(&[], &now), "You have no pending reminders.");
    assert!(list_keyboard(&[]).inline_keyboard.is_empty());
}

#[test]
fn list_renders_one_line_and_button_per_reminder() {
    let now = at("2025-06-20T10:00:00+06:00");
    let reminders = [
        reminder(1, "2025-06-20T18:00:00+06:00", None),
        reminder(2, "2025-06-22T09:15:00+06:00", Some("dentist")),
    ];

    let text = reminder_list(&reminders, &now);
    let keyboard = list_keyboard(&reminders);

    assert_eq!(
        text,
        "⏰ <b>Your reminders</b>\n\
         #1 <b>18:00 20.06.2025</b> (in 8h)\n\
         #2 <b>09:15 22.06.2025</b> (in 1d 23h) dentist"
    );
    assert_eq!(keyboard.inline_keyboard.len(), 2);
    assert_eq!(keyboard.inline_keyboard[1][0].text, "❌ 22.06 09:15");
    assert_eq!(
        keyboard.inline_keyboard[1][0].kind,
        InlineKeyboardButtonKind::CallbackData("delete:2".to_string())
    );
}

#[test]
fn foreign_callback_data_is_ignored() {
    assert_eq!(parse_delete_callback("delete:"), None);
    assert_eq!(parse_delete_callback("delete:abc"), None);
    assert_eq!(parse_delete_callback("edit:1"), None);
}

#[proptest]
fn delete_callback_round_trips(id: ReminderId) {
    prop_assert_eq!(parse_delete_callback(&delete_callback_data(id)), Some(id));
}

#[test]
fn notification_uses_text_when_present() {
    let with_text = Notification {
        recipient: 7,
        fire_at: at("2025-06-20T18:00:00+06:00"),
        text: Some("stretch & walk".to_string()),
        kind: NotificationKind::Scheduled,
    };
    let without_text = Notification {
        text: None,
        ..with_text.clone()
    };
    let daily = Notification {
        kind: NotificationKind::Daily,
        ..without_text.clone()
    };

    assert_eq!(
        notification(&with_text),
        "⏰ <b>Reminder!</b>\nstretch &amp; walk"
    );
    assert_eq!(
        notification(&without_text),
        "⏰ <b>Reminder!</b> It is 18:00, 20.06.2025."
    );
    assert_eq!(notification(&daily), "🔁 <b>Daily reminder</b> for 18:00.");
}

#[test]
fn stats_include_counters_and_uptime() {
    let snapshot = StatsSnapshot {
        sent: 12,
        errors: 1,
        messages: 40,
        started_at: at("2025-06-18T08:00:00+06:00"),
        uptime: Duration::from_secs(2 * 86_400 + 3 * 3600 + 5 * 60 + 59),
    };

    let message = stats(&snapshot);

    assert!(message.contains("Running since: 08:00 18.06.2025"));
    assert!(message.contains("Uptime: 2d 3h 5m"));
    assert!(message.contains("Messages processed: 40"));
    assert!(message.contains("Reminders sent: 12"));
    assert!(message.contains("Errors: 1"));
}

#[test]
fn short_uptime_omits_days() {
    assert_eq!(format_uptime(Duration::from_secs(3 * 3600 + 60)), "3h 1m");
}

#[test]
fn cancel_reply_reports_missing_reminder() {
    assert_eq!(cancel_reply(4, true), "🗑 Reminder #4 cancelled.");
    assert_eq!(cancel_reply(4, false), "There is no pending reminder #4.");
}
