//! Test data helpers for creating test updates
//!
//! Updates are deserialized from Bot API JSON, the same way teloxide receives
//! them, so every required field is set the way Telegram sets it.

use serde_json::{json, Value};
use teloxide::types::Update;

pub const TEST_DATE: i64 = 1640995200;

pub fn test_user(user_id: u64) -> Value {
    json!({
        "id": user_id,
        "is_bot": false,
        "first_name": "Test",
        "username": format!("user{}", user_id),
        "language_code": "en"
    })
}

pub fn test_chat(chat_id: i64) -> Value {
    if chat_id > 0 {
        json!({ "id": chat_id, "type": "private", "first_name": "Test" })
    } else {
        json!({ "id": chat_id, "type": "supergroup", "title": "Test Group" })
    }
}

fn parse(value: Value) -> Update {
    serde_json::from_str(&value.to_string()).expect("test update should deserialize")
}

/// Text message sent by `user_id` in `chat_id`
pub fn text_update(update_id: i32, chat_id: i64, user_id: u64, text: &str) -> Update {
    parse(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "date": TEST_DATE,
            "chat": test_chat(chat_id),
            "from": test_user(user_id),
            "text": text
        }
    }))
}

pub fn location_update(update_id: i32, chat_id: i64, user_id: u64, latitude: f64, longitude: f64) -> Update {
    parse(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "date": TEST_DATE,
            "chat": test_chat(chat_id),
            "from": test_user(user_id),
            "location": { "latitude": latitude, "longitude": longitude }
        }
    }))
}

pub fn contact_update(update_id: i32, chat_id: i64, user_id: u64, phone_number: &str) -> Update {
    parse(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "date": TEST_DATE,
            "chat": test_chat(chat_id),
            "from": test_user(user_id),
            "contact": { "phone_number": phone_number, "first_name": "Test", "user_id": user_id }
        }
    }))
}

/// Button press on a message the bot sent to `chat_id`
pub fn callback_update(update_id: i32, chat_id: i64, user_id: u64, data: &str) -> Update {
    parse(json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cb-{}", update_id),
            "from": test_user(user_id),
            "chat_instance": "test-instance",
            "data": data,
            "message": {
                "message_id": 1000 + update_id,
                "date": TEST_DATE,
                "chat": test_chat(chat_id),
                "text": "Pick one"
            }
        }
    }))
}

/// Button press on an inline-mode message, which carries no chat
pub fn inline_callback_update(update_id: i32, user_id: u64, data: &str) -> Update {
    parse(json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cb-{}", update_id),
            "from": test_user(user_id),
            "chat_instance": "test-instance",
            "inline_message_id": "inline-1",
            "data": data
        }
    }))
}

/// Update kind the router has no identity for
pub fn poll_update(update_id: i32) -> Update {
    parse(json!({
        "update_id": update_id,
        "poll": {
            "id": "poll-1",
            "question": "Which day?",
            "options": [
                { "text": "Friday", "voter_count": 0 },
                { "text": "Saturday", "voter_count": 0 }
            ],
            "total_voter_count": 0,
            "is_closed": false,
            "is_anonymous": true,
            "type": "regular",
            "allows_multiple_answers": false
        }
    }))
}

/// Payment confirmation request sent by `user_id`
pub fn pre_checkout_update(update_id: i32, user_id: u64, payload: &str) -> Update {
    parse(json!({
        "update_id": update_id,
        "pre_checkout_query": {
            "id": format!("pc-{}", update_id),
            "from": test_user(user_id),
            "currency": "USD",
            "total_amount": 500,
            "invoice_payload": payload
        }
    }))
}
