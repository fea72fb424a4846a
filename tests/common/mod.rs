//! Shared fixtures for the integration tests.

use serde_json::{Value, json};
use sift::Engine;

/// An issue-tracker document exercising nesting, arrays and maps.
pub fn issue() -> Value {
    json!({
        "id": "ISSUE-1",
        "issueSummary": "Dragons Need Fed",
        "issueDetails": "I need my dragons fed pronto.",
        "reporter": {"firstName": "Daenerys", "lastName": "Targaryen"},
        "assignee": {"firstName": "Jorah", "lastName": "Mormont"},
        "actions": [
            {
                "type": "COMMENT",
                "text": "I'm going to let Daario get this one..",
                "user": {"firstName": "Jorah", "lastName": "Mormont"}
            },
            {
                "type": "CLOSE",
                "text": "All set.",
                "user": {"firstName": "Daario", "lastName": "Naharis"}
            }
        ],
        "properties": {"email": "motherofdragons@got.com", "priority": "1"}
    })
}

/// A self-similar item tree for deep-nesting cases.
pub fn item() -> Value {
    json!({
        "id": "ITEM-1",
        "name": "Hammer",
        "items": [{
            "id": "ITEM-2",
            "name": "Nail",
            "items": [{
                "id": "ITEM-3",
                "name": "Milkshake",
                "items": [{
                    "id": "ITEM-4",
                    "name": "Hoverboard",
                    "items": [{
                        "id": "ITEM-5",
                        "name": "Binoculars",
                        "items": []
                    }]
                }]
            }]
        }]
    })
}

pub fn apply(doc: Value, filter: &str) -> Value {
    let _ = env_logger::try_init();
    Engine::new().apply(doc, &[filter]).unwrap()
}
