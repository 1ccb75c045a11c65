use serde_json::{json, Value};

pub fn lead_payload() -> Value {
    json!({
        "salutation": "FEMALE",
        "firstName": " Anna ",
        "lastName": "Muster",
        "postalCode": "10115",
        "email": "anna@example.de",
        "phone": "+49 30 1234567",
        "newsletterSingleOptIn": true
    })
}
