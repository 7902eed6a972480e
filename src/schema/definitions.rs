//! Declarative schemas for the bodies Konnect sends.

use std::sync::LazyLock;

use serde_json::{Value, json};

use super::validator::DiscriminatedSchema;

/// Discriminator property of event hooks.
pub const EVENT_TYPE: &str = "event_type";

static APPLICATION_PAYLOAD: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "redirect_uris": {
                "type": "array",
                "minItems": 1,
                "items": { "type": "string", "format": "uri" }
            },
            "client_name": { "type": "string" },
            "grant_types": {
                "type": "array",
                "items": { "type": "string" }
            },
            "scopes": {
                "type": "array",
                "items": { "type": "string" }
            },
            "token_endpoint_auth_method": { "type": "string" },
            "application_description": { "type": "string" },
            "portal_id": { "type": "string", "format": "uuid" },
            "organization_id": { "type": "string", "format": "uuid" },
            "developer_id": { "type": "string", "format": "uuid" },
            "auth_strategy_id": { "type": "string", "format": "uuid" },
            "dcr_provider_id": { "type": "string", "format": "uuid" }
        },
        "required": [
            "redirect_uris",
            "client_name",
            "grant_types",
            "token_endpoint_auth_method",
            "application_description",
            "portal_id",
            "organization_id",
            "developer_id"
        ]
    })
});

static EVENT_HOOK: LazyLock<DiscriminatedSchema> = LazyLock::new(|| {
    let base = json!({
        "type": "object",
        "properties": {
            "event_type": {
                "type": "string",
                "enum": ["update_application", "add_registration", "remove_registration"]
            },
            "client_id": { "type": "string" },
            "application_id": { "type": "string", "format": "uuid" },
            "application_name": { "type": "string" },
            "application_description": { "type": "string" },
            "portal_id": { "type": "string", "format": "uuid" },
            "organization_id": { "type": "string", "format": "uuid" },
            "developer_id": { "type": "string", "format": "uuid" }
        },
        "required": [
            "event_type",
            "client_id",
            "application_id",
            "application_name",
            "application_description",
            "portal_id",
            "organization_id"
        ]
    });

    let registration = |tag: &str| {
        json!({
            "properties": {
                "event_type": { "const": tag },
                "api_product_version_id": { "type": "string", "format": "uuid" },
                "audience": { "type": "string" }
            },
            "required": ["api_product_version_id"]
        })
    };

    DiscriminatedSchema::new(base, EVENT_TYPE)
        .variant(
            "update_application",
            json!({
                "properties": {
                    "event_type": { "const": "update_application" },
                    // Older Konnect releases still send the redirect URIs.
                    "redirect_uris": { "type": "array", "items": { "type": "string" } }
                }
            }),
        )
        .variant("add_registration", registration("add_registration"))
        .variant("remove_registration", registration("remove_registration"))
        .strict()
});

/// Schema of the `POST /` body.
#[must_use]
pub fn application_payload() -> &'static Value {
    &APPLICATION_PAYLOAD
}

/// Schema of the `POST /{application_id}/event-hook` body.
#[must_use]
pub fn event_hook() -> &'static DiscriminatedSchema {
    &EVENT_HOOK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Keyword, validate};
    use serde_json::json;

    fn application() -> Value {
        json!({
            "redirect_uris": ["https://example.com"],
            "client_name": "test",
            "grant_types": ["authorization_code", "refresh_token", "implicit"],
            "token_endpoint_auth_method": "client_secret_post",
            "application_description": "disisatest",
            "portal_id": "426ac0a7-aeb6-4043-a404-c4bfe24f2705",
            "organization_id": "426ac0a7-aeb6-4043-a404-c4bfe24f2706",
            "developer_id": "426ac0a7-aeb6-4043-a404-c4bfe24f2707"
        })
    }

    fn update_event() -> Value {
        json!({
            "event_type": "update_application",
            "client_id": "id",
            "application_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "application_name": "name",
            "application_description": "description",
            "portal_id": "3fa85f64-5717-4562-b3fc-2c963f66afa7",
            "organization_id": "3fa85f64-5717-4562-b3fc-2c963f66afa8",
            "developer_id": "426ac0a7-aeb6-4043-a404-c4bfe24f2707"
        })
    }

    #[test]
    fn application_minimal_payload_is_valid() {
        assert!(validate(&application(), application_payload()).is_valid());
    }

    #[test]
    fn application_optional_fields_are_accepted() {
        let mut payload = application();
        payload["scopes"] = json!(["openid"]);
        payload["auth_strategy_id"] = json!("3fa85f64-5717-4562-b3fc-2c963f66afa6");
        payload["dcr_provider_id"] = json!("3fa85f64-5717-4562-b3fc-2c963f66afa7");

        assert!(validate(&payload, application_payload()).is_valid());
    }

    #[test]
    fn application_each_missing_required_field_is_named_first() {
        let required = application_payload()["required"].as_array().unwrap().clone();
        for name in required.iter().filter_map(Value::as_str) {
            let mut payload = application();
            payload.as_object_mut().unwrap().remove(name);

            let result = validate(&payload, application_payload());
            assert_eq!(result.violations[0].missing_property(), Some(name), "field {name}");
        }
    }

    #[test]
    fn application_unknown_field_is_rejected() {
        let mut payload = application();
        payload["callback"] = json!("nope");

        let result = validate(&payload, application_payload());
        assert_eq!(result.violations[0].keyword, Keyword::AdditionalProperties);
    }

    #[test]
    fn application_empty_redirect_uris_rejected() {
        let mut payload = application();
        payload["redirect_uris"] = json!([]);

        let result = validate(&payload, application_payload());
        assert_eq!(result.violations[0].keyword, Keyword::MinItems);
        assert_eq!(result.violations[0].instance_path, "/redirect_uris");
    }

    #[test]
    fn application_non_uuid_portal_rejected() {
        let mut payload = application();
        payload["portal_id"] = json!("portal-1");

        let result = validate(&payload, application_payload());
        assert_eq!(result.violations[0].keyword, Keyword::Format);
        assert_eq!(result.violations[0].instance_path, "/portal_id");
    }

    #[test]
    fn event_hook_all_variants_validate() {
        assert!(event_hook().validate(&update_event()).is_valid());

        for tag in ["add_registration", "remove_registration"] {
            let mut payload = update_event();
            payload["event_type"] = json!(tag);
            payload["api_product_version_id"] = json!("3fa85f64-5717-4562-b3fc-2c963f66afa6");
            payload["audience"] = json!("audience");
            assert!(event_hook().validate(&payload).is_valid(), "variant {tag}");
        }
    }

    #[test]
    fn event_hook_developer_id_is_optional() {
        let mut payload = update_event();
        payload.as_object_mut().unwrap().remove("developer_id");
        assert!(event_hook().validate(&payload).is_valid());
    }

    #[test]
    fn event_hook_legacy_update_with_redirect_uris() {
        let mut payload = update_event();
        payload["redirect_uris"] = json!(["https://example.com"]);
        assert!(event_hook().validate(&payload).is_valid());
    }

    #[test]
    fn event_hook_missing_event_type_named_first() {
        let mut payload = update_event();
        payload.as_object_mut().unwrap().remove("event_type");
        payload.as_object_mut().unwrap().remove("developer_id");

        let result = event_hook().validate(&payload);
        assert_eq!(result.violations[0].missing_property(), Some("event_type"));
    }

    #[test]
    fn event_hook_unknown_event_type_rejected() {
        let mut payload = update_event();
        payload["event_type"] = json!("delete_application");

        let result = event_hook().validate(&payload);
        assert_eq!(result.violations[0].keyword, Keyword::Enum);
        assert_eq!(result.violations[0].instance_path, "/event_type");
    }

    #[test]
    fn event_hook_registration_requires_product_version() {
        let mut payload = update_event();
        payload["event_type"] = json!("add_registration");

        let result = event_hook().validate(&payload);
        assert_eq!(
            result.violations[0].missing_property(),
            Some("api_product_version_id")
        );
    }

    #[test]
    fn event_hook_update_rejects_registration_fields() {
        let mut payload = update_event();
        payload["api_product_version_id"] = json!("3fa85f64-5717-4562-b3fc-2c963f66afa6");

        let result = event_hook().validate(&payload);
        assert_eq!(result.violations[0].keyword, Keyword::AdditionalProperties);
    }

    #[test]
    fn event_hook_tags_match_base_enum() {
        let tags: Vec<&str> = event_hook().tags().collect();
        assert_eq!(
            tags,
            vec!["add_registration", "remove_registration", "update_application"]
        );
        assert_eq!(event_hook().discriminator(), EVENT_TYPE);
    }
}
