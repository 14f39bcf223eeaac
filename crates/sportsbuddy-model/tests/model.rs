use chrono::{TimeZone, Utc};
use serde_json::json;
use sportsbuddy_model::{
    can_delete_event, can_edit_event, can_manage_taxonomy, Email, Event, EventDraft, EventId,
    EventPatch, Identity, IdentityId, Role, RolePolicy,
};

fn make_draft(owner: &str) -> EventDraft {
    EventDraft {
        owner_id: IdentityId::new(owner),
        author_label: format!("{}@example.com", owner),
        name: "Sunday league".to_string(),
        category: "Football".to_string(),
        when: Utc.with_ymd_and_hms(2024, 6, 2, 9, 30, 0).unwrap(),
        city: "Ahmedabad".to_string(),
        area: "Navrangpura".to_string(),
        description: "Bring boots".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

fn make_identity(id: &str, role: Role) -> Identity {
    Identity {
        id: IdentityId::new(id),
        email: format!("{}@example.com", id),
        role,
    }
}

#[test]
fn test_requested_admin_is_honoured_by_default() {
    let policy = RolePolicy::default();
    let email = Email::parse("ada@example.com").unwrap();
    assert_eq!(policy.resolve_registration(&email, Role::Admin), Role::Admin);
    assert_eq!(policy.resolve_registration(&email, Role::User), Role::User);
}

#[test]
fn test_requested_admin_can_be_disabled() {
    let policy = RolePolicy {
        allow_requested_admin: false,
        admin_email_suffixes: vec![],
    };
    let email = Email::parse("ada@example.com").unwrap();
    assert_eq!(policy.resolve_registration(&email, Role::Admin), Role::User);
}

#[test]
fn test_admin_suffix_only_when_configured() {
    let email = Email::parse("root@admin.com").unwrap();
    assert_eq!(
        RolePolicy::default().resolve_registration(&email, Role::User),
        Role::User
    );

    let policy = RolePolicy {
        allow_requested_admin: false,
        admin_email_suffixes: vec!["@admin.com".to_string()],
    };
    assert_eq!(policy.resolve_registration(&email, Role::User), Role::Admin);
    assert_eq!(policy.resolve_fallback("ROOT@ADMIN.COM"), Role::Admin);
    assert_eq!(policy.resolve_fallback("someone@example.com"), Role::User);
}

#[test]
fn test_role_policy_deserializes_with_defaults() {
    let policy: RolePolicy = serde_json::from_value(json!({
        "adminEmailSuffixes": ["@admin.com"]
    }))
    .unwrap();
    assert!(policy.allow_requested_admin);
    assert_eq!(policy.admin_email_suffixes, vec!["@admin.com".to_string()]);
}

#[test]
fn test_role_parse_and_display() {
    assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!(" user ".parse::<Role>().unwrap(), Role::User);
    assert!("root".parse::<Role>().is_err());
    assert_eq!(Role::Admin.to_string(), "admin");
}

#[test]
fn test_event_wire_shape_is_camel_case() {
    let event = make_draft("u_1").into_event(EventId::new("e_1"));
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["id"], "e_1");
    assert_eq!(value["ownerId"], "u_1");
    assert_eq!(value["authorLabel"], "u_1@example.com");
    assert_eq!(value["when"], "2024-06-02T09:30:00Z");
    assert_eq!(value["createdAt"], "2024-06-01T12:00:00Z");

    let back: Event = serde_json::from_value(value).unwrap();
    assert_eq!(back, event);
}

#[test]
fn test_patch_changes_only_set_fields() {
    let mut event = make_draft("u_1").into_event(EventId::new("e_1"));
    let before = event.clone();

    EventPatch::rename("Evening league").apply(&mut event);

    assert_eq!(event.name, "Evening league");
    assert_eq!(event.id, before.id);
    assert_eq!(event.category, before.category);
    assert_eq!(event.when, before.when);
    assert_eq!(event.description, before.description);
}

#[test]
fn test_patch_field_paths() {
    assert!(EventPatch::default().is_empty());
    assert_eq!(EventPatch::rename("x").field_paths(), vec!["name"]);

    let full = EventPatch::from(make_draft("u_1"));
    assert_eq!(full.field_paths().len(), 9);
    let value = serde_json::to_value(EventPatch::rename("x")).unwrap();
    assert_eq!(value, json!({ "name": "x" }));
}

#[test]
fn test_access_rules() {
    let owner = make_identity("u_owner", Role::User);
    let other = make_identity("u_other", Role::User);
    let admin = make_identity("u_admin", Role::Admin);
    let event = make_draft("u_owner").into_event(EventId::new("e_1"));

    assert!(can_edit_event(&owner, &event));
    assert!(!can_edit_event(&other, &event));
    assert!(!can_edit_event(&admin, &event));

    assert!(can_delete_event(&owner, &event));
    assert!(!can_delete_event(&other, &event));
    assert!(can_delete_event(&admin, &event));

    assert!(can_manage_taxonomy(&admin));
    assert!(!can_manage_taxonomy(&owner));
}
