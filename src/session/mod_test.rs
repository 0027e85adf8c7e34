use super::*;

fn make_identity(role: Role) -> Identity {
    Identity {
        id: "u-1".to_owned(),
        name: "Айгуль".to_owned(),
        email: "aigul@example.com".to_owned(),
        role,
        first_name: None,
        last_name: None,
    }
}

// =============================================================
// SessionState
// =============================================================

#[test]
fn default_state_is_loading_without_user() {
    let state = SessionState::default();
    assert!(state.is_loading);
    assert!(state.user.is_none());
    assert!(!state.resolved());
}

#[test]
fn user_is_not_trusted_while_loading() {
    let state = SessionState { user: Some(make_identity(Role::Student)), is_loading: true };
    assert!(!state.is_authenticated());
    assert!(state.trusted_user().is_none());
}

#[test]
fn signed_in_state_is_authenticated() {
    let state = SessionState::signed_in(make_identity(Role::Teacher));
    assert!(state.resolved());
    assert!(state.is_authenticated());
    assert_eq!(state.trusted_user().map(|u| u.id.as_str()), Some("u-1"));
}

#[test]
fn signed_out_state_is_resolved_but_not_authenticated() {
    let state = SessionState::signed_out();
    assert!(state.resolved());
    assert!(!state.is_authenticated());
}

// =============================================================
// Identity serde
// =============================================================

#[test]
fn identity_reads_camel_case_names() {
    let json = serde_json::json!({
        "id": "42",
        "name": "Марат Ахметов",
        "email": "marat@example.com",
        "role": "teacher",
        "firstName": "Марат",
        "lastName": "Ахметов",
    });
    let identity: Identity = serde_json::from_value(json).unwrap();
    assert!(identity.is_teacher());
    assert_eq!(identity.first_name.as_deref(), Some("Марат"));
    assert_eq!(identity.last_name.as_deref(), Some("Ахметов"));
}

#[test]
fn identity_accepts_numeric_id() {
    let json = serde_json::json!({"id": 7, "name": "Test User"});
    let identity: Identity = serde_json::from_value(json).unwrap();
    assert_eq!(identity.id, "7");
    assert_eq!(identity.role, Role::Student);
    assert!(identity.email.is_empty());
}

#[test]
fn identity_rejects_empty_id() {
    let json = serde_json::json!({"id": "", "name": "Nobody"});
    assert!(serde_json::from_value::<Identity>(json).is_err());
}

#[test]
fn unknown_role_falls_back_to_student() {
    let json = serde_json::json!({"id": "u", "name": "n", "role": "admin"});
    let identity: Identity = serde_json::from_value(json).unwrap();
    assert_eq!(identity.role, Role::Student);
}

#[test]
fn identity_omits_missing_name_parts_when_serialized() {
    let value = serde_json::to_value(make_identity(Role::Student)).unwrap();
    assert_eq!(value["role"], "student");
    assert!(value.get("firstName").is_none());
}

#[test]
fn role_parses_case_insensitively() {
    assert_eq!(" Teacher ".parse::<Role>(), Ok(Role::Teacher));
    assert_eq!("student".parse::<Role>(), Ok(Role::Student));
    assert!("admin".parse::<Role>().is_err());
}
