//! Token lifecycle as seen by a consuming service.
use crypto_core::jwt::{
    generate_token_pair, validate_token, validate_token_of_type, TokenType,
};
use crypto_core::testing::init_test_keys;
use uuid::Uuid;

#[test]
fn refresh_flow_issues_usable_access_token() {
    init_test_keys();

    let user_id = Uuid::new_v4();
    let first = generate_token_pair(user_id, "margaret").expect("initial pair");

    let refresh_claims = validate_token_of_type(&first.refresh_token, TokenType::Refresh)
        .expect("refresh token accepted");
    assert_eq!(refresh_claims.user_id().unwrap(), user_id);

    let second = generate_token_pair(refresh_claims.user_id().unwrap(), &refresh_claims.username)
        .expect("rotated pair");
    let access = validate_token_of_type(&second.access_token, TokenType::Access).unwrap();
    assert_eq!(access.username, "margaret");
}

#[test]
fn access_token_cannot_be_used_as_refresh() {
    init_test_keys();

    let pair = generate_token_pair(Uuid::new_v4(), "barbara").unwrap();
    assert!(validate_token(&pair.access_token).is_ok());
    assert!(validate_token_of_type(&pair.access_token, TokenType::Refresh).is_err());
}
