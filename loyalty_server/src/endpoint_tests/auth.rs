use actix_web::{
    http::{header::SET_COOKIE, StatusCode},
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use loyalty_engine::{
    db_types::{Amount, UserCredentials},
    hash_password,
    traits::AuthApiError,
    AuthApi,
};

use super::{
    helpers::{account, get_auth_config, send},
    mocks::MockAuthManager,
};
use crate::{
    auth::TokenIssuer,
    data_objects::SessionResponse,
    routes::{LoginRoute, RegisterRoute},
};

fn configure(auth: MockAuthManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(AuthApi::new(auth))).service(
            web::scope("/api/user")
                .service(RegisterRoute::<MockAuthManager>::new())
                .service(LoginRoute::<MockAuthManager>::new()),
        );
    }
}

fn post(path: &str, body: &str) -> TestRequest {
    TestRequest::post()
        .uri(path)
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string())
}

#[actix_web::test]
async fn register_issues_a_session() {
    let mut auth = MockAuthManager::new();
    auth.expect_create_user()
        .withf(|u| u.login == "alice" && u.password_hash.starts_with("$argon2"))
        .times(1)
        .returning(|_| Ok(account(Amount::zero(), Amount::zero())));
    let res = send(post("/api/user/register", r#"{"login":"alice","password":"hunter22"}"#), configure(auth)).await;
    assert_eq!(res.status, StatusCode::OK);

    let header = res.headers.get("Authorization").expect("No Authorization header").to_str().unwrap();
    assert!(header.starts_with("Bearer "));
    let cookie = res.headers.get(SET_COOKIE).expect("No session cookie").to_str().unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let session: SessionResponse = serde_json::from_str(&res.body).unwrap();
    assert_eq!(session.user_id, 1);
    assert_eq!(session.login, "alice");
    assert_eq!(header, format!("Bearer {}", session.token));
    let claims = TokenIssuer::new(&get_auth_config()).validate(&session.token).unwrap();
    assert_eq!(claims.user_id, 1);
    assert_eq!(claims.login, "alice");
}

#[actix_web::test]
async fn register_taken_login() {
    let mut auth = MockAuthManager::new();
    auth.expect_create_user().returning(|u| Err(AuthApiError::LoginTaken(u.login)));
    let res = send(post("/api/user/register", r#"{"login":"alice","password":"hunter22"}"#), configure(auth)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body, r#"{"error":"The login 'alice' is already taken"}"#);
}

#[actix_web::test]
async fn register_bad_requests() {
    for body in [r#"{"login":"alice","password":""}"#, r#"{"login":"  ","password":"pw"}"#, r#"{"login":"alice"}"#, "{"]
    {
        let mut auth = MockAuthManager::new();
        auth.expect_create_user().times(0);
        let res = send(post("/api/user/register", body), configure(auth)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "body: {body}");
        assert!(res.headers.get(SET_COOKIE).is_none());
    }
}

#[actix_web::test]
async fn login_with_the_right_password() {
    let auth = alice_with_password("hunter22");
    let res = send(post("/api/user/login", r#"{"login":"alice","password":"hunter22"}"#), configure(auth)).await;
    assert_eq!(res.status, StatusCode::OK);
    let session: SessionResponse = serde_json::from_str(&res.body).unwrap();
    assert_eq!(session.user_id, 3);
    assert!(res.headers.get(SET_COOKIE).is_some());
}

fn alice_with_password(password: &str) -> MockAuthManager {
    let hash = hash_password(password).unwrap();
    let mut auth = MockAuthManager::new();
    auth.expect_fetch_credentials().returning(move |login| match login {
        "alice" => Ok(Some(UserCredentials { id: 3, login: "alice".into(), password_hash: hash.clone() })),
        _ => Ok(None),
    });
    auth
}

#[actix_web::test]
async fn login_failures_are_unauthorized() {
    for body in [r#"{"login":"alice","password":"wrong"}"#, r#"{"login":"bob","password":"hunter22"}"#] {
        let res = send(post("/api/user/login", body), configure(alice_with_password("hunter22"))).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "body: {body}");
        assert_eq!(res.body, r#"{"error":"Authentication Error. Invalid login or password."}"#);
        assert!(res.headers.get("Authorization").is_none());
    }
}
