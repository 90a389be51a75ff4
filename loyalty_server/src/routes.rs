//! Request handler definitions
//!
//! Define each route and its handler here. Handlers only translate between HTTP and the engine's APIs; the rules live
//! in `loyalty_engine`.
//!
//! Each worker thread processes its requests sequentially, so handlers must never block. Everything here is `async`,
//! and the CPU-heavy password hashing is pushed onto the blocking pool by [`AuthApi`].
use actix_web::{get, http::header::AUTHORIZATION, web, HttpResponse, Responder};
use log::*;
use loyalty_engine::{
    traits::{AccountManagement, AuthManagement, LedgerDatabase},
    AccountApi,
    AuthApi,
    AuthenticatedUser,
    OrderFlowApi,
    SubmitOrderResult,
    WithdrawalApi,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{
        BalanceResponse,
        LoginRequest,
        OrderResponse,
        SessionResponse,
        WithdrawRequest,
        WithdrawalResponse,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// `route!(name => Method "/path" impl Trait1, Trait2)` registers the generic handler `name::<B>` for any backend `B`
// implementing all the listed traits. `route!(alias: name => ...)` registers the same handler under another path.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        $crate::route!($name: $name => $method $path impl $($bounds),+);
    };

    ($route:ident: $name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$route:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$route:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$route:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($route))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/register" impl AuthManagement);
/// Creates a new account and logs it in straight away.
///
/// Responds with `409 Conflict` if the login is taken and `400 Bad Request` if either field is empty.
pub async fn register<B: AuthManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received registration request for '{}'", body.login);
    let user = api.register(&body.login, &body.password).await?;
    session_response(user, &signer)
}

route!(login => Post "/login" impl AuthManagement);
/// Checks a login and password and issues an access token. Bad credentials get `401 Unauthorized`.
pub async fn login<B: AuthManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received login request for '{}'", body.login);
    let user = api.login(&body.login, &body.password).await?;
    session_response(user, &signer)
}

/// The token is handed out three ways: as a bearer token in the `Authorization` header, as the `token` cookie, and in
/// the JSON body.
fn session_response(user: AuthenticatedUser, signer: &TokenIssuer) -> Result<HttpResponse, ServerError> {
    let AuthenticatedUser { user_id, login } = user.clone();
    let token = signer.issue_token(user.into()).map_err(|e| ServerError::CouldNotIssueAccessToken(e.to_string()))?;
    trace!("💻️ Issued access token for user #{user_id}");
    Ok(HttpResponse::Ok()
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .cookie(signer.session_cookie(&token))
        .json(SessionResponse { user_id, login, token }))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/orders" impl LedgerDatabase);
/// The body is the bare order number as plain text.
///
/// * `202 Accepted` - the order is new and has been queued for accrual.
/// * `200 OK` - this user had already submitted the order.
/// * `409 Conflict` - another user submitted the order first.
/// * `422 Unprocessable Entity` - the number fails the Luhn check.
/// * `400 Bad Request` - the body is not a number at all.
pub async fn submit_order<B: LedgerDatabase>(
    claims: JwtClaims,
    body: String,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ User #{} is submitting order '{}'", claims.user_id, body.trim());
    let result = api.submit_order(claims.user_id, &body).await?;
    let response = match result {
        SubmitOrderResult::Accepted(order) => HttpResponse::Accepted().json(OrderResponse::from(order)),
        SubmitOrderResult::AlreadySubmitted(order) => HttpResponse::Ok().json(OrderResponse::from(order)),
    };
    Ok(response)
}

route!(my_orders => Get "/orders" impl AccountManagement);
/// Lists the user's orders, oldest first. `204 No Content` if there are none.
pub async fn my_orders<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Fetching orders for user #{}", claims.user_id);
    let orders = api.orders_for_user(claims.user_id).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let orders = orders.into_iter().map(OrderResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(balance => Get "/balance" impl AccountManagement);
pub async fn balance<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Fetching balance for user #{}", claims.user_id);
    let account = api.balance(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(account)))
}

route!(withdraw => Post "/balance/withdraw" impl LedgerDatabase, AccountManagement);
route!(withdraw_alias: withdraw => Post "/withdraw" impl LedgerDatabase, AccountManagement);
/// Spends `sum` points against the reference number `order`.
///
/// * `200 OK` - the balance has been debited.
/// * `402 Payment Required` - the balance is too low. Nothing changed.
/// * `422 Unprocessable Entity` - the reference fails the Luhn check.
/// * `400 Bad Request` - malformed body, or a sum that is not positive.
pub async fn withdraw<B: LedgerDatabase + AccountManagement>(
    claims: JwtClaims,
    body: web::Json<WithdrawRequest>,
    api: web::Data<WithdrawalApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let WithdrawRequest { order, sum } = body.into_inner();
    debug!("💻️ User #{} is withdrawing {sum} against '{order}'", claims.user_id);
    let withdrawal = api.withdraw(claims.user_id, &order, sum).await?;
    Ok(HttpResponse::Ok().json(WithdrawalResponse::from(withdrawal)))
}

route!(my_withdrawals => Get "/withdrawals" impl AccountManagement);
/// Lists the user's withdrawals, oldest first. `204 No Content` if there are none.
pub async fn my_withdrawals<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Fetching withdrawals for user #{}", claims.user_id);
    let withdrawals = api.withdrawals_for_user(claims.user_id).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let withdrawals = withdrawals.into_iter().map(WithdrawalResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(withdrawals))
}
