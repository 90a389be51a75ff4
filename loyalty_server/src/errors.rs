use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use loyalty_engine::{
    db_types::OrderNumberError,
    AccountApiError,
    AuthApiError,
    OrderFlowError,
    WithdrawalError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Invalid order number. {0}")]
    InvalidOrderNumber(String),
    #[error("{0}")]
    OrderConflict(String),
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
    #[error("{0}")]
    InsufficientFunds(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not issue access token. {0}")]
    CouldNotIssueAccessToken(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOrderNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OrderConflict(_) => StatusCode::CONFLICT,
            Self::LoginTaken(_) => StatusCode::CONFLICT,
            Self::InsufficientFunds(_) => StatusCode::PAYMENT_REQUIRED,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotIssueAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Invalid login or password.")]
    InvalidCredentials,
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::LoginTaken(login) => Self::LoginTaken(login),
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::MissingCredentials => Self::InvalidRequestBody(e.to_string()),
            AuthApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AuthApiError::PasswordHashError(e) => Self::BackendError(e),
        }
    }
}

impl From<OrderNumberError> for ServerError {
    fn from(e: OrderNumberError) -> Self {
        match e {
            OrderNumberError::Malformed(_) => Self::InvalidRequestBody(e.to_string()),
            OrderNumberError::ChecksumFailed(_) => Self::InvalidOrderNumber(e.to_string()),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::InvalidOrderNumber(e) => e.into(),
            OrderFlowError::OwnedByAnotherUser(_) => Self::OrderConflict(e.to_string()),
            OrderFlowError::InvalidAccrualReport(..) | OrderFlowError::LedgerError(_) => {
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<WithdrawalError> for ServerError {
    fn from(e: WithdrawalError) -> Self {
        match e {
            WithdrawalError::InvalidReference(e) => e.into(),
            WithdrawalError::InvalidAmount(_) => Self::InvalidRequestBody(e.to_string()),
            WithdrawalError::InsufficientFunds { .. } => Self::InsufficientFunds(e.to_string()),
            WithdrawalError::UserNotFound(_) => Self::AuthenticationError(AuthError::ValidationError(e.to_string())),
            WithdrawalError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::UserNotFound(_) => Self::AuthenticationError(AuthError::ValidationError(e.to_string())),
            AccountApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}
