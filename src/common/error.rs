use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Erros de domínio. A conversão para HTTP fica em `to_api_error`, que
// implementa a convenção do front: validação = 200 com `success: false`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de validación")]
    ValidationError(#[from] validator::ValidationErrors),

    // Mensagem já pronta (em espanhol) para devolver tal qual ao cliente
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    UniqueConstraintViolation(String),

    // Rotas tipadas novas: 404
    #[error("{0}")]
    NotFound(String),

    // Rotas herdadas do PHP: "não encontrado" vai como 200 + success:false
    #[error("{0}")]
    LegacyNotFound(String),

    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("Sesión inválida o caducada")]
    InvalidSession,

    #[error("Enlace inválido o caducado")]
    InvalidOrExpiredToken,

    #[error("{0}")]
    Forbidden(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    /// Traduz o erro para o par (status, mensagem) que o cliente vê.
    /// Erros de infraestrutura são logados aqui e nunca vazam detalhes.
    pub fn to_api_error(&self) -> ApiError {
        let (status, message) = match self {
            AppError::ValidationError(errors) => {
                let mut messages: Vec<String> = errors
                    .field_errors()
                    .into_iter()
                    .flat_map(|(field, field_errors)| {
                        field_errors.iter().map(move |e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| format!("Campo inválido: {field}"))
                        })
                    })
                    .collect();
                messages.sort();
                (StatusCode::OK, messages.join("; "))
            }
            AppError::Validation(msg)
            | AppError::UniqueConstraintViolation(msg)
            | AppError::LegacyNotFound(msg) => (StatusCode::OK, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidCredentials
            | AppError::InvalidSession
            | AppError::InvalidOrExpiredToken => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error interno del servidor".to_string(),
                )
            }
        };

        ApiError { status, message }
    }
}

/// Resposta de erro já decidida: o que sai pelo fio.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.to_api_error()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error().into_response()
    }
}

/// Mapeia violação de unicidade para uma mensagem amigável; o resto segue
/// como erro de banco.
pub fn map_unique_violation(e: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(message.to_string());
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failures_are_http_200() {
        let api = AppError::validation("Fecha inválida").to_api_error();
        assert_eq!(api.status, StatusCode::OK);
        assert_eq!(api.message, "Fecha inválida");
    }

    #[test]
    fn not_found_depends_on_route_family() {
        assert_eq!(
            AppError::NotFound("x".into()).to_api_error().status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::LegacyNotFound("x".into()).to_api_error().status,
            StatusCode::OK
        );
    }

    #[test]
    fn infrastructure_errors_hide_details() {
        let api = AppError::DatabaseError(sqlx::Error::PoolTimedOut).to_api_error();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Error interno del servidor");
    }

    #[test]
    fn auth_failures_map_to_401_and_403() {
        assert_eq!(AppError::InvalidSession.to_api_error().status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::InvalidOrExpiredToken.to_api_error().status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::forbidden("no").to_api_error().status,
            StatusCode::FORBIDDEN
        );
    }
}
