//! Reqwest-backed login adapter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::dto::{LoginRequestDto, LoginResponseDto};
use super::transport::{HttpTransport, decode, map_status_error};
use crate::domain::ports::AuthGateway;
use crate::domain::{CredentialRecord, Error, LoginCredentials, Role};

/// Calls `POST /auth/admin/login` or `POST /auth/client/login`.
#[derive(Debug, Clone)]
pub struct HttpAuthGateway {
    transport: Arc<HttpTransport>,
}

impl HttpAuthGateway {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn login(
        &self,
        role: Role,
        credentials: &LoginCredentials,
    ) -> Result<CredentialRecord, Error> {
        let url = self.transport.endpoint(&["auth", role.as_str(), "login"])?;
        debug!(%role, "calling login endpoint");
        let request = self.transport.post(url).json(&LoginRequestDto {
            email: credentials.email(),
            password: credentials.password(),
        });
        let (status, body) = self.transport.execute(request, None).await?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        let response: LoginResponseDto = decode(&body, "login")?;
        response
            .into_record(role)
            .map_err(|message| Error::internal(format!("invalid login payload: {message}")))
    }
}
