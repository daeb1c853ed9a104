//! Admin API 业务逻辑服务

use rusqlite::ErrorCode;

use super::error::AdminServiceError;
use super::types::{SessionResponse, SubscribersResponse, UpsertSubscriberRequest};
use crate::common::session;
use crate::store::{Database, subscribers, subscribers::Subscriber};

/// Admin 服务
pub struct AdminService {
    db: Database,
    session_secret: Option<String>,
}

impl AdminService {
    pub fn new(db: Database, session_secret: Option<String>) -> Self {
        Self {
            db,
            session_secret: session_secret.filter(|s| !s.is_empty()),
        }
    }

    pub async fn list_subscribers(&self) -> Result<SubscribersResponse, AdminServiceError> {
        let subscribers = self
            .db
            .call(|conn| subscribers::list(conn))
            .await
            .map_err(AdminServiceError::Internal)?;
        Ok(SubscribersResponse {
            total: subscribers.len(),
            subscribers,
        })
    }

    pub async fn get_subscriber(&self, user_id: &str) -> Result<Subscriber, AdminServiceError> {
        let id = user_id.to_string();
        self.db
            .call(move |conn| subscribers::get(conn, &id))
            .await
            .map_err(AdminServiceError::Internal)?
            .ok_or_else(|| AdminServiceError::NotFound {
                user_id: user_id.to_string(),
            })
    }

    /// 创建订阅者或更新其关联信息，不改变订阅状态
    pub async fn upsert_subscriber(
        &self,
        user_id: &str,
        req: UpsertSubscriberRequest,
    ) -> Result<Subscriber, AdminServiceError> {
        let user_id = user_id.trim().to_string();
        if user_id.is_empty() {
            return Err(AdminServiceError::InvalidInput(
                "userId must not be empty".to_string(),
            ));
        }
        let email = non_blank(req.email);
        let customer_id = non_blank(req.stripe_customer_id);

        let subscriber = self
            .db
            .call(move |conn| {
                subscribers::upsert_link(conn, &user_id, email.as_deref(), customer_id.as_deref())
            })
            .await
            .map_err(classify_store_error)?;

        tracing::info!(user_id = %subscriber.user_id, "订阅者关联信息已更新");
        Ok(subscriber)
    }

    /// 为用户签发会话 token
    pub fn create_session(&self, user_id: &str) -> Result<SessionResponse, AdminServiceError> {
        let secret = self.session_secret.as_deref().ok_or_else(|| {
            AdminServiceError::Configuration("SESSION_SECRET is not set".to_string())
        })?;
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AdminServiceError::InvalidInput(
                "userId must not be empty".to_string(),
            ));
        }

        let (token, expires_in) =
            session::generate_token(secret, user_id).map_err(AdminServiceError::Internal)?;
        tracing::info!(user_id = %user_id, "已签发会话 token");
        Ok(SessionResponse { token, expires_in })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 唯一约束冲突单独归类，其余视为内部错误
fn classify_store_error(e: anyhow::Error) -> AdminServiceError {
    let is_conflict = matches!(
        e.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation
    );
    if is_conflict {
        AdminServiceError::Conflict("stripeCustomerId is already linked to another user".to_string())
    } else {
        AdminServiceError::Internal(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::subscription::SubscriptionStatus;

    fn service(secret: Option<&str>) -> AdminService {
        AdminService::new(
            Database::open_in_memory().unwrap(),
            secret.map(str::to_string),
        )
    }

    fn link(email: Option<&str>, customer: Option<&str>) -> UpsertSubscriberRequest {
        UpsertSubscriberRequest {
            email: email.map(str::to_string),
            stripe_customer_id: customer.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_free_subscriber_and_relinks() {
        let service = service(None);
        let created = service
            .upsert_subscriber("u1", link(Some("a@example.com"), None))
            .await
            .unwrap();
        assert_eq!(created.status, SubscriptionStatus::Free);
        assert_eq!(created.stripe_customer_id, None);

        let relinked = service
            .upsert_subscriber("u1", link(Some("  "), Some("cus_1")))
            .await
            .unwrap();
        assert_eq!(relinked.email.as_deref(), Some("a@example.com"));
        assert_eq!(relinked.stripe_customer_id.as_deref(), Some("cus_1"));

        let listed = service.list_subscribers().await.unwrap();
        assert_eq!(listed.total, 1);
    }

    #[tokio::test]
    async fn test_duplicate_customer_is_conflict() {
        let service = service(None);
        service
            .upsert_subscriber("u1", link(None, Some("cus_1")))
            .await
            .unwrap();
        let err = service
            .upsert_subscriber("u2", link(None, Some("cus_1")))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminServiceError::Conflict(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_missing_subscriber_is_not_found() {
        let err = service(None).get_subscriber("ghost").await.unwrap_err();
        assert!(matches!(err, AdminServiceError::NotFound { .. }));
    }

    #[test]
    fn test_create_session_requires_secret() {
        let err = service(None).create_session("u1").unwrap_err();
        assert!(matches!(err, AdminServiceError::Configuration(_)));

        let session = service(Some("s3cret")).create_session("u1").unwrap();
        let claims = session::verify_token(&session.token, "s3cret").unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(session.expires_in, session::TOKEN_EXPIRY_SECONDS);
    }
}
