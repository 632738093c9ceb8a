// ==========================================
// 药盒转运分配引擎 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户友好的错误消息
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 外部依赖错误
    // ==========================================
    /// 配置/数据源失败导致批次中止（详细原因只写日志）
    #[error("批次{batch_id}推荐失败: 外部依赖不可用，请稍后重试")]
    ExternalDependency { batch_id: i64 },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 调用方是否可以原样重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::ExternalDependency { .. }
                | ApiError::DatabaseConnectionError(_)
                | ApiError::DatabaseTransactionError(_)
        )
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),

            // 通用错误
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "Batch".to_string(),
            id: "42".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Batch"));
                assert!(msg.contains("42"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(api_err, ApiError::DatabaseConnectionError(_)));
        assert!(api_err.is_retryable());
    }

    #[test]
    fn test_data_quality_errors_mapping() {
        let api_err: ApiError = RepositoryError::FieldValueError {
            field: "drawer_type".to_string(),
            message: "未知抽屉类型: HUGE".to_string(),
        }
        .into();
        assert!(matches!(api_err, ApiError::InvalidInput(ref msg) if msg.contains("drawer_type")));

        let api_err: ApiError = RepositoryError::SerializationError("bad json".to_string()).into();
        assert!(matches!(api_err, ApiError::InternalError(_)));
        assert!(!api_err.is_retryable());
    }

    #[test]
    fn test_external_dependency_is_generic_and_retryable() {
        let err = ApiError::ExternalDependency { batch_id: 7 };
        assert!(err.is_retryable());
        assert!(err.to_string().contains('7'));
        assert!(!ApiError::InvalidInput("x".to_string()).is_retryable());
    }
}
