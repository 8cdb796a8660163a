use aistudio_db::models::user::{CreateUser, User};
use aistudio_db::repositories::UserRepo;
use aistudio_db::DbPool;

/// Fresh in-memory database with all migrations applied.
pub async fn test_pool() -> DbPool {
    let pool = aistudio_db::create_pool("sqlite::memory:")
        .await
        .expect("in-memory pool should open");
    aistudio_db::run_migrations(&pool)
        .await
        .expect("migrations should apply");
    pool
}

/// Insert a user with a placeholder hash.
pub async fn create_user(pool: &DbPool, email: &str) -> User {
    let input = CreateUser {
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}
